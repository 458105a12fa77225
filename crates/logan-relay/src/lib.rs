//! Relay server and emission client for logan
//!
//! The relay accepts log entries over HTTP and fans them out to every
//! connected push-stream subscriber. The [`Emitter`] is the client side
//! applications use to send entries.

mod emitter;
mod error;
mod server;

pub use emitter::{EMIT_TIMEOUT, Emitter, exception_info};
pub use error::{EmitError, RelayError};
pub use server::{
    DEFAULT_HEARTBEAT, DEFAULT_PORT, Relay, RelayState, banner, find_available_port,
    heartbeat_payload, router,
};

// Re-export types used in our public API
pub use logan_types::{CallFrame, ExceptionInfo, LogEntry, LogType};
