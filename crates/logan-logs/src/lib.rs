//! Log processing for logan
//!
//! This crate provides the push-stream connection, message decoding, the
//! bounded log store and the filter model.

mod backoff;
mod connection;
mod decode;
mod filter;
mod sse;
mod store;

pub use backoff::{ConnectionState, ReconnectPolicy, Reconnector, Retry};
pub use connection::{
    ConnectionError, ConnectionManager, DEFAULT_STREAM_URL, StreamEvent, default_client, dispatch,
};
pub use decode::{DecodeError, HEARTBEAT_TYPE, MessageDecoder, StreamMessage};
pub use filter::{EmptySelection, FilterModel, SelectionKind};
pub use sse::SseDecoder;
pub use store::{DEFAULT_MAX_LOGS, LogStore, StoredEntry, TypeCounts};

// Re-export types used in our public API
pub use logan_types::{CallFrame, ExceptionInfo, LogEntry, LogType};
