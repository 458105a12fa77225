use std::error::Error as StdError;
use std::future::Future;
use std::panic::Location;
use std::time::Duration;

use logan_types::{CallFrame, DEFAULT_NAMESPACE, ExceptionInfo, LogEntry, LogType};
use tracing::debug;

use crate::error::EmitError;

/// Per-request timeout; emission must never stall the caller for long
pub const EMIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Function name recorded for call frames captured from `Location`
const UNKNOWN_FUNCTION: &str = "<unknown>";

/// Client side of the relay: builds entries and posts them, best effort
#[derive(Clone, Debug)]
pub struct Emitter {
    client: reqwest::Client,
    endpoint: String,

    /// Also emit each entry as a `tracing` event
    mirror: bool,
}

impl Emitter {
    /// Emitter posting to the relay at `base_url` (e.g. `http://127.0.0.1:5000`)
    pub fn new(base_url: &str) -> Result<Self, EmitError> {
        let client = reqwest::Client::builder().timeout(EMIT_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/log", base_url.trim_end_matches('/')),
            mirror: false,
        })
    }

    /// Mirror every entry into the process's own `tracing` subscriber
    pub fn with_tracing(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build an entry stamped now, with the caller's location as its call frame
    #[track_caller]
    pub fn entry(
        &self,
        log_type: LogType,
        namespace: Option<&str>,
        message: impl Into<String>,
    ) -> LogEntry {
        let caller = Location::caller();
        LogEntry::new(log_type, namespace.unwrap_or(DEFAULT_NAMESPACE), message).with_callstack(
            vec![CallFrame::new(caller.file(), caller.line(), UNKNOWN_FUNCTION)],
        )
    }

    /// Post an entry, reporting failures
    pub async fn try_send(&self, entry: &LogEntry) -> Result<(), EmitError> {
        if self.mirror {
            mirror(entry);
        }

        let response = self.client.post(&self.endpoint).json(entry).send().await?;
        if !response.status().is_success() {
            return Err(EmitError::Status(response.status()));
        }
        Ok(())
    }

    /// Post an entry, ignoring failures
    pub async fn send(&self, entry: LogEntry) {
        if let Err(e) = self.try_send(&entry).await {
            debug!(error = %e, "log emission failed");
        }
    }

    #[track_caller]
    pub fn log(
        &self,
        log_type: LogType,
        namespace: Option<&str>,
        message: impl Into<String>,
    ) -> impl Future<Output = ()> + Send + '_ {
        let entry = self.entry(log_type, namespace, message);
        self.send(entry)
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) -> impl Future<Output = ()> + Send + '_ {
        self.log(LogType::Info, None, message)
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) -> impl Future<Output = ()> + Send + '_ {
        self.log(LogType::Warning, None, message)
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>) -> impl Future<Output = ()> + Send + '_ {
        self.log(LogType::Error, None, message)
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) -> impl Future<Output = ()> + Send + '_ {
        self.log(LogType::Debug, None, message)
    }

    /// Error event carrying an error chain as its exception
    #[track_caller]
    pub fn exception(
        &self,
        namespace: Option<&str>,
        message: impl Into<String>,
        error: &(dyn StdError + 'static),
    ) -> impl Future<Output = ()> + Send + '_ {
        let entry = self
            .entry(LogType::Error, namespace, message)
            .with_exception(exception_info(error));
        self.send(entry)
    }
}

/// Describe an error and its sources as trace lines, outermost first
pub fn exception_info(error: &(dyn StdError + 'static)) -> ExceptionInfo {
    let mut traceback = vec![format!("Error: {error}\n")];
    let mut source = error.source();
    while let Some(cause) = source {
        traceback.push(format!("Caused by: {cause}\n"));
        source = cause.source();
    }
    ExceptionInfo {
        message: Some(error.to_string()),
        traceback,
    }
}

fn mirror(entry: &LogEntry) {
    let namespace = entry.namespace.as_str();
    let message = entry.message.as_str();
    match entry.log_type {
        LogType::Info => tracing::info!(target: "logan", namespace, "{message}"),
        LogType::Warning => tracing::warn!(target: "logan", namespace, "{message}"),
        LogType::Error => tracing::error!(target: "logan", namespace, "{message}"),
        LogType::Debug => tracing::debug!(target: "logan", namespace, "{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("config unreadable")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_entry_captures_call_site() {
        let emitter = Emitter::new("http://127.0.0.1:5000/").unwrap();
        assert_eq!(emitter.endpoint(), "http://127.0.0.1:5000/api/log");

        let line = line!() + 1;
        let entry = emitter.entry(LogType::Warning, None, "careful");
        assert_eq!(entry.namespace, DEFAULT_NAMESPACE);
        assert_eq!(entry.callstack.len(), 1);
        assert!(entry.callstack[0].file.ends_with("emitter.rs"));
        assert_eq!(entry.callstack[0].line, line);
    }

    #[test]
    fn test_exception_chain() {
        let error = Outer(std::io::Error::other("disk on fire"));
        let info = exception_info(&error);
        assert_eq!(info.message.as_deref(), Some("config unreadable"));
        assert_eq!(
            info.traceback,
            vec![
                "Error: config unreadable\n".to_string(),
                "Caused by: disk on fire\n".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_send_to_missing_relay_is_silent() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let emitter = Emitter::new(&format!("http://127.0.0.1:{port}")).unwrap();
        let entry = emitter.entry(LogType::Info, Some("app"), "nobody home");
        assert!(emitter.try_send(&entry).await.is_err());
        // The convenience path swallows the same failure
        emitter.info("nobody home").await;
    }
}
