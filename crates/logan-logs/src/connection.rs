use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use logan_types::LogEntry;

use crate::backoff::{ConnectionState, ReconnectPolicy, Reconnector, Retry};
use crate::decode::{MessageDecoder, StreamMessage};
use crate::sse::SseDecoder;

/// Default push-stream endpoint of a local relay
pub const DEFAULT_STREAM_URL: &str = "http://127.0.0.1:5000/api/logs/stream";

/// Events surfaced to the viewer, in transport order
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    Status(ConnectionState),
    Entry(LogEntry),
}

/// Transport failures that end one connection attempt
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(reqwest::StatusCode),
}

/// How a healthy connection ended
enum PumpEnd {
    /// Server closed the stream
    Eof,
    /// Nobody is listening any more
    ReceiverGone,
}

/// Owns the push-stream connection and its reconnect loop
pub struct ConnectionManager {
    client: reqwest::Client,

    policy: ReconnectPolicy,

    /// Cancellation token for the running connection task
    cancel: CancellationToken,

    /// Active connection task handle
    task: Option<tokio::task::JoinHandle<()>>,

    /// Sender of the active connection, kept to report shutdown
    events: Option<mpsc::UnboundedSender<StreamEvent>>,
}

impl ConnectionManager {
    /// Create a manager using the given HTTP client
    pub fn new(client: reqwest::Client, policy: ReconnectPolicy) -> Self {
        Self {
            client,
            policy,
            cancel: CancellationToken::new(),
            task: None,
            events: None,
        }
    }

    /// Connect to `url`, replacing any previous connection.
    ///
    /// The previous socket and any pending reconnect timer belong to the
    /// previous task, so cancelling it leaves at most one of each alive.
    pub fn connect(&mut self, url: &str, events: mpsc::UnboundedSender<StreamEvent>) {
        self.cancel_task();

        let client = self.client.clone();
        let url = url.to_string();
        let policy = self.policy;
        let cancel = self.cancel.clone();
        let tx = events.clone();

        info!(%url, "connecting to log stream");
        self.events = Some(events);
        self.task = Some(tokio::spawn(async move {
            run_connection(client, url, policy, tx, cancel).await;
        }));
    }

    /// Stop the connection and any pending reconnect
    pub fn stop(&mut self) {
        self.cancel_task();
        if let Some(events) = self.events.take() {
            let _ = events.send(StreamEvent::Status(ConnectionState::Disconnected));
        }
    }

    /// Check if the connection task is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn cancel_task(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // Create a fresh cancellation token for future connections
        self.cancel = CancellationToken::new();
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), ReconnectPolicy::default())
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel_task();
    }
}

/// Turn one SSE payload into an entry worth forwarding.
///
/// Heartbeats are consumed here and malformed payloads are dropped; neither
/// affects the connection.
pub fn dispatch(payload: &str) -> Option<LogEntry> {
    match MessageDecoder::decode(payload) {
        Ok(StreamMessage::Log(entry)) => Some(entry),
        Ok(StreamMessage::Heartbeat) => {
            trace!("heartbeat");
            None
        }
        Err(e) => {
            debug!(error = %e, "dropping undecodable stream message");
            None
        }
    }
}

async fn run_connection(
    client: reqwest::Client,
    url: String,
    policy: ReconnectPolicy,
    tx: mpsc::UnboundedSender<StreamEvent>,
    cancel: CancellationToken,
) {
    let mut reconnector = Reconnector::new(policy);
    let mut decoder = SseDecoder::new();

    loop {
        if tx.send(StreamEvent::Status(reconnector.begin_connect())).is_err() {
            return;
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = pump(&client, &url, &mut reconnector, &mut decoder, &tx) => result,
        };

        match result {
            Ok(PumpEnd::ReceiverGone) => return,
            Ok(PumpEnd::Eof) => debug!("log stream closed by server"),
            Err(e) => warn!(error = %e, "log stream failed"),
        }
        decoder.reset();

        match reconnector.on_error() {
            Retry::After { attempt, delay } => {
                debug!(attempt, ?delay, "scheduling reconnect");
                if tx.send(StreamEvent::Status(reconnector.state())).is_err() {
                    return;
                }
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Retry::GiveUp => {
                warn!(attempts = reconnector.attempts(), "giving up on log stream");
                let _ = tx.send(StreamEvent::Status(ConnectionState::Failed));
                return;
            }
        }
    }
}

async fn pump(
    client: &reqwest::Client,
    url: &str,
    reconnector: &mut Reconnector,
    decoder: &mut SseDecoder,
    tx: &mpsc::UnboundedSender<StreamEvent>,
) -> Result<PumpEnd, ConnectionError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ConnectionError::Status(response.status()));
    }

    if tx.send(StreamEvent::Status(reconnector.on_open())).is_err() {
        return Ok(PumpEnd::ReceiverGone);
    }

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for payload in decoder.push(&chunk) {
            if let Some(entry) = dispatch(&payload) {
                if tx.send(StreamEvent::Entry(entry)).is_err() {
                    return Ok(PumpEnd::ReceiverGone);
                }
            }
        }
    }

    Ok(PumpEnd::Eof)
}

/// Connect timeout suitable for a local relay
pub fn default_client() -> Result<reqwest::Client, ConnectionError> {
    Ok(reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_drops_heartbeat_and_garbage() {
        assert!(dispatch(r#"{"type": "heartbeat"}"#).is_none());
        assert!(dispatch("not json").is_none());
        let entry = dispatch(
            r#"{"timestamp": "2024-01-15T10:30:00Z", "type": "info", "message": "hi"}"#,
        )
        .unwrap();
        assert_eq!(entry.message, "hi");
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_after_budget() {
        // Reserve a port, then free it so nothing is listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let policy = ReconnectPolicy {
            base: Duration::from_millis(1),
            cap: Duration::from_millis(2),
            max_attempts: 2,
        };
        let mut manager = ConnectionManager::new(reqwest::Client::new(), policy);
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.connect(&format!("http://127.0.0.1:{port}/api/logs/stream"), tx);
        assert!(manager.is_running());

        let mut states = Vec::new();
        let collect = async {
            while let Some(StreamEvent::Status(state)) = rx.recv().await {
                states.push(state);
                if state.is_terminal() {
                    break;
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(10), collect)
            .await
            .unwrap();

        assert_eq!(
            states,
            vec![
                ConnectionState::Connecting,
                ConnectionState::Reconnecting {
                    attempt: 1,
                    delay: Duration::from_millis(1)
                },
                ConnectionState::Connecting,
                ConnectionState::Reconnecting {
                    attempt: 2,
                    delay: Duration::from_millis(2)
                },
                ConnectionState::Connecting,
                ConnectionState::Failed,
            ]
        );

        manager.stop();
        assert!(!manager.is_running());
        assert_eq!(
            rx.recv().await,
            Some(StreamEvent::Status(ConnectionState::Disconnected))
        );
    }
}
