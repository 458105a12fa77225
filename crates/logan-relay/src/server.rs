use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use crate::error::RelayError;

/// Port the relay tries first
pub const DEFAULT_PORT: u16 = 5000;

/// Idle time after which a subscriber gets a heartbeat
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);

/// How many ports past the requested one are tried
const PORT_SEARCH_SPAN: u16 = 100;

/// Entries buffered per subscriber before a slow one starts missing some
const CHANNEL_CAPACITY: usize = 1024;

/// Payload of the idle heartbeat frame
pub fn heartbeat_payload() -> String {
    json!({ "type": "heartbeat" }).to_string()
}

/// Shared relay state: one broadcast channel fanning entries out to subscribers
#[derive(Clone, Debug)]
pub struct RelayState {
    sender: broadcast::Sender<Arc<str>>,
    heartbeat: Duration,
}

impl RelayState {
    pub fn new(heartbeat: Duration) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender, heartbeat }
    }

    /// Forward one serialized entry to every connected subscriber
    pub fn publish(&self, payload: Arc<str>) -> usize {
        // No subscribers is fine
        self.sender.send(payload).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Event stream for one subscriber: every published entry, plus a
    /// heartbeat whenever nothing arrived for the heartbeat interval.
    fn subscribe(&self) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static + use<> {
        let stream = BroadcastStream::new(self.sender.subscribe());
        let heartbeat = self.heartbeat;

        futures::stream::unfold(stream, move |mut stream| async move {
            loop {
                match tokio::time::timeout(heartbeat, stream.next()).await {
                    Ok(Some(Ok(payload))) => {
                        return Some((Ok(Event::default().data(&*payload)), stream));
                    }
                    Ok(Some(Err(e))) => {
                        // Lagged: skip what was missed and keep going
                        debug!(error = %e, "subscriber fell behind");
                    }
                    Ok(None) => return None,
                    Err(_) => {
                        return Some((Ok(Event::default().data(heartbeat_payload())), stream));
                    }
                }
            }
        })
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT)
    }
}

/// Build the relay router
pub fn router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/log", post(receive_log))
        .route("/api/logs/stream", get(stream_logs))
        .layer(cors)
        .with_state(state)
}

async fn index() -> &'static str {
    "logan relay\n\nPOST log entries to /api/log\nstream them from /api/logs/stream (or run `logan view`)\n"
}

async fn receive_log(State(state): State<RelayState>, Json(entry): Json<Value>) -> Json<Value> {
    let delivered = state.publish(Arc::from(entry.to_string()));
    debug!(delivered, "relayed log entry");
    Json(json!({ "status": "ok" }))
}

async fn stream_logs(
    State(state): State<RelayState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(subscribers = state.subscriber_count() + 1, "stream subscriber connected");
    Sse::new(state.subscribe())
}

/// Bind the first free loopback port at or after `start`
pub async fn find_available_port(start: u16) -> Result<TcpListener, RelayError> {
    let end = start.saturating_add(PORT_SEARCH_SPAN);
    for port in start..=end {
        match TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => debug!(port, error = %e, "port unavailable"),
        }
    }
    Err(RelayError::NoFreePort { start, end })
}

/// Startup banner naming the viewer endpoints
pub fn banner(addr: SocketAddr) -> String {
    format!(
        "\n  logan relay is running\n\n  post logs to   http://{addr}/api/log\n  view logs with logan view --url http://{addr}/api/logs/stream\n"
    )
}

/// A running relay server
pub struct Relay {
    addr: SocketAddr,
    state: RelayState,
    shutdown: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<Result<(), RelayError>>,
}

impl Relay {
    /// Start on the first free port at or after `port`
    pub async fn start(port: u16, heartbeat: Duration) -> Result<Self, RelayError> {
        let listener = find_available_port(port).await?;
        if listener.local_addr()?.port() != port {
            warn!(requested = port, "requested port busy, using the next free one");
        }
        Self::serve(listener, RelayState::new(heartbeat))
    }

    /// Serve on an already bound listener
    pub fn serve(listener: TcpListener, state: RelayState) -> Result<Self, RelayError> {
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        let app = router(state.clone());

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await?;
            Ok::<(), RelayError>(())
        });

        info!(%addr, "relay listening");
        Ok(Self {
            addr,
            state,
            shutdown: Some(tx),
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL for emitters
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Push-stream URL for viewers
    pub fn stream_url(&self) -> String {
        format!("http://{}/api/logs/stream", self.addr)
    }

    pub fn state(&self) -> &RelayState {
        &self.state
    }

    /// Run until the server stops
    pub async fn wait(mut self) -> Result<(), RelayError> {
        let task = &mut self.task;
        match task.await {
            Ok(result) => result,
            Err(e) => Err(RelayError::Serve(std::io::Error::other(e))),
        }
    }

    /// Stop accepting connections and close open streams
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_payload() {
        assert_eq!(heartbeat_payload(), r#"{"type":"heartbeat"}"#);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let state = RelayState::default();
        assert_eq!(state.publish(Arc::from("{}")), 0);
        assert_eq!(state.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_find_available_port_skips_busy_port() {
        let busy = find_available_port(41_000).await.unwrap();
        let busy_port = busy.local_addr().unwrap().port();

        let next = find_available_port(busy_port).await.unwrap();
        assert!(next.local_addr().unwrap().port() > busy_port);
    }

    #[test]
    fn test_banner_names_endpoints() {
        let text = banner("127.0.0.1:5000".parse().unwrap());
        assert!(text.contains("http://127.0.0.1:5000/api/log"));
        assert!(text.contains("http://127.0.0.1:5000/api/logs/stream"));
    }
}
