use std::time::Duration;

use crossterm::event::{
    self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Terminal events
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Terminal tick (for periodic updates)
    Tick,
    /// Key press event
    Key(KeyEvent),
    /// Left button pressed at a screen row
    Click(u16),
    /// Mouse wheel, negative is up
    Wheel(i8),
    /// Terminal resize
    Resize(u16, u16),
    /// Error occurred
    Error(String),
}

impl Event {
    fn from_mouse(mouse: MouseEvent) -> Option<Self> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Self::Click(mouse.row)),
            MouseEventKind::ScrollUp => Some(Self::Wheel(-1)),
            MouseEventKind::ScrollDown => Some(Self::Wheel(1)),
            _ => None,
        }
    }
}

/// Event handler managing terminal input
pub struct EventHandler {
    /// Event receiver
    receiver: mpsc::UnboundedReceiver<Event>,
    /// Cancellation token for graceful shutdown
    cancel: CancellationToken,
}

impl EventHandler {
    /// Create a new event handler with the given tick rate
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        {
            let cancel = cancel.clone();

            tokio::spawn(async move {
                let mut reader = event::EventStream::new();
                let mut tick_interval = tokio::time::interval(tick_rate);

                loop {
                    let tick = tick_interval.tick();
                    let crossterm_event = reader.next().fuse();

                    tokio::select! {
                        _ = cancel.cancelled() => break,

                        _ = tick => {
                            let _ = sender.send(Event::Tick);
                        }

                        maybe_event = crossterm_event => {
                            let event = match maybe_event {
                                // Filter out release events (important for Windows)
                                Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                                    Some(Event::Key(key))
                                }
                                Some(Ok(CrosstermEvent::Mouse(mouse))) => Event::from_mouse(mouse),
                                Some(Ok(CrosstermEvent::Resize(w, h))) => Some(Event::Resize(w, h)),
                                Some(Ok(_)) => None,
                                Some(Err(e)) => Some(Event::Error(e.to_string())),
                                None => break,
                            };
                            if let Some(event) = event {
                                if sender.send(event).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
            });
        }

        Self { receiver, cancel }
    }

    /// Receive the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Shutdown the event handler
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
