use std::time::Duration;

/// Capped exponential backoff with a bounded number of attempts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect
    pub base: Duration,

    /// Upper bound on any single delay
    pub cap: Duration,

    /// Reconnects allowed before giving up
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Delay before the given reconnect attempt (1-based):
    /// `min(base * 2^(attempt-1), cap)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.cap, |delay| delay.min(self.cap))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            cap: Duration::from_millis(30_000),
            max_attempts: 10,
        }
    }
}

/// Connection lifecycle as seen by the viewer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Waiting `delay` before reconnect attempt number `attempt`
    Reconnecting { attempt: u32, delay: Duration },
    /// Attempt budget exhausted; no further automatic retries
    Failed,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting { .. } => "reconnecting",
            Self::Failed => "server unreachable",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// What to do after a transport error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retry {
    After { attempt: u32, delay: Duration },
    GiveUp,
}

/// The reconnect state machine, free of any I/O
#[derive(Clone, Debug)]
pub struct Reconnector {
    policy: ReconnectPolicy,
    attempts: u32,
    state: ConnectionState,
}

impl Reconnector {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Start (or restart) a connection attempt
    pub fn begin_connect(&mut self) -> ConnectionState {
        self.state = ConnectionState::Connecting;
        self.state
    }

    /// The socket opened; past failures are forgiven
    pub fn on_open(&mut self) -> ConnectionState {
        self.attempts = 0;
        self.state = ConnectionState::Connected;
        self.state
    }

    /// The socket failed or closed
    pub fn on_error(&mut self) -> Retry {
        if self.state == ConnectionState::Failed {
            return Retry::GiveUp;
        }
        if self.attempts < self.policy.max_attempts {
            self.attempts += 1;
            let delay = self.policy.delay_for(self.attempts);
            self.state = ConnectionState::Reconnecting {
                attempt: self.attempts,
                delay,
            };
            Retry::After {
                attempt: self.attempts,
                delay,
            }
        } else {
            self.state = ConnectionState::Failed;
            Retry::GiveUp
        }
    }
}
