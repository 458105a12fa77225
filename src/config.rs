//! Settings file and defaults

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use logan_logs::{DEFAULT_MAX_LOGS, DEFAULT_STREAM_URL, EmptySelection, ReconnectPolicy};
use logan_relay::{DEFAULT_HEARTBEAT, DEFAULT_PORT};
use logan_tui::SessionConfig;

/// Everything a settings file can set. Missing keys keep their defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub url: String,
    pub max_logs: usize,
    pub reconnect: ReconnectSettings,
    pub render: RenderSettings,
    pub filter: FilterSettings,
    pub relay: RelaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            max_logs: DEFAULT_MAX_LOGS,
            reconnect: ReconnectSettings::default(),
            render: RenderSettings::default(),
            filter: FilterSettings::default(),
            relay: RelaySettings::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReconnectSettings {
    pub base_ms: u64,
    pub cap_ms: u64,
    pub max_attempts: u32,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        let policy = ReconnectPolicy::default();
        Self {
            base_ms: policy.base.as_millis() as u64,
            cap_ms: policy.cap.as_millis() as u64,
            max_attempts: policy.max_attempts,
        }
    }
}

impl ReconnectSettings {
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base: Duration::from_millis(self.base_ms),
            cap: Duration::from_millis(self.cap_ms),
            max_attempts: self.max_attempts,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub coalesce_ms: u64,
    pub max_wait_ms: u64,
    pub auto_scroll: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            coalesce_ms: logan_tui::app::DEFAULT_COALESCE_WINDOW.as_millis() as u64,
            max_wait_ms: logan_tui::app::DEFAULT_MAX_WAIT.as_millis() as u64,
            auto_scroll: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// "all" or "none"
    pub empty_selection: String,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            empty_selection: "all".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    pub port: u16,
    pub heartbeat_secs: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            heartbeat_secs: DEFAULT_HEARTBEAT.as_secs(),
        }
    }
}

impl RelaySettings {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }
}

impl Settings {
    /// Load from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no session can run with
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.max_logs > 0, "max_logs must be at least 1");
        self.empty_selection()?;
        Ok(())
    }

    pub fn empty_selection(&self) -> Result<EmptySelection> {
        EmptySelection::parse(&self.filter.empty_selection).with_context(|| {
            format!(
                "filter.empty_selection must be \"all\" or \"none\", got {:?}",
                self.filter.empty_selection
            )
        })
    }

    pub fn session_config(&self) -> Result<SessionConfig> {
        Ok(SessionConfig {
            source: self.url.clone(),
            max_logs: self.max_logs,
            empty_selection: self.empty_selection()?,
            coalesce_window: Duration::from_millis(self.render.coalesce_ms),
            max_wait: Duration::from_millis(self.render.max_wait_ms),
            auto_scroll: self.render.auto_scroll,
        })
    }
}
