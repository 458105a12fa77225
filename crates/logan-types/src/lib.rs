//! Shared types for logan
//!
//! This crate contains the log event model shared by the relay, the stream
//! client and the terminal viewer.

use chrono::{DateTime, Local};
use ratatui::style::Color;
use serde::{Deserialize, Deserializer, Serialize};

/// Namespace used when an event does not name one
pub const DEFAULT_NAMESPACE: &str = "global";

// ============================================================================
// Log Types
// ============================================================================

/// Log event type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
    Debug,
}

impl LogType {
    /// All types, in display order
    pub const ALL: [LogType; 4] = [Self::Info, Self::Warning, Self::Error, Self::Debug];

    /// Parse a type tag, accepting the short aliases emitters commonly use
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "inf" => Some(Self::Info),
            "warning" | "warn" | "wrn" => Some(Self::Warning),
            "error" | "err" => Some(Self::Error),
            "debug" | "dbg" => Some(Self::Debug),
            _ => None,
        }
    }

    /// Get display color for this type
    pub fn color(&self) -> Color {
        match self {
            Self::Info => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
            Self::Debug => Color::Cyan,
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INF",
            Self::Warning => "WRN",
            Self::Error => "ERR",
            Self::Debug => "DBG",
        }
    }

    /// Wire tag, as sent by emitters
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Debug => "debug",
        }
    }
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// One frame of the call site that produced an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFrame {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl CallFrame {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }
}

impl std::fmt::Display for CallFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} in {}()", self.file, self.line, self.function)
    }
}

/// Error attached to an error-type event
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Trace lines, rendered verbatim in order
    #[serde(default, deserialize_with = "null_as_default")]
    pub traceback: Vec<String>,
}

/// A single log event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the event was produced
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Local>,

    #[serde(rename = "type")]
    pub log_type: LogType,

    /// Logical source component
    #[serde(default = "default_namespace", deserialize_with = "namespace_or_default")]
    pub namespace: String,

    pub message: String,

    /// Call site, outermost frame first
    #[serde(default, deserialize_with = "null_as_default")]
    pub callstack: Vec<CallFrame>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionInfo>,
}

impl LogEntry {
    /// Create an entry stamped with the current local time
    pub fn new(log_type: LogType, namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            log_type,
            namespace: namespace.into(),
            message: message.into(),
            callstack: Vec::new(),
            exception: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_callstack(mut self, callstack: Vec<CallFrame>) -> Self {
        self.callstack = callstack;
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    /// First line of the message, for single-row display
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn namespace_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(default_namespace))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// ISO-8601 timestamps, with or without a UTC offset.
///
/// Values without an offset are taken to be local time, which is what
/// emitters in most languages produce by default.
pub mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(ts: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }

    /// Parse an ISO-8601 timestamp into local time
    pub fn parse(raw: &str) -> Option<DateTime<Local>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Local));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()?;
        Local.from_local_datetime(&naive).earliest()
    }
}
