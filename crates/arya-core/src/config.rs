//! Tracker configuration passed at construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Verbosity for the host's log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string understood by `tracing` filters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type for unknown log level strings.
#[derive(Debug, Clone)]
pub struct UnknownLogLevel(String);

impl fmt::Display for UnknownLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level: {}", self.0)
    }
}

impl std::error::Error for UnknownLogLevel {}

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(UnknownLogLevel(s.to_string())),
        }
    }
}

/// Which dimensions to track and how often to persist.
///
/// The window dimension is always tracked: project recomputation replays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub track_apps: bool,
    pub track_workspaces: bool,
    pub track_projects: bool,
    pub log_level: LogLevel,
    /// Minimum seconds between automatic saves. Zero saves after every change.
    pub persist_interval_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            track_apps: true,
            track_workspaces: true,
            track_projects: true,
            log_level: LogLevel::Info,
            persist_interval_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_roundtrip() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            let parsed: LogLevel = level.to_string().parse().expect("should parse");
            assert_eq!(parsed, level);
        }
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{"track_apps": false, "log_level": "debug"}"#).unwrap();

        assert!(!config.track_apps);
        assert!(config.track_workspaces);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.persist_interval_secs, 60);
    }
}
