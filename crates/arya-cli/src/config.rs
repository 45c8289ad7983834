//! Configuration loading and management.

use std::path::{Path, PathBuf};

use arya_core::{LogLevel, TrackerConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the persisted activity state.
    pub state_path: PathBuf,
    /// Path to the project rule document.
    pub rules_path: PathBuf,
    pub track_apps: bool,
    pub track_workspaces: bool,
    pub track_projects: bool,
    pub log_level: LogLevel,
    pub persist_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let config_dir = dirs_config_path().unwrap_or_else(|| PathBuf::from("."));
        let tracker = TrackerConfig::default();
        Self {
            state_path: data_dir.join("activity.json"),
            rules_path: config_dir.join("projects.json"),
            track_apps: tracker.track_apps,
            track_workspaces: tracker.track_workspaces,
            track_projects: tracker.track_projects,
            log_level: tracker.log_level,
            persist_interval_secs: tracker.persist_interval_secs,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // ARYA_STATE_PATH, ARYA_TRACK_APPS, ...
        figment = figment.merge(Env::prefixed("ARYA_"));

        figment.extract()
    }

    /// The part of the configuration the recorder itself consumes.
    pub const fn tracker(&self) -> TrackerConfig {
        TrackerConfig {
            track_apps: self.track_apps,
            track_workspaces: self.track_workspaces,
            track_projects: self.track_projects,
            log_level: self.log_level,
            persist_interval_secs: self.persist_interval_secs,
        }
    }
}

/// Returns the platform-specific config directory for arya.
///
/// On Linux: `~/.config/arya`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("arya"))
}

/// Returns the platform-specific data directory for arya.
///
/// On Linux: `~/.local/share/arya`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("arya"))
}
