//! Versioned persisted form of an activity record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeline::{Timeline, TimelineError, Transition};

/// Current persisted state format.
pub const STATE_FORMAT_VERSION: u32 = 1;

/// Errors raised while encoding or decoding persisted state.
#[derive(Debug, Error)]
pub enum StateError {
    /// The blob is not valid JSON for the state schema.
    #[error("failed to parse activity state: {0}")]
    Parse(#[source] serde_json::Error),

    /// The record could not be encoded.
    #[error("failed to serialize activity state: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The blob was written by an unknown format version.
    #[error("unsupported activity state version: {}", .found.map_or_else(|| "<missing>".to_string(), |v| v.to_string()))]
    UnsupportedVersion { found: Option<u32> },

    /// A stored history violates timeline invariants.
    #[error("invalid {section} history")]
    Timeline {
        section: &'static str,
        #[source]
        source: TimelineError,
    },
}

/// One timeline as stored: closed-interval totals plus the transition log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredTimeline {
    pub stat: BTreeMap<String, i64>,
    pub hist: Vec<Transition>,
}

impl StoredTimeline {
    pub(crate) fn capture(timeline: &Timeline) -> Self {
        Self {
            stat: timeline.cumulative().clone(),
            hist: timeline.history().to_vec(),
        }
    }

    /// Rebuilds the timeline from `hist`; `stat` is only cross-checked.
    pub(crate) fn restore(self, section: &'static str) -> Result<Timeline, StateError> {
        let timeline = Timeline::from_history(self.hist)
            .map_err(|source| StateError::Timeline { section, source })?;
        if timeline.cumulative() != &self.stat {
            tracing::warn!(
                section,
                "stored totals disagree with history; using totals rebuilt from history"
            );
        }
        Ok(timeline)
    }
}

/// The persisted state document.
///
/// Each dimension is flattened into a `*UsageStat` map of closed-interval
/// milliseconds and a `*UsageHist` list of `[timestamp, id]` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    pub format_version: u32,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub paused: bool,
    pub app_usage_stat: BTreeMap<String, i64>,
    pub app_usage_hist: Vec<Transition>,
    pub window_usage_stat: BTreeMap<String, i64>,
    pub window_usage_hist: Vec<Transition>,
    pub workspace_usage_stat: BTreeMap<String, i64>,
    pub workspace_usage_hist: Vec<Transition>,
    pub project_usage_stat: BTreeMap<String, i64>,
    pub project_usage_hist: Vec<Transition>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionProbe {
    format_version: Option<u32>,
}

impl StateDocument {
    /// Decodes a state blob, checking the format version before the schema.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, StateError> {
        let probe: VersionProbe = serde_json::from_slice(bytes).map_err(StateError::Parse)?;
        if probe.format_version != Some(STATE_FORMAT_VERSION) {
            return Err(StateError::UnsupportedVersion {
                found: probe.format_version,
            });
        }
        serde_json::from_slice(bytes).map_err(StateError::Parse)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, StateError> {
        serde_json::to_vec_pretty(self).map_err(StateError::Serialize)
    }

    pub(crate) fn take(&mut self, section: Section) -> StoredTimeline {
        let (stat, hist) = match section {
            Section::App => (&mut self.app_usage_stat, &mut self.app_usage_hist),
            Section::Window => (&mut self.window_usage_stat, &mut self.window_usage_hist),
            Section::Workspace => (&mut self.workspace_usage_stat, &mut self.workspace_usage_hist),
            Section::Project => (&mut self.project_usage_stat, &mut self.project_usage_hist),
        };
        StoredTimeline {
            stat: std::mem::take(stat),
            hist: std::mem::take(hist),
        }
    }
}

/// Named sections of the state document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    App,
    Window,
    Workspace,
    Project,
}

impl Section {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::App => "appUsage",
            Self::Window => "windowUsage",
            Self::Workspace => "workspaceUsage",
            Self::Project => "projectUsage",
        }
    }
}
