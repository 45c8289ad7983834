//! The activity record: four timelines driven by observed desktop state.
//!
//! Every external signal funnels into [`ActivityRecord::update`], which moves
//! the application, workspace, window and project timelines to whatever is
//! observed now. Each timeline ignores repeats on its own, so calling `update`
//! on every signal is cheap and idempotent.
//!
//! # Project accounting
//!
//! A window title matching an ignore pattern does not move the project
//! timeline; the previous project keeps accruing. The exception is resuming
//! from a pause: the project timeline sits at `PAUSED`, so an ignored title
//! resumes the most recent non-paused project instead of leaving the paused
//! interval open.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::TrackerConfig;
use crate::rules::{NO_PROJECT, RuleSet};
use crate::state::{STATE_FORMAT_VERSION, Section, StateDocument, StateError, StoredTimeline};
use crate::timeline::{NO_FOCUS, PAUSED, Timeline, normalize};

/// What the host reports as focused at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// Focused application id, `None` when no application window has focus.
    pub app: Option<String>,
    /// Focused window title, `None` when no window has focus.
    pub window_title: Option<String>,
    /// Stable workspace name.
    pub workspace: String,
}

impl Observation {
    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            app: None,
            window_title: None,
            workspace: workspace.into(),
        }
    }

    #[must_use]
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = Some(title.into());
        self
    }

    fn app_id(&self) -> &str {
        entity_id(self.app.as_deref())
    }

    fn title_id(&self) -> &str {
        entity_id(self.window_title.as_deref())
    }

    fn workspace_id(&self) -> &str {
        entity_id(Some(self.workspace.as_str()))
    }
}

fn entity_id(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NO_FOCUS)
}

/// Whether the record accepts updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordState {
    #[default]
    Active,
    Paused,
}

/// Point-in-time totals per dimension, in milliseconds.
///
/// The no-focus sentinel is excluded; `PAUSED` is reported like any entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub apps: BTreeMap<String, i64>,
    pub windows: BTreeMap<String, i64>,
    pub workspaces: BTreeMap<String, i64>,
    pub projects: BTreeMap<String, i64>,
}

/// Accumulated activity for one session.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    created: DateTime<Utc>,
    state: RecordState,
    apps: Timeline,
    windows: Timeline,
    workspaces: Timeline,
    projects: Timeline,
    rules: RuleSet,
    config: TrackerConfig,
}

/// Project of the first entry in a project timeline.
fn seed_project<'a>(rules: &'a RuleSet, title: &str) -> &'a str {
    if rules.should_ignore(title) {
        NO_PROJECT
    } else {
        rules.classify(title)
    }
}

/// Project the timeline should move to after observing `title`.
///
/// `None` means leave the project timeline where it is. A live title is
/// always classified, even one that reads `PAUSED`.
fn next_project(rules: &RuleSet, projects: &Timeline, title: &str) -> Option<String> {
    if !rules.should_ignore(title) {
        return Some(rules.classify(title).to_string());
    }
    if projects.current_id() == PAUSED {
        let resumed = projects.last_id_where(|id| id != PAUSED).unwrap_or(NO_PROJECT);
        return Some(resumed.to_string());
    }
    None
}

impl ActivityRecord {
    /// Starts a new session seeded with the current observation.
    pub fn new(
        now: DateTime<Utc>,
        observation: &Observation,
        rules: RuleSet,
        config: TrackerConfig,
    ) -> Self {
        let now = normalize(now);
        let title = observation.title_id();

        let app = if config.track_apps { observation.app_id() } else { NO_FOCUS };
        let workspace = if config.track_workspaces {
            observation.workspace_id()
        } else {
            NO_FOCUS
        };
        let project = if config.track_projects {
            seed_project(&rules, title)
        } else {
            NO_FOCUS
        };

        tracing::info!(%now, app, workspace, project, "started activity record");

        Self {
            created: now,
            state: RecordState::Active,
            apps: Timeline::new(now, app),
            windows: Timeline::new(now, title),
            workspaces: Timeline::new(now, workspace),
            projects: Timeline::new(now, project),
            rules,
            config,
        }
    }

    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub const fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == RecordState::Paused
    }

    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub const fn apps(&self) -> &Timeline {
        &self.apps
    }

    pub const fn windows(&self) -> &Timeline {
        &self.windows
    }

    pub const fn workspaces(&self) -> &Timeline {
        &self.workspaces
    }

    pub const fn projects(&self) -> &Timeline {
        &self.projects
    }

    /// Moves every tracked timeline to the observed state.
    ///
    /// Does nothing while paused. Returns whether any timeline changed.
    pub fn update(&mut self, now: DateTime<Utc>, observation: &Observation) -> bool {
        if self.is_paused() {
            tracing::trace!("ignoring update while paused");
            return false;
        }

        let now = normalize(now);
        let title = observation.title_id();
        let mut changed = false;

        if self.config.track_apps {
            changed |= self.apps.transition(now, observation.app_id());
        }
        if self.config.track_workspaces {
            changed |= self.workspaces.transition(now, observation.workspace_id());
        }
        changed |= self.windows.transition(now, title);
        if self.config.track_projects {
            if let Some(project) = next_project(&self.rules, &self.projects, title) {
                changed |= self.projects.transition(now, &project);
            } else {
                tracing::trace!(title, "ignored window title keeps current project");
            }
        }

        if changed {
            tracing::debug!(
                %now,
                app = self.apps.current_id(),
                workspace = self.workspaces.current_id(),
                project = self.projects.current_id(),
                "recorded transition"
            );
        }
        changed
    }

    /// Closes every open interval into a `PAUSED` interval.
    ///
    /// Pausing an already paused record does nothing and returns `false`.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_paused() {
            tracing::debug!("record already paused");
            return false;
        }

        let now = normalize(now);
        if self.config.track_apps {
            self.apps.transition(now, PAUSED);
        }
        if self.config.track_workspaces {
            self.workspaces.transition(now, PAUSED);
        }
        self.windows.transition(now, PAUSED);
        if self.config.track_projects {
            self.projects.transition(now, PAUSED);
        }
        self.state = RecordState::Paused;

        tracing::info!(%now, "paused activity record");
        true
    }

    /// Reactivates the record and immediately applies `observation`.
    ///
    /// Returns whether the record was paused.
    pub fn resume(&mut self, now: DateTime<Utc>, observation: &Observation) -> bool {
        let was_paused = self.is_paused();
        self.state = RecordState::Active;
        if was_paused {
            tracing::info!(now = %normalize(now), "resumed activity record");
        }
        self.update(now, observation);
        was_paused
    }

    /// Totals per dimension with open intervals closed at `now`.
    pub fn stats(&self, now: DateTime<Utc>) -> Stats {
        let visible = |timeline: &Timeline| {
            let mut totals = timeline.snapshot(now);
            totals.remove(NO_FOCUS);
            totals
        };

        Stats {
            apps: visible(&self.apps),
            windows: visible(&self.windows),
            workspaces: visible(&self.workspaces),
            projects: visible(&self.projects),
        }
    }

    /// Replaces the rule set. Existing history is left as classified.
    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }

    /// Loads a rule document, keeping the current rules if it is rejected.
    ///
    /// Returns whether the new rules were applied.
    pub fn reload_rules(&mut self, document: &[u8]) -> bool {
        match RuleSet::from_slice(document) {
            Ok(rules) => {
                tracing::info!(projects = rules.project_order().count(), "reloaded project rules");
                self.rules = rules;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "rejected project rules; keeping previous rules");
                false
            }
        }
    }

    /// Rebuilds the project timeline by reclassifying window history.
    pub fn recalculate_projects(&mut self) {
        if !self.config.track_projects {
            return;
        }

        let mut entries = self.windows.history().iter();
        // Window history is never empty.
        let Some(first) = entries.next() else {
            return;
        };

        // In window history the sentinel marks a pause, not a window title.
        let seed = if first.id == PAUSED {
            PAUSED
        } else {
            seed_project(&self.rules, &first.id)
        };
        let mut projects = Timeline::new(first.at, seed);
        for entry in entries {
            let next = if entry.id == PAUSED {
                Some(PAUSED.to_string())
            } else {
                next_project(&self.rules, &projects, &entry.id)
            };
            if let Some(project) = next {
                projects.transition(entry.at, &project);
            }
        }

        tracing::info!(
            before = self.projects.history().len(),
            after = projects.history().len(),
            "recalculated project history"
        );
        self.projects = projects;
    }

    /// Captures the full state as a versioned document.
    pub fn to_document(&self) -> StateDocument {
        let apps = StoredTimeline::capture(&self.apps);
        let windows = StoredTimeline::capture(&self.windows);
        let workspaces = StoredTimeline::capture(&self.workspaces);
        let projects = StoredTimeline::capture(&self.projects);

        StateDocument {
            format_version: STATE_FORMAT_VERSION,
            created: self.created,
            paused: self.is_paused(),
            app_usage_stat: apps.stat,
            app_usage_hist: apps.hist,
            window_usage_stat: windows.stat,
            window_usage_hist: windows.hist,
            workspace_usage_stat: workspaces.stat,
            workspace_usage_hist: workspaces.hist,
            project_usage_stat: projects.stat,
            project_usage_hist: projects.hist,
        }
    }

    /// Restores a record from a document, rebuilding totals from history.
    ///
    /// Dimensions that `config` no longer tracks are moved to the no-focus
    /// sentinel at `now`, so their last interval stops accruing.
    pub fn from_document(
        mut document: StateDocument,
        rules: RuleSet,
        config: TrackerConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, StateError> {
        let mut restore = |section: Section| document.take(section).restore(section.name());
        let apps = restore(Section::App)?;
        let windows = restore(Section::Window)?;
        let workspaces = restore(Section::Workspace)?;
        let projects = restore(Section::Project)?;

        let state = if document.paused {
            RecordState::Paused
        } else {
            RecordState::Active
        };

        tracing::debug!(
            created = %document.created,
            ?state,
            windows = windows.history().len(),
            "restored activity record"
        );

        let mut record = Self {
            created: normalize(document.created),
            state,
            apps,
            windows,
            workspaces,
            projects,
            rules,
            config,
        };
        record.park_untracked(now);
        Ok(record)
    }

    fn park_untracked(&mut self, now: DateTime<Utc>) {
        let now = normalize(now);
        let dimensions = [
            ("apps", self.config.track_apps, &mut self.apps),
            ("workspaces", self.config.track_workspaces, &mut self.workspaces),
            ("projects", self.config.track_projects, &mut self.projects),
        ];
        for (dimension, tracked, timeline) in dimensions {
            if !tracked && timeline.transition(now, NO_FOCUS) {
                tracing::info!(%now, dimension, "stopped tracking disabled dimension");
            }
        }
    }

    /// Encodes the record for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
        self.to_document().to_vec()
    }

    /// Decodes a stored record. Malformed input is an error, never an empty record.
    pub fn from_slice(
        bytes: &[u8],
        rules: RuleSet,
        config: TrackerConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, StateError> {
        Self::from_document(StateDocument::from_slice(bytes)?, rules, config, now)
    }
}
