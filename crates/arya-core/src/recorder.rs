//! Signal-facing wrapper that owns one record and its persistence.
//!
//! Hosts forward focus, lock and menu notifications here, one at a time. The
//! recorder reads the desktop through an [`EnvironmentObserver`], applies the
//! change to its [`ActivityRecord`] and saves through a [`StateStore`] once
//! the configured interval has passed.

use std::io;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::config::TrackerConfig;
use crate::observer::EnvironmentObserver;
use crate::record::{ActivityRecord, Stats};
use crate::rules::RuleSet;
use crate::state::StateError;
use crate::store::StateStore;
use crate::summary::Summary;

/// Errors surfaced to the host.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The stored state could not be decoded or encoded.
    #[error(transparent)]
    State(#[from] StateError),

    #[error("failed to read activity state")]
    Read(#[source] io::Error),

    #[error("failed to write activity state")]
    Write(#[source] io::Error),

    #[error("failed to back up activity state")]
    Backup(#[source] io::Error),
}

/// Owns the activity record for one desktop session.
#[derive(Debug)]
pub struct Recorder<O, S> {
    observer: O,
    store: S,
    record: ActivityRecord,
    locked: bool,
    dirty: bool,
    last_saved: Option<DateTime<Utc>>,
    /// Restored blob, copied to the backup before it is first overwritten.
    pending_backup: Option<Vec<u8>>,
}

impl<O: EnvironmentObserver, S: StateStore> Recorder<O, S> {
    /// Restores the record from `store`, or starts a new one from the observer.
    ///
    /// A blob that fails to decode is an error; it is never replaced by an
    /// empty record and never backed up. A decoded blob is backed up on the
    /// first save, so a recorder that only reads leaves the backup alone.
    pub fn open(
        observer: O,
        mut store: S,
        rules: RuleSet,
        config: TrackerConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, RecorderError> {
        let Some(bytes) = store.read().map_err(RecorderError::Read)? else {
            return Ok(Self::start(observer, store, rules, config, now));
        };

        let record = ActivityRecord::from_slice(&bytes, rules, config, now)?;
        let locked = record.is_paused();

        Ok(Self {
            observer,
            store,
            record,
            locked,
            dirty: false,
            last_saved: None,
            pending_backup: Some(bytes),
        })
    }

    /// Starts a new session without reading the store.
    ///
    /// Whatever the store holds is replaced on the next save.
    pub fn start(
        observer: O,
        store: S,
        rules: RuleSet,
        config: TrackerConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = ActivityRecord::new(now, &observer.observe(), rules, config);
        let locked = observer.is_locked();
        if locked {
            record.pause(now);
        }

        Self {
            observer,
            store,
            record,
            locked,
            dirty: true,
            last_saved: None,
            pending_backup: None,
        }
    }

    pub const fn record(&self) -> &ActivityRecord {
        &self.record
    }

    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Lets the host refresh what the observer reports.
    pub const fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Focus moved to another window, application or workspace.
    pub fn focus_changed(&mut self, now: DateTime<Utc>) -> Result<bool, RecorderError> {
        self.update(now)
    }

    /// The menu opened: bring the record up to date and summarize it.
    pub fn menu_opened(&mut self, now: DateTime<Utc>) -> Result<Summary, RecorderError> {
        self.update(now)?;
        Ok(self.summary(now))
    }

    /// The lock state may have changed. Only an actual change pauses or resumes.
    pub fn lock_changed(&mut self, now: DateTime<Utc>) -> Result<bool, RecorderError> {
        let locked = self.observer.is_locked();
        if locked == self.locked {
            tracing::trace!(locked, "lock state unchanged");
            return Ok(false);
        }

        self.locked = locked;
        if locked {
            self.pause(now)
        } else {
            self.resume(now)
        }
    }

    pub fn update(&mut self, now: DateTime<Utc>) -> Result<bool, RecorderError> {
        let changed = self.record.update(now, &self.observer.observe());
        self.mark(changed, now)
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<bool, RecorderError> {
        let changed = self.record.pause(now);
        self.mark(changed, now)
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<bool, RecorderError> {
        let changed = self.record.resume(now, &self.observer.observe());
        self.mark(changed, now)
    }

    /// Discards all history and starts a new session from the current view.
    ///
    /// Rules and configuration carry over. The new record is saved at once.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Result<(), RecorderError> {
        tracing::info!(created = %self.record.created(), "clearing activity history");

        self.record = ActivityRecord::new(
            now,
            &self.observer.observe(),
            self.record.rules().clone(),
            self.record.config().clone(),
        );
        self.locked = self.observer.is_locked();
        if self.locked {
            self.record.pause(now);
        }
        self.save(now)
    }

    /// Applies a new rule document; optionally reclassifies project history.
    ///
    /// Returns whether the document was accepted.
    pub fn reload_rules(
        &mut self,
        document: &[u8],
        recalculate: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, RecorderError> {
        if !self.record.reload_rules(document) {
            return Ok(false);
        }
        if recalculate {
            self.record.recalculate_projects();
        }
        self.mark(true, now)?;
        Ok(true)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> Stats {
        self.record.stats(now)
    }

    pub fn summary(&self, now: DateTime<Utc>) -> Summary {
        Summary::from_stats(&self.stats(now), self.record.is_paused())
    }

    /// Writes the record to the store unconditionally.
    pub fn save(&mut self, now: DateTime<Utc>) -> Result<(), RecorderError> {
        let bytes = self.record.to_bytes()?;
        if let Some(previous) = &self.pending_backup {
            self.store.backup(previous).map_err(RecorderError::Backup)?;
            self.pending_backup = None;
        }
        self.store.write(&bytes).map_err(RecorderError::Write)?;
        self.dirty = false;
        self.last_saved = Some(now);
        Ok(())
    }

    /// Saves if there are unsaved changes and the persist interval has passed.
    pub fn persist_if_due(&mut self, now: DateTime<Utc>) -> Result<bool, RecorderError> {
        if !self.dirty {
            return Ok(false);
        }

        let interval = i64::try_from(self.record.config().persist_interval_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let due = self.last_saved.is_none_or(|saved| now - saved >= interval);
        if due {
            self.save(now)?;
        }
        Ok(due)
    }

    fn mark(&mut self, changed: bool, now: DateTime<Utc>) -> Result<bool, RecorderError> {
        self.dirty |= changed;
        self.persist_if_due(now)?;
        Ok(changed)
    }
}
