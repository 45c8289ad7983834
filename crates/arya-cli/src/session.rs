//! Opening the persisted recorder for one CLI invocation.
//!
//! Hooks may fire concurrently (focus and lock notifications arrive close
//! together), so every invocation holds an exclusive lock beside the state
//! file while it reads, applies one signal and writes back.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arya_core::{FileStore, FixedObserver, Observation, Recorder, RuleSet, StateStore};
use chrono::{DateTime, Utc};
use fs2::FileExt;

use crate::Config;

/// A recorder fed by command-line arguments and backed by the state file.
pub type CliRecorder = Recorder<FixedObserver, FileStore>;

/// Recorder plus the lock guarding its state file.
pub struct Session {
    pub recorder: CliRecorder,
    _lock: File,
}

fn lock_path(state_path: &Path) -> PathBuf {
    let mut name = state_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Reads the rule document, if there is one.
pub fn read_rules(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Loads rules for recording. A missing or rejected document yields no rules.
fn load_rules(path: &Path) -> Result<RuleSet> {
    let Some(bytes) = read_rules(path)? else {
        tracing::debug!(path = ?path, "no rule document; every title is unclassified");
        return Ok(RuleSet::default());
    };

    Ok(RuleSet::from_slice(&bytes).unwrap_or_else(|err| {
        tracing::warn!(path = ?path, error = %err, "ignoring rejected rule document");
        RuleSet::default()
    }))
}

fn acquire(state_path: &Path) -> Result<File> {
    if let Some(parent) = state_path.parent() {
        fs::create_dir_all(parent).context("failed to create state directory")?;
    }

    let lock = File::create(lock_path(state_path)).context("failed to create lock file")?;
    lock.lock_exclusive().context("failed to acquire lock")?;
    Ok(lock)
}

impl Session {
    /// Locks the state file and restores the recorder from it.
    pub fn open(
        config: &Config,
        observation: Observation,
        locked: bool,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let lock = acquire(&config.state_path)?;
        let rules = load_rules(&config.rules_path)?;
        let observer = FixedObserver {
            observation,
            locked,
        };
        let store = FileStore::new(&config.state_path);

        let recorder = Recorder::open(observer, store, rules, config.tracker(), now)
            .with_context(|| format!("failed to restore {}", config.state_path.display()))?;

        Ok(Self {
            recorder,
            _lock: lock,
        })
    }

    /// Locks the state file and starts a new session over it.
    ///
    /// The previous state, readable or not, is copied to the backup first.
    pub fn start(
        config: &Config,
        observation: Observation,
        locked: bool,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let lock = acquire(&config.state_path)?;
        let rules = load_rules(&config.rules_path)?;
        let observer = FixedObserver {
            observation,
            locked,
        };
        let mut store = FileStore::new(&config.state_path);

        if let Some(previous) = store
            .read()
            .with_context(|| format!("failed to read {}", config.state_path.display()))?
        {
            store
                .backup(&previous)
                .with_context(|| format!("failed to back up {}", config.state_path.display()))?;
        }

        Ok(Self {
            recorder: Recorder::start(observer, store, rules, config.tracker(), now),
            _lock: lock,
        })
    }

    /// Writes the record back before the lock is released.
    pub fn close(mut self, now: DateTime<Utc>) -> Result<()> {
        self.recorder
            .save(now)
            .with_context(|| format!("failed to save {}", self.recorder.store().path().display()))
    }
}
