//! Core activity recording for the desktop tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Timelines: per-dimension transition logs with lazily projected totals
//! - Rules: ordered regex classification of window titles into projects
//! - Records: the four-timeline state machine with pause/resume
//! - Persistence: the versioned state document and byte stores
//! - Recorder: the signal-facing wrapper hosts talk to

pub mod config;
pub mod observer;
pub mod record;
pub mod recorder;
pub mod rules;
pub mod state;
pub mod store;
pub mod summary;
pub mod timeline;

pub use config::{LogLevel, TrackerConfig};
pub use observer::{EnvironmentObserver, FixedObserver};
pub use record::{ActivityRecord, Observation, RecordState, Stats};
pub use recorder::{Recorder, RecorderError};
pub use rules::{NO_PROJECT, RULES_FORMAT_VERSION, RuleDocument, RuleError, RuleSet};
pub use state::{STATE_FORMAT_VERSION, StateDocument, StateError};
pub use store::{FileStore, MemoryStore, StateStore};
pub use summary::{Summary, UsageLine, format_minutes};
pub use timeline::{NO_FOCUS, PAUSED, Timeline, TimelineError, Transition};
