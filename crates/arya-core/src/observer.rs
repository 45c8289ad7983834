//! Host-side view of the desktop.
//!
//! The recorder never talks to the window manager directly. Hosts implement
//! [`EnvironmentObserver`] over whatever shell API they have.

use crate::record::Observation;

/// Source of the currently focused application, window and workspace.
pub trait EnvironmentObserver {
    /// Focused application id, `None` for windows without an application.
    fn current_app(&self) -> Option<String>;

    /// Focused window title, `None` when nothing has focus.
    fn current_window_title(&self) -> Option<String>;

    /// Stable name of the active workspace.
    fn current_workspace(&self) -> String;

    /// Whether the session is locked.
    fn is_locked(&self) -> bool;

    /// Everything the record needs for one update.
    fn observe(&self) -> Observation {
        Observation {
            app: self.current_app(),
            window_title: self.current_window_title(),
            workspace: self.current_workspace(),
        }
    }
}

/// Observer that reports whatever it was last told.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedObserver {
    pub observation: Observation,
    pub locked: bool,
}

impl FixedObserver {
    pub const fn new(observation: Observation) -> Self {
        Self {
            observation,
            locked: false,
        }
    }
}

impl EnvironmentObserver for FixedObserver {
    fn current_app(&self) -> Option<String> {
        self.observation.app.clone()
    }

    fn current_window_title(&self) -> Option<String> {
        self.observation.window_title.clone()
    }

    fn current_workspace(&self) -> String {
        self.observation.workspace.clone()
    }

    fn is_locked(&self) -> bool {
        self.locked
    }

    fn observe(&self) -> Observation {
        self.observation.clone()
    }
}
