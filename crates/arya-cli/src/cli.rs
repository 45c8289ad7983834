//! Command-line argument definitions.

use std::path::PathBuf;

use arya_core::Observation;
use clap::{Args, Parser, Subcommand};

/// Automatic recorder of your activity.
///
/// Accumulates time per application, window, workspace and project from
/// focus and lock notifications sent by the desktop session.
#[derive(Debug, Parser)]
#[command(name = "arya", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// What the desktop currently has focused.
#[derive(Debug, Clone, Args)]
pub struct FocusArgs {
    /// Focused application id (e.g., firefox.desktop). Omit when none.
    #[arg(long)]
    pub app: Option<String>,

    /// Focused window title. Omit when no window has focus.
    #[arg(long)]
    pub title: Option<String>,

    /// Name of the active workspace.
    #[arg(long, default_value = "Main")]
    pub workspace: String,
}

impl FocusArgs {
    pub fn observation(&self) -> Observation {
        Observation {
            app: self.app.clone(),
            window_title: self.title.clone(),
            workspace: self.workspace.clone(),
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a focus change.
    Observe {
        #[command(flatten)]
        focus: FocusArgs,

        /// When it happened: ISO 8601 or relative (e.g., '2 minutes ago').
        #[arg(long)]
        at: Option<String>,
    },

    /// Record that the session was locked.
    Lock {
        /// When it happened: ISO 8601 or relative.
        #[arg(long)]
        at: Option<String>,
    },

    /// Record that the session was unlocked.
    Unlock {
        #[command(flatten)]
        focus: FocusArgs,

        /// When it happened: ISO 8601 or relative.
        #[arg(long)]
        at: Option<String>,
    },

    /// Show accumulated usage.
    Stats {
        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Close open intervals at this time instead of now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Clear all history and start a new session.
    Reset {
        #[command(flatten)]
        focus: FocusArgs,

        /// When the new session starts: ISO 8601 or relative.
        #[arg(long)]
        at: Option<String>,
    },

    /// Inspect or apply project rules.
    #[command(subcommand)]
    Rules(RulesAction),
}

/// Project rule actions.
#[derive(Debug, Subcommand)]
pub enum RulesAction {
    /// Validate the rule document and show evaluation order.
    Check {
        /// Rule document to check instead of the configured one.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Reload rules and reclassify recorded window history into projects.
    Recompute,
}
