//! Focus and lock notifications from the desktop session.
//!
//! Each invocation applies one signal to the stored record and writes it back.

use anyhow::Result;
use arya_core::Observation;
use chrono::{DateTime, Utc};

use crate::session::Session;
use crate::{Config, FocusArgs};

/// Records that focus moved to `focus`.
pub fn focus(config: &Config, focus: &FocusArgs, at: DateTime<Utc>) -> Result<()> {
    let mut session = Session::open(config, focus.observation(), false, at)?;
    if session.recorder.focus_changed(at)? {
        tracing::debug!(?focus, "focus recorded");
    } else if session.recorder.record().is_paused() {
        tracing::debug!("record is paused; focus ignored");
    }
    session.close(at)
}

/// Records that the session was locked.
pub fn lock(config: &Config, at: DateTime<Utc>) -> Result<()> {
    let mut session = Session::open(config, Observation::default(), true, at)?;
    if !session.recorder.lock_changed(at)? {
        tracing::debug!("already locked");
    }
    session.close(at)
}

/// Records that the session was unlocked with `focus` in front.
pub fn unlock(config: &Config, focus: &FocusArgs, at: DateTime<Utc>) -> Result<()> {
    let mut session = Session::open(config, focus.observation(), false, at)?;
    if !session.recorder.lock_changed(at)? {
        tracing::debug!("not locked");
    }
    session.close(at)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use arya_core::{NO_PROJECT, PAUSED};
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn config(dir: &Path) -> Config {
        Config {
            state_path: dir.join("activity.json"),
            rules_path: dir.join("projects.json"),
            track_apps: true,
            track_workspaces: true,
            track_projects: true,
            log_level: arya_core::LogLevel::Info,
            persist_interval_secs: 60,
        }
    }

    fn focus_on(app: &str, title: &str) -> FocusArgs {
        FocusArgs {
            app: Some(app.to_string()),
            title: Some(title.to_string()),
            workspace: "Main".to_string(),
        }
    }

    fn stats_at(config: &Config, at: DateTime<Utc>) -> arya_core::Stats {
        Session::open(config, Observation::default(), false, at)
            .unwrap()
            .recorder
            .stats(at)
    }

    #[test]
    fn focus_changes_accumulate_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        focus(&config, &focus_on("gedit.desktop", "notes.txt"), t(0)).unwrap();
        focus(&config, &focus_on("firefox.desktop", "News"), t(3)).unwrap();

        let stats = stats_at(&config, t(5));
        assert_eq!(stats.apps.get("gedit.desktop"), Some(&180_000));
        assert_eq!(stats.apps.get("firefox.desktop"), Some(&120_000));
        assert_eq!(stats.projects.get(NO_PROJECT), Some(&300_000));
    }

    #[test]
    fn lock_and_unlock_record_paused_time() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        focus(&config, &focus_on("gedit.desktop", "notes.txt"), t(0)).unwrap();
        lock(&config, t(2)).unwrap();
        lock(&config, t(3)).unwrap();
        focus(&config, &focus_on("firefox.desktop", "News"), t(4)).unwrap();
        unlock(&config, &focus_on("gedit.desktop", "notes.txt"), t(6)).unwrap();

        let stats = stats_at(&config, t(7));
        assert_eq!(stats.apps.get(PAUSED), Some(&240_000));
        assert_eq!(stats.apps.get("gedit.desktop"), Some(&180_000));
        assert!(!stats.apps.contains_key("firefox.desktop"));
    }
}
