//! Display records built from a stats snapshot.
//!
//! These are plain rows for a menu or terminal: sorted, rounded to whole
//! minutes and labelled. Rendering is left to the caller.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::Stats;
use crate::timeline::PAUSED;

const MINUTE_MS: i64 = 60_000;

/// One labelled row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageLine {
    pub name: String,
    pub millis: i64,
    pub minutes: i64,
    pub label: String,
}

/// Everything a menu shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub paused: bool,
    pub apps: Vec<UsageLine>,
    pub workspaces: Vec<UsageLine>,
    pub projects: Vec<UsageLine>,
    pub windows: Vec<UsageLine>,
    /// Whole minutes across listed applications, excluding paused time.
    pub total_minutes: i64,
    pub total_label: String,
}

/// Rounds milliseconds to the nearest whole minute.
pub const fn whole_minutes(millis: i64) -> i64 {
    (millis + MINUTE_MS / 2) / MINUTE_MS
}

/// Human label for a minute count: `"1 minute"`, `"42 minutes"`, `"1.5 hours"`.
#[expect(
    clippy::cast_precision_loss,
    reason = "minute counts stay far below f64's exact integer range"
)]
pub fn format_minutes(minutes: i64) -> String {
    if minutes > 60 {
        let hours = (minutes as f64 * 100.0 / 60.0).round() / 100.0;
        return format!("{hours} hours");
    }
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}

fn lines(totals: &BTreeMap<String, i64>, min_millis: i64) -> Vec<UsageLine> {
    let mut lines: Vec<UsageLine> = totals
        .iter()
        .filter(|&(_, &millis)| millis >= min_millis)
        .map(|(name, &millis)| {
            let minutes = whole_minutes(millis);
            UsageLine {
                name: name.clone(),
                millis,
                minutes,
                label: format_minutes(minutes),
            }
        })
        .collect();
    lines.sort_by(|a, b| b.millis.cmp(&a.millis).then_with(|| a.name.cmp(&b.name)));
    lines
}

impl Summary {
    /// Builds display rows. Applications under one minute are omitted.
    pub fn from_stats(stats: &Stats, paused: bool) -> Self {
        let apps = lines(&stats.apps, MINUTE_MS);
        let total_minutes = apps
            .iter()
            .filter(|line| line.name != PAUSED)
            .map(|line| line.minutes)
            .sum();

        Self {
            paused,
            apps,
            workspaces: lines(&stats.workspaces, 0),
            projects: lines(&stats.projects, 0),
            windows: lines(&stats.windows, 0),
            total_minutes,
            total_label: format_minutes(total_minutes),
        }
    }
}
