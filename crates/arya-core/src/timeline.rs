//! Per-dimension transition log with lazily projected durations.
//!
//! A [`Timeline`] records *when* the observed entity changed, not how long it
//! lasted. Closed intervals are folded into `cumulative` at transition time;
//! the interval that is still open is only added when a snapshot is taken, so
//! no background tick is needed to keep totals current.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Entity id used when nothing is focused.
pub const NO_FOCUS: &str = "-1";

/// Entity id covering the time the record spent paused.
pub const PAUSED: &str = "PAUSED";

/// Errors raised when rebuilding a timeline from stored history.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// Stored history had no entries.
    #[error("timeline history is empty")]
    Empty,

    /// An entry is older than the one before it.
    #[error("timeline history is out of order at entry {index}")]
    OutOfOrder { index: usize },
}

/// Truncates a timestamp to the millisecond precision used throughout.
pub fn normalize(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

/// Milliseconds from `from` to `to`, never negative.
fn elapsed_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds().max(0)
}

/// A single `(timestamp, entity id)` history entry.
///
/// Serialized as a two-element array: `["2025-01-01T09:00:00.000Z", "id"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub at: DateTime<Utc>,
    pub id: String,
}

impl Transition {
    pub fn new(at: DateTime<Utc>, id: impl Into<String>) -> Self {
        Self {
            at: normalize(at),
            id: id.into(),
        }
    }
}

impl Serialize for Transition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let at = self.at.to_rfc3339_opts(SecondsFormat::Millis, true);
        (at, &self.id).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Transition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (at, id) = <(String, String)>::deserialize(deserializer)?;
        let at = DateTime::parse_from_rfc3339(&at)
            .map_err(serde::de::Error::custom)?
            .with_timezone(&Utc);
        Ok(Self::new(at, id))
    }
}

/// Append-only transition log plus accumulated durations for closed intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    history: Vec<Transition>,
    cumulative: BTreeMap<String, i64>,
}

impl Timeline {
    /// Starts a timeline whose first open interval begins at `at`.
    pub fn new(at: DateTime<Utc>, id: impl Into<String>) -> Self {
        Self {
            history: vec![Transition::new(at, id)],
            cumulative: BTreeMap::new(),
        }
    }

    /// Rebuilds a timeline from stored history.
    ///
    /// `cumulative` is recomputed as the sum of every interval except the last,
    /// which stays open. Consecutive entries with the same id are merged.
    pub fn from_history(history: Vec<Transition>) -> Result<Self, TimelineError> {
        let mut entries = history.into_iter().enumerate();
        let Some((_, first)) = entries.next() else {
            return Err(TimelineError::Empty);
        };

        let mut timeline = Self {
            history: vec![first],
            cumulative: BTreeMap::new(),
        };
        for (index, entry) in entries {
            if entry.at < timeline.current().at {
                return Err(TimelineError::OutOfOrder { index });
            }
            timeline.transition(entry.at, &entry.id);
        }
        Ok(timeline)
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    /// Durations of closed intervals only.
    pub fn cumulative(&self) -> &BTreeMap<String, i64> {
        &self.cumulative
    }

    /// The entry whose interval is still open.
    pub fn current(&self) -> &Transition {
        // Every constructor seeds at least one entry and nothing removes them.
        &self.history[self.history.len() - 1]
    }

    pub fn current_id(&self) -> &str {
        &self.current().id
    }

    /// Timestamp of the first entry.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.history[0].at
    }

    /// Records a change to `id` at `at`.
    ///
    /// Returns `false` without touching anything when `id` is already current.
    /// A timestamp older than the current entry is clamped to it.
    pub fn transition(&mut self, at: DateTime<Utc>, id: &str) -> bool {
        let current = self.current();
        if current.id == id {
            return false;
        }
        let (since, previous) = (current.at, current.id.clone());

        let at = normalize(at).max(since);
        *self.cumulative.entry(previous).or_insert(0) += elapsed_ms(since, at);
        self.history.push(Transition::new(at, id));
        true
    }

    /// Accumulated durations with the open interval closed at `now`.
    pub fn snapshot(&self, now: DateTime<Utc>) -> BTreeMap<String, i64> {
        let current = self.current();
        let mut totals = self.cumulative.clone();
        *totals.entry(current.id.clone()).or_insert(0) += elapsed_ms(current.at, normalize(now));
        totals
    }

    /// Milliseconds from the first entry to `now`.
    pub fn span(&self, now: DateTime<Utc>) -> i64 {
        elapsed_ms(self.started_at(), normalize(now))
    }

    /// Most recent id, scanning backwards, that satisfies `accept`.
    pub fn last_id_where(&self, accept: impl Fn(&str) -> bool) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .map(|entry| entry.id.as_str())
            .find(|id| accept(id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn transition_to_same_id_is_noop() {
        let mut timeline = Timeline::new(t(0), "editor");
        timeline.transition(t(3), "browser");
        let before = timeline.clone();

        assert!(!timeline.transition(t(7), "browser"));
        assert_eq!(timeline, before);
        assert_eq!(timeline.history().len(), 2);
    }

    #[test]
    fn transition_closes_previous_interval() {
        let mut timeline = Timeline::new(t(0), "editor");
        assert!(timeline.transition(t(5), "browser"));
        assert!(timeline.transition(t(7), "editor"));

        assert_eq!(timeline.cumulative().get("editor"), Some(&300_000));
        assert_eq!(timeline.cumulative().get("browser"), Some(&120_000));
        assert_eq!(timeline.current_id(), "editor");
    }

    #[test]
    fn snapshot_projects_open_interval_without_mutation() {
        let mut timeline = Timeline::new(t(0), "editor");
        timeline.transition(t(5), "browser");

        let first = timeline.snapshot(t(6));
        let second = timeline.snapshot(t(8));

        assert_eq!(first.get("browser"), Some(&60_000));
        assert_eq!(second.get("browser"), Some(&180_000));
        assert_eq!(second.get("editor"), Some(&300_000));
        assert_eq!(timeline.cumulative().get("browser"), None);
    }

    #[test]
    fn snapshot_sums_to_span() {
        let mut timeline = Timeline::new(t(0), "a");
        for (minute, id) in [(1, "b"), (4, "a"), (4, "c"), (9, "b"), (10, "b"), (12, "d")] {
            timeline.transition(t(minute), id);
        }

        let total: i64 = timeline.snapshot(t(20)).values().sum();
        assert_eq!(total, timeline.span(t(20)));
        assert_eq!(total, 20 * 60_000);
    }

    #[test]
    fn out_of_order_timestamp_is_clamped() {
        let mut timeline = Timeline::new(t(10), "a");
        timeline.transition(t(5), "b");

        assert_eq!(timeline.current().at, t(10));
        assert_eq!(timeline.cumulative().get("a"), Some(&0));
    }

    #[test]
    fn sub_millisecond_precision_is_dropped() {
        let at = t(0) + Duration::nanoseconds(1_234_567);
        let timeline = Timeline::new(at, "a");
        assert_eq!(timeline.started_at(), t(0) + Duration::milliseconds(1));
    }

    #[test]
    fn from_history_rebuilds_closed_intervals() {
        let history = vec![
            Transition::new(t(0), "a"),
            Transition::new(t(2), "b"),
            Transition::new(t(3), "b"),
            Transition::new(t(6), "a"),
        ];
        let timeline = Timeline::from_history(history).unwrap();

        assert_eq!(timeline.history().len(), 3);
        assert_eq!(timeline.cumulative().get("a"), Some(&120_000));
        assert_eq!(timeline.cumulative().get("b"), Some(&240_000));
        assert_eq!(timeline.current_id(), "a");
    }

    #[test]
    fn from_history_rejects_bad_input() {
        assert_eq!(Timeline::from_history(vec![]), Err(TimelineError::Empty));

        let history = vec![
            Transition::new(t(5), "a"),
            Transition::new(t(1), "b"),
        ];
        assert_eq!(
            Timeline::from_history(history),
            Err(TimelineError::OutOfOrder { index: 1 })
        );
    }

    #[test]
    fn last_id_where_scans_backwards() {
        let mut timeline = Timeline::new(t(0), "a");
        timeline.transition(t(1), "b");
        timeline.transition(t(2), PAUSED);

        assert_eq!(timeline.last_id_where(|id| id != PAUSED), Some("b"));
        assert_eq!(timeline.last_id_where(|id| id == "zzz"), None);
    }

    #[test]
    fn transition_serializes_as_pair() {
        let entry = Transition::new(t(0) + Duration::milliseconds(42), "Main");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"["2025-01-06T09:00:00.042Z","Main"]"#);

        let parsed: Transition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn transition_rejects_bad_timestamp() {
        let result: Result<Transition, _> = serde_json::from_str(r#"["yesterday","Main"]"#);
        assert!(result.is_err());
    }
}
