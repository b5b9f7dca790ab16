//! Consecutive duplicate suppression
//!
//! A row is dropped when it repeats the last kept row: same non-empty patient
//! and a creation time within the configured tolerance. The lookback is a
//! single kept row, carried as [`SuppressorState`] through a fold.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use survey_common::SurveyRow;
use tracing::debug;

/// Timestamp layout of the creation column
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Upper bound applied to configured tolerances
pub const MAX_TOLERANCE_SECS: u64 = 86_400;

/// How two timestamps are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupePolicy {
    /// Keep every row
    Disabled,
    /// Timestamps must be identical strings
    Strict,
    /// Parsed timestamps may differ by at most this much
    Tolerance(Duration),
}

impl DedupePolicy {
    /// Builds a policy from the run settings; zero seconds means strict.
    pub fn from_settings(enabled: bool, tolerance_seconds: u64) -> Self {
        match (enabled, tolerance_seconds) {
            (false, _) => Self::Disabled,
            (true, 0) => Self::Strict,
            (true, secs) => Self::Tolerance(Duration::seconds(
                i64::try_from(secs.min(MAX_TOLERANCE_SECS)).unwrap_or(0),
            )),
        }
    }
}

impl Default for DedupePolicy {
    fn default() -> Self {
        Self::Tolerance(Duration::seconds(60))
    }
}

/// Verdict for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LastKept {
    patient: String,
    created: String,
    parsed: Option<NaiveDateTime>,
}

/// Lookback state: the identity and timestamp of the last kept row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressorState {
    last: Option<LastKept>,
}

/// Parses a creation timestamp; `None` means unknown
pub fn parse_created_at(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), CREATED_AT_FORMAT).ok()
}

impl SuppressorState {
    /// Decides one row and returns the state for the next.
    ///
    /// Dropped rows leave the state untouched; kept rows replace it.
    pub fn step(self, row: &SurveyRow, policy: &DedupePolicy) -> (Self, Verdict) {
        if *policy == DedupePolicy::Disabled {
            return (self, Verdict::Keep);
        }

        let patient = row.patient_name.trim();
        let created = row.created_at.trim();

        if let Some(last) = &self.last {
            if !patient.is_empty()
                && !created.is_empty()
                && patient == last.patient
                && timestamps_match(created, last, policy)
            {
                debug!(patient, created, previous = %last.created, "dropping consecutive duplicate");
                return (self, Verdict::Drop);
            }
        }

        let next = Self {
            last: Some(LastKept {
                patient: patient.to_string(),
                created: created.to_string(),
                parsed: parse_created_at(created),
            }),
        };
        (next, Verdict::Keep)
    }
}

fn timestamps_match(created: &str, last: &LastKept, policy: &DedupePolicy) -> bool {
    match policy {
        DedupePolicy::Disabled => false,
        DedupePolicy::Strict => created == last.created,
        DedupePolicy::Tolerance(tolerance) => match (parse_created_at(created), last.parsed) {
            (Some(current), Some(previous)) => (current - previous).abs() <= *tolerance,
            _ => created == last.created,
        },
    }
}

/// Kept/dropped counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupeStats {
    pub kept: u64,
    pub dropped: u64,
}

impl DedupeStats {
    fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Keep => self.kept += 1,
            Verdict::Drop => self.dropped += 1,
        }
    }
}

/// Streaming wrapper around [`SuppressorState`]
#[derive(Debug, Clone, Default)]
pub struct DuplicateSuppressor {
    policy: DedupePolicy,
    state: SuppressorState,
    stats: DedupeStats,
}

impl DuplicateSuppressor {
    pub fn new(policy: DedupePolicy) -> Self {
        Self {
            policy,
            state: SuppressorState::default(),
            stats: DedupeStats::default(),
        }
    }

    /// Whether `row` survives
    pub fn admit(&mut self, row: &SurveyRow) -> bool {
        let state = std::mem::take(&mut self.state);
        let (state, verdict) = state.step(row, &self.policy);
        self.state = state;
        self.stats.record(verdict);
        verdict == Verdict::Keep
    }

    pub fn stats(&self) -> DedupeStats {
        self.stats
    }
}

/// Drops consecutive duplicates from rows ordered by creation time.
pub fn suppress_duplicates<I>(rows: I, policy: &DedupePolicy) -> (Vec<SurveyRow>, DedupeStats)
where
    I: IntoIterator<Item = SurveyRow>,
{
    let (_, kept, stats) = rows.into_iter().fold(
        (SuppressorState::default(), Vec::new(), DedupeStats::default()),
        |(state, mut kept, mut stats), row| {
            let (state, verdict) = state.step(&row, policy);
            stats.record(verdict);
            if verdict == Verdict::Keep {
                kept.push(row);
            }
            (state, kept, stats)
        },
    );
    (kept, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use survey_common::test_utils::{row_fixtures::uniform_row, strategies};

    fn row(patient: &str, created: &str) -> SurveyRow {
        uniform_row(patient, created, "2")
    }

    fn tolerance(secs: u64) -> DedupePolicy {
        DedupePolicy::from_settings(true, secs)
    }

    #[test]
    fn test_policy_from_settings() {
        assert_eq!(DedupePolicy::from_settings(false, 60), DedupePolicy::Disabled);
        assert_eq!(DedupePolicy::from_settings(true, 0), DedupePolicy::Strict);
        assert_eq!(
            DedupePolicy::from_settings(true, 60),
            DedupePolicy::Tolerance(Duration::seconds(60))
        );
        assert_eq!(DedupePolicy::default(), tolerance(60));
    }

    #[test]
    fn test_within_tolerance_collapses() {
        let rows = vec![
            row("Ana", "2024-03-01 08:00:00"),
            row("Ana", "2024-03-01 08:00:30"),
        ];
        let (kept, stats) = suppress_duplicates(rows, &tolerance(60));
        assert_eq!(kept.len(), 1);
        assert_eq!(stats, DedupeStats { kept: 1, dropped: 1 });
    }

    #[test]
    fn test_outside_tolerance_keeps_both() {
        let rows = vec![
            row("Ana", "2024-03-01 08:00:00"),
            row("Ana", "2024-03-01 08:01:30"),
        ];
        let (kept, _) = suppress_duplicates(rows, &tolerance(60));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let rows = vec![
            row("Ana", "2024-03-01 08:00:00"),
            row("Ana", "2024-03-01 08:01:00"),
        ];
        let (kept, _) = suppress_duplicates(rows, &tolerance(60));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_strict_mode() {
        let rows = vec![
            row("Ana", "2024-03-01 08:00:00"),
            row("Ana", "2024-03-01 08:00:00"),
            row("Ana", "2024-03-01 08:00:01"),
        ];
        let (kept, stats) = suppress_duplicates(rows, &DedupePolicy::Strict);
        assert_eq!(kept.len(), 2);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn test_patient_identity_is_trimmed_and_exact() {
        let rows = vec![
            row(" Ana ", "2024-03-01 08:00:00"),
            row("Ana", "2024-03-01 08:00:10"),
            row("ana", "2024-03-01 08:00:20"),
        ];
        let (kept, _) = suppress_duplicates(rows, &tolerance(60));
        let patients: Vec<&str> = kept.iter().map(|r| r.patient_name.as_str()).collect();
        assert_eq!(patients, vec![" Ana ", "ana"]);
    }

    #[test]
    fn test_comparison_is_against_last_kept_row() {
        // 08:00:00 kept, 08:00:50 dropped, 08:01:40 is 100s from the kept row
        let rows = vec![
            row("Ana", "2024-03-01 08:00:00"),
            row("Ana", "2024-03-01 08:00:50"),
            row("Ana", "2024-03-01 08:01:40"),
        ];
        let (kept, _) = suppress_duplicates(rows, &tolerance(60));
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].created_at, "2024-03-01 08:01:40");
    }

    #[test]
    fn test_other_patient_breaks_the_run() {
        let rows = vec![
            row("Ana", "2024-03-01 08:00:00"),
            row("Bruno", "2024-03-01 08:00:05"),
            row("Ana", "2024-03-01 08:00:10"),
        ];
        let (kept, _) = suppress_duplicates(rows, &tolerance(60));
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_empty_identity_or_timestamp_is_always_kept() {
        let rows = vec![
            row("", "2024-03-01 08:00:00"),
            row("", "2024-03-01 08:00:00"),
            row("Ana", ""),
            row("Ana", ""),
        ];
        let (kept, stats) = suppress_duplicates(rows, &DedupePolicy::Strict);
        assert_eq!(kept.len(), 4);
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn test_unparseable_timestamps_fall_back_to_strict() {
        let rows = vec![
            row("Ana", "yesterday"),
            row("Ana", "yesterday"),
            row("Ana", "today"),
        ];
        let (kept, _) = suppress_duplicates(rows, &tolerance(60));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_disabled_keeps_everything() {
        let mut suppressor = DuplicateSuppressor::new(DedupePolicy::Disabled);
        let duplicate = row("Ana", "2024-03-01 08:00:00");
        assert!(suppressor.admit(&duplicate));
        assert!(suppressor.admit(&duplicate));
        assert_eq!(suppressor.stats(), DedupeStats { kept: 2, dropped: 0 });
    }

    #[test]
    fn test_streaming_matches_fold() {
        let rows = vec![
            row("Ana", "2024-03-01 08:00:00"),
            row("Ana", "2024-03-01 08:00:10"),
            row("Bruno", "2024-03-01 08:00:20"),
        ];
        let mut suppressor = DuplicateSuppressor::new(tolerance(60));
        let streamed: Vec<SurveyRow> = rows.iter().filter(|r| suppressor.admit(r)).cloned().collect();
        let (folded, stats) = suppress_duplicates(rows, &tolerance(60));
        assert_eq!(streamed, folded);
        assert_eq!(suppressor.stats(), stats);
    }

    proptest! {
        #[test]
        fn prop_counts_add_up(rows in proptest::collection::vec(strategies::survey_row(), 0..40), secs in 0u64..120) {
            let total = rows.len() as u64;
            let (kept, stats) = suppress_duplicates(rows, &tolerance(secs));
            prop_assert_eq!(stats.kept + stats.dropped, total);
            prop_assert_eq!(kept.len() as u64, stats.kept);
        }

        #[test]
        fn prop_suppression_is_idempotent(rows in proptest::collection::vec(strategies::survey_row(), 0..40)) {
            let (once, _) = suppress_duplicates(rows, &DedupePolicy::Strict);
            let (twice, stats) = suppress_duplicates(once.clone(), &DedupePolicy::Strict);
            prop_assert_eq!(stats.dropped, 0);
            prop_assert_eq!(once, twice);
        }
    }
}
