//! # Survey Pipeline
//!
//! The data path of a monthly report: resolve the period, normalize and
//! deduplicate rows on their way into the export, then read the export back
//! into one answer distribution per question.

pub mod aggregate;
pub mod dedupe;
pub mod export;
pub mod normalize;
pub mod period;

pub use aggregate::{aggregate_export, aggregate_reader, AggregateOptions, QuestionDistribution};
pub use dedupe::{
    suppress_duplicates, DedupePolicy, DedupeStats, DuplicateSuppressor, SuppressorState, Verdict,
};
pub use export::{default_export_name, write_export, ExportOptions, ExportSink, ExportSummary, ExportWriter};
pub use normalize::{normalize_answer, normalize_recorder, Normalizer};
pub use period::{Period, PeriodRequest};
