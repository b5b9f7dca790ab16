//! Per-question answer tallies read back from an export

use crate::normalize::normalize_answer;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use survey_common::{Distribution, QuestionSlot, ReportError, Result, EXPORT_COLUMNS};
use tracing::{debug, info, instrument};

/// How to read an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Field separator
    pub delimiter: u8,
    /// Tally free-text questions too, by raw answer text
    pub include_free_text: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            include_free_text: false,
        }
    }
}

/// Answers of one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionDistribution {
    pub slot: QuestionSlot,
    /// Title as found in the export header
    pub title: String,
    pub distribution: Distribution,
}

struct Tally {
    slot: QuestionSlot,
    title: String,
    map_codes: bool,
    distribution: Distribution,
}

/// Tallies every chartable question of the export in `reader`.
///
/// Questions without a single non-empty answer are left out.
pub fn aggregate_reader<R: Read>(
    reader: R,
    options: &AggregateOptions,
) -> Result<Vec<QuestionDistribution>> {
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(ReportError::malformed("export is empty; no header row")),
    };
    if header.len() < EXPORT_COLUMNS {
        return Err(ReportError::malformed(format!(
            "export has {} columns; expected >= {EXPORT_COLUMNS}",
            header.len()
        )));
    }

    let mut tallies: Vec<Tally> = QuestionSlot::all()
        .filter(|slot| options.include_free_text || !slot.is_free_text())
        .map(|slot| Tally {
            slot,
            title: header_title(&header, slot),
            map_codes: !slot.is_free_text(),
            distribution: Distribution::new(),
        })
        .collect();

    let mut rows = 0u64;
    for record in records {
        let record = record?;
        rows += 1;
        for tally in &mut tallies {
            let Some(cell) = record.get(tally.slot.column()) else {
                continue;
            };
            let value = cell.trim();
            if value.is_empty() {
                continue;
            }
            if tally.map_codes {
                tally.distribution.increment(normalize_answer(value).into_owned());
            } else {
                tally.distribution.increment(value);
            }
        }
    }

    let distributions: Vec<QuestionDistribution> = tallies
        .into_iter()
        .filter_map(|tally| {
            if tally.distribution.is_empty() {
                debug!(question = tally.slot.number(), "no answers, skipping");
                return None;
            }
            Some(QuestionDistribution {
                slot: tally.slot,
                title: tally.title,
                distribution: tally.distribution,
            })
        })
        .collect();

    info!(rows, questions = distributions.len(), "export aggregated");
    Ok(distributions)
}

/// Opens an export file and tallies it.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn aggregate_export(path: &Path, options: &AggregateOptions) -> Result<Vec<QuestionDistribution>> {
    let file = File::open(path)
        .map_err(|e| ReportError::io_with_source(format!("opening {}", path.display()), e))?;
    aggregate_reader(BufReader::new(file), options)
}

fn header_title(header: &csv::StringRecord, slot: QuestionSlot) -> String {
    // The BOM can only sit in the first field, which is never a question.
    let title = header
        .get(slot.column())
        .map(|t| t.trim_start_matches('\u{feff}').trim())
        .unwrap_or_default();
    if title.is_empty() {
        slot.title().to_string()
    } else {
        title.to_string()
    }
}
