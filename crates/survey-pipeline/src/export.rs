//! Delimited export writing

use crate::dedupe::{DedupePolicy, DedupeStats, DuplicateSuppressor};
use crate::normalize::Normalizer;
use crate::period::Period;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use survey_common::{export_header, ReportError, Result, SurveyRow};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Export file layout options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Field separator
    pub delimiter: u8,
    /// Whether to start with a UTF-8 byte-order mark
    pub bom: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            bom: true,
        }
    }
}

impl ExportOptions {
    /// Rejects separators that would collide with CSV quoting or line breaks.
    pub fn validate(&self) -> Result<()> {
        match self.delimiter {
            b',' | b'"' | b'\r' | b'\n' => Err(ReportError::config(format!(
                "delimiter {:?} is reserved",
                char::from(self.delimiter)
            ))),
            d if !d.is_ascii() => Err(ReportError::config("delimiter must be ASCII")),
            _ => Ok(()),
        }
    }
}

/// Writes the header and rows of an export to any byte sink
pub struct ExportWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> ExportWriter<W> {
    /// Writes the optional BOM and the header row.
    pub fn new(mut sink: W, options: &ExportOptions) -> Result<Self> {
        options.validate()?;
        if options.bom {
            sink.write_all(UTF8_BOM)
                .map_err(|e| ReportError::io_with_source("writing byte-order mark", e))?;
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(sink);
        writer.write_record(export_header())?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_row(&mut self, row: &SurveyRow) -> Result<()> {
        self.writer.write_record(row.to_record())?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flushes and hands back the sink.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| ReportError::io_with_source("flushing export", e.into_error()))
    }
}

/// Outcome of one export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub written: u64,
    pub dedupe: DedupeStats,
}

/// Normalizes, deduplicates and writes rows to an export file.
///
/// Rows go to a temporary file next to the destination, which is renamed
/// over it on [`ExportSink::finish`]. Dropping the sink discards the
/// partial file.
pub struct ExportSink {
    path: PathBuf,
    writer: ExportWriter<NamedTempFile>,
    normalizer: Normalizer,
    suppressor: DuplicateSuppressor,
}

impl ExportSink {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn create(
        path: impl AsRef<Path>,
        options: &ExportOptions,
        normalizer: Normalizer,
        policy: DedupePolicy,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = parent_dir(&path);
        std::fs::create_dir_all(&dir).map_err(|e| {
            ReportError::io_with_source(format!("creating directory {}", dir.display()), e)
        })?;
        let temp = NamedTempFile::new_in(&dir).map_err(|e| {
            ReportError::io_with_source(format!("creating temporary file in {}", dir.display()), e)
        })?;
        debug!(temp = %temp.path().display(), "writing export to temporary file");

        Ok(Self {
            path,
            writer: ExportWriter::new(temp, options)?,
            normalizer,
            suppressor: DuplicateSuppressor::new(policy),
        })
    }

    /// Accepts one row in creation order; returns whether it was written.
    pub fn push(&mut self, mut row: SurveyRow) -> Result<bool> {
        self.normalizer.apply(&mut row);
        if !self.suppressor.admit(&row) {
            return Ok(false);
        }
        self.writer.write_row(&row)?;
        Ok(true)
    }

    /// Flushes and atomically moves the export into place.
    pub fn finish(self) -> Result<ExportSummary> {
        let written = self.writer.rows_written();
        let temp = self.writer.finish()?;
        temp.as_file()
            .sync_all()
            .map_err(|e| ReportError::io_with_source("syncing export", e))?;
        temp.persist(&self.path).map_err(|e| {
            ReportError::io_with_source(format!("moving export to {}", self.path.display()), e.error)
        })?;

        let summary = ExportSummary {
            path: self.path,
            written,
            dedupe: self.suppressor.stats(),
        };
        info!(
            path = %summary.path.display(),
            written = summary.written,
            dropped = summary.dedupe.dropped,
            "export written"
        );
        Ok(summary)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Writes a whole row sequence to `path`.
pub fn write_export<I>(
    path: impl AsRef<Path>,
    rows: I,
    options: &ExportOptions,
    normalizer: Normalizer,
    policy: DedupePolicy,
) -> Result<ExportSummary>
where
    I: IntoIterator<Item = SurveyRow>,
{
    let mut sink = ExportSink::create(path, options, normalizer, policy)?;
    for row in rows {
        sink.push(row)?;
    }
    sink.finish()
}

/// `report_YYYY_MM.csv` for the period start
pub fn default_export_name(period: &Period) -> String {
    format!("report_{:04}_{:02}.csv", period.year(), period.month())
}
