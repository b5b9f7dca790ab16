//! Command line arguments

use clap::Parser;
use std::path::PathBuf;
use survey_config::Config;
use survey_pipeline::PeriodRequest;

/// Export a month of patient-experience surveys and optionally chart them.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level or filter directives
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// MySQL DSN; overrides MYSQL_DSN and the configuration file
    #[arg(long)]
    pub dsn: Option<String>,

    /// Export path; defaults to report_YYYY_MM.csv for the period
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Presentation output path, or `auto` for report_YYYY_MM.pptx
    #[arg(long, value_name = "PATH|auto")]
    pub pptx: Option<String>,

    /// Build the presentation from an existing export and skip the database
    #[arg(long, value_name = "EXPORT", requires = "pptx")]
    pub pptx_from: Option<PathBuf>,

    /// Period start (RFC 3339)
    #[arg(long)]
    pub start: Option<String>,

    /// Period end, exclusive (RFC 3339)
    #[arg(long)]
    pub end: Option<String>,

    /// Month number 1-12, alternative to --start/--end
    #[arg(long)]
    pub month: Option<u32>,

    /// Year, alternative to --start/--end
    #[arg(long)]
    pub year: Option<i32>,

    /// Replace answer codes with their labels
    #[arg(long)]
    pub replace: bool,

    /// Write a UTF-8 byte-order mark
    #[arg(long, value_name = "BOOL")]
    pub bom: Option<bool>,

    /// Drop consecutive duplicate submissions
    #[arg(long, value_name = "BOOL")]
    pub dedupe: Option<bool>,

    /// Duplicate window in seconds; 0 compares timestamps exactly
    #[arg(long, value_name = "SECONDS")]
    pub dedupe_sec: Option<u64>,
}

/// Where the presentation goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PptxTarget {
    /// Named after the reference month
    Auto,
    Path(PathBuf),
}

impl Args {
    /// Layers the flags that were given over `config`.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(dsn) = self.dsn.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            config.database.url = Some(dsn.to_string());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.replace {
            config.export.replace_codes = true;
        }
        if let Some(bom) = self.bom {
            config.export.bom = bom;
        }
        if let Some(dedupe) = self.dedupe {
            config.export.dedupe = dedupe;
        }
        if let Some(secs) = self.dedupe_sec {
            config.export.dedupe_tolerance_seconds = secs;
        }
    }

    pub fn period_request(&self) -> PeriodRequest {
        PeriodRequest {
            start: self.start.clone(),
            end: self.end.clone(),
            month: self.month,
            year: self.year,
        }
    }

    /// The presentation target, if one was asked for.
    pub fn pptx_target(&self) -> Option<PptxTarget> {
        let value = self.pptx.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        if value.eq_ignore_ascii_case("auto") {
            Some(PptxTarget::Auto)
        } else {
            Some(PptxTarget::Path(PathBuf::from(value)))
        }
    }
}
