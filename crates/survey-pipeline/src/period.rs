//! Reporting period resolution
//!
//! A period is always a half-open interval `[start, end)` with `end > start`.
//! It comes from an explicit RFC 3339 pair, a calendar month, or defaults to
//! the previous full calendar month.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime,
    NaiveTime, Offset, TimeZone,
};
use serde::Serialize;
use std::fmt;
use survey_common::{ReportError, Result};
use tracing::debug;

/// Earliest accepted year in month mode
pub const MIN_YEAR: i32 = 2000;
/// Latest accepted year in month mode
pub const MAX_YEAR: i32 = 2100;

/// Canonical reporting interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl Period {
    fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Result<Self> {
        if end <= start {
            return Err(ReportError::invalid_period("end must be after start"));
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound
    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    /// Exclusive upper bound
    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    /// Bounds as wall-clock datetimes in their own offsets.
    ///
    /// The survey table stores naive local `DATETIME` values, so these are the
    /// values bound to the range query.
    pub fn local_bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        (self.start.naive_local(), self.end.naive_local())
    }

    /// `YYYY-MM` of the start
    pub fn label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }

    /// Calendar year of the start
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// Calendar month of the start
    pub fn month(&self) -> u32 {
        self.start.month()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Raw period inputs as supplied on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodRequest {
    pub start: Option<String>,
    pub end: Option<String>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl PeriodRequest {
    /// Explicit `[start, end)` request
    pub fn explicit(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
            ..Self::default()
        }
    }

    /// Calendar month request
    pub fn month(month: u32, year: i32) -> Self {
        Self {
            month: Some(month),
            year: Some(year),
            ..Self::default()
        }
    }

    /// Resolve against the local time zone and the wall clock
    pub fn resolve_local(&self) -> Result<Period> {
        self.resolve_at(&Local::now())
    }

    /// Resolve relative to `now`, building month bounds in `now`'s time zone
    pub fn resolve_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Period> {
        let start = non_blank(self.start.as_deref());
        let end = non_blank(self.end.as_deref());

        if start.is_some() || end.is_some() {
            let (Some(start), Some(end)) = (start, end) else {
                return Err(ReportError::invalid_period("use both --start and --end"));
            };
            debug!(start, end, "resolving explicit period");
            return Period::new(parse_bound("start", start)?, parse_bound("end", end)?);
        }

        let tz = now.timezone();

        if self.month.is_some() || self.year.is_some() {
            let month = self.month.unwrap_or(0);
            let year = self.year.unwrap_or(0);
            if !(1..=12).contains(&month) {
                return Err(ReportError::invalid_period("month must be 1..12"));
            }
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(ReportError::invalid_period(format!(
                    "year must be between {MIN_YEAR} and {MAX_YEAR}"
                )));
            }
            debug!(month, year, "resolving calendar month");
            return month_period(&tz, year, month);
        }

        let today = now.date_naive();
        let (year, month) = previous_month(today.year(), today.month());
        debug!(month, year, "defaulting to previous calendar month");
        month_period(&tz, year, month)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bound(name: &str, value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|e| {
        ReportError::invalid_period(format!("{name} {value:?} is not an RFC 3339 timestamp: {e}"))
    })
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn month_period<Tz: TimeZone>(tz: &Tz, year: i32, month: u32) -> Result<Period> {
    let (next_year, next) = next_month(year, month);
    Period::new(
        first_instant(tz, year, month)?,
        first_instant(tz, next_year, next)?,
    )
}

/// First existing instant of the 1st of a month in `tz`.
///
/// A midnight skipped by a DST jump resolves to the first valid quarter hour
/// after it; an ambiguous one resolves to the earlier instant.
fn first_instant<Tz: TimeZone>(tz: &Tz, year: i32, month: u32) -> Result<DateTime<FixedOffset>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ReportError::invalid_period(format!("{year}-{month:02} is not a calendar month"))
    })?;
    let mut wall = date.and_time(NaiveTime::MIN);

    for _ in 0..=(4 * 24) {
        match tz.from_local_datetime(&wall) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                return Ok(dt.with_timezone(&dt.offset().fix()));
            }
            LocalResult::None => wall += Duration::minutes(15),
        }
    }

    Err(ReportError::invalid_period(format!(
        "no valid local time on {date}"
    )))
}
