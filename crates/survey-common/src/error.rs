//! Error types and utilities for the survey report pipeline

use thiserror::Error;

/// Result type alias for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Main error type for report operations
#[derive(Error, Debug)]
pub enum ReportError {
    /// Bad or contradictory period inputs
    #[error("Invalid period: {message}")]
    InvalidPeriod { message: String },

    /// Database unreachable, query failure or deadline exceeded
    #[error("Connectivity error: {message}")]
    Connectivity {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File create/write/read failures
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Export missing expected columns or otherwise unreadable
    #[error("Malformed input: {message}")]
    MalformedInput {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A distribution with a zero total reached the renderer
    #[error("Empty distribution for {question}")]
    EmptyDistribution { question: String },

    /// An export without a single chartable answer
    #[error("No chart data: {message}")]
    NoData { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Chart drawing or image encoding errors
    #[error("Chart error: {message}")]
    Chart {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// External document assembler failures
    #[error("Assembler error: {message}")]
    Assembler {
        message: String,
        exit_code: Option<i32>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReportError {
    /// Create a new invalid period error
    pub fn invalid_period(msg: impl Into<String>) -> Self {
        Self::InvalidPeriod {
            message: msg.into(),
        }
    }

    /// Create a new connectivity error
    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new connectivity error with source
    pub fn connectivity_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connectivity {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new I/O error that says what was being done
    pub fn io_with_source(msg: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: msg.into(),
            source,
        }
    }

    /// Create a new malformed input error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new malformed input error with source
    pub fn malformed_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::MalformedInput {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new empty distribution error
    pub fn empty_distribution(question: impl Into<String>) -> Self {
        Self::EmptyDistribution {
            question: question.into(),
        }
    }

    /// Create a new no data error
    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoData {
            message: msg.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new chart error
    pub fn chart(msg: impl Into<String>) -> Self {
        Self::Chart {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new chart error with source
    pub fn chart_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Chart {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new assembler error carrying the process exit code
    pub fn assembler_exit(msg: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Assembler {
            message: msg.into(),
            exit_code,
            source: None,
        }
    }

    /// Create a new assembler error for a process that could not be started
    pub fn assembler_spawn(msg: impl Into<String>, source: std::io::Error) -> Self {
        Self::Assembler {
            message: msg.into(),
            exit_code: None,
            source: Some(source),
        }
    }
}

// Error conversion implementations for external types

/// Convert from std::io::Error to ReportError
impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        Self::io_with_source(err.to_string(), err)
    }
}

/// Convert from csv::Error to ReportError
///
/// Underlying I/O failures stay I/O errors; everything else means the file
/// is not the delimited export we expect.
impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io_err) => Self::io_with_source("Delimited file I/O failed", io_err),
                other => Self::malformed(format!("{other:?}")),
            }
        } else {
            let message = match err.position() {
                Some(pos) => format!("Unreadable delimited record at line {}", pos.line()),
                None => "Unreadable delimited record".to_string(),
            };
            Self::malformed_with_source(message, err)
        }
    }
}

#[cfg(feature = "plotters")]
/// Convert from plotters drawing errors to ReportError
impl<T> From<plotters::drawing::DrawingAreaErrorKind<T>> for ReportError
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<T>) -> Self {
        Self::chart_with_source("Chart rendering failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_error_creation() {
        let period_error = ReportError::invalid_period("use both --start and --end");
        assert_eq!(
            period_error.to_string(),
            "Invalid period: use both --start and --end"
        );

        let malformed = ReportError::malformed("export has 3 columns; expected >= 24");
        assert!(malformed.to_string().contains("Malformed input"));

        let empty = ReportError::empty_distribution("question 7");
        assert_eq!(empty.to_string(), "Empty distribution for question 7");

        let assembler = ReportError::assembler_exit("pptx builder exited with status 2", Some(2));
        assert!(matches!(
            assembler,
            ReportError::Assembler {
                exit_code: Some(2),
                ..
            }
        ));
    }

    #[test]
    fn test_error_with_source() {
        let io_error = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let wrapped = ReportError::connectivity_with_source("ping database", io_error);

        assert!(wrapped.to_string().contains("ping database"));
        assert!(wrapped.source().is_some());
        assert!(ReportError::connectivity("deadline exceeded")
            .source()
            .is_none());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let report_error: ReportError = io_error.into();

        assert!(report_error.to_string().contains("I/O error"));
        assert!(report_error.source().is_some());
    }

    #[test]
    fn test_csv_error_conversion() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(&b"a,b\nc\n"[..]);
        let err = reader
            .records()
            .find_map(|r| r.err())
            .expect("unequal lengths should error");

        let report_error: ReportError = err.into();
        assert!(matches!(report_error, ReportError::MalformedInput { .. }));
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_error = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let report_error: ReportError = serde_error.into();

        assert!(report_error.to_string().contains("Serialization error"));
    }
}
