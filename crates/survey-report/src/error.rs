//! Application-wide error types using thiserror.

use survey_charts::DeckError;
use survey_common::{ReportError, Stage};
use survey_config::ConfigError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// A pipeline stage failed.
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: ReportError,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The log subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl AppError {
    /// Tags a library error with the stage it came from.
    pub fn stage(stage: Stage) -> impl FnOnce(ReportError) -> Self {
        move |source| Self::Stage { stage, source }
    }

    /// The failing stage, when the error came from one.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            Self::Config(_) => Some(Stage::Config),
            Self::Logging(_) => None,
        }
    }
}

impl From<DeckError> for AppError {
    fn from(err: DeckError) -> Self {
        Self::Stage {
            stage: err.stage,
            source: err.source,
        }
    }
}

/// Result type for the report application.
pub type AppResult<T> = Result<T, AppError>;
