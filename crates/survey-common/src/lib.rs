//! # Survey Common
//!
//! Shared types, errors, and logging for the survey report workspace.
//!
//! Every other crate in the workspace builds on the row and distribution
//! types defined here and reports failures through [`ReportError`].

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

// Re-export commonly used types
pub use error::{ReportError, Result};
pub use logging::{init_logging, LoggingConfig, LoggingGuard};
pub use types::*;
