//! # Survey Report
//!
//! Command line front end of the survey report pipeline.
//!
//! Loads configuration, streams a period of survey rows out of MySQL into a
//! delimited export and optionally turns that export into a chart deck.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod cli;
pub mod database;
pub mod error;

pub use app::{load_config, logging_config, App};
pub use cli::{Args, PptxTarget};
pub use error::{AppError, AppResult};
