//! # Survey Charts
//!
//! One pie chart per survey question and the slide deck built from them.
//!
//! Rendering uses plotters on an in-memory bitmap, encoded to PNG with
//! `image`. The final document is produced by an external builder behind
//! the [`DocumentAssembler`] trait.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod assembler;
pub mod deck;
pub mod manifest;
pub mod pie;
pub mod style;
pub mod traits;

pub use assembler::{CommandAssembler, DocumentAssembler};
pub use deck::{default_document_name, image_dir_for, DeckBuilder, DeckError, DeckSummary};
pub use manifest::{deck_title, Manifest, SlideSpec};
pub use pie::{legend_entries, PieChartRenderer};
pub use style::{parse_color, ChartStyle};
pub use traits::ChartRenderer;
