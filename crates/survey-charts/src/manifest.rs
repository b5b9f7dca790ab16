//! Slide manifest handed to the document assembler

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use survey_common::{ReportError, Result};

/// File name of the manifest inside the image directory
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// One chart slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    pub title: String,
    /// Path of the rendered chart image
    pub image: PathBuf,
}

/// Deck title and slides in presentation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub title: String,
    pub slides: Vec<SlideSpec>,
}

impl Manifest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slides: Vec::new(),
        }
    }

    pub fn push(&mut self, title: impl Into<String>, image: impl Into<PathBuf>) {
        self.slides.push(SlideSpec {
            title: title.into(),
            image: image.into(),
        });
    }

    /// Writes the manifest as pretty-printed JSON.
    pub async fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| ReportError::io_with_source(format!("writing {}", path.display()), e))
    }
}

/// `Report YYYY-MM`
pub fn deck_title(year: i32, month: u32) -> String {
    format!("Report {year:04}-{month:02}")
}
