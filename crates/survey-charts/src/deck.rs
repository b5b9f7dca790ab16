//! Export → per-question charts → manifest → document

use crate::assembler::DocumentAssembler;
use crate::manifest::{Manifest, MANIFEST_FILE_NAME};
use crate::traits::ChartRenderer;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use survey_common::{ReportError, Stage};
use survey_pipeline::{aggregate_export, AggregateOptions};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// A deck failure tagged with the step that failed
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct DeckError {
    pub stage: Stage,
    #[source]
    pub source: ReportError,
}

impl DeckError {
    fn at(stage: Stage) -> impl FnOnce(ReportError) -> Self {
        move |source| Self { stage, source }
    }
}

/// What a finished deck left on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSummary {
    pub document: PathBuf,
    pub image_dir: PathBuf,
    pub manifest: PathBuf,
    pub slides: usize,
}

/// `<document path without extension>_png`
pub fn image_dir_for(document: &Path) -> PathBuf {
    let mut dir: OsString = document.with_extension("").into_os_string();
    dir.push("_png");
    PathBuf::from(dir)
}

/// `report_YYYY_MM.pptx`
pub fn default_document_name(year: i32, month: u32) -> String {
    format!("report_{year:04}_{month:02}.pptx")
}

/// Builds a slide deck from an export file
pub struct DeckBuilder<R, A> {
    renderer: R,
    assembler: A,
    options: AggregateOptions,
}

impl<R: ChartRenderer, A: DocumentAssembler> DeckBuilder<R, A> {
    pub fn new(renderer: R, assembler: A, options: AggregateOptions) -> Self {
        Self {
            renderer,
            assembler,
            options,
        }
    }

    /// Renders one slide per chartable question and assembles `document`.
    ///
    /// Images and the manifest stay on disk even when assembly fails.
    #[instrument(skip_all, fields(export = %export.display(), document = %document.display()))]
    pub async fn build(
        &self,
        export: &Path,
        document: &Path,
        title: &str,
    ) -> Result<DeckSummary, DeckError> {
        let questions = aggregate_export(export, &self.options).map_err(DeckError::at(Stage::Aggregate))?;
        if questions.is_empty() {
            return Err(DeckError {
                stage: Stage::Aggregate,
                source: ReportError::no_data(format!(
                    "{} has no answers to chart",
                    export.display()
                )),
            });
        }

        let image_dir = image_dir_for(document);
        tokio::fs::create_dir_all(&image_dir).await.map_err(|e| DeckError {
            stage: Stage::Render,
            source: ReportError::io_with_source(format!("creating {}", image_dir.display()), e),
        })?;

        let mut manifest = Manifest::new(title);
        for question in &questions {
            let image = image_dir.join(format!("q{:02}.png", question.slot.number()));
            self.renderer
                .render_to_file(&question.title, &question.distribution, &image)
                .await
                .map_err(DeckError::at(Stage::Render))?;
            debug!(question = question.slot.number(), image = %image.display(), "slide rendered");
            manifest.push(question.title.clone(), image);
        }
        info!(
            slides = manifest.slides.len(),
            renderer = self.renderer.name(),
            "charts rendered"
        );

        let manifest_path = image_dir.join(MANIFEST_FILE_NAME);
        manifest
            .write(&manifest_path)
            .await
            .map_err(DeckError::at(Stage::Render))?;

        self.assembler
            .assemble(&manifest_path, document)
            .await
            .map_err(DeckError::at(Stage::Assemble))?;

        Ok(DeckSummary {
            document: document.to_path_buf(),
            image_dir,
            manifest: manifest_path,
            slides: manifest.slides.len(),
        })
    }
}
