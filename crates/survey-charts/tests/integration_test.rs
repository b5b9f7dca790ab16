//! Integration tests for survey-charts crate.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use survey_charts::{
    deck_title, image_dir_for, legend_entries, ChartRenderer, ChartStyle, DeckBuilder,
    DocumentAssembler, Manifest, PieChartRenderer,
};
use survey_common::test_utils::{create_temp_dir, init_test_logging, row_fixtures};
use survey_common::{Distribution, Result};
use survey_config::ChartsConfig;
use survey_pipeline::{write_export, AggregateOptions, DedupePolicy, ExportOptions, Normalizer};

struct BytesRenderer;

#[async_trait]
impl ChartRenderer for BytesRenderer {
    async fn render_to_bytes(&self, title: &str, _distribution: &Distribution) -> Result<Vec<u8>> {
        Ok(title.as_bytes().to_vec())
    }

    fn name(&self) -> &'static str {
        "bytes"
    }
}

/// Records every call and writes a placeholder document.
#[derive(Clone, Default)]
struct RecordingAssembler {
    calls: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
}

#[async_trait]
impl DocumentAssembler for RecordingAssembler {
    async fn assemble(&self, manifest: &Path, output: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((manifest.to_path_buf(), output.to_path_buf()));
        std::fs::write(output, b"deck")?;
        Ok(())
    }
}

#[tokio::test]
async fn test_export_to_deck() {
    init_test_logging();
    let dir = create_temp_dir();
    let export = dir.path().join("report_2024_03.csv");
    let rows = vec![
        row_fixtures::uniform_row("Ana", "2024-03-01 08:00:00", "4"),
        row_fixtures::uniform_row("Bruno", "2024-03-01 09:00:00", "2"),
    ];
    write_export(
        &export,
        rows,
        &ExportOptions::default(),
        Normalizer::new(true),
        DedupePolicy::default(),
    )
    .unwrap();

    let assembler = RecordingAssembler::default();
    let builder = DeckBuilder::new(BytesRenderer, assembler.clone(), AggregateOptions::default());
    let document = dir.path().join("report_2024_03.pptx");
    let summary = builder
        .build(&export, &document, &deck_title(2024, 3))
        .await
        .unwrap();

    assert_eq!(summary.slides, 18);
    assert_eq!(summary.image_dir, image_dir_for(&document));
    assert_eq!(std::fs::read(&document).unwrap(), b"deck");

    let calls = assembler.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![(summary.manifest.clone(), document.clone())]);

    let manifest: Manifest =
        serde_json::from_str(&std::fs::read_to_string(&summary.manifest).unwrap()).unwrap();
    assert_eq!(manifest.title, "Report 2024-03");
    let images: Vec<String> = manifest
        .slides
        .iter()
        .filter_map(|s| s.image.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(images.first().map(String::as_str), Some("q01.png"));
    assert!(!images.contains(&"q16.png".to_string()));
    assert!(!images.contains(&"q20.png".to_string()));
}

#[test]
fn test_legend_from_yes_no_counts() {
    let distribution: Distribution = [("Yes", 3), ("No", 1)].into_iter().collect();
    assert_eq!(
        legend_entries(&distribution),
        vec!["Yes (3 - 75.0%)".to_string(), "No (1 - 25.0%)".to_string()]
    );
}

#[test]
fn test_style_from_custom_config() {
    let config = ChartsConfig {
        width: 800,
        height: 600,
        palette: vec!["#000000".to_string(), "#FFFFFF".to_string()],
        ..ChartsConfig::default()
    };
    let style = ChartStyle::from(&config);
    assert_eq!((style.width, style.height), (800, 600));
    assert_eq!(style.slice_color(2), style.slice_color(0));
}

#[tokio::test]
#[ignore = "requires system fonts"]
async fn test_pie_renderer_writes_png() {
    let dir = create_temp_dir();
    let path = dir.path().join("q01.png");
    let distribution: Distribution = [("Excellent", 7), ("Good", 2), ("Poor", 1)].into_iter().collect();
    PieChartRenderer::default()
        .render_to_file("Reception", &distribution, &path)
        .await
        .unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));
}
