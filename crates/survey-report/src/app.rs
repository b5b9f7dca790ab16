//! One report run: period → database → export → optional deck

use crate::cli::{Args, PptxTarget};
use crate::database::SurveyRepository;
use crate::error::{AppError, AppResult};
use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};
use survey_charts::{
    deck_title, default_document_name, ChartStyle, CommandAssembler, DeckBuilder, PieChartRenderer,
};
use survey_common::{LoggingConfig, ReportError, Stage};
use survey_config::{Config, ConfigError, ConfigLoader};
use survey_pipeline::{
    default_export_name, AggregateOptions, DedupePolicy, ExportOptions, ExportSink, ExportSummary,
    Normalizer, Period,
};
use tracing::{info, warn};

/// Loads the configuration file, then layers environment and flags over it.
pub fn load_config(args: &Args) -> AppResult<Config> {
    let mut config = ConfigLoader::load_from(args.config.as_deref())?;
    args.apply_to(&mut config);
    config.validate_all().map_err(ConfigError::from)?;
    Ok(config)
}

/// Subscriber settings for a run
pub fn logging_config(config: &Config) -> LoggingConfig {
    LoggingConfig {
        level: config.logging.level.clone(),
        json_format: config.logging.json,
        file_path: config.logging.file.clone(),
        ..LoggingConfig::default()
    }
}

/// A configured report run
pub struct App {
    args: Args,
    config: Config,
}

impl App {
    pub fn new(args: Args, config: Config) -> Self {
        Self { args, config }
    }

    pub async fn run(&self) -> AppResult<()> {
        if let Some(export) = &self.args.pptx_from {
            let Some(target) = self.args.pptx_target() else {
                return Err(AppError::Stage {
                    stage: Stage::Config,
                    source: ReportError::config("--pptx-from needs --pptx <path|auto>"),
                });
            };
            let today = Local::now().date_naive();
            return self.build_deck(export, &target, today.year(), today.month()).await;
        }

        let period = self
            .args
            .period_request()
            .resolve_local()
            .map_err(AppError::stage(Stage::Period))?;
        info!(%period, "period resolved");

        let out = self
            .args
            .out
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_export_name(&period)));
        let summary = self.export(&period, &out).await?;

        if self.config.export.dedupe {
            println!(
                "OK: {} rows exported (removed {} consecutive duplicates) to {} ({period})",
                summary.written,
                summary.dedupe.dropped,
                summary.path.display()
            );
        } else {
            println!(
                "OK: {} rows exported to {} ({period})",
                summary.written,
                summary.path.display()
            );
        }

        if let Some(target) = self.args.pptx_target() {
            self.build_deck(&summary.path, &target, period.year(), period.month())
                .await?;
        }
        Ok(())
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            delimiter: self.config.export.delimiter_byte(),
            bom: self.config.export.bom,
        }
    }

    /// Streams the period's rows from the database into the export file.
    async fn export(&self, period: &Period, out: &Path) -> AppResult<ExportSummary> {
        let connect_options = self.config.database.connect_options()?;
        let target = self.config.database.describe_target();
        let deadline = self.config.database.timeout();

        let export = &self.config.export;
        let mut sink = ExportSink::create(
            out,
            &self.export_options(),
            Normalizer::new(export.replace_codes),
            DedupePolicy::from_settings(export.dedupe, export.dedupe_tolerance_seconds),
        )
        .map_err(AppError::stage(Stage::Export))?;

        let round_trip = async {
            let repository = SurveyRepository::connect(connect_options, &target).await?;
            let fetched = repository
                .stream_rows(period, |row| {
                    sink.push(row)
                        .map(|_| ())
                        .map_err(AppError::stage(Stage::Export))
                })
                .await?;
            repository.close().await;
            Ok::<u64, AppError>(fetched)
        };

        let fetched = tokio::time::timeout(deadline, round_trip)
            .await
            .map_err(|_| AppError::Stage {
                stage: Stage::Database,
                source: ReportError::connectivity(format!(
                    "database round-trip to {target} exceeded {}s",
                    deadline.as_secs()
                )),
            })??;

        let summary = sink.finish().map_err(AppError::stage(Stage::Export))?;
        if fetched == 0 {
            warn!(%period, "no survey rows in period");
        }
        Ok(summary)
    }

    async fn build_deck(
        &self,
        export: &Path,
        target: &PptxTarget,
        year: i32,
        month: u32,
    ) -> AppResult<()> {
        let document = match target {
            PptxTarget::Auto => PathBuf::from(default_document_name(year, month)),
            PptxTarget::Path(path) => path.clone(),
        };
        let document = std::path::absolute(&document).unwrap_or(document);

        let builder = DeckBuilder::new(
            PieChartRenderer::new(ChartStyle::from(&self.config.charts)),
            CommandAssembler::from_config(&self.config.assembler),
            AggregateOptions {
                delimiter: self.config.export.delimiter_byte(),
                include_free_text: self.config.charts.include_free_text,
            },
        );
        let summary = builder
            .build(export, &document, &deck_title(year, month))
            .await?;

        println!(
            "OK: presentation built at {} (images in {})",
            summary.document.display(),
            summary.image_dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use survey_common::test_utils::create_temp_dir;

    fn args(list: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("survey-report").chain(list.iter().copied())).unwrap()
    }

    #[test]
    fn test_logging_config_from_settings() {
        let mut config = Config::default();
        config.logging.level = "survey_pipeline=debug".to_string();
        config.logging.json = true;
        let logging = logging_config(&config);
        assert_eq!(logging.level, "survey_pipeline=debug");
        assert!(logging.json_format);
        assert!(logging.file_path.is_none());
    }

    #[tokio::test]
    async fn test_invalid_month_fails_in_period_stage() {
        let app = App::new(args(&["--month", "13", "--year", "2024"]), Config::default());
        let err = app.run().await.unwrap_err();
        assert_eq!(err.failed_stage(), Some(Stage::Period));
    }

    #[tokio::test]
    async fn test_missing_database_target_leaves_no_export() {
        let dir = create_temp_dir();
        let out = dir.path().join("report.csv");
        let out_arg = out.to_string_lossy().into_owned();
        let app = App::new(
            args(&["--month", "3", "--year", "2024", "--out", &out_arg]),
            Config::default(),
        );

        let err = app.run().await.unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::MissingConfig(_))));
        assert!(!out.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_silent_server_times_out_and_leaves_no_export() {
        // Accepts the TCP handshake but never sends a MySQL greeting.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut config = Config::default();
        config.database.host = "127.0.0.1".to_string();
        config.database.port = port;
        config.database.name = "hospital".to_string();
        config.database.user = "report".to_string();
        config.database.timeout_seconds = 1;

        let dir = create_temp_dir();
        let out = dir.path().join("report.csv");
        let out_arg = out.to_string_lossy().into_owned();
        let app = App::new(
            args(&["--month", "3", "--year", "2024", "--out", &out_arg]),
            config,
        );

        let err = app.run().await.unwrap_err();
        assert_eq!(err.failed_stage(), Some(Stage::Database));
        assert!(err.to_string().contains("exceeded 1s"), "{err}");
        assert!(!out.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        drop(listener);
    }

    #[tokio::test]
    async fn test_pptx_from_missing_export_fails_in_aggregate() {
        let dir = create_temp_dir();
        let export = dir.path().join("missing.csv").to_string_lossy().into_owned();
        let document = dir.path().join("deck.pptx").to_string_lossy().into_owned();
        let app = App::new(
            args(&["--pptx-from", &export, "--pptx", &document]),
            Config::default(),
        );

        let err = app.run().await.unwrap_err();
        assert_eq!(err.failed_stage(), Some(Stage::Aggregate));
    }

    #[test]
    fn test_flags_win_over_config_file() {
        let dir = create_temp_dir();
        let path = dir.path().join("report.yaml");
        std::fs::write(&path, "export:\n  bom: true\n  dedupe_tolerance_seconds: 30\n").unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let config = load_config(&args(&["--config", &path_arg, "--bom", "false"])).unwrap();
        assert!(!config.export.bom);
        assert_eq!(config.export.dedupe_tolerance_seconds, 30);
    }

    #[test]
    fn test_invalid_flag_value_fails_validation() {
        let err = load_config(&args(&["--dedupe-sec", "999999"])).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::ValidationError(_))));
    }
}
