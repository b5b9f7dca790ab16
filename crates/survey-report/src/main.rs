//! Main entry point for the survey report.

use clap::Parser;
use std::process::ExitCode;
use survey_common::init_logging;
use survey_report::{load_config, logging_config, App, Args};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match init_logging(logging_config(&config)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: logging setup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.database.describe_target(),
        "starting survey report"
    );

    match App::new(args, config).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, stage = ?e.failed_stage(), "report failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
