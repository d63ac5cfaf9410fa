use clap::Parser;
use course_scraper::app::App;
use course_scraper::cli::Args;
use course_scraper::config::Config;
use course_scraper::logging::setup_logging;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logging depends on the config, so config errors go straight to stderr.
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        "starting course-scraper"
    );

    match App::new(config).run(args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "run failed");
            ExitCode::FAILURE
        }
    }
}
