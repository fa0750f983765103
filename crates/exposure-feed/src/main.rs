//! Exposure Feed - publish exposure sites as RSS

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use exposure_common::logging::{init_logging, LogConfig, LogLevel};
use exposure_feed::cli::{Cli, Command};
use exposure_feed::config::FeedConfig;
use exposure_feed::pipeline;
use exposure_feed::source::{read_table, Fetcher, InputFormat};
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("exposure-feed")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;

    let _guard = init_logging(&log_config)?;

    let config = cli.apply(FeedConfig::from_env()?)?;
    let now = cli.now.unwrap_or_else(|| Utc::now().timestamp());

    let table = match &cli.command {
        Command::Fetch => {
            info!(url = %config.source_url, "Fetching disclosure page");
            Fetcher::new(&config)?.fetch_table().await?
        },
        Command::Ingest { file, html } => read_table(file, InputFormat::from_html_flag(*html))?,
    };

    let report = pipeline::run(&table, now, &config)?;

    if !report.rejections.is_empty() {
        warn!(count = report.rejections.len(), "Some rows were dropped");
    }
    if report.wrote_anything() {
        info!(
            added = report.added,
            evicted = report.evicted,
            "Contents changed, feeds regenerated"
        );
    }

    Ok(())
}
