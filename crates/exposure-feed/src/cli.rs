//! Command-line interface definition
//!
//! Lives in the library so the docs task can render it without running the
//! binary.

use crate::config::FeedConfig;
use crate::error::Result;
use crate::state::RefreshPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "exposure-feed")]
#[command(author, version, about = "Publish ACT COVID-19 exposure sites as RSS feeds")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// State document path [env: EXPOSURE_STATE_PATH]
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Detail feed output path [env: EXPOSURE_DETAIL_FEED]
    #[arg(long, global = true, value_name = "PATH")]
    pub detail_feed: Option<PathBuf>,

    /// Summary feed output path [env: EXPOSURE_SUMMARY_FEED]
    #[arg(long, global = true, value_name = "PATH")]
    pub summary_feed: Option<PathBuf>,

    /// Whether known exposures take the latest field values (refresh, freeze)
    /// [env: EXPOSURE_REFRESH_POLICY]
    #[arg(long, global = true, value_name = "POLICY")]
    pub refresh_policy: Option<RefreshPolicy>,

    /// Run as if the current time were SECS since the Unix epoch
    #[arg(long, global = true, value_name = "SECS")]
    pub now: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the disclosure page, locate and download the CSV
    Fetch,

    /// Read a local CSV file instead of fetching
    Ingest {
        /// Input file
        file: PathBuf,

        /// Treat the file as a saved disclosure page and read its table
        #[arg(long)]
        html: bool,
    },
}

impl Cli {
    /// Apply command-line overrides on top of `config`
    pub fn apply(&self, mut config: FeedConfig) -> Result<FeedConfig> {
        if let Some(path) = &self.state {
            config.state_path = path.clone();
        }
        if let Some(path) = &self.detail_feed {
            config.detail_feed_path = path.clone();
        }
        if let Some(path) = &self.summary_feed {
            config.summary_feed_path = path.clone();
        }
        if let Some(policy) = self.refresh_policy {
            config.refresh_policy = policy;
        }
        config.validate()?;
        Ok(config)
    }
}
