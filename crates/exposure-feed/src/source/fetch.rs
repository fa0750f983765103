//! HTTP retrieval of the disclosure page and its CSV
//!
//! A failed request fails the run. There is no retry: the next scheduled run
//! simply tries again against unchanged state.

use super::csv_table::parse_csv;
use super::html::find_csv_link;
use crate::config::FeedConfig;
use crate::error::{FeedError, Result};
use crate::schema::RawTable;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("exposure-feed/", env!("CARGO_PKG_VERSION"));

/// Fetches the current disclosure table
pub struct Fetcher {
    client: Client,
    source_url: String,
    csv_pattern: Regex,
}

impl Fetcher {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            source_url: config.source_url.clone(),
            csv_pattern: config.csv_regex()?,
        })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        debug!(url, "Requesting");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.text().await?)
    }

    /// Locate the CSV link on the disclosure page
    pub async fn locate_csv(&self) -> Result<String> {
        let page = self.get_text(&self.source_url).await?;

        find_csv_link(&page, &self.csv_pattern)?.ok_or_else(|| FeedError::CsvLinkNotFound {
            url: self.source_url.clone(),
            pattern: self.csv_pattern.as_str().to_string(),
        })
    }

    /// Locate, download and tokenize the disclosure CSV
    pub async fn fetch_table(&self) -> Result<RawTable> {
        let csv_url = self.locate_csv().await?;
        info!(url = %csv_url, "Found CSV location");

        let text = self.get_text(&csv_url).await?;
        let table = parse_csv(&text)?;
        info!(rows = table.rows.len(), bytes = text.len(), "Downloaded CSV");

        Ok(table)
    }
}
