//! Runtime configuration
//!
//! Defaults point at the live disclosure page. Every value can be overridden
//! through `EXPOSURE_*` environment variables, and the binary lets command-line
//! flags override those in turn.

use crate::error::{FeedError, Result};
use crate::state::RefreshPolicy;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SOURCE_URL: &str =
    "https://www.covid19.act.gov.au/act-status-and-response/act-covid-19-exposure-locations";
pub const DEFAULT_CSV_PATTERN: &str = r"https://www[.]covid19[.]act[.]gov[.]au/.*?[.]csv";

/// Configuration for a single feed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Disclosure page, also the channel link of both feeds
    pub source_url: String,

    /// Regex locating the CSV link inside the page's scripts
    pub csv_pattern: String,

    /// Persisted state document
    pub state_path: PathBuf,

    pub detail_feed_path: PathBuf,
    pub summary_feed_path: PathBuf,

    /// HTTP timeout in seconds
    pub http_timeout_secs: u64,

    pub refresh_policy: RefreshPolicy,

    /// Timezone of the publishing jurisdiction, used for "today"
    pub timezone: Tz,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            csv_pattern: DEFAULT_CSV_PATTERN.to_string(),
            state_path: PathBuf::from("exposures.json"),
            detail_feed_path: PathBuf::from("exposures.xml"),
            summary_feed_path: PathBuf::from("summary.xml"),
            http_timeout_secs: 30,
            refresh_policy: RefreshPolicy::default(),
            timezone: chrono_tz::Australia::Sydney,
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| FeedError::config(format!("Invalid {key} '{raw}': {e}")))
        })
        .transpose()
}

impl FeedConfig {
    /// Defaults overlaid with `EXPOSURE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Overlay `EXPOSURE_*` environment variables onto this configuration
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(url) = env_var("EXPOSURE_SOURCE_URL") {
            self.source_url = url;
        }
        if let Some(pattern) = env_var("EXPOSURE_CSV_PATTERN") {
            self.csv_pattern = pattern;
        }
        if let Some(path) = env_var("EXPOSURE_STATE_PATH") {
            self.state_path = PathBuf::from(path);
        }
        if let Some(path) = env_var("EXPOSURE_DETAIL_FEED") {
            self.detail_feed_path = PathBuf::from(path);
        }
        if let Some(path) = env_var("EXPOSURE_SUMMARY_FEED") {
            self.summary_feed_path = PathBuf::from(path);
        }
        if let Some(secs) = env_parse("EXPOSURE_HTTP_TIMEOUT_SECS")? {
            self.http_timeout_secs = secs;
        }
        if let Some(policy) = env_parse("EXPOSURE_REFRESH_POLICY")? {
            self.refresh_policy = policy;
        }
        if let Some(timezone) = env_parse("EXPOSURE_TIMEZONE")? {
            self.timezone = timezone;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(FeedError::config("Source URL cannot be empty"));
        }
        if self.http_timeout_secs == 0 {
            return Err(FeedError::config("HTTP timeout must be greater than 0"));
        }
        if self.detail_feed_path == self.summary_feed_path
            || self.detail_feed_path == self.state_path
            || self.summary_feed_path == self.state_path
        {
            return Err(FeedError::config("State and feed paths must all differ"));
        }
        self.csv_regex()?;
        Ok(())
    }

    /// Compiled CSV link pattern
    pub fn csv_regex(&self) -> Result<Regex> {
        Ok(Regex::new(&self.csv_pattern)?)
    }

    /// Calendar date at the source at `now` (seconds since the epoch),
    /// following the jurisdiction's daylight saving rules
    pub fn today(&self, now: i64) -> Result<NaiveDate> {
        let instant = DateTime::from_timestamp(now, 0)
            .ok_or_else(|| FeedError::config(format!("Timestamp out of range: {now}")))?;
        Ok(instant.with_timezone(&self.timezone).date_naive())
    }
}
