//! Exposure Feed Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Change detection and RSS synthesis for the ACT COVID-19 exposure site list.
//!
//! # Pipeline
//!
//! - **Source**: fetch the disclosure page and its CSV, or read a local file
//! - **Schema**: validate the header and reorder columns canonically
//! - **Normalize**: canonical dates, times and casing; drop untrustworthy rows
//! - **Fingerprint**: stable content identity per exposure event
//! - **State**: reconcile against what earlier runs saw
//! - **Feed**: render the detail and summary channels
//!
//! # Example
//!
//! ```no_run
//! use exposure_feed::{config::FeedConfig, pipeline, source};
//!
//! fn main() -> exposure_feed::Result<()> {
//!     let config = FeedConfig::from_env()?;
//!     let table = source::read_table("exposures.csv", source::InputFormat::Csv)?;
//!     let report = pipeline::run(&table, chrono::Utc::now().timestamp(), &config)?;
//!     println!("{} new exposure sites", report.added);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod fingerprint;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod region;
pub mod schema;
pub mod source;
pub mod state;

pub use cli::Cli;
pub use error::{FeedError, InputSchemaError, Result};
pub use fingerprint::Fingerprint;
pub use record::Record;
pub use state::{RefreshPolicy, StateStore};
