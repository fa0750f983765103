//! Feed synthesis
//!
//! Two views are published from a reconciliation:
//!
//! - **detail**: every currently tracked exposure, newest first
//! - **summary**: per-suburb counts of what this run added
//!
//! Synthesis is pure. Writing the rendered documents is the pipeline's job.

pub mod detail;
pub mod rss;
pub mod summary;

pub use detail::{detail_channel, detail_items};
pub use rss::{Channel, FeedItem};
pub use summary::{summary_channel, summary_items};

pub const DETAIL_TITLE: &str = "ACT Exposure Locations";
pub const SUMMARY_TITLE: &str = "ACT Exposure Summaries";
pub const FEED_DESCRIPTION: &str = "Feed scraped from ACT exposure website";
