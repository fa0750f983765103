//! One feed run, from raw table to published files
//!
//! The run is strictly sequential: validate the header, normalize rows,
//! fingerprint, enrich, reconcile against stored state, then publish only when
//! the tracked set changed. Feeds are written before state so an interrupted
//! publish is retried in full by the next run.

use crate::config::FeedConfig;
use crate::error::{FeedError, Result};
use crate::feed::{detail_channel, summary_channel};
use crate::fingerprint::fingerprint_all;
use crate::normalize::{Normalizer, RecordRejection};
use crate::region;
use crate::schema::{conform, RawTable};
use crate::state::{Reconciliation, StateStore};
use chrono::DateTime;
use exposure_common::atomic::write_atomic;
use tracing::{info, warn};

/// What a run observed and wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Data rows in the input table
    pub rows: usize,
    /// Rows dropped during normalization
    pub rejections: Vec<RecordRejection>,
    pub added: usize,
    pub evicted: usize,
    pub refreshed: usize,
    /// Entries tracked after the run
    pub tracked: usize,
    pub wrote_detail: bool,
    pub wrote_summary: bool,
    pub wrote_state: bool,
}

impl RunReport {
    pub fn wrote_anything(&self) -> bool {
        self.wrote_detail || self.wrote_summary || self.wrote_state
    }
}

/// Turn a raw table into a reconciliation against `prior`
///
/// Pure apart from logging. A header mismatch fails before anything else
/// happens.
pub fn reconcile_table(
    table: &RawTable,
    prior: StateStore,
    now: i64,
    config: &FeedConfig,
) -> Result<(Reconciliation, Vec<RecordRejection>)> {
    let records = conform(table)?;

    let outcome = Normalizer::new(config.today(now)?).normalize(records);
    if outcome.records.is_empty() && !prior.is_empty() {
        warn!(
            tracked = prior.len(),
            "Input has no valid records, every tracked exposure will be evicted"
        );
    }

    let mut batch = fingerprint_all(outcome.records);
    region::enrich(&mut batch);

    let reconciliation = prior.reconcile(batch, now, config.refresh_policy);
    Ok((reconciliation, outcome.rejections))
}

/// Write feeds and state for a reconciliation, if anything changed
///
/// Additions rewrite both feeds. Evictions alone rewrite only the detail feed,
/// since the summary only ever describes additions.
pub fn publish(reconciliation: &Reconciliation, now: i64, config: &FeedConfig) -> Result<RunReport> {
    let mut report = RunReport {
        added: reconciliation.added.len(),
        evicted: reconciliation.evicted.len(),
        refreshed: reconciliation.refreshed,
        tracked: reconciliation.state.len(),
        ..RunReport::default()
    };

    if !reconciliation.changed() {
        info!("Contents unchanged, nothing written");
        return Ok(report);
    }

    let built = DateTime::from_timestamp(now, 0)
        .ok_or_else(|| FeedError::config(format!("Timestamp out of range: {now}")))?;

    let detail = detail_channel(&reconciliation.state, &config.source_url).render(built)?;
    write_atomic(&config.detail_feed_path, &detail)?;
    report.wrote_detail = true;
    info!(path = %config.detail_feed_path.display(), items = report.tracked, "Wrote detail feed");

    if !reconciliation.added.is_empty() {
        let channel = summary_channel(reconciliation, &config.source_url);
        let items = channel.items.len();
        write_atomic(&config.summary_feed_path, &channel.render(built)?)?;
        report.wrote_summary = true;
        info!(path = %config.summary_feed_path.display(), items, "Wrote summary feed");
    }

    reconciliation.state.save(&config.state_path)?;
    report.wrote_state = true;

    Ok(report)
}

/// Run the whole pipeline against the configured state and feed paths
pub fn run(table: &RawTable, now: i64, config: &FeedConfig) -> Result<RunReport> {
    let prior = StateStore::load(&config.state_path);
    let (reconciliation, rejections) = reconcile_table(table, prior, now, config)?;

    let mut report = publish(&reconciliation, now, config)?;
    report.rows = table.rows.len();
    report.rejections = rejections;

    info!(
        rows = report.rows,
        rejected = report.rejections.len(),
        added = report.added,
        evicted = report.evicted,
        tracked = report.tracked,
        "Run complete"
    );

    Ok(report)
}
