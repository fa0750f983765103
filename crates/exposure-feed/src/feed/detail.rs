//! Detail feed: one item per tracked exposure

use super::rss::{Channel, FeedItem};
use super::{DETAIL_TITLE, FEED_DESCRIPTION};
use crate::record::Record;
use crate::schema::{FieldKind, EXPOSURE_SITE, SUBURB};
use crate::state::StateStore;
use chrono::{NaiveDate, NaiveTime};

/// Render a stored value for display
///
/// Dates read "Tuesday, 10 August 2021" and times "1400". Anything that does
/// not parse back is shown as stored.
fn display_value(name: &str, value: &str) -> String {
    match FieldKind::of(name) {
        FieldKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|d| d.format("%A, %d %B %Y").to_string())
            .unwrap_or_else(|_| value.to_string()),
        FieldKind::Time => NaiveTime::parse_from_str(value, "%H:%M:%S")
            .map(|t| t.format("%H%M").to_string())
            .unwrap_or_else(|_| value.to_string()),
        _ => value.to_string(),
    }
}

/// HTML body listing every field in record order
pub fn describe(record: &Record) -> String {
    record
        .fields()
        .map(|(name, value)| format!("<b>{name}</b>:{}<br/>", display_value(name, value)))
        .collect()
}

/// Items for every entry, newest first
///
/// Entries sharing a first-seen time are ordered by fingerprint, also
/// descending, so the order never depends on storage layout.
pub fn detail_items(state: &StateStore) -> Vec<FeedItem> {
    let mut entries: Vec<_> = state.entries().collect();
    entries.sort_by(|(fa, ea), (fb, eb)| (eb.first_seen, fb).cmp(&(ea.first_seen, fa)));

    entries
        .into_iter()
        .map(|(fingerprint, entry)| FeedItem {
            title: format!(
                "{}:{}",
                entry.fields.get(SUBURB).unwrap_or_default(),
                entry.fields.get(EXPOSURE_SITE).unwrap_or_default()
            ),
            link: None,
            description: describe(&entry.fields),
            guid: fingerprint.to_string(),
            pub_date: entry.first_seen_at(),
        })
        .collect()
}

/// The full detail channel for the current state
pub fn detail_channel(state: &StateStore, link: &str) -> Channel {
    Channel {
        title: DETAIL_TITLE.to_string(),
        link: link.to_string(),
        description: FEED_DESCRIPTION.to_string(),
        items: detail_items(state),
    }
}
