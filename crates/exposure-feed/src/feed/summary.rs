//! Summary feed: one item per batch of additions, counted by suburb

use super::rss::{Channel, FeedItem};
use super::{FEED_DESCRIPTION, SUMMARY_TITLE};
use crate::fingerprint::Fingerprint;
use crate::schema::SUBURB;
use crate::state::{Reconciliation, StateEntry};
use chrono::DateTime;
use std::collections::BTreeMap;

/// Per-suburb counts, most frequent first, ties in first-seen order
fn suburb_counts<'a>(entries: &[&'a StateEntry]) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &entry in entries {
        let suburb = entry.fields.get(SUBURB).unwrap_or_default();
        match counts.iter_mut().find(|(s, _)| *s == suburb) {
            Some((_, n)) => *n += 1,
            None => counts.push((suburb, 1)),
        }
    }
    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn summary_body(entries: &[&StateEntry]) -> String {
    suburb_counts(entries)
        .into_iter()
        .map(|(suburb, n)| format!("<b>{suburb}:</b>{n}<br/>"))
        .collect()
}

/// Summary items for the entries added in this reconciliation
///
/// Additions are grouped by first-seen time, newest group first. The item
/// identifier is derived from the group time and body, so regenerating the same
/// group gives the same identifier.
pub fn summary_items(reconciliation: &Reconciliation, link: &str) -> Vec<FeedItem> {
    let mut groups: BTreeMap<i64, Vec<&StateEntry>> = BTreeMap::new();
    for (_, entry) in reconciliation.added_entries() {
        groups.entry(entry.first_seen).or_default().push(entry);
    }

    groups
        .into_iter()
        .rev()
        .map(|(timestamp, entries)| {
            let body = summary_body(&entries);
            FeedItem {
                title: format!("{} additional exposure sites", entries.len()),
                link: Some(link.to_string()),
                guid: Fingerprint::of_text(&format!("{timestamp}-{body}")).to_string(),
                description: body,
                pub_date: DateTime::from_timestamp(timestamp, 0).unwrap_or_default(),
            }
        })
        .collect()
}

/// The summary channel for this run's additions
pub fn summary_channel(reconciliation: &Reconciliation, link: &str) -> Channel {
    Channel {
        title: SUMMARY_TITLE.to_string(),
        link: link.to_string(),
        description: FEED_DESCRIPTION.to_string(),
        items: summary_items(reconciliation, link),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint_all;
    use crate::record::Record;
    use crate::schema::FIELDS;
    use crate::state::{RefreshPolicy, StateStore};

    fn record(site: &str, suburb: &str) -> Record {
        let values = [
            "", "", site, "Some Street", suburb, "ACT", "2021-08-10", "10:00:00", "11:00:00", "Close",
        ];
        FIELDS.iter().copied().zip(values).collect()
    }

    fn entry(suburb: &str) -> StateEntry {
        StateEntry {
            fields: record("Shop", suburb),
            first_seen: 0,
        }
    }

    #[test]
    fn test_three_sites_in_two_suburbs() {
        let records = vec![
            record("Harvey Norman", "Fyshwick"),
            record("Canberra Outlet Centre", "Fyshwick"),
            record("Gold Creek School", "Nicholls"),
        ];
        let result = StateStore::new().reconcile(fingerprint_all(records), 1, RefreshPolicy::Refresh);

        let items = summary_items(&result, "https://example.org");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "3 additional exposure sites");
        assert_eq!(items[0].description, "<b>Fyshwick:</b>2<br/><b>Nicholls:</b>1<br/>");
        assert_eq!(items[0].guid, "QKtEQJFTu3kjlQbfIAXTcA==");
        assert_eq!(items[0].pub_date.timestamp(), 1);
        assert_eq!(items[0].link.as_deref(), Some("https://example.org"));
    }

    #[test]
    fn test_counts_ties_keep_first_encounter() {
        let entries = [
            entry("Nicholls"),
            entry("Fyshwick"),
            entry("Fyshwick"),
            entry("Nicholls"),
            entry("Kambah"),
        ];
        let refs: Vec<&StateEntry> = entries.iter().collect();

        assert_eq!(
            suburb_counts(&refs),
            vec![("Nicholls", 2), ("Fyshwick", 2), ("Kambah", 1)]
        );
    }

    #[test]
    fn test_most_frequent_first() {
        let entries = [entry("Kambah"), entry("Fyshwick"), entry("Fyshwick")];
        let refs: Vec<&StateEntry> = entries.iter().collect();

        assert_eq!(summary_body(&refs), "<b>Fyshwick:</b>2<br/><b>Kambah:</b>1<br/>");
    }

    #[test]
    fn test_nothing_added_means_no_items() {
        let records = vec![record("Harvey Norman", "Fyshwick")];
        let first = StateStore::new().reconcile(fingerprint_all(records.clone()), 1, RefreshPolicy::Refresh);
        let second = first.state.reconcile(fingerprint_all(records), 2, RefreshPolicy::Refresh);

        assert!(summary_items(&second, "https://example.org").is_empty());
    }

    #[test]
    fn test_only_new_entries_are_summarised() {
        let first = StateStore::new().reconcile(
            fingerprint_all(vec![record("Harvey Norman", "Fyshwick")]),
            1,
            RefreshPolicy::Refresh,
        );
        let second = first.state.reconcile(
            fingerprint_all(vec![record("Harvey Norman", "Fyshwick"), record("Gold Creek School", "Nicholls")]),
            1629000000,
            RefreshPolicy::Refresh,
        );

        let items = summary_items(&second, "https://example.org");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "1 additional exposure sites");
        assert_eq!(items[0].description, "<b>Nicholls:</b>1<br/>");
        assert_eq!(
            items[0].guid,
            Fingerprint::of_text("1629000000-<b>Nicholls:</b>1<br/>").to_string()
        );
    }
}
