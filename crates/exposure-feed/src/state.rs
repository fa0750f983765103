//! Persisted exposure state and reconciliation
//!
//! The state store maps each fingerprint to the record it was last seen with and
//! the time it was first seen. It is the only long-lived mutable resource of the
//! engine: loaded once at startup, reconciled against the newest batch, and
//! written back in one atomic replacement.

use crate::error::Result;
use crate::fingerprint::{Fingerprint, Fingerprinted};
use crate::record::Record;
use chrono::{DateTime, Utc};
use exposure_common::atomic::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Current state document format version
pub const STATE_VERSION: u32 = 1;

/// What happens to the stored record when a known fingerprint is seen again
///
/// The first-seen timestamp is kept under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPolicy {
    /// Replace stored fields with the latest observed values
    #[default]
    Refresh,
    /// Keep the values from the first sighting
    Freeze,
}

impl std::str::FromStr for RefreshPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "refresh" => Ok(RefreshPolicy::Refresh),
            "freeze" | "frozen" => Ok(RefreshPolicy::Freeze),
            other => Err(format!("Invalid refresh policy: {other}")),
        }
    }
}

impl fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshPolicy::Refresh => f.write_str("refresh"),
            RefreshPolicy::Freeze => f.write_str("freeze"),
        }
    }
}

/// A tracked exposure: its record and when it was first observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub fields: Record,

    /// Seconds since the Unix epoch
    pub first_seen: i64,
}

impl StateEntry {
    /// First-seen time as a UTC timestamp, the epoch if out of range
    pub fn first_seen_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.first_seen, 0).unwrap_or_default()
    }
}

/// Fingerprint-keyed exposure state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateStore {
    version: u32,

    #[serde(default)]
    entries: BTreeMap<Fingerprint, StateEntry>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of reconciling a batch against prior state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// State to persist
    pub state: StateStore,

    /// Fingerprints seen for the first time, in batch order
    pub added: Vec<Fingerprint>,

    /// Fingerprints dropped because the newest batch no longer lists them
    pub evicted: Vec<Fingerprint>,

    /// Known entries whose stored fields were replaced
    pub refreshed: usize,
}

impl Reconciliation {
    /// Whether the published item set differs from the previous run
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.evicted.is_empty()
    }

    /// The newly added entries, in batch order
    pub fn added_entries(&self) -> Vec<(&Fingerprint, &StateEntry)> {
        self.added
            .iter()
            .filter_map(|fp| self.state.get(fp).map(|entry| (fp, entry)))
            .collect()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&StateEntry> {
        self.entries.get(fingerprint)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Iterate entries in fingerprint order
    pub fn entries(&self) -> impl Iterator<Item = (&Fingerprint, &StateEntry)> {
        self.entries.iter()
    }

    /// Insert an entry directly, replacing any existing one
    pub fn insert(&mut self, fingerprint: Fingerprint, entry: StateEntry) {
        self.entries.insert(fingerprint, entry);
    }

    /// Diff a fingerprinted batch against this state
    ///
    /// Entries missing from `batch` are evicted, unseen fingerprints are added
    /// with `first_seen = now`, and known fingerprints keep their timestamp.
    /// Reconciling the same batch twice yields no additions or evictions the
    /// second time.
    pub fn reconcile(self, batch: Vec<Fingerprinted>, now: i64, policy: RefreshPolicy) -> Reconciliation {
        let mut seen: HashSet<Fingerprint> = HashSet::with_capacity(batch.len());
        let mut current = Vec::with_capacity(batch.len());
        for item in batch {
            if seen.insert(item.fingerprint.clone()) {
                current.push(item);
            } else {
                debug!(fingerprint = %item.fingerprint, "Skipping duplicate record in batch");
            }
        }

        let mut entries = self.entries;

        let evicted: Vec<Fingerprint> = entries
            .keys()
            .filter(|fp| !seen.contains(*fp))
            .cloned()
            .collect();
        for fp in &evicted {
            entries.remove(fp);
        }

        let mut added = Vec::new();
        let mut refreshed = 0;
        for Fingerprinted { fingerprint, record } in current {
            match entries.get_mut(&fingerprint) {
                Some(entry) => {
                    if policy == RefreshPolicy::Refresh && entry.fields != record {
                        entry.fields = record;
                        refreshed += 1;
                    }
                },
                None => {
                    entries.insert(
                        fingerprint.clone(),
                        StateEntry {
                            fields: record,
                            first_seen: now,
                        },
                    );
                    added.push(fingerprint);
                },
            }
        }

        info!(
            added = added.len(),
            evicted = evicted.len(),
            refreshed,
            total = entries.len(),
            "Reconciled batch against prior state"
        );

        Reconciliation {
            state: StateStore {
                version: STATE_VERSION,
                entries,
            },
            added,
            evicted,
            refreshed,
        }
    }

    /// Load state from `path`
    ///
    /// A missing document is an empty prior state. An unreadable or malformed
    /// document is logged and also treated as empty, which makes every
    /// fingerprint of the next batch new.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No previous state, starting empty");
                return Self::new();
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "State document unreadable, treating prior state as empty");
                return Self::new();
            },
        };

        match serde_json::from_str::<StateStore>(&content) {
            Ok(store) if store.version == STATE_VERSION => {
                info!(path = %path.display(), entries = store.len(), "Loaded previous state");
                store
            },
            Ok(store) => {
                warn!(
                    path = %path.display(),
                    version = store.version,
                    expected = STATE_VERSION,
                    "Unsupported state version, treating prior state as empty"
                );
                Self::new()
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "State document corrupt, treating prior state as empty");
                Self::new()
            },
        }
    }

    /// Atomically write state to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        write_atomic(path, content.as_bytes())?;
        info!(path = %path.display(), entries = self.len(), "Saved state");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint_all;
    use crate::schema::FIELDS;
    use tempfile::TempDir;

    fn record(site: &str, suburb: &str, status: &str) -> Record {
        let values = [
            "", status, site, "Some Street", suburb, "ACT", "2021-08-10", "10:00:00", "11:00:00",
            "Close",
        ];
        FIELDS.iter().copied().zip(values).collect()
    }

    fn batch(records: &[Record]) -> Vec<Fingerprinted> {
        fingerprint_all(records.to_vec())
    }

    #[test]
    fn test_first_run_adds_everything() {
        let records = [record("Shop A", "Fyshwick", ""), record("Shop B", "Nicholls", "")];
        let result = StateStore::new().reconcile(batch(&records), 100, RefreshPolicy::Refresh);

        assert_eq!(result.added.len(), 2);
        assert!(result.evicted.is_empty());
        assert!(result.changed());
        assert!(result.state.entries().all(|(_, e)| e.first_seen == 100));
        assert_eq!(result.added[0], Fingerprint::of(&records[0]));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let records = [record("Shop A", "Fyshwick", ""), record("Shop B", "Nicholls", "")];
        let first = StateStore::new().reconcile(batch(&records), 100, RefreshPolicy::Refresh);
        let snapshot = first.state.clone();

        let second = first.state.reconcile(batch(&records), 200, RefreshPolicy::Refresh);

        assert!(second.added.is_empty());
        assert!(second.evicted.is_empty());
        assert!(!second.changed());
        assert_eq!(second.state, snapshot);
    }

    #[test]
    fn test_missing_fingerprint_is_evicted() {
        let a = record("Shop A", "Fyshwick", "");
        let b = record("Shop B", "Nicholls", "");
        let first = StateStore::new().reconcile(batch(&[a.clone(), b.clone()]), 100, RefreshPolicy::Refresh);

        let second = first.state.reconcile(batch(&[a.clone()]), 200, RefreshPolicy::Refresh);

        assert_eq!(second.evicted, vec![Fingerprint::of(&b)]);
        assert!(second.added.is_empty());
        assert!(second.changed());
        assert!(!second.state.contains(&Fingerprint::of(&b)));
        assert_eq!(second.state.len(), 1);
    }

    #[test]
    fn test_first_seen_is_preserved() {
        let a = record("Shop A", "Fyshwick", "");
        let b = record("Shop B", "Nicholls", "");
        let first = StateStore::new().reconcile(batch(&[a.clone()]), 100, RefreshPolicy::Refresh);

        let second = first.state.reconcile(batch(&[a.clone(), b.clone()]), 200, RefreshPolicy::Refresh);

        assert_eq!(second.added, vec![Fingerprint::of(&b)]);
        assert_eq!(second.state.get(&Fingerprint::of(&a)).unwrap().first_seen, 100);
        assert_eq!(second.state.get(&Fingerprint::of(&b)).unwrap().first_seen, 200);
    }

    #[test]
    fn test_refresh_policy_updates_fields_on_status_change() {
        let original = record("Shop A", "Fyshwick", "");
        let updated = record("Shop A", "Fyshwick", "Updated");
        let fp = Fingerprint::of(&original);
        let first = StateStore::new().reconcile(batch(&[original]), 100, RefreshPolicy::Refresh);

        let second = first.state.reconcile(batch(&[updated]), 200, RefreshPolicy::Refresh);

        let entry = second.state.get(&fp).unwrap();
        assert_eq!(entry.fields.get("Status"), Some("Updated"));
        assert_eq!(entry.first_seen, 100);
        assert_eq!(second.refreshed, 1);
        assert!(!second.changed());
    }

    #[test]
    fn test_freeze_policy_keeps_first_values() {
        let original = record("Shop A", "Fyshwick", "");
        let updated = record("Shop A", "Fyshwick", "Updated");
        let fp = Fingerprint::of(&original);
        let first = StateStore::new().reconcile(batch(&[original]), 100, RefreshPolicy::Freeze);

        let second = first.state.reconcile(batch(&[updated]), 200, RefreshPolicy::Freeze);

        let entry = second.state.get(&fp).unwrap();
        assert_eq!(entry.fields.get("Status"), Some(""));
        assert_eq!(entry.first_seen, 100);
        assert_eq!(second.refreshed, 0);
    }

    #[test]
    fn test_duplicate_records_in_batch_collapse() {
        let a = record("Shop A", "Fyshwick", "");
        let result = StateStore::new().reconcile(batch(&[a.clone(), a]), 100, RefreshPolicy::Refresh);

        assert_eq!(result.added.len(), 1);
        assert_eq!(result.state.len(), 1);
    }

    #[test]
    fn test_added_entries_follow_batch_order() {
        let records = [
            record("Shop C", "Nicholls", ""),
            record("Shop A", "Fyshwick", ""),
            record("Shop B", "Fyshwick", ""),
        ];
        let result = StateStore::new().reconcile(batch(&records), 1, RefreshPolicy::Refresh);

        let sites: Vec<_> = result
            .added_entries()
            .iter()
            .map(|(_, e)| e.fields.get("Exposure Site").unwrap())
            .collect();
        assert_eq!(sites, vec!["Shop C", "Shop A", "Shop B"]);
    }

    #[test]
    fn test_save_load_round_trip_reconciles_to_no_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let records = [record("Shop A", "Fyshwick", ""), record("Shop B", "Nicholls", "")];

        let first = StateStore::new().reconcile(batch(&records), 100, RefreshPolicy::Refresh);
        first.state.save(&path).unwrap();

        let loaded = StateStore::load(&path);
        assert_eq!(loaded, first.state);

        let second = loaded.reconcile(batch(&records), 200, RefreshPolicy::Refresh);
        assert!(second.added.is_empty());
        assert!(second.evicted.is_empty());
    }

    #[test]
    fn test_saved_document_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let a = record("Shop A", "Fyshwick", "");
        let result = StateStore::new().reconcile(batch(&[a.clone()]), 1629471224, RefreshPolicy::Refresh);
        result.state.save(&path).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &json["entries"][Fingerprint::of(&a).as_str()];
        assert_eq!(json["version"], 1);
        assert_eq!(entry["first_seen"], 1629471224);
        assert_eq!(entry["fields"][2], serde_json::json!(["Exposure Site", "Shop A"]));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(StateStore::load(dir.path().join("absent.json")).is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = StateStore::load(&path);
        assert!(store.is_empty());

        let a = record("Shop A", "Fyshwick", "");
        let result = store.reconcile(batch(&[a]), 5, RefreshPolicy::Refresh);
        assert_eq!(result.added.len(), 1);
    }

    #[test]
    fn test_load_unsupported_version_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"version": 99, "entries": {}}"#).unwrap();

        assert!(StateStore::load(&path).is_empty());
    }

    #[test]
    fn test_refresh_policy_parsing() {
        assert_eq!("Refresh".parse::<RefreshPolicy>().unwrap(), RefreshPolicy::Refresh);
        assert_eq!("freeze".parse::<RefreshPolicy>().unwrap(), RefreshPolicy::Freeze);
        assert!("sometimes".parse::<RefreshPolicy>().is_err());
        assert_eq!(RefreshPolicy::default().to_string(), "refresh");
    }

    #[test]
    fn test_first_seen_at() {
        let entry = StateEntry {
            fields: Record::new(),
            first_seen: 1,
        };
        assert_eq!(entry.first_seen_at().timestamp(), 1);
    }
}
