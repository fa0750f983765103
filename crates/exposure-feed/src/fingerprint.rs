//! Stable content fingerprints
//!
//! A fingerprint identifies an exposure event across runs. It covers every
//! field after the volatile leading ones, in record order, so a status change
//! keeps the identity while a changed time window produces a new event.
//!
//! Distinct events whose normalized values are identical share a fingerprint.
//! The source data has no other key to tell them apart.
//!
//! Fingerprints are taken before region enrichment, so Region is not part of
//! the identity. Once a record carries Region, `Fingerprint::of` on it no
//! longer equals the state key it was stored under.

use crate::record::Record;
use crate::schema::VOLATILE_FIELDS;
use exposure_common::digest::{md5_base64, md5_base64_joined};
use serde::{Deserialize, Serialize};
use std::fmt;

const DELIMITER: &str = "-";

/// Opaque 24 character identifier derived from record content
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a normalized record
    pub fn of(record: &Record) -> Self {
        Self(md5_base64_joined(record.values_after(VOLATILE_FIELDS), DELIMITER))
    }

    /// Fingerprint an arbitrary string, used for identifiers that are not
    /// records (summary feed items)
    pub fn of_text(text: &str) -> Self {
        Self(md5_base64(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A normalized record paired with its fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprinted {
    pub fingerprint: Fingerprint,
    pub record: Record,
}

impl Fingerprinted {
    pub fn new(record: Record) -> Self {
        Self {
            fingerprint: Fingerprint::of(&record),
            record,
        }
    }
}

/// Fingerprint every record of a batch, preserving order
pub fn fingerprint_all(records: Vec<Record>) -> Vec<Fingerprinted> {
    records.into_iter().map(Fingerprinted::new).collect()
}
