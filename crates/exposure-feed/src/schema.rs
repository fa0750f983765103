//! Expected record schema and header validation
//!
//! The disclosure data is published with a fixed set of column labels. The
//! labels are matched by name rather than position, and every row is rewritten
//! into the canonical field order below so that upstream column shuffles do not
//! change any fingerprint.

use crate::error::InputSchemaError;
use crate::normalize::title_case;
use crate::record::Record;
use tracing::{debug, warn};

pub const EVENT_ID: &str = "Event Id";
pub const STATUS: &str = "Status";
pub const EXPOSURE_SITE: &str = "Exposure Site";
pub const STREET: &str = "Street";
pub const SUBURB: &str = "Suburb";
pub const STATE: &str = "State";
pub const DATE: &str = "Date";
pub const ARRIVAL_TIME: &str = "Arrival Time";
pub const DEPARTURE_TIME: &str = "Departure Time";
pub const CONTACT: &str = "Contact";

/// Enrichment field appended after fingerprinting
pub const REGION: &str = "Region";

/// Canonical field order of a record
pub const FIELDS: [&str; 10] = [
    EVENT_ID,
    STATUS,
    EXPOSURE_SITE,
    STREET,
    SUBURB,
    STATE,
    DATE,
    ARRIVAL_TIME,
    DEPARTURE_TIME,
    CONTACT,
];

/// Leading fields that may change without describing a new exposure event
pub const VOLATILE_FIELDS: usize = 2;

/// How a field's raw value is canonicalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Calendar date, validated against the disclosure window
    Date,
    /// Time of day
    Time,
    /// Free-text site name, whitespace trimmed only
    SiteName,
    /// Short code such as a state abbreviation, upper-cased
    Code,
    /// Everything else, title-cased
    Text,
}

impl FieldKind {
    pub fn of(name: &str) -> Self {
        match name {
            DATE => FieldKind::Date,
            EXPOSURE_SITE => FieldKind::SiteName,
            STATE => FieldKind::Code,
            n if n.contains("Time") => FieldKind::Time,
            _ => FieldKind::Text,
        }
    }
}

/// A tokenized table: header labels plus string cells, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Validate the table header and rewrite every row into canonical field order
///
/// A trailing header cell that is blank is a known export quirk and is ignored
/// together with the matching cells of every row. Any other difference between
/// the header and [`FIELDS`] is fatal.
pub fn conform(table: &RawTable) -> Result<Vec<Record>, InputSchemaError> {
    if table.header.is_empty() {
        return Err(InputSchemaError::MissingHeader);
    }

    let mut labels: Vec<String> = table.header.iter().map(|h| title_case(h.trim())).collect();
    while labels.last().is_some_and(|l| l.is_empty()) {
        labels.pop();
        debug!("Ignoring blank trailing header column");
    }
    if labels.is_empty() {
        return Err(InputSchemaError::MissingHeader);
    }

    let missing: Vec<String> = FIELDS
        .iter()
        .filter(|f| !labels.iter().any(|l| l == *f))
        .map(|f| f.to_string())
        .collect();

    let mut unexpected = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        let duplicate = labels[..i].contains(label);
        if duplicate || !FIELDS.contains(&label.as_str()) {
            unexpected.push(label.clone());
        }
    }

    if !missing.is_empty() || !unexpected.is_empty() {
        warn!(?missing, ?unexpected, "Input header does not match expected schema");
        return Err(InputSchemaError::HeaderMismatch { missing, unexpected });
    }

    // Every expected field is present exactly once at this point
    let positions: Vec<usize> = FIELDS
        .iter()
        .filter_map(|f| labels.iter().position(|l| l == f))
        .collect();

    let records: Vec<Record> = table
        .rows
        .iter()
        .map(|row| {
            FIELDS
                .iter()
                .zip(&positions)
                .map(|(name, &pos)| (*name, row.get(pos).cloned().unwrap_or_default()))
                .collect::<Record>()
        })
        .collect();

    Ok(records)
}
