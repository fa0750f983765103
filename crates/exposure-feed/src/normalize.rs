//! Record normalization
//!
//! Canonicalizes raw rows field by field (see [`FieldKind`]) and drops every row
//! whose date or time cannot be trusted. A dropped row never fails the batch; it
//! is returned as a [`RecordRejection`] and logged.

use crate::record::Record;
use crate::schema::FieldKind;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use tracing::{info, warn};

/// No exposure event can predate the disclosure program
pub const EARLIEST_EVENT_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2020, 1, 1) {
    Some(date) => date,
    None => panic!("invalid earliest event date"),
};

/// Date layouts seen on the disclosure page, day-first. Two-digit years go
/// first because `%Y` would also accept "21" as the year 21.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

const TIME_FORMATS: &[&str] = &["%I:%M%p", "%I:%M:%S%p", "%H:%M", "%H:%M:%S", "%H%M"];

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "mon", "tue",
    "tues", "wed", "thu", "thur", "thurs", "fri", "sat", "sun",
];

/// Why a row was excluded from the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    UnparseableDate,
    DateOutOfRange {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },
    UnparseableTime,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::UnparseableDate => f.write_str("unparseable date"),
            RejectionReason::DateOutOfRange {
                date,
                earliest,
                latest,
            } => write!(f, "date {date} outside {earliest}..={latest}"),
            RejectionReason::UnparseableTime => f.write_str("unparseable time"),
        }
    }
}

/// Diagnostic for a dropped row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRejection {
    /// Zero-based index of the row in the input batch
    pub row: usize,
    pub field: String,
    pub value: String,
    pub reason: RejectionReason,
}

impl fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: field '{}' value '{}': {}",
            self.row, self.field, self.value, self.reason
        )
    }
}

/// Result of normalizing one batch
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub records: Vec<Record>,
    pub rejections: Vec<RecordRejection>,
}

/// Canonicalizes raw records against a fixed date window
#[derive(Debug, Clone)]
pub struct Normalizer {
    earliest: NaiveDate,
    today: NaiveDate,
}

impl Normalizer {
    /// Create a normalizer accepting event dates up to and including `today`
    pub fn new(today: NaiveDate) -> Self {
        Self {
            earliest: EARLIEST_EVENT_DATE,
            today,
        }
    }

    /// Override the earliest accepted event date
    pub fn with_earliest(mut self, earliest: NaiveDate) -> Self {
        self.earliest = earliest;
        self
    }

    /// Normalize a batch, keeping valid records in input order
    pub fn normalize(&self, rows: Vec<Record>) -> NormalizeOutcome {
        let mut outcome = NormalizeOutcome::default();

        for (index, row) in rows.into_iter().enumerate() {
            match self.normalize_record(&row) {
                Ok(record) => outcome.records.push(record),
                Err((field, value, reason)) => {
                    let rejection = RecordRejection {
                        row: index,
                        field,
                        value,
                        reason,
                    };
                    warn!(
                        row = rejection.row,
                        field = %rejection.field,
                        value = %rejection.value,
                        reason = %rejection.reason,
                        "Dropping invalid record"
                    );
                    outcome.rejections.push(rejection);
                },
            }
        }

        info!(
            accepted = outcome.records.len(),
            rejected = outcome.rejections.len(),
            "Normalized batch"
        );
        outcome
    }

    fn normalize_record(
        &self,
        row: &Record,
    ) -> Result<Record, (String, String, RejectionReason)> {
        let mut record = Record::with_capacity(row.len());

        for (name, raw) in row.fields() {
            let reject = |reason| (name.to_string(), raw.to_string(), reason);

            let value = match FieldKind::of(name) {
                FieldKind::Date => {
                    let date = parse_date(raw).ok_or_else(|| reject(RejectionReason::UnparseableDate))?;
                    if date < self.earliest || date > self.today {
                        return Err(reject(RejectionReason::DateOutOfRange {
                            date,
                            earliest: self.earliest,
                            latest: self.today,
                        }));
                    }
                    date.format("%Y-%m-%d").to_string()
                },
                FieldKind::Time => parse_time(raw)
                    .ok_or_else(|| reject(RejectionReason::UnparseableTime))?
                    .format("%H:%M:%S")
                    .to_string(),
                FieldKind::SiteName => raw.trim().to_string(),
                FieldKind::Code => raw.trim().to_uppercase(),
                FieldKind::Text => title_case(raw.trim()),
            };

            record.set(name, value);
        }

        Ok(record)
    }
}

fn is_weekday(word: &str) -> bool {
    let word = word.trim_matches(|c: char| c == ',' || c == '.').to_lowercase();
    WEEKDAYS.contains(&word.as_str())
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '-' || c == ',')
}

/// Remove a weekday decoration such as "10/08/2021 - Tuesday" or "Tue, 10 Aug 2021"
fn strip_weekday(raw: &str) -> &str {
    let mut s = trim_separators(raw);

    if let Some((head, last)) = s.rsplit_once(|c: char| c.is_whitespace() || c == ',') {
        if is_weekday(last) {
            s = trim_separators(head);
        }
    }

    if let Some((first, tail)) = s.split_once(|c: char| c.is_whitespace() || c == ',') {
        if is_weekday(first) {
            s = trim_separators(tail);
        }
    }

    s
}

/// Parse a human-entered calendar date, day-first
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = strip_weekday(raw);
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            // "10/08/2021 10:00am": keep the leading date token
            let (head, _) = s.split_once(char::is_whitespace)?;
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
        })
}

/// Parse a human-entered time of day ("2:00pm", "10am", "14:30", "noon")
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let compact: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    // "a.m", "a.m." and "am." all reduce to "am"; dots left in the clock part
    // separate hours from minutes ("2.30")
    let clock = compact.trim_end_matches('.');
    let (clock, meridiem) = match clock.strip_suffix('m') {
        Some(rest) if rest.ends_with("a.") || rest.ends_with("p.") => {
            (&rest[..rest.len() - 2], &rest[rest.len() - 2..rest.len() - 1])
        },
        Some(rest) if rest.ends_with('a') || rest.ends_with('p') => {
            (&rest[..rest.len() - 1], &rest[rest.len() - 1..])
        },
        _ => (clock, ""),
    };
    let mut s = clock.replace('.', ":");

    // "930" reads as 09:30
    if s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.insert(0, '0');
    }
    if !meridiem.is_empty() {
        s.push_str(meridiem);
        s.push('m');
    }

    match s.as_str() {
        "" => return None,
        "noon" | "midday" | "12noon" | "12midday" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" | "12midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {},
    }

    // chrono needs a minute component; "10am" becomes "10:00am"
    if !s.contains(':') && (s.ends_with("am") || s.ends_with("pm")) {
        s.insert_str(s.len() - 2, ":00");
    }

    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&s, fmt).ok())
}

/// Title-case a string: a letter is upper-cased when it does not follow another
/// letter and lower-cased otherwise ("o'connor" -> "O'Connor")
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_letter = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(c);
            prev_letter = false;
        }
    }

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::schema::FIELDS;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn raw(values: [&str; 10]) -> Record {
        FIELDS.iter().copied().zip(values).collect()
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(date(2021, 8, 20))
    }

    #[test]
    fn test_parse_date_source_formats() {
        assert_eq!(parse_date("10/08/2021 - Tuesday"), Some(date(2021, 8, 10)));
        assert_eq!(parse_date("08/08/2021 - Sunday "), Some(date(2021, 8, 8)));
        assert_eq!(parse_date("Thursday, 12 August 2021"), Some(date(2021, 8, 12)));
        assert_eq!(parse_date("Tue 10 Aug 2021"), Some(date(2021, 8, 10)));
        assert_eq!(parse_date("2021-08-10"), Some(date(2021, 8, 10)));
        assert_eq!(parse_date("2021-08-10T00:00:00"), Some(date(2021, 8, 10)));
        assert_eq!(parse_date("10/08/21"), Some(date(2021, 8, 10)));
        assert_eq!(parse_date("10/08/2021 10:00am"), Some(date(2021, 8, 10)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("Tuesday"), None);
        assert_eq!(parse_date("32/08/2021"), None);
        assert_eq!(parse_date("TBC"), None);
    }

    #[test]
    fn test_parse_time_variants() {
        assert_eq!(parse_time("10:00am"), Some(time(10, 0)));
        assert_eq!(parse_time("2:00pm"), Some(time(14, 0)));
        assert_eq!(parse_time("3:10 PM"), Some(time(15, 10)));
        assert_eq!(parse_time("2.30 p.m."), Some(time(14, 30)));
        assert_eq!(parse_time("10am"), Some(time(10, 0)));
        assert_eq!(parse_time("12:00am"), Some(time(0, 0)));
        assert_eq!(parse_time("Noon"), Some(time(12, 0)));
        assert_eq!(parse_time("14:30"), Some(time(14, 30)));
        assert_eq!(parse_time("08:00:00"), Some(time(8, 0)));
        assert_eq!(parse_time("1400"), Some(time(14, 0)));
    }

    #[test]
    fn test_parse_time_dotted_meridiem() {
        assert_eq!(parse_time("10:00 a.m"), Some(time(10, 0)));
        assert_eq!(parse_time("10:00 A.M"), Some(time(10, 0)));
        assert_eq!(parse_time("4:15 P.M."), Some(time(16, 15)));
        assert_eq!(parse_time("11am."), Some(time(11, 0)));
        assert_eq!(parse_time("930"), Some(time(9, 30)));
        assert_eq!(parse_time("9.30am"), Some(time(9, 30)));
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert_eq!(parse_time(""), None);
        assert_eq!(parse_time("late"), None);
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("BARRIER STREET"), "Barrier Street");
        assert_eq!(title_case("o'connor"), "O'Connor");
        assert_eq!(title_case("377 canberra avenue"), "377 Canberra Avenue");
        assert_eq!(title_case("close"), "Close");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_normalize_applies_field_rules() {
        let row = raw([
            " 12 ", "new", "  Harvey NORMAN (Level 1) ", "barrier street", "FYSHWICK", " act ",
            "10/08/2021 - Tuesday", "10:00am", "11:00am", "close",
        ]);

        let outcome = normalizer().normalize(vec![row]);
        assert!(outcome.rejections.is_empty());

        let record = &outcome.records[0];
        let values: Vec<_> = record.fields().map(|(_, v)| v).collect();
        assert_eq!(
            values,
            vec![
                "12",
                "New",
                "Harvey NORMAN (Level 1)",
                "Barrier Street",
                "Fyshwick",
                "ACT",
                "2021-08-10",
                "10:00:00",
                "11:00:00",
                "Close",
            ]
        );
    }

    #[test]
    fn test_normalize_drops_bad_date_and_keeps_rest() {
        let good = raw(["", "", "Shop", "St", "Fyshwick", "ACT", "10/08/2021", "1pm", "2pm", "Close"]);
        let empty_date = raw(["", "", "Shop", "St", "Fyshwick", "ACT", "", "1pm", "2pm", "Close"]);
        let bad_date = raw(["", "", "Shop", "St", "Fyshwick", "ACT", "soon", "1pm", "2pm", "Close"]);

        let outcome = normalizer().normalize(vec![empty_date, good, bad_date]);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.rejections.len(), 2);
        assert_eq!(outcome.rejections[0].row, 0);
        assert_eq!(outcome.rejections[0].field, "Date");
        assert_eq!(outcome.rejections[0].reason, RejectionReason::UnparseableDate);
        assert_eq!(outcome.rejections[1].row, 2);
        assert_eq!(outcome.rejections[1].value, "soon");
    }

    #[test]
    fn test_normalize_enforces_date_window() {
        let future = raw(["", "", "Shop", "St", "Fyshwick", "ACT", "21/08/2021", "1pm", "2pm", "Close"]);
        let ancient = raw(["", "", "Shop", "St", "Fyshwick", "ACT", "31/12/2019", "1pm", "2pm", "Close"]);
        let boundary = raw(["", "", "Shop", "St", "Fyshwick", "ACT", "20/08/2021", "1pm", "2pm", "Close"]);

        let outcome = normalizer().normalize(vec![future, ancient, boundary]);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].get("Date"), Some("2021-08-20"));
        assert!(matches!(
            outcome.rejections[0].reason,
            RejectionReason::DateOutOfRange { .. }
        ));
        assert!(matches!(
            outcome.rejections[1].reason,
            RejectionReason::DateOutOfRange { .. }
        ));
    }

    #[test]
    fn test_normalize_drops_bad_time() {
        let row = raw(["", "", "Shop", "St", "Fyshwick", "ACT", "10/08/2021", "1pm", "close", "Close"]);
        let outcome = normalizer().normalize(vec![row]);

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.rejections[0].field, "Departure Time");
        assert_eq!(outcome.rejections[0].reason, RejectionReason::UnparseableTime);
    }

    #[test]
    fn test_normalize_is_idempotent_on_canonical_values() {
        let row = raw(["", "", "Shop", "St", "Fyshwick", "ACT", "10/08/2021", "1pm", "2pm", "Close"]);
        let first = normalizer().normalize(vec![row]).records;
        let second = normalizer().normalize(first.clone()).records;
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejection_display() {
        let rejection = RecordRejection {
            row: 3,
            field: "Date".to_string(),
            value: "soon".to_string(),
            reason: RejectionReason::UnparseableDate,
        };
        assert_eq!(rejection.to_string(), "row 3: field 'Date' value 'soon': unparseable date");
    }
}
