//! CSV tokenization into a [`RawTable`]

use crate::error::Result;
use crate::schema::RawTable;
use tracing::debug;

const BOM: char = '\u{feff}';

/// Tokenize CSV text, first row as header
///
/// A leading byte order mark is dropped and rows may differ in length. Rows
/// with only blank cells are skipped. Empty input yields an empty table, which
/// fails header validation later.
pub fn parse_csv(text: &str) -> Result<RawTable> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => return Ok(RawTable::default()),
    };

    let mut rows = Vec::new();
    let mut blank = 0usize;
    for record in records {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            blank += 1;
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(columns = header.len(), rows = rows.len(), blank, "Parsed CSV table");

    Ok(RawTable { header, rows })
}
