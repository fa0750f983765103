//! Input acquisition
//!
//! Everything here produces a [`RawTable`](crate::schema::RawTable): header
//! labels plus string cells, not yet validated.

pub mod csv_table;
pub mod fetch;
pub mod html;

pub use csv_table::parse_csv;
pub use fetch::Fetcher;
pub use html::{find_csv_link, parse_table};

use crate::error::Result;
use crate::schema::RawTable;
use std::path::Path;
use tracing::info;

/// Format of a local input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Html,
}

impl InputFormat {
    /// Format selected by the `--html` flag
    pub fn from_html_flag(html: bool) -> Self {
        if html {
            Self::Html
        } else {
            Self::Csv
        }
    }
}

/// Read a local CSV file or saved disclosure page
pub fn read_table(path: impl AsRef<Path>, format: InputFormat) -> Result<RawTable> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;

    let table = match format {
        InputFormat::Csv => parse_csv(&text)?,
        InputFormat::Html => parse_table(&text)?,
    };
    info!(path = %path.display(), ?format, rows = table.rows.len(), "Read input table");

    Ok(table)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_from_html_flag() {
        assert_eq!(InputFormat::from_html_flag(true), InputFormat::Html);
        assert_eq!(InputFormat::from_html_flag(false), InputFormat::Csv);
    }

    #[test]
    fn test_read_table_csv_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Event Id,Status,Suburb\r\n1,,Fyshwick\r\n").unwrap();

        let table = read_table(file.path(), InputFormat::Csv).unwrap();
        assert_eq!(table.header, vec!["Event Id", "Status", "Suburb"]);
        assert_eq!(table.rows.len(), 1);
    }
}
