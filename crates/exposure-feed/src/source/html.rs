//! Disclosure page scraping

use crate::error::{FeedError, Result};
use crate::schema::RawTable;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| FeedError::html(format!("Invalid selector '{css}': {e}")))
}

fn cell_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find the first CSV link inside the page's `<script>` elements
///
/// The page builds its table client-side, so the link is only present in
/// script source, never in an anchor.
pub fn find_csv_link(html: &str, pattern: &Regex) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let scripts = selector("script")?;

    for script in document.select(&scripts) {
        let source: String = script.text().collect();
        if let Some(found) = pattern.find(&source) {
            debug!(link = found.as_str(), "Found CSV link in page script");
            return Ok(Some(found.as_str().to_string()));
        }
    }

    Ok(None)
}

/// Read the first `<table>` of a page, its first row as header
///
/// A page without a table yields an empty table.
pub fn parse_table(html: &str) -> Result<RawTable> {
    let document = Html::parse_document(html);
    let tables = selector("table")?;
    let rows = selector("tr")?;
    let cells = selector("th, td")?;

    let Some(table) = document.select(&tables).next() else {
        debug!("No table found in page");
        return Ok(RawTable::default());
    };

    let mut parsed = table
        .select(&rows)
        .map(|row| row.select(&cells).map(cell_text).collect::<Vec<_>>())
        .filter(|row| !row.is_empty());

    let header = parsed.next().unwrap_or_default();
    let rows: Vec<Vec<String>> = parsed
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    debug!(columns = header.len(), rows = rows.len(), "Parsed HTML table");

    Ok(RawTable { header, rows })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const PATTERN: &str = r"https://www[.]covid19[.]act[.]gov[.]au/.*?[.]csv";

    #[test]
    fn test_find_csv_link_in_script() {
        let html = r##"
            <html><head>
            <script>var unrelated = "https://www.covid19.act.gov.au/page";</script>
            <script type="text/javascript">
              loadTable("https://www.covid19.act.gov.au/__data/assets/file/0007/exposures.csv", "#t");
            </script>
            </head><body>
            <a href="https://www.covid19.act.gov.au/other.csv">not a script</a>
            </body></html>"##;
        let pattern = Regex::new(PATTERN).unwrap();

        assert_eq!(
            find_csv_link(html, &pattern).unwrap().as_deref(),
            Some("https://www.covid19.act.gov.au/__data/assets/file/0007/exposures.csv")
        );
    }

    #[test]
    fn test_anchor_links_are_ignored() {
        let html = r#"<html><body><a href="https://www.covid19.act.gov.au/x.csv">csv</a></body></html>"#;
        let pattern = Regex::new(PATTERN).unwrap();

        assert_eq!(find_csv_link(html, &pattern).unwrap(), None);
    }

    #[test]
    fn test_parse_table() {
        let html = r#"
            <table>
              <thead><tr><th>Event Id</th><th> Exposure
                  Site </th></tr></thead>
              <tbody>
                <tr><td></td><td>Harvey <b>Norman</b></td></tr>
                <tr><td></td><td></td></tr>
                <tr><td>2</td><td>Canberra Outlet Centre</td></tr>
              </tbody>
            </table>
            <table><tr><th>Ignored</th></tr></table>"#;

        let table = parse_table(html).unwrap();

        assert_eq!(table.header, vec!["Event Id", "Exposure Site"]);
        assert_eq!(
            table.rows,
            vec![vec!["", "Harvey Norman"], vec!["2", "Canberra Outlet Centre"]]
        );
    }

    #[test]
    fn test_parse_page_without_table() {
        assert_eq!(parse_table("<p>Nothing here</p>").unwrap(), RawTable::default());
    }
}
