//! Untyped tables as read from an uploaded file.

use delivery_core::{Error, Result};
use tracing::debug;

/// A header row plus string cells, exactly as uploaded.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Label of the source, used in error messages.
    pub label: String,
    /// Header cells as they appear in the file.
    pub headers: Vec<String>,
    /// Data rows. Every row has `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from in-memory rows. Short rows are padded with empty
    /// cells and long rows are truncated to the header width.
    pub fn new(label: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            label: label.into(),
            headers,
            rows,
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read CSV bytes into a raw table.
///
/// Bytes are decoded lossily, so stray non-UTF-8 characters never fail the
/// file. Cells are trimmed; rows may have fewer or more cells than the header.
pub fn read_csv_table(label: &str, bytes: &[u8]) -> Result<RawTable> {
    let decoded = String::from_utf8_lossy(bytes);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded[..]);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::csv(label, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| Error::csv(label, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(file = label, columns = headers.len(), rows = rows.len(), "read csv");
    Ok(RawTable::new(label, headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv() {
        let csv = "Symbol,Date,Traded Qty\nAAA,01-Jan-2024,\"1,000\"\nBBB,02-Jan-2024,500\n";
        let table = read_csv_table("a.csv", csv.as_bytes()).unwrap();
        assert_eq!(table.label, "a.csv");
        assert_eq!(table.headers, vec!["Symbol", "Date", "Traded Qty"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][2], "1,000");
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let csv = "a,b,c\n1,2\n1,2,3,4\n";
        let table = read_csv_table("ragged.csv", csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_bom_and_invalid_utf8() {
        let mut bytes = "\u{feff}Symbol,Date\n".as_bytes().to_vec();
        bytes.extend_from_slice(b"AB\xffC,2024-01-01\n");
        let table = read_csv_table("bom.csv", &bytes).unwrap();
        assert_eq!(table.headers[0], "Symbol");
        assert_eq!(table.rows[0][0], "AB\u{fffd}C");
    }

    #[test]
    fn test_header_only() {
        let table = read_csv_table("empty.csv", b"Symbol,Date\n").unwrap();
        assert!(table.is_empty());
    }
}
