//! Record cleaning.
//!
//! Turns one raw table into canonical records. Missing required columns fail
//! the whole file; malformed rows are dropped and counted.

use crate::columns::ColumnMap;
use crate::parse::{non_missing, parse_date, parse_number, parse_price, parse_quantity};
use crate::raw::{read_csv_table, RawTable};
use delivery_core::{CanonicalRecord, Error, Field, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Why a row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowIssue {
    /// Date cell missing or in no recognized layout.
    BadDate,
    /// A mandatory numeric cell is missing or unparseable.
    BadNumber(Field),
    /// Symbol cell is a missing-value placeholder.
    MissingSymbol,
}

/// Statistics about one cleaned file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningStats {
    /// Data rows in the raw table.
    pub rows_read: usize,
    /// Rows that became canonical records.
    pub rows_kept: usize,
    /// Rows dropped for an unparseable date.
    pub dropped_bad_date: usize,
    /// Rows dropped for an unparseable mandatory number.
    pub dropped_bad_number: usize,
    /// Rows dropped for a missing symbol.
    pub dropped_missing_symbol: usize,
    /// Whether the file had an opening price column.
    pub has_open: bool,
    /// Whether the file had a closing price column.
    pub has_close: bool,
}

impl CleaningStats {
    /// Total dropped rows.
    pub fn dropped(&self) -> usize {
        self.dropped_bad_date + self.dropped_bad_number + self.dropped_missing_symbol
    }

    fn record_issue(&mut self, issue: RowIssue) {
        match issue {
            RowIssue::BadDate => self.dropped_bad_date += 1,
            RowIssue::BadNumber(_) => self.dropped_bad_number += 1,
            RowIssue::MissingSymbol => self.dropped_missing_symbol += 1,
        }
    }
}

/// Canonical records cleaned from one input.
#[derive(Debug, Clone, Default)]
pub struct CleanedTable {
    /// Label of the source.
    pub label: String,
    /// Surviving records, in file order.
    pub records: Vec<CanonicalRecord>,
    /// Cleaning statistics.
    pub stats: CleaningStats,
}

impl CleanedTable {
    /// Whether no rows survived.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Clean a raw table into canonical records.
///
/// Fails with [`Error::Schema`] when a required column is missing after
/// header normalization. A table where every row is dropped is still valid.
pub fn clean_table(raw: &RawTable) -> Result<CleanedTable> {
    let columns = ColumnMap::from_headers(&raw.headers);

    let missing = columns.missing_required();
    if !missing.is_empty() {
        let missing: Vec<String> = missing.iter().map(|f| f.as_str().to_string()).collect();
        warn!(file = %raw.label, missing = ?missing, "required columns missing");
        return Err(Error::schema(&raw.label, missing));
    }

    let mut stats = CleaningStats {
        rows_read: raw.len(),
        has_open: columns.open.is_some(),
        has_close: columns.close.is_some(),
        ..CleaningStats::default()
    };

    let mut records = Vec::with_capacity(raw.len());
    for (idx, row) in raw.rows.iter().enumerate() {
        match clean_row(row, &columns) {
            Ok(record) => records.push(record),
            Err(issue) => {
                // +2: header line and 1-based numbering
                debug!(file = %raw.label, line = idx + 2, ?issue, "dropping row");
                stats.record_issue(issue);
            }
        }
    }
    stats.rows_kept = records.len();

    if stats.dropped() > 0 {
        warn!(
            file = %raw.label,
            dropped = stats.dropped(),
            bad_date = stats.dropped_bad_date,
            bad_number = stats.dropped_bad_number,
            missing_symbol = stats.dropped_missing_symbol,
            "dropped malformed rows"
        );
    }
    debug!(file = %raw.label, kept = stats.rows_kept, read = stats.rows_read, "cleaned table");

    Ok(CleanedTable {
        label: raw.label.clone(),
        records,
        stats,
    })
}

/// Read and clean one CSV upload.
pub fn clean_csv(label: &str, bytes: &[u8]) -> Result<CleanedTable> {
    let raw = read_csv_table(label, bytes)?;
    clean_table(&raw)
}

fn cell(row: &[String], idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| row.get(i))
        .map(String::as_str)
        .and_then(non_missing)
}

fn clean_row(row: &[String], columns: &ColumnMap) -> std::result::Result<CanonicalRecord, RowIssue> {
    let date = cell(row, columns.date)
        .and_then(parse_date)
        .ok_or(RowIssue::BadDate)?;

    let traded_qty = cell(row, columns.traded_qty)
        .and_then(parse_quantity)
        .ok_or(RowIssue::BadNumber(Field::TradedQty))?;
    let deliverable_qty = cell(row, columns.deliverable_qty)
        .and_then(parse_quantity)
        .ok_or(RowIssue::BadNumber(Field::DeliverableQty))?;
    let delivery_pct = cell(row, columns.delivery_pct)
        .and_then(parse_number)
        .ok_or(RowIssue::BadNumber(Field::DeliveryPct))?;

    let symbol = cell(row, columns.symbol).ok_or(RowIssue::MissingSymbol)?;

    let record = CanonicalRecord {
        symbol: symbol.to_string(),
        date,
        traded_qty,
        deliverable_qty,
        delivery_pct,
        open: cell(row, columns.open).and_then(parse_price),
        close: cell(row, columns.close).and_then(parse_price),
        net_value: None,
    };
    Ok(record.with_net_value())
}
