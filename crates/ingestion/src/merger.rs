//! Multi-source merging.
//!
//! Concatenates cleaned uploads, removes repeated `(symbol, date)` pairs and
//! orders the result by date.

use crate::cleaner::CleanedTable;
use delivery_core::CanonicalRecord;
use std::collections::HashSet;
use tracing::debug;

/// Merge record tables given in upload order.
///
/// The first occurrence of each `(symbol, date)` wins, so earlier uploads take
/// precedence over later ones. The output is stable-sorted by date: rows on
/// the same date keep their concatenation order.
pub fn merge_records<'a, I>(tables: I) -> Vec<CanonicalRecord>
where
    I: IntoIterator<Item = &'a [CanonicalRecord]>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    let mut duplicates = 0usize;

    for table in tables {
        for record in table {
            if seen.insert(record.key()) {
                merged.push(record.clone());
            } else {
                duplicates += 1;
            }
        }
    }

    merged.sort_by_key(|r| r.date);

    debug!(rows = merged.len(), duplicates, "merged tables");
    merged
}

/// Merge cleaned tables given in upload order.
pub fn merge_tables(tables: &[CleanedTable]) -> Vec<CanonicalRecord> {
    merge_records(tables.iter().map(|t| t.records.as_slice()))
}

/// Symbols in order of first appearance.
pub fn distinct_symbols(records: &[CanonicalRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.symbol.as_str()))
        .map(|r| r.symbol.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn rec(symbol: &str, day: u32, traded: u64) -> CanonicalRecord {
        CanonicalRecord {
            symbol: symbol.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            traded_qty: traded,
            deliverable_qty: traded / 2,
            delivery_pct: 50.0,
            open: None,
            close: None,
            net_value: None,
        }
    }

    #[test]
    fn test_first_upload_wins() {
        let first = vec![rec("AAA", 2, 1000), rec("AAA", 3, 1100)];
        let second = vec![rec("AAA", 3, 9999), rec("AAA", 4, 1200)];

        let merged = merge_records([first.as_slice(), second.as_slice()]);

        assert_eq!(merged.len(), 3);
        let overlap: Vec<_> = merged.iter().filter(|r| r.date.day() == 3).collect();
        assert_eq!(overlap.len(), 1);
        assert_eq!(overlap[0].traded_qty, 1100);
    }

    #[test]
    fn test_sorted_by_date_with_stable_ties() {
        let first = vec![rec("BBB", 5, 1), rec("AAA", 2, 2)];
        let second = vec![rec("AAA", 5, 3), rec("CCC", 1, 4)];

        let merged = merge_records([first.as_slice(), second.as_slice()]);
        let order: Vec<(&str, u64)> = merged.iter().map(|r| (r.symbol.as_str(), r.traded_qty)).collect();

        assert_eq!(order, vec![("CCC", 4), ("AAA", 2), ("BBB", 1), ("AAA", 3)]);
    }

    #[test]
    fn test_duplicates_within_one_file() {
        let only = vec![rec("AAA", 2, 10), rec("AAA", 2, 20)];
        let merged = merge_records([only.as_slice()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].traded_qty, 10);
    }

    #[test]
    fn test_distinct_symbols_first_appearance() {
        let records = vec![rec("BBB", 1, 1), rec("AAA", 1, 1), rec("BBB", 2, 1)];
        assert_eq!(distinct_symbols(&records), vec!["BBB", "AAA"]);
    }

    #[test]
    fn test_empty_inputs() {
        let merged = merge_tables(&[]);
        assert!(merged.is_empty());
    }
}
