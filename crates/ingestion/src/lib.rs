//! Data ingestion and normalization for the delivery statistics pipeline.
//!
//! This crate handles:
//! - Header normalization across upload formats
//! - Tolerant date and number parsing
//! - Record cleaning (raw CSV -> canonical records)
//! - Content-keyed memoization of cleaned uploads
//! - Merging and deduplicating multiple uploads

pub mod cache;
pub mod cleaner;
pub mod columns;
pub mod merger;
pub mod parse;
pub mod raw;

pub use cache::CleanCache;
pub use cleaner::{clean_csv, clean_table, CleanedTable, CleaningStats, RowIssue};
pub use columns::{canonical_name, normalize_header, ColumnMap};
pub use merger::{distinct_symbols, merge_records, merge_tables};
pub use raw::{read_csv_table, RawTable};
