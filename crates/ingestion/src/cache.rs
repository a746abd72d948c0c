//! Content-keyed memoization of cleaned uploads.
//!
//! Cleaning is a pure function of the file bytes, so re-uploading the same
//! file (or re-running with new filter parameters) reuses the earlier result.

use crate::cleaner::{clean_csv, CleanedTable};
use delivery_core::Result;
use std::collections::HashMap;
use tracing::debug;

/// Cache of cleaned tables keyed by a BLAKE3 hash of the raw bytes.
#[derive(Debug, Default)]
pub struct CleanCache {
    entries: HashMap<blake3::Hash, CleanedTable>,
    hits: u64,
    misses: u64,
}

impl CleanCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean `bytes`, reusing a previous result for identical content.
    ///
    /// The returned table carries `label` even on a hit. Schema failures are
    /// not cached.
    pub fn clean(&mut self, label: &str, bytes: &[u8]) -> Result<CleanedTable> {
        let key = blake3::hash(bytes);

        if let Some(cached) = self.entries.get(&key) {
            self.hits += 1;
            debug!(file = label, hash = %key.to_hex(), "clean cache hit");
            let mut table = cached.clone();
            table.label = label.to_string();
            return Ok(table);
        }

        self.misses += 1;
        let table = clean_csv(label, bytes)?;
        self.entries.insert(key, table.clone());
        Ok(table)
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation or the last clear.
    pub fn hit_stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// Drop every cached table.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
