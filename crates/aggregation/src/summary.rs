//! Headline statistics over a canonical table.

use chrono::NaiveDate;
use delivery_core::CanonicalRecord;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Summary statistics for the selected rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of rows summarized.
    pub row_count: usize,
    /// Number of distinct symbols.
    pub symbol_count: usize,
    /// Number of distinct trading days.
    pub distinct_dates: usize,
    /// Mean of per-row delivery percentage.
    pub mean_delivery_pct: Option<f64>,
    /// Maximum per-row delivery percentage.
    pub max_delivery_pct: Option<f64>,
    /// Earliest date.
    pub first_date: Option<NaiveDate>,
    /// Latest date.
    pub last_date: Option<NaiveDate>,
}

/// Compute summary statistics. Empty input yields counts of zero and no
/// mean or max.
pub fn summarize(records: &[CanonicalRecord]) -> SummaryStats {
    let pcts: Vec<f64> = records.iter().map(|r| r.delivery_pct).collect();
    let dates: HashSet<NaiveDate> = records.iter().map(|r| r.date).collect();
    let symbols: HashSet<&str> = records.iter().map(|r| r.symbol.as_str()).collect();

    SummaryStats {
        row_count: records.len(),
        symbol_count: symbols.len(),
        distinct_dates: dates.len(),
        mean_delivery_pct: mean(&pcts),
        max_delivery_pct: max(&pcts),
        first_date: dates.iter().min().copied(),
        last_date: dates.iter().max().copied(),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    use statrs::statistics::Statistics;

    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

fn max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .map(OrderedFloat)
        .max()
        .map(OrderedFloat::into_inner)
}
