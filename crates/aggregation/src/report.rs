//! Pipeline output handed to presentation layers.

use crate::spike::SpikeSet;
use crate::summary::SummaryStats;
use delivery_core::{AggregateRecord, CanonicalRecord, Granularity};
use delivery_ingestion::CleaningStats;
use serde::{Deserialize, Serialize};

/// Cleaning outcome for one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub label: String,
    pub stats: CleaningStats,
}

/// Aggregates and their spikes at one granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranularityReport {
    pub granularity: Granularity,
    pub records: Vec<AggregateRecord>,
    pub delivery_spikes: SpikeSet<AggregateRecord>,
    pub net_value_spikes: SpikeSet<AggregateRecord>,
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Per-file cleaning outcome, in upload order.
    pub sources: Vec<SourceReport>,
    /// Every symbol in the merged table, in first-appearance order.
    pub available_symbols: Vec<String>,
    /// Merged records after the symbol filter.
    pub records: Vec<CanonicalRecord>,
    /// Headline statistics of `records`.
    pub summary: SummaryStats,
    /// Row-level delivery spikes.
    pub delivery_spikes: SpikeSet<CanonicalRecord>,
    /// Row-level net-value highlights.
    pub net_value_spikes: SpikeSet<CanonicalRecord>,
    /// One entry per configured granularity.
    pub aggregates: Vec<GranularityReport>,
}

impl DeliveryReport {
    /// Aggregates for a granularity, if it was computed.
    pub fn aggregates_for(&self, granularity: Granularity) -> Option<&GranularityReport> {
        self.aggregates.iter().find(|g| g.granularity == granularity)
    }
}
