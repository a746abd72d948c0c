//! Threshold-based spike detection.
//!
//! Delivery spikes are inclusive (`>=`) while net-value highlights are strict
//! (`>`). Both are pure filters over any table exposing the metrics.

use delivery_core::{config::SpikeConfig, AggregateRecord, CanonicalRecord};
use serde::{Deserialize, Serialize};

/// Rows that expose the metrics spike detection looks at.
pub trait SpikeMetrics {
    /// Delivery percentage, if defined.
    fn delivery_pct(&self) -> Option<f64>;
    /// Net value in currency units, if defined.
    fn net_value(&self) -> Option<f64>;
}

impl SpikeMetrics for CanonicalRecord {
    fn delivery_pct(&self) -> Option<f64> {
        Some(self.delivery_pct)
    }

    fn net_value(&self) -> Option<f64> {
        self.net_value
    }
}

impl SpikeMetrics for AggregateRecord {
    fn delivery_pct(&self) -> Option<f64> {
        self.delivery_pct
    }

    fn net_value(&self) -> Option<f64> {
        self.net_value_sum
    }
}

/// Rows matching a threshold, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeSet<T> {
    /// Threshold the rows were compared against.
    pub threshold: f64,
    /// Number of matching rows.
    pub count: usize,
    /// Matching rows.
    pub rows: Vec<T>,
}

impl<T> SpikeSet<T> {
    fn new(threshold: f64, rows: Vec<T>) -> Self {
        Self {
            threshold,
            count: rows.len(),
            rows,
        }
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Spike detector with fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeDetector {
    delivery_pct_threshold: f64,
    net_value_threshold: f64,
}

impl SpikeDetector {
    /// Create a detector. `net_value_threshold` is in currency units.
    pub fn new(delivery_pct_threshold: f64, net_value_threshold: f64) -> Self {
        Self {
            delivery_pct_threshold,
            net_value_threshold,
        }
    }

    /// Create a detector from configuration (net value quoted in crores).
    pub fn from_config(config: &SpikeConfig) -> Self {
        Self::new(config.delivery_pct_threshold, config.net_value_threshold())
    }

    /// Delivery percentage threshold.
    pub fn delivery_pct_threshold(&self) -> f64 {
        self.delivery_pct_threshold
    }

    /// Net value threshold in currency units.
    pub fn net_value_threshold(&self) -> f64 {
        self.net_value_threshold
    }

    /// Whether a row's delivery percentage meets or exceeds the threshold.
    #[inline]
    pub fn is_delivery_spike<T: SpikeMetrics>(&self, row: &T) -> bool {
        row.delivery_pct()
            .is_some_and(|pct| pct >= self.delivery_pct_threshold)
    }

    /// Whether a row's net value strictly exceeds the threshold.
    #[inline]
    pub fn is_net_value_spike<T: SpikeMetrics>(&self, row: &T) -> bool {
        row.net_value().is_some_and(|v| v > self.net_value_threshold)
    }

    /// Rows whose delivery percentage is at or above the threshold.
    pub fn delivery_spikes<T: SpikeMetrics + Clone>(&self, rows: &[T]) -> SpikeSet<T> {
        let matched = rows
            .iter()
            .filter(|r| self.is_delivery_spike(*r))
            .cloned()
            .collect();
        SpikeSet::new(self.delivery_pct_threshold, matched)
    }

    /// Rows whose net value is above the threshold.
    pub fn net_value_spikes<T: SpikeMetrics + Clone>(&self, rows: &[T]) -> SpikeSet<T> {
        let matched = rows
            .iter()
            .filter(|r| self.is_net_value_spike(*r))
            .cloned()
            .collect();
        SpikeSet::new(self.net_value_threshold, matched)
    }
}

impl Default for SpikeDetector {
    fn default() -> Self {
        Self::from_config(&SpikeConfig::default())
    }
}
