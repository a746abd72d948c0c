//! Configuration structures for the delivery statistics pipeline.

use crate::error::{Error, Result};
use crate::types::{Granularity, CRORE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Symbol selection.
    pub filter: FilterConfig,
    /// Spike thresholds.
    pub spikes: SpikeConfig,
    /// Aggregation configuration.
    pub aggregation: AggregationConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing sections fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let pct = self.spikes.delivery_pct_threshold;
        if !(0.0..=100.0).contains(&pct) {
            return Err(Error::config(format!(
                "delivery_pct_threshold must be within [0, 100], got {pct}"
            )));
        }

        let crores = self.spikes.net_value_threshold_crores;
        if !crores.is_finite() || crores < 0.0 {
            return Err(Error::config(format!(
                "net_value_threshold_crores must be a non-negative number, got {crores}"
            )));
        }

        if self.filter.symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(Error::config("symbol filter contains an empty symbol"));
        }

        Ok(())
    }
}

/// Symbol selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Symbols to keep. Empty keeps every symbol present.
    pub symbols: Vec<String>,
}

impl FilterConfig {
    /// Whether `symbol` passes the filter.
    pub fn accepts(&self, symbol: &str) -> bool {
        self.symbols.is_empty() || self.symbols.iter().any(|s| s == symbol)
    }
}

/// Spike detection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeConfig {
    /// Delivery percentage at or above which a row is a spike.
    pub delivery_pct_threshold: f64,
    /// Net value in crores above which a row is highlighted.
    pub net_value_threshold_crores: f64,
}

impl SpikeConfig {
    /// Net-value threshold in currency units.
    pub fn net_value_threshold(&self) -> f64 {
        self.net_value_threshold_crores * CRORE
    }
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            delivery_pct_threshold: 75.0,
            net_value_threshold_crores: 0.0,
        }
    }
}

/// Aggregation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Granularities to compute.
    pub granularities: Vec<Granularity>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            granularities: Granularity::ALL.to_vec(),
        }
    }
}
