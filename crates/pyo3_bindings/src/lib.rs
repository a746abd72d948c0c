//! PyO3 bindings for the delivery statistics pipeline.
//!
//! Exposes the Rust pipeline to a Python presentation layer:
//! - CSV cleaning and merging
//! - Period aggregation
//! - Spike detection and summaries

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

use delivery_aggregation::{DeliveryEngine, DeliveryReport, SummaryStats};
use delivery_core::{
    round2, AggregateRecord as RustAggregateRecord, CanonicalRecord as RustCanonicalRecord,
    Config as RustConfig, Error as RustError,
};
use delivery_ingestion::CleaningStats as RustCleaningStats;

fn to_py_err(err: RustError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One cleaned trading day for one symbol.
#[pyclass]
#[derive(Clone)]
pub struct DeliveryRecord {
    #[pyo3(get)]
    pub symbol: String,
    /// ISO date, `YYYY-MM-DD`.
    #[pyo3(get)]
    pub date: String,
    #[pyo3(get)]
    pub traded_qty: u64,
    #[pyo3(get)]
    pub deliverable_qty: u64,
    #[pyo3(get)]
    pub delivery_pct: f64,
    #[pyo3(get)]
    pub open: Option<f64>,
    #[pyo3(get)]
    pub close: Option<f64>,
    #[pyo3(get)]
    pub net_value: Option<f64>,
}

#[pymethods]
impl DeliveryRecord {
    fn __repr__(&self) -> String {
        format!(
            "DeliveryRecord(symbol={}, date={}, delivery_pct={:.2})",
            self.symbol, self.date, self.delivery_pct
        )
    }
}

impl From<&RustCanonicalRecord> for DeliveryRecord {
    fn from(r: &RustCanonicalRecord) -> Self {
        DeliveryRecord {
            symbol: r.symbol.clone(),
            date: r.date.to_string(),
            traded_qty: r.traded_qty,
            deliverable_qty: r.deliverable_qty,
            delivery_pct: r.delivery_pct,
            open: r.open,
            close: r.close,
            net_value: r.net_value,
        }
    }
}

/// Aggregated totals for one symbol over one period.
#[pyclass]
#[derive(Clone)]
pub struct PeriodRecord {
    /// ISO date of the first day of the period.
    #[pyo3(get)]
    pub period_start: String,
    #[pyo3(get)]
    pub symbol: String,
    #[pyo3(get)]
    pub traded_qty_sum: u64,
    #[pyo3(get)]
    pub deliverable_qty_sum: u64,
    #[pyo3(get)]
    pub net_value_sum: Option<f64>,
    #[pyo3(get)]
    pub delivery_pct: Option<f64>,
    #[pyo3(get)]
    pub traded_qty_pct_change: Option<f64>,
    #[pyo3(get)]
    pub deliverable_qty_pct_change: Option<f64>,
    #[pyo3(get)]
    pub traded_qty_millions: f64,
    #[pyo3(get)]
    pub deliverable_qty_millions: f64,
}

#[pymethods]
impl PeriodRecord {
    /// Traded change rounded for display.
    #[getter]
    fn traded_qty_pct_change_rounded(&self) -> Option<f64> {
        self.traded_qty_pct_change.map(round2)
    }

    /// Deliverable change rounded for display.
    #[getter]
    fn deliverable_qty_pct_change_rounded(&self) -> Option<f64> {
        self.deliverable_qty_pct_change.map(round2)
    }

    fn __repr__(&self) -> String {
        format!(
            "PeriodRecord(symbol={}, period_start={}, traded={}, deliverable={})",
            self.symbol, self.period_start, self.traded_qty_sum, self.deliverable_qty_sum
        )
    }
}

impl From<&RustAggregateRecord> for PeriodRecord {
    fn from(a: &RustAggregateRecord) -> Self {
        PeriodRecord {
            period_start: a.period_start.to_string(),
            symbol: a.symbol.clone(),
            traded_qty_sum: a.traded_qty_sum,
            deliverable_qty_sum: a.deliverable_qty_sum,
            net_value_sum: a.net_value_sum,
            delivery_pct: a.delivery_pct,
            traded_qty_pct_change: a.traded_qty_pct_change,
            deliverable_qty_pct_change: a.deliverable_qty_pct_change,
            traded_qty_millions: a.traded_qty_millions(),
            deliverable_qty_millions: a.deliverable_qty_millions(),
        }
    }
}

/// Per-file cleaning statistics.
#[pyclass]
#[derive(Clone)]
pub struct CleaningStats {
    #[pyo3(get)]
    pub rows_read: usize,
    #[pyo3(get)]
    pub rows_kept: usize,
    #[pyo3(get)]
    pub dropped_bad_date: usize,
    #[pyo3(get)]
    pub dropped_bad_number: usize,
    #[pyo3(get)]
    pub dropped_missing_symbol: usize,
    #[pyo3(get)]
    pub has_open: bool,
    #[pyo3(get)]
    pub has_close: bool,
}

impl From<&RustCleaningStats> for CleaningStats {
    fn from(s: &RustCleaningStats) -> Self {
        CleaningStats {
            rows_read: s.rows_read,
            rows_kept: s.rows_kept,
            dropped_bad_date: s.dropped_bad_date,
            dropped_bad_number: s.dropped_bad_number,
            dropped_missing_symbol: s.dropped_missing_symbol,
            has_open: s.has_open,
            has_close: s.has_close,
        }
    }
}

/// Headline statistics.
#[pyclass]
#[derive(Clone)]
pub struct Summary {
    #[pyo3(get)]
    pub row_count: usize,
    #[pyo3(get)]
    pub symbol_count: usize,
    #[pyo3(get)]
    pub distinct_dates: usize,
    #[pyo3(get)]
    pub mean_delivery_pct: Option<f64>,
    #[pyo3(get)]
    pub max_delivery_pct: Option<f64>,
    #[pyo3(get)]
    pub first_date: Option<String>,
    #[pyo3(get)]
    pub last_date: Option<String>,
}

impl From<&SummaryStats> for Summary {
    fn from(s: &SummaryStats) -> Self {
        Summary {
            row_count: s.row_count,
            symbol_count: s.symbol_count,
            distinct_dates: s.distinct_dates,
            mean_delivery_pct: s.mean_delivery_pct,
            max_delivery_pct: s.max_delivery_pct,
            first_date: s.first_date.map(|d| d.to_string()),
            last_date: s.last_date.map(|d| d.to_string()),
        }
    }
}

/// Output of one pipeline run.
#[pyclass]
pub struct Report {
    inner: DeliveryReport,
}

#[pymethods]
impl Report {
    /// Cleaned records after the symbol filter.
    #[getter]
    fn records(&self) -> Vec<DeliveryRecord> {
        self.inner.records.iter().map(DeliveryRecord::from).collect()
    }

    /// Every symbol present across uploads.
    #[getter]
    fn available_symbols(&self) -> Vec<String> {
        self.inner.available_symbols.clone()
    }

    #[getter]
    fn summary(&self) -> Summary {
        Summary::from(&self.inner.summary)
    }

    /// Cleaning statistics keyed by file label.
    #[getter]
    fn sources(&self) -> Vec<(String, CleaningStats)> {
        self.inner
            .sources
            .iter()
            .map(|s| (s.label.clone(), CleaningStats::from(&s.stats)))
            .collect()
    }

    /// Aggregates keyed by granularity name (`"week"`, `"half_year"`, ...).
    #[getter]
    fn aggregates(&self) -> HashMap<String, Vec<PeriodRecord>> {
        self.inner
            .aggregates
            .iter()
            .map(|g| {
                let rows = g.records.iter().map(PeriodRecord::from).collect();
                (g.granularity.to_string(), rows)
            })
            .collect()
    }

    /// Daily rows at or above the delivery threshold.
    #[getter]
    fn delivery_spikes(&self) -> Vec<DeliveryRecord> {
        self.inner
            .delivery_spikes
            .rows
            .iter()
            .map(DeliveryRecord::from)
            .collect()
    }

    /// Daily rows above the net-value threshold.
    #[getter]
    fn net_value_spikes(&self) -> Vec<DeliveryRecord> {
        self.inner
            .net_value_spikes
            .rows
            .iter()
            .map(DeliveryRecord::from)
            .collect()
    }

    /// Period rows at or above the delivery threshold for one granularity.
    fn period_spikes(&self, granularity: &str) -> PyResult<Vec<PeriodRecord>> {
        let g = granularity.parse().map_err(to_py_err)?;
        Ok(self
            .inner
            .aggregates_for(g)
            .map(|r| r.delivery_spikes.rows.iter().map(PeriodRecord::from).collect())
            .unwrap_or_default())
    }

    /// Whole report as a JSON string.
    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner).map_err(|e| PyValueError::new_err(e.to_string()))
    }
}

// ============================================================================
// Engine Wrapper
// ============================================================================

/// Batch pipeline over uploaded CSV files.
#[pyclass(name = "DeliveryEngine")]
pub struct PyDeliveryEngine {
    inner: DeliveryEngine,
}

fn parse_config(config_json: Option<&str>) -> PyResult<RustConfig> {
    match config_json {
        Some(json) => RustConfig::from_json_str(json).map_err(to_py_err),
        None => Ok(RustConfig::default()),
    }
}

#[pymethods]
impl PyDeliveryEngine {
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = parse_config(config_json)?;
        Ok(PyDeliveryEngine {
            inner: DeliveryEngine::new(config).map_err(to_py_err)?,
        })
    }

    /// Replace run parameters, keeping uploaded files.
    fn set_config(&mut self, config_json: &str) -> PyResult<()> {
        let config = parse_config(Some(config_json))?;
        self.inner.set_config(config).map_err(to_py_err)
    }

    /// Clean and add one CSV upload. Raises `ValueError` on a schema error.
    fn add_csv(&mut self, label: &str, data: &[u8]) -> PyResult<CleaningStats> {
        self.inner
            .add_csv(label, data)
            .map(CleaningStats::from)
            .map_err(to_py_err)
    }

    /// Run the pipeline with the current parameters.
    fn run(&self) -> Report {
        Report {
            inner: self.inner.run(),
        }
    }

    /// Symbols across all uploads, in first-appearance order.
    fn symbols(&self) -> Vec<String> {
        self.inner.symbols()
    }

    /// Number of uploads added.
    fn source_count(&self) -> usize {
        self.inner.source_count()
    }

    /// Drop all uploads.
    fn clear(&mut self) {
        self.inner.clear();
    }
}

// ============================================================================
// Module Definition
// ============================================================================

/// Delivery statistics core - Rust pipeline for Python dashboards.
#[pymodule]
fn delivery_stats_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<DeliveryRecord>()?;
    m.add_class::<PeriodRecord>()?;
    m.add_class::<CleaningStats>()?;
    m.add_class::<Summary>()?;
    m.add_class::<Report>()?;

    // Engine
    m.add_class::<PyDeliveryEngine>()?;

    Ok(())
}
