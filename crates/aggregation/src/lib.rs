//! Period aggregation and spike detection for delivery statistics.
//!
//! This crate handles:
//! - Calendar bucketing and period-over-period changes
//! - Delivery and net-value spike detection
//! - Summary statistics
//! - Batch orchestration over uploaded files

pub mod aggregator;
pub mod engine;
pub mod report;
pub mod spike;
pub mod summary;

pub use aggregator::{aggregate, aggregate_with, apply_pct_changes, daily};
pub use engine::{filter_symbols, run_batch, DeliveryEngine};
pub use report::{DeliveryReport, GranularityReport, SourceReport};
pub use spike::{SpikeDetector, SpikeMetrics, SpikeSet};
pub use summary::{summarize, SummaryStats};
