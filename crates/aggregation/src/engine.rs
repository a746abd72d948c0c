//! Pipeline engine.
//!
//! Combines cleaning, merging, aggregation and spike detection into one
//! batch run over every uploaded file.

use crate::aggregator::aggregate;
use crate::report::{DeliveryReport, GranularityReport, SourceReport};
use crate::spike::SpikeDetector;
use crate::summary::summarize;
use delivery_core::{config::FilterConfig, CanonicalRecord, Config, Result};
use delivery_ingestion::{distinct_symbols, merge_tables, CleanCache, CleanedTable, CleaningStats};
use tracing::{debug, info};

/// Batch pipeline over a set of uploads.
pub struct DeliveryEngine {
    /// Run parameters.
    config: Config,
    /// Cleaned tables by content, reused across uploads and runs.
    cache: CleanCache,
    /// Cleaned uploads, in upload order.
    sources: Vec<CleanedTable>,
}

impl DeliveryEngine {
    /// Create an engine after validating the configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cache: CleanCache::new(),
            sources: Vec::new(),
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the run parameters. Uploaded data is kept.
    pub fn set_config(&mut self, config: Config) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Clean and add one CSV upload.
    ///
    /// A schema error rejects the file and leaves the engine unchanged; the
    /// caller decides whether to abort the batch.
    pub fn add_csv(&mut self, label: &str, bytes: &[u8]) -> Result<&CleaningStats> {
        let table = self.cache.clean(label, bytes)?;
        Ok(self.add_table(table))
    }

    /// Add an already cleaned table.
    pub fn add_table(&mut self, table: CleanedTable) -> &CleaningStats {
        debug!(file = %table.label, rows = table.records.len(), "added source");
        let idx = self.sources.len();
        self.sources.push(table);
        &self.sources[idx].stats
    }

    /// Number of uploads added.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Merged, deduplicated, date-sorted records of every upload.
    pub fn merged(&self) -> Vec<CanonicalRecord> {
        merge_tables(&self.sources)
    }

    /// Every symbol present across uploads, in first-appearance order.
    pub fn symbols(&self) -> Vec<String> {
        distinct_symbols(&self.merged())
    }

    /// Run the pipeline with the current configuration.
    pub fn run(&self) -> DeliveryReport {
        let merged = self.merged();
        let available_symbols = distinct_symbols(&merged);
        let records = filter_symbols(merged, &self.config.filter);

        let detector = SpikeDetector::from_config(&self.config.spikes);
        let summary = summarize(&records);

        let aggregates: Vec<GranularityReport> = self
            .config
            .aggregation
            .granularities
            .iter()
            .map(|&granularity| {
                let aggregated = aggregate(&records, granularity);
                GranularityReport {
                    granularity,
                    delivery_spikes: detector.delivery_spikes(&aggregated),
                    net_value_spikes: detector.net_value_spikes(&aggregated),
                    records: aggregated,
                }
            })
            .collect();

        let delivery_spikes = detector.delivery_spikes(&records);
        let net_value_spikes = detector.net_value_spikes(&records);

        info!(
            sources = self.sources.len(),
            rows = records.len(),
            symbols = summary.symbol_count,
            days = summary.distinct_dates,
            delivery_spikes = delivery_spikes.count,
            net_value_spikes = net_value_spikes.count,
            "pipeline run complete"
        );

        DeliveryReport {
            sources: self
                .sources
                .iter()
                .map(|t| SourceReport {
                    label: t.label.clone(),
                    stats: t.stats.clone(),
                })
                .collect(),
            available_symbols,
            records,
            summary,
            delivery_spikes,
            net_value_spikes,
            aggregates,
        }
    }

    /// Content cache of cleaned uploads.
    pub fn cache(&self) -> &CleanCache {
        &self.cache
    }

    /// Drop every upload and its cached cleaning result.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.cache.clear();
    }
}

/// Keep only records whose symbol passes the filter, preserving order.
pub fn filter_symbols(records: Vec<CanonicalRecord>, filter: &FilterConfig) -> Vec<CanonicalRecord> {
    if filter.symbols.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| filter.accepts(&r.symbol))
        .collect()
}

/// Clean, merge and aggregate a batch of `(label, bytes)` uploads.
///
/// Aborts on the first file with a schema error.
pub fn run_batch<'a, I>(inputs: I, config: Config) -> Result<DeliveryReport>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut engine = DeliveryEngine::new(config)?;
    for (label, bytes) in inputs {
        engine.add_csv(label, bytes)?;
    }
    Ok(engine.run())
}
