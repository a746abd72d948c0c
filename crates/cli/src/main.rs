//! Command-line front end: clean, merge and aggregate delivery CSVs and
//! print the report as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use delivery_aggregation::DeliveryEngine;
use delivery_core::{Config, Granularity};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "delivery-cli")]
#[command(about = "Delivery statistics from exchange CSV exports", long_about = None)]
struct Cli {
    /// CSV files, in upload order. Earlier files win on overlapping rows.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Restrict to these symbols (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Delivery percentage spike threshold
    #[arg(long)]
    spike_threshold: Option<f64>,

    /// Net value highlight threshold, in crores
    #[arg(long)]
    net_value_threshold: Option<f64>,

    /// Only compute these granularities (repeatable)
    #[arg(short, long)]
    granularity: Vec<Granularity>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Configuration file (or defaults) with command-line overrides applied.
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default(),
        };

        if !self.symbols.is_empty() {
            config.filter.symbols = self.symbols.clone();
        }
        if let Some(pct) = self.spike_threshold {
            config.spikes.delivery_pct_threshold = pct;
        }
        if let Some(crores) = self.net_value_threshold {
            config.spikes.net_value_threshold_crores = crores;
        }
        if !self.granularity.is_empty() {
            config.aggregation.granularities = self.granularity.clone();
        }
        Ok(config)
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = cli.load_config()?;
    let mut engine = DeliveryEngine::new(config).context("invalid configuration")?;

    for path in &cli.files {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let stats = engine
            .add_csv(&label, &bytes)
            .with_context(|| format!("processing {}", path.display()))?;
        if stats.rows_kept == 0 {
            warn!(file = %label, rows = stats.rows_read, "no usable rows");
        } else {
            info!(file = %label, kept = stats.rows_kept, dropped = stats.dropped(), "loaded");
        }
    }

    let report = engine.run();
    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_applied() {
        let cli = Cli::parse_from([
            "delivery-cli",
            "a.csv",
            "b.csv",
            "--symbols",
            "AAA,BBB",
            "--spike-threshold",
            "60",
            "-g",
            "weekly",
            "-g",
            "month",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(cli.files.len(), 2);
        assert_eq!(config.filter.symbols, vec!["AAA", "BBB"]);
        assert_eq!(config.spikes.delivery_pct_threshold, 60.0);
        assert_eq!(config.spikes.net_value_threshold_crores, 0.0);
        assert_eq!(
            config.aggregation.granularities,
            vec![Granularity::Week, Granularity::Month]
        );
    }

    #[test]
    fn test_files_required() {
        assert!(Cli::try_parse_from(["delivery-cli"]).is_err());
    }
}
