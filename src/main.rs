//! romscan — command-line driver for the scanning engine.
//!
//! Thin binary entry point. All logic lives in the `romscan-core` crate;
//! this only loads configuration, runs scans and prints a JSON report.

use anyhow::Context;
use clap::Parser;
use romscan_core::scanner::{CacheStatistics, PerformanceProfile, ScanEngine, ScanRequest};
use romscan_core::{EngineConfig, ScanRecord, SharedState};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Scan directories for ROM files using the adaptive scanning engine.
#[derive(Parser, Debug)]
#[command(name = "romscan", version, about)]
struct Cli {
    /// Directories to scan, in order.
    #[arg(required = true, value_name = "DIR")]
    directories: Vec<PathBuf>,

    /// Only look at the top level of each directory.
    #[arg(long)]
    no_recursive: bool,

    /// Bypass the result cache.
    #[arg(long)]
    no_cache: bool,

    /// Scan every directory this many times (later passes show cache hits).
    #[arg(long, default_value_t = 1, value_name = "N")]
    passes: u32,

    /// TOML configuration file (overridden by ROMSCAN_* environment variables).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Include every record in the report, not just counts.
    #[arg(long)]
    records: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct DirectoryReport {
    directory: PathBuf,
    pass: u32,
    record_count: usize,
    total_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<Vec<ScanRecord>>,
}

#[derive(Serialize)]
struct Report {
    scans: Vec<DirectoryReport>,
    cache: CacheStatistics,
    performance: PerformanceProfile,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    tracing::debug!("Effective configuration: {config:?}");

    let shared = Arc::new(SharedState::new(&config));
    let mut engine = ScanEngine::new(shared, &config);

    let mut scans = Vec::new();
    for pass in 1..=cli.passes.max(1) {
        for directory in &cli.directories {
            let request = ScanRequest::new(directory.clone())
                .recursive(!cli.no_recursive)
                .use_cache(!cli.no_cache);
            let results = engine.scan(&request);
            scans.push(DirectoryReport {
                directory: directory.clone(),
                pass,
                record_count: results.len(),
                total_bytes: results.iter().map(|r| r.size).sum(),
                records: cli.records.then(|| results.to_vec()),
            });
        }
    }

    let report = Report {
        scans,
        cache: engine.cache_statistics(),
        performance: engine.performance_profile(),
    };
    let json = serde_json::to_string_pretty(&report).context("serialising report")?;
    println!("{json}");
    Ok(())
}
