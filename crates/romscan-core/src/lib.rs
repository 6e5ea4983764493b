/// romscan core — adaptive directory scanning with a shared result cache.
///
/// This crate contains the scanning engine with zero UI dependencies.
/// Frontends hand it a directory and get back an ordered list of ROM
/// records; everything about *how* the directory gets walked is decided here.
///
/// # Modules
///
/// - [`scanner`] — Scan orchestrator, result cache, latency probe, strategy
///   selection, throughput tuning and the default traversal primitive.
/// - [`detect`] — ROM extension catalog used to decide which files count.
/// - [`model`] — Result records produced by a scan.
/// - [`config`] — Layered engine configuration (defaults, TOML, environment).
/// - [`error`] — Error types and the degrade-to-default combinator.
pub mod config;
pub mod detect;
pub mod error;
pub mod model;
pub mod scanner;

pub use config::EngineConfig;
pub use error::{ConfigError, OrDegrade, ScanError};
pub use model::{Checksums, ScanRecord};
pub use scanner::{ScanEngine, ScanRequest, ScanResults, SharedState};
