/// Scan progress reporting — lightweight messages sent from the engine to
/// whoever is watching (usually a UI thread) via a crossbeam channel.
///
/// Messages carry counters and status only; the records themselves are
/// returned by [`ScanEngine::scan`].
///
/// [`ScanEngine::scan`]: super::ScanEngine::scan
use super::strategy::Strategy;
use std::path::PathBuf;
use std::time::Duration;

/// Steps of one scan, in order. Every scan ends in `Done`; validation
/// failure and cache hits jump straight there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Validating,
    CacheCheck,
    Probing,
    Selecting,
    Traversing,
    Tuning,
    Caching,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanProgress {
    /// The engine entered a new phase.
    Phase(ScanPhase),
    /// The requested path was missing or not a directory.
    InvalidDirectory { path: PathBuf, message: String },
    /// Results were served from the cache.
    CacheHit { records: usize },
    /// The strategy selector made its decision.
    StrategySelected(Strategy),
    /// Traversal stopped because the cancel flag was raised.
    Cancelled { records: usize },
    /// A full scan finished.
    Complete {
        records: usize,
        directories: usize,
        duration: Duration,
        strategy: Strategy,
    },
}
