/// Scan orchestrator — the public entry point of the engine.
///
/// One call to [`ScanEngine::scan`] walks this fixed sequence:
///
/// ```text
/// Validating → CacheCheck → Probing → Selecting → Traversing → Tuning → Caching → Done
/// ```
///
/// An invalid directory and a cache hit are the only shortcuts to `Done`
/// (plus cooperative cancellation during traversal, which skips tuning and
/// caching so partial results never land in the cache).
///
/// Nothing fails outward: the worst a caller sees is an empty result and a
/// `warn!` in the log.
use super::cache::CacheStatistics;
use super::probe::{LatencyProbe, StatProbe};
use super::progress::{ScanPhase, ScanProgress};
use super::shared::SharedState;
use super::strategy::{select_strategy, Strategy};
use super::traverse::{FsTraverser, Traversal, TraverseRequest, Traverser};
use super::tuner::{self, AdaptiveParams, ScanSample};
use super::ScanResults;
use crate::config::EngineConfig;
use crate::detect::{Detector, ExtensionCatalog};
use crate::error::{OrDegrade, ScanError};
use crossbeam_channel::Sender;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One scan call: which directory, how deep, and whether the cache may be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Used verbatim as the cache key; see [`ResultCache`](super::cache::ResultCache).
    pub directory: PathBuf,
    pub recursive: bool,
    pub use_cache: bool,
}

impl ScanRequest {
    /// Recursive, cached scan of `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            recursive: true,
            use_cache: true,
        }
    }

    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    #[must_use]
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}

/// What the engine currently believes about the filesystem and itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceProfile {
    pub latency_ms: f64,
    pub last_scan_seconds: f64,
    pub last_throughput: f64,
    pub is_slow_filesystem: bool,
    pub threading_enabled: bool,
    pub batch_size: usize,
}

pub struct ScanEngine {
    shared: Arc<SharedState>,
    params: AdaptiveParams,
    detector: Arc<dyn Detector>,
    traverser: Arc<dyn Traverser>,
    probe: Arc<dyn LatencyProbe>,
    parallel_file_threshold: usize,
    probe_sample_size: usize,
    slow_latency: Duration,
    progress_tx: Option<Sender<ScanProgress>>,
    cancel_flag: Arc<AtomicBool>,
}

impl ScanEngine {
    /// Engine with the default detector, traverser and probe, configured
    /// from `config`, sharing `shared` with any other engine given the same
    /// handle.
    pub fn new(shared: Arc<SharedState>, config: &EngineConfig) -> Self {
        Self {
            shared,
            params: AdaptiveParams::new(config.initial_batch_size),
            detector: Arc::new(ExtensionCatalog::with_extensions(&config.extra_extensions)),
            traverser: Arc::new(FsTraverser::new().with_checksums(config.compute_checksums)),
            probe: Arc::new(StatProbe),
            parallel_file_threshold: config.parallel_file_threshold,
            probe_sample_size: config.probe_sample_size.max(1),
            slow_latency: config.slow_latency(),
            progress_tx: None,
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn with_detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    #[must_use]
    pub fn with_traverser(mut self, traverser: impl Traverser + 'static) -> Self {
        self.traverser = Arc::new(traverser);
        self
    }

    #[must_use]
    pub fn with_probe(mut self, probe: impl LatencyProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    /// Send [`ScanProgress`] messages to `tx`. Sending never blocks; when the
    /// channel is full, messages are dropped.
    #[must_use]
    pub fn with_progress(mut self, tx: Sender<ScanProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Share a cancel flag with the traversal. Raising it stops the current
    /// walk at its next poll; the flag is never reset by the engine.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = flag;
        self
    }

    /// Stop sending progress messages.
    pub fn detach_progress(&mut self) {
        self.progress_tx = None;
    }

    /// Replace the shared cancel flag with a fresh, lowered one so later
    /// scans are unaffected by an earlier cancellation.
    pub fn detach_cancel_flag(&mut self) {
        self.cancel_flag = Arc::new(AtomicBool::new(false));
    }

    /// Scan `request.directory` and return its accepted files, in walk order.
    pub fn scan(&mut self, request: &ScanRequest) -> ScanResults {
        let dir = request.directory.as_path();

        self.emit(ScanProgress::Phase(ScanPhase::Validating));
        if let Err(err) = validate_directory(dir) {
            warn!("Cannot scan {}: {err}", dir.display());
            self.emit(ScanProgress::InvalidDirectory {
                path: dir.to_path_buf(),
                message: err.to_string(),
            });
            return self.finish(ScanResults::from(Vec::new()));
        }

        let key = dir.as_os_str();
        if request.use_cache {
            self.emit(ScanProgress::Phase(ScanPhase::CacheCheck));
            if let Some(cached) = self.shared.lookup(key) {
                debug!("Serving {} records for {} from cache", cached.len(), dir.display());
                self.emit(ScanProgress::CacheHit {
                    records: cached.len(),
                });
                return self.finish(cached);
            }
        }

        let started = Instant::now();

        self.emit(ScanProgress::Phase(ScanPhase::Probing));
        self.probe_latency(dir);

        self.emit(ScanProgress::Phase(ScanPhase::Selecting));
        let strategy = select_strategy(
            dir,
            self.params.slow_filesystem,
            self.detector.as_ref(),
            self.parallel_file_threshold,
        );
        self.emit(ScanProgress::StrategySelected(strategy));
        info!(
            "Scanning {} ({strategy:?}, recursive: {})",
            dir.display(),
            request.recursive
        );

        self.emit(ScanProgress::Phase(ScanPhase::Traversing));
        let Traversal {
            records,
            directories,
        } = self.traverse(dir, request.recursive, strategy);
        let elapsed = started.elapsed();
        let results = ScanResults::from(records);

        if self.cancel_flag.load(Ordering::Relaxed) {
            info!(
                "Scan of {} cancelled with {} records collected; not caching",
                dir.display(),
                results.len()
            );
            self.emit(ScanProgress::Cancelled {
                records: results.len(),
            });
            return self.finish(results);
        }

        self.emit(ScanProgress::Phase(ScanPhase::Tuning));
        let sample = ScanSample::from_scan(results.len(), directories, elapsed);
        self.shared.record_scan(elapsed, sample.throughput);
        self.params = tuner::tune(&self.params, &sample)
            .or_degrade(self.params, "parameter tuning failed; keeping previous parameters");

        self.emit(ScanProgress::Phase(ScanPhase::Caching));
        if request.use_cache && !results.is_empty() {
            self.shared.store(key, Arc::clone(&results));
        }

        info!(
            "Scanned {}: {} records in {} directories, {:.2}s ({:.0} records/s)",
            dir.display(),
            results.len(),
            directories,
            elapsed.as_secs_f64(),
            sample.throughput
        );
        self.emit(ScanProgress::Complete {
            records: results.len(),
            directories,
            duration: elapsed,
            strategy,
        });
        self.finish(results)
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.shared.cache_statistics()
    }

    /// Shared metrics combined with this engine's own parameters.
    pub fn performance_profile(&self) -> PerformanceProfile {
        let metrics = self.shared.metrics();
        PerformanceProfile {
            latency_ms: metrics.latency.as_secs_f64() * 1_000.0,
            last_scan_seconds: metrics.last_scan.as_secs_f64(),
            last_throughput: metrics.last_throughput,
            is_slow_filesystem: self.params.slow_filesystem,
            threading_enabled: self.params.threading_enabled,
            batch_size: self.params.batch_size,
        }
    }

    /// Clear the shared cache (for every engine using it) and its counters.
    pub fn clear_cache(&self) {
        self.shared.clear();
        info!("Scan result cache cleared");
    }

    pub fn params(&self) -> &AdaptiveParams {
        &self.params
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    fn probe_latency(&mut self, dir: &Path) {
        match self.probe.sample(dir, self.probe_sample_size) {
            Some(latency) => {
                self.params.slow_filesystem = latency > self.slow_latency;
                self.shared.record_latency(latency);
                if self.params.slow_filesystem {
                    debug!(
                        "{} looks slow ({:.2} ms per stat); parallel traversal disabled",
                        dir.display(),
                        latency.as_secs_f64() * 1_000.0
                    );
                }
            }
            None => debug!(
                "Latency probe had nothing to measure in {}; keeping previous estimate",
                dir.display()
            ),
        }
    }

    fn traverse(&self, dir: &Path, recursive: bool, strategy: Strategy) -> Traversal {
        let request = TraverseRequest {
            root: dir,
            recursive,
            detector: self.detector.as_ref(),
            cancel: self.cancel_flag.as_ref(),
        };
        match strategy {
            Strategy::Sequential => self.traverser.traverse_sequential(&request),
            Strategy::Parallel => self.traverser.traverse_parallel(&request),
        }
    }

    fn emit(&self, message: ScanProgress) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.try_send(message);
        }
    }

    fn finish(&self, results: ScanResults) -> ScanResults {
        self.emit(ScanProgress::Phase(ScanPhase::Done));
        results
    }
}

fn validate_directory(dir: &Path) -> Result<(), ScanError> {
    let meta = fs::metadata(dir).map_err(|e| ScanError::io(dir, e))?;
    if meta.is_dir() {
        Ok(())
    } else {
        Err(ScanError::NotADirectory(dir.to_path_buf()))
    }
}
