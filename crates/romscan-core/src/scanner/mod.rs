/// Scanner module — adaptive directory scanning with a shared result cache.
///
/// - [`engine`] — the orchestrator ([`ScanEngine::scan`]).
/// - [`cache`] / [`shared`] — the TTL- and capacity-bounded result cache and
///   the process-wide state it lives in.
/// - [`probe`], [`strategy`], [`tuner`] — latency probing, parallel vs.
///   sequential selection, and post-scan parameter adaptation.
/// - [`traverse`] — the walk itself (`jwalk` + `rayon` by default).
///
/// Scans normally run inline on the caller's thread. [`start_scan`] runs one
/// on a background thread instead, reporting through a bounded channel so a
/// UI can stay responsive.
pub mod cache;
pub mod checksum;
pub mod clock;
pub mod engine;
pub mod probe;
pub mod progress;
pub mod shared;
pub mod strategy;
pub mod traverse;
pub mod tuner;

pub use cache::{CacheEntry, CacheStatistics, ResultCache};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use engine::{PerformanceProfile, ScanEngine, ScanRequest};
pub use probe::{FixedProbe, LatencyProbe, StatProbe};
pub use progress::{ScanPhase, ScanProgress};
pub use shared::{PerformanceMetrics, SharedState};
pub use strategy::Strategy;
pub use traverse::{FsTraverser, Traversal, TraverseRequest, Traverser};
pub use tuner::AdaptiveParams;

use crate::error::ScanError;
use crate::model::ScanRecord;
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::info;

/// Ordered scan output. Shared, so a cache hit costs a refcount bump.
pub type ScanResults = Arc<[ScanRecord]>;

/// Maximum number of progress messages that may queue up in the channel.
///
/// A scan emits a dozen or so messages; the engine drops messages rather
/// than block when the receiver falls behind.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// Handle to a scan running on a background thread.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan thread.
    pub progress_rx: Receiver<ScanProgress>,
    cancel_flag: Arc<AtomicBool>,
    thread: thread::JoinHandle<(ScanEngine, ScanResults)>,
}

impl ScanHandle {
    /// Request the traversal to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the scan and take back the engine along with its results.
    ///
    /// `None` only if the scan thread panicked.
    pub fn join(self) -> Option<(ScanEngine, ScanResults)> {
        self.thread.join().ok()
    }
}

/// Run one scan on a background thread.
///
/// The engine moves onto the thread and is handed back by
/// [`ScanHandle::join`], with its tuned parameters intact and its cancel
/// flag lowered.
pub fn start_scan(engine: ScanEngine, request: ScanRequest) -> Result<ScanHandle, ScanError> {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel_flag = Arc::new(AtomicBool::new(false));

    let mut engine = engine
        .with_progress(progress_tx)
        .with_cancel_flag(Arc::clone(&cancel_flag));

    let thread = thread::Builder::new()
        .name("romscan-scanner".into())
        .spawn(move || {
            info!("Starting background scan of {}", request.directory.display());
            let results = engine.scan(&request);
            // Dropping the sender lets the receiver see a disconnect.
            engine.detach_progress();
            engine.detach_cancel_flag();
            (engine, results)
        })
        .map_err(ScanError::Spawn)?;

    Ok(ScanHandle {
        progress_rx,
        cancel_flag,
        thread,
    })
}
