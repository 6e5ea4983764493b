/// Latency probe — estimates per-call `stat` latency for a directory.
///
/// A handful of stats is enough to tell a local SSD (microseconds) from a
/// network share or spun-down disk (milliseconds); the engine uses the
/// verdict to avoid fanning out threads onto a filesystem that cannot keep
/// up with them.
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::trace;

/// Default number of directory entries sampled per probe.
pub const DEFAULT_SAMPLE_SIZE: usize = 20;

pub trait LatencyProbe: Send + Sync {
    /// Mean latency of one stat over up to `max_entries` entries of `dir`.
    ///
    /// Returns `None` when nothing could be measured (empty or unreadable
    /// directory); the caller keeps its previous estimate in that case.
    fn sample(&self, dir: &Path, max_entries: usize) -> Option<Duration>;
}

/// Probe that times real `stat` calls via [`fs::metadata`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StatProbe;

impl LatencyProbe for StatProbe {
    fn sample(&self, dir: &Path, max_entries: usize) -> Option<Duration> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                trace!("Latency probe cannot list {}: {err}", dir.display());
                return None;
            }
        };

        let mut total = Duration::ZERO;
        let mut measured: u32 = 0;
        // Unreadable entries still count towards the sample budget so a
        // directory full of permission errors cannot make the probe unbounded.
        for entry in entries.take(max_entries) {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            let start = Instant::now();
            if fs::metadata(&path).is_ok() {
                total += start.elapsed();
                measured += 1;
            }
        }

        if measured == 0 {
            return None;
        }
        Some(total / measured)
    }
}

/// Probe that always reports the same latency. Useful to pin an engine to
/// the slow or fast path regardless of the machine running it.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub Duration);

impl LatencyProbe for FixedProbe {
    fn sample(&self, _dir: &Path, _max_entries: usize) -> Option<Duration> {
        Some(self.0)
    }
}
