/// Adaptive parameter tuning — a post-scan feedback loop.
///
/// After every full scan the engine feeds the observed throughput back into
/// its per-instance [`AdaptiveParams`]: fast scans grow the batch-size hint,
/// slow ones shrink it, and the threading-preference flag tracks whether
/// recent scans were big enough to be worth parallelising.
///
/// The threading flag is bookkeeping only. Strategy selection samples the
/// directory afresh on every scan and does not read it.
use crate::config::{MAX_BATCH_SIZE, MIN_BATCH_SIZE};
use crate::error::ScanError;
use std::time::Duration;
use tracing::debug;

/// Throughput (records/s) above which the batch size grows.
pub const FAST_THROUGHPUT: f64 = 1_000.0;
/// Throughput (records/s) below which the batch size shrinks.
pub const SLOW_THROUGHPUT: f64 = 100.0;
/// Minimum throughput for a large scan to re-enable threading.
pub const THREADING_THROUGHPUT: f64 = 200.0;

const GROW_FACTOR: f64 = 1.5;
const SHRINK_FACTOR: f64 = 0.8;

/// Per-engine parameters mutated by the probe and the tuner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveParams {
    /// Advisory threading preference, updated by the tuner.
    pub threading_enabled: bool,
    /// Batch-size hint, always within `MIN_BATCH_SIZE..=MAX_BATCH_SIZE`.
    pub batch_size: usize,
    /// Set by the latency probe when stat latency exceeds the threshold.
    pub slow_filesystem: bool,
}

impl AdaptiveParams {
    pub fn new(batch_size: usize) -> Self {
        Self {
            threading_enabled: true,
            batch_size: batch_size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE),
            slow_filesystem: false,
        }
    }
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self::new(100)
    }
}

/// What one completed scan looked like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanSample {
    /// Records per second.
    pub throughput: f64,
    pub directories: usize,
    pub elapsed: Duration,
}

impl ScanSample {
    /// Build a sample from a record count and wall time.
    ///
    /// A zero-length scan has no meaningful rate and reports `0.0`.
    pub fn from_scan(records: usize, directories: usize, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let throughput = if secs > 0.0 { records as f64 / secs } else { 0.0 };
        Self {
            throughput,
            directories,
            elapsed,
        }
    }
}

/// Compute the parameters that should follow `current` after `sample`.
///
/// Pure: `current` is untouched, so a rejected sample leaves the engine's
/// parameters exactly as they were.
pub fn tune(current: &AdaptiveParams, sample: &ScanSample) -> Result<AdaptiveParams, ScanError> {
    let throughput = sample.throughput;
    if !throughput.is_finite() || throughput < 0.0 {
        return Err(ScanError::InvalidMeasurement {
            field: "throughput",
            value: throughput,
        });
    }
    let elapsed = sample.elapsed.as_secs_f64();

    let mut next = *current;

    if throughput > FAST_THROUGHPUT {
        next.batch_size = scale(current.batch_size, GROW_FACTOR).min(MAX_BATCH_SIZE);
    } else if throughput < SLOW_THROUGHPUT {
        next.batch_size = scale(current.batch_size, SHRINK_FACTOR).max(MIN_BATCH_SIZE);
    }

    if sample.directories < 10 || elapsed < 1.0 {
        next.threading_enabled = false;
    } else if sample.directories > 100 && elapsed > 5.0 && throughput > THREADING_THROUGHPUT {
        next.threading_enabled = true;
    }

    if next != *current {
        debug!(
            "Tuned scan parameters: batch {} -> {}, threading {} -> {} ({:.0} rec/s, {} dirs, {:.2}s)",
            current.batch_size,
            next.batch_size,
            current.threading_enabled,
            next.threading_enabled,
            throughput,
            sample.directories,
            elapsed
        );
    }
    Ok(next)
}

/// Truncating multiply, matching integer batch sizes.
fn scale(batch_size: usize, factor: f64) -> usize {
    (batch_size as f64 * factor) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(throughput: f64, directories: usize, secs: f64) -> ScanSample {
        ScanSample {
            throughput,
            directories,
            elapsed: Duration::from_secs_f64(secs),
        }
    }

    #[test]
    fn test_fast_scan_grows_batch() {
        let next = tune(&AdaptiveParams::new(100), &sample(5_000.0, 50, 2.0)).unwrap();
        assert_eq!(next.batch_size, 150);
    }

    #[test]
    fn test_slow_scan_shrinks_batch() {
        let next = tune(&AdaptiveParams::new(100), &sample(50.0, 50, 2.0)).unwrap();
        assert_eq!(next.batch_size, 80);
    }

    #[test]
    fn test_moderate_scan_keeps_batch() {
        let next = tune(&AdaptiveParams::new(100), &sample(500.0, 50, 2.0)).unwrap();
        assert_eq!(next.batch_size, 100);
        // Boundaries are exclusive on both sides.
        let at_fast = tune(&AdaptiveParams::new(100), &sample(1_000.0, 50, 2.0)).unwrap();
        let at_slow = tune(&AdaptiveParams::new(100), &sample(100.0, 50, 2.0)).unwrap();
        assert_eq!(at_fast.batch_size, 100);
        assert_eq!(at_slow.batch_size, 100);
    }

    #[test]
    fn test_batch_never_exceeds_max() {
        let mut params = AdaptiveParams::new(100);
        for _ in 0..50 {
            params = tune(&params, &sample(10_000.0, 50, 2.0)).unwrap();
            assert!(params.batch_size <= MAX_BATCH_SIZE);
        }
        assert_eq!(params.batch_size, MAX_BATCH_SIZE);
    }

    #[test]
    fn test_batch_never_below_min() {
        let mut params = AdaptiveParams::new(100);
        for _ in 0..50 {
            params = tune(&params, &sample(1.0, 50, 2.0)).unwrap();
            assert!(params.batch_size >= MIN_BATCH_SIZE);
        }
        assert_eq!(params.batch_size, MIN_BATCH_SIZE);
    }

    #[test]
    fn test_small_scan_disables_threading() {
        let params = AdaptiveParams::new(100);
        assert!(!tune(&params, &sample(500.0, 5, 10.0)).unwrap().threading_enabled);
        assert!(!tune(&params, &sample(500.0, 500, 0.5)).unwrap().threading_enabled);
    }

    #[test]
    fn test_large_fast_scan_enables_threading() {
        let params = AdaptiveParams {
            threading_enabled: false,
            ..AdaptiveParams::new(100)
        };
        let next = tune(&params, &sample(300.0, 150, 6.0)).unwrap();
        assert!(next.threading_enabled);
    }

    #[test]
    fn test_middle_ground_keeps_threading() {
        let params = AdaptiveParams {
            threading_enabled: false,
            ..AdaptiveParams::new(100)
        };
        // 50 dirs in 3s: neither small nor large.
        assert!(!tune(&params, &sample(300.0, 50, 3.0)).unwrap().threading_enabled);
        let enabled = AdaptiveParams::new(100);
        assert!(tune(&enabled, &sample(300.0, 50, 3.0)).unwrap().threading_enabled);
    }

    #[test]
    fn test_invalid_throughput_rejected() {
        let params = AdaptiveParams::new(100);
        assert!(tune(&params, &sample(f64::NAN, 50, 2.0)).is_err());
        assert!(tune(&params, &sample(f64::INFINITY, 50, 2.0)).is_err());
        assert!(tune(&params, &sample(-1.0, 50, 2.0)).is_err());
    }

    #[test]
    fn test_slow_filesystem_flag_untouched() {
        let params = AdaptiveParams {
            slow_filesystem: true,
            ..AdaptiveParams::new(100)
        };
        assert!(tune(&params, &sample(5_000.0, 500, 10.0)).unwrap().slow_filesystem);
    }

    #[test]
    fn test_sample_from_scan() {
        let s = ScanSample::from_scan(1_200, 6, Duration::from_secs(2));
        assert_eq!(s.throughput, 600.0);
        let zero = ScanSample::from_scan(10, 1, Duration::ZERO);
        assert_eq!(zero.throughput, 0.0);
    }

    #[test]
    fn test_new_clamps_batch() {
        assert_eq!(AdaptiveParams::new(1).batch_size, MIN_BATCH_SIZE);
        assert_eq!(AdaptiveParams::new(10_000).batch_size, MAX_BATCH_SIZE);
    }
}
