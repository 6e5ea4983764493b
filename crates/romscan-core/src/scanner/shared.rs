/// Process-wide scan state shared by every engine instance.
///
/// One `SharedState` is created by the application and handed to each
/// [`ScanEngine`] as an `Arc`. It owns the result cache, its hit/miss
/// counters, and the last performance measurements, all behind a single
/// mutex so no thread ever sees a cache and metrics snapshot out of step.
///
/// The lock is only held for map operations; probing, sampling and
/// traversal all run with it released.
///
/// [`ScanEngine`]: super::ScanEngine
use super::cache::{CacheStatistics, ResultCache};
use super::clock::{Clock, MonotonicClock};
use super::ScanResults;
use crate::config::EngineConfig;
use parking_lot::Mutex;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// Latency assumed before any probe has succeeded.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1);

/// Last observed filesystem and scan performance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceMetrics {
    /// Mean per-entry stat latency from the most recent successful probe.
    pub latency: Duration,
    /// Wall time of the most recent full (non-cached) scan.
    pub last_scan: Duration,
    /// Records per second of the most recent full scan.
    pub last_throughput: f64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            latency: DEFAULT_LATENCY,
            last_scan: Duration::ZERO,
            last_throughput: 0.0,
        }
    }
}

#[derive(Debug)]
struct Inner {
    cache: ResultCache,
    metrics: PerformanceMetrics,
}

#[derive(Debug)]
pub struct SharedState {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl SharedState {
    /// Shared state using the monotonic system clock.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Shared state driven by an explicit clock.
    pub fn with_clock(config: &EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                cache: ResultCache::new(config.cache_ttl(), config.cache_capacity),
                metrics: PerformanceMetrics::default(),
            }),
            clock,
        }
    }

    pub fn lookup(&self, key: &OsStr) -> Option<ScanResults> {
        let mut inner = self.inner.lock();
        let now = self.clock.now();
        inner.cache.lookup(key, now)
    }

    pub fn store(&self, key: &OsStr, results: ScanResults) {
        let mut inner = self.inner.lock();
        let now = self.clock.now();
        inner.cache.store(key.to_os_string(), results, now);
    }

    /// Empty the cache and zero the hit/miss counters in one step.
    pub fn clear(&self) {
        self.inner.lock().cache.clear();
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.inner.lock().cache.statistics()
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        self.inner.lock().metrics
    }

    pub(crate) fn record_latency(&self, latency: Duration) {
        self.inner.lock().metrics.latency = latency;
    }

    pub(crate) fn record_scan(&self, elapsed: Duration, throughput: f64) {
        let mut inner = self.inner.lock();
        inner.metrics.last_scan = elapsed;
        inner.metrics.last_throughput = throughput;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScanRecord;
    use crate::scanner::clock::ManualClock;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{OnceLock, Weak};
    use std::thread;

    fn one_record(name: &str) -> ScanResults {
        vec![ScanRecord::new(PathBuf::from(name), 1, None)].into()
    }

    fn config(ttl_secs: u64, capacity: usize) -> EngineConfig {
        EngineConfig {
            cache_ttl_secs: ttl_secs,
            cache_capacity: capacity,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_ttl_follows_injected_clock() {
        let clock = Arc::new(ManualClock::new());
        let state = SharedState::with_clock(&config(10, 4), clock.clone());

        state.store(OsStr::new("/roms"), one_record("a.nes"));
        assert!(state.lookup(OsStr::new("/roms")).is_some());

        clock.advance(Duration::from_secs(10));
        assert!(state.lookup(OsStr::new("/roms")).is_none());

        let stats = state.cache_statistics();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    }

    #[test]
    fn test_metrics_default_and_updates() {
        let state = SharedState::new(&EngineConfig::default());
        assert_eq!(state.metrics().latency, DEFAULT_LATENCY);

        state.record_latency(Duration::from_micros(250));
        state.record_scan(Duration::from_secs(2), 600.0);
        let metrics = state.metrics();
        assert_eq!(metrics.latency, Duration::from_micros(250));
        assert_eq!(metrics.last_scan, Duration::from_secs(2));
        assert_eq!(metrics.last_throughput, 600.0);
    }

    #[test]
    fn test_concurrent_stores_respect_capacity() {
        let state = Arc::new(SharedState::new(&config(300, 5)));
        let workers: Vec<_> = (0..8)
            .map(|t| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for i in 0..50 {
                        let key = format!("/roms/{t}/{i}");
                        state.store(OsStr::new(&key), one_record("x.gb"));
                        state.lookup(OsStr::new(&key));
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let stats = state.cache_statistics();
        assert_eq!(stats.size, 5);
        assert_eq!(stats.hits + stats.misses, 8 * 50);
    }

    /// Clock that counts readings taken while the state lock was free.
    #[derive(Debug, Default)]
    struct LockObservingClock {
        state: OnceLock<Weak<SharedState>>,
        unlocked_reads: AtomicUsize,
    }

    impl Clock for LockObservingClock {
        fn now(&self) -> Duration {
            if let Some(state) = self.state.get().and_then(Weak::upgrade) {
                if state.inner.try_lock().is_some() {
                    self.unlocked_reads.fetch_add(1, Ordering::SeqCst);
                }
            }
            Duration::ZERO
        }
    }

    #[test]
    fn test_timestamps_are_read_under_the_lock() {
        let clock = Arc::new(LockObservingClock::default());
        let state = Arc::new(SharedState::with_clock(&config(300, 2), clock.clone()));
        clock.state.set(Arc::downgrade(&state)).unwrap();

        state.store(OsStr::new("/roms/a"), one_record("a.nes"));
        state.lookup(OsStr::new("/roms/a"));
        state.store(OsStr::new("/roms/b"), one_record("b.nes"));
        state.lookup(OsStr::new("/roms/c"));

        assert_eq!(clock.unlocked_reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let state = SharedState::new(&EngineConfig::default());
        state.store(OsStr::new("/a"), one_record("a.nes"));
        state.lookup(OsStr::new("/a"));
        state.clear();
        state.clear();
        let stats = state.cache_statistics();
        assert_eq!((stats.hits, stats.misses, stats.size), (0, 0, 0));
    }
}
