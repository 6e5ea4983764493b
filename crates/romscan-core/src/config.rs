/// Engine configuration — layered defaults, TOML file, and environment.
///
/// Precedence (lowest to highest):
///
/// 1. [`EngineConfig::default`]
/// 2. An optional TOML file passed to [`EngineConfig::load`]
/// 3. Environment variables prefixed with `ROMSCAN_`
///    (e.g. `ROMSCAN_CACHE_TTL_SECS=60`)
use crate::error::ConfigError;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment-variable overrides.
pub const ENV_PREFIX: &str = "ROMSCAN_";

/// Hard bounds on the batch-size hint. The tuner clamps to the same range.
pub const MIN_BATCH_SIZE: usize = 20;
pub const MAX_BATCH_SIZE: usize = 500;

/// Tunables for one [`ScanEngine`] and the [`SharedState`] it uses.
///
/// [`ScanEngine`]: crate::scanner::ScanEngine
/// [`SharedState`]: crate::scanner::SharedState
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds a cached scan result stays valid.
    pub cache_ttl_secs: u64,
    /// Maximum number of directories kept in the result cache.
    pub cache_capacity: usize,
    /// Matching files in the shallow sample at which parallel traversal wins.
    pub parallel_file_threshold: usize,
    /// Directory entries stat'ed by the latency probe.
    pub probe_sample_size: usize,
    /// Mean stat latency above which a filesystem is treated as slow.
    pub slow_latency_ms: f64,
    /// Starting value of the per-engine batch-size hint.
    pub initial_batch_size: usize,
    /// Have the default traverser compute CRC32/SHA-256 for every record.
    pub compute_checksums: bool,
    /// Extensions accepted in addition to the built-in ROM catalog.
    pub extra_extensions: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            cache_capacity: 10,
            parallel_file_threshold: 1_000,
            probe_sample_size: 20,
            slow_latency_ms: 5.0,
            initial_batch_size: 100,
            compute_checksums: false,
            extra_extensions: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load the layered configuration.
    ///
    /// `path` is optional; when given it must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }
        let config: Self = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults. Environment is ignored.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "cache_capacity",
                reason: "must be at least 1".into(),
            });
        }
        if self.probe_sample_size == 0 {
            return Err(ConfigError::Invalid {
                key: "probe_sample_size",
                reason: "must be at least 1".into(),
            });
        }
        if !self.slow_latency_ms.is_finite() || self.slow_latency_ms <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "slow_latency_ms",
                reason: format!("must be a positive number, got {}", self.slow_latency_ms),
            });
        }
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&self.initial_batch_size) {
            return Err(ConfigError::Invalid {
                key: "initial_batch_size",
                reason: format!(
                    "must be within {MIN_BATCH_SIZE}..={MAX_BATCH_SIZE}, got {}",
                    self.initial_batch_size
                ),
            });
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn slow_latency(&self) -> Duration {
        Duration::from_secs_f64(self.slow_latency_ms / 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.slow_latency(), Duration::from_millis(5));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            cache_ttl_secs = 60
            cache_capacity = 3
            extra_extensions = ["chd", ".PBP"]
            "#,
        )
        .unwrap();
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.cache_capacity, 3);
        assert_eq!(config.parallel_file_threshold, 1_000);
        assert_eq!(config.extra_extensions, vec!["chd", ".PBP"]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = EngineConfig::from_toml_str("cache_capacity = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "cache_capacity", .. }));
    }

    #[test]
    fn test_batch_size_out_of_range_rejected() {
        let err = EngineConfig::from_toml_str("initial_batch_size = 1000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "initial_batch_size", .. }));
    }

    #[test]
    fn test_non_positive_latency_rejected() {
        let err = EngineConfig::from_toml_str("slow_latency_ms = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "slow_latency_ms", .. }));
    }

    #[test]
    fn test_malformed_toml_is_load_error() {
        let err = EngineConfig::from_toml_str("cache_ttl_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("romscan.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "probe_sample_size = 5").unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.probe_sample_size, 5);
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }
}
