/// Error types for the scanning engine.
///
/// Nothing in here ever reaches the caller of [`ScanEngine::scan`]: every
/// internal step returns a `Result`, and the orchestrator folds failures into
/// a safe default with [`OrDegrade`].
///
/// [`ScanEngine::scan`]: crate::scanner::ScanEngine::scan
use std::path::PathBuf;
use tracing::warn;

/// Errors raised while validating, sampling, or tuning a scan.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The requested directory does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The requested path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while enumerating or reading `path`.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tuner was handed a measurement it cannot reason about
    /// (NaN, infinite, or negative).
    #[error("invalid scan measurement: {field} = {value}")]
    InvalidMeasurement { field: &'static str, value: f64 },

    /// The background scan thread could not be started.
    #[error("failed to spawn scan thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl ScanError {
    /// Wrap an `io::Error`, mapping `NotFound` to the dedicated variant.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

/// Errors raised while loading or validating [`EngineConfig`].
///
/// [`EngineConfig`]: crate::config::EngineConfig
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A provider (TOML file, environment) could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),

    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    Missing(PathBuf),

    /// A value was read successfully but is out of range.
    #[error("invalid configuration value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Fold a fallible step into a safe default, logging the failure.
///
/// This is how the engine keeps its no-error-escapes contract without broad
/// catch-all handling: each step says what it falls back to and why.
pub trait OrDegrade<T> {
    /// Return the `Ok` value, or log `err` under `context` and return `default`.
    fn or_degrade(self, default: T, context: &str) -> T;
}

impl<T> OrDegrade<T> for Result<T, ScanError> {
    fn or_degrade(self, default: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{context}: {err}; falling back to default");
                default
            }
        }
    }
}
