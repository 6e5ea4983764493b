/// A single ROM file discovered by a scan.
///
/// The engine never looks inside a record; it only counts them for throughput
/// and hands the whole ordered list to the cache and the caller.
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Serialize;
use std::path::PathBuf;
use std::time::SystemTime;

/// Content checksums, hex-encoded. Only filled in when requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checksums {
    /// CRC32, 8 lowercase hex characters (the value ROM dat files key on).
    pub crc32: String,
    /// SHA-256, 64 lowercase hex characters.
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRecord {
    /// Path of the file as produced by the walker (rooted at the scan path).
    pub path: PathBuf,

    /// Logical file size in bytes.
    pub size: u64,

    /// Last-modified timestamp, if the platform reports one.
    pub modified: Option<DateTime<Utc>>,

    /// Console/system label supplied by the detector, e.g. "Game Boy Advance".
    pub system: Option<CompactString>,

    /// `None` unless checksums were requested and the file could be read.
    pub checksums: Option<Checksums>,
}

impl ScanRecord {
    /// Create a record with no system label and no checksums.
    pub fn new(path: PathBuf, size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            path,
            size,
            modified: modified.map(DateTime::<Utc>::from),
            system: None,
            checksums: None,
        }
    }

    /// Lowercased file extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}
