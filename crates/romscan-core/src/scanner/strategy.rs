/// Strategy selection — parallel or sequential traversal for one scan.
///
/// The decision is made from a bounded, single-level look at the directory:
/// a full recursive walk just to decide how to walk would cost as much as the
/// scan itself. Anything uncertain resolves to [`Strategy::Sequential`].
use crate::detect::Detector;
use crate::error::{OrDegrade, ScanError};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Sampling stops once both limits have been reached.
pub const SAMPLE_SUBDIR_LIMIT: usize = 10;
pub const SAMPLE_FILE_LIMIT: usize = 100;

/// Subdirectories in the sample at which parallel traversal is chosen.
pub const MIN_PARALLEL_SUBDIRS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Sequential,
    Parallel,
}

/// Composition of the top level of a directory, as far as it was sampled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectorySample {
    pub subdirectories: usize,
    pub matching_files: usize,
}

impl DirectorySample {
    fn is_saturated(&self) -> bool {
        self.subdirectories >= SAMPLE_SUBDIR_LIMIT && self.matching_files >= SAMPLE_FILE_LIMIT
    }

    /// Strategy implied by this sample.
    pub fn strategy(&self, parallel_file_threshold: usize) -> Strategy {
        if self.subdirectories >= MIN_PARALLEL_SUBDIRS
            || self.matching_files >= parallel_file_threshold
        {
            Strategy::Parallel
        } else {
            Strategy::Sequential
        }
    }
}

/// Stream the top level of `dir`, counting subdirectories and accepted files.
///
/// Any error listing the directory or reading an entry's type aborts the
/// sample; a symlink whose target cannot be resolved is simply not counted.
pub fn sample_directory(dir: &Path, detector: &dyn Detector) -> Result<DirectorySample, ScanError> {
    let entries = fs::read_dir(dir).map_err(|e| ScanError::io(dir, e))?;
    let mut sample = DirectorySample::default();

    for entry in entries {
        let entry = entry.map_err(|e| ScanError::io(dir, e))?;
        let path = entry.path();
        let mut file_type = entry.file_type().map_err(|e| ScanError::io(&path, e))?;
        if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(meta) => file_type = meta.file_type(),
                Err(_) => continue,
            }
        }

        if file_type.is_dir() {
            sample.subdirectories += 1;
        } else if file_type.is_file() && detector.is_accepted_extension(&path) {
            sample.matching_files += 1;
        }

        if sample.is_saturated() {
            break;
        }
    }
    Ok(sample)
}

/// Choose the traversal strategy for one scan of `dir`.
///
/// A slow filesystem always gets sequential traversal: extra threads only
/// queue up behind the same slow device.
pub fn select_strategy(
    dir: &Path,
    slow_filesystem: bool,
    detector: &dyn Detector,
    parallel_file_threshold: usize,
) -> Strategy {
    if slow_filesystem {
        return Strategy::Sequential;
    }
    sample_directory(dir, detector)
        .map(|sample| sample.strategy(parallel_file_threshold))
        .or_degrade(Strategy::Sequential, "strategy sampling failed")
}
