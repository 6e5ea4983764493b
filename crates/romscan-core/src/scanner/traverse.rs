/// Traversal primitive — the actual filesystem walk.
///
/// The engine only decides *which* of the two walks to run; the walk itself
/// sits behind the [`Traverser`] trait so frontends (and tests) can supply
/// their own. [`FsTraverser`] is the default:
///
/// - **Sequential:** `jwalk` in serial mode, then one `stat` per candidate on
///   the calling thread.
/// - **Parallel:** `jwalk` on a fresh rayon pool sized to the CPU count, then
///   the per-candidate `stat` (and optional checksum) fanned out with rayon.
///
/// Both walks sort entries per directory, so the two strategies return
/// records in the same order for the same tree.
use super::checksum::compute_checksums;
use crate::detect::Detector;
use crate::model::ScanRecord;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// How often (in walked entries) the cancel flag is polled.
const CANCEL_POLL_INTERVAL: u64 = 1_000;

/// Everything a traversal needs to know about one scan.
#[derive(Clone, Copy)]
pub struct TraverseRequest<'a> {
    pub root: &'a Path,
    pub recursive: bool,
    pub detector: &'a dyn Detector,
    /// Cooperative cancellation; implementations should poll it periodically.
    pub cancel: &'a AtomicBool,
}

/// Output of one walk.
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    /// Accepted files, in walk order.
    pub records: Vec<ScanRecord>,
    /// Directories visited, including the root.
    pub directories: usize,
}

pub trait Traverser: Send + Sync {
    fn traverse_sequential(&self, request: &TraverseRequest<'_>) -> Traversal;
    fn traverse_parallel(&self, request: &TraverseRequest<'_>) -> Traversal;
}

/// Default traverser backed by `jwalk` and `rayon`.
#[derive(Debug, Clone, Default)]
pub struct FsTraverser {
    compute_checksums: bool,
}

impl FsTraverser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill in [`ScanRecord::checksums`] for every record.
    #[must_use]
    pub fn with_checksums(mut self, enabled: bool) -> Self {
        self.compute_checksums = enabled;
        self
    }

    /// Walk the tree and collect candidate file paths plus a directory count.
    fn walk(
        &self,
        request: &TraverseRequest<'_>,
        parallelism: jwalk::Parallelism,
    ) -> (Vec<PathBuf>, usize) {
        let mut walker = jwalk::WalkDir::new(request.root)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .parallelism(parallelism);
        if !request.recursive {
            walker = walker.max_depth(1);
        }

        let mut candidates = Vec::new();
        let mut directories = 0usize;
        let mut visited: u64 = 0;

        for entry_result in walker {
            visited += 1;
            if visited.is_multiple_of(CANCEL_POLL_INTERVAL) && request.cancel.load(Ordering::Relaxed) {
                debug!("Traversal of {} cancelled after {visited} entries", request.root.display());
                break;
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    // Typically access denied on a subdirectory; keep walking.
                    debug!("Skipping unreadable entry under {}: {err}", request.root.display());
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                // Without recursion, subdirectories are listed but never read.
                if request.recursive || entry.depth == 0 {
                    directories += 1;
                }
            } else if file_type.is_file() {
                let path = entry.path();
                if request.detector.is_accepted_extension(&path) {
                    candidates.push(path);
                }
            }
        }

        (candidates, directories)
    }

    /// Stat one candidate and build its record. `None` if the file vanished
    /// or became unreadable since the walk saw it.
    fn build_record(&self, path: &Path, detector: &dyn Detector) -> Option<ScanRecord> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(err) => {
                debug!("Skipping {}: {err}", path.display());
                return None;
            }
        };

        let mut record = ScanRecord::new(path.to_path_buf(), meta.len(), meta.modified().ok());
        record.system = detector.detect_system(path);
        if self.compute_checksums {
            record.checksums = match compute_checksums(path) {
                Ok(sums) => Some(sums),
                Err(err) => {
                    trace!("No checksums for {}: {err}", path.display());
                    None
                }
            };
        }
        Some(record)
    }
}

impl Traverser for FsTraverser {
    fn traverse_sequential(&self, request: &TraverseRequest<'_>) -> Traversal {
        let (candidates, directories) = self.walk(request, jwalk::Parallelism::Serial);
        let records = candidates
            .iter()
            .filter_map(|path| self.build_record(path, request.detector))
            .collect();
        Traversal {
            records,
            directories,
        }
    }

    fn traverse_parallel(&self, request: &TraverseRequest<'_>) -> Traversal {
        let (candidates, directories) =
            self.walk(request, jwalk::Parallelism::RayonNewPool(num_cpus::get()));
        let detector = request.detector;
        let records = candidates
            .par_iter()
            .filter_map(|path| self.build_record(path, detector))
            .collect();
        Traversal {
            records,
            directories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ExtensionCatalog;
    use tempfile::TempDir;

    /// ```text
    /// root/
    ///   nes/
    ///     mario.nes   (16 bytes)
    ///     zelda.nes   (32 bytes)
    ///     nested/
    ///       metroid.nes (8 bytes)
    ///   gba/
    ///     golden_sun.gba (64 bytes)
    ///   readme.txt
    ///   tetris.gb (4 bytes)
    /// ```
    fn build_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("nes/nested")).unwrap();
        fs::create_dir_all(root.join("gba")).unwrap();
        fs::write(root.join("nes/mario.nes"), vec![0u8; 16]).unwrap();
        fs::write(root.join("nes/zelda.nes"), vec![0u8; 32]).unwrap();
        fs::write(root.join("nes/nested/metroid.nes"), vec![0u8; 8]).unwrap();
        fs::write(root.join("gba/golden_sun.gba"), vec![0u8; 64]).unwrap();
        fs::write(root.join("readme.txt"), b"not a rom").unwrap();
        fs::write(root.join("tetris.gb"), vec![0u8; 4]).unwrap();
        tmp
    }

    fn request<'a>(
        root: &'a Path,
        recursive: bool,
        detector: &'a ExtensionCatalog,
        cancel: &'a AtomicBool,
    ) -> TraverseRequest<'a> {
        TraverseRequest {
            root,
            recursive,
            detector,
            cancel,
        }
    }

    #[test]
    fn test_sequential_recursive() {
        let tmp = build_tree();
        let detector = ExtensionCatalog::new();
        let cancel = AtomicBool::new(false);
        let out = FsTraverser::new()
            .traverse_sequential(&request(tmp.path(), true, &detector, &cancel));

        assert_eq!(out.records.len(), 5);
        assert_eq!(out.directories, 4, "root + nes + nested + gba");
        let total: u64 = out.records.iter().map(|r| r.size).sum();
        assert_eq!(total, 16 + 32 + 8 + 64 + 4);
        assert!(out
            .records
            .iter()
            .all(|r| r.path.extension().is_some_and(|e| e != "txt")));
    }

    #[test]
    fn test_non_recursive_only_top_level() {
        let tmp = build_tree();
        let detector = ExtensionCatalog::new();
        let cancel = AtomicBool::new(false);
        let out = FsTraverser::new()
            .traverse_sequential(&request(tmp.path(), false, &detector, &cancel));

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.directories, 1);
        assert!(out.records[0].path.ends_with("tetris.gb"));
        assert_eq!(out.records[0].system.as_deref(), Some("Game Boy"));
    }

    #[test]
    fn test_parallel_matches_sequential_order() {
        let tmp = build_tree();
        let detector = ExtensionCatalog::new();
        let cancel = AtomicBool::new(false);
        let traverser = FsTraverser::new();
        let req = request(tmp.path(), true, &detector, &cancel);

        let seq = traverser.traverse_sequential(&req);
        let par = traverser.traverse_parallel(&req);
        let seq_paths: Vec<_> = seq.records.iter().map(|r| r.path.clone()).collect();
        let par_paths: Vec<_> = par.records.iter().map(|r| r.path.clone()).collect();
        assert_eq!(seq_paths, par_paths);
        assert_eq!(seq.directories, par.directories);
    }

    #[test]
    fn test_checksums_on_request() {
        let tmp = build_tree();
        let detector = ExtensionCatalog::new();
        let cancel = AtomicBool::new(false);
        let req = request(tmp.path(), false, &detector, &cancel);

        let without = FsTraverser::new().traverse_sequential(&req);
        assert!(without.records[0].checksums.is_none());

        let with = FsTraverser::new().with_checksums(true).traverse_parallel(&req);
        let sums = with.records[0].checksums.as_ref().unwrap();
        assert_eq!(sums.crc32.len(), 8);
        assert_eq!(sums.sha256.len(), 64);
    }

    #[test]
    fn test_cancel_stops_large_walk() {
        let tmp = TempDir::new().unwrap();
        for i in 0..2_500 {
            fs::write(tmp.path().join(format!("g{i:05}.rom")), b"").unwrap();
        }
        let detector = ExtensionCatalog::new();
        let cancel = AtomicBool::new(true);
        let out = FsTraverser::new()
            .traverse_sequential(&request(tmp.path(), true, &detector, &cancel));
        assert!(out.records.len() < 2_500);
    }
}
