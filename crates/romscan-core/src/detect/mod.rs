/// Detector collaborator — decides which files are ROM candidates and
/// which system they belong to.
///
/// The engine only ever asks two questions of a detector, so it is a trait:
/// frontends with a real header-sniffing classifier can plug it in, while
/// [`ExtensionCatalog`] covers the common case from file extensions alone.
pub mod catalog;

pub use catalog::{ExtensionCatalog, RomSystem};

use compact_str::CompactString;
use std::path::Path;

pub trait Detector: Send + Sync {
    /// Whether `path` has an extension this detector treats as a ROM.
    fn is_accepted_extension(&self, path: &Path) -> bool;

    /// Console/system label for an accepted file, if one can be inferred.
    fn detect_system(&self, _path: &Path) -> Option<CompactString> {
        None
    }
}
