/// Data model for scan output.
///
/// Records are produced by the traversal primitive and passed through the
/// result cache untouched.
pub mod record;

pub use record::{Checksums, ScanRecord};
