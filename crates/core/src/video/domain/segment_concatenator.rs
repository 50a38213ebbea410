use std::path::{Path, PathBuf};

use crate::shared::error::BoxError;

/// Joins rendered segments, in the order given, into a single file.
pub trait SegmentConcatenator: Send + Sync {
    fn concatenate(&self, segments: &[PathBuf], output: &Path) -> Result<(), BoxError>;
}
