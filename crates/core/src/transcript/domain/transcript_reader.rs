use std::path::Path;

use super::fragment::Fragment;
use crate::shared::error::BoxError;

/// Loads the ordered fragment list of an aligned narration script.
pub trait TranscriptReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Vec<Fragment>, BoxError>;
}
