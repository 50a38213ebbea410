use std::path::Path;

use crate::shared::error::BoxError;

/// Reads container-level facts about an already written media file.
pub trait MediaProbe: Send + Sync {
    /// Container duration in seconds.
    fn duration(&self, path: &Path) -> Result<f64, BoxError>;
}
