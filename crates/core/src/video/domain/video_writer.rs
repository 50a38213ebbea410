use std::path::Path;

use crate::shared::error::BoxError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Abstracts video encoding so segment rendering can be tested without
/// a codec library.
pub trait VideoWriter: Send {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), BoxError>;

    fn write(&mut self, frame: &Frame) -> Result<(), BoxError>;

    /// Flushes the encoder and finalizes the container. Safe to call twice.
    fn close(&mut self) -> Result<(), BoxError>;
}

/// Builds a fresh writer per segment; each worker thread owns its own.
pub type VideoWriterFactory = std::sync::Arc<dyn Fn() -> Box<dyn VideoWriter> + Send + Sync>;
