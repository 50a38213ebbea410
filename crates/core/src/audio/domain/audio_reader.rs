use std::path::Path;

use super::audio_segment::AudioSegment;
use crate::shared::error::BoxError;

/// Decodes the narration track of a media file.
pub trait AudioReader: Send + Sync {
    /// Decodes the best audio stream to mono PCM at `sample_rate`.
    /// A file without an audio stream is an error.
    fn read_audio(&self, path: &Path, sample_rate: u32) -> Result<AudioSegment, BoxError>;
}
