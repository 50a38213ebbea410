use std::path::Path;

use super::audio_segment::AudioSegment;
use crate::shared::error::BoxError;

/// Attaches an audio track to a video file.
pub trait AudioMuxer: Send + Sync {
    /// Copies the video stream of `video_path` and encodes `audio` next to it
    /// into `output_path`, replacing any audio the video had. `output_path`
    /// may equal `video_path`.
    fn mux(&self, video_path: &Path, audio: &AudioSegment, output_path: &Path)
        -> Result<(), BoxError>;
}
