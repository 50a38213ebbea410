/// Stream parameters handed to a [`VideoWriter`](crate::video::domain::video_writer::VideoWriter)
/// when it opens an output file.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub total_frames: usize,
}

impl VideoMetadata {
    /// Playback duration implied by the frame count.
    pub fn duration(&self) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        self.total_frames as f64 / self.fps as f64
    }
}
