use std::path::Path;

use crate::shared::error::BoxError;
use crate::video::domain::media_probe::MediaProbe;

/// Reads the container duration through ffmpeg-next's demuxer.
pub struct FfmpegProbe;

impl MediaProbe for FfmpegProbe {
    fn duration(&self, path: &Path) -> Result<f64, BoxError> {
        ffmpeg_next::init()?;
        let ictx = ffmpeg_next::format::input(path)?;
        let raw = ictx.duration();
        if raw <= 0 {
            return Err(format!("{} reports no duration", path.display()).into());
        }
        Ok(raw as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64)
    }
}
