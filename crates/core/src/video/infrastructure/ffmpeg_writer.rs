use std::path::{Path, PathBuf};

use crate::shared::error::BoxError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// CRF used when none is configured; x264's own default.
pub const DEFAULT_CRF: u32 = 23;

/// Encodes RGB frames to H.264 in an MP4 container via ffmpeg-next.
///
/// Prefers `libx264`. ffmpeg builds without it fall back to the native
/// MPEG-4 Part 2 encoder so rendering still works, at lower quality.
pub struct FfmpegWriter {
    output_path: Option<PathBuf>,
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    crf: u32,
    width: u32,
    height: u32,
    time_base: ffmpeg_next::Rational,
    frame_count: usize,
    video_stream_index: usize,
}

// Safety: a writer is owned by exactly one worker thread at a time; the raw
// ffmpeg pointers inside are never shared.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self::with_crf(DEFAULT_CRF)
    }

    pub fn with_crf(crf: u32) -> Self {
        Self {
            output_path: None,
            octx: None,
            encoder: None,
            scaler: None,
            crf,
            width: 0,
            height: 0,
            time_base: ffmpeg_next::Rational(1, 30),
            frame_count: 0,
            video_stream_index: 0,
        }
    }

    fn drain_packets(&mut self) -> Result<(), BoxError> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };
        let ost_time_base = octx
            .stream(self.video_stream_index)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.video_stream_index);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn find_h264_encoder() -> Result<(ffmpeg_next::Codec, bool), BoxError> {
    if let Some(codec) = ffmpeg_next::encoder::find_by_name("libx264") {
        return Ok((codec, true));
    }
    log::warn!("libx264 not available in this ffmpeg build, falling back to MPEG-4");
    let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
        .ok_or("neither libx264 nor MPEG-4 encoder found")?;
    Ok((codec, false))
}

impl VideoWriter for FfmpegWriter {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), BoxError> {
        ffmpeg_next::init()?;
        if metadata.fps == 0 {
            return Err("FfmpegWriter: fps must be positive".into());
        }

        self.width = metadata.width;
        self.height = metadata.height;
        self.time_base = ffmpeg_next::Rational(1, metadata.fps as i32);
        self.output_path = Some(path.to_path_buf());

        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let (codec, is_x264) = find_h264_encoder()?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(self.time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(metadata.fps as i32, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut options = ffmpeg_next::Dictionary::new();
        if is_x264 {
            options.set("crf", &self.crf.to_string());
            options.set("preset", "medium");
        }
        let encoder = encoder_ctx.open_with(options)?;
        ost.set_parameters(&encoder);
        self.video_stream_index = ost.index();

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), BoxError> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(format!(
                "FfmpegWriter: frame is {}x{}, stream is {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )
            .into());
        }
        let (Some(encoder), Some(scaler)) = (self.encoder.as_mut(), self.scaler.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );
        let stride = rgb_frame.stride(0);
        let row_bytes = self.width as usize * 3;
        let dst = rgb_frame.data_mut(0);
        for (row, src_row) in frame.data().chunks_exact(row_bytes).enumerate() {
            let start = row * stride;
            dst[start..start + row_bytes].copy_from_slice(src_row);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frame_count as i64));
        encoder.send_frame(&yuv_frame)?;

        self.drain_packets()?;
        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        if self.encoder.is_none() {
            return Ok(());
        }

        let result = (|| -> Result<(), BoxError> {
            if let Some(encoder) = self.encoder.as_mut() {
                encoder.send_eof()?;
            }
            self.drain_packets()?;
            if let Some(octx) = self.octx.as_mut() {
                octx.write_trailer()?;
            }
            Ok(())
        })();

        if let Some(path) = self.output_path.take() {
            log::debug!("Wrote {} frames to {}", self.frame_count, path.display());
        }
        self.octx = None;
        self.encoder = None;
        self.scaler = None;
        result
    }
}
