use std::path::Path;

use image::RgbImage;

use crate::imaging::domain::photo_reader::{validate_photo, PhotoReader};
use crate::shared::error::BoxError;

/// Decodes background photos with ffmpeg-next.
///
/// ffmpeg handles WebP, PNG and JPEG through the same code path and is
/// noticeably faster than the pure-Rust decoders on large camera images.
pub struct FfmpegPhotoReader;

impl PhotoReader for FfmpegPhotoReader {
    fn read(&self, path: &Path) -> Result<RgbImage, BoxError> {
        validate_photo(path)?;
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| format!("no image data in {}", path.display()))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            if let Some(image) = receive_rgb(&mut decoder, &mut scaler, width, height)? {
                return Ok(image);
            }
        }

        // Some decoders only emit the single frame once flushed.
        let _ = decoder.send_eof();
        receive_rgb(&mut decoder, &mut scaler, width, height)?
            .ok_or_else(|| format!("failed to decode photo {}", path.display()).into())
    }
}

fn receive_rgb(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
) -> Result<Option<RgbImage>, BoxError> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    if decoder.receive_frame(&mut decoded).is_err() {
        return Ok(None);
    }

    let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
    scaler.run(&decoded, &mut rgb_frame)?;

    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }

    RgbImage::from_raw(width, height, pixels)
        .map(Some)
        .ok_or_else(|| "decoded photo has an unexpected buffer size".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_pixel(width, height, image::Rgb([50, 100, 200]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_reads_png_dimensions_and_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "photo.png", 100, 80);
        let img = FfmpegPhotoReader.read(&path).unwrap();
        assert_eq!(img.dimensions(), (100, 80));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_reads_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "photo.jpg", 64, 48);
        let img = FfmpegPhotoReader.read(&path).unwrap();
        assert_eq!(img.dimensions(), (64, 48));
    }

    #[test]
    fn test_missing_photo_errors() {
        assert!(FfmpegPhotoReader
            .read(Path::new("/nonexistent/photo.webp"))
            .is_err());
    }

    #[test]
    fn test_unsupported_extension_errors_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "photo.bmp", 10, 10);
        assert!(FfmpegPhotoReader.read(&path).is_err());
    }
}
