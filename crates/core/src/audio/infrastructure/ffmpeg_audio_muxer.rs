use std::path::{Path, PathBuf};

use crate::audio::domain::audio_muxer::AudioMuxer;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::error::BoxError;

const FALLBACK_AAC_FRAME_SIZE: usize = 1024;

/// Muxes PCM audio next to an existing video stream using ffmpeg-next.
///
/// The video packets are copied untouched and the audio is encoded to AAC.
/// Output goes to a temp file that replaces `output_path` only once the
/// trailer is written, so a failed mux never leaves a truncated file behind.
pub struct FfmpegAudioMuxer;

impl AudioMuxer for FfmpegAudioMuxer {
    fn mux(
        &self,
        video_path: &Path,
        audio: &AudioSegment,
        output_path: &Path,
    ) -> Result<(), BoxError> {
        ffmpeg_next::init()?;

        let temp_path = temp_path_for(output_path);
        match mux_into(video_path, audio, &temp_path) {
            Ok(()) => {
                std::fs::rename(&temp_path, output_path)?;
                Ok(())
            }
            Err(e) => {
                let _ = std::fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }
}

fn temp_path_for(output_path: &Path) -> PathBuf {
    output_path.with_extension("mux.mp4")
}

fn mux_into(video_path: &Path, audio: &AudioSegment, temp_path: &Path) -> Result<(), BoxError> {
    if audio.channels() != 1 {
        return Err(format!("expected mono audio, got {} channels", audio.channels()).into());
    }

    let mut ictx = ffmpeg_next::format::input(video_path)?;
    let mut octx = ffmpeg_next::format::output(temp_path)?;
    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let video_stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| format!("no video stream in {}", video_path.display()))?;
    let video_src_idx = video_stream.index();
    let video_in_tb = video_stream.time_base();

    let mut ost_video =
        octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
    ost_video.set_parameters(video_stream.parameters());
    unsafe {
        (*ost_video.parameters().as_mut_ptr()).codec_tag = 0;
    }
    let video_ost_idx = ost_video.index();

    let aac =
        ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::AAC).ok_or("AAC encoder not found")?;
    let mut ost_audio = octx.add_stream(Some(aac))?;
    let audio_ost_idx = ost_audio.index();

    let mut encoder = ffmpeg_next::codec::context::Context::new_with_codec(aac)
        .encoder()
        .audio()?;
    encoder.set_rate(audio.sample_rate() as i32);
    encoder.set_channel_layout(ffmpeg_next::ChannelLayout::MONO);
    encoder.set_format(ffmpeg_next::format::Sample::F32(
        ffmpeg_next::format::sample::Type::Planar,
    ));
    encoder.set_time_base(ffmpeg_next::Rational(1, audio.sample_rate() as i32));
    if global_header {
        encoder.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }
    let mut encoder = encoder.open_as(aac)?;
    ost_audio.set_parameters(&encoder);

    let enc_time_base = encoder.time_base();
    let frame_size = match encoder.frame_size() as usize {
        0 => FALLBACK_AAC_FRAME_SIZE,
        n => n,
    };

    octx.write_header()?;

    let ost_video_tb = octx
        .stream(video_ost_idx)
        .ok_or("output video stream missing")?
        .time_base();
    let ost_audio_tb = octx
        .stream(audio_ost_idx)
        .ok_or("output audio stream missing")?
        .time_base();

    // Video stream copy; any audio already in the input is dropped.
    for (stream, mut packet) in ictx.packets() {
        if stream.index() != video_src_idx {
            continue;
        }
        packet.rescale_ts(video_in_tb, ost_video_tb);
        packet.set_position(-1);
        packet.set_stream(video_ost_idx);
        packet.write_interleaved(&mut octx)?;
    }

    let mut pts: i64 = 0;
    for chunk in audio.samples().chunks(frame_size) {
        let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            chunk.len(),
            ffmpeg_next::ChannelLayout::MONO,
        );
        frame.set_rate(audio.sample_rate());
        frame.set_pts(Some(pts));

        let src_bytes =
            unsafe { std::slice::from_raw_parts(chunk.as_ptr() as *const u8, chunk.len() * 4) };
        frame.data_mut(0)[..src_bytes.len()].copy_from_slice(src_bytes);

        encoder.send_frame(&frame)?;
        drain_packets(&mut encoder, &mut octx, audio_ost_idx, enc_time_base, ost_audio_tb)?;
        pts += chunk.len() as i64;
    }

    encoder.send_eof()?;
    drain_packets(&mut encoder, &mut octx, audio_ost_idx, enc_time_base, ost_audio_tb)?;

    octx.write_trailer()?;
    log::debug!(
        "Muxed {:.2}s of audio into {}",
        audio.duration(),
        video_path.display()
    );
    Ok(())
}

fn drain_packets(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) -> Result<(), BoxError> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_idx);
        encoded.rescale_ts(enc_time_base, ost_time_base);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::video_writer::VideoWriter;
    use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

    fn write_clip(path: &Path, frames: usize) {
        let metadata = VideoMetadata {
            width: 64,
            height: 64,
            fps: 10,
            total_frames: frames,
        };
        let mut writer = FfmpegWriter::new();
        writer.open(path, &metadata).unwrap();
        for i in 0..frames {
            writer.write(&Frame::new(vec![200; 64 * 64 * 3], 64, 64, i)).unwrap();
        }
        writer.close().unwrap();
    }

    fn stream_count(path: &Path, kind: ffmpeg_next::media::Type) -> usize {
        let ictx = ffmpeg_next::format::input(path).unwrap();
        let count = ictx
            .streams()
            .filter(|s| s.parameters().medium() == kind)
            .count();
        count
    }

    #[test]
    fn test_mux_missing_video_errors() {
        let audio = AudioSegment::new(vec![0.0; 48000], 48000, 1);
        let result = FfmpegAudioMuxer.mux(
            Path::new("/nonexistent/video.mp4"),
            &audio,
            Path::new("/nonexistent/out.mp4"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mux_to_separate_output_adds_one_audio_stream() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("video.mp4");
        let output = dir.path().join("with_audio.mp4");
        write_clip(&video, 10);

        let audio = AudioSegment::new(vec![0.1; 48000], 48000, 1);
        FfmpegAudioMuxer.mux(&video, &audio, &output).unwrap();

        assert_eq!(stream_count(&output, ffmpeg_next::media::Type::Video), 1);
        assert_eq!(stream_count(&output, ffmpeg_next::media::Type::Audio), 1);
        assert!(!temp_path_for(&output).exists());
    }

    #[test]
    fn test_remux_in_place_replaces_existing_audio() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("segment_0.mp4");
        write_clip(&video, 10);

        let audio = AudioSegment::new(vec![0.1; 24000], 48000, 1);
        FfmpegAudioMuxer.mux(&video, &audio, &video).unwrap();
        FfmpegAudioMuxer.mux(&video, &audio, &video).unwrap();

        assert_eq!(stream_count(&video, ffmpeg_next::media::Type::Audio), 1);
    }

    #[test]
    fn test_stereo_input_is_rejected_and_no_temp_file_is_left() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("video.mp4");
        write_clip(&video, 5);

        let audio = AudioSegment::new(vec![0.0; 9600], 48000, 2);
        assert!(FfmpegAudioMuxer.mux(&video, &audio, &video).is_err());
        assert!(!temp_path_for(&video).exists());
        assert!(video.exists());
    }
}
