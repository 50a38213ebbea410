pub mod ffmpeg_audio_muxer;
pub mod ffmpeg_audio_reader;
