pub mod ffmpeg_cli_concatenator;
pub mod ffmpeg_probe;
pub mod ffmpeg_writer;
