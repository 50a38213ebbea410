pub mod media_probe;
pub mod segment_concatenator;
pub mod video_writer;
