pub mod ffmpeg_photo_reader;
pub mod fontdue_subtitle_renderer;
