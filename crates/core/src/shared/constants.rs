/// Photo formats the background loader accepts.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "flac", "ogg"];

pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

pub const DEFAULT_FRAME_WIDTH: u32 = 1080;
pub const DEFAULT_FRAME_HEIGHT: u32 = 1920;
pub const DEFAULT_FONT_SIZE: f32 = 80.0;

/// Height of the transparent band subtitles are rasterised into.
pub const DEFAULT_SUBTITLE_BAND_HEIGHT: u32 = 200;

pub const DEFAULT_WORDS_PER_GROUP: usize = 3;
pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_FADE_IN_SECONDS: f64 = 0.5;
pub const DEFAULT_OUTLINE_THICKNESS: u32 = 10;
pub const DEFAULT_WORD_GAP: u32 = 10;
pub const DEFAULT_TEXT_COLOR: &str = "white";

/// Master audio is decoded once to mono PCM at this rate.
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 48000;

pub const SEGMENT_FILE_PREFIX: &str = "segment_";
pub const CONCAT_MANIFEST_FILENAME: &str = "filelist.txt";
pub const CONCATENATED_FILENAME: &str = "final_video.mp4";
pub const FINAL_OUTPUT_FILENAME: &str = "final_video_with_audio.mp4";

pub const TRANSCRIPT_DIR_NAME: &str = "aligned_script_with_timestamps";
pub const PHOTOS_DIR_NAME: &str = "photos";
pub const AUDIO_DIR_NAME: &str = "audio";
pub const COLORS_DIR_NAME: &str = "colors";
pub const COLORS_FILENAME: &str = "colors.txt";
pub const FONT_DIR_NAME: &str = "font";

/// Working directory created under the project root when none is given.
pub const DEFAULT_WORK_DIR_NAME: &str = "video";
