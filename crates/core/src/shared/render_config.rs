use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_AUDIO_SAMPLE_RATE, DEFAULT_FADE_IN_SECONDS, DEFAULT_FONT_SIZE, DEFAULT_FPS,
    DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_OUTLINE_THICKNESS,
    DEFAULT_SUBTITLE_BAND_HEIGHT, DEFAULT_TEXT_COLOR, DEFAULT_WORDS_PER_GROUP, DEFAULT_WORD_GAP,
};
use crate::shared::error::BoxError;

/// Which part of the master audio a rendered segment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentAudioPolicy {
    /// Only the final word group's slice is attached to the whole segment.
    /// Matches the behaviour the pipeline has always had.
    LastGroup,
    /// All group slices back to back, covering the fragment's full duration.
    FullFragment,
}

impl std::fmt::Display for SegmentAudioPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentAudioPolicy::LastGroup => write!(f, "last-group"),
            SegmentAudioPolicy::FullFragment => write!(f, "full-fragment"),
        }
    }
}

impl std::str::FromStr for SegmentAudioPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-group" => Ok(SegmentAudioPolicy::LastGroup),
            "full-fragment" => Ok(SegmentAudioPolicy::FullFragment),
            other => Err(format!(
                "segment audio must be 'last-group' or 'full-fragment', got '{other}'"
            )),
        }
    }
}

/// Every tunable of a render run, passed explicitly to each component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    pub font_size: f32,
    pub subtitle_band_height: u32,
    pub words_per_group: usize,
    pub fps: u32,
    pub fade_in_seconds: f64,
    pub outline_thickness: u32,
    pub word_gap: u32,
    pub default_color: String,
    pub audio_sample_rate: u32,
    /// H.264 CRF; `None` keeps the encoder default.
    pub crf: Option<u32>,
    /// Worker threads for segment rendering; `None` uses available parallelism.
    pub workers: Option<usize>,
    pub segment_audio: SegmentAudioPolicy,
    pub ffmpeg_binary: String,
    pub keep_intermediates: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            font_size: DEFAULT_FONT_SIZE,
            subtitle_band_height: DEFAULT_SUBTITLE_BAND_HEIGHT,
            words_per_group: DEFAULT_WORDS_PER_GROUP,
            fps: DEFAULT_FPS,
            fade_in_seconds: DEFAULT_FADE_IN_SECONDS,
            outline_thickness: DEFAULT_OUTLINE_THICKNESS,
            word_gap: DEFAULT_WORD_GAP,
            default_color: DEFAULT_TEXT_COLOR.to_string(),
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
            crf: None,
            workers: None,
            segment_audio: SegmentAudioPolicy::LastGroup,
            ffmpeg_binary: "ffmpeg".to_string(),
            keep_intermediates: false,
        }
    }
}

impl RenderConfig {
    /// Reads a JSON config file; missing keys fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, BoxError> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {e}", path.display()))?;
        let config: RenderConfig = serde_json::from_str(&json)
            .map_err(|e| format!("invalid config {}: {e}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BoxError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err("frame dimensions must be positive".into());
        }
        if self.frame_width % 2 != 0 || self.frame_height % 2 != 0 {
            return Err(format!(
                "frame dimensions must be even for yuv420p, got {}x{}",
                self.frame_width, self.frame_height
            )
            .into());
        }
        if self.subtitle_band_height == 0 || self.subtitle_band_height > self.frame_height {
            return Err(format!(
                "subtitle band height must be in 1..={}, got {}",
                self.frame_height, self.subtitle_band_height
            )
            .into());
        }
        if self.words_per_group == 0 {
            return Err("words per group must be at least 1".into());
        }
        if self.fps == 0 {
            return Err("fps must be positive".into());
        }
        if self.font_size <= 0.0 {
            return Err(format!("font size must be positive, got {}", self.font_size).into());
        }
        if self.fade_in_seconds < 0.0 {
            return Err("fade-in must not be negative".into());
        }
        if self.audio_sample_rate == 0 {
            return Err("audio sample rate must be positive".into());
        }
        if let Some(crf) = self.crf {
            if crf > 51 {
                return Err(format!("quality must be between 0 and 51, got {crf}").into());
            }
        }
        if self.workers == Some(0) {
            return Err("workers must be at least 1".into());
        }
        Ok(())
    }

    /// Worker count after resolving the `None` default.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// One frame's duration, used as the tolerance for duration checks.
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps as f64
    }
}
