use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use thiserror::Error;

use crate::audio::domain::audio_muxer::AudioMuxer;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::imaging::domain::frame_fitter::fit_to_frame;
use crate::imaging::domain::overlay_compositor::compose_frame;
use crate::imaging::domain::photo_reader::PhotoReader;
use crate::imaging::domain::subtitle_renderer::SubtitleRenderer;
use crate::rendering::segment_timeline::SegmentTimeline;
use crate::shared::constants::SEGMENT_FILE_PREFIX;
use crate::shared::error::BoxError;
use crate::shared::render_config::{RenderConfig, SegmentAudioPolicy};
use crate::shared::video_metadata::VideoMetadata;
use crate::subtitles::domain::color_map::ColorMap;
use crate::transcript::domain::fragment::Fragment;
use crate::transcript::domain::fragment_segmenter::FragmentSegmenter;
use crate::transcript::domain::word_group::WordGroup;
use crate::video::domain::video_writer::{VideoWriter, VideoWriterFactory};

/// One unit of work: render fragment `index` over `photo`.
#[derive(Clone, Debug)]
pub struct SegmentJob {
    pub index: usize,
    pub fragment: Fragment,
    pub photo: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedSegment {
    pub index: usize,
    pub path: PathBuf,
    /// Duration of the encoded video track.
    pub expected_duration: f64,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("segment {index}: fragment has no words to show")]
    NoWords { index: usize },
    #[error("segment {index}: cannot use photo {path}: {source}")]
    Photo {
        index: usize,
        path: PathBuf,
        source: BoxError,
    },
    #[error("segment {index}: encoding failed: {source}")]
    Encode { index: usize, source: BoxError },
    #[error("segment {index}: attaching audio failed: {source}")]
    Audio { index: usize, source: BoxError },
}

impl RenderError {
    pub fn index(&self) -> usize {
        match self {
            RenderError::NoWords { index }
            | RenderError::Photo { index, .. }
            | RenderError::Encode { index, .. }
            | RenderError::Audio { index, .. } => *index,
        }
    }
}

/// Removes a partially written segment unless the render completes.
struct ScratchFile {
    path: PathBuf,
    keep: bool,
}

impl ScratchFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.keep && self.path.exists() {
            log::debug!("Removing partial segment {}", self.path.display());
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

pub fn segment_file_name(index: usize) -> String {
    format!("{SEGMENT_FILE_PREFIX}{index}.mp4")
}

/// The slice of master audio a segment carries under `policy`.
pub fn segment_audio(
    policy: SegmentAudioPolicy,
    groups: &[WordGroup],
    fragment: &Fragment,
    master: &AudioSegment,
) -> AudioSegment {
    let slice = |g: &WordGroup| {
        let (start, end) = g.absolute_window(fragment.begin);
        master.slice(start, end)
    };
    match policy {
        SegmentAudioPolicy::LastGroup => match groups.last() {
            Some(last) => slice(last),
            None => master.slice(fragment.begin, fragment.end),
        },
        SegmentAudioPolicy::FullFragment => {
            let parts: Vec<AudioSegment> = groups.iter().map(slice).collect();
            AudioSegment::concat(&parts)
                .unwrap_or_else(|| master.slice(fragment.begin, fragment.end))
        }
    }
}

/// Turns one fragment into a self-contained `segment_{index}.mp4`: the fitted
/// photo as background, one subtitle band per word group fading in at the
/// bottom, and a slice of the master audio.
pub struct SegmentRenderer {
    config: RenderConfig,
    segmenter: FragmentSegmenter,
    colors: Arc<ColorMap>,
    subtitles: Arc<dyn SubtitleRenderer>,
    photos: Arc<dyn PhotoReader>,
    writers: VideoWriterFactory,
    muxer: Arc<dyn AudioMuxer>,
}

impl SegmentRenderer {
    pub fn new(
        config: RenderConfig,
        colors: Arc<ColorMap>,
        subtitles: Arc<dyn SubtitleRenderer>,
        photos: Arc<dyn PhotoReader>,
        writers: VideoWriterFactory,
        muxer: Arc<dyn AudioMuxer>,
    ) -> Self {
        Self {
            segmenter: FragmentSegmenter::new(config.words_per_group),
            config,
            colors,
            subtitles,
            photos,
            writers,
            muxer,
        }
    }

    pub fn render(
        &self,
        job: &SegmentJob,
        master_audio: &AudioSegment,
        work_dir: &Path,
    ) -> Result<RenderedSegment, RenderError> {
        let index = job.index;
        let width = self.config.frame_width;
        let height = self.config.frame_height;
        let band_height = self.config.subtitle_band_height;

        let groups = self.segmenter.segment(&job.fragment);
        if groups.is_empty() {
            return Err(RenderError::NoWords { index });
        }

        let photo = self.photos.read(&job.photo).map_err(|source| RenderError::Photo {
            index,
            path: job.photo.clone(),
            source,
        })?;
        let background = fit_to_frame(&photo, width, height);
        drop(photo);

        let overlays: Vec<RgbaImage> = groups
            .iter()
            .map(|g| self.subtitles.render(&g.text(), &self.colors, width, band_height))
            .collect();
        let band_top = height.saturating_sub(band_height);

        let timeline = SegmentTimeline::new(
            &groups,
            job.fragment.duration(),
            self.config.fps,
            self.config.fade_in_seconds,
        );
        let metadata = VideoMetadata {
            width,
            height,
            fps: self.config.fps,
            total_frames: timeline.frame_count(),
        };

        let scratch = ScratchFile::new(work_dir.join(segment_file_name(index)));
        let mut writer = (self.writers)();
        let written = write_frames(writer.as_mut(), &scratch.path, &metadata, |frame| {
            let overlay = timeline
                .overlay_at(frame)
                .map(|state| (&overlays[state.group], state.opacity));
            compose_frame(
                &background,
                overlay.map(|(band, _)| (band, band_top)),
                overlay.map_or(0.0, |(_, opacity)| opacity),
                frame,
            )
        });
        // Close even after a failed write so the container is released.
        let closed = writer.close();
        written
            .and(closed)
            .map_err(|source| RenderError::Encode { index, source })?;

        let audio = segment_audio(
            self.config.segment_audio,
            &groups,
            &job.fragment,
            master_audio,
        );
        self.muxer
            .mux(&scratch.path, &audio, &scratch.path)
            .map_err(|source| RenderError::Audio { index, source })?;

        log::debug!(
            "Rendered segment {index}: {} groups, {} frames, {:.2}s of audio",
            groups.len(),
            metadata.total_frames,
            audio.duration()
        );
        Ok(RenderedSegment {
            index,
            path: scratch.keep(),
            expected_duration: timeline.encoded_duration(),
        })
    }
}

fn write_frames<F>(
    writer: &mut dyn VideoWriter,
    path: &Path,
    metadata: &VideoMetadata,
    compose: F,
) -> Result<(), BoxError>
where
    F: Fn(usize) -> crate::shared::frame::Frame,
{
    writer.open(path, metadata)?;
    for frame in 0..metadata.total_frames {
        writer.write(&compose(frame))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::Frame;
    use crate::subtitles::domain::color_map::TextColor;
    use approx::assert_relative_eq;
    use image::{Rgb, RgbImage, Rgba};
    use std::sync::Mutex;

    const W: u32 = 20;
    const H: u32 = 40;
    const BAND: u32 = 10;
    const GRAY: [u8; 3] = [100, 100, 100];

    // --- Stubs ---

    struct SolidPhoto;

    impl PhotoReader for SolidPhoto {
        fn read(&self, path: &Path) -> Result<RgbImage, BoxError> {
            if path.to_string_lossy().contains("missing") {
                return Err("photo not found".into());
            }
            Ok(RgbImage::from_pixel(60, 60, Rgb(GRAY)))
        }
    }

    /// Paints the whole band in the color of the first word.
    #[derive(Default)]
    struct BandSubtitles {
        texts: Mutex<Vec<String>>,
    }

    impl SubtitleRenderer for BandSubtitles {
        fn render(&self, text: &str, colors: &ColorMap, width: u32, height: u32) -> RgbaImage {
            self.texts.lock().unwrap().push(text.to_string());
            let first = text.split(' ').next().unwrap_or_default();
            RgbaImage::from_pixel(width, height, Rgba(colors.resolve(first).rgba()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingWriter {
        frames: Arc<Mutex<Vec<Frame>>>,
        closed: Arc<Mutex<usize>>,
        fail_at: Option<usize>,
    }

    impl VideoWriter for RecordingWriter {
        fn open(&mut self, path: &Path, _metadata: &VideoMetadata) -> Result<(), BoxError> {
            std::fs::write(path, b"partial")?;
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), BoxError> {
            if self.fail_at == Some(frame.index()) {
                return Err("disk full".into());
            }
            self.frames.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), BoxError> {
            *self.closed.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingMuxer {
        durations: Mutex<Vec<f64>>,
        fail: bool,
    }

    impl AudioMuxer for RecordingMuxer {
        fn mux(&self, _video: &Path, audio: &AudioSegment, _out: &Path) -> Result<(), BoxError> {
            if self.fail {
                return Err("aac encoder missing".into());
            }
            self.durations.lock().unwrap().push(audio.duration());
            Ok(())
        }
    }

    // --- Helpers ---

    fn config(policy: SegmentAudioPolicy) -> RenderConfig {
        RenderConfig {
            frame_width: W,
            frame_height: H,
            subtitle_band_height: BAND,
            fps: 10,
            fade_in_seconds: 0.5,
            audio_sample_rate: 1000,
            segment_audio: policy,
            ..RenderConfig::default()
        }
    }

    fn colors() -> Arc<ColorMap> {
        let mut map = ColorMap::new(TextColor::parse("white").unwrap());
        map.insert("hello", TextColor::parse("red").unwrap());
        Arc::new(map)
    }

    struct Harness {
        renderer: SegmentRenderer,
        writer: RecordingWriter,
        subtitles: Arc<BandSubtitles>,
        muxer: Arc<RecordingMuxer>,
    }

    fn harness(
        policy: SegmentAudioPolicy,
        writer: RecordingWriter,
        muxer: RecordingMuxer,
    ) -> Harness {
        let subtitles = Arc::new(BandSubtitles::default());
        let muxer = Arc::new(muxer);
        let factory_writer = writer.clone();
        let renderer = SegmentRenderer::new(
            config(policy),
            colors(),
            subtitles.clone(),
            Arc::new(SolidPhoto),
            Arc::new(move || Box::new(factory_writer.clone()) as Box<dyn VideoWriter>),
            muxer.clone(),
        );
        Harness {
            renderer,
            writer,
            subtitles,
            muxer,
        }
    }

    fn job(index: usize, text: &str, begin: f64, end: f64, photo: &str) -> SegmentJob {
        SegmentJob {
            index,
            fragment: Fragment::new(text, begin, end),
            photo: PathBuf::from(photo),
        }
    }

    fn master() -> AudioSegment {
        AudioSegment::new(vec![0.0; 10_000], 1000, 1)
    }

    // --- Tests ---

    #[test]
    fn test_render_writes_indexed_segment_with_rounded_frame_count() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            SegmentAudioPolicy::LastGroup,
            RecordingWriter::default(),
            RecordingMuxer::default(),
        );

        let segment = h
            .renderer
            .render(&job(3, "Hello world, foo bar!", 1.0, 3.04, "a.png"), &master(), dir.path())
            .unwrap();

        assert_eq!(segment.index, 3);
        assert_eq!(segment.path, dir.path().join("segment_3.mp4"));
        assert!(segment.path.exists());
        // round(2.04 * 10) = 20
        assert_eq!(h.writer.frames.lock().unwrap().len(), 20);
        assert_relative_eq!(segment.expected_duration, 2.0);
        assert_eq!(*h.writer.closed.lock().unwrap(), 1);
    }

    #[test]
    fn test_one_subtitle_per_word_group() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            SegmentAudioPolicy::LastGroup,
            RecordingWriter::default(),
            RecordingMuxer::default(),
        );
        h.renderer
            .render(&job(0, "Hello world, foo bar!", 0.0, 2.0, "a.png"), &master(), dir.path())
            .unwrap();
        assert_eq!(
            *h.subtitles.texts.lock().unwrap(),
            vec!["hello world foo".to_string(), "bar".to_string()]
        );
    }

    #[test]
    fn test_band_sits_at_bottom_and_fades_in() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            SegmentAudioPolicy::LastGroup,
            RecordingWriter::default(),
            RecordingMuxer::default(),
        );
        h.renderer
            .render(&job(0, "hello there", 0.0, 1.0, "a.png"), &master(), dir.path())
            .unwrap();

        let frames = h.writer.frames.lock().unwrap();
        let bottom = H - 1;
        // Fade starts fully transparent.
        assert_eq!(frames[0].pixel(W / 2, bottom), GRAY);
        // Half way through the fade the band is partly red.
        let mid = frames[2].pixel(W / 2, bottom);
        assert!(mid[0] > GRAY[0] && mid[1] < GRAY[1]);
        // Fully faded in: the mapped color of "hello".
        assert_eq!(frames[6].pixel(W / 2, bottom), [255, 0, 0]);
        // Above the band the photo is untouched.
        assert_eq!(frames[6].pixel(W / 2, H - BAND - 1), GRAY);
    }

    #[test]
    fn test_last_group_policy_attaches_only_final_group_audio() {
        // Open question on segment audio: the default keeps only the last
        // group's slice.
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            SegmentAudioPolicy::LastGroup,
            RecordingWriter::default(),
            RecordingMuxer::default(),
        );
        h.renderer
            .render(&job(0, "a b c d e f g", 2.0, 5.0, "a.png"), &master(), dir.path())
            .unwrap();
        // 3 groups over 3s: last group spans [4.0, 5.0].
        let durations = h.muxer.durations.lock().unwrap();
        assert_relative_eq!(durations[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_full_fragment_policy_attaches_whole_fragment_audio() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            SegmentAudioPolicy::FullFragment,
            RecordingWriter::default(),
            RecordingMuxer::default(),
        );
        h.renderer
            .render(&job(0, "a b c d e f g", 2.0, 5.0, "a.png"), &master(), dir.path())
            .unwrap();
        let durations = h.muxer.durations.lock().unwrap();
        assert_relative_eq!(durations[0], 3.0, epsilon = 1e-3);
    }

    #[test]
    fn test_missing_photo_fails_without_leaving_files() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            SegmentAudioPolicy::LastGroup,
            RecordingWriter::default(),
            RecordingMuxer::default(),
        );
        let err = h
            .renderer
            .render(&job(1, "hello", 0.0, 1.0, "missing.png"), &master(), dir.path())
            .unwrap_err();
        assert!(matches!(err, RenderError::Photo { index: 1, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_encode_failure_closes_writer_and_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RecordingWriter {
            fail_at: Some(4),
            ..RecordingWriter::default()
        };
        let h = harness(SegmentAudioPolicy::LastGroup, writer, RecordingMuxer::default());
        let err = h
            .renderer
            .render(&job(2, "hello", 0.0, 1.0, "a.png"), &master(), dir.path())
            .unwrap_err();
        assert!(matches!(err, RenderError::Encode { index: 2, .. }));
        assert_eq!(*h.writer.closed.lock().unwrap(), 1);
        assert!(!dir.path().join("segment_2.mp4").exists());
    }

    #[test]
    fn test_mux_failure_removes_segment() {
        let dir = tempfile::tempdir().unwrap();
        let muxer = RecordingMuxer {
            fail: true,
            ..RecordingMuxer::default()
        };
        let h = harness(SegmentAudioPolicy::LastGroup, RecordingWriter::default(), muxer);
        let err = h
            .renderer
            .render(&job(0, "hello", 0.0, 1.0, "a.png"), &master(), dir.path())
            .unwrap_err();
        assert_eq!(err.index(), 0);
        assert!(err.to_string().contains("aac encoder missing"));
        assert!(!dir.path().join("segment_0.mp4").exists());
    }

    #[test]
    fn test_fragment_without_words_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            SegmentAudioPolicy::LastGroup,
            RecordingWriter::default(),
            RecordingMuxer::default(),
        );
        let err = h
            .renderer
            .render(&job(5, "?!", 0.0, 1.0, "a.png"), &master(), dir.path())
            .unwrap_err();
        assert!(matches!(err, RenderError::NoWords { index: 5 }));
    }

    #[test]
    fn test_segment_audio_windows() {
        let fragment = Fragment::new("a b c d", 1.0, 3.0);
        let groups = FragmentSegmenter::new(3).segment(&fragment);
        let master = master();
        let last = segment_audio(SegmentAudioPolicy::LastGroup, &groups, &fragment, &master);
        let full = segment_audio(SegmentAudioPolicy::FullFragment, &groups, &fragment, &master);
        assert_relative_eq!(last.duration(), 1.0, epsilon = 1e-3);
        assert_relative_eq!(full.duration(), 2.0, epsilon = 1e-3);
    }
}
