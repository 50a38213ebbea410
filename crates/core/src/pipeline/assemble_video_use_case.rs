use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::audio::domain::audio_muxer::AudioMuxer;
use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::rendering::segment_renderer::{RenderedSegment, SegmentJob, SegmentRenderer};
use crate::shared::constants::{CONCATENATED_FILENAME, FINAL_OUTPUT_FILENAME};
use crate::shared::error::BoxError;
use crate::shared::render_config::RenderConfig;
use crate::transcript::domain::fragment::Fragment;
use crate::video::domain::media_probe::MediaProbe;
use crate::video::domain::segment_concatenator::SegmentConcatenator;

use super::pipeline_logger::{PipelineLogger, Stage};
use super::segment_executor::SegmentExecutor;
use super::work_dir;

/// Everything a single assembly run reads.
pub struct AssemblyRequest {
    pub fragments: Vec<Fragment>,
    pub photos: Vec<PathBuf>,
    pub audio: PathBuf,
    pub work_dir: PathBuf,
}

/// One job per renderable fragment, keeping the fragment's transcript
/// position as its index. Photos are assigned round-robin by that index.
pub fn plan_jobs(fragments: &[Fragment], photos: &[PathBuf]) -> Vec<SegmentJob> {
    if photos.is_empty() {
        return Vec::new();
    }
    fragments
        .iter()
        .enumerate()
        .filter(|(_, fragment)| fragment.is_renderable())
        .map(|(index, fragment)| SegmentJob {
            index,
            fragment: fragment.clone(),
            photo: photos[index % photos.len()].clone(),
        })
        .collect()
}

/// Orchestrates a full run: decode the narration once, render every segment
/// in parallel, join them in transcript order and lay the master audio over
/// the result.
pub struct AssembleVideoUseCase {
    config: RenderConfig,
    renderer: SegmentRenderer,
    audio_reader: Box<dyn AudioReader>,
    executor: Box<dyn SegmentExecutor>,
    probe: Box<dyn MediaProbe>,
    concatenator: Box<dyn SegmentConcatenator>,
    muxer: Arc<dyn AudioMuxer>,
    logger: Box<dyn PipelineLogger>,
}

impl AssembleVideoUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: RenderConfig,
        renderer: SegmentRenderer,
        audio_reader: Box<dyn AudioReader>,
        executor: Box<dyn SegmentExecutor>,
        probe: Box<dyn MediaProbe>,
        concatenator: Box<dyn SegmentConcatenator>,
        muxer: Arc<dyn AudioMuxer>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            config,
            renderer,
            audio_reader,
            executor,
            probe,
            concatenator,
            muxer,
            logger,
        }
    }

    /// Runs the pipeline and returns the path of the final video.
    pub fn execute(&mut self, request: &AssemblyRequest) -> Result<PathBuf, BoxError> {
        if request.photos.is_empty() {
            return Err("no photos to use as backgrounds".into());
        }
        let jobs = plan_jobs(&request.fragments, &request.photos);
        if jobs.is_empty() {
            return Err("transcript has no fragments with text".into());
        }
        let skipped = request.fragments.len() - jobs.len();
        if skipped > 0 {
            log::info!("Skipping {skipped} fragments without text");
        }

        let removed = work_dir::prepare(&request.work_dir)?;
        if removed > 0 {
            log::debug!("Removed {removed} stale files from {}", request.work_dir.display());
        }

        let master = self.decode_master_audio(&request.audio, &jobs)?;

        self.logger.info(&format!(
            "Rendering {} segments with {} workers",
            jobs.len(),
            self.config.worker_count()
        ));
        let start = Instant::now();
        let renderer = &self.renderer;
        let logger = &mut self.logger;
        let segments = self.executor.execute(
            jobs,
            &|job: &SegmentJob| renderer.render(job, &master, &request.work_dir),
            &mut |completed, total| logger.progress(completed, total),
        )?;
        self.logger.stage_finished(Stage::Render, start.elapsed());

        self.verify_durations(&segments);

        let concatenated = request.work_dir.join(CONCATENATED_FILENAME);
        let paths: Vec<PathBuf> = segments.iter().map(|s| s.path.clone()).collect();
        let start = Instant::now();
        self.concatenator.concatenate(&paths, &concatenated)?;
        self.logger.stage_finished(Stage::Concat, start.elapsed());

        let output = request.work_dir.join(FINAL_OUTPUT_FILENAME);
        let start = Instant::now();
        self.muxer.mux(&concatenated, &master, &output)?;
        self.logger.stage_finished(Stage::Mux, start.elapsed());

        if self.config.keep_intermediates {
            log::info!("Keeping intermediate files in {}", request.work_dir.display());
        } else {
            work_dir::purge_intermediates(&request.work_dir)?;
        }

        self.logger.info(&format!("Final video written to {}", output.display()));
        self.logger.summary();
        Ok(output)
    }

    fn decode_master_audio(
        &mut self,
        path: &Path,
        jobs: &[SegmentJob],
    ) -> Result<AudioSegment, BoxError> {
        let start = Instant::now();
        let master = self
            .audio_reader
            .read_audio(path, self.config.audio_sample_rate)
            .map_err(|e| format!("failed to decode {}: {e}", path.display()))?;
        self.logger.stage_finished(Stage::DecodeAudio, start.elapsed());

        let needed = jobs
            .iter()
            .map(|job| job.fragment.end)
            .fold(0.0_f64, f64::max);
        if master.duration() + self.config.frame_duration() < needed {
            log::warn!(
                "Audio {} is {:.2}s long but the transcript runs to {needed:.2}s; \
                 late segments will be silent",
                path.display(),
                master.duration()
            );
        }
        Ok(master)
    }

    /// Segment lengths drifting from the transcript would desync the final
    /// mux. This is reported, never fatal.
    fn verify_durations(&mut self, segments: &[RenderedSegment]) {
        let tolerance = self.config.frame_duration();
        for segment in segments {
            match self.probe.duration(&segment.path) {
                Ok(actual) => {
                    self.logger
                        .segment_probed(segment.index, segment.expected_duration, actual);
                    if (actual - segment.expected_duration).abs() > tolerance {
                        log::warn!(
                            "Segment {} is {actual:.3}s, expected {:.3}s",
                            segment.index,
                            segment.expected_duration
                        );
                    }
                }
                Err(e) => log::warn!("Could not probe {}: {e}", segment.path.display()),
            }
        }
    }
}
