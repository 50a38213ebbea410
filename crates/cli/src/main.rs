use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use reelsmith_core::audio::domain::audio_muxer::AudioMuxer;
use reelsmith_core::audio::infrastructure::ffmpeg_audio_muxer::FfmpegAudioMuxer;
use reelsmith_core::audio::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use reelsmith_core::imaging::infrastructure::ffmpeg_photo_reader::FfmpegPhotoReader;
use reelsmith_core::imaging::infrastructure::fontdue_subtitle_renderer::FontdueSubtitleRenderer;
use reelsmith_core::layout::project_layout::{LayoutOverrides, ProjectLayout};
use reelsmith_core::pipeline::assemble_video_use_case::{AssembleVideoUseCase, AssemblyRequest};
use reelsmith_core::pipeline::infrastructure::threaded_segment_executor::ThreadedSegmentExecutor;
use reelsmith_core::pipeline::pipeline_logger::LogPipelineLogger;
use reelsmith_core::rendering::segment_renderer::SegmentRenderer;
use reelsmith_core::shared::constants::DEFAULT_WORK_DIR_NAME;
use reelsmith_core::shared::render_config::{RenderConfig, SegmentAudioPolicy};
use reelsmith_core::subtitles::infrastructure::color_file_reader::read_color_file;
use reelsmith_core::transcript::domain::transcript_reader::TranscriptReader;
use reelsmith_core::transcript::infrastructure::json_transcript_reader::JsonTranscriptReader;
use reelsmith_core::video::domain::video_writer::{VideoWriter, VideoWriterFactory};
use reelsmith_core::video::infrastructure::ffmpeg_cli_concatenator::FfmpegCliConcatenator;
use reelsmith_core::video::infrastructure::ffmpeg_probe::FfmpegProbe;
use reelsmith_core::video::infrastructure::ffmpeg_writer::{FfmpegWriter, DEFAULT_CRF};

/// Assembles a subtitled vertical video from photos, a narration track and
/// an aligned transcript.
#[derive(Parser, Debug)]
#[command(name = "reelsmith", version)]
struct Cli {
    /// Project directory searched for aligned_script_with_timestamps/, photos/,
    /// audio/, colors/ and font/.
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Working directory for segments and the final video (default: ROOT/video).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Aligned transcript JSON.
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Photo directory, or a single photo.
    #[arg(long)]
    photos: Option<PathBuf>,

    /// Narration audio file.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Word color definitions (colors.txt).
    #[arg(long)]
    colors: Option<PathBuf>,

    /// TTF/OTF font for subtitles.
    #[arg(long)]
    font: Option<PathBuf>,

    /// JSON render settings; flags below take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output width in pixels (even).
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels (even).
    #[arg(long)]
    height: Option<u32>,

    /// Subtitle font size in pixels.
    #[arg(long)]
    font_size: Option<f32>,

    /// Segments rendered in parallel (default: available cores).
    #[arg(long)]
    workers: Option<usize>,

    /// Audio each segment carries: last-group or full-fragment.
    #[arg(long)]
    segment_audio: Option<SegmentAudioPolicy>,

    /// H.264 CRF quality (0=lossless, 51=worst, default 23).
    #[arg(long)]
    quality: Option<u32>,

    /// ffmpeg binary used for concatenation.
    #[arg(long)]
    ffmpeg: Option<String>,

    /// Keep segments and the concatenated video after success.
    #[arg(long)]
    keep_intermediates: bool,

    /// Print the effective settings as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let overrides = LayoutOverrides {
        transcript: cli.transcript.clone(),
        photos: cli.photos.clone(),
        audio: cli.audio.clone(),
        colors: cli.colors.clone(),
        font: cli.font.clone(),
    };
    let layout = ProjectLayout::resolve(&cli.root, &overrides)?;
    log::info!(
        "Using transcript {}, {} photos, audio {}",
        layout.transcript.display(),
        layout.photos.len(),
        layout.audio.display()
    );

    let fragments = JsonTranscriptReader.read(&layout.transcript)?;
    let colors = Arc::new(read_color_file(&layout.colors, &config.default_color)?);
    let subtitles = Arc::new(FontdueSubtitleRenderer::from_file(
        &layout.font,
        config.font_size,
        config.outline_thickness,
        config.word_gap,
    )?);

    let crf = config.crf.unwrap_or(DEFAULT_CRF);
    let writers: VideoWriterFactory =
        Arc::new(move || Box::new(FfmpegWriter::with_crf(crf)) as Box<dyn VideoWriter>);
    let muxer: Arc<dyn AudioMuxer> = Arc::new(FfmpegAudioMuxer);

    let renderer = SegmentRenderer::new(
        config.clone(),
        colors,
        subtitles,
        Arc::new(FfmpegPhotoReader),
        writers,
        muxer.clone(),
    );
    let mut use_case = AssembleVideoUseCase::new(
        config.clone(),
        renderer,
        Box::new(FfmpegAudioReader),
        Box::new(ThreadedSegmentExecutor::new(config.worker_count())),
        Box::new(FfmpegProbe),
        Box::new(FfmpegCliConcatenator::new(config.ffmpeg_binary.clone())),
        muxer,
        Box::new(LogPipelineLogger::default()),
    );

    let request = AssemblyRequest {
        fragments,
        photos: layout.photos,
        audio: layout.audio,
        work_dir: cli
            .output_dir
            .clone()
            .unwrap_or_else(|| cli.root.join(DEFAULT_WORK_DIR_NAME)),
    };
    let output = use_case.execute(&request)?;
    println!("{}", output.display());
    Ok(())
}

/// Config file (or defaults), then flags on top, then validation.
fn build_config(cli: &Cli) -> Result<RenderConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => RenderConfig::from_json_file(path)?,
        None => RenderConfig::default(),
    };

    if let Some(width) = cli.width {
        config.frame_width = width;
    }
    if let Some(height) = cli.height {
        config.frame_height = height;
    }
    if let Some(size) = cli.font_size {
        config.font_size = size;
    }
    if let Some(workers) = cli.workers {
        config.workers = Some(workers);
    }
    if let Some(policy) = cli.segment_audio {
        config.segment_audio = policy;
    }
    if let Some(crf) = cli.quality {
        config.crf = Some(crf);
    }
    if let Some(ffmpeg) = &cli.ffmpeg {
        config.ffmpeg_binary = ffmpeg.clone();
    }
    if cli.keep_intermediates {
        config.keep_intermediates = true;
    }

    config.validate()?;
    Ok(config)
}
