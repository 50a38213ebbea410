use std::fmt;
use std::time::{Duration, Instant};

/// Sequential steps of an assembly run, in the order they execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    DecodeAudio,
    Render,
    Concat,
    Mux,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::DecodeAudio => "decode audio",
            Stage::Render => "render",
            Stage::Concat => "concat",
            Stage::Mux => "mux",
        };
        f.write_str(name)
    }
}

/// Observer for assembly events.
///
/// Keeps the use case free of output concerns; the CLI logs through the
/// `log` facade, tests stay silent.
pub trait PipelineLogger: Send {
    /// `completed` of `total` segments have finished rendering.
    fn progress(&mut self, completed: usize, total: usize);

    fn stage_finished(&mut self, stage: Stage, elapsed: Duration);

    /// A rendered segment was probed after fan-in.
    fn segment_probed(&mut self, index: usize, expected_seconds: f64, actual_seconds: f64);

    fn info(&mut self, message: &str);

    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _completed: usize, _total: usize) {}
    fn stage_finished(&mut self, _stage: Stage, _elapsed: Duration) {}
    fn segment_probed(&mut self, _index: usize, _expected: f64, _actual: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logs progress at `info` level and ends the run with a summary of stage
/// times, video length and the worst segment drift.
///
/// Progress lines are throttled to every `throttle` completed segments.
pub struct LogPipelineLogger {
    throttle: usize,
    start_time: Instant,
    total_segments: usize,
    stages: Vec<(Stage, Duration)>,
    video_seconds: f64,
    worst_drift: Option<(usize, f64)>,
}

impl LogPipelineLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            start_time: Instant::now(),
            total_segments: 0,
            stages: Vec::new(),
            video_seconds: 0.0,
            worst_drift: None,
        }
    }

    /// Returns the formatted summary, or `None` before any stage finished.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() {
            return None;
        }

        let wall = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Assembly summary ({} segments, {:.1}s of video, {wall:.1}s wall):",
            self.total_segments, self.video_seconds
        )];
        for (stage, elapsed) in &self.stages {
            let secs = elapsed.as_secs_f64();
            let pct = if wall > 0.0 { secs / wall * 100.0 } else { 0.0 };
            lines.push(format!(
                "  {:12}: {:8.0}ms  ({pct:4.1}%)",
                stage.to_string(),
                secs * 1000.0
            ));
        }
        if let Some((index, drift)) = self.worst_drift {
            lines.push(format!("  worst drift : segment {index} off by {drift:+.3}s"));
        }
        Some(lines.join("\n"))
    }

    pub fn stage_time(&self, stage: Stage) -> Option<Duration> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, elapsed)| *elapsed)
    }

    pub fn video_seconds(&self) -> f64 {
        self.video_seconds
    }

    /// Segment index and signed drift with the largest magnitude so far.
    pub fn worst_drift(&self) -> Option<(usize, f64)> {
        self.worst_drift
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, completed: usize, total: usize) {
        self.total_segments = total;
        if total > 0 && (completed % self.throttle == 0 || completed == total) {
            let pct = completed as f64 / total as f64 * 100.0;
            log::info!("Rendered {completed}/{total} segments ({pct:.0}%)");
        }
    }

    fn stage_finished(&mut self, stage: Stage, elapsed: Duration) {
        log::debug!("{stage} took {:.0}ms", elapsed.as_secs_f64() * 1000.0);
        self.stages.push((stage, elapsed));
    }

    fn segment_probed(&mut self, index: usize, expected_seconds: f64, actual_seconds: f64) {
        self.video_seconds += actual_seconds;
        let drift = actual_seconds - expected_seconds;
        let worse = self
            .worst_drift
            .map_or(true, |(_, worst)| drift.abs() > worst.abs());
        if worse {
            self.worst_drift = Some((index, drift));
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
