use crate::rendering::segment_renderer::{RenderError, RenderedSegment, SegmentJob};

/// Renders one job. Called concurrently from worker threads.
pub type RenderFn<'a> = dyn Fn(&SegmentJob) -> Result<RenderedSegment, RenderError> + Sync + 'a;

/// Abstracts how segment jobs are scheduled.
///
/// Implementations return segments ordered by job index regardless of the
/// order they finish in. Any failed job fails the whole run.
pub trait SegmentExecutor: Send + Sync {
    /// `on_progress(completed, total)` is called from the calling thread
    /// after each job finishes.
    fn execute(
        &self,
        jobs: Vec<SegmentJob>,
        render: &RenderFn<'_>,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Vec<RenderedSegment>, RenderError>;
}
