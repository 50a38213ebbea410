use std::sync::atomic::{AtomicBool, Ordering};

use crate::pipeline::segment_executor::{RenderFn, SegmentExecutor};
use crate::rendering::segment_renderer::{RenderError, RenderedSegment, SegmentJob};

const DEFAULT_CHANNEL_CAPACITY: usize = 4;

/// Renders segments on a fixed pool of worker threads fed by a bounded queue.
///
/// Layout: `feeder → [job queue] → N workers → [results] → caller`
///
/// After the first failure no new job is started; jobs already running are
/// allowed to finish so their scratch files get cleaned up.
pub struct ThreadedSegmentExecutor {
    workers: usize,
    channel_capacity: usize,
}

impl ThreadedSegmentExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl SegmentExecutor for ThreadedSegmentExecutor {
    fn execute(
        &self,
        jobs: Vec<SegmentJob>,
        render: &RenderFn<'_>,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Vec<RenderedSegment>, RenderError> {
        let total = jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let workers = self.workers.min(total);
        log::debug!("Rendering {total} segments on {workers} workers");

        let aborted = AtomicBool::new(false);
        let (job_tx, job_rx) = crossbeam_channel::bounded::<SegmentJob>(self.channel_capacity);
        let (result_tx, result_rx) =
            crossbeam_channel::unbounded::<Result<RenderedSegment, RenderError>>();

        let (mut rendered, mut failures) = std::thread::scope(|scope| {
            let aborted = &aborted;

            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for job in job_rx {
                        if aborted.load(Ordering::Relaxed) {
                            break;
                        }
                        let result = render(&job);
                        if result.is_err() {
                            aborted.store(true, Ordering::Relaxed);
                        }
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            scope.spawn(move || {
                for job in jobs {
                    if aborted.load(Ordering::Relaxed) || job_tx.send(job).is_err() {
                        break;
                    }
                }
            });

            let mut rendered = Vec::with_capacity(total);
            let mut failures = Vec::new();
            let mut completed = 0;
            for result in result_rx {
                completed += 1;
                on_progress(completed, total);
                match result {
                    Ok(segment) => rendered.push(segment),
                    Err(e) => {
                        log::error!("{e}");
                        failures.push(e);
                    }
                }
            }
            (rendered, failures)
        });

        if !failures.is_empty() {
            failures.sort_by_key(RenderError::index);
            if failures.len() > 1 {
                log::warn!("{} segments failed; reporting the first", failures.len());
            }
            return Err(failures.swap_remove(0));
        }

        rendered.sort_by_key(|s| s.index);
        Ok(rendered)
    }
}
