/// Bounded worker pool for external tool jobs
///
/// Jobs of one batch are independent (each writes only its own output
/// path), so they run unordered on a dedicated rayon pool. A failing job is
/// reported in its `JobOutcome` and never stops its siblings.
use crate::pipeline::jobs::{JobDescriptor, JobOutcome};
use crate::tools::ToolRunner;
use crate::utils::progress::job_progress;
use crate::OrthoprepError;
use rayon::prelude::*;
use tracing::warn;

/// `min(requested, available cores)`, and at least one worker
pub fn effective_concurrency(requested: usize) -> usize {
    let available = num_cpus::get().max(1);
    let requested = requested.max(1);
    if requested > available {
        warn!("Reduce the given number of CPUs to {}", available);
    }
    requested.min(available)
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
    size: usize,
    show_progress: bool,
}

impl WorkerPool {
    pub fn new(requested: usize) -> Result<Self, OrthoprepError> {
        let size = effective_concurrency(requested);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("orthoprep-worker-{}", i))
            .build()
            .map_err(|e| OrthoprepError::WorkerPool(e.to_string()))?;

        Ok(Self {
            pool,
            size,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run every job and block until all have finished.
    pub fn run_all<R>(&self, runner: &R, jobs: Vec<JobDescriptor>) -> Vec<JobOutcome>
    where
        R: ToolRunner + ?Sized,
    {
        self.pool
            .install(|| jobs.par_iter().map(|job| runner.run(job)).collect())
    }

    /// Run every job, collecting outcomes in completion order while a
    /// progress bar counts them. Returns once the whole batch is done.
    pub fn run_streaming<R>(&self, runner: &R, jobs: Vec<JobDescriptor>, message: &str) -> Vec<JobOutcome>
    where
        R: ToolRunner + ?Sized,
    {
        let total = jobs.len();
        let progress = job_progress(total, message, self.show_progress);
        let (tx, rx) = crossbeam::channel::unbounded::<JobOutcome>();

        let outcomes = self.pool.in_place_scope(|scope| {
            for job in jobs {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    // the receiver outlives the scope, send cannot fail
                    let _ = tx.send(runner.run(&job));
                });
            }
            drop(tx);

            let mut outcomes = Vec::with_capacity(total);
            for outcome in rx.iter() {
                progress.inc(1);
                outcomes.push(outcome);
            }
            outcomes
        });

        progress.finish_and_clear();
        outcomes
    }
}
