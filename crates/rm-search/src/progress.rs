use std::sync::Arc;

/// Batch progress, reported from the coordinator's collecting thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    BatchStarted { total: usize },
    TaskCompleted { done: usize, total: usize },
    BatchFinished { total: usize, timed_out: usize },
}

impl Progress {
    /// Completed fraction in [0,1].
    pub fn fraction(&self) -> f64 {
        match *self {
            Progress::BatchStarted { .. } => 0.0,
            Progress::TaskCompleted { done, total } if total > 0 => done as f64 / total as f64,
            Progress::TaskCompleted { .. } | Progress::BatchFinished { .. } => 1.0,
        }
    }
}

/// Callback receiving progress events (e.g. a streaming progress indicator).
pub type ProgressReporter = Arc<dyn Fn(Progress) + Send + Sync>;
