//! Simulated upload progress.
//!
//! The transport does not report bytes sent, so while an upload is in flight a
//! background task raises the percentage on a fixed schedule up to a ceiling
//! below 100. Only [`ProgressReporter::finish`] reports 100. Sinks must treat
//! every report as "at least this much" and ignore values that would lower the
//! current percentage.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tracing::debug;

pub const COMPLETE_PERCENT: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPlan {
    pub start: u8,
    pub step: u8,
    pub ceiling: u8,
    pub interval: Duration,
}

impl Default for ProgressPlan {
    fn default() -> Self {
        Self {
            start: 1,
            step: 15,
            ceiling: 90,
            interval: Duration::from_millis(80),
        }
    }
}

impl ProgressPlan {
    /// Strictly increasing percentages emitted before real completion; never
    /// reaches [`COMPLETE_PERCENT`].
    pub fn ticks(&self) -> impl Iterator<Item = u8> {
        let ceiling = self.ceiling.min(COMPLETE_PERCENT - 1);
        let step = self.step.max(1);
        std::iter::successors(Some(self.start), move |current| current.checked_add(step))
            .take_while(move |percent| *percent <= ceiling)
    }
}

pub trait ProgressSink: Send + Sync + 'static {
    fn raise(&self, percent: u8);
}

/// Handle to the background progress task for one upload attempt.
///
/// Dropping the reporter aborts the task.
pub struct ProgressReporter {
    task: Option<JoinHandle<()>>,
    sink: Arc<dyn ProgressSink>,
}

impl ProgressReporter {
    pub fn start(plan: ProgressPlan, sink: Arc<dyn ProgressSink>) -> Self {
        let task_sink = Arc::clone(&sink);
        let task = tokio::spawn(async move {
            for percent in plan.ticks() {
                task_sink.raise(percent);
                tokio::time::sleep(plan.interval).await;
            }
            debug!("progress: simulated ceiling reached");
        });
        Self {
            task: Some(task),
            sink,
        }
    }

    /// Stops the simulation and reports completion, regardless of how far the
    /// simulated sequence got.
    pub async fn finish(mut self) {
        self.stop().await;
        self.sink.raise(COMPLETE_PERCENT);
    }

    /// Stops the simulation without reporting anything further.
    pub async fn cancel(mut self) {
        self.stop().await;
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/progress_tests.rs"]
mod tests;
