//! Fire-and-forget work that must not block or fail the request that started it.
//!
//! Every task is counted by a `TaskTracker` until it finishes. A task's error
//! or panic stops at the task boundary: it is logged and dropped. At shutdown
//! `drain` waits for the count to reach zero.

use std::future::Future;

use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

#[derive(Clone, Debug, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `fut` detached. `name` is only used for logging.
    pub fn spawn<F>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        // The inner task isolates panics; the tracked outer task observes them.
        let inner = tokio::spawn(fut);

        self.tracker.spawn(async move {
            match inner.await {
                Ok(Ok(())) => debug!(task = name, "background task finished"),
                Ok(Err(err)) => error!(task = name, error = ?err, "background task failed"),
                Err(join) if join.is_panic() => {
                    error!(task = name, "background task panicked")
                }
                Err(join) => warn!(task = name, error = %join, "background task cancelled"),
            }
        });
    }

    /// Tasks spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Close the tracker and wait until every outstanding task has finished.
    pub async fn drain(&self) {
        self.tracker.close();
        debug!(in_flight = self.in_flight(), "draining background tasks");
        self.tracker.wait().await;
    }
}
