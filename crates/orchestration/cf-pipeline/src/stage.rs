//! Join handles for pipeline stages.

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// The tasks that make up one pipeline stage.
#[derive(Debug)]
pub struct StageHandle {
    name: &'static str,
    tasks: Vec<JoinHandle<()>>,
}

impl StageHandle {
    pub fn new(name: &'static str, tasks: Vec<JoinHandle<()>>) -> Self {
        Self { name, tasks }
    }

    /// Stage name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of tasks in the stage.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task. Panicked tasks are logged, not propagated.
    ///
    /// Returns the number of tasks that panicked.
    pub async fn join(self) -> usize {
        let mut panicked = 0;
        for (i, result) in join_all(self.tasks).await.into_iter().enumerate() {
            if let Err(e) = result {
                error!(stage = self.name, task = i, error = %e, "Stage task panicked");
                panicked += 1;
            }
        }
        debug!(stage = self.name, "Stage finished");
        panicked
    }
}
