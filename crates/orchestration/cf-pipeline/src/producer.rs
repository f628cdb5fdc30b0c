//! Job producer: publishes one job per input.

use crate::stage::StageHandle;
use crate::stats::PipelineStats;
use cf_types::{InputId, Job};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Capacity of the job queue. Jobs are handed over one at a time so an
/// input is only claimed when a chunk worker is ready for it.
const JOB_QUEUE_CAPACITY: usize = 1;

/// Start publishing `inputs` as jobs, in order.
///
/// The returned queue closes after the last job is taken, or as soon as
/// `cancel` fires. Jobs not yet taken at cancellation are never published.
pub fn start_job_producer(
    cancel: CancellationToken,
    inputs: Vec<InputId>,
    stats: Arc<PipelineStats>,
) -> (mpsc::Receiver<Job>, StageHandle) {
    let (tx, rx) = mpsc::channel(JOB_QUEUE_CAPACITY);

    let task = tokio::spawn(async move {
        let total = inputs.len();
        for (published, input) in inputs.into_iter().enumerate() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(published, total, "Job producer cancelled");
                    return;
                }
                sent = tx.send(Job::new(input)) => {
                    if sent.is_err() {
                        debug!(published, total, "Job queue closed by consumers");
                        return;
                    }
                    stats.record_input_published();
                }
            }
        }
        debug!(total, "All jobs published");
    });

    (rx, StageHandle::new("producer", vec![task]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(names: &[&str]) -> Vec<InputId> {
        names.iter().map(|n| InputId::from(*n)).collect()
    }

    #[tokio::test]
    async fn test_publishes_all_in_order_then_closes() {
        let stats = Arc::new(PipelineStats::new());
        let (mut rx, handle) =
            start_job_producer(CancellationToken::new(), inputs(&["a", "b", "c"]), stats.clone());

        let mut seen = Vec::new();
        while let Some(job) = rx.recv().await {
            seen.push(job.input.to_string());
        }

        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(handle.join().await, 0);
        assert_eq!(stats.inputs_published(), 3);
    }

    #[tokio::test]
    async fn test_empty_inputs_close_immediately() {
        let stats = Arc::new(PipelineStats::new());
        let (mut rx, handle) = start_job_producer(CancellationToken::new(), Vec::new(), stats);

        assert!(rx.recv().await.is_none());
        handle.join().await;
    }

    #[tokio::test]
    async fn test_cancellation_stops_publishing() {
        let cancel = CancellationToken::new();
        let stats = Arc::new(PipelineStats::new());
        let (mut rx, handle) =
            start_job_producer(cancel.clone(), inputs(&["a", "b", "c", "d"]), stats.clone());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.input.as_str(), "a");

        cancel.cancel();
        handle.join().await;

        // At most the job already sitting in the queue can still arrive.
        let mut rest = 0;
        while rx.recv().await.is_some() {
            rest += 1;
        }
        assert!(rest <= 1);
        assert!(stats.inputs_published() <= 2);
    }
}
