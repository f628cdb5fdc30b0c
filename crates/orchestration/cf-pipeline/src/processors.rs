//! Processor pool: runs the transform on chunks.

use crate::config::PipelineConfig;
use crate::queue::SharedReceiver;
use crate::stage::StageHandle;
use crate::stats::PipelineStats;
use cf_error::TransformError;
use cf_traits::ChunkTransform;
use cf_types::{ProcessedBatch, TaggedChunk};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A pool of workers applying a [`ChunkTransform`] to chunks.
///
/// The transform runs on the blocking thread pool. A transform that fails or
/// panics yields a failed [`ProcessedBatch`] rather than stopping the pool;
/// the reassembler decides what a failure means. Output order across workers
/// is arbitrary.
pub struct ChunkProcessorPool<T> {
    transform: Arc<dyn ChunkTransform<T>>,
    worker_count: usize,
    channel_buffer: usize,
    stats: Arc<PipelineStats>,
}

impl<T: Send + 'static> ChunkProcessorPool<T> {
    pub fn new(
        transform: Arc<dyn ChunkTransform<T>>,
        config: &PipelineConfig,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            transform,
            worker_count: config.processor_workers.max(1),
            channel_buffer: config.channel_buffer.max(1),
            stats,
        }
    }

    /// Start the workers on `chunks`.
    ///
    /// The batch queue closes once the chunk queue is drained or `cancel`
    /// fires.
    pub fn spawn(
        &self,
        cancel: CancellationToken,
        chunks: mpsc::Receiver<TaggedChunk>,
    ) -> (mpsc::Receiver<ProcessedBatch<T>>, StageHandle) {
        let (tx, rx) = mpsc::channel(self.channel_buffer);
        let chunks = SharedReceiver::new(chunks);

        let tasks = (0..self.worker_count)
            .map(|worker_id| {
                let transform = Arc::clone(&self.transform);
                let stats = Arc::clone(&self.stats);
                let chunks = chunks.clone();
                let tx = tx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    process_chunks(worker_id, transform, chunks, tx, stats, cancel).await;
                })
            })
            .collect();

        info!(
            workers = self.worker_count,
            transform = self.transform.name(),
            "Started chunk processors"
        );

        (rx, StageHandle::new("processors", tasks))
    }
}

async fn process_chunks<T: Send + 'static>(
    worker_id: usize,
    transform: Arc<dyn ChunkTransform<T>>,
    chunks: SharedReceiver<TaggedChunk>,
    batches: mpsc::Sender<ProcessedBatch<T>>,
    stats: Arc<PipelineStats>,
    cancel: CancellationToken,
) {
    loop {
        let TaggedChunk { input, chunk } = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = chunks.recv() => match next {
                Some(tagged) => tagged,
                None => break,
            },
        };
        let chunk_index = chunk.index;

        let job = {
            let transform = Arc::clone(&transform);
            let input = input.clone();
            tokio::task::spawn_blocking(move || transform.transform(&input, &chunk.data))
        };

        // A running transform cannot be interrupted; on cancellation its
        // result is simply discarded.
        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            joined = job => joined,
        };

        let records = match joined {
            Ok(records) => records,
            Err(e) => Err(TransformError::Panicked(e.to_string())),
        };

        if let Err(e) = &records {
            warn!(
                worker = worker_id,
                input = %input,
                chunk = chunk_index,
                error = %e,
                "Transform failed"
            );
        }
        stats.record_chunk_processed(records.is_err());

        let batch = ProcessedBatch {
            input,
            chunk_index,
            records,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = batches.send(batch) => {
                if sent.is_err() {
                    debug!(worker = worker_id, "Batch queue closed");
                    break;
                }
            }
        }
    }
    debug!(worker = worker_id, "Processor exiting");
}
