//! Chunk worker pool: opens inputs and splits them into tagged chunks.

use crate::config::PipelineConfig;
use crate::queue::SharedReceiver;
use crate::splitter::ChunkSplitter;
use crate::stage::StageHandle;
use crate::stats::PipelineStats;
use cf_error::{ErrorCategory, PipelineError, ReadError, classify_error};
use cf_traits::SourceReader;
use cf_types::{Job, SourceFailure, TaggedChunk};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Queues produced by [`ChunkWorkerPool::spawn`].
pub struct ChunkWorkerOutput {
    /// Chunks of every input, interleaved across inputs
    pub chunks: mpsc::Receiver<TaggedChunk>,

    /// One entry per input abandoned on an open or read error
    pub failures: mpsc::UnboundedReceiver<SourceFailure>,

    /// The worker tasks
    pub handle: StageHandle,
}

/// How one input ended.
enum InputOutcome {
    Completed { chunks: u64, bytes: u64 },
    Stopped,
}

/// A pool of workers that each take one input at a time, open it, and emit
/// its chunks in index order.
///
/// An input that fails to open or read is reported on the failure queue and
/// the worker moves on to the next job. Any other error is reported the same
/// way but also cancels the run. The chunk queue closes once every worker
/// has exited.
pub struct ChunkWorkerPool {
    reader: Arc<dyn SourceReader>,
    worker_count: usize,
    max_chunk_size: usize,
    channel_buffer: usize,
    stats: Arc<PipelineStats>,
}

impl ChunkWorkerPool {
    pub fn new(
        reader: Arc<dyn SourceReader>,
        config: &PipelineConfig,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            reader,
            worker_count: config.chunk_workers.max(1),
            max_chunk_size: config.max_chunk_size,
            channel_buffer: config.channel_buffer.max(1),
            stats,
        }
    }

    /// Start the workers on `jobs`.
    pub fn spawn(&self, cancel: CancellationToken, jobs: mpsc::Receiver<Job>) -> ChunkWorkerOutput {
        let (chunk_tx, chunk_rx) = mpsc::channel(self.channel_buffer);
        let (failure_tx, failure_rx) = mpsc::unbounded_channel();
        let jobs = SharedReceiver::new(jobs);

        let tasks = (0..self.worker_count)
            .map(|worker_id| {
                let worker = ChunkWorker {
                    id: worker_id,
                    reader: Arc::clone(&self.reader),
                    max_chunk_size: self.max_chunk_size,
                    chunks: chunk_tx.clone(),
                    failures: failure_tx.clone(),
                    stats: Arc::clone(&self.stats),
                    cancel: cancel.clone(),
                };
                let jobs = jobs.clone();
                tokio::spawn(async move { worker.run(jobs).await })
            })
            .collect();

        info!(
            workers = self.worker_count,
            max_chunk_size = self.max_chunk_size,
            "Started chunk workers"
        );

        ChunkWorkerOutput {
            chunks: chunk_rx,
            failures: failure_rx,
            handle: StageHandle::new("chunk-workers", tasks),
        }
    }
}

struct ChunkWorker {
    id: usize,
    reader: Arc<dyn SourceReader>,
    max_chunk_size: usize,
    chunks: mpsc::Sender<TaggedChunk>,
    failures: mpsc::UnboundedSender<SourceFailure>,
    stats: Arc<PipelineStats>,
    cancel: CancellationToken,
}

impl ChunkWorker {
    async fn run(self, jobs: SharedReceiver<Job>) {
        loop {
            let job = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                job = jobs.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            match self.split_input(&job).await {
                Ok(InputOutcome::Completed { chunks, bytes }) => {
                    self.stats.record_input_completed();
                    debug!(worker = self.id, input = %job.input, chunks, bytes, "Input split");
                }
                Ok(InputOutcome::Stopped) => break,
                Err(e) => {
                    self.stats.record_input_failed();
                    let fatal = classify_error(&e) == ErrorCategory::Fatal;
                    if fatal {
                        error!(worker = self.id, input = %job.input, error = %e, "Stopping run");
                    } else {
                        warn!(worker = self.id, input = %job.input, error = %e, "Abandoning input");
                    }
                    // The receiver only goes away when the run is over.
                    let _ = self.failures.send(SourceFailure::new(job.input, e));
                    if fatal {
                        self.cancel.cancel();
                        break;
                    }
                }
            }
        }
        debug!(worker = self.id, "Chunk worker exiting");
    }

    /// Open one input and push all of its chunks downstream.
    ///
    /// The source is dropped on every exit path before the next job is taken.
    async fn split_input(&self, job: &Job) -> Result<InputOutcome, PipelineError> {
        let stream = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(InputOutcome::Stopped),
            opened = self.reader.open(&job.input) => opened?,
        };
        let compressed = stream.is_compressed();
        let mut splitter = ChunkSplitter::new(stream, self.max_chunk_size)?;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(InputOutcome::Stopped),
                next = splitter.next_chunk() => next,
            };
            let chunk = match next {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => return Err(ReadError::from_io(&job.input, &e, compressed).into()),
            };

            self.stats.record_chunk_emitted(chunk.len() as u64);
            let tagged = TaggedChunk::new(job.input.clone(), chunk);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(InputOutcome::Stopped),
                sent = self.chunks.send(tagged) => {
                    if sent.is_err() {
                        debug!(worker = self.id, "Chunk queue closed");
                        return Ok(InputOutcome::Stopped);
                    }
                }
            }
        }

        Ok(InputOutcome::Completed {
            chunks: splitter.chunks_emitted(),
            bytes: splitter.bytes_read(),
        })
    }
}
