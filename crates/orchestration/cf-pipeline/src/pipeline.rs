//! Pipeline orchestration: producer, chunk workers, processors, reassembly.

use crate::chunk_workers::ChunkWorkerPool;
use crate::config::PipelineConfig;
use crate::processors::ChunkProcessorPool;
use crate::producer::start_job_producer;
use crate::reassembler::OrderedReassembler;
use crate::stage::StageHandle;
use crate::stats::{PipelineStats, StatsSnapshot};
use cf_error::{ErrorCategory, PipelineError, Result, classify_error};
use cf_traits::{ChunkTransform, RecordSink, SourceReader};
use cf_types::{InputId, ProcessedBatch, SourceFailure};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Result of [`Pipeline::collect`].
#[derive(Debug)]
pub struct PipelineOutput<T> {
    /// Records of every input that completed, in source order
    pub records: HashMap<InputId, Vec<T>>,

    /// Inputs abandoned because they could not be opened or read
    pub failures: Vec<SourceFailure>,

    /// Statistics at the end of the run
    pub stats: StatsSnapshot,
}

impl<T> PipelineOutput<T> {
    /// Whether every input completed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of [`Pipeline::stream`].
#[derive(Debug)]
pub struct PipelineReport {
    /// Inputs abandoned because they could not be opened or read.
    ///
    /// Records of such an input that were produced before it failed have
    /// already been written to the sink.
    pub failures: Vec<SourceFailure>,

    /// Statistics at the end of the run
    pub stats: StatsSnapshot,
}

impl PipelineReport {
    /// Whether every input completed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The upstream stages of one pipeline run.
struct RunningStages {
    failures: mpsc::UnboundedReceiver<SourceFailure>,
    handles: Vec<StageHandle>,
}

/// What the upstream stages reported once they all exited.
struct StageOutcome {
    /// Inputs abandoned on an open or read error
    failures: Vec<SourceFailure>,

    /// First error that invalidates the whole run
    fatal: Option<PipelineError>,
}

impl RunningStages {
    /// Wait for every stage and gather the input failures.
    ///
    /// A panicked task may have taken a claimed input down with it, so any
    /// panic makes the run fatal.
    ///
    /// Only call once the batch queue is closed or dropped, or the run token
    /// is cancelled; otherwise the stages never finish.
    async fn shutdown(mut self) -> StageOutcome {
        let mut fatal = None;
        for handle in self.handles {
            let stage = handle.name();
            let panicked = handle.join().await;
            if panicked > 0 && fatal.is_none() {
                fatal = Some(PipelineError::StagePanicked {
                    stage: stage.to_string(),
                    tasks: panicked,
                });
            }
        }

        let mut failures = Vec::new();
        while let Ok(failure) = self.failures.try_recv() {
            match classify_error(&failure.error) {
                ErrorCategory::InputLocal => failures.push(failure),
                ErrorCategory::Fatal => {
                    if fatal.is_none() {
                        fatal = Some(failure.error);
                    }
                }
            }
        }
        StageOutcome { failures, fatal }
    }
}

/// Combine the reassembler's result with what the stages reported.
///
/// A stage error explains a cancellation it caused, so it wins over
/// `Cancelled`; any other reassembly error is kept.
fn settle<R>(result: Result<R>, fatal: Option<PipelineError>) -> Result<R> {
    match (result, fatal) {
        (Err(e), _) if !matches!(e, PipelineError::Cancelled) => Err(e),
        (_, Some(fatal)) => Err(fatal),
        (result, None) => result,
    }
}

/// Splits inputs into chunks, transforms them in parallel and hands back
/// each input's records in source order.
///
/// An input that cannot be opened or read is abandoned and reported; the rest
/// of the run continues. Any other error (a failed transform, a sink error, a
/// duplicate or missing chunk, a panicked stage task) stops the whole run:
/// every stage is cancelled and the error is returned once all tasks have
/// exited.
pub struct Pipeline {
    config: PipelineConfig,
    reader: Arc<dyn SourceReader>,
    cancel: CancellationToken,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    /// Create a pipeline reading inputs through `reader`.
    pub fn new(config: PipelineConfig, reader: Arc<dyn SourceReader>) -> Result<Self> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self {
            config,
            reader,
            cancel: CancellationToken::new(),
            stats: Arc::new(PipelineStats::new()),
        })
    }

    /// Stop runs when `token` is cancelled.
    ///
    /// Each run works on a child of this token, so a run failing never
    /// cancels the caller's token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Live statistics, shared with every stage.
    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    /// Run every input through `transform` and collect the records.
    ///
    /// Records of inputs listed in `failures` are not included. Inputs that
    /// completed without producing records map to an empty list.
    pub async fn collect<T>(
        &self,
        inputs: Vec<InputId>,
        transform: Arc<dyn ChunkTransform<T>>,
    ) -> Result<PipelineOutput<T>>
    where
        T: Send + 'static,
    {
        check_unique(&inputs)?;
        let run = self.cancel.child_token();
        let (batches, stages) = self.launch(inputs.clone(), transform, run.clone());

        let result = OrderedReassembler::new()
            .with_stats(Arc::clone(&self.stats))
            .collect(&run, batches)
            .await;
        if result.is_err() {
            run.cancel();
        }
        let StageOutcome { failures, fatal } = stages.shutdown().await;
        self.stats.complete();

        let mut records =
            settle(result, fatal).inspect_err(|e| warn!(error = %e, "Pipeline run failed"))?;

        let failed: HashSet<&InputId> = failures.iter().map(|f| &f.input).collect();
        records.retain(|input, _| !failed.contains(input));
        for input in inputs {
            if !failed.contains(&input) {
                records.entry(input).or_default();
            }
        }

        let stats = self.stats.snapshot();
        log_completion(&stats, failures.len());
        Ok(PipelineOutput {
            records,
            failures,
            stats,
        })
    }

    /// Run every input through `transform` and write records to `sink` as
    /// soon as they are in order.
    pub async fn stream<T, S>(
        &self,
        inputs: Vec<InputId>,
        transform: Arc<dyn ChunkTransform<T>>,
        sink: &mut S,
    ) -> Result<PipelineReport>
    where
        T: Send + 'static,
        S: RecordSink<T> + ?Sized,
    {
        check_unique(&inputs)?;
        let run = self.cancel.child_token();
        let (batches, stages) = self.launch(inputs, transform, run.clone());

        let result = OrderedReassembler::new()
            .with_stats(Arc::clone(&self.stats))
            .stream(&run, batches, sink)
            .await;
        if result.is_err() {
            run.cancel();
        }
        let StageOutcome { failures, fatal } = stages.shutdown().await;
        self.stats.complete();

        settle(result, fatal).inspect_err(|e| warn!(error = %e, "Pipeline run failed"))?;

        let stats = self.stats.snapshot();
        log_completion(&stats, failures.len());
        Ok(PipelineReport { failures, stats })
    }

    fn launch<T>(
        &self,
        inputs: Vec<InputId>,
        transform: Arc<dyn ChunkTransform<T>>,
        run: CancellationToken,
    ) -> (mpsc::Receiver<ProcessedBatch<T>>, RunningStages)
    where
        T: Send + 'static,
    {
        info!(
            inputs = inputs.len(),
            chunk_workers = self.config.chunk_workers,
            processors = self.config.processor_workers,
            max_chunk_size = self.config.max_chunk_size,
            transform = transform.name(),
            "Starting pipeline"
        );

        let (jobs, producer) = start_job_producer(run.clone(), inputs, Arc::clone(&self.stats));

        let chunk_pool =
            ChunkWorkerPool::new(Arc::clone(&self.reader), &self.config, Arc::clone(&self.stats));
        let chunked = chunk_pool.spawn(run.clone(), jobs);

        let processor_pool =
            ChunkProcessorPool::new(transform, &self.config, Arc::clone(&self.stats));
        let (batches, processors) = processor_pool.spawn(run, chunked.chunks);

        let stages = RunningStages {
            failures: chunked.failures,
            handles: vec![producer, chunked.handle, processors],
        };
        (batches, stages)
    }
}

/// The same input twice would produce colliding chunk indices.
fn check_unique(inputs: &[InputId]) -> Result<()> {
    let mut seen = HashSet::with_capacity(inputs.len());
    for input in inputs {
        if !seen.insert(input) {
            return Err(PipelineError::Config(format!("duplicate input: {}", input)));
        }
    }
    Ok(())
}

fn log_completion(stats: &StatsSnapshot, failed: usize) {
    info!(
        inputs = stats.inputs_published,
        failed,
        chunks = stats.chunks_delivered,
        records = stats.records_delivered,
        bytes = stats.bytes_read,
        "Pipeline completed"
    );
}
