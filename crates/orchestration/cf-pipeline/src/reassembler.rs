//! Ordered reassembly of processed batches.
//!
//! Batches arrive in whatever order the processors finish them. The
//! reassembler keeps, per input, the index of the next chunk it may release
//! and parks everything that arrives early. A batch is released only when all
//! lower indices of the same input have been released, so records of one input
//! are always delivered in source order. Inputs are independent of each other.

use crate::stats::PipelineStats;
use cf_error::{PipelineError, Result};
use cf_traits::RecordSink;
use cf_types::{InputId, ProcessedBatch};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Per-input progress.
#[derive(Debug)]
struct InputProgress<T> {
    next_expected: u64,
    pending: BTreeMap<u64, Vec<T>>,
}

impl<T> Default for InputProgress<T> {
    fn default() -> Self {
        Self {
            next_expected: 0,
            pending: BTreeMap::new(),
        }
    }
}

/// Restores per-input chunk order.
#[derive(Debug)]
pub struct OrderedReassembler<T> {
    inputs: HashMap<InputId, InputProgress<T>>,
    stats: Option<Arc<PipelineStats>>,
}

impl<T> Default for OrderedReassembler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderedReassembler<T> {
    pub fn new() -> Self {
        Self {
            inputs: HashMap::new(),
            stats: None,
        }
    }

    /// Count delivered chunks and records into `stats`.
    pub fn with_stats(mut self, stats: Arc<PipelineStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Accept one batch and return the record lists that became deliverable,
    /// in chunk order.
    ///
    /// A failed batch is returned as [`PipelineError::Transform`]. A chunk
    /// index that was already delivered or is already parked is rejected with
    /// [`PipelineError::DuplicateChunk`]. A batch with no records still
    /// advances the input.
    pub fn accept(&mut self, batch: ProcessedBatch<T>) -> Result<Vec<Vec<T>>> {
        let ProcessedBatch {
            input,
            chunk_index,
            records,
        } = batch;

        let records = records.map_err(|source| PipelineError::Transform {
            input: input.to_string(),
            chunk_index,
            source,
        })?;

        let progress = self.inputs.entry(input.clone()).or_default();
        if chunk_index < progress.next_expected || progress.pending.contains_key(&chunk_index) {
            return Err(PipelineError::DuplicateChunk {
                input: input.to_string(),
                chunk_index,
            });
        }
        progress.pending.insert(chunk_index, records);

        let mut ready = Vec::new();
        while let Some(records) = progress.pending.remove(&progress.next_expected) {
            progress.next_expected += 1;
            if let Some(stats) = &self.stats {
                stats.record_chunk_delivered(records.len() as u64);
            }
            ready.push(records);
        }
        Ok(ready)
    }

    /// Index of the next chunk `input` is waiting for.
    pub fn next_expected(&self, input: &InputId) -> u64 {
        self.inputs.get(input).map_or(0, |p| p.next_expected)
    }

    /// Number of batches parked for `input`.
    pub fn pending(&self, input: &InputId) -> usize {
        self.inputs.get(input).map_or(0, |p| p.pending.len())
    }

    /// Check that nothing is left parked once the batch queue has closed.
    ///
    /// A parked batch means some lower index never arrived, which is reported
    /// as [`PipelineError::Incomplete`].
    pub fn finish(&self) -> Result<()> {
        let mut stuck: Vec<_> = self
            .inputs
            .iter()
            .filter(|(_, p)| !p.pending.is_empty())
            .collect();
        stuck.sort_by(|a, b| a.0.cmp(b.0));

        match stuck.first() {
            None => Ok(()),
            Some((input, progress)) => Err(PipelineError::Incomplete {
                input: input.to_string(),
                next_expected: progress.next_expected,
                pending: progress.pending.len(),
            }),
        }
    }
}

impl<T: Send + 'static> OrderedReassembler<T> {
    /// Drain `batches` and collect every input's records in order.
    ///
    /// Stops with the first error: a failed batch, a duplicate, a gap left at
    /// close, or cancellation. The caller is expected to cancel the upstream
    /// stages when an error is returned.
    pub async fn collect(
        mut self,
        cancel: &CancellationToken,
        mut batches: mpsc::Receiver<ProcessedBatch<T>>,
    ) -> Result<HashMap<InputId, Vec<T>>> {
        let mut results: HashMap<InputId, Vec<T>> = HashMap::new();

        loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                batch = batches.recv() => batch,
            };
            let Some(batch) = batch else { break };

            let input = batch.input.clone();
            let ready = self.accept(batch)?;
            if !ready.is_empty() {
                let out = results.entry(input).or_default();
                for records in ready {
                    out.extend(records);
                }
            }
        }

        self.finish()?;
        debug!(inputs = results.len(), "Reassembly complete");
        Ok(results)
    }

    /// Drain `batches` and write each input's records to `sink` in order.
    ///
    /// Records are written as soon as they become deliverable. On success the
    /// sink is finished; on error it is left as is.
    pub async fn stream<S>(
        mut self,
        cancel: &CancellationToken,
        mut batches: mpsc::Receiver<ProcessedBatch<T>>,
        sink: &mut S,
    ) -> Result<()>
    where
        S: RecordSink<T> + ?Sized,
    {
        loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                batch = batches.recv() => batch,
            };
            let Some(batch) = batch else { break };

            let input = batch.input.clone();
            let ready = self.accept(batch)?;
            for records in ready {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                    written = sink.write(&input, records) => {
                        if let Err(e) = written {
                            error!(input = %input, error = %e, "Sink write failed");
                            return Err(e.into());
                        }
                    }
                }
            }
        }

        self.finish()?;
        sink.finish().await?;
        debug!("Reassembly stream complete");
        Ok(())
    }
}

/// Collect every input's records in order. See [`OrderedReassembler::collect`].
pub async fn collect_ordered<T: Send + 'static>(
    cancel: &CancellationToken,
    batches: mpsc::Receiver<ProcessedBatch<T>>,
) -> Result<HashMap<InputId, Vec<T>>> {
    OrderedReassembler::new().collect(cancel, batches).await
}

/// Stream every input's records in order. See [`OrderedReassembler::stream`].
pub async fn stream_ordered<T, S>(
    cancel: &CancellationToken,
    batches: mpsc::Receiver<ProcessedBatch<T>>,
    sink: &mut S,
) -> Result<()>
where
    T: Send + 'static,
    S: RecordSink<T> + ?Sized,
{
    OrderedReassembler::new().stream(cancel, batches, sink).await
}
