//! cf-pipeline - Concurrent, order-preserving chunk pipeline.
//!
//! Inputs are split into line-aligned chunks by a pool of chunk workers,
//! transformed in parallel by a pool of processors, and reassembled so each
//! input's records come back in source order:
//!
//! - Job producer: one job per input, handed out on demand
//! - Chunk workers: open an input, split it, emit tagged chunks
//! - Processors: run a [`ChunkTransform`](cf_traits::ChunkTransform) on the
//!   blocking thread pool
//! - Reassembler: restores per-input order, collecting or streaming
//!
//! All queues are bounded, so a slow consumer stalls the stages behind it.
//! An input that cannot be opened or read is reported and skipped; any other
//! error stops the run.
//!
//! # Example
//!
//! ```ignore
//! use cf_pipeline::{Pipeline, PipelineConfig};
//! use cf_reader::LocalSourceReader;
//!
//! let config = PipelineConfig::new()
//!     .with_chunk_workers(2)
//!     .with_max_chunk_size(1024 * 1024);
//!
//! let pipeline = Pipeline::new(config, Arc::new(LocalSourceReader::new()))?;
//! let output = pipeline.collect(inputs, Arc::new(LinesTransform::new())).await?;
//!
//! eprintln!("{} records, {} failed inputs", output.stats.records_delivered, output.failures.len());
//! ```

pub mod chunk_workers;
pub mod config;
pub mod pipeline;
pub mod processors;
pub mod producer;
pub mod queue;
pub mod reassembler;
pub mod splitter;
pub mod stage;
pub mod stats;

pub use chunk_workers::{ChunkWorkerOutput, ChunkWorkerPool};
pub use config::{DEFAULT_MAX_CHUNK_SIZE, DEFAULT_READ_BUFFER_SIZE, PipelineConfig};
pub use pipeline::{Pipeline, PipelineOutput, PipelineReport};
pub use processors::ChunkProcessorPool;
pub use producer::start_job_producer;
pub use queue::SharedReceiver;
pub use reassembler::{OrderedReassembler, collect_ordered, stream_ordered};
pub use splitter::{ChunkSplitter, LineChunker};
pub use stage::StageHandle;
pub use stats::{PipelineStats, StatsSnapshot};
