//! Configuration types for the pipeline.

use serde::{Deserialize, Serialize};

/// Default maximum chunk size (4 MiB).
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Default read buffer size for opened sources (64 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of chunk workers (each owns one input at a time)
    pub chunk_workers: usize,

    /// Number of processor workers applying the transform
    pub processor_workers: usize,

    /// Upper bound for a chunk in bytes. A single line longer than this
    /// becomes its own oversized chunk.
    pub max_chunk_size: usize,

    /// Capacity of the chunk and batch queues between stages
    pub channel_buffer: usize,

    /// Read buffer size for opened sources
    pub read_buffer_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_workers: 2,
            processor_workers: num_cpus(),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            channel_buffer: 64,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of chunk workers.
    pub fn with_chunk_workers(mut self, count: usize) -> Self {
        self.chunk_workers = count;
        self
    }

    /// Set the number of processor workers.
    pub fn with_processor_workers(mut self, count: usize) -> Self {
        self.processor_workers = count;
        self
    }

    /// Set the maximum chunk size in bytes.
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// Set the queue capacity between stages.
    pub fn with_channel_buffer(mut self, size: usize) -> Self {
        self.channel_buffer = size;
        self
    }

    /// Set the source read buffer size.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_workers == 0 {
            return Err("chunk_workers must be at least 1".to_string());
        }
        if self.processor_workers == 0 {
            return Err("processor_workers must be at least 1".to_string());
        }
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be at least 1".to_string());
        }
        if self.channel_buffer == 0 {
            return Err("channel_buffer must be at least 1".to_string());
        }
        if self.read_buffer_size == 0 {
            return Err("read_buffer_size must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Get the number of available CPUs.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
