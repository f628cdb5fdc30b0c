//! Statistics for pipeline runs.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache line size on most modern CPUs (64 bytes).
const CACHE_LINE_SIZE: usize = 64;

/// A cache-line-padded atomic counter.
///
/// Chunk workers and processors bump different counters from different
/// threads; padding keeps each counter on its own cache line.
#[repr(C, align(64))]
#[derive(Debug)]
struct PaddedAtomicU64 {
    value: AtomicU64,
    _padding: [u8; CACHE_LINE_SIZE - std::mem::size_of::<AtomicU64>()],
}

impl Default for PaddedAtomicU64 {
    fn default() -> Self {
        Self {
            value: AtomicU64::new(0),
            _padding: [0; CACHE_LINE_SIZE - std::mem::size_of::<AtomicU64>()],
        }
    }
}

impl PaddedAtomicU64 {
    #[inline]
    fn load(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    fn add(&self, val: u64) {
        self.value.fetch_add(val, Ordering::Relaxed);
    }
}

/// Live counters shared by every stage of a pipeline.
///
/// Counters only grow. They are cumulative across runs of the same
/// [`Pipeline`](crate::Pipeline).
#[derive(Debug)]
pub struct PipelineStats {
    started_at: DateTime<Utc>,

    /// When the last run finished
    completed_at: Mutex<Option<DateTime<Utc>>>,

    /// Jobs handed to chunk workers
    inputs_published: PaddedAtomicU64,

    /// Inputs split to the end
    inputs_completed: PaddedAtomicU64,

    /// Inputs abandoned because of an open or read error
    inputs_failed: PaddedAtomicU64,

    /// Chunks emitted by the splitters
    chunks_emitted: PaddedAtomicU64,

    /// Bytes (after decompression) placed into chunks
    bytes_read: PaddedAtomicU64,

    /// Chunks the transform ran on
    chunks_processed: PaddedAtomicU64,

    /// Chunks on which the transform failed
    transform_failures: PaddedAtomicU64,

    /// Chunks released in order by the reassembler
    chunks_delivered: PaddedAtomicU64,

    /// Records released in order by the reassembler
    records_delivered: PaddedAtomicU64,
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            completed_at: Mutex::new(None),
            inputs_published: PaddedAtomicU64::default(),
            inputs_completed: PaddedAtomicU64::default(),
            inputs_failed: PaddedAtomicU64::default(),
            chunks_emitted: PaddedAtomicU64::default(),
            bytes_read: PaddedAtomicU64::default(),
            chunks_processed: PaddedAtomicU64::default(),
            transform_failures: PaddedAtomicU64::default(),
            chunks_delivered: PaddedAtomicU64::default(),
            records_delivered: PaddedAtomicU64::default(),
        }
    }

    /// Mark the current run as complete.
    pub fn complete(&self) {
        *self.completed_at.lock() = Some(Utc::now());
    }

    pub fn record_input_published(&self) {
        self.inputs_published.add(1);
    }

    pub fn record_input_completed(&self) {
        self.inputs_completed.add(1);
    }

    pub fn record_input_failed(&self) {
        self.inputs_failed.add(1);
    }

    /// Record one emitted chunk of `bytes` bytes.
    pub fn record_chunk_emitted(&self, bytes: u64) {
        self.chunks_emitted.add(1);
        self.bytes_read.add(bytes);
    }

    /// Record one transform invocation.
    pub fn record_chunk_processed(&self, failed: bool) {
        self.chunks_processed.add(1);
        if failed {
            self.transform_failures.add(1);
        }
    }

    /// Record one chunk released in order, carrying `records` records.
    pub fn record_chunk_delivered(&self, records: u64) {
        self.chunks_delivered.add(1);
        self.records_delivered.add(records);
    }

    pub fn inputs_published(&self) -> u64 {
        self.inputs_published.load()
    }

    pub fn inputs_completed(&self) -> u64 {
        self.inputs_completed.load()
    }

    pub fn inputs_failed(&self) -> u64 {
        self.inputs_failed.load()
    }

    pub fn chunks_emitted(&self) -> u64 {
        self.chunks_emitted.load()
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load()
    }

    pub fn chunks_processed(&self) -> u64 {
        self.chunks_processed.load()
    }

    pub fn transform_failures(&self) -> u64 {
        self.transform_failures.load()
    }

    pub fn chunks_delivered(&self) -> u64 {
        self.chunks_delivered.load()
    }

    pub fn records_delivered(&self) -> u64 {
        self.records_delivered.load()
    }

    /// Time since the tracker was created, or until completion if complete.
    pub fn duration(&self) -> Duration {
        let end = (*self.completed_at.lock()).unwrap_or_else(Utc::now);
        end - self.started_at
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started_at: self.started_at,
            completed_at: *self.completed_at.lock(),
            inputs_published: self.inputs_published(),
            inputs_completed: self.inputs_completed(),
            inputs_failed: self.inputs_failed(),
            chunks_emitted: self.chunks_emitted(),
            bytes_read: self.bytes_read(),
            chunks_processed: self.chunks_processed(),
            transform_failures: self.transform_failures(),
            chunks_delivered: self.chunks_delivered(),
            records_delivered: self.records_delivered(),
        }
    }
}

/// A serializable snapshot of pipeline statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub inputs_published: u64,
    pub inputs_completed: u64,
    pub inputs_failed: u64,
    pub chunks_emitted: u64,
    pub bytes_read: u64,
    pub chunks_processed: u64,
    pub transform_failures: u64,
    pub chunks_delivered: u64,
    pub records_delivered: u64,
}

impl StatsSnapshot {
    /// Get the run duration, if the run completed.
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }

    /// Get the run duration in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration().map(|d| d.num_milliseconds() as f64 / 1000.0)
    }

    /// Read throughput in MB per second (decompressed bytes).
    pub fn read_throughput_mbps(&self) -> Option<f64> {
        self.duration_secs().map(|secs| {
            if secs > 0.0 {
                (self.bytes_read as f64 / 1_000_000.0) / secs
            } else {
                0.0
            }
        })
    }

    /// Records delivered per second.
    pub fn records_per_second(&self) -> Option<f64> {
        self.duration_secs().map(|secs| {
            if secs > 0.0 {
                self.records_delivered as f64 / secs
            } else {
                0.0
            }
        })
    }
}
