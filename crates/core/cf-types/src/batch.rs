//! Processed batches and per-input failure reports.

use crate::InputId;
use cf_error::{PipelineError, TransformError};

/// Transform output for one chunk.
///
/// Carries the chunk's identity so the reassembler can restore order.
/// Records keep the order in which they appeared in the chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedBatch<T> {
    /// Source input
    pub input: InputId,

    /// Index of the chunk these records came from
    pub chunk_index: u64,

    /// Records produced by the transform, or the reason it failed
    pub records: Result<Vec<T>, TransformError>,
}

impl<T> ProcessedBatch<T> {
    /// Create a successful batch.
    pub fn ok(input: InputId, chunk_index: u64, records: Vec<T>) -> Self {
        Self {
            input,
            chunk_index,
            records: Ok(records),
        }
    }

    /// Create a failed batch.
    pub fn failed(input: InputId, chunk_index: u64, error: TransformError) -> Self {
        Self {
            input,
            chunk_index,
            records: Err(error),
        }
    }

    /// Whether the transform failed on this chunk.
    pub fn is_err(&self) -> bool {
        self.records.is_err()
    }
}

/// An input that was abandoned because it could not be opened or read.
#[derive(Debug)]
pub struct SourceFailure {
    /// The input that failed
    pub input: InputId,

    /// Why it failed (an open or read error)
    pub error: PipelineError,
}

impl SourceFailure {
    /// Create a new failure report.
    pub fn new(input: InputId, error: impl Into<PipelineError>) -> Self {
        Self {
            input,
            error: error.into(),
        }
    }
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.input, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_error::OpenError;

    #[test]
    fn test_processed_batch_constructors() {
        let ok = ProcessedBatch::ok(InputId::from("a"), 2, vec![1, 2, 3]);
        assert!(!ok.is_err());
        assert_eq!(ok.chunk_index, 2);

        let failed: ProcessedBatch<u32> = ProcessedBatch::failed(
            InputId::from("a"),
            3,
            TransformError::Failed("bad".to_string()),
        );
        assert!(failed.is_err());
    }

    #[test]
    fn test_source_failure_display() {
        let failure = SourceFailure::new(
            InputId::from("missing.log"),
            OpenError::NotFound("missing.log".to_string()),
        );
        assert_eq!(
            failure.to_string(),
            "missing.log: Open error: File not found: missing.log"
        );
    }
}
