//! Per-chunk line counting.

use crate::lines::chunk_lines;
use cf_error::TransformError;
use cf_traits::ChunkTransform;
use cf_types::InputId;

/// Emits one record per chunk: the number of lines it holds.
///
/// Summing the records of an input gives its line count; an unterminated last
/// line counts as a line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineCountTransform;

impl ChunkTransform<u64> for LineCountTransform {
    fn transform(&self, _input: &InputId, data: &[u8]) -> Result<Vec<u64>, TransformError> {
        Ok(vec![chunk_lines(data).count() as u64])
    }

    fn name(&self) -> &str {
        "line-count"
    }
}
