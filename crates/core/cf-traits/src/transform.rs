//! Chunk transform trait.

use cf_error::TransformError;
use cf_types::InputId;

/// Turns the bytes of one chunk into an ordered list of records.
///
/// Transforms are called concurrently from independent processor workers on
/// tokio's blocking pool. Any mutable state must be synchronized by the
/// implementation itself.
///
/// Closures of the right shape implement this trait directly:
///
/// ```
/// use cf_error::TransformError;
/// use cf_traits::ChunkTransform;
/// use cf_types::InputId;
///
/// let count_lines = |_input: &InputId, data: &[u8]| -> Result<Vec<usize>, TransformError> {
///     Ok(vec![data.iter().filter(|b| **b == b'\n').count()])
/// };
/// let counts = count_lines.transform(&InputId::from("a.log"), b"x\ny\n").unwrap();
/// assert_eq!(counts, vec![2]);
/// ```
pub trait ChunkTransform<T>: Send + Sync {
    /// Transform one chunk. Records must keep the order of the lines they
    /// were produced from.
    fn transform(&self, input: &InputId, data: &[u8]) -> Result<Vec<T>, TransformError>;

    /// Transform name (for logging).
    fn name(&self) -> &str {
        "closure"
    }
}

impl<T, F> ChunkTransform<T> for F
where
    F: Fn(&InputId, &[u8]) -> Result<Vec<T>, TransformError> + Send + Sync,
{
    fn transform(&self, input: &InputId, data: &[u8]) -> Result<Vec<T>, TransformError> {
        self(input, data)
    }
}
