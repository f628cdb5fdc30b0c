//! Chunk types produced by the splitter.

use crate::InputId;
use bytes::Bytes;

/// A bounded, line-respecting byte range of one input.
///
/// Indices start at 0 and increase by one per emitted chunk of the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk within its input
    pub index: u64,

    /// Raw bytes, including line terminators
    pub data: Bytes,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(index: u64, data: impl Into<Bytes>) -> Self {
        Self {
            index,
            data: data.into(),
        }
    }

    /// Number of payload bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A chunk bound to the input it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedChunk {
    /// Source input
    pub input: InputId,

    /// The chunk itself
    pub chunk: Chunk,
}

impl TaggedChunk {
    /// Tag a chunk with its input.
    pub fn new(input: InputId, chunk: Chunk) -> Self {
        Self { input, chunk }
    }
}
