//! Core traits for chunkflow.
//!
//! This crate defines the seams between the pipeline and its collaborators:
//! - [`SourceReader`] - Opens an input into a (possibly decompressed) byte stream
//! - [`ChunkTransform`] - Turns one chunk of bytes into ordered records
//! - [`RecordSink`] - Consumes ordered records in streaming mode

pub mod reader;
pub mod sink;
pub mod transform;

pub use reader::*;
pub use sink::*;
pub use transform::*;
