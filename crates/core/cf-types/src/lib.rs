//! Core types for chunkflow.
//!
//! This crate provides the values that move between pipeline stages:
//! - [`InputId`] / [`Job`] - Identifier of one input stream and the job claiming it
//! - [`Chunk`] / [`TaggedChunk`] - Line-respecting byte ranges of an input
//! - [`ProcessedBatch`] - Transform output for one chunk, keyed for reordering
//! - [`SourceFailure`] - Report for an input that was abandoned

pub mod batch;
pub mod chunk;
pub mod job;

pub use batch::*;
pub use chunk::*;
pub use job::*;
