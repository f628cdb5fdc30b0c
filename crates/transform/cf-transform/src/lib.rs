//! Built-in chunk transforms.
//!
//! - [`LinesTransform`]: one `String` per line
//! - [`LineCountTransform`]: one line count per chunk
//! - [`NdjsonTransform`]: one `serde_json::Value` per non-blank line
//!
//! Every transform implements [`ChunkTransform`](cf_traits::ChunkTransform)
//! and its records implement [`RenderLine`] for line-oriented output.

mod config;
mod count;
mod lines;
mod ndjson;
mod render;

pub use config::{ErrorPolicy, TransformKind};
pub use count::LineCountTransform;
pub use lines::{LinesTransform, chunk_lines};
pub use ndjson::NdjsonTransform;
pub use render::RenderLine;
