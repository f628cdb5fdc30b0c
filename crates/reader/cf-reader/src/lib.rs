//! cf-reader - Source reader and line writer for chunkflow.
//!
//! This crate opens pipeline inputs and writes pipeline output:
//!
//! - [`LocalSourceReader`] opens local files (or stdin for `-`), transparently
//!   decompressing gzip and zstd based on the file extension
//! - [`read_lines`] reads a whole source into a list of lines
//! - [`LineWriter`] writes lines to stdout or to a file, compressing by extension
//!
//! # Example
//!
//! ```ignore
//! use cf_reader::LocalSourceReader;
//! use cf_traits::SourceReader;
//!
//! let reader = LocalSourceReader::new().with_buffer_size(256 * 1024);
//! let stream = reader.open(&"logs/app.log.zst".into()).await?;
//! ```

pub mod compression;
pub mod lines;
pub mod source;
pub mod writer;

pub use compression::Compression;
pub use lines::read_lines;
pub use source::{DEFAULT_BUFFER_SIZE, LocalSourceReader};
pub use writer::{LineWriter, write_lines};
