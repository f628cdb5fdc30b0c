//! Shared utilities for chunkflow CLI binaries.

pub mod args;
pub mod format;
pub mod logging;

pub use args::{LogFormat, LogLevel};
pub use format::{format_bytes, format_duration, format_number};
pub use logging::init_logging;
