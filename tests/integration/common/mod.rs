//! Shared fixtures for integration tests.

pub mod fixtures;

pub use fixtures::{TestInputs, generate_log_lines, generate_ndjson_lines};
