//! Integration tests for chunkflow.
//!
//! These run the full pipeline over real files on disk: plain and compressed
//! inputs, the built-in transforms, failure isolation and cancellation.
//!
//! The large-input test is `#[ignore]`d; run it with:
//!
//! ```bash
//! cargo test -p integration-tests -- --ignored
//! ```

mod common;
mod compression_test;
mod pipeline_test;
