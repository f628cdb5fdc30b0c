//! Newline-delimited JSON transform.

use crate::config::ErrorPolicy;
use crate::lines::chunk_lines;
use cf_error::TransformError;
use cf_traits::ChunkTransform;
use cf_types::InputId;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Parses each non-blank line of a chunk as a JSON value.
///
/// Line numbers in errors are 1-based within the chunk.
#[derive(Debug, Default)]
pub struct NdjsonTransform {
    policy: ErrorPolicy,
    dropped: AtomicU64,
}

impl NdjsonTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set what happens to a malformed line.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Lines dropped under [`ErrorPolicy::Drop`] so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl ChunkTransform<Value> for NdjsonTransform {
    fn transform(&self, input: &InputId, data: &[u8]) -> Result<Vec<Value>, TransformError> {
        let mut records = Vec::new();
        for (i, line) in chunk_lines(data).enumerate() {
            if line.trim_ascii().is_empty() {
                continue;
            }
            match serde_json::from_slice::<Value>(line) {
                Ok(value) => records.push(value),
                Err(e) => match self.policy {
                    ErrorPolicy::Fail => {
                        return Err(TransformError::Parse {
                            line: i + 1,
                            message: e.to_string(),
                        });
                    }
                    ErrorPolicy::Drop => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        debug!(input = %input, line = i + 1, error = %e, "Dropping malformed JSON line");
                    }
                },
            }
        }
        Ok(records)
    }

    fn name(&self) -> &str {
        "ndjson"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> InputId {
        InputId::from("events.ndjson")
    }

    #[test]
    fn test_parses_values_and_skips_blank_lines() {
        let data = b"{\"a\":1}\n\n   \n[1,2]\r\n\"s\"";
        let records = NdjsonTransform::new().transform(&id(), data).unwrap();
        assert_eq!(records, vec![json!({"a": 1}), json!([1, 2]), json!("s")]);
    }

    #[test]
    fn test_malformed_line_fails_by_default() {
        let data = b"{\"ok\":true}\n{broken\n";
        let err = NdjsonTransform::new().transform(&id(), data).unwrap_err();
        assert!(matches!(err, TransformError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_drop_policy_skips_malformed_lines() {
        let t = NdjsonTransform::new().with_error_policy(ErrorPolicy::Drop);
        let records = t.transform(&id(), b"nope\n{\"x\":2}\n{\n").unwrap();

        assert_eq!(records, vec![json!({"x": 2})]);
        assert_eq!(t.dropped(), 2);
    }
}
