//! Input identifiers and jobs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Identifier reserved for standard input.
pub const STDIN_ID: &str = "-";

/// Identifier of one input stream (usually a file path).
///
/// Cloning is a reference-count bump, so every chunk and batch of an input can
/// carry its identifier without copying the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputId(Arc<str>);

impl InputId {
    /// Create a new identifier.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The identifier for standard input.
    pub fn stdin() -> Self {
        Self::new(STDIN_ID)
    }

    /// Whether this identifier denotes standard input.
    pub fn is_stdin(&self) -> bool {
        &*self.0 == STDIN_ID
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for InputId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for InputId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InputId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for InputId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl Serialize for InputId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for InputId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(InputId::from)
    }
}

/// A single input to be split, claimed by exactly one chunk worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The input this job covers
    pub input: InputId,
}

impl Job {
    /// Create a job for the given input.
    pub fn new(input: impl Into<InputId>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdin_detection() {
        assert!(InputId::stdin().is_stdin());
        assert!(InputId::from("-").is_stdin());
        assert!(!InputId::from("/var/log/app.log").is_stdin());
    }

    #[test]
    fn test_input_id_serializes_as_string() {
        let id = InputId::from("logs/a.log.gz");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""logs/a.log.gz""#);
        let back: InputId = serde_json::from_str(r#""logs/a.log.gz""#).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_job_from_string() {
        let job = Job::new(String::from("a.log"));
        assert_eq!(job.input.as_str(), "a.log");
        assert_eq!(job.input.to_string(), "a.log");
    }
}
