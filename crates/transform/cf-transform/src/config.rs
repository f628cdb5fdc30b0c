//! Selection and error-policy types for built-in transforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The built-in transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    /// One record per line, terminator stripped.
    #[default]
    Lines,

    /// One record per chunk: the number of lines in it.
    LineCount,

    /// One JSON value per non-blank line.
    Ndjson,
}

impl TransformKind {
    /// All kinds, in display order.
    pub const ALL: [TransformKind; 3] = [Self::Lines, Self::LineCount, Self::Ndjson];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lines => "lines",
            Self::LineCount => "line-count",
            Self::Ndjson => "ndjson",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown transform '{}', expected one of: lines, line-count, ndjson",
                    s
                )
            })
    }
}

/// What to do with a line the transform cannot handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the whole chunk (and so the run).
    #[default]
    Fail,

    /// Drop the offending line and keep going.
    Drop,
}
