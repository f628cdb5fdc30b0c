//! Error types and classification for chunkflow.
//!
//! This crate provides:
//! - [`PipelineError`] - Top-level error enum for all pipeline errors
//! - Stage-specific errors ([`OpenError`], [`ReadError`], [`TransformError`], [`SinkError`])
//! - [`ErrorCategory`] for deciding whether a failure stays local to one input
//!   or terminates the whole run

use thiserror::Error;

/// Top-level error type for chunkflow.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A source could not be opened
    #[error("Open error: {0}")]
    Open(#[from] OpenError),

    /// A source failed mid-stream
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// The caller-supplied transform rejected a chunk
    #[error("Transform error on {input} chunk {chunk_index}: {source}")]
    Transform {
        input: String,
        chunk_index: u64,
        #[source]
        source: TransformError,
    },

    /// The caller-supplied sink rejected a batch of records
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// The run was cancelled (explicitly or by a timeout)
    #[error("Pipeline cancelled")]
    Cancelled,

    /// Upstream finished while an input still had buffered chunks waiting on a gap
    #[error("Input {input} is incomplete: expected chunk {next_expected}, {pending} chunk(s) still buffered")]
    Incomplete {
        input: String,
        next_expected: u64,
        pending: usize,
    },

    /// The same chunk of an input was delivered twice
    #[error("Duplicate chunk {chunk_index} for input {input}")]
    DuplicateChunk { input: String, chunk_index: u64 },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stage task panicked; whatever it was working on is lost
    #[error("{tasks} task(s) of stage {stage} panicked")]
    StagePanicked { stage: String, tasks: usize },
}

/// Errors raised while opening a source.
#[derive(Error, Debug)]
pub enum OpenError {
    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),

    /// Access denied
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The decompressor rejected the stream header
    #[error("Decompression failed for {path}: {message}")]
    Decompression { path: String, message: String },

    /// Any other failure while opening
    #[error("I/O error opening {path}: {message}")]
    Io { path: String, message: String },
}

impl OpenError {
    /// Map an [`std::io::Error`] raised while opening `path`.
    pub fn from_io(path: &str, error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => OpenError::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => OpenError::AccessDenied(path.to_string()),
            _ => OpenError::Io {
                path: path.to_string(),
                message: error.to_string(),
            },
        }
    }
}

/// Errors raised while reading an already opened source.
#[derive(Error, Debug)]
pub enum ReadError {
    /// I/O error during read
    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },

    /// Compressed stream was corrupt or truncated
    #[error("Decompression failed for {path}: {message}")]
    Decompression { path: String, message: String },
}

impl ReadError {
    /// Map an [`std::io::Error`] raised while reading `path`.
    ///
    /// The async decoders report bad headers and corrupt frames as
    /// `InvalidData`/`UnexpectedEof`, so those kinds are classified as
    /// decompression failures.
    pub fn from_io(path: &str, error: &std::io::Error, compressed: bool) -> Self {
        let decoder_failure = matches!(
            error.kind(),
            std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof
        );
        if compressed && decoder_failure {
            ReadError::Decompression {
                path: path.to_string(),
                message: error.to_string(),
            }
        } else {
            ReadError::Io {
                path: path.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Transform-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// A line could not be parsed
    #[error("Parse failed at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Chunk payload was not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Transform-specific failure
    #[error("Transform failed: {0}")]
    Failed(String),

    /// The transform panicked
    #[error("Transform panicked: {0}")]
    Panicked(String),
}

/// Sink-related errors.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Writing records failed
    #[error("Write failed: {0}")]
    Write(String),

    /// Sink refused further records
    #[error("Sink closed: {0}")]
    Closed(String),
}

impl From<std::io::Error> for SinkError {
    fn from(error: std::io::Error) -> Self {
        SinkError::Write(error.to_string())
    }
}

/// Error classification for propagation decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Failure is isolated to one input; other inputs continue
    ///
    /// Examples: file not found, corrupt gzip stream
    InputLocal,

    /// Failure terminates the whole run
    ///
    /// Examples: transform error, sink error, cancellation
    Fatal,
}

/// Classifies an error to determine how far it propagates.
pub fn classify_error(error: &PipelineError) -> ErrorCategory {
    match error {
        PipelineError::Open(_) | PipelineError::Read(_) => ErrorCategory::InputLocal,
        PipelineError::Transform { .. }
        | PipelineError::Sink(_)
        | PipelineError::Cancelled
        | PipelineError::Incomplete { .. }
        | PipelineError::DuplicateChunk { .. }
        | PipelineError::Config(_)
        | PipelineError::StagePanicked { .. } => ErrorCategory::Fatal,
    }
}

/// Result type alias using PipelineError.
pub type Result<T> = std::result::Result<T, PipelineError>;
