//! Source reader trait and the stream it hands out.

use async_trait::async_trait;
use cf_error::OpenError;
use cf_types::InputId;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};

/// An opened input stream.
///
/// Dropping the stream releases everything the reader acquired for it. When a
/// decompressor is in use it owns the underlying file reader, so the decoder
/// is torn down first and the file handle is closed after it.
pub struct SourceStream {
    inner: Pin<Box<dyn AsyncBufRead + Send>>,
    compressed: bool,
}

impl SourceStream {
    /// Wrap a plain (uncompressed) buffered reader.
    pub fn plain<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Send + 'static,
    {
        Self {
            inner: Box::pin(reader),
            compressed: false,
        }
    }

    /// Wrap a buffered reader that sits on top of a decompressor.
    pub fn compressed<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Send + 'static,
    {
        Self {
            inner: Box::pin(reader),
            compressed: true,
        }
    }

    /// Whether bytes pass through a decompressor.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

impl std::fmt::Debug for SourceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceStream")
            .field("compressed", &self.compressed)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for SourceStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.get_mut().inner.as_mut().poll_read(cx, buf)
    }
}

impl AsyncBufRead for SourceStream {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        self.get_mut().inner.as_mut().poll_fill_buf(cx)
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        self.get_mut().inner.as_mut().consume(amt)
    }
}

/// Trait for opening inputs.
///
/// Implementations must be usable from many chunk workers at once.
///
/// # Implementations
///
/// - `LocalSourceReader` (cf-reader): local files and stdin, with gzip/zstd
///   detection by file extension
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Opens an input and returns a buffered byte stream over its
    /// (decompressed) contents.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError`] if the input cannot be opened.
    async fn open(&self, input: &InputId) -> Result<SourceStream, OpenError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_source_stream_delegates_reads() {
        let mut stream = SourceStream::plain(&b"alpha\nbeta\n"[..]);
        assert!(!stream.is_compressed());

        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "alpha\nbeta\n");
    }
}
