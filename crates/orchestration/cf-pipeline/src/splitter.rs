//! Line-respecting chunk splitting.
//!
//! [`LineChunker`] is the pure accumulation logic: feed it complete lines and
//! pop finished chunks. [`ChunkSplitter`] drives it from an async byte stream.

use bytes::{Bytes, BytesMut};
use cf_error::{PipelineError, Result};
use cf_types::Chunk;
use std::collections::VecDeque;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Groups whole lines into chunks of at most `max_chunk_size` bytes.
///
/// A line is never split across chunks. A line longer than the limit on its
/// own becomes a single oversized chunk. Indices start at 0 and increase by
/// one per emitted chunk; no chunk is ever empty.
#[derive(Debug)]
pub struct LineChunker {
    max_chunk_size: usize,
    buffer: BytesMut,
    next_index: u64,
    ready: VecDeque<Chunk>,
}

impl LineChunker {
    /// Create a chunker. A zero limit is rejected.
    pub fn new(max_chunk_size: usize) -> Result<Self> {
        if max_chunk_size == 0 {
            return Err(PipelineError::Config(
                "max_chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_chunk_size,
            buffer: BytesMut::new(),
            next_index: 0,
            ready: VecDeque::new(),
        })
    }

    /// Feed one line, including its `\n` terminator if it has one.
    pub fn push_line(&mut self, line: &[u8]) {
        if line.is_empty() {
            return;
        }

        if !self.buffer.is_empty() && self.buffer.len() + line.len() > self.max_chunk_size {
            self.flush();
        }

        self.buffer.extend_from_slice(line);

        if self.buffer.len() >= self.max_chunk_size {
            self.flush();
        }
    }

    /// Emit whatever is still buffered. Call once at end of input.
    pub fn finish(&mut self) {
        self.flush();
    }

    /// Take the next finished chunk, if any.
    pub fn pop(&mut self) -> Option<Chunk> {
        self.ready.pop_front()
    }

    /// Number of chunks emitted so far.
    pub fn chunks_emitted(&self) -> u64 {
        self.next_index
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let data: Bytes = self.buffer.split().freeze();
        self.ready.push_back(Chunk::new(self.next_index, data));
        self.next_index += 1;
    }
}

/// Pulls chunks out of a buffered byte stream.
///
/// `next_chunk` is not cancel safe: if its future is dropped mid-read the
/// partial line is lost, so a cancelled splitter must be discarded.
pub struct ChunkSplitter<R> {
    reader: R,
    chunker: LineChunker,
    line: Vec<u8>,
    bytes_read: u64,
    eof: bool,
}

impl<R: AsyncBufRead + Unpin> ChunkSplitter<R> {
    /// Create a splitter over `reader`. A zero limit is rejected.
    pub fn new(reader: R, max_chunk_size: usize) -> Result<Self> {
        Ok(Self {
            reader,
            chunker: LineChunker::new(max_chunk_size)?,
            line: Vec::new(),
            bytes_read: 0,
            eof: false,
        })
    }

    /// Read until the next chunk is complete.
    ///
    /// Returns `Ok(None)` once the stream is exhausted and every chunk has
    /// been handed out.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Chunk>> {
        loop {
            if let Some(chunk) = self.chunker.pop() {
                return Ok(Some(chunk));
            }
            if self.eof {
                return Ok(None);
            }

            self.line.clear();
            let n = self.reader.read_until(b'\n', &mut self.line).await?;
            if n == 0 {
                self.eof = true;
                self.chunker.finish();
                continue;
            }

            self.bytes_read += n as u64;
            self.chunker.push_line(&self.line);
        }
    }

    /// Bytes consumed from the stream so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Chunks emitted so far.
    pub fn chunks_emitted(&self) -> u64 {
        self.chunker.chunks_emitted()
    }
}
