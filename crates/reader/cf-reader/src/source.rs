//! Local file and stdin source reader.

use crate::compression::Compression;
use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use async_trait::async_trait;
use cf_error::OpenError;
use cf_traits::{SourceReader, SourceStream};
use cf_types::InputId;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Opens local files and stdin.
///
/// # Compression Support
///
/// Automatically detects and handles:
/// - `.gz` / `.gzip` - Gzip compression (concatenated members are read in full)
/// - `.zst` / `.zstd` - Zstd compression (concatenated frames are read in full)
///
/// The decoder is primed before the stream is handed out, so a file that is
/// not really gzip/zstd fails at open time with [`OpenError::Decompression`].
///
/// # Release order
///
/// The returned [`SourceStream`] owns `BufReader<Decoder<BufReader<File>>>`.
/// Dropping it tears down the decoder before the file handle inside it is
/// closed. If priming fails, the partially built stack is dropped the same way
/// before the error is returned.
#[derive(Debug, Clone)]
pub struct LocalSourceReader {
    buffer_size: usize,
}

impl Default for LocalSourceReader {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl LocalSourceReader {
    /// Create a reader with the default buffer size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read buffer size. Zero falls back to the default.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = if size == 0 { DEFAULT_BUFFER_SIZE } else { size };
        self
    }

    /// Get the read buffer size.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    async fn open_file(&self, path: &str) -> Result<SourceStream, OpenError> {
        let compression = Compression::from_path(path);
        let file = File::open(path)
            .await
            .map_err(|e| OpenError::from_io(path, &e))?;

        debug!(path = path, compression = ?compression, "Opened source file");

        let raw = BufReader::with_capacity(self.buffer_size, file);
        match compression {
            Compression::None => Ok(SourceStream::plain(raw)),
            Compression::Gzip => {
                let mut decoder = GzipDecoder::new(raw);
                decoder.multiple_members(true);
                let reader = BufReader::with_capacity(self.buffer_size, decoder);
                Ok(SourceStream::compressed(prime(path, reader).await?))
            }
            Compression::Zstd => {
                let mut decoder = ZstdDecoder::new(raw);
                decoder.multiple_members(true);
                let reader = BufReader::with_capacity(self.buffer_size, decoder);
                Ok(SourceStream::compressed(prime(path, reader).await?))
            }
        }
    }
}

/// Pull the first block through the decoder so header errors surface at open.
async fn prime<R>(path: &str, mut reader: R) -> Result<R, OpenError>
where
    R: AsyncBufRead + Unpin,
{
    if let Err(e) = reader.fill_buf().await {
        return Err(OpenError::Decompression {
            path: path.to_string(),
            message: e.to_string(),
        });
    }
    Ok(reader)
}

#[async_trait]
impl SourceReader for LocalSourceReader {
    async fn open(&self, input: &InputId) -> Result<SourceStream, OpenError> {
        if input.is_stdin() {
            info!("Reading from stdin");
            let stdin = BufReader::with_capacity(self.buffer_size, tokio::io::stdin());
            return Ok(SourceStream::plain(stdin));
        }

        self.open_file(input.as_str()).await
    }
}
