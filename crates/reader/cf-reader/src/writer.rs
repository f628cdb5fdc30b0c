//! Line-oriented output with optional compression.

use crate::compression::Compression;
use async_compression::tokio::write::{GzipEncoder, ZstdEncoder};
use cf_error::SinkError;
use std::pin::Pin;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info};

/// Output name that selects stdout.
pub const STDOUT_OUTPUT: &str = "-";

/// Writes newline-terminated lines to stdout or a file.
///
/// Files whose name ends in `.gz`/`.gzip` or `.zst`/`.zstd` are compressed.
/// [`finish`](LineWriter::finish) must be called to complete the compressed
/// frame and flush buffered bytes; dropping the writer without it loses
/// buffered output.
pub struct LineWriter {
    target: String,
    inner: Pin<Box<dyn AsyncWrite + Send>>,
    lines_written: u64,
    bytes_written: u64,
}

impl LineWriter {
    /// Open `target` for writing. `-` writes to stdout.
    pub async fn create(target: &str) -> Result<Self, SinkError> {
        let inner: Pin<Box<dyn AsyncWrite + Send>> = if target == STDOUT_OUTPUT {
            Box::pin(BufWriter::new(tokio::io::stdout()))
        } else {
            let file = File::create(target)
                .await
                .map_err(|e| SinkError::Write(format!("create {}: {}", target, e)))?;
            let buffered = BufWriter::new(file);
            match Compression::from_path(target) {
                Compression::None => Box::pin(buffered),
                Compression::Gzip => Box::pin(GzipEncoder::new(buffered)),
                Compression::Zstd => Box::pin(ZstdEncoder::new(buffered)),
            }
        };

        debug!(target = target, "Opened line writer");
        Ok(Self {
            target: target.to_string(),
            inner,
            lines_written: 0,
            bytes_written: 0,
        })
    }

    /// Wrap an arbitrary async writer (no compression).
    pub fn from_writer<W>(name: impl Into<String>, writer: W) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        Self {
            target: name.into(),
            inner: Box::pin(writer),
            lines_written: 0,
            bytes_written: 0,
        }
    }

    /// Write one line; a trailing `\n` is appended.
    pub async fn write_line(&mut self, line: &[u8]) -> Result<(), SinkError> {
        self.inner.write_all(line).await?;
        self.inner.write_all(b"\n").await?;
        self.lines_written += 1;
        self.bytes_written += line.len() as u64 + 1;
        Ok(())
    }

    /// Number of lines written so far.
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Number of uncompressed bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Finish the compressed frame (if any) and flush everything.
    pub async fn finish(&mut self) -> Result<(), SinkError> {
        if self.target == STDOUT_OUTPUT {
            // Shutting down stdout would close it for the rest of the process.
            self.inner.flush().await?;
        } else {
            self.inner.shutdown().await?;
        }
        info!(
            target = %self.target,
            lines = self.lines_written,
            "Finished writing output"
        );
        Ok(())
    }
}

/// Write all `lines` to `target` and finish the writer.
///
/// Returns the number of lines written.
pub async fn write_lines<I, L>(target: &str, lines: I) -> Result<u64, SinkError>
where
    I: IntoIterator<Item = L>,
    L: AsRef<[u8]>,
{
    let mut writer = LineWriter::create(target).await?;
    for line in lines {
        writer.write_line(line.as_ref()).await?;
    }
    writer.finish().await?;
    Ok(writer.lines_written())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalSourceReader, read_lines};
    use cf_types::InputId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_plain_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.log");
        let path = path.to_str().unwrap();

        let written = write_lines(path, ["first", "second"]).await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_write_zstd_file_round_trips_through_reader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.log.zst");
        let path = path.to_str().unwrap();

        write_lines(path, ["a", "b", "c"]).await.unwrap();

        let raw = std::fs::read(path).unwrap();
        assert_eq!(zstd::decode_all(&raw[..]).unwrap(), b"a\nb\nc\n");

        let lines = read_lines(&LocalSourceReader::new(), &InputId::from(path))
            .await
            .unwrap();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_write_gzip_file() {
        use std::io::Read;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.gz");
        let path = path.to_str().unwrap();

        write_lines(path, [b"x".as_slice()]).await.unwrap();

        let mut decoder = flate2::read::GzDecoder::new(std::fs::File::open(path).unwrap());
        let mut out = String::new();
        decoder.read_to_string(&mut out).unwrap();
        assert_eq!(out, "x\n");
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_fails() {
        let result = LineWriter::create("/nonexistent/dir/out.log").await;
        assert!(matches!(result, Err(SinkError::Write(_))));
    }
}
