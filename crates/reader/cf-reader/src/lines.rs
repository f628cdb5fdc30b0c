//! Whole-source line reading.

use cf_error::{PipelineError, ReadError, Result};
use cf_traits::SourceReader;
use cf_types::InputId;
use tokio::io::AsyncBufReadExt;
use tracing::debug;

/// Read every line of `input` into memory.
///
/// Line terminators (`\n` and a preceding `\r`) are stripped. Meant for small
/// sources such as input lists; large inputs belong in the chunk pipeline.
pub async fn read_lines<R>(reader: &R, input: &InputId) -> Result<Vec<String>>
where
    R: SourceReader + ?Sized,
{
    let stream = reader.open(input).await?;
    let compressed = stream.is_compressed();
    let mut lines = stream.lines();

    let mut out = Vec::new();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| PipelineError::Read(ReadError::from_io(input, &e, compressed)))?
    {
        out.push(line);
    }

    debug!(input = %input, lines = out.len(), "Read source lines");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalSourceReader;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_read_lines_plain() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "a.log\r\nb.log\nc.log").unwrap();

        let reader = LocalSourceReader::new();
        let lines = read_lines(&reader, &InputId::from(file.path().to_str().unwrap()))
            .await
            .unwrap();

        assert_eq!(lines, vec!["a.log", "b.log", "c.log"]);
    }

    #[tokio::test]
    async fn test_read_lines_zstd() {
        let mut file = NamedTempFile::with_suffix(".zst").unwrap();
        let compressed = zstd::encode_all(&b"x\ny\n"[..], 1).unwrap();
        file.write_all(&compressed).unwrap();

        let reader = LocalSourceReader::new();
        let lines = read_lines(&reader, &InputId::from(file.path().to_str().unwrap()))
            .await
            .unwrap();

        assert_eq!(lines, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_read_lines_missing_file() {
        let reader = LocalSourceReader::new();
        let result = read_lines(&reader, &InputId::from("/nonexistent/list.txt")).await;
        assert!(matches!(result, Err(PipelineError::Open(_))));
    }
}
