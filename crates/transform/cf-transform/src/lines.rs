//! Line-per-record transform.

use cf_error::TransformError;
use cf_traits::ChunkTransform;
use cf_types::InputId;

/// Iterate the lines of a chunk with `\n` / `\r\n` terminators stripped.
///
/// An unterminated last line is yielded as is. Empty data yields nothing.
pub fn chunk_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split_inclusive(|&b| b == b'\n').map(|line| {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        line.strip_suffix(b"\r").unwrap_or(line)
    })
}

/// Emits every line of a chunk as a `String`.
///
/// Invalid UTF-8 fails the chunk unless the transform is
/// [`lossy`](LinesTransform::lossy), in which case bad sequences are replaced
/// with U+FFFD.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinesTransform {
    lossy: bool,
}

impl LinesTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace invalid UTF-8 instead of failing.
    pub fn lossy(mut self) -> Self {
        self.lossy = true;
        self
    }
}

impl ChunkTransform<String> for LinesTransform {
    fn transform(&self, _input: &InputId, data: &[u8]) -> Result<Vec<String>, TransformError> {
        let mut records = Vec::new();
        for (i, line) in chunk_lines(data).enumerate() {
            let record = match std::str::from_utf8(line) {
                Ok(text) => text.to_string(),
                Err(_) if self.lossy => String::from_utf8_lossy(line).into_owned(),
                Err(e) => {
                    return Err(TransformError::InvalidUtf8(format!("line {}: {}", i + 1, e)));
                }
            };
            records.push(record);
        }
        Ok(records)
    }

    fn name(&self) -> &str {
        "lines"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(t: &LinesTransform, data: &[u8]) -> Result<Vec<String>, TransformError> {
        t.transform(&InputId::from("test"), data)
    }

    #[test]
    fn test_chunk_lines() {
        let lines: Vec<&[u8]> = chunk_lines(b"a\r\nb\n\nc").collect();
        assert_eq!(lines, vec![&b"a"[..], &b"b"[..], &b""[..], &b"c"[..]]);
        assert_eq!(chunk_lines(b"").count(), 0);
        assert_eq!(chunk_lines(b"\n").count(), 1);
    }

    #[test]
    fn test_lines_transform() {
        let records = run(&LinesTransform::new(), b"first\nsecond\r\n").unwrap();
        assert_eq!(records, vec!["first", "second"]);
    }

    #[test]
    fn test_invalid_utf8_fails_chunk() {
        let err = run(&LinesTransform::new(), b"ok\n\xff\xfe\n").unwrap_err();
        match err {
            TransformError::InvalidUtf8(message) => assert!(message.starts_with("line 2")),
            other => panic!("Expected InvalidUtf8, got: {:?}", other),
        }
    }

    #[test]
    fn test_lossy_replaces_invalid_utf8() {
        let records = run(&LinesTransform::new().lossy(), b"a\xffb\n").unwrap();
        assert_eq!(records, vec!["a\u{FFFD}b"]);
    }
}
