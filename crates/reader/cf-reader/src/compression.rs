//! Compression detection from file names.

/// Compression type detected from file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    /// Detect compression from a path or file name.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_lowercase();
        if lower.ends_with(".gz") || lower.ends_with(".gzip") {
            Compression::Gzip
        } else if lower.ends_with(".zst") || lower.ends_with(".zstd") {
            Compression::Zstd
        } else {
            Compression::None
        }
    }

    /// Whether a decompressor/compressor is needed.
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Compression::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_detection() {
        assert_eq!(Compression::from_path("file.log"), Compression::None);
        assert_eq!(Compression::from_path("file.log.gz"), Compression::Gzip);
        assert_eq!(Compression::from_path("file.log.GZIP"), Compression::Gzip);
        assert_eq!(Compression::from_path("file.log.zst"), Compression::Zstd);
        assert_eq!(Compression::from_path("/data/x.zstd"), Compression::Zstd);
        assert_eq!(Compression::from_path("archive.gz.txt"), Compression::None);
        assert_eq!(Compression::from_path("-"), Compression::None);
    }
}
