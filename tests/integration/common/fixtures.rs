//! On-disk test inputs.

use cf_reader::write_lines;
use cf_types::InputId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

const LEVELS: [&str; 4] = ["DEBUG", "INFO", "WARN", "ERROR"];

/// Generate `count` log lines of varying length, tagged with `source` and a
/// sequence number so order can be checked afterwards.
pub fn generate_log_lines(source: &str, count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let level = LEVELS[rng.gen_range(0..LEVELS.len())];
            let padding = "x".repeat(rng.gen_range(0..120));
            format!("{} seq={} level={} msg={}", source, i, level, padding)
        })
        .collect()
}

/// Generate `count` NDJSON records with an `id` field.
pub fn generate_ndjson_lines(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!(r#"{{"id":{},"name":"user_{}","score":{}}}"#, i, i, (i * 7) % 100))
        .collect()
}

/// A temporary directory of input files.
pub struct TestInputs {
    dir: TempDir,
}

impl TestInputs {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Path of `name` inside the directory, whether or not it exists.
    pub fn path(&self, name: &str) -> String {
        self.dir
            .path()
            .join(name)
            .to_str()
            .expect("utf-8 temp path")
            .to_string()
    }

    /// Write `lines` to `name`, compressed if the name ends in `.gz` or
    /// `.zst`, and return its input id.
    pub async fn write(&self, name: &str, lines: &[String]) -> InputId {
        let path = self.path(name);
        write_lines(&path, lines).await.expect("write test input");
        InputId::new(path)
    }

    /// Write raw bytes to `name` and return its input id.
    pub fn write_raw(&self, name: &str, data: &[u8]) -> InputId {
        let path = self.path(name);
        std::fs::write(&path, data).expect("write test input");
        InputId::new(path)
    }
}
