//! CLI argument definitions for cf-split.

use cf_transform::{ErrorPolicy, TransformKind};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub use cf_cli_common::{LogFormat, LogLevel};

/// Split line-oriented inputs into chunks, transform the chunks in parallel
/// and write the results with each input's order preserved.
///
/// Inputs may be plain, gzip (`.gz`) or zstd (`.zst`) files, or `-` for stdin.
/// With no inputs at all, stdin is read.
///
/// ## Examples
///
/// Count lines of many compressed logs:
///   cf-split -t line-count /var/log/app/*.log.gz
///
/// Normalize NDJSON into a compressed file:
///   cf-split -t ndjson -o events.ndjson.zst events-*.ndjson
///
/// Read the list of inputs from a file:
///   cf-split --inputs-from inputs.txt -w 4 -p 8
#[derive(Parser, Debug)]
#[command(name = "cf-split")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === Inputs ===
    /// Input files, `-` for stdin
    pub inputs: Vec<String>,

    /// Read additional inputs from a file, one per line (may be compressed)
    #[arg(long)]
    pub inputs_from: Option<String>,

    // === Processing ===
    /// Number of chunk workers (inputs opened concurrently)
    #[arg(short = 'w', long, env = "CF_WORKERS", default_value = "2", value_parser = parse_positive_usize)]
    pub workers: usize,

    /// Number of transform workers
    #[arg(short = 'p', long, env = "CF_PROCESSORS", default_value_t = num_cpus(), value_parser = parse_positive_usize)]
    pub processors: usize,

    /// Maximum chunk size; accepts K, M and G suffixes (binary)
    #[arg(short = 'c', long, env = "CF_CHUNK_SIZE", default_value = "4M", value_parser = parse_byte_size)]
    pub chunk_size: usize,

    /// Queue capacity between stages
    #[arg(long, env = "CF_CHANNEL_BUFFER", default_value = "64", value_parser = parse_positive_usize)]
    pub channel_buffer: usize,

    /// Read buffer size per opened input; accepts K, M and G suffixes
    #[arg(long, env = "CF_READ_BUFFER", default_value = "64K", value_parser = parse_byte_size)]
    pub read_buffer: usize,

    /// Transform applied to every chunk
    #[arg(short = 't', long, default_value = "lines", value_parser = parse_transform)]
    pub transform: TransformKind,

    /// What to do with malformed NDJSON lines
    #[arg(long, value_enum, default_value = "fail")]
    pub on_parse_error: ParseErrorArg,

    /// Replace invalid UTF-8 in the `lines` transform instead of failing
    #[arg(long)]
    pub lossy: bool,

    /// Output mode
    #[arg(short = 'm', long, value_enum, default_value = "stream")]
    pub mode: Mode,

    // === Output ===
    /// Output file, `-` for stdout; `.gz` and `.zst` names are compressed
    #[arg(short = 'o', long, default_value = "-")]
    pub output: String,

    /// Cancel the run after this many seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    // === Progress Options ===
    /// Enable progress reporting to stderr
    #[arg(long)]
    pub progress: bool,

    /// Progress reporting interval in seconds
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub progress_interval: u64,

    // === Logging ===
    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "info", env = "CF_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format on stderr
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Also append JSON logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// How ordered records are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Write records as soon as they are in order
    Stream,
    /// Collect everything, then write input by input
    Collect,
}

/// Handling of malformed NDJSON lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ParseErrorArg {
    /// Fail the run
    Fail,
    /// Drop the line and continue
    Drop,
}

impl From<ParseErrorArg> for ErrorPolicy {
    fn from(arg: ParseErrorArg) -> Self {
        match arg {
            ParseErrorArg::Fail => ErrorPolicy::Fail,
            ParseErrorArg::Drop => ErrorPolicy::Drop,
        }
    }
}

/// Get the number of available CPUs.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

/// Parse a positive byte size such as `512`, `64K`, `4M`, `1G` or `4MiB`.
pub fn parse_byte_size(s: &str) -> Result<usize, String> {
    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();
    let digits_end = upper
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(upper.len());
    let (digits, suffix) = upper.split_at(digits_end);

    let value: usize = digits
        .parse()
        .map_err(|_| format!("'{}' is not a valid size", trimmed))?;
    let multiplier: usize = match suffix.trim() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size suffix '{}'", other)),
    };

    let size = value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("'{}' is too large", trimmed))?;
    if size == 0 {
        return Err("size must be at least 1 byte".to_string());
    }
    Ok(size)
}

fn parse_transform(s: &str) -> Result<TransformKind, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("512").unwrap(), 512);
        assert_eq!(parse_byte_size("64K").unwrap(), 64 * 1024);
        assert_eq!(parse_byte_size("4m").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_byte_size("4MiB").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_byte_size("1G").unwrap(), 1024 * 1024 * 1024);

        assert!(parse_byte_size("0").is_err());
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("12X").is_err());
        assert!(parse_byte_size("M").is_err());
    }

    #[test]
    fn test_parse_positive_usize() {
        assert_eq!(parse_positive_usize("3").unwrap(), 3);
        assert!(parse_positive_usize("0").is_err());
        assert!(parse_positive_usize("-1").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["cf-split"]).unwrap();

        assert!(cli.inputs.is_empty());
        assert_eq!(cli.workers, 2);
        assert_eq!(cli.chunk_size, 4 * 1024 * 1024);
        assert_eq!(cli.channel_buffer, 64);
        assert_eq!(cli.transform, TransformKind::Lines);
        assert_eq!(cli.mode, Mode::Stream);
        assert_eq!(cli.output, "-");
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_full_command_line() {
        let cli = Cli::try_parse_from([
            "cf-split", "-w", "4", "-p", "8", "-c", "1M", "-t", "ndjson", "-m", "collect",
            "--on-parse-error", "drop", "-o", "out.zst", "--timeout", "30", "a.log", "b.log.gz",
        ])
        .unwrap();

        assert_eq!(cli.inputs, vec!["a.log", "b.log.gz"]);
        assert_eq!(cli.workers, 4);
        assert_eq!(cli.processors, 8);
        assert_eq!(cli.chunk_size, 1024 * 1024);
        assert_eq!(cli.transform, TransformKind::Ndjson);
        assert_eq!(cli.mode, Mode::Collect);
        assert_eq!(ErrorPolicy::from(cli.on_parse_error), ErrorPolicy::Drop);
        assert_eq!(cli.output, "out.zst");
        assert_eq!(cli.timeout, Some(30));
    }

    #[test]
    fn test_rejects_zero_workers_and_unknown_transform() {
        assert!(Cli::try_parse_from(["cf-split", "-w", "0"]).is_err());
        assert!(Cli::try_parse_from(["cf-split", "-t", "csv"]).is_err());
        assert!(Cli::try_parse_from(["cf-split", "-c", "0"]).is_err());
    }
}
