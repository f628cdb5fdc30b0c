//! cf-split CLI
//!
//! Splits line-oriented files into chunks, transforms the chunks in parallel
//! and writes each file's records back out in their original order.

use cf_cli_common::{format_bytes, format_duration, format_number, init_logging};
use clap::Parser;

mod args;
mod progress;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr so stdout stays clean for records
    init_logging(args.log_level, args.log_format, args.log_file.as_deref())?;

    let summary = run::execute(args).await?;
    let stats = &summary.stats;

    eprintln!();
    eprintln!("Split completed:");
    eprintln!(
        "  Inputs:          {} completed, {} failed",
        stats.inputs_completed, stats.inputs_failed
    );
    eprintln!("  Chunks:          {}", format_number(stats.chunks_delivered));
    eprintln!("  Records:         {}", format_number(stats.records_delivered));
    eprintln!("  Lines written:   {}", format_number(summary.lines_written));
    eprintln!("  Bytes read:      {}", format_bytes(stats.bytes_read));

    if let Some(secs) = stats.duration_secs() {
        eprintln!("  Duration:        {}", format_duration(secs));
    }
    if let Some(rate) = stats.records_per_second() {
        eprintln!("  Throughput:      {} records/sec", format_number(rate as u64));
    }
    if let Some(mbps) = stats.read_throughput_mbps() {
        eprintln!("                   {:.1} MB/s read", mbps);
    }

    if !summary.failures.is_empty() {
        eprintln!("  Failed inputs:");
        for failure in &summary.failures {
            eprintln!("    {}", failure);
        }
        std::process::exit(4); // Partial failure
    }

    Ok(())
}
