//! Progress reporting for cf-split.

use cf_cli_common::{format_bytes, format_number};
use cf_pipeline::PipelineStats;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Periodically prints pipeline counters to stderr.
pub struct ProgressReporter {
    enabled: bool,
    interval: Duration,
    stop: CancellationToken,
    handle: Option<JoinHandle<()>>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(enabled: bool, interval_secs: u64) -> Self {
        Self {
            enabled,
            interval: Duration::from_secs(interval_secs.max(1)),
            stop: CancellationToken::new(),
            handle: None,
            start_time: Instant::now(),
        }
    }

    /// Start the background reporter.
    pub fn start(&mut self, stats: Arc<PipelineStats>) {
        if !self.enabled {
            return;
        }

        let stop = self.stop.clone();
        let interval = self.interval;
        let start_time = self.start_time;

        self.handle = Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.tick().await; // first tick fires immediately

            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = timer.tick() => {
                        let _ = writeln!(io::stderr(), "[Progress] {}", progress_line(&stats, start_time));
                    }
                }
            }
        }));
    }

    /// Stop the reporter and print a final line.
    pub async fn stop(mut self, stats: &PipelineStats) {
        if !self.enabled {
            return;
        }

        self.stop.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }

        let _ = writeln!(
            io::stderr(),
            "[Progress] Complete: {}",
            progress_line(stats, self.start_time)
        );
    }
}

fn progress_line(stats: &PipelineStats, start_time: Instant) -> String {
    format!(
        "{}/{} inputs done, {} chunks, {} records, {} read ({:.1}s elapsed)",
        stats.inputs_completed() + stats.inputs_failed(),
        stats.inputs_published(),
        format_number(stats.chunks_delivered()),
        format_number(stats.records_delivered()),
        format_bytes(stats.bytes_read()),
        start_time.elapsed().as_secs_f64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line() {
        let stats = PipelineStats::new();
        stats.record_input_published();
        stats.record_input_published();
        stats.record_input_completed();
        stats.record_chunk_emitted(2048);
        stats.record_chunk_delivered(1500);

        let line = progress_line(&stats, Instant::now());
        assert!(line.starts_with("1/2 inputs done, 1 chunks, 1,500 records, 2.00 KiB read"));
    }

    #[tokio::test]
    async fn test_disabled_reporter_is_inert() {
        let mut reporter = ProgressReporter::new(false, 1);
        reporter.start(Arc::new(PipelineStats::new()));
        assert!(reporter.handle.is_none());
        reporter.stop(&PipelineStats::new()).await;
    }
}
