//! Main execution logic for cf-split.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use cf_error::{PipelineError, SinkError};
use cf_pipeline::{Pipeline, PipelineConfig, StatsSnapshot};
use cf_reader::{LineWriter, LocalSourceReader, read_lines};
use cf_traits::{ChunkTransform, RecordSink};
use cf_transform::{
    LineCountTransform, LinesTransform, NdjsonTransform, RenderLine, TransformKind,
};
use cf_types::InputId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::args::{Cli, Mode};
use crate::progress::ProgressReporter;

/// Outcome of a run that was not aborted.
#[derive(Debug)]
pub struct RunSummary {
    pub stats: StatsSnapshot,

    /// One message per abandoned input
    pub failures: Vec<String>,

    /// Output lines written
    pub lines_written: u64,
}

/// Writes each record as one line of the output.
struct LineSink<'a> {
    writer: &'a mut LineWriter,
}

#[async_trait]
impl<T> RecordSink<T> for LineSink<'_>
where
    T: RenderLine + Send + 'static,
{
    async fn write(&mut self, _input: &InputId, records: Vec<T>) -> Result<(), SinkError> {
        for record in records {
            let line = record.render_line().into_owned();
            self.writer.write_line(line.as_bytes()).await?;
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.finish().await
    }
}

/// Execute cf-split with the provided arguments.
pub async fn execute(args: Cli) -> Result<RunSummary> {
    let reader = LocalSourceReader::new().with_buffer_size(args.read_buffer);
    let inputs = collect_inputs(&args, &reader).await?;

    let config = PipelineConfig::new()
        .with_chunk_workers(args.workers)
        .with_processor_workers(args.processors)
        .with_max_chunk_size(args.chunk_size)
        .with_channel_buffer(args.channel_buffer)
        .with_read_buffer_size(args.read_buffer);
    config.validate().map_err(|e| anyhow!("{}", e))?;

    let cancel = CancellationToken::new();
    let timed_out = spawn_cancel_triggers(&cancel, args.timeout);
    let pipeline = Pipeline::new(config, Arc::new(reader))?.with_cancellation(cancel.clone());

    let mut progress = ProgressReporter::new(args.progress, args.progress_interval);
    progress.start(Arc::clone(pipeline.stats()));

    info!(
        inputs = inputs.len(),
        transform = %args.transform,
        mode = ?args.mode,
        output = %args.output,
        "Starting cf-split"
    );

    let result = match args.transform {
        TransformKind::Lines => {
            let transform = if args.lossy {
                LinesTransform::new().lossy()
            } else {
                LinesTransform::new()
            };
            run_transform::<String, _>(&pipeline, inputs, transform, args.mode, &args.output).await
        }
        TransformKind::LineCount => {
            run_transform::<u64, _>(&pipeline, inputs, LineCountTransform, args.mode, &args.output)
                .await
        }
        TransformKind::Ndjson => {
            let transform = NdjsonTransform::new().with_error_policy(args.on_parse_error.into());
            run_transform::<serde_json::Value, _>(
                &pipeline,
                inputs,
                transform,
                args.mode,
                &args.output,
            )
            .await
        }
    };

    progress.stop(pipeline.stats()).await;
    // Releases the signal and timeout watchers.
    cancel.cancel();

    match result {
        Ok(summary) => Ok(summary),
        Err(PipelineError::Cancelled) if timed_out.load(Ordering::SeqCst) => {
            bail!("Timed out after {}s", args.timeout.unwrap_or_default())
        }
        Err(PipelineError::Cancelled) => bail!("Cancelled"),
        Err(e) => Err(e.into()),
    }
}

/// Run one transform end to end and write its records.
async fn run_transform<T, C>(
    pipeline: &Pipeline,
    inputs: Vec<InputId>,
    transform: C,
    mode: Mode,
    output: &str,
) -> Result<RunSummary, PipelineError>
where
    T: RenderLine + Send + 'static,
    C: ChunkTransform<T> + 'static,
{
    let transform: Arc<dyn ChunkTransform<T>> = Arc::new(transform);
    let mut writer = LineWriter::create(output).await?;

    let (stats, failures) = match mode {
        Mode::Stream => {
            let mut sink = LineSink {
                writer: &mut writer,
            };
            let report = pipeline.stream(inputs, transform, &mut sink).await?;
            (report.stats, report.failures)
        }
        Mode::Collect => {
            let mut result = pipeline.collect(inputs.clone(), transform).await?;
            for input in &inputs {
                let Some(records) = result.records.remove(input) else {
                    continue;
                };
                for record in records {
                    let line = record.render_line().into_owned();
                    writer.write_line(line.as_bytes()).await?;
                }
            }
            writer.finish().await?;
            (result.stats, result.failures)
        }
    };

    Ok(RunSummary {
        stats,
        failures: failures.iter().map(ToString::to_string).collect(),
        lines_written: writer.lines_written(),
    })
}

/// Inputs from the command line plus those listed in `--inputs-from`.
///
/// Blank lines and `#` comments in the list are skipped. With no inputs at
/// all, stdin is read.
async fn collect_inputs(args: &Cli, reader: &LocalSourceReader) -> Result<Vec<InputId>> {
    let mut inputs: Vec<InputId> = args.inputs.iter().map(InputId::new).collect();

    if let Some(list) = &args.inputs_from {
        let lines = read_lines(reader, &InputId::new(list))
            .await
            .with_context(|| format!("Failed to read input list {}", list))?;
        inputs.extend(
            lines
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(InputId::new),
        );
    }

    if inputs.is_empty() {
        inputs.push(InputId::stdin());
    }
    Ok(inputs)
}

/// Cancel on Ctrl-C and, if set, after `timeout` seconds.
///
/// The returned flag is set when the timeout fired. Both watchers exit once
/// `cancel` is cancelled.
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout: Option<u64>) -> Arc<AtomicBool> {
    let timed_out = Arc::new(AtomicBool::new(false));

    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    warn!("Interrupt received, cancelling");
                    token.cancel();
                }
                Err(e) => warn!(error = %e, "Failed to listen for interrupt"),
            },
        }
    });

    if let Some(secs) = timeout {
        let token = cancel.clone();
        let flag = Arc::clone(&timed_out);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    warn!(timeout_secs = secs, "Timeout reached, cancelling");
                    flag.store(true, Ordering::SeqCst);
                    token.cancel();
                }
            }
        });
    }

    timed_out
}
