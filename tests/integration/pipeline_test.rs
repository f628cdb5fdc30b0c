//! End-to-end pipeline tests over local files.

use crate::common::{TestInputs, generate_log_lines, generate_ndjson_lines};
use cf_error::PipelineError;
use cf_pipeline::{Pipeline, PipelineConfig};
use cf_reader::LocalSourceReader;
use cf_traits::{ChunkTransform, sink_fn};
use cf_transform::{ErrorPolicy, LineCountTransform, LinesTransform, NdjsonTransform};
use cf_types::InputId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn pipeline(config: PipelineConfig) -> Pipeline {
    Pipeline::new(config, Arc::new(LocalSourceReader::new())).unwrap()
}

fn busy_config(chunk_size: usize) -> PipelineConfig {
    PipelineConfig::new()
        .with_chunk_workers(4)
        .with_processor_workers(8)
        .with_max_chunk_size(chunk_size)
        .with_channel_buffer(8)
}

fn lines_transform() -> Arc<dyn ChunkTransform<String>> {
    Arc::new(LinesTransform::new())
}

#[tokio::test]
async fn test_many_inputs_keep_source_order() {
    let inputs = TestInputs::new();
    let mut expected = HashMap::new();
    let mut ids = Vec::new();
    for i in 0..12 {
        let lines = generate_log_lines(&format!("src{}", i), 200 + i * 37, i as u64);
        let id = inputs.write(&format!("src{}.log", i), &lines).await;
        expected.insert(id.clone(), lines);
        ids.push(id);
    }

    let output = pipeline(busy_config(512))
        .collect(ids, lines_transform())
        .await
        .unwrap();

    assert!(output.is_complete());
    assert_eq!(output.records, expected);
    assert_eq!(output.stats.inputs_completed, 12);
    assert_eq!(output.stats.chunks_emitted, output.stats.chunks_delivered);
}

#[tokio::test]
async fn test_chunk_size_does_not_change_output() {
    let inputs = TestInputs::new();
    let lines = generate_log_lines("app", 1_000, 7);
    let id = inputs.write("app.log", &lines).await;

    for chunk_size in [1, 64, 4096, 1 << 20] {
        let output = pipeline(busy_config(chunk_size))
            .collect(vec![id.clone()], lines_transform())
            .await
            .unwrap();
        assert_eq!(output.records[&id], lines, "chunk size {}", chunk_size);
    }
}

#[tokio::test]
async fn test_unreadable_inputs_are_isolated() {
    let inputs = TestInputs::new();
    let good = inputs.write("good.log", &generate_log_lines("good", 300, 1)).await;
    let missing = InputId::new(inputs.path("missing.log"));
    let corrupt = inputs.write_raw("corrupt.log.gz", b"this is not gzip data\n");

    let output = pipeline(busy_config(256))
        .collect(vec![missing.clone(), good.clone(), corrupt.clone()], lines_transform())
        .await
        .unwrap();

    let mut failed: Vec<&InputId> = output.failures.iter().map(|f| &f.input).collect();
    failed.sort();
    let mut want = vec![&missing, &corrupt];
    want.sort();
    assert_eq!(failed, want);

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[&good].len(), 300);
    assert_eq!(output.stats.inputs_failed, 2);
}

#[tokio::test]
async fn test_stream_delivers_in_order_per_input() {
    let inputs = TestInputs::new();
    let a_lines = generate_log_lines("a", 800, 11);
    let b_lines = generate_log_lines("b", 600, 12);
    let a = inputs.write("a.log", &a_lines).await;
    let b = inputs.write("b.log", &b_lines).await;

    let mut seen: HashMap<InputId, Vec<String>> = HashMap::new();
    let mut sink = sink_fn(|input: &InputId, records: Vec<String>| {
        seen.entry(input.clone()).or_default().extend(records);
        Ok(())
    });
    let report = pipeline(busy_config(300))
        .stream(vec![a.clone(), b.clone()], lines_transform(), &mut sink)
        .await
        .unwrap();
    drop(sink);

    assert!(report.is_complete());
    assert_eq!(seen[&a], a_lines);
    assert_eq!(seen[&b], b_lines);
    assert_eq!(report.stats.records_delivered, 1_400);
}

#[tokio::test]
async fn test_ndjson_records_in_order() {
    let inputs = TestInputs::new();
    let id = inputs.write("users.ndjson", &generate_ndjson_lines(2_000)).await;

    let transform: Arc<dyn ChunkTransform<Value>> = Arc::new(NdjsonTransform::new());
    let output = pipeline(busy_config(1024))
        .collect(vec![id.clone()], transform)
        .await
        .unwrap();

    let ids: Vec<u64> = output.records[&id]
        .iter()
        .map(|v| v["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, (0..2_000).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_malformed_ndjson_fails_the_run_unless_dropped() {
    let inputs = TestInputs::new();
    let mut lines = generate_ndjson_lines(100);
    lines.insert(50, "{broken".to_string());
    let id = inputs.write("mixed.ndjson", &lines).await;

    let strict: Arc<dyn ChunkTransform<Value>> = Arc::new(NdjsonTransform::new());
    let result = pipeline(busy_config(256))
        .collect(vec![id.clone()], strict)
        .await;
    assert!(matches!(result, Err(PipelineError::Transform { .. })));

    let lenient = Arc::new(NdjsonTransform::new().with_error_policy(ErrorPolicy::Drop));
    let transform: Arc<dyn ChunkTransform<Value>> = lenient.clone();
    let output = pipeline(busy_config(256))
        .collect(vec![id.clone()], transform)
        .await
        .unwrap();
    assert_eq!(output.records[&id].len(), 100);
    assert_eq!(lenient.dropped(), 1);
}

#[tokio::test]
async fn test_line_counts_sum_to_total() {
    let inputs = TestInputs::new();
    let id = inputs.write("count.log", &generate_log_lines("c", 5_000, 3)).await;

    let transform: Arc<dyn ChunkTransform<u64>> = Arc::new(LineCountTransform);
    let output = pipeline(busy_config(2048))
        .collect(vec![id.clone()], transform)
        .await
        .unwrap();

    let counts = &output.records[&id];
    assert_eq!(counts.len() as u64, output.stats.chunks_delivered);
    assert_eq!(counts.iter().sum::<u64>(), 5_000);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let inputs = TestInputs::new();
    let id = inputs.write("a.log", &generate_log_lines("a", 100, 5)).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let p = pipeline(busy_config(64)).with_cancellation(cancel);

    let result = p.collect(vec![id], lines_transform()).await;
    assert!(matches!(result, Err(PipelineError::Cancelled)));
}

#[tokio::test]
#[ignore = "large input"]
async fn test_large_inputs() {
    let inputs = TestInputs::new();
    let mut expected = HashMap::new();
    let mut ids = Vec::new();
    for i in 0..32 {
        let lines = generate_log_lines(&format!("big{}", i), 50_000, 100 + i);
        let id = inputs.write(&format!("big{}.log.zst", i), &lines).await;
        expected.insert(id.clone(), lines);
        ids.push(id);
    }

    let output = pipeline(busy_config(256 * 1024))
        .collect(ids, lines_transform())
        .await
        .unwrap();

    assert!(output.is_complete());
    assert_eq!(output.records, expected);
    assert_eq!(output.stats.records_delivered, 32 * 50_000);
}
