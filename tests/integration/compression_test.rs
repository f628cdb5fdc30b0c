//! Compressed inputs through the full pipeline.

use crate::common::{TestInputs, generate_log_lines};
use cf_error::{OpenError, PipelineError};
use cf_pipeline::{Pipeline, PipelineConfig};
use cf_reader::LocalSourceReader;
use cf_traits::ChunkTransform;
use cf_transform::LinesTransform;
use std::sync::Arc;

fn pipeline() -> Pipeline {
    let config = PipelineConfig::new()
        .with_chunk_workers(3)
        .with_processor_workers(4)
        .with_max_chunk_size(700);
    Pipeline::new(config, Arc::new(LocalSourceReader::new())).unwrap()
}

#[tokio::test]
async fn test_plain_gzip_and_zstd_give_identical_records() {
    let inputs = TestInputs::new();
    let lines = generate_log_lines("z", 1_500, 42);
    let plain = inputs.write("data.log", &lines).await;
    let gzip = inputs.write("data.log.gz", &lines).await;
    let zstd = inputs.write("data.log.zst", &lines).await;

    let transform: Arc<dyn ChunkTransform<String>> = Arc::new(LinesTransform::new());
    let output = pipeline()
        .collect(vec![plain.clone(), gzip.clone(), zstd.clone()], transform)
        .await
        .unwrap();

    assert!(output.is_complete());
    assert_eq!(output.records[&plain], lines);
    assert_eq!(output.records[&gzip], lines);
    assert_eq!(output.records[&zstd], lines);
}

#[tokio::test]
async fn test_truncated_gzip_reports_a_failure() {
    let inputs = TestInputs::new();
    let lines = generate_log_lines("t", 5_000, 9);
    let whole = inputs.write("whole.log.gz", &lines).await;

    let bytes = std::fs::read(whole.as_str()).unwrap();
    let truncated = inputs.write_raw("truncated.log.gz", &bytes[..bytes.len() / 2]);

    let transform: Arc<dyn ChunkTransform<String>> = Arc::new(LinesTransform::new());
    let output = pipeline()
        .collect(vec![truncated.clone()], transform)
        .await
        .unwrap();

    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].input, truncated);
    assert!(matches!(
        output.failures[0].error,
        PipelineError::Read(_) | PipelineError::Open(OpenError::Decompression { .. })
    ));
    assert!(!output.records.contains_key(&truncated));
}
