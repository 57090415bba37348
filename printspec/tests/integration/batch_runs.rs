//! Batches mixing passing, failing and unreadable items.

use crate::common::*;
use printspec::config::{Category, OutputFormat, ValidationConfig};
use printspec::output::ReportRenderer;
use printspec::BatchRunner;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Write one passing document, one failing image, one corrupt document.
fn mixed_batch(dir: &TempDir) -> Vec<PathBuf> {
    let good = build_pdf(vec![PageSpec::letter().image(placed_jpeg(300, "DeviceRGB"))]);
    let corrupt = b"%PDF-1.7\n1 0 obj << /Type /Catalog".to_vec();

    vec![
        write_fixture(dir.path(), "good.pdf", &good),
        write_fixture(dir.path(), "thumb.jpg", &jpeg(100, 150, 72)),
        write_fixture(dir.path(), "corrupt.pdf", &corrupt),
    ]
}

#[tokio::test]
async fn test_mixed_batch_keeps_input_order() {
    let dir = TempDir::new().unwrap();
    let paths = mixed_batch(&dir);

    let runner = BatchRunner::new(Arc::new(ValidationConfig::default())).with_jobs(3);
    let (reports, summary) = runner.run_paths(&paths).await;

    let names: Vec<&str> = reports.iter().map(|r| r.item_name.as_str()).collect();
    assert!(names[0].ends_with("good.pdf"));
    assert!(names[1].ends_with("thumb.jpg"));
    assert!(names[2].ends_with("corrupt.pdf"));

    assert!(reports[0].passed);
    assert!(!reports[1].passed);
    assert!(!reports[1].is_processing_failure());
    assert!(reports[2].is_processing_failure());
    assert_eq!(reports[2].issues[0].category, Category::Processing);

    assert_eq!(summary.total, 3);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processing_failures, 1);
    assert_eq!(summary.exit_code(), 3);
}

#[tokio::test]
async fn test_results_do_not_depend_on_worker_count() {
    let dir = TempDir::new().unwrap();
    let paths = mixed_batch(&dir);
    let config = Arc::new(ValidationConfig::default());

    let (serial, _) = BatchRunner::new(Arc::clone(&config))
        .with_jobs(1)
        .run_paths(&paths)
        .await;
    let (parallel, _) = BatchRunner::new(config).with_jobs(4).run_paths(&paths).await;

    assert_eq!(serial, parallel);
}

#[tokio::test]
async fn test_progress_reports_every_item() {
    let dir = TempDir::new().unwrap();
    let mut paths = mixed_batch(&dir);
    paths.push(dir.path().join("missing.pdf"));

    let runner = BatchRunner::new(Arc::new(ValidationConfig::default()));
    let mut seen = Vec::new();
    let (reports, _) = runner
        .run_paths_with_progress(&paths, |done, total, report| {
            assert_eq!(total, 4);
            seen.push((done, report.item_name.clone()));
        })
        .await;

    assert_eq!(reports.len(), 4);
    assert_eq!(seen.len(), 4);
    assert_eq!(
        seen.iter().map(|(done, _)| *done).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
}

#[tokio::test]
async fn test_json_rendering_of_batch() {
    let dir = TempDir::new().unwrap();
    let paths = mixed_batch(&dir);

    let runner = BatchRunner::new(Arc::new(ValidationConfig::default()));
    let (reports, summary) = runner.run_paths(&paths).await;

    let json = ReportRenderer::new(OutputFormat::Json)
        .render(&reports, &summary)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["summary"]["total"], 3);
    assert_eq!(value["summary"]["processingFailures"], 1);
    assert_eq!(value["reports"].as_array().unwrap().len(), 3);
    assert_eq!(value["reports"][0]["passed"], true);
    assert_eq!(value["reports"][1]["itemKind"], "image");
    assert_eq!(value["reports"][2]["issues"][0]["category"], "processing");
}

#[tokio::test]
async fn test_text_rendering_of_batch() {
    let dir = TempDir::new().unwrap();
    let paths = mixed_batch(&dir);

    let runner = BatchRunner::new(Arc::new(ValidationConfig::default()));
    let (reports, summary) = runner.run_paths(&paths).await;

    let text = ReportRenderer::new(OutputFormat::Text)
        .render(&reports, &summary)
        .unwrap();

    assert!(text.contains("PASS "));
    assert!(text.contains("FAIL "));
    assert!(text.contains("ERROR"));
    assert!(text.contains("[resolution]"));
    assert!(text.contains("3 items: 1 passed, 1 failed, 1 could not be processed"));
}
