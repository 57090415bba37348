//! Inputs that cannot be validated.

use crate::common::*;
use printspec::config::{Category, ValidationConfig};
use printspec::io::{InputItem, ItemKind};
use printspec::{BatchRunner, PrintSpecError, Validator};
use std::sync::Arc;
use tempfile::TempDir;

fn runner() -> BatchRunner {
    BatchRunner::new(Arc::new(ValidationConfig::default()))
}

#[tokio::test]
async fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let (reports, summary) = runner().run_paths(&[dir.path().join("gone.pdf")]).await;

    let report = &reports[0];
    assert!(report.is_processing_failure());
    assert_eq!(report.item_kind, Some(ItemKind::Document));
    assert!(report.issues[0].message.contains("File not found"));
    assert_eq!(summary.exit_code(), 3);
}

#[tokio::test]
async fn test_directory_input() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("proofs");
    std::fs::create_dir(&nested).unwrap();

    let (reports, _) = runner().run_paths(&[nested]).await;

    assert!(reports[0].is_processing_failure());
    assert!(reports[0].issues[0].message.contains("Not a file"));
}

#[tokio::test]
async fn test_unsupported_file_type() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "notes.txt", b"plain text");

    let (reports, _) = runner().run_paths(&[path]).await;

    assert!(reports[0].is_processing_failure());
    assert_eq!(reports[0].item_kind, None);
    assert!(reports[0].issues[0].message.contains("Unsupported input type"));
}

#[tokio::test]
async fn test_corrupt_image() {
    let dir = TempDir::new().unwrap();
    let mut bytes = jpeg(64, 64, 300);
    bytes.truncate(12);
    let path = write_fixture(dir.path(), "broken.jpg", &bytes);

    let (reports, _) = runner().run_paths(&[path]).await;

    assert!(reports[0].is_processing_failure());
    assert_eq!(reports[0].issues[0].category, Category::Processing);
}

#[test]
fn test_detect_rejects_unknown_bytes() {
    let err = InputItem::detect("blob", b"\x00\x01\x02".to_vec()).unwrap_err();
    assert!(matches!(err, PrintSpecError::UnsupportedInput { .. }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_validator_never_panics_on_garbage_document() {
    let validator = Validator::new(Arc::new(ValidationConfig::default()));
    let item = InputItem::new("garbage.pdf", ItemKind::Document, b"%PDF-1.7\n garbage".to_vec());

    let report = validator.validate(&item);

    assert!(report.is_processing_failure());
    assert_eq!(report.page_count, 0);
}
