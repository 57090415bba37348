//! End-to-end validation of standalone raster images.

use crate::common::*;
use printspec::config::{Category, PhysicalSize, ValidationConfig};
use printspec::{BatchRunner, ItemKind};
use rstest::rstest;
use std::sync::Arc;
use tempfile::TempDir;

#[rstest]
#[case::portrait(1200, 1800)]
#[case::landscape(1800, 1200)]
#[tokio::test]
async fn test_four_by_six_photo_passes(#[case] width: u32, #[case] height: u32) {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "photo.jpg", &jpeg(width, height, 300));

    let runner = BatchRunner::new(Arc::new(ValidationConfig::default()));
    let (reports, summary) = runner.run_paths(&[path]).await;
    let report = &reports[0];

    assert!(report.passed, "unexpected issues: {:?}", report.issues);
    assert_eq!(report.item_kind, Some(ItemKind::Image));
    assert_eq!(report.page_count, 1);
    assert_eq!(report.colorants.iter().collect::<Vec<_>>(), vec!["RGB"]);
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn test_png_without_density_defaults_to_72_dpi() {
    let dir = TempDir::new().unwrap();
    // 288×432 px at 72 DPI is exactly 4×6 in.
    let path = write_fixture(dir.path(), "scan.png", &png(288, 432));

    let runner = BatchRunner::new(Arc::new(ValidationConfig::default()));
    let (reports, _) = runner.run_paths(&[path]).await;
    let report = &reports[0];

    assert_eq!(report.measured_size, Some(PhysicalSize::new(4.0, 6.0)));
    assert!(!report.passed);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].category, Category::Resolution);
    assert!(report.issues[0].message.starts_with("Image is 72×72 DPI"));
}

#[tokio::test]
async fn test_image_size_uses_image_tolerance() {
    let dir = TempDir::new().unwrap();
    // 1215 px at 300 DPI is 4.05 in wide.
    let path = write_fixture(dir.path(), "near.jpg", &jpeg(1215, 1800, 300));

    let strict = ValidationConfig {
        image_tolerance: 0.01,
        ..ValidationConfig::default()
    };
    let (reports, _) = BatchRunner::new(Arc::new(strict))
        .run_paths(std::slice::from_ref(&path))
        .await;
    assert_eq!(reports[0].issues.len(), 1);
    assert_eq!(reports[0].issues[0].category, Category::Size);
    assert_eq!(reports[0].issues[0].page, None);

    let relaxed = ValidationConfig {
        image_tolerance: 0.1,
        ..ValidationConfig::default()
    };
    let (reports, _) = BatchRunner::new(Arc::new(relaxed)).run_paths(&[path]).await;
    assert!(reports[0].passed, "unexpected issues: {:?}", reports[0].issues);
}

#[tokio::test]
async fn test_rgb_rejected_when_only_cmyk_accepted() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "photo.jpg", &jpeg(1200, 1800, 300));

    let config = ValidationConfig {
        accepted_colorants: ["CMYK", "DeviceCMYK"].into_iter().map(String::from).collect(),
        ..ValidationConfig::default()
    };
    let (reports, _) = BatchRunner::new(Arc::new(config)).run_paths(&[path]).await;
    let report = &reports[0];

    assert!(!report.passed);
    assert_eq!(report.issues[0].category, Category::Colorant);
    assert!(report.issues[0].message.contains("RGB"));
}
