//! End-to-end validation of PDF documents read from disk.

use crate::common::*;
use printspec::config::{Category, Severity, SeverityPolicy, ValidationConfig};
use printspec::validation::Note;
use printspec::{BatchRunner, ItemKind};
use std::sync::Arc;
use tempfile::TempDir;

fn runner(config: ValidationConfig) -> BatchRunner {
    BatchRunner::new(Arc::new(config))
}

#[tokio::test]
async fn test_compliant_letter_document() {
    let dir = TempDir::new().unwrap();
    let pdf = build_pdf(vec![
        PageSpec::letter()
            .image(placed_jpeg(300, "DeviceRGB"))
            .text(72.0, 700.0, "Spring catalogue"),
    ]);
    let path = write_fixture(dir.path(), "catalogue.pdf", &pdf);

    let (reports, summary) = runner(ValidationConfig::default()).run_paths(&[path]).await;

    let report = &reports[0];
    assert!(report.passed, "unexpected issues: {:?}", report.issues);
    assert_eq!(report.item_kind, Some(ItemKind::Document));
    assert_eq!(report.page_count, 1);
    assert_eq!(report.raster_count, 1);
    assert!(report.colorants.contains("DeviceRGB"));
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn test_landscape_orientation_is_accepted() {
    let dir = TempDir::new().unwrap();
    let pdf = build_pdf(vec![PageSpec::inches(11.0, 8.5).image(placed_jpeg(300, "DeviceCMYK"))]);
    let path = write_fixture(dir.path(), "landscape.pdf", &pdf);

    let (reports, _) = runner(ValidationConfig::default()).run_paths(&[path]).await;

    assert!(reports[0].passed, "unexpected issues: {:?}", reports[0].issues);
}

#[tokio::test]
async fn test_every_violation_category_is_reported() {
    let dir = TempDir::new().unwrap();
    let pdf = build_pdf(vec![
        PageSpec::letter()
            .image(placed_jpeg(72, "Indexed"))
            .text(0.0, 400.0, "Flush left"),
        PageSpec::inches(9.0, 12.0).image(placed_jpeg(300, "DeviceRGB")),
    ]);
    let path = write_fixture(dir.path(), "flyer.pdf", &pdf);

    let (reports, summary) = runner(ValidationConfig::default()).run_paths(&[path]).await;
    let report = &reports[0];

    assert!(!report.passed);
    assert_eq!(report.page_count, 2);

    let categories: Vec<Category> = report.issues.iter().map(|issue| issue.category).collect();
    assert_eq!(
        categories,
        vec![
            Category::Size,
            Category::Resolution,
            Category::Colorant,
            Category::Margin
        ]
    );

    let size = &report.issues[0];
    assert_eq!(size.page, Some(2));
    assert!(size.message.starts_with("Page 2 is"));

    let resolution = &report.issues[1];
    assert_eq!(resolution.page, Some(1));
    assert!(resolution.message.contains("72×72 DPI"));

    assert!(report.issues[2].message.contains("Indexed"));
    assert!(report.issues[3].message.contains("Flush left"));

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn test_advisory_policy_passes_with_warnings() {
    let dir = TempDir::new().unwrap();
    let pdf = build_pdf(vec![
        PageSpec::letter()
            .image(placed_jpeg(72, "DeviceRGB"))
            .text(4.0, 400.0, "Bleeds"),
    ]);
    let path = write_fixture(dir.path(), "proof.pdf", &pdf);

    let config = ValidationConfig {
        severity: SeverityPolicy::advisory(),
        ..ValidationConfig::default()
    };
    let (reports, summary) = runner(config).run_paths(&[path]).await;
    let report = &reports[0];

    assert!(report.passed);
    assert_eq!(report.issues.len(), 2);
    assert!(report.issues.iter().all(|issue| issue.severity == Severity::Warning));
    assert_eq!(summary.warnings, 2);
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn test_text_only_document_gets_notes() {
    let dir = TempDir::new().unwrap();
    let pdf = build_pdf(vec![PageSpec::inches(5.0, 7.0).text(72.0, 300.0, "Thank you")]);
    let path = write_fixture(dir.path(), "card.pdf", &pdf);

    let (reports, _) = runner(ValidationConfig::default()).run_paths(&[path]).await;
    let report = &reports[0];

    assert!(report.passed);
    assert_eq!(report.raster_count, 0);
    assert_eq!(
        report.notes,
        vec![Note::NoRasterContent, Note::NoColorantInformation]
    );
}

#[tokio::test]
async fn test_fill_operators_contribute_colorants() {
    let dir = TempDir::new().unwrap();
    let pdf = build_pdf(vec![
        PageSpec::letter()
            .raw("0.2 0.4 0.6 rg 72 72 100 100 re f")
            .text(72.0, 300.0, "Coloured"),
    ]);
    let path = write_fixture(dir.path(), "swatch.pdf", &pdf);

    let (reports, _) = runner(ValidationConfig::default()).run_paths(&[path]).await;
    let report = &reports[0];

    assert!(report.passed, "unexpected issues: {:?}", report.issues);
    assert!(report.colorants.contains("DeviceRGB"));
    assert!(!report.notes.contains(&Note::NoColorantInformation));
}

#[tokio::test]
async fn test_image_placements_can_be_excluded_from_margins() {
    let dir = TempDir::new().unwrap();
    let full_bleed = PlacedImage {
        placement: [0.0, 0.0, 612.0, 792.0],
        ..placed_jpeg(300, "DeviceRGB")
    };
    let pdf = build_pdf(vec![PageSpec::letter().image(full_bleed)]);
    let path = write_fixture(dir.path(), "bleed.pdf", &pdf);

    let (reports, _) = runner(ValidationConfig::default())
        .run_paths(std::slice::from_ref(&path))
        .await;
    assert_eq!(reports[0].issues.len(), 1);
    assert_eq!(reports[0].issues[0].category, Category::Margin);

    let config = ValidationConfig {
        image_placements: false,
        ..ValidationConfig::default()
    };
    let (reports, _) = runner(config).run_paths(&[path]).await;
    assert!(reports[0].passed, "unexpected issues: {:?}", reports[0].issues);
}
