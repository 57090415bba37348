//! Validation of one input item against the production constraints.
//!
//! The [`Validator`] runs every check on an item and folds the findings
//! into a [`ValidationReport`]:
//! - Size matching (every page, or the image's physical size)
//! - Raster resolution
//! - Colorant models
//! - Safe-zone margins (documents only)
//!
//! All checks run even when an earlier one finds a problem. Items that
//! cannot be decoded produce a report with a single `processing` issue.
//!
//! # Examples
//!
//! ```no_run
//! use printspec::config::ValidationConfig;
//! use printspec::io::{InputItem, ItemKind};
//! use printspec::validation::Validator;
//! use std::sync::Arc;
//!
//! let validator = Validator::new(Arc::new(ValidationConfig::default()));
//! let bytes = std::fs::read("flyer.pdf").unwrap();
//! let report = validator.validate(&InputItem::new("flyer.pdf", ItemKind::Document, bytes));
//! println!("{}: {}", report.item_name, if report.passed { "ok" } else { "failed" });
//! ```

pub mod report;

pub use report::{Note, ReportBuilder, ValidationIssue, ValidationReport};

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::checks::{
    ColorantOutcome, RasterSample, ResolutionOutcome, check_image_size, check_margins, check_page_sizes,
    check_resolution, classify, detect_colorants,
};
use crate::config::{PhysicalSize, ValidationConfig};
use crate::error::Result;
use crate::io::{InputItem, ItemKind};
use crate::parse::{ParseOptions, parse_document};
use crate::raster::probe_image;

/// Validates items against a shared configuration.
#[derive(Debug, Clone)]
pub struct Validator {
    config: Arc<ValidationConfig>,
}

impl Validator {
    /// Create a validator.
    pub fn new(config: Arc<ValidationConfig>) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate one item.
    ///
    /// Never fails: decode errors become a failed report.
    #[instrument(skip_all, fields(name = %item.name, kind = %item.kind))]
    pub fn validate(&self, item: &InputItem) -> ValidationReport {
        let result = match item.kind {
            ItemKind::Document => self.validate_document(item),
            ItemKind::Image => self.validate_image(item),
        };

        match result {
            Ok(report) => {
                debug!(
                    passed = report.passed,
                    issues = report.issues.len(),
                    "item validated"
                );
                report
            }
            Err(err) => {
                debug!(error = %err, "item could not be processed");
                ValidationReport::processing_failure(&item.name, Some(item.kind), &err)
            }
        }
    }

    fn validate_document(&self, item: &InputItem) -> Result<ValidationReport> {
        let config = &self.config;
        let options = ParseOptions {
            image_placements: config.image_placements,
            ..ParseOptions::default()
        };
        let doc = parse_document(&item.name, &item.bytes, options)?;

        let size_issues = check_page_sizes(&doc.pages, &config.accepted_sizes, config.document_tolerance);

        let samples: Vec<RasterSample> = doc
            .images
            .iter()
            .map(|image| RasterSample::from_info(&image.info, Some(image.page)))
            .collect();
        let resolution = check_resolution(&samples, config.min_dpi);

        let colorants = detect_colorants(&doc);
        let colorant = classify(&colorants, &config.accepted_colorants);

        let margin_issues = check_margins(&doc.pages, config.margin);

        let builder = ValidationReport::builder(&item.name, ItemKind::Document)
            .page_count(doc.page_count())
            .measured_size(doc.first_page_size())
            .raster_count(samples.len());

        Ok(self.finish(builder, size_issues, &resolution, colorants, &colorant, margin_issues))
    }

    fn validate_image(&self, item: &InputItem) -> Result<ValidationReport> {
        let config = &self.config;
        let info = probe_image(&item.name, &item.bytes)?;

        let measured = PhysicalSize::new(info.width_inches(), info.height_inches());
        let size_issues = check_image_size(measured, &config.accepted_sizes, config.image_tolerance);

        let samples = [RasterSample::from_info(&info, None)];
        let resolution = check_resolution(&samples, config.min_dpi);

        let colorants = BTreeSet::from([info.mode.clone()]);
        let colorant = classify(&colorants, &config.accepted_colorants);

        let builder = ValidationReport::builder(&item.name, ItemKind::Image)
            .page_count(1)
            .measured_size(Some(measured))
            .raster_count(samples.len());

        Ok(self.finish(
            builder,
            size_issues,
            &resolution,
            colorants,
            &colorant,
            Vec::new(),
        ))
    }

    /// Apply the severity policy and collect notes.
    fn finish(
        &self,
        builder: ReportBuilder,
        size_issues: impl IntoIterator<Item = ValidationIssue>,
        resolution: &ResolutionOutcome,
        colorants: BTreeSet<String>,
        colorant: &ColorantOutcome,
        margin_issues: Vec<ValidationIssue>,
    ) -> ValidationReport {
        let config = &self.config;
        let policy = config.severity;

        let issues = size_issues
            .into_iter()
            .chain(resolution.issues(config.min_dpi))
            .chain(colorant.issue(&config.accepted_colorants))
            .chain(margin_issues)
            .map(|issue| {
                let severity = policy.severity_for(issue.category);
                issue.with_severity(severity)
            });

        let mut builder = builder.issues(issues).colorants(colorants);
        if matches!(resolution, ResolutionOutcome::NoRasterContent) {
            builder = builder.note(Note::NoRasterContent);
        }
        if matches!(colorant, ColorantOutcome::NoColorantInformation) {
            builder = builder.note(Note::NoColorantInformation);
        }
        builder.build()
    }
}
