//! Validation issues and per-item reports.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::config::{Category, PhysicalSize, Severity};
use crate::error::PrintSpecError;
use crate::io::ItemKind;

/// One finding about an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// What kind of constraint was violated.
    pub category: Category,
    /// Whether the issue fails the item.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// 1-based page the issue was found on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl ValidationIssue {
    /// Create an error-severity issue.
    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            severity: Severity::Error,
            message: message.into(),
            page: None,
        }
    }

    /// Attach a page number.
    pub fn on_page(mut self, page: impl Into<Option<u32>>) -> Self {
        self.page = page.into();
        self
    }

    /// Replace the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Whether this issue fails the item.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Informational outcome that is neither a pass nor a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Note {
    /// The item contains no raster images to check.
    NoRasterContent,
    /// No colorant model could be detected.
    NoColorantInformation,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRasterContent => write!(f, "No raster images found"),
            Self::NoColorantInformation => {
                write!(f, "No colorant information found (possibly text-only or grayscale)")
            }
        }
    }
}

/// The outcome of validating one item.
///
/// `passed` is derived from the issue list when the report is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Name of the item.
    pub item_name: String,
    /// Kind of item, when it could be determined.
    pub item_kind: Option<ItemKind>,
    /// Number of pages (1 for a standalone image, 0 when unreadable).
    pub page_count: usize,
    /// Measured size of the first page or of the image.
    pub measured_size: Option<PhysicalSize>,
    /// True iff there are no error-severity issues.
    pub passed: bool,
    /// Issues in check order.
    pub issues: Vec<ValidationIssue>,
    /// Final detected colorant set.
    pub colorants: BTreeSet<String>,
    /// Number of raster samples checked for resolution.
    pub raster_count: usize,
    /// Informational outcomes.
    pub notes: Vec<Note>,
}

impl ValidationReport {
    /// Start a report for an item.
    pub fn builder(item_name: impl Into<String>, item_kind: ItemKind) -> ReportBuilder {
        ReportBuilder {
            item_name: item_name.into(),
            item_kind,
            page_count: 0,
            measured_size: None,
            issues: Vec::new(),
            colorants: BTreeSet::new(),
            raster_count: 0,
            notes: Vec::new(),
        }
    }

    /// A failed report for an item that could not be processed.
    pub fn processing_failure(
        item_name: impl Into<String>,
        item_kind: Option<ItemKind>,
        error: &PrintSpecError,
    ) -> Self {
        let issues = vec![ValidationIssue::error(Category::Processing, error.to_string())];
        Self {
            item_name: item_name.into(),
            item_kind,
            page_count: 0,
            measured_size: None,
            passed: false,
            issues,
            colorants: BTreeSet::new(),
            raster_count: 0,
            notes: Vec::new(),
        }
    }

    /// Issues with error severity.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.is_error())
    }

    /// Issues with warning severity.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| !issue.is_error())
    }

    /// Number of error-severity issues.
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Whether the item could not be read or decoded.
    pub fn is_processing_failure(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.category == Category::Processing)
    }
}

/// Accumulates check results for one item.
#[derive(Debug)]
pub struct ReportBuilder {
    item_name: String,
    item_kind: ItemKind,
    page_count: usize,
    measured_size: Option<PhysicalSize>,
    issues: Vec<ValidationIssue>,
    colorants: BTreeSet<String>,
    raster_count: usize,
    notes: Vec<Note>,
}

impl ReportBuilder {
    /// Set the page count.
    pub fn page_count(mut self, page_count: usize) -> Self {
        self.page_count = page_count;
        self
    }

    /// Set the measured size.
    pub fn measured_size(mut self, size: Option<PhysicalSize>) -> Self {
        self.measured_size = size;
        self
    }

    /// Set the final colorant set.
    pub fn colorants(mut self, colorants: BTreeSet<String>) -> Self {
        self.colorants = colorants;
        self
    }

    /// Set the number of raster samples.
    pub fn raster_count(mut self, raster_count: usize) -> Self {
        self.raster_count = raster_count;
        self
    }

    /// Append issues.
    pub fn issues(mut self, issues: impl IntoIterator<Item = ValidationIssue>) -> Self {
        self.issues.extend(issues);
        self
    }

    /// Append a note.
    pub fn note(mut self, note: Note) -> Self {
        if !self.notes.contains(&note) {
            self.notes.push(note);
        }
        self
    }

    /// Finish the report.
    pub fn build(self) -> ValidationReport {
        let passed = !self.issues.iter().any(ValidationIssue::is_error);
        ValidationReport {
            item_name: self.item_name,
            item_kind: Some(self.item_kind),
            page_count: self.page_count,
            measured_size: self.measured_size,
            passed,
            issues: self.issues,
            colorants: self.colorants,
            raster_count: self.raster_count,
            notes: self.notes,
        }
    }
}
