//! Report rendering.
//!
//! Turns finished reports into text for a terminal or a JSON document.
//! Rendering never touches the reports themselves.

use serde::Serialize;
use std::fmt::Write;

use crate::batch::BatchSummary;
use crate::config::{OutputFormat, Severity};
use crate::error::Result;
use crate::output::formatter::MessageLevel;
use crate::validation::ValidationReport;

/// Renders reports in one output format.
#[derive(Debug, Clone, Copy)]
pub struct ReportRenderer {
    format: OutputFormat,
    colored: bool,
    verbose: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    summary: &'a BatchSummary,
    reports: &'a [ValidationReport],
}

impl ReportRenderer {
    /// Create a renderer.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colored: false,
            verbose: false,
        }
    }

    /// Enable ANSI colors in text output.
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Include colorant sets and raster counts in text output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Render every report followed by the batch summary.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render(&self, reports: &[ValidationReport], summary: &BatchSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let output = JsonOutput { summary, reports };
                Ok(serde_json::to_string_pretty(&output)?)
            }
            OutputFormat::Text => Ok(self.render_text(reports, summary)),
        }
    }

    fn render_text(&self, reports: &[ValidationReport], summary: &BatchSummary) -> String {
        let mut out = String::new();
        for report in reports {
            self.write_report(&mut out, report);
        }
        out.push('\n');
        out.push_str(&self.summary_line(summary));
        out.push('\n');
        out
    }

    /// Render one report as text.
    pub fn render_report(&self, report: &ValidationReport) -> String {
        let mut out = String::new();
        self.write_report(&mut out, report);
        out
    }

    fn write_report(&self, out: &mut String, report: &ValidationReport) {
        let (label, level) = if report.passed {
            ("PASS ", MessageLevel::Success)
        } else if report.is_processing_failure() {
            ("ERROR", MessageLevel::Error)
        } else {
            ("FAIL ", MessageLevel::Error)
        };

        let _ = write!(out, "{}  {}", level.paint(label, self.colored), report.item_name);
        if let Some(details) = details(report) {
            let _ = write!(out, "  ({details})");
        }
        out.push('\n');

        for issue in &report.issues {
            let (name, level) = match issue.severity {
                Severity::Error => ("error", MessageLevel::Error),
                Severity::Warning => ("warning", MessageLevel::Warning),
            };
            let message = issue.to_string().replace('\n', "\n           ");
            let _ = writeln!(out, "  {}  {message}", level.paint(&format!("{name:<7}"), self.colored));
        }

        for note in &report.notes {
            let _ = writeln!(out, "  {}  {note}", MessageLevel::Debug.paint("note   ", self.colored));
        }

        if self.verbose && !report.is_processing_failure() {
            let colorants = if report.colorants.is_empty() {
                "none".to_string()
            } else {
                report.colorants.iter().cloned().collect::<Vec<_>>().join(", ")
            };
            let _ = writeln!(out, "  colorants: {colorants}");
            let _ = writeln!(out, "  rasters:   {}", report.raster_count);
        }
    }

    fn summary_line(&self, summary: &BatchSummary) -> String {
        let mut line = format!(
            "{} {}: {} passed, {} failed",
            summary.total,
            plural(summary.total, "item", "items"),
            summary.passed,
            summary.failed
        );
        if summary.processing_failures > 0 {
            let _ = write!(line, ", {} could not be processed", summary.processing_failures);
        }
        if summary.warnings > 0 {
            let _ = write!(
                line,
                ", {} {}",
                summary.warnings,
                plural(summary.warnings, "warning", "warnings")
            );
        }
        let _ = write!(line, " ({:.2}s)", summary.elapsed.as_secs_f64());

        let level = if summary.all_passed() {
            MessageLevel::Success
        } else {
            MessageLevel::Error
        };
        level.paint(&line, self.colored)
    }
}

fn details(report: &ValidationReport) -> Option<String> {
    let kind = report.item_kind?;
    if report.is_processing_failure() {
        return Some(kind.to_string());
    }

    let mut details = format!(
        "{kind}, {} {}",
        report.page_count,
        plural(report.page_count, "page", "pages")
    );
    if let Some(size) = report.measured_size {
        let _ = write!(details, ", {size}");
    }
    Some(details)
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
