//! Batch validation of many items.
//!
//! Items are validated with bounded concurrency. Each validation runs on the
//! blocking thread pool under an optional per-item deadline. A failing,
//! panicking or timed-out item becomes a failed report; the batch itself
//! never aborts. Reports come back in input order.
//!
//! # Examples
//!
//! ```no_run
//! use printspec::batch::BatchRunner;
//! use printspec::config::ValidationConfig;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let runner = BatchRunner::new(Arc::new(ValidationConfig::default())).with_jobs(4);
//! let (reports, summary) = runner.run_paths(&[PathBuf::from("flyer.pdf")]).await;
//! println!("{} of {} passed", summary.passed, reports.len());
//! std::process::exit(summary.exit_code());
//! # }
//! ```

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::{RunConfig, ValidationConfig};
use crate::error::PrintSpecError;
use crate::io::{InputItem, InputReader, ItemKind};
use crate::validation::{ValidationReport, Validator};

/// Exit status when every item passed.
pub const EXIT_PASSED: i32 = 0;

/// Exit status when at least one item failed validation.
pub const EXIT_VALIDATION_FAILED: i32 = 1;

/// Exit status when at least one item could not be read or decoded.
pub const EXIT_PROCESSING_FAILED: i32 = 3;

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Number of items.
    pub total: usize,
    /// Items without error-severity issues.
    pub passed: usize,
    /// Items that were checked and failed.
    pub failed: usize,
    /// Items that could not be read, decoded or finished in time.
    pub processing_failures: usize,
    /// Warning-severity issues across all items.
    pub warnings: usize,
    /// Wall-clock time for the batch.
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl BatchSummary {
    /// Summarize a set of reports.
    pub fn from_reports(reports: &[ValidationReport], elapsed: Duration) -> Self {
        let mut summary = Self {
            total: reports.len(),
            elapsed,
            ..Self::default()
        };

        for report in reports {
            if report.passed {
                summary.passed += 1;
            } else if report.is_processing_failure() {
                summary.processing_failures += 1;
            } else {
                summary.failed += 1;
            }
            summary.warnings += report.warnings().count();
        }

        summary
    }

    /// Whether every item passed.
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// Process exit status for this batch.
    ///
    /// Processing failures take precedence over validation failures.
    pub fn exit_code(&self) -> i32 {
        if self.processing_failures > 0 {
            EXIT_PROCESSING_FAILED
        } else if self.failed > 0 {
            EXIT_VALIDATION_FAILED
        } else {
            EXIT_PASSED
        }
    }
}

/// Validates batches of items.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    validator: Validator,
    jobs: usize,
    deadline: Option<Duration>,
}

impl BatchRunner {
    /// Create a runner using all available cores and no deadline.
    pub fn new(config: Arc<ValidationConfig>) -> Self {
        Self {
            validator: Validator::new(config),
            jobs: RunConfig::default().effective_jobs(),
            deadline: None,
        }
    }

    /// Create a runner from batch settings.
    pub fn from_run_config(config: Arc<ValidationConfig>, run: &RunConfig) -> Self {
        Self::new(config)
            .with_jobs(run.effective_jobs())
            .with_deadline(run.deadline)
    }

    /// Set the number of items validated concurrently.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set the per-item deadline.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Number of items validated concurrently.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Validate items, in input order.
    pub async fn run(&self, items: Vec<InputItem>) -> Vec<ValidationReport> {
        self.run_with_progress(items, |_, _, _| {}).await
    }

    /// Validate items, calling `on_progress(done, total, report)` as each
    /// one finishes.
    ///
    /// Completion order is not input order; the returned reports are.
    pub async fn run_with_progress<F>(&self, items: Vec<InputItem>, on_progress: F) -> Vec<ValidationReport>
    where
        F: FnMut(usize, usize, &ValidationReport),
    {
        let validator = self.validator.clone();
        self.run_each(items, move |item| validator.validate(item), on_progress)
            .await
    }

    /// Run `work` on every item under the concurrency limit and deadline.
    async fn run_each<W, F>(&self, items: Vec<InputItem>, work: W, mut on_progress: F) -> Vec<ValidationReport>
    where
        W: Fn(&InputItem) -> ValidationReport + Clone + Send + 'static,
        F: FnMut(usize, usize, &ValidationReport),
    {
        let total = items.len();
        let tasks = items.into_iter().enumerate().map(|(idx, item)| {
            let work = work.clone();
            async move { (idx, self.guarded(item, work).await) }
        });

        let mut stream = stream::iter(tasks).buffer_unordered(self.jobs);
        let mut indexed_reports = Vec::with_capacity(total);

        while let Some((idx, report)) = stream.next().await {
            on_progress(indexed_reports.len() + 1, total, &report);
            indexed_reports.push((idx, report));
        }

        indexed_reports.sort_by_key(|(idx, _)| *idx);
        indexed_reports.into_iter().map(|(_, report)| report).collect()
    }

    /// Read files and validate them.
    ///
    /// Files that cannot be read become processing-failure reports in place.
    pub async fn run_paths(&self, paths: &[PathBuf]) -> (Vec<ValidationReport>, BatchSummary) {
        self.run_paths_with_progress(paths, |_, _, _| {}).await
    }

    /// [`run_paths`](Self::run_paths) with a progress callback.
    pub async fn run_paths_with_progress<F>(
        &self,
        paths: &[PathBuf],
        mut on_progress: F,
    ) -> (Vec<ValidationReport>, BatchSummary)
    where
        F: FnMut(usize, usize, &ValidationReport),
    {
        let start = Instant::now();
        let (results, stats) = InputReader::new().load_all(paths, self.jobs).await;
        debug!(
            read = stats.success_count,
            unreadable = stats.failure_count,
            size = %stats.format_total_size(),
            "inputs read"
        );

        let total = results.len();
        let mut reports: Vec<Option<ValidationReport>> = Vec::with_capacity(total);
        let mut pending = Vec::new();
        let mut pending_slots = Vec::new();

        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(item) => {
                    pending_slots.push(reports.len());
                    pending.push(item);
                    reports.push(None);
                }
                Err(err) => {
                    let name = path.display().to_string();
                    let kind = ItemKind::from_extension(&name);
                    reports.push(Some(ValidationReport::processing_failure(name, kind, &err)));
                }
            }
        }

        let mut unreadable = 0;
        for report in reports.iter().flatten() {
            unreadable += 1;
            on_progress(unreadable, total, report);
        }

        let validated = self
            .run_with_progress(pending, |done, _, report| {
                on_progress(unreadable + done, total, report)
            })
            .await;

        for (slot, report) in pending_slots.into_iter().zip(validated) {
            reports[slot] = Some(report);
        }

        let reports: Vec<ValidationReport> = reports.into_iter().flatten().collect();
        let summary = BatchSummary::from_reports(&reports, start.elapsed());
        (reports, summary)
    }

    async fn guarded<W>(&self, item: InputItem, work: W) -> ValidationReport
    where
        W: FnOnce(&InputItem) -> ValidationReport + Send + 'static,
    {
        let name = item.name.clone();
        let kind = item.kind;

        let handle = tokio::task::spawn_blocking(move || work(&item));

        let joined = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(item = %name, ?deadline, "validation deadline exceeded");
                    let err = PrintSpecError::DeadlineExceeded {
                        name: name.clone(),
                        deadline,
                    };
                    return ValidationReport::processing_failure(name, Some(kind), &err);
                }
            },
            None => handle.await,
        };

        joined.unwrap_or_else(|join_err| {
            warn!(item = %name, error = %join_err, "validation worker failed");
            let err = PrintSpecError::WorkerFailed {
                name: name.clone(),
                reason: join_err.to_string(),
            };
            ValidationReport::processing_failure(name, Some(kind), &err)
        })
    }
}
