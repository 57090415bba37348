//! Reading input items from disk.
//!
//! # Examples
//!
//! ```no_run
//! use printspec::io::InputReader;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = InputReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.jpg")];
//! let (results, stats) = reader.load_all(&paths, 4).await;
//! println!("Read {} of {} files", stats.success_count, results.len());
//! # Ok(())
//! # }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{PrintSpecError, Result};
use crate::io::InputItem;
use crate::utils::format_file_size;

/// Result of a load operation (success or failure).
pub type LoadResult = Result<InputItem>;

/// Statistics for a batch load operation.
#[derive(Debug, Clone)]
pub struct LoadStatistics {
    /// Number of files successfully read.
    pub success_count: usize,

    /// Number of files that failed to read.
    pub failure_count: usize,

    /// Total time taken for all reads.
    pub total_time: Duration,

    /// Total size of successfully read files.
    pub total_size: u64,
}

impl LoadStatistics {
    /// Create statistics from load results.
    pub fn from_results(results: &[LoadResult], total_time: Duration) -> Self {
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut total_size = 0;

        for result in results {
            match result {
                Ok(item) => {
                    success_count += 1;
                    total_size += item.len() as u64;
                }
                Err(_) => failure_count += 1,
            }
        }

        Self {
            success_count,
            failure_count,
            total_time,
            total_size,
        }
    }

    /// Format total size as human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Reads files into [`InputItem`]s.
#[derive(Debug, Clone, Default)]
pub struct InputReader;

impl InputReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a single file and infer its kind.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist or is a directory
    /// - The file cannot be read
    /// - The content is neither a PDF nor a supported image
    pub async fn load(&self, path: &Path) -> Result<InputItem> {
        let metadata = tokio::fs::metadata(path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                PrintSpecError::file_not_found(path.to_path_buf())
            } else {
                PrintSpecError::FileNotAccessible {
                    path: path.to_path_buf(),
                    source: err,
                }
            }
        })?;

        if !metadata.is_file() {
            return Err(PrintSpecError::not_a_file(path.to_path_buf()));
        }

        let bytes =
            tokio::fs::read(path)
                .await
                .map_err(|err| PrintSpecError::FileNotAccessible {
                    path: path.to_path_buf(),
                    source: err,
                })?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "read input");

        InputItem::detect(path.display().to_string(), bytes)
    }

    /// Read many files with bounded concurrency.
    ///
    /// Results keep the order of `paths`.
    pub async fn load_parallel(&self, paths: &[PathBuf], workers: usize) -> Vec<LoadResult> {
        use futures::stream::{self, StreamExt};

        let workers = workers.max(1);

        let tasks = paths.iter().enumerate().map(|(idx, path)| {
            let reader = self.clone();
            let path = path.clone();
            async move { (idx, reader.load(&path).await) }
        });

        let mut indexed_results: Vec<(usize, LoadResult)> = stream::iter(tasks)
            .buffer_unordered(workers)
            .collect::<Vec<_>>()
            .await;

        // Sort by original index to maintain order
        indexed_results.sort_by_key(|(idx, _)| *idx);
        indexed_results.into_iter().map(|(_, result)| result).collect()
    }

    /// Read many files and collect statistics.
    pub async fn load_all(
        &self,
        paths: &[PathBuf],
        max_workers: usize,
    ) -> (Vec<LoadResult>, LoadStatistics) {
        let start = Instant::now();
        let results = self.load_parallel(paths, max_workers).await;
        let stats = LoadStatistics::from_results(&results, start.elapsed());
        (results, stats)
    }
}
