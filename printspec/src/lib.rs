//! printspec - Validate print-ready files against a print shop's production
//! specification.
//!
//! This library checks PDF documents and standalone raster images before
//! they go to press. For each item it verifies:
//!
//! - Physical size against a list of accepted sizes, in either orientation
//! - Raster resolution against a minimum DPI
//! - Colorant models against an accepted list
//! - That text and images stay clear of a safe-zone margin (documents only)
//!
//! Every finding is collected into a [`ValidationReport`]; a per-category
//! [`SeverityPolicy`](config::SeverityPolicy) decides which findings block
//! the item and which are advisory.
//!
//! # Examples
//!
//! ## Validate a single item
//!
//! ```no_run
//! use printspec::config::ValidationConfig;
//! use printspec::io::InputItem;
//! use printspec::validation::Validator;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("postcard.pdf")?;
//! let item = InputItem::detect("postcard.pdf", bytes)?;
//!
//! let validator = Validator::new(Arc::new(ValidationConfig::default()));
//! let report = validator.validate(&item);
//! for issue in &report.issues {
//!     println!("{issue}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Validate a batch of files
//!
//! ```no_run
//! use printspec::batch::BatchRunner;
//! use printspec::config::{OutputFormat, ValidationConfig};
//! use printspec::output::ReportRenderer;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = BatchRunner::new(Arc::new(ValidationConfig::default()));
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.jpg")];
//! let (reports, summary) = runner.run_paths(&paths).await;
//!
//! let text = ReportRenderer::new(OutputFormat::Text).render(&reports, &summary)?;
//! print!("{text}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod checks;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod output;
pub mod parse;
pub mod raster;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use batch::{BatchRunner, BatchSummary};
pub use config::{RunConfig, ValidationConfig};
pub use error::{PrintSpecError, Result};
pub use io::{InputItem, ItemKind};
pub use validation::{ValidationIssue, ValidationReport, Validator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
