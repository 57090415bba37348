//! The individual specification checks.
//!
//! Each check is a pure function over parsed input that returns its
//! findings as [`ValidationIssue`](crate::validation::ValidationIssue)s at
//! error severity. Severity policy is applied later by the validator.

pub mod colorant;
pub mod margin;
pub mod resolution;
pub mod size;

pub use colorant::{
    ColorantEvidence, ColorantOutcome, Strategy, classify, collect_evidence, detect_colorants, run_strategies,
    union_contributions,
};
pub use margin::check_margins;
pub use resolution::{RasterSample, ResolutionOutcome, check_resolution};
pub use size::{best_match, check_image_size, check_page_sizes, matches};
