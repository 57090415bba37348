//! Output formatting and display for printspec.
//!
//! This module handles all user-facing output including:
//! - Formatted status messages and progress
//! - Report rendering as text or JSON
//! - Quiet and verbose modes
//!
//! # Examples
//!
//! ```no_run
//! use printspec::output::OutputFormatter;
//! use printspec::config::RunConfig;
//!
//! # fn example(config: RunConfig) {
//! let formatter = OutputFormatter::from_config(&config);
//! formatter.info("Validating 12 files");
//! formatter.success("All items passed");
//! # }
//! ```

pub mod formatter;
pub mod render;

pub use formatter::{MessageLevel, OutputFormatter};
pub use render::ReportRenderer;

use crate::config::RunConfig;

/// Create an output formatter from batch settings.
pub fn create_formatter(config: &RunConfig) -> OutputFormatter {
    OutputFormatter::from_config(config)
}

/// Create a report renderer matching the formatter's color and verbosity.
pub fn create_renderer(config: &RunConfig, formatter: &OutputFormatter) -> ReportRenderer {
    ReportRenderer::new(config.format)
        .colored(formatter.is_colored())
        .verbose(config.verbose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    #[test]
    fn test_create_renderer_follows_config() {
        let config = RunConfig {
            format: OutputFormat::Json,
            ..RunConfig::default()
        };
        let formatter = create_formatter(&config);
        assert!(formatter.is_quiet());

        let _renderer = create_renderer(&config, &formatter);
    }
}
