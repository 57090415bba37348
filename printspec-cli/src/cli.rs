//! CLI argument parsing for printspec.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.
//! Every option can also be set through a `PRINTSPEC_*` environment
//! variable; flags override a `--config` file, which overrides defaults.
//!
//! # Examples
//!
//! ```no_run
//! use printspec_cli::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! println!("Validating {} inputs", cli.inputs.len());
//! ```

use clap::Parser;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use printspec::config::{Category, MarginSpec, OutputFormat, PhysicalSize, RunConfig, ValidationConfig};
use printspec::error::{PrintSpecError, Result};
use printspec::utils::{collect_paths_for_patterns, parse_input_list};

/// Validate print-ready PDFs and images against a production specification.
///
/// printspec checks page and image sizes, raster resolution, colorant
/// models and safe-zone margins, then reports every finding per file.
#[derive(Parser, Debug)]
#[command(name = "printspec")]
#[command(version)]
#[command(about = "Validate print-ready PDFs and images against a production specification", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input files to validate (PDF, PNG, JPEG, TIFF, BMP, GIF, WebP)
    ///
    /// Glob patterns are expanded. Reports are printed in input order.
    ///
    /// Examples:
    ///   printspec flyer.pdf poster.jpg
    ///   printspec 'proofs/**/*.pdf'
    #[arg(value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Read settings from a JSON configuration file
    ///
    /// Any field left out keeps its default. Command-line flags
    /// override values from the file.
    #[arg(short, long, value_name = "FILE", env = "PRINTSPEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Accepted physical size in inches, e.g. 8.5x11 (repeatable)
    ///
    /// Sizes match in either orientation. Replaces the default list
    /// (8.5x11, 4x6, 5x7, 8x10).
    #[arg(short, long = "size", value_name = "WxH", env = "PRINTSPEC_SIZES", value_delimiter = ',')]
    pub sizes: Vec<String>,

    /// Size tolerance for documents, in inches
    #[arg(long, value_name = "INCHES", env = "PRINTSPEC_TOLERANCE")]
    pub tolerance: Option<f64>,

    /// Size tolerance for standalone images, in inches
    #[arg(long, value_name = "INCHES", env = "PRINTSPEC_IMAGE_TOLERANCE")]
    pub image_tolerance: Option<f64>,

    /// Minimum raster resolution in DPI
    #[arg(short = 'd', long, value_name = "DPI", env = "PRINTSPEC_MIN_DPI")]
    pub min_dpi: Option<u32>,

    /// Safe-zone margin in inches
    ///
    /// Text and images must stay strictly inside the page inset by
    /// this distance on every side.
    #[arg(short, long, value_name = "INCHES", env = "PRINTSPEC_MARGIN")]
    pub margin: Option<f64>,

    /// Accepted colorant label, e.g. DeviceCMYK (repeatable)
    ///
    /// Replaces the default list (DeviceRGB, DeviceCMYK, RGB, CMYK).
    #[arg(long = "colorant", value_name = "LABEL", env = "PRINTSPEC_COLORANTS", value_delimiter = ',')]
    pub colorants: Vec<String>,

    /// Report a category as a warning instead of an error (repeatable)
    ///
    /// Categories: size, resolution, colorant, margin.
    /// Warnings are reported but do not fail the file.
    #[arg(short, long, value_name = "CATEGORY", env = "PRINTSPEC_WARN_ONLY", value_delimiter = ',')]
    pub warn_only: Vec<String>,

    /// Leave image placements out of the margin check
    ///
    /// Only text is checked against the safe zone.
    #[arg(long, env = "PRINTSPEC_NO_IMAGE_PLACEMENTS")]
    pub no_image_placements: bool,

    /// Give up on a single file after this many seconds
    ///
    /// The file is reported as a processing failure and the
    /// remaining files are still validated.
    #[arg(long, value_name = "SECONDS", env = "PRINTSPEC_DEADLINE")]
    pub deadline: Option<f64>,

    /// Output format
    ///
    /// - text: human-readable report (default)
    /// - json: machine-readable report on stdout
    #[arg(short, long, value_name = "FORMAT", default_value = "text", env = "PRINTSPEC_FORMAT")]
    #[arg(value_parser = ["text", "json"])]
    pub format: String,

    /// Read input file list from a file (one path per line)
    ///
    /// Lines starting with '#' are ignored. Can be combined with
    /// direct inputs; listed files are appended after them.
    ///
    /// Example:
    ///   printspec --input-list batch.txt
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    /// Number of files validated in parallel
    ///
    /// Default is number of CPU cores. Use 1 for sequential processing.
    #[arg(short, long, value_name = "N", env = "PRINTSPEC_JOBS")]
    pub jobs: Option<usize>,

    /// Verbose output - show colorants and raster counts, and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress everything except the reports and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Build the validation settings.
    ///
    /// Starts from the `--config` file (or defaults) and applies every
    /// flag on top.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - A size or category is malformed
    /// - The resulting configuration fails validation
    pub fn to_config(&self) -> Result<ValidationConfig> {
        let mut config = match &self.config {
            Some(path) => ValidationConfig::from_json_file(path)?,
            None => ValidationConfig::default(),
        };

        if !self.sizes.is_empty() {
            config.accepted_sizes = self
                .sizes
                .iter()
                .map(|size| PhysicalSize::from_str(size))
                .collect::<Result<_>>()?;
        }

        if let Some(tolerance) = self.tolerance {
            config.document_tolerance = tolerance;
        }

        if let Some(tolerance) = self.image_tolerance {
            config.image_tolerance = tolerance;
        }

        if let Some(min_dpi) = self.min_dpi {
            config.min_dpi = min_dpi;
        }

        if let Some(margin) = self.margin {
            config.margin = MarginSpec::from_inches(margin);
        }

        if !self.colorants.is_empty() {
            config.accepted_colorants = self
                .colorants
                .iter()
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .collect();
        }

        for category in &self.warn_only {
            config.severity.demote(Category::from_str(category)?)?;
        }

        if self.no_image_placements {
            config.image_placements = false;
        }

        config.validate().map_err(|e| {
            PrintSpecError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    /// Build the batch settings for the resolved inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the output format is invalid or the run
    /// configuration fails validation.
    pub fn to_run_config(&self, inputs: Vec<PathBuf>) -> Result<RunConfig> {
        let deadline = self
            .deadline
            .map(Duration::try_from_secs_f64)
            .transpose()
            .map_err(|e| PrintSpecError::invalid_config(format!("Invalid deadline: {e}")))?;

        let config = RunConfig {
            inputs,
            jobs: self.jobs,
            deadline,
            format: OutputFormat::from_str(&self.format)?,
            quiet: self.quiet,
            verbose: self.verbose,
        };

        config.validate().map_err(|e| {
            PrintSpecError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    /// Validate CLI arguments before processing.
    ///
    /// Performs early validation that doesn't require file I/O:
    /// - Check that some input source was given
    /// - Validate numeric ranges
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() && self.input_list.is_none() {
            return Err(PrintSpecError::NoInputs);
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(PrintSpecError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        if let Some(deadline) = self.deadline
            && !(deadline.is_finite() && deadline > 0.0)
        {
            return Err(PrintSpecError::invalid_config(format!(
                "Invalid deadline: {deadline}. Must be a positive number of seconds"
            )));
        }

        if let Some(margin) = self.margin
            && !(margin.is_finite() && margin > 0.0)
        {
            return Err(PrintSpecError::invalid_config(format!(
                "Invalid margin: {margin}. Must be a positive number of inches"
            )));
        }

        OutputFormat::from_str(&self.format)?;

        Ok(())
    }

    /// Get all input paths including those from input-list file.
    ///
    /// This method combines:
    /// - Direct input arguments, with glob patterns expanded
    /// - Paths from --input-list file (if provided)
    ///
    /// Paths from the file are appended after direct inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid, the input list file cannot
    /// be read, or no inputs remain.
    pub async fn get_all_inputs(&self) -> Result<Vec<PathBuf>> {
        let mut all_inputs = collect_paths_for_patterns(&self.inputs)?;

        if let Some(ref input_list_path) = self.input_list {
            let additional_inputs = read_input_list(input_list_path).await?;
            all_inputs.extend(additional_inputs);
        }

        if all_inputs.is_empty() {
            return Err(PrintSpecError::NoInputs);
        }

        Ok(all_inputs)
    }
}

/// Read input paths from a list file.
async fn read_input_list(path: &Path) -> Result<Vec<PathBuf>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PrintSpecError::FailedToReadInputList {
            path: path.to_path_buf(),
            source: e,
        })?;

    parse_input_list(path, &contents)
}
