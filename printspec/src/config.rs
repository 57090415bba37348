//! Configuration module for printspec.
//!
//! This module holds the print shop's production constraints and the
//! settings that drive a batch run. It handles:
//! - Parsing of sizes, categories, severities and output formats
//! - Application of defaults
//! - Validation of argument combinations
//! - Loading overrides from a JSON configuration file
//!
//! [`ValidationConfig`] is read-only for the lifetime of a run and shared
//! between workers behind an `Arc`.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::PrintSpecError;

/// Points per inch in PDF user space.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Default minimum raster resolution.
pub const DEFAULT_MIN_DPI: u32 = 300;

/// Default size tolerance for documents, in inches.
pub const DEFAULT_DOCUMENT_TOLERANCE: f64 = 0.05;

/// Default size tolerance for standalone images, in inches.
///
/// Image-only metadata is less precise than a PDF MediaBox.
pub const DEFAULT_IMAGE_TOLERANCE: f64 = 0.1;

/// Default safe-zone margin: 1/8 inch.
pub const DEFAULT_MARGIN_INCHES: f64 = 0.125;

/// A physical width/height pair in inches.
///
/// The pair is unordered for matching purposes: a portrait 6×4 matches an
/// accepted 4×6.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSize {
    /// Width in inches.
    pub width: f64,
    /// Height in inches.
    pub height: f64,
}

impl PhysicalSize {
    /// Create a size from inches.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Create a size from PDF points.
    pub fn from_points(width: f64, height: f64) -> Self {
        Self::new(width / POINTS_PER_INCH, height / POINTS_PER_INCH)
    }

    /// US Letter, 8.5×11 in.
    pub const fn letter() -> Self {
        Self::new(8.5, 11.0)
    }

    /// Swap width and height.
    pub fn rotated(self) -> Self {
        Self::new(self.height, self.width)
    }

    /// Whether both dimensions are finite and positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl fmt::Display for PhysicalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}×{:.2} in", self.width, self.height)
    }
}

impl FromStr for PhysicalSize {
    type Err = PrintSpecError;

    /// Parse a size such as `8.5x11`, `4X6` or `5×7` (inches).
    fn from_str(s: &str) -> crate::Result<Self> {
        let normalized = s.trim().to_lowercase().replace('×', "x");
        let (width, height) = normalized.split_once('x').ok_or_else(|| {
            PrintSpecError::invalid_config(format!(
                "Invalid size: {s}. Expected WIDTHxHEIGHT in inches, e.g. 8.5x11"
            ))
        })?;

        let parse = |part: &str| {
            part.trim().parse::<f64>().map_err(|_| {
                PrintSpecError::invalid_config(format!("Invalid size dimension '{part}' in {s}"))
            })
        };

        let size = Self::new(parse(width)?, parse(height)?);
        if !size.is_valid() {
            return Err(PrintSpecError::invalid_config(format!(
                "Invalid size: {s}. Dimensions must be positive"
            )));
        }

        Ok(size)
    }
}

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory only, does not fail the item.
    Warning,
    /// Blocking, fails the item.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Page or image size mismatch.
    Size,
    /// Raster below the minimum resolution.
    Resolution,
    /// Unsupported colorant model.
    Colorant,
    /// Content inside the safe-zone margin.
    Margin,
    /// The item could not be read or decoded.
    Processing,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Size => "size",
            Self::Resolution => "resolution",
            Self::Colorant => "colorant",
            Self::Margin => "margin",
            Self::Processing => "processing",
        };
        f.write_str(name)
    }
}

impl FromStr for Category {
    type Err = PrintSpecError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "size" => Ok(Self::Size),
            "resolution" | "dpi" => Ok(Self::Resolution),
            "colorant" | "color" | "colour" => Ok(Self::Colorant),
            "margin" | "safe-zone" => Ok(Self::Margin),
            "processing" => Ok(Self::Processing),
            _ => Err(PrintSpecError::invalid_config(format!(
                "Invalid category: {s}. Must be one of: size, resolution, colorant, margin"
            ))),
        }
    }
}

/// Per-category severity assigned to specification violations.
///
/// Every category is blocking by default. Any of them can be demoted to an
/// advisory warning; processing failures always stay errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityPolicy {
    /// Severity for size mismatches.
    pub size: Severity,
    /// Severity for low-resolution rasters.
    pub resolution: Severity,
    /// Severity for unsupported colorants.
    pub colorant: Severity,
    /// Severity for margin intrusions.
    pub margin: Severity,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self::strict()
    }
}

impl SeverityPolicy {
    /// Every category blocks.
    pub fn strict() -> Self {
        Self {
            size: Severity::Error,
            resolution: Severity::Error,
            colorant: Severity::Error,
            margin: Severity::Error,
        }
    }

    /// Every category is advisory.
    pub fn advisory() -> Self {
        Self {
            size: Severity::Warning,
            resolution: Severity::Warning,
            colorant: Severity::Warning,
            margin: Severity::Warning,
        }
    }

    /// Severity assigned to a category.
    pub fn severity_for(&self, category: Category) -> Severity {
        match category {
            Category::Size => self.size,
            Category::Resolution => self.resolution,
            Category::Colorant => self.colorant,
            Category::Margin => self.margin,
            Category::Processing => Severity::Error,
        }
    }

    /// Demote a category to a warning.
    ///
    /// # Errors
    ///
    /// Returns an error for [`Category::Processing`], which cannot be demoted.
    pub fn demote(&mut self, category: Category) -> crate::Result<()> {
        match category {
            Category::Size => self.size = Severity::Warning,
            Category::Resolution => self.resolution = Severity::Warning,
            Category::Colorant => self.colorant = Severity::Warning,
            Category::Margin => self.margin = Severity::Warning,
            Category::Processing => {
                return Err(PrintSpecError::invalid_config(
                    "Processing failures cannot be demoted to warnings",
                ));
            }
        }
        Ok(())
    }
}

/// Required clear distance from every page edge.
///
/// Held in points. Config files and reports carry it in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginSpec(f64);

impl MarginSpec {
    /// Create a margin from points.
    pub fn from_points(points: f64) -> Self {
        Self(points)
    }

    /// Create a margin from inches.
    pub fn from_inches(inches: f64) -> Self {
        Self(inches * POINTS_PER_INCH)
    }

    /// Margin in points.
    pub fn points(&self) -> f64 {
        self.0
    }

    /// Margin in inches.
    pub fn inches(&self) -> f64 {
        self.0 / POINTS_PER_INCH
    }
}

impl Default for MarginSpec {
    fn default() -> Self {
        Self::from_inches(DEFAULT_MARGIN_INCHES)
    }
}

impl Serialize for MarginSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.inches())
    }
}

impl<'de> Deserialize<'de> for MarginSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self::from_inches)
    }
}

/// The print shop's production constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Accepted physical sizes, in inches.
    pub accepted_sizes: Vec<PhysicalSize>,

    /// Size tolerance for documents, in inches.
    pub document_tolerance: f64,

    /// Size tolerance for standalone images, in inches.
    pub image_tolerance: f64,

    /// Minimum raster resolution in DPI.
    pub min_dpi: u32,

    /// Safe-zone margin.
    pub margin: MarginSpec,

    /// Accepted colorant labels.
    pub accepted_colorants: BTreeSet<String>,

    /// Severity assigned to each violation category.
    pub severity: SeverityPolicy,

    /// Whether image placement rectangles take part in the margin check.
    pub image_placements: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            accepted_sizes: vec![
                PhysicalSize::letter(),
                PhysicalSize::new(4.0, 6.0),
                PhysicalSize::new(5.0, 7.0),
                PhysicalSize::new(8.0, 10.0),
            ],
            document_tolerance: DEFAULT_DOCUMENT_TOLERANCE,
            image_tolerance: DEFAULT_IMAGE_TOLERANCE,
            min_dpi: DEFAULT_MIN_DPI,
            margin: MarginSpec::default(),
            accepted_colorants: ["DeviceRGB", "DeviceCMYK", "RGB", "CMYK"]
                .into_iter()
                .map(String::from)
                .collect(),
            severity: SeverityPolicy::default(),
            image_placements: true,
        }
    }
}

impl ValidationConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Fields missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// the resulting configuration fails validation.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No accepted sizes are configured, or one of them is not positive
    /// - A tolerance is negative
    /// - The margin is not a positive distance
    /// - The minimum DPI is zero
    /// - No accepted colorants are configured
    pub fn validate(&self) -> Result<()> {
        if self.accepted_sizes.is_empty() {
            bail!("At least one accepted size is required");
        }

        if let Some(size) = self.accepted_sizes.iter().find(|size| !size.is_valid()) {
            bail!("Accepted size must be positive: {size}");
        }

        for (name, tolerance) in [
            ("document", self.document_tolerance),
            ("image", self.image_tolerance),
        ] {
            if !tolerance.is_finite() || tolerance < 0.0 {
                bail!("The {name} size tolerance must be zero or positive, got {tolerance}");
            }
        }

        if !self.margin.points().is_finite() || self.margin.points() <= 0.0 {
            bail!(
                "Margin must be a positive distance, got {:.3} in",
                self.margin.inches()
            );
        }

        if self.min_dpi == 0 {
            bail!("Minimum DPI must be at least 1");
        }

        if self.accepted_colorants.is_empty() {
            bail!("At least one accepted colorant is required");
        }

        Ok(())
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = PrintSpecError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(PrintSpecError::invalid_config(format!(
                "Invalid output format: {s}. Must be one of: text, json"
            ))),
        }
    }
}

/// Settings for one batch run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Input file paths, in report order.
    pub inputs: Vec<PathBuf>,

    /// Number of parallel workers (None = auto-detect).
    pub jobs: Option<usize>,

    /// Per-item deadline (None = unbounded).
    pub deadline: Option<Duration>,

    /// Report output format.
    pub format: OutputFormat,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// Verbose output mode.
    pub verbose: bool,
}

impl RunConfig {
    /// Validate the run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - Jobs count is zero
    /// - The deadline is zero
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("No input files specified");
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            bail!("Number of jobs must be at least 1");
        }

        if let Some(deadline) = self.deadline
            && deadline.is_zero()
        {
            bail!("Per-item deadline must be greater than zero");
        }

        Ok(())
    }

    /// Get the effective number of parallel jobs.
    ///
    /// Returns the configured job count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Check if progress output should be displayed.
    ///
    /// JSON output keeps stdout machine-readable.
    pub fn should_print(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Text
    }
}
