//! Raster resolution checking.

use serde::Serialize;

use crate::config::Category;
use crate::raster::RasterInfo;
use crate::validation::ValidationIssue;

/// Resolution facts of one raster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterSample {
    /// Horizontal samples per inch.
    pub dpi_x: f64,
    /// Vertical samples per inch.
    pub dpi_y: f64,
    /// Pixel mode label.
    pub mode: String,
    /// 1-based page, absent for a standalone image.
    pub page: Option<u32>,
}

impl RasterSample {
    /// Create a sample.
    pub fn new(dpi_x: f64, dpi_y: f64, mode: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            dpi_x,
            dpi_y,
            mode: mode.into(),
            page,
        }
    }

    /// Sample for a decoded raster.
    pub fn from_info(info: &RasterInfo, page: Option<u32>) -> Self {
        Self::new(info.dpi_x, info.dpi_y, info.mode.clone(), page)
    }

    /// Whether either axis is below `min_dpi`.
    pub fn is_below(&self, min_dpi: u32) -> bool {
        let min = f64::from(min_dpi);
        self.dpi_x < min || self.dpi_y < min
    }
}

/// Result of the resolution check.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// There were no rasters to check.
    NoRasterContent,
    /// Samples partitioned by the threshold, input order preserved.
    Checked {
        /// Samples at or above the threshold.
        passed: Vec<RasterSample>,
        /// Samples below the threshold.
        failed: Vec<RasterSample>,
    },
}

impl ResolutionOutcome {
    /// Whether no sample failed.
    pub fn is_passing(&self) -> bool {
        match self {
            Self::NoRasterContent => true,
            Self::Checked { failed, .. } => failed.is_empty(),
        }
    }

    /// One resolution issue per failed sample.
    pub fn issues(&self, min_dpi: u32) -> Vec<ValidationIssue> {
        let Self::Checked { failed, .. } = self else {
            return Vec::new();
        };

        failed
            .iter()
            .map(|sample| {
                let location = match sample.page {
                    Some(page) => format!("Image on page {page}"),
                    None => "Image".to_string(),
                };
                ValidationIssue::error(
                    Category::Resolution,
                    format!(
                        "{location} is {}×{} DPI, below the {min_dpi} DPI minimum",
                        format_dpi(sample.dpi_x),
                        format_dpi(sample.dpi_y)
                    ),
                )
                .on_page(sample.page)
            })
            .collect()
    }
}

fn format_dpi(dpi: f64) -> String {
    if dpi.fract() == 0.0 {
        format!("{dpi:.0}")
    } else {
        format!("{dpi:.2}")
    }
}

/// Partition samples by the minimum resolution.
pub fn check_resolution(samples: &[RasterSample], min_dpi: u32) -> ResolutionOutcome {
    if samples.is_empty() {
        return ResolutionOutcome::NoRasterContent;
    }

    let (failed, passed) = samples
        .iter()
        .cloned()
        .partition(|sample| sample.is_below(min_dpi));

    ResolutionOutcome::Checked { passed, failed }
}
