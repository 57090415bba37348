//! Page and image size matching.

use tracing::debug;

use crate::config::{Category, PhysicalSize};
use crate::parse::PageContent;
use crate::validation::ValidationIssue;

/// The first accepted size `measured` matches, in either orientation.
///
/// Both dimensions must be within `tolerance` inches.
pub fn best_match(measured: PhysicalSize, accepted: &[PhysicalSize], tolerance: f64) -> Option<PhysicalSize> {
    let close = |a: f64, b: f64| (a - b).abs() <= tolerance;

    accepted.iter().copied().find(|size| {
        (close(measured.width, size.width) && close(measured.height, size.height))
            || (close(measured.width, size.height) && close(measured.height, size.width))
    })
}

/// Whether `measured` matches any accepted size.
pub fn matches(measured: PhysicalSize, accepted: &[PhysicalSize], tolerance: f64) -> bool {
    best_match(measured, accepted, tolerance).is_some()
}

fn accepted_list(accepted: &[PhysicalSize]) -> String {
    accepted
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One size issue per page that matches no accepted size.
pub fn check_page_sizes(pages: &[PageContent], accepted: &[PhysicalSize], tolerance: f64) -> Vec<ValidationIssue> {
    pages
        .iter()
        .filter_map(|page| {
            let size = page.size();
            if let Some(matched) = best_match(size, accepted, tolerance) {
                debug!(page = page.number, %size, %matched, "page size accepted");
                return None;
            }
            Some(
                ValidationIssue::error(
                    Category::Size,
                    format!(
                        "Page {} is {size}, which matches none of the accepted sizes ({})",
                        page.number,
                        accepted_list(accepted)
                    ),
                )
                .on_page(page.number),
            )
        })
        .collect()
}

/// A size issue for a standalone image that matches no accepted size.
pub fn check_image_size(
    measured: PhysicalSize,
    accepted: &[PhysicalSize],
    tolerance: f64,
) -> Option<ValidationIssue> {
    (!matches(measured, accepted, tolerance)).then(|| {
        ValidationIssue::error(
            Category::Size,
            format!(
                "Image is {measured}, which matches none of the accepted sizes ({})",
                accepted_list(accepted)
            ),
        )
    })
}
