//! Safe-zone checking.

use crate::config::{Category, MarginSpec};
use crate::parse::{ContentBox, ContentKind, PageContent};
use crate::validation::ValidationIssue;

/// One margin issue per content box that is not strictly inside the safe
/// rectangle of its page.
///
/// A page too small to leave any safe area flags every box on it. A page
/// whose content could only be partly interpreted gets one extra issue,
/// since boxes in the skipped stretches were never checked.
pub fn check_margins(pages: &[PageContent], margin: MarginSpec) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for page in pages {
        let safe = page.media_box.inset(margin.points());

        if page.unreadable_segments > 0 {
            issues.push(
                ValidationIssue::error(
                    Category::Margin,
                    format!(
                        "Part of the content on page {} could not be read, so the safe zone could not be fully checked",
                        page.number
                    ),
                )
                .on_page(page.number),
            );
        }

        for content in &page.boxes {
            let inside = safe.as_ref().is_some_and(|safe| safe.strictly_contains(&content.rect));
            if !inside {
                issues.push(violation(page.number, content, margin));
            }
        }
    }

    issues
}

fn violation(page: u32, content: &ContentBox, margin: MarginSpec) -> ValidationIssue {
    let distance = format!("{:.3} in", margin.inches());
    let message = match (content.kind, content.excerpt.as_deref()) {
        (ContentKind::Text, Some(excerpt)) => {
            format!("Text \"{excerpt}\" on page {page} is within {distance} of the page edge")
        }
        (ContentKind::Text, None) => format!("Text on page {page} is within {distance} of the page edge"),
        (ContentKind::Image, _) => format!("Image on page {page} is within {distance} of the page edge"),
    };

    ValidationIssue::error(Category::Margin, message).on_page(page)
}
