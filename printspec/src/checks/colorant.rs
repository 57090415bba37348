//! Colorant model detection and classification.
//!
//! Four independent strategies each look at a different kind of evidence.
//! A strategy that hits something it cannot read abstains with `None`;
//! the others are unaffected. The final set is the union of everything
//! the strategies found. Disagreement between strategies is expected and
//! never resolved.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::config::Category;
use crate::parse::{ParsedDocument, decode_content, dict_of, name_of, sub_dict};
use crate::validation::ValidationIssue;

/// Which strategy produced a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// `/ColorSpace` names declared on page image XObjects.
    DeclaredResources,
    /// `/DefaultRGB`, `/DefaultCMYK` or `/DefaultGray` overrides.
    DefaultColorSpace,
    /// Color-setting operators in content streams.
    ContentOperators,
    /// Pixel modes of embedded rasters.
    RasterModes,
}

impl Strategy {
    /// All strategies in evaluation order.
    pub const ALL: [Strategy; 4] = [
        Strategy::DeclaredResources,
        Strategy::DefaultColorSpace,
        Strategy::ContentOperators,
        Strategy::RasterModes,
    ];

    /// Run this strategy.
    pub fn detect(self, doc: &ParsedDocument) -> Option<BTreeSet<String>> {
        match self {
            Self::DeclaredResources => declared_resources(doc),
            Self::DefaultColorSpace => default_colorspace(doc),
            Self::ContentOperators => content_operators(doc),
            Self::RasterModes => raster_modes(doc),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DeclaredResources => "declared resources",
            Self::DefaultColorSpace => "default color space",
            Self::ContentOperators => "content operators",
            Self::RasterModes => "raster modes",
        };
        f.write_str(name)
    }
}

/// One observed colorant label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ColorantEvidence {
    /// Colorant model label, e.g. `DeviceRGB` or `CMYK`.
    pub label: String,
    /// Strategy that observed it.
    pub strategy: Strategy,
}

/// Run every strategy once, in [`Strategy::ALL`] order.
///
/// An abstaining strategy is kept as `None`.
pub fn run_strategies(doc: &ParsedDocument) -> Vec<(Strategy, Option<BTreeSet<String>>)> {
    Strategy::ALL
        .into_iter()
        .map(|strategy| {
            let labels = strategy.detect(doc);
            if labels.is_none() {
                debug!(%strategy, "colorant strategy abstained");
            }
            (strategy, labels)
        })
        .collect()
}

/// Tag every contributed label with the strategy that found it.
pub fn collect_evidence(contributions: &[(Strategy, Option<BTreeSet<String>>)]) -> Vec<ColorantEvidence> {
    contributions
        .iter()
        .filter_map(|(strategy, labels)| labels.as_ref().map(|labels| (*strategy, labels)))
        .flat_map(|(strategy, labels)| {
            labels.iter().map(move |label| ColorantEvidence {
                label: label.clone(),
                strategy,
            })
        })
        .collect()
}

/// Union of strategy contributions. Abstentions contribute nothing.
pub fn union_contributions<I>(contributions: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = Option<BTreeSet<String>>>,
{
    contributions.into_iter().flatten().flatten().collect()
}

/// The final colorant set of a document.
pub fn detect_colorants(doc: &ParsedDocument) -> BTreeSet<String> {
    let contributions = run_strategies(doc);
    debug!(evidence = ?collect_evidence(&contributions), "colorant evidence");
    union_contributions(contributions.into_iter().map(|(_, labels)| labels))
}

/// Strategy 1: `/ColorSpace` names on each page's image XObjects.
///
/// Array color spaces such as `[/ICCBased ...]` are not collected.
pub fn declared_resources(doc: &ParsedDocument) -> Option<BTreeSet<String>> {
    let document = &doc.document;
    let mut found = BTreeSet::new();

    for page in &doc.pages {
        let Ok(xobjects) = page.resources.get(b"XObject") else {
            continue;
        };
        let xobjects = dict_of(document, xobjects)?;

        for (_, entry) in xobjects.iter() {
            let Some(dict) = dict_of(document, entry) else {
                continue;
            };
            if dict.get(b"Subtype").ok().and_then(|s| name_of(document, s)).as_deref() != Some("Image") {
                continue;
            }
            if let Some(name) = dict.get(b"ColorSpace").ok().and_then(|cs| name_of(document, cs)) {
                found.insert(name);
            }
        }
    }

    Some(found)
}

/// Strategy 2: default color space overrides.
///
/// The page-tree root's resources are searched first, then each page's.
/// The first key found in the order RGB, CMYK, Gray contributes its
/// device family.
pub fn default_colorspace(doc: &ParsedDocument) -> Option<BTreeSet<String>> {
    let document = &doc.document;

    let catalog = document.trailer.get(b"Root").ok().and_then(|root| dict_of(document, root))?;
    let tree = sub_dict(document, catalog, b"Pages")?;

    let mut scopes = Vec::with_capacity(doc.pages.len() + 1);
    if let Some(root_resources) = sub_dict(document, tree, b"Resources") {
        scopes.push(root_resources);
    }
    scopes.extend(doc.pages.iter().map(|page| &page.resources));

    let colorspaces: Vec<_> = scopes
        .into_iter()
        .filter_map(|resources| sub_dict(document, resources, b"ColorSpace"))
        .collect();

    const DEFAULTS: [(&[u8], &str); 3] = [
        (b"DefaultRGB", "DeviceRGB"),
        (b"DefaultCMYK", "DeviceCMYK"),
        (b"DefaultGray", "DeviceGray"),
    ];

    let label = DEFAULTS.iter().find_map(|(key, label)| {
        colorspaces
            .iter()
            .any(|cs| cs.has(key))
            .then_some(*label)
    });

    Some(label.into_iter().map(String::from).collect())
}

/// Strategy 3: color-setting operators in page content.
///
/// `rg`/`RG` anywhere in the document contributes `DeviceRGB`; otherwise
/// `k`/`K` contributes `DeviceCMYK`.
pub fn content_operators(doc: &ParsedDocument) -> Option<BTreeSet<String>> {
    let mut rgb = false;
    let mut cmyk = false;

    for page in &doc.pages {
        let content = decode_content(&page.content);
        if content.unreadable_segments > 0 {
            debug!(
                page = page.number,
                unreadable = content.unreadable_segments,
                "content stream could not be tokenized"
            );
            return None;
        }
        for operation in content.operations() {
            match operation.operator.as_str() {
                "rg" | "RG" => rgb = true,
                "k" | "K" => cmyk = true,
                _ => {}
            }
        }
    }

    let label = if rgb {
        Some("DeviceRGB")
    } else if cmyk {
        Some("DeviceCMYK")
    } else {
        None
    };
    Some(label.into_iter().map(String::from).collect())
}

/// Strategy 4: pixel modes of embedded rasters.
///
/// Abstains when the document embeds rasters but none could be decoded.
pub fn raster_modes(doc: &ParsedDocument) -> Option<BTreeSet<String>> {
    if doc.images.is_empty() && doc.undecodable_images > 0 {
        return None;
    }
    Some(doc.images.iter().map(|image| image.info.mode.clone()).collect())
}

/// Result of classifying a colorant set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorantOutcome {
    /// Nothing was detected.
    NoColorantInformation,
    /// Detected labels split by the accepted list.
    Classified {
        /// Labels on the accepted list.
        supported: BTreeSet<String>,
        /// Labels not on the accepted list.
        unsupported: BTreeSet<String>,
    },
}

impl ColorantOutcome {
    /// At most one colorant issue, naming every unsupported label.
    pub fn issue(&self, accepted: &BTreeSet<String>) -> Option<ValidationIssue> {
        let Self::Classified { unsupported, .. } = self else {
            return None;
        };
        if unsupported.is_empty() {
            return None;
        }

        let join = |labels: &BTreeSet<String>| labels.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        let noun = if unsupported.len() == 1 { "model" } else { "models" };
        Some(ValidationIssue::error(
            Category::Colorant,
            format!(
                "Unsupported colorant {noun}: {} (accepted: {})",
                join(unsupported),
                join(accepted)
            ),
        ))
    }
}

/// Split a colorant set by the accepted list.
pub fn classify(colorants: &BTreeSet<String>, accepted: &BTreeSet<String>) -> ColorantOutcome {
    if colorants.is_empty() {
        return ColorantOutcome::NoColorantInformation;
    }

    let (supported, unsupported) = colorants
        .iter()
        .cloned()
        .partition(|label| accepted.contains(label));

    ColorantOutcome::Classified {
        supported,
        unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{ParseOptions, parse_document};
    use lopdf::{Dictionary, Document, Object, Stream, dictionary};

    fn set(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    /// One-page document with the given page resources, tree resources and content.
    fn parsed(
        page_resources: impl FnOnce(&mut Document) -> Dictionary,
        tree_resources: Option<Dictionary>,
        content: &str,
    ) -> ParsedDocument {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_resources = page_resources(&mut doc);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => page_resources,
        });
        let mut tree = dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        if let Some(resources) = tree_resources {
            tree.set("Resources", resources);
        }
        doc.objects.insert(pages_id, Object::Dictionary(tree));
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        parse_document("test.pdf", &bytes, ParseOptions::default()).unwrap()
    }

    fn image(doc: &mut Document, colorspace: Object) -> Object {
        let id = doc.add_object(Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 2,
                "BitsPerComponent" => 8,
                "ColorSpace" => colorspace,
            },
            vec![0; 16],
        ));
        Object::Reference(id)
    }

    fn no_resources(_: &mut Document) -> Dictionary {
        Dictionary::new()
    }

    #[test]
    fn test_union_is_idempotent_and_commutative() {
        let declared = Some(set(&["RGB"]));
        let modes = Some(set(&["RGB", "L"]));

        let forward = union_contributions([declared.clone(), None, modes.clone()]);
        let backward = union_contributions([modes, declared, None]);

        assert_eq!(forward, set(&["L", "RGB"]));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_classify_unsupported() {
        let outcome = classify(&set(&["RGB", "Indexed"]), &set(&["RGB", "CMYK"]));
        assert_eq!(
            outcome,
            ColorantOutcome::Classified {
                supported: set(&["RGB"]),
                unsupported: set(&["Indexed"]),
            }
        );

        let issue = outcome.issue(&set(&["RGB", "CMYK"])).unwrap();
        assert_eq!(
            issue.message,
            "Unsupported colorant model: Indexed (accepted: CMYK, RGB)"
        );
    }

    #[test]
    fn test_classify_empty() {
        let outcome = classify(&BTreeSet::new(), &set(&["RGB"]));
        assert_eq!(outcome, ColorantOutcome::NoColorantInformation);
        assert!(outcome.issue(&set(&["RGB"])).is_none());
    }

    #[test]
    fn test_declared_resources_collects_names_only() {
        let doc = parsed(
            |doc| dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image(doc, Object::Name(b"DeviceCMYK".to_vec())),
                    "Im1" => image(doc, Object::Array(vec![
                        Object::Name(b"Indexed".to_vec()),
                        Object::Name(b"DeviceRGB".to_vec()),
                        Object::Integer(0),
                        Object::String(vec![0, 0, 0], lopdf::StringFormat::Hexadecimal),
                    ])),
                },
            },
            None,
            "",
        );

        assert_eq!(declared_resources(&doc), Some(set(&["DeviceCMYK"])));
    }

    #[test]
    fn test_default_colorspace_prefers_rgb() {
        let doc = parsed(
            |_| dictionary! {
                "ColorSpace" => dictionary! { "DefaultRGB" => "DeviceRGB" },
            },
            Some(dictionary! {
                "ColorSpace" => dictionary! { "DefaultCMYK" => "DeviceCMYK" },
            }),
            "",
        );

        assert_eq!(default_colorspace(&doc), Some(set(&["DeviceRGB"])));
    }

    #[test]
    fn test_default_colorspace_from_tree_root() {
        let doc = parsed(
            no_resources,
            Some(dictionary! {
                "ColorSpace" => dictionary! { "DefaultGray" => "DeviceGray" },
            }),
            "",
        );

        assert_eq!(default_colorspace(&doc), Some(set(&["DeviceGray"])));
    }

    #[test]
    fn test_content_operators() {
        let rgb = parsed(no_resources, None, "0 0 0 1 k 1 0 0 rg 0 0 10 10 re f");
        assert_eq!(content_operators(&rgb), Some(set(&["DeviceRGB"])));

        let cmyk = parsed(no_resources, None, "0 0 0 1 K 0 0 m 10 10 l S");
        assert_eq!(content_operators(&cmyk), Some(set(&["DeviceCMYK"])));

        let none = parsed(no_resources, None, "0 g 0 0 10 10 re f");
        assert_eq!(content_operators(&none), Some(BTreeSet::new()));
    }

    #[test]
    fn test_raster_modes_and_detect() {
        let doc = parsed(
            |doc| dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image(doc, Object::Name(b"DeviceRGB".to_vec())),
                    "Im1" => image(doc, Object::Name(b"DeviceGray".to_vec())),
                },
            },
            None,
            "0 0 0 1 k",
        );

        assert_eq!(raster_modes(&doc), Some(set(&["L", "RGB"])));
        assert_eq!(
            detect_colorants(&doc),
            set(&["DeviceCMYK", "DeviceGray", "DeviceRGB", "L", "RGB"])
        );

        let evidence = collect_evidence(&run_strategies(&doc));
        assert!(evidence.contains(&ColorantEvidence {
            label: "RGB".to_string(),
            strategy: Strategy::RasterModes,
        }));
        assert!(evidence.contains(&ColorantEvidence {
            label: "DeviceRGB".to_string(),
            strategy: Strategy::DeclaredResources,
        }));
    }

    #[test]
    fn test_raster_modes_abstains_when_nothing_decodes() {
        let mut doc = parsed(no_resources, None, "");
        assert_eq!(raster_modes(&doc), Some(BTreeSet::new()));

        doc.undecodable_images = 1;
        assert_eq!(raster_modes(&doc), None);
    }

    #[test]
    fn test_unsupported_labels_share_one_issue() {
        let outcome = classify(&set(&["DeviceRGB", "Indexed", "P"]), &set(&["DeviceRGB", "RGB"]));

        let issue = outcome.issue(&set(&["DeviceRGB", "RGB"])).unwrap();
        assert_eq!(issue.category, Category::Colorant);
        assert_eq!(issue.page, None);
        assert_eq!(
            issue.message,
            "Unsupported colorant models: Indexed, P (accepted: DeviceRGB, RGB)"
        );
    }

    #[test]
    fn test_same_label_from_two_strategies_is_kept_once() {
        let doc = parsed(
            |doc| dictionary! {
                "XObject" => dictionary! { "Im0" => image(doc, Object::Name(b"DeviceRGB".to_vec())) },
            },
            None,
            "1 0 0 rg 0 0 10 10 re f",
        );

        let contributions = run_strategies(&doc);
        let from_declared = contributions
            .iter()
            .find(|(strategy, _)| *strategy == Strategy::DeclaredResources)
            .and_then(|(_, labels)| labels.clone());
        let from_operators = contributions
            .iter()
            .find(|(strategy, _)| *strategy == Strategy::ContentOperators)
            .and_then(|(_, labels)| labels.clone());
        assert_eq!(from_declared, Some(set(&["DeviceRGB"])));
        assert_eq!(from_operators, Some(set(&["DeviceRGB"])));

        assert_eq!(detect_colorants(&doc), set(&["DeviceRGB", "RGB"]));
    }

    #[test]
    fn test_content_operators_survive_inline_images() {
        let doc = parsed(
            no_resources,
            None,
            "BI /W 1 /H 1 /BPC 8 /CS /G ID \x00 EI 0 0 0 1 k 0 0 10 10 re f",
        );
        assert_eq!(content_operators(&doc), Some(set(&["DeviceCMYK"])));
    }
}
