//! Document parsing on top of `lopdf`.
//!
//! Turns raw PDF bytes into a [`ParsedDocument`]: per-page geometry,
//! content bounding boxes, raw content streams and the embedded rasters
//! reachable from each page.

pub mod content;
pub mod document;

pub use content::{ContentBox, ContentItem, ContentKind, DecodedContent, PageScan, decode_content};
pub use document::{EmbeddedImage, PageContent, ParsedDocument, parse_document};

use lopdf::{Dictionary, Document, Object};

/// Maximum nesting of form XObjects that is followed.
pub const DEFAULT_MAX_FORM_DEPTH: usize = 8;

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Report image placement rectangles alongside text boxes.
    pub image_placements: bool,
    /// Maximum nesting of form XObjects that is followed.
    pub max_form_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            image_placements: true,
            max_form_depth: DEFAULT_MAX_FORM_DEPTH,
        }
    }
}

/// Follow a reference to the object it points at.
///
/// Dangling references resolve to themselves.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Numeric value of an integer or real object.
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// Name value of an object, following one reference.
pub(crate) fn name_of(doc: &Document, obj: &Object) -> Option<String> {
    match resolve(doc, obj) {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Dictionary value of an object, following one reference.
///
/// Stream objects yield their stream dictionary.
pub(crate) fn dict_of<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Look up `key` in a dictionary and return it as a dictionary.
pub(crate) fn sub_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    dict.get(key).ok().and_then(|obj| dict_of(doc, obj))
}
