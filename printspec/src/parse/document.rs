//! Whole-document parsing.

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument};

use crate::config::{POINTS_PER_INCH, PhysicalSize};
use crate::error::{PrintSpecError, Result};
use crate::geometry::Rect;
use crate::parse::content::{ContentBox, ContentInterpreter, collect_images};
use crate::parse::{ParseOptions, dict_of, number, resolve};
use crate::raster::{RasterInfo, probe_image_stream};

/// Maximum `/Parent` hops followed when resolving inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// One page of a parsed document.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number.
    pub number: u32,
    /// Object id of the page dictionary.
    pub id: ObjectId,
    /// Page bounds, in points.
    pub media_box: Rect,
    /// Effective resources, inheritance applied.
    pub resources: Dictionary,
    /// Text and image bounding boxes.
    pub boxes: Vec<ContentBox>,
    /// Stretches of content that could not be interpreted. Boxes inside
    /// them are missing from `boxes`.
    pub unreadable_segments: usize,
    /// Decoded content stream bytes.
    pub content: Vec<u8>,
}

impl PageContent {
    /// Physical page size.
    pub fn size(&self) -> PhysicalSize {
        PhysicalSize::from_points(self.media_box.width(), self.media_box.height())
    }
}

/// A raster embedded in a document page.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// 1-based page the image is reachable from.
    pub page: u32,
    /// Resource name of the image.
    pub name: String,
    /// Object id, for indirect images.
    pub id: Option<ObjectId>,
    /// Decoded header facts.
    pub info: RasterInfo,
}

/// A document ready for the checks.
#[derive(Debug)]
pub struct ParsedDocument {
    /// The underlying object graph.
    pub document: Document,
    /// Pages in document order.
    pub pages: Vec<PageContent>,
    /// Embedded rasters in page order.
    pub images: Vec<EmbeddedImage>,
    /// Number of embedded rasters whose headers could not be decoded.
    pub undecodable_images: usize,
}

impl ParsedDocument {
    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Size of the first page.
    pub fn first_page_size(&self) -> Option<PhysicalSize> {
        self.pages.first().map(PageContent::size)
    }
}

/// Parse a PDF document from memory.
///
/// # Errors
///
/// Returns an error if:
/// - The bytes are not a loadable PDF
/// - The document is encrypted
/// - The document has no pages, or a page has an empty MediaBox
#[instrument(skip_all, fields(name = %name, size = bytes.len()))]
pub fn parse_document(name: &str, bytes: &[u8], options: ParseOptions) -> Result<ParsedDocument> {
    let document = Document::load_mem(bytes).map_err(|err| {
        let message = err.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("encrypt") || lowered.contains("password") || lowered.contains("decrypt") {
            PrintSpecError::EncryptedDocument {
                name: name.to_string(),
            }
        } else {
            PrintSpecError::document_decode(name, message)
        }
    })?;

    if document.trailer.has(b"Encrypt") {
        return Err(PrintSpecError::EncryptedDocument {
            name: name.to_string(),
        });
    }

    let page_ids = document.get_pages();
    if page_ids.is_empty() {
        return Err(PrintSpecError::document_decode(name, "document has no pages"));
    }

    let mut pages = Vec::with_capacity(page_ids.len());
    let mut images = Vec::new();
    let mut undecodable_images = 0;

    for (&number, &id) in &page_ids {
        let page_dict = document
            .get_dictionary(id)
            .map_err(|err| PrintSpecError::document_decode(name, format!("page {number}: {err}")))?;

        let media_box = media_box(&document, page_dict);
        if media_box.width() <= 0.0 || media_box.height() <= 0.0 {
            return Err(PrintSpecError::document_decode(
                name,
                format!("page {number} has an empty MediaBox"),
            ));
        }

        let resources = inherited(&document, page_dict, b"Resources")
            .and_then(|obj| dict_of(&document, obj))
            .cloned()
            .unwrap_or_default();

        let content = document.get_page_content(id).unwrap_or_else(|err| {
            debug!(page = number, error = %err, "page has no readable content");
            Vec::new()
        });

        let scan = ContentInterpreter::new(&document, options, number).run(&content, &resources);
        if scan.unreadable_segments > 0 {
            debug!(
                page = number,
                unreadable = scan.unreadable_segments,
                "content stream partly uninterpretable"
            );
        }

        for (image_name, image_id, stream) in collect_images(&document, &resources, options.max_form_depth) {
            match probe_image_stream(&document, stream) {
                Ok(info) => images.push(EmbeddedImage {
                    page: number,
                    name: image_name,
                    id: image_id,
                    info,
                }),
                Err(reason) => {
                    debug!(page = number, image = %image_name, %reason, "embedded image skipped");
                    undecodable_images += 1;
                }
            }
        }

        pages.push(PageContent {
            number,
            id,
            media_box,
            resources,
            boxes: scan.boxes,
            unreadable_segments: scan.unreadable_segments,
            content,
        });
    }

    debug!(
        pages = pages.len(),
        images = images.len(),
        undecodable_images,
        "document parsed"
    );

    Ok(ParsedDocument {
        document,
        pages,
        images,
        undecodable_images,
    })
}

/// Look up a page attribute, following `/Parent` links.
pub(crate) fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = page;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(resolve(doc, value));
        }
        current = current.get(b"Parent").ok().and_then(|parent| dict_of(doc, parent))?;
    }
    None
}

/// The page's MediaBox, US Letter when absent or malformed.
fn media_box(doc: &Document, page: &Dictionary) -> Rect {
    let letter = Rect::new(0.0, 0.0, 8.5 * POINTS_PER_INCH, 11.0 * POINTS_PER_INCH);

    let Some(Object::Array(items)) = inherited(doc, page, b"MediaBox") else {
        return letter;
    };

    let values: Vec<f64> = items
        .iter()
        .filter_map(|item| number(resolve(doc, item)))
        .collect();

    match values.as_slice() {
        [x0, y0, x1, y1] => Rect::new(*x0, *y0, *x1, *y1),
        _ => letter,
    }
}
