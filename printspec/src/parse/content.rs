//! Content stream interpretation.
//!
//! Tracks the graphics and text state of a page's content stream to find
//! where text and images land on the page. Font metrics are not loaded:
//! every glyph advances half an em, and the glyph box spans from
//! [`DESCENT`] to [`ASCENT`] around the baseline.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::geometry::{Matrix, Rect};
use crate::parse::{ParseOptions, dict_of, name_of, number, resolve, sub_dict};

/// Approximate glyph advance, in text space units per unit font size.
pub const GLYPH_ADVANCE: f64 = 0.5;

/// Glyph box bottom relative to the baseline, per unit font size.
pub const DESCENT: f64 = -0.2;

/// Glyph box top relative to the baseline, per unit font size.
pub const ASCENT: f64 = 0.8;

/// Maximum characters kept from a text block.
pub const EXCERPT_LEN: usize = 30;

/// Kind of content a box was measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// A text object (`BT` ... `ET`).
    Text,
    /// A painted image XObject.
    Image,
}

/// Bounding box of one piece of page content, in points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBox {
    /// Bounds in default user space.
    pub rect: Rect,
    /// 1-based page number.
    pub page: u32,
    /// What was measured.
    pub kind: ContentKind,
    /// Leading characters of the text, for text boxes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl ContentBox {
    /// Create a text box.
    pub fn text(rect: Rect, page: u32, text: &str) -> Self {
        Self {
            rect,
            page,
            kind: ContentKind::Text,
            excerpt: Some(excerpt(text)),
        }
    }

    /// Create an image box.
    pub fn image(rect: Rect, page: u32) -> Self {
        Self {
            rect,
            page,
            kind: ContentKind::Image,
            excerpt: None,
        }
    }
}

/// First [`EXCERPT_LEN`] characters of `text`, whitespace collapsed.
pub fn excerpt(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(EXCERPT_LEN)
        .collect()
}

/// What the interpreter found on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageScan {
    /// Text and image bounding boxes.
    pub boxes: Vec<ContentBox>,
    /// Stretches of content, including nested forms, that could not be
    /// tokenized and were skipped.
    pub unreadable_segments: usize,
}

/// One element of a decoded content stream.
#[derive(Debug, Clone)]
pub enum ContentItem {
    /// A regular operator with its operands.
    Operation(Operation),
    /// An inline image (`BI` ... `ID` ... `EI`), painted into the unit square.
    InlineImage,
}

// lopdf's `Operation` does not implement `PartialEq`; compare its fields.
impl PartialEq for ContentItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Operation(a), Self::Operation(b)) => {
                a.operator == b.operator && a.operands == b.operands
            }
            (Self::InlineImage, Self::InlineImage) => true,
            _ => false,
        }
    }
}

/// A content stream decoded piecewise around inline images.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedContent {
    /// Operations and inline images in stream order.
    pub items: Vec<ContentItem>,
    /// Number of segments lopdf could not tokenize.
    pub unreadable_segments: usize,
}

impl DecodedContent {
    /// The regular operations, inline images left out.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.items.iter().filter_map(|item| match item {
            ContentItem::Operation(operation) => Some(operation),
            ContentItem::InlineImage => None,
        })
    }
}

/// Decode a content stream.
///
/// lopdf's tokenizer rejects inline image data, so the stream is split at
/// every `BI` ... `EI` and the operator stretches between them are decoded
/// separately. A stretch that still fails is skipped and counted.
pub fn decode_content(content: &[u8]) -> DecodedContent {
    let mut decoded = DecodedContent::default();

    for segment in split_inline_images(content) {
        match segment {
            Segment::Operators(bytes) => {
                if bytes.iter().all(|b| is_whitespace(*b)) {
                    continue;
                }
                match Content::decode(bytes) {
                    Ok(content) => decoded
                        .items
                        .extend(content.operations.into_iter().map(ContentItem::Operation)),
                    Err(err) => {
                        debug!(error = %err, len = bytes.len(), "skipping undecodable content");
                        decoded.unreadable_segments += 1;
                    }
                }
            }
            Segment::InlineImage => decoded.items.push(ContentItem::InlineImage),
            Segment::Unreadable => {
                debug!("inline image has no data marker");
                decoded.unreadable_segments += 1;
            }
        }
    }

    decoded
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment<'a> {
    Operators(&'a [u8]),
    InlineImage,
    /// An inline image without its `ID` marker, running to the end.
    Unreadable,
}

fn split_inline_images(content: &[u8]) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while let Some((token_start, token_end)) = next_token(content, pos) {
        pos = token_end;
        if &content[token_start..token_end] != b"BI" {
            continue;
        }

        let mut data_start = None;
        while let Some((s, e)) = next_token(content, pos) {
            pos = e;
            if &content[s..e] == b"ID" {
                // A single whitespace byte separates ID from the data.
                data_start = Some((e + 1).min(content.len()));
                break;
            }
        }

        match data_start {
            Some(data_start) => {
                segments.push(Segment::Operators(&content[start..token_start]));
                segments.push(Segment::InlineImage);
                start = inline_image_end(content, data_start);
                pos = start;
            }
            None => {
                segments.push(Segment::Operators(&content[start..token_start]));
                segments.push(Segment::Unreadable);
                start = content.len();
                break;
            }
        }
    }

    if start < content.len() {
        segments.push(Segment::Operators(&content[start..]));
    }
    segments
}

/// Offset just past the `EI` that closes inline image data.
fn inline_image_end(content: &[u8], data_start: usize) -> usize {
    (data_start..content.len().saturating_sub(1))
        .find(|&i| {
            &content[i..i + 2] == b"EI"
                && (i == data_start || is_whitespace(content[i - 1]))
                && content.get(i + 2).is_none_or(|b| is_whitespace(*b) || is_delimiter(*b))
        })
        .map_or(content.len(), |i| i + 2)
}

/// Span of the next token at or after `pos`. Strings, comments and names
/// are returned whole so their contents never look like operators.
fn next_token(content: &[u8], mut pos: usize) -> Option<(usize, usize)> {
    loop {
        while pos < content.len() && is_whitespace(content[pos]) {
            pos += 1;
        }
        if content.get(pos) != Some(&b'%') {
            break;
        }
        while pos < content.len() && !matches!(content[pos], b'\r' | b'\n') {
            pos += 1;
        }
    }

    let start = pos;
    let first = *content.get(pos)?;
    pos += 1;

    match first {
        b'(' => {
            let mut depth = 1;
            while pos < content.len() && depth > 0 {
                match content[pos] {
                    b'\\' => pos += 1,
                    b'(' => depth += 1,
                    b')' => depth -= 1,
                    _ => {}
                }
                pos += 1;
            }
        }
        b'<' if content.get(pos) == Some(&b'<') => pos += 1,
        b'>' if content.get(pos) == Some(&b'>') => pos += 1,
        b'<' => {
            while pos < content.len() && content[pos] != b'>' {
                pos += 1;
            }
            pos += 1;
        }
        b'[' | b']' | b'{' | b'}' | b')' | b'>' => {}
        _ => {
            while pos < content.len() && !is_whitespace(content[pos]) && !is_delimiter(content[pos]) {
                pos += 1;
            }
        }
    }

    Some((start, pos.min(content.len())))
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Graphics state parameters saved by `q` and restored by `Q`.
#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    font_size: f64,
    rise: f64,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

/// The text object being built between `BT` and `ET`.
#[derive(Debug, Default)]
struct TextRun {
    matrix: Matrix,
    line_matrix: Matrix,
    bounds: Option<Rect>,
    text: String,
}

/// Walks content streams and collects [`ContentBox`]es.
pub struct ContentInterpreter<'a> {
    doc: &'a Document,
    options: ParseOptions,
    page: u32,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    run: Option<TextRun>,
    boxes: Vec<ContentBox>,
    unreadable_segments: usize,
    visited_forms: HashSet<ObjectId>,
}

impl<'a> ContentInterpreter<'a> {
    /// Create an interpreter for one page.
    pub fn new(doc: &'a Document, options: ParseOptions, page: u32) -> Self {
        Self {
            doc,
            options,
            page,
            state: GraphicsState::new(Matrix::identity()),
            stack: Vec::new(),
            run: None,
            boxes: Vec::new(),
            unreadable_segments: 0,
            visited_forms: HashSet::new(),
        }
    }

    /// Interpret a page content stream.
    ///
    /// Stretches of the stream that cannot be tokenized are skipped and
    /// counted in [`PageScan::unreadable_segments`].
    pub fn run(mut self, content: &[u8], resources: &Dictionary) -> PageScan {
        let unreadable = self.execute(content, resources, 0);
        PageScan {
            boxes: self.boxes,
            unreadable_segments: self.unreadable_segments + unreadable,
        }
    }

    fn execute(&mut self, content: &[u8], resources: &Dictionary, depth: usize) -> usize {
        let decoded = decode_content(content);
        for item in &decoded.items {
            match item {
                ContentItem::Operation(operation) => self.apply(operation, resources, depth),
                ContentItem::InlineImage => {
                    if self.options.image_placements {
                        let rect = self.state.ctm.transform_rect(&Rect::unit());
                        self.boxes.push(ContentBox::image(rect, self.page));
                    }
                }
            }
        }
        decoded.unreadable_segments
    }

    fn apply(&mut self, op: &Operation, resources: &Dictionary, depth: usize) {
        let operands = &op.operands;
        let num = |index: usize| operands.get(index).and_then(number);

        match op.operator.as_str() {
            "q" => self.stack.push(self.state),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.state.ctm = m.multiply(&self.state.ctm);
                }
            }
            "BT" => self.run = Some(TextRun::default()),
            "ET" => self.finish_text(),
            "Tf" => {
                if let Some(size) = num(1) {
                    self.state.font_size = size;
                }
            }
            "Tc" => self.state.char_spacing = num(0).unwrap_or(0.0),
            "Tw" => self.state.word_spacing = num(0).unwrap_or(0.0),
            "Tz" => self.state.horizontal_scale = num(0).unwrap_or(100.0) / 100.0,
            "TL" => self.state.leading = num(0).unwrap_or(0.0),
            "Ts" => self.state.rise = num(0).unwrap_or(0.0),
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.state.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let (Some(m), Some(run)) = (matrix_operand(operands), self.run.as_mut()) {
                    run.matrix = m;
                    run.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                self.state.word_spacing = num(0).unwrap_or(self.state.word_spacing);
                self.state.char_spacing = num(1).unwrap_or(self.state.char_spacing);
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if let Some(adjust) = number(other) {
                                    let tx = -adjust / 1000.0
                                        * self.state.font_size
                                        * self.state.horizontal_scale;
                                    self.advance(tx);
                                }
                            }
                        }
                    }
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.paint_xobject(name, resources, depth);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        if let Some(run) = self.run.as_mut() {
            run.line_matrix = Matrix::translation(tx, ty).multiply(&run.line_matrix);
            run.matrix = run.line_matrix;
        }
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, tx: f64) {
        if let Some(run) = self.run.as_mut() {
            run.matrix = Matrix::translation(tx, 0.0).multiply(&run.matrix);
        }
    }

    /// Show a string: extend the run's bounds and advance the text matrix.
    fn show(&mut self, bytes: &[u8]) {
        let state = self.state;
        let Some(run) = self.run.as_mut() else {
            return;
        };

        let mut width = 0.0;
        for &byte in bytes {
            let word = if byte == b' ' { state.word_spacing } else { 0.0 };
            width += (GLYPH_ADVANCE * state.font_size + state.char_spacing + word)
                * state.horizontal_scale;
        }

        if !bytes.is_empty() {
            let extent = Rect::new(
                0.0,
                DESCENT * state.font_size + state.rise,
                width,
                ASCENT * state.font_size + state.rise,
            );
            let placed = run.matrix.multiply(&state.ctm).transform_rect(&extent);
            run.bounds = Some(match run.bounds {
                Some(bounds) => bounds.union(&placed),
                None => placed,
            });
            run.text.extend(
                bytes
                    .iter()
                    .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { ' ' }),
            );
            run.text.push(' ');
        }

        run.matrix = Matrix::translation(width, 0.0).multiply(&run.matrix);
    }

    fn finish_text(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        if let Some(bounds) = run.bounds
            && !run.text.trim().is_empty()
        {
            self.boxes.push(ContentBox::text(bounds, self.page, &run.text));
        }
    }

    fn paint_xobject(&mut self, name: &[u8], resources: &Dictionary, depth: usize) {
        let doc = self.doc;
        let Some(entry) = sub_dict(doc, resources, b"XObject").and_then(|xobjects| xobjects.get(name).ok())
        else {
            debug!(
                page = self.page,
                name = %String::from_utf8_lossy(name),
                "XObject not found in resources"
            );
            return;
        };

        let Object::Stream(stream) = resolve(doc, entry) else {
            return;
        };

        match stream.dict.get(b"Subtype").ok().and_then(|s| name_of(doc, s)).as_deref() {
            Some("Image") => {
                if self.options.image_placements {
                    let rect = self.state.ctm.transform_rect(&Rect::unit());
                    self.boxes.push(ContentBox::image(rect, self.page));
                }
            }
            Some("Form") => {
                if depth >= self.options.max_form_depth {
                    debug!(page = self.page, depth, "form XObject nesting too deep");
                    return;
                }
                if let Object::Reference(id) = entry
                    && !self.visited_forms.insert(*id)
                {
                    return;
                }

                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|m| match resolve(doc, m) {
                        Object::Array(items) => matrix_operand(items),
                        _ => None,
                    })
                    .unwrap_or_default();
                let form_resources = sub_dict(doc, &stream.dict, b"Resources").unwrap_or(resources);
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());

                let saved_state = self.state;
                let saved_stack = self.stack.len();
                let saved_run = self.run.take();
                self.state.ctm = form_matrix.multiply(&self.state.ctm);

                let unreadable = self.execute(&content, form_resources, depth + 1);
                if unreadable > 0 {
                    debug!(page = self.page, unreadable, "form XObject partly undecodable");
                    self.unreadable_segments += unreadable;
                }
                self.finish_text();

                self.state = saved_state;
                self.stack.truncate(saved_stack);
                self.run = saved_run;

                if let Object::Reference(id) = entry {
                    self.visited_forms.remove(id);
                }
            }
            _ => {}
        }
    }
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    let values: Vec<f64> = operands.iter().filter_map(number).collect();
    if values.len() != operands.len() {
        return None;
    }
    Matrix::from_slice(&values)
}

/// Image XObjects reachable from a resource dictionary, including those
/// nested in form XObjects.
///
/// Each entry is the resource name, the object id when the image is an
/// indirect object, and the image stream. Indirect images are reported once.
pub fn collect_images<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    max_depth: usize,
) -> Vec<(String, Option<ObjectId>, &'a lopdf::Stream)> {
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    collect_images_into(doc, resources, max_depth, &mut seen, &mut found);
    found
}

fn collect_images_into<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    depth: usize,
    seen: &mut HashSet<ObjectId>,
    found: &mut Vec<(String, Option<ObjectId>, &'a lopdf::Stream)>,
) {
    let Some(xobjects) = sub_dict(doc, resources, b"XObject") else {
        return;
    };

    for (name, entry) in xobjects.iter() {
        let id = match entry {
            Object::Reference(id) => {
                if !seen.insert(*id) {
                    continue;
                }
                Some(*id)
            }
            _ => None,
        };

        let Object::Stream(stream) = resolve(doc, entry) else {
            continue;
        };

        match stream.dict.get(b"Subtype").ok().and_then(|s| name_of(doc, s)).as_deref() {
            Some("Image") => {
                found.push((String::from_utf8_lossy(name).into_owned(), id, stream));
            }
            Some("Form") if depth > 0 => {
                if let Some(nested) = stream.dict.get(b"Resources").ok().and_then(|r| dict_of(doc, r)) {
                    collect_images_into(doc, nested, depth - 1, seen, found);
                }
            }
            _ => {}
        }
    }
}
