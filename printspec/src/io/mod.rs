//! Input items and how they are read from disk.
//!
//! An [`InputItem`] is a named byte buffer tagged with its [`ItemKind`].
//! The kind is inferred from the file extension and, failing that, from the
//! leading bytes.

pub mod reader;

pub use reader::{InputReader, LoadResult, LoadStatistics};

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::error::{PrintSpecError, Result};

/// Extensions recognized as standalone raster images.
pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];

/// Kind of input item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A multi-page PDF document.
    Document,
    /// A single raster image.
    Image,
}

impl ItemKind {
    /// Infer the kind from a name's extension.
    pub fn from_extension(name: &str) -> Option<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_lowercase();

        if ext == "pdf" {
            Some(Self::Document)
        } else if RASTER_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else {
            None
        }
    }

    /// Infer the kind from leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(Self::Document);
        }
        image::guess_format(bytes).ok().map(|_| Self::Image)
    }

    /// Infer the kind from the extension, falling back to magic bytes.
    pub fn detect(name: &str, bytes: &[u8]) -> Option<Self> {
        Self::from_extension(name).or_else(|| Self::sniff(bytes))
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// A named byte buffer to validate.
#[derive(Clone)]
pub struct InputItem {
    /// Display name, usually the source path.
    pub name: String,
    /// Kind of content held in `bytes`.
    pub kind: ItemKind,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl InputItem {
    /// Create an item with an explicit kind.
    pub fn new(name: impl Into<String>, kind: ItemKind, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind,
            bytes,
        }
    }

    /// Create an item, inferring its kind.
    ///
    /// # Errors
    ///
    /// Returns [`PrintSpecError::UnsupportedInput`] when neither the extension
    /// nor the content identifies a document or an image.
    pub fn detect(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        match ItemKind::detect(&name, &bytes) {
            Some(kind) => Ok(Self::new(name, kind, bytes)),
            None => Err(PrintSpecError::unsupported_input(name)),
        }
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the item has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for InputItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputItem")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}
