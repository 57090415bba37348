//! Shared fixtures for printspec integration tests.
//!
//! Documents and images are generated at test time with `lopdf` and
//! `image` so no binary fixtures live in the repository.

#![allow(dead_code)]

use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use std::path::{Path, PathBuf};

/// One image placed on a fixture page.
pub struct PlacedImage {
    /// JPEG bytes, embedded with `/DCTDecode`.
    pub jpeg: Vec<u8>,
    /// Declared `/ColorSpace` name.
    pub colorspace: &'static str,
    /// Placement as `[x, y, width, height]` in points.
    pub placement: [f64; 4],
}

/// One page of a fixture document.
pub struct PageSpec {
    /// Page width and height in points.
    pub size: (f64, f64),
    /// Images painted on the page.
    pub images: Vec<PlacedImage>,
    /// Extra content stream operators, appended after the images.
    pub content: String,
}

impl PageSpec {
    /// A blank page of the given size in inches.
    pub fn inches(width: f64, height: f64) -> Self {
        Self {
            size: (width * 72.0, height * 72.0),
            images: Vec::new(),
            content: String::new(),
        }
    }

    /// A blank US Letter page.
    pub fn letter() -> Self {
        Self::inches(8.5, 11.0)
    }

    /// Add an image.
    pub fn image(mut self, image: PlacedImage) -> Self {
        self.images.push(image);
        self
    }

    /// Show `text` with its baseline starting at `(x, y)`.
    pub fn text(mut self, x: f64, y: f64, text: &str) -> Self {
        self.content
            .push_str(&format!("BT /F1 12 Tf {x} {y} Td ({text}) Tj ET\n"));
        self
    }

    /// Append raw content operators.
    pub fn raw(mut self, operators: &str) -> Self {
        self.content.push_str(operators);
        self.content.push('\n');
        self
    }
}

/// An RGB JPEG with a JFIF density.
pub fn jpeg(width: u32, height: u32, dpi: u16) -> Vec<u8> {
    let pixels = vec![128u8; (width * height * 3) as usize];
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, 75);
    encoder.set_pixel_density(PixelDensity::dpi(dpi));
    encoder
        .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
        .expect("Failed to encode JPEG");
    buffer
}

/// An RGB PNG without density metadata.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let pixels = vec![255u8; (width * height * 3) as usize];
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
        .expect("Failed to encode PNG");
    buffer
}

/// A small JPEG image placed well inside a Letter page.
pub fn placed_jpeg(dpi: u16, colorspace: &'static str) -> PlacedImage {
    PlacedImage {
        jpeg: jpeg(24, 24, dpi),
        colorspace,
        placement: [144.0, 288.0, 216.0, 216.0],
    }
}

/// Build a PDF from page specs.
pub fn build_pdf(pages: Vec<PageSpec>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for page in pages {
        let mut xobjects = Dictionary::new();
        let mut content = String::new();

        for (index, image) in page.images.into_iter().enumerate() {
            let name = format!("Im{index}");
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 24,
                    "Height" => 24,
                    "ColorSpace" => Object::Name(image.colorspace.as_bytes().to_vec()),
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                image.jpeg,
            ));
            xobjects.set(name.as_bytes().to_vec(), image_id);

            let [x, y, w, h] = image.placement;
            content.push_str(&format!("q {w} 0 0 {h} {x} {y} cm /{name} Do Q\n"));
        }
        content.push_str(&page.content);

        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let (width, height) = page.size;
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(width as f32), Object::Real(height as f32)],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => count,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save PDF");
    bytes
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write fixture");
    path
}
