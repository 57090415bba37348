//! Raster decoding: pixel dimensions, resolution metadata and pixel mode.
//!
//! Only headers are read; pixel data is never decompressed. Resolution comes
//! from JFIF density (JPEG) or `pHYs` (PNG). Anything without that metadata
//! reports [`DEFAULT_DPI`] on both axes.

use image::{ImageDecoder, ImageFormat, ImageReader};
use lopdf::{Document, Object, Stream};
use serde::Serialize;
use std::io::Cursor;
use tracing::debug;

use crate::error::{PrintSpecError, Result};
use crate::parse::{name_of, number, resolve};

/// Resolution reported when an image carries no density metadata.
pub const DEFAULT_DPI: f64 = 72.0;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const METERS_PER_INCH: f64 = 0.0254;
const CM_PER_INCH: f64 = 2.54;

/// Header-level facts about one raster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterInfo {
    /// Width in pixels.
    pub width_px: u32,
    /// Height in pixels.
    pub height_px: u32,
    /// Horizontal samples per inch.
    pub dpi_x: f64,
    /// Vertical samples per inch.
    pub dpi_y: f64,
    /// Pixel mode label, e.g. `RGB`, `CMYK`, `L`, `P`.
    pub mode: String,
}

impl RasterInfo {
    /// Physical width in inches at the recorded resolution.
    pub fn width_inches(&self) -> f64 {
        f64::from(self.width_px) / self.dpi_x
    }

    /// Physical height in inches at the recorded resolution.
    pub fn height_inches(&self) -> f64 {
        f64::from(self.height_px) / self.dpi_y
    }
}

/// Decode the header of a standalone image file.
///
/// # Errors
///
/// Returns [`PrintSpecError::RasterDecode`] if the format is not recognized
/// or the header cannot be parsed.
pub fn probe_image(name: &str, bytes: &[u8]) -> Result<RasterInfo> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| PrintSpecError::raster_decode(name, err.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| PrintSpecError::raster_decode(name, "unrecognized image format"))?;

    let decoder = reader
        .into_decoder()
        .map_err(|err| PrintSpecError::raster_decode(name, err.to_string()))?;

    let (width_px, height_px) = decoder.dimensions();
    let color_type = decoder.original_color_type();

    let (density, mode) = match format {
        ImageFormat::Jpeg => {
            let header = scan_jpeg(bytes);
            (
                header.as_ref().and_then(|h| h.density),
                header.map(|h| jpeg_mode(h.components).to_string()),
            )
        }
        ImageFormat::Png => (png_density(bytes), png_mode(bytes).map(String::from)),
        ImageFormat::Gif => (None, Some("P".to_string())),
        _ => (None, None),
    };

    let (dpi_x, dpi_y) = density.unwrap_or((DEFAULT_DPI, DEFAULT_DPI));
    let mode = mode.unwrap_or_else(|| color_type_mode(color_type).to_string());

    debug!(name, ?format, width_px, height_px, dpi_x, dpi_y, %mode, "probed image");

    Ok(RasterInfo {
        width_px,
        height_px,
        dpi_x,
        dpi_y,
        mode,
    })
}

/// Decode the header of an image XObject stream.
///
/// `DCTDecode` streams are JPEG files and are probed as such. Other filters
/// carry no resolution metadata; their mode comes from `/ColorSpace`.
///
/// # Errors
///
/// Returns a description of the problem when the stream has no usable
/// dimensions.
pub fn probe_image_stream(doc: &Document, stream: &Stream) -> std::result::Result<RasterInfo, String> {
    let dict = &stream.dict;

    let is_dct = dict
        .get(b"Filter")
        .map(|filter| filter_names(doc, filter).iter().any(|f| f == "DCTDecode"))
        .unwrap_or(false);

    if is_dct && let Some(header) = scan_jpeg(&stream.content) {
        let (dpi_x, dpi_y) = header.density.unwrap_or((DEFAULT_DPI, DEFAULT_DPI));
        return Ok(RasterInfo {
            width_px: header.width,
            height_px: header.height,
            dpi_x,
            dpi_y,
            mode: jpeg_mode(header.components).to_string(),
        });
    }

    let dimension = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|obj| number(resolve(doc, obj)))
            .filter(|value| *value >= 1.0)
            .map(|value| value as u32)
    };

    let width_px = dimension(b"Width").ok_or("image stream has no /Width")?;
    let height_px = dimension(b"Height").ok_or("image stream has no /Height")?;

    let is_mask = matches!(
        dict.get(b"ImageMask").map(|obj| resolve(doc, obj)),
        Ok(Object::Boolean(true))
    );
    let bits = dimension(b"BitsPerComponent").unwrap_or(8);

    let mode = if is_mask {
        "1".to_string()
    } else {
        dict.get(b"ColorSpace")
            .map(|cs| colorspace_mode(doc, cs, bits))
            .unwrap_or_else(|_| "L".to_string())
    };

    Ok(RasterInfo {
        width_px,
        height_px,
        dpi_x: DEFAULT_DPI,
        dpi_y: DEFAULT_DPI,
        mode,
    })
}

fn filter_names(doc: &Document, filter: &Object) -> Vec<String> {
    match resolve(doc, filter) {
        Object::Array(items) => items.iter().filter_map(|item| name_of(doc, item)).collect(),
        other => name_of(doc, other).into_iter().collect(),
    }
}

/// Pixel mode implied by a `/ColorSpace` entry.
fn colorspace_mode(doc: &Document, colorspace: &Object, bits: u32) -> String {
    let resolved = resolve(doc, colorspace);
    let (family, params) = match resolved {
        Object::Array(items) => match items.first().and_then(|first| name_of(doc, first)) {
            Some(family) => (family, &items[1..]),
            None => return "L".to_string(),
        },
        other => match name_of(doc, other) {
            Some(family) => (family, &[][..]),
            None => return "L".to_string(),
        },
    };

    match family.as_str() {
        "DeviceRGB" | "CalRGB" => "RGB".to_string(),
        "DeviceCMYK" => "CMYK".to_string(),
        "DeviceGray" | "CalGray" if bits == 1 => "1".to_string(),
        "DeviceGray" | "CalGray" => "L".to_string(),
        "Indexed" | "I" => "P".to_string(),
        "Lab" => "LAB".to_string(),
        "ICCBased" => {
            let components = params
                .first()
                .map(|stream| resolve(doc, stream))
                .and_then(|obj| match obj {
                    Object::Stream(stream) => stream.dict.get(b"N").ok().and_then(number),
                    _ => None,
                });
            match components.map(|n| n as u32) {
                Some(1) => "L".to_string(),
                Some(4) => "CMYK".to_string(),
                _ => "RGB".to_string(),
            }
        }
        other => other.to_string(),
    }
}

fn color_type_mode(color_type: image::ExtendedColorType) -> &'static str {
    use image::ExtendedColorType;

    match color_type {
        ExtendedColorType::L1 => "1",
        other => match other.channel_count() {
            1 => "L",
            2 => "LA",
            3 => "RGB",
            4 => "RGBA",
            _ => "unknown",
        },
    }
}

/// Frame header facts of a JPEG stream.
#[derive(Debug, Clone, Copy, PartialEq)]
struct JpegHeader {
    width: u32,
    height: u32,
    components: u8,
    density: Option<(f64, f64)>,
}

fn jpeg_mode(components: u8) -> &'static str {
    match components {
        1 => "L",
        4 => "CMYK",
        _ => "RGB",
    }
}

/// Walk JPEG markers up to the first start-of-frame.
fn scan_jpeg(data: &[u8]) -> Option<JpegHeader> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut density = None;
    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = data[pos + 1];
        pos += 2;

        // Fill bytes and standalone markers carry no length
        if marker == 0xFF || marker == 0x00 || (0xD0..=0xD8).contains(&marker) {
            continue;
        }

        if pos + 2 > data.len() {
            return None;
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        let segment = data.get(pos + 2..pos + length)?;

        match marker {
            0xE0 if segment.starts_with(b"JFIF\0") && segment.len() >= 12 => {
                let x = u16::from_be_bytes([segment[8], segment[9]]);
                let y = u16::from_be_bytes([segment[10], segment[11]]);
                density = match segment[7] {
                    1 if x > 0 && y > 0 => Some((f64::from(x), f64::from(y))),
                    2 if x > 0 && y > 0 => {
                        Some((f64::from(x) * CM_PER_INCH, f64::from(y) * CM_PER_INCH))
                    }
                    _ => None,
                };
            }
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                if segment.len() < 6 {
                    return None;
                }
                return Some(JpegHeader {
                    height: u32::from(u16::from_be_bytes([segment[1], segment[2]])),
                    width: u32::from(u16::from_be_bytes([segment[3], segment[4]])),
                    components: segment[5],
                    density,
                });
            }
            _ => {}
        }

        pos += length;
    }

    None
}

/// Iterate PNG chunks as `(type, data)` up to the first `IDAT`.
fn png_chunks(data: &[u8]) -> impl Iterator<Item = (&[u8], &[u8])> {
    let mut pos = if data.starts_with(PNG_SIGNATURE) {
        PNG_SIGNATURE.len()
    } else {
        data.len()
    };

    std::iter::from_fn(move || {
        let header = data.get(pos..pos + 8)?;
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = &header[4..8];
        if kind == b"IDAT" {
            return None;
        }
        let body = data.get(pos + 8..pos + 8 + length)?;
        pos += 12 + length;
        Some((kind, body))
    })
}

fn png_density(data: &[u8]) -> Option<(f64, f64)> {
    let (_, body) = png_chunks(data).find(|(kind, _)| *kind == b"pHYs")?;
    if body.len() < 9 || body[8] != 1 {
        return None;
    }
    let x = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
    let y = u32::from_be_bytes([body[4], body[5], body[6], body[7]]);
    (x > 0 && y > 0).then(|| (per_meter_to_dpi(x), per_meter_to_dpi(y)))
}

/// Pixels per metre to DPI, rounded to hundredths.
///
/// 300 DPI is stored as 11811 px/m, which converts back to 299.9994.
fn per_meter_to_dpi(per_meter: u32) -> f64 {
    (f64::from(per_meter) * METERS_PER_INCH * 100.0).round() / 100.0
}

fn png_mode(data: &[u8]) -> Option<&'static str> {
    let (_, body) = png_chunks(data).find(|(kind, _)| *kind == b"IHDR")?;
    let (bit_depth, color_type) = (*body.get(8)?, *body.get(9)?);
    Some(match color_type {
        0 if bit_depth == 1 => "1",
        0 => "L",
        2 => "RGB",
        3 => "P",
        4 => "LA",
        6 => "RGBA",
        _ => return None,
    })
}
