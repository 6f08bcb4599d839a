//! # Image Loading and Decoding
//!
//! Turns uploaded image bytes into something the PDF serializer can embed.
//! Every image ends up JPEG-encoded: JPEG uploads pass through untouched
//! (the PDF spec supports DCTDecode natively), PNG and WebP uploads are
//! decoded, flattened onto white and re-encoded as JPEG.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::ColorType;

/// JPEG quality used when re-encoding non-JPEG uploads.
pub const JPEG_QUALITY: u8 = 92;

/// A fully loaded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// JPEG bytes, embedded directly with DCTDecode.
    pub jpeg: Vec<u8>,
    pub color_space: JpegColorSpace,
    pub width_px: u32,
    pub height_px: u32,
}

impl LoadedImage {
    /// Intrinsic width / height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width_px as f64 / self.height_px as f64
    }
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl JpegColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            JpegColorSpace::DeviceRGB => "/DeviceRGB",
            JpegColorSpace::DeviceGray => "/DeviceGray",
        }
    }
}

/// Resolve a source string to raw image bytes.
///
/// Supported `src` formats:
/// - `data:image/...;base64,...` — data URI
/// - File path starting with `/`, `./` or `../` — read from disk
/// - Raw base64-encoded image data
pub fn read_source_bytes(src: &str) -> Result<Vec<u8>, String> {
    if src.starts_with("data:image/") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| "Invalid data URI: missing comma".to_string())?;
        return base64_decode(&src[comma_pos + 1..]);
    }

    // Only explicit path prefixes: base64 text may contain '/'.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        #[cfg(not(target_arch = "wasm32"))]
        {
            return std::fs::read(src)
                .map_err(|e| format!("Failed to read image file '{}': {}", src, e));
        }
        #[cfg(target_arch = "wasm32")]
        {
            return Err(format!(
                "File path images not supported in WASM: '{}'. Use data URIs or base64.",
                src
            ));
        }
    }

    base64_decode(src)
}

/// The MIME type declared by a data URI, if `src` is one.
pub fn data_uri_mime(src: &str) -> Option<&str> {
    let rest = src.strip_prefix("data:")?;
    let end = rest.find([';', ','])?;
    Some(&rest[..end])
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| format!("Base64 decode error: {}", e))
}

/// Decode uploaded bytes. A declared MIME type outside `image/*` is rejected
/// before looking at the bytes; otherwise the format comes from magic bytes.
pub fn decode_upload(data: &[u8], declared_mime: Option<&str>) -> Result<LoadedImage, String> {
    if let Some(mime) = declared_mime {
        if !mime.starts_with("image/") {
            return Err(format!("Declared type '{}' is not an image", mime));
        }
    }
    decode_image_bytes(data)
}

/// Detect image format from magic bytes and decode accordingly.
fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, String> {
    if data.len() < 4 {
        return Err("Image data too short".to_string());
    }

    let loaded = if is_jpeg(data) {
        match detect_jpeg_color_space(data) {
            Some(color_space) => decode_jpeg(data, color_space)?,
            // CMYK / YCCK and unreadable frames: let the decoder convert to RGB.
            None => reencode_as_jpeg(data)?,
        }
    } else if is_png(data) || is_webp(data) {
        reencode_as_jpeg(data)?
    } else {
        return Err("Unsupported image format (expected JPEG, PNG or WebP)".to_string());
    };

    if loaded.width_px == 0 || loaded.height_px == 0 {
        return Err(format!(
            "Image has no usable size ({}x{})",
            loaded.width_px, loaded.height_px
        ));
    }
    Ok(loaded)
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

/// JPEG: read dimensions without decoding pixels.
fn decode_jpeg(data: &[u8], color_space: JpegColorSpace) -> Result<LoadedImage, String> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("JPEG format detection error: {}", e))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| format!("Failed to read JPEG dimensions: {}", e))?;

    Ok(LoadedImage {
        jpeg: data.to_vec(),
        color_space,
        width_px: width,
        height_px: height,
    })
}

/// Scan JPEG markers to find the SOF (Start of Frame) segment and map its
/// component count to a PDF color space. Only gray and RGB data can be
/// embedded as-is; anything else returns `None`.
fn detect_jpeg_color_space(data: &[u8]) -> Option<JpegColorSpace> {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        // SOF markers: C0-C3, C5-C7, C9-CB, CD-CF
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            // length(2) + precision(1) + height(2) + width(2) + num_components(1)
            return match data[i + 9] {
                1 => Some(JpegColorSpace::DeviceGray),
                3 => Some(JpegColorSpace::DeviceRGB),
                _ => None,
            };
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    None
}

/// PNG / WebP: decode, composite alpha over white, encode as JPEG.
fn reencode_as_jpeg(data: &[u8]) -> Result<LoadedImage, String> {
    let img = image::load_from_memory(data).map_err(|e| format!("Failed to decode image: {}", e))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.pixels() {
        let a = pixel[3] as u32;
        for c in 0..3 {
            let v = pixel[c] as u32;
            rgb.push(((v * a + 255 * (255 - a)) / 255) as u8);
        }
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode(&rgb, width, height, ColorType::Rgb8)
        .map_err(|e| format!("Failed to encode JPEG: {}", e))?;

    Ok(LoadedImage {
        jpeg,
        color_space: JpegColorSpace::DeviceRGB,
        width_px: width,
        height_px: height,
    })
}
