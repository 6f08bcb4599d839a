//! # PDF Serializer
//!
//! Takes the laid-out pages from the layout engine and writes a PDF 1.7
//! file. The writer is hand-rolled: the subset a testimony sheet needs
//! (two standard fonts, JPEG images, stroked rectangles, text) is small.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages
//! ...
//! xref                <- byte offsets of each object
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Layout coordinates are millimetres from the top-left corner. PDF user
//! space is points from the bottom-left, so every coordinate is scaled by
//! `k = 72 / 25.4` and y is flipped against the page height.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;
use std::sync::Arc;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::{FolhaError, Result};
use crate::font::StandardFont;
use crate::image_loader::LoadedImage;
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, TextLine};
use crate::model::{Metadata, PageGeometry};

const PRODUCER: &str = "Folha";

pub struct PdfWriter {
    /// Points per layout unit.
    scale: f64,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font → object id, in resource-name order (/F0, /F1).
    font_objects: Vec<(StandardFont, usize)>,
    /// XObject ids for images, referenced as /Im0, /Im1, ...
    image_objects: Vec<usize>,
    /// Maps (page_index, element_index) to an index in `image_objects`.
    image_index_map: HashMap<(usize, usize), usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfWriter {
    pub fn new(geometry: &PageGeometry) -> Self {
        Self {
            scale: geometry.scale_factor(),
        }
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(&self, pages: &[LayoutPage], metadata: &Metadata) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(FolhaError::RenderError("document has no pages".to_string()));
        }

        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            image_objects: Vec::new(),
            image_index_map: HashMap::new(),
        };

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        for _ in 0..3 {
            builder.objects.push(PdfObject { data: vec![] });
        }

        self.register_fonts(&mut builder, pages);
        self.register_images(&mut builder, pages);

        let font_resources = Self::build_font_resource_dict(&builder.font_objects);
        let mut page_obj_ids: Vec<usize> = Vec::with_capacity(pages.len());

        for (page_idx, page) in pages.iter().enumerate() {
            let content = self.build_content_stream_for_page(page, page_idx, &builder)?;
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_obj_id = builder.objects.len();
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            builder.objects.push(PdfObject { data: content_data });

            let page_obj_id = builder.objects.len();
            let xobject_resources = Self::build_xobject_resource_dict(page_idx, &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!("/Font << {} >> /XObject << {} >>", font_resources, xobject_resources)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width * self.scale,
                page.height * self.scale,
                content_obj_id,
                resources
            );
            builder.objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
            page_obj_ids.push(page_obj_id);
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = builder.objects.len();
        builder.objects.push(PdfObject {
            data: Self::build_info_dict(metadata).into_bytes(),
        });

        Ok(Self::serialize(&builder, info_obj_id))
    }

    fn build_info_dict(metadata: &Metadata) -> String {
        let mut info = String::from("<< ");
        let entries = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Creator", &metadata.creator),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                let _ = write!(info, "/{} ({}) ", key, Self::encode_text(value));
            }
        }
        let _ = write!(info, "/Producer ({}) >>", PRODUCER);
        info
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream_for_page(
        &self,
        page: &LayoutPage,
        page_idx: usize,
        builder: &PdfBuilder,
    ) -> Result<String> {
        let mut stream = String::new();
        for (elem_idx, element) in page.elements.iter().enumerate() {
            self.write_element(&mut stream, element, page.height, builder, (page_idx, elem_idx))?;
        }
        Ok(stream)
    }

    /// Write a single layout element as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
        position: (usize, usize),
    ) -> Result<()> {
        let k = self.scale;
        match &element.draw {
            DrawCommand::Border { line_width } => {
                let x = element.x * k;
                let y = (page_height - element.y - element.height) * k;
                let _ = write!(
                    stream,
                    "q\n0 G\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                    line_width * k,
                    x,
                    y,
                    element.width * k,
                    element.height * k
                );
            }

            DrawCommand::Text {
                lines,
                font,
                font_size,
            } => {
                let font_idx = builder
                    .font_objects
                    .iter()
                    .position(|(f, _)| f == font)
                    .ok_or_else(|| {
                        FolhaError::RenderError(format!("font {} was not registered", font.pdf_name()))
                    })?;
                for line in lines {
                    self.write_text_line(stream, line, font_idx, *font_size, page_height);
                }
            }

            DrawCommand::Image { .. } => {
                let img_idx = builder.image_index_map.get(&position).ok_or_else(|| {
                    FolhaError::RenderError(format!(
                        "image on page {} was not registered",
                        position.0 + 1
                    ))
                })?;
                let x = element.x * k;
                let y = (page_height - element.y - element.height) * k;
                let _ = write!(
                    stream,
                    "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                    element.width * k,
                    element.height * k,
                    x,
                    y,
                    img_idx
                );
            }
        }
        Ok(())
    }

    fn write_text_line(
        &self,
        stream: &mut String,
        line: &TextLine,
        font_idx: usize,
        font_size: f64,
        page_height: f64,
    ) {
        let k = self.scale;
        let _ = write!(
            stream,
            "BT\n/F{} {:.1} Tf\n0 g\n{:.2} {:.2} Td\n({}) Tj\nET\n",
            font_idx,
            font_size,
            line.x * k,
            (page_height - line.y) * k,
            Self::encode_text(&line.text)
        );
    }

    /// Register the standard fonts that are actually drawn, in a stable order.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        let used: BTreeSet<StandardFont> = pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .filter_map(|e| match &e.draw {
                DrawCommand::Text { font, .. } => Some(*font),
                _ => None,
            })
            .collect();

        // A page with no text still needs a valid /Font resource.
        let fonts: Vec<StandardFont> = if used.is_empty() {
            vec![StandardFont::Helvetica]
        } else {
            used.into_iter().collect()
        };

        for font in fonts {
            let obj_id = builder.objects.len();
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            builder.objects.push(PdfObject {
                data: dict.into_bytes(),
            });
            builder.font_objects.push((font, obj_id));
        }
    }

    /// Write each distinct image once and map every drawing of it to its
    /// XObject. The same preview may appear on several pages (the heading
    /// image is also the first "after" image).
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        let mut by_pointer: HashMap<*const LoadedImage, usize> = HashMap::new();
        for (page_idx, page) in pages.iter().enumerate() {
            for (elem_idx, element) in page.elements.iter().enumerate() {
                let DrawCommand::Image { image } = &element.draw else {
                    continue;
                };
                let img_idx = *by_pointer.entry(Arc::as_ptr(image)).or_insert_with(|| {
                    let obj_id = Self::write_image_xobject(builder, image);
                    builder.image_objects.push(obj_id);
                    builder.image_objects.len() - 1
                });
                builder.image_index_map.insert((page_idx, elem_idx), img_idx);
            }
        }
    }

    /// Write a JPEG as a DCTDecode image XObject. Returns its object id.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        let obj_id = builder.objects.len();
        let mut obj_data: Vec<u8> = Vec::new();
        let _ = write!(
            obj_data,
            "<< /Type /XObject /Subtype /Image \
             /Width {} /Height {} \
             /ColorSpace {} \
             /BitsPerComponent 8 \
             /Filter /DCTDecode \
             /Length {} >>\nstream\n",
            image.width_px,
            image.height_px,
            image.color_space.pdf_name(),
            image.jpeg.len()
        );
        obj_data.extend_from_slice(&image.jpeg);
        obj_data.extend_from_slice(b"\nendstream");
        builder.objects.push(PdfObject { data: obj_data });
        obj_id
    }

    /// Build the /XObject resource dict entries for a specific page.
    fn build_xobject_resource_dict(page_idx: usize, builder: &PdfBuilder) -> String {
        let mut entries: Vec<(usize, usize)> = builder
            .image_index_map
            .iter()
            .filter(|((pidx, _), _)| *pidx == page_idx)
            .map(|(_, &img_idx)| (img_idx, builder.image_objects[img_idx]))
            .collect();
        entries.sort_unstable();
        entries.dedup();
        entries
            .iter()
            .map(|(idx, obj_id)| format!("/Im{} {} 0 R", idx, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_font_resource_dict(font_objects: &[(StandardFont, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Encode text as the body of a PDF literal string in WinAnsiEncoding.
    /// Characters outside the encoding become '?', matching how they were
    /// measured.
    fn encode_text(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            let b = unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is based on Windows-1252. Most codepoints in
/// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
/// contains special mappings for smart quotes, bullets, dashes, etc.
pub(crate) fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82), // Single low-9 quotation mark
        0x0192 => Some(0x83), // Latin small letter f with hook
        0x201E => Some(0x84), // Double low-9 quotation mark
        0x2026 => Some(0x85), // Horizontal ellipsis
        0x2020 => Some(0x86), // Dagger
        0x2021 => Some(0x87), // Double dagger
        0x02C6 => Some(0x88), // Modifier letter circumflex accent
        0x2030 => Some(0x89), // Per mille sign
        0x0160 => Some(0x8A), // Latin capital letter S with caron
        0x2039 => Some(0x8B), // Single left-pointing angle quotation
        0x0152 => Some(0x8C), // Latin capital ligature OE
        0x017D => Some(0x8E), // Latin capital letter Z with caron
        0x2018 => Some(0x91), // Left single quotation mark
        0x2019 => Some(0x92), // Right single quotation mark
        0x201C => Some(0x93), // Left double quotation mark
        0x201D => Some(0x94), // Right double quotation mark
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x02DC => Some(0x98), // Small tilde
        0x2122 => Some(0x99), // Trade mark sign
        0x0161 => Some(0x9A), // Latin small letter s with caron
        0x203A => Some(0x9B), // Single right-pointing angle quotation
        0x0153 => Some(0x9C), // Latin small ligature oe
        0x017E => Some(0x9E), // Latin small letter z with caron
        0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
        _ => None,
    }
}
