//! # Form Model
//!
//! The input representation for the generator. Everything the testimony form
//! collects lives in one immutable [`TestimonyForm`] that is built once and
//! passed into the pipeline. [`FormDocument`] is its JSON face: the same
//! fields, with images referenced by `src` strings instead of raw bytes.
//!
//! [`ContentBlock`] is the ordered block plan the layout engine walks.

use serde::{Deserialize, Serialize};

use crate::error::{FolhaError, Result};
use crate::preview::{ImagePreview, PreparedForm};

/// Upper bound on images per gallery, as enforced by the upload form.
pub const MAX_GALLERY_IMAGES: usize = 10;

/// Upper bound on each free-text block, as enforced by the upload form.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Name the finished document is saved under.
pub const OUTPUT_FILE_NAME: &str = "Folha_de_Testemunho.pdf";

/// One uploaded image file: raw bytes plus the MIME type the uploader declared.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub mime: Option<String>,
}

impl ImageUpload {
    pub fn new(data: Vec<u8>, mime: Option<&str>) -> Self {
        Self {
            data,
            mime: mime.map(str::to_string),
        }
    }
}

/// The complete, immutable input of one generation run.
#[derive(Debug, Clone, Default)]
pub struct TestimonyForm {
    pub day_image: Option<ImageUpload>,
    pub testimony_name: String,
    pub testimony_time: String,
    pub before_text: String,
    pub after_text: String,
    pub before_images: Vec<ImageUpload>,
    pub after_images: Vec<ImageUpload>,
    pub geometry: PageGeometry,
    pub metadata: Metadata,
}

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// Page size and margin, fixed for the whole run. Units are millimetres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageGeometry {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default = "default_margin")]
    pub margin: f64,
}

fn default_margin() -> f64 {
    15.0
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: default_margin(),
        }
    }
}

impl PageGeometry {
    pub fn width(&self) -> f64 {
        self.size.dimensions().0
    }

    pub fn height(&self) -> f64 {
        self.size.dimensions().1
    }

    /// Width available between the left and right margins.
    pub fn content_width(&self) -> f64 {
        self.width() - 2.0 * self.margin
    }

    /// Lowest y a block may reach before it must move to a new page.
    pub fn bottom_limit(&self) -> f64 {
        self.height() - self.margin
    }

    /// Points per layout unit.
    pub fn scale_factor(&self) -> f64 {
        72.0 / 25.4
    }
}

/// Standard portrait page sizes in millimetres.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in millimetres.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A3 => (297.0, 420.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

// ── JSON form description ──────────────────────────────────────

/// The form as it arrives over JSON (CLI input, WASM host).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDocument {
    #[serde(default)]
    pub day_image: Option<ImageRef>,
    #[serde(default)]
    pub testimony_name: String,
    #[serde(default)]
    pub testimony_time: String,
    #[serde(default)]
    pub before_text: String,
    #[serde(default)]
    pub after_text: String,
    #[serde(default)]
    pub before_images: Vec<ImageRef>,
    #[serde(default)]
    pub after_images: Vec<ImageRef>,
    #[serde(default)]
    pub page: PageGeometry,
    #[serde(default)]
    pub metadata: Metadata,
}

/// An image referenced by data URI, file path, or raw base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

impl FormDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve every image reference to bytes and produce the run input.
    pub fn load(self) -> Result<TestimonyForm> {
        for (field, text) in [("beforeText", &self.before_text), ("afterText", &self.after_text)] {
            let len = text.chars().count();
            if len > MAX_TEXT_CHARS {
                log::warn!("{} has {} characters, form limit is {}", field, len, MAX_TEXT_CHARS);
            }
        }

        let day_image = self
            .day_image
            .map(|r| r.load("dayImage".to_string()))
            .transpose()?;
        let before_images = load_all(self.before_images, "beforeImages")?;
        let after_images = load_all(self.after_images, "afterImages")?;

        Ok(TestimonyForm {
            day_image,
            testimony_name: self.testimony_name,
            testimony_time: self.testimony_time,
            before_text: self.before_text,
            after_text: self.after_text,
            before_images,
            after_images,
            geometry: self.page,
            metadata: self.metadata,
        })
    }
}

fn load_all(refs: Vec<ImageRef>, field: &str) -> Result<Vec<ImageUpload>> {
    refs.into_iter()
        .enumerate()
        .map(|(i, r)| r.load(format!("{}[{}]", field, i)))
        .collect()
}

impl ImageRef {
    fn load(self, slot: String) -> Result<ImageUpload> {
        let data = crate::image_loader::read_source_bytes(&self.src)
            .map_err(|reason| FolhaError::image(slot, reason))?;
        let mime = self
            .mime
            .or_else(|| crate::image_loader::data_uri_mime(&self.src).map(str::to_string));
        Ok(ImageUpload { data, mime })
    }
}

// ── Block plan ─────────────────────────────────────────────────

/// Font hints for a text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Size in points.
    pub size: f64,
    pub bold: bool,
}

impl TextStyle {
    pub const NORMAL: TextStyle = TextStyle { size: 12.0, bold: false };
    pub const LABEL: TextStyle = TextStyle { size: 12.0, bold: true };
    pub const HEADING: TextStyle = TextStyle { size: 18.0, bold: true };
}

pub const BEFORE_LABEL: &str = "Antes:";
pub const AFTER_LABEL: &str = "Depois:";
pub const BEFORE_IMAGES_LABEL: &str = "Imagens Antes:";
pub const AFTER_IMAGES_LABEL: &str = "Imagens Depois:";
pub const TIME_PREFIX: &str = "Horário: ";

/// One discrete layout unit, in the order the engine places them.
#[derive(Debug, Clone)]
pub enum ContentBlock<'a> {
    /// The centred day image (logo).
    Image { image: &'a ImagePreview },
    /// Testimony name beside the first "after" image.
    HeadingWithImage {
        name: &'a str,
        image: Option<&'a ImagePreview>,
        style: TextStyle,
    },
    /// The time line: `time` is drawn after the "Horário: " prefix.
    Label { time: &'a str, style: TextStyle },
    /// A bold label followed by a wrapped paragraph.
    TextParagraph {
        label: &'static str,
        body: &'a str,
        label_style: TextStyle,
        body_style: TextStyle,
    },
    /// Two-column image gallery. When `skip_heading_image` is set, the
    /// gallery starts after the image the heading already consumed.
    ImageGrid {
        label: &'static str,
        images: &'a [ImagePreview],
        skip_heading_image: bool,
        trailing_space: f64,
    },
}

/// Build the fixed-order block plan. Absent content produces no block.
pub fn plan_blocks<'a>(form: &'a TestimonyForm, previews: &'a PreparedForm) -> Vec<ContentBlock<'a>> {
    let mut blocks = Vec::new();

    if let Some(image) = &previews.day_image {
        blocks.push(ContentBlock::Image { image });
    }

    let first_after = previews.after_images.first();
    if !form.testimony_name.is_empty() || first_after.is_some() {
        blocks.push(ContentBlock::HeadingWithImage {
            name: &form.testimony_name,
            image: first_after,
            style: TextStyle::HEADING,
        });
    }

    if !form.testimony_time.is_empty() {
        blocks.push(ContentBlock::Label {
            time: &form.testimony_time,
            style: TextStyle::NORMAL,
        });
    }

    for (label, body) in [(BEFORE_LABEL, &form.before_text), (AFTER_LABEL, &form.after_text)] {
        if !body.is_empty() {
            blocks.push(ContentBlock::TextParagraph {
                label,
                body,
                label_style: TextStyle::LABEL,
                body_style: TextStyle::NORMAL,
            });
        }
    }

    blocks.push(ContentBlock::ImageGrid {
        label: BEFORE_IMAGES_LABEL,
        images: &previews.before_images,
        skip_heading_image: false,
        trailing_space: 10.0,
    });
    blocks.push(ContentBlock::ImageGrid {
        label: AFTER_IMAGES_LABEL,
        images: &previews.after_images,
        skip_heading_image: true,
        trailing_space: 0.0,
    });

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_geometry_defaults() {
        let g = PageGeometry::default();
        assert_eq!(g.width(), 210.0);
        assert_eq!(g.height(), 297.0);
        assert_eq!(g.margin, 15.0);
        assert_eq!(g.content_width(), 180.0);
        assert_eq!(g.bottom_limit(), 282.0);
    }

    #[test]
    fn form_document_defaults_missing_fields() {
        let doc = FormDocument::from_json(r#"{ "testimonyName": "Cura" }"#).unwrap();
        assert_eq!(doc.testimony_name, "Cura");
        assert!(doc.day_image.is_none());
        assert!(doc.before_images.is_empty());
        assert_eq!(doc.page.margin, 15.0);
        assert!(matches!(doc.page.size, PageSize::A4));
    }

    #[test]
    fn custom_page_size_parses() {
        let doc = FormDocument::from_json(
            r#"{ "page": { "size": { "Custom": { "width": 100, "height": 150 } }, "margin": 10 } }"#,
        )
        .unwrap();
        assert_eq!(doc.page.width(), 100.0);
        assert_eq!(doc.page.height(), 150.0);
        assert_eq!(doc.page.margin, 10.0);
    }

    #[test]
    fn load_reports_bad_image_slot() {
        let doc = FormDocument {
            after_images: vec![ImageRef {
                src: "data:image/png;base64".to_string(),
                mime: None,
            }],
            ..Default::default()
        };
        match doc.load() {
            Err(FolhaError::ImageDecode { slot, .. }) => assert_eq!(slot, "afterImages[0]"),
            other => panic!("expected ImageDecode, got {:?}", other),
        }
    }

    #[test]
    fn plan_skips_absent_blocks() {
        let form = TestimonyForm {
            testimony_name: "Cura".to_string(),
            ..Default::default()
        };
        let previews = PreparedForm::default();
        let blocks = plan_blocks(&form, &previews);
        assert!(matches!(blocks[0], ContentBlock::HeadingWithImage { name: "Cura", image: None, .. }));
        // Galleries are always planned; the engine skips empty ones.
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn plan_includes_time_line() {
        let form = TestimonyForm {
            testimony_time: "14:30".to_string(),
            ..Default::default()
        };
        let previews = PreparedForm::default();
        let blocks = plan_blocks(&form, &previews);
        match &blocks[0] {
            ContentBlock::Label { time, style } => {
                assert_eq!(*time, "14:30");
                assert_eq!(*style, TextStyle::NORMAL);
            }
            other => panic!("expected Label, got {:?}", other),
        }
    }
}
