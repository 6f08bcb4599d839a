//! # Page-Aware Layout Engine
//!
//! One synchronous pass over the block plan. The engine never lays content
//! onto an infinite canvas and slices it afterwards: before every block it
//! asks "does this fit above the bottom margin?" and, if not, opens a new
//! bordered page and places the whole block there.
//!
//! State lives in two values the caller owns and threads through every
//! placement: the [`Cursor`] (vertical write position + page index) and the
//! append-only [`RenderedDocument`]. [`LayoutEngine::ensure_space`] is the
//! only place pages are created after the first.
//!
//! Units are millimetres; text is positioned by its baseline.

pub mod grid;
pub mod page_break;

use std::sync::Arc;

use crate::error::{FolhaError, Result};
use crate::font::{FontContext, StandardFont};
use crate::image_loader::LoadedImage;
use crate::model::{ContentBlock, PageGeometry, TextStyle, TIME_PREFIX};
use crate::preview::ImagePreview;
use crate::text::TextLayout;

use grid::{row_count, GalleryGrid};
use page_break::{decide_break, BreakDecision};

/// How far outside the margin the page border is drawn.
pub const BORDER_INSET: f64 = 2.0;
/// Border stroke width.
pub const BORDER_LINE_WIDTH: f64 = 0.2;

pub const LOGO_WIDTH: f64 = 40.0;
pub const HEADING_IMAGE_WIDTH: f64 = 60.0;
pub const HEADING_IMAGE_MAX_HEIGHT: f64 = 80.0;
/// Horizontal gap between the testimony name and its image.
pub const HEADING_GAP: f64 = 5.0;
/// Space left below logo, heading, text sections and the "before" gallery.
pub const BLOCK_SPACING: f64 = 10.0;
/// Advance after a section label.
pub const LABEL_ADVANCE: f64 = 7.0;
/// Advance after the time line.
pub const TIME_LINE_ADVANCE: f64 = 8.0;
/// Space reserved for a gallery label before it is drawn.
pub const GALLERY_LABEL_SPACE: f64 = 10.0;

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    pub fn images(&self) -> impl Iterator<Item = &LayoutElement> {
        self.elements
            .iter()
            .filter(|e| matches!(e.draw, DrawCommand::Image { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextLine> {
        self.elements.iter().flat_map(|e| match &e.draw {
            DrawCommand::Text { lines, .. } => lines.as_slice(),
            _ => &[],
        })
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Top-left corner (for text, the top of the first line box).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

/// What to actually draw for this element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Stroke the element's rectangle (the page border).
    Border { line_width: f64 },
    /// Draw text lines in one font.
    Text {
        lines: Vec<TextLine>,
        font: StandardFont,
        font_size: f64,
    },
    /// Draw an image scaled into the element's rectangle.
    Image { image: Arc<LoadedImage> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f64,
    /// Baseline.
    pub y: f64,
    pub text: String,
    pub width: f64,
}

/// The engine's write position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub y: f64,
    pub page_index: usize,
}

/// Append-only list of pages. Pages are only ever added by the engine's
/// pagination, never removed.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    geometry: PageGeometry,
    pages: Vec<LayoutPage>,
}

impl RenderedDocument {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
        }
    }

    /// Append a bordered page and return its index.
    fn add_page(&mut self) -> usize {
        let g = &self.geometry;
        let inset = g.margin - BORDER_INSET;
        let border = LayoutElement {
            x: inset,
            y: inset,
            width: g.width() - 2.0 * inset,
            height: g.height() - 2.0 * inset,
            draw: DrawCommand::Border {
                line_width: BORDER_LINE_WIDTH,
            },
        };
        self.pages.push(LayoutPage {
            width: g.width(),
            height: g.height(),
            elements: vec![border],
        });
        self.pages.len() - 1
    }

    /// Draw onto the page the cursor points at. Only the newest page is
    /// writable; anything else is a detached page context.
    fn draw(&mut self, cursor: &Cursor, element: LayoutElement) -> Result<()> {
        let finite = [element.x, element.y, element.width, element.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(FolhaError::RenderError(format!(
                "non-finite element geometry ({}, {}, {}x{})",
                element.x, element.y, element.width, element.height
            )));
        }
        let page_count = self.pages.len();
        match self.pages.last_mut() {
            Some(page) if cursor.page_index + 1 == page_count => {
                page.elements.push(element);
                Ok(())
            }
            _ => Err(FolhaError::RenderError(format!(
                "cursor points at page {} but the document has {} page(s)",
                cursor.page_index, page_count
            ))),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[LayoutPage] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<LayoutPage> {
        self.pages
    }
}

/// Reported by the heading so the "after" gallery can skip its image.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadingOutcome {
    pub consumed_first_after_image: bool,
}

/// What a gallery placement produced.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GalleryOutcome {
    pub placed: usize,
    pub rows: usize,
}

/// Logo size: fixed width, height from the aspect ratio.
pub fn logo_size(width_px: u32, height_px: u32) -> (f64, f64) {
    let height = LOGO_WIDTH / width_px as f64 * height_px as f64;
    (LOGO_WIDTH, height)
}

/// Heading image size: fixed width, height from the aspect ratio; a height
/// over the cap is clamped and the width recomputed from it.
pub fn heading_image_size(width_px: u32, height_px: u32) -> (f64, f64) {
    let mut width = HEADING_IMAGE_WIDTH;
    let mut height = width / width_px as f64 * height_px as f64;
    if height > HEADING_IMAGE_MAX_HEIGHT {
        height = HEADING_IMAGE_MAX_HEIGHT;
        width = height / height_px as f64 * width_px as f64;
    }
    (width, height)
}

/// The main layout engine.
pub struct LayoutEngine {
    geometry: PageGeometry,
    font_context: FontContext,
    text_layout: TextLayout,
}

impl LayoutEngine {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            font_context: FontContext::new(geometry.scale_factor()),
            text_layout: TextLayout::new(),
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn font_context(&self) -> &FontContext {
        &self.font_context
    }

    /// Main entry point: lay out a block plan into pages.
    pub fn layout(&self, blocks: &[ContentBlock<'_>]) -> Result<Vec<LayoutPage>> {
        let (mut cursor, mut doc) = self.begin_document()?;
        let mut heading = HeadingOutcome::default();

        for block in blocks {
            match block {
                ContentBlock::Image { image } => {
                    self.place_logo(&mut doc, &mut cursor, Some(image))?;
                }
                ContentBlock::HeadingWithImage { name, image, style } => {
                    heading = self.place_heading_with_image(&mut doc, &mut cursor, name, *image, *style)?;
                }
                ContentBlock::Label { time, style } => {
                    self.place_time_line(&mut doc, &mut cursor, time, *style)?;
                }
                ContentBlock::TextParagraph {
                    label,
                    body,
                    label_style,
                    body_style,
                } => {
                    self.place_text_section(&mut doc, &mut cursor, label, body, *label_style, *body_style)?;
                }
                ContentBlock::ImageGrid {
                    label,
                    images,
                    skip_heading_image,
                    trailing_space,
                } => {
                    let start_index = if *skip_heading_image && heading.consumed_first_after_image {
                        1
                    } else {
                        0
                    };
                    let outcome = self.place_image_gallery(&mut doc, &mut cursor, label, images, start_index)?;
                    if outcome.placed > 0 {
                        cursor.y += trailing_space;
                    }
                }
            }
        }

        log::debug!("Layout finished with {} page(s)", doc.page_count());
        Ok(doc.into_pages())
    }

    /// Open page 1 (bordered) and put the cursor at the top margin.
    pub fn begin_document(&self) -> Result<(Cursor, RenderedDocument)> {
        let g = &self.geometry;
        let (w, h) = (g.width(), g.height());
        let valid = w.is_finite()
            && h.is_finite()
            && g.margin.is_finite()
            && g.margin >= 0.0
            && g.content_width() > 0.0
            && h - 2.0 * g.margin > 0.0;
        if !valid {
            return Err(FolhaError::RenderError(format!(
                "invalid page geometry: {}x{} with margin {}",
                w, h, g.margin
            )));
        }

        let mut doc = RenderedDocument::new(self.geometry);
        let page_index = doc.add_page();
        Ok((
            Cursor {
                y: g.margin,
                page_index,
            },
            doc,
        ))
    }

    /// The pagination primitive: when `required_height` does not fit below
    /// the cursor, append a bordered page and move the cursor to its top.
    pub fn ensure_space(
        &self,
        doc: &mut RenderedDocument,
        cursor: &mut Cursor,
        required_height: f64,
    ) -> Result<()> {
        if !required_height.is_finite() || required_height < 0.0 {
            return Err(FolhaError::RenderError(format!(
                "cannot reserve {} units of vertical space",
                required_height
            )));
        }
        match decide_break(cursor.y, required_height, self.geometry.bottom_limit()) {
            BreakDecision::Place => {}
            BreakDecision::MoveToNextPage => {
                log::debug!(
                    "Page break: {:.2} needed at y={:.2} on page {}",
                    required_height,
                    cursor.y,
                    cursor.page_index + 1
                );
                cursor.page_index = doc.add_page();
                cursor.y = self.geometry.margin;
            }
        }
        Ok(())
    }

    /// Centred day image at a fixed width. Absent image → nothing.
    pub fn place_logo(
        &self,
        doc: &mut RenderedDocument,
        cursor: &mut Cursor,
        image: Option<&ImagePreview>,
    ) -> Result<()> {
        let Some(image) = image else {
            return Ok(());
        };
        let (width, height) = logo_size(image.width_px(), image.height_px());
        self.ensure_space(doc, cursor, height)?;
        let x = (self.geometry.width() - width) / 2.0;
        self.draw_image(doc, cursor, image, x, cursor.y, width, height)?;
        cursor.y += height + BLOCK_SPACING;
        Ok(())
    }

    /// Testimony name beside the first "after" image, centred as one block
    /// when it fits the content width and left-aligned when it does not.
    pub fn place_heading_with_image(
        &self,
        doc: &mut RenderedDocument,
        cursor: &mut Cursor,
        name: &str,
        first_after_image: Option<&ImagePreview>,
        style: TextStyle,
    ) -> Result<HeadingOutcome> {
        if name.is_empty() && first_after_image.is_none() {
            return Ok(HeadingOutcome::default());
        }

        let text_width = self.font_context.measure_string(name, style);
        let line_height = self.font_context.line_height(style);
        let (img_width, img_height) = first_after_image
            .map(|img| heading_image_size(img.width_px(), img.height_px()))
            .unwrap_or((0.0, 0.0));

        let margin = self.geometry.margin;
        let combined_width = text_width + img_width + HEADING_GAP;
        let text_x = if combined_width > self.geometry.content_width() {
            margin
        } else {
            (self.geometry.width() - combined_width) / 2.0
        };
        let img_x = text_x + text_width + HEADING_GAP;

        let block_height = (line_height * 1.5).max(img_height);
        self.ensure_space(doc, cursor, block_height)?;

        if !name.is_empty() {
            // Without an image the baseline sits half a line above the cursor,
            // above the border on page 1. Existing sheets are laid out this way.
            let baseline = cursor.y + img_height / 2.0 - line_height / 2.0;
            self.draw_text(doc, cursor, &[(name.to_string(), text_width)], text_x, baseline, style)?;
        }

        let mut outcome = HeadingOutcome::default();
        if let Some(image) = first_after_image {
            self.draw_image(doc, cursor, image, img_x, cursor.y, img_width, img_height)?;
            outcome.consumed_first_after_image = true;
        }

        cursor.y += block_height + BLOCK_SPACING;
        Ok(outcome)
    }

    /// "Horário: {time}" at the left margin. Empty time → nothing.
    pub fn place_time_line(
        &self,
        doc: &mut RenderedDocument,
        cursor: &mut Cursor,
        time: &str,
        style: TextStyle,
    ) -> Result<()> {
        if time.is_empty() {
            return Ok(());
        }
        let text = format!("{}{}", TIME_PREFIX, time);
        self.place_label_line(doc, cursor, &text, style)
    }

    /// A single line at the left margin, reserving one and a half lines.
    pub fn place_label_line(
        &self,
        doc: &mut RenderedDocument,
        cursor: &mut Cursor,
        text: &str,
        style: TextStyle,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let line_height = self.font_context.line_height(style);
        self.ensure_space(doc, cursor, line_height * 1.5)?;
        let width = self.font_context.measure_string(text, style);
        self.draw_text(doc, cursor, &[(text.to_string(), width)], self.geometry.margin, cursor.y, style)?;
        cursor.y += TIME_LINE_ADVANCE;
        Ok(())
    }

    /// Bold label, then the body wrapped to the content width. The wrapped
    /// block is kept whole: if it does not fit it starts on a new page.
    pub fn place_text_section(
        &self,
        doc: &mut RenderedDocument,
        cursor: &mut Cursor,
        label: &str,
        body: &str,
        label_style: TextStyle,
        body_style: TextStyle,
    ) -> Result<()> {
        if body.is_empty() {
            return Ok(());
        }
        let margin = self.geometry.margin;

        let label_width = self.font_context.measure_string(label, label_style);
        self.draw_text(doc, cursor, &[(label.to_string(), label_width)], margin, cursor.y, label_style)?;
        cursor.y += LABEL_ADVANCE;

        let lines: Vec<(String, f64)> = self
            .text_layout
            .break_into_lines(&self.font_context, body, self.geometry.content_width(), body_style)
            .into_iter()
            .map(|l| (l.text, l.width))
            .collect();
        let line_height = self.font_context.line_height(body_style);
        let text_height = lines.len() as f64 * line_height;

        self.ensure_space(doc, cursor, text_height)?;
        self.draw_text(doc, cursor, &lines, margin, cursor.y, body_style)?;
        cursor.y += text_height + BLOCK_SPACING;
        Ok(())
    }

    /// Label plus a two-column grid of `images[start_index..]`.
    ///
    /// Pagination is checked per image, so a row can straddle a page break.
    /// Each row advances the cursor once by its tallest image plus the gap.
    pub fn place_image_gallery(
        &self,
        doc: &mut RenderedDocument,
        cursor: &mut Cursor,
        label: &str,
        images: &[ImagePreview],
        start_index: usize,
    ) -> Result<GalleryOutcome> {
        let remaining = images.get(start_index..).unwrap_or(&[]);
        if remaining.is_empty() {
            return Ok(GalleryOutcome::default());
        }

        self.ensure_space(doc, cursor, GALLERY_LABEL_SPACE)?;
        let label_width = self.font_context.measure_string(label, TextStyle::LABEL);
        self.draw_text(
            doc,
            cursor,
            &[(label.to_string(), label_width)],
            self.geometry.margin,
            cursor.y,
            TextStyle::LABEL,
        )?;
        cursor.y += LABEL_ADVANCE;

        let grid = GalleryGrid::for_geometry(&self.geometry);
        let mut row_max_height: f64 = 0.0;

        for (i, image) in remaining.iter().enumerate() {
            let (width, height) = grid.image_size(image.width_px(), image.height_px());
            self.ensure_space(doc, cursor, height)?;

            row_max_height = row_max_height.max(height);
            self.draw_image(doc, cursor, image, grid.column_x(i), cursor.y, width, height)?;

            if i % 2 == 1 {
                cursor.y += row_max_height + grid.gap;
                row_max_height = 0.0;
            }
        }
        if remaining.len() % 2 == 1 {
            cursor.y += row_max_height + grid.gap;
        }

        Ok(GalleryOutcome {
            placed: remaining.len(),
            rows: row_count(remaining.len()),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_image(
        &self,
        doc: &mut RenderedDocument,
        cursor: &Cursor,
        image: &ImagePreview,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        if !(width > 0.0 && height > 0.0) {
            return Err(FolhaError::RenderError(format!(
                "image of {}x{} px has no drawable size ({}x{})",
                image.width_px(),
                image.height_px(),
                width,
                height
            )));
        }
        doc.draw(
            cursor,
            LayoutElement {
                x,
                y,
                width,
                height,
                draw: DrawCommand::Image {
                    image: Arc::clone(&image.image),
                },
            },
        )
    }

    /// Draw `lines` with the first baseline at `baseline`, one line height apart.
    fn draw_text(
        &self,
        doc: &mut RenderedDocument,
        cursor: &Cursor,
        lines: &[(String, f64)],
        x: f64,
        baseline: f64,
        style: TextStyle,
    ) -> Result<()> {
        let line_height = self.font_context.line_height(style);
        let text_lines: Vec<TextLine> = lines
            .iter()
            .enumerate()
            .map(|(i, (text, width))| TextLine {
                x,
                y: baseline + i as f64 * line_height,
                text: text.clone(),
                width: *width,
            })
            .collect();
        let width = lines.iter().map(|(_, w)| *w).fold(0.0, f64::max);
        doc.draw(
            cursor,
            LayoutElement {
                x,
                y: baseline - line_height,
                width,
                height: lines.len() as f64 * line_height,
                draw: DrawCommand::Text {
                    lines: text_lines,
                    font: StandardFont::for_style(style),
                    font_size: style.size,
                },
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::JpegColorSpace;

    fn preview(w: u32, h: u32) -> ImagePreview {
        ImagePreview {
            image: Arc::new(LoadedImage {
                jpeg: vec![0xFF, 0xD8],
                color_space: JpegColorSpace::DeviceRGB,
                width_px: w,
                height_px: h,
            }),
        }
    }

    fn engine() -> LayoutEngine {
        LayoutEngine::new(PageGeometry::default())
    }

    #[test]
    fn begin_document_draws_inset_border() {
        let (cursor, doc) = engine().begin_document().unwrap();
        assert_eq!(cursor, Cursor { y: 15.0, page_index: 0 });
        assert_eq!(doc.page_count(), 1);
        let border = &doc.pages()[0].elements[0];
        assert!(matches!(border.draw, DrawCommand::Border { .. }));
        assert_eq!((border.x, border.y), (13.0, 13.0));
        assert_eq!((border.width, border.height), (184.0, 271.0));
    }

    #[test]
    fn invalid_geometry_is_a_render_error() {
        let geometry = PageGeometry {
            margin: 120.0,
            ..Default::default()
        };
        let result = LayoutEngine::new(geometry).begin_document();
        assert!(matches!(result, Err(FolhaError::RenderError(_))));
    }

    #[test]
    fn ensure_space_is_idempotent_when_space_suffices() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        for _ in 0..5 {
            e.ensure_space(&mut doc, &mut cursor, 100.0).unwrap();
        }
        assert_eq!(doc.page_count(), 1);
        assert_eq!(cursor.y, 15.0);
    }

    #[test]
    fn ensure_space_appends_exactly_one_bordered_page() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        cursor.y = 250.0;
        e.ensure_space(&mut doc, &mut cursor, 40.0).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(cursor, Cursor { y: 15.0, page_index: 1 });
        assert!(matches!(doc.pages()[1].elements[0].draw, DrawCommand::Border { .. }));
        e.ensure_space(&mut doc, &mut cursor, 40.0).unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn ensure_space_rejects_nan() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        assert!(e.ensure_space(&mut doc, &mut cursor, f64::NAN).is_err());
    }

    #[test]
    fn drawing_on_detached_page_fails() {
        let e = engine();
        let (_, mut doc) = e.begin_document().unwrap();
        let mut stale = Cursor { y: 15.0, page_index: 3 };
        let err = e.place_logo(&mut doc, &mut stale, Some(&preview(10, 10)));
        assert!(matches!(err, Err(FolhaError::RenderError(_))));
    }

    #[test]
    fn logo_is_centred_at_fixed_width() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        e.place_logo(&mut doc, &mut cursor, Some(&preview(400, 200))).unwrap();
        let img = doc.pages()[0].images().next().unwrap();
        assert_eq!((img.x, img.y, img.width, img.height), (85.0, 15.0, 40.0, 20.0));
        assert_eq!(cursor.y, 15.0 + 20.0 + 10.0);
    }

    #[test]
    fn absent_logo_consumes_no_space() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        e.place_logo(&mut doc, &mut cursor, None).unwrap();
        assert_eq!(cursor.y, 15.0);
        assert_eq!(doc.pages()[0].elements.len(), 1);
    }

    #[test]
    fn heading_image_caps() {
        assert_eq!(heading_image_size(600, 300), (60.0, 30.0));
        let (w, h) = heading_image_size(300, 900);
        assert_eq!(h, 80.0);
        assert!((w - 80.0 / 3.0).abs() < 1e-9);
        assert_eq!(logo_size(100, 250), (40.0, 100.0));
    }

    #[test]
    fn heading_centres_name_and_image() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        let outcome = e
            .place_heading_with_image(&mut doc, &mut cursor, "Cura", Some(&preview(600, 300)), TextStyle::HEADING)
            .unwrap();
        assert!(outcome.consumed_first_after_image);

        let text_width = e.font_context().measure_string("Cura", TextStyle::HEADING);
        let combined = text_width + 60.0 + HEADING_GAP;
        let expected_text_x = (210.0 - combined) / 2.0;

        let page = &doc.pages()[0];
        let line = page.texts().next().unwrap();
        assert!((line.x - expected_text_x).abs() < 1e-9);
        let lh = e.font_context().line_height(TextStyle::HEADING);
        assert!((line.y - (15.0 + 15.0 - lh / 2.0)).abs() < 1e-9);

        let img = page.images().next().unwrap();
        assert!((img.x - (expected_text_x + text_width + HEADING_GAP)).abs() < 1e-9);
        assert_eq!(img.y, 15.0);
        assert_eq!(cursor.y, 15.0 + 30.0f64.max(lh * 1.5) + 10.0);
    }

    #[test]
    fn heading_too_wide_is_left_aligned() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        let name = "Testemunho de cura completa e restauração da família";
        e.place_heading_with_image(&mut doc, &mut cursor, name, Some(&preview(600, 300)), TextStyle::HEADING)
            .unwrap();
        let page = &doc.pages()[0];
        let line = page.texts().next().unwrap();
        assert_eq!(line.x, 15.0);
        let img = page.images().next().unwrap();
        assert!((img.x - (15.0 + line.width + HEADING_GAP)).abs() < 1e-9);
    }

    #[test]
    fn name_only_heading_baseline_sits_above_cursor() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        e.place_heading_with_image(&mut doc, &mut cursor, "Cura", None, TextStyle::HEADING)
            .unwrap();
        let lh = e.font_context().line_height(TextStyle::HEADING);
        let line = doc.pages()[0].texts().next().unwrap();
        assert!((line.y - (15.0 - lh / 2.0)).abs() < 1e-9);
        assert!(line.y < 15.0 - BORDER_INSET);
        assert!((cursor.y - (15.0 + lh * 1.5 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn heading_with_image_only_draws_no_text() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        let outcome = e
            .place_heading_with_image(&mut doc, &mut cursor, "", Some(&preview(600, 300)), TextStyle::HEADING)
            .unwrap();
        assert!(outcome.consumed_first_after_image);

        let page = &doc.pages()[0];
        assert_eq!(page.texts().count(), 0);
        let img = page.images().next().unwrap();
        // Empty name: the image plus the gap is centred as one block.
        let block_x = (210.0 - (60.0 + HEADING_GAP)) / 2.0;
        assert_eq!((img.x, img.y, img.width, img.height), (block_x + HEADING_GAP, 15.0, 60.0, 30.0));
        assert_eq!(cursor.y, 15.0 + 30.0 + 10.0);
    }

    #[test]
    fn image_only_heading_moves_after_gallery_to_second_image() {
        let e = engine();
        let after = vec![preview(600, 300), preview(826, 400), preview(827, 400)];
        let blocks = vec![
            ContentBlock::HeadingWithImage {
                name: "",
                image: after.first(),
                style: TextStyle::HEADING,
            },
            ContentBlock::ImageGrid {
                label: "Imagens Depois:",
                images: &after,
                skip_heading_image: true,
                trailing_space: 0.0,
            },
        ];
        let pages = e.layout(&blocks).unwrap();
        let widths: Vec<u32> = pages[0]
            .images()
            .map(|el| match &el.draw {
                DrawCommand::Image { image } => image.width_px,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(widths, vec![600, 826, 827]);
    }

    #[test]
    fn heading_skipped_without_name_or_image() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        let outcome = e
            .place_heading_with_image(&mut doc, &mut cursor, "", None, TextStyle::HEADING)
            .unwrap();
        assert!(!outcome.consumed_first_after_image);
        assert_eq!(cursor.y, 15.0);
        assert_eq!(doc.pages()[0].elements.len(), 1);
    }

    #[test]
    fn time_line_prefix_and_advance() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        e.place_time_line(&mut doc, &mut cursor, "14:30 - 20/06/2024", TextStyle::NORMAL)
            .unwrap();
        let line = doc.pages()[0].texts().next().unwrap();
        assert_eq!(line.text, "Horário: 14:30 - 20/06/2024");
        assert_eq!((line.x, line.y), (15.0, 15.0));
        assert_eq!(cursor.y, 23.0);
    }

    #[test]
    fn text_section_moves_whole_block_to_new_page() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        cursor.y = 200.0;
        let body = "linha de texto\n".repeat(30);
        e.place_text_section(&mut doc, &mut cursor, "Antes:", &body, TextStyle::LABEL, TextStyle::NORMAL)
            .unwrap();

        assert_eq!(doc.page_count(), 2);
        let first: Vec<&TextLine> = doc.pages()[0].texts().collect();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].text, "Antes:");
        let second: Vec<&TextLine> = doc.pages()[1].texts().collect();
        assert_eq!(second.len(), 30);
        assert_eq!(second[0].y, 15.0);
    }

    #[test]
    fn empty_text_section_is_skipped() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        e.place_text_section(&mut doc, &mut cursor, "Antes:", "", TextStyle::LABEL, TextStyle::NORMAL)
            .unwrap();
        assert_eq!(cursor.y, 15.0);
        assert_eq!(doc.pages()[0].texts().count(), 0);
    }

    #[test]
    fn gallery_rows_and_single_trailing_advance() {
        let e = engine();
        for n in 1..=6usize {
            let (mut cursor, mut doc) = e.begin_document().unwrap();
            let images: Vec<ImagePreview> = (0..n).map(|_| preview(825, 400)).collect();
            let outcome = e
                .place_image_gallery(&mut doc, &mut cursor, "Imagens Antes:", &images, 0)
                .unwrap();
            assert_eq!(outcome.rows, n.div_ceil(2));
            // 825x400 at 82.5 wide → 40 tall; each row advances 45.
            let expected = 15.0 + LABEL_ADVANCE + outcome.rows as f64 * 45.0;
            assert!((cursor.y - expected).abs() < 1e-9, "n={n}: {} vs {}", cursor.y, expected);
        }
    }

    #[test]
    fn gallery_row_uses_tallest_image() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        let images = vec![preview(825, 200), preview(825, 600), preview(825, 200)];
        e.place_image_gallery(&mut doc, &mut cursor, "Imagens Antes:", &images, 0)
            .unwrap();
        let ys: Vec<f64> = doc.pages()[0].images().map(|i| i.y).collect();
        assert_eq!(ys[0], ys[1]);
        assert!((ys[2] - (ys[0] + 60.0 + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn gallery_can_break_inside_a_row() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        cursor.y = 200.0;
        // Left image 20 tall fits, right image 80 tall does not.
        let images = vec![preview(825, 200), preview(400, 800)];
        e.place_image_gallery(&mut doc, &mut cursor, "Imagens Depois:", &images, 0)
            .unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages()[0].images().count(), 1);
        let right = doc.pages()[1].images().next().unwrap();
        assert_eq!(right.y, 15.0);
        assert_eq!(right.x, 15.0 + 82.5 + 5.0);
    }

    #[test]
    fn gallery_start_index_skips_consumed_image() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        let images = vec![preview(10, 10), preview(20, 10), preview(30, 10)];
        let outcome = e
            .place_image_gallery(&mut doc, &mut cursor, "Imagens Depois:", &images, 1)
            .unwrap();
        assert_eq!(outcome, GalleryOutcome { placed: 2, rows: 1 });
        let widths: Vec<u32> = doc.pages()[0]
            .images()
            .map(|el| match &el.draw {
                DrawCommand::Image { image } => image.width_px,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(widths, vec![20, 30]);
    }

    #[test]
    fn gallery_with_nothing_left_draws_no_label() {
        let e = engine();
        let (mut cursor, mut doc) = e.begin_document().unwrap();
        let images = vec![preview(10, 10)];
        let outcome = e
            .place_image_gallery(&mut doc, &mut cursor, "Imagens Depois:", &images, 1)
            .unwrap();
        assert_eq!(outcome, GalleryOutcome::default());
        assert_eq!(doc.pages()[0].texts().count(), 0);
        assert_eq!(cursor.y, 15.0);
    }
}
