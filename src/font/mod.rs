//! # Font Management
//!
//! The sheet is set entirely in Helvetica (regular for body text, bold for
//! the name and section labels), one of the standard PDF fonts that needs no
//! embedding. This module measures text in layout units (millimetres) and
//! tells the serializer which base font to reference.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use crate::model::TextStyle;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.15;

/// The standard fonts the serializer can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub fn for_style(style: TextStyle) -> Self {
        if style.bold {
            StandardFont::HelveticaBold
        } else {
            StandardFont::Helvetica
        }
    }

    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
        }
    }
}

/// Text measurement in layout units.
///
/// Font sizes are always points; `scale_factor` converts points to layout
/// units (72 / 25.4 for millimetres).
#[derive(Debug, Clone, Copy)]
pub struct FontContext {
    scale_factor: f64,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new(72.0 / 25.4)
    }
}

impl FontContext {
    pub fn new(scale_factor: f64) -> Self {
        Self { scale_factor }
    }

    /// Width of a single character in layout units.
    pub fn char_width(&self, ch: char, style: TextStyle) -> f64 {
        StandardFont::for_style(style).metrics().char_width(ch, style.size) / self.scale_factor
    }

    /// Width of a string in layout units.
    pub fn measure_string(&self, text: &str, style: TextStyle) -> f64 {
        StandardFont::for_style(style)
            .metrics()
            .measure_string(text, style.size)
            / self.scale_factor
    }

    /// Baseline-to-baseline distance in layout units.
    pub fn line_height(&self, style: TextStyle) -> f64 {
        style.size * LINE_HEIGHT_FACTOR / self.scale_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_context_helvetica_mm() {
        let ctx = FontContext::default();
        let w = ctx.char_width(' ', TextStyle::NORMAL);
        // 278/1000 * 12pt = 3.336pt = 1.1769mm
        assert!((w - 3.336 * 25.4 / 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::default();
        let regular = ctx.measure_string("Depois", TextStyle::NORMAL);
        let bold = ctx.measure_string("Depois", TextStyle::LABEL);
        assert!(bold > regular, "Bold should be wider than regular");
    }

    #[test]
    fn test_line_height() {
        let ctx = FontContext::default();
        let lh = ctx.line_height(TextStyle::NORMAL);
        assert!((lh - 12.0 * 1.15 * 25.4 / 72.0).abs() < 1e-9);
        assert!(ctx.line_height(TextStyle::HEADING) > lh);
    }

    #[test]
    fn test_font_selection() {
        assert_eq!(StandardFont::for_style(TextStyle::HEADING).pdf_name(), "Helvetica-Bold");
        assert_eq!(StandardFont::for_style(TextStyle::NORMAL).pdf_name(), "Helvetica");
    }
}
