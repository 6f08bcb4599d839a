//! # Folha
//!
//! Generates the "Folha de Testemunho": a bordered A4 PDF holding a day
//! image, the testimony name beside its first "after" photo, the time,
//! "before" and "after" texts and two photo galleries.
//!
//! Layout is page-native. The engine never lays content on an endless
//! canvas and slices it afterwards: every block asks whether it fits above
//! the bottom margin and, if not, starts on a fresh bordered page. Text
//! sections move to the next page whole.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON / TestimonyForm)
//!       ↓
//!   [preview]  — Decode uploads in parallel, order preserved
//!       ↓
//!   [model]    — Fixed-order block plan
//!       ↓
//!   [layout]   — Cursor + ensure_space pagination
//!       ↓
//!   [pdf]      — Serialize to PDF bytes
//!       ↓
//!   [session]  — One run at a time, status message, file output
//! ```

pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod preview;
pub mod session;
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{FolhaError, Result};
pub use model::{FormDocument, TestimonyForm};
pub use session::{GenerationStatus, Generator};

use layout::LayoutEngine;
use pdf::PdfWriter;

/// Render a testimony form to PDF bytes.
///
/// Decodes every image first; any decode, layout or serialization failure
/// aborts the whole render.
pub fn render(form: &TestimonyForm) -> Result<Vec<u8>> {
    let previews = preview::prepare_previews(form)?;
    let blocks = model::plan_blocks(form, &previews);

    let engine = LayoutEngine::new(form.geometry);
    let pages = engine.layout(&blocks)?;

    let writer = PdfWriter::new(&form.geometry);
    let bytes = writer.write(&pages, &form.metadata)?;
    log::info!("Rendered {} page(s), {} bytes", pages.len(), bytes.len());
    Ok(bytes)
}

/// Render a form described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let form = FormDocument::from_json(json)?.load()?;
    render(&form)
}
