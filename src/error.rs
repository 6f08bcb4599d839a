//! Structured error types for the testimony sheet generator.
//!
//! Every failure aborts the whole generation run. The variants map to where
//! things go wrong: reading the form, decoding an uploaded image, laying out
//! or serializing the document, writing the output file, and overlapping runs.

use thiserror::Error;

/// The unified error type returned by all public Folha API functions.
#[derive(Debug, Error)]
pub enum FolhaError {
    /// The JSON form description failed to parse.
    #[error("Failed to parse form: {source}{}", hint_suffix(.hint))]
    ParseError {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// An uploaded image could not be read, decoded, or has no usable size.
    #[error("Image error in {slot}: {reason}")]
    ImageDecode { slot: String, reason: String },

    /// Layout or PDF generation failed.
    #[error("Render error: {0}")]
    RenderError(String),

    /// Writing the output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Another generation is still running.
    #[error("A PDF generation is already in progress")]
    Busy,
}

pub type Result<T> = std::result::Result<T, FolhaError>;

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl FolhaError {
    pub(crate) fn image(slot: impl Into<String>, reason: impl Into<String>) -> Self {
        FolhaError::ImageDecode {
            slot: slot.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FolhaError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the form schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolhaError::ParseError { source: e, hint }
    }
}
