//! # Text Layout
//!
//! Greedy line breaking for the free-text sections.
//!
//! Break opportunities come from UAX#14 (`unicode-linebreak`). A word that
//! is wider than the whole line is split at the last character that fits.

use crate::font::FontContext;
use crate::model::TextStyle;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width in layout units, trailing spaces excluded.
    pub width: f64,
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.chars().count()`. Each entry is the break
/// opportunity *before* that character position. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields byte offsets of the start of the next segment.
    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx > 0 && char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}' | '\u{0085}' | '\u{000B}' | '\u{000C}')
}

pub struct TextLayout;

impl Default for TextLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break `text` into lines no wider than `max_width`.
    ///
    /// Mandatory breaks always end a line (so blank lines survive as empty
    /// lines). Trailing spaces stay on the line they follow but do not count
    /// toward its width.
    pub fn break_into_lines(
        &self,
        font_context: &FontContext,
        text: &str,
        max_width: f64,
        style: TextStyle,
    ) -> Vec<BrokenLine> {
        if text.is_empty() {
            return vec![];
        }

        let chars: Vec<char> = text.chars().collect();
        let widths: Vec<f64> = chars
            .iter()
            .map(|&ch| {
                if is_newline(ch) {
                    0.0
                } else {
                    font_context.char_width(ch, style)
                }
            })
            .collect();
        let break_opps = compute_break_opportunities(text);

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break_point: Option<usize> = None;

        for (i, &ch) in chars.iter().enumerate() {
            if let Some(opp) = break_opps[i] {
                match opp {
                    BreakOpportunity::Mandatory => {
                        lines.push(self.make_line(&chars[line_start..i], &widths[line_start..i]));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    BreakOpportunity::Allowed => {
                        // The line may end after chars[i - 1].
                        last_break_point = Some(i);
                    }
                }
            }

            if is_newline(ch) {
                continue;
            }

            // Spaces may hang past the edge; they are trimmed from the width.
            if ch != ' ' && line_width + widths[i] > max_width && line_start < i {
                let break_at = match last_break_point {
                    Some(bp) if bp > line_start => bp,
                    _ => i,
                };
                lines.push(self.make_line(&chars[line_start..break_at], &widths[line_start..break_at]));
                line_start = break_at;
                line_width = widths[line_start..=i].iter().sum();
                last_break_point = None;

                // The carried-over word can still be wider than a whole line.
                while line_width > max_width && line_start < i {
                    let mut end = line_start;
                    let mut w = 0.0;
                    while end < i && w + widths[end] <= max_width {
                        w += widths[end];
                        end += 1;
                    }
                    let end = end.max(line_start + 1);
                    lines.push(self.make_line(&chars[line_start..end], &widths[line_start..end]));
                    line_start = end;
                    line_width = widths[line_start..=i].iter().sum();
                }
                continue;
            }

            line_width += widths[i];
        }

        if line_start < chars.len() {
            lines.push(self.make_line(&chars[line_start..], &widths[line_start..]));
        }

        lines
    }

    /// Measure the width of a single-line string.
    pub fn measure_width(&self, font_context: &FontContext, text: &str, style: TextStyle) -> f64 {
        font_context.measure_string(text, style)
    }

    /// Create a BrokenLine, dropping line terminators and trailing-space width.
    fn make_line(&self, chars: &[char], widths: &[f64]) -> BrokenLine {
        let mut text = String::with_capacity(chars.len());
        let mut width = 0.0;
        let mut trailing = 0.0;
        for (&ch, &w) in chars.iter().zip(widths) {
            if is_newline(ch) {
                continue;
            }
            text.push(ch);
            if ch == ' ' {
                trailing += w;
            } else {
                width += trailing + w;
                trailing = 0.0;
            }
        }
        BrokenLine { text, width }
    }
}
