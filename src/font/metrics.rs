//! Advance widths for the standard PDF fonts the sheet uses.
//!
//! Values are the Adobe AFM widths in 1/1000 em for the characters that
//! WinAnsiEncoding can represent. Anything else is drawn as `?` by the
//! serializer, so it measures as `?` here too.

/// Per-font width table.
pub struct StandardFontMetrics {
    /// U+0020..=U+007E
    ascii: [u16; 95],
    /// U+00A0..=U+00FF
    latin1: [u16; 96],
    /// Windows-1252 extras (quotes, dashes, bullet, ellipsis, euro).
    extras: &'static [(char, u16)],
}

impl StandardFontMetrics {
    /// Advance width of `ch` in 1/1000 em.
    pub fn advance(&self, ch: char) -> u16 {
        let cp = ch as u32;
        match cp {
            0x20..=0x7E => self.ascii[(cp - 0x20) as usize],
            0xA0..=0xFF => self.latin1[(cp - 0xA0) as usize],
            _ => self
                .extras
                .iter()
                .find(|(c, _)| *c == ch)
                .map(|(_, w)| *w)
                .unwrap_or(self.ascii[(b'?' - 0x20) as usize]),
        }
    }

    /// Width of `ch` in points at `font_size`.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.advance(ch) as f64 / 1000.0 * font_size
    }

    /// Width of `text` in points at `font_size`.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
        278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
        278, 278, 278, 469, 556, 333, // '['..'`'
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
        334, 260, 334, 584, // '{'..'~'
    ],
    latin1: [
        278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
        400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
        667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
        722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
        556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
    ],
    extras: &[
        ('\u{2018}', 222),
        ('\u{2019}', 222),
        ('\u{201C}', 333),
        ('\u{201D}', 333),
        ('\u{2022}', 350),
        ('\u{2013}', 556),
        ('\u{2014}', 1000),
        ('\u{2026}', 1000),
        ('\u{20AC}', 556),
    ],
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
        333, 333, 584, 584, 584, 611, 975, // ':'..'@'
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
        333, 278, 333, 584, 556, 333, // '['..'`'
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
        389, 280, 389, 584, // '{'..'~'
    ],
    latin1: [
        278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
        400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
        722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
        722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
        556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
        611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
    ],
    extras: &[
        ('\u{2018}', 278),
        ('\u{2019}', 278),
        ('\u{201C}', 500),
        ('\u{201D}', 500),
        ('\u{2022}', 350),
        ('\u{2013}', 556),
        ('\u{2014}', 1000),
        ('\u{2026}', 1000),
        ('\u{20AC}', 556),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_width() {
        assert!((HELVETICA.char_width(' ', 12.0) - 3.336).abs() < 0.001);
    }

    #[test]
    fn accented_letters_match_base_letter() {
        assert_eq!(HELVETICA.advance('á'), HELVETICA.advance('a'));
        assert_eq!(HELVETICA.advance('Ç'), HELVETICA.advance('C'));
        assert_eq!(HELVETICA_BOLD.advance('ã'), HELVETICA_BOLD.advance('a'));
        assert_eq!(HELVETICA_BOLD.advance('ó'), HELVETICA_BOLD.advance('o'));
    }

    #[test]
    fn unencodable_measures_as_question_mark() {
        assert_eq!(HELVETICA.advance('漢'), HELVETICA.advance('?'));
        assert_eq!(HELVETICA_BOLD.advance('漢'), 611);
    }

    #[test]
    fn smart_quotes_have_widths() {
        assert_eq!(HELVETICA.advance('\u{201C}'), 333);
        assert_eq!(HELVETICA_BOLD.advance('\u{2014}'), 1000);
    }
}
