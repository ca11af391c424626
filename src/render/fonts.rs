//! Standard Type 1 fonts: variant selection, WinAnsi encoding, glyph widths.
//!
//! The output uses the four Times fonts every PDF viewer ships with, so
//! nothing is embedded. The price is a fixed character set: text is encoded
//! as WinAnsi (Windows-1252), and a character outside it is drawn as an ASCII
//! stand-in such as `->` for `→`, or as `?`.
//! Widths come from the Adobe AFM files, in thousandths of an em.

/// One of the four fixed font variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontVariant {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontVariant {
    pub const ALL: [FontVariant; 4] = [
        FontVariant::Regular,
        FontVariant::Bold,
        FontVariant::Italic,
        FontVariant::BoldItalic,
    ];

    /// PostScript name of the standard font.
    pub fn base_font(self) -> &'static str {
        match self {
            FontVariant::Regular => "Times-Roman",
            FontVariant::Bold => "Times-Bold",
            FontVariant::Italic => "Times-Italic",
            FontVariant::BoldItalic => "Times-BoldItalic",
        }
    }

    /// Name of the font in each page's resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontVariant::Regular => "F1",
            FontVariant::Bold => "F2",
            FontVariant::Italic => "F3",
            FontVariant::BoldItalic => "F4",
        }
    }

    fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            FontVariant::Regular => &TIMES_ROMAN,
            FontVariant::Bold => &TIMES_BOLD,
            FontVariant::Italic => &TIMES_ITALIC,
            FontVariant::BoldItalic => &TIMES_BOLD_ITALIC,
        }
    }
}

// ── AFM widths for 0x20..=0x7E ───────────────────────────────────────────

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];

// ── WinAnsi ──────────────────────────────────────────────────────────────

/// Byte for `ch` in WinAnsiEncoding, if it has one.
pub fn winansi_byte(ch: char) -> Option<u8> {
    let code = ch as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => Some(match ch {
            '\t' => b' ',
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            // Typographic spaces the model sometimes emits.
            '\u{2002}' | '\u{2003}' | '\u{2009}' | '\u{202F}' => b' ',
            '\u{2011}' => b'-',
            _ => return None,
        }),
    }
}

/// Encode `text` as WinAnsi bytes, or return the first character that has no code.
pub fn encode_winansi(text: &str) -> Result<Vec<u8>, char> {
    text.chars().map(|c| winansi_byte(c).ok_or(c)).collect()
}

/// Byte drawn for a character with neither a WinAnsi code nor an ASCII fallback.
pub const REPLACEMENT_BYTE: u8 = b'?';

/// ASCII spellings for common symbols outside WinAnsi.
fn ascii_fallback(ch: char) -> Option<&'static str> {
    Some(match ch {
        '→' | '⟶' => "->",
        '←' | '⟵' => "<-",
        '↔' => "<->",
        '⇒' => "=>",
        '⇐' => "<=",
        '≤' => "<=",
        '≥' => ">=",
        '≠' => "!=",
        '≈' => "~",
        '−' | '‐' | '‒' => "-",
        '∞' => "inf",
        '✓' | '✔' => "v",
        '✗' | '✘' => "x",
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' => "",
        _ => return None,
    })
}

/// Encode `text` as WinAnsi, never failing.
///
/// Characters without a code take their ASCII fallback, or
/// [`REPLACEMENT_BYTE`] when there is none. Returns the bytes and the
/// characters that were replaced by `?`.
pub fn encode_winansi_lossy(text: &str) -> (Vec<u8>, Vec<char>) {
    let mut bytes = Vec::with_capacity(text.len());
    let mut replaced = Vec::new();
    for ch in text.chars() {
        if let Some(b) = winansi_byte(ch) {
            bytes.push(b);
        } else if let Some(ascii) = ascii_fallback(ch) {
            bytes.extend_from_slice(ascii.as_bytes());
        } else {
            bytes.push(REPLACEMENT_BYTE);
            replaced.push(ch);
        }
    }
    (bytes, replaced)
}

/// Width of one WinAnsi byte in thousandths of an em.
fn byte_width(variant: FontVariant, byte: u8) -> u16 {
    match byte {
        0x20..=0x7E => variant.ascii_widths()[(byte - 0x20) as usize],
        _ => high_byte_width(variant, byte),
    }
}

/// Widths for 0x80..=0xFF. Accented letters take their base letter's width,
/// which matches the AFM tables for every Latin-1 letter in Times.
fn high_byte_width(variant: FontVariant, byte: u8) -> u16 {
    let base = match byte {
        0xC0..=0xC5 => b'A',
        0xC7 => b'C',
        0xC8..=0xCB => b'E',
        0xCC..=0xCF => b'I',
        0xD0 => b'D',
        0xD1 => b'N',
        0xD2..=0xD6 | 0xD8 => b'O',
        0xD9..=0xDC => b'U',
        0xDD | 0x9F => b'Y',
        0xE0..=0xE5 => b'a',
        0xE7 => b'c',
        0xE8..=0xEB => b'e',
        0xEC..=0xEF => b'i',
        0xF1 => b'n',
        0xF2..=0xF6 | 0xF8 | 0xF0 => b'o',
        0xF9..=0xFC => b'u',
        0xFD | 0xFF => b'y',
        0x8A => b'S',
        0x9A => b's',
        0x8E => b'Z',
        0x9E => b'z',
        0xA1 => b'!',
        0xBF => b'?',
        0xA0 => b' ',
        0xAD => b'-',
        0xD7 | 0xF7 | 0xB1 => b'+',
        _ => {
            return match byte {
                0x85 | 0x89 | 0x97 => 1000,
                0x95 => 350,
                0x91 | 0x92 | 0x82 => 333,
                0x93 | 0x94 | 0x84 => 444,
                0x8C | 0xC6 => 889,
                0x9C | 0xE6 => 722,
                0xDE | 0xFE => 556,
                0xB0 => 400,
                0x99 => 980,
                _ => 500,
            }
        }
    };
    byte_width(variant, base)
}

/// Width of `text` set in `variant` at `size` points.
///
/// Fails with the first character that WinAnsi cannot represent.
pub fn text_width(variant: FontVariant, text: &str, size: f32) -> Result<f32, char> {
    let bytes = encode_winansi(text)?;
    Ok(encoded_width(variant, &bytes, size))
}

/// Width of already-encoded WinAnsi bytes.
pub fn encoded_width(variant: FontVariant, bytes: &[u8], size: f32) -> f32 {
    let units: u32 = bytes.iter().map(|&b| byte_width(variant, b) as u32).sum();
    units as f32 * size / 1000.0
}
