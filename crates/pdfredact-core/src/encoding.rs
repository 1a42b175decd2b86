//! Single-byte PDF text encodings.
//!
//! Implements WinAnsiEncoding, MacRomanEncoding and StandardEncoding, the
//! Differences array, and glyph-name lookup for the names producers commonly
//! put in Differences.

/// A named standard PDF encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardEncoding {
    /// WinAnsiEncoding, a superset of Windows code page 1252.
    WinAnsi,
    /// MacRomanEncoding (classic Mac OS Roman).
    MacRoman,
    /// Adobe StandardEncoding.
    Standard,
}

impl StandardEncoding {
    /// Parse an /Encoding name.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"WinAnsiEncoding" => Some(Self::WinAnsi),
            b"MacRomanEncoding" => Some(Self::MacRoman),
            b"StandardEncoding" => Some(Self::Standard),
            _ => None,
        }
    }

    /// Look up the Unicode character for a byte code in this encoding.
    pub fn decode(&self, code: u8) -> Option<char> {
        match self {
            StandardEncoding::WinAnsi => decode_win_ansi(code),
            StandardEncoding::MacRoman => decode_mac_roman(code),
            StandardEncoding::Standard => decode_standard(code),
        }
    }
}

/// Codes 0x80–0x9F of WinAnsi; the rest of the upper half is Latin-1.
#[rustfmt::skip]
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

fn decode_win_ansi(code: u8) -> Option<char> {
    match code {
        0x80..=0x9F => WIN_ANSI_HIGH[(code - 0x80) as usize],
        // WinAnsi maps the soft hyphen slot to a plain hyphen glyph
        0xAD => Some('-'),
        _ => Some(code as char),
    }
}

/// Codes 0x80–0xFF of MacRoman.
#[rustfmt::skip]
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', '\u{2126}', 'æ', 'ø',
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{00A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ',
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
    '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

fn decode_mac_roman(code: u8) -> Option<char> {
    if code < 0x80 {
        Some(code as char)
    } else {
        Some(MAC_ROMAN_HIGH[(code - 0x80) as usize])
    }
}

fn decode_standard(code: u8) -> Option<char> {
    let ch = match code {
        0x27 => '\u{2019}',
        0x60 => '\u{2018}',
        0x00..=0x7F => code as char,
        0xA1 => '¡',
        0xA2 => '¢',
        0xA3 => '£',
        0xA4 => '⁄',
        0xA5 => '¥',
        0xA6 => 'ƒ',
        0xA7 => '§',
        0xA8 => '¤',
        0xA9 => '\'',
        0xAA => '“',
        0xAB => '«',
        0xAC => '‹',
        0xAD => '›',
        0xAE => 'ﬁ',
        0xAF => 'ﬂ',
        0xB1 => '–',
        0xB2 => '†',
        0xB3 => '‡',
        0xB4 => '·',
        0xB6 => '¶',
        0xB7 => '•',
        0xB8 => '‚',
        0xB9 => '„',
        0xBA => '”',
        0xBB => '»',
        0xBC => '…',
        0xBD => '‰',
        0xBF => '¿',
        0xC1 => '`',
        0xC2 => '´',
        0xC3 => 'ˆ',
        0xC4 => '˜',
        0xC5 => '¯',
        0xC6 => '˘',
        0xC7 => '˙',
        0xC8 => '¨',
        0xCA => '˚',
        0xCB => '¸',
        0xCD => '˝',
        0xCE => '˛',
        0xCF => 'ˇ',
        0xD0 => '—',
        0xE1 => 'Æ',
        0xE3 => 'ª',
        0xE8 => 'Ł',
        0xE9 => 'Ø',
        0xEA => 'Œ',
        0xEB => 'º',
        0xF1 => 'æ',
        0xF5 => 'ı',
        0xF8 => 'ł',
        0xF9 => 'ø',
        0xFA => 'œ',
        0xFB => 'ß',
        _ => return None,
    };
    Some(ch)
}

/// An encoding table: a standard encoding, possibly patched by /Differences.
#[derive(Debug, Clone)]
pub struct FontEncoding {
    table: [Option<char>; 256],
}

impl FontEncoding {
    /// Create a `FontEncoding` from a standard encoding.
    pub fn from_standard(encoding: StandardEncoding) -> Self {
        let mut table = [None; 256];
        for (code, slot) in table.iter_mut().enumerate() {
            *slot = encoding.decode(code as u8);
        }
        Self { table }
    }

    /// Apply Differences array overrides to this encoding.
    pub fn apply_differences(&mut self, differences: &[(u8, char)]) {
        for &(code, ch) in differences {
            self.table[code as usize] = Some(ch);
        }
    }

    /// Decode a single byte code to a Unicode character.
    pub fn decode(&self, code: u8) -> Option<char> {
        self.table[code as usize]
    }
}

/// Resolve a PDF glyph name to its Unicode character.
///
/// Handles `uniXXXX`, `uXXXX[XX]`, single-character names, and the glyph
/// names that appear in Differences arrays of Latin text.
pub fn glyph_name_to_char(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Some(ch);
    }
    GLYPH_NAMES
        .binary_search_by_key(&name, |&(n, _)| n)
        .ok()
        .map(|i| GLYPH_NAMES[i].1)
}

/// Sorted for binary search.
static GLYPH_NAMES: &[(&str, char)] = &[
    ("AE", 'Æ'),
    ("Aacute", 'Á'),
    ("Adieresis", 'Ä'),
    ("Ccedilla", 'Ç'),
    ("Eacute", 'É'),
    ("Ntilde", 'Ñ'),
    ("Odieresis", 'Ö'),
    ("Udieresis", 'Ü'),
    ("aacute", 'á'),
    ("acircumflex", 'â'),
    ("adieresis", 'ä'),
    ("agrave", 'à'),
    ("ampersand", '&'),
    ("atilde", 'ã'),
    ("bullet", '•'),
    ("ccedilla", 'ç'),
    ("colon", ':'),
    ("comma", ','),
    ("eacute", 'é'),
    ("ecircumflex", 'ê'),
    ("egrave", 'è'),
    ("eight", '8'),
    ("emdash", '—'),
    ("endash", '–'),
    ("exclam", '!'),
    ("fi", 'ﬁ'),
    ("five", '5'),
    ("fl", 'ﬂ'),
    ("four", '4'),
    ("germandbls", 'ß'),
    ("hyphen", '-'),
    ("iacute", 'í'),
    ("nine", '9'),
    ("ntilde", 'ñ'),
    ("oacute", 'ó'),
    ("ocircumflex", 'ô'),
    ("one", '1'),
    ("otilde", 'õ'),
    ("parenleft", '('),
    ("parenright", ')'),
    ("percent", '%'),
    ("period", '.'),
    ("question", '?'),
    ("quotedbl", '"'),
    ("quotedblleft", '“'),
    ("quotedblright", '”'),
    ("quoteleft", '‘'),
    ("quoteright", '’'),
    ("quotesingle", '\''),
    ("semicolon", ';'),
    ("seven", '7'),
    ("six", '6'),
    ("slash", '/'),
    ("space", ' '),
    ("three", '3'),
    ("two", '2'),
    ("uacute", 'ú'),
    ("udieresis", 'ü'),
    ("underscore", '_'),
    ("zero", '0'),
];
