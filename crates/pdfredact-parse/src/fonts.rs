//! Font resolution for glyph positioning.
//!
//! A [`Font`] turns the bytes of a shown string into character codes, each
//! with its advance width and Unicode text. Simple fonts (Type1, TrueType,
//! Type3) use one byte per code, `/Widths` and an `/Encoding`; composite
//! (Type0) fonts use two-byte codes (or the width declared by the ToUnicode
//! codespace), `/W` widths from the descendant CIDFont and the ToUnicode map.

use std::collections::HashMap;
use std::ops::Range;

use lopdf::{Dictionary, Document, Object};
use pdfredact_core::{FontEncoding, StandardEncoding, glyph_name_to_char};

use crate::cmap::ToUnicodeCMap;
use crate::error::BackendError;
use crate::standard_fonts::{self, StandardMetrics};

const DEFAULT_ASCENT: f64 = 750.0;
const DEFAULT_DESCENT: f64 = -250.0;
const DEFAULT_WIDTH: f64 = 600.0;
const DEFAULT_CID_WIDTH: f64 = 1000.0;
/// Largest CID a `/W` array may name.
const MAX_CID: u32 = 0xFFFF;

/// One character code decoded from a shown string.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChar {
    /// Character code.
    pub code: u32,
    /// Byte range of the code inside the string.
    pub bytes: Range<usize>,
    /// Unicode text; U+FFFD when the font gives no mapping.
    pub text: String,
    /// Advance width in 1/1000 of text space.
    pub width: f64,
    /// Single-byte code 32, which receives word spacing.
    pub is_space: bool,
}

#[derive(Debug, Clone)]
enum Widths {
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        standard: Option<&'static StandardMetrics>,
    },
    Cid(HashMap<u32, f64>),
}

/// A font resolved from a page's `/Resources /Font` dictionary.
#[derive(Debug, Clone)]
pub struct Font {
    pub base_font: String,
    code_bytes: usize,
    widths: Widths,
    default_width: f64,
    /// Glyph-space to 1/1000 text-space factor (Type3 `/FontMatrix`).
    scale: f64,
    encoding: Option<FontEncoding>,
    to_unicode: Option<ToUnicodeCMap>,
    ascent: f64,
    descent: f64,
}

impl Font {
    /// Helvetica metrics, used when a font resource cannot be resolved.
    pub fn fallback() -> Self {
        let standard = standard_fonts::lookup("Helvetica");
        Font {
            base_font: "Helvetica".to_string(),
            code_bytes: 1,
            widths: Widths::Simple {
                first_char: 0,
                widths: Vec::new(),
                standard,
            },
            default_width: DEFAULT_WIDTH,
            scale: 1.0,
            encoding: Some(FontEncoding::from_standard(StandardEncoding::WinAnsi)),
            to_unicode: None,
            ascent: standard.map_or(DEFAULT_ASCENT, |m| m.ascent as f64),
            descent: standard.map_or(DEFAULT_DESCENT, |m| m.descent as f64),
        }
    }

    /// Resolve a font dictionary.
    pub fn load(doc: &Document, dict: &Dictionary) -> Result<Self, BackendError> {
        let subtype = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(b"Type1");
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();
        let to_unicode = load_to_unicode(doc, dict);

        if subtype == b"Type0" {
            return Self::load_composite(doc, dict, base_font, to_unicode);
        }

        let standard = standard_fonts::lookup(&base_font);
        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| number(resolve(doc, o)))
            .map_or(0, |v| v.max(0.0) as u32);
        let widths = match dict.get(b"Widths").map(|o| resolve(doc, o)) {
            Ok(Object::Array(arr)) => arr
                .iter()
                .map(|o| number(resolve(doc, o)).unwrap_or(0.0))
                .collect(),
            Ok(_) => return Err(BackendError::Font(format!("{base_font}: /Widths is not an array"))),
            Err(_) => Vec::new(),
        };
        let descriptor = Descriptor::read(doc, dict);

        let scale = if subtype == b"Type3" {
            match dict.get(b"FontMatrix").map(|o| resolve(doc, o)) {
                Ok(Object::Array(m)) if !m.is_empty() => number(&m[0]).unwrap_or(0.001) * 1000.0,
                _ => 1.0,
            }
        } else {
            1.0
        };

        let base_encoding = if subtype == b"TrueType" {
            StandardEncoding::WinAnsi
        } else {
            StandardEncoding::Standard
        };
        let encoding = resolve_encoding(doc, dict, base_encoding);

        Ok(Font {
            ascent: descriptor
                .ascent
                .or(standard.map(|m| m.ascent as f64))
                .unwrap_or(DEFAULT_ASCENT),
            descent: descriptor
                .descent
                .or(standard.map(|m| m.descent as f64))
                .unwrap_or(DEFAULT_DESCENT),
            default_width: descriptor.missing_width.unwrap_or(if standard.is_some() {
                0.0
            } else {
                DEFAULT_WIDTH
            }),
            base_font,
            code_bytes: 1,
            widths: Widths::Simple {
                first_char,
                widths,
                standard,
            },
            scale,
            encoding: Some(encoding),
            to_unicode,
        })
    }

    fn load_composite(
        doc: &Document,
        dict: &Dictionary,
        base_font: String,
        to_unicode: Option<ToUnicodeCMap>,
    ) -> Result<Self, BackendError> {
        let descendant = match dict.get(b"DescendantFonts").map(|o| resolve(doc, o)) {
            Ok(Object::Array(arr)) => arr.first().map(|o| resolve(doc, o)).and_then(|o| o.as_dict().ok()),
            _ => None,
        }
        .ok_or_else(|| BackendError::Font(format!("{base_font}: missing /DescendantFonts")))?;

        let widths = match descendant.get(b"W").map(|o| resolve(doc, o)) {
            Ok(Object::Array(arr)) => parse_w_array(doc, arr)?,
            _ => HashMap::new(),
        };
        let default_width = descendant
            .get(b"DW")
            .ok()
            .and_then(|o| number(resolve(doc, o)))
            .unwrap_or(DEFAULT_CID_WIDTH);
        let descriptor = Descriptor::read(doc, descendant);
        let code_bytes = to_unicode
            .as_ref()
            .and_then(ToUnicodeCMap::code_bytes)
            .unwrap_or(2)
            .clamp(1, 4);

        Ok(Font {
            base_font,
            code_bytes,
            widths: Widths::Cid(widths),
            default_width,
            scale: 1.0,
            encoding: None,
            to_unicode,
            ascent: descriptor.ascent.unwrap_or(DEFAULT_ASCENT),
            descent: descriptor.descent.unwrap_or(DEFAULT_DESCENT),
        })
    }

    /// Ascent in 1/1000 of text space.
    pub fn ascent(&self) -> f64 {
        self.ascent
    }

    /// Descent in 1/1000 of text space (negative).
    pub fn descent(&self) -> f64 {
        self.descent
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.widths, Widths::Cid(_))
    }

    /// Advance width of a code in 1/1000 of text space.
    pub fn width(&self, code: u32) -> f64 {
        let glyph_width = match &self.widths {
            Widths::Simple {
                first_char,
                widths,
                standard,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .or_else(|| {
                    standard
                        .filter(|_| widths.is_empty())
                        .and_then(|m| m.widths.get(code as usize))
                        .map(|&w| w as f64)
                })
                .unwrap_or(self.default_width),
            Widths::Cid(map) => map.get(&code).copied().unwrap_or(self.default_width),
        };
        glyph_width * self.scale
    }

    fn text_for(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.lookup(code)) {
            return text.to_string();
        }
        match (&self.encoding, u8::try_from(code)) {
            (Some(encoding), Ok(byte)) => encoding
                .decode(byte)
                .map_or_else(|| '\u{FFFD}'.to_string(), |c| c.to_string()),
            _ => '\u{FFFD}'.to_string(),
        }
    }

    /// Split a shown string into character codes.
    ///
    /// A trailing partial code of a multi-byte font is kept with the bytes
    /// that are present.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedChar> {
        bytes
            .chunks(self.code_bytes)
            .enumerate()
            .map(|(i, chunk)| {
                let start = i * self.code_bytes;
                let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                DecodedChar {
                    code,
                    bytes: start..start + chunk.len(),
                    text: self.text_for(code),
                    width: self.width(code),
                    is_space: self.code_bytes == 1 && code == 32,
                }
            })
            .collect()
    }
}

/// Values read from a `/FontDescriptor`.
#[derive(Debug, Default)]
struct Descriptor {
    ascent: Option<f64>,
    descent: Option<f64>,
    missing_width: Option<f64>,
}

impl Descriptor {
    fn read(doc: &Document, font: &Dictionary) -> Self {
        let Some(desc) = font
            .get(b"FontDescriptor")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
        else {
            return Descriptor::default();
        };
        let get = |key: &[u8]| desc.get(key).ok().and_then(|o| number(resolve(doc, o)));
        Descriptor {
            // Some producers write zero for both.
            ascent: get(b"Ascent").filter(|v| *v > 0.0),
            descent: get(b"Descent").filter(|v| *v < 0.0),
            missing_width: get(b"MissingWidth"),
        }
    }
}

pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn load_to_unicode(doc: &Document, dict: &Dictionary) -> Option<ToUnicodeCMap> {
    let stream = dict
        .get(b"ToUnicode")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_stream().ok())?;
    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    match ToUnicodeCMap::parse(&data) {
        Ok(cmap) => Some(cmap),
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "ignoring unreadable /ToUnicode map");
            None
        }
    }
}

/// Resolve `/Encoding` (a name or a dictionary with `/Differences`).
fn resolve_encoding(doc: &Document, dict: &Dictionary, fallback: StandardEncoding) -> FontEncoding {
    let Ok(obj) = dict.get(b"Encoding").map(|o| resolve(doc, o)) else {
        return FontEncoding::from_standard(fallback);
    };
    match obj {
        Object::Name(name) => {
            FontEncoding::from_standard(StandardEncoding::from_name(name).unwrap_or(fallback))
        }
        Object::Dictionary(enc) => {
            let base = enc
                .get(b"BaseEncoding")
                .ok()
                .and_then(|o| o.as_name().ok())
                .and_then(StandardEncoding::from_name)
                .unwrap_or(fallback);
            let mut encoding = FontEncoding::from_standard(base);
            if let Ok(Object::Array(diffs)) = enc.get(b"Differences").map(|o| resolve(doc, o)) {
                encoding.apply_differences(&parse_differences(diffs));
            }
            encoding
        }
        _ => FontEncoding::from_standard(fallback),
    }
}

/// `[code /name /name ... code /name ...]` into `(code, char)` pairs.
fn parse_differences(arr: &[Object]) -> Vec<(u8, char)> {
    let mut pairs = Vec::new();
    let mut code: Option<u32> = None;
    for obj in arr {
        match obj {
            Object::Integer(i) => code = u32::try_from(*i).ok(),
            Object::Name(name) => {
                if let Some(c) = code {
                    if let (Ok(byte), Some(ch)) = (
                        u8::try_from(c),
                        glyph_name_to_char(&String::from_utf8_lossy(name)),
                    ) {
                        pairs.push((byte, ch));
                    }
                    code = c.checked_add(1);
                }
            }
            _ => {}
        }
    }
    pairs
}

/// Parse a CIDFont `/W` array: `c [w1 w2 ...]` and `c_first c_last w` runs.
///
/// CIDs are limited to `0..=MAX_CID`; a run that reaches past it is an error.
fn parse_w_array(doc: &Document, arr: &[Object]) -> Result<HashMap<u32, f64>, BackendError> {
    let out_of_range =
        |cid: f64| BackendError::Font(format!("/W entry for CID {cid} is out of range"));
    let mut widths = HashMap::new();
    let mut items = arr.iter().map(|o| resolve(doc, o)).peekable();
    while let Some(first) = items.next() {
        let Some(start) = number(first) else {
            continue;
        };
        if !(0.0..=MAX_CID as f64).contains(&start) {
            return Err(out_of_range(start));
        }
        let start = start as u32;
        match items.next() {
            Some(Object::Array(run)) => {
                for (i, w) in run.iter().enumerate() {
                    let cid = u32::try_from(i)
                        .ok()
                        .and_then(|i| start.checked_add(i))
                        .filter(|cid| *cid <= MAX_CID)
                        .ok_or_else(|| out_of_range(start as f64 + i as f64))?;
                    if let Some(w) = number(resolve(doc, w)) {
                        widths.insert(cid, w);
                    }
                }
            }
            Some(last) => {
                let (Some(end), Some(w)) = (number(last), items.next().and_then(number)) else {
                    break;
                };
                if end > MAX_CID as f64 {
                    return Err(out_of_range(end));
                }
                if end >= start as f64 {
                    for cid in start..=end as u32 {
                        widths.insert(cid, w);
                    }
                }
            }
            None => break,
        }
    }
    Ok(widths)
}

/// Font resources of a page, resolved on first use.
#[derive(Debug, Default)]
pub struct FontCache {
    fonts: HashMap<Vec<u8>, Font>,
    fallback: Option<Font>,
}

impl FontCache {
    /// Resolve every entry of a `/Resources /Font` dictionary.
    ///
    /// A font that fails to resolve falls back to Helvetica metrics.
    pub fn from_resources(doc: &Document, resources: &Dictionary) -> Self {
        let mut cache = FontCache::default();
        let Some(fonts) = resources
            .get(b"Font")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
        else {
            return cache;
        };
        for (name, obj) in fonts.iter() {
            let font = resolve(doc, obj)
                .as_dict()
                .map_err(BackendError::from)
                .and_then(|dict| Font::load(doc, dict));
            match font {
                Ok(font) => {
                    cache.fonts.insert(name.clone(), font);
                }
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        font = %String::from_utf8_lossy(name),
                        error = %_err,
                        "font could not be resolved, using fallback metrics"
                    );
                    cache.fonts.insert(name.clone(), Font::fallback());
                }
            }
        }
        cache
    }

    /// Font registered under a resource name, or the fallback font.
    pub fn get(&mut self, name: &[u8]) -> &Font {
        if self.fonts.contains_key(name) {
            return &self.fonts[name];
        }
        self.fallback.get_or_insert_with(Font::fallback)
    }

    pub fn insert(&mut self, name: &[u8], font: Font) {
        self.fonts.insert(name.to_vec(), font);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    fn helvetica() -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        }
    }

    #[test]
    fn standard_font_without_widths_uses_builtin_table() {
        let doc = Document::with_version("1.5");
        let font = Font::load(&doc, &helvetica()).unwrap();
        assert_eq!(font.width(b'A' as u32), 667.0);
        assert_eq!(font.ascent(), 718.0);
        let chars = font.decode(b"Hi ");
        assert_eq!(chars.len(), 3);
        assert_eq!(chars[0].text, "H");
        assert_eq!(chars[1].bytes, 1..2);
        assert!(chars[2].is_space);
    }

    #[test]
    fn explicit_widths_override_standard_table() {
        let doc = Document::with_version("1.5");
        let mut dict = helvetica();
        dict.set("FirstChar", 65);
        dict.set("Widths", vec![Object::Integer(500), Object::Integer(510)]);
        let font = Font::load(&doc, &dict).unwrap();
        assert_eq!(font.width(65), 500.0);
        assert_eq!(font.width(66), 510.0);
        // Outside the /Widths range with no /MissingWidth.
        assert_eq!(font.width(67), 0.0);
    }

    #[test]
    fn unknown_font_uses_default_width() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! { "Subtype" => "TrueType", "BaseFont" => "Calibri" };
        let font = Font::load(&doc, &dict).unwrap();
        assert_eq!(font.width(65), DEFAULT_WIDTH);
        assert_eq!(font.ascent(), DEFAULT_ASCENT);
    }

    #[test]
    fn differences_remap_codes() {
        let doc = Document::with_version("1.5");
        let mut dict = helvetica();
        dict.set(
            "Encoding",
            dictionary! {
                "Type" => "Encoding",
                "BaseEncoding" => "WinAnsiEncoding",
                "Differences" => vec![
                    Object::Integer(1),
                    Object::Name(b"F".to_vec()),
                    Object::Name(b"eacute".to_vec()),
                ],
            },
        );
        let font = Font::load(&doc, &dict).unwrap();
        let text: String = font.decode(&[1, 2, b'x']).into_iter().map(|c| c.text).collect();
        assert_eq!(text, "F\u{e9}x");
    }

    #[test]
    fn composite_font_uses_two_byte_codes_and_w_array() {
        let mut doc = Document::with_version("1.5");
        let cmap = b"begincodespacerange <0000> <FFFF> endcodespacerange
beginbfchar <0011> <0046> <0003> <0020> endbfchar"
            .to_vec();
        let cmap_id = doc.add_object(Stream::new(dictionary! {}, cmap));
        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "ABCDEF+Arial",
            "DW" => 1000,
            "W" => vec![Object::Integer(17), Object::Array(vec![Object::Integer(611)])],
        });
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "ABCDEF+Arial",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant_id)],
            "ToUnicode" => cmap_id,
        };
        let font = Font::load(&doc, &dict).unwrap();
        assert!(font.is_composite());
        let chars = font.decode(&[0x00, 0x11, 0x00, 0x03, 0x00, 0x99]);
        assert_eq!(chars.len(), 3);
        assert_eq!(chars[0].text, "F");
        assert_eq!(chars[0].width, 611.0);
        assert_eq!(chars[1].text, " ");
        assert!(!chars[1].is_space, "word spacing never applies to two-byte codes");
        assert_eq!(chars[2].text, "\u{FFFD}");
        assert_eq!(chars[2].width, 1000.0);
        assert_eq!(chars[2].bytes, 4..6);
    }

    #[test]
    fn composite_font_without_descendant_is_an_error() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! { "Subtype" => "Type0", "BaseFont" => "X" };
        assert!(matches!(Font::load(&doc, &dict), Err(BackendError::Font(_))));
    }

    #[test]
    fn type3_font_matrix_scales_widths() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Subtype" => "Type3",
            "FirstChar" => 0,
            "Widths" => vec![Object::Integer(10)],
            "FontMatrix" => vec![
                Object::Real(0.01), 0.into(), 0.into(), Object::Real(0.01), 0.into(), 0.into(),
            ],
        };
        let font = Font::load(&doc, &dict).unwrap();
        assert!((font.width(0) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn w_array_runs() {
        let doc = Document::with_version("1.5");
        let arr = vec![
            Object::Integer(1),
            Object::Array(vec![Object::Integer(250), Object::Real(300.0)]),
            Object::Integer(10),
            Object::Integer(12),
            Object::Integer(500),
        ];
        let widths = parse_w_array(&doc, &arr).unwrap();
        assert_eq!(widths.get(&2), Some(&300.0));
        assert_eq!(widths.get(&11), Some(&500.0));
        assert_eq!(widths.len(), 5);
    }

    #[test]
    fn w_array_run_past_last_cid_is_an_error() {
        let doc = Document::with_version("1.5");
        let arr = vec![
            Object::Integer(4_294_967_295),
            Object::Array(vec![Object::Integer(500), Object::Integer(500)]),
        ];
        assert!(matches!(parse_w_array(&doc, &arr), Err(BackendError::Font(_))));

        let arr = vec![
            Object::Integer(65_535),
            Object::Array(vec![Object::Integer(500), Object::Integer(500)]),
        ];
        assert!(matches!(parse_w_array(&doc, &arr), Err(BackendError::Font(_))));
    }

    #[test]
    fn w_array_huge_range_is_an_error() {
        let doc = Document::with_version("1.5");
        let arr = vec![
            Object::Integer(0),
            Object::Integer(4_294_967_295),
            Object::Integer(500),
        ];
        assert!(matches!(parse_w_array(&doc, &arr), Err(BackendError::Font(_))));
    }

    #[test]
    fn w_array_inverted_range_is_empty() {
        let doc = Document::with_version("1.5");
        let arr = vec![Object::Integer(20), Object::Integer(10), Object::Integer(500)];
        assert!(parse_w_array(&doc, &arr).unwrap().is_empty());
    }

    #[test]
    fn differences_at_last_code_do_not_overflow() {
        let arr = vec![
            Object::Integer(4_294_967_295),
            Object::Name(b"A".to_vec()),
            Object::Name(b"B".to_vec()),
        ];
        assert!(parse_differences(&arr).is_empty());
    }

    #[test]
    fn corrupt_w_array_falls_back_to_helvetica() {
        let mut doc = Document::with_version("1.5");
        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "Broken",
            "W" => vec![
                Object::Integer(4_294_967_295),
                Object::Array(vec![Object::Integer(500), Object::Integer(500)]),
            ],
        });
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Broken",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant_id)],
        };
        assert!(matches!(Font::load(&doc, &font), Err(BackendError::Font(_))));

        let resources = dictionary! { "Font" => dictionary! { "F1" => font } };
        let mut cache = FontCache::from_resources(&doc, &resources);
        assert_eq!(cache.get(b"F1").base_font, "Helvetica");
    }

    #[test]
    fn cache_falls_back_for_unknown_names() {
        let doc = Document::with_version("1.5");
        let resources = dictionary! { "Font" => dictionary! { "F1" => helvetica() } };
        let mut cache = FontCache::from_resources(&doc, &resources);
        assert_eq!(cache.get(b"F1").base_font, "Helvetica");
        assert_eq!(cache.get(b"Missing").base_font, "Helvetica");
        assert_eq!(cache.get(b"Missing").width(b'A' as u32), 667.0);
    }
}
