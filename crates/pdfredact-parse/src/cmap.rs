//! ToUnicode CMap parser.
//!
//! Maps character codes shown by a font to the Unicode text they stand for.
//! Supports `bfchar` and `bfrange` sections (including the array form of
//! `bfrange`) with UTF-16BE destinations, and reads the code width from the
//! first `codespacerange` entry.

use std::collections::HashMap;

use crate::error::BackendError;

/// Most codes one `bfrange` line may map.
const MAX_RANGE_SPAN: u32 = 0x1_0000;

/// A parsed `/ToUnicode` CMap.
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeCMap {
    mappings: HashMap<u32, String>,
    code_bytes: Option<usize>,
}

impl ToUnicodeCMap {
    /// Parse CMap data from the decoded bytes of a `/ToUnicode` stream.
    pub fn parse(data: &[u8]) -> Result<Self, BackendError> {
        let text = String::from_utf8_lossy(data);
        let mut cmap = ToUnicodeCMap::default();

        for section in sections(&text, "begincodespacerange", "endcodespacerange") {
            if let Some(low) = extract_hex_tokens(section).first() {
                cmap.code_bytes = Some(low.len().div_ceil(2).max(1));
                break;
            }
        }
        for section in sections(&text, "beginbfchar", "endbfchar") {
            parse_bfchar(section, &mut cmap.mappings)?;
        }
        for section in sections(&text, "beginbfrange", "endbfrange") {
            parse_bfrange(section, &mut cmap.mappings)?;
        }
        Ok(cmap)
    }

    /// Unicode text for a character code.
    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    /// Bytes per character code declared by the codespace range.
    pub fn code_bytes(&self) -> Option<usize> {
        self.code_bytes
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Every body between `begin` and the following `end` keyword.
fn sections<'a>(text: &'a str, begin: &'a str, end: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let mut rest = text;
    std::iter::from_fn(move || {
        let start = rest.find(begin)? + begin.len();
        let len = rest[start..].find(end)?;
        let body = &rest[start..start + len];
        rest = &rest[start + len + end.len()..];
        Some(body)
    })
}

fn parse_hex_code(hex: &str) -> Result<u32, BackendError> {
    if hex.is_empty() {
        return Ok(0);
    }
    u32::from_str_radix(hex, 16)
        .map_err(|e| BackendError::Parse(format!("invalid hex code '{hex}': {e}")))
}

/// Decode a hex string holding UTF-16BE code units.
fn decode_utf16be_hex(hex: &str) -> Result<String, BackendError> {
    if hex.len() == 2 {
        return decode_utf16be_hex(&format!("00{hex}"));
    }
    if hex.len() % 4 != 0 {
        return Err(BackendError::Parse(format!(
            "UTF-16BE destination '{hex}' has odd length {}",
            hex.len()
        )));
    }
    let units = hex
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            std::str::from_utf8(chunk)
                .ok()
                .and_then(|s| u16::from_str_radix(s, 16).ok())
                .ok_or_else(|| BackendError::Parse(format!("invalid UTF-16BE hex '{hex}'")))
        })
        .collect::<Result<Vec<u16>, _>>()?;
    Ok(String::from_utf16_lossy(&units))
}

/// All `<hex>` tokens in order, whitespace inside the brackets removed.
fn extract_hex_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start + 1..].find('>') else {
            break;
        };
        let token: String = rest[start + 1..start + 1 + len]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        tokens.push(token);
        rest = &rest[start + len + 2..];
    }
    tokens
}

/// `<src> <dst>` pairs.
fn parse_bfchar(section: &str, mappings: &mut HashMap<u32, String>) -> Result<(), BackendError> {
    let tokens = extract_hex_tokens(section);
    for pair in tokens.chunks_exact(2) {
        mappings.insert(parse_hex_code(&pair[0])?, decode_utf16be_hex(&pair[1])?);
    }
    Ok(())
}

/// `<lo> <hi> <dst>` or `<lo> <hi> [<d0> <d1> ...]` lines.
fn parse_bfrange(section: &str, mappings: &mut HashMap<u32, String>) -> Result<(), BackendError> {
    for line in section.lines() {
        let line = line.trim();
        if !line.starts_with('<') {
            continue;
        }
        if let Some(open) = line.find('[') {
            let bounds = extract_hex_tokens(&line[..open]);
            if bounds.len() < 2 {
                continue;
            }
            let lo = parse_hex_code(&bounds[0])?;
            let hi = parse_hex_code(&bounds[1])?;
            for (code, dst) in (lo..=hi).zip(extract_hex_tokens(&line[open..])) {
                mappings.insert(code, decode_utf16be_hex(&dst)?);
            }
        } else {
            let tokens = extract_hex_tokens(line);
            if tokens.len() < 3 {
                continue;
            }
            let lo = parse_hex_code(&tokens[0])?;
            let hi = parse_hex_code(&tokens[1])?.max(lo);
            if hi - lo >= MAX_RANGE_SPAN {
                return Err(BackendError::Parse(format!(
                    "bfrange <{}> <{}> spans more than {MAX_RANGE_SPAN} codes",
                    tokens[0], tokens[1]
                )));
            }
            let dst = decode_utf16be_hex(&tokens[2])?;
            let mut units: Vec<u16> = dst.encode_utf16().collect();
            for code in lo..=hi {
                mappings.insert(code, String::from_utf16_lossy(&units));
                // Increment the last code unit for the next code.
                if let Some(last) = units.last_mut() {
                    *last = last.wrapping_add(1);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY_CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <0046>
endbfchar
2 beginbfrange
<0024> <0026> <0041>
<0030> <0031> [<0066006C> <00E9>]
endbfrange
endcmap";

    #[test]
    fn empty_cmap() {
        let cmap = ToUnicodeCMap::parse(b"").unwrap();
        assert!(cmap.is_empty());
        assert_eq!(cmap.code_bytes(), None);
        assert_eq!(cmap.lookup(0x41), None);
    }

    #[test]
    fn codespace_range_sets_code_width() {
        let cmap = ToUnicodeCMap::parse(IDENTITY_CMAP).unwrap();
        assert_eq!(cmap.code_bytes(), Some(2));

        let one_byte = ToUnicodeCMap::parse(b"begincodespacerange <00> <FF> endcodespacerange").unwrap();
        assert_eq!(one_byte.code_bytes(), Some(1));
    }

    #[test]
    fn bfchar_entries() {
        let cmap = ToUnicodeCMap::parse(IDENTITY_CMAP).unwrap();
        assert_eq!(cmap.lookup(0x0003), Some(" "));
        assert_eq!(cmap.lookup(0x0011), Some("F"));
    }

    #[test]
    fn bfrange_increments_destination() {
        let cmap = ToUnicodeCMap::parse(IDENTITY_CMAP).unwrap();
        assert_eq!(cmap.lookup(0x0024), Some("A"));
        assert_eq!(cmap.lookup(0x0025), Some("B"));
        assert_eq!(cmap.lookup(0x0026), Some("C"));
        assert_eq!(cmap.lookup(0x0027), None);
    }

    #[test]
    fn bfrange_array_form_and_ligatures() {
        let cmap = ToUnicodeCMap::parse(IDENTITY_CMAP).unwrap();
        assert_eq!(cmap.lookup(0x0030), Some("fl"));
        assert_eq!(cmap.lookup(0x0031), Some("\u{e9}"));
        assert_eq!(cmap.len(), 7);
    }

    #[test]
    fn single_byte_destination_is_padded() {
        let cmap = ToUnicodeCMap::parse(b"beginbfchar\n<41> <41>\nendbfchar").unwrap();
        assert_eq!(cmap.lookup(0x41), Some("A"));
    }

    #[test]
    fn surrogate_pair_destination() {
        let cmap = ToUnicodeCMap::parse(b"beginbfchar <01> <D835DC00> endbfchar").unwrap();
        assert_eq!(cmap.lookup(1), Some("\u{1D400}"));
    }

    #[test]
    fn oversized_bfrange_is_an_error() {
        let result = ToUnicodeCMap::parse(b"beginbfrange\n<0000> <FFFFFFFF> <0041>\nendbfrange");
        assert!(matches!(result, Err(BackendError::Parse(_))));
    }

    #[test]
    fn full_two_byte_bfrange_is_accepted() {
        let cmap = ToUnicodeCMap::parse(b"beginbfrange\n<0000> <FFFF> <0041>\nendbfrange").unwrap();
        assert_eq!(cmap.len(), 0x1_0000);
        assert_eq!(cmap.lookup(0), Some("A"));
        assert_eq!(cmap.lookup(1), Some("B"));
    }

    #[test]
    fn inverted_bfrange_maps_its_first_code() {
        let cmap = ToUnicodeCMap::parse(b"beginbfrange\n<0010> <0001> <0041>\nendbfrange").unwrap();
        assert_eq!(cmap.len(), 1);
        assert_eq!(cmap.lookup(0x10), Some("A"));
    }

    #[test]
    fn odd_length_destination_is_an_error() {
        assert!(ToUnicodeCMap::parse(b"beginbfchar <01> <004> endbfchar").is_err());
    }
}
