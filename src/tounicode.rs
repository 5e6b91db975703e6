//! ToUnicode CMap parsing for PDF text extraction
//!
//! Fonts may embed a ToUnicode CMap mapping character codes to Unicode.
//! When present it is the most reliable way to decode show-operator strings,
//! so the extractor consults it before the font's declared encoding.

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;
use std::io::Read;

/// A parsed ToUnicode CMap
#[derive(Debug, Default, Clone)]
pub struct ToUnicodeMap {
    /// Direct mappings: code -> Unicode string
    singles: HashMap<u32, String>,
    /// Range mappings: (first, last, base codepoint)
    ranges: Vec<(u32, u32, u32)>,
}

impl ToUnicodeMap {
    /// Parse a CMap from its decompressed content
    ///
    /// Returns `None` when no usable mappings are found.
    pub fn parse(content: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(content);
        let mut map = ToUnicodeMap::default();

        for section in sections(&text, "beginbfchar", "endbfchar") {
            let groups = hex_groups(section);
            for pair in groups.chunks(2) {
                if let [src, dst] = pair {
                    if let (Some(code), Some(s)) = (parse_hex_u32(src), hex_to_unicode(dst)) {
                        map.singles.insert(code, s);
                    }
                }
            }
        }

        for section in sections(&text, "beginbfrange", "endbfrange") {
            // Array-form ranges (<lo> <hi> [<a> <b> ...]) are skipped; the
            // groups then pair up wrong, so parse line-wise
            for line in section.lines() {
                if line.contains('[') {
                    continue;
                }
                let groups = hex_groups(line);
                if let [lo, hi, base] = groups.as_slice() {
                    if let (Some(lo), Some(hi), Some(base)) =
                        (parse_hex_u32(lo), parse_hex_u32(hi), parse_hex_u32(base))
                    {
                        map.ranges.push((lo, hi, base));
                    }
                }
            }
        }

        if map.singles.is_empty() && map.ranges.is_empty() {
            None
        } else {
            Some(map)
        }
    }

    /// Look up a single character code
    pub fn lookup(&self, code: u32) -> Option<String> {
        if let Some(s) = self.singles.get(&code) {
            return Some(s.clone());
        }
        for &(lo, hi, base) in &self.ranges {
            if code >= lo && code <= hi {
                return char::from_u32(base + (code - lo)).map(|c| c.to_string());
            }
        }
        None
    }

    /// Decode a string of 2-byte big-endian codes (Type0/CID fonts)
    ///
    /// Unmapped codes fall back to their value as a codepoint.
    pub fn decode_two_byte(&self, bytes: &[u8]) -> String {
        let mut out = String::new();
        for chunk in bytes.chunks_exact(2) {
            let code = u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
            match self.lookup(code) {
                Some(s) => out.push_str(&s),
                None => {
                    if let Some(c) = char::from_u32(code) {
                        out.push(c);
                    }
                }
            }
        }
        out
    }

    /// Decode a string of single-byte codes (simple fonts)
    ///
    /// Returns `None` unless every byte is mapped, so the caller can fall
    /// back to the font's declared encoding.
    pub fn decode_single_byte(&self, bytes: &[u8]) -> Option<String> {
        let mut out = String::new();
        for &b in bytes {
            out.push_str(&self.lookup(b as u32)?);
        }
        Some(out)
    }
}

/// Resolve a font dictionary's ToUnicode stream into a parsed CMap
pub fn font_cmap(doc: &Document, font_dict: &Dictionary) -> Option<ToUnicodeMap> {
    let stream_obj = match font_dict.get(b"ToUnicode").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        obj => obj,
    };
    let stream = stream_obj.as_stream().ok()?;

    let data = match stream.decompressed_content() {
        Ok(data) => data,
        // lopdf gives up on filters it does not know; most CMaps are plain
        // FlateDecode, so try raw zlib before using the bytes as-is
        Err(_) => inflate(&stream.content).unwrap_or_else(|| stream.content.clone()),
    };

    ToUnicodeMap::parse(&data)
}

fn inflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).ok()?;
    Some(out)
}

/// All `begin..end` delimited sections of a CMap body
fn sections<'a>(text: &'a str, begin: &'a str, end: &'a str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(start) = text[pos..].find(begin) {
        let body_start = pos + start + begin.len();
        match text[body_start..].find(end) {
            Some(stop) => {
                out.push(&text[body_start..body_start + stop]);
                pos = body_start + stop + end.len();
            }
            None => break,
        }
    }
    out
}

/// Collect the contents of `<...>` hex groups in order
fn hex_groups(section: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = section;
    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) => {
                out.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    out
}

fn parse_hex_u32(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex.trim(), 16).ok()
}

/// Convert a destination hex group to a Unicode string
///
/// Destinations are sequences of UTF-16BE code units, 4 hex digits each.
fn hex_to_unicode(hex: &str) -> Option<String> {
    let hex = hex.trim();
    let mut units = Vec::new();
    let mut i = 0;
    while i + 4 <= hex.len() {
        units.push(u16::from_str_radix(&hex[i..i + 4], 16).ok()?);
        i += 4;
    }
    if units.is_empty() {
        return None;
    }
    Some(String::from_utf16_lossy(&units))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMAP: &str = r#"
/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000><FFFF>
endcodespacerange
3 beginbfchar
<0003> <0020>
<0024> <0041>
<0025> <0042>
endbfchar
1 beginbfrange
<0030> <0039> <0061>
endbfrange
endcmap
"#;

    #[test]
    fn test_parse_bfchar() {
        let map = ToUnicodeMap::parse(CMAP.as_bytes()).unwrap();
        assert_eq!(map.lookup(0x0003), Some(" ".to_string()));
        assert_eq!(map.lookup(0x0024), Some("A".to_string()));
        assert_eq!(map.lookup(0x0025), Some("B".to_string()));
    }

    #[test]
    fn test_parse_bfrange() {
        let map = ToUnicodeMap::parse(CMAP.as_bytes()).unwrap();
        assert_eq!(map.lookup(0x0030), Some("a".to_string()));
        assert_eq!(map.lookup(0x0035), Some("f".to_string()));
        assert_eq!(map.lookup(0x003A), None);
    }

    #[test]
    fn test_decode_two_byte() {
        let map = ToUnicodeMap::parse(CMAP.as_bytes()).unwrap();
        let codes = [0x00, 0x24, 0x00, 0x25, 0x00, 0x03];
        assert_eq!(map.decode_two_byte(&codes), "AB ");
    }

    #[test]
    fn test_decode_single_byte_requires_full_coverage() {
        let map = ToUnicodeMap::parse(CMAP.as_bytes()).unwrap();
        assert_eq!(map.decode_single_byte(&[0x03]), Some(" ".to_string()));
        // 0x99 is unmapped, so the whole string falls back
        assert_eq!(map.decode_single_byte(&[0x03, 0x99]), None);
    }

    #[test]
    fn test_empty_cmap_is_none() {
        assert!(ToUnicodeMap::parse(b"begincmap endcmap").is_none());
    }

    #[test]
    fn test_surrogate_pair_destination() {
        let cmap = b"1 beginbfchar\n<0041> <D835DC00>\nendbfchar";
        let map = ToUnicodeMap::parse(cmap).unwrap();
        assert_eq!(map.lookup(0x41), Some("\u{1D400}".to_string()));
    }
}
