//! Font decoder (L5): turns a raw glyph-byte sequence into Unicode text
//! using a CMap, a Differences-derived custom encoding, and a base
//! encoding, with the UTF-16BE short-circuit and garbage-fallback
//! heuristics from the design.

use std::collections::HashMap;

use crate::font::encoding::winansi_lookup;

/// Immutable configuration for one font's decoder. Built once per font and
/// never mutated afterward — decoding is a pure function of `(config,
/// bytes)`.
#[derive(Debug, Clone, Default)]
pub struct FontDecoderConfig {
    /// ToUnicode CMap, glyph id -> Unicode rune.
    pub cmap: Option<HashMap<u32, char>>,
    /// e.g. `"WinAnsiEncoding"`, `"Identity-H"`, or `""` when unknown.
    pub base_encoding: String,
    pub use_two_byte_glyphs: bool,
    /// Built from `/Encoding/Differences` via the Adobe Glyph List.
    pub custom_encoding: Option<HashMap<u32, char>>,
}

/// A built, immutable decoder for one font.
#[derive(Debug, Clone)]
pub struct FontDecoder {
    cmap: Option<HashMap<u32, char>>,
    base_encoding: String,
    use_two_byte_glyphs: bool,
    custom_encoding: Option<HashMap<u32, char>>,
}

const GARBAGE_THRESHOLD: f64 = 0.30;

impl FontDecoder {
    /// Build a decoder from its config, forcing `use_two_byte_glyphs` true
    /// when the CMap maps any id above `0xFF` (a one-byte scan could never
    /// produce such an id, so the hint must have been wrong or absent).
    pub fn new(config: FontDecoderConfig) -> Self {
        let forced = config.use_two_byte_glyphs
            || config
                .cmap
                .as_ref()
                .is_some_and(|m| m.keys().any(|&id| id > 0xFF));
        Self {
            cmap: config.cmap,
            base_encoding: config.base_encoding,
            use_two_byte_glyphs: forced,
            custom_encoding: config.custom_encoding,
        }
    }

    /// Decode a raw glyph-byte sequence to Unicode text. Never fails: every
    /// unresolved glyph degrades to U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        if bytes.is_empty() {
            return String::new();
        }
        if self.looks_like_utf16be(bytes) {
            return decode_utf16be(bytes);
        }

        let primary = self.scan_decode(bytes, self.use_two_byte_glyphs);
        if self.use_two_byte_glyphs {
            let primary_ratio = garbage_ratio(&primary);
            if primary_ratio > GARBAGE_THRESHOLD {
                let alt = self.scan_decode(bytes, false);
                if garbage_ratio(&alt) < primary_ratio {
                    return alt;
                }
            }
        }
        primary
    }

    /// The `(glyph id, byte width)` sequence `bytes` scans to under this
    /// decoder's configured chunking, ignoring the UTF-16BE short-circuit
    /// and garbage-fallback heuristics. Used by the interpretation engine
    /// to size advances consistently with how `decode` chunked the same
    /// bytes.
    pub fn glyph_codes(&self, bytes: &[u8]) -> Vec<(u32, usize)> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            if self.use_two_byte_glyphs && bytes.len() - i >= 2 {
                out.push(((u32::from(bytes[i]) << 8) | u32::from(bytes[i + 1]), 2));
                i += 2;
            } else {
                out.push((u32::from(bytes[i]), 1));
                i += 1;
            }
        }
        out
    }

    fn looks_like_utf16be(&self, bytes: &[u8]) -> bool {
        if self.base_encoding.starts_with("Identity") {
            return false;
        }
        if bytes.starts_with(&[0xFE, 0xFF]) {
            return true;
        }
        if bytes.len() >= 4 && bytes.len() % 2 == 0 {
            let even_positions = bytes.len() / 2;
            let null_count = bytes.iter().step_by(2).filter(|&&b| b == 0).count();
            return (null_count as f64) / (even_positions as f64) > 0.4;
        }
        false
    }

    fn scan_decode(&self, bytes: &[u8], two_byte: bool) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < bytes.len() {
            let (id, advance) = if two_byte && bytes.len() - i >= 2 {
                ((u32::from(bytes[i]) << 8) | u32::from(bytes[i + 1]), 2)
            } else {
                (u32::from(bytes[i]), 1)
            };
            out.push(self.resolve_glyph(id, two_byte));
            i += advance;
        }
        out
    }

    /// Resolve one glyph id in priority order: CMap, custom (Differences)
    /// encoding, base-encoding table, Latin-1 (only meaningful for ids that
    /// arrived via 2-byte scanning, where a low id commonly denotes a
    /// direct codepoint), then U+FFFD.
    fn resolve_glyph(&self, id: u32, two_byte: bool) -> char {
        if let Some(ch) = self.cmap.as_ref().and_then(|m| m.get(&id)) {
            return *ch;
        }
        if let Some(ch) = self.custom_encoding.as_ref().and_then(|m| m.get(&id)) {
            return *ch;
        }
        if self.base_encoding == "WinAnsiEncoding" && id <= 0xFF {
            if let Some(ch) = winansi_lookup(id as u8) {
                return ch;
            }
        }
        if two_byte && id <= 0xFF {
            if let Some(ch) = char::from_u32(id) {
                return ch;
            }
        }
        '\u{FFFD}'
    }
}

fn decode_utf16be(bytes: &[u8]) -> String {
    let mut b = bytes;
    if b.starts_with(&[0xFE, 0xFF]) {
        b = &b[2..];
    }
    let len = b.len() - (b.len() % 2);
    let units: Vec<u16> = b[..len]
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    char::decode_utf16(units)
        .map(|r| r.unwrap_or('\u{FFFD}'))
        .collect()
}

fn is_non_printable(c: char) -> bool {
    if c == '\n' || c == '\t' {
        return false;
    }
    c == '\u{FFFD}' || c.is_control()
}

fn garbage_ratio(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let total = s.chars().count();
    let bad = s.chars().filter(|&c| is_non_printable(c)).count();
    bad as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmap_of(pairs: &[(u32, char)]) -> HashMap<u32, char> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn cmap_round_trip_three_glyphs() {
        let decoder = FontDecoder::new(FontDecoderConfig {
            cmap: Some(cmap_of(&[(0x01, 'В'), (0x02, 'ы'), (0x03, 'п')])),
            ..Default::default()
        });
        assert_eq!(decoder.decode(&[0x01, 0x02, 0x03]), "Вып");
    }

    #[test]
    fn cmap_with_high_id_forces_two_byte_scanning() {
        let decoder = FontDecoder::new(FontDecoderConfig {
            cmap: Some(cmap_of(&[(0x0410, 'А')])),
            ..Default::default()
        });
        assert_eq!(decoder.decode(&[0x04, 0x10]), "А");
    }

    #[test]
    fn single_byte_cmap_miss_with_no_base_encoding_is_replacement_char() {
        let decoder = FontDecoder::new(FontDecoderConfig {
            cmap: Some(cmap_of(&[(0xAA, 'Z')])),
            ..Default::default()
        });
        assert_eq!(decoder.decode(&[0x05]), "\u{FFFD}");
    }

    #[test]
    fn utf16be_sticky_string() {
        let decoder = FontDecoder::new(FontDecoderConfig::default());
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decoder.decode(&bytes), "Hi");
    }

    #[test]
    fn garbage_fallback_prefers_cleaner_one_byte_decode() {
        let mut cmap = HashMap::new();
        // Only id 0x9AFF maps; every other 2-byte pairing of these bytes misses.
        cmap.insert(0x9AFF, 'X');
        let decoder = FontDecoder::new(FontDecoderConfig {
            cmap: Some(cmap),
            use_two_byte_glyphs: true,
            base_encoding: "WinAnsiEncoding".into(),
            ..Default::default()
        });
        // Bytes chosen so the 2-byte scan misses the cmap for every pair
        // (producing FFFD each time) while the 1-byte scan is plain ASCII.
        let bytes = b"HELLO!";
        let decoded = decoder.decode(bytes);
        assert_eq!(decoded, "HELLO!");
    }

    #[test]
    fn winansi_base_encoding_used_when_no_cmap() {
        let decoder = FontDecoder::new(FontDecoderConfig {
            base_encoding: "WinAnsiEncoding".into(),
            ..Default::default()
        });
        assert_eq!(decoder.decode(b"Hi"), "Hi");
    }

    #[test]
    fn custom_encoding_from_differences_wins_over_base() {
        let mut custom = HashMap::new();
        custom.insert(0x41, '€');
        let decoder = FontDecoder::new(FontDecoderConfig {
            base_encoding: "WinAnsiEncoding".into(),
            custom_encoding: Some(custom),
            ..Default::default()
        });
        assert_eq!(decoder.decode(&[0x41]), "€");
    }
}
