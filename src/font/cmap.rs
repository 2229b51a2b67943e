//! ToUnicode CMap parsing (L5 input): `beginbfchar`/`beginbfrange` sections
//! of a CMap stream mapped to a flat `glyph id -> Unicode rune` table.

use std::collections::HashMap;

use crate::error::{PdfError, Result};
use crate::parser::lexer::{Lexer, Token};

/// Parse a decoded ToUnicode CMap stream into `glyph id -> Unicode rune`.
///
/// Reuses the object-syntax lexer: CMaps are PostScript-like and `bfchar`/
/// `bfrange` operands are ordinary hex strings, which the lexer already
/// decodes to raw bytes via its hex-string path. Unrecognized keywords
/// (`usecmap`, `begincidrange`, codespace declarations, ...) are skipped;
/// only the bf* sections matter for text extraction.
pub fn parse_tounicode(data: &[u8]) -> Result<HashMap<u32, char>> {
    let mut map = HashMap::new();
    let mut lexer = Lexer::new(data);
    loop {
        match lexer.next_token()? {
            Token::Eof => break,
            Token::Keyword(k) if k == "beginbfchar" => parse_bfchar(&mut lexer, &mut map)?,
            Token::Keyword(k) if k == "beginbfrange" => parse_bfrange(&mut lexer, &mut map)?,
            _ => {}
        }
    }
    Ok(map)
}

fn bytes_to_code(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Decode a dst operand (UTF-16BE code units, optionally a surrogate pair)
/// to its first Unicode character. CMaps can map a single glyph id to a
/// short string (ligatures); the flat `id -> char` model here keeps only
/// the first resulting character, consistent with the glyph-id-to-rune
/// contract the rest of the font decoder expects.
fn utf16be_to_char(bytes: &[u8]) -> Option<char> {
    if bytes.len() >= 2 {
        let hi = u16::from_be_bytes([bytes[0], bytes[1]]);
        if (0xD800..=0xDBFF).contains(&hi) && bytes.len() >= 4 {
            let lo = u16::from_be_bytes([bytes[2], bytes[3]]);
            if (0xDC00..=0xDFFF).contains(&lo) {
                let cp = 0x10000 + ((u32::from(hi) - 0xD800) << 10) + (u32::from(lo) - 0xDC00);
                return char::from_u32(cp);
            }
        }
        char::from_u32(u32::from(hi))
    } else if bytes.len() == 1 {
        char::from_u32(u32::from(bytes[0]))
    } else {
        None
    }
}

fn parse_bfchar(lexer: &mut Lexer<'_>, map: &mut HashMap<u32, char>) -> Result<()> {
    loop {
        let src = match lexer.next_token()? {
            Token::String(s) => s,
            Token::Keyword(k) if k == "endbfchar" => return Ok(()),
            Token::Eof => return Ok(()),
            _ => continue,
        };
        let dst = match lexer.next_token()? {
            Token::String(s) => s,
            _ => return Err(PdfError::FontError("malformed bfchar entry".into())),
        };
        if let Some(ch) = utf16be_to_char(&dst) {
            map.insert(bytes_to_code(&src), ch);
        }
    }
}

fn parse_bfrange(lexer: &mut Lexer<'_>, map: &mut HashMap<u32, char>) -> Result<()> {
    loop {
        let src_lo = match lexer.next_token()? {
            Token::String(s) => bytes_to_code(&s),
            Token::Keyword(k) if k == "endbfrange" => return Ok(()),
            Token::Eof => return Ok(()),
            _ => continue,
        };
        let src_hi = match lexer.next_token()? {
            Token::String(s) => bytes_to_code(&s),
            _ => return Err(PdfError::FontError("malformed bfrange entry".into())),
        };
        match lexer.next_token()? {
            Token::String(dst) => {
                if let Some(base_char) = utf16be_to_char(&dst) {
                    let base = base_char as u32;
                    for (i, code) in (src_lo..=src_hi).enumerate() {
                        if let Some(ch) = char::from_u32(base + i as u32) {
                            map.insert(code, ch);
                        }
                    }
                }
            }
            Token::ArrayStart => {
                let mut code = src_lo;
                loop {
                    match lexer.next_token()? {
                        Token::ArrayEnd => break,
                        Token::String(dst) => {
                            if let Some(ch) = utf16be_to_char(&dst) {
                                map.insert(code, ch);
                            }
                            code += 1;
                        }
                        Token::Eof => {
                            return Err(PdfError::FontError("unterminated bfrange array".into()));
                        }
                        _ => {}
                    }
                }
            }
            _ => return Err(PdfError::FontError("malformed bfrange entry".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bfchar_entries() {
        let cmap = parse_tounicode(
            b"1 beginbfchar\n<01> <0042>\n<02> <0043>\nendbfchar",
        )
        .unwrap();
        assert_eq!(cmap.get(&1), Some(&'B'));
        assert_eq!(cmap.get(&2), Some(&'C'));
    }

    #[test]
    fn bfrange_with_single_dst_increments() {
        let cmap = parse_tounicode(b"1 beginbfrange\n<01> <03> <0041>\nendbfrange").unwrap();
        assert_eq!(cmap.get(&1), Some(&'A'));
        assert_eq!(cmap.get(&2), Some(&'B'));
        assert_eq!(cmap.get(&3), Some(&'C'));
    }

    #[test]
    fn bfrange_with_dst_array() {
        let cmap = parse_tounicode(
            b"1 beginbfrange\n<01> <02> [<0042> <0044>]\nendbfrange",
        )
        .unwrap();
        assert_eq!(cmap.get(&1), Some(&'B'));
        assert_eq!(cmap.get(&2), Some(&'D'));
    }

    #[test]
    fn surrogate_pair_dst() {
        // U+1F600 (grinning face) as a UTF-16 surrogate pair.
        let cmap = parse_tounicode(b"1 beginbfchar\n<01> <D83DDE00>\nendbfchar").unwrap();
        assert_eq!(cmap.get(&1), Some(&'\u{1F600}'));
    }

    #[test]
    fn unrelated_sections_are_ignored() {
        let cmap = parse_tounicode(
            b"/CIDSystemInfo << /Registry (Adobe) >> def\n1 begincidrange\n<01> <02> 5\nendcidrange",
        )
        .unwrap();
        assert!(cmap.is_empty());
    }
}
