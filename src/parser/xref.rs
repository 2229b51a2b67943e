//! Cross-reference index (L2): classical `xref`/`trailer` tables and xref
//! streams, including binary entries, with a brute-force repair fallback for
//! files whose `startxref` offset does not point at a valid table.

use std::collections::HashMap;

use crate::error::{PdfError, Result};
use crate::model::objects::PDFObject;
use crate::parser::lexer::{Lexer, Token};
use crate::parser::object_parser::Parser;

/// One resolved slot in the cross-reference index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// Object lives at a byte offset in the file, as `objid genno obj`.
    InUse { offset: u64, genno: u16 },
    /// A free-list slot; `next_free` is the next free object number.
    Free { next_free: u32, genno: u16 },
    /// Object is stored inside an object stream (`/Type /ObjStm`).
    Compressed { stream_objid: u32, index: u32 },
}

/// The cross-reference index for one PDF file: object number -> entry, plus
/// the trailer dictionary (merged across `/Prev` chains, first-seen wins as
/// PDF mandates the most recent trailer's values take priority).
#[derive(Debug, Default)]
pub struct Xref {
    pub entries: HashMap<u32, XrefEntry>,
    pub trailer: HashMap<String, PDFObject>,
}

impl Xref {
    pub fn get(&self, objid: u32) -> Option<XrefEntry> {
        self.entries.get(&objid).copied()
    }

    fn merge_entry(&mut self, objid: u32, entry: XrefEntry) {
        // Earlier (more recent, since we walk /Prev backwards from the
        // newest section) entries win; never overwrite.
        self.entries.entry(objid).or_insert(entry);
    }

    fn merge_trailer(&mut self, trailer: HashMap<String, PDFObject>) {
        for (k, v) in trailer {
            self.trailer.entry(k).or_insert(v);
        }
    }

    /// Build the full index by following `startxref` and any `/Prev` /
    /// `/XRefStm` chain. Falls back to [`Self::repair`] when nothing valid
    /// is found at the stated offset.
    pub fn build(data: &[u8]) -> Result<Self> {
        let mut xref = Self::default();
        match find_startxref(data) {
            Some(start) => {
                let mut seen = std::collections::HashSet::new();
                let mut offset = start;
                loop {
                    if !seen.insert(offset) {
                        break;
                    }
                    let Some(off) = offset else { break };
                    let Ok(section) = xref.load_section(data, off) else {
                        break;
                    };
                    offset = section.prev;
                    if let Some(xref_stm) = section.xref_stm {
                        // Hybrid-reference file: also fold in the
                        // xref-stream addendum.
                        let _ = xref.load_section(data, xref_stm);
                    }
                }
            }
            None => {}
        }
        if xref.entries.is_empty() || xref.trailer.get("Root").is_none() {
            xref.repair(data)?;
        }
        Ok(xref)
    }

    /// Parse one xref section (classical table or xref stream) located at
    /// `offset`, merging its entries and trailer into `self`. Returns the
    /// section's `/Prev` (and, for hybrid files, `/XRefStm`) offsets.
    fn load_section(&mut self, data: &[u8], offset: u64) -> Result<SectionLinks> {
        let start = offset as usize;
        if start >= data.len() {
            return Err(PdfError::XrefError("xref offset out of range".into()));
        }
        let mut lexer = Lexer::new(data);
        lexer.set_pos(start);
        let save = lexer.pos();
        match lexer.next_token()? {
            Token::Keyword(k) if k == "xref" => {
                self.load_classical_table(data, &mut lexer)
            }
            _ => {
                lexer.set_pos(save);
                self.load_xref_stream(data, start)
            }
        }
    }

    fn load_classical_table(
        &mut self,
        data: &[u8],
        lexer: &mut Lexer<'_>,
    ) -> Result<SectionLinks> {
        loop {
            let save = lexer.pos();
            match lexer.next_token()? {
                Token::Integer(start) if start >= 0 => {
                    let count = match lexer.next_token()? {
                        Token::Integer(c) if c >= 0 => c as u32,
                        _ => return Err(PdfError::XrefError("bad xref subsection header".into())),
                    };
                    for i in 0..count {
                        let objid = start as u32 + i;
                        let off = match lexer.next_token()? {
                            Token::Integer(n) if n >= 0 => n as u64,
                            _ => return Err(PdfError::XrefError("bad xref entry offset".into())),
                        };
                        let genno = match lexer.next_token()? {
                            Token::Integer(n) if n >= 0 => n as u16,
                            _ => return Err(PdfError::XrefError("bad xref entry generation".into())),
                        };
                        let kind = match lexer.next_token()? {
                            Token::Keyword(k) if k == "n" => {
                                XrefEntry::InUse { offset: off, genno }
                            }
                            Token::Keyword(k) if k == "f" => XrefEntry::Free {
                                next_free: off as u32,
                                genno,
                            },
                            _ => return Err(PdfError::XrefError("bad xref entry flag".into())),
                        };
                        self.merge_entry(objid, kind);
                    }
                }
                Token::Keyword(k) if k == "trailer" => {
                    lexer.set_pos(lexer.pos());
                    let mut parser = Parser::at(data, lexer.pos());
                    let trailer_obj = parser.parse_object()?;
                    let trailer = trailer_obj.as_dict()?.clone();
                    let prev = trailer
                        .get("Prev")
                        .and_then(|o| o.as_num().ok())
                        .map(|n| n as u64);
                    let xref_stm = trailer
                        .get("XRefStm")
                        .and_then(|o| o.as_num().ok())
                        .map(|n| n as u64);
                    self.merge_trailer(trailer);
                    return Ok(SectionLinks { prev, xref_stm });
                }
                _ => {
                    lexer.set_pos(save);
                    return Ok(SectionLinks {
                        prev: None,
                        xref_stm: None,
                    });
                }
            }
        }
    }

    fn load_xref_stream(&mut self, data: &[u8], start: usize) -> Result<SectionLinks> {
        let mut parser = Parser::at(data, start);
        let (_, _, obj) = parser.parse_indirect_object()?;
        let stream = obj.as_stream()?;
        let w = stream
            .get("W")
            .and_then(|o| o.as_array().ok())
            .ok_or_else(|| PdfError::XrefError("xref stream missing /W".into()))?;
        if w.len() != 3 {
            return Err(PdfError::XrefError("xref stream /W must have 3 entries".into()));
        }
        let widths = [
            w[0].as_int().unwrap_or(1) as usize,
            w[1].as_int().unwrap_or(0) as usize,
            w[2].as_int().unwrap_or(0) as usize,
        ];

        let size = stream.get("Size").and_then(|o| o.as_int().ok()).unwrap_or(0);
        let index: Vec<(u32, u32)> = match stream.get("Index").and_then(|o| o.as_array().ok()) {
            Some(arr) => arr
                .chunks_exact(2)
                .filter_map(|pair| {
                    Some((pair[0].as_int().ok()? as u32, pair[1].as_int().ok()? as u32))
                })
                .collect(),
            None => vec![(0, size as u32)],
        };

        let decoded = crate::codec::decode_stream_filters(&stream.raw_data, &stream.dict)?;
        let record_len = widths[0] + widths[1] + widths[2];
        if record_len == 0 {
            return Err(PdfError::XrefError("xref stream has zero-width record".into()));
        }

        let mut rec_offset = 0usize;
        for (start_id, count) in index {
            for i in 0..count {
                if rec_offset + record_len > decoded.len() {
                    break;
                }
                let objid = start_id + i;
                let rec = &decoded[rec_offset..rec_offset + record_len];
                rec_offset += record_len;

                let field = |lo: usize, len: usize, default: u64| -> u64 {
                    if len == 0 {
                        return default;
                    }
                    let mut v = 0u64;
                    for &b in &rec[lo..lo + len] {
                        v = (v << 8) | b as u64;
                    }
                    v
                };
                let f1 = field(0, widths[0], 1);
                let f2 = field(widths[0], widths[1], 0);
                let f3 = field(widths[0] + widths[1], widths[2], 0);

                let entry = match f1 {
                    0 => XrefEntry::Free {
                        next_free: f2 as u32,
                        genno: f3 as u16,
                    },
                    1 => XrefEntry::InUse {
                        offset: f2,
                        genno: f3 as u16,
                    },
                    2 => XrefEntry::Compressed {
                        stream_objid: f2 as u32,
                        index: f3 as u32,
                    },
                    _ => continue,
                };
                self.merge_entry(objid, entry);
            }
        }

        let prev = stream
            .get("Prev")
            .and_then(|o| o.as_num().ok())
            .map(|n| n as u64);
        self.merge_trailer(stream.dict.clone());
        Ok(SectionLinks {
            prev,
            xref_stm: None,
        })
    }

    /// Brute-force scan for `N G obj` across the whole file, and for a
    /// `trailer` dictionary (or, failing that, any object whose `/Type` is
    /// `/Catalog`, used as `/Root`). Used when the `startxref`-addressed
    /// table is missing or corrupt.
    fn repair(&mut self, data: &[u8]) -> Result<()> {
        self.entries.clear();
        let mut pos = 0usize;
        let mut fallback_root: Option<u32> = None;
        while pos < data.len() {
            if let Some(rel) = find_from(data, pos, b" obj") {
                // Walk backwards from " obj" to recover "N G".
                if let Some((objid, genno, obj_start)) = scan_obj_header(data, rel) {
                    self.entries.insert(
                        objid,
                        XrefEntry::InUse {
                            offset: obj_start as u64,
                            genno,
                        },
                    );
                    let mut p = Parser::at(data, obj_start);
                    if let Ok((_, _, body)) = p.parse_indirect_object()
                        && let Ok(d) = body.as_dict()
                        && d.get("Type").and_then(|t| t.as_name().ok()) == Some("Catalog")
                    {
                        fallback_root = Some(objid);
                    }
                }
                pos = rel + 4;
            } else {
                break;
            }
        }
        if self.trailer.get("Root").is_none()
            && let Some(root) = fallback_root
        {
            self.trailer
                .insert("Root".to_string(), PDFObject::IndirectReference(
                    crate::model::objects::PDFObjRef::new(root, 0),
                ));
        }
        if self.entries.is_empty() {
            return Err(PdfError::XrefError("no objects recovered during repair".into()));
        }
        Ok(())
    }
}

struct SectionLinks {
    prev: Option<u64>,
    xref_stm: Option<u64>,
}

fn find_startxref(data: &[u8]) -> Option<u64> {
    let tail_start = data.len().saturating_sub(2048);
    let rel = find_last(&data[tail_start..], b"startxref")?;
    let mut lexer = Lexer::new(data);
    lexer.set_pos(tail_start + rel + b"startxref".len());
    match lexer.next_token().ok()? {
        Token::Integer(n) if n >= 0 => Some(n as u64),
        _ => None,
    }
}

fn find_last(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| &haystack[i..i + needle.len()] == needle)
}

fn find_from(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    let hay = &haystack[from..];
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    hay.windows(needle.len())
        .position(|w| w == needle)
        .map(|rel| rel + from)
}

/// Given the position of the `" obj"` suffix, walk backwards to recover the
/// `objid genno` prefix and the start offset of the whole `N G obj` header.
fn scan_obj_header(data: &[u8], obj_kw_pos: usize) -> Option<(u32, u16, usize)> {
    let mut i = obj_kw_pos;
    // Skip whitespace directly before "obj".
    while i > 0 && data[i - 1].is_ascii_whitespace() {
        i -= 1;
    }
    let gen_end = i;
    while i > 0 && data[i - 1].is_ascii_digit() {
        i -= 1;
    }
    let gen_start = i;
    if gen_start == gen_end {
        return None;
    }
    while i > 0 && data[i - 1].is_ascii_whitespace() {
        i -= 1;
    }
    let id_end = i;
    while i > 0 && data[i - 1].is_ascii_digit() {
        i -= 1;
    }
    let id_start = i;
    if id_start == id_end {
        return None;
    }
    let genno: u16 = std::str::from_utf8(&data[gen_start..gen_end]).ok()?.parse().ok()?;
    let objid: u32 = std::str::from_utf8(&data[id_start..id_end]).ok()?.parse().ok()?;
    Some((objid, genno, id_start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_classical() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"%PDF-1.7\n");
        let obj1_off = data.len();
        data.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let obj2_off = data.len();
        data.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n");
        let xref_off = data.len();
        data.extend_from_slice(b"xref\n0 3\n");
        data.extend_from_slice(b"0000000000 65535 f \n");
        data.extend_from_slice(format!("{:010} 00000 n \n", obj1_off).as_bytes());
        data.extend_from_slice(format!("{:010} 00000 n \n", obj2_off).as_bytes());
        data.extend_from_slice(b"trailer\n<< /Size 3 /Root 1 0 R >>\n");
        data.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());
        data
    }

    #[test]
    fn parses_classical_xref_and_trailer() {
        let data = sample_classical();
        let xref = Xref::build(&data).unwrap();
        assert!(matches!(xref.get(1), Some(XrefEntry::InUse { .. })));
        assert!(matches!(xref.get(2), Some(XrefEntry::InUse { .. })));
        assert!(matches!(xref.get(0), Some(XrefEntry::Free { .. })));
        assert_eq!(
            xref.trailer.get("Root").unwrap().as_ref().unwrap().objid,
            1
        );
    }

    #[test]
    fn repairs_when_startxref_is_bogus() {
        let mut data = sample_classical();
        // Corrupt the startxref offset so the table can't be found there.
        let pos = find_last(&data, b"startxref").unwrap();
        for b in &mut data[pos..pos + 9] {
            *b = b'#';
        }
        let xref = Xref::build(&data).unwrap();
        assert!(matches!(xref.get(1), Some(XrefEntry::InUse { .. })));
        assert_eq!(
            xref.trailer.get("Root").unwrap().as_ref().unwrap().objid,
            1
        );
    }
}
