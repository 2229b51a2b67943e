//! Builds [`PDFObject`]s from the token stream (L2).
//!
//! Dictionary keys must be names. Arrays and dictionaries nest to any depth.
//! A dictionary immediately followed by the `stream`/`endstream` keyword
//! pair becomes a [`PDFStream`], with its raw bytes retained unchanged for
//! later filter application. `N G R` triples become
//! [`PDFObject::IndirectReference`].

use std::collections::HashMap;

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObjRef, PDFObject, PDFStream};
use crate::parser::lexer::{Lexer, Token};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(data),
        }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        let mut lexer = Lexer::new(data);
        lexer.set_pos(pos);
        Self { lexer }
    }

    pub const fn pos(&self) -> usize {
        self.lexer.pos()
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.lexer.set_pos(pos);
    }

    /// Parse the next top-level object.
    pub fn parse_object(&mut self) -> Result<PDFObject> {
        let tok = self.lexer.next_token()?;
        self.parse_from(tok)
    }

    fn parse_from(&mut self, tok: Token) -> Result<PDFObject> {
        match tok {
            Token::Eof => Err(PdfError::ParseError("unexpected end of input".into())),
            Token::Null => Ok(PDFObject::Null),
            Token::Boolean(b) => Ok(PDFObject::Boolean(b)),
            Token::String(s) => Ok(PDFObject::String(s)),
            Token::Name(n) => Ok(PDFObject::Name(n)),
            Token::Real(r) => Ok(PDFObject::Real(r)),
            Token::Integer(n) => self.parse_integer_or_ref(n),
            Token::ArrayStart => self.parse_array(),
            Token::DictStart => self.parse_dict_or_stream(),
            Token::ArrayEnd => Err(PdfError::ParseError("unbalanced ']'".into())),
            Token::DictEnd => Err(PdfError::ParseError("unbalanced '>>'".into())),
            Token::Keyword(k) => Err(PdfError::ParseError(format!("unexpected keyword {k:?}"))),
        }
    }

    /// `N` might be a bare integer, or the start of `N G R`. Two-token
    /// lookahead with full backtrack on mismatch.
    fn parse_integer_or_ref(&mut self, n: i64) -> Result<PDFObject> {
        if n < 0 {
            return Ok(PDFObject::Integer(n));
        }
        let before_g = self.lexer.pos();
        let t2 = self.lexer.next_token()?;
        if let Token::Integer(g) = t2
            && g >= 0
        {
            let before_r = self.lexer.pos();
            let t3 = self.lexer.next_token()?;
            if let Token::Keyword(k) = &t3
                && k == "R"
            {
                return Ok(PDFObject::IndirectReference(PDFObjRef::new(
                    n as u32, g as u16,
                )));
            }
            self.lexer.set_pos(before_r);
        }
        self.lexer.set_pos(before_g);
        Ok(PDFObject::Integer(n))
    }

    fn parse_array(&mut self) -> Result<PDFObject> {
        let mut items = Vec::new();
        loop {
            let tok = self.lexer.next_token()?;
            match tok {
                Token::ArrayEnd => break,
                Token::Eof => {
                    return Err(PdfError::ParseError("unterminated array".into()));
                }
                other => items.push(self.parse_from(other)?),
            }
        }
        Ok(PDFObject::Array(items))
    }

    fn parse_dict_or_stream(&mut self) -> Result<PDFObject> {
        let dict = self.parse_dict_body()?;

        let save = self.lexer.pos();
        match self.lexer.next_token()? {
            Token::Keyword(k) if k == "stream" => {
                let raw = self.read_stream_body(&dict)?;
                Ok(PDFObject::Stream(Box::new(PDFStream::new(dict, raw))))
            }
            _ => {
                self.lexer.set_pos(save);
                Ok(PDFObject::Dictionary(dict))
            }
        }
    }

    fn parse_dict_body(&mut self) -> Result<HashMap<String, PDFObject>> {
        let mut dict = HashMap::new();
        loop {
            let tok = self.lexer.next_token()?;
            match tok {
                Token::DictEnd => break,
                Token::Eof => return Err(PdfError::ParseError("unterminated dictionary".into())),
                Token::Name(key) => {
                    let value_tok = self.lexer.next_token()?;
                    let value = self.parse_from(value_tok)?;
                    dict.insert(key, value);
                }
                other => {
                    return Err(PdfError::ParseError(format!(
                        "dictionary key must be a name, got {other:?}"
                    )));
                }
            }
        }
        Ok(dict)
    }

    /// Raw bytes between `stream` and `endstream`.
    ///
    /// Prefers the declared `/Length` when it is a direct integer and the
    /// bytes at that offset are indeed followed by `endstream`; otherwise
    /// scans for the literal `endstream` keyword, which tolerates an
    /// indirect (unresolved at this layer) or incorrect `/Length`.
    fn read_stream_body(&mut self, dict: &HashMap<String, PDFObject>) -> Result<Vec<u8>> {
        let data = self.lexer.remaining();
        let mut pos = self.lexer.pos();
        // Skip the EOL after the `stream` keyword: CRLF or LF only, per spec.
        if data.get(pos) == Some(&b'\r') {
            pos += 1;
        }
        if data.get(pos) == Some(&b'\n') {
            pos += 1;
        }

        if let Some(PDFObject::Integer(len)) = dict.get("Length")
            && *len >= 0
        {
            let len = *len as usize;
            let end = pos + len;
            if end <= data.len() {
                let tail = &data[end..];
                let trimmed = trim_leading_ws(tail);
                if trimmed.starts_with(b"endstream") {
                    let raw = data[pos..end].to_vec();
                    self.lexer
                        .set_pos(end + (tail.len() - trimmed.len()) + b"endstream".len());
                    return Ok(raw);
                }
            }
        }

        // Fallback: scan for the next `endstream` keyword.
        match find_subslice(&data[pos..], b"endstream") {
            Some(rel) => {
                let mut raw_end = pos + rel;
                // Trim a single trailing EOL that belongs to the `endstream`
                // line, not the stream payload.
                if raw_end > pos && data[raw_end - 1] == b'\n' {
                    raw_end -= 1;
                    if raw_end > pos && data[raw_end - 1] == b'\r' {
                        raw_end -= 1;
                    }
                }
                let raw = data[pos..raw_end].to_vec();
                self.lexer.set_pos(pos + rel + b"endstream".len());
                Ok(raw)
            }
            None => Err(PdfError::ParseError("missing endstream".into())),
        }
    }

    /// Parse `N G obj ... endobj`, returning the object id, generation and
    /// parsed body. Lenient about a missing `endobj`.
    pub fn parse_indirect_object(&mut self) -> Result<(u32, u16, PDFObject)> {
        let objid = match self.lexer.next_token()? {
            Token::Integer(n) if n >= 0 => n as u32,
            other => {
                return Err(PdfError::ParseError(format!(
                    "expected object id, got {other:?}"
                )));
            }
        };
        let genno = match self.lexer.next_token()? {
            Token::Integer(n) if n >= 0 => n as u16,
            other => {
                return Err(PdfError::ParseError(format!(
                    "expected generation number, got {other:?}"
                )));
            }
        };
        match self.lexer.next_token()? {
            Token::Keyword(k) if k == "obj" => {}
            other => {
                return Err(PdfError::ParseError(format!(
                    "expected 'obj', got {other:?}"
                )));
            }
        }
        let body = self.parse_object()?;
        let save = self.lexer.pos();
        match self.lexer.next_token() {
            Ok(Token::Keyword(k)) if k == "endobj" => {}
            _ => self.lexer.set_pos(save),
        }
        Ok((objid, genno, body))
    }
}

fn trim_leading_ws(mut data: &[u8]) -> &[u8] {
    while let Some(&b) = data.first() {
        if matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0c) {
            data = &data[1..];
        } else {
            break;
        }
    }
    data
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indirect_reference() {
        let mut p = Parser::new(b"12 0 R");
        assert_eq!(
            p.parse_object().unwrap(),
            PDFObject::IndirectReference(PDFObjRef::new(12, 0))
        );
    }

    #[test]
    fn bare_integers_are_not_refs() {
        let mut p = Parser::new(b"12 0");
        assert_eq!(p.parse_object().unwrap(), PDFObject::Integer(12));
        assert_eq!(p.parse_object().unwrap(), PDFObject::Integer(0));
    }

    #[test]
    fn nested_array_and_dict() {
        let mut p = Parser::new(b"<< /A [1 2 [3 4]] /B << /C 5 >> >>");
        let obj = p.parse_object().unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict["A"].as_array().unwrap().len(), 3);
        assert_eq!(dict["B"].as_dict().unwrap()["C"], PDFObject::Integer(5));
    }

    #[test]
    fn stream_with_direct_length() {
        let mut p = Parser::new(b"<< /Length 5 >>\nstream\nHELLOendstream");
        let obj = p.parse_object().unwrap();
        let stream = obj.as_stream().unwrap();
        assert_eq!(stream.raw_data, b"HELLO");
    }

    #[test]
    fn stream_falls_back_when_length_wrong() {
        let mut p = Parser::new(b"<< /Length 1 >>\nstream\nHELLO\nendstream");
        let obj = p.parse_object().unwrap();
        let stream = obj.as_stream().unwrap();
        assert_eq!(stream.raw_data, b"HELLO");
    }

    #[test]
    fn indirect_object_roundtrip() {
        let mut p = Parser::new(b"7 0 obj\n(hi)\nendobj");
        let (id, gen, obj) = p.parse_indirect_object().unwrap();
        assert_eq!(id, 7);
        assert_eq!(gen, 0);
        assert_eq!(obj.as_string().unwrap(), b"hi");
    }

    #[test]
    fn unbalanced_array_is_fatal() {
        let mut p = Parser::new(b"[1 2");
        assert!(p.parse_object().is_err());
    }
}
