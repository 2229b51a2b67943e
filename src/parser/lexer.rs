//! Tokenizer for the PDF object syntax (L2) and, reused verbatim, for
//! content streams (L3): both are lexed with the same token set.

use crate::error::{PdfError, Result};

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Eof,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Decoded literal/hex string bytes.
    String(Vec<u8>),
    /// Name with the leading `/` stripped.
    Name(String),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    /// Any bareword that isn't `true`/`false`/`null`: an operator keyword in
    /// content streams, or a structural keyword (`obj`, `R`, `stream`, ...)
    /// in the object grammar.
    Keyword(String),
    Null,
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\0' | b'\t' | b'\n' | 0x0c | b'\r' | b' ')
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

/// Tokenizes PDF/content-stream byte input. Whitespace and `%` comments to
/// end-of-line are skipped between tokens.
pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub const fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub const fn remaining(&self) -> &'a [u8] {
        // SAFETY substitute: slice indexing below is always in-bounds since
        // pos is clamped in `set_pos` and only advanced by consuming bytes.
        self.data
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b) if is_whitespace(b) => {
                    self.pos += 1;
                }
                Some(b'%') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' || b == b'\r' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Read the next token, or `Token::Eof` at end of input.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();
        let Some(b) = self.peek() else {
            return Ok(Token::Eof);
        };

        match b {
            b'[' => {
                self.pos += 1;
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.pos += 1;
                Ok(Token::ArrayEnd)
            }
            b'<' => {
                if self.data.get(self.pos + 1) == Some(&b'<') {
                    self.pos += 2;
                    Ok(Token::DictStart)
                } else {
                    self.read_hex_string()
                }
            }
            b'>' => {
                if self.data.get(self.pos + 1) == Some(&b'>') {
                    self.pos += 2;
                    Ok(Token::DictEnd)
                } else {
                    Err(PdfError::ParseError(format!(
                        "unexpected '>' at position {}",
                        self.pos
                    )))
                }
            }
            b'(' => self.read_literal_string(),
            b'/' => self.read_name(),
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number(),
            _ if is_regular(b) => self.read_keyword_or_literal(),
            _ => Err(PdfError::ParseError(format!(
                "unexpected byte {b:#x} at position {}",
                self.pos
            ))),
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        let mut saw_dot = false;
        let mut saw_digit = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => {
                    saw_digit = true;
                    self.pos += 1;
                }
                b'.' if !saw_dot => {
                    saw_dot = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.data[start..self.pos]).unwrap_or("");
        if !saw_digit {
            return Err(PdfError::ParseError(format!(
                "malformed number at position {start}: {text:?}"
            )));
        }
        if saw_dot {
            text.parse::<f64>()
                .map(Token::Real)
                .map_err(|e| PdfError::ParseError(format!("bad real {text:?}: {e}")))
        } else {
            text.parse::<i64>()
                .map(Token::Integer)
                // A very long run of digits (rare) still parses as a real so
                // we don't fail outright.
                .or_else(|_| text.parse::<f64>().map(Token::Real))
                .map_err(|e| PdfError::ParseError(format!("bad integer {text:?}: {e}")))
        }
    }

    fn read_name(&mut self) -> Result<Token> {
        self.pos += 1; // consume '/'
        let mut name = Vec::new();
        while let Some(b) = self.peek() {
            if !is_regular(b) {
                break;
            }
            if b == b'#' && self.pos + 2 < self.data.len() {
                let hex = &self.data[self.pos + 1..self.pos + 3];
                if let Ok(s) = std::str::from_utf8(hex)
                    && let Ok(v) = u8::from_str_radix(s, 16)
                {
                    name.push(v);
                    self.pos += 3;
                    continue;
                }
            }
            name.push(b);
            self.pos += 1;
        }
        Ok(Token::Name(String::from_utf8_lossy(&name).into_owned()))
    }

    fn read_keyword_or_literal(&mut self) -> Result<Token> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !is_regular(b) {
                break;
            }
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.data[start..self.pos]).into_owned();
        match text.as_str() {
            "true" => Ok(Token::Boolean(true)),
            "false" => Ok(Token::Boolean(false)),
            "null" => Ok(Token::Null),
            _ => {
                if text.is_empty() {
                    // Shouldn't happen: caller only enters this branch on a
                    // regular byte, so at least one byte is consumed.
                    self.pos += 1;
                    Err(PdfError::ParseError(format!(
                        "empty keyword at position {start}"
                    )))
                } else {
                    Ok(Token::Keyword(text))
                }
            }
        }
    }

    fn read_literal_string(&mut self) -> Result<Token> {
        self.pos += 1; // consume '('
        let mut depth = 1usize;
        let mut out = Vec::new();
        loop {
            let Some(b) = self.bump() else {
                return Err(PdfError::ParseError("unterminated literal string".into()));
            };
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(b);
                }
                b'\\' => {
                    let Some(e) = self.bump() else {
                        return Err(PdfError::ParseError("unterminated escape".into()));
                    };
                    match e {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0c),
                        b'(' => out.push(b'('),
                        b')' => out.push(b')'),
                        b'\\' => out.push(b'\\'),
                        b'\r' => {
                            // line continuation; also eat a following \n
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut val = (e - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        val = val * 8 + (d - b'0') as u32;
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((val & 0xff) as u8);
                        }
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
        Ok(Token::String(out))
    }

    fn read_hex_string(&mut self) -> Result<Token> {
        self.pos += 1; // consume '<'
        let mut digits = Vec::new();
        loop {
            let Some(b) = self.bump() else {
                return Err(PdfError::ParseError("unterminated hex string".into()));
            };
            if b == b'>' {
                break;
            }
            if b.is_ascii_hexdigit() {
                digits.push(b);
            } else if !is_whitespace(b) {
                return Err(PdfError::ParseError(format!(
                    "invalid hex digit {b:#x} in hex string"
                )));
            }
        }
        if digits.len() % 2 == 1 {
            digits.push(b'0');
        }
        let mut out = Vec::with_capacity(digits.len() / 2);
        for pair in digits.chunks_exact(2) {
            let s = std::str::from_utf8(pair).unwrap();
            out.push(u8::from_str_radix(s, 16).unwrap_or(0));
        }
        Ok(Token::String(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &[u8]) -> Vec<Token> {
        let mut lex = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lex.next_token().unwrap();
            if tok == Token::Eof {
                break;
            }
            out.push(tok);
        }
        out
    }

    #[test]
    fn numbers() {
        assert_eq!(tokens(b"42 -17 3.14 -0.5 .5"), vec![
            Token::Integer(42),
            Token::Integer(-17),
            Token::Real(3.14),
            Token::Real(-0.5),
            Token::Real(0.5),
        ]);
    }

    #[test]
    fn literal_string_with_escapes() {
        assert_eq!(
            tokens(b"(Hello\\nWorld \\(nested\\))"),
            vec![Token::String(b"Hello\nWorld (nested)".to_vec())]
        );
    }

    #[test]
    fn hex_string_odd_digits_padded() {
        assert_eq!(tokens(b"<48656C6C6F>"), vec![Token::String(b"Hello".to_vec())]);
        assert_eq!(tokens(b"<1>"), vec![Token::String(vec![0x10])]);
    }

    #[test]
    fn name_with_hash_escape() {
        assert_eq!(
            tokens(b"/A#42C"),
            vec![Token::Name("ABC".to_string())]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens(b"1 % a comment\n2"),
            vec![Token::Integer(1), Token::Integer(2)]
        );
    }

    #[test]
    fn booleans_and_null() {
        assert_eq!(
            tokens(b"true false null"),
            vec![Token::Boolean(true), Token::Boolean(false), Token::Null]
        );
    }

    #[test]
    fn keyword_token() {
        assert_eq!(tokens(b"obj"), vec![Token::Keyword("obj".to_string())]);
    }
}
