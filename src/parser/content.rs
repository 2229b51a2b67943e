//! Content-stream parser (L3): lexes a decoded content stream into an
//! ordered sequence of `(operator-name, operand-stack)` records.

use std::collections::HashMap;

use crate::error::{PdfError, Result};
use crate::model::objects::PDFObject;
use crate::parser::lexer::{Lexer, Token};

/// One operator invocation: its keyword and the operand stack that was on
/// top of the stack when the keyword token was encountered.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub operands: Vec<PDFObject>,
}

/// Lex a decoded content stream into its operator sequence.
///
/// Maintains an operand stack of parsed objects; every keyword token pops
/// the entire stack into a new [`Operator`] and clears it. Arrays and
/// dictionaries (the `TJ` array operand, inline `DP` dictionaries, etc.) are
/// parsed as full objects and pushed as single operands. Unbalanced
/// array/dictionary delimiters at the top level are fatal, per spec;
/// `BI`/`ID`/`EI` inline-image runs are additionally recognized so their
/// raw binary payload does not get mis-lexed as content tokens.
pub fn parse(data: &[u8]) -> Result<Vec<Operator>> {
    let mut lexer = Lexer::new(data);
    let mut stack: Vec<PDFObject> = Vec::new();
    let mut ops = Vec::new();

    loop {
        let tok = lexer.next_token()?;
        match tok {
            Token::Eof => break,
            Token::Keyword(name) if name == "BI" => {
                skip_inline_image(&mut lexer)?;
                stack.clear();
            }
            Token::Keyword(name) => {
                ops.push(Operator {
                    name,
                    operands: std::mem::take(&mut stack),
                });
            }
            other => stack.push(object_from_token(other, &mut lexer)?),
        }
    }
    Ok(ops)
}

fn object_from_token(tok: Token, lexer: &mut Lexer<'_>) -> Result<PDFObject> {
    match tok {
        Token::Null => Ok(PDFObject::Null),
        Token::Boolean(b) => Ok(PDFObject::Boolean(b)),
        Token::Integer(n) => Ok(PDFObject::Integer(n)),
        Token::Real(r) => Ok(PDFObject::Real(r)),
        Token::String(s) => Ok(PDFObject::String(s)),
        Token::Name(n) => Ok(PDFObject::Name(n)),
        Token::ArrayStart => parse_array(lexer),
        Token::DictStart => parse_dict(lexer),
        Token::ArrayEnd => Err(PdfError::ParseError("unbalanced ']' in content stream".into())),
        Token::DictEnd => Err(PdfError::ParseError("unbalanced '>>' in content stream".into())),
        Token::Keyword(k) => Err(PdfError::ParseError(format!(
            "unexpected keyword {k:?} inside operand"
        ))),
        Token::Eof => Err(PdfError::ParseError("unexpected end of content stream".into())),
    }
}

fn parse_array(lexer: &mut Lexer<'_>) -> Result<PDFObject> {
    let mut items = Vec::new();
    loop {
        let tok = lexer.next_token()?;
        match tok {
            Token::ArrayEnd => break,
            Token::Eof => return Err(PdfError::ParseError("unterminated array in content stream".into())),
            other => items.push(object_from_token(other, lexer)?),
        }
    }
    Ok(PDFObject::Array(items))
}

fn parse_dict(lexer: &mut Lexer<'_>) -> Result<PDFObject> {
    let mut dict = HashMap::new();
    loop {
        let tok = lexer.next_token()?;
        match tok {
            Token::DictEnd => break,
            Token::Eof => return Err(PdfError::ParseError("unterminated dict in content stream".into())),
            Token::Name(key) => {
                let value_tok = lexer.next_token()?;
                let value = object_from_token(value_tok, lexer)?;
                dict.insert(key, value);
            }
            other => {
                return Err(PdfError::ParseError(format!(
                    "dict key must be a name, got {other:?}"
                )));
            }
        }
    }
    Ok(PDFObject::Dictionary(dict))
}

/// Consume an inline-image run: parameter-dictionary pairs up to `ID`, then
/// raw bytes up to the next `EI` that is itself bounded by whitespace (or
/// end of stream), which is the best-effort heuristic every PDF reader
/// needs since image data can coincidentally contain `EI`.
fn skip_inline_image(lexer: &mut Lexer<'_>) -> Result<()> {
    loop {
        match lexer.next_token()? {
            Token::Keyword(k) if k == "ID" => break,
            Token::Eof => return Err(PdfError::ParseError("unterminated inline image dict".into())),
            _ => {}
        }
    }
    let data = lexer.remaining();
    let mut pos = lexer.pos();
    if data.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    match find_ei(data, pos) {
        Some(ei_pos) => {
            lexer.set_pos(ei_pos + 2);
            Ok(())
        }
        None => Err(PdfError::ParseError("missing EI for inline image".into())),
    }
}

fn find_ei(data: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 1 < data.len() {
        if &data[i..i + 2] == b"EI"
            && (i == 0 || data[i - 1].is_ascii_whitespace())
            && data
                .get(i + 2)
                .is_none_or(|b| b.is_ascii_whitespace())
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_operators() {
        let ops = parse(b"100 200 Td (Hello) Tj").unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].name, "Td");
        assert_eq!(
            ops[0].operands,
            vec![PDFObject::Integer(100), PDFObject::Integer(200)]
        );
        assert_eq!(ops[1].name, "Tj");
        assert_eq!(ops[1].operands, vec![PDFObject::String(b"Hello".to_vec())]);
    }

    #[test]
    fn tj_array_operand() {
        let ops = parse(b"[(A) -250 (B)] TJ").unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name, "TJ");
        let arr = ops[0].operands[0].as_array().unwrap();
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn empty_content_stream_yields_no_operators() {
        assert_eq!(parse(b"").unwrap(), Vec::new());
        assert_eq!(parse(b"   \n  ").unwrap(), Vec::new());
    }

    #[test]
    fn unbalanced_array_is_fatal() {
        assert!(parse(b"[1 2 Tj").is_err());
    }

    #[test]
    fn inline_image_is_skipped_without_disrupting_following_operators() {
        let ops = parse(b"q BI /W 1 /H 1 /BPC 8 /CS /G ID \xff\x00EI q").unwrap();
        assert_eq!(ops.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(), vec!["q", "q"]);
    }
}
