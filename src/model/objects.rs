//! PDF object types: the tagged union produced by the object parser (L2)
//! and consumed throughout the rest of the crate.

use crate::error::{PdfError, Result};
use std::collections::HashMap;

/// An indirect object reference: `N G R`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PDFObjRef {
    pub objid: u32,
    pub genno: u16,
}

impl PDFObjRef {
    pub const fn new(objid: u32, genno: u16) -> Self {
        Self { objid, genno }
    }
}

/// A stream object: a dictionary plus the raw (still filter-encoded) bytes
/// between `stream`/`endstream`.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    pub dict: HashMap<String, PDFObject>,
    pub raw_data: Vec<u8>,
}

impl PDFStream {
    pub const fn new(dict: HashMap<String, PDFObject>, raw_data: Vec<u8>) -> Self {
        Self { dict, raw_data }
    }

    pub fn get(&self, key: &str) -> Option<&PDFObject> {
        self.dict.get(key)
    }
}

/// The fundamental value type in PDF: a tagged variant covering every kind
/// of object the lexer/parser can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// A name, without its leading `/`.
    Name(String),
    /// A literal or hex string, decoded to raw bytes (PDF strings are not
    /// necessarily valid UTF-8 or even text).
    String(Vec<u8>),
    Array(Vec<PDFObject>),
    Dictionary(HashMap<String, PDFObject>),
    Stream(Box<PDFStream>),
    IndirectReference(PDFObjRef),
}

impl PDFObject {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dictionary(_) => "dictionary",
            Self::Stream(_) => "stream",
            Self::IndirectReference(_) => "reference",
        }
    }

    fn type_error(&self, expected: &'static str) -> PdfError {
        PdfError::ParseError(format!("expected {expected}, got {}", self.type_name()))
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Boolean(b) => Ok(*b),
            other => Err(other.type_error("boolean")),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Self::Integer(n) => Ok(*n),
            Self::Real(n) => Ok(*n as i64),
            other => Err(other.type_error("integer")),
        }
    }

    /// Numeric value: integers and reals both coerce to `f64`.
    pub fn as_num(&self) -> Result<f64> {
        match self {
            Self::Integer(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            other => Err(other.type_error("number")),
        }
    }

    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            other => Err(other.type_error("name")),
        }
    }

    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other.type_error("string")),
        }
    }

    pub fn as_array(&self) -> Result<&[PDFObject]> {
        match self {
            Self::Array(a) => Ok(a),
            other => Err(other.type_error("array")),
        }
    }

    pub fn as_dict(&self) -> Result<&HashMap<String, PDFObject>> {
        match self {
            Self::Dictionary(d) => Ok(d),
            Self::Stream(s) => Ok(&s.dict),
            other => Err(other.type_error("dictionary")),
        }
    }

    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(s) => Ok(s),
            other => Err(other.type_error("stream")),
        }
    }

    pub fn as_ref(&self) -> Result<PDFObjRef> {
        match self {
            Self::IndirectReference(r) => Ok(*r),
            other => Err(other.type_error("reference")),
        }
    }

    /// `/Filter` or any other name-or-array-of-one-name field, normalized to
    /// the single name it designates (first element if an array).
    pub fn as_first_name(&self) -> Option<&str> {
        match self {
            Self::Name(s) => Some(s),
            Self::Array(a) => a.first().and_then(|o| o.as_name().ok()),
            _ => None,
        }
    }
}
