//! Object- and content-level parsing (L2/L3): the tokenizer, the recursive
//! `PDFObject` parser, cross-reference table/stream reconstruction, and the
//! content-stream operator lexer.

pub mod content;
pub mod lexer;
pub mod object_parser;
pub mod xref;

pub use content::{parse as parse_content, Operator};
pub use lexer::{Lexer, Token};
pub use object_parser::Parser;
pub use xref::{Xref, XrefEntry};
