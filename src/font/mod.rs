//! Font decoding (L5): CMap parsing, WinAnsi/AGL tables, and the decoder
//! that turns glyph-byte sequences into Unicode text.

pub mod cmap;
pub mod decoder;
pub mod encoding;

pub use cmap::parse_tounicode;
pub use decoder::{FontDecoder, FontDecoderConfig};
pub use encoding::{glyph_name_to_unicode, winansi_lookup};

use std::collections::HashMap;

use crate::model::objects::PDFObject;

/// Build a custom (Differences-derived) encoding from a `/Encoding
/// /Differences` array: a sequence alternating a starting glyph id
/// (Integer) with the run of glyph Names that follow it, each consuming
/// the next id in sequence.
pub fn differences_to_custom_encoding(differences: &[PDFObject]) -> HashMap<u32, char> {
    let mut map = HashMap::new();
    let mut code: u32 = 0;
    for obj in differences {
        match obj {
            PDFObject::Integer(n) if *n >= 0 => code = *n as u32,
            PDFObject::Name(name) => {
                if let Some(ch) = glyph_name_to_unicode(name) {
                    map.insert(code, ch);
                }
                code += 1;
            }
            _ => {}
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differences_array_assigns_sequential_codes() {
        let differences = vec![
            PDFObject::Integer(65),
            PDFObject::Name("eacute".into()),
            PDFObject::Name("agrave".into()),
            PDFObject::Integer(100),
            PDFObject::Name("minus".into()),
        ];
        let encoding = differences_to_custom_encoding(&differences);
        assert_eq!(encoding.get(&65), Some(&'é'));
        assert_eq!(encoding.get(&66), Some(&'à'));
        assert_eq!(encoding.get(&100), Some(&'-'));
    }
}
