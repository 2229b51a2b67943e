//! Filter codecs (L1): Flate for general streams, DCT/JPEG for image
//! XObjects, and the PNG predictor pass that sits above both.

pub mod dct;
pub mod flate;
pub mod predictor;

use std::collections::HashMap;

use crate::error::{PdfError, Result};
use crate::model::objects::PDFObject;

/// Decode a stream's raw bytes according to its `/Filter` and
/// `/DecodeParms`, the way the object/stream layer (L2) does for every
/// stream it hands to callers that don't need filter-specific access (e.g.
/// xref streams, content streams).
///
/// `DCTDecode` is intentionally passed through unchanged here: JPEG data is
/// only decoded to pixels on demand by the image extractor (L6), via
/// [`dct::decode`].
pub fn decode_stream_filters(raw: &[u8], dict: &HashMap<String, PDFObject>) -> Result<Vec<u8>> {
    let mut data = raw.to_vec();

    if let Some(filter) = dict.get("Filter") {
        match filter.as_first_name() {
            Some("FlateDecode") => {
                data = flate::decode(&data).or_else(|_| Ok::<_, PdfError>(flate::decode_lenient(&data)))?;
            }
            Some("DCTDecode") => {
                // Left encoded; see doc comment above.
            }
            Some(other) => return Err(PdfError::UnsupportedFilter(other.to_string())),
            None => {}
        }
    }

    if let Some(parms) = dict.get("DecodeParms").or_else(|| dict.get("DP")) {
        let parms_dict = match parms {
            PDFObject::Dictionary(d) => Some(d),
            PDFObject::Array(arr) => arr.iter().find_map(|o| o.as_dict().ok()),
            _ => None,
        };
        if let Some(parms) = parms_dict {
            let predictor = parms
                .get("Predictor")
                .and_then(|p| p.as_int().ok())
                .unwrap_or(1);
            if predictor >= 10 {
                let columns = parms
                    .get("Columns")
                    .and_then(|c| c.as_int().ok())
                    .unwrap_or(1) as usize;
                let colors = parms
                    .get("Colors")
                    .and_then(|c| c.as_int().ok())
                    .unwrap_or(1) as usize;
                let bits = parms
                    .get("BitsPerComponent")
                    .and_then(|b| b.as_int().ok())
                    .unwrap_or(8) as usize;
                data = predictor::apply_png_predictor(&data, columns, colors, bits)?;
            }
        }
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_without_filter() {
        let dict = HashMap::new();
        assert_eq!(decode_stream_filters(b"raw", &dict).unwrap(), b"raw");
    }

    #[test]
    fn unsupported_filter_is_typed_error() {
        let mut dict = HashMap::new();
        dict.insert("Filter".to_string(), PDFObject::Name("CCITTFaxDecode".into()));
        let err = decode_stream_filters(b"x", &dict).unwrap_err();
        assert!(matches!(err, PdfError::UnsupportedFilter(_)));
    }
}
