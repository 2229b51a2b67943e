//! Flate (zlib/deflate, RFC 1950/1951) stream codec (L1).
//!
//! A pure wrapper around `flate2`: no predictor support here — callers that
//! need PNG/TIFF prediction apply it as a separate step (see
//! [`crate::codec::predictor`]), matching the PDF spec's separation of
//! `/Filter` from `/DecodeParms`.

use std::io::Read;

use flate2::Compression;
use flate2::read::{ZlibDecoder, ZlibEncoder};

use crate::error::{PdfError, Result};

/// Decode a complete Flate/zlib stream.
///
/// Fails with [`PdfError::FlateDecodeFailed`] on any underlying error. For
/// lenient, partial recovery of a truncated/corrupted stream see
/// [`decode_lenient`].
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| PdfError::FlateDecodeFailed(e.to_string()))?;
    Ok(out)
}

/// Encode raw bytes as a Flate/zlib stream at the default compression level.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(data, Compression::default());
    let mut out = Vec::new();
    encoder
        .read_to_end(&mut out)
        .expect("in-memory zlib encode is infallible");
    out
}

/// Best-effort decompression for corrupted streams (truncated trailer, bad
/// CRC, etc): decode incrementally and return whatever prefix inflated
/// cleanly instead of failing the whole page.
pub fn decode_lenient(data: &[u8]) -> Vec<u8> {
    use flate2::{Decompress, FlushDecompress, Status};
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 3);
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let res = decoder.decompress(&data[i..], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        if produced > 0 {
            out.extend_from_slice(&buf[..produced]);
        }
        let consumed = (decoder.total_in() - before_in) as usize;
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {
                if consumed == 0 {
                    break;
                }
                i += consumed;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let input = b"the quick brown fox jumps over the lazy dog".repeat(20);
        let encoded = encode(&input);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn decode_failure_is_typed() {
        let err = decode(b"not a zlib stream").unwrap_err();
        assert!(matches!(err, PdfError::FlateDecodeFailed(_)));
    }

    #[test]
    fn lenient_recovers_prefix_of_truncated_stream() {
        let input = b"recoverable prefix data".repeat(10);
        let encoded = encode(&input);
        let truncated = &encoded[..encoded.len() - 4];
        let recovered = decode_lenient(truncated);
        assert!(!recovered.is_empty());
        assert!(input.starts_with(&recovered[..recovered.len().min(input.len())]));
    }
}
