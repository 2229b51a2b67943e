//! DCT (JPEG) stream codec (L1): decode to a raw pixel buffer plus
//! metadata, and (on demand) re-encode raw pixels back to JPEG.

use image::{ColorType, DynamicImage, ImageFormat};

use crate::error::{PdfError, Result};

/// The result of decoding a JPEG: raw, row-major pixel bytes plus the
/// metadata needed to interpret them.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// `1` (grayscale) or `3` (RGB).
    pub components: u8,
    pub bits_per_component: u8,
}

/// Decode a JPEG (DCT-encoded) byte stream.
///
/// Grayscale source images decode to a single-component buffer; everything
/// else (including YCbCr, per standard JFIF conversion, and CMYK) decodes
/// through the library's natural color model to 3-component RGB.
pub fn decode(data: &[u8]) -> Result<DecodedImage> {
    let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(|e| PdfError::DctDecodeFailed(e.to_string()))?;

    let (pixels, components) = match img.color() {
        ColorType::L8 => (img.to_luma8().into_raw(), 1),
        _ => (img.to_rgb8().into_raw(), 3),
    };

    Ok(DecodedImage {
        pixels,
        width: img.width(),
        height: img.height(),
        components,
        bits_per_component: 8,
    })
}

/// Encode a raw pixel buffer (grayscale or RGB, 8 bits/component) to JPEG.
///
/// `quality` is clamped to `[1, 100]`; values `<= 0` or `> 100` default to
/// 75. Fails with [`PdfError::DctEncodeBadSize`] if `buf.len() != w * h *
/// components`.
pub fn encode(buf: &[u8], width: u32, height: u32, components: u8, quality: i32) -> Result<Vec<u8>> {
    let expected = width as usize * height as usize * components as usize;
    if buf.len() != expected {
        return Err(PdfError::DctEncodeBadSize {
            expected,
            got: buf.len(),
        });
    }
    let quality = if (1..=100).contains(&quality) {
        quality as u8
    } else {
        75u8
    };

    let dynamic = match components {
        1 => DynamicImage::ImageLuma8(
            image::GrayImage::from_raw(width, height, buf.to_vec())
                .expect("size already validated"),
        ),
        3 => DynamicImage::ImageRgb8(
            image::RgbImage::from_raw(width, height, buf.to_vec()).expect("size already validated"),
        ),
        other => {
            return Err(PdfError::InvalidArgument(format!(
                "DCT encode supports 1 or 3 components, got {other}"
            )));
        }
    };

    let mut out = Vec::new();
    {
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
        encoder
            .encode_image(&dynamic)
            .map_err(|e| PdfError::DctDecodeFailed(e.to_string()))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_gray_quality_90_within_quantization_bound() {
        let width = 16;
        let height = 16;
        let buf = vec![128u8; (width * height) as usize];
        let encoded = encode(&buf, width, height, 1, 90).unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.width, width);
        assert_eq!(decoded.height, height);
        assert_eq!(decoded.components, 1);
        for (a, b) in buf.iter().zip(decoded.pixels.iter()) {
            assert!((*a as i32 - *b as i32).abs() <= 12);
        }
    }

    #[test]
    fn bad_quality_defaults_to_75() {
        let buf = vec![10u8, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120];
        // 2x2 RGB
        assert!(encode(&buf, 2, 2, 3, 0).is_ok());
        assert!(encode(&buf, 2, 2, 3, 500).is_ok());
    }

    #[test]
    fn bad_buffer_size_is_typed_error() {
        let err = encode(&[0u8; 5], 2, 2, 3, 75).unwrap_err();
        assert!(matches!(err, PdfError::DctEncodeBadSize { .. }));
    }
}
