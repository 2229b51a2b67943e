//! PNG predictor reversal for `/DecodeParms << /Predictor N ... >>`.
//!
//! This sits above the Flate codec (L1), not inside it: L1's
//! [`crate::codec::flate`] stays a pure, predictor-free wrapper per the
//! spec, and the object/stream layer applies prediction as an independent
//! post-processing pass when `/Predictor >= 10`.

use crate::error::{PdfError, Result};

fn paeth(a: i32, b: i32, c: i32) -> i32 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Reverse PNG row prediction. `columns`/`colors`/`bits_per_component` come
/// from `/DecodeParms`; defaults are `1`/`1`/`8` per ISO 32000-1 Table 8.
pub fn apply_png_predictor(
    data: &[u8],
    columns: usize,
    colors: usize,
    bits_per_component: usize,
) -> Result<Vec<u8>> {
    let bpp = ((colors * bits_per_component) / 8).max(1);
    let row_bytes = (colors * columns * bits_per_component).div_ceil(8);
    if row_bytes == 0 {
        return Err(PdfError::ParseError("predictor: zero row width".into()));
    }

    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];
    let mut pos = 0usize;
    while pos + 1 + row_bytes <= data.len() {
        let filter_type = data[pos];
        let row = &data[pos + 1..pos + 1 + row_bytes];
        let mut cur_row = vec![0u8; row_bytes];
        for i in 0..row_bytes {
            let raw = row[i] as i32;
            let a = if i >= bpp { cur_row[i - bpp] as i32 } else { 0 };
            let b = prev_row[i] as i32;
            let c = if i >= bpp { prev_row[i - bpp] as i32 } else { 0 };
            let value = match filter_type {
                0 => raw,
                1 => raw + a,
                2 => raw + b,
                3 => raw + (a + b) / 2,
                4 => raw + paeth(a, b, c),
                other => {
                    return Err(PdfError::ParseError(format!(
                        "predictor: unknown PNG filter type {other}"
                    )));
                }
            };
            cur_row[i] = (value & 0xff) as u8;
        }
        out.extend_from_slice(&cur_row);
        prev_row = cur_row;
        pos += 1 + row_bytes;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_filter_round_trip() {
        // One row, filter type 1 (Sub), 3 bytes/pixel, columns=2 -> row width 6.
        let raw_pixels: [u8; 6] = [10, 20, 30, 15, 25, 35];
        let mut predicted = vec![1u8]; // filter type Sub
        let mut prev = [0i32; 6];
        for (i, &p) in raw_pixels.iter().enumerate() {
            let a = if i >= 3 { raw_pixels[i - 3] as i32 } else { 0 };
            predicted.push(((p as i32 - a) & 0xff) as u8);
            prev[i] = p as i32;
        }
        let out = apply_png_predictor(&predicted, 2, 3, 8).unwrap();
        assert_eq!(out, raw_pixels.to_vec());
    }

    #[test]
    fn none_filter_passthrough() {
        let mut predicted = vec![0u8];
        predicted.extend_from_slice(&[1, 2, 3, 4]);
        let out = apply_png_predictor(&predicted, 4, 1, 8).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }
}
