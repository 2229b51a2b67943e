//! Graphics/text state engine (L4): interprets an Operator sequence against
//! one page's graphics and text state, emitting [`TextElement`]s and
//! [`GraphicsElement`]s in operator order.
//!
//! Deliberately does not implement `cm`/`q`/`Q`: the data model carries no
//! CTM field on [`GraphicsState`], so path and text-positioning operators
//! act directly on the coordinates given in the content stream, per the
//! operator subset actually named for this engine.

use std::collections::HashMap;

use crate::font::FontDecoder;
use crate::model::geometry::{Color, Matrix, Point};
use crate::model::state::{GraphicsElement, GraphicsKind, GraphicsState, TextElement, TextState};
use crate::parser::content::Operator;

/// Per-code glyph widths from a simple font's `/Widths` array (and
/// `/FirstChar`), in thousandths of text-space units, with a fallback for
/// codes outside the table (from `/MissingWidth`, default 0 meaning "no
/// metric available").
#[derive(Debug, Clone, Default)]
pub struct FontMetrics {
    pub first_char: u32,
    pub widths: Vec<f64>,
    pub default_width: f64,
}

impl FontMetrics {
    pub fn width_for(&self, code: u32) -> Option<f64> {
        if code < self.first_char {
            return self.none_or_default();
        }
        let idx = (code - self.first_char) as usize;
        self.widths
            .get(idx)
            .copied()
            .or_else(|| self.none_or_default())
    }

    fn none_or_default(&self) -> Option<f64> {
        (self.default_width > 0.0).then_some(self.default_width)
    }
}

/// One page resource's resolved font: its decoder plus optional width
/// metrics.
#[derive(Debug, Clone)]
pub struct FontEntry {
    pub decoder: FontDecoder,
    pub metrics: Option<FontMetrics>,
}

/// Page-scoped font resource table, keyed by the resource name used in
/// `Tf`.
pub type Fonts = HashMap<String, FontEntry>;

/// Interpret a page's operator sequence. Never fails: an operator with
/// malformed operands (missing numeric operand, unknown font) is skipped
/// and logged, per the engine's swallow-per-operator error policy.
pub fn interpret(ops: &[Operator], fonts: &Fonts) -> (Vec<TextElement>, Vec<GraphicsElement>) {
    let mut gs = GraphicsState::default();
    let mut ts = TextState::default();
    let mut text_out = Vec::new();
    let mut graphics_out = Vec::new();

    for op in ops {
        match op.name.as_str() {
            "BT" => {
                ts.tm = Matrix::IDENTITY;
                ts.tlm = Matrix::IDENTITY;
            }
            "ET" => {}
            "Td" => apply_td(&mut ts, num(op, 0), num(op, 1)),
            "TD" => {
                ts.leading = -num(op, 1);
                apply_td(&mut ts, num(op, 0), num(op, 1));
            }
            "Tm" => {
                let m = Matrix::new(
                    num(op, 0),
                    num(op, 1),
                    num(op, 2),
                    num(op, 3),
                    num(op, 4),
                    num(op, 5),
                );
                ts.tm = m;
                ts.tlm = m;
            }
            "T*" => apply_td(&mut ts, 0.0, -ts.leading),
            "Tf" => {
                if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                    ts.font_name = Some(name.to_string());
                }
                ts.font_size = num(op, 1);
            }
            "Tc" => ts.char_space = num(op, 0),
            "Tw" => ts.word_space = num(op, 0),
            "Tz" => ts.horiz_scale = num(op, 0),
            "TL" => ts.leading = num(op, 0),
            "Ts" => ts.rise = num(op, 0),
            "Tj" => {
                if let Some(bytes) = op.operands.first().and_then(|o| o.as_string().ok()) {
                    show_text(bytes, &mut ts, fonts, &mut text_out);
                }
            }
            "'" => {
                apply_td(&mut ts, 0.0, -ts.leading);
                if let Some(bytes) = op.operands.first().and_then(|o| o.as_string().ok()) {
                    show_text(bytes, &mut ts, fonts, &mut text_out);
                }
            }
            "\"" => {
                ts.word_space = num(op, 0);
                ts.char_space = num(op, 1);
                apply_td(&mut ts, 0.0, -ts.leading);
                if let Some(bytes) = op.operands.get(2).and_then(|o| o.as_string().ok()) {
                    show_text(bytes, &mut ts, fonts, &mut text_out);
                }
            }
            "TJ" => {
                if let Some(arr) = op.operands.first().and_then(|o| o.as_array().ok()) {
                    for item in arr {
                        if let Ok(bytes) = item.as_string() {
                            show_text(bytes, &mut ts, fonts, &mut text_out);
                        } else if let Ok(adj) = item.as_num() {
                            let shift = -(adj / 1000.0) * ts.font_size * (ts.horiz_scale / 100.0);
                            ts.tm = Matrix::translation(shift, 0.0).then(&ts.tm);
                        }
                    }
                }
            }
            "m" => gs.current_path.push(Point::new(num(op, 0), num(op, 1))),
            "l" => gs.current_path.push(Point::new(num(op, 0), num(op, 1))),
            "re" => {
                let (x, y, w, h) = (num(op, 0), num(op, 1), num(op, 2), num(op, 3));
                gs.current_path.extend_from_slice(&[
                    Point::new(x, y),
                    Point::new(x + w, y),
                    Point::new(x + w, y + h),
                    Point::new(x, y + h),
                    Point::new(x, y),
                ]);
            }
            "h" => {
                if let Some(&start) = gs.current_path.first() {
                    gs.current_path.push(start);
                }
            }
            "S" => paint_stroke(&mut gs, &mut graphics_out),
            "s" => {
                if let Some(&start) = gs.current_path.first() {
                    gs.current_path.push(start);
                }
                paint_stroke(&mut gs, &mut graphics_out);
            }
            "f" | "F" => gs.current_path.clear(),
            "RG" => gs.stroke_color = Color::new(num(op, 0), num(op, 1), num(op, 2)),
            "rg" => gs.fill_color = Color::new(num(op, 0), num(op, 1), num(op, 2)),
            "G" => gs.stroke_color = Color::gray(num(op, 0)),
            "g" => gs.fill_color = Color::gray(num(op, 0)),
            "w" => gs.line_width = num(op, 0),
            _ => {}
        }
    }

    (text_out, graphics_out)
}

fn num(op: &Operator, index: usize) -> f64 {
    op.operands
        .get(index)
        .and_then(|o| o.as_num().ok())
        .unwrap_or(0.0)
}

fn apply_td(ts: &mut TextState, tx: f64, ty: f64) {
    let translation = Matrix::translation(tx, ty);
    ts.tlm = translation.then(&ts.tlm);
    ts.tm = ts.tlm;
}

fn show_text(bytes: &[u8], ts: &mut TextState, fonts: &Fonts, out: &mut Vec<TextElement>) {
    let Some(font_name) = ts.font_name.clone() else {
        eprintln!("pdf-tables: text shown with no active font, skipping");
        return;
    };
    let Some(entry) = fonts.get(&font_name) else {
        eprintln!("pdf-tables: unknown font resource {font_name:?}, skipping text");
        return;
    };

    let decoded = entry.decoder.decode(bytes);
    let glyphs = entry.decoder.glyph_codes(bytes);
    let advance = compute_advance(&glyphs, entry.metrics.as_ref(), &decoded, ts);
    let display_width = advance * (ts.horiz_scale / 100.0);

    let pos = ts.cur_pos();
    let height = ts.font_size * ts.tm.scale_magnitude().max(1e-9);

    out.push(TextElement {
        text: decoded,
        x: pos.x,
        y: pos.y,
        width: display_width.max(0.0),
        height: height.max(0.0),
        font_name,
        font_size: ts.font_size,
    });

    ts.tm = Matrix::translation(display_width, 0.0).then(&ts.tm);
}

fn compute_advance(
    glyphs: &[(u32, usize)],
    metrics: Option<&FontMetrics>,
    decoded: &str,
    ts: &TextState,
) -> f64 {
    if glyphs.is_empty() {
        return 0.0;
    }
    let mut total = match metrics {
        Some(m) => glyphs
            .iter()
            .map(|&(code, _)| (m.width_for(code).unwrap_or(500.0) / 1000.0) * ts.font_size)
            .sum(),
        None => decoded.chars().count() as f64 * ts.font_size * 0.5,
    };
    total += glyphs.len() as f64 * ts.char_space;
    total += glyphs
        .iter()
        .filter(|&&(code, nbytes)| nbytes == 1 && code == 0x20)
        .count() as f64
        * ts.word_space;
    total += ts.rise;
    total
}

fn paint_stroke(gs: &mut GraphicsState, out: &mut Vec<GraphicsElement>) {
    let path = std::mem::take(&mut gs.current_path);
    match path.len() {
        0 | 1 => {}
        2 => out.push(GraphicsElement {
            kind: GraphicsKind::Line,
            points: path,
            stroke_color: gs.stroke_color,
            line_width: gs.line_width,
        }),
        5 if is_axis_aligned_rectangle(&path) => out.push(GraphicsElement {
            kind: GraphicsKind::Rectangle,
            points: path,
            stroke_color: gs.stroke_color,
            line_width: gs.line_width,
        }),
        _ => {
            for pair in path.windows(2) {
                out.push(GraphicsElement {
                    kind: GraphicsKind::Path,
                    points: vec![pair[0], pair[1]],
                    stroke_color: gs.stroke_color,
                    line_width: gs.line_width,
                });
            }
        }
    }
}

fn is_axis_aligned_rectangle(points: &[Point]) -> bool {
    const EPS: f64 = 1e-6;
    if points.len() != 5 || points[0] != points[4] {
        return false;
    }
    let mut last_was_horizontal: Option<bool> = None;
    for pair in points.windows(2) {
        let dx = (pair[1].x - pair[0].x).abs();
        let dy = (pair[1].y - pair[0].y).abs();
        if dx > EPS && dy > EPS {
            return false;
        }
        let horizontal = dx > EPS;
        if let Some(prev) = last_was_horizontal {
            if prev == horizontal {
                return false;
            }
        }
        last_was_horizontal = Some(horizontal);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontDecoderConfig;
    use crate::parser::content;

    fn fonts_with(name: &str) -> Fonts {
        let mut fonts = Fonts::new();
        fonts.insert(
            name.to_string(),
            FontEntry {
                decoder: FontDecoder::new(FontDecoderConfig {
                    base_encoding: "WinAnsiEncoding".into(),
                    ..Default::default()
                }),
                metrics: None,
            },
        );
        fonts
    }

    #[test]
    fn text_showing_emits_element_at_tm_origin() {
        let ops = content::parse(b"BT /F1 12 Tf 100 200 Td (Hi) Tj ET").unwrap();
        let fonts = fonts_with("F1");
        let (text, _graphics) = interpret(&ops, &fonts);
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].text, "Hi");
        assert_eq!(text[0].x, 100.0);
        assert_eq!(text[0].y, 200.0);
        assert!(text[0].width > 0.0);
        assert_eq!(text[0].height, 12.0);
    }

    #[test]
    fn rectangle_path_emits_one_rectangle_element() {
        let ops = content::parse(b"10 10 100 50 re S").unwrap();
        let (_text, graphics) = interpret(&ops, &Fonts::new());
        assert_eq!(graphics.len(), 1);
        assert_eq!(graphics[0].kind, GraphicsKind::Rectangle);
        assert_eq!(graphics[0].points[0], graphics[0].points[4]);
    }

    #[test]
    fn two_point_path_emits_line() {
        let ops = content::parse(b"0 0 m 10 10 l S").unwrap();
        let (_text, graphics) = interpret(&ops, &Fonts::new());
        assert_eq!(graphics.len(), 1);
        assert_eq!(graphics[0].kind, GraphicsKind::Line);
    }

    #[test]
    fn fill_operator_discards_path_without_emission() {
        let ops = content::parse(b"0 0 m 10 10 l 10 0 l f").unwrap();
        let (_text, graphics) = interpret(&ops, &Fonts::new());
        assert!(graphics.is_empty());
    }

    #[test]
    fn tj_array_numeric_offset_shifts_without_emitting_text() {
        let ops = content::parse(b"BT /F1 10 Tf 0 0 Td [(A) -500 (B)] TJ ET").unwrap();
        let fonts = fonts_with("F1");
        let (text, _graphics) = interpret(&ops, &fonts);
        assert_eq!(text.len(), 2);
        assert!(text[1].x > text[0].x);
    }

    #[test]
    fn rise_is_incorporated_additively_into_advance() {
        let base = content::parse(b"BT /F1 12 Tf (Hi) Tj ET").unwrap();
        let raised = content::parse(b"BT /F1 12 Tf 5 Ts (Hi) Tj ET").unwrap();
        let fonts = fonts_with("F1");
        let (base_text, _) = interpret(&base, &fonts);
        let (raised_text, _) = interpret(&raised, &fonts);
        assert_eq!(raised_text[0].width, base_text[0].width + 5.0);
    }

    #[test]
    fn missing_font_skips_showing_without_panicking() {
        let ops = content::parse(b"BT /Ghost 10 Tf (oops) Tj ET").unwrap();
        let (text, _graphics) = interpret(&ops, &Fonts::new());
        assert!(text.is_empty());
    }
}
