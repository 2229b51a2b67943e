//! Cell extractor (L11): materializes a cell's text content and alignment
//! from the text elements that fall inside its bounds.

use crate::model::geometry::{Point, Rectangle};
use crate::model::state::TextElement;

/// Inferred horizontal text alignment within a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Text elements whose center falls inside `bounds`.
pub fn find_elements_in_bounds<'a>(bounds: Rectangle, elements: &'a [TextElement]) -> Vec<&'a TextElement> {
    elements
        .iter()
        .filter(|e| bounds.contains(Point::new(e.center_x(), e.center_y())))
        .collect()
}

struct Line<'a> {
    min_y: f64,
    max_y: f64,
    sum_y: f64,
    count: usize,
    elements: Vec<&'a TextElement>,
}

/// Build a cell's displayed text: group its elements into physical lines
/// (an element joins an existing line if its y is within
/// `0.3·avg_font_size` of that line's y-span), sort lines top-to-bottom and
/// each line's elements left-to-right, insert a single space wherever a
/// horizontal gap exceeds 2pt, then join lines with `\n` and trim.
pub fn extract_cell_content(bounds: Rectangle, elements: &[TextElement], avg_font_size: f64) -> String {
    let selected = find_elements_in_bounds(bounds, elements);
    if selected.is_empty() {
        return String::new();
    }
    let threshold = 0.3 * avg_font_size;

    let mut lines: Vec<Line> = Vec::new();
    for el in selected {
        let mut placed = false;
        for l in lines.iter_mut() {
            let dist = if el.y < l.min_y {
                l.min_y - el.y
            } else if el.y > l.max_y {
                el.y - l.max_y
            } else {
                0.0
            };
            if dist <= threshold {
                l.min_y = l.min_y.min(el.y);
                l.max_y = l.max_y.max(el.y);
                l.sum_y += el.y;
                l.count += 1;
                l.elements.push(el);
                placed = true;
                break;
            }
        }
        if !placed {
            lines.push(Line {
                min_y: el.y,
                max_y: el.y,
                sum_y: el.y,
                count: 1,
                elements: vec![el],
            });
        }
    }

    lines.sort_by(|a, b| (b.sum_y / b.count as f64).partial_cmp(&(a.sum_y / a.count as f64)).unwrap());
    for l in lines.iter_mut() {
        l.elements.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
    }

    let out_lines: Vec<String> = lines
        .iter()
        .map(|l| {
            let mut text = String::new();
            let mut prev_right: Option<f64> = None;
            for el in &l.elements {
                if let Some(pr) = prev_right {
                    if el.x - pr > 2.0 {
                        text.push(' ');
                    }
                }
                text.push_str(&el.text);
                prev_right = Some(el.right());
            }
            text
        })
        .collect();

    out_lines.join("\n").trim().to_string()
}

/// Infer alignment from how the mean x of a cell's elements sits relative
/// to the cell's horizontal center and edges.
pub fn infer_alignment(bounds: Rectangle, elements: &[TextElement]) -> Alignment {
    let selected = find_elements_in_bounds(bounds, elements);
    if selected.is_empty() {
        return Alignment::Left;
    }
    let mean_x = selected.iter().map(|e| e.x).sum::<f64>() / selected.len() as f64;
    let cell_center_x = bounds.x + bounds.width / 2.0;

    if (mean_x - cell_center_x).abs() < 0.1 * bounds.width {
        Alignment::Center
    } else if bounds.right() - mean_x < mean_x - bounds.x {
        Alignment::Right
    } else {
        Alignment::Left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(text: &str, x: f64, y: f64, width: f64, height: f64) -> TextElement {
        TextElement {
            text: text.to_string(),
            x,
            y,
            width,
            height,
            font_name: "F1".to_string(),
            font_size: 10.0,
        }
    }

    #[test]
    fn multi_line_cell_joins_lines_top_to_bottom() {
        let bounds = Rectangle::new(0.0, 0.0, 100.0, 50.0);
        let elements = vec![
            el("line one", 10.0, 30.0, 40.0, 10.0),
            el("line two", 10.0, 10.0, 40.0, 10.0),
        ];
        let text = extract_cell_content(bounds, &elements, 10.0);
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn same_line_fragments_get_a_space_across_a_horizontal_gap() {
        let bounds = Rectangle::new(0.0, 0.0, 100.0, 50.0);
        let elements = vec![el("Hello", 10.0, 20.0, 30.0, 10.0), el("World", 45.0, 20.0, 30.0, 10.0)];
        let text = extract_cell_content(bounds, &elements, 10.0);
        assert_eq!(text, "Hello World");
    }

    #[test]
    fn empty_cell_yields_empty_string() {
        let bounds = Rectangle::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(extract_cell_content(bounds, &[], 10.0), "");
    }

    #[test]
    fn right_aligned_numbers_are_detected() {
        let bounds = Rectangle::new(0.0, 0.0, 100.0, 20.0);
        let elements = vec![el("350.00", 70.0, 5.0, 25.0, 10.0)];
        assert_eq!(infer_alignment(bounds, &elements), Alignment::Right);
    }
}
