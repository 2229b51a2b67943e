//! Ruling-line detector (L7): canonicalized horizontal/vertical line
//! segments extracted from stroked path geometry, merged and deduplicated.

use std::collections::BTreeMap;

use crate::model::geometry::Point;
use crate::model::state::{GraphicsElement, GraphicsKind};

/// Tunables for ruling-line detection; defaults match the design's
/// published constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RulingLineParams {
    pub tolerance: f64,
    pub min_line_length: f64,
}

impl Default for RulingLineParams {
    fn default() -> Self {
        Self {
            tolerance: 2.0,
            min_line_length: 10.0,
        }
    }
}

/// An axis-aligned line segment extracted from stroked path geometry.
/// `is_horizontal` iff `|Δy| ≤ |Δx|` at construction; the constant axis is
/// snapped to a single exact value once classified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RulingLine {
    pub start: Point,
    pub end: Point,
    pub is_horizontal: bool,
}

impl RulingLine {
    pub fn length(&self) -> f64 {
        ((self.end.x - self.start.x).powi(2) + (self.end.y - self.start.y).powi(2)).sqrt()
    }

    /// Crossing point of a horizontal and a vertical line, if one segment
    /// actually covers the other's constant coordinate. Defined only for
    /// one horizontal and one vertical line; any other pairing is `None`.
    pub fn intersect(&self, other: &Self) -> Option<Point> {
        let (h, v) = match (self.is_horizontal, other.is_horizontal) {
            (true, false) => (self, other),
            (false, true) => (other, self),
            _ => return None,
        };
        let y = h.start.y;
        let x = v.start.x;
        let (h_min, h_max) = (h.start.x.min(h.end.x), h.start.x.max(h.end.x));
        let (v_min, v_max) = (v.start.y.min(v.end.y), v.start.y.max(v.end.y));
        if x >= h_min && x <= h_max && y >= v_min && y <= v_max {
            Some(Point::new(x, y))
        } else {
            None
        }
    }
}

/// Detect canonicalized ruling lines from a page's stroked graphics
/// elements: classify two-point Line elements as horizontal or vertical
/// (discarding oblique ones), drop short segments, then merge collinear
/// runs within `2·tolerance` of each other.
pub fn detect_ruling_lines(elements: &[GraphicsElement], params: RulingLineParams) -> Vec<RulingLine> {
    let mut horizontals = Vec::new();
    let mut verticals = Vec::new();

    for el in elements {
        if el.kind != GraphicsKind::Line || el.points.len() != 2 {
            continue;
        }
        let (p0, p1) = (el.points[0], el.points[1]);
        let dx = (p1.x - p0.x).abs();
        let dy = (p1.y - p0.y).abs();

        if dy <= params.tolerance {
            let y = (p0.y + p1.y) / 2.0;
            horizontals.push(RulingLine {
                start: Point::new(p0.x.min(p1.x), y),
                end: Point::new(p0.x.max(p1.x), y),
                is_horizontal: true,
            });
        } else if dx <= params.tolerance {
            let x = (p0.x + p1.x) / 2.0;
            verticals.push(RulingLine {
                start: Point::new(x, p0.y.min(p1.y)),
                end: Point::new(x, p0.y.max(p1.y)),
                is_horizontal: false,
            });
        }
        // else: oblique, discarded.
    }

    horizontals.retain(|l| l.length() >= params.min_line_length);
    verticals.retain(|l| l.length() >= params.min_line_length);

    let mut out = merge_collinear(horizontals, params.tolerance, true);
    out.extend(merge_collinear(verticals, params.tolerance, false));
    out
}

fn merge_collinear(lines: Vec<RulingLine>, tolerance: f64, horizontal: bool) -> Vec<RulingLine> {
    if lines.is_empty() {
        return lines;
    }
    let mut buckets: BTreeMap<i64, Vec<RulingLine>> = BTreeMap::new();
    for l in lines {
        let const_val = if horizontal { l.start.y } else { l.start.x };
        let key = (const_val / tolerance).round() as i64;
        buckets.entry(key).or_default().push(l);
    }

    let mut out = Vec::new();
    for group in buckets.into_values() {
        out.extend(merge_bucket(group, tolerance, horizontal));
    }
    out
}

fn merge_bucket(mut group: Vec<RulingLine>, tolerance: f64, horizontal: bool) -> Vec<RulingLine> {
    if horizontal {
        group.sort_by(|a, b| a.start.x.partial_cmp(&b.start.x).unwrap());
    } else {
        group.sort_by(|a, b| a.start.y.partial_cmp(&b.start.y).unwrap());
    }

    let mut out = Vec::new();
    let mut iter = group.into_iter();
    let first = iter.next().expect("non-empty group");
    let (mut lo, mut hi) = if horizontal {
        (first.start.x, first.end.x)
    } else {
        (first.start.y, first.end.y)
    };
    let mut constants = vec![if horizontal { first.start.y } else { first.start.x }];

    for l in iter {
        let (l_lo, l_hi) = if horizontal {
            (l.start.x, l.end.x)
        } else {
            (l.start.y, l.end.y)
        };
        if l_lo - hi <= 2.0 * tolerance {
            lo = lo.min(l_lo);
            hi = hi.max(l_hi);
            constants.push(if horizontal { l.start.y } else { l.start.x });
        } else {
            out.push(make_line(horizontal, lo, hi, mean(&constants)));
            lo = l_lo;
            hi = l_hi;
            constants = vec![if horizontal { l.start.y } else { l.start.x }];
        }
    }
    out.push(make_line(horizontal, lo, hi, mean(&constants)));
    out
}

fn make_line(horizontal: bool, lo: f64, hi: f64, const_val: f64) -> RulingLine {
    if horizontal {
        RulingLine {
            start: Point::new(lo, const_val),
            end: Point::new(hi, const_val),
            is_horizontal: true,
        }
    } else {
        RulingLine {
            start: Point::new(const_val, lo),
            end: Point::new(const_val, hi),
            is_horizontal: false,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Pairwise horizontal-by-vertical intersections, deduplicated within
/// `tolerance` on both axes.
pub fn find_intersections(lines: &[RulingLine], tolerance: f64) -> Vec<Point> {
    let horizontals: Vec<&RulingLine> = lines.iter().filter(|l| l.is_horizontal).collect();
    let verticals: Vec<&RulingLine> = lines.iter().filter(|l| !l.is_horizontal).collect();

    let mut points: Vec<Point> = Vec::new();
    for h in &horizontals {
        for v in &verticals {
            if let Some(p) = h.intersect(v)
                && !points
                    .iter()
                    .any(|q| (q.x - p.x).abs() <= tolerance && (q.y - p.y).abs() <= tolerance)
            {
                points.push(p);
            }
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geometry::Color;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> GraphicsElement {
        GraphicsElement {
            kind: GraphicsKind::Line,
            points: vec![Point::new(x0, y0), Point::new(x1, y1)],
            stroke_color: Color::BLACK,
            line_width: 1.0,
        }
    }

    #[test]
    fn classifies_horizontal_and_vertical_discards_oblique() {
        let elements = vec![
            line(0.0, 0.0, 100.0, 0.5), // horizontal
            line(0.0, 0.0, 0.5, 100.0), // vertical
            line(0.0, 0.0, 50.0, 50.0), // oblique, discarded
        ];
        let lines = detect_ruling_lines(&elements, RulingLineParams::default());
        assert_eq!(lines.iter().filter(|l| l.is_horizontal).count(), 1);
        assert_eq!(lines.iter().filter(|l| !l.is_horizontal).count(), 1);
    }

    #[test]
    fn short_lines_are_discarded() {
        let elements = vec![line(0.0, 0.0, 5.0, 0.0)];
        let lines = detect_ruling_lines(&elements, RulingLineParams::default());
        assert!(lines.is_empty());
    }

    #[test]
    fn adjacent_collinear_segments_merge() {
        let elements = vec![line(0.0, 0.0, 50.0, 0.0), line(51.0, 0.1, 100.0, 0.1)];
        let lines = detect_ruling_lines(&elements, RulingLineParams::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].start.x, 0.0);
        assert_eq!(lines[0].end.x, 100.0);
    }

    #[test]
    fn intersection_requires_one_horizontal_one_vertical() {
        let h = RulingLine {
            start: Point::new(0.0, 50.0),
            end: Point::new(100.0, 50.0),
            is_horizontal: true,
        };
        let v = RulingLine {
            start: Point::new(40.0, 0.0),
            end: Point::new(40.0, 100.0),
            is_horizontal: false,
        };
        assert_eq!(h.intersect(&v), Some(Point::new(40.0, 50.0)));
        assert_eq!(h.intersect(&h), None);
    }

    #[test]
    fn deduplicates_intersections_within_tolerance() {
        let h1 = RulingLine {
            start: Point::new(0.0, 50.0),
            end: Point::new(100.0, 50.0),
            is_horizontal: true,
        };
        let h2 = RulingLine {
            start: Point::new(0.0, 50.5),
            end: Point::new(100.0, 50.5),
            is_horizontal: true,
        };
        let v = RulingLine {
            start: Point::new(40.0, 0.0),
            end: Point::new(40.0, 100.0),
            is_horizontal: false,
        };
        let points = find_intersections(&[h1, h2, v], 2.0);
        assert_eq!(points.len(), 1);
    }
}
