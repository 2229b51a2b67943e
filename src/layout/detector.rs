//! Table detector (L10): decides lattice vs. stream mode and produces the
//! candidate [`TableRegion`]s a page's content yields.

use crate::model::geometry::Rectangle;
use crate::model::state::{GraphicsElement, TextElement};

use super::grid::Grid;
use super::projection::{detect_columns_adaptive, detect_rows, ColumnParams, RowParams};
use super::ruling::{detect_ruling_lines, RulingLineParams};

/// Which detection strategy produced a [`TableRegion`]/[`Table`](super::table::Table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableDetectionMode {
    /// Built from a ruling-line grid.
    Lattice,
    /// Built from whitespace/projection analysis of text alone.
    Stream,
}

/// A detected table's bounds and the row/column boundaries (and, for
/// lattice tables, the full grid) used to extract it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRegion {
    pub bounds: Rectangle,
    pub method: TableDetectionMode,
    pub has_ruling_lines: bool,
    pub grid: Option<Grid>,
    pub rows: Vec<f64>,
    pub columns: Vec<f64>,
}

/// Inspect a page's stroked graphics and report which detection mode its
/// ruling-line geometry supports: `Lattice` if at least 2 horizontal and 2
/// vertical ruling lines are present, `Stream` otherwise.
pub fn detect_mode(graphics: &[GraphicsElement]) -> TableDetectionMode {
    let lines = detect_ruling_lines(graphics, RulingLineParams::default());
    let h = lines.iter().filter(|l| l.is_horizontal).count();
    let v = lines.iter().filter(|l| !l.is_horizontal).count();
    if h >= 2 && v >= 2 {
        TableDetectionMode::Lattice
    } else {
        TableDetectionMode::Stream
    }
}

/// Try lattice detection first; fall back to stream detection if there
/// are not enough ruling lines, or the resulting grid fails the usability
/// check.
pub fn detect_tables(text: &[TextElement], graphics: &[GraphicsElement]) -> Vec<TableRegion> {
    let lines = detect_ruling_lines(graphics, RulingLineParams::default());
    let h = lines.iter().filter(|l| l.is_horizontal).count();
    let v = lines.iter().filter(|l| !l.is_horizontal).count();
    if h >= 2 && v >= 2 && h + v >= 4 {
        if let Some(region) = lattice_region(&lines) {
            return vec![region];
        }
    }
    detect_tables_stream(text)
}

/// Run lattice detection only.
pub fn detect_tables_lattice(graphics: &[GraphicsElement]) -> Vec<TableRegion> {
    let lines = detect_ruling_lines(graphics, RulingLineParams::default());
    let h = lines.iter().filter(|l| l.is_horizontal).count();
    let v = lines.iter().filter(|l| !l.is_horizontal).count();
    if h < 2 || v < 2 || h + v < 4 {
        return Vec::new();
    }
    lattice_region(&lines).into_iter().collect()
}

/// Run stream detection only.
pub fn detect_tables_stream(text: &[TextElement]) -> Vec<TableRegion> {
    if text.is_empty() {
        return Vec::new();
    }
    let columns = detect_columns_adaptive(text, &ColumnParams::default());
    let rows = detect_rows(text, TableDetectionMode::Stream, &RowParams::default());
    if columns.len() < 2 || rows.len() < 2 {
        return Vec::new();
    }
    let rects: Vec<Rectangle> = text.iter().map(|e| Rectangle::new(e.x, e.y, e.width, e.height)).collect();
    let Some(bounds) = Rectangle::hull(&rects) else {
        return Vec::new();
    };
    vec![TableRegion {
        bounds,
        method: TableDetectionMode::Stream,
        has_ruling_lines: false,
        grid: None,
        rows,
        columns,
    }]
}

fn lattice_region(lines: &[super::ruling::RulingLine]) -> Option<TableRegion> {
    let grid = Grid::from_lines(lines, RulingLineParams::default().tolerance).ok()?;
    if !grid.is_usable() {
        return None;
    }
    let bounds = grid.bounds();
    Some(TableRegion {
        bounds,
        method: TableDetectionMode::Lattice,
        has_ruling_lines: true,
        rows: grid.rows.clone(),
        columns: grid.columns.clone(),
        grid: Some(grid),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geometry::{Color, Point};
    use crate::model::state::GraphicsKind;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> GraphicsElement {
        GraphicsElement {
            kind: GraphicsKind::Line,
            points: vec![Point::new(x0, y0), Point::new(x1, y1)],
            stroke_color: Color::BLACK,
            line_width: 1.0,
        }
    }

    fn full_grid_lines() -> Vec<GraphicsElement> {
        vec![
            line(0.0, 0.0, 200.0, 0.0),
            line(0.0, 100.0, 200.0, 100.0),
            line(0.0, 0.0, 0.0, 100.0),
            line(200.0, 0.0, 200.0, 100.0),
        ]
    }

    #[test]
    fn detect_mode_picks_lattice_with_enough_ruling_lines() {
        assert_eq!(detect_mode(&full_grid_lines()), TableDetectionMode::Lattice);
        assert_eq!(detect_mode(&[]), TableDetectionMode::Stream);
    }

    #[test]
    fn detect_tables_builds_a_lattice_region() {
        let regions = detect_tables(&[], &full_grid_lines());
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].method, TableDetectionMode::Lattice);
        assert!(regions[0].grid.is_some());
    }

    #[test]
    fn detect_tables_falls_back_to_stream_when_grid_unusable() {
        // A grid with sub-50pt bounds is rejected; with no text either,
        // nothing is detected at all.
        let tiny = vec![
            line(0.0, 0.0, 10.0, 0.0),
            line(0.0, 10.0, 10.0, 10.0),
            line(0.0, 0.0, 0.0, 10.0),
            line(10.0, 0.0, 10.0, 10.0),
        ];
        assert!(detect_tables(&[], &tiny).is_empty());
    }
}
