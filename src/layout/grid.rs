//! Grid builder (L8): turns a set of ruling lines, or a raw set of cell
//! rectangles, into a rectangular grid of table-space cells.
//!
//! Cells are indexed top-down: `cells[0]` is the topmost row, matching the
//! crate-wide table-cell ordering guarantee, even though the `rows` boundary
//! array itself stays sorted bottom-to-top (ascending y), consistent with
//! how ruling-line y-coordinates are naturally compared.

use std::collections::BTreeMap;

use crate::error::{PdfError, Result};
use crate::model::geometry::Rectangle;

use super::ruling::RulingLine;

/// One rectangular cell in a [`Grid`], indexed top-down / left-to-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub column: usize,
    pub bounds: Rectangle,
}

/// A rectangular grid reconstructed from ruling-line geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Row boundary y-coordinates, ascending (bottom to top).
    pub rows: Vec<f64>,
    /// Column boundary x-coordinates, ascending (left to right).
    pub columns: Vec<f64>,
    /// `cells[0]` is the topmost row.
    pub cells: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::from_corners(
            *self.columns.first().unwrap_or(&0.0),
            *self.rows.first().unwrap_or(&0.0),
            *self.columns.last().unwrap_or(&0.0),
            *self.rows.last().unwrap_or(&0.0),
        )
    }

    /// Usable for downstream table extraction: at least one row and column,
    /// and the grid spans at least 50x50pt. Below that threshold callers
    /// should fall back to stream-mode detection rather than trust the
    /// grid.
    pub fn is_usable(&self) -> bool {
        let b = self.bounds();
        self.row_count() >= 1 && self.column_count() >= 1 && b.width >= 50.0 && b.height >= 50.0
    }
}

/// Build a full grid from ruling lines: every horizontal line's y becomes a
/// row boundary, every vertical line's x a column boundary, and the
/// Cartesian product of consecutive boundary pairs becomes the cell set.
/// Requires at least 2 horizontal and 2 vertical lines.
pub fn from_lines(lines: &[RulingLine], tolerance: f64) -> Result<Grid> {
    let horizontals: Vec<&RulingLine> = lines.iter().filter(|l| l.is_horizontal).collect();
    let verticals: Vec<&RulingLine> = lines.iter().filter(|l| !l.is_horizontal).collect();
    if horizontals.len() < 2 || verticals.len() < 2 {
        return Err(PdfError::GeometryError(
            "need at least 2 horizontal and 2 vertical ruling lines".into(),
        ));
    }

    let rows = unique_sorted(horizontals.iter().map(|l| l.start.y), tolerance);
    let columns = unique_sorted(verticals.iter().map(|l| l.start.x), tolerance);
    if rows.len() < 2 || columns.len() < 2 {
        return Err(PdfError::GeometryError(
            "insufficient distinct row/column boundaries".into(),
        ));
    }

    let cells = build_full_cells(&rows, &columns);
    Ok(Grid { rows, columns, cells })
}

/// Build a grid only from cells whose all four corners are confirmed ruling
/// intersections, dropping any (row, column) pair that is not fully boxed
/// in. Used when the ruling lines do not form a complete rectangular mesh.
pub fn from_intersections(lines: &[RulingLine], _tolerance: f64) -> Result<Grid> {
    let mut horizontals: Vec<&RulingLine> = lines.iter().filter(|l| l.is_horizontal).collect();
    let mut verticals: Vec<&RulingLine> = lines.iter().filter(|l| !l.is_horizontal).collect();
    if horizontals.len() < 2 || verticals.len() < 2 {
        return Err(PdfError::GeometryError(
            "need at least 2 horizontal and 2 vertical ruling lines".into(),
        ));
    }
    horizontals.sort_by(|a, b| a.start.y.partial_cmp(&b.start.y).unwrap());
    verticals.sort_by(|a, b| a.start.x.partial_cmp(&b.start.x).unwrap());

    let r = horizontals.len() - 1;
    let c = verticals.len() - 1;
    let mut cells_by_rc: Vec<Vec<Option<Cell>>> = vec![vec![None; c]; r];

    for i in 0..r {
        let (bottom, top) = (horizontals[i], horizontals[i + 1]);
        for j in 0..c {
            let (left, right) = (verticals[j], verticals[j + 1]);
            let corners = [
                bottom.intersect(left),
                bottom.intersect(right),
                top.intersect(left),
                top.intersect(right),
            ];
            if corners.iter().all(Option::is_some) {
                let pts: Vec<_> = corners.into_iter().flatten().collect();
                let xs: Vec<f64> = pts.iter().map(|p| p.x).collect();
                let ys: Vec<f64> = pts.iter().map(|p| p.y).collect();
                let (x0, x1) = (
                    xs.iter().cloned().fold(f64::INFINITY, f64::min),
                    xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                );
                let (y0, y1) = (
                    ys.iter().cloned().fold(f64::INFINITY, f64::min),
                    ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                );
                let tr = r - 1 - i;
                cells_by_rc[tr][j] = Some(Cell {
                    row: tr,
                    column: j,
                    bounds: Rectangle::from_corners(x0, y0, x1, y1),
                });
            }
        }
    }

    let rows = horizontals.iter().map(|l| l.start.y).collect();
    let columns = verticals.iter().map(|l| l.start.x).collect();
    let cells = cells_by_rc
        .into_iter()
        .map(|row| row.into_iter().flatten().collect())
        .collect();
    Ok(Grid { rows, columns, cells })
}

/// Bridge path: reconstruct row/column boundaries from a raw set of cell
/// rectangles (e.g. an externally-supplied cell layout) and snap each cell
/// into its nearest (row, column) slot. A cell whose bottom-left corner
/// does not land within `tolerance` of a boundary on either axis is
/// dropped.
pub fn build_grid_from_cells(input_cells: &[Rectangle], tolerance: f64) -> Grid {
    let ys = input_cells.iter().flat_map(|r| [r.bottom(), r.top()]);
    let xs = input_cells.iter().flat_map(|r| [r.left(), r.right()]);
    let rows = unique_sorted(ys, tolerance);
    let columns = unique_sorted(xs, tolerance);

    let r = rows.len().saturating_sub(1);
    let c = columns.len().saturating_sub(1);
    let mut cells_by_rc: Vec<Vec<Option<Cell>>> = vec![vec![None; c]; r];

    for rect in input_cells {
        let (Some(row_asc), Some(col_idx)) = (
            nearest_index(&rows, rect.bottom(), tolerance),
            nearest_index(&columns, rect.left(), tolerance),
        ) else {
            continue;
        };
        if row_asc >= r || col_idx >= c {
            continue;
        }
        let tr = r - 1 - row_asc;
        cells_by_rc[tr][col_idx] = Some(Cell {
            row: tr,
            column: col_idx,
            bounds: *rect,
        });
    }

    let cells = cells_by_rc
        .into_iter()
        .map(|row| row.into_iter().flatten().collect())
        .collect();
    Grid { rows, columns, cells }
}

fn nearest_index(sorted: &[f64], value: f64, tolerance: f64) -> Option<usize> {
    sorted.iter().position(|&v| (v - value).abs() <= tolerance)
}

fn build_full_cells(rows: &[f64], columns: &[f64]) -> Vec<Vec<Cell>> {
    let r = rows.len() - 1;
    let c = columns.len() - 1;
    let mut cells = Vec::with_capacity(r);
    for tr in 0..r {
        let y_top = rows[r - tr];
        let y_bot = rows[r - tr - 1];
        let mut row_cells = Vec::with_capacity(c);
        for tc in 0..c {
            let x_left = columns[tc];
            let x_right = columns[tc + 1];
            row_cells.push(Cell {
                row: tr,
                column: tc,
                bounds: Rectangle::new(x_left, y_bot, x_right - x_left, y_top - y_bot),
            });
        }
        cells.push(row_cells);
    }
    cells
}

fn unique_sorted(values: impl Iterator<Item = f64>, tolerance: f64) -> Vec<f64> {
    let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for v in values {
        let key = (v / tolerance).round() as i64;
        buckets.entry(key).or_default().push(v);
    }
    let mut out: Vec<f64> = buckets
        .into_values()
        .map(|vs| vs.iter().sum::<f64>() / vs.len() as f64)
        .collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geometry::Point;

    fn h(y: f64, x0: f64, x1: f64) -> RulingLine {
        RulingLine {
            start: Point::new(x0, y),
            end: Point::new(x1, y),
            is_horizontal: true,
        }
    }
    fn v(x: f64, y0: f64, y1: f64) -> RulingLine {
        RulingLine {
            start: Point::new(x, y0),
            end: Point::new(x, y1),
            is_horizontal: false,
        }
    }

    #[test]
    fn two_by_two_lines_build_a_single_cell_grid() {
        let lines = vec![h(0.0, 0.0, 100.0), h(50.0, 0.0, 100.0), v(0.0, 0.0, 50.0), v(100.0, 0.0, 50.0)];
        let grid = from_lines(&lines, 2.0).unwrap();
        assert_eq!(grid.row_count(), 1);
        assert_eq!(grid.column_count(), 1);
        assert_eq!(grid.cells[0][0].bounds, Rectangle::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn insufficient_lines_is_an_error() {
        let lines = vec![h(0.0, 0.0, 100.0), v(0.0, 0.0, 50.0)];
        assert!(from_lines(&lines, 2.0).is_err());
    }

    #[test]
    fn cells_are_indexed_top_down() {
        let lines = vec![
            h(0.0, 0.0, 100.0),
            h(50.0, 0.0, 100.0),
            h(100.0, 0.0, 100.0),
            v(0.0, 0.0, 100.0),
            v(100.0, 0.0, 100.0),
        ];
        let grid = from_lines(&lines, 2.0).unwrap();
        assert_eq!(grid.row_count(), 2);
        // Row 0 must be the topmost band: y in [50, 100].
        assert_eq!(grid.cells[0][0].bounds.bottom(), 50.0);
        assert_eq!(grid.cells[1][0].bounds.bottom(), 0.0);
    }

    #[test]
    fn build_grid_from_cells_snaps_rectangles_into_slots() {
        let cells = vec![
            Rectangle::new(0.0, 0.0, 50.0, 50.0),
            Rectangle::new(50.0, 0.0, 50.0, 50.0),
            Rectangle::new(0.0, 50.0, 50.0, 50.0),
            Rectangle::new(50.0, 50.0, 50.0, 50.0),
        ];
        let grid = build_grid_from_cells(&cells, 2.0);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 2);
    }

    #[test]
    fn grid_usability_rejects_tiny_bounds() {
        let lines = vec![h(0.0, 0.0, 10.0), h(5.0, 0.0, 10.0), v(0.0, 0.0, 5.0), v(10.0, 0.0, 5.0)];
        let grid = from_lines(&lines, 2.0).unwrap();
        assert!(!grid.is_usable());
    }
}
