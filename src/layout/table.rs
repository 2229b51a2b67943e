//! Table extractor (L12): dispatches a [`TableRegion`] to the lattice or
//! stream cell-extraction path and assembles the final [`Table`].

use crate::error::{PdfError, Result};
use crate::model::geometry::Rectangle;
use crate::model::state::TextElement;

use super::cell::{self, Alignment};
use super::detector::{TableDetectionMode, TableRegion};

/// One extracted cell: its logical (row, col), its displayed text, its
/// page-space bounds and its inferred alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub row: usize,
    pub col: usize,
    pub text: String,
    pub bounds: Rectangle,
    pub alignment: Alignment,
}

/// A fully extracted table: `cells[0]` is the topmost row, matching
/// [`super::grid::Grid`]'s indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub method: TableDetectionMode,
    pub bounds: Rectangle,
    pub row_count: usize,
    pub col_count: usize,
    pub cells: Vec<Vec<TableCell>>,
}

fn avg_font_size(elements: &[TextElement]) -> f64 {
    if elements.is_empty() {
        return 1.0;
    }
    elements.iter().map(|e| e.font_size).sum::<f64>() / elements.len() as f64
}

/// Extract a [`Table`] from a detected region, dispatching on its
/// detection method.
pub fn extract_table(region: &TableRegion, text_elements: &[TextElement]) -> Result<Table> {
    match region.method {
        TableDetectionMode::Lattice => extract_lattice(region, text_elements),
        TableDetectionMode::Stream => extract_stream(region, text_elements),
    }
}

fn extract_lattice(region: &TableRegion, text_elements: &[TextElement]) -> Result<Table> {
    let grid = region
        .grid
        .as_ref()
        .ok_or_else(|| PdfError::InvalidArgument("lattice table region is missing its grid".into()))?;
    let afs = avg_font_size(text_elements);

    let cells = grid
        .cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|c| TableCell {
                    row: c.row,
                    col: c.column,
                    text: cell::extract_cell_content(c.bounds, text_elements, afs),
                    bounds: c.bounds,
                    alignment: cell::infer_alignment(c.bounds, text_elements),
                })
                .collect()
        })
        .collect();

    Ok(Table {
        method: TableDetectionMode::Lattice,
        bounds: region.bounds,
        row_count: grid.row_count(),
        col_count: grid.column_count(),
        cells,
    })
}

/// Stream extraction indexes its row/column boundary arrays directly:
/// since `region.rows` is sorted ascending (bottom to top) but table rows
/// are numbered top-down, row `tr` pulls from `rows[R-tr]`/`rows[R-tr-1]`
/// — the same reversal [`super::grid::Grid`] applies internally when it
/// builds cells from a boundary array.
fn extract_stream(region: &TableRegion, text_elements: &[TextElement]) -> Result<Table> {
    if region.rows.len() < 2 || region.columns.len() < 2 {
        return Err(PdfError::InvalidArgument(
            "stream table region needs at least 2 row and 2 column boundaries".into(),
        ));
    }
    let r = region.rows.len() - 1;
    let c = region.columns.len() - 1;
    let afs = avg_font_size(text_elements);

    let mut cells = Vec::with_capacity(r);
    for tr in 0..r {
        let y_top = region.rows[r - tr];
        let y_bot = region.rows[r - tr - 1];
        let mut out_row = Vec::with_capacity(c);
        for tc in 0..c {
            let x_left = region.columns[tc];
            let x_right = region.columns[tc + 1];
            let bounds = Rectangle::new(x_left, y_bot, x_right - x_left, y_top - y_bot);
            out_row.push(TableCell {
                row: tr,
                col: tc,
                text: cell::extract_cell_content(bounds, text_elements, afs),
                bounds,
                alignment: cell::infer_alignment(bounds, text_elements),
            });
        }
        cells.push(out_row);
    }

    Ok(Table {
        method: TableDetectionMode::Stream,
        bounds: region.bounds,
        row_count: r,
        col_count: c,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::grid::Grid;

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
    fn stream_extraction_numbers_row_0_as_the_topmost_band() {
        let region = TableRegion {
            bounds: Rectangle::new(0.0, 0.0, 100.0, 60.0),
            method: TableDetectionMode::Stream,
            has_ruling_lines: false,
            grid: None,
            rows: vec![0.0, 30.0, 60.0],
            columns: vec![0.0, 50.0, 100.0],
        };
        let elements = vec![el("top-left", 10.0, 40.0, 30.0, 10.0), el("bottom-left", 10.0, 10.0, 30.0, 10.0)];
        let table = extract_table(&region, &elements).unwrap();
        assert_eq!(table.row_count, 2);
        assert_eq!(table.cells[0][0].text, "top-left");
        assert_eq!(table.cells[1][0].text, "bottom-left");
    }

    #[test]
    fn lattice_extraction_requires_a_grid() {
        let region = TableRegion {
            bounds: Rectangle::new(0.0, 0.0, 100.0, 100.0),
            method: TableDetectionMode::Lattice,
            has_ruling_lines: true,
            grid: None,
            rows: vec![],
            columns: vec![],
        };
        assert!(extract_table(&region, &[]).is_err());
    }

    #[test]
    fn lattice_extraction_populates_all_cells() {
        let grid = Grid {
            rows: vec![0.0, 50.0, 100.0],
            columns: vec![0.0, 50.0, 100.0],
            cells: vec![
                vec![
                    crate::layout::grid::Cell { row: 0, column: 0, bounds: Rectangle::new(0.0, 50.0, 50.0, 50.0) },
                    crate::layout::grid::Cell { row: 0, column: 1, bounds: Rectangle::new(50.0, 50.0, 50.0, 50.0) },
                ],
                vec![
                    crate::layout::grid::Cell { row: 1, column: 0, bounds: Rectangle::new(0.0, 0.0, 50.0, 50.0) },
                    crate::layout::grid::Cell { row: 1, column: 1, bounds: Rectangle::new(50.0, 0.0, 50.0, 50.0) },
                ],
            ],
        };
        let region = TableRegion {
            bounds: grid.bounds(),
            method: TableDetectionMode::Lattice,
            has_ruling_lines: true,
            rows: grid.rows.clone(),
            columns: grid.columns.clone(),
            grid: Some(grid),
        };
        let table = extract_table(&region, &[]).unwrap();
        assert_eq!(table.row_count, 2);
        assert_eq!(table.col_count, 2);
    }
}
