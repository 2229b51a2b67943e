//! Table reconstruction (L7-L12): ruling-line detection, grid building,
//! whitespace/projection analysis, table detection, cell extraction and
//! final table assembly.

pub mod cell;
pub mod detector;
pub mod grid;
pub mod projection;
pub mod ruling;
pub mod table;

pub use cell::{extract_cell_content, find_elements_in_bounds, infer_alignment, Alignment};
pub use detector::{detect_mode, detect_tables, detect_tables_lattice, detect_tables_stream, TableDetectionMode, TableRegion};
pub use grid::{build_grid_from_cells, Cell, Grid};
pub use projection::{
    detect_columns_adaptive, detect_columns_hybrid, detect_columns_legacy, detect_rows, horizontal_profile,
    vertical_profile, vertical_overlap_ratio, ColumnParams, ProjectionProfile, RowParams,
};
pub use ruling::{detect_ruling_lines, find_intersections, RulingLine, RulingLineParams};
pub use table::{extract_table, Table, TableCell};
