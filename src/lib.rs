//! pdf-tables - PDF content extraction with table reconstruction.
//!
//! Reads binary PDF files and exposes their logical content (text, images,
//! graphics), then reconstructs higher-level structures — most notably
//! tables — that are not represented natively in the PDF file format.

pub mod codec;
pub mod document;
pub mod error;
pub mod font;
pub mod image;
pub mod interp;
pub mod layout;
pub mod model;
pub mod parser;

pub use document::{Page, Reader};
pub use error::{PdfError, Result};
pub use image::Image;
pub use layout::{
    Alignment, Cell, Grid, RulingLine, Table, TableCell, TableDetectionMode, TableRegion,
};
pub use model::geometry::{Color, Matrix, Point, Rectangle};
pub use model::objects::{PDFObjRef, PDFObject, PDFStream};
pub use model::state::{GraphicsElement, GraphicsKind, TextElement};
