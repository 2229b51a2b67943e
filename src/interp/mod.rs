//! Graphics/text state engine (L4): turns a parsed operator sequence into
//! text and graphics elements.

pub mod engine;

pub use engine::{interpret, FontEntry, FontMetrics, Fonts};
