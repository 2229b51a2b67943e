//! Image extraction (L6): walk page resources, find Image XObjects, and
//! hand back raw-pixel-bearing value objects.

pub mod extractor;

pub use extractor::{extract_images, Image};
