//! Error types for the pdf-tables crate.

use thiserror::Error;

/// Primary error type for PDF parsing, decoding and table-reconstruction
/// operations.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Malformed object, unbalanced container, unexpected token, truncated
    /// stream.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Unreadable xref section or an indirect reference that could not be
    /// resolved.
    #[error("xref error: {0}")]
    XrefError(String),

    /// Flate (zlib/deflate) decode failure.
    #[error("flate decode failed: {0}")]
    FlateDecodeFailed(String),

    /// DCT (JPEG) decode failure.
    #[error("dct decode failed: {0}")]
    DctDecodeFailed(String),

    /// DCT (JPEG) encode was given a buffer whose length does not match
    /// `width * height * components`.
    #[error("dct encode: buffer size {got} does not match expected {expected}")]
    DctEncodeBadSize { expected: usize, got: usize },

    /// A stream's `/Filter` named something this crate does not implement.
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Malformed CMap or Differences array. Recoverable: the font decoder
    /// degrades to its fallback chain rather than propagating this.
    #[error("font error: {0}")]
    FontError(String),

    /// A grid could not be built from the given ruling lines. Recoverable:
    /// callers fall back to stream-mode table detection.
    #[error("geometry error: {0}")]
    GeometryError(String),

    /// Out-of-range color component, non-positive dimensions, unknown page
    /// index, or other programmatic misuse of a public surface.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PdfError>;
