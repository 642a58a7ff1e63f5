//! Low-level PDF construction
//!
//! Builds documents page by page: fixed-size pages, full-page raster
//! backgrounds, and positioned text runs with embedded TrueType faces
//! (Identity-H, whole font files). Fonts and resource dictionaries are
//! finalized at save time, once every rendered character is known.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, PdfDocument};
//!
//! let mut doc = PdfDocument::new();
//! doc.add_page(595.0, 842.0);
//! doc.add_font("amiri", &std::fs::read("Amiri-Regular.ttf")?)?;
//! doc.set_font("amiri", 12.0)?;
//! doc.insert_text("registration", 1, 100.0, 100.0, Align::Left)?;
//! doc.save("output.pdf")?;
//! ```

mod document;
mod font;
mod image;
mod text;

pub use document::{Color, PdfDocument};
pub use font::{FontData, FontFamily, FontFamilyBuilder, FontWeight};
pub use text::{generate_text_operators, TextRenderContext};

use thiserror::Error;

/// Errors raised while building a document
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("could not serialize the document: {0}")]
    SaveError(String),

    #[error("no font registered as {0:?}")]
    FontNotFound(String),

    #[error("a font is already registered as {0:?}")]
    FontAlreadyExists(String),

    #[error("unusable font data: {0}")]
    FontParseError(String),

    #[error("page {0} does not exist ({1} pages)")]
    InvalidPage(usize, usize),

    #[error("unusable image data: {0}")]
    ImageError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("pdf object error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// How the anchor X of a text draw is interpreted
///
/// `Right` means the run ends at the anchor, which is how
/// right-to-left fields are pinned to their rightmost edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_default() {
        assert_eq!(Align::default(), Align::Left);
    }
}
