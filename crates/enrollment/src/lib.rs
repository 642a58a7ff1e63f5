//! Registration document generation
//!
//! Fills scanned registration templates for a sports club with the
//! data of a registration form. Two document variants exist: one for
//! adult players and one for minors registered by a guardian. The
//! variant is chosen from the player's date of birth, and each variant
//! has its own field layout over the scanned pages.
//!
//! # Example
//!
//! ```ignore
//! use enrollment::{DirAssets, Generator, RegistrationForm};
//!
//! let assets = DirAssets::new("assets");
//! let generator = Generator::new();
//! let form: RegistrationForm = serde_json::from_str(payload)?;
//! let doc = generator.generate(&form, None, "", &assets)?;
//! std::fs::write("registration.pdf", doc.bytes)?;
//! ```

pub mod assembler;
pub mod assets;
pub mod form;
pub mod layout;
pub mod placement;

pub use assembler::{ConfigurationWarning, GeneratedDocument, Generator};
pub use assets::{AssetError, AssetSource, DirAssets, Face, MemoryAssets};
pub use form::{
    age_on, apply_date_of_birth_change, classify, classify_at, variant_for, Classification,
    HardcodedValues, Kinship, RegistrationForm,
};
pub use layout::{Field, FieldPosition, Layout, Variant};

use thiserror::Error;

/// Errors that can occur while generating a document
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("a generation is already in progress")]
    Busy,

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("drawing {field:?}: {source}")]
    Draw {
        field: Field,
        source: pdf_core::PdfError,
    },

    #[error("pdf error: {0}")]
    Pdf(#[from] pdf_core::PdfError),
}

/// Result type for document generation
pub type Result<T> = std::result::Result<T, GenerateError>;
