//! Template scans and fonts
//!
//! The generator is indifferent to where its assets come from: the
//! native build reads them from a directory, the wasm build gets them
//! pushed over the boundary into memory.

use crate::layout::Variant;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Typeface role used by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Regular,
    Bold,
    /// Dingbat face for checkbox ticks
    Symbol,
}

/// Errors raised while loading assets
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Source of template scans and font files
pub trait AssetSource {
    /// Scanned template image (JPEG or PNG) for a variant's page
    fn template(&self, variant: Variant, page: usize) -> Result<Vec<u8>, AssetError>;

    /// TrueType data for a typeface role
    fn font(&self, face: Face) -> Result<Vec<u8>, AssetError>;
}

/// Assets laid out in a directory
///
/// Expects `templates/{adult,minor}-page{n}.jpg` and
/// `fonts/{regular,bold,symbol}.ttf` under the root.
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn read(&self, path: PathBuf) -> Result<Vec<u8>, AssetError> {
        std::fs::read(&path).map_err(|source| AssetError::Read { path, source })
    }
}

impl AssetSource for DirAssets {
    fn template(&self, variant: Variant, page: usize) -> Result<Vec<u8>, AssetError> {
        let name = match variant {
            Variant::Adult => format!("adult-page{page}.jpg"),
            Variant::Minor => format!("minor-page{page}.jpg"),
        };
        self.read(self.root.join("templates").join(name))
    }

    fn font(&self, face: Face) -> Result<Vec<u8>, AssetError> {
        let name = match face {
            Face::Regular => "regular.ttf",
            Face::Bold => "bold.ttf",
            Face::Symbol => "symbol.ttf",
        };
        self.read(self.root.join("fonts").join(name))
    }
}

/// Assets held in memory
///
/// Used by the wasm bindings, where the browser fetches the files and
/// hands the bytes over, and by tests.
#[derive(Default)]
pub struct MemoryAssets {
    templates: HashMap<(Variant, usize), Vec<u8>>,
    fonts: HashMap<Face, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_template(&mut self, variant: Variant, page: usize, data: Vec<u8>) {
        self.templates.insert((variant, page), data);
    }

    pub fn insert_font(&mut self, face: Face, data: Vec<u8>) {
        self.fonts.insert(face, data);
    }
}

impl AssetSource for MemoryAssets {
    fn template(&self, variant: Variant, page: usize) -> Result<Vec<u8>, AssetError> {
        self.templates
            .get(&(variant, page))
            .cloned()
            .ok_or_else(|| AssetError::NotFound(format!("template {variant:?} page {page}")))
    }

    fn font(&self, face: Face) -> Result<Vec<u8>, AssetError> {
        self.fonts
            .get(&face)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(format!("font {face:?}")))
    }
}
