#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Raw measurement file readers.
//!
//! Every reader yields the same [`soc_traits::Node`] tree so the extractor
//! never sees the on-disk format.
pub mod error;
pub mod json;
pub mod mat;

pub use error::{ReadError, Result};
pub use soc_traits::{Node, Variables};

use std::path::Path;

/// On-disk formats understood by [`read_variables`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// MATLAB level-5 MAT file (`.mat`).
    Mat,
    /// JSON mirror of the same nesting (`.json`).
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "mat" => Ok(Format::Mat),
            "json" => Ok(Format::Json),
            _ => Err(ReadError::UnsupportedFormat(ext)),
        }
    }
}

/// Read every top-level variable of a measurement file, dispatching on extension.
pub fn read_variables(path: &Path) -> Result<Variables> {
    let format = Format::from_path(path)?;
    tracing::debug!(path = %path.display(), ?format, "reading measurement file");
    match format {
        Format::Mat => mat::parse(&std::fs::read(path)?),
        Format::Json => json::parse(&std::fs::read_to_string(path)?),
    }
}
