//! TZX File Loader Domain
//!
//! Handles reading tape images from disk or memory, validating the file
//! header and decoding the block sequence into a [`TapeImage`].

pub mod loader;

pub use loader::{TapeHeader, TapeImage, TAPE_HEADER_LEN, TZX_EOF_MARKER, TZX_SIGNATURE};

use crate::tzx_parser::BlockField;
use crate::Result;
use serde::Serialize;
use std::path::Path;

/// Summary of one block for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    /// 1-based position on the tape
    pub number: usize,
    /// Tag byte as lowercase hex
    pub id: String,
    /// Block type name
    pub name: String,
    /// Descriptive fields of the block
    pub fields: Vec<BlockField>,
}

/// Summary of a whole tape for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TapeInfo {
    /// Format version as `major.minor`
    pub version: String,
    /// Per-block summaries in tape order
    pub blocks: Vec<BlockSummary>,
}

/// Convenience function to load a TZX file from disk
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<TapeImage> {
    TapeImage::load(path)
}
