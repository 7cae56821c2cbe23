//! TZX tape image loading
//!
//! Layout: `"ZXTape!"` signature, 0x1A end-of-text marker, major and minor
//! version bytes, then tag-prefixed blocks until the end of the file.

use super::{BlockSummary, TapeInfo};
use crate::tzx_parser::{Block, TzxParser};
use crate::{Result, TapeError};
use log::info;
use std::fs;
use std::path::Path;

/// File signature
pub const TZX_SIGNATURE: &[u8; 7] = b"ZXTape!";
/// Marker byte following the signature
pub const TZX_EOF_MARKER: u8 = 0x1A;
/// Size of the file header
pub const TAPE_HEADER_LEN: usize = 10;

/// TZX file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeHeader {
    /// Major format version
    pub major: u8,
    /// Minor format version
    pub minor: u8,
}

impl TapeHeader {
    /// Validate and decode the 10-byte header
    pub fn parse(data: &[u8]) -> Result<TapeHeader> {
        if data.len() < TAPE_HEADER_LEN {
            return Err(TapeError::TruncatedInput {
                context: "TZX header",
                offset: data.len(),
            });
        }
        if &data[0..7] != TZX_SIGNATURE {
            return Err(TapeError::MalformedHeader(
                "not a valid TZX file (no TZX signature in header)".into(),
            ));
        }
        if data[7] != TZX_EOF_MARKER {
            return Err(TapeError::MalformedHeader(
                "not a valid TZX file (end of text file marker not found in header)".into(),
            ));
        }
        Ok(TapeHeader {
            major: data[8],
            minor: data[9],
        })
    }

    /// Version as `major.minor`
    pub fn version(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

/// A decoded tape: header plus blocks in file order. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeImage {
    header: TapeHeader,
    blocks: Vec<Block>,
    source_name: String,
}

impl TapeImage {
    /// Load and decode a TZX file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        Self::from_bytes(&data, path.display().to_string())
    }

    /// Decode a TZX image held in memory.
    ///
    /// Fails on the first header, tag or field error; no partial tape is returned.
    pub fn from_bytes(data: &[u8], source_name: impl Into<String>) -> Result<Self> {
        let source_name = source_name.into();
        let header = TapeHeader::parse(data)?;
        let blocks = TzxParser::parse_blocks(&data[TAPE_HEADER_LEN..], TAPE_HEADER_LEN)?;

        info!(
            "loaded '{}': TZX {}, {} blocks",
            source_name,
            header.version(),
            blocks.len()
        );

        Ok(TapeImage {
            header,
            blocks,
            source_name,
        })
    }

    /// File header
    pub fn header(&self) -> TapeHeader {
        self.header
    }

    /// Blocks in file order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Name the tape was loaded from
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Version and per-block descriptions
    pub fn info(&self) -> TapeInfo {
        TapeInfo {
            version: self.header.version(),
            blocks: self
                .blocks
                .iter()
                .enumerate()
                .map(|(i, block)| BlockSummary {
                    number: i + 1,
                    id: format!("{:x}", block.tag()),
                    name: block.name().to_string(),
                    fields: block.fields(),
                })
                .collect(),
        }
    }
}
