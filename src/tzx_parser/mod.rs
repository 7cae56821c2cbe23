//! TZX Block Decoding
//!
//! A TZX image body is a sequence of blocks, each introduced by a one-byte tag.
//! The supported tags form a closed set; every tag maps to one [`Block`] variant:
//! - Data: standard speed, turbo speed, pure data, direct recording
//! - Tone: pure tone, pulse sequence
//! - Silence: pause
//! - Descriptive: group start/end, text description, message, archive info, hardware type
//!
//! All multi-byte integers are little-endian. Field decoding is done with nom
//! complete parsers, so a field running past the end of the data fails instead
//! of waiting for more input.

pub mod block;
pub mod data;
pub mod info;
pub mod tone;

pub use block::Block;
pub use data::{DirectRecording, PureData, StandardSpeedData, TurboSpeedData};
pub use info::{
    ArchiveInfo, ArchiveText, GroupStart, HardwareInfo, HardwareType, MessageBlock, Pause,
    TextDescription,
};
pub use tone::{PulseSequence, PureTone};

use crate::{Result, TapeError};
use log::debug;
use nom::bytes::complete::take;
use nom::number::complete::le_u8;
use nom::IResult;

/// nom result over a byte slice with the default error type
pub type ParseResult<'a, T> = IResult<&'a [u8], T>;

/// A descriptive `(label, value)` pair of a block
pub type BlockField = (String, String);

macro_rules! block_id {
    ($($id:ident = $n:literal => $name:literal),* $(,)?) => {
        /// Tag byte of a supported block type.
        #[repr(u8)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum BlockId {
            $(
                #[doc = $name]
                $id = $n
            ),*
        }

        impl BlockId {
            /// Human readable block type name
            pub fn name(self) -> &'static str {
                match self {
                    $(BlockId::$id => $name,)*
                }
            }
        }

        impl TryFrom<u8> for BlockId {
            /// The unrecognized tag
            type Error = u8;
            fn try_from(tag: u8) -> std::result::Result<Self, Self::Error> {
                match tag {
                    $($n => Ok(BlockId::$id),)*
                    _ => Err(tag)
                }
            }
        }
    };
}

block_id! {
    StandardSpeed = 0x10 => "Standard Speed Data Block",
    TurboSpeed    = 0x11 => "Turbo Speed Data Block",
    PureTone      = 0x12 => "Pure Tone",
    PulseSequence = 0x13 => "Pulse Sequence",
    PureData      = 0x14 => "Pure Data Block",
    DirectRec     = 0x15 => "Direct Recording",
    Pause         = 0x20 => "Pause (silence)",
    GroupStart    = 0x21 => "Group start",
    GroupEnd      = 0x22 => "Group end",
    Text          = 0x30 => "Text Description",
    Message       = 0x31 => "Message Block",
    Archive       = 0x32 => "Archive Info",
    Hardware      = 0x33 => "Hardware Type",
}

impl From<BlockId> for u8 {
    fn from(id: BlockId) -> u8 {
        id as u8
    }
}

/// Decodes the block sequence that follows the file header.
pub struct TzxParser;

impl TzxParser {
    /// Decode every block of `data`.
    ///
    /// `base_offset` is the file offset of `data[0]` and is only used to report
    /// error positions. Any unknown tag or short field aborts the whole decode.
    pub fn parse_blocks(data: &[u8], base_offset: usize) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut input = data;

        while let Some((&tag, body)) = input.split_first() {
            let offset = base_offset + (data.len() - input.len());
            let id = BlockId::try_from(tag)
                .map_err(|tag| TapeError::UnsupportedBlockType { tag, offset })?;

            let (rest, block) = Block::decode(id, body).map_err(|err| {
                let at = match &err {
                    nom::Err::Error(e) | nom::Err::Failure(e) => e.input.len(),
                    nom::Err::Incomplete(_) => 0,
                };
                TapeError::TruncatedInput {
                    context: id.name(),
                    offset: base_offset + (data.len() - at),
                }
            })?;

            debug!(
                "block #{} {:#04x} '{}' at offset {} ({} bytes)",
                blocks.len() + 1,
                tag,
                id.name(),
                offset,
                input.len() - rest.len()
            );
            blocks.push(block);
            input = rest;
        }

        Ok(blocks)
    }
}

/// Decode Latin-1 text: every byte maps to the code point of the same value.
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Text prefixed with a one-byte length
pub(crate) fn short_text(input: &[u8]) -> ParseResult<'_, String> {
    let (input, len) = le_u8(input)?;
    let (input, bytes) = take(usize::from(len))(input)?;
    Ok((input, latin1(bytes)))
}

pub(crate) fn field(label: impl Into<String>, value: impl ToString) -> BlockField {
    (label.into(), value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_round_trip() {
        for tag in 0u8..=0xFF {
            if let Ok(id) = BlockId::try_from(tag) {
                assert_eq!(u8::from(id), tag);
            }
        }
        assert_eq!(BlockId::try_from(0x10), Ok(BlockId::StandardSpeed));
        assert_eq!(BlockId::try_from(0x33), Ok(BlockId::Hardware));
        assert_eq!(BlockId::try_from(0x18), Err(0x18));
        assert_eq!(BlockId::try_from(0x5A), Err(0x5A));
    }

    #[test]
    fn test_parse_sequence_keeps_order() {
        let data = [0x20, 0x64, 0x00, 0x22, 0x21, 0x01, b'A', 0x20, 0x01, 0x00];
        let blocks = TzxParser::parse_blocks(&data, 10).unwrap();
        let ids: Vec<BlockId> = blocks.iter().map(|b| b.id()).collect();
        assert_eq!(
            ids,
            vec![
                BlockId::Pause,
                BlockId::GroupEnd,
                BlockId::GroupStart,
                BlockId::Pause
            ]
        );
        assert_eq!(blocks[0].pause_duration(), 100);
        assert_eq!(blocks[3].pause_duration(), 1);
    }

    #[test]
    fn test_unknown_tag_aborts() {
        let data = [0x20, 0x00, 0x00, 0x5A, 0x00];
        match TzxParser::parse_blocks(&data, 10) {
            Err(TapeError::UnsupportedBlockType { tag, offset }) => {
                assert_eq!(tag, 0x5A);
                assert_eq!(offset, 13);
            }
            other => panic!("expected unsupported block type, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_field_reports_offset() {
        // standard speed block claiming 4 data bytes but carrying 1
        let data = [0x10, 0x00, 0x00, 0x04, 0x00, 0xFF];
        match TzxParser::parse_blocks(&data, 10) {
            Err(TapeError::TruncatedInput { context, offset }) => {
                assert_eq!(context, "Standard Speed Data Block");
                assert_eq!(offset, 15);
            }
            other => panic!("expected truncated input, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_size_field() {
        let data = [0x12, 0x10];
        assert!(matches!(
            TzxParser::parse_blocks(&data, 0),
            Err(TapeError::TruncatedInput { offset: 1, .. })
        ));
    }

    #[test]
    fn test_latin1_decoding() {
        assert_eq!(latin1(b"Abc"), "Abc");
        assert_eq!(latin1(&[0xA9, 0xE9]), "\u{a9}\u{e9}");
    }
}
