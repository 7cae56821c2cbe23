//! Silence and descriptive blocks
//!
//! None of these produce pulses; only [`Pause`] contributes trailing silence.

use super::{field, latin1, short_text, BlockField, ParseResult};
use nom::bytes::complete::take;
use nom::multi::count;
use nom::number::complete::{le_u16, le_u8};
use nom::sequence::tuple;

/// Pause (ID 0x20): silence of the given length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pause {
    /// Silence length in ms
    pub duration_ms: u16,
}

impl Pause {
    /// Decode `duration(u16)`
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, duration_ms) = le_u16(input)?;
        Ok((input, Pause { duration_ms }))
    }

    /// Descriptive fields
    pub fn fields(&self) -> Vec<BlockField> {
        vec![field("Duration", format!("{} ms", self.duration_ms))]
    }
}

/// Group Start (ID 0x21)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStart {
    /// Group name
    pub name: String,
}

impl GroupStart {
    /// Decode `len(u8) name[len]`
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, name) = short_text(input)?;
        Ok((input, GroupStart { name }))
    }

    /// Descriptive fields
    pub fn fields(&self) -> Vec<BlockField> {
        vec![field("Name", &self.name)]
    }
}

/// Text Description (ID 0x30)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDescription {
    /// Description text
    pub text: String,
}

impl TextDescription {
    /// Decode `len(u8) text[len]`
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, text) = short_text(input)?;
        Ok((input, TextDescription { text }))
    }

    /// Descriptive fields
    pub fn fields(&self) -> Vec<BlockField> {
        vec![field("Description", &self.text)]
    }
}

/// Message Block (ID 0x31): text meant to be shown for a while during playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBlock {
    /// Display time in seconds
    pub display_seconds: u8,
    /// Message text
    pub message: String,
}

impl MessageBlock {
    /// Decode `time(u8) len(u8) text[len]`
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, display_seconds) = le_u8(input)?;
        let (input, message) = short_text(input)?;
        Ok((
            input,
            MessageBlock {
                display_seconds,
                message,
            },
        ))
    }

    /// Descriptive fields
    pub fn fields(&self) -> Vec<BlockField> {
        vec![
            field("Display duration", format!("{} s", self.display_seconds)),
            field("Message", &self.message),
        ]
    }
}

/// One text record of an [`ArchiveInfo`] block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveText {
    /// Text identification byte
    pub id: u8,
    /// Decoded text
    pub text: String,
}

impl ArchiveText {
    /// Name of the text id
    pub fn label(&self) -> String {
        match self.id {
            0x00 => "Full title".into(),
            0x01 => "Software house/publisher".into(),
            0x02 => "Author(s)".into(),
            0x03 => "Year of publication".into(),
            0x04 => "Language".into(),
            0x05 => "Game/utility type".into(),
            0x06 => "Price".into(),
            0x07 => "Protection scheme/loader".into(),
            0x08 => "Origin".into(),
            0xFF => "Comment(s)".into(),
            id => format!("Unknown (0x{:02X})", id),
        }
    }

    fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, (id, len)) = tuple((le_u8, le_u8))(input)?;
        let (input, bytes) = take(usize::from(len))(input)?;
        Ok((
            input,
            ArchiveText {
                id,
                text: latin1(bytes),
            },
        ))
    }
}

/// Archive Info (ID 0x32): title, publisher, author and similar texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    /// Length of the remaining block as stored in the file
    pub block_length: u16,
    /// Text records in file order
    pub texts: Vec<ArchiveText>,
}

impl ArchiveInfo {
    /// Decode `length(u16) count(u8)` followed by `count` text records
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, block_length) = le_u16(input)?;
        let (input, n) = le_u8(input)?;
        let (input, texts) = count(ArchiveText::parse, usize::from(n))(input)?;
        Ok((
            input,
            ArchiveInfo {
                block_length,
                texts,
            },
        ))
    }

    /// One field per text record
    pub fn fields(&self) -> Vec<BlockField> {
        self.texts
            .iter()
            .map(|t| field(t.label(), &t.text))
            .collect()
    }
}

/// One machine record of a [`HardwareType`] block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareInfo {
    /// Hardware category
    pub kind: u8,
    /// Hardware id within the category
    pub id: u8,
    /// How the tape relates to this hardware
    pub usage: u8,
}

impl HardwareInfo {
    /// Category name
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            0x00 => "Computers",
            0x01 => "External storage",
            0x02 => "ROM/RAM type add-ons",
            0x03 => "Sound devices",
            0x04 => "Joysticks",
            0x05 => "Mice",
            0x06 => "Other controllers",
            0x07 => "Serial ports",
            0x08 => "Parallel ports",
            0x09 => "Printers",
            0x0A => "Modems",
            0x0B => "Digitizers",
            0x0C => "Network adapters",
            0x0D => "Keyboards & keypads",
            0x0E => "AD/DA converters",
            0x0F => "EPROM programmers",
            0x10 => "Graphics",
            _ => "Unknown",
        }
    }

    /// Usage description
    pub fn usage_name(&self) -> &'static str {
        match self.usage {
            0 => "runs on this machine or with this hardware",
            1 => "uses the special features of this hardware",
            2 => "runs but does not use the special features",
            3 => "does not run on this machine or with this hardware",
            _ => "unknown usage",
        }
    }
}

/// Hardware Type (ID 0x33)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareType {
    /// Machine records in file order
    pub machines: Vec<HardwareInfo>,
}

impl HardwareType {
    /// Decode `count(u8)` followed by `count` 3-byte records
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, n) = le_u8(input)?;
        let (input, records) = count(tuple((le_u8, le_u8, le_u8)), usize::from(n))(input)?;
        let machines = records
            .into_iter()
            .map(|(kind, id, usage)| HardwareInfo { kind, id, usage })
            .collect();
        Ok((input, HardwareType { machines }))
    }

    /// One field per machine record
    pub fn fields(&self) -> Vec<BlockField> {
        self.machines
            .iter()
            .map(|m| {
                field(
                    m.kind_name(),
                    format!("id 0x{:02X}, {}", m.id, m.usage_name()),
                )
            })
            .collect()
    }
}
