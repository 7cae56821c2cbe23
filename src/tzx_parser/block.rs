//! The closed set of TZX block variants

use super::data::{DirectRecording, PureData, StandardSpeedData, TurboSpeedData};
use super::info::{ArchiveInfo, GroupStart, HardwareType, MessageBlock, Pause, TextDescription};
use super::tone::{PulseSequence, PureTone};
use super::{BlockField, BlockId, ParseResult};
use crate::pulse::Pulse;
use nom::combinator::map;

/// One decoded tape block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// ID 0x10
    StandardSpeedData(StandardSpeedData),
    /// ID 0x11
    TurboSpeedData(TurboSpeedData),
    /// ID 0x12
    PureTone(PureTone),
    /// ID 0x13
    PulseSequence(PulseSequence),
    /// ID 0x14
    PureData(PureData),
    /// ID 0x15
    DirectRecording(DirectRecording),
    /// ID 0x20
    Pause(Pause),
    /// ID 0x21
    GroupStart(GroupStart),
    /// ID 0x22
    GroupEnd,
    /// ID 0x30
    TextDescription(TextDescription),
    /// ID 0x31
    MessageBlock(MessageBlock),
    /// ID 0x32
    ArchiveInfo(ArchiveInfo),
    /// ID 0x33
    HardwareType(HardwareType),
}

impl Block {
    /// Decode the body of a block whose tag has already been consumed.
    ///
    /// Returns the remaining input positioned at the next tag.
    pub fn decode(id: BlockId, input: &[u8]) -> ParseResult<'_, Block> {
        match id {
            BlockId::StandardSpeed => {
                map(StandardSpeedData::parse, Block::StandardSpeedData)(input)
            }
            BlockId::TurboSpeed => map(TurboSpeedData::parse, Block::TurboSpeedData)(input),
            BlockId::PureTone => map(PureTone::parse, Block::PureTone)(input),
            BlockId::PulseSequence => map(PulseSequence::parse, Block::PulseSequence)(input),
            BlockId::PureData => map(PureData::parse, Block::PureData)(input),
            BlockId::DirectRec => map(DirectRecording::parse, Block::DirectRecording)(input),
            BlockId::Pause => map(Pause::parse, Block::Pause)(input),
            BlockId::GroupStart => map(GroupStart::parse, Block::GroupStart)(input),
            BlockId::GroupEnd => Ok((input, Block::GroupEnd)),
            BlockId::Text => map(TextDescription::parse, Block::TextDescription)(input),
            BlockId::Message => map(MessageBlock::parse, Block::MessageBlock)(input),
            BlockId::Archive => map(ArchiveInfo::parse, Block::ArchiveInfo)(input),
            BlockId::Hardware => map(HardwareType::parse, Block::HardwareType)(input),
        }
    }

    /// Block type
    pub fn id(&self) -> BlockId {
        match self {
            Block::StandardSpeedData(_) => BlockId::StandardSpeed,
            Block::TurboSpeedData(_) => BlockId::TurboSpeed,
            Block::PureTone(_) => BlockId::PureTone,
            Block::PulseSequence(_) => BlockId::PulseSequence,
            Block::PureData(_) => BlockId::PureData,
            Block::DirectRecording(_) => BlockId::DirectRec,
            Block::Pause(_) => BlockId::Pause,
            Block::GroupStart(_) => BlockId::GroupStart,
            Block::GroupEnd => BlockId::GroupEnd,
            Block::TextDescription(_) => BlockId::Text,
            Block::MessageBlock(_) => BlockId::Message,
            Block::ArchiveInfo(_) => BlockId::Archive,
            Block::HardwareType(_) => BlockId::Hardware,
        }
    }

    /// Tag byte as stored in the file
    pub fn tag(&self) -> u8 {
        self.id().into()
    }

    /// Human readable block type name
    pub fn name(&self) -> &'static str {
        self.id().name()
    }

    /// Descriptive `(label, value)` pairs, in display order
    pub fn fields(&self) -> Vec<BlockField> {
        match self {
            Block::StandardSpeedData(b) => b.fields(),
            Block::TurboSpeedData(b) => b.fields(),
            Block::PureTone(b) => b.fields(),
            Block::PulseSequence(b) => b.fields(),
            Block::PureData(b) => b.fields(),
            Block::DirectRecording(b) => b.fields(),
            Block::Pause(b) => b.fields(),
            Block::GroupStart(b) => b.fields(),
            Block::GroupEnd => Vec::new(),
            Block::TextDescription(b) => b.fields(),
            Block::MessageBlock(b) => b.fields(),
            Block::ArchiveInfo(b) => b.fields(),
            Block::HardwareType(b) => b.fields(),
        }
    }

    /// Half-waves produced by this block, in emission order.
    ///
    /// Descriptive blocks and pauses produce no pulses.
    pub fn pulses(&self) -> Vec<Pulse> {
        match self {
            Block::StandardSpeedData(b) => b.pulses(),
            Block::TurboSpeedData(b) => b.pulses(),
            Block::PureTone(b) => b.pulses(),
            Block::PulseSequence(b) => b.pulses(),
            Block::PureData(b) => b.pulses(),
            Block::DirectRecording(b) => b.pulses(),
            Block::Pause(_)
            | Block::GroupStart(_)
            | Block::GroupEnd
            | Block::TextDescription(_)
            | Block::MessageBlock(_)
            | Block::ArchiveInfo(_)
            | Block::HardwareType(_) => Vec::new(),
        }
    }

    /// Silence following this block, in milliseconds
    pub fn pause_duration(&self) -> u32 {
        let ms = match self {
            Block::StandardSpeedData(b) => b.pause_ms,
            Block::TurboSpeedData(b) => b.pause_ms,
            Block::PureData(b) => b.pause_ms,
            Block::DirectRecording(b) => b.pause_ms,
            Block::Pause(b) => b.duration_ms,
            Block::PureTone(_)
            | Block::PulseSequence(_)
            | Block::GroupStart(_)
            | Block::GroupEnd
            | Block::TextDescription(_)
            | Block::MessageBlock(_)
            | Block::ArchiveInfo(_)
            | Block::HardwareType(_) => 0,
        };
        u32::from(ms)
    }
}
