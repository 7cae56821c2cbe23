//! Tone blocks: pure tone and pulse sequence

use super::{field, BlockField, ParseResult};
use crate::pulse::{Pulse, PulseTrain};
use nom::multi::count;
use nom::number::complete::{le_u16, le_u8};

/// Pure Tone (ID 0x12): `pulse_count` pulses of one length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PureTone {
    /// Length of each pulse
    pub pulse_length: u16,
    /// Number of pulses
    pub pulse_count: u16,
}

impl PureTone {
    /// Decode `length(u16) count(u16)`
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, pulse_length) = le_u16(input)?;
        let (input, pulse_count) = le_u16(input)?;
        Ok((
            input,
            PureTone {
                pulse_length,
                pulse_count,
            },
        ))
    }

    /// Alternating pulses starting low
    pub fn pulses(&self) -> Vec<Pulse> {
        let mut train = PulseTrain::with_capacity(usize::from(self.pulse_count));
        train.tone(u32::from(self.pulse_length), usize::from(self.pulse_count));
        train.into_pulses()
    }

    /// Descriptive fields
    pub fn fields(&self) -> Vec<BlockField> {
        vec![
            field("Pulse length", self.pulse_length),
            field("Number of pulses", self.pulse_count),
        ]
    }
}

/// Pulse Sequence (ID 0x13): up to 255 pulses of individual lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseSequence {
    /// Pulse lengths in emission order
    pub lengths: Vec<u16>,
}

impl PulseSequence {
    /// Decode `count(u8)` followed by `count` lengths
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, n) = le_u8(input)?;
        let (input, lengths) = count(le_u16, usize::from(n))(input)?;
        Ok((input, PulseSequence { lengths }))
    }

    /// The decoded lengths verbatim, alternating level starting low
    pub fn pulses(&self) -> Vec<Pulse> {
        let mut train = PulseTrain::with_capacity(self.lengths.len());
        for &length in &self.lengths {
            train.pulse(u32::from(length));
        }
        train.into_pulses()
    }

    /// Descriptive fields
    pub fn fields(&self) -> Vec<BlockField> {
        let mut fields = vec![field("Number of pulses", self.lengths.len())];
        fields.extend(
            self.lengths
                .iter()
                .enumerate()
                .map(|(i, length)| field(format!("Pulse {} length", i + 1), length)),
        );
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_tone_decode() {
        let (rest, block) = PureTone::parse(&[0x78, 0x08, 0x03, 0x00]).unwrap();
        assert!(rest.is_empty());
        assert_eq!(block.pulse_length, 2168);
        assert_eq!(block.pulse_count, 3);
        assert_eq!(
            block.pulses(),
            vec![
                Pulse::new(2168, false),
                Pulse::new(2168, true),
                Pulse::new(2168, false)
            ]
        );
    }

    #[test]
    fn test_pure_tone_zero_count() {
        let block = PureTone {
            pulse_length: 100,
            pulse_count: 0,
        };
        assert!(block.pulses().is_empty());
    }

    #[test]
    fn test_pulse_sequence_two_pulses() {
        let (rest, block) = PulseSequence::parse(&[0x02, 0x9B, 0x02, 0xDF, 0x02]).unwrap();
        assert!(rest.is_empty());
        assert_eq!(block.lengths, vec![667, 735]);
        assert_eq!(
            block.pulses(),
            vec![Pulse::new(667, false), Pulse::new(735, true)]
        );
        assert_eq!(block.fields().len(), 3);
    }

    #[test]
    fn test_pulse_sequence_truncated() {
        assert!(PulseSequence::parse(&[0x02, 0x9B, 0x02, 0xDF]).is_err());
    }
}
