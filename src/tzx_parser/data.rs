//! Data carrying blocks: standard speed, turbo speed, pure data and direct recording

use super::{field, BlockField, ParseResult};
use crate::pulse::{LoaderTiming, Pulse, PulseTrain};
use nom::bytes::complete::take;
use nom::number::complete::{le_u16, le_u24, le_u8};

fn flag_field(data: &[u8]) -> BlockField {
    match data.first() {
        Some(flag) => field("Data flag byte", format!("{:x}", flag)),
        None => field("Data flag byte", "-"),
    }
}

fn pause_field(pause_ms: u16) -> BlockField {
    field("Pause after block", format!("{} ms", pause_ms))
}

/// Standard Speed Data Block (ID 0x10): ROM loader timings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardSpeedData {
    /// Pause after this block in ms
    pub pause_ms: u16,
    /// Block data, flag byte included
    pub data: Vec<u8>,
}

impl StandardSpeedData {
    /// Decode `pause(u16) size(u16) data[size]`
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, pause_ms) = le_u16(input)?;
        let (input, size) = le_u16(input)?;
        let (input, data) = take(usize::from(size))(input)?;
        Ok((
            input,
            StandardSpeedData {
                pause_ms,
                data: data.to_vec(),
            },
        ))
    }

    /// First data byte, which selects the header or data pilot length
    pub fn flag(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Pilot, sync, data and trailer pulses with ROM timings.
    ///
    /// An empty block is treated as carrying a header flag (long pilot).
    pub fn pulses(&self) -> Vec<Pulse> {
        let timing = LoaderTiming::standard(self.flag().unwrap_or(0));
        let mut train = PulseTrain::with_capacity(timing.pilot_count + 66 + self.data.len() * 16);
        train.rom_loader_block(&timing, &self.data);
        train.into_pulses()
    }

    /// Descriptive fields
    pub fn fields(&self) -> Vec<BlockField> {
        vec![
            pause_field(self.pause_ms),
            field("Data length", self.data.len()),
            flag_field(&self.data),
        ]
    }
}

/// Turbo Speed Data Block (ID 0x11): same layout as the standard block
/// with every timing stored in the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurboSpeedData {
    /// Pilot pulse length
    pub pilot_pulse: u16,
    /// 1st sync pulse length
    pub sync1: u16,
    /// 2nd sync pulse length
    pub sync2: u16,
    /// Zero bit pulse length
    pub zero: u16,
    /// One bit pulse length
    pub one: u16,
    /// Number of pilot pulses
    pub pilot_count: u16,
    /// Used bits in the last data byte (decoded, not applied to the signal)
    pub last_byte_bits: u8,
    /// Pause after this block in ms
    pub pause_ms: u16,
    /// Block data
    pub data: Vec<u8>,
}

impl TurboSpeedData {
    /// Decode the turbo block fields, data size being 24 bits wide
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, pilot_pulse) = le_u16(input)?;
        let (input, sync1) = le_u16(input)?;
        let (input, sync2) = le_u16(input)?;
        let (input, zero) = le_u16(input)?;
        let (input, one) = le_u16(input)?;
        let (input, pilot_count) = le_u16(input)?;
        let (input, last_byte_bits) = le_u8(input)?;
        let (input, pause_ms) = le_u16(input)?;
        let (input, size) = le_u24(input)?;
        let (input, data) = take(size as usize)(input)?;
        Ok((
            input,
            TurboSpeedData {
                pilot_pulse,
                sync1,
                sync2,
                zero,
                one,
                pilot_count,
                last_byte_bits,
                pause_ms,
                data: data.to_vec(),
            },
        ))
    }

    /// Timings taken from the block fields
    pub fn timing(&self) -> LoaderTiming {
        LoaderTiming {
            pilot: u32::from(self.pilot_pulse),
            pilot_count: usize::from(self.pilot_count),
            sync1: u32::from(self.sync1),
            sync2: u32::from(self.sync2),
            zero: u32::from(self.zero),
            one: u32::from(self.one),
        }
    }

    /// Pilot, sync, data and trailer pulses. Every bit of the last byte is
    /// emitted regardless of `last_byte_bits`.
    pub fn pulses(&self) -> Vec<Pulse> {
        let timing = self.timing();
        let mut train = PulseTrain::with_capacity(timing.pilot_count + 66 + self.data.len() * 16);
        train.rom_loader_block(&timing, &self.data);
        train.into_pulses()
    }

    /// Descriptive fields
    pub fn fields(&self) -> Vec<BlockField> {
        vec![
            field("PILOT pulse length", self.pilot_pulse),
            field("SYNC first pulse length", self.sync1),
            field("SYNC second pulse length", self.sync2),
            field("ZERO bit pulse length", self.zero),
            field("ONE bit pulse length", self.one),
            field("PILOT tone length", self.pilot_count),
            field("Used bits in last byte", self.last_byte_bits),
            pause_field(self.pause_ms),
            field("Data length", self.data.len()),
            flag_field(&self.data),
        ]
    }
}

/// Pure Data Block (ID 0x14): data bits only, no pilot or sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PureData {
    /// Zero bit pulse length
    pub zero: u16,
    /// One bit pulse length
    pub one: u16,
    /// Used bits in the last data byte
    pub last_byte_bits: u8,
    /// Pause after this block in ms
    pub pause_ms: u16,
    /// Block data
    pub data: Vec<u8>,
}

impl PureData {
    /// Decode `zero(u16) one(u16) bits(u8) pause(u16) size(u24) data[size]`
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, zero) = le_u16(input)?;
        let (input, one) = le_u16(input)?;
        let (input, last_byte_bits) = le_u8(input)?;
        let (input, pause_ms) = le_u16(input)?;
        let (input, size) = le_u24(input)?;
        let (input, data) = take(size as usize)(input)?;
        Ok((
            input,
            PureData {
                zero,
                one,
                last_byte_bits,
                pause_ms,
                data: data.to_vec(),
            },
        ))
    }

    /// Two pulses per bit, most significant bit first. Each pair is always
    /// low then high.
    pub fn pulses(&self) -> Vec<Pulse> {
        let mut pulses = Vec::with_capacity(self.data.len() * 16);
        for &byte in &self.data {
            for bit in (0..8).rev() {
                let length = if byte & (1 << bit) != 0 {
                    self.one
                } else {
                    self.zero
                };
                pulses.push(Pulse::new(u32::from(length), false));
                pulses.push(Pulse::new(u32::from(length), true));
            }
        }
        pulses
    }

    /// Descriptive fields
    pub fn fields(&self) -> Vec<BlockField> {
        vec![
            field("ZERO bit pulse length", self.zero),
            field("ONE bit pulse length", self.one),
            field("Used bits in last byte", self.last_byte_bits),
            pause_field(self.pause_ms),
            field("Data length", self.data.len()),
        ]
    }
}

/// Direct Recording (ID 0x15): a one-bit-per-sample bitmap of the signal level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectRecording {
    /// Clock ticks per sample bit
    pub ticks_per_sample: u16,
    /// Pause after this block in ms
    pub pause_ms: u16,
    /// Used bits in the last sample byte
    pub last_byte_bits: u8,
    /// Sample bitmap, most significant bit first
    pub samples: Vec<u8>,
}

impl DirectRecording {
    /// Decode `ticks(u16) pause(u16) bits(u8) size(u24) samples[size]`
    pub fn parse(input: &[u8]) -> ParseResult<'_, Self> {
        let (input, ticks_per_sample) = le_u16(input)?;
        let (input, pause_ms) = le_u16(input)?;
        let (input, last_byte_bits) = le_u8(input)?;
        let (input, size) = le_u24(input)?;
        let (input, samples) = take(size as usize)(input)?;
        Ok((
            input,
            DirectRecording {
                ticks_per_sample,
                pause_ms,
                last_byte_bits,
                samples: samples.to_vec(),
            },
        ))
    }

    /// Run-length encode the bitmap: every run of equal bits becomes one pulse
    /// of `run * ticks_per_sample` ticks.
    pub fn pulses(&self) -> Vec<Pulse> {
        let ticks = u32::from(self.ticks_per_sample);
        let mut pulses = Vec::new();
        let mut current = Pulse::new(0, false);

        for &byte in &self.samples {
            for bit in (0..8).rev() {
                let level = byte & (1 << bit) != 0;
                if level != current.level {
                    if current.length > 0 {
                        pulses.push(current);
                    }
                    current = Pulse::new(0, level);
                }
                current.length = current.length.saturating_add(ticks);
            }
        }
        if current.length > 0 {
            pulses.push(current);
        }

        pulses
    }

    /// Descriptive fields
    pub fn fields(&self) -> Vec<BlockField> {
        vec![
            field("Number of T-states per sample", self.ticks_per_sample),
            pause_field(self.pause_ms),
            field("Used bits in last byte", self.last_byte_bits),
            field("Samples data length", self.samples.len()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::consts::*;

    #[test]
    fn test_standard_decode() {
        let input = [0xE8, 0x03, 0x03, 0x00, 0x00, 0x01, 0x02, 0x99];
        let (rest, block) = StandardSpeedData::parse(&input).unwrap();
        assert_eq!(rest, &[0x99]);
        assert_eq!(block.pause_ms, 1000);
        assert_eq!(block.data, vec![0x00, 0x01, 0x02]);
        assert_eq!(block.flag(), Some(0x00));
    }

    #[test]
    fn test_standard_header_pilot() {
        let block = StandardSpeedData {
            pause_ms: 0,
            data: vec![0x00],
        };
        let pulses = block.pulses();
        assert_eq!(pulses.len(), 8063 + 2 + 16 + 64);
        assert!(pulses[..8063]
            .iter()
            .all(|p| p.length == PILOT_PULSE_LENGTH));
        assert_eq!(pulses[8063].length, SYNC1_PULSE_LENGTH);
        assert_eq!(pulses[8064].length, SYNC2_PULSE_LENGTH);
        assert!(pulses[8065..8081]
            .iter()
            .all(|p| p.length == ZERO_PULSE_LENGTH));
        assert!(pulses[8081..].iter().all(|p| p.length == ONE_PULSE_LENGTH));
        assert!(!pulses[0].level);
    }

    #[test]
    fn test_standard_data_pilot() {
        let block = StandardSpeedData {
            pause_ms: 0,
            data: vec![0xFF],
        };
        let pilot = block
            .pulses()
            .iter()
            .take_while(|p| p.length == PILOT_PULSE_LENGTH)
            .count();
        assert_eq!(pilot, 3223);
    }

    #[test]
    fn test_standard_empty_data_uses_header_pilot() {
        let block = StandardSpeedData {
            pause_ms: 5,
            data: vec![],
        };
        assert_eq!(block.pulses().len(), 8063 + 2 + 64);
        assert_eq!(block.fields()[2].1, "-");
    }

    #[test]
    fn test_turbo_decode() {
        let input = [
            0x78, 0x08, // pilot 2168
            0x9B, 0x02, // sync1 667
            0xDF, 0x02, // sync2 735
            0x57, 0x03, // zero 855
            0xAE, 0x06, // one 1710
            0x7F, 0x1F, // pilot count 8063
            0x06, // last byte bits
            0xE8, 0x03, // pause 1000
            0x02, 0x00, 0x00, // size 2
            0xAA, 0x55,
        ];
        let (rest, block) = TurboSpeedData::parse(&input).unwrap();
        assert!(rest.is_empty());
        assert_eq!(block.pilot_pulse, 2168);
        assert_eq!(block.sync1, 667);
        assert_eq!(block.sync2, 735);
        assert_eq!(block.zero, 855);
        assert_eq!(block.one, 1710);
        assert_eq!(block.pilot_count, 8063);
        assert_eq!(block.last_byte_bits, 6);
        assert_eq!(block.pause_ms, 1000);
        assert_eq!(block.data, vec![0xAA, 0x55]);
    }

    #[test]
    fn test_turbo_size_is_24_bit() {
        let mut input = vec![0u8; 15];
        input.extend_from_slice(&[0x00, 0x00, 0x01]); // 65536 bytes
        input.extend(std::iter::repeat(0xFF).take(0x1_0000));
        let (rest, block) = TurboSpeedData::parse(&input).unwrap();
        assert!(rest.is_empty());
        assert_eq!(block.data.len(), 0x1_0000);
    }

    #[test]
    fn test_turbo_emits_all_bits_of_last_byte() {
        let block = TurboSpeedData {
            pilot_pulse: 100,
            sync1: 10,
            sync2: 20,
            zero: 30,
            one: 60,
            pilot_count: 4,
            last_byte_bits: 1,
            pause_ms: 0,
            data: vec![0x80],
        };
        let pulses = block.pulses();
        assert_eq!(pulses.len(), 4 + 2 + 16 + 64);
        assert_eq!(pulses[6].length, 60);
        assert_eq!(pulses[8].length, 30);
        assert_eq!(
            block.timing(),
            LoaderTiming {
                pilot: 100,
                pilot_count: 4,
                sync1: 10,
                sync2: 20,
                zero: 30,
                one: 60,
            }
        );
    }

    #[test]
    fn test_pure_data_decode_and_pairs() {
        let input = [0x10, 0x00, 0x20, 0x00, 0x08, 0x00, 0x00, 0x01, 0x00, 0x00, 0x40];
        let (rest, block) = PureData::parse(&input).unwrap();
        assert!(rest.is_empty());
        assert_eq!((block.zero, block.one), (16, 32));
        assert_eq!(block.last_byte_bits, 8);
        assert_eq!(block.pause_ms, 0);
        assert_eq!(block.data, vec![0x40]);

        let pulses = block.pulses();
        assert_eq!(pulses.len(), 16);
        for pair in pulses.chunks(2) {
            assert!(!pair[0].level);
            assert!(pair[1].level);
            assert_eq!(pair[0].length, pair[1].length);
        }
        assert_eq!(pulses[2].length, 32);
        assert_eq!(pulses[0].length, 16);
    }

    #[test]
    fn test_direct_recording_decode() {
        let input = [0x4F, 0x00, 0x64, 0x00, 0x08, 0x02, 0x00, 0x00, 0xF0, 0x0F];
        let (rest, block) = DirectRecording::parse(&input).unwrap();
        assert!(rest.is_empty());
        assert_eq!(block.ticks_per_sample, 79);
        assert_eq!(block.pause_ms, 100);
        assert_eq!(block.last_byte_bits, 8);
        assert_eq!(block.samples, vec![0xF0, 0x0F]);
    }

    #[test]
    fn test_direct_recording_run_length() {
        let block = DirectRecording {
            ticks_per_sample: 79,
            pause_ms: 0,
            last_byte_bits: 8,
            samples: vec![0b1110_0000, 0b0000_0001],
        };
        assert_eq!(
            block.pulses(),
            vec![
                Pulse::new(3 * 79, true),
                Pulse::new(12 * 79, false),
                Pulse::new(79, true)
            ]
        );
    }

    #[test]
    fn test_direct_recording_leading_low_run() {
        let block = DirectRecording {
            ticks_per_sample: 10,
            pause_ms: 0,
            last_byte_bits: 8,
            samples: vec![0x00, 0xFF],
        };
        assert_eq!(
            block.pulses(),
            vec![Pulse::new(80, false), Pulse::new(80, true)]
        );
    }
}
