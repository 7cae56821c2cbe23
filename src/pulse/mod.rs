//! Half-wave Signal Model
//!
//! A tape signal is reconstructed as a square wave: a sequence of [`Pulse`]s, each
//! a constant-level segment measured in ticks of the 3.5 MHz reference clock.
//! Block decoders emit pulses, the synthesizer turns them into samples.

/// ROM loader timings in clock ticks.
pub mod consts {
    /// Reference clock rate in ticks per second.
    pub const CLOCK_HZ: u32 = 3_500_000;
    /// Length of a pilot (lead) pulse.
    pub const PILOT_PULSE_LENGTH: u32 = 2168;
    /// Length of the 1st sync pulse.
    pub const SYNC1_PULSE_LENGTH: u32 = 667;
    /// Length of the 2nd sync pulse.
    pub const SYNC2_PULSE_LENGTH: u32 = 735;
    /// Length of each of the two pulses encoding a 0 bit.
    pub const ZERO_PULSE_LENGTH: u32 = 855;
    /// Length of each of the two pulses encoding a 1 bit.
    pub const ONE_PULSE_LENGTH: u32 = 1710;
    /// Pilot pulse count for a header block (flag byte < 128).
    pub const PILOT_PULSES_HEADER: u16 = 8063;
    /// Pilot pulse count for a data block (flag byte >= 128).
    pub const PILOT_PULSES_DATA: u16 = 3223;
    /// Number of one-bit pulse pairs appended after the data.
    pub const TRAILER_PAIRS: usize = 32;
}

/// One constant-level half-wave of the reconstructed signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pulse {
    /// Duration in clock ticks
    pub length: u32,
    /// `false` = low, `true` = high
    pub level: bool,
}

impl Pulse {
    /// Create a pulse
    pub const fn new(length: u32, level: bool) -> Self {
        Pulse { length, level }
    }
}

/// Builds a pulse sequence whose level alternates on every emitted pulse,
/// starting low.
#[derive(Debug, Default)]
pub struct PulseTrain {
    pulses: Vec<Pulse>,
    level: bool,
}

impl PulseTrain {
    /// Create an empty train starting at the low level
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty train with room for `capacity` pulses
    pub fn with_capacity(capacity: usize) -> Self {
        PulseTrain {
            pulses: Vec::with_capacity(capacity),
            level: false,
        }
    }

    /// Emit one pulse at the current level, then flip the level
    pub fn pulse(&mut self, length: u32) {
        self.pulses.push(Pulse::new(length, self.level));
        self.level = !self.level;
    }

    /// Emit `count` equal pulses
    pub fn tone(&mut self, length: u32, count: usize) {
        self.pulses.reserve(count);
        for _ in 0..count {
            self.pulse(length);
        }
    }

    /// Emit two equal pulses for every bit of `data`, most significant bit first.
    pub fn data_bits(&mut self, data: &[u8], zero: u32, one: u32) {
        self.pulses.reserve(data.len() * 16);
        for &byte in data {
            for bit in (0..8).rev() {
                let length = if byte & (1 << bit) != 0 { one } else { zero };
                self.pulse(length);
                self.pulse(length);
            }
        }
    }

    /// Full ROM-style encoding: pilot tone, two sync pulses, data bits and
    /// a trailer of one-bit pulse pairs.
    pub fn rom_loader_block(&mut self, timing: &LoaderTiming, data: &[u8]) {
        self.tone(timing.pilot, timing.pilot_count);
        self.pulse(timing.sync1);
        self.pulse(timing.sync2);
        self.data_bits(data, timing.zero, timing.one);
        self.tone(timing.one, consts::TRAILER_PAIRS * 2);
    }

    /// Number of pulses emitted so far
    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    /// Returns `true` if nothing was emitted
    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    /// Finish and return the pulses
    pub fn into_pulses(self) -> Vec<Pulse> {
        self.pulses
    }
}

/// Pulse lengths and pilot count of a pilot/sync/data encoded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderTiming {
    /// Pilot pulse length
    pub pilot: u32,
    /// Number of pilot pulses
    pub pilot_count: usize,
    /// 1st sync pulse length
    pub sync1: u32,
    /// 2nd sync pulse length
    pub sync2: u32,
    /// Zero bit pulse length
    pub zero: u32,
    /// One bit pulse length
    pub one: u32,
}

impl LoaderTiming {
    /// Standard ROM timings; the pilot count depends on the flag byte.
    pub fn standard(flag: u8) -> Self {
        let pilot_count = if flag & 0x80 == 0 {
            consts::PILOT_PULSES_HEADER
        } else {
            consts::PILOT_PULSES_DATA
        };
        LoaderTiming {
            pilot: consts::PILOT_PULSE_LENGTH,
            pilot_count: usize::from(pilot_count),
            sync1: consts::SYNC1_PULSE_LENGTH,
            sync2: consts::SYNC2_PULSE_LENGTH,
            zero: consts::ZERO_PULSE_LENGTH,
            one: consts::ONE_PULSE_LENGTH,
        }
    }
}
