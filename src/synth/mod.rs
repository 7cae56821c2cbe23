//! PCM Synthesis
//!
//! Renders a whole [`TapeImage`] into one immutable PCM byte buffer. Every pulse
//! becomes `ceil(length * speed * rate / clock)` samples at a fixed level value,
//! every block's trailing pause becomes low-level samples, and a fixed two-second
//! low tail closes the tape. The buffer is rendered once; afterwards only its
//! read cursor moves.

use crate::pulse::consts::CLOCK_HZ;
use crate::pulse::Pulse;
use crate::tape_loader::TapeImage;
use crate::{Result, TapeError};
use log::{debug, info};
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;
use std::time::Instant;

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Default bits per sample
pub const DEFAULT_BIT_DEPTH: u16 = 8;
/// Default pulse duration multiplier
pub const DEFAULT_SPEED_FACTOR: f64 = 1.0;
/// Silence appended after the last block so readers never run dry mid-edge
pub const TAIL_SILENCE_MS: u32 = 2000;

/// Supported sample widths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// Unsigned 8-bit, low = 0x00, high = 0xFF
    Eight,
    /// Little-endian 16-bit, low = `00 80`, high = `00 7F`
    Sixteen,
}

impl BitDepth {
    /// Bits per sample
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// Bytes per sample
    pub fn bytes(self) -> usize {
        usize::from(self.bits() / 8)
    }

    /// Encoded sample for a signal level
    pub fn sample(self, level: bool) -> &'static [u8] {
        match (self, level) {
            (BitDepth::Eight, false) => &[0x00],
            (BitDepth::Eight, true) => &[0xFF],
            (BitDepth::Sixteen, false) => &[0x00, 0x80],
            (BitDepth::Sixteen, true) => &[0x00, 0x7F],
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = TapeError;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            other => Err(TapeError::UnsupportedBitDepth(other)),
        }
    }
}

/// Rendering parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample (8 or 16)
    pub bit_depth: u16,
    /// Pulse duration multiplier
    pub speed_factor: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: DEFAULT_BIT_DEPTH,
            speed_factor: DEFAULT_SPEED_FACTOR,
        }
    }
}

impl SynthConfig {
    /// Set the sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the bit depth
    pub fn with_bit_depth(mut self, bit_depth: u16) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    /// Set the speed factor
    pub fn with_speed_factor(mut self, speed_factor: f64) -> Self {
        self.speed_factor = speed_factor;
        self
    }

    /// Check every parameter and return the checked bit depth
    pub fn validate(&self) -> Result<BitDepth> {
        let depth = BitDepth::try_from(self.bit_depth)?;
        if self.sample_rate == 0 {
            return Err(TapeError::ConfigError("sample rate must be positive".into()));
        }
        if !self.speed_factor.is_finite() || self.speed_factor <= 0.0 {
            return Err(TapeError::ConfigError(format!(
                "speed factor must be a positive number, got {}",
                self.speed_factor
            )));
        }
        Ok(depth)
    }

    /// Number of samples for a pulse of `length` clock ticks
    pub fn pulse_samples(&self, length: u32) -> usize {
        let exact = f64::from(length) * f64::from(self.sample_rate) / f64::from(CLOCK_HZ)
            * self.speed_factor;
        exact.ceil() as usize
    }

    /// Number of samples for `ms` milliseconds of silence
    pub fn silence_samples(&self, ms: u32) -> usize {
        (u64::from(ms) * u64::from(self.sample_rate) / 1000) as usize
    }
}

/// Start of one block's contribution in the rendered buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBoundary {
    /// Byte offset of the block's first sample
    pub offset: u64,
    /// Block type name
    pub name: &'static str,
}

/// The block containing a buffer position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPosition {
    /// 0-based block index
    pub index: usize,
    /// Number of blocks on the tape
    pub count: usize,
    /// Block type name
    pub name: &'static str,
}

impl fmt::Display for BlockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} - {}", self.index + 1, self.count, self.name)
    }
}

struct Renderer<'a> {
    config: &'a SynthConfig,
    depth: BitDepth,
    buf: Vec<u8>,
}

impl Renderer<'_> {
    fn level(&mut self, level: bool, samples: usize) {
        let value = self.depth.sample(level);
        self.buf.reserve(samples * value.len());
        for _ in 0..samples {
            self.buf.extend_from_slice(value);
        }
    }

    fn pulses(&mut self, pulses: &[Pulse]) {
        for pulse in pulses {
            let samples = self.config.pulse_samples(pulse.length);
            self.level(pulse.level, samples);
        }
    }

    fn silence(&mut self, ms: u32) {
        let samples = self.config.silence_samples(ms);
        self.level(false, samples);
    }
}

/// A rendered tape: immutable samples plus a movable read cursor.
///
/// Cloning shares the sample data; each clone has its own cursor.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    samples: Arc<[u8]>,
    position: u64,
    sample_rate: u32,
    bit_depth: BitDepth,
    boundaries: Arc<[BlockBoundary]>,
    source_name: String,
}

impl SynthesizedAudio {
    /// Render every block of `tape` with `config`.
    ///
    /// The configuration is validated before any rendering happens.
    pub fn render(tape: &TapeImage, config: &SynthConfig) -> Result<Self> {
        let depth = config.validate()?;
        let started = Instant::now();

        let mut renderer = Renderer {
            config,
            depth,
            buf: Vec::new(),
        };
        let mut boundaries = Vec::with_capacity(tape.blocks().len());

        for block in tape.blocks() {
            boundaries.push(BlockBoundary {
                offset: renderer.buf.len() as u64,
                name: block.name(),
            });
            let before = renderer.buf.len();
            renderer.pulses(&block.pulses());
            renderer.silence(block.pause_duration());
            debug!(
                "rendered '{}' at byte {} ({} bytes)",
                block.name(),
                before,
                renderer.buf.len() - before
            );
        }
        renderer.silence(TAIL_SILENCE_MS);

        let samples: Arc<[u8]> = renderer.buf.into();
        info!(
            "rendered {} bytes ({} Hz, {} bit, x{}) in {:?}",
            samples.len(),
            config.sample_rate,
            depth.bits(),
            config.speed_factor,
            started.elapsed()
        );

        Ok(SynthesizedAudio {
            samples,
            position: 0,
            sample_rate: config.sample_rate,
            bit_depth: depth,
            boundaries: boundaries.into(),
            source_name: tape.source_name().to_string(),
        })
    }

    /// All rendered bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.samples
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Sample width
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Name of the tape this was rendered from
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Block start offsets in tape order
    pub fn boundaries(&self) -> &[BlockBoundary] {
        &self.boundaries
    }

    /// Copy bytes from the cursor into `buf` and advance; 0 at the end.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> usize {
        let start = self.position as usize;
        let remaining = self.samples.len().saturating_sub(start);
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&self.samples[start..start + n]);
        self.position += n as u64;
        n
    }

    /// Move the cursor to an absolute byte offset, clamped to the buffer
    pub fn seek_to(&mut self, offset: u64) -> u64 {
        self.position = offset.min(self.total_bytes());
        self.position
    }

    /// Move the cursor by a signed byte delta, saturating at both ends
    pub fn seek_by(&mut self, delta: i64) -> u64 {
        let target = if delta < 0 {
            self.position.saturating_sub(delta.unsigned_abs())
        } else {
            self.position.saturating_add(delta as u64)
        };
        self.seek_to(target)
    }

    /// Current cursor offset
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Buffer length in bytes
    pub fn total_bytes(&self) -> u64 {
        self.samples.len() as u64
    }

    /// Returns `true` once the cursor reached the end
    pub fn is_finished(&self) -> bool {
        self.position >= self.total_bytes()
    }

    fn bytes_to_seconds(&self, bytes: u64) -> f64 {
        bytes as f64 / f64::from(self.sample_rate) / self.bit_depth.bytes() as f64
    }

    /// Elapsed playback time at the cursor
    pub fn position_seconds(&self) -> f64 {
        self.bytes_to_seconds(self.position)
    }

    /// Total playback time
    pub fn total_seconds(&self) -> f64 {
        self.bytes_to_seconds(self.total_bytes())
    }

    /// Cursor position as a percentage of the buffer (0.0 to 100.0)
    pub fn position_percent(&self) -> f64 {
        match self.total_bytes() {
            0 => 0.0,
            total => self.position as f64 / total as f64 * 100.0,
        }
    }

    /// Block whose contribution contains `offset`; past the last boundary
    /// this is the last block. `None` for a tape without blocks.
    ///
    /// An offset equal to a boundary belongs to the block starting there, and
    /// blocks without output share their successor's offset, so the last of
    /// the blocks at that offset is reported.
    pub fn block_at(&self, offset: u64) -> Option<BlockPosition> {
        let count = self.boundaries.len();
        if count == 0 {
            return None;
        }
        let next = self.boundaries.partition_point(|b| b.offset <= offset);
        let index = next.saturating_sub(1);
        Some(BlockPosition {
            index,
            count,
            name: self.boundaries[index].name,
        })
    }

    /// Block at the cursor
    pub fn current_block(&self) -> Option<BlockPosition> {
        self.block_at(self.position)
    }
}

impl Read for SynthesizedAudio {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_chunk(buf))
    }
}

impl Seek for SynthesizedAudio {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = match pos {
            SeekFrom::Start(offset) => self.seek_to(offset),
            SeekFrom::Current(delta) => self.seek_by(delta),
            SeekFrom::End(delta) => {
                self.position = self.total_bytes();
                self.seek_by(delta)
            }
        };
        Ok(position)
    }
}
