//! Audio device integration using rodio
//!
//! Plays PCM chunks on the system audio device. Each chunk becomes one queued
//! rodio buffer; the writer backs off while the device queue is full so the
//! playback cursor stays close to what is actually heard.

use super::{AudioSink, BUFFER_BACKOFF_MICROS, MAX_QUEUED_CHUNKS};
use crate::synth::BitDepth;
use crate::{Result, TapeError};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use std::time::Duration;

/// Convert rendered bytes to signed 16-bit samples.
///
/// 8-bit bytes are unsigned and centred on 128; 16-bit pairs are little-endian.
/// A trailing odd byte of 16-bit data is dropped.
pub fn to_i16_samples(bytes: &[u8], bit_depth: BitDepth) -> Vec<i16> {
    match bit_depth {
        BitDepth::Eight => bytes.iter().map(|&b| (i16::from(b) - 128) << 8).collect(),
        BitDepth::Sixteen => bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect(),
    }
}

/// Audio playback device using rodio
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    sample_rate: u32,
    bit_depth: BitDepth,
}

impl AudioDevice {
    /// Open the default output device for mono audio at `sample_rate`
    pub fn new(sample_rate: u32, bit_depth: BitDepth) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            TapeError::AudioDeviceError(format!("failed to create audio stream: {}", e))
        })?;

        let sink = Sink::try_new(&stream_handle).map_err(|e| {
            TapeError::AudioDeviceError(format!("failed to create audio sink: {}", e))
        })?;

        Ok(AudioDevice {
            _stream: stream,
            sink,
            sample_rate,
            bit_depth,
        })
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of chunks queued on the device
    pub fn queued_chunks(&self) -> usize {
        self.sink.len()
    }
}

impl AudioSink for AudioDevice {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        while self.sink.len() >= MAX_QUEUED_CHUNKS {
            std::thread::sleep(Duration::from_micros(BUFFER_BACKOFF_MICROS));
        }
        let samples = to_i16_samples(chunk, self.bit_depth);
        self.sink.append(SamplesBuffer::new(1, self.sample_rate, samples));
        Ok(())
    }

    /// Block until the queued audio has played
    fn finish(&mut self) -> Result<()> {
        self.sink.sleep_until_end();
        Ok(())
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
