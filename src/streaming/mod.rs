//! Playback Controller & Audio Output
//!
//! A [`TapePlayer`] runs a background loop that reads fixed-size chunks from a
//! [`SynthesizedAudio`](crate::SynthesizedAudio) cursor and hands them to an
//! [`AudioSink`]. Control inputs (keyboard, status display, relay remote) act on
//! the live session through cloneable [`PlayerHandle`]s.

pub mod playback;

#[cfg(feature = "streaming")]
pub mod audio_device;

#[cfg(feature = "streaming")]
pub use audio_device::AudioDevice;
pub use playback::{PlayerHandle, PlayerInfos, PlayerState, TapePlayer};

use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Bytes handed to the sink per loop iteration
pub const CHUNK_SIZE: usize = 1000;

/// Rewind / fast-forward distance in bytes
pub const SEEK_STEP_BYTES: u64 = 50_000;

/// Status display refresh interval in milliseconds
pub const STATUS_UPDATE_MS: u64 = 60;

/// Buffer backoff time in microseconds
pub const BUFFER_BACKOFF_MICROS: u64 = 500;

/// Chunks an output device may hold before the writer backs off
pub const MAX_QUEUED_CHUNKS: usize = 8;

/// Destination for rendered PCM bytes.
///
/// Sinks are created on the playback thread, so they need not be `Send`.
pub trait AudioSink {
    /// Consume one chunk; blocking until the sink can take it is allowed.
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()>;

    /// Called once after the last chunk of a tape that played to the end
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink that collects every chunk in memory. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes received so far
    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    /// Returns `true` if nothing was received yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of everything received so far
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }
}

impl AudioSink for MemorySink {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.bytes.lock().extend_from_slice(chunk);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        assert!(sink.is_empty());

        writer.write_chunk(&[1, 2, 3]).unwrap();
        writer.write_chunk(&[4]).unwrap();
        assert_eq!(sink.len(), 4);
        assert_eq!(sink.contents(), vec![1, 2, 3, 4]);
    }
}
