//! TZX tape player
//!
//! Reconstructs cassette tape images in the TZX container format (as used by the
//! ZX Spectrum, Amstrad CPC and friends) into the square-wave signal a tape deck
//! would have produced, and renders that signal as PCM audio. The audio can be
//! written to a WAV file or streamed live with tape-deck style controls
//! (pause, rewind, fast-forward and a position counter).
//!
//! # Pipeline
//! file bytes -> [`tzx_parser`] blocks -> [`TapeImage`] -> [`SynthesizedAudio`]
//! -> [`export::WavSink`] or [`TapePlayer`] -> audio output.
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output through rodio plus keyboard
//!   control in the CLI (enables optional `rodio` and `crossterm` deps)
//!
//! # Quick start
//! ## Convert a tape to WAV
//! ```no_run
//! use tzx_player::{export::export_to_wav, SynthConfig, SynthesizedAudio, TapeImage};
//! let tape = TapeImage::load("game.tzx").unwrap();
//! let mut audio = SynthesizedAudio::render(&tape, &SynthConfig::default()).unwrap();
//! export_to_wav(&mut audio, "game.wav").unwrap();
//! ```
//!
//! ## Drive a playback session
//! ```no_run
//! use tzx_player::{streaming::MemorySink, SynthConfig, SynthesizedAudio, TapeImage, TapePlayer};
//! let tape = TapeImage::load("game.tzx").unwrap();
//! let audio = SynthesizedAudio::render(&tape, &SynthConfig::default()).unwrap();
//! let mut player = TapePlayer::new(audio);
//! let sink = MemorySink::new();
//! let collected = sink.clone();
//! player.start(move || Ok(collected)).unwrap();
//! player.handle().fast_forward();
//! player.wait().unwrap();
//! println!("{} bytes played", sink.len());
//! ```

#![warn(missing_docs)]

pub mod export; // WAV File Output
pub mod pulse; // Half-wave Signal Model
pub mod remote; // Relay Remote Control
pub mod streaming; // Playback Controller & Audio Output
pub mod synth; // PCM Synthesis
pub mod tape_loader; // TZX File I/O
pub mod tzx_parser; // TZX Block Decoding

/// Error types for tape loading, synthesis and playback
#[derive(thiserror::Error, Debug)]
pub enum TapeError {
    /// Signature or end-of-text marker mismatch in the file header
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// A block tag outside the supported set
    #[error("Unsupported block type 0x{tag:02X} at offset {offset}")]
    UnsupportedBlockType {
        /// Tag byte as read from the file
        tag: u8,
        /// File offset of the tag byte
        offset: usize,
    },

    /// A field read ran past the end of the data
    #[error("Truncated input: {context} runs past end of data at offset {offset}")]
    TruncatedInput {
        /// What was being decoded
        context: &'static str,
        /// File offset at which the short read happened
        offset: usize,
    },

    /// Sample bit depth other than 8 or 16
    #[error("Unsupported bit depth {0} (expected 8 or 16)")]
    UnsupportedBitDepth(u16),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for TapeError {
    /// Converts a String into `TapeError::Other`.
    ///
    /// Prefer the specific variants where the failure has a category; this is
    /// a convenience for one-off messages.
    fn from(msg: String) -> Self {
        TapeError::Other(msg)
    }
}

impl From<&str> for TapeError {
    fn from(msg: &str) -> Self {
        TapeError::Other(msg.to_string())
    }
}

/// Result type for tape operations
pub type Result<T> = std::result::Result<T, TapeError>;

// Public API exports
pub use pulse::Pulse;
pub use streaming::{AudioSink, PlayerHandle, PlayerInfos, PlayerState, TapePlayer};
pub use synth::{BitDepth, BlockPosition, SynthConfig, SynthesizedAudio};
pub use tape_loader::{TapeHeader, TapeImage, TapeInfo};
pub use tzx_parser::{Block, BlockId};
