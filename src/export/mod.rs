//! WAV File Output
//!
//! Writes rendered tapes to canonical 44-byte-header PCM WAV files.

pub mod wav;

pub use wav::{export_to_wav, write_audio, WavSink};
