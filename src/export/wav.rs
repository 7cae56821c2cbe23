//! WAV file export functionality
//!
//! The data section is byte-identical to the rendered buffer: hound stores 8-bit
//! samples unsigned and 16-bit samples as signed little-endian, which are
//! exactly the encodings the synthesizer produces.

use crate::streaming::{AudioSink, CHUNK_SIZE};
use crate::synth::{BitDepth, SynthesizedAudio};
use crate::{Result, TapeError};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

fn wav_error(context: &str, e: hound::Error) -> TapeError {
    TapeError::AudioFileError(format!("{}: {}", context, e))
}

/// Audio sink writing a mono PCM WAV stream
pub struct WavSink<W: Write + Seek> {
    writer: Option<hound::WavWriter<W>>,
    bit_depth: BitDepth,
}

impl WavSink<BufWriter<File>> {
    /// Create a WAV file at `path`
    pub fn create<P: AsRef<Path>>(path: P, sample_rate: u32, bit_depth: BitDepth) -> Result<Self> {
        let writer = hound::WavWriter::create(path, Self::spec(sample_rate, bit_depth))
            .map_err(|e| wav_error("failed to create WAV file", e))?;
        Ok(WavSink {
            writer: Some(writer),
            bit_depth,
        })
    }
}

impl<W: Write + Seek> WavSink<W> {
    /// Write a WAV stream into any seekable writer
    pub fn new(inner: W, sample_rate: u32, bit_depth: BitDepth) -> Result<Self> {
        let writer = hound::WavWriter::new(inner, Self::spec(sample_rate, bit_depth))
            .map_err(|e| wav_error("failed to start WAV stream", e))?;
        Ok(WavSink {
            writer: Some(writer),
            bit_depth,
        })
    }

    fn spec(sample_rate: u32, bit_depth: BitDepth) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: bit_depth.bits(),
            sample_format: hound::SampleFormat::Int,
        }
    }
}

impl<W: Write + Seek> AudioSink for WavSink<W> {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| TapeError::AudioFileError("WAV stream already finalized".into()))?;

        match self.bit_depth {
            BitDepth::Eight => {
                for &b in chunk {
                    writer
                        .write_sample((i16::from(b) - 128) as i8)
                        .map_err(|e| wav_error("failed to write sample", e))?;
                }
            }
            BitDepth::Sixteen => {
                for pair in chunk.chunks_exact(2) {
                    writer
                        .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                        .map_err(|e| wav_error("failed to write sample", e))?;
                }
            }
        }
        Ok(())
    }

    /// Backfill the header sizes and flush
    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| wav_error("failed to finalize WAV file", e))?;
        }
        Ok(())
    }
}

/// Stream `audio` from its start into `sink` and finish it.
///
/// Returns the number of data bytes written.
pub fn write_audio<S: AudioSink>(audio: &mut SynthesizedAudio, sink: &mut S) -> Result<u64> {
    audio.seek_to(0);
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = audio.read_chunk(&mut chunk);
        if n == 0 {
            break;
        }
        sink.write_chunk(&chunk[..n])?;
        written += n as u64;
    }
    sink.finish()?;
    Ok(written)
}

/// Export a rendered tape to a WAV file
///
/// # Examples
///
/// ```no_run
/// use tzx_player::export::export_to_wav;
/// use tzx_player::{SynthConfig, SynthesizedAudio, TapeImage};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tape = TapeImage::load("game.tzx")?;
/// let mut audio = SynthesizedAudio::render(&tape, &SynthConfig::default())?;
///
/// export_to_wav(&mut audio, "game.wav")?;
/// # Ok(())
/// # }
/// ```
pub fn export_to_wav<P: AsRef<Path>>(audio: &mut SynthesizedAudio, output_path: P) -> Result<u64> {
    let output_path = output_path.as_ref();
    let mut sink = WavSink::create(output_path, audio.sample_rate(), audio.bit_depth())?;
    let written = write_audio(audio, &mut sink)?;
    info!("wrote {} data bytes to {}", written, output_path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn le32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn le16(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    #[test]
    fn test_eight_bit_stream_is_byte_identical() {
        let mut out = Vec::new();
        {
            let mut sink = WavSink::new(Cursor::new(&mut out), 22_050, BitDepth::Eight).unwrap();
            sink.write_chunk(&[0x00, 0xFF, 0x80, 0x01]).unwrap();
            sink.finish().unwrap();
        }

        assert_eq!(out.len(), 44 + 4);
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(le32(&out, 4), 4 + 36);
        assert_eq!(&out[8..16], b"WAVEfmt ");
        assert_eq!(le32(&out, 16), 16);
        assert_eq!(le16(&out, 20), 1);
        assert_eq!(le16(&out, 22), 1);
        assert_eq!(le32(&out, 24), 22_050);
        assert_eq!(le32(&out, 28), 22_050);
        assert_eq!(le16(&out, 32), 1);
        assert_eq!(le16(&out, 34), 8);
        assert_eq!(&out[36..40], b"data");
        assert_eq!(le32(&out, 40), 4);
        assert_eq!(&out[44..], &[0x00, 0xFF, 0x80, 0x01]);
    }

    #[test]
    fn test_sixteen_bit_stream_is_byte_identical() {
        let mut out = Vec::new();
        {
            let mut sink = WavSink::new(Cursor::new(&mut out), 44_100, BitDepth::Sixteen).unwrap();
            sink.write_chunk(&[0x00, 0x80, 0x00, 0x7F]).unwrap();
            sink.finish().unwrap();
        }

        assert_eq!(le32(&out, 28), 88_200);
        assert_eq!(le16(&out, 32), 2);
        assert_eq!(le16(&out, 34), 16);
        assert_eq!(le32(&out, 40), 4);
        assert_eq!(&out[44..], &[0x00, 0x80, 0x00, 0x7F]);
    }

    #[test]
    fn test_write_after_finish_fails() {
        let mut out = Vec::new();
        let mut sink = WavSink::new(Cursor::new(&mut out), 44_100, BitDepth::Eight).unwrap();
        sink.finish().unwrap();
        assert!(matches!(
            sink.write_chunk(&[0]),
            Err(TapeError::AudioFileError(_))
        ));
    }
}
