//! Relay Remote Control
//!
//! Follows the motor relay of a cassette-driven computer through a serial GPIO
//! module: the module is asked for the level of one input line, and a change
//! of that level pauses (relay open, level 1) or resumes (level 0) playback.
//!
//! Protocol: the host writes `gpio read <n>\r`, the module echoes the command
//! and answers with the line level as an ASCII digit.

use crate::streaming::PlayerHandle;
use crate::{Result, TapeError};
use log::{debug, info, warn};
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default GPIO input line
pub const DEFAULT_REMOTE_IO: u8 = 1;

/// Default serial speed of the GPIO module
pub const DEFAULT_REMOTE_BAUD: u32 = 19_200;

/// Delay between two polls in milliseconds
pub const POLL_INTERVAL_MS: u64 = 20;

/// Serial read timeout in milliseconds
pub const READ_TIMEOUT_MS: u64 = 200;

const REPLY_BUFFER_LEN: usize = 100;

/// Relay watcher bound to a byte port and a playback session
pub struct RelayRemote<P: Read + Write> {
    port: P,
    command: Vec<u8>,
    state: u8,
    player: PlayerHandle,
}

impl<P: Read + Write> RelayRemote<P> {
    /// Watch GPIO line `io` on `port` and drive `player`
    pub fn new(port: P, io: u8, player: PlayerHandle) -> Self {
        RelayRemote {
            port,
            command: format!("gpio read {}\r", io).into_bytes(),
            state: 0,
            player,
        }
    }

    /// Last observed relay level
    pub fn state(&self) -> u8 {
        self.state
    }

    /// Query the line once and apply a level change.
    ///
    /// Returns the level read, or `None` when the module did not answer within
    /// the port's read timeout or the reply held no level.
    pub fn poll_once(&mut self) -> Result<Option<u8>> {
        self.port.write_all(&self.command)?;
        self.port.flush()?;

        let Some(reply) = self.read_reply()? else {
            debug!("no relay reply before timeout");
            return Ok(None);
        };
        let Some(level) = parse_level(&reply, self.command.len()) else {
            warn!("unreadable relay reply: {:?}", String::from_utf8_lossy(&reply));
            return Ok(None);
        };

        if level != self.state {
            self.state = level;
            if level == 1 {
                debug!("relay opened, pausing");
                self.player.pause();
            } else {
                debug!("relay closed, resuming");
                self.player.resume();
            }
        }
        Ok(Some(level))
    }

    /// Read until a short read; `None` if the port timed out before any byte.
    fn read_reply(&mut self) -> Result<Option<Vec<u8>>> {
        let mut reply = Vec::new();
        let mut buf = [0u8; REPLY_BUFFER_LEN];
        loop {
            let n = match self.port.read(&mut buf) {
                Ok(n) => n,
                Err(e) if is_timeout(&e) => {
                    return Ok((!reply.is_empty()).then_some(reply));
                }
                Err(e) => return Err(e.into()),
            };
            if n == 0 && reply.is_empty() {
                return Err(TapeError::Other("remote control port closed".into()));
            }
            reply.extend_from_slice(&buf[..n]);
            if n < buf.len() {
                return Ok(Some(reply));
            }
        }
    }
}

#[cfg(feature = "streaming")]
impl RelayRemote<Box<dyn serialport::SerialPort>> {
    /// Open the serial device at `path` (8N1, raw) with a [`READ_TIMEOUT_MS`]
    /// read timeout
    pub fn open(path: &str, baud_rate: u32, io: u8, player: PlayerHandle) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()
            .map_err(std::io::Error::from)?;
        info!("remote control on {} at {} baud", path, baud_rate);
        Ok(Self::new(port, io, player))
    }
}

impl<P: Read + Write + Send + 'static> RelayRemote<P> {
    /// Poll on a background thread until `stop` is set.
    ///
    /// `stop` is checked after every poll, so the port needs a read timeout for
    /// the thread to exit while the module is silent. A port failure ends the
    /// thread with the error; the session is not touched.
    pub fn spawn(mut self, stop: Arc<AtomicBool>) -> Result<JoinHandle<Result<()>>> {
        let thread = thread::Builder::new()
            .name("tzx-remote".into())
            .spawn(move || {
                info!("relay remote control started");
                while !stop.load(Ordering::Relaxed) {
                    self.poll_once()?;
                    thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
                }
                Ok(())
            })?;
        Ok(thread)
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

/// First ASCII digit after the echoed command
fn parse_level(reply: &[u8], echo_len: usize) -> Option<u8> {
    reply
        .get(echo_len..)?
        .iter()
        .find(|b| b.is_ascii_digit())
        .map(|b| b - b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::TapePlayer;
    use crate::{SynthConfig, SynthesizedAudio, TapeImage};
    use std::collections::VecDeque;
    use std::io;

    struct FakePort {
        replies: VecDeque<Vec<u8>>,
        written: Vec<u8>,
    }

    impl FakePort {
        fn new(levels: &[&str]) -> Self {
            FakePort {
                replies: levels
                    .iter()
                    .map(|level| format!("gpio read 1\r\n{}\r\n>", level).into_bytes())
                    .collect(),
                written: Vec::new(),
            }
        }
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let reply = self.replies.pop_front().unwrap_or_default();
            buf[..reply.len()].copy_from_slice(&reply);
            Ok(reply.len())
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Port that never answers: every read times out
    struct SilentPort;

    impl Read for SilentPort {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            thread::sleep(Duration::from_millis(10));
            Err(io::Error::new(io::ErrorKind::TimedOut, "operation timed out"))
        }
    }

    impl Write for SilentPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn player() -> TapePlayer {
        let tape = TapeImage::from_bytes(b"ZXTape!\x1a\x01\x14", "remote.tzx").unwrap();
        TapePlayer::new(SynthesizedAudio::render(&tape, &SynthConfig::default()).unwrap())
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(b"gpio read 1\r\n1\r\n>", 12), Some(1));
        assert_eq!(parse_level(b"gpio read 1\r\n0\r\n>", 12), Some(0));
        assert_eq!(parse_level(b"gpio read 1\r\n>", 12), None);
        assert_eq!(parse_level(b"gpio", 12), None);
    }

    #[test]
    fn test_relay_changes_drive_pause() {
        let player = player();
        let handle = player.handle();
        let port = FakePort::new(&["0", "1", "1", "0"]);
        let mut remote = RelayRemote::new(port, 1, handle.clone());

        assert_eq!(remote.poll_once().unwrap(), Some(0));
        assert!(!handle.is_paused());

        assert_eq!(remote.poll_once().unwrap(), Some(1));
        assert!(handle.is_paused());
        assert_eq!(remote.state(), 1);

        // unchanged level leaves a manual resume alone
        handle.resume();
        assert_eq!(remote.poll_once().unwrap(), Some(1));
        assert!(!handle.is_paused());

        handle.pause();
        assert_eq!(remote.poll_once().unwrap(), Some(0));
        assert!(!handle.is_paused());
    }

    #[test]
    fn test_command_written_per_poll() {
        let player = player();
        let mut remote = RelayRemote::new(FakePort::new(&["0", "0"]), 1, player.handle());
        remote.poll_once().unwrap();
        remote.poll_once().unwrap();
        assert_eq!(remote.port.written, b"gpio read 1\rgpio read 1\r".to_vec());
    }

    #[test]
    fn test_closed_port_is_an_error() {
        let player = player();
        let mut remote = RelayRemote::new(FakePort::new(&[]), 1, player.handle());
        assert!(remote.poll_once().is_err());
    }

    #[test]
    fn test_silent_module_is_no_reply() {
        let player = player();
        let handle = player.handle();
        let mut remote = RelayRemote::new(SilentPort, 1, handle.clone());
        assert_eq!(remote.poll_once().unwrap(), None);
        assert_eq!(remote.state(), 0);
        assert!(!handle.is_paused());
    }

    #[test]
    fn test_stop_ends_thread_while_module_is_silent() {
        let player = player();
        let stop = Arc::new(AtomicBool::new(false));
        let thread = RelayRemote::new(SilentPort, 1, player.handle())
            .spawn(Arc::clone(&stop))
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        stop.store(true, Ordering::Relaxed);

        for _ in 0..200 {
            if thread.is_finished() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(thread.is_finished());
        assert!(thread.join().unwrap().is_ok());
    }
}
