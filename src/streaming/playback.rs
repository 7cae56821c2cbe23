//! Tape playback session
//!
//! State machine: Idle -> Playing <-> Paused -> Stopped. The playback thread
//! blocks on a condition variable while paused and is woken by resume or stop.
//! Stop takes effect after the chunk in flight.

use super::{AudioSink, CHUNK_SIZE, SEEK_STEP_BYTES};
use crate::synth::SynthesizedAudio;
use crate::{Result, TapeError};
use log::{debug, error, info};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Playback session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerState {
    /// Created, loop not started yet
    Idle,
    /// Loop running and forwarding chunks
    Playing,
    /// Loop running but holding the cursor
    Paused,
    /// Loop exited (end of tape, stop request or sink failure)
    Stopped,
}

/// Point-in-time snapshot of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerInfos {
    /// Loop is running (paused or not)
    pub playing: bool,
    /// Pause flag
    pub paused: bool,
    /// Cursor byte offset
    pub current_byte: u64,
    /// Buffer length in bytes
    pub total_bytes: u64,
    /// Cursor position in percent
    pub pos_percent: f64,
    /// Elapsed time at the cursor
    pub pos_seconds: f64,
    /// Total tape time
    pub total_seconds: f64,
    /// Tape the audio was rendered from
    pub file_name: String,
    /// `"i/n - name"` of the block at the cursor
    pub block_info: Option<String>,
}

#[derive(Debug, Default)]
struct ControlState {
    started: bool,
    paused: bool,
    stop_requested: bool,
    finished: bool,
    bookmark: Option<u64>,
}

impl ControlState {
    fn player_state(&self) -> PlayerState {
        if self.finished {
            PlayerState::Stopped
        } else if !self.started {
            PlayerState::Idle
        } else if self.paused {
            PlayerState::Paused
        } else {
            PlayerState::Playing
        }
    }
}

struct Shared {
    audio: Mutex<SynthesizedAudio>,
    state: Mutex<ControlState>,
    resume: Condvar,
}

impl Shared {
    fn mark_finished(&self) {
        let mut state = self.state.lock();
        state.finished = true;
        self.resume.notify_all();
    }

    /// Forward chunks until the end of the tape or a stop request.
    /// Returns `true` if the tape played to the end.
    fn run<S: AudioSink>(&self, sink: &mut S) -> Result<bool> {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            {
                let mut state = self.state.lock();
                while state.paused && !state.stop_requested {
                    self.resume.wait(&mut state);
                }
                if state.stop_requested {
                    return Ok(false);
                }
            }

            let n = self.audio.lock().read_chunk(&mut chunk);
            if n == 0 {
                return Ok(true);
            }
            sink.write_chunk(&chunk[..n])?;
        }
    }
}

/// Cloneable control surface of a [`TapePlayer`].
///
/// Every operation is safe to call from any thread at any time, including
/// before the loop starts and after it stopped.
#[derive(Clone)]
pub struct PlayerHandle {
    shared: Arc<Shared>,
}

impl PlayerHandle {
    /// Current session state
    pub fn state(&self) -> PlayerState {
        self.shared.state.lock().player_state()
    }

    /// Returns `true` while the loop runs, paused or not
    pub fn is_playing(&self) -> bool {
        let state = self.shared.state.lock();
        state.started && !state.finished
    }

    /// Returns `true` if the pause flag is set
    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }

    /// Hold the cursor; chunks already handed to the sink still play
    pub fn pause(&self) {
        self.shared.state.lock().paused = true;
        debug!("playback paused");
    }

    /// Release a pause; takes effect at the next chunk boundary
    pub fn resume(&self) {
        let mut state = self.shared.state.lock();
        state.paused = false;
        self.shared.resume.notify_all();
        debug!("playback resumed");
    }

    /// Flip the pause flag
    pub fn toggle_pause(&self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Ask the loop to exit after its current chunk
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        state.stop_requested = true;
        self.shared.resume.notify_all();
    }

    /// Seek back by [`SEEK_STEP_BYTES`], saturating at the start
    pub fn rewind(&self) -> u64 {
        self.shared.audio.lock().seek_by(-(SEEK_STEP_BYTES as i64))
    }

    /// Seek forward by [`SEEK_STEP_BYTES`], saturating at the end
    pub fn fast_forward(&self) -> u64 {
        self.shared.audio.lock().seek_by(SEEK_STEP_BYTES as i64)
    }

    /// Move the cursor to an absolute byte offset (clamped)
    pub fn seek(&self, offset: u64) -> u64 {
        self.shared.audio.lock().seek_to(offset)
    }

    /// Cursor byte offset
    pub fn position(&self) -> u64 {
        self.shared.audio.lock().position()
    }

    /// Remember the current cursor offset
    pub fn save_current_pos(&self) -> u64 {
        let position = self.position();
        self.shared.state.lock().bookmark = Some(position);
        info!("saved tape counter at byte {}", position);
        position
    }

    /// Return to the remembered offset, or to the start if none was saved
    pub fn go_to_saved_pos(&self) -> u64 {
        let bookmark = self.shared.state.lock().bookmark.unwrap_or(0);
        self.seek(bookmark)
    }

    /// Snapshot of the session for status display
    pub fn infos(&self) -> PlayerInfos {
        let (playing, paused) = {
            let state = self.shared.state.lock();
            (state.started && !state.finished, state.paused)
        };
        let audio = self.shared.audio.lock();
        PlayerInfos {
            playing,
            paused,
            current_byte: audio.position(),
            total_bytes: audio.total_bytes(),
            pos_percent: audio.position_percent(),
            pos_seconds: audio.position_seconds(),
            total_seconds: audio.total_seconds(),
            file_name: audio.source_name().to_string(),
            block_info: audio.current_block().map(|block| block.to_string()),
        }
    }
}

/// Owner of a playback session and its background thread
pub struct TapePlayer {
    handle: PlayerHandle,
    thread: Option<JoinHandle<Result<()>>>,
}

impl TapePlayer {
    /// Create an idle session over `audio`; the cursor keeps its position
    pub fn new(audio: SynthesizedAudio) -> Self {
        TapePlayer {
            handle: PlayerHandle {
                shared: Arc::new(Shared {
                    audio: Mutex::new(audio),
                    state: Mutex::new(ControlState::default()),
                    resume: Condvar::new(),
                }),
            },
            thread: None,
        }
    }

    /// Control handle for this session
    pub fn handle(&self) -> PlayerHandle {
        self.handle.clone()
    }

    /// Start the playback loop.
    ///
    /// `open_sink` runs on the playback thread, which lets it create sinks that
    /// cannot move between threads. If it fails the session stops and the error
    /// is returned from [`TapePlayer::wait`].
    pub fn start<S, F>(&mut self, open_sink: F) -> Result<()>
    where
        S: AudioSink,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        {
            let mut state = self.handle.shared.state.lock();
            if state.started {
                return Err(TapeError::Other("playback already started".into()));
            }
            state.started = true;
        }

        let shared = Arc::clone(&self.handle.shared);
        let thread = thread::Builder::new()
            .name("tzx-playback".into())
            .spawn(move || {
                let result = open_sink().and_then(|mut sink| {
                    if shared.run(&mut sink)? {
                        info!("end of tape reached");
                        sink.finish()?;
                    }
                    Ok(())
                });
                if let Err(e) = &result {
                    error!("playback session failed: {}", e);
                }
                shared.mark_finished();
                result
            });

        match thread {
            Ok(thread) => {
                self.thread = Some(thread);
                Ok(())
            }
            Err(e) => {
                self.handle.shared.mark_finished();
                Err(e.into())
            }
        }
    }

    /// Wait for the loop to exit and return the session result
    pub fn wait(mut self) -> Result<()> {
        self.join()
    }

    fn join(&mut self) -> Result<()> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| TapeError::Other("playback thread panicked".into()))?,
            None => Ok(()),
        }
    }
}

impl Drop for TapePlayer {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.handle.stop();
            let _ = self.join();
        }
    }
}
