use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tzx_player::export::export_to_wav;
use tzx_player::remote::{DEFAULT_REMOTE_BAUD, DEFAULT_REMOTE_IO};
use tzx_player::synth::{DEFAULT_BIT_DEPTH, DEFAULT_SAMPLE_RATE, DEFAULT_SPEED_FACTOR};
use tzx_player::{SynthConfig, SynthesizedAudio, TapeImage};

#[derive(Parser)]
#[command(name = "tzx-player")]
#[command(about = "Convert and play TZX cassette tape images", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Signal rendering options shared by `convert` and `play`
#[derive(clap::Args, Clone, Copy)]
struct RenderArgs {
    /// Sample rate in Hz
    #[arg(short = 's', long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    /// Bit depth (8 or 16)
    #[arg(short = 'b', long, default_value_t = DEFAULT_BIT_DEPTH)]
    bit_depth: u16,

    /// Speed factor: multiplies the duration of every pulse (experimental)
    #[arg(short = 'f', long, default_value_t = DEFAULT_SPEED_FACTOR)]
    speed_factor: f64,
}

impl RenderArgs {
    fn config(&self) -> SynthConfig {
        SynthConfig::default()
            .with_sample_rate(self.sample_rate)
            .with_bit_depth(self.bit_depth)
            .with_speed_factor(self.speed_factor)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Convert a TZX tape to a WAV file
    Convert {
        /// Input TZX file
        input: PathBuf,

        /// Output WAV file (defaults to the input name with a .wav extension)
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Show the blocks of a TZX tape
    Info {
        /// Input TZX file
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a TZX tape on the audio device
    Play {
        /// Input TZX file
        input: PathBuf,

        #[command(flatten)]
        render: RenderArgs,

        #[command(flatten)]
        remote: RemoteArgs,
    },
}

/// Relay remote control options of `play`
#[derive(clap::Args)]
struct RemoteArgs {
    /// Serial GPIO device following the computer's tape relay
    #[arg(long)]
    remote: Option<String>,

    /// GPIO input line wired to the relay
    #[arg(long, default_value_t = DEFAULT_REMOTE_IO)]
    remote_io: u8,

    /// Serial speed of the GPIO module
    #[arg(long, default_value_t = DEFAULT_REMOTE_BAUD)]
    remote_baud: u32,
}

fn load_tape(input: &Path) -> Result<TapeImage> {
    TapeImage::load(input).with_context(|| format!("failed to load tape '{}'", input.display()))
}

fn render(tape: &TapeImage, args: &RenderArgs) -> Result<SynthesizedAudio> {
    SynthesizedAudio::render(tape, &args.config()).context("failed to generate audio")
}

fn convert(input: &Path, output: Option<PathBuf>, args: &RenderArgs) -> Result<()> {
    let output = output.unwrap_or_else(|| input.with_extension("wav"));
    let started = Instant::now();

    let tape = load_tape(input)?;
    let mut audio = render(&tape, args)?;
    export_to_wav(&mut audio, &output)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    println!(
        "Wrote {} ({} of audio) in {:.2?}",
        output.display(),
        format_clock(audio.total_seconds()),
        started.elapsed()
    );
    Ok(())
}

fn info(input: &Path, json: bool) -> Result<()> {
    let tape = load_tape(input)?;
    let info = tape.info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", input.display());
    println!("TZX version: {}", info.version);
    println!("Blocks: {}\n", info.blocks.len());
    for block in &info.blocks {
        println!("#{} [{}] {}", block.number, block.id, block.name);
        for (label, value) in &block.fields {
            println!("    {}: {}", label, value);
        }
    }
    Ok(())
}

/// Seconds as HH:MM:SS
fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total / 60) % 60,
        total % 60
    )
}

#[cfg(feature = "streaming")]
mod play {
    use super::{format_clock, load_tape, render, RemoteArgs, RenderArgs};
    use anyhow::{Context, Result};
    use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
    use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
    use std::io::{self, Write};
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tzx_player::remote::RelayRemote;
    use tzx_player::streaming::{AudioDevice, STATUS_UPDATE_MS};
    use tzx_player::{PlayerHandle, TapePlayer};

    fn print_status(handle: &PlayerHandle) -> io::Result<()> {
        let infos = handle.infos();
        let glyph = if infos.paused { "\u{23F8}" } else { "\u{23F5}" };
        let name = Path::new(&infos.file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut stdout = io::stdout();
        write!(
            stdout,
            "\r\x1B[K{} {} - {} / {} ({:.0}%) - Block: {}",
            glyph,
            name,
            format_clock(infos.pos_seconds),
            format_clock(infos.total_seconds),
            infos.pos_percent,
            infos.block_info.as_deref().unwrap_or("-"),
        )?;
        stdout.flush()
    }

    /// Apply one key press; returns `false` when the user quits.
    fn handle_key(handle: &PlayerHandle, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char(' ') => handle.toggle_pause(),
            KeyCode::Left => {
                handle.rewind();
            }
            KeyCode::Right => {
                handle.fast_forward();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                handle.save_current_pos();
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                handle.go_to_saved_pos();
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => return false,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return false,
            _ => {}
        }
        true
    }

    fn control_loop(handle: &PlayerHandle) -> io::Result<()> {
        let tick = Duration::from_millis(STATUS_UPDATE_MS);
        while handle.is_playing() {
            if event::poll(tick)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press
                        && !handle_key(handle, key.code, key.modifiers)
                    {
                        break;
                    }
                }
            }
            print_status(handle)?;
        }
        Ok(())
    }

    pub fn run(input: &Path, args: &RenderArgs, remote: &RemoteArgs) -> Result<()> {
        let tape = load_tape(input)?;
        let audio = render(&tape, args)?;
        let (sample_rate, bit_depth) = (audio.sample_rate(), audio.bit_depth());

        let mut player = TapePlayer::new(audio);
        let handle = player.handle();
        let stop_remote = Arc::new(AtomicBool::new(false));

        let remote_thread = match &remote.remote {
            Some(device) => {
                let relay =
                    RelayRemote::open(device, remote.remote_baud, remote.remote_io, handle.clone())
                        .with_context(|| format!("failed to open remote control '{}'", device))?;
                Some(relay.spawn(Arc::clone(&stop_remote))?)
            }
            None => None,
        };

        player.start(move || AudioDevice::new(sample_rate, bit_depth))?;

        println!(
            "Keys: [space]=pause/resume, [\u{2190}/\u{2192}]=rewind/fast-forward, \
             [s]=save counter, [g]=go to counter, [q]=quit\n"
        );

        enable_raw_mode()?;
        let outcome = control_loop(&handle);
        let _ = disable_raw_mode();
        println!();

        handle.stop();
        stop_remote.store(true, Ordering::Relaxed);
        let session = player.wait();
        if let Some(thread) = remote_thread {
            match thread.join() {
                Ok(Err(e)) => log::warn!("remote control stopped: {}", e),
                Err(_) => log::warn!("remote control thread panicked"),
                Ok(Ok(())) => {}
            }
        }

        outcome?;
        session.context("playback failed")?;
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Convert {
            input,
            output,
            render,
        } => convert(&input, output, &render),
        Command::Info { input, json } => info(&input, json),
        #[cfg(feature = "streaming")]
        Command::Play {
            input,
            render,
            remote,
        } => play::run(&input, &render, &remote),
        #[cfg(not(feature = "streaming"))]
        Command::Play { .. } => anyhow::bail!(
            "playback requires the \"streaming\" feature. \
             Rebuild with `--features streaming` to enable it."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "00:00:00");
        assert_eq!(format_clock(61.9), "00:01:01");
        assert_eq!(format_clock(3723.0), "01:02:03");
    }

    #[test]
    fn test_render_defaults() {
        let cli = Cli::parse_from(["tzx-player", "convert", "game.tzx"]);
        let Command::Convert { output, render, .. } = cli.command else {
            panic!("expected convert");
        };
        assert!(output.is_none());
        assert_eq!(render.config(), SynthConfig::default());
    }

    #[test]
    fn test_remote_defaults() {
        let cli = Cli::parse_from(["tzx-player", "play", "game.tzx"]);
        let Command::Play { remote, .. } = cli.command else {
            panic!("expected play");
        };
        assert!(remote.remote.is_none());
        assert_eq!(remote.remote_io, 1);
        assert_eq!(remote.remote_baud, 19_200);

        let cli = Cli::parse_from([
            "tzx-player",
            "play",
            "game.tzx",
            "--remote",
            "/dev/ttyACM0",
            "--remote-baud",
            "115200",
        ]);
        let Command::Play { remote, .. } = cli.command else {
            panic!("expected play");
        };
        assert_eq!(remote.remote.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(remote.remote_baud, 115_200);
    }
}
