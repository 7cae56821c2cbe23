use std::thread;
use std::time::Duration;

use tzx_player::streaming::MemorySink;
use tzx_player::{PlayerState, SynthConfig, SynthesizedAudio, TapeImage, TapePlayer};

fn rendered_tape() -> SynthesizedAudio {
    let mut data = b"ZXTape!\x1a\x01\x14".to_vec();
    data.extend_from_slice(&[0x10, 0xF4, 0x01, 0x02, 0x00, 0xFF, 0x42]);
    data.extend_from_slice(&[0x12, 0x78, 0x08, 0x20, 0x00]);
    let tape = TapeImage::from_bytes(&data, "session.tzx").unwrap();
    SynthesizedAudio::render(&tape, &SynthConfig::default().with_bit_depth(16)).unwrap()
}

#[test]
fn session_forwards_every_byte_in_order() {
    let audio = rendered_tape();
    let expected = audio.as_bytes().to_vec();

    let mut player = TapePlayer::new(audio);
    let sink = MemorySink::new();
    let collected = sink.clone();
    player.start(move || Ok(collected)).unwrap();
    player.wait().unwrap();

    assert_eq!(sink.contents(), expected);
}

#[test]
fn concurrent_controls_keep_session_consistent() {
    let audio = rendered_tape();
    let total = audio.total_bytes();
    let mut player = TapePlayer::new(audio);
    let handle = player.handle();
    handle.pause();
    player.start(|| Ok(MemorySink::new())).unwrap();

    let controllers: Vec<_> = (0..3)
        .map(|i| {
            let handle = handle.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    match i {
                        0 => handle.toggle_pause(),
                        1 => {
                            handle.fast_forward();
                            handle.rewind();
                        }
                        _ => {
                            let infos = handle.infos();
                            assert!(infos.current_byte <= infos.total_bytes);
                            assert!(infos.pos_percent <= 100.0);
                        }
                    }
                }
            })
        })
        .collect();
    for controller in controllers {
        controller.join().unwrap();
    }

    handle.resume();
    handle.stop();
    player.wait().unwrap();
    assert_eq!(handle.state(), PlayerState::Stopped);
    assert!(handle.position() <= total);
}

#[test]
fn status_reader_sees_session_end() {
    let mut player = TapePlayer::new(rendered_tape());
    let handle = player.handle();
    player.start(|| Ok(MemorySink::new())).unwrap();
    let status = {
        let handle = handle.clone();
        thread::spawn(move || {
            while handle.is_playing() {
                let infos = handle.infos();
                assert_eq!(infos.file_name, "session.tzx");
                thread::sleep(Duration::from_millis(1));
            }
            handle.infos()
        })
    };

    player.wait().unwrap();

    let last = status.join().unwrap();
    assert!(!last.playing);
}

#[test]
fn bookmark_survives_playback() {
    let mut player = TapePlayer::new(rendered_tape());
    let handle = player.handle();
    handle.seek(2_000);
    handle.save_current_pos();

    player.start(|| Ok(MemorySink::new())).unwrap();
    player.wait().unwrap();
    assert_eq!(handle.position(), handle.infos().total_bytes);

    assert_eq!(handle.go_to_saved_pos(), 2_000);
}
