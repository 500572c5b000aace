// VGM playback integration tests
//
// End-to-end runs of synthetic VGM streams through the player and the APU:
// - exact sample counts for waits
// - audible output for a configured pulse channel
// - deterministic output across runs and snapshot/restore
// - error reporting and moving on to the next file

mod common;

use common::{audible_stream, reference_stream, temp_dir, VgmBuilder};
use nes_apu::apu::{Apu, ApuSnapshot};
use nes_apu::audio::{AudioSink, Mixer, NullSink, PcmRecorder, Tee};
use nes_apu::player::{PlaybackStatus, Player, Playlist};
use nes_apu::vgm::VgmError;
use std::fs;

/// Collects raw float samples
#[derive(Default)]
struct FloatSink {
    samples: Vec<f32>,
}

impl AudioSink for FloatSink {
    fn push_sample(&mut self, sample: f32) -> bool {
        self.samples.push(sample);
        true
    }

    fn queued(&self) -> usize {
        0
    }
}

fn play_bytes(data: Vec<u8>) -> (Result<PlaybackStatus, VgmError>, Vec<f32>) {
    let mut player = Player::default();
    player.load_bytes(data).expect("Failed to load stream");
    let mut sink = FloatSink::default();
    let status = player.pump(&mut sink);
    (status, sink.samples)
}

// ========================================
// End-to-end stream
// ========================================

#[test]
fn test_reference_stream_yields_one_frame_and_finishes() {
    let (status, samples) = play_bytes(reference_stream().build());

    assert_eq!(status.unwrap(), PlaybackStatus::Finished);
    assert_eq!(samples.len(), 735);
}

#[test]
fn test_audible_stream_has_pulse_output() {
    let mut player = Player::default();
    player.load_bytes(audible_stream().build()).unwrap();

    let mut sink = FloatSink::default();
    assert_eq!(player.pump(&mut sink).unwrap(), PlaybackStatus::Finished);
    assert_eq!(sink.samples.len(), 735);

    // $4015 = 0x01 leaves pulse 1 as the only channel, so the output swings
    // between silence and a full-volume pulse
    let min = sink.samples.iter().cloned().fold(f32::MAX, f32::min);
    let max = sink.samples.iter().cloned().fold(f32::MIN, f32::max);
    let pulse_step = Mixer::new().mix(15, 0, 0, 0, 0);
    assert_eq!(min, 0.0);
    assert!((max - pulse_step).abs() < 1e-6, "max {}", max);
    assert_eq!(player.apu().peek_status() & 0x01, 0x01);
}

#[test]
fn test_zero_volume_pulse_adds_nothing() {
    let (_, quiet) = play_bytes(reference_stream().build());
    let (_, silent) = play_bytes(VgmBuilder::new().write(0x15, 0x00).wait(735).end().build());
    assert_eq!(quiet, silent);
}

#[test]
fn test_repeated_frames_keep_exact_counts() {
    let mut builder = audible_stream();
    for _ in 0..59 {
        builder = builder.wait_frame();
    }
    let (status, samples) = play_bytes(builder.end().build());

    assert_eq!(status.unwrap(), PlaybackStatus::Finished);
    assert_eq!(samples.len(), 735 * 60);
}

// ========================================
// Determinism
// ========================================

#[test]
fn test_identical_streams_produce_identical_samples() {
    let stream = audible_stream().build();
    let (_, first) = play_bytes(stream.clone());
    let (_, second) = play_bytes(stream);
    assert_eq!(first, second);
}

#[test]
fn test_split_clocking_matches_single_run() {
    let mut whole = Apu::new();
    let mut split = Apu::new();
    for apu in [&mut whole, &mut split] {
        apu.power_on();
        apu.cpu_write(0x4015, 0x0F);
        apu.cpu_write(0x4000, 0xBF);
        apu.cpu_write(0x4002, 0x40);
        apu.cpu_write(0x4003, 0x08);
        apu.cpu_write(0x400C, 0x3F);
        apu.cpu_write(0x400E, 0x03);
        apu.cpu_write(0x400F, 0x08);
    }

    whole.clock(100_000);
    for chunk in [1, 2, 3, 29_830, 7, 70_157] {
        split.clock(chunk);
    }

    assert_eq!(whole.take_samples(), split.take_samples());
}

#[test]
fn test_snapshot_restore_reproduces_output() {
    let mut apu = Apu::new();
    apu.power_on();
    apu.cpu_write(0x4015, 0x0F);
    apu.cpu_write(0x4000, 0xBF);
    apu.cpu_write(0x4002, 0x40);
    apu.cpu_write(0x4003, 0x08);
    apu.cpu_write(0x400C, 0x3F);
    apu.cpu_write(0x400F, 0x08);
    apu.clock(12_345);
    apu.take_samples();

    let json = apu.snapshot().to_json().unwrap();

    apu.clock(50_000);
    let expected = apu.take_samples();

    let mut restored = Apu::new();
    restored
        .restore(&ApuSnapshot::from_json(&json).unwrap())
        .unwrap();
    restored.clock(50_000);

    assert_eq!(restored.take_samples(), expected);
}

// ========================================
// Loops and data blocks
// ========================================

#[test]
fn test_loop_point_before_end() {
    let data = VgmBuilder::new()
        .write(0x15, 0x01)
        .wait(100)
        .loop_here()
        .wait(200)
        .end()
        .build();

    let mut player = Player::default();
    player.set_loop_count(3);
    player.load_bytes(data).unwrap();

    let mut sink = NullSink::new();
    player.pump(&mut sink).unwrap();
    assert_eq!(sink.samples(), 100 + 200 * 4);
}

#[test]
fn test_dmc_sample_from_data_block_plays() {
    let data = VgmBuilder::new()
        .dmc_data(0xC000, &[0xFF; 16])
        .write(0x10, 0x0F) // Fastest rate
        .write(0x11, 0x00)
        .write(0x12, 0x00) // $C000
        .write(0x13, 0x01) // 17 bytes
        .write(0x15, 0x10)
        .wait(735)
        .end()
        .build();

    let mut player = Player::default();
    player.load_bytes(data).unwrap();
    player.pump(&mut NullSink::new()).unwrap();

    // All-ones bytes push the DAC up by 2 per bit
    assert!(player.apu().dmc_output() > 100);
}

#[test]
fn test_header_apu_clock_is_used() {
    let data = audible_stream().apu_clock(1_662_607).build();
    let mut player = Player::default();
    player.load_bytes(data).unwrap();
    assert_eq!(player.apu().cpu_clock(), 1_662_607);

    let mut sink = NullSink::new();
    player.pump(&mut sink).unwrap();
    assert_eq!(sink.samples(), 735);
}

// ========================================
// Errors and playlists
// ========================================

#[test]
fn test_unknown_command_is_reported() {
    let data = VgmBuilder::new().wait(10).raw(&[0x5A, 0x00, 0x00]).end().build();
    let (status, samples) = play_bytes(data);

    assert!(matches!(
        status,
        Err(VgmError::UnknownCommand { command: 0x5A, .. })
    ));
    // Samples before the bad command were delivered
    assert_eq!(samples.len(), 10);
}

#[test]
fn test_truncated_stream_is_reported() {
    let data = VgmBuilder::new().raw(&[0xB4, 0x00]).build();
    let (status, _) = play_bytes(data);
    assert!(matches!(status, Err(VgmError::Truncated { .. })));
}

#[test]
fn test_missing_end_marker_finishes() {
    let (status, samples) = play_bytes(VgmBuilder::new().wait(5).build());
    assert_eq!(status.unwrap(), PlaybackStatus::Finished);
    assert_eq!(samples.len(), 5);
}

#[test]
fn test_failed_file_does_not_stop_playlist() {
    let dir = temp_dir("playlist");
    fs::write(dir.join("1_good.vgm"), reference_stream().build()).unwrap();
    fs::write(dir.join("2_bad_header.vgm"), b"not a vgm file").unwrap();
    fs::write(
        dir.join("3_bad_command.vgm"),
        VgmBuilder::new().raw(&[0xFF]).build(),
    )
    .unwrap();
    fs::write(dir.join("4_good.vgm"), audible_stream().build()).unwrap();

    let playlist = Playlist::from_folder(&dir, "vgm").unwrap();
    assert_eq!(playlist.len(), 4);

    let mut player = Player::default();
    let mut sink = NullSink::new();
    let mut finished = 0;
    let mut failed = 0;
    for path in playlist.files() {
        let result = player
            .load_file(path)
            .and_then(|()| player.play(&mut sink));
        match result {
            Ok(()) => finished += 1,
            Err(_) => failed += 1,
        }
    }

    assert_eq!((finished, failed), (2, 2));
    assert_eq!(sink.samples(), 735 * 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_pcm_dump_matches_float_output() {
    let data = audible_stream().build();

    let mut player = Player::default();
    player.load_bytes(data).unwrap();
    let mut floats = FloatSink::default();
    let mut recorder = PcmRecorder::new();
    {
        let mut sink = Tee {
            first: &mut floats,
            second: &mut recorder,
        };
        player.pump(&mut sink).unwrap();
    }

    let expected: Vec<u8> = floats.samples.iter().map(|&s| Mixer::to_u8(s)).collect();
    assert_eq!(recorder.data(), expected.as_slice());

    let dir = temp_dir("pcm");
    let path = dir.join("out.u8");
    recorder.write_to(&path).unwrap();
    assert_eq!(fs::read(&path).unwrap().len(), 735);
    let _ = fs::remove_dir_all(&dir);
}
