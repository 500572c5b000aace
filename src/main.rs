// NES VGM Player - Main Entry Point
//
// Plays NES APU VGM files through the default audio device, one after the
// other. Files that fail to load or contain bad commands are reported and
// skipped.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::Parser;

use nes_apu::audio::{AudioSink, NullSink, PcmRecorder, Tee};
use nes_apu::debug::{ApuState, LogLevel};
use nes_apu::player::{Player, PlayerConfig, Playlist};

#[derive(Parser)]
#[command(name = "nes-vgm-player")]
#[command(about = "Play NES APU VGM files")]
#[command(version)]
struct Cli {
    /// VGM files or folders (defaults to the configured media folder)
    paths: Vec<PathBuf>,

    /// Configuration file (defaults to player_config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the output as raw 8-bit unsigned mono PCM
    #[arg(long, value_name = "PATH")]
    dump_pcm: Option<PathBuf>,

    /// Do not open the audio device
    #[arg(long)]
    no_audio: bool,

    /// Extra passes through the loop section of looping files
    #[arg(short, long)]
    loops: Option<u32>,

    /// Print file headers and the final APU state of each file
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    println!("NES VGM Player (nes-apu) v{}", env!("CARGO_PKG_VERSION"));
    println!("==============================");
    println!();

    let mut config = match &cli.config {
        Some(path) => PlayerConfig::load_from(path)?,
        None => PlayerConfig::load_or_default(),
    };
    if cli.no_audio {
        config.audio.enabled = false;
    }
    if let Some(loops) = cli.loops {
        config.playback.loop_count = loops;
    }
    if cli.verbose && config.logging.level < LogLevel::Debug {
        config.logging.level = LogLevel::Debug;
    }

    let mut playlist = if cli.paths.is_empty() {
        Playlist::from_folder(&config.playback.media_folder, &config.playback.extension)?
    } else {
        Playlist::from_paths(&cli.paths, &config.playback.extension)?
    };
    if playlist.is_empty() {
        println!("No .{} files found.", config.playback.extension);
        return Ok(());
    }

    let mut player = match Player::from_config(&config) {
        Ok(player) => player,
        Err(e) => {
            eprintln!("Failed to open log file: {}", e);
            config.logging.log_file = None;
            Player::from_config(&config)?
        }
    };

    let mut device = open_device(&config);
    let mut recorder = cli.dump_pcm.as_ref().map(|_| PcmRecorder::new());

    while let Some(path) = playlist.current() {
        match &mut recorder {
            Some(recorder) => {
                let mut sink = Tee {
                    first: &mut device,
                    second: recorder,
                };
                play_file(&mut player, path, &mut sink, cli.verbose);
            }
            None => play_file(&mut player, path, &mut device, cli.verbose),
        }
        playlist.advance();
    }

    wait_for_drain(&device);

    if let (Some(path), Some(recorder)) = (&cli.dump_pcm, &recorder) {
        recorder.write_to(path)?;
        println!(
            "Wrote {} samples of 8-bit PCM to '{}'",
            recorder.len(),
            path.display()
        );
    }

    Ok(())
}

/// Open the audio device, falling back to a silent sink
fn open_device(config: &PlayerConfig) -> Box<dyn AudioSink> {
    if !config.audio.enabled {
        return Box::new(NullSink::new());
    }

    #[cfg(feature = "audio")]
    {
        use nes_apu::audio::{AudioConfig, AudioSystem};

        let audio_config = AudioConfig::new()
            .with_sample_rate(config.audio.sample_rate)
            .with_buffer_duration(config.audio.buffer_duration_ms);

        match AudioSystem::new(audio_config) {
            Ok(system) => {
                println!(
                    "Audio output: {} Hz, {} sample buffer",
                    config.audio.sample_rate,
                    system.buffer_capacity()
                );
                return Box::new(system);
            }
            Err(e) => eprintln!("Audio unavailable, continuing without sound: {}", e),
        }
    }

    #[cfg(not(feature = "audio"))]
    eprintln!("Built without the audio feature, continuing without sound");

    Box::new(NullSink::new())
}

fn play_file<S: AudioSink + ?Sized>(player: &mut Player, path: &Path, sink: &mut S, verbose: bool) {
    println!("Playing file: {}", path.display());

    if let Err(e) = player.load_file(path) {
        eprintln!("Failed to load VGM file: {}: {}", path.display(), e);
        return;
    }

    if verbose {
        if let Some(header) = player.header() {
            println!(
                "  VGM {} | {:.1}s | loop {}",
                header.version_string(),
                header.total_samples as f64 / 44100.0,
                if header.loop_offset.is_some() { "yes" } else { "no" }
            );
        }
    }

    match player.play(sink) {
        Ok(()) => println!("End of VGM stream"),
        Err(e) => eprintln!("Error during playback of file {}: {}", path.display(), e),
    }

    if verbose {
        println!("  {}", ApuState::capture(player.apu()));
    }
}

/// Let the device play out what is still queued
fn wait_for_drain<S: AudioSink + ?Sized>(sink: &S) {
    while sink.queued() > 0 {
        thread::sleep(Duration::from_millis(10));
    }
}
