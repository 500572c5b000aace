use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development tasks for nes-apu")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// fmt check, clippy, build and the full test suite
    Ci,
    /// Format the workspace
    Fmt {
        /// Only report unformatted files
        #[arg(long)]
        check: bool,
    },
    /// Lint with warnings denied
    Clippy,
    /// Run tests, optionally restricted to one area
    Test {
        #[arg(long, value_enum)]
        only: Option<Area>,
        /// Include doc tests
        #[arg(long)]
        doc: bool,
    },
    /// Criterion benchmarks
    Bench {
        /// Benchmark name filter, e.g. `apu_clock`
        filter: Option<String>,
    },
    /// Play a VGM file or folder with the player binary
    Play {
        path: String,
        /// Write raw 8-bit PCM output to this file
        #[arg(long)]
        dump_pcm: Option<String>,
        #[arg(long)]
        no_audio: bool,
        #[arg(long)]
        release: bool,
    },
}

/// Test areas, matched against module paths
#[derive(Clone, Copy, ValueEnum)]
enum Area {
    Apu,
    Vgm,
    Player,
    Audio,
    /// Integration tests under tests/
    Playback,
}

impl Area {
    fn label(self) -> &'static str {
        match self {
            Area::Apu => "APU",
            Area::Vgm => "VGM reader",
            Area::Player => "Player",
            Area::Audio => "Audio",
            Area::Playback => "Playback integration",
        }
    }
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Task::Ci => ci(),
        Task::Fmt { check } => fmt(check),
        Task::Clippy => clippy(),
        Task::Test { only, doc } => test(only, doc),
        Task::Bench { filter } => bench(filter.as_deref()),
        Task::Play {
            path,
            dump_pcm,
            no_audio,
            release,
        } => play(&path, dump_pcm.as_deref(), no_audio, release),
    }
}

fn ci() -> Result<()> {
    println!("{}", "=== nes-apu CI ===".bold().blue());
    let start = Instant::now();

    step("fmt", || fmt(true))?;
    step("clippy", clippy)?;
    step("build", || run(cargo("build").arg("--all-targets")))?;
    step("test", || test(None, true))?;

    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["fmt", "--all"]);
    if check {
        cmd.args(["--", "--check"]);
    }
    run(&mut cmd)
}

fn clippy() -> Result<()> {
    run(cargo("clippy")
        .arg("--all-targets")
        .args(["--", "-D", "warnings"]))
}

fn test(only: Option<Area>, doc: bool) -> Result<()> {
    let Some(area) = only else {
        run(&mut cargo("test"))?;
        if doc {
            run(cargo("test").arg("--doc"))?;
        }
        return Ok(());
    };

    println!("{} {} tests", "→".blue(), area.label().bold());
    let mut cmd = cargo("test");
    match area {
        Area::Apu => cmd.args(["--lib", "apu::"]),
        Area::Vgm => cmd.args(["--lib", "vgm::"]),
        Area::Player => cmd.args(["--lib", "player::"]),
        Area::Audio => cmd.args(["--lib", "audio::"]),
        Area::Playback => cmd.args(["--test", "vgm_playback"]),
    };

    run(&mut cmd).with_context(|| format!("{} tests failed", area.label()))?;
    println!("{} {} tests passed", "✓".green(), area.label());
    Ok(())
}

fn bench(filter: Option<&str>) -> Result<()> {
    let mut cmd = cargo("bench");
    cmd.args(["--bench", "apu_bench"]);
    if let Some(filter) = filter {
        cmd.args(["--", filter]);
    }
    run(&mut cmd)
}

fn play(path: &str, dump_pcm: Option<&str>, no_audio: bool, release: bool) -> Result<()> {
    if !Path::new(path).exists() {
        println!("{} No such file or folder: {}", "✗".red().bold(), path.yellow());
        bail!("VGM path not found");
    }

    println!("{} {}", "♪".blue(), path.cyan());
    if let Some(dump) = dump_pcm {
        println!("{} PCM dump: {}", "→".blue(), dump.cyan());
    }

    let mut cmd = Command::new("cargo");
    cmd.arg("run");
    if release {
        cmd.arg("--release");
    }
    if no_audio {
        // The player binary can still dump PCM without a device
        cmd.arg("--no-default-features");
    }
    cmd.args(["--bin", "nes-vgm-player", "--", path]);
    if let Some(dump) = dump_pcm {
        cmd.args(["--dump-pcm", dump]);
    }
    if no_audio {
        cmd.arg("--no-audio");
    }

    let start = Instant::now();
    run(&mut cmd).context("Playback failed")?;
    println!(
        "{} Finished in {:.2}s",
        "✓".green().bold(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Cargo invocation with the feature set for this machine: CI runners have
/// no ALSA, so they build without the cpal backend
fn cargo(subcommand: &str) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg(subcommand);
    if std::env::var_os("CI").is_some() {
        cmd.arg("--no-default-features");
    } else {
        cmd.arg("--all-features");
    }
    cmd
}

fn step<F>(name: &str, task: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    println!("{} {}", "→".blue(), name.bold());
    let start = Instant::now();
    task().with_context(|| format!("step `{}` failed", name))?;
    println!(
        "{} {} ({:.2}s)",
        "✓".green(),
        name,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn run(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("could not start {:?}", cmd.get_program()))?;

    if !status.success() {
        bail!("{:?} exited with {}", cmd.get_program(), status);
    }
    Ok(())
}
