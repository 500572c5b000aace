// Configuration management
//
// Player settings persisted as TOML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::apu::constants::DEFAULT_SAMPLE_RATE;
use crate::debug::LogLevel;

/// Default configuration file path
pub const CONFIG_FILE: &str = "player_config.toml";

/// Queued samples above which the player stops feeding the sink
pub const DEFAULT_LOW_WATERMARK: usize = 16384;

/// Player configuration
///
/// Missing sections or keys in a config file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlayerConfig {
    /// Audio output settings
    pub audio: AudioSettings,

    /// Playlist and looping
    pub playback: PlaybackSettings,

    /// Logging
    pub logging: LoggingSettings,
}

/// Audio output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Enable the audio device
    pub enabled: bool,

    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Volume (0.0-1.0)
    pub volume: f32,

    /// Device ring buffer length in milliseconds
    pub buffer_duration_ms: u32,

    /// Queued samples above which the player waits for the device
    pub low_watermark: usize,
}

/// Playlist and looping settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Folder scanned when no files are given
    pub media_folder: PathBuf,

    /// Extra passes through the loop section of looping files
    pub loop_count: u32,

    /// File extension of playable files
    pub extension: String,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level
    pub level: LogLevel,

    /// Trace every register write and wait (needs level "trace")
    pub trace_writes: bool,

    /// Trace log file
    pub log_file: Option<PathBuf>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        AudioSettings {
            enabled: true,
            sample_rate: DEFAULT_SAMPLE_RATE,
            volume: 0.5,
            buffer_duration_ms: 500,
            low_watermark: DEFAULT_LOW_WATERMARK,
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        PlaybackSettings {
            media_folder: PathBuf::from("."),
            loop_count: 0,
            extension: "vgm".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: LogLevel::Info,
            trace_writes: false,
            log_file: None,
        }
    }
}

impl PlayerConfig {
    /// Load configuration from the default file or create default
    ///
    /// If the configuration file doesn't exist, creates a default configuration
    /// and saves it to the file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nes_apu::player::PlayerConfig;
    ///
    /// let config = PlayerConfig::load_or_default();
    /// ```
    pub fn load_or_default() -> Self {
        Self::load_from(CONFIG_FILE).unwrap_or_else(|_| {
            let config = Self::default();
            // Try to save the default config, but don't fail if we can't
            let _ = config.save_to(CONFIG_FILE);
            config
        })
    }

    /// Load configuration from a file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, io::Error> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save configuration to a file
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), io::Error> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)
    }
}
