// NES APU Library
// Cycle-accurate 2A03 APU core and a VGM player built on it

// Public modules
pub mod apu;
pub mod audio;
pub mod bus;
pub mod debug;
pub mod player;
pub mod vgm;

// Re-export main types for convenience
pub use apu::{Apu, ApuSnapshot, Channel, SnapshotError};
pub use audio::{AudioSink, Mixer, NullSink, PcmRecorder, SampleClock, Tee};
#[cfg(feature = "audio")]
pub use audio::{AudioConfig, AudioOutput, AudioSystem};
pub use bus::{MemoryMappedDevice, SampleBus};
pub use debug::{ApuState, LogLevel, Logger, TraceEntry};
pub use player::{PlaybackStatus, Player, PlayerConfig, Playlist};
pub use vgm::{VgmCommand, VgmError, VgmFile, VgmHeader};
