// APU snapshots
//
// Captures the complete chip state (channels, frame counter, sample memory
// and sample clock phase) so playback can be resumed or compared exactly.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use super::Apu;
use crate::bus::SAMPLE_MEMORY_SIZE;

/// Errors that can occur while saving or restoring a snapshot
#[derive(Debug)]
pub enum SnapshotError {
    /// I/O error
    Io(io::Error),

    /// Serialization/deserialization error
    Serialization(serde_json::Error),

    /// Snapshot version mismatch
    VersionMismatch { expected: u32, found: u32 },

    /// Sample memory is not the 32KB the DMC addresses
    InvalidSampleMemory { expected: usize, found: usize },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "I/O error: {}", e),
            SnapshotError::Serialization(e) => write!(f, "Serialization error: {}", e),
            SnapshotError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            SnapshotError::InvalidSampleMemory { expected, found } => {
                write!(
                    f,
                    "Invalid sample memory: expected {} bytes, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Io(e) => Some(e),
            SnapshotError::Serialization(e) => Some(e),
            SnapshotError::VersionMismatch { .. } | SnapshotError::InvalidSampleMemory { .. } => {
                None
            }
        }
    }
}

impl From<io::Error> for SnapshotError {
    fn from(e: io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Serialization(e)
    }
}

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Saved APU state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApuSnapshot {
    version: u32,

    /// RFC 3339 local time the snapshot was taken
    timestamp: String,

    apu: Apu,
}

impl ApuSnapshot {
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Apu {
    /// Capture the current state
    ///
    /// Buffered samples are not part of the snapshot.
    pub fn snapshot(&self) -> ApuSnapshot {
        let mut apu = self.clone();
        apu.samples = Vec::new();

        ApuSnapshot {
            version: SNAPSHOT_VERSION,
            timestamp: chrono::Local::now().to_rfc3339(),
            apu,
        }
    }

    /// Restore a captured state, keeping this APU's sample buffer
    ///
    /// A rejected snapshot leaves this APU untouched.
    pub fn restore(&mut self, snapshot: &ApuSnapshot) -> Result<(), SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }

        let memory_size = snapshot.apu.bus.size();
        if memory_size != SAMPLE_MEMORY_SIZE {
            return Err(SnapshotError::InvalidSampleMemory {
                expected: SAMPLE_MEMORY_SIZE,
                found: memory_size,
            });
        }

        let mut samples = std::mem::take(&mut self.samples);
        samples.clear();

        *self = snapshot.apu.clone();
        self.samples = samples;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_error_display() {
        let err = SnapshotError::VersionMismatch {
            expected: 1,
            found: 2,
        };
        assert_eq!(err.to_string(), "Version mismatch: expected 1, found 2");
    }

    #[test]
    fn test_snapshot_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test");
        let err: SnapshotError = io_err.into();
        assert!(matches!(err, SnapshotError::Io(_)));
    }

    #[test]
    fn test_restore_reproduces_output() {
        let mut apu = Apu::new();
        apu.power_on();
        apu.cpu_write(0x4000, 0xBF);
        apu.cpu_write(0x4002, 0xFD);
        apu.cpu_write(0x4003, 0x08);
        apu.clock(5000);
        apu.take_samples();

        let snapshot = apu.snapshot();
        apu.clock(20_000);
        let first = apu.take_samples();

        apu.restore(&snapshot).unwrap();
        apu.clock(20_000);
        let second = apu.take_samples();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_round_trip_keeps_state() {
        let mut apu = Apu::new();
        apu.power_on();
        apu.load_sample_memory(0xC000, &[0xAA, 0x55]);
        apu.clock(1234);

        let json = apu.snapshot().to_json().unwrap();
        let restored = ApuSnapshot::from_json(&json).unwrap();

        let mut other = Apu::new();
        other.restore(&restored).unwrap();
        assert_eq!(other.cycles(), 1234);
        assert_eq!(other.sample_bus(), apu.sample_bus());
        assert_eq!(other.peek_status(), apu.peek_status());
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let mut snapshot = Apu::new().snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;

        let mut apu = Apu::new();
        let err = apu.restore(&snapshot).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::VersionMismatch { expected: 1, found: 2 }
        ));
    }

    #[test]
    fn test_truncated_sample_memory_is_rejected() {
        let json = Apu::new().snapshot().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["apu"]["bus"]["memory"] = serde_json::json!([0, 0, 0]);
        let snapshot = ApuSnapshot::from_json(&value.to_string()).unwrap();

        let mut apu = Apu::new();
        apu.power_on();
        apu.cpu_write(0x4010, 0x0F);
        apu.cpu_write(0x4015, 0x10);

        let err = apu.restore(&snapshot).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::InvalidSampleMemory {
                expected: SAMPLE_MEMORY_SIZE,
                found: 3
            }
        ));
        assert_eq!(
            err.to_string(),
            "Invalid sample memory: expected 32768 bytes, found 3"
        );

        // Still the original APU, with its DMC fetching from full memory
        assert_eq!(apu.sample_bus().size(), SAMPLE_MEMORY_SIZE);
        apu.clock(1000);
        assert_eq!(apu.cycles(), 1000);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "nes_apu_snapshot_{}.json",
            std::process::id()
        ));

        let mut apu = Apu::new();
        apu.power_on();
        apu.snapshot().save_to_file(&path).unwrap();

        let loaded = ApuSnapshot::load_from_file(&path).unwrap();
        assert_eq!(loaded.version(), SNAPSHOT_VERSION);
        assert!(!loaded.timestamp().is_empty());
        std::fs::remove_file(&path).unwrap();
    }
}
