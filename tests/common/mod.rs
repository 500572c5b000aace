// Common test utilities for VGM playback integration tests
//
// Builds synthetic VGM files in memory so tests do not depend on music
// files being present.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

/// Size of the fixed VGM header
pub const HEADER_SIZE: usize = 0x40;

/// Builder for a minimal NES VGM file
#[derive(Debug, Default, Clone)]
pub struct VgmBuilder {
    commands: Vec<u8>,
    loop_at: Option<usize>,
    apu_clock: Option<u32>,
}

impl VgmBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// APU write to `$4000 + register`
    pub fn write(mut self, register: u8, value: u8) -> Self {
        self.commands.extend_from_slice(&[0xB4, register, value]);
        self
    }

    /// Wait `samples` samples with the 0x61 command
    pub fn wait(mut self, samples: u16) -> Self {
        self.commands.push(0x61);
        self.commands.extend_from_slice(&samples.to_le_bytes());
        self
    }

    /// One 60 Hz frame (0x62)
    pub fn wait_frame(mut self) -> Self {
        self.commands.push(0x62);
        self
    }

    /// NES APU RAM data block loaded at `start`
    pub fn dmc_data(mut self, start: u16, bytes: &[u8]) -> Self {
        let size = (bytes.len() + 2) as u32;
        self.commands.extend_from_slice(&[0x67, 0x66, 0xC2]);
        self.commands.extend_from_slice(&size.to_le_bytes());
        self.commands.extend_from_slice(&start.to_le_bytes());
        self.commands.extend_from_slice(bytes);
        self
    }

    /// Raw bytes, for malformed streams
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.commands.extend_from_slice(bytes);
        self
    }

    /// Mark the current position as the loop point
    pub fn loop_here(mut self) -> Self {
        self.loop_at = Some(self.commands.len());
        self
    }

    /// Declare a NES APU clock in an extended header
    pub fn apu_clock(mut self, clock: u32) -> Self {
        self.apu_clock = Some(clock);
        self
    }

    pub fn end(mut self) -> Self {
        self.commands.push(0x66);
        self
    }

    /// Serialize to file contents
    pub fn build(&self) -> Vec<u8> {
        let header_size = if self.apu_clock.is_some() { 0x100 } else { HEADER_SIZE };
        let mut data = vec![0u8; header_size];
        data[0..4].copy_from_slice(b"Vgm ");
        data[0x08..0x0C].copy_from_slice(&0x0161u32.to_le_bytes());

        let eof = (header_size + self.commands.len()) as u32;
        data[0x04..0x08].copy_from_slice(&(eof - 0x04).to_le_bytes());

        if header_size > HEADER_SIZE {
            data[0x34..0x38].copy_from_slice(&(header_size as u32 - 0x34).to_le_bytes());
        }
        if let Some(clock) = self.apu_clock {
            data[0x84..0x88].copy_from_slice(&clock.to_le_bytes());
        }
        if let Some(offset) = self.loop_at {
            let absolute = (header_size + offset) as u32;
            data[0x1C..0x20].copy_from_slice(&(absolute - 0x1C).to_le_bytes());
        }

        data.extend_from_slice(&self.commands);
        data
    }
}

/// The stream from the reference end-to-end scenario: pulse 1 set up, one
/// NTSC frame of waiting, end
pub fn reference_stream() -> VgmBuilder {
    VgmBuilder::new()
        .write(0x00, 0x30)
        .write(0x02, 0x00)
        .write(0x03, 0x08)
        .write(0x15, 0x01)
        .wait(735)
        .end()
}

/// Same shape with an audible pulse: constant volume 15, period 0x0FD
pub fn audible_stream() -> VgmBuilder {
    VgmBuilder::new()
        .write(0x00, 0xBF)
        .write(0x02, 0xFD)
        .write(0x03, 0x08)
        .write(0x15, 0x01)
        .wait(735)
        .end()
}

/// Fresh temporary directory for one test
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nes_apu_it_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}
