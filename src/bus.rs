// Bus module - Memory-mapped device trait and the DMC sample bus
//
// The APU only sees two address ranges: its own registers and the
// cartridge space the DMC fetches sample bytes from. The sample bus stands in
// for the cartridge and is filled from VGM data blocks.
//
// # Address ranges
//
// ```text
// $4000-$4013: Channel registers (write only)
// $4015:       Status / channel enable
// $4017:       Frame counter (write)
// $8000-$FFFF: Sample memory (DMC reads)
// ```

use serde::{Deserialize, Serialize};

/// Trait for memory-mapped components
///
/// Components implementing this trait handle read and write operations for
/// their own address range.
pub trait MemoryMappedDevice {
    /// Read a byte from the device
    ///
    /// Some devices have side effects on read (reading `$4015` clears the
    /// frame IRQ), so this method takes `&mut self`.
    fn read(&mut self, addr: u16) -> u8;

    /// Write a byte to the device
    fn write(&mut self, addr: u16, data: u8);
}

/// First address of sample memory
pub const SAMPLE_MEMORY_START: u16 = 0x8000;

/// Size of sample memory ($8000-$FFFF)
pub const SAMPLE_MEMORY_SIZE: usize = 0x8000;

/// 32KB of sample memory at $8000-$FFFF
///
/// Reads below $8000 return 0. Writes through [`SampleBus::load`] wrap from
/// $FFFF back to $8000 the same way DMC fetches do.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleBus {
    memory: Vec<u8>,
}

impl SampleBus {
    /// Create a zero-filled sample bus
    pub fn new() -> Self {
        Self {
            memory: vec![0; SAMPLE_MEMORY_SIZE],
        }
    }

    /// Copy `data` into sample memory starting at `start`
    ///
    /// Start addresses below $8000 are mirrored into the sample range.
    /// Returns the number of bytes copied, at most 32KB.
    pub fn load(&mut self, start: u16, data: &[u8]) -> usize {
        let mut offset = (start as usize) & (SAMPLE_MEMORY_SIZE - 1);
        let count = data.len().min(SAMPLE_MEMORY_SIZE);

        for &byte in &data[..count] {
            self.memory[offset] = byte;
            offset = (offset + 1) & (SAMPLE_MEMORY_SIZE - 1);
        }

        count
    }

    pub fn clear(&mut self) {
        self.memory.fill(0);
    }

    /// Bytes of backing memory; [`SAMPLE_MEMORY_SIZE`] unless deserialized
    /// from a damaged snapshot
    pub fn size(&self) -> usize {
        self.memory.len()
    }
}

impl Default for SampleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SampleBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.memory.iter().filter(|&&b| b != 0).count();
        f.debug_struct("SampleBus")
            .field("non_zero_bytes", &used)
            .finish()
    }
}

impl MemoryMappedDevice for SampleBus {
    fn read(&mut self, addr: u16) -> u8 {
        if addr < SAMPLE_MEMORY_START {
            return 0;
        }
        self.memory[(addr - SAMPLE_MEMORY_START) as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        if addr >= SAMPLE_MEMORY_START {
            self.memory[(addr - SAMPLE_MEMORY_START) as usize] = data;
        }
    }
}
