//! VGM command stream decoding
//!
//! ```text
//! 0x61 nn nn            wait nn samples (little endian)
//! 0x62                  wait 735 samples (one 60 Hz frame)
//! 0x63                  wait 882 samples (one 50 Hz frame)
//! 0x66                  end of sound data
//! 0x67 0x66 tt ss*4 ..  data block of type tt and size ss
//! 0x70-0x7F             wait (n & 0x0F) + 1 samples
//! 0xB4 aa dd            NES APU write: dd to $4000 + aa
//! ```

use super::VgmError;

pub const CMD_WAIT: u8 = 0x61;
pub const CMD_WAIT_60HZ: u8 = 0x62;
pub const CMD_WAIT_50HZ: u8 = 0x63;
pub const CMD_END: u8 = 0x66;
pub const CMD_DATA_BLOCK: u8 = 0x67;
pub const CMD_NES_APU_WRITE: u8 = 0xB4;

/// Rate of the sample counts in wait commands, whatever the output rate
pub const VGM_SAMPLE_RATE: u32 = 44_100;

/// Samples in one NTSC frame at 44.1 kHz
pub const SAMPLES_60HZ: u32 = 735;
/// Samples in one PAL frame at 44.1 kHz
pub const SAMPLES_50HZ: u32 = 882;

/// Data block type holding NES APU RAM (DMC samples)
pub const DATA_BLOCK_NES_APU_RAM: u8 = 0xC2;

/// One decoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VgmCommand<'a> {
    /// Write `value` to APU register `$4000 + register`
    ApuWrite { register: u8, value: u8 },
    /// Advance by this many 44.1 kHz samples
    Wait(u32),
    /// Embedded data block
    DataBlock { kind: u8, data: &'a [u8] },
    /// End of sound data
    End,
}

impl VgmCommand<'_> {
    /// CPU address targeted by an APU write
    pub fn apu_address(register: u8) -> u16 {
        0x4000 + register as u16
    }
}

/// Sequential decoder over the command area of a VGM file
///
/// Running off the end of the stream without an end command reads as
/// [`VgmCommand::End`].
#[derive(Debug, Clone)]
pub struct CommandReader<'a> {
    data: &'a [u8],
    position: usize,
    end: usize,
    done: bool,
}

impl<'a> CommandReader<'a> {
    /// Reader over `data[start..end]`
    pub fn new(data: &'a [u8], start: usize, end: usize) -> Self {
        let end = end.min(data.len());
        Self {
            data,
            position: start.min(end),
            end,
            done: false,
        }
    }

    /// Offset of the next command
    pub fn position(&self) -> usize {
        self.position
    }

    /// Decode the command at the current position and advance past it
    pub fn next_command(&mut self) -> Result<VgmCommand<'a>, VgmError> {
        let offset = self.position;
        let Some(&command) = self.data[..self.end].get(offset) else {
            return Ok(VgmCommand::End);
        };

        let decoded = match command {
            CMD_END => {
                self.position += 1;
                VgmCommand::End
            }
            CMD_NES_APU_WRITE => {
                let args = self.args(offset, 2)?;
                VgmCommand::ApuWrite {
                    register: args[0],
                    value: args[1],
                }
            }
            CMD_WAIT => {
                let args = self.args(offset, 2)?;
                VgmCommand::Wait(u16::from_le_bytes([args[0], args[1]]) as u32)
            }
            CMD_WAIT_60HZ => {
                self.position += 1;
                VgmCommand::Wait(SAMPLES_60HZ)
            }
            CMD_WAIT_50HZ => {
                self.position += 1;
                VgmCommand::Wait(SAMPLES_50HZ)
            }
            0x70..=0x7F => {
                self.position += 1;
                VgmCommand::Wait((command & 0x0F) as u32 + 1)
            }
            CMD_DATA_BLOCK => self.data_block(offset)?,
            _ => return Err(VgmError::UnknownCommand { command, offset }),
        };

        Ok(decoded)
    }

    /// Take `count` argument bytes after the opcode at `offset`
    fn args(&mut self, offset: usize, count: usize) -> Result<&'a [u8], VgmError> {
        let start = offset + 1;
        let data: &'a [u8] = self.data;
        let args = data
            .get(start..start + count)
            .filter(|_| start + count <= self.end)
            .ok_or(VgmError::Truncated { offset })?;
        self.position = start + count;
        Ok(args)
    }

    fn data_block(&mut self, offset: usize) -> Result<VgmCommand<'a>, VgmError> {
        // 0x66 compatibility byte, type, 32-bit size
        let header = self.args(offset, 6)?;
        let kind = header[1];
        let size = u32::from_le_bytes([header[2], header[3], header[4], header[5]]);

        let start = self.position;
        let end = start
            .checked_add(size as usize)
            .filter(|&end| end <= self.end)
            .ok_or(VgmError::DataBlockOutOfBounds { offset, size })?;
        self.position = end;

        Ok(VgmCommand::DataBlock {
            kind,
            data: &self.data[start..end],
        })
    }
}

impl<'a> Iterator for CommandReader<'a> {
    type Item = Result<VgmCommand<'a>, VgmError>;

    /// Yields commands up to and including the first end command or error
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_command();
        if matches!(result, Ok(VgmCommand::End) | Err(_)) {
            self.done = true;
        }
        Some(result)
    }
}
