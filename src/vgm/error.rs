// VGM stream errors
//
// Every error is terminal for the file being played; the player reports it
// and moves on to the next file.

use std::io;

/// Errors raised while reading a VGM file or its command stream
#[derive(Debug)]
pub enum VgmError {
    /// I/O error while reading the file
    Io(io::Error),

    /// File shorter than the fixed header or missing the `"Vgm "` signature
    InvalidHeader,

    /// Data offset points outside the file
    InvalidDataOffset { offset: usize, size: usize },

    /// Command at `offset` runs past the end of the stream
    Truncated { offset: usize },

    /// Opcode not understood by the player
    UnknownCommand { command: u8, offset: usize },

    /// Data block at `offset` declares more bytes than the stream holds
    DataBlockOutOfBounds { offset: usize, size: u32 },
}

impl std::fmt::Display for VgmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VgmError::Io(e) => write!(f, "I/O error: {}", e),
            VgmError::InvalidHeader => write!(f, "Invalid VGM header"),
            VgmError::InvalidDataOffset { offset, size } => {
                write!(
                    f,
                    "Invalid data offset: 0x{:X} (file size 0x{:X})",
                    offset, size
                )
            }
            VgmError::Truncated { offset } => {
                write!(f, "Truncated command at offset 0x{:X}", offset)
            }
            VgmError::UnknownCommand { command, offset } => {
                write!(
                    f,
                    "Unknown VGM command: 0x{:02X} at offset 0x{:X}",
                    command, offset
                )
            }
            VgmError::DataBlockOutOfBounds { offset, size } => {
                write!(
                    f,
                    "Data block at offset 0x{:X} of {} bytes exceeds the stream",
                    offset, size
                )
            }
        }
    }
}

impl std::error::Error for VgmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VgmError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for VgmError {
    fn from(e: io::Error) -> Self {
        VgmError::Io(e)
    }
}
