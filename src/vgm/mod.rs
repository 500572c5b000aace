// VGM module - Reader for VGM register-log files
//
// A VGM file is a header followed by a stream of commands: chip register
// writes, waits measured in 44.1 kHz samples and embedded data blocks. This
// module only decodes; replaying the commands into the APU is the player's
// job.

pub mod command;
pub mod error;
pub mod header;

pub use command::{CommandReader, VgmCommand};
pub use error::VgmError;
pub use header::VgmHeader;

use std::fs;
use std::path::Path;

/// A loaded VGM file with its parsed header
#[derive(Debug, Clone)]
pub struct VgmFile {
    data: Vec<u8>,
    header: VgmHeader,
}

impl VgmFile {
    /// Validate and wrap raw file contents
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, VgmError> {
        let header = VgmHeader::parse(&data)?;
        Ok(Self { data, header })
    }

    /// Read and validate a file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VgmError> {
        let data = fs::read(path)?;
        Self::from_bytes(data)
    }

    pub fn header(&self) -> &VgmHeader {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Commands from the start of the data area
    pub fn commands(&self) -> CommandReader<'_> {
        self.commands_from(self.header.data_offset)
    }

    /// Commands from an absolute file offset
    pub fn commands_from(&self, offset: usize) -> CommandReader<'_> {
        CommandReader::new(&self.data, offset, self.header.end_offset)
    }
}
