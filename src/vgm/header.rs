//! VGM file header
//!
//! Only the fields the NES player uses are decoded. All offsets stored in
//! the header are relative to the position of the field itself.

use super::VgmError;

/// File signature at offset 0
pub const VGM_SIGNATURE: &[u8; 4] = b"Vgm ";

/// Size of the fixed part of the header every version carries
pub const MIN_HEADER_SIZE: usize = 0x40;

/// Data start used when the data offset field is 0 (versions before 1.50)
pub const LEGACY_DATA_OFFSET: usize = 0x40;

const EOF_OFFSET_FIELD: usize = 0x04;
const VERSION_FIELD: usize = 0x08;
const TOTAL_SAMPLES_FIELD: usize = 0x18;
const LOOP_OFFSET_FIELD: usize = 0x1C;
const LOOP_SAMPLES_FIELD: usize = 0x20;
const DATA_OFFSET_FIELD: usize = 0x34;
const NES_APU_CLOCK_FIELD: usize = 0x84;

/// Clock value bits; bit 31 flags the FDS add-on, bit 30 a dual chip
const CLOCK_MASK: u32 = 0x3FFF_FFFF;

/// Parsed VGM header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VgmHeader {
    /// BCD version, e.g. 0x0161 for 1.61
    pub version: u32,
    /// Absolute offset where the command stream ends
    pub end_offset: usize,
    /// Total length in samples (44.1 kHz units)
    pub total_samples: u32,
    /// Absolute offset of the loop point, if the file loops
    pub loop_offset: Option<usize>,
    /// Length of the looped section in samples
    pub loop_samples: u32,
    /// Absolute offset of the first command
    pub data_offset: usize,
    /// NES APU clock in Hz, when the header declares one
    pub nes_apu_clock: Option<u32>,
}

impl VgmHeader {
    /// Parse the header at the start of `data`
    ///
    /// # Errors
    ///
    /// [`VgmError::InvalidHeader`] when the file is shorter than
    /// [`MIN_HEADER_SIZE`] or the signature is wrong, and
    /// [`VgmError::InvalidDataOffset`] when the data offset points past the
    /// end of the file.
    pub fn parse(data: &[u8]) -> Result<Self, VgmError> {
        if data.len() < MIN_HEADER_SIZE || &data[0..4] != VGM_SIGNATURE {
            return Err(VgmError::InvalidHeader);
        }

        let size = data.len();

        let data_offset = match read_u32(data, DATA_OFFSET_FIELD) {
            Some(0) | None => LEGACY_DATA_OFFSET,
            Some(relative) => DATA_OFFSET_FIELD + relative as usize,
        };
        if data_offset >= size {
            return Err(VgmError::InvalidDataOffset {
                offset: data_offset,
                size,
            });
        }

        // A missing or bogus EOF field falls back to the file size
        let end_offset = match read_u32(data, EOF_OFFSET_FIELD) {
            Some(relative) if relative > 0 => {
                let end = EOF_OFFSET_FIELD + relative as usize;
                if end > data_offset {
                    end.min(size)
                } else {
                    size
                }
            }
            _ => size,
        };

        let loop_offset = match read_u32(data, LOOP_OFFSET_FIELD) {
            Some(relative) if relative > 0 => {
                let offset = LOOP_OFFSET_FIELD + relative as usize;
                (offset >= data_offset && offset < end_offset).then_some(offset)
            }
            _ => None,
        };

        // The clock field only exists when the header reaches past it
        let nes_apu_clock = if data_offset >= NES_APU_CLOCK_FIELD + 4 {
            read_u32(data, NES_APU_CLOCK_FIELD)
                .map(|clock| clock & CLOCK_MASK)
                .filter(|&clock| clock != 0)
        } else {
            None
        };

        Ok(Self {
            version: read_u32(data, VERSION_FIELD).unwrap_or(0),
            end_offset,
            total_samples: read_u32(data, TOTAL_SAMPLES_FIELD).unwrap_or(0),
            loop_offset,
            loop_samples: read_u32(data, LOOP_SAMPLES_FIELD).unwrap_or(0),
            data_offset,
            nes_apu_clock,
        })
    }

    /// Version as "major.minor", e.g. "1.61"
    pub fn version_string(&self) -> String {
        format!("{:X}.{:02X}", self.version >> 8, self.version & 0xFF)
    }
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
