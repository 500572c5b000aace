//! Envelope generator shared by the pulse and noise channels

use serde::{Deserialize, Serialize};

/// Envelope generator
///
/// Produces either a constant volume or a sawtooth that decays from 15 to 0
/// once per divider period, optionally looping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Start flag, set by a write to the channel's length register
    pub(crate) start: bool,
    divider: u8,
    /// Decay level counter (0-15)
    pub(crate) decay_level: u8,
    /// Divider period, doubles as the constant volume
    pub(crate) period: u8,
    /// Loop flag (register bit 5, shared with length counter halt)
    pub(crate) loop_flag: bool,
    /// Constant volume flag (register bit 4)
    pub(crate) constant_volume: bool,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quarter-frame clock
    pub fn clock(&mut self) {
        if self.start {
            self.start = false;
            self.decay_level = 15;
            self.divider = self.period;
            return;
        }

        if self.divider > 0 {
            self.divider -= 1;
            return;
        }

        self.divider = self.period;
        if self.decay_level > 0 {
            self.decay_level -= 1;
        } else if self.loop_flag {
            self.decay_level = 15;
        }
    }

    /// Current volume (0-15)
    pub fn volume(&self) -> u8 {
        if self.constant_volume {
            self.period
        } else {
            self.decay_level
        }
    }

    /// Decode bits 5-0 of a channel's first register
    pub fn write_control(&mut self, data: u8) {
        self.loop_flag = data & 0x20 != 0;
        self.constant_volume = data & 0x10 != 0;
        self.period = data & 0x0F;
    }

    pub fn restart(&mut self) {
        self.start = true;
    }
}
