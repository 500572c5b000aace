//! Divider that sets the pitch of a channel

use serde::{Deserialize, Serialize};

/// Down-counting timer
///
/// Counts from `period` to 0 and signals on the clock where it reloads, so
/// it fires once every `period + 1` clocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Period (11 bits for pulse and triangle)
    pub(crate) period: u16,
    counter: u16,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock the timer, returning true when it reloads
    pub fn clock(&mut self) -> bool {
        if self.counter == 0 {
            self.counter = self.period;
            true
        } else {
            self.counter -= 1;
            false
        }
    }

    /// Replace the low 8 bits of the period
    pub fn set_period_low(&mut self, low: u8) {
        self.period = (self.period & 0x0700) | low as u16;
    }

    /// Replace the high 3 bits of the period
    pub fn set_period_high(&mut self, high: u8) {
        self.period = (self.period & 0x00FF) | ((high as u16 & 0x07) << 8);
    }

    pub fn set_period_direct(&mut self, period: u16) {
        self.period = period;
    }

    pub fn period(&self) -> u16 {
        self.period
    }
}
