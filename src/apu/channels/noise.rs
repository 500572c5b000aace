//! Noise channel

use serde::{Deserialize, Serialize};

use crate::apu::components::{Envelope, LengthCounter, Timer};
use crate::apu::constants::NOISE_PERIOD_TABLE;

/// Pseudo-random generator driven by a 15-bit LFSR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseChannel {
    pub(crate) enabled: bool,
    pub(crate) envelope: Envelope,
    pub(crate) length_counter: LengthCounter,
    /// Clocked on APU cycles (every other CPU cycle)
    pub(crate) timer: Timer,
    pub(crate) lfsr: u16,
    /// Short mode (`$400E` bit 7): feedback from bit 6 instead of bit 1
    pub(crate) mode: bool,
}

impl Default for NoiseChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseChannel {
    pub fn new() -> Self {
        Self {
            enabled: false,
            envelope: Envelope::new(),
            length_counter: LengthCounter::new(),
            timer: Timer::new(),
            lfsr: 1,
            mode: false,
        }
    }

    /// Write one of `$400C-$400F` (`address & 3`); `$400D` is unused
    pub fn write(&mut self, register: u8, value: u8) {
        match register & 0x03 {
            0 => {
                self.length_counter.set_halt(value & 0x20 != 0);
                self.envelope.write_control(value);
            }
            1 => {}
            2 => self.write_mode_and_period(value),
            _ => {
                if self.enabled {
                    self.length_counter.load(value >> 3);
                }
                self.envelope.restart();
            }
        }
    }

    fn write_mode_and_period(&mut self, value: u8) {
        self.mode = value & 0x80 != 0;

        // Table entries are CPU cycles; the timer counts APU cycles
        let cpu_period = NOISE_PERIOD_TABLE[(value & 0x0F) as usize];
        self.timer.set_period_direct(cpu_period / 2 - 1);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length_counter.clear();
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.length_counter.is_active()
    }

    pub fn clock_timer(&mut self) {
        if self.timer.clock() {
            self.shift();
        }
    }

    /// One LFSR step: bit 0 XOR the tap bit feeds bit 14
    pub(crate) fn shift(&mut self) {
        let tap = if self.mode { 6 } else { 1 };
        let feedback = (self.lfsr ^ (self.lfsr >> tap)) & 1;
        self.lfsr = (self.lfsr >> 1) | (feedback << 14);
    }

    pub fn clock_envelope(&mut self) {
        self.envelope.clock();
    }

    pub fn clock_length_counter(&mut self) {
        self.length_counter.clock();
    }

    /// Current output level (0-15); silent while LFSR bit 0 is set
    pub fn output(&self) -> u8 {
        match self.lfsr & 1 == 0 && self.is_active() {
            true => self.envelope.volume(),
            false => 0,
        }
    }
}
