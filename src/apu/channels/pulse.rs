//! Pulse (square wave) channel, used for both pulse 1 and pulse 2

use serde::{Deserialize, Serialize};

use crate::apu::components::{Envelope, LengthCounter, NegateMode, Sweep, Timer};
use crate::apu::constants::DUTY_PATTERNS;

/// Square wave generator with envelope, sweep and length counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseChannel {
    pub(crate) enabled: bool,
    /// Row of [`DUTY_PATTERNS`]
    pub(crate) duty: u8,
    /// Column of [`DUTY_PATTERNS`], advanced on every timer expiry
    pub(crate) duty_position: u8,
    pub(crate) envelope: Envelope,
    pub(crate) sweep: Sweep,
    pub(crate) length_counter: LengthCounter,
    /// Clocked on APU cycles (every other CPU cycle)
    pub(crate) timer: Timer,
}

impl PulseChannel {
    /// Pulse 1 negates with [`NegateMode::OnesComplement`], pulse 2 with
    /// [`NegateMode::TwosComplement`]
    pub fn new(negate_mode: NegateMode) -> Self {
        Self {
            enabled: false,
            duty: 0,
            duty_position: 0,
            envelope: Envelope::new(),
            sweep: Sweep::new(negate_mode),
            length_counter: LengthCounter::new(),
            timer: Timer::new(),
        }
    }

    /// Write one of the channel's four registers (`address & 3`)
    pub fn write(&mut self, register: u8, value: u8) {
        match register & 0x03 {
            0 => self.write_control(value),
            1 => self.sweep.write_control(value),
            2 => self.timer.set_period_low(value),
            _ => self.write_length_and_timer_high(value),
        }
    }

    /// `DDLC VVVV`: duty, length halt / envelope loop, constant volume, volume
    fn write_control(&mut self, value: u8) {
        self.duty = value >> 6;
        self.length_counter.set_halt(value & 0x20 != 0);
        self.envelope.write_control(value);
    }

    /// `LLLL LHHH`: starts a note
    fn write_length_and_timer_high(&mut self, value: u8) {
        self.timer.set_period_high(value);
        if self.enabled {
            self.length_counter.load(value >> 3);
        }
        self.envelope.restart();
        self.duty_position = 0;
    }

    /// `$4015` enable bit; disabling zeroes the length counter
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
            self.duty_position = (self.duty_position + 1) & 0x07;
        }
    }

    pub fn clock_envelope(&mut self) {
        self.envelope.clock();
    }

    pub fn clock_length_counter(&mut self) {
        self.length_counter.clock();
    }

    pub fn clock_sweep(&mut self) {
        if let Some(period) = self.sweep.clock(self.timer.period) {
            self.timer.set_period_direct(period);
        }
    }

    /// Current output level (0-15)
    pub fn output(&self) -> u8 {
        let high = DUTY_PATTERNS[self.duty as usize][self.duty_position as usize] != 0;
        if high && self.is_active() && !self.sweep.is_muting(self.timer.period) {
            self.envelope.volume()
        } else {
            0
        }
    }
}
