//! Sweep unit for pitch bending on the pulse channels

use serde::{Deserialize, Serialize};

use crate::apu::constants::{PULSE_MIN_PERIOD, SWEEP_MAX_TARGET};

/// How the sweep adder negates the period change
///
/// Pulse 1 feeds the adder a one's complement, pulse 2 a two's complement,
/// so the same settings bend pulse 1 one step lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegateMode {
    OnesComplement,
    TwosComplement,
}

/// Sweep unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sweep {
    enabled: bool,
    divider: u8,
    period: u8,
    negate: bool,
    shift: u8,
    reload: bool,
    pub(crate) negate_mode: NegateMode,
}

impl Sweep {
    pub fn new(negate_mode: NegateMode) -> Self {
        Self {
            enabled: false,
            divider: 0,
            period: 0,
            negate: false,
            shift: 0,
            reload: false,
            negate_mode,
        }
    }

    /// Target period the adder is continuously computing
    ///
    /// A negated change larger than the period saturates at zero, which
    /// the next clock turns into a muted (period < 8) channel.
    pub fn target_period(&self, current_period: u16) -> u16 {
        let change = current_period >> self.shift;
        if !self.negate {
            return current_period + change;
        }
        match self.negate_mode {
            NegateMode::OnesComplement => current_period.saturating_sub(change + 1),
            NegateMode::TwosComplement => current_period - change,
        }
    }

    /// Whether the sweep unit silences the channel for `current_period`
    ///
    /// Muting applies even when the sweep is disabled or the shift is zero.
    pub fn is_muting(&self, current_period: u16) -> bool {
        current_period < PULSE_MIN_PERIOD || self.target_period(current_period) > SWEEP_MAX_TARGET
    }

    /// Half-frame clock, returning the new period when the adder updates it
    pub fn clock(&mut self, current_period: u16) -> Option<u16> {
        let mut update = None;

        if self.divider == 0 && self.enabled && self.shift > 0 && !self.is_muting(current_period) {
            update = Some(self.target_period(current_period));
        }

        if self.divider == 0 || self.reload {
            self.divider = self.period;
            self.reload = false;
        } else {
            self.divider -= 1;
        }

        update
    }

    /// Decode `$4001` / `$4005`
    pub fn write_control(&mut self, data: u8) {
        self.enabled = data & 0x80 != 0;
        self.period = (data >> 4) & 0x07;
        self.negate = data & 0x08 != 0;
        self.shift = data & 0x07;
        self.reload = true;
    }
}
