//! Triangle channel

use serde::{Deserialize, Serialize};

use crate::apu::components::{LengthCounter, LinearCounter, Timer};
use crate::apu::constants::{
    UltrasonicPolicy, TRIANGLE_SEQUENCE, TRIANGLE_ULTRASONIC_PERIOD, TRIANGLE_ULTRASONIC_POLICY,
};

/// 32-step triangle generator gated by a linear and a length counter
///
/// There is no volume control: the output is the current step of
/// [`TRIANGLE_SEQUENCE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangleChannel {
    pub(crate) enabled: bool,
    pub(crate) linear_counter: LinearCounter,
    pub(crate) length_counter: LengthCounter,
    /// Clocked every CPU cycle
    pub(crate) timer: Timer,
    pub(crate) sequence_position: u8,
    policy: UltrasonicPolicy,
}

impl Default for TriangleChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl TriangleChannel {
    pub fn new() -> Self {
        Self::with_policy(TRIANGLE_ULTRASONIC_POLICY)
    }

    pub fn with_policy(policy: UltrasonicPolicy) -> Self {
        Self {
            enabled: false,
            linear_counter: LinearCounter::new(),
            length_counter: LengthCounter::new(),
            timer: Timer::new(),
            sequence_position: 0,
            policy,
        }
    }

    /// Write one of `$4008-$400B` (`address & 3`); `$4009` is unused
    pub fn write(&mut self, register: u8, value: u8) {
        match register & 0x03 {
            0 => {
                // The control bit doubles as the length counter halt
                self.length_counter.set_halt(value & 0x80 != 0);
                self.linear_counter.write_control(value);
            }
            1 => {}
            2 => self.timer.set_period_low(value),
            _ => {
                self.timer.set_period_high(value);
                if self.enabled {
                    self.length_counter.load(value >> 3);
                }
                self.linear_counter.request_reload();
            }
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length_counter.clear();
        }
    }

    /// Both counters running, so the sequencer advances
    pub fn is_active(&self) -> bool {
        self.enabled && self.linear_counter.is_active() && self.length_counter.is_active()
    }

    fn is_ultrasonic(&self) -> bool {
        self.timer.period < TRIANGLE_ULTRASONIC_PERIOD
    }

    pub fn clock_timer(&mut self) {
        let expired = self.timer.clock();
        let gated = !self.linear_counter.is_active() || !self.length_counter.is_active();
        let frozen = self.is_ultrasonic() && self.policy == UltrasonicPolicy::Freeze;

        if expired && !gated && !frozen {
            self.sequence_position = (self.sequence_position + 1) % 32;
        }
    }

    pub fn clock_linear_counter(&mut self) {
        self.linear_counter.clock();
    }

    pub fn clock_length_counter(&mut self) {
        self.length_counter.clock();
    }

    /// Current output level (0-15)
    ///
    /// A sequencer stopped by its counters keeps driving the step it stopped
    /// on; only disabling the channel drops the output to 0.
    pub fn output(&self) -> u8 {
        let silenced = self.is_ultrasonic() && self.policy == UltrasonicPolicy::Silence;
        if !self.enabled || silenced {
            0
        } else {
            TRIANGLE_SEQUENCE[self.sequence_position as usize]
        }
    }
}
