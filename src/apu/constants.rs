//! APU constants and lookup tables

use serde::{Deserialize, Serialize};

/// NES CPU clock rate (NTSC) in Hz
pub const NTSC_CPU_CLOCK: u32 = 1_789_773;

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Length counter lookup table
/// Maps the 5-bit length counter load value to the actual counter value
pub const LENGTH_COUNTER_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

/// Duty cycle patterns for pulse channels
/// Each pattern is 8 steps, representing one full cycle of the square wave
pub const DUTY_PATTERNS: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0], // 12.5% duty cycle
    [0, 1, 1, 0, 0, 0, 0, 0], // 25% duty cycle
    [0, 1, 1, 1, 1, 0, 0, 0], // 50% duty cycle
    [1, 0, 0, 1, 1, 1, 1, 1], // 75% duty cycle (inverted 25%)
];

/// Triangle wave sequence for triangle channel
/// 32-step sequence from 15 down to 0, then back up to 15
pub const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

/// Noise channel period lookup table
/// Maps the 4-bit period value to the actual timer period (in CPU cycles)
/// NTSC values
pub const NOISE_PERIOD_TABLE: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// DMC rate lookup table (in CPU cycles per output bit), NTSC values
pub const DMC_RATE_TABLE: [u16; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

/// CPU cycles at which each 4-step sequencer step fires
pub const FRAME_COUNTER_4_STEP_CYCLES: [u32; 4] = [7457, 14913, 22371, 29829];

/// First CPU cycle of the 4-step frame IRQ (held through the wrap cycle)
pub const FRAME_COUNTER_4_STEP_IRQ_START: u32 = 29828;

/// Length of one 4-step sequence in CPU cycles
pub const FRAME_COUNTER_4_STEP_PERIOD: u32 = 29830;

/// CPU cycles at which each 5-step sequencer step fires; the fourth one
/// (29829) clocks nothing
pub const FRAME_COUNTER_5_STEP_CYCLES: [u32; 5] = [7457, 14913, 22371, 29829, 37281];

/// Length of one 5-step sequence in CPU cycles
pub const FRAME_COUNTER_5_STEP_PERIOD: u32 = 37282;

/// Pulse timer periods below this value mute the channel
pub const PULSE_MIN_PERIOD: u16 = 8;

/// Largest period the sweep unit may target before muting the channel
pub const SWEEP_MAX_TARGET: u16 = 0x7FF;

/// Triangle timer periods below this value are ultrasonic
pub const TRIANGLE_ULTRASONIC_PERIOD: u16 = 2;

/// How the triangle channel treats ultrasonic timer periods (0 and 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UltrasonicPolicy {
    /// Stop the sequencer and hold the current step's value
    Freeze,
    /// Output 0 while the period is ultrasonic
    Silence,
}

/// Policy used by the triangle channel
pub const TRIANGLE_ULTRASONIC_POLICY: UltrasonicPolicy = UltrasonicPolicy::Freeze;

/// Register values written by [`crate::apu::Apu::power_on`] to `$4000-$4013`
///
/// Pulse and noise start at constant volume 0 with halted length counters,
/// the triangle starts with its control flag set.
pub const POWER_ON_REGISTERS: [u8; 20] = [
    0x30, 0x08, 0x00, 0x00, // Pulse 1
    0x30, 0x08, 0x00, 0x00, // Pulse 2
    0x80, 0x00, 0x00, 0x00, // Triangle
    0x30, 0x00, 0x00, 0x00, // Noise
    0x00, 0x00, 0x00, 0x00, // DMC
];

/// Value written to `$4015` at power-on (pulse, triangle and noise enabled)
pub const POWER_ON_STATUS: u8 = 0x0F;

/// Value written to `$4017` at power-on (4-step mode, IRQ inhibited)
pub const POWER_ON_FRAME_COUNTER: u8 = 0x40;
