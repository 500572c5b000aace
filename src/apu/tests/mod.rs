//! APU unit tests
//!
//! Register decoding, channel behaviour through the register interface and
//! frame counter timing, organized by functionality.

use super::*;

// ========================================
// Test Constants (APU Register Addresses)
// ========================================

pub(crate) const PULSE1_CONTROL: u16 = 0x4000;
pub(crate) const PULSE1_TIMER_LOW: u16 = 0x4002;
pub(crate) const PULSE1_LENGTH: u16 = 0x4003;
pub(crate) const TRIANGLE_CONTROL: u16 = 0x4008;
pub(crate) const TRIANGLE_LENGTH: u16 = 0x400B;
pub(crate) const NOISE_CONTROL: u16 = 0x400C;
pub(crate) const NOISE_LENGTH: u16 = 0x400F;
pub(crate) const STATUS: u16 = 0x4015;
pub(crate) const FRAME_COUNTER: u16 = 0x4017;

/// Run `cycles` CPU cycles, discarding samples
pub(crate) fn run_cycles(apu: &mut Apu, cycles: u32) {
    apu.clock_with(cycles, |_| {});
}

mod init_tests;
