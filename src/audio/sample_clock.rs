// Sample clock - Decides which CPU cycles end on an output sample
//
// The APU runs at the CPU clock (about 1.79 MHz) while audio hardware wants
// 44.1 or 48 kHz. The clock keeps an integer remainder instead of a float
// time position, so the number of samples emitted over any run of cycles is
// exact and the output never drifts.

use serde::{Deserialize, Serialize};

use crate::apu::constants::{DEFAULT_SAMPLE_RATE, NTSC_CPU_CLOCK};

/// Integer CPU-cycle to sample-rate divider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleClock {
    /// Input rate (CPU cycles per second)
    cpu_clock: u32,
    /// Output rate (samples per second)
    sample_rate: u32,
    /// Accumulated `sample_rate` units since the last sample
    remainder: u64,
}

impl SampleClock {
    /// Create a sample clock
    ///
    /// A zero `sample_rate` is raised to 1 so the clock never divides by
    /// zero.
    pub fn new(cpu_clock: u32, sample_rate: u32) -> Self {
        Self {
            cpu_clock: cpu_clock.max(1),
            sample_rate: sample_rate.max(1),
            remainder: 0,
        }
    }

    /// NTSC CPU clock to 44.1 kHz
    pub fn new_44_1_khz() -> Self {
        Self::new(NTSC_CPU_CLOCK, DEFAULT_SAMPLE_RATE)
    }

    /// Advance by one CPU cycle, returning true when a sample is due
    pub fn tick(&mut self) -> bool {
        self.remainder += self.sample_rate as u64;
        if self.remainder >= self.cpu_clock as u64 {
            self.remainder -= self.cpu_clock as u64;
            true
        } else {
            false
        }
    }

    /// Number of CPU cycles that produce exactly `samples` output samples
    /// from a freshly reset clock
    pub fn cycles_for_samples(&self, samples: u64) -> u64 {
        (samples * self.cpu_clock as u64).div_ceil(self.sample_rate as u64)
    }

    pub fn reset(&mut self) {
        self.remainder = 0;
    }

    pub fn cpu_clock(&self) -> u32 {
        self.cpu_clock
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Default for SampleClock {
    fn default() -> Self {
        Self::new_44_1_khz()
    }
}
