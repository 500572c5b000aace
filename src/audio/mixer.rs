// Audio mixer - Implements NES APU non-linear mixing formula
//
// The NES sums its channels through two resistor ladders, so the output is
// not a linear average of the channel levels. The formulas below are the
// standard closed-form approximation of that network.

use serde::{Deserialize, Serialize};

/// APU mixer implementing the NES non-linear mixing formula
///
/// ```text
/// pulse_out = 95.88 / (8128 / (pulse1 + pulse2) + 100)
/// tnd_out = 159.79 / (1 / (triangle/8227 + noise/12241 + dmc/22638) + 100)
/// output = pulse_out + tnd_out
/// ```
///
/// Channel levels are 0-15 for pulse, triangle and noise and 0-127 for the
/// DMC. The result lies in `[0.0, 1.0]` before the master volume is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mixer {
    /// Volume control (0.0 = mute, 1.0 = full volume)
    volume: f32,
}

impl Mixer {
    /// Create a new mixer with full volume
    pub fn new() -> Self {
        Self { volume: 1.0 }
    }

    /// Create a new mixer with the given volume, clamped to `[0.0, 1.0]`
    pub fn with_volume(volume: f32) -> Self {
        Self {
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Mix all APU channels using the non-linear formula
    ///
    /// # Returns
    ///
    /// Mixed sample in `[0.0, 1.0]`, 0.0 when every channel is 0
    pub fn mix(&self, pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> f32 {
        let mixed = mix_pulse(pulse1, pulse2) + mix_tnd(triangle, noise, dmc);
        (mixed * self.volume).clamp(0.0, 1.0)
    }

    /// Convert a mixed sample to 8-bit unsigned PCM
    pub fn to_u8(sample: f32) -> u8 {
        (sample.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulse group: `95.88 / (8128 / (pulse1 + pulse2) + 100)`
fn mix_pulse(pulse1: u8, pulse2: u8) -> f32 {
    let pulse_sum = pulse1 as f32 + pulse2 as f32;

    if pulse_sum == 0.0 {
        return 0.0;
    }

    95.88 / (8128.0 / pulse_sum + 100.0)
}

/// Triangle/noise/DMC group:
/// `159.79 / (1 / (triangle/8227 + noise/12241 + dmc/22638) + 100)`
fn mix_tnd(triangle: u8, noise: u8, dmc: u8) -> f32 {
    let tnd_sum = triangle as f32 / 8227.0 + noise as f32 / 12241.0 + dmc as f32 / 22638.0;

    if tnd_sum == 0.0 {
        return 0.0;
    }

    159.79 / (1.0 / tnd_sum + 100.0)
}
