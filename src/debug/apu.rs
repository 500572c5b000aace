// APU state capture for trace logs and verbose output

use crate::apu::{Apu, Channel, FrameMode};

/// Snapshot of one tone channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    /// Timer period (noise: period in CPU cycles, DMC: rate in CPU cycles)
    pub period: u16,
    /// Length counter (DMC: bytes remaining, clamped)
    pub length: u8,
    /// Current output level
    pub output: u8,
}

/// APU state snapshot
///
/// Contains the register-visible state of every channel at a specific
/// point in time.
#[derive(Debug, Clone)]
pub struct ApuState {
    /// CPU cycles since reset
    pub cycles: u64,

    /// Frame counter mode
    pub frame_mode: FrameMode,

    /// Frame counter step within the current sequence
    pub frame_step: usize,

    /// $4015 as it would read, without clearing the frame IRQ
    pub status: u8,

    pub pulse1: ChannelState,
    pub pulse2: ChannelState,
    pub triangle: ChannelState,
    pub noise: ChannelState,
    pub dmc: ChannelState,

    /// Triangle linear counter
    pub linear_counter: u8,

    /// Noise short-mode flag
    pub noise_short_mode: bool,

    /// Mixed output of the current channel levels
    pub output: f32,
}

impl ApuState {
    /// Capture the current state of `apu`
    pub fn capture(apu: &Apu) -> Self {
        let channel = |channel: Channel, period: u16| ChannelState {
            period,
            length: apu.length_counter(channel),
            output: apu.channel_output(channel),
        };

        Self {
            cycles: apu.cycles(),
            frame_mode: apu.frame_mode(),
            frame_step: apu.frame_counter.step(),
            status: apu.peek_status(),
            pulse1: channel(Channel::Pulse1, apu.pulse1.timer.period),
            pulse2: channel(Channel::Pulse2, apu.pulse2.timer.period),
            triangle: channel(Channel::Triangle, apu.triangle.timer.period),
            noise: channel(Channel::Noise, apu.noise.timer.period),
            dmc: channel(Channel::Dmc, apu.dmc.timer.period),
            linear_counter: apu.triangle.linear_counter.count,
            noise_short_mode: apu.noise.mode,
            output: apu.current_output(),
        }
    }

    /// Format the status register as flag letters, e.g. "IF..T21"
    ///
    /// Bits follow $4015 from bit 7 down (bit 5 is skipped); a clear bit
    /// shows as '.'.
    pub fn format_status(&self) -> String {
        const FLAGS: [(u8, char); 7] = [
            (0x80, 'I'),
            (0x40, 'F'),
            (0x10, 'D'),
            (0x08, 'N'),
            (0x04, 'T'),
            (0x02, '2'),
            (0x01, '1'),
        ];

        FLAGS
            .iter()
            .map(|&(mask, flag)| if self.status & mask != 0 { flag } else { '.' })
            .collect()
    }
}

impl std::fmt::Display for ApuState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.frame_mode {
            FrameMode::FourStep => 4,
            FrameMode::FiveStep => 5,
        };
        write!(
            f,
            "APU[{:10}] F{}:{} [{}] P1:{:03X}/{:3}/{:2} P2:{:03X}/{:3}/{:2} \
             T:{:03X}/{:3}/{:2} N:{:03X}/{:3}/{:2} D:{:03X}/{:3}/{:3} OUT:{:.4}",
            self.cycles,
            mode,
            self.frame_step,
            self.format_status(),
            self.pulse1.period,
            self.pulse1.length,
            self.pulse1.output,
            self.pulse2.period,
            self.pulse2.length,
            self.pulse2.output,
            self.triangle.period,
            self.triangle.length,
            self.triangle.output,
            self.noise.period,
            self.noise.length,
            self.noise.output,
            self.dmc.period,
            self.dmc.length,
            self.dmc.output,
            self.output
        )
    }
}
