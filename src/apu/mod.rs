// APU module - Audio Processing Unit (2A03) implementation
//
// The APU is driven from outside: register writes arrive through `cpu_write`
// and time advances through `clock`/`step`, one CPU cycle at a time. Each
// cycle clocks the channel timers and the frame counter; whenever the sample
// clock marks a sample boundary the five channel outputs are mixed into one
// sample.
//
// # Register Map
//
// ```text
// $4000-$4003: Pulse 1
// $4004-$4007: Pulse 2
// $4008-$400B: Triangle
// $400C-$400F: Noise
// $4010-$4013: DMC
// $4015:       Status (write: channel enable, read: length/IRQ flags)
// $4017:       Frame counter control (write)
// ```

pub mod channels;
pub mod components;
pub mod constants;
pub mod snapshot;

pub use channels::{DmcChannel, NoiseChannel, PulseChannel, TriangleChannel};
pub use components::{FrameEvent, FrameMode, NegateMode};
pub use snapshot::{ApuSnapshot, SnapshotError};

use serde::{Deserialize, Serialize};

use crate::audio::{Mixer, SampleClock};
use crate::bus::{MemoryMappedDevice, SampleBus};
use components::FrameCounter;
use constants::{POWER_ON_FRAME_COUNTER, POWER_ON_REGISTERS, POWER_ON_STATUS};

/// Initial capacity of the internal sample buffer (a little over one 60 Hz frame)
const SAMPLE_BUFFER_CAPACITY: usize = 1024;

/// One of the five APU channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Pulse1,
    Pulse2,
    Triangle,
    Noise,
    Dmc,
}

impl Channel {
    /// All channels in register order
    pub const ALL: [Channel; 5] = [
        Channel::Pulse1,
        Channel::Pulse2,
        Channel::Triangle,
        Channel::Noise,
        Channel::Dmc,
    ];

    /// Bit of this channel in the $4015 status register
    pub fn status_bit(self) -> u8 {
        match self {
            Channel::Pulse1 => 0x01,
            Channel::Pulse2 => 0x02,
            Channel::Triangle => 0x04,
            Channel::Noise => 0x08,
            Channel::Dmc => 0x10,
        }
    }
}

/// APU structure representing the Audio Processing Unit state
///
/// All chip state lives here, including the sample memory the DMC reads
/// from, so independent instances never share anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Apu {
    pub(crate) pulse1: PulseChannel,
    pub(crate) pulse2: PulseChannel,
    pub(crate) triangle: TriangleChannel,
    pub(crate) noise: NoiseChannel,
    pub(crate) dmc: DmcChannel,
    pub(crate) frame_counter: FrameCounter,

    /// Sample memory for DMC reads ($8000-$FFFF)
    bus: SampleBus,

    mixer: Mixer,
    sample_clock: SampleClock,

    /// CPU cycles since reset
    cycles: u64,

    /// Samples produced by `clock` and not yet drained
    #[serde(skip)]
    samples: Vec<f32>,
}

impl Apu {
    /// Create a new APU at NTSC clock rate and 44.1 kHz output
    ///
    /// All channels start disabled; call [`Apu::power_on`] to load the
    /// power-on register values before replaying a stream.
    pub fn new() -> Self {
        Self::with_clock_rates(
            constants::NTSC_CPU_CLOCK,
            constants::DEFAULT_SAMPLE_RATE,
        )
    }

    /// Create a new APU with a custom CPU clock and output sample rate
    pub fn with_clock_rates(cpu_clock: u32, sample_rate: u32) -> Self {
        Self {
            pulse1: PulseChannel::new(NegateMode::OnesComplement),
            pulse2: PulseChannel::new(NegateMode::TwosComplement),
            triangle: TriangleChannel::new(),
            noise: NoiseChannel::new(),
            dmc: DmcChannel::new(),
            frame_counter: FrameCounter::new(),
            bus: SampleBus::new(),
            mixer: Mixer::new(),
            sample_clock: SampleClock::new(cpu_clock, sample_rate),
            cycles: 0,
            samples: Vec::with_capacity(SAMPLE_BUFFER_CAPACITY),
        }
    }

    /// Change the clock rates; the sample phase restarts
    pub fn set_clock_rates(&mut self, cpu_clock: u32, sample_rate: u32) {
        self.sample_clock = SampleClock::new(cpu_clock, sample_rate);
    }

    /// Reset every channel and the frame counter
    ///
    /// Sample memory, clock rates and volume are kept.
    pub fn reset(&mut self) {
        self.pulse1 = PulseChannel::new(NegateMode::OnesComplement);
        self.pulse2 = PulseChannel::new(NegateMode::TwosComplement);
        self.triangle = TriangleChannel::new();
        self.noise = NoiseChannel::new();
        self.dmc = DmcChannel::new();
        self.frame_counter.reset();
        self.sample_clock.reset();
        self.cycles = 0;
        self.samples.clear();
    }

    /// Reset, then write the power-on register table
    ///
    /// `$4000-$4013` get [`POWER_ON_REGISTERS`], then `$4015` enables the
    /// four tone channels and `$4017` selects 4-step mode with the frame IRQ
    /// inhibited.
    pub fn power_on(&mut self) {
        self.reset();

        for (offset, &value) in POWER_ON_REGISTERS.iter().enumerate() {
            self.cpu_write(0x4000 + offset as u16, value);
        }
        self.cpu_write(0x4015, POWER_ON_STATUS);
        self.cpu_write(0x4017, POWER_ON_FRAME_COUNTER);
    }

    // ========================================
    // Register interface
    // ========================================

    /// Write an APU register; addresses outside the APU are ignored
    pub fn cpu_write(&mut self, address: u16, value: u8) {
        let register = (address & 0x03) as u8;
        match address {
            0x4000..=0x4003 => self.pulse1.write(register, value),
            0x4004..=0x4007 => self.pulse2.write(register, value),
            0x4008..=0x400B => self.triangle.write(register, value),
            0x400C..=0x400F => self.noise.write(register, value),
            0x4010..=0x4013 => self.dmc.write(register, value),
            0x4015 => self.write_status(value),
            0x4017 => {
                if let Some(event) = self.frame_counter.write_control(value) {
                    self.dispatch_frame_event(event);
                }
            }

            _ => {}
        }
    }

    /// Read an APU register
    ///
    /// Only `$4015` is readable; reading it clears the frame IRQ flag. All
    /// other addresses read as 0.
    pub fn cpu_read(&mut self, address: u16) -> u8 {
        if address != 0x4015 {
            return 0;
        }

        let status = self.peek_status();
        self.frame_counter.clear_irq();
        status
    }

    /// Value `$4015` would read, without clearing the frame IRQ
    ///
    /// Bits 0-3: length counters > 0, bit 4: DMC bytes remaining,
    /// bit 6: frame IRQ, bit 7: DMC IRQ.
    pub fn peek_status(&self) -> u8 {
        let mut status = 0;

        if self.pulse1.is_active() {
            status |= Channel::Pulse1.status_bit();
        }
        if self.pulse2.is_active() {
            status |= Channel::Pulse2.status_bit();
        }
        if self.triangle.length_counter.is_active() && self.triangle.enabled {
            status |= Channel::Triangle.status_bit();
        }
        if self.noise.is_active() {
            status |= Channel::Noise.status_bit();
        }
        if self.dmc.is_active() {
            status |= Channel::Dmc.status_bit();
        }
        if self.frame_counter.irq_pending() {
            status |= 0x40;
        }
        if self.dmc.irq_pending() {
            status |= 0x80;
        }

        status
    }

    /// $4015 write: enable flags for the five channels, clears the DMC IRQ
    fn write_status(&mut self, value: u8) {
        self.pulse1.set_enabled(value & Channel::Pulse1.status_bit() != 0);
        self.pulse2.set_enabled(value & Channel::Pulse2.status_bit() != 0);
        self.triangle
            .set_enabled(value & Channel::Triangle.status_bit() != 0);
        self.noise.set_enabled(value & Channel::Noise.status_bit() != 0);
        self.dmc.set_enabled(value & Channel::Dmc.status_bit() != 0);
        self.dmc.clear_irq();
    }

    // ========================================
    // Clocking
    // ========================================

    /// Advance one CPU cycle
    ///
    /// Returns the mixed sample when this cycle ends on a sample boundary.
    pub fn step(&mut self) -> Option<f32> {
        self.triangle.clock_timer();
        self.fetch_dmc_sample();
        self.dmc.clock_timer();

        // Pulse and noise timers run at the APU rate, half the CPU rate
        if self.cycles % 2 == 1 {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
            self.noise.clock_timer();
        }

        if let Some(event) = self.frame_counter.clock() {
            self.dispatch_frame_event(event);
        }

        self.cycles += 1;

        if self.sample_clock.tick() {
            Some(self.current_output())
        } else {
            None
        }
    }

    /// Advance exactly `cycles` CPU cycles, buffering produced samples
    ///
    /// Drain them with [`Apu::drain_samples`] or [`Apu::take_samples`].
    pub fn clock(&mut self, cycles: u32) {
        for _ in 0..cycles {
            if let Some(sample) = self.step() {
                self.samples.push(sample);
            }
        }
    }

    /// Advance exactly `cycles` CPU cycles, handing each sample to `on_sample`
    pub fn clock_with<F: FnMut(f32)>(&mut self, cycles: u32, mut on_sample: F) {
        for _ in 0..cycles {
            if let Some(sample) = self.step() {
                on_sample(sample);
            }
        }
    }

    /// Feed the DMC sample buffer from sample memory when it asks for a byte
    fn fetch_dmc_sample(&mut self) {
        if let Some(address) = self.dmc.needs_sample_read() {
            let byte = self.bus.read(address);
            self.dmc.load_sample_byte(byte);
        }
    }

    fn dispatch_frame_event(&mut self, event: FrameEvent) {
        match event {
            FrameEvent::QuarterFrame => self.clock_quarter_frame(),
            FrameEvent::HalfFrame => {
                self.clock_quarter_frame();
                self.clock_half_frame();
            }
        }
    }

    /// Clock envelopes and the triangle's linear counter
    pub fn clock_quarter_frame(&mut self) {
        self.pulse1.clock_envelope();
        self.pulse2.clock_envelope();
        self.triangle.clock_linear_counter();
        self.noise.clock_envelope();
    }

    /// Clock length counters and sweep units
    pub fn clock_half_frame(&mut self) {
        self.pulse1.clock_length_counter();
        self.pulse1.clock_sweep();
        self.pulse2.clock_length_counter();
        self.pulse2.clock_sweep();
        self.triangle.clock_length_counter();
        self.noise.clock_length_counter();
    }

    // ========================================
    // Output
    // ========================================

    /// Mix the current channel outputs
    pub fn current_output(&self) -> f32 {
        self.mixer.mix(
            self.pulse1.output(),
            self.pulse2.output(),
            self.triangle.output(),
            self.noise.output(),
            self.dmc.output(),
        )
    }

    /// Samples buffered by [`Apu::clock`]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Drain buffered samples, keeping the buffer's allocation
    pub fn drain_samples(&mut self) -> std::vec::Drain<'_, f32> {
        self.samples.drain(..)
    }

    /// Take buffered samples
    pub fn take_samples(&mut self) -> Vec<f32> {
        std::mem::replace(
            &mut self.samples,
            Vec::with_capacity(SAMPLE_BUFFER_CAPACITY),
        )
    }

    /// Raw output level of one channel (0-15, DMC 0-127)
    pub fn channel_output(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Pulse1 => self.pulse1.output(),
            Channel::Pulse2 => self.pulse2.output(),
            Channel::Triangle => self.triangle.output(),
            Channel::Noise => self.noise.output(),
            Channel::Dmc => self.dmc.output(),
        }
    }

    pub fn pulse1_output(&self) -> u8 {
        self.pulse1.output()
    }

    pub fn pulse2_output(&self) -> u8 {
        self.pulse2.output()
    }

    pub fn triangle_output(&self) -> u8 {
        self.triangle.output()
    }

    pub fn noise_output(&self) -> u8 {
        self.noise.output()
    }

    pub fn dmc_output(&self) -> u8 {
        self.dmc.output()
    }

    /// Length counter of a channel; the DMC reports its remaining bytes
    /// clamped to 255
    pub fn length_counter(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Pulse1 => self.pulse1.length_counter.value(),
            Channel::Pulse2 => self.pulse2.length_counter.value(),
            Channel::Triangle => self.triangle.length_counter.value(),
            Channel::Noise => self.noise.length_counter.value(),
            Channel::Dmc => self.dmc.bytes_remaining().min(u8::MAX as u16) as u8,
        }
    }

    // ========================================
    // IRQ
    // ========================================

    pub fn frame_irq_pending(&self) -> bool {
        self.frame_counter.irq_pending()
    }

    pub fn dmc_irq_pending(&self) -> bool {
        self.dmc.irq_pending()
    }

    /// Whether the APU is asserting the CPU IRQ line
    pub fn irq_pending(&self) -> bool {
        self.frame_irq_pending() || self.dmc_irq_pending()
    }

    // ========================================
    // Configuration and memory
    // ========================================

    /// Copy sample data into DMC memory; returns the number of bytes copied
    pub fn load_sample_memory(&mut self, start: u16, data: &[u8]) -> usize {
        self.bus.load(start, data)
    }

    pub fn sample_bus(&self) -> &SampleBus {
        &self.bus
    }

    pub fn sample_bus_mut(&mut self) -> &mut SampleBus {
        &mut self.bus
    }

    /// Master volume applied by the mixer (0.0 - 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.mixer.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.mixer.volume()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_clock.sample_rate()
    }

    pub fn cpu_clock(&self) -> u32 {
        self.sample_clock.cpu_clock()
    }

    /// CPU cycles since reset
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn frame_mode(&self) -> FrameMode {
        self.frame_counter.mode()
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMappedDevice for Apu {
    fn read(&mut self, addr: u16) -> u8 {
        self.cpu_read(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.cpu_write(addr, data);
    }
}

#[cfg(test)]
mod tests;
