//! Delta modulation channel
//!
//! Plays 1-bit delta-encoded samples from sample memory, or raw 7-bit PCM
//! written directly to `$4011`. Memory reads go through the owning APU:
//! [`DmcChannel::needs_sample_read`] asks for an address and
//! [`DmcChannel::load_sample_byte`] delivers the byte.

use serde::{Deserialize, Serialize};

use crate::apu::components::Timer;
use crate::apu::constants::DMC_RATE_TABLE;

const SAMPLE_BASE_ADDRESS: u16 = 0xC000;

/// Shift register and 7-bit DAC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct OutputUnit {
    shift: u8,
    bits_left: u8,
    /// No byte was available when the last cycle started
    silent: bool,
    pub(crate) level: u8,
}

impl OutputUnit {
    fn new() -> Self {
        Self {
            shift: 0,
            bits_left: 8,
            silent: true,
            level: 0,
        }
    }

    /// Apply one bit; returns true when the 8-bit cycle is over
    fn clock(&mut self) -> bool {
        if !self.silent {
            match self.shift & 1 {
                1 if self.level <= 125 => self.level += 2,
                0 if self.level >= 2 => self.level -= 2,
                _ => {}
            }
        }
        self.shift >>= 1;
        self.bits_left -= 1;
        self.bits_left == 0
    }

    /// Start a new 8-bit cycle with `byte`, or in silence
    fn start_cycle(&mut self, byte: Option<u8>) {
        self.bits_left = 8;
        self.silent = byte.is_none();
        if let Some(byte) = byte {
            self.shift = byte;
        }
    }
}

/// DMC channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmcChannel {
    pub(crate) enabled: bool,
    pub(crate) irq_enabled: bool,
    pub(crate) loop_flag: bool,
    pub(crate) irq_flag: bool,
    /// Rate timer, clocked every CPU cycle
    pub(crate) timer: Timer,
    /// `$C000 + 64 * $4012`
    pub(crate) sample_address: u16,
    /// `16 * $4013 + 1` bytes
    pub(crate) sample_length: u16,
    pub(crate) current_address: u16,
    pub(crate) bytes_remaining: u16,
    /// Byte fetched ahead of the output unit
    pub(crate) buffer: Option<u8>,
    pub(crate) output: OutputUnit,
}

impl Default for DmcChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl DmcChannel {
    pub fn new() -> Self {
        let mut timer = Timer::new();
        timer.set_period_direct(DMC_RATE_TABLE[0] - 1);

        Self {
            enabled: false,
            irq_enabled: false,
            loop_flag: false,
            irq_flag: false,
            timer,
            sample_address: SAMPLE_BASE_ADDRESS,
            sample_length: 1,
            current_address: SAMPLE_BASE_ADDRESS,
            bytes_remaining: 0,
            buffer: None,
            output: OutputUnit::new(),
        }
    }

    /// Write one of `$4010-$4013` (`address & 3`)
    pub fn write(&mut self, register: u8, value: u8) {
        match register & 0x03 {
            0 => self.write_control(value),
            1 => self.output.level = value & 0x7F,
            2 => self.sample_address = SAMPLE_BASE_ADDRESS | (u16::from(value) << 6),
            _ => self.sample_length = (u16::from(value) << 4) | 1,
        }
    }

    /// `IL-- RRRR`: IRQ enable, loop, rate index
    fn write_control(&mut self, value: u8) {
        self.irq_enabled = value & 0x80 != 0;
        self.loop_flag = value & 0x40 != 0;
        self.irq_flag &= self.irq_enabled;

        // The timer expires every `period + 1` cycles
        self.timer
            .set_period_direct(DMC_RATE_TABLE[(value & 0x0F) as usize] - 1);
    }

    /// `$4015` bit 4
    ///
    /// Enabling restarts the sample only when the previous one finished.
    /// Disabling drops the remaining bytes; the byte already in the output
    /// unit still plays out.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart_sample();
        }
    }

    fn restart_sample(&mut self) {
        self.current_address = self.sample_address;
        self.bytes_remaining = self.sample_length;
    }

    /// Sample bytes left to fetch (`$4015` bit 4)
    pub fn is_active(&self) -> bool {
        self.bytes_remaining > 0
    }

    pub fn bytes_remaining(&self) -> u16 {
        self.bytes_remaining
    }

    pub fn irq_pending(&self) -> bool {
        self.irq_flag
    }

    pub fn clear_irq(&mut self) {
        self.irq_flag = false;
    }

    pub fn clock_timer(&mut self) {
        if self.timer.clock() && self.output.clock() {
            let next = self.buffer.take();
            self.output.start_cycle(next);
        }
    }

    /// Address of the next sample byte when the buffer is empty
    pub fn needs_sample_read(&self) -> Option<u16> {
        match (self.buffer, self.bytes_remaining) {
            (None, 1..) => Some(self.current_address),
            _ => None,
        }
    }

    /// Deliver the byte read for [`DmcChannel::needs_sample_read`]
    pub fn load_sample_byte(&mut self, byte: u8) {
        if self.bytes_remaining == 0 {
            return;
        }

        self.buffer = Some(byte);
        // $FFFF wraps to $8000, not $0000
        self.current_address = self.current_address.checked_add(1).unwrap_or(0x8000);
        self.bytes_remaining -= 1;

        if self.bytes_remaining == 0 {
            if self.loop_flag {
                self.restart_sample();
            } else if self.irq_enabled {
                self.irq_flag = true;
            }
        }
    }

    /// DAC level (0-127)
    ///
    /// Kept while the channel is disabled, which is how `$4011` PCM works.
    pub fn output(&self) -> u8 {
        self.output.level
    }
}
