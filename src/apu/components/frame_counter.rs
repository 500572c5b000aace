//! Frame sequencer
//!
//! Divides the CPU clock into quarter and half frame clocks for the
//! envelopes, linear counter, length counters and sweep units. `$4017`
//! selects the 4-step sequence (about 240 Hz, with frame IRQ) or the 5-step
//! one (about 192 Hz, no IRQ).

use serde::{Deserialize, Serialize};

use crate::apu::constants::{
    FRAME_COUNTER_4_STEP_CYCLES, FRAME_COUNTER_4_STEP_IRQ_START, FRAME_COUNTER_4_STEP_PERIOD,
    FRAME_COUNTER_5_STEP_CYCLES, FRAME_COUNTER_5_STEP_PERIOD,
};

/// Clock delivered to the channel units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// Envelopes and the linear counter
    QuarterFrame,
    /// Quarter frame units plus length counters and sweeps
    HalfFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameMode {
    FourStep,
    FiveStep,
}

/// One entry of a sequence: the cycle it fires on and what it does
struct SequenceStep {
    cycle: u32,
    event: Option<FrameEvent>,
    irq: bool,
}

const fn step(cycle: u32, event: Option<FrameEvent>, irq: bool) -> SequenceStep {
    SequenceStep { cycle, event, irq }
}

const QUARTER: Option<FrameEvent> = Some(FrameEvent::QuarterFrame);
const HALF: Option<FrameEvent> = Some(FrameEvent::HalfFrame);

// The frame IRQ is asserted on the three cycles 29828-29830
const FOUR_STEP_SEQUENCE: [SequenceStep; 5] = [
    step(FRAME_COUNTER_4_STEP_CYCLES[0], QUARTER, false),
    step(FRAME_COUNTER_4_STEP_CYCLES[1], HALF, false),
    step(FRAME_COUNTER_4_STEP_CYCLES[2], QUARTER, false),
    step(FRAME_COUNTER_4_STEP_IRQ_START, None, true),
    step(FRAME_COUNTER_4_STEP_CYCLES[3], HALF, true),
];

const FIVE_STEP_SEQUENCE: [SequenceStep; 5] = [
    step(FRAME_COUNTER_5_STEP_CYCLES[0], QUARTER, false),
    step(FRAME_COUNTER_5_STEP_CYCLES[1], HALF, false),
    step(FRAME_COUNTER_5_STEP_CYCLES[2], QUARTER, false),
    step(FRAME_COUNTER_5_STEP_CYCLES[3], None, false),
    step(FRAME_COUNTER_5_STEP_CYCLES[4], HALF, false),
];

impl FrameMode {
    fn sequence(self) -> &'static [SequenceStep] {
        match self {
            FrameMode::FourStep => &FOUR_STEP_SEQUENCE,
            FrameMode::FiveStep => &FIVE_STEP_SEQUENCE,
        }
    }

    fn period(self) -> u32 {
        match self {
            FrameMode::FourStep => FRAME_COUNTER_4_STEP_PERIOD,
            FrameMode::FiveStep => FRAME_COUNTER_5_STEP_PERIOD,
        }
    }
}

/// Frame sequencer state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounter {
    mode: FrameMode,
    /// CPU cycles into the current sequence
    cycle: u32,
    /// Index of the next sequence step
    step: usize,
    irq_inhibit: bool,
    irq_pending: bool,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self {
            mode: FrameMode::FourStep,
            cycle: 0,
            step: 0,
            irq_inhibit: false,
            irq_pending: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// `$4017`: mode (bit 7) and IRQ inhibit (bit 6)
    ///
    /// The sequence restarts at once; the 3-4 cycle write delay of the
    /// hardware is not modelled. Selecting 5-step mode returns an immediate
    /// half frame clock.
    pub fn write_control(&mut self, value: u8) -> Option<FrameEvent> {
        self.mode = match value & 0x80 {
            0 => FrameMode::FourStep,
            _ => FrameMode::FiveStep,
        };
        self.irq_inhibit = value & 0x40 != 0;
        self.irq_pending &= !self.irq_inhibit;
        self.cycle = 0;
        self.step = 0;

        match self.mode {
            FrameMode::FiveStep => HALF,
            FrameMode::FourStep => None,
        }
    }

    /// Advance one CPU cycle
    pub fn clock(&mut self) -> Option<FrameEvent> {
        self.cycle += 1;

        let mut event = None;
        if let Some(next) = self.mode.sequence().get(self.step) {
            if next.cycle == self.cycle {
                event = next.event;
                if next.irq {
                    self.raise_irq();
                }
                self.step += 1;
            }
        }

        if self.cycle >= self.mode.period() {
            // The 4-step IRQ is asserted on the wrap cycle as well
            if self.mode == FrameMode::FourStep {
                self.raise_irq();
            }
            self.cycle = 0;
            self.step = 0;
        }

        event
    }

    fn raise_irq(&mut self) {
        if !self.irq_inhibit {
            self.irq_pending = true;
        }
    }

    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// Acknowledge the frame IRQ (`$4015` read)
    pub fn clear_irq(&mut self) {
        self.irq_pending = false;
    }

    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn irq_inhibited(&self) -> bool {
        self.irq_inhibit
    }
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}
