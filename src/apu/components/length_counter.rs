//! Length counter, the automatic note-duration timer

use serde::{Deserialize, Serialize};

use crate::apu::constants::LENGTH_COUNTER_TABLE;

/// Length counter
///
/// Loaded from [`LENGTH_COUNTER_TABLE`], decremented on half-frame clocks,
/// and silences its channel when it reaches zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthCounter {
    pub(crate) counter: u8,
    pub(crate) halt: bool,
}

impl LengthCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Half-frame clock
    pub fn clock(&mut self) {
        if !self.halt && self.counter > 0 {
            self.counter -= 1;
        }
    }

    /// Load from the 5-bit table index (bits 7-3 of the channel's last register)
    pub fn load(&mut self, index: u8) {
        self.counter = LENGTH_COUNTER_TABLE[(index & 0x1F) as usize];
    }

    pub fn clear(&mut self) {
        self.counter = 0;
    }

    pub fn is_active(&self) -> bool {
        self.counter > 0
    }

    pub fn set_halt(&mut self, halt: bool) {
        self.halt = halt;
    }

    pub fn value(&self) -> u8 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_uses_table() {
        let mut lc = LengthCounter::new();
        lc.load(1);
        assert_eq!(lc.value(), 254);
        lc.load(0x1F);
        assert_eq!(lc.value(), 30);
    }

    #[test]
    fn test_clock_decrements_until_zero() {
        let mut lc = LengthCounter::new();
        lc.load(3); // 2
        lc.clock();
        assert!(lc.is_active());
        lc.clock();
        assert!(!lc.is_active());
        lc.clock();
        assert_eq!(lc.value(), 0);
    }

    #[test]
    fn test_halt_freezes_counter() {
        let mut lc = LengthCounter::new();
        lc.load(0);
        lc.set_halt(true);
        lc.clock();
        assert_eq!(lc.value(), 10);
    }
}
