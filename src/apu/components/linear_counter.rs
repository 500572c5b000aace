//! Triangle linear counter

use serde::{Deserialize, Serialize};

/// Quarter-frame duration gate of the triangle channel
///
/// `$4008` sets the reload value and the control bit; a `$400B` write
/// requests a reload on the next quarter frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearCounter {
    pub(crate) count: u8,
    pub(crate) reload: u8,
    /// Keeps `reload_pending` set, so the counter reloads every quarter frame
    pub(crate) control: bool,
    pub(crate) reload_pending: bool,
}

impl LinearCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `$4008`: control (bit 7) and reload value (bits 6-0)
    pub fn write_control(&mut self, data: u8) {
        self.control = data & 0x80 != 0;
        self.reload = data & 0x7F;
    }

    pub fn request_reload(&mut self) {
        self.reload_pending = true;
    }

    pub fn clock(&mut self) {
        self.count = match self.reload_pending {
            true => self.reload,
            false => self.count.saturating_sub(1),
        };
        self.reload_pending &= self.control;
    }

    pub fn is_active(&self) -> bool {
        self.count != 0
    }
}
