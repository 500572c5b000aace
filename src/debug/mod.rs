// Debug module - Debugging tools for APU playback
//
// This module provides:
// - APU state capture with a one-line display format
// - Logging (register write trace, state dumps, configurable log levels)
//
// Tracing is off by default and costs a single flag check per command
// when disabled.

pub mod apu;
pub mod logger;

pub use apu::{ApuState, ChannelState};
pub use logger::{LogLevel, Logger, TraceEntry};
