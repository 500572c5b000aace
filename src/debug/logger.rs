// Logger - Playback trace log
//
// Records register writes, waits, APU state dumps and messages into a
// bounded in-memory ring, optionally mirrored to a text file.

use super::apu::ApuState;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Default number of entries kept in memory
pub const DEFAULT_TRACE_CAPACITY: usize = 10_000;

/// Log verbosity, ordered from quiet to chatty
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    Error,
    Warning,
    Info,
    /// Adds APU state dumps
    Debug,
    /// Adds register writes and waits (when write tracing is on)
    Trace,
}

/// One line of the trace log
#[derive(Debug, Clone)]
pub enum TraceEntry {
    /// Register write at the given CPU cycle
    Write { cycle: u64, address: u16, value: u8 },
    /// Wait of `samples` VGM samples (44.1 kHz, independent of the output
    /// rate) starting at the given CPU cycle
    Wait { cycle: u64, samples: u32 },
    State(ApuState),
    Message(String),
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEntry::Write {
                cycle,
                address,
                value,
            } => write!(f, "{:10} W ${:04X} <- {:02X}", cycle, address, value),
            TraceEntry::Wait { cycle, samples } => {
                write!(f, "{:10} WAIT {} samples", cycle, samples)
            }
            TraceEntry::State(state) => write!(f, "{}", state),
            TraceEntry::Message(msg) => f.write_str(msg),
        }
    }
}

/// Playback trace logger
///
/// Entries past the capacity push out the oldest ones. A capacity of 0
/// keeps everything.
#[derive(Debug)]
pub struct Logger {
    level: LogLevel,
    write_trace: bool,
    entries: VecDeque<TraceEntry>,
    capacity: usize,
    file: Option<BufWriter<File>>,
}

impl Logger {
    /// Silent logger with the default capacity
    pub fn new() -> Self {
        Logger {
            level: LogLevel::None,
            write_trace: false,
            entries: VecDeque::new(),
            capacity: DEFAULT_TRACE_CAPACITY,
            file: None,
        }
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    pub fn log_level(&self) -> LogLevel {
        self.level
    }

    /// Whether messages at `level` are recorded
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None && level <= self.level
    }

    pub fn enable_write_trace(&mut self) {
        self.write_trace = true;
    }

    pub fn disable_write_trace(&mut self) {
        self.write_trace = false;
    }

    /// Write tracing is on and the level is [`LogLevel::Trace`]
    pub fn is_write_trace_enabled(&self) -> bool {
        self.write_trace && self.enabled(LogLevel::Trace)
    }

    /// Change the capacity, dropping the oldest entries if needed
    pub fn set_max_buffer_size(&mut self, size: usize) {
        self.capacity = size;
        self.trim();
    }

    /// Mirror new entries to a file (truncated on open)
    pub fn open_log_file<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        self.file = Some(BufWriter::new(File::create(path)?));
        Ok(())
    }

    /// Flush and close the log file
    pub fn close_log_file(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
    }

    pub fn log_write(&mut self, cycle: u64, address: u16, value: u8) {
        if self.is_write_trace_enabled() {
            self.push(TraceEntry::Write {
                cycle,
                address,
                value,
            });
        }
    }

    pub fn log_wait(&mut self, cycle: u64, samples: u32) {
        if self.is_write_trace_enabled() {
            self.push(TraceEntry::Wait { cycle, samples });
        }
    }

    pub fn log_state(&mut self, state: ApuState) {
        if self.enabled(LogLevel::Debug) {
            self.push(TraceEntry::State(state));
        }
    }

    pub fn log_message<S: Into<String>>(&mut self, level: LogLevel, message: S) {
        if self.enabled(level) {
            self.push(TraceEntry::Message(message.into()));
        }
    }

    fn push(&mut self, entry: TraceEntry) {
        if let Some(file) = self.file.as_mut() {
            // A failing log file must not interrupt playback
            let _ = writeln!(file, "{}", entry);
        }
        self.entries.push_back(entry);
        self.trim();
    }

    fn trim(&mut self) {
        if self.capacity > 0 {
            while self.entries.len() > self.capacity {
                self.entries.pop_front();
            }
        }
    }

    /// Entries in the order they were logged
    pub fn entries(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear_buffer(&mut self) {
        self.entries.clear();
    }

    /// The newest `count` entries, oldest first
    pub fn last_entries(&self, count: usize) -> impl Iterator<Item = &TraceEntry> {
        self.entries
            .iter()
            .skip(self.entries.len().saturating_sub(count))
    }

    /// The newest `count` entries, one per line
    pub fn format_last_entries(&self, count: usize) -> String {
        self.last_entries(count)
            .map(|entry| format!("{}\n", entry))
            .collect()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.close_log_file();
    }
}
