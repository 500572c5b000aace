// Audio module - Mixing, sample-rate timing and sample sinks
//
// This module provides:
// - Non-linear APU mixing (accurate NES audio reproduction)
// - The integer sample clock that turns CPU cycles into output samples
// - Sample sinks: the cpal device, a raw PCM recorder and a null sink
//
// # Usage
//
// ```no_run
// use nes_apu::apu::Apu;
// use nes_apu::audio::{AudioSink, PcmRecorder};
//
// let mut apu = Apu::new();
// apu.power_on();
// let mut sink = PcmRecorder::new();
//
// apu.clock_with(29_830, |sample| {
//     sink.push_sample(sample);
// });
// sink.write_to("frame.u8")?;
// ```

pub mod buffer;
pub mod mixer;
#[cfg(feature = "audio")]
pub mod output;
pub mod sample_clock;

pub use buffer::AudioBuffer;
pub use mixer::Mixer;
#[cfg(feature = "audio")]
pub use output::{AudioConfig, AudioOutput};
pub use sample_clock::SampleClock;

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Destination for mixed samples
///
/// Samples are `f32` in `[0.0, 1.0]` as produced by [`Mixer::mix`].
pub trait AudioSink {
    /// Queue one sample; returns false when the sink cannot take it yet
    fn push_sample(&mut self, sample: f32) -> bool;

    /// Number of samples queued and not yet played
    fn queued(&self) -> usize;

    /// Flush buffered output (files, devices)
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that accepts and discards every sample
#[derive(Debug, Default, Clone)]
pub struct NullSink {
    samples: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples accepted so far
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

impl AudioSink for NullSink {
    fn push_sample(&mut self, _sample: f32) -> bool {
        self.samples += 1;
        true
    }

    fn queued(&self) -> usize {
        0
    }
}

/// Sink collecting 8-bit unsigned mono PCM in memory
#[derive(Debug, Default, Clone)]
pub struct PcmRecorder {
    data: Vec<u8>,
}

impl PcmRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Write the recorded PCM as a headerless `.u8` file
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.data)?;
        file.flush()
    }
}

impl AudioSink for PcmRecorder {
    fn push_sample(&mut self, sample: f32) -> bool {
        self.data.push(Mixer::to_u8(sample));
        true
    }

    fn queued(&self) -> usize {
        0
    }
}

/// Forwards every sample to two sinks (device playback plus recording)
pub struct Tee<A, B> {
    pub first: A,
    pub second: B,
}

impl<A: AudioSink, B: AudioSink> AudioSink for Tee<A, B> {
    /// Accepted only when the first sink takes it, so backpressure follows
    /// the first sink
    fn push_sample(&mut self, sample: f32) -> bool {
        if !self.first.push_sample(sample) {
            return false;
        }
        self.second.push_sample(sample);
        true
    }

    fn queued(&self) -> usize {
        self.first.queued().max(self.second.queued())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

impl<S: AudioSink + ?Sized> AudioSink for &mut S {
    fn push_sample(&mut self, sample: f32) -> bool {
        (**self).push_sample(sample)
    }

    fn queued(&self) -> usize {
        (**self).queued()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn push_sample(&mut self, sample: f32) -> bool {
        (**self).push_sample(sample)
    }

    fn queued(&self) -> usize {
        (**self).queued()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Audio device sink
#[cfg(feature = "audio")]
pub struct AudioSystem {
    output: AudioOutput,
}

#[cfg(feature = "audio")]
impl AudioSystem {
    /// Open the default device
    pub fn new(config: AudioConfig) -> Result<Self, String> {
        Ok(Self {
            output: AudioOutput::new(config)?,
        })
    }

    pub fn buffer_capacity(&self) -> usize {
        self.output.buffer_capacity()
    }

    pub fn channels(&self) -> u16 {
        self.output.channels()
    }
}

#[cfg(feature = "audio")]
impl AudioSink for AudioSystem {
    fn push_sample(&mut self, sample: f32) -> bool {
        self.output.push_sample(sample)
    }

    fn queued(&self) -> usize {
        self.output.buffer_len()
    }
}
