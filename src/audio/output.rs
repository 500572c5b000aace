// Audio output - Plays mixed APU samples through the default cpal device
//
// The player thread pushes samples into a shared ring buffer; the cpal
// callback drains it, writing silence when it runs dry. Mono samples are
// copied to every device channel.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use std::sync::{Arc, Mutex};

use super::buffer::AudioBuffer;
use crate::apu::constants::DEFAULT_SAMPLE_RATE;

type SharedBuffer = Arc<Mutex<AudioBuffer>>;

/// Device settings for [`AudioOutput`]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioConfig {
    pub sample_rate: u32,

    /// Device channel count; `None` uses the device default
    pub channels: Option<u16>,

    /// Ring buffer length in milliseconds
    pub buffer_duration_ms: u32,
}

impl AudioConfig {
    /// 44.1 kHz, device channel layout, 500 ms buffer
    pub fn new() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: None,
            buffer_duration_ms: 500,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_buffer_duration(mut self, duration_ms: u32) -> Self {
        self.buffer_duration_ms = duration_ms;
        self
    }

    /// Ring buffer capacity in samples
    pub fn buffer_capacity(&self) -> usize {
        AudioBuffer::with_duration(self.buffer_duration_ms, self.sample_rate).capacity()
    }

    fn stream_config(&self, device: &Device) -> StreamConfig {
        let channels = self.channels.unwrap_or_else(|| {
            device
                .default_output_config()
                .map(|config| config.channels())
                .unwrap_or(2)
        });

        StreamConfig {
            channels: channels.max(1),
            sample_rate: SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Running cpal stream fed from a ring buffer
pub struct AudioOutput {
    _stream: Stream,
    buffer: SharedBuffer,
    channels: u16,
}

impl AudioOutput {
    /// Open the default output device and start the stream
    pub fn new(config: AudioConfig) -> Result<Self, String> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or("No output device available")?;

        let stream_config = config.stream_config(&device);
        let buffer: SharedBuffer =
            Arc::new(Mutex::new(AudioBuffer::new(config.buffer_capacity())));
        let stream = build_stream(&device, &stream_config, Arc::clone(&buffer))?;

        stream
            .play()
            .map_err(|e| format!("Failed to start audio stream: {}", e))?;

        println!(
            "Audio device: {} ({} Hz, {} channel(s))",
            device.name().unwrap_or_default(),
            config.sample_rate,
            stream_config.channels
        );

        Ok(Self {
            _stream: stream,
            buffer,
            channels: stream_config.channels,
        })
    }

    /// Push a sample; false when the buffer is full
    pub fn push_sample(&self, sample: f32) -> bool {
        self.buffer
            .lock()
            .map(|mut buf| buf.push(sample))
            .unwrap_or(false)
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.lock().map(|buf| buf.capacity()).unwrap_or(0)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn build_stream(
    device: &Device,
    config: &StreamConfig,
    buffer: SharedBuffer,
) -> Result<Stream, String> {
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let Ok(mut buf) = buffer.lock() else {
                    data.fill(0.0);
                    return;
                };
                for frame in data.chunks_mut(channels) {
                    frame.fill(buf.pop().unwrap_or(0.0));
                }
            },
            |err| eprintln!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| format!("Failed to build audio stream: {}", e))
}
