// Audio buffer - Fixed-capacity ring buffer between the player and the device
//
// The player pushes mixed samples on its own thread while the cpal callback
// pops them on the audio thread; the buffer itself is not synchronized and is
// shared behind a mutex by the output module.

/// Ring buffer of `f32` samples
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    buffer: Vec<f32>,
    read_pos: usize,
    write_pos: usize,
    count: usize,
}

impl AudioBuffer {
    /// Create a new audio buffer holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            read_pos: 0,
            write_pos: 0,
            count: 0,
        }
    }

    /// Create a buffer sized for `milliseconds` of audio at `sample_rate`
    pub fn with_duration(milliseconds: u32, sample_rate: u32) -> Self {
        let capacity = (milliseconds as u64 * sample_rate as u64 / 1000) as usize;
        Self::new(capacity)
    }

    /// Push a sample; returns false when the buffer is full
    pub fn push(&mut self, sample: f32) -> bool {
        if self.is_full() {
            return false;
        }

        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        self.count += 1;
        true
    }

    pub fn pop(&mut self) -> Option<f32> {
        if self.count == 0 {
            return None;
        }

        let sample = self.buffer[self.read_pos];
        self.read_pos = (self.read_pos + 1) % self.buffer.len();
        self.count -= 1;
        Some(sample)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.count = 0;
    }
}
