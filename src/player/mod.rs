// Player module - Replays VGM command streams through the APU
//
// The player owns an `Apu` and turns VGM commands into register writes and
// clock advances. Waits are counted in 44.1 kHz VGM samples whatever the
// output rate; the running total since the start of the file is converted to
// CPU cycles, so rounding never accumulates. The APU's own sample clock then
// decides where the output samples fall inside those cycles.
//
// Pacing follows a simple watermark: commands are executed only while the
// sink reports fewer queued samples than the low watermark. `pump` returns
// as soon as the sink is full; `play` sleeps 1 ms between pumps.

pub mod config;
pub mod playlist;

pub use config::PlayerConfig;
pub use playlist::Playlist;

use std::collections::VecDeque;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::apu::constants::{DEFAULT_SAMPLE_RATE, NTSC_CPU_CLOCK};
use crate::apu::Apu;
use crate::audio::{AudioSink, SampleClock};
use crate::debug::{ApuState, LogLevel, Logger};
use crate::vgm::command::{DATA_BLOCK_NES_APU_RAM, VGM_SAMPLE_RATE};
use crate::vgm::{VgmCommand, VgmError, VgmFile, VgmHeader};

/// Sleep between pumps while the sink is above the watermark
const PACING_INTERVAL: Duration = Duration::from_millis(1);

/// Result of one [`Player::pump`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// The sink is full; call `pump` again later
    Playing,
    /// End of stream reached and every sample delivered
    Finished,
}

/// VGM playback driver
#[derive(Debug)]
pub struct Player {
    apu: Apu,
    file: Option<VgmFile>,
    /// Offset of the next command
    position: usize,
    /// Output sample rate
    sample_rate: u32,
    /// Extra passes through the loop section per file
    loop_count: u32,
    loops_remaining: u32,
    /// Converts 44.1 kHz wait counts to CPU cycles
    wait_clock: SampleClock,
    /// VGM samples requested by waits since the file started
    samples_elapsed: u64,
    /// CPU cycles clocked since the file started
    cycles_issued: u64,
    /// Samples produced but not yet accepted by the sink
    pending: VecDeque<f32>,
    low_watermark: usize,
    finished: bool,
    logger: Logger,
}

impl Player {
    /// Create a player producing samples at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        let mut apu = Apu::with_clock_rates(NTSC_CPU_CLOCK, sample_rate);
        apu.power_on();

        Self {
            apu,
            file: None,
            position: 0,
            sample_rate,
            loop_count: 0,
            loops_remaining: 0,
            wait_clock: SampleClock::new(NTSC_CPU_CLOCK, VGM_SAMPLE_RATE),
            samples_elapsed: 0,
            cycles_issued: 0,
            pending: VecDeque::new(),
            low_watermark: config::DEFAULT_LOW_WATERMARK,
            finished: true,
            logger: Logger::new(),
        }
    }

    /// Create a player from the audio, playback and logging settings
    ///
    /// Opening the configured log file can fail; the error is returned so
    /// the caller decides whether to continue without it.
    pub fn from_config(config: &PlayerConfig) -> std::io::Result<Self> {
        let mut player = Self::new(config.audio.sample_rate);
        player.set_volume(config.audio.volume);
        player.set_low_watermark(config.audio.low_watermark);
        player.set_loop_count(config.playback.loop_count);

        let logger = player.logger_mut();
        logger.set_log_level(config.logging.level);
        if config.logging.trace_writes {
            logger.enable_write_trace();
        }
        if let Some(path) = &config.logging.log_file {
            logger.open_log_file(path)?;
        }

        Ok(player)
    }

    // ========================================
    // Loading
    // ========================================

    /// Load a file from disk and prepare it for playback
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), VgmError> {
        let file = VgmFile::load(path)?;
        self.start(file);
        Ok(())
    }

    /// Load a file already in memory
    pub fn load_bytes(&mut self, data: Vec<u8>) -> Result<(), VgmError> {
        let file = VgmFile::from_bytes(data)?;
        self.start(file);
        Ok(())
    }

    /// Power the APU back on and rewind to the first command of `file`
    fn start(&mut self, file: VgmFile) {
        let header = *file.header();
        let cpu_clock = header.nes_apu_clock.unwrap_or(NTSC_CPU_CLOCK);

        self.apu.set_clock_rates(cpu_clock, self.sample_rate);
        self.wait_clock = SampleClock::new(cpu_clock, VGM_SAMPLE_RATE);
        self.apu.sample_bus_mut().clear();
        self.apu.power_on();

        self.position = header.data_offset;
        self.loops_remaining = self.loop_count;
        self.samples_elapsed = 0;
        self.cycles_issued = 0;
        self.pending.clear();
        self.finished = false;
        self.file = Some(file);

        self.logger.log_message(
            LogLevel::Debug,
            format!(
                "VGM {} data at 0x{:X}, {} samples, loop {:?}, APU clock {} Hz",
                header.version_string(),
                header.data_offset,
                header.total_samples,
                header.loop_offset,
                cpu_clock
            ),
        );
    }

    /// Stop playback and drop the loaded file
    pub fn stop(&mut self) {
        self.file = None;
        self.pending.clear();
        self.finished = true;
    }

    // ========================================
    // Playback
    // ========================================

    /// Execute commands until the sink is above the watermark or the stream
    /// ends
    ///
    /// # Errors
    ///
    /// Malformed commands are returned as [`VgmError`]; the file cannot be
    /// resumed after an error. Sink flush failures surface as
    /// [`VgmError::Io`].
    pub fn pump<S: AudioSink + ?Sized>(&mut self, sink: &mut S) -> Result<PlaybackStatus, VgmError> {
        loop {
            while let Some(&sample) = self.pending.front() {
                if !sink.push_sample(sample) {
                    return Ok(PlaybackStatus::Playing);
                }
                self.pending.pop_front();
            }

            if self.finished {
                sink.flush()?;
                return Ok(PlaybackStatus::Finished);
            }

            if sink.queued() >= self.low_watermark {
                return Ok(PlaybackStatus::Playing);
            }

            if let Err(e) = self.execute_next() {
                self.stop();
                return Err(e);
            }
        }
    }

    /// Play the loaded file to the end, pacing against the sink
    pub fn play<S: AudioSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), VgmError> {
        loop {
            match self.pump(sink)? {
                PlaybackStatus::Finished => return Ok(()),
                PlaybackStatus::Playing => thread::sleep(PACING_INTERVAL),
            }
        }
    }

    /// Decode and execute one command
    fn execute_next(&mut self) -> Result<(), VgmError> {
        let Some(file) = &self.file else {
            self.finished = true;
            return Ok(());
        };

        let mut reader = file.commands_from(self.position);
        let command = reader.next_command()?;
        self.position = reader.position();

        match command {
            VgmCommand::ApuWrite { register, value } => {
                let address = VgmCommand::apu_address(register);
                self.logger.log_write(self.apu.cycles(), address, value);
                self.apu.cpu_write(address, value);
            }
            VgmCommand::Wait(samples) => self.wait_samples(samples),
            VgmCommand::DataBlock { kind, data } => {
                if kind == DATA_BLOCK_NES_APU_RAM && data.len() >= 2 {
                    let start = u16::from_le_bytes([data[0], data[1]]);
                    let loaded = self.apu.load_sample_memory(start, &data[2..]);
                    self.logger.log_message(
                        LogLevel::Debug,
                        format!("Loaded {} bytes of sample memory at ${:04X}", loaded, start),
                    );
                } else {
                    self.logger.log_message(
                        LogLevel::Debug,
                        format!("Skipped data block type 0x{:02X} ({} bytes)", kind, data.len()),
                    );
                }
            }
            VgmCommand::End => self.end_of_stream(),
        }

        Ok(())
    }

    /// Clock the APU for `samples` VGM samples
    fn wait_samples(&mut self, samples: u32) {
        self.logger.log_wait(self.apu.cycles(), samples);

        self.samples_elapsed += samples as u64;
        let target = self.wait_clock.cycles_for_samples(self.samples_elapsed);
        let mut remaining = target.saturating_sub(self.cycles_issued);
        self.cycles_issued = target.max(self.cycles_issued);

        let pending = &mut self.pending;
        while remaining > 0 {
            let chunk = u32::try_from(remaining).unwrap_or(u32::MAX);
            self.apu.clock_with(chunk, |sample| pending.push_back(sample));
            remaining -= chunk as u64;
        }
    }

    fn end_of_stream(&mut self) {
        let loop_offset = self.header().and_then(|header| header.loop_offset);

        match loop_offset {
            Some(offset) if self.loops_remaining > 0 => {
                self.loops_remaining -= 1;
                self.position = offset;
                self.logger.log_message(
                    LogLevel::Debug,
                    format!("Looping to 0x{:X}, {} loops left", offset, self.loops_remaining),
                );
            }
            _ => {
                self.finished = true;
                self.logger.log_state(ApuState::capture(&self.apu));
                self.logger
                    .log_message(LogLevel::Info, "End of VGM stream".to_string());
            }
        }
    }

    // ========================================
    // Settings and queries
    // ========================================

    /// Number of extra passes through the loop section
    pub fn set_loop_count(&mut self, loops: u32) {
        self.loop_count = loops;
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Queued-sample threshold used by [`Player::pump`]
    pub fn set_low_watermark(&mut self, samples: usize) {
        self.low_watermark = samples.max(1);
    }

    pub fn low_watermark(&self) -> usize {
        self.low_watermark
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.apu.set_volume(volume);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Header of the loaded file
    pub fn header(&self) -> Option<&VgmHeader> {
        self.file.as_ref().map(VgmFile::header)
    }

    /// True once the stream has ended (or nothing is loaded)
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// VGM samples elapsed since the file started
    pub fn samples_elapsed(&self) -> u64 {
        self.samples_elapsed
    }

    /// Samples produced but not yet taken by the sink
    pub fn pending_samples(&self) -> usize {
        self.pending.len()
    }

    pub fn apu(&self) -> &Apu {
        &self.apu
    }

    pub fn apu_mut(&mut self) -> &mut Apu {
        &mut self.apu
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut Logger {
        &mut self.logger
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}
