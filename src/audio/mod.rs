//! Audio sink collaborator
//!
//! The engine never talks to an audio device directly. It pushes decoded
//! blobs into an `AudioSink` and reads back the device clock, which then
//! serves as the master clock for video pacing.

pub mod sync;

pub use sync::{ManualTimeSource, MasterClock, MonotonicTimeSource, TimeSource};

use crate::media::AudioBlob;
use crate::utils::error::{Result, StereoPlayError};
use log::{debug, trace};
use std::sync::Arc;

/// Device clock reading returned by `AudioSink::status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioStatus {
    /// Current device time in microseconds
    pub device_time: i64,

    /// Whether the device wants more data
    pub need_more: bool,
}

/// Audio output trait defining the interface the engine needs
pub trait AudioSink: Send {
    /// Open the device
    fn init(&mut self) -> Result<()>;

    /// Close the device; a no-op for a device that was never opened
    fn deinit(&mut self) -> Result<()>;

    /// Number of bytes to read for the first `data` call after `start`
    fn required_initial_data_size(&self) -> usize;

    /// Number of bytes to read for every following `data` call
    fn required_update_data_size(&self) -> usize;

    /// Queue a blob for playback
    fn data(&mut self, blob: &AudioBlob) -> Result<()>;

    /// Start playback and return the device time at the start
    fn start(&mut self) -> Result<i64>;

    /// Stop playback and flush queued data
    fn stop(&mut self) -> Result<()>;

    /// Pause playback; the device clock stands still until `unpause`
    fn pause(&mut self) -> Result<()>;

    fn unpause(&mut self) -> Result<()>;

    /// Current device time and whether the device wants more data
    fn status(&mut self) -> Result<AudioStatus>;
}

/// Buffer duration requested up front
const INITIAL_BUFFER_US: i64 = 200_000;

/// Buffer duration requested on each refill
const UPDATE_BUFFER_US: i64 = 50_000;

/// Ask for more data once less than this much is queued
const LOW_WATER_US: i64 = 100_000;

/// Audio sink that plays into the void, paced by a `TimeSource`
///
/// It tracks how much audio has been queued and how much of it the
/// simulated device has played, which is enough to produce a realistic
/// device clock and refill requests.
pub struct SimulatedAudioSink {
    time: Arc<dyn TimeSource>,
    bytes_per_second: i64,
    initialized: bool,
    playing: bool,
    paused_at: Option<i64>,
    paused_total: i64,
    start_device_time: i64,
    queued_us: i64,
}

impl SimulatedAudioSink {
    /// A 48 kHz stereo 16 bit device
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self::with_format(time, 2, 48_000, 16)
    }

    pub fn with_format(time: Arc<dyn TimeSource>, channels: u32, rate: u32, bits: u32) -> Self {
        Self {
            time,
            bytes_per_second: channels as i64 * rate as i64 * (bits / 8) as i64,
            initialized: false,
            playing: false,
            paused_at: None,
            paused_total: 0,
            start_device_time: 0,
            queued_us: 0,
        }
    }

    fn bytes_for(&self, duration_us: i64) -> usize {
        (self.bytes_per_second * duration_us / 1_000_000) as usize
    }

    fn device_time(&self) -> i64 {
        let now = self.paused_at.unwrap_or_else(|| self.time.now_us());
        now - self.paused_total
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StereoPlayError::Audio("device not initialized".to_string()))
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Queued but not yet played audio in microseconds
    pub fn buffered_us(&self) -> i64 {
        let played = if self.playing {
            self.device_time() - self.start_device_time
        } else {
            0
        };
        (self.queued_us - played).max(0)
    }
}

impl AudioSink for SimulatedAudioSink {
    fn init(&mut self) -> Result<()> {
        debug!("Simulated audio device opened");
        self.initialized = true;
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        if self.initialized {
            self.stop()?;
            self.initialized = false;
            debug!("Simulated audio device closed");
        }
        Ok(())
    }

    fn required_initial_data_size(&self) -> usize {
        self.bytes_for(INITIAL_BUFFER_US)
    }

    fn required_update_data_size(&self) -> usize {
        self.bytes_for(UPDATE_BUFFER_US)
    }

    fn data(&mut self, blob: &AudioBlob) -> Result<()> {
        self.ensure_initialized()?;
        if !blob.is_valid() {
            return Err(StereoPlayError::InvalidInput("invalid audio blob".to_string()));
        }
        trace!("Queued audio {} ({} bytes)", blob.format_name(), blob.size());
        self.queued_us += blob.duration();
        Ok(())
    }

    fn start(&mut self) -> Result<i64> {
        self.ensure_initialized()?;
        self.playing = true;
        self.paused_at = None;
        self.start_device_time = self.device_time();
        Ok(self.start_device_time)
    }

    fn stop(&mut self) -> Result<()> {
        self.playing = false;
        self.paused_at = None;
        self.queued_us = 0;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        if self.paused_at.is_none() {
            self.paused_at = Some(self.time.now_us());
        }
        Ok(())
    }

    fn unpause(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += self.time.now_us() - paused_at;
        }
        Ok(())
    }

    fn status(&mut self) -> Result<AudioStatus> {
        self.ensure_initialized()?;
        let buffered = self.buffered_us();
        if self.playing && buffered == 0 {
            debug!("Simulated audio device ran dry");
        }
        Ok(AudioStatus {
            device_time: self.device_time(),
            need_more: buffered < LOW_WATER_US,
        })
    }
}
