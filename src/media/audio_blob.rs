//! Audio blob descriptor

use crate::media::video_frame::NO_PTS;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sample format of interleaved audio data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit signed integer
    S16,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    D64,
}

impl SampleFormat {
    /// Number of bits per sample
    pub fn bits(self) -> u32 {
        match self {
            SampleFormat::U8 => 8,
            SampleFormat::S16 => 16,
            SampleFormat::F32 => 32,
            SampleFormat::D64 => 64,
        }
    }

    fn name(self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16",
            SampleFormat::F32 => "f32",
            SampleFormat::D64 => "d64",
        }
    }
}

/// A chunk of decoded, interleaved audio
#[derive(Debug, Clone)]
pub struct AudioBlob {
    /// 1 (mono), 2 (stereo), 4 (quad), 6 (5:1), 7 (6:1), or 8 (7:1)
    pub channels: u32,

    /// Samples per second
    pub rate: u32,

    pub sample_format: SampleFormat,

    /// Sample data, shared with the producer
    pub data: Arc<[u8]>,

    /// Presentation timestamp in microseconds
    pub presentation_time: i64,
}

impl Default for AudioBlob {
    fn default() -> Self {
        Self {
            channels: 0,
            rate: 0,
            sample_format: SampleFormat::S16,
            data: Arc::from(Vec::new()),
            presentation_time: NO_PTS,
        }
    }
}

impl AudioBlob {
    /// Does this blob contain valid data?
    pub fn is_valid(&self) -> bool {
        self.channels > 0 && self.rate > 0
    }

    /// Data size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn sample_bits(&self) -> u32 {
        self.sample_format.bits()
    }

    /// Playback duration of the data in microseconds
    pub fn duration(&self) -> i64 {
        if !self.is_valid() {
            return 0;
        }
        let bytes_per_second =
            self.channels as i64 * self.rate as i64 * (self.sample_bits() / 8) as i64;
        self.size() as i64 * 1_000_000 / bytes_per_second
    }

    /// Short code describing the format
    pub fn format_name(&self) -> String {
        format!(
            "{}ch-{}kHz-{}",
            self.channels,
            self.rate / 1000,
            self.sample_format.name()
        )
    }

    /// Human readable format description
    pub fn format_info(&self) -> String {
        let channels = match self.channels {
            1 => "mono".to_string(),
            2 => "stereo".to_string(),
            4 => "quad".to_string(),
            6 => "5.1".to_string(),
            7 => "6.1".to_string(),
            8 => "7.1".to_string(),
            n => format!("{} channels", n),
        };
        format!(
            "{}, {} Hz, {} bit {}",
            channels,
            self.rate,
            self.sample_bits(),
            match self.sample_format {
                SampleFormat::U8 | SampleFormat::S16 => "integer",
                SampleFormat::F32 | SampleFormat::D64 => "float",
            }
        )
    }
}
