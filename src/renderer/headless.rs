//! Video sink without a display
//!
//! Keeps track of what a real output would have shown. Used by the runner
//! binary, the benchmark and the tests.

use super::{suitable_size, VideoSink};
use crate::media::{Parameters, StereoMode, VideoFrame};
use crate::utils::error::{Result, StereoPlayError};
use log::{debug, trace};

/// Counters collected by `HeadlessVideoSink`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessStats {
    pub frames_prepared: u64,
    pub frames_displayed: u64,
    /// Presentation time of the frame currently shown
    pub displayed_time: Option<i64>,
    /// Output size chosen by `set_suitable_size`
    pub size: (u32, u32),
    pub parameter_updates: u64,
}

/// A `VideoSink` that renders nothing
#[derive(Debug, Default)]
pub struct HeadlessVideoSink {
    stereo_support: bool,
    initialized: bool,
    fullscreen: bool,
    centered: bool,
    staged: Option<VideoFrame>,
    params: Parameters,
    stats: HeadlessStats,
}

impl HeadlessVideoSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the display supports quad buffered stereo
    pub fn with_stereo_support(mut self, supported: bool) -> Self {
        self.stereo_support = supported;
        self
    }

    pub fn stats(&self) -> &HeadlessStats {
        &self.stats
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_centered(&self) -> bool {
        self.centered
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StereoPlayError::Video("output not initialized".to_string()))
        }
    }
}

impl VideoSink for HeadlessVideoSink {
    fn init(&mut self) -> Result<()> {
        self.initialized = true;
        debug!("Headless video output ready");
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        self.initialized = false;
        self.staged = None;
        debug!(
            "Headless video output closed after {} frames",
            self.stats.frames_displayed
        );
        Ok(())
    }

    fn supports_stereo(&self) -> bool {
        self.stereo_support
    }

    fn set_parameters(&mut self, params: &Parameters) -> Result<()> {
        self.ensure_initialized()?;
        self.params = params.clone();
        self.stats.parameter_updates += 1;
        Ok(())
    }

    fn set_suitable_size(
        &mut self,
        width: u32,
        height: u32,
        aspect_ratio: f32,
        mode: StereoMode,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.stats.size = suitable_size(width, height, aspect_ratio, mode);
        debug!("Output size {}x{}", self.stats.size.0, self.stats.size.1);
        Ok(())
    }

    fn prepare_next_frame(&mut self, frame: &VideoFrame) -> Result<()> {
        self.ensure_initialized()?;
        if frame.is_valid() {
            trace!("Prepared {}", frame);
            self.stats.frames_prepared += 1;
            self.staged = Some(frame.clone());
        } else {
            self.staged = None;
        }
        Ok(())
    }

    fn activate_next_frame(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        match &self.staged {
            Some(frame) => {
                self.stats.frames_displayed += 1;
                self.stats.displayed_time = Some(frame.presentation_time);
            }
            None => self.stats.displayed_time = None,
        }
        Ok(())
    }

    fn enter_fullscreen(&mut self) -> Result<()> {
        self.fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        self.fullscreen = false;
        Ok(())
    }

    fn toggle_fullscreen(&mut self) -> Result<bool> {
        let previous = self.fullscreen;
        self.fullscreen = !previous;
        Ok(previous)
    }

    fn center(&mut self) -> Result<()> {
        self.centered = true;
        Ok(())
    }

    fn has_events(&self) -> bool {
        false
    }

    fn process_events(&mut self) -> Result<()> {
        Ok(())
    }
}
