//! Video sink collaborator
//!
//! Rendering and compositing of the stereo views happen behind the
//! `VideoSink` trait. The engine stages a frame with `prepare_next_frame`
//! and makes it visible with `activate_next_frame`, so uploading the next
//! frame can overlap with showing the current one.

mod headless;

pub use headless::{HeadlessStats, HeadlessVideoSink};

use crate::media::{Parameters, StereoMode, VideoFrame};
use crate::utils::error::Result;

/// Video output trait defining the interface the engine needs
pub trait VideoSink: Send {
    /// Create the output surface
    fn init(&mut self) -> Result<()>;

    /// Release the output surface; also called after a failed open, so
    /// it must accept a sink that was never initialized
    fn deinit(&mut self) -> Result<()>;

    /// Whether the display supports quad buffered stereo
    fn supports_stereo(&self) -> bool;

    /// Apply new presentation parameters
    fn set_parameters(&mut self, params: &Parameters) -> Result<()>;

    /// Pick an output size suitable for the given view geometry
    ///
    /// # Arguments
    ///
    /// * `width` - Width of one view in pixels
    /// * `height` - Height of one view in pixels
    /// * `aspect_ratio` - Display aspect ratio of one view
    /// * `mode` - Stereo mode the views are combined with
    fn set_suitable_size(
        &mut self,
        width: u32,
        height: u32,
        aspect_ratio: f32,
        mode: StereoMode,
    ) -> Result<()>;

    /// Stage a frame; an invalid frame clears the output
    fn prepare_next_frame(&mut self, frame: &VideoFrame) -> Result<()>;

    /// Show the staged frame
    fn activate_next_frame(&mut self) -> Result<()>;

    fn enter_fullscreen(&mut self) -> Result<()>;

    fn exit_fullscreen(&mut self) -> Result<()>;

    /// Toggle fullscreen mode
    ///
    /// # Returns
    ///
    /// Returns whether fullscreen was active before the toggle
    fn toggle_fullscreen(&mut self) -> Result<bool>;

    /// Center the output on the screen
    fn center(&mut self) -> Result<()>;

    /// Whether user interface events are waiting
    fn has_events(&self) -> bool;

    fn process_events(&mut self) -> Result<()>;
}

/// Output size in pixels for views of the given geometry and stereo mode
pub fn suitable_size(width: u32, height: u32, aspect_ratio: f32, mode: StereoMode) -> (u32, u32) {
    let view_width = if aspect_ratio > 0.0 && height > 0 {
        (height as f32 * aspect_ratio).round() as u32
    } else {
        width
    };
    match mode {
        StereoMode::LeftRight => (view_width * 2, height),
        StereoMode::TopBottom => (view_width, height * 2),
        _ => (view_width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suitable_size() {
        assert_eq!(suitable_size(640, 360, 16.0 / 9.0, StereoMode::MonoLeft), (640, 360));
        assert_eq!(suitable_size(720, 576, 4.0 / 3.0, StereoMode::RedCyanDubois), (768, 576));
        assert_eq!(suitable_size(640, 360, 16.0 / 9.0, StereoMode::LeftRight), (1280, 360));
        assert_eq!(suitable_size(640, 360, 16.0 / 9.0, StereoMode::TopBottom), (640, 720));
        assert_eq!(suitable_size(640, 360, 0.0, StereoMode::LeftRightHalf), (640, 360));
    }
}
