//! Media source collaborator
//!
//! Demultiplexing and decoding happen behind the `MediaSource` trait. The
//! engine issues a "start read" and later a "finish read" for every video
//! frame and audio blob, which lets an implementation prefetch in the
//! background while the engine does other work.

mod synthetic;

pub use synthetic::{SyntheticMedia, SyntheticSource};

use crate::media::{AudioBlob, StereoLayout, VideoFrame};
use crate::utils::error::Result;

/// Media input trait defining the interface the engine consumes
pub trait MediaSource: Send {
    /// Open the given URLs as one media session
    ///
    /// # Arguments
    ///
    /// * `urls` - One URL, or two for separately stored left/right views
    fn open(&mut self, urls: &[String]) -> Result<()>;

    fn video_streams(&self) -> usize;
    fn audio_streams(&self) -> usize;
    fn subtitle_streams(&self) -> usize;

    fn selected_video_stream(&self) -> usize;
    fn select_video_stream(&mut self, index: usize) -> Result<()>;

    fn selected_audio_stream(&self) -> usize;
    fn select_audio_stream(&mut self, index: usize) -> Result<()>;

    /// Selected subtitle stream, `None` when subtitles are off
    fn selected_subtitle_stream(&self) -> Option<usize>;
    fn select_subtitle_stream(&mut self, index: Option<usize>) -> Result<()>;

    /// A frame describing the geometry and format of the selected video
    /// stream; it carries no data
    fn video_frame_template(&self) -> VideoFrame;

    /// Whether `layout` can be applied to the opened media
    fn stereo_layout_is_supported(&self, layout: StereoLayout, swap: bool) -> bool;

    /// Interpret the video data with the given stereo layout
    fn set_stereo_layout(&mut self, layout: StereoLayout, swap: bool) -> Result<()>;

    /// Media time to skip at the start, in microseconds
    fn initial_skip(&self) -> i64;

    /// Total duration in microseconds, 0 or negative if unknown
    fn duration(&self) -> i64;

    /// Nominal duration of one video frame in microseconds
    fn video_frame_duration(&self) -> i64;

    /// Begin reading the next video frame
    fn start_video_frame_read(&mut self) -> Result<()>;

    /// Wait for the frame requested by `start_video_frame_read`
    ///
    /// # Returns
    ///
    /// Returns the frame, or `None` at the end of the stream
    fn finish_video_frame_read(&mut self) -> Result<Option<VideoFrame>>;

    /// Begin reading the next audio blob of about `size` bytes
    fn start_audio_blob_read(&mut self, size: usize) -> Result<()>;

    /// Wait for the blob requested by `start_audio_blob_read`
    ///
    /// # Returns
    ///
    /// Returns the blob, or `None` at the end of the stream
    fn finish_audio_blob_read(&mut self) -> Result<Option<AudioBlob>>;

    /// Seek to the given media time in microseconds; pending reads are
    /// cancelled
    fn seek(&mut self, pos: i64) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}
