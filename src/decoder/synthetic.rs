//! Synthetic media source
//!
//! Generates black BGRA frames and silent audio on a fixed timeline. It
//! behaves like a real source as far as the engine can tell: timestamps,
//! stream selection, stereo layout checks, seeking and end of stream.

use super::MediaSource;
use crate::media::{
    AudioBlob, ChromaLocation, ColorSpace, PixelLayout, PlaneData, SampleFormat, StereoLayout,
    SubtitleCue, SubtitleFormat, SubtitleList, ValueRange, VideoFrame, NO_PTS,
};
use crate::utils::error::{Result, StereoPlayError};
use log::{debug, info};
use std::sync::Arc;

/// Description of the media a `SyntheticSource` produces
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticMedia {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f32,
    pub stereo_layout: StereoLayout,
    pub stereo_layout_swap: bool,
    pub frame_rate: u32,
    /// Microseconds
    pub duration: i64,
    /// Timestamp of the first frame, microseconds
    pub start_time: i64,
    /// Microseconds
    pub initial_skip: i64,
    pub video_streams: usize,
    pub audio_streams: usize,
    pub subtitle_streams: usize,
    pub audio_channels: u32,
    pub audio_rate: u32,
}

impl Default for SyntheticMedia {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            aspect_ratio: 16.0 / 9.0,
            stereo_layout: StereoLayout::Mono,
            stereo_layout_swap: false,
            frame_rate: 25,
            duration: 2_000_000,
            start_time: 0,
            initial_skip: 0,
            video_streams: 1,
            audio_streams: 0,
            subtitle_streams: 0,
            audio_channels: 2,
            audio_rate: 48_000,
        }
    }
}

impl SyntheticMedia {
    /// Media with one video stream of the given length and frame rate
    pub fn new(duration: i64, frame_rate: u32) -> Self {
        Self {
            duration,
            frame_rate,
            ..Self::default()
        }
    }

    pub fn with_audio_streams(mut self, streams: usize) -> Self {
        self.audio_streams = streams;
        self
    }

    pub fn with_video_streams(mut self, streams: usize) -> Self {
        self.video_streams = streams;
        self
    }

    pub fn with_subtitle_streams(mut self, streams: usize) -> Self {
        self.subtitle_streams = streams;
        self
    }

    pub fn with_stereo_layout(mut self, layout: StereoLayout, swap: bool) -> Self {
        self.stereo_layout = layout;
        self.stereo_layout_swap = swap;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_start_time(mut self, start_time: i64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_initial_skip(mut self, initial_skip: i64) -> Self {
        self.initial_skip = initial_skip;
        self
    }

    fn frame_duration(&self) -> i64 {
        1_000_000 / self.frame_rate.max(1) as i64
    }

    fn end_time(&self) -> i64 {
        self.start_time + self.duration
    }

    fn audio_bytes_per_second(&self) -> i64 {
        self.audio_channels as i64 * self.audio_rate as i64 * 2
    }
}

/// Media source backed by a `SyntheticMedia` description
pub struct SyntheticSource {
    media: SyntheticMedia,
    opened: bool,
    stereo_layout: StereoLayout,
    stereo_layout_swap: bool,
    video_stream: usize,
    audio_stream: usize,
    subtitle_stream: Option<usize>,
    subtitles: Vec<SubtitleList>,
    planes: [Option<PlaneData>; 2],
    silence: Arc<[u8]>,
    next_video_time: i64,
    next_audio_time: i64,
    video_read_pending: bool,
    audio_read_pending: Option<usize>,
}

impl SyntheticSource {
    pub fn new(media: SyntheticMedia) -> Self {
        let stereo_layout = media.stereo_layout;
        let stereo_layout_swap = media.stereo_layout_swap;
        let next = media.start_time;
        Self {
            media,
            opened: false,
            stereo_layout,
            stereo_layout_swap,
            video_stream: 0,
            audio_stream: 0,
            subtitle_stream: None,
            subtitles: Vec::new(),
            planes: [None, None],
            silence: Arc::from(Vec::new()),
            next_video_time: next,
            next_audio_time: next,
            video_read_pending: false,
            audio_read_pending: None,
        }
    }

    pub fn media(&self) -> &SyntheticMedia {
        &self.media
    }

    fn ensure_open(&self) -> Result<()> {
        if self.opened {
            Ok(())
        } else {
            Err(StereoPlayError::source_error("source is not open"))
        }
    }

    fn allocate_planes(&mut self) {
        let bytes = self.media.width as usize * 4 * self.media.height as usize;
        let plane: PlaneData = Arc::from(vec![0u8; bytes]);
        self.planes = if self.stereo_layout.is_separate() {
            [Some(plane.clone()), Some(Arc::from(vec![0u8; bytes]))]
        } else {
            [Some(plane), None]
        };
    }

    fn build_subtitles(&mut self) {
        let seconds = self.media.duration.max(0) / 1_000_000;
        self.subtitles = (0..self.media.subtitle_streams)
            .map(|stream| {
                let mut list = SubtitleList::new(SubtitleFormat::Text, format!("s{}", stream));
                for second in 0..seconds {
                    let start = self.media.start_time + second * 1_000_000;
                    list.push(SubtitleCue::text(
                        format!("stream {} second {}", stream, second),
                        start,
                        start + 800_000,
                    ));
                }
                list
            })
            .collect();
    }

    fn frame_at(&mut self, time: i64) -> VideoFrame {
        let mut frame = self.video_frame_template();
        frame.presentation_time = time;
        frame.data[0][0] = self.planes[0].clone();
        frame.data[1][0] = self.planes[1].clone();
        frame.line_size[0][0] = self.media.width as usize * 4;
        if self.planes[1].is_some() {
            frame.line_size[1][0] = self.media.width as usize * 4;
        }
        if let Some(list) = self.subtitle_stream.and_then(|s| self.subtitles.get_mut(s)) {
            frame.subtitle = list.active_at(time).cloned();
        }
        frame
    }
}

impl MediaSource for SyntheticSource {
    fn open(&mut self, urls: &[String]) -> Result<()> {
        info!("Opening synthetic media for {:?}", urls);
        self.opened = true;
        self.allocate_planes();
        self.build_subtitles();
        let bytes = (self.media.audio_bytes_per_second() / 10) as usize;
        self.silence = Arc::from(vec![0u8; bytes]);
        self.next_video_time = self.media.start_time;
        self.next_audio_time = self.media.start_time;
        debug!(
            "Synthetic media: {} video, {} audio, {} subtitle streams, {} us",
            self.media.video_streams,
            self.media.audio_streams,
            self.media.subtitle_streams,
            self.media.duration
        );
        Ok(())
    }

    fn video_streams(&self) -> usize {
        self.media.video_streams
    }

    fn audio_streams(&self) -> usize {
        self.media.audio_streams
    }

    fn subtitle_streams(&self) -> usize {
        self.media.subtitle_streams
    }

    fn selected_video_stream(&self) -> usize {
        self.video_stream
    }

    fn select_video_stream(&mut self, index: usize) -> Result<()> {
        if index >= self.media.video_streams {
            return Err(StereoPlayError::NotFound(format!("video stream {}", index + 1)));
        }
        self.video_stream = index;
        Ok(())
    }

    fn selected_audio_stream(&self) -> usize {
        self.audio_stream
    }

    fn select_audio_stream(&mut self, index: usize) -> Result<()> {
        if index >= self.media.audio_streams {
            return Err(StereoPlayError::NotFound(format!("audio stream {}", index + 1)));
        }
        self.audio_stream = index;
        Ok(())
    }

    fn selected_subtitle_stream(&self) -> Option<usize> {
        self.subtitle_stream
    }

    fn select_subtitle_stream(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(i) = index {
            if i >= self.media.subtitle_streams {
                return Err(StereoPlayError::NotFound(format!("subtitle stream {}", i + 1)));
            }
            if let Some(list) = self.subtitles.get_mut(i) {
                list.rewind();
            }
        }
        self.subtitle_stream = index;
        Ok(())
    }

    fn video_frame_template(&self) -> VideoFrame {
        let mut frame = VideoFrame {
            raw_width: self.media.width,
            raw_height: self.media.height,
            raw_aspect_ratio: self.media.aspect_ratio,
            layout: PixelLayout::Bgra32,
            color_space: ColorSpace::Srgb,
            value_range: ValueRange::U8Full,
            chroma_location: ChromaLocation::Center,
            stereo_layout: self.stereo_layout,
            stereo_layout_swap: self.stereo_layout_swap,
            presentation_time: NO_PTS,
            ..VideoFrame::default()
        };
        frame.set_view_dimensions();
        frame
    }

    fn stereo_layout_is_supported(&self, layout: StereoLayout, swap: bool) -> bool {
        let width = self.media.width;
        let height = self.media.height;
        match layout {
            StereoLayout::Mono => !swap,
            StereoLayout::Separate => self.media.video_streams >= 2,
            StereoLayout::TopBottom | StereoLayout::TopBottomHalf | StereoLayout::EvenOddRows => {
                height % 2 == 0
            }
            StereoLayout::LeftRight | StereoLayout::LeftRightHalf => width % 2 == 0,
        }
    }

    fn set_stereo_layout(&mut self, layout: StereoLayout, swap: bool) -> Result<()> {
        if !self.stereo_layout_is_supported(layout, swap) {
            return Err(StereoPlayError::UnsupportedLayout(layout.to_name(swap).to_string()));
        }
        self.stereo_layout = layout;
        self.stereo_layout_swap = swap;
        if self.opened {
            self.allocate_planes();
        }
        Ok(())
    }

    fn initial_skip(&self) -> i64 {
        self.media.initial_skip
    }

    fn duration(&self) -> i64 {
        self.media.duration
    }

    fn video_frame_duration(&self) -> i64 {
        self.media.frame_duration()
    }

    fn start_video_frame_read(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.video_read_pending = true;
        Ok(())
    }

    fn finish_video_frame_read(&mut self) -> Result<Option<VideoFrame>> {
        self.ensure_open()?;
        if !self.video_read_pending {
            return Err(StereoPlayError::source_error("no video frame read in progress"));
        }
        self.video_read_pending = false;
        let time = self.next_video_time;
        if time >= self.media.end_time() {
            return Ok(None);
        }
        self.next_video_time += self.media.frame_duration();
        Ok(Some(self.frame_at(time)))
    }

    fn start_audio_blob_read(&mut self, size: usize) -> Result<()> {
        self.ensure_open()?;
        if self.media.audio_streams == 0 {
            return Err(StereoPlayError::source_error("media has no audio"));
        }
        self.audio_read_pending = Some(size);
        Ok(())
    }

    fn finish_audio_blob_read(&mut self) -> Result<Option<AudioBlob>> {
        self.ensure_open()?;
        let size = self
            .audio_read_pending
            .take()
            .ok_or_else(|| StereoPlayError::source_error("no audio blob read in progress"))?;
        let time = self.next_audio_time;
        let remaining = self.media.end_time() - time;
        if remaining <= 0 {
            return Ok(None);
        }
        let frame_bytes = self.media.audio_channels as usize * 2;
        let bps = self.media.audio_bytes_per_second();
        let remaining_bytes = (remaining * bps / 1_000_000) as usize;
        let bytes = size.min(remaining_bytes).max(frame_bytes) / frame_bytes * frame_bytes;
        if self.silence.len() < bytes {
            self.silence = Arc::from(vec![0u8; bytes]);
        }
        let blob = AudioBlob {
            channels: self.media.audio_channels,
            rate: self.media.audio_rate,
            sample_format: SampleFormat::S16,
            data: Arc::from(&self.silence[..bytes]),
            presentation_time: time,
        };
        self.next_audio_time += blob.duration().max(1);
        Ok(Some(blob))
    }

    fn seek(&mut self, pos: i64) -> Result<()> {
        self.ensure_open()?;
        let start = self.media.start_time;
        let pos = pos.max(start);
        let fd = self.media.frame_duration();
        self.next_video_time = start + (pos - start) / fd * fd;
        self.next_audio_time = pos;
        self.video_read_pending = false;
        self.audio_read_pending = None;
        if let Some(list) = self.subtitle_stream.and_then(|s| self.subtitles.get_mut(s)) {
            list.rewind();
        }
        debug!("Synthetic source seeked to {} us", pos);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.opened {
            info!("Closing synthetic media");
        }
        self.opened = false;
        self.video_read_pending = false;
        self.audio_read_pending = None;
        self.planes = [None, None];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(media: SyntheticMedia) -> SyntheticSource {
        let mut source = SyntheticSource::new(media);
        source.open(&["synthetic:".to_string()]).unwrap();
        source
    }

    fn read_video(source: &mut SyntheticSource) -> Option<VideoFrame> {
        source.start_video_frame_read().unwrap();
        source.finish_video_frame_read().unwrap()
    }

    #[test]
    fn test_video_timeline() {
        let mut source = open(SyntheticMedia::new(100_000, 25).with_start_time(5_000));
        assert_eq!(source.video_frame_duration(), 40_000);
        let times: Vec<i64> = std::iter::from_fn(|| read_video(&mut source))
            .map(|f| f.presentation_time)
            .collect();
        assert_eq!(times, vec![5_000, 45_000, 85_000]);
    }

    #[test]
    fn test_frames_carry_data() {
        let mut source = open(SyntheticMedia::new(1_000_000, 25).with_size(8, 4));
        let frame = read_video(&mut source).unwrap();
        assert!(frame.is_valid());
        let mut dst = vec![1u8; 8 * 4 * 4];
        frame.copy_plane(0, 0, &mut dst).unwrap();
        assert!(dst.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_finish_without_start_fails() {
        let mut source = open(SyntheticMedia::default());
        assert!(source.finish_video_frame_read().is_err());
        assert!(source.start_audio_blob_read(100).is_err());
    }

    #[test]
    fn test_audio_blobs() {
        let mut source = open(SyntheticMedia::new(100_000, 25).with_audio_streams(1));
        source.start_audio_blob_read(19_200).unwrap();
        let blob = source.finish_audio_blob_read().unwrap().unwrap();
        assert_eq!(blob.presentation_time, 0);
        assert_eq!(blob.duration(), 100_000);
        source.start_audio_blob_read(19_200).unwrap();
        assert!(source.finish_audio_blob_read().unwrap().is_none());
    }

    #[test]
    fn test_seek_aligns_to_frames() {
        let mut source = open(SyntheticMedia::new(2_000_000, 25));
        source.start_video_frame_read().unwrap();
        source.seek(1_010_000).unwrap();
        assert!(source.finish_video_frame_read().is_err());
        assert_eq!(read_video(&mut source).unwrap().presentation_time, 1_000_000);
        source.seek(-50).unwrap();
        assert_eq!(read_video(&mut source).unwrap().presentation_time, 0);
    }

    #[test]
    fn test_layout_support() {
        let mut source = open(SyntheticMedia::default().with_size(641, 360));
        assert!(source.stereo_layout_is_supported(StereoLayout::TopBottom, true));
        assert!(!source.stereo_layout_is_supported(StereoLayout::LeftRight, false));
        assert!(!source.stereo_layout_is_supported(StereoLayout::Separate, false));
        assert!(!source.stereo_layout_is_supported(StereoLayout::Mono, true));
        assert!(source.set_stereo_layout(StereoLayout::LeftRightHalf, false).is_err());
        source.set_stereo_layout(StereoLayout::TopBottom, false).unwrap();
        let template = source.video_frame_template();
        assert_eq!(template.height, 180);
        assert_eq!(template.stereo_layout, StereoLayout::TopBottom);
    }

    #[test]
    fn test_stream_selection() {
        let mut source = open(SyntheticMedia::default().with_video_streams(2).with_subtitle_streams(2));
        source.select_video_stream(1).unwrap();
        assert_eq!(source.selected_video_stream(), 1);
        assert!(source.select_video_stream(2).is_err());
        assert!(source.select_audio_stream(0).is_err());
        source.select_subtitle_stream(Some(1)).unwrap();
        let frame = read_video(&mut source).unwrap();
        assert_eq!(
            frame.subtitle.map(|c| c.start_time),
            Some(0)
        );
        source.select_subtitle_stream(None).unwrap();
        assert!(read_video(&mut source).unwrap().subtitle.is_none());
    }
}
