//! Integration test utilities for stereoplay
//!
//! This module provides fixtures shared by the integration tests:
//! - A subscriber recording every notification
//! - A video sink recording every call in a shared log
//! - An audio sink whose device clock the test sets by hand
//! - A media source reporting whether it is still open

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use stereoplay::audio::{AudioSink, AudioStatus, ManualTimeSource};
use stereoplay::bus::{Notification, Subscriber};
use stereoplay::decoder::{MediaSource, SyntheticMedia, SyntheticSource};
use stereoplay::media::{AudioBlob, Parameters, StereoLayout, StereoMode, VideoFrame};
use stereoplay::player::{PlaybackEngine, PlaybackEngineBuilder, PlayerInitData};
use stereoplay::renderer::VideoSink;
use stereoplay::Result;

/// Subscriber keeping every notification it receives
#[derive(Default)]
pub struct RecordingSubscriber {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    pub fn clear(&self) {
        self.received.lock().clear();
    }

    /// Recorded pause transitions as (previous, current) pairs
    pub fn pause_changes(&self) -> Vec<(bool, bool)> {
        self.received
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Pause(change) => Some((change.previous, change.current)),
                _ => None,
            })
            .collect()
    }
}

impl Subscriber for RecordingSubscriber {
    fn receive_notification(&self, notification: &Notification) {
        self.received.lock().push(notification.clone());
    }
}

/// Calls a `RecordingVideoSink` has seen
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Init,
    Deinit,
    SetParameters,
    SetSuitableSize(u32, u32),
    /// Presentation time of the staged frame, `None` for a clearing frame
    Prepare(Option<i64>),
    Activate,
    EnterFullscreen,
    ExitFullscreen,
    Center,
}

/// Shared call log of a `RecordingVideoSink`
pub type SinkLog = Arc<Mutex<Vec<SinkCall>>>;

/// Video sink appending each call to a shared log
pub struct RecordingVideoSink {
    log: SinkLog,
    fullscreen: bool,
}

impl RecordingVideoSink {
    pub fn new() -> (Self, SinkLog) {
        let log = SinkLog::default();
        (
            Self {
                log: Arc::clone(&log),
                fullscreen: false,
            },
            log,
        )
    }

    fn record(&self, call: SinkCall) {
        self.log.lock().push(call);
    }
}

impl VideoSink for RecordingVideoSink {
    fn init(&mut self) -> Result<()> {
        self.record(SinkCall::Init);
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        self.record(SinkCall::Deinit);
        Ok(())
    }

    fn supports_stereo(&self) -> bool {
        false
    }

    fn set_parameters(&mut self, _params: &Parameters) -> Result<()> {
        self.record(SinkCall::SetParameters);
        Ok(())
    }

    fn set_suitable_size(
        &mut self,
        width: u32,
        height: u32,
        _aspect_ratio: f32,
        _mode: StereoMode,
    ) -> Result<()> {
        self.record(SinkCall::SetSuitableSize(width, height));
        Ok(())
    }

    fn prepare_next_frame(&mut self, frame: &VideoFrame) -> Result<()> {
        let time = frame.is_valid().then_some(frame.presentation_time);
        self.record(SinkCall::Prepare(time));
        Ok(())
    }

    fn activate_next_frame(&mut self) -> Result<()> {
        self.record(SinkCall::Activate);
        Ok(())
    }

    fn enter_fullscreen(&mut self) -> Result<()> {
        self.fullscreen = true;
        self.record(SinkCall::EnterFullscreen);
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        self.fullscreen = false;
        self.record(SinkCall::ExitFullscreen);
        Ok(())
    }

    fn toggle_fullscreen(&mut self) -> Result<bool> {
        let previous = self.fullscreen;
        if previous {
            self.exit_fullscreen()?;
        } else {
            self.enter_fullscreen()?;
        }
        Ok(previous)
    }

    fn center(&mut self) -> Result<()> {
        self.record(SinkCall::Center);
        Ok(())
    }

    fn has_events(&self) -> bool {
        false
    }

    fn process_events(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Device clock shared between a test and its `ScriptedAudioSink`
#[derive(Clone, Default)]
pub struct DeviceClock {
    time: Arc<AtomicI64>,
    need_more: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    initialized: Arc<AtomicBool>,
}

impl DeviceClock {
    pub fn set(&self, device_time: i64) {
        self.time.store(device_time, Ordering::SeqCst);
    }

    pub fn set_need_more(&self, need_more: bool) {
        self.need_more.store(need_more, Ordering::SeqCst);
    }

    /// Whether the sink is paused
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Whether the sink is between `init` and `deinit`
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

/// Audio sink reporting whatever device time the test sets
pub struct ScriptedAudioSink {
    clock: DeviceClock,
}

impl ScriptedAudioSink {
    pub fn new() -> (Self, DeviceClock) {
        let clock = DeviceClock::default();
        (
            Self {
                clock: clock.clone(),
            },
            clock,
        )
    }
}

impl AudioSink for ScriptedAudioSink {
    fn init(&mut self) -> Result<()> {
        self.clock.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        self.clock.initialized.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn required_initial_data_size(&self) -> usize {
        19_200
    }

    fn required_update_data_size(&self) -> usize {
        9_600
    }

    fn data(&mut self, _blob: &AudioBlob) -> Result<()> {
        Ok(())
    }

    fn start(&mut self) -> Result<i64> {
        self.clock.paused.store(false, Ordering::SeqCst);
        Ok(self.clock.time.load(Ordering::SeqCst))
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.clock.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn unpause(&mut self) -> Result<()> {
        self.clock.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn status(&mut self) -> Result<AudioStatus> {
        Ok(AudioStatus {
            device_time: self.clock.time.load(Ordering::SeqCst),
            need_more: self.clock.need_more.load(Ordering::SeqCst),
        })
    }
}

/// Synthetic source that reports through a shared flag whether it is open
pub struct TrackedSource {
    inner: SyntheticSource,
    open: Arc<AtomicBool>,
}

impl TrackedSource {
    pub fn new(media: SyntheticMedia) -> (Self, Arc<AtomicBool>) {
        let open = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner: SyntheticSource::new(media),
                open: Arc::clone(&open),
            },
            open,
        )
    }
}

impl MediaSource for TrackedSource {
    fn open(&mut self, urls: &[String]) -> Result<()> {
        self.inner.open(urls)?;
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn video_streams(&self) -> usize {
        self.inner.video_streams()
    }

    fn audio_streams(&self) -> usize {
        self.inner.audio_streams()
    }

    fn subtitle_streams(&self) -> usize {
        self.inner.subtitle_streams()
    }

    fn selected_video_stream(&self) -> usize {
        self.inner.selected_video_stream()
    }

    fn select_video_stream(&mut self, index: usize) -> Result<()> {
        self.inner.select_video_stream(index)
    }

    fn selected_audio_stream(&self) -> usize {
        self.inner.selected_audio_stream()
    }

    fn select_audio_stream(&mut self, index: usize) -> Result<()> {
        self.inner.select_audio_stream(index)
    }

    fn selected_subtitle_stream(&self) -> Option<usize> {
        self.inner.selected_subtitle_stream()
    }

    fn select_subtitle_stream(&mut self, index: Option<usize>) -> Result<()> {
        self.inner.select_subtitle_stream(index)
    }

    fn video_frame_template(&self) -> VideoFrame {
        self.inner.video_frame_template()
    }

    fn stereo_layout_is_supported(&self, layout: StereoLayout, swap: bool) -> bool {
        self.inner.stereo_layout_is_supported(layout, swap)
    }

    fn set_stereo_layout(&mut self, layout: StereoLayout, swap: bool) -> Result<()> {
        self.inner.set_stereo_layout(layout, swap)
    }

    fn initial_skip(&self) -> i64 {
        self.inner.initial_skip()
    }

    fn duration(&self) -> i64 {
        self.inner.duration()
    }

    fn video_frame_duration(&self) -> i64 {
        self.inner.video_frame_duration()
    }

    fn start_video_frame_read(&mut self) -> Result<()> {
        self.inner.start_video_frame_read()
    }

    fn finish_video_frame_read(&mut self) -> Result<Option<VideoFrame>> {
        self.inner.finish_video_frame_read()
    }

    fn start_audio_blob_read(&mut self, size: usize) -> Result<()> {
        self.inner.start_audio_blob_read(size)
    }

    fn finish_audio_blob_read(&mut self) -> Result<Option<AudioBlob>> {
        self.inner.finish_audio_blob_read()
    }

    fn seek(&mut self, pos: i64) -> Result<()> {
        self.inner.seek(pos)
    }

    fn close(&mut self) -> Result<()> {
        self.open.store(false, Ordering::SeqCst);
        self.inner.close()
    }
}

/// An opened engine playing `media` through a recording video sink on a
/// manual clock
pub fn open_engine(
    media: SyntheticMedia,
) -> anyhow::Result<(PlaybackEngine, SinkLog, Arc<ManualTimeSource>)> {
    let (sink, log) = RecordingVideoSink::new();
    let time = Arc::new(ManualTimeSource::new(0));
    let mut engine = PlaybackEngineBuilder::new(SyntheticSource::new(media))
        .with_video_sink(sink)
        .with_time_source(time.clone())
        .build();
    engine.open(&PlayerInitData::default())?;
    Ok((engine, log, time))
}
