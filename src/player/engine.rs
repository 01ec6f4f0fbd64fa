//! The playback engine
//!
//! `PlaybackEngine` keeps the video stream in lock-step with the audio
//! device clock (or a monotonic timer when there is no audio). A driver
//! calls `step` repeatedly; each call performs one unit of work and tells
//! the driver whether to stage, drop or display the pending video frame
//! and how long it may idle before the next call.

use super::init_data::PlayerInitData;
use super::master::MasterToken;
use super::state::{Phase, PlaybackState, RequestFlags, SeekRequest};
use crate::audio::{AudioSink, MasterClock, MonotonicTimeSource, TimeSource};
use crate::bus::{
    Change, Command, LayoutState, ModeState, Notification, Publisher, Subscriber, Subscription,
};
use crate::decoder::MediaSource;
use crate::media::{AudioBlob, Parameters, StereoMode, VideoFrame};
use crate::renderer::VideoSink;
use crate::utils::error::{Result, StereoPlayError};
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A frame lagging by more than this percentage of the frame duration
/// causes the next frame to be dropped
pub const DROP_LAG_PERCENT: i64 = 75;

/// Upper bound of the remaining lag considered for the advisory sleep, us
pub const MAX_ADVISORY_SLEEP_US: i64 = 1_100;

/// Subtracted from the advisory sleep to wake up in time, us
pub const SLEEP_SAFETY_MARGIN_US: i64 = 100;

/// Seeks never target the last part of the media, us
pub const END_GUARD_US: i64 = 2_000_000;

/// Benchmark mode reports the frame rate every this many frames
pub const FPS_SAMPLE_FRAMES: u32 = 100;

/// Result of one engine step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// False once playback has stopped
    pub more_work: bool,
    /// Media time a seek went to during this step
    pub seek_target: Option<i64>,
    /// The current frame should be handed to the video sink
    pub stage_frame: bool,
    /// The frame just read is dropped without being shown
    pub drop_frame: bool,
    /// The staged frame should be made visible
    pub display_frame: bool,
    /// How long the driver may idle before the next step
    pub advisory_sleep: Duration,
}

impl StepOutcome {
    fn finished() -> Self {
        Self::default()
    }

    fn more() -> Self {
        Self {
            more_work: true,
            ..Self::default()
        }
    }

    fn staged() -> Self {
        Self {
            more_work: true,
            stage_frame: true,
            ..Self::default()
        }
    }
}

/// Advisory sleep for a frame that is due in `lag` microseconds
fn advisory_sleep(lag: i64) -> Duration {
    let micros = if lag < SLEEP_SAFETY_MARGIN_US {
        0
    } else {
        lag.min(MAX_ADVISORY_SLEEP_US) - SLEEP_SAFETY_MARGIN_US
    };
    Duration::from_micros(micros as u64)
}

/// A clamped scalar parameter and the notification reporting its changes
struct Knob {
    get: fn(&Parameters) -> f32,
    set: fn(&mut Parameters, f32),
    notify: fn(Change<f32>) -> Notification,
}

const CONTRAST: Knob = Knob {
    get: Parameters::contrast,
    set: Parameters::set_contrast,
    notify: Notification::Contrast,
};
const BRIGHTNESS: Knob = Knob {
    get: Parameters::brightness,
    set: Parameters::set_brightness,
    notify: Notification::Brightness,
};
const HUE: Knob = Knob {
    get: Parameters::hue,
    set: Parameters::set_hue,
    notify: Notification::Hue,
};
const SATURATION: Knob = Knob {
    get: Parameters::saturation,
    set: Parameters::set_saturation,
    notify: Notification::Saturation,
};
const PARALLAX: Knob = Knob {
    get: Parameters::parallax,
    set: Parameters::set_parallax,
    notify: Notification::Parallax,
};
const GHOSTBUST: Knob = Knob {
    get: Parameters::ghostbust,
    set: Parameters::set_ghostbust,
    notify: Notification::Ghostbust,
};

/// New index for a stream cycle (`None`) or a stream set command
fn choose_stream(current: usize, count: usize, requested: Option<usize>) -> usize {
    match requested {
        Some(index) if index < count => index,
        Some(_) => 0,
        None if current + 1 < count => current + 1,
        None => 0,
    }
}

/// Builder for `PlaybackEngine`
pub struct PlaybackEngineBuilder {
    source: Box<dyn MediaSource>,
    audio: Option<Box<dyn AudioSink>>,
    video: Option<Box<dyn VideoSink>>,
    time: Option<Arc<dyn TimeSource>>,
    publisher: Option<Publisher>,
}

impl PlaybackEngineBuilder {
    pub fn new<S: MediaSource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            audio: None,
            video: None,
            time: None,
            publisher: None,
        }
    }

    /// Audio sink used when the media has audio and benchmark mode is off
    pub fn with_audio_sink<A: AudioSink + 'static>(mut self, sink: A) -> Self {
        self.audio = Some(Box::new(sink));
        self
    }

    pub fn with_video_sink<V: VideoSink + 'static>(mut self, sink: V) -> Self {
        self.video = Some(Box::new(sink));
        self
    }

    /// Clock used when there is no audio sink; defaults to the system
    /// monotonic clock
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = Some(time);
        self
    }

    /// Broadcast notifications through an existing publisher
    pub fn with_publisher(mut self, publisher: Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn build(self) -> PlaybackEngine {
        PlaybackEngine {
            source: self.source,
            audio: self.audio,
            video: self.video,
            time: self
                .time
                .unwrap_or_else(|| Arc::new(MonotonicTimeSource::new())),
            publisher: self.publisher.unwrap_or_default(),
            params: Parameters::default(),
            flags: RequestFlags::default(),
            benchmark: false,
            opened: false,
            stopped: false,
            closed: false,
            video_frame: VideoFrame::default(),
            video_pos: 0,
            audio_pos: 0,
            current_pos: 0,
            start_pos: 0,
            master_time: 0,
            clock: MasterClock::new(),
            fps_mark_time: 0,
            frames_shown: 0,
            master: None,
        }
    }
}

/// Audio/video synchronizing playback engine
pub struct PlaybackEngine {
    source: Box<dyn MediaSource>,
    audio: Option<Box<dyn AudioSink>>,
    video: Option<Box<dyn VideoSink>>,
    time: Arc<dyn TimeSource>,
    publisher: Publisher,
    params: Parameters,
    flags: RequestFlags,
    benchmark: bool,
    opened: bool,
    stopped: bool,
    closed: bool,
    /// Most recently read video frame
    video_frame: VideoFrame,
    video_pos: i64,
    audio_pos: i64,
    /// Media time of the last clock anchor
    current_pos: i64,
    /// Position at which playback started
    start_pos: i64,
    /// Media time observed by the last pacing step
    master_time: i64,
    clock: MasterClock,
    fps_mark_time: i64,
    frames_shown: u32,
    master: Option<MasterToken>,
}

impl PlaybackEngine {
    /// Open the media described by `init` and set up the outputs
    ///
    /// A failed open releases the source and both sinks; the engine is
    /// closed afterwards.
    pub fn open(&mut self, init: &PlayerInitData) -> Result<()> {
        if self.opened {
            return Err(StereoPlayError::InvalidState("player is already open".to_string()));
        }
        if self.closed {
            return Err(StereoPlayError::InvalidState("player is closed".to_string()));
        }
        let result = self.open_media(init);
        if let Err(e) = &result {
            warn!("Failed to open {:?}: {}", init.urls, e);
            self.close();
        }
        result
    }

    fn open_media(&mut self, init: &PlayerInitData) -> Result<()> {
        self.benchmark = init.benchmark;
        self.flags = RequestFlags::default();
        self.stopped = false;

        self.source.open(&init.urls)?;
        if self.source.video_streams() == 0 {
            return Err(StereoPlayError::source_error("No video streams found"));
        }
        if let Some(layout) = init.stereo_layout_override {
            if !self.source.stereo_layout_is_supported(layout.layout, layout.swap) {
                return Err(StereoPlayError::UnsupportedLayout(format!(
                    "cannot set requested stereo layout {}: incompatible media",
                    layout.layout.to_name(layout.swap)
                )));
            }
            self.source.set_stereo_layout(layout.layout, layout.swap)?;
        }
        if self.source.video_streams() < init.video_stream + 1 {
            return Err(StereoPlayError::NotFound(format!(
                "Video stream {} not found",
                init.video_stream + 1
            )));
        }
        self.source.select_video_stream(init.video_stream)?;
        let audio_streams = self.source.audio_streams();
        if audio_streams > 0 {
            if audio_streams < init.audio_stream + 1 {
                return Err(StereoPlayError::NotFound(format!(
                    "Audio stream {} not found",
                    init.audio_stream + 1
                )));
            }
            self.source.select_audio_stream(init.audio_stream)?;
        }
        if let Some(subtitle) = init.subtitle_stream {
            if subtitle >= self.source.subtitle_streams() {
                return Err(StereoPlayError::NotFound(format!(
                    "Subtitle stream {} not found",
                    subtitle + 1
                )));
            }
            self.source.select_subtitle_stream(Some(subtitle))?;
        }

        if (audio_streams == 0 || self.benchmark) && self.audio.take().is_some() {
            debug!("Audio output not used");
        }
        if let Some(audio) = self.audio.as_mut() {
            audio.init()?;
        }
        if let Some(video) = self.video.as_mut() {
            video.init()?;
        }

        self.params = init.params.clone();
        self.params.sanitize();
        let template = self.source.video_frame_template();
        match init.stereo_mode_override {
            Some(mode) => self.params.set_stereo_mode(mode.mode, mode.swap),
            None => {
                let mode = if !template.stereo_layout.is_stereo() {
                    StereoMode::MonoLeft
                } else if self.video.as_ref().is_some_and(|v| v.supports_stereo()) {
                    StereoMode::Stereo
                } else {
                    StereoMode::RedCyanDubois
                };
                self.params.set_stereo_mode(mode, false);
            }
        }

        if let Some(video) = self.video.as_mut() {
            video.set_parameters(&self.params)?;
            video.set_suitable_size(
                template.width,
                template.height,
                template.aspect_ratio,
                self.params.stereo_mode(),
            )?;
            if init.fullscreen {
                video.enter_fullscreen()?;
            }
            if init.center {
                video.center()?;
            }
            video.process_events()?;
        }

        self.opened = true;
        info!(
            "Opened {:?}: {}, output {}",
            init.urls,
            template,
            self.params.stereo_mode().to_name(self.params.stereo_mode_swap())
        );
        Ok(())
    }

    /// Perform one unit of work
    pub fn step(&mut self) -> Result<StepOutcome> {
        if !self.opened || self.closed {
            return Err(StereoPlayError::InvalidState("player is not open".to_string()));
        }
        if self.stopped {
            return Ok(StepOutcome::finished());
        }
        match Phase::select(&self.flags) {
            Phase::Quitting => self.stop_playback(),
            Phase::Starting => self.start(),
            Phase::Seeking => self.seek(),
            Phase::Paused => self.pause(),
            Phase::FinishFrameRead => self.finish_frame_read(),
            Phase::StartFrameRead => self.start_frame_read(),
            Phase::Pacing => self.pace(),
        }
    }

    /// Step once and apply the outcome to the video sink
    pub fn run_step(&mut self) -> Result<StepOutcome> {
        let outcome = self.step()?;
        if !outcome.more_work {
            return Ok(outcome);
        }
        if let Some(video) = self.video.as_mut() {
            if outcome.stage_frame {
                video.prepare_next_frame(&self.video_frame)?;
            } else if outcome.display_frame {
                video.activate_next_frame()?;
            }
            if video.has_events() {
                video.process_events()?;
            }
        }
        Ok(outcome)
    }

    /// Step until playback stops, idling for the advisory sleeps
    pub fn run(&mut self) -> Result<()> {
        loop {
            let outcome = self.run_step()?;
            if !outcome.more_work {
                return Ok(());
            }
            if !outcome.advisory_sleep.is_zero() {
                thread::sleep(outcome.advisory_sleep);
            }
        }
    }

    /// Apply a command
    ///
    /// Play, pause and seek requests take effect on a following step;
    /// everything else is applied immediately.
    pub fn receive_command(&mut self, command: Command) -> Result<()> {
        if !self.opened || self.closed {
            return Err(StereoPlayError::InvalidState("player is not open".to_string()));
        }
        debug!("Command {}", command.name());
        let parameters_changed = command.changes_parameters();

        match command {
            Command::TogglePlay => self.flags.quit = true,
            Command::TogglePause => self.flags.pause = !self.flags.pause,
            Command::CycleVideoStream => self.switch_video_stream(None)?,
            Command::SetVideoStream(index) => self.switch_video_stream(Some(index))?,
            Command::CycleAudioStream => self.switch_audio_stream(None)?,
            Command::SetAudioStream(index) => self.switch_audio_stream(Some(index))?,
            Command::CycleSubtitleStream => self.switch_subtitle_stream(None)?,
            Command::SetSubtitleStream(index) => self.switch_subtitle_stream(Some(index))?,
            Command::SetStereoLayout { layout, swap } => {
                if !self.source.stereo_layout_is_supported(layout, swap) {
                    warn!(
                        "Cannot set stereo layout {}: incompatible media",
                        layout.to_name(swap)
                    );
                    return Ok(());
                }
                let template = self.source.video_frame_template();
                let previous = LayoutState {
                    layout: template.stereo_layout,
                    swap: template.stereo_layout_swap,
                };
                self.source.set_stereo_layout(layout, swap)?;
                self.notify(Notification::StereoLayout(Change::new(
                    previous,
                    LayoutState { layout, swap },
                )));
                if layout.is_separate() {
                    self.request_seek(SeekRequest::Resync);
                }
            }
            Command::SetStereoMode { mode, swap } => {
                let previous = self.mode_state();
                self.params.set_stereo_mode(mode, swap);
                self.notify(Notification::StereoMode(Change::new(previous, self.mode_state())));
            }
            Command::ToggleStereoModeSwap => {
                let swap = !self.params.stereo_mode_swap();
                self.params.set_stereo_mode(self.params.stereo_mode(), swap);
                self.notify(Notification::StereoModeSwap(Change::new(!swap, swap)));
            }
            Command::ToggleFullscreen => {
                let previous = match self.video.as_mut() {
                    Some(video) => video.toggle_fullscreen()?,
                    None => false,
                };
                self.notify(Notification::Fullscreen(Change::new(previous, !previous)));
            }
            Command::Center => {
                if let Some(video) = self.video.as_mut() {
                    video.center()?;
                }
                self.notify(Notification::Center);
            }
            Command::AdjustContrast(delta) => self.adjust(&CONTRAST, delta, true),
            Command::SetContrast(value) => self.adjust(&CONTRAST, value, false),
            Command::AdjustBrightness(delta) => self.adjust(&BRIGHTNESS, delta, true),
            Command::SetBrightness(value) => self.adjust(&BRIGHTNESS, value, false),
            Command::AdjustHue(delta) => self.adjust(&HUE, delta, true),
            Command::SetHue(value) => self.adjust(&HUE, value, false),
            Command::AdjustSaturation(delta) => self.adjust(&SATURATION, delta, true),
            Command::SetSaturation(value) => self.adjust(&SATURATION, value, false),
            Command::AdjustParallax(delta) => self.adjust(&PARALLAX, delta, true),
            Command::SetParallax(value) => self.adjust(&PARALLAX, value, false),
            Command::AdjustGhostbust(delta) => self.adjust(&GHOSTBUST, delta, true),
            Command::SetGhostbust(value) => self.adjust(&GHOSTBUST, value, false),
            Command::SetCrosstalk(levels) => {
                let previous = self.params.crosstalk();
                self.params.set_crosstalk(levels);
                self.notify(Notification::Crosstalk(Change::new(previous, self.params.crosstalk())));
            }
            Command::Seek(seconds) => {
                let offset = (seconds as f64 * 1e6) as i64;
                if !seconds.is_finite() {
                    warn!("Ignoring seek by an undefined offset");
                } else if offset != 0 {
                    self.request_seek(SeekRequest::Relative(offset));
                }
            }
            Command::SetPos(pos) => {
                if pos.is_nan() {
                    warn!("Ignoring seek to an undefined position");
                } else {
                    self.request_seek(SeekRequest::Absolute(pos.clamp(0.0, 1.0)));
                }
            }
            Command::SetSubtitleFont(font) => {
                let previous = self.params.subtitles_font().to_string();
                self.params.set_subtitles_font(font);
                let current = self.params.subtitles_font().to_string();
                self.notify(Notification::SubtitleFont(Change::new(previous, current)));
            }
            Command::SetSubtitleEncoding(encoding) => {
                let previous = self.params.subtitles_encoding().to_string();
                self.params.set_subtitles_encoding(encoding);
                let current = self.params.subtitles_encoding().to_string();
                self.notify(Notification::SubtitleEncoding(Change::new(previous, current)));
            }
            Command::SetSubtitleColor(rgb) => {
                let previous = self.params.subtitles_color();
                self.params.set_subtitles_color(rgb);
                self.notify(Notification::SubtitleColor(Change::new(
                    previous,
                    self.params.subtitles_color(),
                )));
            }
            Command::SetSubtitleSize(size) => {
                let previous = self.params.subtitles_size();
                self.params.set_subtitles_size(size);
                self.notify(Notification::SubtitleSize(Change::new(
                    previous,
                    self.params.subtitles_size(),
                )));
            }
        }

        if parameters_changed {
            if let Some(video) = self.video.as_mut() {
                video.set_parameters(&self.params)?;
            }
        }
        Ok(())
    }

    /// Release all collaborators; failures are logged and ignored so that
    /// every resource gets its chance to be released
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.flags = RequestFlags::default();
        if let Some(mut audio) = self.audio.take() {
            if let Err(e) = audio.deinit() {
                warn!("Failed to close audio output: {}", e);
            }
        }
        if let Some(mut video) = self.video.take() {
            if let Err(e) = video.deinit() {
                warn!("Failed to close video output: {}", e);
            }
        }
        if let Err(e) = self.source.close() {
            warn!("Failed to close media source: {}", e);
        }
        self.master = None;
        self.closed = true;
        info!("Player closed");
    }

    pub fn state(&self) -> PlaybackState {
        if self.closed {
            PlaybackState::Closed
        } else if !self.opened {
            PlaybackState::Idle
        } else if self.stopped {
            PlaybackState::Stopped
        } else {
            PlaybackState::from_flags(&self.flags)
        }
    }

    /// Normalized playback position in [0, 1]
    pub fn position(&self) -> f32 {
        self.normalize_pos(self.current_pos)
    }

    /// Media time observed by the most recent pacing step, us
    pub fn media_time(&self) -> i64 {
        self.master_time
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Most recently read video frame
    pub fn video_frame(&self) -> &VideoFrame {
        &self.video_frame
    }

    pub fn is_benchmark(&self) -> bool {
        self.benchmark
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> Subscription {
        self.publisher.register(subscriber)
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.publisher.subscribe(callback)
    }

    /// Make this engine the master; the claim lives as long as the engine
    /// stays open
    pub fn make_master(&mut self, token: MasterToken) {
        self.master = Some(token);
    }

    pub fn is_master(&self) -> bool {
        self.master.is_some()
    }

    pub(crate) fn master_token(&self) -> Option<&MasterToken> {
        self.master.as_ref()
    }

    fn notify(&self, notification: Notification) {
        self.publisher.publish(&notification);
    }

    fn mode_state(&self) -> ModeState {
        ModeState {
            mode: self.params.stereo_mode(),
            swap: self.params.stereo_mode_swap(),
        }
    }

    fn adjust(&mut self, knob: &Knob, value: f32, relative: bool) {
        let previous = (knob.get)(&self.params);
        let requested = if relative { previous + value } else { value };
        (knob.set)(&mut self.params, requested);
        self.notify((knob.notify)(Change::new(previous, (knob.get)(&self.params))));
    }

    fn request_seek(&mut self, request: SeekRequest) {
        self.flags.seek = self.flags.seek.merge(request);
    }

    fn switch_video_stream(&mut self, requested: Option<usize>) -> Result<()> {
        let count = self.source.video_streams();
        if count < 2 || self.source.video_frame_template().stereo_layout.is_separate() {
            debug!("Video stream switch ignored");
            return Ok(());
        }
        let previous = self.source.selected_video_stream();
        let current = choose_stream(previous, count, requested);
        if current != previous {
            self.source.select_video_stream(current)?;
            self.notify(Notification::VideoStream(Change::new(previous, current)));
            self.request_seek(SeekRequest::Resync);
        }
        Ok(())
    }

    fn switch_audio_stream(&mut self, requested: Option<usize>) -> Result<()> {
        let count = self.source.audio_streams();
        if count < 2 {
            debug!("Audio stream switch ignored");
            return Ok(());
        }
        let previous = self.source.selected_audio_stream();
        let current = choose_stream(previous, count, requested);
        if current != previous {
            self.source.select_audio_stream(current)?;
            self.notify(Notification::AudioStream(Change::new(previous, current)));
            self.request_seek(SeekRequest::Resync);
        }
        Ok(())
    }

    fn switch_subtitle_stream(&mut self, requested: Option<usize>) -> Result<()> {
        let count = self.source.subtitle_streams();
        if count < 2 {
            debug!("Subtitle stream switch ignored");
            return Ok(());
        }
        let previous = self.source.selected_subtitle_stream();
        let current = match (previous, requested) {
            (None, None) => 0,
            (Some(index), None) => choose_stream(index, count, None),
            (_, Some(index)) => choose_stream(0, count, Some(index)),
        };
        if previous != Some(current) {
            self.source.select_subtitle_stream(Some(current))?;
            self.notify(Notification::SubtitleStream(Change::new(previous, Some(current))));
            self.request_seek(SeekRequest::Resync);
        }
        Ok(())
    }

    /// Map a media time onto [0, 1] over the seekable range
    fn normalize_pos(&self, pos: i64) -> f32 {
        let min = self.start_pos + self.source.initial_skip();
        let duration = self.source.duration();
        let span = if duration > END_GUARD_US {
            duration - END_GUARD_US
        } else {
            duration
        };
        if span <= 0 {
            return 0.0;
        }
        ((pos - min) as f64 / span as f64).clamp(0.0, 1.0) as f32
    }

    fn seek_target(&self, request: SeekRequest) -> i64 {
        let skip = self.source.initial_skip();
        let duration = self.source.duration();
        let min = self.start_pos + skip;
        match request {
            SeekRequest::None | SeekRequest::Resync => self.current_pos,
            SeekRequest::Absolute(pos) => {
                let max = min + duration - END_GUARD_US;
                if max <= min {
                    self.current_pos
                } else {
                    let pos = pos as f64;
                    (pos * max as f64 + (1.0 - pos) * min as f64) as i64
                }
            }
            SeekRequest::Relative(offset) => {
                let mut target = self.current_pos.saturating_add(offset);
                if target < min {
                    target = min;
                }
                if duration > 0 {
                    let end = self.start_pos + duration - END_GUARD_US;
                    if offset > 0 && target >= end.max(0) {
                        target = end.max(self.current_pos);
                    }
                }
                target
            }
        }
    }

    fn set_video_frame(&mut self, frame: VideoFrame) {
        self.video_pos = frame.presentation_time;
        self.video_frame = frame;
    }

    fn read_video_frame(&mut self) -> Result<Option<VideoFrame>> {
        self.source.start_video_frame_read()?;
        self.source.finish_video_frame_read()
    }

    /// Fill the audio sink (if any), start it and anchor the master clock.
    /// Returns false if the audio stream has no more data.
    fn restart_output(&mut self) -> Result<bool> {
        match self.audio.as_mut() {
            Some(audio) => {
                self.source
                    .start_audio_blob_read(audio.required_initial_data_size())?;
                let blob: AudioBlob = match self.source.finish_audio_blob_read()? {
                    Some(blob) => blob,
                    None => return Ok(false),
                };
                self.audio_pos = blob.presentation_time;
                audio.data(&blob)?;
                self.source
                    .start_audio_blob_read(audio.required_update_data_size())?;
                let device_time = audio.start()?;
                self.clock.anchor(device_time, self.audio_pos);
                self.current_pos = self.audio_pos;
            }
            None => {
                self.clock.anchor(self.time.now_us(), self.video_pos);
                self.current_pos = self.video_pos;
            }
        }
        Ok(true)
    }

    /// Flush the outputs and report the stop; sink failures are logged so
    /// the stop always completes
    fn stop_playback(&mut self) -> Result<StepOutcome> {
        if let Some(audio) = self.audio.as_mut() {
            if let Err(e) = audio.stop() {
                warn!("Failed to stop audio output: {}", e);
            }
        }
        if let Some(video) = self.video.as_mut() {
            let flushed = video
                .exit_fullscreen()
                .and_then(|_| video.prepare_next_frame(&VideoFrame::default()))
                .and_then(|_| video.activate_next_frame());
            if let Err(e) = flushed {
                warn!("Failed to clear video output: {}", e);
            }
        }
        self.stopped = true;
        self.notify(Notification::Play(Change::new(true, false)));
        Ok(StepOutcome::finished())
    }

    fn start(&mut self) -> Result<StepOutcome> {
        let frame = match self.read_video_frame()? {
            Some(frame) => frame,
            None => {
                debug!("Empty video input");
                return self.stop_playback();
            }
        };
        self.set_video_frame(frame);
        if !self.restart_output()? {
            debug!("Empty audio input");
            return self.stop_playback();
        }
        self.start_pos = self.current_pos;
        self.master_time = self.current_pos;
        self.fps_mark_time = self.time.now_us();
        self.frames_shown = 0;
        self.flags.running = true;
        debug!("Playback started at {} us", self.start_pos);

        let skip = self.source.initial_skip();
        if skip > 0 {
            self.flags.seek = SeekRequest::Relative(skip);
            return self.seek();
        }
        self.flags.need_frame_now = false;
        self.flags.need_frame_soon = true;
        self.flags.first_frame = true;
        Ok(StepOutcome::staged())
    }

    fn seek(&mut self) -> Result<StepOutcome> {
        let old_pos = self.current_pos;
        let request = std::mem::take(&mut self.flags.seek);
        let target = self.seek_target(request);
        debug!("Seeking to {} us ({:?})", target, request);
        self.source.seek(target)?;

        let frame = match self.read_video_frame()? {
            Some(frame) => frame,
            None => {
                warn!("Seeked to end of video");
                return self.stop_playback();
            }
        };
        self.set_video_frame(frame);
        if let Some(audio) = self.audio.as_mut() {
            audio.stop()?;
        }
        if !self.restart_output()? {
            warn!("Seeked to end of audio");
            return self.stop_playback();
        }
        if self.flags.in_pause {
            // the restarted output must not run while paused
            match self.audio.as_mut() {
                Some(audio) => audio.pause()?,
                None => self.clock.pause(self.time.now_us()),
            }
        }
        self.master_time = self.current_pos;
        self.notify(Notification::Pos(Change::new(
            self.normalize_pos(old_pos),
            self.normalize_pos(self.current_pos),
        )));
        self.flags.need_frame_now = false;
        self.flags.need_frame_soon = true;
        self.flags.drop_next_frame = false;
        self.flags.previous_frame_dropped = false;
        Ok(StepOutcome {
            seek_target: Some(target),
            ..StepOutcome::staged()
        })
    }

    fn pause(&mut self) -> Result<StepOutcome> {
        if !self.flags.in_pause {
            match self.audio.as_mut() {
                Some(audio) => audio.pause()?,
                None => self.clock.pause(self.time.now_us()),
            }
            self.flags.in_pause = true;
            self.notify(Notification::Pause(Change::new(false, true)));
        }
        Ok(StepOutcome::more())
    }

    fn finish_frame_read(&mut self) -> Result<StepOutcome> {
        match self.source.finish_video_frame_read()? {
            Some(frame) => {
                self.flags.first_frame = false;
                self.set_video_frame(frame);
            }
            None if self.flags.first_frame => {
                debug!("Single-frame video input: going into pause mode");
                self.flags.pause = true;
            }
            None => {
                debug!("End of video stream");
                return self.stop_playback();
            }
        }
        if self.audio.is_none() {
            self.clock.reanchor(self.video_pos);
            self.current_pos = self.video_pos;
            let pos = self.normalize_pos(self.current_pos);
            self.notify(Notification::Pos(Change::new(pos, pos)));
        }
        self.flags.need_frame_now = false;
        self.flags.need_frame_soon = true;
        let mut outcome = StepOutcome::more();
        if self.flags.drop_next_frame {
            outcome.drop_frame = true;
        } else if !self.flags.pause {
            outcome.stage_frame = true;
        }
        Ok(outcome)
    }

    fn start_frame_read(&mut self) -> Result<StepOutcome> {
        self.source.start_video_frame_read()?;
        self.flags.need_frame_soon = false;
        Ok(StepOutcome::more())
    }

    /// Current media time from the audio device or the timer. With audio,
    /// refills the device when it asks for data. Returns `None` when the
    /// audio stream has ended.
    fn read_master_time(&mut self) -> Result<Option<i64>> {
        let audio = match self.audio.as_mut() {
            Some(audio) => audio,
            None => return Ok(Some(self.clock.project(self.time.now_us()))),
        };
        let status = audio.status()?;
        let master_time = self.clock.project(status.device_time);
        if status.need_more {
            let blob = match self.source.finish_audio_blob_read()? {
                Some(blob) => blob,
                None => {
                    debug!("End of audio stream");
                    return Ok(None);
                }
            };
            self.audio_pos = blob.presentation_time;
            self.clock.reanchor(self.audio_pos);
            audio.data(&blob)?;
            self.source
                .start_audio_blob_read(audio.required_update_data_size())?;
            self.current_pos = self.audio_pos;
            let pos = self.normalize_pos(self.current_pos);
            self.notify(Notification::Pos(Change::new(pos, pos)));
        }
        Ok(Some(master_time))
    }

    fn pace(&mut self) -> Result<StepOutcome> {
        if self.flags.in_pause {
            match self.audio.as_mut() {
                Some(audio) => audio.unpause()?,
                None => self.clock.resume(self.time.now_us()),
            }
            self.flags.in_pause = false;
            self.notify(Notification::Pause(Change::new(true, false)));
        }

        let master_time = match self.read_master_time()? {
            Some(time) => time,
            None => return self.stop_playback(),
        };
        self.master_time = master_time;

        let mut outcome = StepOutcome::more();
        if master_time >= self.video_pos || self.benchmark {
            let lag = master_time - self.video_pos;
            let threshold = self.source.video_frame_duration() * DROP_LAG_PERCENT / 100;
            self.flags.drop_next_frame = !self.benchmark && lag > threshold;
            if self.flags.drop_next_frame {
                warn!("Video: delay {:.3} seconds; dropping next frame", lag as f64 / 1e6);
            }
            if !self.flags.previous_frame_dropped {
                outcome.display_frame = true;
                if self.benchmark {
                    self.count_benchmark_frame();
                }
            }
            self.flags.need_frame_now = true;
            self.flags.need_frame_soon = false;
            self.flags.previous_frame_dropped = self.flags.drop_next_frame;
        } else {
            outcome.advisory_sleep = advisory_sleep(self.video_pos - master_time);
        }
        Ok(outcome)
    }

    fn count_benchmark_frame(&mut self) {
        self.frames_shown += 1;
        if self.frames_shown == FPS_SAMPLE_FRAMES {
            let now = self.time.now_us();
            let elapsed = (now - self.fps_mark_time).max(1) as f64 / 1e6;
            info!("FPS: {:.2}", self.frames_shown as f64 / elapsed);
            self.fps_mark_time = now;
            self.frames_shown = 0;
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if self.opened {
            self.close();
        }
    }
}
