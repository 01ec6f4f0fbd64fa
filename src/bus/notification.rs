//! Notifications broadcast by the playback engine

use crate::media::{StereoLayout, StereoMode};
use serde::{Deserialize, Serialize};

/// Previous and current value of one observable state axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change<T> {
    pub previous: T,
    pub current: T,
}

impl<T: PartialEq> Change<T> {
    pub fn new(previous: T, current: T) -> Self {
        Self { previous, current }
    }

    /// Whether the value actually changed
    pub fn is_change(&self) -> bool {
        self.previous != self.current
    }
}

/// Stereo layout together with its swap flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutState {
    pub layout: StereoLayout,
    pub swap: bool,
}

/// Stereo mode together with its swap flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeState {
    pub mode: StereoMode,
    pub swap: bool,
}

/// A state transition reported to every subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    Play(Change<bool>),
    Pause(Change<bool>),
    VideoStream(Change<usize>),
    AudioStream(Change<usize>),
    SubtitleStream(Change<Option<usize>>),
    StereoLayout(Change<LayoutState>),
    StereoMode(Change<ModeState>),
    StereoModeSwap(Change<bool>),
    Fullscreen(Change<bool>),
    /// The video window was centered
    Center,
    Contrast(Change<f32>),
    Brightness(Change<f32>),
    Hue(Change<f32>),
    Saturation(Change<f32>),
    /// Normalized playback position
    Pos(Change<f32>),
    Parallax(Change<f32>),
    Crosstalk(Change<[f32; 3]>),
    Ghostbust(Change<f32>),
    SubtitleFont(Change<String>),
    SubtitleEncoding(Change<String>),
    SubtitleColor(Change<u32>),
    SubtitleSize(Change<Option<u32>>),
}

impl Notification {
    /// Stable kebab-case name of the state axis
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Play(_) => "play",
            Notification::Pause(_) => "pause",
            Notification::VideoStream(_) => "video-stream",
            Notification::AudioStream(_) => "audio-stream",
            Notification::SubtitleStream(_) => "subtitle-stream",
            Notification::StereoLayout(_) => "stereo-layout",
            Notification::StereoMode(_) => "stereo-mode",
            Notification::StereoModeSwap(_) => "stereo-mode-swap",
            Notification::Fullscreen(_) => "fullscreen",
            Notification::Center => "center",
            Notification::Contrast(_) => "contrast",
            Notification::Brightness(_) => "brightness",
            Notification::Hue(_) => "hue",
            Notification::Saturation(_) => "saturation",
            Notification::Pos(_) => "pos",
            Notification::Parallax(_) => "parallax",
            Notification::Crosstalk(_) => "crosstalk",
            Notification::Ghostbust(_) => "ghostbust",
            Notification::SubtitleFont(_) => "subtitle-font",
            Notification::SubtitleEncoding(_) => "subtitle-encoding",
            Notification::SubtitleColor(_) => "subtitle-color",
            Notification::SubtitleSize(_) => "subtitle-size",
        }
    }

    /// Whether every numeric payload is a finite number
    pub fn is_finite(&self) -> bool {
        match self {
            Notification::Contrast(change)
            | Notification::Brightness(change)
            | Notification::Hue(change)
            | Notification::Saturation(change)
            | Notification::Pos(change)
            | Notification::Parallax(change)
            | Notification::Ghostbust(change) => {
                change.previous.is_finite() && change.current.is_finite()
            }
            Notification::Crosstalk(change) => change
                .previous
                .iter()
                .chain(change.current.iter())
                .all(|v| v.is_finite()),
            _ => true,
        }
    }
}
