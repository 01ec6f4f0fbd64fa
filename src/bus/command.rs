//! Commands sent to the playback engine by front-ends

use crate::media::{StereoLayout, StereoMode};
use serde::{Deserialize, Serialize};

/// A request sent to the engine.
///
/// Adjust* variants carry a relative delta, Set* variants an absolute
/// value; both forms of a parameter go through the same clamp and notify
/// path in the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Stop playback (the engine quits its step loop)
    TogglePlay,
    TogglePause,
    CycleVideoStream,
    SetVideoStream(usize),
    CycleAudioStream,
    SetAudioStream(usize),
    CycleSubtitleStream,
    SetSubtitleStream(usize),
    SetStereoLayout { layout: StereoLayout, swap: bool },
    SetStereoMode { mode: StereoMode, swap: bool },
    ToggleStereoModeSwap,
    ToggleFullscreen,
    Center,
    AdjustContrast(f32),
    SetContrast(f32),
    AdjustBrightness(f32),
    SetBrightness(f32),
    AdjustHue(f32),
    SetHue(f32),
    AdjustSaturation(f32),
    SetSaturation(f32),
    /// Relative seek in seconds
    Seek(f32),
    /// Absolute seek to a normalized position in [0, 1]
    SetPos(f32),
    AdjustParallax(f32),
    SetParallax(f32),
    /// Red, green and blue crosstalk levels
    SetCrosstalk([f32; 3]),
    AdjustGhostbust(f32),
    SetGhostbust(f32),
    /// Path of a font file
    SetSubtitleFont(String),
    SetSubtitleEncoding(String),
    /// 24 bit RGB
    SetSubtitleColor(u32),
    /// Point size, `None` for automatic
    SetSubtitleSize(Option<u32>),
}

impl Command {
    /// Stable name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::TogglePlay => "toggle-play",
            Command::TogglePause => "toggle-pause",
            Command::CycleVideoStream => "cycle-video-stream",
            Command::SetVideoStream(_) => "set-video-stream",
            Command::CycleAudioStream => "cycle-audio-stream",
            Command::SetAudioStream(_) => "set-audio-stream",
            Command::CycleSubtitleStream => "cycle-subtitle-stream",
            Command::SetSubtitleStream(_) => "set-subtitle-stream",
            Command::SetStereoLayout { .. } => "set-stereo-layout",
            Command::SetStereoMode { .. } => "set-stereo-mode",
            Command::ToggleStereoModeSwap => "toggle-stereo-mode-swap",
            Command::ToggleFullscreen => "toggle-fullscreen",
            Command::Center => "center",
            Command::AdjustContrast(_) => "adjust-contrast",
            Command::SetContrast(_) => "set-contrast",
            Command::AdjustBrightness(_) => "adjust-brightness",
            Command::SetBrightness(_) => "set-brightness",
            Command::AdjustHue(_) => "adjust-hue",
            Command::SetHue(_) => "set-hue",
            Command::AdjustSaturation(_) => "adjust-saturation",
            Command::SetSaturation(_) => "set-saturation",
            Command::Seek(_) => "seek",
            Command::SetPos(_) => "set-pos",
            Command::AdjustParallax(_) => "adjust-parallax",
            Command::SetParallax(_) => "set-parallax",
            Command::SetCrosstalk(_) => "set-crosstalk",
            Command::AdjustGhostbust(_) => "adjust-ghostbust",
            Command::SetGhostbust(_) => "set-ghostbust",
            Command::SetSubtitleFont(_) => "set-subtitle-font",
            Command::SetSubtitleEncoding(_) => "set-subtitle-encoding",
            Command::SetSubtitleColor(_) => "set-subtitle-color",
            Command::SetSubtitleSize(_) => "set-subtitle-size",
        }
    }

    /// Whether the engine acknowledges this command only on a later step
    pub fn is_deferred(&self) -> bool {
        matches!(
            self,
            Command::TogglePlay | Command::TogglePause | Command::Seek(_) | Command::SetPos(_)
        )
    }

    /// Whether every numeric payload is a finite number
    pub fn is_finite(&self) -> bool {
        match self {
            Command::AdjustContrast(v)
            | Command::SetContrast(v)
            | Command::AdjustBrightness(v)
            | Command::SetBrightness(v)
            | Command::AdjustHue(v)
            | Command::SetHue(v)
            | Command::AdjustSaturation(v)
            | Command::SetSaturation(v)
            | Command::Seek(v)
            | Command::SetPos(v)
            | Command::AdjustParallax(v)
            | Command::SetParallax(v)
            | Command::AdjustGhostbust(v)
            | Command::SetGhostbust(v) => v.is_finite(),
            Command::SetCrosstalk(levels) => levels.iter().all(|v| v.is_finite()),
            _ => true,
        }
    }

    /// Whether the command modifies the presentation parameters
    pub fn changes_parameters(&self) -> bool {
        matches!(
            self,
            Command::SetStereoMode { .. }
                | Command::ToggleStereoModeSwap
                | Command::AdjustContrast(_)
                | Command::SetContrast(_)
                | Command::AdjustBrightness(_)
                | Command::SetBrightness(_)
                | Command::AdjustHue(_)
                | Command::SetHue(_)
                | Command::AdjustSaturation(_)
                | Command::SetSaturation(_)
                | Command::AdjustParallax(_)
                | Command::SetParallax(_)
                | Command::SetCrosstalk(_)
                | Command::AdjustGhostbust(_)
                | Command::SetGhostbust(_)
                | Command::SetSubtitleFont(_)
                | Command::SetSubtitleEncoding(_)
                | Command::SetSubtitleColor(_)
                | Command::SetSubtitleSize(_)
        )
    }
}
