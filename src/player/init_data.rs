//! Initialization snapshot of a playback engine

use crate::bus::{LayoutState, ModeState, WireFormat};
use crate::media::Parameters;
use serde::{Deserialize, Serialize};

/// Everything `PlaybackEngine::open` needs, in a form that can be stored
/// or sent to another engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerInitData {
    pub log_level: String,
    pub urls: Vec<String>,
    /// Zero-based
    pub video_stream: usize,
    /// Zero-based
    pub audio_stream: usize,
    /// Zero-based, `None` disables subtitles
    pub subtitle_stream: Option<usize>,
    pub benchmark: bool,
    pub fullscreen: bool,
    pub center: bool,
    pub stereo_layout_override: Option<LayoutState>,
    pub stereo_mode_override: Option<ModeState>,
    pub params: Parameters,
}

impl Default for PlayerInitData {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            urls: Vec::new(),
            video_stream: 0,
            audio_stream: 0,
            subtitle_stream: None,
            benchmark: false,
            fullscreen: false,
            center: false,
            stereo_layout_override: None,
            stereo_mode_override: None,
            params: Parameters::default(),
        }
    }
}

impl WireFormat for PlayerInitData {}
