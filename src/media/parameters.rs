//! User adjustable presentation parameters
//!
//! Every bounded field is clamped by its mutator, so consumers can rely on
//! the ranges without checking. Fields are private for that reason; the
//! record is persisted through serde as a whole.

use crate::media::stereo::StereoMode;
use serde::{Deserialize, Serialize};

/// Range of parallax and the color adjustments
pub const SIGNED_RANGE: (f32, f32) = (-1.0, 1.0);

/// Range of crosstalk levels and ghostbusting
pub const UNIT_RANGE: (f32, f32) = (0.0, 1.0);

/// Subtitle colors are 24 bit RGB
const RGB_MASK: u32 = 0x00FF_FFFF;

/// Clamp `value` into `range`; NaN maps to the in-range value closest to 0
pub fn clamp_to(value: f32, range: (f32, f32)) -> f32 {
    let value = if value.is_nan() { 0.0 } else { value };
    value.clamp(range.0, range.1)
}

/// Presentation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    stereo_mode: StereoMode,
    stereo_mode_swap: bool,
    parallax: f32,
    crosstalk: [f32; 3],
    ghostbust: f32,
    contrast: f32,
    brightness: f32,
    hue: f32,
    saturation: f32,
    subtitles_font: String,
    subtitles_encoding: String,
    subtitles_size: Option<u32>,
    subtitles_color: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            stereo_mode: StereoMode::MonoLeft,
            stereo_mode_swap: false,
            parallax: 0.0,
            crosstalk: [0.0; 3],
            ghostbust: 0.0,
            contrast: 0.0,
            brightness: 0.0,
            hue: 0.0,
            saturation: 0.0,
            subtitles_font: String::new(),
            subtitles_encoding: String::new(),
            subtitles_size: None,
            subtitles_color: RGB_MASK,
        }
    }
}

impl Parameters {
    pub fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }

    pub fn stereo_mode_swap(&self) -> bool {
        self.stereo_mode_swap
    }

    pub fn set_stereo_mode(&mut self, mode: StereoMode, swap: bool) {
        self.stereo_mode = mode;
        self.stereo_mode_swap = swap;
    }

    /// Parallax adjustment, -1 .. +1
    pub fn parallax(&self) -> f32 {
        self.parallax
    }

    pub fn set_parallax(&mut self, value: f32) {
        self.parallax = clamp_to(value, SIGNED_RANGE);
    }

    /// Crosstalk levels for red, green and blue, each 0 .. 1
    pub fn crosstalk(&self) -> [f32; 3] {
        self.crosstalk
    }

    pub fn set_crosstalk(&mut self, levels: [f32; 3]) {
        self.crosstalk = levels.map(|level| clamp_to(level, UNIT_RANGE));
    }

    /// Amount of crosstalk ghostbusting, 0 .. 1
    pub fn ghostbust(&self) -> f32 {
        self.ghostbust
    }

    pub fn set_ghostbust(&mut self, value: f32) {
        self.ghostbust = clamp_to(value, UNIT_RANGE);
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn set_contrast(&mut self, value: f32) {
        self.contrast = clamp_to(value, SIGNED_RANGE);
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn set_brightness(&mut self, value: f32) {
        self.brightness = clamp_to(value, SIGNED_RANGE);
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    pub fn set_hue(&mut self, value: f32) {
        self.hue = clamp_to(value, SIGNED_RANGE);
    }

    pub fn saturation(&self) -> f32 {
        self.saturation
    }

    pub fn set_saturation(&mut self, value: f32) {
        self.saturation = clamp_to(value, SIGNED_RANGE);
    }

    pub fn subtitles_font(&self) -> &str {
        &self.subtitles_font
    }

    pub fn set_subtitles_font<S: Into<String>>(&mut self, font: S) {
        self.subtitles_font = font.into();
    }

    pub fn subtitles_encoding(&self) -> &str {
        &self.subtitles_encoding
    }

    pub fn set_subtitles_encoding<S: Into<String>>(&mut self, encoding: S) {
        self.subtitles_encoding = encoding.into();
    }

    /// Font size in points, `None` for automatic sizing
    pub fn subtitles_size(&self) -> Option<u32> {
        self.subtitles_size
    }

    pub fn set_subtitles_size(&mut self, size: Option<u32>) {
        self.subtitles_size = size.filter(|&s| s > 0);
    }

    /// 24 bit RGB color
    pub fn subtitles_color(&self) -> u32 {
        self.subtitles_color
    }

    pub fn set_subtitles_color(&mut self, rgb: u32) {
        self.subtitles_color = rgb & RGB_MASK;
    }

    /// Re-establish every range invariant, e.g. after deserializing a
    /// record written by hand
    pub fn sanitize(&mut self) {
        self.set_parallax(self.parallax);
        self.set_crosstalk(self.crosstalk);
        self.set_ghostbust(self.ghostbust);
        self.set_contrast(self.contrast);
        self.set_brightness(self.brightness);
        self.set_hue(self.hue);
        self.set_saturation(self.saturation);
        self.set_subtitles_size(self.subtitles_size);
        self.set_subtitles_color(self.subtitles_color);
    }
}
