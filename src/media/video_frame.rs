//! Video frame descriptor
//!
//! A `VideoFrame` describes one decoded frame: geometry, pixel layout,
//! color properties, stereo packing and the plane buffers. The buffers are
//! shared with the producer (`PlaneData` is reference counted), so cloning a
//! descriptor never copies pixels. A descriptor is only meaningful until the
//! producer delivers the next frame.

use crate::media::stereo::StereoLayout;
use crate::media::subtitle::SubtitleCue;
use crate::utils::error::{Result, StereoPlayError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Plane storage shared between producer and consumers
pub type PlaneData = Arc<[u8]>;

/// Presentation time of a frame that carries no data
pub const NO_PTS: i64 = i64::MIN;

/// Pixel data layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    /// Single plane: BGRABGRABGRA....
    Bgra32,
    /// Three planes, Y/U/V, all with the same size
    Yuv444p,
    /// Three planes, U and V with half width
    Yuv422p,
    /// Three planes, U and V with half width and half height
    Yuv420p,
}

impl PixelLayout {
    /// Number of planes used by this layout
    pub fn planes(self) -> usize {
        match self {
            PixelLayout::Bgra32 => 1,
            _ => 3,
        }
    }

    pub fn is_subsampled(self) -> bool {
        matches!(self, PixelLayout::Yuv422p | PixelLayout::Yuv420p)
    }

    fn name(self) -> &'static str {
        match self {
            PixelLayout::Bgra32 => "bgra32",
            PixelLayout::Yuv444p => "yuv444p",
            PixelLayout::Yuv422p => "yuv422p",
            PixelLayout::Yuv420p => "yuv420p",
        }
    }
}

/// Color space of the pixel values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    Srgb,
    /// ITU.BT-601
    Yuv601,
    /// ITU.BT-709
    Yuv709,
}

/// Value range of 8 bit components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueRange {
    /// 0-255 for all components
    U8Full,
    /// 16-235 for Y, 16-240 for U and V
    U8Mpeg,
}

/// Location of chroma samples relative to luma samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChromaLocation {
    Center,
    Left,
    TopLeft,
}

/// Decoded video frame descriptor
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Width of the data in pixels
    pub raw_width: u32,

    /// Height of the data in pixels
    pub raw_height: u32,

    /// Aspect ratio of the data
    pub raw_aspect_ratio: f32,

    /// Width of one view in pixels
    pub width: u32,

    /// Height of one view in pixels
    pub height: u32,

    /// Aspect ratio of one view when displayed
    pub aspect_ratio: f32,

    pub layout: PixelLayout,
    pub color_space: ColorSpace,
    pub value_range: ValueRange,
    pub chroma_location: ChromaLocation,
    pub stereo_layout: StereoLayout,
    pub stereo_layout_swap: bool,

    /// Plane buffers for up to two views and three planes
    pub data: [[Option<PlaneData>; 3]; 2],

    /// Line size in bytes for each plane, 0 if unused
    pub line_size: [[usize; 3]; 2],

    /// Subtitle cue to overlay on this frame
    pub subtitle: Option<SubtitleCue>,

    /// Presentation timestamp in microseconds
    pub presentation_time: i64,
}

impl Default for VideoFrame {
    fn default() -> Self {
        Self {
            raw_width: 0,
            raw_height: 0,
            raw_aspect_ratio: 0.0,
            width: 0,
            height: 0,
            aspect_ratio: 0.0,
            layout: PixelLayout::Bgra32,
            color_space: ColorSpace::Srgb,
            value_range: ValueRange::U8Full,
            chroma_location: ChromaLocation::Center,
            stereo_layout: StereoLayout::Mono,
            stereo_layout_swap: false,
            data: Default::default(),
            line_size: [[0; 3]; 2],
            subtitle: None,
            presentation_time: NO_PTS,
        }
    }
}

impl VideoFrame {
    /// Does this frame contain valid data?
    pub fn is_valid(&self) -> bool {
        self.raw_width > 0 && self.raw_height > 0
    }

    /// Set width/height/aspect ratio of one view from the raw values
    /// according to the stereo layout
    pub fn set_view_dimensions(&mut self) {
        self.width = self.raw_width;
        self.height = self.raw_height;
        self.aspect_ratio = self.raw_aspect_ratio;
        match self.stereo_layout {
            StereoLayout::LeftRight => {
                self.width /= 2;
                self.aspect_ratio /= 2.0;
            }
            StereoLayout::LeftRightHalf => {
                self.width /= 2;
            }
            StereoLayout::TopBottom => {
                self.height /= 2;
                self.aspect_ratio *= 2.0;
            }
            StereoLayout::TopBottomHalf => {
                self.height /= 2;
            }
            StereoLayout::Mono | StereoLayout::Separate | StereoLayout::EvenOddRows => {}
        }
    }

    /// Bytes per row of the given plane of one view
    pub fn plane_width(&self, plane: usize) -> usize {
        let width = self.width as usize;
        match (self.layout, plane) {
            (PixelLayout::Bgra32, _) => width * 4,
            (PixelLayout::Yuv444p, _) | (_, 0) => width,
            _ => width.div_ceil(2),
        }
    }

    /// Number of rows of the given plane of one view
    pub fn plane_height(&self, plane: usize) -> usize {
        let height = self.height as usize;
        match (self.layout, plane) {
            (PixelLayout::Yuv420p, 1 | 2) => height.div_ceil(2),
            _ => height,
        }
    }

    /// Copy the data of the given view (0=left, 1=right) and plane into
    /// `dst` as tightly packed rows.
    ///
    /// The swap flag of the stereo layout is applied, so view 0 is always
    /// the view meant for the left eye.
    pub fn copy_plane(&self, view: usize, plane: usize, dst: &mut [u8]) -> Result<()> {
        if view > 1 || plane >= self.layout.planes() {
            return Err(StereoPlayError::InvalidInput(format!(
                "no plane {} in view {} for layout {}",
                plane,
                view,
                self.layout.name()
            )));
        }
        let view = if self.stereo_layout_swap && self.stereo_layout.is_stereo() {
            1 - view
        } else {
            view
        };
        let row_bytes = self.plane_width(plane);
        let mut lines = self.plane_height(plane);
        if self.stereo_layout == StereoLayout::EvenOddRows {
            // each view holds every other row of the full-height plane
            lines /= 2;
        }

        let (source_view, stride, offset) = match self.stereo_layout {
            StereoLayout::Mono => (0, self.line_size[0][plane], 0),
            StereoLayout::Separate => (view, self.line_size[view][plane], 0),
            StereoLayout::TopBottom | StereoLayout::TopBottomHalf => {
                let stride = self.line_size[0][plane];
                (0, stride, view * lines * stride)
            }
            StereoLayout::LeftRight | StereoLayout::LeftRightHalf => {
                (0, self.line_size[0][plane], view * row_bytes)
            }
            StereoLayout::EvenOddRows => {
                let stride = self.line_size[0][plane];
                (0, 2 * stride, view * stride)
            }
        };
        let src = self.data[source_view][plane].as_ref().ok_or_else(|| {
            StereoPlayError::InvalidInput(format!("plane {} of view {} is not set", plane, view))
        })?;

        if lines == 0 || row_bytes == 0 {
            return Ok(());
        }
        if dst.len() < row_bytes * lines {
            return Err(StereoPlayError::InvalidInput(format!(
                "destination holds {} bytes, plane needs {}",
                dst.len(),
                row_bytes * lines
            )));
        }
        if src.len() < offset + (lines - 1) * stride + row_bytes {
            return Err(StereoPlayError::InvalidInput(format!(
                "plane {} of view {} is shorter than its geometry",
                plane, view
            )));
        }

        for (row, out) in dst.chunks_exact_mut(row_bytes).take(lines).enumerate() {
            let start = offset + row * stride;
            out.copy_from_slice(&src[start..start + row_bytes]);
        }
        Ok(())
    }

    /// Short code describing the format
    pub fn format_name(&self) -> String {
        let color = match self.color_space {
            ColorSpace::Srgb => "srgb",
            ColorSpace::Yuv601 => "601",
            ColorSpace::Yuv709 => "709",
        };
        let range = match self.value_range {
            ValueRange::U8Full => "full",
            ValueRange::U8Mpeg => "mpeg",
        };
        let mut name = format!("{}-{}-{}", self.layout.name(), color, range);
        if self.layout.is_subsampled() {
            name.push('-');
            name.push_str(match self.chroma_location {
                ChromaLocation::Center => "center",
                ChromaLocation::Left => "left",
                ChromaLocation::TopLeft => "topleft",
            });
        }
        name
    }

    /// Human readable format description
    pub fn format_info(&self) -> String {
        let layout = match self.layout {
            PixelLayout::Bgra32 => "BGRA32",
            PixelLayout::Yuv444p => "YUV444P",
            PixelLayout::Yuv422p => "YUV422P",
            PixelLayout::Yuv420p => "YUV420P",
        };
        let color = match self.color_space {
            ColorSpace::Srgb => "sRGB",
            ColorSpace::Yuv601 => "BT.601",
            ColorSpace::Yuv709 => "BT.709",
        };
        let range = match self.value_range {
            ValueRange::U8Full => "full range",
            ValueRange::U8Mpeg => "MPEG range",
        };
        let mut info = format!("{}, {}, {}", layout, color, range);
        if self.layout.is_subsampled() {
            info.push_str(match self.chroma_location {
                ChromaLocation::Center => ", chroma center",
                ChromaLocation::Left => ", chroma left",
                ChromaLocation::TopLeft => ", chroma top left",
            });
        }
        info
    }
}

impl fmt::Display for VideoFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} ({}x{} per view, {}, {})",
            self.raw_width,
            self.raw_height,
            self.width,
            self.height,
            self.stereo_layout.to_name(self.stereo_layout_swap),
            self.format_name()
        )
    }
}
