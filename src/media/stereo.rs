//! Stereo layouts and stereo modes
//!
//! A stereo layout describes how left and right views are packed into the
//! decoded frames. A stereo mode describes how the two views are combined
//! for display. Both have a textual form used by the configuration file,
//! the command line and the command payloads.

use crate::utils::error::{Result, StereoPlayError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix appended to a stereo mode name when left and right are swapped
const SWAP_SUFFIX: &str = "-swap";

/// How left and right views are stored in the decoded video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StereoLayout {
    /// 1 video source: center view
    Mono,

    /// 2 video sources: left and right view independent
    Separate,

    /// 1 video source: left view top, right view bottom, both with full size
    TopBottom,

    /// 1 video source: left view top, right view bottom, both with half size
    TopBottomHalf,

    /// 1 video source: left view left, right view right, both with full size
    LeftRight,

    /// 1 video source: left view left, right view right, both with half size
    LeftRightHalf,

    /// 1 video source: left view even lines, right view odd lines
    EvenOddRows,
}

impl StereoLayout {
    pub const ALL: [StereoLayout; 7] = [
        StereoLayout::Mono,
        StereoLayout::Separate,
        StereoLayout::TopBottom,
        StereoLayout::TopBottomHalf,
        StereoLayout::LeftRight,
        StereoLayout::LeftRightHalf,
        StereoLayout::EvenOddRows,
    ];

    /// Render the layout together with its swap flag.
    ///
    /// Mono has no second view, so its swap flag is not represented.
    pub fn to_name(self, swap: bool) -> &'static str {
        match (self, swap) {
            (StereoLayout::Mono, _) => "mono",
            (StereoLayout::Separate, false) => "separate-left-right",
            (StereoLayout::Separate, true) => "separate-right-left",
            (StereoLayout::TopBottom, false) => "top-bottom",
            (StereoLayout::TopBottom, true) => "bottom-top",
            (StereoLayout::TopBottomHalf, false) => "top-bottom-half",
            (StereoLayout::TopBottomHalf, true) => "bottom-top-half",
            (StereoLayout::LeftRight, false) => "left-right",
            (StereoLayout::LeftRight, true) => "right-left",
            (StereoLayout::LeftRightHalf, false) => "left-right-half",
            (StereoLayout::LeftRightHalf, true) => "right-left-half",
            (StereoLayout::EvenOddRows, false) => "even-odd-rows",
            (StereoLayout::EvenOddRows, true) => "odd-even-rows",
        }
    }

    /// Parse a layout name into the layout and its swap flag
    pub fn from_name(s: &str) -> Result<(StereoLayout, bool)> {
        let parsed = match s {
            "mono" => (StereoLayout::Mono, false),
            "separate-left-right" => (StereoLayout::Separate, false),
            "separate-right-left" => (StereoLayout::Separate, true),
            "top-bottom" => (StereoLayout::TopBottom, false),
            "bottom-top" => (StereoLayout::TopBottom, true),
            "top-bottom-half" => (StereoLayout::TopBottomHalf, false),
            "bottom-top-half" => (StereoLayout::TopBottomHalf, true),
            "left-right" => (StereoLayout::LeftRight, false),
            "right-left" => (StereoLayout::LeftRight, true),
            "left-right-half" => (StereoLayout::LeftRightHalf, false),
            "right-left-half" => (StereoLayout::LeftRightHalf, true),
            "even-odd-rows" => (StereoLayout::EvenOddRows, false),
            "odd-even-rows" => (StereoLayout::EvenOddRows, true),
            _ => {
                return Err(StereoPlayError::Parse(format!(
                    "unknown stereo layout '{}'",
                    s
                )))
            }
        };
        Ok(parsed)
    }

    /// Whether left and right views come from two different streams
    pub fn is_separate(self) -> bool {
        self == StereoLayout::Separate
    }

    /// Whether the layout carries a second view at all
    pub fn is_stereo(self) -> bool {
        self != StereoLayout::Mono
    }
}

impl fmt::Display for StereoLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name(false))
    }
}

/// How left and right views are combined for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StereoMode {
    /// OpenGL quad buffered stereo
    Stereo,
    MonoLeft,
    MonoRight,
    TopBottom,
    TopBottomHalf,
    LeftRight,
    LeftRightHalf,
    EvenOddRows,
    EvenOddColumns,
    Checkerboard,
    RedCyanMonochrome,
    RedCyanHalfColor,
    RedCyanFullColor,
    /// High quality Dubois method
    RedCyanDubois,
    GreenMagentaMonochrome,
    GreenMagentaHalfColor,
    GreenMagentaFullColor,
    GreenMagentaDubois,
    AmberBlueMonochrome,
    AmberBlueHalfColor,
    AmberBlueFullColor,
    AmberBlueDubois,
    RedGreenMonochrome,
    RedBlueMonochrome,
}

impl StereoMode {
    pub const ALL: [StereoMode; 24] = [
        StereoMode::Stereo,
        StereoMode::MonoLeft,
        StereoMode::MonoRight,
        StereoMode::TopBottom,
        StereoMode::TopBottomHalf,
        StereoMode::LeftRight,
        StereoMode::LeftRightHalf,
        StereoMode::EvenOddRows,
        StereoMode::EvenOddColumns,
        StereoMode::Checkerboard,
        StereoMode::RedCyanMonochrome,
        StereoMode::RedCyanHalfColor,
        StereoMode::RedCyanFullColor,
        StereoMode::RedCyanDubois,
        StereoMode::GreenMagentaMonochrome,
        StereoMode::GreenMagentaHalfColor,
        StereoMode::GreenMagentaFullColor,
        StereoMode::GreenMagentaDubois,
        StereoMode::AmberBlueMonochrome,
        StereoMode::AmberBlueHalfColor,
        StereoMode::AmberBlueFullColor,
        StereoMode::AmberBlueDubois,
        StereoMode::RedGreenMonochrome,
        StereoMode::RedBlueMonochrome,
    ];

    /// Base name without the swap suffix
    pub fn base_name(self) -> &'static str {
        match self {
            StereoMode::Stereo => "stereo",
            StereoMode::MonoLeft => "mono-left",
            StereoMode::MonoRight => "mono-right",
            StereoMode::TopBottom => "top-bottom",
            StereoMode::TopBottomHalf => "top-bottom-half",
            StereoMode::LeftRight => "left-right",
            StereoMode::LeftRightHalf => "left-right-half",
            StereoMode::EvenOddRows => "even-odd-rows",
            StereoMode::EvenOddColumns => "even-odd-columns",
            StereoMode::Checkerboard => "checkerboard",
            StereoMode::RedCyanMonochrome => "red-cyan-monochrome",
            StereoMode::RedCyanHalfColor => "red-cyan-half-color",
            StereoMode::RedCyanFullColor => "red-cyan-full-color",
            StereoMode::RedCyanDubois => "red-cyan-dubois",
            StereoMode::GreenMagentaMonochrome => "green-magenta-monochrome",
            StereoMode::GreenMagentaHalfColor => "green-magenta-half-color",
            StereoMode::GreenMagentaFullColor => "green-magenta-full-color",
            StereoMode::GreenMagentaDubois => "green-magenta-dubois",
            StereoMode::AmberBlueMonochrome => "amber-blue-monochrome",
            StereoMode::AmberBlueHalfColor => "amber-blue-half-color",
            StereoMode::AmberBlueFullColor => "amber-blue-full-color",
            StereoMode::AmberBlueDubois => "amber-blue-dubois",
            StereoMode::RedGreenMonochrome => "red-green-monochrome",
            StereoMode::RedBlueMonochrome => "red-blue-monochrome",
        }
    }

    /// Render the mode together with its swap flag
    pub fn to_name(self, swap: bool) -> String {
        if swap {
            format!("{}{}", self.base_name(), SWAP_SUFFIX)
        } else {
            self.base_name().to_string()
        }
    }

    /// Parse a mode name into the mode and its swap flag
    pub fn from_name(s: &str) -> Result<(StereoMode, bool)> {
        let (base, swap) = match s.strip_suffix(SWAP_SUFFIX) {
            Some(base) => (base, true),
            None => (s, false),
        };
        StereoMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.base_name() == base)
            .map(|mode| (mode, swap))
            .ok_or_else(|| StereoPlayError::Parse(format!("unknown stereo mode '{}'", s)))
    }

    /// Whether the mode needs a display with quad buffered stereo
    pub fn requires_stereo_display(self) -> bool {
        self == StereoMode::Stereo
    }

    /// Whether this is one of the anaglyph (color filter glasses) modes
    pub fn is_anaglyph(self) -> bool {
        matches!(
            self,
            StereoMode::RedCyanMonochrome
                | StereoMode::RedCyanHalfColor
                | StereoMode::RedCyanFullColor
                | StereoMode::RedCyanDubois
                | StereoMode::GreenMagentaMonochrome
                | StereoMode::GreenMagentaHalfColor
                | StereoMode::GreenMagentaFullColor
                | StereoMode::GreenMagentaDubois
                | StereoMode::AmberBlueMonochrome
                | StereoMode::AmberBlueHalfColor
                | StereoMode::AmberBlueFullColor
                | StereoMode::AmberBlueDubois
                | StereoMode::RedGreenMonochrome
                | StereoMode::RedBlueMonochrome
        )
    }
}

impl fmt::Display for StereoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layout_names() {
        assert_eq!(StereoLayout::TopBottom.to_name(true), "bottom-top");
        assert_eq!(StereoLayout::Separate.to_name(false), "separate-left-right");
        assert_eq!(
            StereoLayout::from_name("right-left-half").unwrap(),
            (StereoLayout::LeftRightHalf, true)
        );
        assert_eq!(StereoLayout::Mono.to_name(true), "mono");
    }

    #[test]
    fn test_layout_unknown_name() {
        let err = StereoLayout::from_name("diagonal").unwrap_err();
        assert!(matches!(err, StereoPlayError::Parse(_)));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(StereoMode::RedCyanDubois.to_name(false), "red-cyan-dubois");
        assert_eq!(StereoMode::MonoLeft.to_name(true), "mono-left-swap");
        assert_eq!(
            StereoMode::from_name("checkerboard-swap").unwrap(),
            (StereoMode::Checkerboard, true)
        );
        assert!(StereoMode::from_name("purple-yellow").is_err());
        assert!(StereoMode::from_name("-swap").is_err());
    }

    #[test]
    fn test_mode_classification() {
        assert!(StereoMode::AmberBlueDubois.is_anaglyph());
        assert!(!StereoMode::Checkerboard.is_anaglyph());
        assert!(StereoMode::Stereo.requires_stereo_display());
    }

    #[test]
    fn test_mode_names_are_unique() {
        let mut names: Vec<_> = StereoMode::ALL.iter().map(|m| m.base_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StereoMode::ALL.len());
    }

    fn layout_with_swap() -> impl Strategy<Value = (StereoLayout, bool)> {
        (0..StereoLayout::ALL.len(), any::<bool>()).prop_map(|(i, swap)| {
            let layout = StereoLayout::ALL[i];
            (layout, swap && layout.is_stereo())
        })
    }

    fn mode_with_swap() -> impl Strategy<Value = (StereoMode, bool)> {
        (0..StereoMode::ALL.len(), any::<bool>()).prop_map(|(i, swap)| (StereoMode::ALL[i], swap))
    }

    proptest! {
        #[test]
        fn test_layout_name_round_trip((layout, swap) in layout_with_swap()) {
            let name = layout.to_name(swap);
            prop_assert_eq!(StereoLayout::from_name(name).unwrap(), (layout, swap));
        }

        #[test]
        fn test_mode_name_round_trip((mode, swap) in mode_with_swap()) {
            let name = mode.to_name(swap);
            prop_assert_eq!(StereoMode::from_name(&name).unwrap(), (mode, swap));
        }
    }
}
