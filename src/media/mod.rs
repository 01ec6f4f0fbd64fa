//! Media format descriptors
//!
//! Passive value types describing decoded video frames, audio chunks,
//! subtitle cues and the user adjustable presentation parameters. The
//! engine and its collaborators exchange these; none of them carries
//! behavior beyond validation, geometry and string conversion.

pub mod audio_blob;
pub mod parameters;
pub mod stereo;
pub mod subtitle;
pub mod video_frame;

pub use audio_blob::{AudioBlob, SampleFormat};
pub use parameters::Parameters;
pub use stereo::{StereoLayout, StereoMode};
pub use subtitle::{SubtitleCue, SubtitleFormat, SubtitleImage, SubtitleList, SubtitlePayload};
pub use video_frame::{
    ChromaLocation, ColorSpace, PixelLayout, PlaneData, ValueRange, VideoFrame, NO_PTS,
};
