//! Step state machine of the playback engine
//!
//! Every call to `PlaybackEngine::step` performs the work of exactly one
//! `Phase`. The phase is selected from the request and staging flags by a
//! fixed priority table:
//!
//! | priority | condition                  | phase             |
//! |----------|----------------------------|-------------------|
//! | 1        | quit requested             | `Quitting`        |
//! | 2        | not running yet            | `Starting`        |
//! | 3        | seek pending               | `Seeking`         |
//! | 4        | pause requested            | `Paused`          |
//! | 5        | frame needed now           | `FinishFrameRead` |
//! | 6        | frame needed soon          | `StartFrameRead`  |
//! | 7        | otherwise                  | `Pacing`          |

use serde::{Deserialize, Serialize};

/// A pending repositioning request
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SeekRequest {
    #[default]
    None,
    /// Move by a signed offset in microseconds
    Relative(i64),
    /// Move to a normalized position in [0, 1]
    Absolute(f32),
    /// Re-read both streams at the current position, e.g. after a stream
    /// switch
    Resync,
}

impl SeekRequest {
    pub fn is_pending(&self) -> bool {
        !matches!(self, SeekRequest::None)
    }

    /// Combine a pending request with a newer one. A resynchronization never
    /// replaces a real seek, since that seek re-reads the streams anyway.
    pub fn merge(self, newer: SeekRequest) -> SeekRequest {
        match (self, newer) {
            (current, SeekRequest::Resync) if current.is_pending() => current,
            (_, newer) => newer,
        }
    }
}

/// Request and frame staging flags of the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFlags {
    /// Initial data has been read and output started
    pub running: bool,
    pub quit: bool,
    pub pause: bool,
    pub seek: SeekRequest,
    /// The read of the next frame must be finished in this step
    pub need_frame_now: bool,
    /// The read of the next frame should be started
    pub need_frame_soon: bool,
    pub drop_next_frame: bool,
    pub previous_frame_dropped: bool,
    /// The pause request has been acknowledged
    pub in_pause: bool,
    /// No frame after the first one has been read yet
    pub first_frame: bool,
}

/// Unit of work performed by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Quitting,
    Starting,
    Seeking,
    Paused,
    FinishFrameRead,
    StartFrameRead,
    Pacing,
}

impl Phase {
    /// Select the phase for the next step
    pub fn select(flags: &RequestFlags) -> Phase {
        if flags.quit {
            Phase::Quitting
        } else if !flags.running {
            Phase::Starting
        } else if flags.seek.is_pending() {
            Phase::Seeking
        } else if flags.pause {
            Phase::Paused
        } else if flags.need_frame_now {
            Phase::FinishFrameRead
        } else if flags.need_frame_soon {
            Phase::StartFrameRead
        } else {
            Phase::Pacing
        }
    }
}

/// Coarse engine state as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Not opened yet
    Idle,
    /// Opened, first data not read yet
    Starting,
    /// Playing and pacing frames
    Streaming,
    /// A seek is pending
    Seeking,
    /// A pause is requested or in effect
    Paused,
    /// A quit is pending
    Quitting,
    /// Playback has ended
    Stopped,
    /// Resources released
    Closed,
}

impl PlaybackState {
    /// State of an opened engine that has not stopped yet
    pub fn from_flags(flags: &RequestFlags) -> PlaybackState {
        if flags.quit {
            PlaybackState::Quitting
        } else if !flags.running {
            PlaybackState::Starting
        } else if flags.seek.is_pending() {
            PlaybackState::Seeking
        } else if flags.pause || flags.in_pause {
            PlaybackState::Paused
        } else {
            PlaybackState::Streaming
        }
    }
}
