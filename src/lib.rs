//! stereoplay - playback synchronization for stereoscopic video
//!
//! The `player` module drives a `decoder::MediaSource`, an
//! `audio::AudioSink` and a `renderer::VideoSink` in lock-step, using the
//! audio device clock (or a monotonic timer) as master clock. Front-ends
//! control it through the `bus` module's commands and notifications.

pub mod audio;
pub mod bus;
pub mod decoder;
pub mod media;
pub mod player;
pub mod renderer;
pub mod utils;

pub use bus::{Command, Notification, Publisher, Subscriber, Subscription};
pub use player::{Driver, PlaybackEngine, PlaybackEngineBuilder, PlaybackState, PlayerInitData};
pub use utils::error::{Result, StereoPlayError};
