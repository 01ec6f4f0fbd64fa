//! Playback engine module for stereoplay
//!
//! This module holds the synchronizing engine, its step state machine and
//! the pieces that run it: the init snapshot, the master registry and the
//! driver thread.

pub mod driver;
pub mod engine;
pub mod init_data;
pub mod master;
pub mod state;

pub use driver::{Driver, DriverHandle, PAUSE_POLL};
pub use engine::{
    PlaybackEngine, PlaybackEngineBuilder, StepOutcome, DROP_LAG_PERCENT, END_GUARD_US,
    FPS_SAMPLE_FRAMES, MAX_ADVISORY_SLEEP_US, SLEEP_SAFETY_MARGIN_US,
};
pub use init_data::PlayerInitData;
pub use master::{MasterRegistry, MasterToken};
pub use state::{Phase, PlaybackState, RequestFlags, SeekRequest};
