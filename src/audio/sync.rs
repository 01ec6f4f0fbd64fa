//! Time sources and the master clock
//!
//! The engine derives its notion of "now" from either the audio device
//! clock or a free running monotonic timer. Both go through `MasterClock`,
//! which stores one anchor pair (reference instant, media time) and projects
//! media time from elapsed reference time. The anchor is refreshed whenever
//! new audio data is pushed, a video frame is read without audio, or
//! playback restarts after a seek, so device drift never accumulates.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// A monotonic clock in microseconds
pub trait TimeSource: Send + Sync {
    /// Current time in microseconds
    fn now_us(&self) -> i64;
}

/// System monotonic clock, counted from its creation
#[derive(Debug)]
pub struct MonotonicTimeSource {
    origin: Instant,
}

impl MonotonicTimeSource {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn now_us(&self) -> i64 {
        self.origin.elapsed().as_micros() as i64
    }
}

/// A clock that only moves when told to
///
/// Used by tests and by the benchmark harness to drive the engine
/// deterministically.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: AtomicI64,
}

impl ManualTimeSource {
    pub fn new(start_us: i64) -> Self {
        Self { now: AtomicI64::new(start_us) }
    }

    pub fn set(&self, now_us: i64) {
        self.now.store(now_us, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_us: i64) {
        self.now.fetch_add(delta_us, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_us(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Anchor pair mapping a reference clock onto media time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MasterClock {
    /// Reference clock reading at the anchor
    reference: i64,
    /// Media time at the anchor
    media: i64,
    /// Reference clock reading when a timer based pause began
    pause_start: Option<i64>,
}

impl MasterClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor media time `media` at reference instant `reference`
    pub fn anchor(&mut self, reference: i64, media: i64) {
        self.reference = reference;
        self.media = media;
        self.pause_start = None;
    }

    /// Move the anchor to media time `media` without changing the
    /// projection rate: the reference instant shifts by the same amount
    pub fn reanchor(&mut self, media: i64) {
        self.reference += media - self.media;
        self.media = media;
    }

    /// Media time corresponding to reference reading `now`
    pub fn project(&self, now: i64) -> i64 {
        now - self.reference + self.media
    }

    /// Remember when a timer driven pause began
    pub fn pause(&mut self, now: i64) {
        self.pause_start = Some(now);
    }

    /// End a timer driven pause; the paused interval is absorbed into the
    /// anchor so projected media time does not jump
    pub fn resume(&mut self, now: i64) {
        if let Some(start) = self.pause_start.take() {
            self.reference += now - start;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_start.is_some()
    }

    pub fn reference(&self) -> i64 {
        self.reference
    }

    pub fn media(&self) -> i64 {
        self.media
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_time_source() {
        let clock = ManualTimeSource::new(5);
        assert_eq!(clock.now_us(), 5);
        clock.advance(10);
        assert_eq!(clock.now_us(), 15);
        clock.set(-3);
        assert_eq!(clock.now_us(), -3);
    }

    #[test]
    fn test_monotonic_time_source() {
        let clock = MonotonicTimeSource::new();
        let a = clock.now_us();
        let b = clock.now_us();
        assert!(a >= 0);
        assert!(b >= a);
    }

    #[test]
    fn test_projection() {
        let mut clock = MasterClock::new();
        clock.anchor(1_000, 40_000);
        assert_eq!(clock.project(1_000), 40_000);
        assert_eq!(clock.project(21_000), 60_000);
    }

    #[test]
    fn test_reanchor_keeps_projection_continuous() {
        let mut clock = MasterClock::new();
        clock.anchor(0, 0);
        let before = clock.project(50_000);
        clock.reanchor(40_000);
        assert_eq!(clock.media(), 40_000);
        assert_eq!(clock.reference(), 40_000);
        assert_eq!(clock.project(50_000), before);
    }

    #[test]
    fn test_pause_absorbs_interval() {
        let mut clock = MasterClock::new();
        clock.anchor(0, 0);
        clock.pause(10_000);
        assert!(clock.is_paused());
        clock.resume(510_000);
        assert!(!clock.is_paused());
        assert_eq!(clock.project(510_000), 10_000);
    }

    #[test]
    fn test_resume_without_pause_is_noop() {
        let mut clock = MasterClock::new();
        clock.anchor(7, 9);
        clock.resume(1_000);
        assert_eq!(clock.project(7), 9);
    }
}
