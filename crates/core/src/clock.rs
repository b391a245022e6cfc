//! Playback clock collaborator.

/// Source of the current playback position, and target of seek requests.
pub trait PlaybackClock {
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;
    fn seek(&mut self, time: f64);
}

/// Clock moved explicitly by the caller. Used by the CLI's playback simulation and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ManualClock {
    time: f64,
}

impl ManualClock {
    pub fn new(time: f64) -> Self {
        Self { time: time.max(0.0) }
    }

    pub fn advance(&mut self, seconds: f64) {
        self.time = (self.time + seconds).max(0.0);
    }
}

impl PlaybackClock for ManualClock {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn seek(&mut self, time: f64) {
        self.time = time.max(0.0);
    }
}
