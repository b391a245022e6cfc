//! Wall-clock playback position for the viewer.

use std::time::Instant;

use peakline_core::clock::PlaybackClock;

/// Playback clock driven by real time. No audio is played; the clock only moves
/// the playhead so marker events and auto-scroll can be watched.
#[derive(Debug, Clone)]
pub struct WallClock {
    /// Position while paused, or where the current run started
    position: f64,
    started: Option<Instant>,
    duration: f64,
}

impl WallClock {
    pub fn new(duration: f64) -> Self {
        Self {
            position: 0.0,
            started: None,
            duration: duration.max(0.0),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.started.is_some()
    }

    pub fn play(&mut self) {
        if self.started.is_none() {
            if self.position >= self.duration {
                self.position = 0.0;
            }
            self.started = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        self.position = self.current_time();
        self.started = None;
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Whether playback ran off the end.
    pub fn finished(&self) -> bool {
        self.is_playing() && self.current_time() >= self.duration
    }
}

impl PlaybackClock for WallClock {
    fn current_time(&self) -> f64 {
        match self.started {
            Some(at) => (self.position + at.elapsed().as_secs_f64()).min(self.duration),
            None => self.position,
        }
    }

    fn seek(&mut self, time: f64) {
        let time = if time.is_finite() { time.clamp(0.0, self.duration) } else { 0.0 };
        self.position = time;
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }
}
