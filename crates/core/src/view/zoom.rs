//! Zoom adapters and zoom levels.
//!
//! A zoom request builds a [`ZoomTransition`] once the waveform has been resampled
//! to the target scale. [`ZoomAdapter::start`] turns it into [`ZoomSteps`]: empty
//! for the static adapter, a finite run of interpolated scales for the animated
//! one. The view pulls one step per animation frame and drops the iterator to
//! cancel.

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use super::mapper::CoordinateMapper;
use crate::error::{validate_scale, PeaklineError, Result};

pub const DEFAULT_ANIMATION_DURATION_MS: u64 = 200;
pub const DEFAULT_ANIMATION_FRAME_RATE: u32 = 60;
/// Longest animation accepted from options.
pub const MAX_ANIMATION_DURATION_MS: u64 = 10_000;

/// Easing applied to the interpolation fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    /// Cubic deceleration
    EaseOut,
    /// Cubic acceleration then deceleration
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// How a view moves from one scale to another.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoomAdapter {
    /// Jump straight to the target scale.
    #[default]
    Static,
    /// Interpolate over `duration_ms`, one step per frame at `frame_rate`.
    Animated {
        #[serde(default = "default_duration_ms")]
        duration_ms: u64,
        #[serde(default = "default_frame_rate")]
        frame_rate: u32,
        #[serde(default)]
        easing: Easing,
    },
}

fn default_duration_ms() -> u64 {
    DEFAULT_ANIMATION_DURATION_MS
}

fn default_frame_rate() -> u32 {
    DEFAULT_ANIMATION_FRAME_RATE
}

impl ZoomAdapter {
    /// Animated adapter with default timing and linear easing.
    pub fn animated() -> Self {
        ZoomAdapter::Animated {
            duration_ms: DEFAULT_ANIMATION_DURATION_MS,
            frame_rate: DEFAULT_ANIMATION_FRAME_RATE,
            easing: Easing::Linear,
        }
    }

    /// Number of intermediate steps a transition produces.
    pub fn step_count(&self) -> usize {
        match *self {
            ZoomAdapter::Static => 0,
            ZoomAdapter::Animated { duration_ms, frame_rate, .. } => {
                let frames = duration_ms.saturating_mul(frame_rate as u64).div_ceil(1000);
                frames.max(1) as usize
            }
        }
    }

    /// Begin a transition. Fails fast on invalid scales without producing steps.
    pub fn start(&self, transition: ZoomTransition) -> Result<ZoomSteps> {
        validate_scale(transition.previous_scale)?;
        validate_scale(transition.current_scale)?;
        let easing = match *self {
            ZoomAdapter::Static => Easing::Linear,
            ZoomAdapter::Animated { easing, .. } => easing,
        };
        log::debug!(
            "Zoom {:?}: {} -> {} anchored at {:.3}s ({:.2} of width)",
            self,
            transition.previous_scale,
            transition.current_scale,
            transition.anchor_time,
            transition.relative_position
        );
        Ok(ZoomSteps {
            transition,
            easing,
            next: 1,
            total: self.step_count(),
        })
    }
}

/// A scale and the frame offset that keeps the anchor in place at that scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomStep {
    pub scale: f64,
    pub frame_offset: u64,
}

/// Transient state of one zoom request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransition {
    pub previous_scale: f64,
    pub current_scale: f64,
    /// Fraction of the view width where the anchor time stays put.
    pub relative_position: f64,
    pub anchor_time: f64,
    pub width: f64,
    sample_rate: u32,
    total_frames: u64,
}

impl ZoomTransition {
    /// Build a transition anchored on `anchor_time`, which is clamped to the
    /// waveform. `relative_position` is clamped to [0, 1].
    pub fn new(
        previous_scale: f64,
        current_scale: f64,
        relative_position: f64,
        anchor_time: f64,
        mapper: &CoordinateMapper,
        width: f64,
    ) -> Result<Self> {
        let previous_scale = validate_scale(previous_scale)?;
        let current_scale = validate_scale(current_scale)?;
        let relative_position = if relative_position.is_nan() {
            0.5
        } else {
            relative_position.clamp(0.0, 1.0)
        };
        Ok(Self {
            previous_scale,
            current_scale,
            relative_position,
            anchor_time: mapper.clamp_time(anchor_time),
            width: width.max(0.0),
            sample_rate: mapper.sample_rate(),
            total_frames: mapper.total_frames(),
        })
    }

    /// Pixel (from the left edge) that the anchor time is pinned to.
    pub fn anchor_px(&self) -> f64 {
        self.relative_position * self.width
    }

    /// Frame offset placing the anchor under [`Self::anchor_px`] at `scale`,
    /// clamped so the window stays inside the waveform.
    pub fn frame_offset_for(&self, scale: f64) -> u64 {
        let anchor_frame = self.anchor_time * self.sample_rate as f64;
        let visible = (self.width * scale).ceil() as u64;
        let max_offset = self.total_frames.saturating_sub(visible);
        let offset = anchor_frame - self.anchor_px() * scale;
        if offset <= 0.0 {
            0
        } else {
            (offset.round() as u64).min(max_offset)
        }
    }

    /// Step at an eased interpolation fraction. Depends only on the transition and
    /// the fraction, so replaying a step is harmless.
    pub fn step_at(&self, fraction: f64) -> ZoomStep {
        let fraction = fraction.clamp(0.0, 1.0);
        let scale = if fraction >= 1.0 {
            self.current_scale
        } else {
            self.previous_scale + (self.current_scale - self.previous_scale) * fraction
        };
        ZoomStep {
            scale,
            frame_offset: self.frame_offset_for(scale),
        }
    }

    /// Final resting state.
    pub fn target(&self) -> ZoomStep {
        self.step_at(1.0)
    }
}

/// Lazily produced interpolation steps of one transition.
///
/// Consumed by value and not `Clone`, so a transition cannot be restarted;
/// dropping it cancels the remaining steps.
#[derive(Debug)]
pub struct ZoomSteps {
    transition: ZoomTransition,
    easing: Easing,
    next: usize,
    total: usize,
}

impl ZoomSteps {
    pub fn transition(&self) -> &ZoomTransition {
        &self.transition
    }

    /// True for static transitions: there is nothing to animate.
    pub fn is_instant(&self) -> bool {
        self.total == 0
    }

    pub fn target(&self) -> ZoomStep {
        self.transition.target()
    }
}

impl Iterator for ZoomSteps {
    type Item = ZoomStep;

    fn next(&mut self) -> Option<ZoomStep> {
        if self.next > self.total {
            return None;
        }
        let i = self.next;
        self.next += 1;
        let step = if i == self.total {
            self.transition.target()
        } else {
            let linear = i as f64 / self.total as f64;
            self.transition.step_at(self.easing.apply(linear))
        };
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total + 1).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ZoomSteps {}

impl FusedIterator for ZoomSteps {}

/// Ordered list of allowed scales with a current position.
///
/// Index 0 is the most detailed (smallest samples-per-pixel) level.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomLevels {
    levels: Vec<u32>,
    index: usize,
}

impl ZoomLevels {
    pub fn new(mut levels: Vec<u32>) -> Result<Self> {
        if levels.is_empty() {
            return Err(PeaklineError::InvalidOptions("no zoom levels configured".into()));
        }
        if let Some(&bad) = levels.iter().find(|&&l| l == 0) {
            return Err(PeaklineError::InvalidScale(bad as f64));
        }
        levels.sort_unstable();
        levels.dedup();
        Ok(Self { levels, index: 0 })
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> u32 {
        self.levels[self.index]
    }

    /// Move to a more detailed level. `None` at the finest level.
    pub fn zoom_in(&mut self) -> Option<u32> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    /// Move to a coarser level. `None` at the coarsest level.
    pub fn zoom_out(&mut self) -> Option<u32> {
        if self.index + 1 >= self.levels.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    pub fn set_index(&mut self, index: usize) -> Option<u32> {
        if index >= self.levels.len() {
            return None;
        }
        self.index = index;
        Some(self.current())
    }

    /// Peek at the level `delta` steps away without moving.
    pub fn peek(&self, delta: isize) -> Option<u32> {
        let index = self.index.checked_add_signed(delta)?;
        self.levels.get(index).copied()
    }

    /// Index of the level closest to `scale`.
    pub fn nearest(&self, scale: f64) -> usize {
        self.levels
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (**a as f64 - scale).abs();
                let db = (**b as f64 - scale).abs();
                da.total_cmp(&db)
            })
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Drop levels finer than the waveform resolution. Keeps at least one level.
    pub fn retain_at_least(&mut self, minimum: u32) {
        let current = self.current();
        let coarsest = *self.levels.last().unwrap_or(&minimum);
        self.levels.retain(|&l| l >= minimum);
        if self.levels.is_empty() {
            self.levels.push(coarsest.max(minimum));
        }
        self.index = self.nearest(current as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 1000;

    fn mapper() -> CoordinateMapper {
        // 100 seconds of audio
        CoordinateMapper::new(10.0, SR, 100_000).unwrap()
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseOut, Easing::EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12);
            assert!((easing.apply(0.5) - 0.5).abs() < 0.4);
        }
        assert!(Easing::EaseOut.apply(0.25) > 0.25);
        assert!(Easing::EaseInOut.apply(0.25) < 0.25);
    }

    #[test]
    fn test_step_count() {
        assert_eq!(ZoomAdapter::Static.step_count(), 0);
        assert_eq!(ZoomAdapter::animated().step_count(), 12);
        let tiny = ZoomAdapter::Animated { duration_ms: 0, frame_rate: 60, easing: Easing::Linear };
        assert_eq!(tiny.step_count(), 1);
        let huge = ZoomAdapter::Animated { duration_ms: u64::MAX, frame_rate: 60, easing: Easing::Linear };
        assert_eq!(huge.step_count(), (u64::MAX / 1000 + 1) as usize);
    }

    #[test]
    fn test_transition_rejects_invalid_scale() {
        let m = mapper();
        assert_eq!(
            ZoomTransition::new(0.0, 20.0, 0.5, 10.0, &m, 500.0),
            Err(PeaklineError::InvalidScale(0.0))
        );
        assert_eq!(
            ZoomTransition::new(10.0, -20.0, 0.5, 10.0, &m, 500.0),
            Err(PeaklineError::InvalidScale(-20.0))
        );
    }

    #[test]
    fn test_start_fails_fast_on_invalid_scale() {
        let mut t = ZoomTransition::new(10.0, 20.0, 0.5, 10.0, &mapper(), 500.0).unwrap();
        t.current_scale = 0.0;
        assert!(ZoomAdapter::animated().start(t).is_err());
        assert!(ZoomAdapter::Static.start(t).is_err());
    }

    #[test]
    fn test_static_adapter_is_instant() {
        let t = ZoomTransition::new(10.0, 20.0, 0.5, 50.0, &mapper(), 500.0).unwrap();
        let mut steps = ZoomAdapter::Static.start(t).unwrap();
        assert!(steps.is_instant());
        assert_eq!(steps.target().scale, 20.0);
        assert_eq!(steps.len(), 0);
        assert_eq!(steps.next(), None);
    }

    #[test]
    fn test_anchor_preserved_at_target() {
        let t = ZoomTransition::new(10.0, 40.0, 0.25, 50.0, &mapper(), 400.0).unwrap();
        let step = t.target();
        // 50s = frame 50000; anchor px 100 at 40 frames/px = 4000 frames
        assert_eq!(step.frame_offset, 46_000);
        let mut after = mapper().with_scale(step.scale).unwrap();
        after.set_frame_offset(step.frame_offset);
        assert!((after.pixels_to_time(100.0) - 50.0).abs() < after.scale() / SR as f64);
    }

    #[test]
    fn test_frame_offset_clamped_at_edges() {
        let m = mapper();
        let start = ZoomTransition::new(10.0, 40.0, 0.5, 1.0, &m, 400.0).unwrap();
        assert_eq!(start.target().frame_offset, 0);
        let end = ZoomTransition::new(10.0, 40.0, 0.5, 99.0, &m, 400.0).unwrap();
        assert_eq!(end.target().frame_offset, 100_000 - 16_000);
    }

    #[test]
    fn test_animated_steps_interpolate_and_end_on_target() {
        let t = ZoomTransition::new(100.0, 200.0, 0.5, 50.0, &mapper(), 400.0).unwrap();
        let adapter = ZoomAdapter::Animated { duration_ms: 100, frame_rate: 40, easing: Easing::Linear };
        let steps = adapter.start(t).unwrap();
        assert_eq!(steps.len(), 4);
        let scales: Vec<f64> = steps.map(|s| s.scale).collect();
        assert_eq!(scales, vec![125.0, 150.0, 175.0, 200.0]);
    }

    #[test]
    fn test_steps_are_not_restartable() {
        let t = ZoomTransition::new(100.0, 50.0, 0.5, 50.0, &mapper(), 400.0).unwrap();
        let mut steps = ZoomAdapter::animated().start(t).unwrap();
        let n = steps.by_ref().count();
        assert_eq!(n, 12);
        assert_eq!(steps.next(), None);
        assert_eq!(steps.len(), 0);
    }

    #[test]
    fn test_step_at_is_idempotent() {
        let t = ZoomTransition::new(100.0, 300.0, 0.3, 20.0, &mapper(), 400.0).unwrap();
        assert_eq!(t.step_at(0.4), t.step_at(0.4));
        assert_eq!(t.step_at(0.5).scale, 200.0);
        assert_eq!(t.step_at(2.0), t.target());
    }

    #[test]
    fn test_relative_position_clamped() {
        let t = ZoomTransition::new(10.0, 20.0, 1.7, 10.0, &mapper(), 300.0).unwrap();
        assert_eq!(t.relative_position, 1.0);
        assert_eq!(t.anchor_px(), 300.0);
    }

    #[test]
    fn test_zoom_levels_navigation() {
        let mut levels = ZoomLevels::new(vec![4096, 512, 2048, 1024, 512]).unwrap();
        assert_eq!(levels.levels(), &[512, 1024, 2048, 4096]);
        assert_eq!(levels.current(), 512);
        assert_eq!(levels.zoom_in(), None);
        assert_eq!(levels.zoom_out(), Some(1024));
        assert_eq!(levels.peek(1), Some(2048));
        assert_eq!(levels.peek(-2), None);
        assert_eq!(levels.set_index(3), Some(4096));
        assert_eq!(levels.zoom_out(), None);
        assert_eq!(levels.set_index(9), None);
        assert_eq!(levels.nearest(1500.0), 1);
    }

    #[test]
    fn test_zoom_levels_validation() {
        assert!(matches!(
            ZoomLevels::new(vec![]),
            Err(PeaklineError::InvalidOptions(_))
        ));
        assert_eq!(
            ZoomLevels::new(vec![512, 0]),
            Err(PeaklineError::InvalidScale(0.0))
        );
    }

    #[test]
    fn test_zoom_levels_retain_resolution() {
        let mut levels = ZoomLevels::new(vec![128, 256, 512]).unwrap();
        levels.retain_at_least(256);
        assert_eq!(levels.levels(), &[256, 512]);
        assert_eq!(levels.current(), 256);
        levels.retain_at_least(8192);
        assert_eq!(levels.levels(), &[8192]);
    }

    #[test]
    fn test_adapter_config_serde() {
        let a: ZoomAdapter = serde_json::from_str(r#"{"kind":"animated","easing":"ease_out"}"#).unwrap();
        assert_eq!(
            a,
            ZoomAdapter::Animated { duration_ms: 200, frame_rate: 60, easing: Easing::EaseOut }
        );
        let s: ZoomAdapter = serde_json::from_str(r#"{"kind":"static"}"#).unwrap();
        assert_eq!(s, ZoomAdapter::Static);
    }
}
