//! Conversions between time, sample frame and pixel offset.
//!
//! Pixel offsets are relative to the view's left edge (`frame_offset`). Inputs
//! outside the waveform are clamped rather than rejected: a time past the end maps
//! to the last frame, a negative pixel maps to the first visible frame's left.

use crate::error::{validate_scale, PeaklineError, Result};

/// Scale/offset pair of one view plus the extent of its waveform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    scale: f64,
    frame_offset: u64,
    sample_rate: u32,
    total_frames: u64,
}

impl CoordinateMapper {
    /// Create a mapper starting at frame 0.
    pub fn new(scale: f64, sample_rate: u32, total_frames: u64) -> Result<Self> {
        let scale = validate_scale(scale)?;
        if sample_rate == 0 {
            return Err(PeaklineError::InvalidWaveform("sample_rate is 0".into()));
        }
        Ok(Self {
            scale,
            frame_offset: 0,
            sample_rate,
            total_frames,
        })
    }

    /// Same mapper at a different scale. The frame offset is kept.
    pub fn with_scale(self, scale: f64) -> Result<Self> {
        let scale = validate_scale(scale)?;
        Ok(Self { scale, ..self })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn frame_offset(&self) -> u64 {
        self.frame_offset
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.total_frames as f64 / self.sample_rate as f64
    }

    /// Set the first visible frame, clamped to the waveform extent.
    ///
    /// Views additionally clamp with [`Self::clamp_frame_offset`] so the visible
    /// window never runs past the end.
    pub fn set_frame_offset(&mut self, frame_offset: u64) {
        self.frame_offset = frame_offset.min(self.total_frames);
    }

    /// Clamp a time to `[0, duration]`. NaN maps to 0.
    pub fn clamp_time(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, self.duration())
    }

    pub fn clamp_frame(&self, frame: u64) -> u64 {
        frame.min(self.total_frames)
    }

    pub fn time_to_frame(&self, time: f64) -> u64 {
        let frame = (self.clamp_time(time) * self.sample_rate as f64).round() as u64;
        self.clamp_frame(frame)
    }

    pub fn frame_to_time(&self, frame: u64) -> f64 {
        self.clamp_frame(frame) as f64 / self.sample_rate as f64
    }

    /// Pixel offset of a frame relative to the view's left edge. Negative when the
    /// frame lies before the view.
    pub fn frame_to_pixels(&self, frame: u64) -> f64 {
        (self.clamp_frame(frame) as f64 - self.frame_offset as f64) / self.scale
    }

    pub fn pixels_to_frame(&self, pixels: f64) -> u64 {
        let frame = self.frame_offset as f64 + pixels * self.scale;
        if frame.is_nan() || frame <= 0.0 {
            return 0;
        }
        self.clamp_frame(frame.round() as u64)
    }

    /// Pixel offset of a time relative to the view's left edge.
    ///
    /// Works on fractional frames so that `pixels_to_time(time_to_pixels(t))`
    /// returns `t` up to float error.
    pub fn time_to_pixels(&self, time: f64) -> f64 {
        let frame = self.clamp_time(time) * self.sample_rate as f64;
        (frame - self.frame_offset as f64) / self.scale
    }

    pub fn pixels_to_time(&self, pixels: f64) -> f64 {
        let frame = self.frame_offset as f64 + pixels * self.scale;
        self.clamp_time(frame / self.sample_rate as f64)
    }

    /// Frames covered by `width` pixels at the current scale.
    pub fn visible_frames(&self, width: f64) -> u64 {
        (width.max(0.0) * self.scale).ceil() as u64
    }

    /// Largest frame offset that keeps a `width`-pixel window inside the waveform.
    pub fn max_frame_offset(&self, width: f64) -> u64 {
        self.total_frames.saturating_sub(self.visible_frames(width))
    }

    pub fn clamp_frame_offset(&self, frame_offset: u64, width: f64) -> u64 {
        frame_offset.min(self.max_frame_offset(width))
    }

    /// Time range `(start, end)` covered by a `width`-pixel window.
    pub fn visible_time_range(&self, width: f64) -> (f64, f64) {
        (self.pixels_to_time(0.0), self.pixels_to_time(width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    fn mapper(scale: f64, seconds: u64) -> CoordinateMapper {
        CoordinateMapper::new(scale, SR, seconds * SR as u64).unwrap()
    }

    #[test]
    fn test_invalid_scale_rejected() {
        assert_eq!(
            CoordinateMapper::new(0.0, SR, 1000),
            Err(PeaklineError::InvalidScale(0.0))
        );
        assert_eq!(
            CoordinateMapper::new(-512.0, SR, 1000),
            Err(PeaklineError::InvalidScale(-512.0))
        );
        let m = mapper(512.0, 10);
        assert_eq!(m.with_scale(-1.0), Err(PeaklineError::InvalidScale(-1.0)));
        assert_eq!(m.scale(), 512.0);
        assert!(CoordinateMapper::new(512.0, 0, 1000).is_err());
    }

    #[test]
    fn test_round_trip_within_one_pixel() {
        let mut m = mapper(512.0, 60);
        m.set_frame_offset(123_456);
        let tolerance = m.scale() / SR as f64;
        let mut t = 0.0;
        while t <= m.duration() {
            let back = m.pixels_to_time(m.time_to_pixels(t));
            assert!((back - t).abs() < tolerance, "t={t} back={back}");
            t += 0.37;
        }
    }

    #[test]
    fn test_frame_round_trip() {
        let mut m = mapper(1024.0, 30);
        m.set_frame_offset(2048);
        for frame in [2048u64, 4096, 100_000, 500_000] {
            let px = m.frame_to_pixels(frame);
            let back = m.pixels_to_frame(px);
            assert!(back.abs_diff(frame) <= 1, "frame={frame} back={back}");
        }
        assert_eq!(m.frame_to_pixels(2048 + 1024 * 3), 3.0);
    }

    #[test]
    fn test_conversions_monotonic() {
        for scale in [1.0, 7.5, 256.0, 4096.0] {
            let m = mapper(scale, 120);
            let mut prev = -1.0;
            for px in 0..2000 {
                let t = m.pixels_to_time(px as f64);
                if t < m.duration() {
                    assert!(t > prev, "scale={scale} px={px}");
                }
                prev = t;
            }
        }
    }

    #[test]
    fn test_out_of_range_inputs_clamp() {
        let m = mapper(100.0, 10);
        assert_eq!(m.time_to_frame(-5.0), 0);
        assert_eq!(m.time_to_frame(1000.0), m.total_frames());
        assert_eq!(m.time_to_frame(f64::NAN), 0);
        assert_eq!(m.pixels_to_time(-50.0), 0.0);
        assert_eq!(m.pixels_to_time(1e9), m.duration());
        assert_eq!(m.pixels_to_frame(-3.0), 0);
        assert_eq!(m.frame_to_time(u64::MAX), m.duration());
        assert_eq!(m.time_to_pixels(-1.0), 0.0);
    }

    #[test]
    fn test_time_to_pixels_relative_to_offset() {
        let mut m = mapper(441.0, 10);
        assert_eq!(m.time_to_pixels(1.0), 100.0);
        m.set_frame_offset(44100);
        assert_eq!(m.time_to_pixels(1.0), 0.0);
        assert_eq!(m.time_to_pixels(0.5), -50.0);
        assert_eq!(m.pixels_to_time(100.0), 2.0);
    }

    #[test]
    fn test_frame_offset_clamping() {
        let mut m = mapper(100.0, 1);
        assert_eq!(m.visible_frames(200.0), 20_000);
        assert_eq!(m.max_frame_offset(200.0), 44100 - 20_000);
        assert_eq!(m.clamp_frame_offset(40_000, 200.0), 24_100);
        assert_eq!(m.max_frame_offset(1000.0), 0);
        m.set_frame_offset(u64::MAX);
        assert_eq!(m.frame_offset(), 44100);
    }

    #[test]
    fn test_visible_time_range() {
        let mut m = mapper(441.0, 10);
        m.set_frame_offset(44100);
        let (start, end) = m.visible_time_range(500.0);
        assert_eq!(start, 1.0);
        assert_eq!(end, 6.0);
    }
}
