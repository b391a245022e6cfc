//! Time axis: tick spacing and label formatting.

use super::mapper::CoordinateMapper;

/// Candidate tick intervals in seconds, finest first.
const TICK_STEPS: &[f64] = &[
    0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 300.0,
    600.0, 900.0, 1800.0, 3600.0,
];

/// A tick on the axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub time: f64,
    /// Pixel offset from the view's left edge
    pub x: f64,
    pub label: String,
}

/// Smallest tick interval that keeps ticks at least `min_spacing_px` apart.
pub fn tick_interval(scale: f64, sample_rate: u32, min_spacing_px: f64) -> f64 {
    let px_per_second = sample_rate as f64 / scale;
    if !px_per_second.is_finite() || px_per_second <= 0.0 {
        return TICK_STEPS[TICK_STEPS.len() - 1];
    }
    let min_interval = min_spacing_px.max(1.0) / px_per_second;
    TICK_STEPS
        .iter()
        .copied()
        .find(|&step| step >= min_interval)
        .unwrap_or_else(|| (min_interval / 3600.0).ceil() * 3600.0)
}

/// Format seconds as `mm:ss` or `h:mm:ss`, with `precision` decimal digits (0-3).
pub fn format_time(seconds: f64, precision: usize) -> String {
    let precision = precision.min(3);
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let factor = 10u64.pow(precision as u32);
    let total = (seconds * factor as f64).round() as u64;
    let fraction = total % factor;
    let whole = total / factor;
    let (hours, minutes, secs) = (whole / 3600, (whole / 60) % 60, whole % 60);

    let mut out = if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    };
    if precision > 0 {
        out.push_str(&format!(".{fraction:0width$}", width = precision));
    }
    out
}

/// Decimal digits needed to tell ticks `interval` seconds apart.
pub fn label_precision(interval: f64) -> usize {
    if interval >= 1.0 {
        0
    } else if interval >= 0.1 {
        1
    } else {
        2
    }
}

/// Ticks across a `width`-pixel window.
pub fn ticks(mapper: &CoordinateMapper, width: f64, min_spacing_px: f64) -> Vec<Tick> {
    let interval = tick_interval(mapper.scale(), mapper.sample_rate(), min_spacing_px);
    let precision = label_precision(interval);
    let (start, end) = mapper.visible_time_range(width);

    let mut out = Vec::new();
    let mut i = (start / interval).ceil() as u64;
    loop {
        let time = i as f64 * interval;
        if time > end {
            break;
        }
        out.push(Tick {
            time,
            x: mapper.time_to_pixels(time),
            label: format_time(time, precision),
        });
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0, 0), "00:00");
        assert_eq!(format_time(75.5, 1), "01:15.5");
        assert_eq!(format_time(3725.25, 2), "1:02:05.25");
        assert_eq!(format_time(59.999, 2), "01:00.00");
        assert_eq!(format_time(-3.0, 0), "00:00");
    }

    #[test]
    fn test_tick_interval_respects_spacing() {
        // 44100 Hz at 441 spp = 100 px/s
        assert_eq!(tick_interval(441.0, 44100, 60.0), 1.0);
        assert_eq!(tick_interval(441.0, 44100, 100.0), 1.0);
        assert_eq!(tick_interval(441.0, 44100, 101.0), 2.0);
        assert_eq!(tick_interval(44.1, 44100, 60.0), 0.1);
        // whole hour of audio in 10 px
        let coarse = tick_interval(44100.0 * 360.0, 44100, 60.0);
        assert!(coarse >= 3600.0 * 6.0 - 1e-6);
        assert_eq!(coarse % 3600.0, 0.0);
    }

    #[test]
    fn test_ticks_cover_window() {
        let mut m = CoordinateMapper::new(441.0, 44100, 44100 * 60).unwrap();
        m.set_frame_offset(44100 * 10 + 22050);
        let ticks = ticks(&m, 500.0, 60.0);
        let times: Vec<f64> = ticks.iter().map(|t| t.time).collect();
        assert_eq!(times, vec![11.0, 12.0, 13.0, 14.0, 15.0]);
        assert_eq!(ticks[0].x, 50.0);
        assert_eq!(ticks[0].label, "00:11");
    }
}
