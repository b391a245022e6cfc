//! Viewer configuration, loadable from JSON.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{PeaklineError, Result};
use crate::view::drag::DragMode;
use crate::view::zoom::{ZoomAdapter, ZoomLevels, MAX_ANIMATION_DURATION_MS};

/// Options shared by the overview and zoom views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    /// Allowed zoom view scales in samples per pixel
    pub zoom_levels: Vec<u32>,
    pub zoomview_height: u32,
    pub overview_height: u32,
    pub zoom_adapter: ZoomAdapter,
    /// Keep the playhead inside the zoom view during playback
    pub auto_scroll: bool,
    pub drag_mode: DragMode,
    pub axis: AxisOptions,
    pub colors: ColorOptions,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            zoom_levels: vec![512, 1024, 2048, 4096],
            zoomview_height: 200,
            overview_height: 85,
            zoom_adapter: ZoomAdapter::Static,
            auto_scroll: true,
            drag_mode: DragMode::Seek,
            axis: AxisOptions::default(),
            colors: ColorOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisOptions {
    /// Minimum distance between ticks
    pub min_tick_spacing_px: f64,
    pub show_labels: bool,
}

impl Default for AxisOptions {
    fn default() -> Self {
        Self {
            min_tick_spacing_px: 60.0,
            show_labels: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorOptions {
    pub waveform: Color,
    pub playhead: Color,
    pub axis: Color,
    /// Overview rectangle marking the zoom view's range
    pub highlight: Color,
    /// Used for points without their own color
    pub point: Color,
    /// Used for segments without their own color
    pub segment: Color,
}

impl Default for ColorOptions {
    fn default() -> Self {
        Self {
            waveform: Color::rgb(0x00, 0xe1, 0x80),
            playhead: Color::rgb(0x11, 0x11, 0x11),
            axis: Color::rgb(0xaa, 0xaa, 0xaa),
            highlight: Color::rgba(0xaa, 0xaa, 0xaa, 0x60),
            point: Color::rgb(0xff, 0x80, 0x00),
            segment: Color::rgba(0x4a, 0x9e, 0xff, 0x80),
        }
    }
}

impl ViewerOptions {
    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file: {}", path.display()))?;
        let options: ViewerOptions = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse options file: {}", path.display()))?;
        options
            .validate()
            .with_context(|| format!("Invalid options in {}", path.display()))?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        self.zoom_level_list()?;
        if !(self.axis.min_tick_spacing_px.is_finite() && self.axis.min_tick_spacing_px > 0.0) {
            return Err(PeaklineError::InvalidOptions(format!(
                "axis.min_tick_spacing_px must be positive, got {}",
                self.axis.min_tick_spacing_px
            )));
        }
        if let ZoomAdapter::Animated { duration_ms, frame_rate, .. } = self.zoom_adapter {
            if frame_rate == 0 {
                return Err(PeaklineError::InvalidOptions(
                    "zoom_adapter.frame_rate must be at least 1".into(),
                ));
            }
            if duration_ms > MAX_ANIMATION_DURATION_MS {
                return Err(PeaklineError::InvalidOptions(format!(
                    "zoom_adapter.duration_ms must be at most {}, got {}",
                    MAX_ANIMATION_DURATION_MS, duration_ms
                )));
            }
        }
        Ok(())
    }

    /// The configured zoom levels, sorted.
    pub fn zoom_level_list(&self) -> Result<ZoomLevels> {
        ZoomLevels::new(self.zoom_levels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::zoom::Easing;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = ViewerOptions::default();
        assert_eq!(options.zoom_levels, vec![512, 1024, 2048, 4096]);
        assert_eq!(options.zoomview_height, 200);
        assert_eq!(options.overview_height, 85);
        assert!(options.auto_scroll);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r##"{
            "zoom_levels": [256, 128],
            "zoom_adapter": {"kind": "animated", "duration_ms": 300, "easing": "ease_in_out"},
            "drag_mode": "scroll",
            "colors": {"playhead": "#ff0000"}
        }"##;
        let options: ViewerOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.zoom_level_list().unwrap().levels(), &[128, 256]);
        assert_eq!(
            options.zoom_adapter,
            ZoomAdapter::Animated { duration_ms: 300, frame_rate: 60, easing: Easing::EaseInOut }
        );
        assert_eq!(options.drag_mode, DragMode::Scroll);
        assert_eq!(options.colors.playhead, Color::rgb(255, 0, 0));
        assert_eq!(options.colors.axis, ColorOptions::default().axis);
        assert_eq!(options.overview_height, 85);
    }

    #[test]
    fn test_bad_color_rejected() {
        let json = r#"{"colors": {"waveform": "green"}}"#;
        assert!(serde_json::from_str::<ViewerOptions>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_levels() {
        let options = ViewerOptions {
            zoom_levels: vec![],
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(PeaklineError::InvalidOptions(_))));
        let options = ViewerOptions {
            zoom_levels: vec![512, 0],
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(PeaklineError::InvalidScale(0.0)));
        let options = ViewerOptions {
            zoom_adapter: ZoomAdapter::Animated { duration_ms: 200, frame_rate: 0, easing: Easing::Linear },
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(PeaklineError::InvalidOptions(_))));
    }

    #[test]
    fn test_validate_rejects_bad_timing_and_spacing() {
        let mut options = ViewerOptions::default();
        options.axis.min_tick_spacing_px = 0.0;
        assert!(matches!(options.validate(), Err(PeaklineError::InvalidOptions(_))));

        let options = ViewerOptions {
            zoom_adapter: ZoomAdapter::Animated {
                duration_ms: u64::MAX,
                frame_rate: 60,
                easing: Easing::Linear,
            },
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(PeaklineError::InvalidOptions(_))));

        let options = ViewerOptions {
            zoom_adapter: ZoomAdapter::Animated {
                duration_ms: MAX_ANIMATION_DURATION_MS,
                frame_rate: 60,
                easing: Easing::Linear,
            },
            ..Default::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"auto_scroll": false}}"#).unwrap();
        let options = ViewerOptions::load(file.path()).unwrap();
        assert!(!options.auto_scroll);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{"zoom_levels": [0]}}"#).unwrap();
        let err = ViewerOptions::load(bad.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid options"));
    }
}
