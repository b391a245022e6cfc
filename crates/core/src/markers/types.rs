//! Marker data model: points and segments.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Color;
use crate::error::{PeaklineError, Result};

/// Unique identifier for a marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    /// Fresh random id for markers created without one.
    pub fn generate() -> Self {
        MarkerId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(s: &str) -> Self {
        MarkerId(s.to_string())
    }
}

impl From<String> for MarkerId {
    fn from(s: String) -> Self {
        MarkerId(s)
    }
}

impl From<u64> for MarkerId {
    fn from(n: u64) -> Self {
        MarkerId(n.to_string())
    }
}

/// Anything that occupies a time interval on the timeline.
///
/// Intervals are half-open, `[start_time, end_time)`. A marker whose start equals
/// its end is an instant and is detected by crossing rather than containment.
pub trait TimedMarker {
    fn id(&self) -> &MarkerId;
    fn start_time(&self) -> f64;
    fn end_time(&self) -> f64;

    fn is_instant(&self) -> bool {
        self.end_time() <= self.start_time()
    }

    fn contains(&self, time: f64) -> bool {
        self.start_time() <= time && time < self.end_time()
    }

    /// Whether any part of the marker falls in `[start, end]`.
    fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start_time() <= end && self.end_time() >= start
    }

    fn validate(&self) -> Result<()> {
        let (start, end) = (self.start_time(), self.end_time());
        let invalid = |reason: &str| PeaklineError::InvalidMarker {
            id: self.id().to_string(),
            reason: reason.to_string(),
        };
        if !start.is_finite() || !end.is_finite() {
            return Err(invalid("time is not finite"));
        }
        if start < 0.0 {
            return Err(invalid("start time is negative"));
        }
        if end < start {
            return Err(invalid("end time is before start time"));
        }
        Ok(())
    }
}

/// A zero-width marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default = "MarkerId::generate")]
    pub id: MarkerId,
    pub time: f64,
    #[serde(default)]
    pub label_text: String,
    /// Falls back to the view's point color when unset.
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub editable: bool,
}

impl Point {
    pub fn new(id: impl Into<MarkerId>, time: f64) -> Self {
        Self {
            id: id.into(),
            time,
            label_text: String::new(),
            color: None,
            editable: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label_text = label.into();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

impl TimedMarker for Point {
    fn id(&self) -> &MarkerId {
        &self.id
    }

    fn start_time(&self) -> f64 {
        self.time
    }

    fn end_time(&self) -> f64 {
        self.time
    }
}

/// A time-interval marker, drawn as a highlighted region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default = "MarkerId::generate")]
    pub id: MarkerId,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub label_text: String,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub editable: bool,
}

impl Segment {
    pub fn new(id: impl Into<MarkerId>, start_time: f64, end_time: f64) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time,
            label_text: String::new(),
            color: None,
            editable: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label_text = label.into();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

impl TimedMarker for Segment {
    fn id(&self) -> &MarkerId {
        &self.id
    }

    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn end_time(&self) -> f64 {
        self.end_time
    }
}
