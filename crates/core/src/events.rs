//! Events emitted to the host application.

use serde::Serialize;

use crate::markers::{Point, Segment};

/// Something the host may react to. Payloads carry the marker or a time, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum ViewEvent {
    #[serde(rename = "points.enter")]
    PointEnter(Point),
    #[serde(rename = "points.exit")]
    PointExit(Point),
    #[serde(rename = "segments.enter")]
    SegmentEnter(Segment),
    #[serde(rename = "segments.exit")]
    SegmentExit(Segment),
    /// The user asked to move playback; the player collaborator performs the seek.
    #[serde(rename = "user_seek")]
    UserSeek { time: f64 },
    #[serde(rename = "zoom.update")]
    ZoomUpdate { previous_scale: f64, current_scale: f64 },
}

impl ViewEvent {
    /// Dotted event name as seen by hosts.
    pub fn name(&self) -> &'static str {
        match self {
            ViewEvent::PointEnter(_) => "points.enter",
            ViewEvent::PointExit(_) => "points.exit",
            ViewEvent::SegmentEnter(_) => "segments.enter",
            ViewEvent::SegmentExit(_) => "segments.exit",
            ViewEvent::UserSeek { .. } => "user_seek",
            ViewEvent::ZoomUpdate { .. } => "zoom.update",
        }
    }
}

/// Receiver for view events.
pub trait EventSink {
    fn emit(&mut self, event: ViewEvent);
}

impl EventSink for Vec<ViewEvent> {
    fn emit(&mut self, event: ViewEvent) {
        self.push(event);
    }
}

/// Sink that drops everything, for callers that only want the side effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, event: ViewEvent) {
        log::trace!("Discarding {}", event.name());
    }
}
