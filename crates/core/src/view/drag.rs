//! Pointer drag handling: seek by dragging, or pan the zoom view.

use serde::{Deserialize, Serialize};

use super::mapper::CoordinateMapper;
use crate::events::{EventSink, ViewEvent};

/// What dragging across a view does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMode {
    /// Every pointer position becomes a `user_seek`.
    #[default]
    Seek,
    /// Moves pan the view by the pointer delta; a click without movement seeks.
    Scroll,
}

/// State between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub origin_px_x: f64,
    pub current_time: f64,
    /// Frame offset when the drag started, for scroll drags.
    pub origin_frame_offset: u64,
    /// Last clamped pointer position.
    pub last_px_x: f64,
}

/// Turns pointer positions into clamped seek times.
///
/// Moves are level-triggered: every move during a drag emits a `user_seek`, and the
/// consumer debounces if it wants to.
#[derive(Debug, Clone)]
pub struct DragSeekHandler {
    width: f64,
    session: Option<DragSession>,
}

impl DragSeekHandler {
    pub fn new(width: f64) -> Self {
        Self {
            width: width.max(0.0),
            session: None,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = width.max(0.0);
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Clamp a pointer x to `[0, width]`. NaN maps to 0.
    pub fn clamp_x(&self, x: f64) -> f64 {
        if x.is_nan() {
            return 0.0;
        }
        x.clamp(0.0, self.width)
    }

    /// Start a drag without seeking. Returns the time under the pointer.
    pub fn begin(&mut self, x: f64, mapper: &CoordinateMapper) -> f64 {
        let x = self.clamp_x(x);
        let time = mapper.pixels_to_time(x);
        self.session = Some(DragSession {
            origin_px_x: x,
            current_time: time,
            origin_frame_offset: mapper.frame_offset(),
            last_px_x: x,
        });
        time
    }

    /// Start a drag and seek to the pointer position.
    pub fn on_pointer_down(
        &mut self,
        x: f64,
        mapper: &CoordinateMapper,
        sink: &mut dyn EventSink,
    ) -> f64 {
        let time = self.begin(x, mapper);
        sink.emit(ViewEvent::UserSeek { time });
        time
    }

    /// Seek to the clamped pointer position. Ignored outside a drag.
    pub fn on_pointer_move(
        &mut self,
        x: f64,
        mapper: &CoordinateMapper,
        sink: &mut dyn EventSink,
    ) -> Option<f64> {
        let x = self.clamp_x(x);
        let session = self.session.as_mut()?;
        let time = mapper.pixels_to_time(x);
        session.current_time = time;
        session.last_px_x = x;
        sink.emit(ViewEvent::UserSeek { time });
        Some(time)
    }

    /// Frame offset for a scroll drag at pointer `x`: the waveform follows the
    /// pointer. Unclamped against the window; the view clamps. Ignored outside a drag.
    pub fn scroll_offset(&mut self, x: f64, mapper: &CoordinateMapper) -> Option<u64> {
        let x = self.clamp_x(x);
        let session = self.session.as_mut()?;
        session.last_px_x = x;
        let delta_frames = (session.origin_px_x - x) * mapper.scale();
        let offset = session.origin_frame_offset as f64 + delta_frames;
        Some(if offset <= 0.0 { 0 } else { offset.round() as u64 })
    }

    /// End the drag. Returns the session that ended, if any.
    pub fn on_pointer_up(&mut self) -> Option<DragSession> {
        self.session.take()
    }
}
