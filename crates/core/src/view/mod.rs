//! Waveform views and their building blocks.

pub mod axis;
pub mod drag;
pub mod mapper;
pub mod waveform_view;
pub mod zoom;

pub use drag::{DragMode, DragSeekHandler, DragSession};
pub use mapper::CoordinateMapper;
pub use waveform_view::{ViewContext, ViewKind, WaveformView};
pub use zoom::{Easing, ZoomAdapter, ZoomLevels, ZoomStep, ZoomSteps, ZoomTransition};
