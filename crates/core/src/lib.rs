//! Waveform view core: coordinate mapping, zoom transitions, drag-to-seek and
//! marker overlays synchronized with a playback clock.
//!
//! Rendering goes through the [`render::SceneRenderer`] trait and playback through
//! [`clock::PlaybackClock`], so the same views drive the egui front end, the
//! headless CLI and the tests.

pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod events;
pub mod markers;
pub mod render;
pub mod view;
pub mod waveform;

pub use error::{PeaklineError, Result};
