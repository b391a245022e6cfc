//! Time-aligned markers: points, segments, their collection and crossing tracks.

pub mod collection;
pub mod track;
pub mod types;

pub use collection::{MarkerCollection, Markers};
pub use track::{MarkerTrack, PointEvents, PointTrack, SegmentEvents, SegmentTrack, TrackVariant};
pub use types::{MarkerId, Point, Segment, TimedMarker};
