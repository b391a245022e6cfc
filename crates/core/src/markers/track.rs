//! Playback crossing detection for points and segments.
//!
//! One generic algorithm serves both marker kinds. A [`TrackVariant`] supplies the
//! marker type and the events to emit; [`MarkerTrack`] cannot be used without one.
//!
//! Segments are active while the playhead is inside `[start, end)`: an enter fires
//! when a segment becomes active and an exit when it stops being active. Points have
//! no extent, so enter and exit fire back to back when playback moves forward over
//! them (`previous < time <= current`), or when the first update lands exactly on
//! one. Events for one update are emitted in marker order before `update` returns.

use std::collections::HashSet;
use std::marker::PhantomData;

use super::collection::{MarkerCollection, Markers};
use super::types::{MarkerId, Point, Segment, TimedMarker};
use crate::events::{EventSink, ViewEvent};

/// Marker kind handled by a [`MarkerTrack`].
pub trait TrackVariant {
    type Marker: TimedMarker + Clone;

    fn enter_event(marker: &Self::Marker) -> ViewEvent;
    fn exit_event(marker: &Self::Marker) -> ViewEvent;

    /// The collection of this kind inside a [`Markers`] set.
    fn collection(markers: &Markers) -> &MarkerCollection<Self::Marker>;
}

/// Emits `points.enter` / `points.exit`.
#[derive(Debug, Clone, Copy)]
pub enum PointEvents {}

/// Emits `segments.enter` / `segments.exit`.
#[derive(Debug, Clone, Copy)]
pub enum SegmentEvents {}

impl TrackVariant for PointEvents {
    type Marker = Point;

    fn enter_event(marker: &Point) -> ViewEvent {
        ViewEvent::PointEnter(marker.clone())
    }

    fn exit_event(marker: &Point) -> ViewEvent {
        ViewEvent::PointExit(marker.clone())
    }

    fn collection(markers: &Markers) -> &MarkerCollection<Point> {
        markers.points()
    }
}

impl TrackVariant for SegmentEvents {
    type Marker = Segment;

    fn enter_event(marker: &Segment) -> ViewEvent {
        ViewEvent::SegmentEnter(marker.clone())
    }

    fn exit_event(marker: &Segment) -> ViewEvent {
        ViewEvent::SegmentExit(marker.clone())
    }

    fn collection(markers: &Markers) -> &MarkerCollection<Segment> {
        markers.segments()
    }
}

pub type PointTrack = MarkerTrack<PointEvents>;
pub type SegmentTrack = MarkerTrack<SegmentEvents>;

/// Crossing state of one marker kind between time updates.
#[derive(Debug)]
pub struct MarkerTrack<V> {
    active: HashSet<MarkerId>,
    /// Time of the last update, for point crossings. Cleared by `reset`.
    previous_time: Option<f64>,
    /// Time of the last update, kept across `reset` to bound the scan.
    last_time: Option<f64>,
    _variant: PhantomData<fn() -> V>,
}

impl<V: TrackVariant> Default for MarkerTrack<V> {
    fn default() -> Self {
        Self {
            active: HashSet::new(),
            previous_time: None,
            last_time: None,
            _variant: PhantomData,
        }
    }
}

impl<V: TrackVariant> MarkerTrack<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a new playback time and emit the resulting events.
    ///
    /// Returns the number of events emitted. Non-finite times are ignored.
    pub fn update(
        &mut self,
        markers: &MarkerCollection<V::Marker>,
        time: f64,
        sink: &mut dyn EventSink,
    ) -> usize {
        if !time.is_finite() {
            log::warn!("Ignoring non-finite playback time {}", time);
            return 0;
        }

        // Anything starting after both times is neither active nor crossed.
        let horizon = self.last_time.map_or(time, |last| last.max(time));
        let candidates = &markers.as_slice()[..markers.upper_bound(horizon)];

        let mut emitted = 0;
        let mut active = HashSet::with_capacity(self.active.len());
        for marker in candidates {
            if marker.is_instant() {
                let at = marker.start_time();
                let crossed = match self.previous_time {
                    Some(prev) => prev < at && at <= time,
                    None => at == time,
                };
                if crossed {
                    sink.emit(V::enter_event(marker));
                    sink.emit(V::exit_event(marker));
                    emitted += 2;
                }
                continue;
            }

            let was_active = self.active.contains(marker.id());
            let is_active = marker.contains(time);
            if is_active && !was_active {
                sink.emit(V::enter_event(marker));
                emitted += 1;
            } else if was_active && !is_active {
                sink.emit(V::exit_event(marker));
                emitted += 1;
            }
            if is_active {
                active.insert(marker.id().clone());
            }
        }

        // Actives edited to start past the horizon were not scanned above.
        let mut moved: Vec<&V::Marker> = self
            .active
            .iter()
            .filter(|id| !active.contains(*id))
            .filter_map(|id| markers.get(id))
            .filter(|marker| marker.start_time() > horizon)
            .collect();
        moved.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
        for marker in moved {
            sink.emit(V::exit_event(marker));
            emitted += 1;
        }

        // Rebuilding the set also forgets markers removed from the collection.
        self.active = active;
        self.previous_time = Some(time);
        self.last_time = Some(time);
        emitted
    }

    /// Forget the previous time, after a seek. The next update treats its time
    /// as the first one: points are not crossed by the jump, and segments that are
    /// no longer under the playhead still get their exit.
    pub fn reset(&mut self) {
        self.previous_time = None;
    }

    /// Forget all crossing state without emitting exits.
    pub fn clear(&mut self) {
        self.active.clear();
        self.previous_time = None;
        self.last_time = None;
    }

    pub fn is_active(&self, id: &MarkerId) -> bool {
        self.active.contains(id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn previous_time(&self) -> Option<f64> {
        self.previous_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(events: &[ViewEvent]) -> Vec<String> {
        events
            .iter()
            .map(|e| {
                let id = match e {
                    ViewEvent::PointEnter(p) | ViewEvent::PointExit(p) => p.id.to_string(),
                    ViewEvent::SegmentEnter(s) | ViewEvent::SegmentExit(s) => s.id.to_string(),
                    _ => String::new(),
                };
                format!("{}:{}", e.name(), id)
            })
            .collect()
    }

    fn segments(items: &[(&str, f64, f64)]) -> MarkerCollection<Segment> {
        let mut c = MarkerCollection::new();
        for &(id, start, end) in items {
            c.add(Segment::new(id, start, end)).unwrap();
        }
        c
    }

    fn points(items: &[(&str, f64)]) -> MarkerCollection<Point> {
        let mut c = MarkerCollection::new();
        for &(id, time) in items {
            c.add(Point::new(id, time)).unwrap();
        }
        c
    }

    #[test]
    fn test_segment_enter_and_exit_once() {
        let c = segments(&[("s", 1.0, 3.0)]);
        let mut track = SegmentTrack::new();
        let mut events = Vec::new();
        for t in [0.0, 1.0, 2.0, 4.0] {
            track.update(&c, t, &mut events);
            if t == 1.0 {
                assert_eq!(names(&events), vec!["segments.enter:s"]);
            }
        }
        assert_eq!(names(&events), vec!["segments.enter:s", "segments.exit:s"]);
    }

    #[test]
    fn test_segment_end_is_exclusive() {
        let c = segments(&[("s", 1.0, 3.0)]);
        let mut track = SegmentTrack::new();
        let mut events = Vec::new();
        track.update(&c, 2.0, &mut events);
        track.update(&c, 3.0, &mut events);
        assert_eq!(names(&events), vec!["segments.enter:s", "segments.exit:s"]);
        assert!(!track.is_active(&"s".into()));
    }

    #[test]
    fn test_adjacent_segments_in_marker_order() {
        let c = segments(&[("a", 0.0, 2.0), ("b", 2.0, 4.0), ("c", 1.0, 5.0)]);
        let mut track = SegmentTrack::new();
        let mut events = Vec::new();
        track.update(&c, 1.5, &mut events);
        assert_eq!(names(&events), vec!["segments.enter:a", "segments.enter:c"]);
        events.clear();
        track.update(&c, 2.5, &mut events);
        assert_eq!(names(&events), vec!["segments.exit:a", "segments.enter:b"]);
        assert_eq!(track.active_count(), 2);
    }

    #[test]
    fn test_jump_over_segment_emits_nothing() {
        let c = segments(&[("s", 1.0, 2.0)]);
        let mut track = SegmentTrack::new();
        let mut events = Vec::new();
        track.update(&c, 0.5, &mut events);
        track.update(&c, 3.0, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_backward_seek_exits_segment() {
        let c = segments(&[("s", 5.0, 8.0)]);
        let mut track = SegmentTrack::new();
        let mut events = Vec::new();
        track.update(&c, 6.0, &mut events);
        track.update(&c, 1.0, &mut events);
        assert_eq!(names(&events), vec!["segments.enter:s", "segments.exit:s"]);
    }

    #[test]
    fn test_point_crossing_forward() {
        let c = points(&[("p1", 1.0), ("p2", 2.0), ("p3", 5.0)]);
        let mut track = PointTrack::new();
        let mut events = Vec::new();
        track.update(&c, 0.5, &mut events);
        assert!(events.is_empty());
        assert_eq!(track.update(&c, 2.0, &mut events), 4);
        assert_eq!(
            names(&events),
            vec!["points.enter:p1", "points.exit:p1", "points.enter:p2", "points.exit:p2"]
        );
        events.clear();
        // p2 sits exactly on the previous time and is not crossed again
        track.update(&c, 4.0, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_point_on_first_update() {
        let c = points(&[("p", 3.0)]);
        let mut track = PointTrack::new();
        let mut events = Vec::new();
        track.update(&c, 3.0, &mut events);
        assert_eq!(names(&events), vec!["points.enter:p", "points.exit:p"]);
    }

    #[test]
    fn test_point_backward_seek_is_silent() {
        let c = points(&[("p", 3.0)]);
        let mut track = PointTrack::new();
        let mut events = Vec::new();
        track.update(&c, 4.0, &mut events);
        track.update(&c, 1.0, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_reset_after_seek() {
        let c = segments(&[("s", 1.0, 3.0)]);
        let p = points(&[("p", 4.0)]);
        let mut track = SegmentTrack::new();
        let mut point_track = PointTrack::new();
        let mut events = Vec::new();
        track.update(&c, 2.0, &mut events);
        point_track.update(&p, 2.0, &mut events);
        track.reset();
        point_track.reset();
        assert_eq!(track.previous_time(), None);
        // seek from 2.0 to 6.0 jumps over the point without crossing it
        track.update(&c, 6.0, &mut events);
        point_track.update(&p, 6.0, &mut events);
        assert_eq!(names(&events), vec!["segments.enter:s", "segments.exit:s"]);
    }

    #[test]
    fn test_reset_then_backward_seek_exits() {
        let c = segments(&[("s", 5.0, 8.0)]);
        let mut track = SegmentTrack::new();
        let mut events = Vec::new();
        track.update(&c, 6.0, &mut events);
        track.reset();
        track.update(&c, 1.0, &mut events);
        assert_eq!(names(&events), vec!["segments.enter:s", "segments.exit:s"]);
    }

    #[test]
    fn test_clear_forgets_actives() {
        let c = segments(&[("s", 1.0, 3.0)]);
        let mut track = SegmentTrack::new();
        let mut events = Vec::new();
        track.update(&c, 2.0, &mut events);
        track.clear();
        track.update(&c, 2.5, &mut events);
        assert_eq!(names(&events), vec!["segments.enter:s", "segments.enter:s"]);
    }

    #[test]
    fn test_removed_marker_dropped_silently() {
        let mut c = segments(&[("s", 1.0, 3.0)]);
        let mut track = SegmentTrack::new();
        let mut events = Vec::new();
        track.update(&c, 2.0, &mut events);
        c.remove(&"s".into()).unwrap();
        track.update(&c, 2.5, &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(track.active_count(), 0);
    }

    #[test]
    fn test_segment_moved_later_still_exits() {
        let mut c = segments(&[("s", 1.0, 3.0)]);
        let mut track = SegmentTrack::new();
        let mut events = Vec::new();
        track.update(&c, 2.0, &mut events);
        c.update(&"s".into(), |s| {
            s.start_time = 5.0;
            s.end_time = 8.0;
        })
        .unwrap();
        track.update(&c, 2.5, &mut events);
        assert_eq!(names(&events), vec!["segments.enter:s", "segments.exit:s"]);
        assert_eq!(track.active_count(), 0);

        track.update(&c, 6.0, &mut events);
        assert_eq!(
            names(&events),
            vec!["segments.enter:s", "segments.exit:s", "segments.enter:s"]
        );
    }

    #[test]
    fn test_non_finite_time_ignored() {
        let c = segments(&[("s", 0.0, 3.0)]);
        let mut track = SegmentTrack::new();
        let mut events = Vec::new();
        assert_eq!(track.update(&c, f64::NAN, &mut events), 0);
        assert_eq!(track.previous_time(), None);
    }

    #[test]
    fn test_variant_selects_collection() {
        let mut markers = Markers::new();
        markers.add_point(Point::new("p", 1.0)).unwrap();
        markers.add_segment(Segment::new("s", 0.0, 2.0)).unwrap();
        let mut events = Vec::new();
        let mut points = PointTrack::new();
        let mut segs = SegmentTrack::new();
        points.update(PointEvents::collection(&markers), 0.0, &mut events);
        segs.update(SegmentEvents::collection(&markers), 0.0, &mut events);
        points.update(PointEvents::collection(&markers), 1.0, &mut events);
        assert_eq!(
            names(&events),
            vec!["segments.enter:s", "points.enter:p", "points.exit:p"]
        );
    }
}
