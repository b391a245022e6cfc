//! Marker collection manager: owns marker lifecycle and keeps markers sorted.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::types::{MarkerId, Point, Segment, TimedMarker};
use crate::error::{PeaklineError, Result};

/// Markers of one kind, kept in ascending start-time order.
///
/// Markers with equal start times keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerCollection<M> {
    items: Vec<M>,
}

impl<M> Default for MarkerCollection<M> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<M: TimedMarker> MarkerCollection<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a marker at its sorted position.
    pub fn add(&mut self, marker: M) -> Result<&M> {
        marker.validate()?;
        if self.get(marker.id()).is_some() {
            return Err(PeaklineError::DuplicateMarker(marker.id().to_string()));
        }
        let index = self.upper_bound(marker.start_time());
        self.items.insert(index, marker);
        Ok(&self.items[index])
    }

    pub fn remove(&mut self, id: &MarkerId) -> Result<M> {
        let index = self
            .position(id)
            .ok_or_else(|| PeaklineError::MarkerNotFound(id.to_string()))?;
        Ok(self.items.remove(index))
    }

    /// Edit a marker in place. The edit is validated before it is applied and the
    /// marker is re-sorted afterwards; the id cannot change.
    pub fn update(&mut self, id: &MarkerId, edit: impl FnOnce(&mut M)) -> Result<()>
    where
        M: Clone,
    {
        let index = self
            .position(id)
            .ok_or_else(|| PeaklineError::MarkerNotFound(id.to_string()))?;
        let mut edited = self.items[index].clone();
        edit(&mut edited);
        edited.validate()?;
        if edited.id() != id {
            return Err(PeaklineError::InvalidMarker {
                id: id.to_string(),
                reason: "marker id cannot be changed".into(),
            });
        }
        self.items.remove(index);
        let index = self.upper_bound(edited.start_time());
        self.items.insert(index, edited);
        Ok(())
    }

    pub fn get(&self, id: &MarkerId) -> Option<&M> {
        self.items.iter().find(|m| m.id() == id)
    }

    fn position(&self, id: &MarkerId) -> Option<usize> {
        self.items.iter().position(|m| m.id() == id)
    }

    /// Markers in ascending start-time order.
    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[M] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of markers starting at or before `time`.
    pub fn upper_bound(&self, time: f64) -> usize {
        self.items.partition_point(|m| m.start_time() <= time)
    }

    /// Markers with any part inside `[start, end]`, in order.
    pub fn in_range(&self, start: f64, end: f64) -> impl Iterator<Item = &M> {
        self.items[..self.upper_bound(end)]
            .iter()
            .filter(move |m| m.overlaps(start, end))
    }
}

impl<'a, M> IntoIterator for &'a MarkerCollection<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Marker file layout: `{ "points": [...], "segments": [...] }`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MarkerFile {
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// All points and segments of one waveform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Markers {
    points: MarkerCollection<Point>,
    segments: MarkerCollection<Segment>,
}

impl Markers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed marker file. Invalid or duplicate markers are skipped
    /// with a warning.
    pub fn from_file(file: MarkerFile) -> Self {
        let mut markers = Self::new();
        for point in file.points {
            if let Err(e) = markers.add_point(point) {
                log::warn!("Skipping point: {}", e);
            }
        }
        for segment in file.segments {
            if let Err(e) = markers.add_segment(segment) {
                log::warn!("Skipping segment: {}", e);
            }
        }
        markers
    }

    /// Load a marker JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read marker file: {}", path.display()))?;
        let file: MarkerFile = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse marker file: {}", path.display()))?;
        let markers = Self::from_file(file);
        log::info!(
            "Loaded {} points and {} segments from {}",
            markers.points.len(),
            markers.segments.len(),
            path.display()
        );
        Ok(markers)
    }

    /// Snapshot in file layout, for saving.
    pub fn to_file(&self) -> MarkerFile {
        MarkerFile {
            points: self.points.iter().cloned().collect(),
            segments: self.segments.iter().cloned().collect(),
        }
    }

    pub fn add_point(&mut self, point: Point) -> Result<&Point> {
        self.points.add(point)
    }

    pub fn add_segment(&mut self, segment: Segment) -> Result<&Segment> {
        self.segments.add(segment)
    }

    pub fn remove_point(&mut self, id: &MarkerId) -> Result<Point> {
        self.points.remove(id)
    }

    pub fn remove_segment(&mut self, id: &MarkerId) -> Result<Segment> {
        self.segments.remove(id)
    }

    pub fn update_point(&mut self, id: &MarkerId, edit: impl FnOnce(&mut Point)) -> Result<()> {
        self.points.update(id, edit)
    }

    pub fn update_segment(&mut self, id: &MarkerId, edit: impl FnOnce(&mut Segment)) -> Result<()> {
        self.segments.update(id, edit)
    }

    pub fn get_point(&self, id: &MarkerId) -> Option<&Point> {
        self.points.get(id)
    }

    pub fn get_segment(&self, id: &MarkerId) -> Option<&Segment> {
        self.segments.get(id)
    }

    pub fn points(&self) -> &MarkerCollection<Point> {
        &self.points
    }

    pub fn segments(&self) -> &MarkerCollection<Segment> {
        &self.segments
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.segments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ids<M: TimedMarker>(c: &MarkerCollection<M>) -> Vec<String> {
        c.iter().map(|m| m.id().to_string()).collect()
    }

    #[test]
    fn test_add_keeps_sorted_order() {
        let mut c = MarkerCollection::new();
        c.add(Segment::new("c", 5.0, 6.0)).unwrap();
        c.add(Segment::new("a", 1.0, 2.0)).unwrap();
        c.add(Segment::new("b", 3.0, 9.0)).unwrap();
        c.add(Segment::new("a2", 1.0, 1.5)).unwrap();
        assert_eq!(ids(&c), vec!["a", "a2", "b", "c"]);
    }

    #[test]
    fn test_add_rejects_duplicates_and_invalid() {
        let mut c = MarkerCollection::new();
        c.add(Point::new("p", 1.0)).unwrap();
        assert_eq!(
            c.add(Point::new("p", 2.0)).unwrap_err(),
            PeaklineError::DuplicateMarker("p".into())
        );
        assert!(c.add(Point::new("q", -1.0)).is_err());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut c = MarkerCollection::new();
        c.add(Point::new("p", 1.0)).unwrap();
        let removed = c.remove(&"p".into()).unwrap();
        assert_eq!(removed.time, 1.0);
        assert!(c.is_empty());
        assert_eq!(
            c.remove(&"p".into()).unwrap_err(),
            PeaklineError::MarkerNotFound("p".into())
        );
    }

    #[test]
    fn test_update_resorts_and_validates() {
        let mut c = MarkerCollection::new();
        c.add(Segment::new("a", 1.0, 2.0)).unwrap();
        c.add(Segment::new("b", 3.0, 4.0)).unwrap();
        c.update(&"a".into(), |s| {
            s.start_time = 5.0;
            s.end_time = 7.0;
        })
        .unwrap();
        assert_eq!(ids(&c), vec!["b", "a"]);

        let err = c.update(&"b".into(), |s| s.end_time = 0.5).unwrap_err();
        assert!(matches!(err, PeaklineError::InvalidMarker { .. }));
        assert_eq!(c.get(&"b".into()).unwrap().end_time, 4.0);

        assert!(c.update(&"b".into(), |s| s.id = "z".into()).is_err());
        assert!(c.get(&"b".into()).is_some());
    }

    #[test]
    fn test_in_range() {
        let mut c = MarkerCollection::new();
        c.add(Segment::new("a", 0.0, 2.0)).unwrap();
        c.add(Segment::new("b", 3.0, 10.0)).unwrap();
        c.add(Segment::new("c", 12.0, 13.0)).unwrap();
        let hits: Vec<_> = c.in_range(4.0, 11.0).map(|s| s.id.to_string()).collect();
        assert_eq!(hits, vec!["b"]);
        let hits: Vec<_> = c.in_range(1.0, 12.0).map(|s| s.id.to_string()).collect();
        assert_eq!(hits, vec!["a", "b", "c"]);
        assert_eq!(c.upper_bound(3.0), 2);
    }

    #[test]
    fn test_markers_lookup() {
        let mut m = Markers::new();
        m.add_point(Point::new("p1", 1.0)).unwrap();
        m.add_segment(Segment::new("s1", 1.0, 2.0)).unwrap();
        assert!(m.get_point(&"p1".into()).is_some());
        assert!(m.get_segment(&"p1".into()).is_none());
        assert!(m.get_segment(&"s1".into()).is_some());
        m.clear();
        assert!(m.points().is_empty() && m.segments().is_empty());
    }

    #[test]
    fn test_from_file_skips_invalid() {
        let file = MarkerFile {
            points: vec![Point::new("p1", 1.0), Point::new("p1", 2.0)],
            segments: vec![Segment::new("s1", 4.0, 2.0), Segment::new("s2", 0.0, 1.0)],
        };
        let m = Markers::from_file(file);
        assert_eq!(m.points().len(), 1);
        assert_eq!(m.segments().len(), 1);
        assert!(m.get_segment(&"s2".into()).is_some());
    }

    #[test]
    fn test_load_marker_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"points":[{{"id":"cue","time":2.0}}],"segments":[{{"start_time":1.0,"end_time":3.0}}]}}"#
        )
        .unwrap();
        let m = Markers::load(file.path()).unwrap();
        assert_eq!(m.points().len(), 1);
        assert_eq!(m.segments().len(), 1);

        let round = m.to_file();
        assert_eq!(round.points[0].id, MarkerId::from("cue"));
    }
}
