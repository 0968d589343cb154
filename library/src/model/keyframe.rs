use serde_json::{Map, Value};

use crate::animation::segment_progress;
use crate::error::LibraryError;
use crate::model::point::Point;

pub const POINTS_KEY: &str = "Points";

/// A curve of animation points as stored under `"Points"` in a document.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Keyframe {
    pub points: Vec<Point>,
}

/// Returns true when a document value is a keyframe curve.
pub fn is_keyframe_value(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.get(POINTS_KEY).is_some_and(Value::is_array))
}

/// Sorts points by frame and keeps the first point of each frame.
pub fn normalize_points(points: &[Point]) -> Vec<Point> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(Point::frame);
    sorted.dedup_by_key(|p| p.frame());
    sorted
}

impl Keyframe {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn constant(frame: i64, value: f64) -> Self {
        Self::new(vec![Point::linear(frame, value)])
    }

    /// Reads the curve from a document value (`{"Points": [...]}`).
    /// A missing `Points` array is an empty curve.
    pub fn from_value(value: &Value) -> Result<Self, LibraryError> {
        let points = match value.get(POINTS_KEY) {
            Some(points) => serde_json::from_value(points.clone())?,
            None => Vec::new(),
        };
        Ok(Self { points })
    }

    /// Writes the points into `target`, keeping any other fields it has.
    pub fn write_into(&self, target: &mut Map<String, Value>) -> Result<(), LibraryError> {
        target.insert(POINTS_KEY.to_string(), serde_json::to_value(&self.points)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn sorted_points(&self) -> Vec<Point> {
        normalize_points(&self.points)
    }

    pub fn contains_frame(&self, frame: i64) -> bool {
        self.points.iter().any(|p| p.frame() == frame)
    }

    /// Index (into the sorted points) of the first point at or after `frame`,
    /// falling back to the last point.
    pub fn closest_index(points: &[Point], frame: i64) -> Option<usize> {
        if points.is_empty() {
            return None;
        }
        Some(
            points
                .iter()
                .position(|p| p.frame() >= frame)
                .unwrap_or(points.len() - 1),
        )
    }

    /// Frames of the closest point and the one before it, `-1` when absent.
    pub fn anchor_frames(&self, frame: i64) -> (i64, i64) {
        let points = self.sorted_points();
        match Keyframe::closest_index(&points, frame) {
            Some(closest) => {
                let previous = closest.saturating_sub(1);
                (points[closest].frame(), points[previous].frame())
            }
            None => (-1, -1),
        }
    }

    /// Value of the curve at `frame`. An empty curve evaluates to 0.
    pub fn value_at(&self, frame: i64) -> f64 {
        let points = self.sorted_points();
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if frame <= first.frame() {
            return first.value();
        }
        if frame >= last.frame() {
            return last.value();
        }

        for pair in points.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            if frame >= left.frame() && frame <= right.frame() {
                let span = (right.frame() - left.frame()) as f64;
                let t = (frame - left.frame()) as f64 / span;
                let progress = segment_progress(
                    right.interpolation,
                    t,
                    left.handle_right.map(|h| h.as_tuple()),
                    right.handle_left.map(|h| h.as_tuple()),
                );
                return left.value() + (right.value() - left.value()) * progress;
            }
        }
        last.value()
    }

    /// Interpolation of the point that shapes the curve at `frame`.
    pub fn interpolation_at(&self, frame: i64) -> Option<crate::animation::Interpolation> {
        let points = self.sorted_points();
        Keyframe::closest_index(&points, frame).map(|i| points[i].interpolation)
    }
}
