use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::animation::Interpolation;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Coordinate {
    #[serde(rename = "X")]
    pub x: OrderedFloat<f64>,
    #[serde(rename = "Y")]
    pub y: OrderedFloat<f64>,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
        }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.x.into_inner(), self.y.into_inner())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Coordinate::new(x, y)
    }
}

/// One animation point of a keyframe curve.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Point {
    pub co: Coordinate,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_left: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_right: Option<Coordinate>,
    /// Fields this crate does not interpret (e.g. `handle_type`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Point {
    pub fn new(frame: i64, value: f64, interpolation: Interpolation) -> Self {
        Self {
            co: Coordinate::new(frame as f64, value),
            interpolation,
            handle_left: None,
            handle_right: None,
            extra: Map::new(),
        }
    }

    pub fn linear(frame: i64, value: f64) -> Self {
        Self::new(frame, value, Interpolation::Linear)
    }

    pub fn frame(&self) -> i64 {
        self.co.x.into_inner().round() as i64
    }

    pub fn value(&self) -> f64 {
        self.co.y.into_inner()
    }

    pub fn set_frame(&mut self, frame: i64) {
        self.co.x = OrderedFloat(frame as f64);
    }

    pub fn set_value(&mut self, value: f64) {
        self.co.y = OrderedFloat(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_point_fields_survive_a_round_trip() {
        let raw = json!({
            "co": {"X": 12.0, "Y": 0.5},
            "interpolation": 0,
            "handle_left": {"X": 0.5, "Y": 1.0},
            "handle_type": 0
        });
        let point: Point = serde_json::from_value(raw).unwrap();
        assert_eq!(point.frame(), 12);
        assert_eq!(point.interpolation, Interpolation::Bezier);
        assert!(point.handle_right.is_none());

        let back = serde_json::to_value(&point).unwrap();
        assert_eq!(back["handle_type"], json!(0));
        assert!(back.get("handle_right").is_none());
    }

    #[test]
    fn missing_interpolation_defaults_to_bezier() {
        let point: Point = serde_json::from_value(json!({"co": {"X": 1, "Y": 2}})).unwrap();
        assert_eq!(point.interpolation, Interpolation::Bezier);
        assert_eq!(point.value(), 2.0);
    }
}
