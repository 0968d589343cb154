use serde::{Deserialize, Serialize};
use std::fmt;

/// How the curve segment ending at a point is shaped.
///
/// The point on the right side of a segment owns its interpolation tag.
/// Serialized as the integer codes used by project files.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "i64", into = "i64")]
pub enum Interpolation {
    #[default]
    Bezier,
    Linear,
    Constant,
}

impl Interpolation {
    pub fn code(&self) -> i64 {
        match self {
            Interpolation::Bezier => 0,
            Interpolation::Linear => 1,
            Interpolation::Constant => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Interpolation::Bezier),
            1 => Some(Interpolation::Linear),
            2 => Some(Interpolation::Constant),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Interpolation::Bezier => "bezier",
            Interpolation::Linear => "linear",
            Interpolation::Constant => "constant",
        }
    }
}

impl From<Interpolation> for i64 {
    fn from(value: Interpolation) -> Self {
        value.code()
    }
}

impl TryFrom<i64> for Interpolation {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Interpolation::from_code(value).ok_or_else(|| format!("unknown interpolation {}", value))
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle positions of a Bezier preset: the previous point's right handle
/// followed by the closest point's left handle, both normalized to the
/// segment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BezierHandles {
    pub right: (f64, f64),
    pub left: (f64, f64),
}

impl BezierHandles {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            right: (x1, y1),
            left: (x2, y2),
        }
    }

    pub const EASE: BezierHandles = BezierHandles {
        right: (0.25, 0.1),
        left: (0.25, 1.0),
    };
    pub const EASE_IN: BezierHandles = BezierHandles {
        right: (0.42, 0.0),
        left: (1.0, 1.0),
    };
    pub const EASE_OUT: BezierHandles = BezierHandles {
        right: (0.0, 0.0),
        left: (0.58, 1.0),
    };
    pub const EASE_IN_OUT: BezierHandles = BezierHandles {
        right: (0.42, 0.0),
        left: (0.58, 1.0),
    };
}

/// Progress (0..1) through a segment for the given interpolation.
///
/// `right` is the handle leaving the left point and `left` the handle
/// entering the right point. Missing handles use the project defaults.
pub fn segment_progress(
    interpolation: Interpolation,
    t: f64,
    right: Option<(f64, f64)>,
    left: Option<(f64, f64)>,
) -> f64 {
    match interpolation {
        Interpolation::Constant => {
            if t >= 1.0 {
                1.0
            } else {
                0.0
            }
        }
        Interpolation::Linear => t,
        Interpolation::Bezier => {
            let start = right.unwrap_or((0.5, 0.0));
            let end = left.unwrap_or((0.5, 1.0));
            cubic_bezier(start, end, t)
        }
    }
}

/// Evaluates a unit cubic Bezier (anchored at (0,0) and (1,1)) at horizontal
/// position `x`. Newton iterations find the curve parameter first.
fn cubic_bezier(start: (f64, f64), end: (f64, f64), x: f64) -> f64 {
    let max_iterations = 16;
    let epsilon = 1e-6;
    let x = x.clamp(0.0, 1.0);
    let mut current_t = x;

    for _ in 0..max_iterations {
        let bx = bezier_axis(start.0, end.0, current_t);
        let error = bx - x;
        if error.abs() < epsilon {
            break;
        }

        let dx_dt = bezier_axis_derivative(start.0, end.0, current_t);
        if dx_dt.abs() < epsilon {
            break;
        }

        current_t = (current_t - error / dx_dt).clamp(0.0, 1.0);
    }

    bezier_axis(start.1, end.1, current_t)
}

fn bezier_axis(p1: f64, p2: f64, t: f64) -> f64 {
    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * t * p1 + 3.0 * one_minus_t * t * t * p2 + t * t * t
}

fn bezier_axis_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * p1 + 6.0 * one_minus_t * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_codes_round_trip_through_serde() {
        let json = serde_json::to_string(&Interpolation::Constant).unwrap();
        assert_eq!(json, "2");
        let parsed: Interpolation = serde_json::from_str("0").unwrap();
        assert_eq!(parsed, Interpolation::Bezier);
        assert!(serde_json::from_str::<Interpolation>("7").is_err());
    }

    #[test]
    fn bezier_with_linear_handles_is_linear() {
        let handles = Some((1.0 / 3.0, 1.0 / 3.0));
        let left = Some((2.0 / 3.0, 2.0 / 3.0));
        let p = segment_progress(Interpolation::Bezier, 0.25, handles, left);
        assert!((p - 0.25).abs() < 1e-4);
    }

    #[test]
    fn constant_holds_until_segment_end() {
        assert_eq!(segment_progress(Interpolation::Constant, 0.99, None, None), 0.0);
        assert_eq!(segment_progress(Interpolation::Constant, 1.0, None, None), 1.0);
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        let h = BezierHandles::EASE_IN_OUT;
        let a = segment_progress(Interpolation::Bezier, 0.3, Some(h.right), Some(h.left));
        let b = segment_progress(Interpolation::Bezier, 0.7, Some(h.right), Some(h.left));
        assert!((a + b - 1.0).abs() < 1e-4);
    }
}
