//! Pure point-list edits.
//!
//! Every edit reads the points sorted by frame (first point of a frame wins)
//! and returns the new list, or `None` when nothing changed.

use log::debug;
use serde_json::{Map, Value};

use crate::animation::{BezierHandles, Interpolation};
use crate::editor::defaults::default_value_for;
use crate::error::LibraryError;
use crate::model::color::{ColorChannel, Rgba};
use crate::model::keyframe::{Keyframe, normalize_points};
use crate::model::point::{Coordinate, Point};

#[derive(Debug, Clone, PartialEq)]
pub enum EditIntent {
    /// Update or insert the point at the frame. `None` removes it.
    SetValue(Option<f64>),
    /// Remove the point at the frame.
    ClearValue,
    /// Reshape the segment that ends at the closest point.
    SetInterpolation {
        mode: Interpolation,
        handles: Option<BezierHandles>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorIntent {
    SetColor(Rgba),
    Clear,
    SetInterpolation {
        mode: Interpolation,
        handles: Option<BezierHandles>,
    },
}

pub fn apply_edit(
    points: &[Point],
    frame: i64,
    intent: &EditIntent,
    default_value: f64,
) -> Option<Vec<Point>> {
    let mut points = normalize_points(points);
    match intent {
        EditIntent::SetValue(Some(value)) => {
            match points.iter_mut().find(|p| p.frame() == frame) {
                Some(point) => {
                    if point.value() == *value {
                        return None;
                    }
                    debug!("updating point: co.X = {} to value: {:.3}", frame, value);
                    point.set_value(*value);
                }
                None => {
                    debug!("Created new point at X={}", frame);
                    let index = points.partition_point(|p| p.frame() < frame);
                    points.insert(index, Point::linear(frame, *value));
                }
            }
            Some(points)
        }
        EditIntent::SetValue(None) | EditIntent::ClearValue => {
            let index = points.iter().position(|p| p.frame() == frame)?;
            debug!("Found point to delete at X={}", frame);
            points.remove(index);
            if points.is_empty() {
                points.push(Point::linear(frame, default_value));
            }
            Some(points)
        }
        EditIntent::SetInterpolation { mode, handles } => {
            let closest = Keyframe::closest_index(&points, frame)?;
            let bezier = match (mode, handles) {
                (Interpolation::Bezier, Some(handles)) => Some(*handles),
                _ => None,
            };

            if closest > 0 {
                let previous = &mut points[closest - 1];
                previous.handle_right = bezier.map(|h| Coordinate::from(h.right));
                debug!("updating previous point (right handle): co.X = {}", previous.frame());
            }
            let point = &mut points[closest];
            point.interpolation = *mode;
            point.handle_left = bezier.map(|h| Coordinate::from(h.left));
            debug!(
                "updating interpolation mode point: co.X = {} to {}",
                point.frame(),
                mode
            );
            Some(points)
        }
    }
}

/// Moves the point at `from` to `to`, replacing any point already there.
pub fn move_point(points: &[Point], from: i64, to: i64) -> Option<Vec<Point>> {
    if from == to {
        return None;
    }
    let mut points = normalize_points(points);
    let index = points.iter().position(|p| p.frame() == from)?;
    let mut moved = points.remove(index);
    moved.set_frame(to);
    points.retain(|p| p.frame() != to);
    let insert_at = points.partition_point(|p| p.frame() < to);
    points.insert(insert_at, moved);
    Some(points)
}

/// Removes the point at `frame`, or the one at `fallback_frame` when `frame`
/// has none. An emptied list gets a default point at `frame`.
pub fn remove_point(
    points: &[Point],
    frame: i64,
    fallback_frame: i64,
    default_value: f64,
) -> Option<Vec<Point>> {
    let mut points = normalize_points(points);
    let index = points
        .iter()
        .position(|p| p.frame() == frame)
        .or_else(|| points.iter().position(|p| p.frame() == fallback_frame))?;
    let removed = points.remove(index);
    debug!("Found point to delete at X={}", removed.frame());
    if points.is_empty() {
        points.push(Point::linear(frame, default_value));
    }
    Some(points)
}

/// Removes a point of a curve stored as a document value.
pub fn remove_curve_point(
    curve: &mut Value,
    frame: i64,
    fallback_frame: i64,
    default_value: f64,
) -> Result<bool, LibraryError> {
    let keyframe = Keyframe::from_value(curve)?;
    let Some(points) = remove_point(&keyframe.points, frame, fallback_frame, default_value) else {
        return Ok(false);
    };
    write_curve(curve, points)?;
    Ok(true)
}

/// Applies `intent` to a curve stored as a document value.
/// Returns whether the curve changed.
pub fn edit_curve(
    curve: &mut Value,
    frame: i64,
    intent: &EditIntent,
    default_value: f64,
) -> Result<bool, LibraryError> {
    let keyframe = Keyframe::from_value(curve)?;
    let Some(points) = apply_edit(&keyframe.points, frame, intent, default_value) else {
        return Ok(false);
    };
    write_curve(curve, points)?;
    Ok(true)
}

/// Moves a point of a curve stored as a document value.
pub fn move_curve_point(curve: &mut Value, from: i64, to: i64) -> Result<bool, LibraryError> {
    let keyframe = Keyframe::from_value(curve)?;
    let Some(points) = move_point(&keyframe.points, from, to) else {
        return Ok(false);
    };
    write_curve(curve, points)?;
    Ok(true)
}

fn write_curve(curve: &mut Value, points: Vec<Point>) -> Result<(), LibraryError> {
    let target = curve.as_object_mut().ok_or_else(|| {
        LibraryError::InvalidArgument("keyframe curve is not an object".to_string())
    })?;
    Keyframe::new(points).write_into(target)
}

/// Applies a color edit to the channel curves of a color property.
/// Each channel is edited on its own, so one may insert while another updates.
pub fn edit_color(
    color: &mut Map<String, Value>,
    property_key: &str,
    frame: i64,
    intent: &ColorIntent,
) -> Result<bool, LibraryError> {
    let mut changed = false;
    match intent {
        ColorIntent::SetColor(rgba) => {
            for channel in ColorChannel::EDIT_ORDER {
                let curve = color
                    .entry(channel.key())
                    .or_insert_with(|| serde_json::json!({ "Points": [] }));
                let value = rgba.channel(channel) as f64;
                changed |= edit_curve(
                    curve,
                    frame,
                    &EditIntent::SetValue(Some(value)),
                    default_value_for(property_key, Some(channel)),
                )?;
            }
        }
        ColorIntent::Clear => {
            for channel in ColorChannel::CLEAR_ORDER {
                if let Some(curve) = color.get_mut(channel.key()) {
                    changed |= edit_curve(
                        curve,
                        frame,
                        &EditIntent::ClearValue,
                        default_value_for(property_key, Some(channel)),
                    )?;
                }
            }
        }
        ColorIntent::SetInterpolation { mode, handles } => {
            let intent = EditIntent::SetInterpolation {
                mode: *mode,
                handles: *handles,
            };
            for channel in ColorChannel::EDIT_ORDER {
                if let Some(curve) = color.get_mut(channel.key()) {
                    changed |= edit_curve(curve, frame, &intent, 0.0)?;
                }
            }
        }
    }
    Ok(changed)
}
