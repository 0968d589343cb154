use log::{debug, warn};
use serde_json::{Map, Value, json};
use std::sync::{Arc, RwLock};

use crate::animation::{BezierHandles, Interpolation};
use crate::editor::defaults::{ScaleLimits, default_value_for, is_svg_path};
use crate::editor::keyframe_editor::{
    ColorIntent, EditIntent, edit_color, edit_curve, move_curve_point, remove_curve_point,
};
use crate::error::LibraryError;
use crate::model::color::ColorChannel;
use crate::model::keyframe::is_keyframe_value;
use crate::model::object::ObjectRef;
use crate::model::property::{OBJECTS_KEY, PropertyType};
use crate::projection::TypedValue;
use crate::service::dispatcher::PendingChange;
use crate::service::engine::ProjectEngine;
use crate::service::handlers::read_project;

/// Float keys holding timeline seconds, kept on the frame grid.
const TIME_KEYS: [&str; 3] = ["position", "start", "end"];

/// The property an edit applies to on one selected object.
#[derive(Debug, Clone, Copy)]
pub struct PropertyTarget<'a> {
    pub object: &'a ObjectRef,
    pub key: &'a str,
    pub property_type: PropertyType,
    /// Tracked object whose overlay holds the property.
    pub overlay_id: Option<&'a str>,
}

impl PropertyTarget<'_> {
    fn log_id(&self) -> String {
        match self.overlay_id {
            Some(overlay_id) => format!("{}/{}", self.object.id, overlay_id),
            None => self.object.id.clone(),
        }
    }
}

/// The part of a document an edit works on: the document itself, or one
/// overlay taken out of its `objects` map.
struct EditScope {
    data: Map<String, Value>,
    overlay: Option<(String, Map<String, Value>)>,
}

impl EditScope {
    fn open(target: &PropertyTarget, document: &Map<String, Value>) -> Result<Self, LibraryError> {
        let Some(overlay_id) = target.overlay_id else {
            return Ok(Self {
                data: document.clone(),
                overlay: None,
            });
        };
        let mut objects = document
            .get(OBJECTS_KEY)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        match objects.remove(overlay_id) {
            Some(Value::Object(data)) if !data.is_empty() => Ok(Self {
                data,
                overlay: Some((overlay_id.to_string(), objects)),
            }),
            _ => Err(LibraryError::MissingOverlayData {
                object: target.object.clone(),
                overlay_id: overlay_id.to_string(),
            }),
        }
    }

    /// Minimal subtree to persist: the edited key, or the whole `objects`
    /// map when an overlay was edited.
    fn into_change(self, target: &PropertyTarget) -> PendingChange {
        let mut partial = Map::new();
        match self.overlay {
            None => {
                let value = self.data.get(target.key).cloned().unwrap_or(Value::Null);
                partial.insert(target.key.to_string(), value);
            }
            Some((overlay_id, mut objects)) => {
                objects.insert(overlay_id, Value::Object(self.data));
                partial.insert(OBJECTS_KEY.to_string(), Value::Object(objects));
            }
        }
        PendingChange::new(target.object.clone(), Some(target.key.to_string()), partial)
    }
}

fn text_of(value: &TypedValue) -> String {
    match value {
        TypedValue::Text(s) => s.clone(),
        TypedValue::Int(i) => i.to_string(),
        TypedValue::Float(f) => f.to_string(),
        TypedValue::Bool(b) => b.to_string(),
    }
}

fn move_in_value(value: &mut Value, from: i64, to: i64) -> Result<bool, LibraryError> {
    if is_keyframe_value(value) {
        return move_curve_point(value, from, to);
    }
    let Some(color) = value.as_object_mut() else {
        return Ok(false);
    };
    let mut moved = false;
    for channel in ColorChannel::EDIT_ORDER {
        if let Some(curve) = color.get_mut(channel.key()).filter(|c| is_keyframe_value(c)) {
            moved |= move_curve_point(curve, from, to)?;
        }
    }
    Ok(moved)
}

pub struct KeyframeHandler;

impl KeyframeHandler {
    /// Sets, clears or reshapes a property at `frame`.
    ///
    /// Curves get a point-level edit. Other values are replaced according to
    /// the property type. Returns `None` when the document is unchanged.
    pub fn update_value<E: ProjectEngine>(
        project: &Arc<RwLock<E>>,
        target: &PropertyTarget,
        frame: i64,
        value: Option<&TypedValue>,
        interpolation: Option<(Interpolation, Option<BezierHandles>)>,
        limits: &ScaleLimits,
    ) -> Result<Option<PendingChange>, LibraryError> {
        let engine = read_project(project)?;
        let document = target
            .object
            .resolve(&*engine)
            .ok_or_else(|| LibraryError::MissingObject(target.object.clone()))?;
        let mut scope = EditScope::open(target, &document)?;
        let Some(current) = scope.data.get_mut(target.key) else {
            debug!("{} has no property {}", target.log_id(), target.key);
            return Ok(None);
        };
        debug!("{}: update property {}. {}", target.log_id(), target.key, current);

        let updated = if target.property_type != PropertyType::Reader && current.is_object() {
            let intent = match interpolation {
                Some((mode, handles)) => EditIntent::SetInterpolation { mode, handles },
                None => {
                    let is_svg = document
                        .get("reader")
                        .and_then(|reader| reader.get("path"))
                        .and_then(Value::as_str)
                        .is_some_and(is_svg_path);
                    let value = value
                        .and_then(TypedValue::as_f64)
                        .map(|v| limits.clamp(target.key, v, engine.frame_size(), is_svg));
                    EditIntent::SetValue(value)
                }
            };
            edit_curve(current, frame, &intent, default_value_for(target.key, None))?
        } else if interpolation.is_some() {
            debug!("{} is not animated, ignoring interpolation", target.key);
            false
        } else {
            match Self::scalar_value(&*engine, target, value)? {
                Some(new_value) if *current != new_value => {
                    *current = new_value;
                    true
                }
                _ => false,
            }
        };

        if !updated {
            return Ok(None);
        }
        Ok(Some(scope.into_change(target).with_waveform_of(&document)))
    }

    /// New value of a property that has no curve.
    fn scalar_value<E: ProjectEngine + ?Sized>(
        engine: &E,
        target: &PropertyTarget,
        value: Option<&TypedValue>,
    ) -> Result<Option<Value>, LibraryError> {
        let scalar = match (target.property_type, value) {
            (PropertyType::Int, Some(v)) => v.as_f64().map(|v| json!(v.round() as i64)),
            (PropertyType::Float, Some(v)) => v.as_f64().map(|v| {
                if TIME_KEYS.contains(&target.key) {
                    json!(engine.frame_rate().snap(v))
                } else {
                    json!(v)
                }
            }),
            (PropertyType::Bool, Some(TypedValue::Text(s))) => Some(json!(!s.is_empty())),
            (PropertyType::Bool, Some(v)) => v.as_f64().map(|v| json!(v != 0.0)),
            (PropertyType::String, v) => Some(json!(v.map(text_of).unwrap_or_default())),
            (PropertyType::Font | PropertyType::Caption, Some(v)) => Some(json!(text_of(v))),
            (PropertyType::Reader, Some(TypedValue::Text(path))) if !path.is_empty() => {
                Some(engine.open_reader(path)?)
            }
            (PropertyType::Reader, None | Some(TypedValue::Text(_))) => Some(json!({"type": ""})),
            _ => None,
        };
        if scalar.is_none() {
            warn!(
                "Invalid {} value passed to property {}: {:?}",
                target.property_type, target.key, value
            );
        }
        Ok(scalar)
    }

    pub fn update_color<E: ProjectEngine>(
        project: &Arc<RwLock<E>>,
        target: &PropertyTarget,
        frame: i64,
        intent: &ColorIntent,
    ) -> Result<Option<PendingChange>, LibraryError> {
        if target.property_type != PropertyType::Color {
            return Ok(None);
        }
        let engine = read_project(project)?;
        let document = target
            .object
            .resolve(&*engine)
            .ok_or_else(|| LibraryError::MissingObject(target.object.clone()))?;
        drop(engine);

        let mut scope = EditScope::open(target, &document)?;
        let Some(color) = scope.data.get_mut(target.key).and_then(Value::as_object_mut) else {
            debug!("{} has no color {}", target.log_id(), target.key);
            return Ok(None);
        };
        if !edit_color(color, target.key, frame, intent)? {
            return Ok(None);
        }
        Ok(Some(scope.into_change(target)))
    }

    /// Removes the point at `frame`, or the closest point when `frame` has
    /// none. Color properties lose the point on their red, blue and green
    /// channels.
    pub fn remove_keyframe<E: ProjectEngine>(
        project: &Arc<RwLock<E>>,
        target: &PropertyTarget,
        frame: i64,
        closest_point_x: i64,
    ) -> Result<Option<PendingChange>, LibraryError> {
        let engine = read_project(project)?;
        let document = target
            .object
            .resolve(&*engine)
            .ok_or_else(|| LibraryError::MissingObject(target.object.clone()))?;
        drop(engine);

        let mut scope = EditScope::open(target, &document)?;
        let Some(value) = scope.data.get_mut(target.key) else {
            return Ok(None);
        };
        debug!("{}: remove {} keyframe. {}", target.log_id(), target.key, value);

        let removed = if target.property_type == PropertyType::Color {
            let mut removed = false;
            if let Some(color) = value.as_object_mut() {
                for channel in ColorChannel::CLEAR_ORDER {
                    if let Some(curve) = color.get_mut(channel.key()) {
                        let default = default_value_for(target.key, Some(channel));
                        removed |= remove_curve_point(curve, frame, closest_point_x, default)?;
                    }
                }
            }
            removed
        } else if is_keyframe_value(value) {
            let default = default_value_for(target.key, None);
            remove_curve_point(value, frame, closest_point_x, default)?
        } else {
            false
        };

        if !removed {
            return Ok(None);
        }
        Ok(Some(scope.into_change(target).with_waveform_of(&document)))
    }

    /// Moves every point at `from` to `to` across all curves of an object,
    /// including color channels and tracked-object overlays.
    pub fn move_keyframes<E: ProjectEngine>(
        project: &Arc<RwLock<E>>,
        object: &ObjectRef,
        from: i64,
        to: i64,
    ) -> Result<Option<PendingChange>, LibraryError> {
        let engine = read_project(project)?;
        let mut document = object
            .resolve(&*engine)
            .ok_or_else(|| LibraryError::MissingObject(object.clone()))?;
        drop(engine);

        let mut partial = Map::new();
        for (key, value) in document.iter_mut() {
            if key == OBJECTS_KEY {
                continue;
            }
            if move_in_value(value, from, to)? {
                partial.insert(key.clone(), value.clone());
            }
        }
        if let Some(objects) = document.get_mut(OBJECTS_KEY).and_then(Value::as_object_mut) {
            let mut moved = false;
            for overlay in objects.values_mut().filter_map(Value::as_object_mut) {
                for value in overlay.values_mut() {
                    moved |= move_in_value(value, from, to)?;
                }
            }
            if moved {
                partial.insert(OBJECTS_KEY.to_string(), Value::Object(objects.clone()));
            }
        }

        if partial.is_empty() {
            return Ok(None);
        }
        debug!(
            "Moved keyframes of {} from {} to {}: {:?}",
            object,
            from,
            to,
            partial.keys().collect::<Vec<_>>()
        );
        Ok(Some(PendingChange::new(object.clone(), None, partial)))
    }
}
