//! Builds raw property records from a stored document.
//!
//! Keys with a known meaning get their label, type, range and choices from
//! [`SCHEMA`]. Any other scalar or curve is described from its JSON shape and
//! labelled from its key.

use log::debug;
use serde_json::{Map, Value, json};

use crate::error::LibraryError;
use crate::model::color::ColorChannel;
use crate::model::keyframe::{Keyframe, is_keyframe_value};
use crate::model::property::{ChannelRecord, Choice, OBJECTS_KEY, PropertyType, RawProperty};

/// Longest timeline the ranges below allow, in seconds.
const MAX_TIME: f64 = 30.0 * 60.0 * 60.0 * 48.0;

/// Document keys that never become rows.
const SKIPPED_KEYS: [&str; 5] = ["effects", "ui", "file_id", "class_name", "type"];

pub struct SchemaEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub property_type: PropertyType,
    pub min: f64,
    pub max: f64,
    pub readonly: bool,
}

const fn entry(
    key: &'static str,
    label: &'static str,
    property_type: PropertyType,
    min: f64,
    max: f64,
) -> SchemaEntry {
    SchemaEntry {
        key,
        label,
        property_type,
        min,
        max,
        readonly: false,
    }
}

const fn readonly(key: &'static str, label: &'static str, property_type: PropertyType) -> SchemaEntry {
    SchemaEntry {
        key,
        label,
        property_type,
        min: 0.0,
        max: MAX_TIME,
        readonly: true,
    }
}

pub const SCHEMA: &[SchemaEntry] = &[
    readonly("id", "ID", PropertyType::String),
    readonly("duration", "Duration", PropertyType::Float),
    entry("position", "Position", PropertyType::Float, 0.0, MAX_TIME),
    entry("layer", "Track", PropertyType::Int, 0.0, 20.0),
    entry("start", "Start", PropertyType::Float, 0.0, MAX_TIME),
    entry("end", "End", PropertyType::Float, 0.0, MAX_TIME),
    entry("alpha", "Alpha", PropertyType::Float, 0.0, 1.0),
    entry("scale_x", "Scale X", PropertyType::Float, 0.0, 1000.0),
    entry("scale_y", "Scale Y", PropertyType::Float, 0.0, 1000.0),
    entry("location_x", "Location X", PropertyType::Float, -1.0, 1.0),
    entry("location_y", "Location Y", PropertyType::Float, -1.0, 1.0),
    entry("origin_x", "Origin X", PropertyType::Float, 0.0, 1.0),
    entry("origin_y", "Origin Y", PropertyType::Float, 0.0, 1.0),
    entry("rotation", "Rotation", PropertyType::Float, -360.0, 360.0),
    entry("shear_x", "Shear X", PropertyType::Float, -1.0, 1.0),
    entry("shear_y", "Shear Y", PropertyType::Float, -1.0, 1.0),
    entry("volume", "Volume", PropertyType::Float, 0.0, 1.0),
    entry("time", "Time", PropertyType::Float, 0.0, MAX_TIME),
    entry("has_audio", "Enable Audio", PropertyType::Int, -1.0, 1.0),
    entry("has_video", "Enable Video", PropertyType::Int, -1.0, 1.0),
    entry("channel_filter", "Channel Filter", PropertyType::Int, -1.0, 10.0),
    entry("channel_mapping", "Channel Mapping", PropertyType::Int, -1.0, 10.0),
    entry("scale", "Scale", PropertyType::Int, 0.0, 3.0),
    entry("wave_color", "Wave Color", PropertyType::Color, 0.0, 255.0),
    entry("color", "Color", PropertyType::Color, 0.0, 255.0),
    entry("caption_text", "Captions", PropertyType::Caption, 0.0, 0.0),
    entry("font", "Font", PropertyType::Font, 0.0, 0.0),
    entry("reader", "Source", PropertyType::Reader, 0.0, 0.0),
];

pub fn lookup(key: &str) -> Option<&'static SchemaEntry> {
    SCHEMA.iter().find(|e| e.key == key)
}

/// `blur_radius` -> `Blur Radius`
pub fn label_from_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn choices_for(key: &str, current: f64) -> Vec<Choice> {
    let options: &[(&str, i64)] = match key {
        "has_audio" | "has_video" => &[("Auto", -1), ("Off", 0), ("On", 1)],
        "scale" => &[("Crop", 0), ("Best Fit", 1), ("Stretch", 2), ("None", 3)],
        _ => &[],
    };
    options
        .iter()
        .map(|(name, value)| Choice {
            name: name.to_string(),
            value: json!(value),
            selected: (*value as f64 - current).abs() < f64::EPSILON,
        })
        .collect()
}

fn is_color_value(value: &Value) -> bool {
    value.as_object().is_some_and(|color| {
        [ColorChannel::Red, ColorChannel::Green, ColorChannel::Blue]
            .iter()
            .all(|channel| color.get(channel.key()).is_some_and(is_keyframe_value))
    })
}

/// Describes every property of `document` at `frame`.
pub fn raw_properties(document: &Map<String, Value>, frame: i64) -> Map<String, Value> {
    let mut records = Map::new();
    for (key, value) in document {
        if SKIPPED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if key == OBJECTS_KEY {
            if let Some(objects) = value.as_object() {
                let overlays: Map<String, Value> = objects
                    .iter()
                    .filter_map(|(id, overlay)| {
                        let overlay = overlay.as_object()?;
                        Some((id.clone(), Value::Object(raw_properties(overlay, frame))))
                    })
                    .collect();
                records.insert(OBJECTS_KEY.to_string(), Value::Object(overlays));
            }
            continue;
        }
        match describe(key, value, frame) {
            Ok(Some(record)) => match serde_json::to_value(record) {
                Ok(record) => {
                    records.insert(key.clone(), record);
                }
                Err(err) => debug!("Cannot serialize property {}: {}", key, err),
            },
            Ok(None) => {}
            Err(err) => debug!("Skipping malformed property {}: {}", key, err),
        }
    }

    if !records.contains_key("duration") {
        let start = document.get("start").and_then(Value::as_f64);
        let end = document.get("end").and_then(Value::as_f64);
        if let (Some(start), Some(end)) = (start, end) {
            let mut record = RawProperty::new("Duration", PropertyType::Float, json!(end - start));
            record.readonly = true;
            if let Ok(record) = serde_json::to_value(record) {
                records.insert("duration".to_string(), record);
            }
        }
    }
    records
}

/// Record of one property, or `None` for values that are not properties.
pub fn describe(key: &str, value: &Value, frame: i64) -> Result<Option<RawProperty>, LibraryError> {
    let schema = lookup(key);
    let label = schema
        .map(|e| e.label.to_string())
        .unwrap_or_else(|| label_from_key(key));
    let schema_type = schema.map(|e| e.property_type);

    let mut record = if is_keyframe_value(value) {
        curve_record(label, schema_type.unwrap_or(PropertyType::Float), value, frame)?
    } else if is_color_value(value) {
        color_record(label, value, frame)?
    } else {
        match (value, schema_type) {
            (Value::Object(_), Some(PropertyType::Reader)) => {
                let mut record = RawProperty::new(label, PropertyType::Reader, json!(0));
                record.memo = serde_json::to_string(value)?;
                record
            }
            (Value::Bool(b), _) => RawProperty::new(label, PropertyType::Bool, json!(b)),
            (Value::Number(n), Some(PropertyType::Float)) => {
                RawProperty::new(label, PropertyType::Float, json!(n.as_f64()))
            }
            (Value::Number(n), _) if n.is_i64() => RawProperty::new(label, PropertyType::Int, value.clone()),
            (Value::Number(_), _) => RawProperty::new(label, PropertyType::Float, value.clone()),
            (Value::String(s), _) => {
                let property_type = match schema_type {
                    Some(t @ (PropertyType::Font | PropertyType::Caption)) => t,
                    _ => PropertyType::String,
                };
                let mut record = RawProperty::new(label, property_type, json!(0));
                record.memo = s.clone();
                record
            }
            _ => return Ok(None),
        }
    };

    if let Some(schema) = schema {
        record.readonly = schema.readonly;
        if !schema.readonly && schema.max > schema.min {
            record.min = Some(schema.min);
            record.max = Some(schema.max);
        }
    }
    if let Some(current) = record.numeric_value() {
        record.choices = choices_for(key, current);
    }
    Ok(Some(record))
}

fn curve_record(
    label: String,
    property_type: PropertyType,
    value: &Value,
    frame: i64,
) -> Result<RawProperty, LibraryError> {
    let keyframe = Keyframe::from_value(value)?;
    let current = keyframe.value_at(frame);
    let value = match property_type {
        PropertyType::Int => json!(current.round() as i64),
        PropertyType::Bool => json!(current != 0.0),
        _ => json!(current),
    };
    let mut record = RawProperty::new(label, property_type, value);
    fill_anchors(&mut record, &keyframe, frame);
    Ok(record)
}

fn color_record(label: String, value: &Value, frame: i64) -> Result<RawProperty, LibraryError> {
    let mut record = RawProperty::new(label, PropertyType::Color, json!(0));
    for channel in ColorChannel::EDIT_ORDER {
        let Some(curve) = value.get(channel.key()) else {
            continue;
        };
        let keyframe = Keyframe::from_value(curve)?;
        let channel_record = Some(ChannelRecord {
            value: keyframe.value_at(frame),
        });
        match channel {
            ColorChannel::Red => {
                fill_anchors(&mut record, &keyframe, frame);
                record.red = channel_record;
            }
            ColorChannel::Green => record.green = channel_record,
            ColorChannel::Blue => record.blue = channel_record,
            ColorChannel::Alpha => record.alpha = channel_record,
        }
    }
    Ok(record)
}

fn fill_anchors(record: &mut RawProperty, keyframe: &Keyframe, frame: i64) {
    let (closest, previous) = keyframe.anchor_frames(frame);
    record.points = keyframe.len();
    record.keyframe = keyframe.contains_frame(frame);
    record.interpolation = keyframe
        .interpolation_at(frame)
        .map(|i| i.code())
        .unwrap_or(-1);
    record.closest_point_x = closest;
    record.previous_point_x = previous;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_come_from_schema_or_key() {
        assert_eq!(label_from_key("blur_radius"), "Blur Radius");
        let record = describe("layer", &json!(3), 1).unwrap().unwrap();
        assert_eq!(record.name, "Track");
        assert_eq!(record.property_type, PropertyType::Int);
    }

    #[test]
    fn curves_report_anchor_frames() {
        let curve = json!({"Points": [
            {"co": {"X": 1, "Y": 0.0}, "interpolation": 1},
            {"co": {"X": 11, "Y": 1.0}, "interpolation": 1}
        ]});
        let record = describe("alpha", &curve, 6).unwrap().unwrap();
        assert_eq!(record.points, 2);
        assert!(!record.keyframe);
        assert_eq!(record.closest_point_x, 11);
        assert_eq!(record.previous_point_x, 1);
        assert!((record.numeric_value().unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn audio_switch_selects_choice() {
        let curve = json!({"Points": [{"co": {"X": 1, "Y": -1.0}, "interpolation": 2}]});
        let record = describe("has_audio", &curve, 1).unwrap().unwrap();
        let selected = record.selected_choice().unwrap();
        assert_eq!(selected.name, "Auto");
    }

    #[test]
    fn duration_is_derived_and_readonly() {
        let doc = json!({"id": "C1", "start": 1.0, "end": 4.0, "effects": []});
        let records = raw_properties(doc.as_object().unwrap(), 1);
        assert_eq!(records["duration"]["value"], json!(3.0));
        assert_eq!(records["duration"]["readonly"], json!(true));
        assert!(!records.contains_key("effects"));
    }
}
