use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::animation::Interpolation;
use crate::model::color::{ColorChannel, Rgba};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Int,
    Float,
    Bool,
    String,
    Color,
    Font,
    Caption,
    Reader,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Int => "int",
            PropertyType::Float => "float",
            PropertyType::Bool => "bool",
            PropertyType::String => "string",
            PropertyType::Color => "color",
            PropertyType::Font => "font",
            PropertyType::Caption => "caption",
            PropertyType::Reader => "reader",
        }
    }

    /// Types whose value cell is edited through a dedicated dialog.
    pub fn has_custom_editor(&self) -> bool {
        matches!(
            self,
            PropertyType::Color | PropertyType::Font | PropertyType::Caption
        )
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Choice {
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub selected: bool,
}

/// Value of one channel of a color record.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct ChannelRecord {
    #[serde(default)]
    pub value: f64,
}

fn no_point() -> i64 {
    -1
}

/// A property as reported by the engine for one object at one frame.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct RawProperty {
    /// Display label.
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub memo: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// A point exists exactly at the requested frame.
    #[serde(default)]
    pub keyframe: bool,
    #[serde(default)]
    pub points: usize,
    #[serde(default = "no_point")]
    pub interpolation: i64,
    #[serde(default = "no_point")]
    pub closest_point_x: i64,
    #[serde(default = "no_point")]
    pub previous_point_x: i64,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red: Option<ChannelRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green: Option<ChannelRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blue: Option<ChannelRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<ChannelRecord>,
}

impl RawProperty {
    pub fn new(name: impl Into<String>, property_type: PropertyType, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            memo: String::new(),
            property_type,
            keyframe: false,
            points: 0,
            interpolation: -1,
            closest_point_x: -1,
            previous_point_x: -1,
            readonly: false,
            choices: Vec::new(),
            min: None,
            max: None,
            red: None,
            green: None,
            blue: None,
            alpha: None,
        }
    }

    pub fn interpolation(&self) -> Option<Interpolation> {
        Interpolation::from_code(self.interpolation)
    }

    pub fn selected_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.selected)
    }

    /// More than one point: the value changes over time.
    pub fn is_animated(&self) -> bool {
        self.points > 1
    }

    /// Blank values are the shared sentinel used when selections diverge.
    pub fn is_blank(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn numeric_value(&self) -> Option<f64> {
        match &self.value {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match &self.value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => !s.is_empty(),
            _ => false,
        }
    }

    pub fn channel(&self, channel: ColorChannel) -> Option<&ChannelRecord> {
        match channel {
            ColorChannel::Red => self.red.as_ref(),
            ColorChannel::Green => self.green.as_ref(),
            ColorChannel::Blue => self.blue.as_ref(),
            ColorChannel::Alpha => self.alpha.as_ref(),
        }
    }

    /// Swatch of a color record. Alpha falls back to `max`, then to 255.
    pub fn swatch(&self) -> Option<Rgba> {
        if self.property_type != PropertyType::Color {
            return None;
        }
        let byte = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        let r = byte(self.red.as_ref()?.value);
        let g = byte(self.green.as_ref()?.value);
        let b = byte(self.blue.as_ref()?.value);
        let a = self
            .alpha
            .as_ref()
            .map(|c| c.value)
            .or(self.max)
            .unwrap_or(255.0);
        Some(Rgba::new(r, g, b, byte(a)))
    }

    /// Same property across selections: same type and label.
    pub fn matches(&self, other: &RawProperty) -> bool {
        self.property_type == other.property_type && self.name == other.name
    }
}

/// Raw properties of one object keyed by property key.
pub type RawPropertyMap = BTreeMap<String, RawProperty>;

/// Tracked-object overlays keyed by object id.
pub type OverlayMap = BTreeMap<String, RawPropertyMap>;

pub const OBJECTS_KEY: &str = "objects";

/// Splits an engine `properties_at` result into base records and overlay
/// records. Entries that are not property records are skipped.
pub fn parse_raw_properties(raw: &Map<String, Value>) -> (RawPropertyMap, OverlayMap) {
    let mut base = RawPropertyMap::new();
    let mut overlays = OverlayMap::new();

    for (key, value) in raw {
        if key == OBJECTS_KEY {
            if let Some(objects) = value.as_object() {
                for (object_id, props) in objects {
                    if let Some(props) = props.as_object() {
                        let (records, _) = parse_raw_properties(props);
                        overlays.insert(object_id.clone(), records);
                    }
                }
            }
            continue;
        }
        match serde_json::from_value::<RawProperty>(value.clone()) {
            Ok(record) => {
                base.insert(key.clone(), record);
            }
            Err(err) => log::debug!("Skipping non-property entry {}: {}", key, err),
        }
    }
    (base, overlays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn swatch_falls_back_to_max_for_alpha() {
        let raw: RawProperty = serde_json::from_value(json!({
            "name": "Wave Color",
            "type": "color",
            "max": 255.0,
            "red": {"value": 10.0},
            "green": {"value": 20.4},
            "blue": {"value": 300.0}
        }))
        .unwrap();
        assert_eq!(raw.swatch(), Some(Rgba::new(10, 20, 255, 255)));
    }

    #[test]
    fn parse_splits_overlays_from_base() {
        let raw = json!({
            "alpha": {"name": "Alpha", "type": "float", "value": 1.0, "points": 1},
            "objects": {
                "tracked-1": {
                    "visible": {"name": "Visible", "type": "bool", "value": true}
                }
            },
            "junk": 5
        });
        let (base, overlays) = parse_raw_properties(raw.as_object().unwrap());
        assert_eq!(base.len(), 1);
        assert_eq!(base["alpha"].closest_point_x, -1);
        assert!(overlays["tracked-1"].contains_key("visible"));
    }
}
