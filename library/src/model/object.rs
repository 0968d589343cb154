use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::service::engine::ProjectEngine;

/// The kinds of timeline objects whose properties can be edited.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Clip,
    Transition,
    Effect,
}

impl ObjectKind {
    /// Top-level project key that update notifications use for this kind.
    pub fn update_key(&self) -> &'static str {
        match self {
            ObjectKind::Clip => "clips",
            ObjectKind::Transition | ObjectKind::Effect => "effects",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Clip => "clip",
            ObjectKind::Transition => "transition",
            ObjectKind::Effect => "effect",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "clip" => Some(ObjectKind::Clip),
            "transition" => Some(ObjectKind::Transition),
            "effect" => Some(ObjectKind::Effect),
            _ => None,
        }
    }

    /// Base properties that make no sense on this kind and are hidden.
    pub fn hidden_base_properties(&self) -> &'static [&'static str] {
        match self {
            ObjectKind::Effect => &["position", "layer", "start", "end", "duration"],
            _ => &[],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ObjectRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
}

impl ObjectRef {
    pub fn new(id: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn clip(id: impl Into<String>) -> Self {
        Self::new(id, ObjectKind::Clip)
    }

    pub fn transition(id: impl Into<String>) -> Self {
        Self::new(id, ObjectKind::Transition)
    }

    pub fn effect(id: impl Into<String>) -> Self {
        Self::new(id, ObjectKind::Effect)
    }

    /// Resolves the persisted document of this object, if it still exists.
    pub fn resolve<E: ProjectEngine + ?Sized>(&self, engine: &E) -> Option<Map<String, Value>> {
        engine.lookup(self)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.id)
    }
}

/// Placement of an object on the timeline, in seconds.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ClipTiming {
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Fraction {
    pub num: i64,
    pub den: i64,
}

impl Fraction {
    pub fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    pub fn to_f64(&self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }

    /// Duration of a single frame in seconds.
    pub fn frame_duration(&self) -> f64 {
        if self.num == 0 {
            return 0.0;
        }
        self.den as f64 / self.num as f64
    }

    /// Snaps a time in seconds to the nearest frame boundary.
    pub fn snap(&self, seconds: f64) -> f64 {
        let frame = self.frame_duration();
        if frame <= 0.0 {
            return seconds;
        }
        (seconds / frame).round() * frame
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::new(30, 1)
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct TrackInfo {
    pub number: i64,
    #[serde(default)]
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_frame_grid() {
        let fps = Fraction::new(24, 1);
        let snapped = fps.snap(1.03);
        assert!((snapped - 25.0 / 24.0).abs() < 1e-9);
    }

    #[test]
    fn transitions_and_effects_share_update_key() {
        assert_eq!(ObjectKind::Transition.update_key(), "effects");
        assert_eq!(ObjectKind::Effect.update_key(), "effects");
        assert_eq!(ObjectKind::Clip.update_key(), "clips");
    }
}
