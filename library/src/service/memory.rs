//! A project held as one JSON document.
//!
//! Layout: `fps`, `width`, `height`, `layers`, `clips` (each clip carries its
//! own `effects`), and `effects` (transitions).

use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::LibraryError;
use crate::model::object::{ClipTiming, Fraction, ObjectKind, ObjectRef, TrackInfo};
use crate::service::engine::ProjectEngine;
use crate::service::schema;
use crate::service::updates::{UpdateAction, UpdateHub};

const CLIPS_KEY: &str = "clips";
const EFFECTS_KEY: &str = "effects";
const LAYERS_KEY: &str = "layers";

#[derive(Default)]
pub struct MemoryProject {
    document: Map<String, Value>,
    readers: HashMap<String, Value>,
    hub: Option<UpdateHub>,
}

fn has_id(object: &Map<String, Value>, id: &str) -> bool {
    object.get("id").and_then(Value::as_str) == Some(id)
}

fn find_in<'a>(list: Option<&'a Value>, id: &str) -> Option<&'a Map<String, Value>> {
    list?
        .as_array()?
        .iter()
        .filter_map(Value::as_object)
        .find(|object| has_id(object, id))
}

fn find_in_mut<'a>(list: Option<&'a mut Value>, id: &str) -> Option<&'a mut Map<String, Value>> {
    list?
        .as_array_mut()?
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|object| has_id(object, id))
}

fn reader_type_for(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    if lower.ends_with(".svg") || lower.ends_with(".png") || lower.ends_with(".jpg") {
        "QtImageReader"
    } else {
        "FFmpegReader"
    }
}

impl MemoryProject {
    pub fn from_value(value: Value) -> Result<Self, LibraryError> {
        match value {
            Value::Object(document) => Ok(Self {
                document,
                ..Self::default()
            }),
            _ => Err(LibraryError::Project(
                "project document must be a JSON object".to_string(),
            )),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let json = fs::read_to_string(path)?;
        info!("Loaded project {}", path.display());
        Self::from_json(&json)
    }

    /// Publishes an update action to `hub` on every persist.
    pub fn with_hub(mut self, hub: UpdateHub) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Reader document returned by `open_reader` for `path`.
    pub fn register_reader(&mut self, path: impl Into<String>, reader: Value) {
        self.readers.insert(path.into(), reader);
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn to_json(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }

    fn object(&self, target: &ObjectRef) -> Option<&Map<String, Value>> {
        match target.kind {
            ObjectKind::Clip => find_in(self.document.get(CLIPS_KEY), &target.id),
            ObjectKind::Transition => find_in(self.document.get(EFFECTS_KEY), &target.id),
            ObjectKind::Effect => self
                .document
                .get(CLIPS_KEY)?
                .as_array()?
                .iter()
                .filter_map(Value::as_object)
                .find_map(|clip| find_in(clip.get(EFFECTS_KEY), &target.id)),
        }
    }

    fn object_mut(&mut self, target: &ObjectRef) -> Option<&mut Map<String, Value>> {
        match target.kind {
            ObjectKind::Clip => find_in_mut(self.document.get_mut(CLIPS_KEY), &target.id),
            ObjectKind::Transition => find_in_mut(self.document.get_mut(EFFECTS_KEY), &target.id),
            ObjectKind::Effect => self
                .document
                .get_mut(CLIPS_KEY)?
                .as_array_mut()?
                .iter_mut()
                .filter_map(Value::as_object_mut)
                .find_map(|clip| find_in_mut(clip.get_mut(EFFECTS_KEY), &target.id)),
        }
    }
}

impl ProjectEngine for MemoryProject {
    fn lookup(&self, target: &ObjectRef) -> Option<Map<String, Value>> {
        self.object(target).cloned()
    }

    fn properties_at(&self, target: &ObjectRef, frame: i64) -> Option<Map<String, Value>> {
        self.object(target)
            .map(|document| schema::raw_properties(document, frame))
    }

    fn persist(&mut self, target: &ObjectRef, partial: Map<String, Value>) -> Result<(), LibraryError> {
        let object = self
            .object_mut(target)
            .ok_or_else(|| LibraryError::MissingObject(target.clone()))?;
        for (key, value) in &partial {
            object.insert(key.clone(), value.clone());
        }
        debug!("Saved {} keys of {}", partial.len(), target);

        if let Some(hub) = &self.hub {
            hub.publish(UpdateAction::update(
                vec![target.kind.update_key().to_string(), target.id.clone()],
                Value::Object(partial),
            ));
        }
        Ok(())
    }

    fn timing(&self, target: &ObjectRef) -> Option<ClipTiming> {
        if target.kind == ObjectKind::Effect {
            return None;
        }
        let object = self.object(target)?;
        let seconds = |key: &str| object.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        Some(ClipTiming {
            position: seconds("position"),
            start: seconds("start"),
            end: seconds("end"),
        })
    }

    fn parent_clip(&self, effect: &ObjectRef) -> Option<ObjectRef> {
        if effect.kind != ObjectKind::Effect {
            return None;
        }
        self.document
            .get(CLIPS_KEY)?
            .as_array()?
            .iter()
            .filter_map(Value::as_object)
            .find(|clip| find_in(clip.get(EFFECTS_KEY), &effect.id).is_some())
            .and_then(|clip| clip.get("id")?.as_str().map(ObjectRef::clip))
    }

    fn frame_rate(&self) -> Fraction {
        self.document
            .get("fps")
            .and_then(|fps| serde_json::from_value(fps.clone()).ok())
            .unwrap_or_default()
    }

    fn frame_size(&self) -> (u32, u32) {
        let dimension = |key: &str| {
            self.document
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0)
        };
        (dimension("width"), dimension("height"))
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        self.document
            .get(LAYERS_KEY)
            .and_then(|layers| serde_json::from_value(layers.clone()).ok())
            .unwrap_or_default()
    }

    fn open_reader(&self, path: &str) -> Result<Value, LibraryError> {
        if let Some(reader) = self.readers.get(path) {
            return Ok(reader.clone());
        }
        if !Path::new(path).exists() {
            return Err(LibraryError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no media file at {}", path),
            )));
        }
        Ok(serde_json::json!({
            "type": reader_type_for(path),
            "path": path,
        }))
    }
}
