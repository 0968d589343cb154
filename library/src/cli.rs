//! `properties-cli <project.json> <clip|transition|effect> <id> <frame> [<key> <value>]`
//!
//! Prints the inspector rows of one object at a timeline frame. With a key
//! and a value, applies the edit first and prints the saved subtree.

use log::debug;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::config::load_settings;
use crate::error::LibraryError;
use crate::model::color::Rgba;
use crate::model::object::{ObjectKind, ObjectRef};
use crate::model::property::{OBJECTS_KEY, PropertyType};
use crate::projection::BackgroundHint;
use crate::service::engine::ProjectEngine;
use crate::service::handlers::read_project;
use crate::service::memory::MemoryProject;
use crate::service::properties_model::{EditReport, PropertiesModel, PropertyRow, ValueInput};
use crate::service::updates::UpdateHub;

const USAGE: &str =
    "usage: properties-cli <project.json> <clip|transition|effect> <id> <frame> [<key> <value>]";

#[derive(Debug, Clone, PartialEq)]
struct Invocation {
    project_path: String,
    target: ObjectRef,
    frame: i64,
    edit: Option<(String, String)>,
}

impl Invocation {
    fn parse(args: &[String]) -> Result<Self, LibraryError> {
        let usage = || LibraryError::InvalidArgument(USAGE.to_string());
        let (project_path, kind, id, frame) = match args {
            [_, project, kind, id, frame] | [_, project, kind, id, frame, _, _] => (project, kind, id, frame),
            _ => return Err(usage()),
        };
        let kind = ObjectKind::parse(kind)
            .ok_or_else(|| LibraryError::InvalidArgument(format!("unknown object kind '{}'", kind)))?;
        let frame = frame
            .parse()
            .map_err(|_| LibraryError::InvalidArgument(format!("invalid frame '{}'", frame)))?;
        let edit = match args {
            [.., key, value] if args.len() == 7 => Some((key.clone(), value.clone())),
            _ => None,
        };
        Ok(Self {
            project_path: project_path.clone(),
            target: ObjectRef::new(id.clone(), kind),
            frame,
            edit,
        })
    }
}

fn marker(row: &PropertyRow) -> &'static str {
    match row.display.background {
        BackgroundHint::Keyframed => "*",
        BackgroundHint::Interpolated => "~",
        BackgroundHint::None => " ",
    }
}

fn print_rows(rows: &[PropertyRow]) {
    for row in rows {
        let text = match row.display.swatch {
            Some(rgba) => format!("#{:02x}{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b, rgba.a),
            None => row.display.text.clone(),
        };
        println!("{} {:<24} {}", marker(row), row.display.label, text);
    }
}

fn apply_edit<E: ProjectEngine>(
    model: &mut PropertiesModel<E>,
    key: &str,
    value: &str,
) -> Result<EditReport, LibraryError> {
    let row = model
        .row(key)
        .ok_or_else(|| LibraryError::InvalidArgument(format!("no property '{}'", key)))?;
    let now = Instant::now();
    if row.raw.property_type == PropertyType::Color {
        let color = if value.is_empty() {
            None
        } else {
            Some(Rgba::from_hex(value).ok_or_else(|| {
                LibraryError::InvalidArgument(format!("invalid color '{}'", value))
            })?)
        };
        model.color_update(key, color, None, now)
    } else {
        model.value_updated(key, ValueInput::Text(value.to_string()), None, now)
    }
}

/// Saved value of `key`, looked up in the overlay the row came from.
fn saved_subtree(document: &serde_json::Map<String, Value>, key: &str, object_id: Option<&str>) -> Value {
    let scope = match object_id {
        Some(id) => document.get(OBJECTS_KEY).and_then(|objects| objects.get(id)),
        None => None,
    };
    let value = match scope {
        Some(overlay) => overlay.get(key),
        None => document.get(key),
    };
    serde_json::json!({ key: value.cloned().unwrap_or(Value::Null) })
}

pub fn run(args: Vec<String>) -> Result<(), LibraryError> {
    let invocation = Invocation::parse(&args)?;
    let settings = load_settings();
    let hub = UpdateHub::new();
    let project = MemoryProject::load(Path::new(&invocation.project_path))?.with_hub(hub.clone());
    let project = Arc::new(RwLock::new(project));
    let (mut model, events) = PropertiesModel::new(Arc::clone(&project), &hub, &settings);

    model.update_frame(invocation.frame, false)?;
    model.update_item(vec![invocation.target.clone()], Instant::now())?;
    model.update_item_timeout()?;
    if model.selected().is_empty() {
        return Err(LibraryError::MissingObject(invocation.target));
    }

    if let Some((key, value)) = &invocation.edit {
        let object_id = model.row(key).and_then(|row| row.object_id.clone());
        let report = apply_edit(&mut model, key, value)?;
        for (object, err) in &report.skipped {
            eprintln!("skipped {}: {}", object, err);
        }
        model.tick(Instant::now() + settings.waveform_debounce())?;

        let engine = read_project(&project)?;
        if let Some(document) = engine.lookup(&invocation.target) {
            let subtree = saved_subtree(&document, key, object_id.as_deref());
            println!("{}", serde_json::to_string_pretty(&subtree)?);
        }
    }

    println!("frame {}", model.frame_number());
    print_rows(model.rows());
    for event in events.try_iter() {
        debug!("{:?}", event);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_view_and_edit_invocations() {
        let view = Invocation::parse(&args(&["cli", "p.json", "clip", "C1", "12"])).unwrap();
        assert_eq!(view.target, ObjectRef::clip("C1"));
        assert_eq!(view.frame, 12);
        assert!(view.edit.is_none());

        let edit = Invocation::parse(&args(&["cli", "p.json", "effect", "E1", "1", "alpha", "0.5"])).unwrap();
        assert_eq!(edit.edit, Some(("alpha".to_string(), "0.5".to_string())));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Invocation::parse(&args(&["cli", "p.json", "clip"])).is_err());
        assert!(Invocation::parse(&args(&["cli", "p.json", "track", "T", "1"])).is_err());
        assert!(Invocation::parse(&args(&["cli", "p.json", "clip", "C1", "x"])).is_err());
    }
}
