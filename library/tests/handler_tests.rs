//! Edits applied through `KeyframeHandler` to a JSON project.

use serde_json::{Value, json};
use std::sync::{Arc, RwLock};

use properties_core::LibraryError;
use properties_core::editor::ScaleLimits;
use properties_core::editor::keyframe_editor::ColorIntent;
use properties_core::model::property::PropertyType;
use properties_core::model::{ObjectRef, Rgba};
use properties_core::projection::TypedValue;
use properties_core::service::engine::ProjectEngine;
use properties_core::service::handlers::{KeyframeHandler, PropertyTarget};
use properties_core::service::memory::MemoryProject;

fn setup_project() -> Arc<RwLock<MemoryProject>> {
    let mut project = MemoryProject::from_value(json!({
        "fps": {"num": 24, "den": 1},
        "width": 1920,
        "height": 1080,
        "clips": [{
            "id": "C1",
            "position": 0.0,
            "start": 0.0,
            "end": 10.0,
            "file_id": "F1",
            "ui": {"audio_data": [0.1, 0.4]},
            "reader": {"type": "FFmpegReader", "path": "/media/intro.mp4"},
            "scale_x": {"Points": [{"co": {"X": 1.0, "Y": 1.0}, "interpolation": 1}]},
            "volume": {"Points": []},
            "wave_color": {
                "red": {"Points": [{"co": {"X": 1.0, "Y": 0.0}, "interpolation": 1}]},
                "green": {"Points": [{"co": {"X": 1.0, "Y": 123.0}, "interpolation": 1}]},
                "blue": {"Points": [{"co": {"X": 1.0, "Y": 255.0}, "interpolation": 1}]},
                "alpha": {"Points": [{"co": {"X": 1.0, "Y": 255.0}, "interpolation": 1}]}
            },
            "effects": [{
                "id": "E1",
                "class_name": "Tracker",
                "objects": {
                    "box-1": {
                        "x1": {"Points": [{"co": {"X": 1.0, "Y": 0.25}, "interpolation": 1}]}
                    },
                    "box-2": {}
                }
            }]
        }]
    }))
    .unwrap();
    project.register_reader("/media/logo.png", json!({"type": "QtImageReader", "path": "/media/logo.png"}));
    Arc::new(RwLock::new(project))
}

fn target<'a>(object: &'a ObjectRef, key: &'a str, property_type: PropertyType) -> PropertyTarget<'a> {
    PropertyTarget {
        object,
        key,
        property_type,
        overlay_id: None,
    }
}

#[test]
fn scale_is_clamped_to_the_project_size() {
    let project = setup_project();
    let clip = ObjectRef::clip("C1");
    let change = KeyframeHandler::update_value(
        &project,
        &target(&clip, "scale_x", PropertyType::Float),
        1,
        Some(&TypedValue::Float(1000.0)),
        None,
        &ScaleLimits::default(),
    )
    .unwrap()
    .expect("scale changed");

    assert_eq!(change.partial.len(), 1);
    assert_eq!(change.partial["scale_x"]["Points"][0]["co"]["Y"].as_f64(), Some(52.0));
    assert!(change.waveform_file_id.is_none());
}

#[test]
fn volume_edit_marks_the_waveform() {
    let project = setup_project();
    let clip = ObjectRef::clip("C1");
    let change = KeyframeHandler::update_value(
        &project,
        &target(&clip, "volume", PropertyType::Float),
        24,
        Some(&TypedValue::Float(0.5)),
        None,
        &ScaleLimits::default(),
    )
    .unwrap()
    .expect("volume changed");

    let points = change.partial["volume"]["Points"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["co"]["X"].as_f64(), Some(24.0));
    assert_eq!(points[0]["interpolation"], json!(1));
    assert_eq!(change.waveform_file_id.as_deref(), Some("F1"));
}

#[test]
fn time_values_snap_to_the_frame_grid() {
    let project = setup_project();
    let clip = ObjectRef::clip("C1");
    let change = KeyframeHandler::update_value(
        &project,
        &target(&clip, "position", PropertyType::Float),
        1,
        Some(&TypedValue::Float(1.03)),
        None,
        &ScaleLimits::default(),
    )
    .unwrap()
    .expect("position changed");

    let position = change.partial["position"].as_f64().unwrap();
    assert!((position - 25.0 / 24.0).abs() < 1e-9);
}

#[test]
fn clearing_the_reader_leaves_an_empty_source() {
    let project = setup_project();
    let clip = ObjectRef::clip("C1");
    let change = KeyframeHandler::update_value(
        &project,
        &target(&clip, "reader", PropertyType::Reader),
        1,
        None,
        None,
        &ScaleLimits::default(),
    )
    .unwrap()
    .expect("reader changed");
    assert_eq!(change.partial["reader"], json!({"type": ""}));
}

#[test]
fn reader_path_opens_a_new_reader() {
    let project = setup_project();
    let clip = ObjectRef::clip("C1");
    let change = KeyframeHandler::update_value(
        &project,
        &target(&clip, "reader", PropertyType::Reader),
        1,
        Some(&TypedValue::Text("/media/logo.png".into())),
        None,
        &ScaleLimits::default(),
    )
    .unwrap()
    .expect("reader changed");
    assert_eq!(change.partial["reader"]["type"], json!("QtImageReader"));
}

#[test]
fn overlay_edit_persists_the_whole_objects_map() {
    let project = setup_project();
    let effect = ObjectRef::effect("E1");
    let target = PropertyTarget {
        object: &effect,
        key: "x1",
        property_type: PropertyType::Float,
        overlay_id: Some("box-1"),
    };
    let change = KeyframeHandler::update_value(
        &project,
        &target,
        1,
        Some(&TypedValue::Float(0.75)),
        None,
        &ScaleLimits::default(),
    )
    .unwrap()
    .expect("overlay changed");

    let objects = change.partial["objects"].as_object().unwrap();
    assert!(objects.contains_key("box-2"));
    assert_eq!(objects["box-1"]["x1"]["Points"][0]["co"]["Y"].as_f64(), Some(0.75));
}

#[test]
fn empty_overlay_is_reported_as_missing() {
    let project = setup_project();
    let effect = ObjectRef::effect("E1");
    let target = PropertyTarget {
        object: &effect,
        key: "x1",
        property_type: PropertyType::Float,
        overlay_id: Some("box-2"),
    };
    let err = KeyframeHandler::update_value(
        &project,
        &target,
        1,
        Some(&TypedValue::Float(0.75)),
        None,
        &ScaleLimits::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LibraryError::MissingOverlayData { .. }));
}

#[test]
fn alpha_only_color_edit_keeps_rgb_curves() {
    let project = setup_project();
    let clip = ObjectRef::clip("C1");
    let change = KeyframeHandler::update_color(
        &project,
        &target(&clip, "wave_color", PropertyType::Color),
        1,
        &ColorIntent::SetColor(Rgba::new(0, 123, 255, 64)),
    )
    .unwrap()
    .expect("color changed");

    let saved = project.read().unwrap().lookup(&clip).unwrap();
    let color = &change.partial["wave_color"];
    for channel in ["red", "green", "blue"] {
        assert_eq!(color[channel], saved["wave_color"][channel]);
    }
    assert_eq!(color["alpha"]["Points"][0]["co"]["Y"].as_f64(), Some(64.0));
}

#[test]
fn removing_the_last_point_writes_the_default() {
    let project = setup_project();
    let clip = ObjectRef::clip("C1");
    let change = KeyframeHandler::remove_keyframe(
        &project,
        &target(&clip, "scale_x", PropertyType::Float),
        7,
        1,
    )
    .unwrap()
    .expect("point removed");
    let points = change.partial["scale_x"]["Points"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["co"]["X"].as_f64(), Some(7.0));
    assert_eq!(points[0]["co"]["Y"].as_f64(), Some(1.0));
}

#[test]
fn moving_keyframes_covers_overlays() {
    let project = setup_project();
    let effect = ObjectRef::effect("E1");
    let change = KeyframeHandler::move_keyframes(&project, &effect, 1, 12)
        .unwrap()
        .expect("points moved");
    let moved: &Value = &change.partial["objects"]["box-1"]["x1"]["Points"][0]["co"]["X"];
    assert_eq!(moved.as_f64(), Some(12.0));
}

#[test]
fn missing_object_is_an_error() {
    let project = setup_project();
    let gone = ObjectRef::clip("nope");
    let err = KeyframeHandler::update_value(
        &project,
        &target(&gone, "alpha", PropertyType::Float),
        1,
        Some(&TypedValue::Float(0.5)),
        None,
        &ScaleLimits::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LibraryError::MissingObject(_)));
}
