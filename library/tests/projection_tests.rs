//! Stored values described by the schema and shown through a locale.

use serde_json::{Map, json};
use std::collections::HashMap;

use properties_core::LibraryError;
use properties_core::animation::Interpolation;
use properties_core::config::LocaleSettings;
use properties_core::locale::Locale;
use properties_core::model::TrackInfo;
use properties_core::model::property::{PropertyType, parse_raw_properties};
use properties_core::projection::{
    BackgroundHint, ProjectionContext, TypedValue, merge_selection, parse_input, project_property,
};
use properties_core::service::schema::{describe, raw_properties};

fn german() -> Locale {
    let mut translations = HashMap::new();
    translations.insert("Alpha".to_string(), "Deckkraft".to_string());
    translations.insert("Auto".to_string(), "Automatisch".to_string());
    translations.insert("True".to_string(), "Wahr".to_string());
    Locale::new(LocaleSettings {
        decimal_separator: ',',
        group_separator: Some('.'),
        translations,
        ..LocaleSettings::default()
    })
}

#[test]
fn keyframed_curve_is_localized() {
    let locale = german();
    let curve = json!({"Points": [
        {"co": {"X": 1.0, "Y": 1.0}, "interpolation": 1},
        {"co": {"X": 11.0, "Y": 1234.5}, "interpolation": 2}
    ]});
    let raw = describe("alpha", &curve, 11).unwrap().unwrap();
    let row = project_property(&raw, &ProjectionContext { locale: &locale, tracks: &[] });

    assert_eq!(row.label, "Deckkraft");
    assert_eq!(row.text, "1.234,500");
    assert_eq!(row.background, BackgroundHint::Keyframed);
    assert_eq!(row.icon, Some(Interpolation::Constant));
}

#[test]
fn value_between_points_is_interpolated() {
    let locale = Locale::default();
    let curve = json!({"Points": [
        {"co": {"X": 1.0, "Y": 0.0}, "interpolation": 1},
        {"co": {"X": 11.0, "Y": 1.0}, "interpolation": 1}
    ]});
    let raw = describe("alpha", &curve, 6).unwrap().unwrap();
    assert_eq!(raw.closest_point_x, 11);
    assert_eq!(raw.previous_point_x, 1);
    let row = project_property(&raw, &ProjectionContext { locale: &locale, tracks: &[] });
    assert_eq!(row.background, BackgroundHint::Interpolated);
    assert_eq!(row.text, "0.500");
}

#[test]
fn choices_show_translated_names() {
    let locale = german();
    let curve = json!({"Points": [{"co": {"X": 1.0, "Y": -1.0}, "interpolation": 1}]});
    let raw = describe("has_audio", &curve, 1).unwrap().unwrap();
    let row = project_property(&raw, &ProjectionContext { locale: &locale, tracks: &[] });
    assert_eq!(row.text, "Automatisch");
    assert!(!row.editable);
}

#[test]
fn unlabelled_track_is_counted_from_the_top() {
    let locale = Locale::default();
    let tracks = vec![
        TrackInfo { number: 1, label: String::new() },
        TrackInfo { number: 2, label: String::new() },
        TrackInfo { number: 3, label: "Titles".into() },
    ];
    let ctx = ProjectionContext { locale: &locale, tracks: &tracks };

    let bottom = describe("layer", &json!(1), 1).unwrap().unwrap();
    assert_eq!(project_property(&bottom, &ctx).text, "Track 1");
    let top = describe("layer", &json!(3), 1).unwrap().unwrap();
    assert_eq!(project_property(&top, &ctx).text, "Titles");
}

#[test]
fn localized_input_is_parsed() {
    let locale = german();
    assert_eq!(
        parse_input("alpha", PropertyType::Float, "1.000,5", &locale).unwrap(),
        Some(TypedValue::Float(1000.5))
    );
    assert_eq!(
        parse_input("has_video", PropertyType::Bool, "wahr", &locale).unwrap(),
        Some(TypedValue::Bool(true))
    );
    assert!(parse_input("has_video", PropertyType::Bool, "yes", &locale).is_err());
}

#[test]
fn stray_group_separators_are_parse_errors() {
    let english = Locale::default();
    let err = parse_input("alpha", PropertyType::Float, "0,5", &english).unwrap_err();
    assert!(matches!(err, LibraryError::Parse { expected: "a number", .. }));
    let err = parse_input("layer", PropertyType::Int, "1,2,3", &english).unwrap_err();
    assert!(matches!(err, LibraryError::Parse { expected: "an integer", .. }));
    assert!(parse_input("scale_x", PropertyType::Float, "1.5", &german()).is_err());
    assert_eq!(
        parse_input("scale_x", PropertyType::Float, "1,5", &german()).unwrap(),
        Some(TypedValue::Float(1.5))
    );
}

#[test]
fn shared_rows_blank_out_differences() {
    let first: Map<_, _> = json!({"id": "C1", "alpha": {"Points": [{"co": {"X": 1.0, "Y": 1.0}}]}, "title": "A"})
        .as_object()
        .unwrap()
        .clone();
    let second: Map<_, _> = json!({"id": "C2", "alpha": {"Points": [{"co": {"X": 1.0, "Y": 1.0}}]}, "volume": {"Points": []}})
        .as_object()
        .unwrap()
        .clone();

    let merged = merge_selection(vec![
        parse_raw_properties(&raw_properties(&first, 1)),
        parse_raw_properties(&raw_properties(&second, 1)),
    ]);
    assert!(merged.properties.contains_key("alpha"));
    assert!(!merged.properties.contains_key("title"));
    assert!(!merged.properties.contains_key("volume"));
    assert_eq!(merged.properties["id"].memo, "");
    assert_eq!(merged.properties["alpha"].value.as_f64(), Some(1.0));
}

#[test]
fn single_selection_takes_the_first_overlay() {
    let effect: Map<_, _> = json!({
        "id": "E1",
        "objects": {
            "b": {"x2": {"Points": [{"co": {"X": 1.0, "Y": 0.9}}]}},
            "a": {"x1": {"Points": [{"co": {"X": 1.0, "Y": 0.1}}]}}
        }
    })
    .as_object()
    .unwrap()
    .clone();

    let merged = merge_selection(vec![parse_raw_properties(&raw_properties(&effect, 1))]);
    assert_eq!(merged.overlay_id.as_deref(), Some("a"));
    assert_eq!(merged.overlay_keys, vec!["x1".to_string()]);
    assert!(merged.properties.contains_key("x1"));
    assert!(!merged.properties.contains_key("x2"));
}
