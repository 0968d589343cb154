//! Presentation records derived from raw property records.

pub mod parse;
pub mod shared;

use serde_json::Value;
use std::path::Path;

use crate::animation::Interpolation;
use crate::locale::Locale;
use crate::model::color::Rgba;
use crate::model::object::TrackInfo;
use crate::model::property::{PropertyType, RawProperty};

pub use parse::{TypedValue, parse_input};
pub use shared::{MergedProperties, merge_selection};

/// Highlight of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundHint {
    #[default]
    None,
    /// Animated, with a point exactly at the current frame.
    Keyframed,
    /// Animated, value interpolated between points.
    Interpolated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub label: String,
    pub text: String,
    pub background: BackgroundHint,
    /// Color shown in the value cell of color properties.
    pub swatch: Option<Rgba>,
    /// Curve-shape icon of animated properties.
    pub icon: Option<Interpolation>,
    pub editable: bool,
}

pub struct ProjectionContext<'a> {
    pub locale: &'a Locale,
    pub tracks: &'a [TrackInfo],
}

pub const TRACK_LABEL: &str = "Track";

pub fn project_property(raw: &RawProperty, ctx: &ProjectionContext) -> DisplayRow {
    let background = if raw.is_animated() && raw.keyframe {
        BackgroundHint::Keyframed
    } else if raw.is_animated() {
        BackgroundHint::Interpolated
    } else {
        BackgroundHint::None
    };
    let icon = if raw.is_animated() {
        Some(raw.interpolation().unwrap_or_default())
    } else {
        None
    };
    let editable = !(raw.readonly
        || raw.property_type.has_custom_editor()
        || !raw.choices.is_empty()
        || raw.name == TRACK_LABEL);

    DisplayRow {
        label: ctx.locale.translate(&raw.name),
        text: display_text(raw, ctx),
        background,
        swatch: raw.swatch(),
        icon,
        editable,
    }
}

fn display_text(raw: &RawProperty, ctx: &ProjectionContext) -> String {
    if let Some(choice) = raw.selected_choice() {
        return ctx.locale.translate(&choice.name);
    }

    match raw.property_type {
        PropertyType::String | PropertyType::Font | PropertyType::Caption => raw.memo.clone(),
        PropertyType::Bool => {
            if raw.is_blank() {
                String::new()
            } else {
                ctx.locale.bool_label(raw.truthy())
            }
        }
        PropertyType::Color => String::new(),
        PropertyType::Reader => reader_file_name(&raw.memo),
        PropertyType::Int if raw.name == TRACK_LABEL => match raw.value.as_i64() {
            Some(number) => track_name(number, ctx),
            None => String::new(),
        },
        PropertyType::Int => match &raw.value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => ctx.locale.format_int(i),
                None => n
                    .as_f64()
                    .map(|f| ctx.locale.format_int(f as i64))
                    .unwrap_or_default(),
            },
            _ => String::new(),
        },
        PropertyType::Float => match raw.numeric_value() {
            Some(value) if !raw.is_blank() => ctx.locale.format_fixed(value, 3),
            _ => String::new(),
        },
    }
}

/// Base name of the `path` in a reader memo. A malformed memo reads as
/// `/`, which has no name.
fn reader_file_name(memo: &str) -> String {
    let reader: Value = serde_json::from_str(if memo.is_empty() { "{}" } else { memo })
        .unwrap_or(Value::Null);
    let path = reader.get("path").and_then(Value::as_str).unwrap_or("/");
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Label of the track with `number`, or its position counted from the top.
fn track_name(number: i64, ctx: &ProjectionContext) -> String {
    let mut tracks: Vec<&TrackInfo> = ctx.tracks.iter().collect();
    tracks.sort_by_key(|t| std::cmp::Reverse(t.number));

    let mut display_count = tracks.len();
    for track in tracks {
        if track.number == number {
            if !track.label.is_empty() {
                return track.label.clone();
            }
            break;
        }
        display_count -= 1;
    }
    format!("{} {}", ctx.locale.translate(TRACK_LABEL), display_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::property::{ChannelRecord, Choice};
    use serde_json::json;

    fn ctx<'a>(locale: &'a Locale, tracks: &'a [TrackInfo]) -> ProjectionContext<'a> {
        ProjectionContext { locale, tracks }
    }

    #[test]
    fn keyframed_float_is_highlighted_with_icon() {
        let locale = Locale::default();
        let mut raw = RawProperty::new("Alpha", PropertyType::Float, json!(0.5));
        raw.points = 2;
        raw.keyframe = true;
        raw.interpolation = 1;
        let row = project_property(&raw, &ctx(&locale, &[]));
        assert_eq!(row.text, "0.500");
        assert_eq!(row.background, BackgroundHint::Keyframed);
        assert_eq!(row.icon, Some(Interpolation::Linear));
        assert!(row.editable);

        raw.keyframe = false;
        let row = project_property(&raw, &ctx(&locale, &[]));
        assert_eq!(row.background, BackgroundHint::Interpolated);

        raw.points = 1;
        let row = project_property(&raw, &ctx(&locale, &[]));
        assert_eq!(row.background, BackgroundHint::None);
        assert_eq!(row.icon, None);
    }

    #[test]
    fn selected_choice_wins_over_value() {
        let locale = Locale::default();
        let mut raw = RawProperty::new("Gravity", PropertyType::Int, json!(4));
        raw.choices = vec![
            Choice { name: "Top Left".into(), value: json!(0), selected: false },
            Choice { name: "Center".into(), value: json!(4), selected: true },
        ];
        let row = project_property(&raw, &ctx(&locale, &[]));
        assert_eq!(row.text, "Center");
        assert!(!row.editable);
    }

    #[test]
    fn reader_shows_file_name() {
        let locale = Locale::default();
        let mut raw = RawProperty::new("Reader", PropertyType::Reader, json!(""));
        raw.memo = json!({"path": "/media/footage/intro.mp4"}).to_string();
        assert_eq!(project_property(&raw, &ctx(&locale, &[])).text, "intro.mp4");
        raw.memo = String::new();
        assert_eq!(project_property(&raw, &ctx(&locale, &[])).text, "");
    }

    #[test]
    fn track_falls_back_to_ordinal() {
        let locale = Locale::default();
        let tracks = vec![
            TrackInfo { number: 1000000, label: String::new() },
            TrackInfo { number: 2000000, label: "Titles".into() },
            TrackInfo { number: 3000000, label: String::new() },
        ];
        let mut raw = RawProperty::new(TRACK_LABEL, PropertyType::Int, json!(2000000));
        assert_eq!(project_property(&raw, &ctx(&locale, &tracks)).text, "Titles");
        raw.value = json!(1000000);
        assert_eq!(project_property(&raw, &ctx(&locale, &tracks)).text, "Track 1");
        raw.value = json!(3000000);
        assert_eq!(project_property(&raw, &ctx(&locale, &tracks)).text, "Track 3");
    }

    #[test]
    fn color_has_swatch_and_no_text() {
        let locale = Locale::default();
        let mut raw = RawProperty::new("Color", PropertyType::Color, json!(0));
        raw.red = Some(ChannelRecord { value: 255.0 });
        raw.green = Some(ChannelRecord { value: 0.0 });
        raw.blue = Some(ChannelRecord { value: 0.0 });
        let row = project_property(&raw, &ctx(&locale, &[]));
        assert_eq!(row.text, "");
        assert_eq!(row.swatch, Some(Rgba::new(255, 0, 0, 255)));
        assert!(!row.editable);
    }

    #[test]
    fn blank_float_shows_nothing() {
        let locale = Locale::default();
        let raw = RawProperty::new("Alpha", PropertyType::Float, json!(""));
        assert_eq!(project_property(&raw, &ctx(&locale, &[])).text, "");
    }
}
