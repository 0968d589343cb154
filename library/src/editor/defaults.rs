//! Type-specific fallbacks and limits applied while editing curves.

use crate::model::color::ColorChannel;

/// Keys whose values are clamped to a project-size dependent range.
pub const CLAMPED_KEYS: [&str; 4] = ["scale_x", "scale_y", "shear_x", "shear_y"];

/// Value restored when the last point of a curve is removed.
pub fn default_value_for(property_key: &str, channel: Option<ColorChannel>) -> f64 {
    match property_key {
        "alpha" | "scale_x" | "scale_y" | "time" | "volume" => 1.0,
        "origin_x" | "origin_y" => 0.5,
        "location_x" | "location_y" | "rotation" | "shear_x" | "shear_y" => 0.0,
        "has_audio" | "has_video" | "channel_filter" | "channel_mapping" => -1.0,
        "wave_color" => match channel {
            Some(ColorChannel::Blue) => 255.0,
            Some(ColorChannel::Green) => 123.0,
            _ => 0.0,
        },
        _ => 0.0,
    }
}

/// Limits for scale and shear values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLimits {
    pub max_multiple: f64,
    pub svg_max_multiple: f64,
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self {
            max_multiple: 50.0,
            svg_max_multiple: 15.0,
        }
    }
}

impl ScaleLimits {
    /// Largest magnitude allowed for a clamped key in a project of the given
    /// size. Vector sources get a tighter bound.
    pub fn max_for(&self, frame_size: (u32, u32), is_svg: bool) -> f64 {
        let multiple = if is_svg {
            self.svg_max_multiple
        } else {
            self.max_multiple
        };
        let (width, height) = frame_size;
        if width > 0 && height > 0 {
            ((2000.0 * multiple) / width.max(height) as f64).round()
        } else {
            multiple
        }
    }

    /// Clamps `value` when `property_key` is a scale or shear key.
    /// Zero passes through unchanged.
    pub fn clamp(&self, property_key: &str, value: f64, frame_size: (u32, u32), is_svg: bool) -> f64 {
        if !CLAMPED_KEYS.contains(&property_key) || value == 0.0 {
            return value;
        }
        let max = self.max_for(frame_size, is_svg);
        value.clamp(-max, max)
    }
}

/// Whether a reader path points at an SVG file.
pub fn is_svg_path(path: &str) -> bool {
    path.to_lowercase().ends_with("svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_color_channels_have_fixed_defaults() {
        assert_eq!(default_value_for("wave_color", Some(ColorChannel::Red)), 0.0);
        assert_eq!(default_value_for("wave_color", Some(ColorChannel::Blue)), 255.0);
        assert_eq!(default_value_for("wave_color", Some(ColorChannel::Green)), 123.0);
    }

    #[test]
    fn table_defaults() {
        assert_eq!(default_value_for("volume", None), 1.0);
        assert_eq!(default_value_for("origin_y", None), 0.5);
        assert_eq!(default_value_for("shear_x", None), 0.0);
        assert_eq!(default_value_for("has_video", None), -1.0);
        assert_eq!(default_value_for("brightness", None), 0.0);
    }

    #[test]
    fn scale_clamp_depends_on_project_size() {
        let limits = ScaleLimits::default();
        assert_eq!(limits.clamp("scale_x", 1000.0, (1920, 1080), false), 52.0);
        assert_eq!(limits.clamp("shear_y", -1000.0, (1920, 1080), false), -52.0);
        assert_eq!(limits.clamp("scale_y", 1000.0, (1920, 1080), true), 16.0);
        assert_eq!(limits.clamp("scale_x", 1000.0, (0, 0), false), 50.0);
        assert_eq!(limits.clamp("alpha", 1000.0, (1920, 1080), false), 1000.0);
    }
}
