pub mod defaults;
pub mod keyframe_editor;

pub use defaults::{ScaleLimits, default_value_for};
pub use keyframe_editor::{
    ColorIntent, EditIntent, apply_edit, edit_color, edit_curve, move_point, remove_point,
};
