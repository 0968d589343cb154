pub mod color;
pub mod keyframe;
pub mod object;
pub mod point;
pub mod property;

pub use color::{ColorChannel, Rgba};
pub use keyframe::Keyframe;
pub use object::{ClipTiming, Fraction, ObjectKind, ObjectRef, TrackInfo};
pub use point::{Coordinate, Point};
pub use property::{PropertyType, RawProperty, RawPropertyMap};
