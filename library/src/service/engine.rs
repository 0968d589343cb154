use serde_json::{Map, Value};

use crate::error::LibraryError;
use crate::model::object::{ClipTiming, Fraction, ObjectRef, TrackInfo};

/// What the properties core needs from the timeline engine that owns the
/// project.
///
/// Documents are the persisted JSON form of clips, transitions and effects.
/// The engine is their only durable store; everything this crate builds from
/// them is a transient projection.
pub trait ProjectEngine {
    /// Persisted document of an object, or `None` if it no longer exists.
    fn lookup(&self, target: &ObjectRef) -> Option<Map<String, Value>>;

    /// Raw property records of an object at a frame (1-based).
    fn properties_at(&self, target: &ObjectRef, frame: i64) -> Option<Map<String, Value>>;

    /// Saves a partial document: every top-level key of `partial` replaces
    /// the same key of the stored document.
    fn persist(&mut self, target: &ObjectRef, partial: Map<String, Value>) -> Result<(), LibraryError>;

    /// Placement of a clip or transition on the timeline.
    fn timing(&self, target: &ObjectRef) -> Option<ClipTiming>;

    /// Clip that owns an effect.
    fn parent_clip(&self, effect: &ObjectRef) -> Option<ObjectRef>;

    fn frame_rate(&self) -> Fraction;

    fn frame_size(&self) -> (u32, u32);

    fn tracks(&self) -> Vec<TrackInfo>;

    /// Reader document describing the media file at `path`.
    fn open_reader(&self, path: &str) -> Result<Value, LibraryError>;
}
