use thiserror::Error;

use crate::model::object::ObjectRef;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Cannot parse '{input}' as {expected} for property {property}")]
    Parse {
        property: String,
        input: String,
        expected: &'static str,
    },
    #[error("{0} no longer exists")]
    MissingObject(ObjectRef),
    #[error("{object} has no overlay data for object {overlay_id}")]
    MissingOverlayData {
        object: ObjectRef,
        overlay_id: String,
    },
    #[error("Project error: {0}")]
    Project(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Runtime error: {0}")]
    Runtime(String),
}
