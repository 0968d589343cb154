pub mod animation;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod locale;
pub mod model;
pub mod projection;
pub mod service;
pub mod thumbnails;

pub use cli::run;
pub use error::LibraryError;
