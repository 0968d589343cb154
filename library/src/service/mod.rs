pub mod debounce;
pub mod dispatcher;
pub mod engine;
pub mod handlers;
pub mod memory;
pub mod properties_model;
pub mod schema;
pub mod updates;

pub use dispatcher::{ChangeDispatcher, EditorEvent, PendingChange};
pub use engine::ProjectEngine;
pub use memory::MemoryProject;
pub use properties_model::{EditReport, PropertiesModel, PropertyRow, ValueInput};
pub use updates::{ActionType, Subscription, UpdateAction, UpdateHub};
