pub mod keyframe_handler;

pub use keyframe_handler::{KeyframeHandler, PropertyTarget};

use crate::error::LibraryError;
use crate::service::engine::ProjectEngine;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquire a write lock on the project, converting poison errors to LibraryError.
pub fn write_project<E: ProjectEngine>(
    project: &Arc<RwLock<E>>,
) -> Result<RwLockWriteGuard<'_, E>, LibraryError> {
    project
        .write()
        .map_err(|_| LibraryError::Runtime("Lock Poisoned".to_string()))
}

/// Acquire a read lock on the project, converting poison errors to LibraryError.
pub fn read_project<E: ProjectEngine>(
    project: &Arc<RwLock<E>>,
) -> Result<RwLockReadGuard<'_, E>, LibraryError> {
    project
        .read()
        .map_err(|_| LibraryError::Runtime("Lock Poisoned".to_string()))
}
