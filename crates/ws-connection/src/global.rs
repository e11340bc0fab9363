//! Process-wide connection slot.
//!
//! Hosts that want a single shared connection install it once; a disposed
//! connection removes itself.

use crate::service::WebSocketConnection;
use parking_lot::{const_rwlock, RwLock};
use std::sync::Arc;

static CURRENT: RwLock<Option<Arc<WebSocketConnection>>> = const_rwlock(None);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a WebSocket connection is already installed")]
    AlreadyInstalled,
}

/// Install `connection` as the process-wide connection.
pub fn install(connection: Arc<WebSocketConnection>) -> Result<(), RegistryError> {
    let mut slot = CURRENT.write();
    if slot.is_some() {
        return Err(RegistryError::AlreadyInstalled);
    }
    *slot = Some(connection);
    Ok(())
}

/// The installed connection, if any.
pub fn current() -> Option<Arc<WebSocketConnection>> {
    CURRENT.read().clone()
}

/// Remove the installed connection, returning it.
pub fn clear() -> Option<Arc<WebSocketConnection>> {
    CURRENT.write().take()
}

pub(crate) fn clear_if_current(connection: &WebSocketConnection) {
    let mut slot = CURRENT.write();
    if slot
        .as_ref()
        .is_some_and(|installed| std::ptr::eq(Arc::as_ptr(installed), connection))
    {
        slot.take();
    }
}
