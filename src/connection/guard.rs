// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::state::{Connection, ServerState};
use std::sync::Arc;
use tracing::debug;

/// An RAII guard to ensure connection resources are always cleaned up when a
/// connection's read task exits, whatever path it took out of its loop.
pub struct ConnectionGuard {
    state: Arc<ServerState>,
    conn: Arc<Connection>,
}

impl ConnectionGuard {
    pub(crate) fn new(state: Arc<ServerState>, conn: Arc<Connection>) -> Self {
        Self { state, conn }
    }
}

impl Drop for ConnectionGuard {
    /// Removes the connection from the registry. Removal is idempotent, so a
    /// connection already evicted elsewhere is not an error.
    fn drop(&mut self) {
        self.state.stats.decrement_connected_clients();
        debug!(
            "ConnectionGuard dropping, cleaning up resources for connection {} ({})",
            self.conn.id(),
            self.conn.addr()
        );
        if self.state.registry.remove(self.conn.id()).is_none() {
            debug!(
                "Connection {} was not in the registry upon cleanup.",
                self.conn.id()
            );
        }
    }
}
