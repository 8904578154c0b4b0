// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::registry::ConnectionRegistry;
use super::stats::StatsState;
use crate::config::Config;
use crate::core::world::WorldStore;
use std::sync::Arc;

/// The central struct holding all shared, server-wide state.
/// This struct is wrapped in an `Arc` and passed to every task and connection
/// handler, providing a single source of truth for the server's configuration
/// and dynamic state.
pub struct ServerState {
    /// The set of all live connections, keyed by connection id.
    pub registry: ConnectionRegistry,
    /// The world-state collaborator the gameplay handlers talk to.
    pub world: Arc<dyn WorldStore>,
    /// The server's runtime configuration, fixed at startup.
    pub config: Config,
    /// Holds all server-wide statistics.
    pub stats: StatsState,
}

impl ServerState {
    /// Assembles the shared server state from its parts.
    pub fn new(config: Config, world: Arc<dyn WorldStore>) -> Arc<Self> {
        Arc::new(Self {
            registry: ConnectionRegistry::new(),
            world,
            config,
            stats: StatsState::new(),
        })
    }
}
