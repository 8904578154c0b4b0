// src/server/initialization.rs

//! Handles the server initialization process, from configuration to a bound
//! listener.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::state::ServerState;
use crate::core::world::{InMemoryWorld, WorldStore};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::info;

/// Initializes all server components before starting the main loop.
pub async fn setup(config: Config) -> Result<ServerContext> {
    let (shutdown_tx, _) = broadcast::channel(1);

    let world: Arc<dyn WorldStore> = Arc::new(InMemoryWorld::new());

    // Clear stale player/connection bindings so nobody shows as "already
    // logged in" after a restart.
    world
        .clear_all_sessions()
        .await
        .map_err(|e| anyhow!("Failed to reset world sessions: {e}"))?;

    let state = ServerState::new(config, world);
    info!("Server state initialized.");

    let listener = TcpListener::bind((state.config.host.as_str(), state.config.port)).await?;
    info!(
        "Mudstone server listening on {}:{}",
        state.config.host, state.config.port
    );

    Ok(ServerContext {
        state,
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}
