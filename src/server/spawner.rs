// src/server/spawner.rs

//! Spawns the server's long-running background tasks.

use super::context::ServerContext;
use crate::core::tasks::heartbeat::HeartbeatTask;
use tracing::info;

/// Spawns all background tasks into the context's JoinSet.
pub fn spawn_all(ctx: &mut ServerContext) {
    let heartbeat = HeartbeatTask::new(ctx.state.clone());
    let shutdown_rx_heartbeat = ctx.shutdown_tx.subscribe();
    ctx.background_tasks.spawn(async move {
        heartbeat.run(shutdown_rx_heartbeat).await;
        Ok(())
    });

    info!("All background tasks have been spawned.");
}
