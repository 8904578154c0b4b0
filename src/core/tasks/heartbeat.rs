// src/core/tasks/heartbeat.rs

//! Periodic liveness traffic: a fixed-tick scheduler that broadcasts the
//! pre-built heartbeat message to every live connection every Nth tick.

use crate::core::protocol::HEARTBEAT_BYTES;
use crate::core::state::ServerState;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// A task responsible for driving liveness traffic to all connections.
pub struct HeartbeatTask {
    state: Arc<ServerState>,
}

impl HeartbeatTask {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Runs the main loop for the heartbeat scheduler until shutdown.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let tick_interval = self.state.config.heartbeat.tick_interval;
        let ticks_per_beat = u64::from(self.state.config.heartbeat.ticks_per_beat);

        info!(
            "Heartbeat scheduler started. Tick: {:?}, beat every {} ticks.",
            tick_interval, ticks_per_beat
        );
        let mut interval = tokio::time::interval(tick_interval);
        let mut tick_count: u64 = 0;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tick_count = tick_count.wrapping_add(1);
                    if tick_count % ticks_per_beat != 0 {
                        continue;
                    }
                    let delivered = self.state.registry.broadcast(&HEARTBEAT_BYTES).await;
                    if delivered > 0 {
                        debug!("Sent heartbeat to {} connections", delivered);
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Heartbeat scheduler shutting down.");
                    return;
                }
            }
        }
    }
}
