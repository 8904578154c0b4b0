// src/core/state/stats.rs

//! Contains state definitions and logic for server statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Holds all state and logic related to server-wide statistics and monitoring.
#[derive(Debug, Default)]
pub struct StatsState {
    /// The total number of connections accepted by the server since startup.
    total_connections: AtomicU64,
    /// The total number of messages dispatched by the server since startup.
    total_messages: AtomicU64,
    /// The number of currently connected clients.
    connected_clients: AtomicU64,
}

impl StatsState {
    /// Creates a new `StatsState` with initialized counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically increments the total number of connections received.
    pub fn increment_total_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.connected_clients.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the total number of connections received.
    pub fn get_total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Atomically increments the total number of messages dispatched.
    pub fn increment_total_messages(&self) {
        self.total_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the total number of messages dispatched.
    pub fn get_total_messages(&self) -> u64 {
        self.total_messages.load(Ordering::Relaxed)
    }

    /// Atomically decrements the connected client count on teardown.
    pub fn decrement_connected_clients(&self) {
        self.connected_clients.fetch_sub(1, Ordering::Relaxed);
    }

    /// Gets the number of currently connected clients.
    pub fn get_connected_clients(&self) -> u64 {
        self.connected_clients.load(Ordering::Relaxed)
    }
}
