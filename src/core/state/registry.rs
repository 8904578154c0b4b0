// src/core/state/registry.rs

//! Connection bookkeeping: the per-connection handle and the shared registry.

use crate::core::MudstoneError;
use crate::core::protocol::{Frame, MessageKind};
use bytes::Bytes;
use dashmap::DashMap;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// Unique identifier assigned to each accepted connection.
pub type ConnectionId = u64;

/// A live client connection as seen by the rest of the server.
///
/// The handle owns the enqueue side of the outbound queue and the kill
/// channel; the transport itself lives inside the connection's read and
/// write tasks. Cloned freely behind an `Arc`.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    addr: SocketAddr,
    outbound: mpsc::Sender<Bytes>,
    kill_tx: broadcast::Sender<()>,
    torn_down: AtomicBool,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        addr: SocketAddr,
        outbound: mpsc::Sender<Bytes>,
        kill_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            id,
            addr,
            outbound,
            kill_tx,
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Enqueues already-encoded bytes, waiting while the queue is full. Fails
    /// only when the writer task is gone, which makes the connection dead.
    pub async fn send_bytes(&self, bytes: Bytes) -> Result<(), MudstoneError> {
        self.outbound
            .send(bytes)
            .await
            .map_err(|_| MudstoneError::QueueClosed)
    }

    /// Encodes a frame and enqueues it.
    pub async fn send_frame(&self, frame: &Frame) -> Result<(), MudstoneError> {
        self.send_bytes(frame.encode_to_bytes()?).await
    }

    /// Serializes a payload into a frame of the given kind and enqueues it.
    pub async fn send_message<T: Serialize>(
        &self,
        kind: MessageKind,
        payload: &T,
    ) -> Result<(), MudstoneError> {
        self.send_frame(&Frame::from_payload(kind, payload)?).await
    }

    /// Signals the connection's tasks to stop. Safe to call from any path;
    /// the read loop observes it and drives the single teardown sequence.
    pub fn kill(&self) {
        let _ = self.kill_tx.send(());
    }

    pub fn kill_listener(&self) -> broadcast::Receiver<()> {
        self.kill_tx.subscribe()
    }

    /// Claims the one-time teardown notification. Returns `true` for exactly
    /// one caller per connection, even when the read and write failure paths
    /// race.
    pub fn claim_teardown(&self) -> bool {
        !self.torn_down.swap(true, Ordering::SeqCst)
    }
}

/// The set of currently live connections, keyed by connection id.
///
/// Mutated concurrently by the accept path and every connection's failure
/// path; `DashMap` keeps each operation atomic with no partial-update window.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn insert(&self, conn: Arc<Connection>) {
        self.connections.insert(conn.id(), conn);
    }

    /// Removes a connection. Idempotent: removing an id that is already gone
    /// returns `None` and is not an error.
    pub fn remove(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.remove(&id).map(|(_, conn)| conn)
    }

    pub fn get(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(&id).map(|entry| entry.value().clone())
    }

    /// A point-in-time copy of the live connection set, for iteration that
    /// must not race with concurrent add/remove.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Sends the same encoded bytes to every connection in a snapshot taken
    /// at call time. A connection that disappears mid-broadcast is skipped;
    /// returns how many deliveries were enqueued.
    pub async fn broadcast(&self, bytes: &Bytes) -> usize {
        let mut delivered = 0;
        for conn in self.snapshot() {
            match conn.send_bytes(bytes.clone()).await {
                Ok(()) => delivered += 1,
                Err(_) => {
                    debug!(
                        "Skipping broadcast to connection {}: outbound queue closed",
                        conn.id()
                    );
                }
            }
        }
        delivered
    }
}
