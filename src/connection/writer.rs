// src/connection/writer.rs

//! The serialized outbound half of a connection.

use crate::core::state::Connection;
use bytes::Bytes;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// Drains a connection's outbound queue, writing one message at a time and
/// waiting for each write to complete before starting the next. This is the
/// only task that touches the write half, so bytes from concurrent producers
/// can never interleave on the wire.
pub struct WriterTask<W> {
    conn: Arc<Connection>,
    sink: W,
    rx: mpsc::Receiver<Bytes>,
    kill_rx: broadcast::Receiver<()>,
}

impl<W: AsyncWrite + Unpin + Send + 'static> WriterTask<W> {
    pub fn new(conn: Arc<Connection>, sink: W, rx: mpsc::Receiver<Bytes>) -> Self {
        let kill_rx = conn.kill_listener();
        Self {
            conn,
            sink,
            rx,
            kill_rx,
        }
    }

    /// Runs until the connection is killed, the queue closes, or a write
    /// fails. A write failure wakes the read side so the connection tears
    /// down once, through the normal path. Dropping the sink on exit closes
    /// the socket's write half.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.kill_rx.recv() => break,
                maybe_bytes = self.rx.recv() => {
                    let Some(bytes) = maybe_bytes else { break };
                    if let Err(e) = self.write_one(&bytes).await {
                        warn!(
                            "Write failed on connection {} ({}): {}",
                            self.conn.id(),
                            self.conn.addr(),
                            e
                        );
                        self.conn.kill();
                        break;
                    }
                }
            }
        }
        debug!("Writer for connection {} finished", self.conn.id());
    }

    async fn write_one(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.sink.write_all(bytes).await?;
        self.sink.flush().await
    }
}
