// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a
//! client connection.

use super::guard::ConnectionGuard;
use super::writer::WriterTask;
use crate::core::MudstoneError;
use crate::core::handler::{Dispatcher, Inbound};
use crate::core::protocol::FrameCodec;
use crate::core::state::{Connection, ConnectionId, ServerState};
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::{broadcast, mpsc};
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

/// Drives one connection's inbound path: framed reads feeding the dispatcher,
/// with shutdown signals racing the stream. The matching writer task is
/// spawned at accept time and owns the write half.
pub struct ConnectionHandler {
    conn: Arc<Connection>,
    state: Arc<ServerState>,
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    global_shutdown_rx: broadcast::Receiver<()>,
    kill_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    /// Splits the socket, registers the connection, and spawns its writer
    /// task. The returned handler is ready to `run`.
    pub fn accept(
        socket: TcpStream,
        addr: SocketAddr,
        state: Arc<ServerState>,
        id: ConnectionId,
        global_shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let (read_half, write_half) = socket.into_split();
        let (outbound_tx, outbound_rx) = mpsc::channel(state.config.outbound_queue_depth);
        let (kill_tx, _) = broadcast::channel(1);

        let conn = Arc::new(Connection::new(id, addr, outbound_tx, kill_tx));
        let kill_rx = conn.kill_listener();
        state.registry.insert(conn.clone());

        tokio::spawn(WriterTask::new(conn.clone(), write_half, outbound_rx).run());

        Self {
            conn,
            state,
            reader: FramedRead::new(read_half, FrameCodec::new()),
            global_shutdown_rx,
            kill_rx,
        }
    }

    /// The main event loop for the connection, handling incoming frames and
    /// signals. Every exit path converges on a single disconnect dispatch
    /// followed by the guard's registry cleanup.
    pub async fn run(mut self) {
        let guard = ConnectionGuard::new(self.state.clone(), self.conn.clone());
        let dispatcher = Dispatcher::new(self.state.clone());

        'main_loop: loop {
            tokio::select! {
                // Prioritize shutdown signals over other events.
                biased;
                _ = self.global_shutdown_rx.recv() => {
                    info!(
                        "Connection handler for {} received global shutdown signal.",
                        self.conn.addr()
                    );
                    break 'main_loop;
                }
                _ = self.kill_rx.recv() => {
                    debug!(
                        "Connection handler for {} received kill signal.",
                        self.conn.addr()
                    );
                    break 'main_loop;
                }
                result = self.reader.next() => {
                    match result {
                        Some(Ok(frame)) => {
                            self.state.stats.increment_total_messages();
                            if let Err(e) = dispatcher
                                .dispatch(&self.conn, Inbound::Frame(frame))
                                .await
                            {
                                warn!(
                                    "Connection {} terminated: {}",
                                    self.conn.addr(),
                                    e
                                );
                                break 'main_loop;
                            }
                        }
                        Some(Err(e)) => {
                            if is_normal_disconnect(&e) {
                                debug!(
                                    "Connection from {} closed by peer: {}",
                                    self.conn.addr(),
                                    e
                                );
                            } else {
                                warn!("Connection error for {}: {}", self.conn.addr(), e);
                            }
                            break 'main_loop;
                        }
                        None => {
                            // Zero-length read: the peer is gone.
                            debug!("Connection from {} closed by peer.", self.conn.addr());
                            break 'main_loop;
                        }
                    }
                }
            }
        }

        // Stop the writer so the socket actually closes, then deliver the one
        // disconnect notification; the dispatcher's teardown claim makes
        // racing paths safe.
        self.conn.kill();
        if let Err(e) = dispatcher.dispatch(&self.conn, Inbound::Disconnected).await {
            warn!(
                "Disconnect cleanup failed for {}: {}",
                self.conn.addr(),
                e
            );
        }
        drop(guard);
    }
}

/// Helper function to check for non-critical disconnection errors.
fn is_normal_disconnect(e: &MudstoneError) -> bool {
    matches!(e, MudstoneError::Io(arc_err) if matches!(
        arc_err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    ))
}
