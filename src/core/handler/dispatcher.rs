// src/core/handler/dispatcher.rs

//! The central component for routing decoded messages to their handlers.
//!
//! The dispatcher consumes either a complete inbound frame or the distinct
//! disconnect sentinel the transport layer emits when a connection ends.
//! Application-level handler failures are converted into a `ServerMessage`
//! reply to the originating connection here, at the dispatch boundary, so a
//! bad command never costs a player their connection. Transport and protocol
//! failures propagate to the caller, which tears the connection down.

use super::{command, login};
use crate::core::MudstoneError;
use crate::core::protocol::{ClientMessage, Frame, HEARTBEAT_BYTES, MessageKind, ServerMessage};
use crate::core::state::{Connection, ServerState};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the transport layer hands to the dispatcher. The disconnect sentinel
/// is deliberately a distinct variant rather than a message with kind `0`;
/// kind `0` is only ever the heartbeat.
#[derive(Debug)]
pub enum Inbound {
    Frame(Frame),
    Disconnected,
}

/// Routes decoded messages for one server; shared by all connections.
pub struct Dispatcher {
    state: Arc<ServerState>,
}

impl Dispatcher {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Dispatches one inbound event for a connection. An `Err` return is
    /// connection-fatal; recoverable failures have already been answered.
    pub async fn dispatch(
        &self,
        conn: &Arc<Connection>,
        inbound: Inbound,
    ) -> Result<(), MudstoneError> {
        match inbound {
            Inbound::Disconnected => {
                self.handle_disconnect(conn).await;
                Ok(())
            }
            Inbound::Frame(frame) => {
                let message = ClientMessage::try_from(&frame)?;
                match self.route(conn, message).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.is_connection_fatal() => Err(e),
                    Err(e) => {
                        // Application-level failure: answer the sender and
                        // keep the connection open.
                        debug!(
                            "Connection {}: replying to application error: {}",
                            conn.id(),
                            e
                        );
                        conn.send_message(
                            MessageKind::ServerMessage,
                            &ServerMessage::console(e.to_string()),
                        )
                        .await
                    }
                }
            }
        }
    }

    async fn route(
        &self,
        conn: &Arc<Connection>,
        message: ClientMessage,
    ) -> Result<(), MudstoneError> {
        match message {
            ClientMessage::Heartbeat => {
                // Keepalive echo: an inbound heartbeat is answered in kind.
                conn.send_bytes(HEARTBEAT_BYTES.clone()).await
            }
            ClientMessage::Login(payload) => login::handle(&self.state, conn, payload).await,
            ClientMessage::Command(payload) => command::handle(&self.state, conn, payload).await,
            ClientMessage::Error => {
                warn!("Connection {} reported a client-side error", conn.id());
                Ok(())
            }
            ClientMessage::Unhandled(kind) => {
                debug!(
                    "Connection {}: ignoring unhandled message kind {kind:?}",
                    conn.id()
                );
                Ok(())
            }
            ClientMessage::Unknown(code) => {
                debug!(
                    "Connection {}: ignoring unknown message kind {code}",
                    conn.id()
                );
                Ok(())
            }
        }
    }

    /// Performs the one-time external cleanup for a finished connection.
    /// Safe to call from racing paths; only the first caller acts.
    async fn handle_disconnect(&self, conn: &Arc<Connection>) {
        if !conn.claim_teardown() {
            return;
        }
        match self.state.world.clear_session(conn.id()).await {
            Ok(Some(name)) => info!("{} has left the world", name),
            Ok(None) => {}
            Err(e) => warn!(
                "Failed to clear session for connection {}: {}",
                conn.id(),
                e
            ),
        }
    }
}
