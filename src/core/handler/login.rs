// src/core/handler/login.rs

//! Handles login messages for both existing characters and new-character
//! creation. A successful login binds the player to the connection and
//! answers with an acknowledgement followed by the current room.

use super::send_room;
use crate::core::MudstoneError;
use crate::core::protocol::{Ack, AckKind, Login, LoginType, MessageKind, ServerMessage};
use crate::core::state::{Connection, ServerState};
use crate::core::world::WorldError;
use std::sync::Arc;
use tracing::{debug, info};

pub async fn handle(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    login: Login,
) -> Result<(), MudstoneError> {
    match login.login_type {
        LoginType::Existing => existing(state, conn, login).await,
        LoginType::New => create(state, conn, login).await,
    }
}

async fn existing(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    login: Login,
) -> Result<(), MudstoneError> {
    let player = match state.world.authenticate(&login.name, &login.hash).await {
        Ok(player) => player,
        Err(WorldError::NotFound) => {
            debug!("Connection {}: rejected login for {}", conn.id(), login.name);
            return conn
                .send_message(
                    MessageKind::ServerMessage,
                    &ServerMessage::popup("Invalid login."),
                )
                .await;
        }
        Err(e) => return Err(e.into()),
    };

    // Reject a second login for a character already attached to a live
    // connection.
    if let Some(existing_id) = state.world.connection_of(&player.name).await?
        && existing_id != conn.id()
        && state.registry.get(existing_id).is_some()
    {
        return conn
            .send_message(
                MessageKind::ServerMessage,
                &ServerMessage::popup("That character is currently in use."),
            )
            .await;
    }

    admit(state, conn, &player.name).await
}

async fn create(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    login: Login,
) -> Result<(), MudstoneError> {
    match state.world.create_character(&login.name, &login.hash).await {
        Ok(_) => {}
        Err(WorldError::Conflict(_)) => {
            return conn
                .send_message(
                    MessageKind::ServerMessage,
                    &ServerMessage::popup("A character already exists by that name."),
                )
                .await;
        }
        Err(e) => return Err(e.into()),
    }

    admit(state, conn, &login.name).await
}

/// Binds the session and sends the login acknowledgement plus the player's
/// starting room, in that order.
async fn admit(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    name: &str,
) -> Result<(), MudstoneError> {
    state.world.bind_session(name, conn.id()).await?;
    info!("{} has entered the world", name);

    conn.send_message(
        MessageKind::Ack,
        &Ack {
            kind: AckKind::Login,
        },
    )
    .await?;
    send_room(state, conn, name).await
}
