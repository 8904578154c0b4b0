// src/core/handler/mod.rs

//! Routing of decoded messages to their type-specific handlers.

pub mod command;
pub mod dispatcher;
pub mod login;

pub use dispatcher::{Dispatcher, Inbound};

use crate::core::MudstoneError;
use crate::core::protocol::{MessageKind, Room};
use crate::core::state::{Connection, ServerState};
use std::sync::Arc;

/// Builds the player's current room message and sends it on the given
/// connection. Shared by the login flow and the LOOK/MOVE commands.
pub(crate) async fn send_room(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    player: &str,
) -> Result<(), MudstoneError> {
    let view = state.world.room_of(player).await?;
    let others = state.world.players_in_room_with(player).await?;
    let room = Room {
        title: view.title,
        description: view.description,
        exits: view.exits,
        players: others
            .into_iter()
            .map(|name| format!("{name} is here!"))
            .collect(),
        mobs: Vec::new(),
        items: Vec::new(),
    };
    conn.send_message(MessageKind::Room, &room).await
}
