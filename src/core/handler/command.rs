// src/core/handler/command.rs

//! Processes client-issued gameplay commands: movement, chat, player
//! bookkeeping. Every handler talks to the world through the `WorldStore`
//! contract and answers through the sender's (or a recipient's) writer.

use super::send_room;
use crate::core::MudstoneError;
use crate::core::protocol::{
    Command, CommandType, Frame, MessageKind, ServerMessage, Who,
};
use crate::core::state::{Connection, ServerState};
use crate::core::world::{IgnoreKind, WorldError};
use std::sync::Arc;
use tracing::debug;

pub async fn handle(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    command: Command,
) -> Result<(), MudstoneError> {
    let Some(name) = state.world.session_player(conn.id()).await? else {
        return Err(MudstoneError::NotLoggedIn);
    };

    match command.command_type {
        CommandType::Look => send_room(state, conn, &name).await,
        CommandType::Move => move_player(state, conn, &name, &command.arguments).await,
        CommandType::Who => who(state, conn).await,
        CommandType::Say => say(state, conn, &name, &command.arguments).await,
        CommandType::Tell => tell(state, conn, &name, &command.arguments).await,
        CommandType::Ooc => ooc(state, conn, &name, &command.arguments).await,
        CommandType::Ignore => ignore(state, conn, &name, &command.arguments).await,
        CommandType::Quit => quit(state, conn).await,
        other => {
            debug!("Connection {}: command {other:?} not implemented", conn.id());
            Ok(())
        }
    }
}

async fn move_player(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    name: &str,
    direction: &str,
) -> Result<(), MudstoneError> {
    match state.world.move_towards(name, direction.trim()).await {
        Ok(_) => send_room(state, conn, name).await,
        Err(WorldError::InvalidDirection | WorldError::NotFound) => {
            conn.send_message(
                MessageKind::ServerMessage,
                &ServerMessage::console("You cannot move in that direction."),
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

async fn who(state: &Arc<ServerState>, conn: &Arc<Connection>) -> Result<(), MudstoneError> {
    let players = state.world.list_online().await?;
    conn.send_message(MessageKind::Who, &Who { players }).await
}

async fn say(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    name: &str,
    text: &str,
) -> Result<(), MudstoneError> {
    // One encode, many sends: every listener gets identical bytes.
    let heard = Frame::from_payload(
        MessageKind::ServerMessage,
        &ServerMessage::console(format!("{name} says, \"{text}\"")),
    )?
    .encode_to_bytes()?;

    for other in state.world.players_in_room_with(name).await? {
        if let Some(id) = state.world.connection_of(&other).await?
            && let Some(target) = state.registry.get(id)
            && target.send_bytes(heard.clone()).await.is_err()
        {
            debug!("Dropping say delivery to {other}: connection is closing");
        }
    }

    conn.send_message(
        MessageKind::ServerMessage,
        &ServerMessage::console(format!("You say, \"{text}\"")),
    )
    .await
}

async fn tell(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    name: &str,
    arguments: &str,
) -> Result<(), MudstoneError> {
    // The first word is the recipient; the rest is the message.
    let mut parts = arguments.splitn(2, ' ');
    let target = parts.next().unwrap_or_default().trim();
    let text = parts.next().unwrap_or_default().trim();
    if target.is_empty() || text.is_empty() {
        return Err(MudstoneError::BadArguments("Tell whom what?".to_string()));
    }

    if state.world.ignoring(target, IgnoreKind::Tells).await? {
        return conn
            .send_message(
                MessageKind::ServerMessage,
                &ServerMessage::console(format!(
                    "{target} is not accepting tells right now."
                )),
            )
            .await;
    }

    let delivered = match state.world.connection_of(target).await? {
        Some(id) => match state.registry.get(id) {
            Some(recipient) => recipient
                .send_message(
                    MessageKind::ServerMessage,
                    &ServerMessage::console(format!("{name} tells you, \"{text}\"")),
                )
                .await
                .is_ok(),
            None => false,
        },
        None => false,
    };

    // Confirm to the sender only after the tell actually went out.
    if delivered {
        conn.send_message(
            MessageKind::ServerMessage,
            &ServerMessage::console(format!("You tell {target}, \"{text}\"")),
        )
        .await
    } else {
        conn.send_message(
            MessageKind::ServerMessage,
            &ServerMessage::console(format!("{target} is not here right now.")),
        )
        .await
    }
}

async fn ooc(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    name: &str,
    text: &str,
) -> Result<(), MudstoneError> {
    let heard = Frame::from_payload(
        MessageKind::ServerMessage,
        &ServerMessage::console(format!("{name} says, out of character, \"{text}\"")),
    )?
    .encode_to_bytes()?;

    for peer in state.registry.snapshot() {
        if peer.id() == conn.id() {
            continue;
        }
        // Only logged-in peers who have not muted global chat hear it.
        let Some(peer_name) = state.world.session_player(peer.id()).await? else {
            continue;
        };
        if state.world.ignoring(&peer_name, IgnoreKind::Ooc).await? {
            continue;
        }
        if peer.send_bytes(heard.clone()).await.is_err() {
            debug!("Dropping ooc delivery to {peer_name}: connection is closing");
        }
    }

    conn.send_message(
        MessageKind::ServerMessage,
        &ServerMessage::console(format!("You say, out of character, \"{text}\"")),
    )
    .await
}

async fn ignore(
    state: &Arc<ServerState>,
    conn: &Arc<Connection>,
    name: &str,
    arguments: &str,
) -> Result<(), MudstoneError> {
    let mut parts = arguments.split_whitespace();
    let kind = match parts.next() {
        Some("tells") => IgnoreKind::Tells,
        Some("ooc") => IgnoreKind::Ooc,
        _ => return Err(MudstoneError::BadArguments("You can't ignore that.".to_string())),
    };
    let value = match parts.next() {
        Some("true") => true,
        Some("false") => false,
        _ => return Err(MudstoneError::BadArguments("You can't ignore that.".to_string())),
    };

    state.world.set_ignore_flag(name, kind, value).await?;

    let what = match kind {
        IgnoreKind::Tells => "tells",
        IgnoreKind::Ooc => "ooc",
    };
    let text = if value {
        format!("You are now ignoring {what}.")
    } else {
        format!("You are now listening to {what}.")
    };
    conn.send_message(MessageKind::ServerMessage, &ServerMessage::console(text))
        .await
}

/// Cleanly disconnects the client: clears the session binding first so the
/// disconnect sentinel finds nothing left to do, then stops the connection's
/// tasks.
async fn quit(state: &Arc<ServerState>, conn: &Arc<Connection>) -> Result<(), MudstoneError> {
    if conn.claim_teardown()
        && let Ok(Some(name)) = state.world.clear_session(conn.id()).await
    {
        debug!("{} quit", name);
    }
    conn.kill();
    Ok(())
}
