// src/core/protocol/message.rs

//! Typed messages layered over raw frames.
//!
//! Bodies are JSON objects with PascalCase keys and integer-encoded enums,
//! matching what every existing peer puts on the wire. The kind codes are
//! positional and must never be reordered.

use crate::core::MudstoneError;
use crate::core::protocol::frame::Frame;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Wire codes for the message kinds carried in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageKind {
    /// Header-only liveness message.
    Heartbeat = 0,
    /// Acknowledgement (carries an [`Ack`] payload).
    Ack = 1,
    /// Error indicator reported by the peer.
    Error = 2,
    /// Textual notification for console or popup display.
    ServerMessage = 3,
    /// Login request containing a [`Login`] payload.
    Login = 4,
    /// Gameplay command from client to server ([`Command`] payload).
    Command = 5,
    /// Room description payload.
    Room = 6,
    /// Who list payload containing active player names.
    Who = 7,
    /// Score information (reserved).
    Score = 8,
    /// Chat (tell) payload (reserved; chat is delivered as `ServerMessage`).
    Tell = 9,
}

impl MessageKind {
    /// Maps a raw header code to a kind, or `None` for codes this peer does
    /// not know about.
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0 => Self::Heartbeat,
            1 => Self::Ack,
            2 => Self::Error,
            3 => Self::ServerMessage,
            4 => Self::Login,
            5 => Self::Command,
            6 => Self::Room,
            7 => Self::Who,
            8 => Self::Score,
            9 => Self::Tell,
            _ => return None,
        })
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Whether a login attempts an existing character or creates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum LoginType {
    Existing = 0,
    New = 1,
}

impl From<LoginType> for u8 {
    fn from(value: LoginType) -> u8 {
        value as u8
    }
}

impl TryFrom<u8> for LoginType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(Self::Existing),
            1 => Ok(Self::New),
            other => Err(format!("unknown login type {other}")),
        }
    }
}

/// Gameplay command identifiers sent from client to server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CommandType {
    Look = 0,
    Move = 1,
    Score = 2,
    Inv = 3,
    Take = 4,
    Put = 5,
    Drop = 6,
    Equip = 7,
    Who = 8,
    Say = 9,
    Shout = 10,
    Tell = 11,
    Ooc = 12,
    Ignore = 13,
    Quit = 14,
}

impl From<CommandType> for u8 {
    fn from(value: CommandType) -> u8 {
        value as u8
    }
}

impl TryFrom<u8> for CommandType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        Ok(match value {
            0 => Self::Look,
            1 => Self::Move,
            2 => Self::Score,
            3 => Self::Inv,
            4 => Self::Take,
            5 => Self::Put,
            6 => Self::Drop,
            7 => Self::Equip,
            8 => Self::Who,
            9 => Self::Say,
            10 => Self::Shout,
            11 => Self::Tell,
            12 => Self::Ooc,
            13 => Self::Ignore,
            14 => Self::Quit,
            other => return Err(format!("unknown command type {other}")),
        })
    }
}

/// Distinguishes console-style notifications from modal popup alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ServerMessageKind {
    Console = 0,
    Popup = 1,
}

impl From<ServerMessageKind> for u8 {
    fn from(value: ServerMessageKind) -> u8 {
        value as u8
    }
}

impl TryFrom<u8> for ServerMessageKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(Self::Console),
            1 => Ok(Self::Popup),
            other => Err(format!("unknown server message type {other}")),
        }
    }
}

/// Acknowledgement subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AckKind {
    Login = 0,
}

impl From<AckKind> for u8 {
    fn from(value: AckKind) -> u8 {
        value as u8
    }
}

impl TryFrom<u8> for AckKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(Self::Login),
            other => Err(format!("unknown ack type {other}")),
        }
    }
}

/// Login payload used when a client authenticates or creates a new character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Login {
    pub login_type: LoginType,
    pub name: String,
    pub hash: String,
}

/// Gameplay command together with its raw argument string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Command {
    pub command_type: CommandType,
    pub arguments: String,
}

/// General server-to-client wrapper for text notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerMessage {
    pub message_type: ServerMessageKind,
    pub message_text: String,
}

impl ServerMessage {
    pub fn console(text: impl Into<String>) -> Self {
        Self {
            message_type: ServerMessageKind::Console,
            message_text: text.into(),
        }
    }

    pub fn popup(text: impl Into<String>) -> Self {
        Self {
            message_type: ServerMessageKind::Popup,
            message_text: text.into(),
        }
    }
}

/// Acknowledgement message confirming an operation such as a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(rename = "Type")]
    pub kind: AckKind,
}

/// Room description sent to clients when they enter or inspect a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Room {
    pub title: String,
    pub description: String,
    pub exits: String,
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default)]
    pub mobs: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

/// List of active player names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Who {
    pub players: Vec<String>,
}

/// A typed view of an inbound frame, produced before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Heartbeat,
    Login(Login),
    Command(Command),
    /// The peer reported an error; carries no payload the server acts on.
    Error,
    /// A declared kind the server has no inbound handling for.
    Unhandled(MessageKind),
    /// A kind code outside the declared enumeration.
    Unknown(u16),
}

impl TryFrom<&Frame> for ClientMessage {
    type Error = MudstoneError;

    fn try_from(frame: &Frame) -> Result<Self, MudstoneError> {
        let Some(kind) = MessageKind::from_code(frame.kind) else {
            return Ok(ClientMessage::Unknown(frame.kind));
        };
        Ok(match kind {
            MessageKind::Heartbeat => ClientMessage::Heartbeat,
            MessageKind::Login => ClientMessage::Login(decode_payload(kind, &frame.payload)?),
            MessageKind::Command => ClientMessage::Command(decode_payload(kind, &frame.payload)?),
            MessageKind::Error => ClientMessage::Error,
            other => ClientMessage::Unhandled(other),
        })
    }
}

fn decode_payload<T: DeserializeOwned>(
    kind: MessageKind,
    payload: &[u8],
) -> Result<T, MudstoneError> {
    serde_json::from_slice(payload)
        .map_err(|e| MudstoneError::BadPayload(format!("{kind:?}: {e}")))
}
