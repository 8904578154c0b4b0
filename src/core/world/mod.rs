// src/core/world/mod.rs

//! The world-state collaborator boundary.
//!
//! Gameplay handlers talk to the persistence/world layer exclusively through
//! the [`WorldStore`] trait: a typed method surface with no query strings.
//! The shipped implementation is in-memory ([`InMemoryWorld`]); a database
//! backend would implement the same trait.

pub mod memory;

pub use memory::InMemoryWorld;

use crate::core::state::ConnectionId;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Which inbound traffic a player has muted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreKind {
    /// Private tells from other players.
    Tells,
    /// Global out-of-character chat.
    Ooc,
}

/// A player as seen by the network layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub id: Uuid,
    pub name: String,
}

/// A room as seen by the network layer. Lists of visible entities are
/// composed by the handlers from the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomView {
    pub title: String,
    pub description: String,
    pub exits: String,
}

/// Failures surfaced by the world-state collaborator. All of these are
/// application-level: handlers turn them into replies, never into teardown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("No one by that name exists.")]
    NotFound,

    #[error("There is no exit in that direction.")]
    InvalidDirection,

    #[error("{0}")]
    Conflict(String),

    #[error("The world is unavailable right now.")]
    Unavailable(String),
}

/// Synchronous query/update contract the gameplay handlers consume.
///
/// Session-binding operations mirror the persistence layer's record of which
/// connection a character is attached to, so a restarted server can clear
/// stale state and a login can detect a character already in use.
#[async_trait]
pub trait WorldStore: Send + Sync {
    /// Looks up a player by name and credential hash.
    async fn authenticate(&self, name: &str, hash: &str) -> Result<PlayerRef, WorldError>;

    /// Creates a new character, failing with `Conflict` if the name is taken.
    async fn create_character(&self, name: &str, hash: &str) -> Result<PlayerRef, WorldError>;

    /// The room the player currently occupies.
    async fn room_of(&self, player: &str) -> Result<RoomView, WorldError>;

    /// Moves the player through the named exit, returning the new room.
    async fn move_towards(&self, player: &str, direction: &str) -> Result<RoomView, WorldError>;

    /// Names of all players currently attached to a connection.
    async fn list_online(&self) -> Result<Vec<String>, WorldError>;

    /// Sets one of the player's ignore flags.
    async fn set_ignore_flag(
        &self,
        player: &str,
        kind: IgnoreKind,
        value: bool,
    ) -> Result<(), WorldError>;

    /// Reads one of the player's ignore flags.
    async fn ignoring(&self, player: &str, kind: IgnoreKind) -> Result<bool, WorldError>;

    /// Records that the player is attached to the given connection.
    async fn bind_session(&self, player: &str, conn: ConnectionId) -> Result<(), WorldError>;

    /// Clears whatever player is attached to the connection, returning the
    /// player's name if one was bound. Idempotent.
    async fn clear_session(&self, conn: ConnectionId) -> Result<Option<String>, WorldError>;

    /// The player attached to the connection, if any.
    async fn session_player(&self, conn: ConnectionId) -> Result<Option<String>, WorldError>;

    /// The connection the player is attached to, if any.
    async fn connection_of(&self, player: &str) -> Result<Option<ConnectionId>, WorldError>;

    /// Names of the other online players in the same room as `player`.
    async fn players_in_room_with(&self, player: &str) -> Result<Vec<String>, WorldError>;

    /// Clears every player/connection binding. Run at startup so nobody shows
    /// as logged in after a restart.
    async fn clear_all_sessions(&self) -> Result<(), WorldError>;
}
