// src/core/world/memory.rs

//! An in-memory `WorldStore` backing the shipped server and the test suite.

use super::{IgnoreKind, PlayerRef, RoomView, WorldError, WorldStore};
use crate::core::state::ConnectionId;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct PlayerRecord {
    id: Uuid,
    hash: String,
    room: Uuid,
    ignore_tells: bool,
    ignore_ooc: bool,
    connection: Option<ConnectionId>,
}

#[derive(Debug, Clone)]
struct RoomDef {
    title: String,
    description: String,
    /// Direction name -> destination room, in display order.
    exits: Vec<(String, Uuid)>,
}

impl RoomDef {
    fn view(&self) -> RoomView {
        RoomView {
            title: self.title.clone(),
            description: self.description.clone(),
            exits: self
                .exits
                .iter()
                .map(|(direction, _)| direction.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// World state held entirely in process memory.
///
/// The room graph is fixed at construction; player records and session
/// bindings are concurrently mutable.
pub struct InMemoryWorld {
    players: DashMap<String, PlayerRecord>,
    sessions: DashMap<ConnectionId, String>,
    rooms: HashMap<Uuid, RoomDef>,
    entry_room: Uuid,
}

impl Default for InMemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWorld {
    /// Creates a world with the default starting area.
    pub fn new() -> Self {
        let (rooms, entry_room) = default_rooms();
        Self {
            players: DashMap::new(),
            sessions: DashMap::new(),
            rooms,
            entry_room,
        }
    }

    fn room_view(&self, room: Uuid) -> Result<RoomView, WorldError> {
        self.rooms
            .get(&room)
            .map(RoomDef::view)
            .ok_or_else(|| WorldError::Unavailable("room graph is inconsistent".to_string()))
    }
}

/// Builds the seed room graph and returns it with the entry room's id.
fn default_rooms() -> (HashMap<Uuid, RoomDef>, Uuid) {
    let hall = Uuid::new_v4();
    let courtyard = Uuid::new_v4();
    let gallery = Uuid::new_v4();
    let cellar = Uuid::new_v4();

    let mut rooms = HashMap::new();
    rooms.insert(
        hall,
        RoomDef {
            title: "The Fieldstone Hall".to_string(),
            description: "A broad hall of rough-cut stone. A cold hearth \
                          dominates the far wall."
                .to_string(),
            exits: vec![
                ("north".to_string(), courtyard),
                ("east".to_string(), gallery),
            ],
        },
    );
    rooms.insert(
        courtyard,
        RoomDef {
            title: "A Muddy Courtyard".to_string(),
            description: "Rain has turned the yard to churned mud. Wagon ruts \
                          lead away under the gate."
                .to_string(),
            exits: vec![("south".to_string(), hall)],
        },
    );
    rooms.insert(
        gallery,
        RoomDef {
            title: "The East Gallery".to_string(),
            description: "Faded tapestries line this narrow gallery. A \
                          stairwell descends into darkness."
                .to_string(),
            exits: vec![("west".to_string(), hall), ("down".to_string(), cellar)],
        },
    );
    rooms.insert(
        cellar,
        RoomDef {
            title: "The Cellar".to_string(),
            description: "Casks and cobwebs. The air is thick with the smell \
                          of damp earth."
                .to_string(),
            exits: vec![("up".to_string(), gallery)],
        },
    );

    (rooms, hall)
}

#[async_trait]
impl WorldStore for InMemoryWorld {
    async fn authenticate(&self, name: &str, hash: &str) -> Result<PlayerRef, WorldError> {
        let record = self.players.get(name).ok_or(WorldError::NotFound)?;
        if record.hash != hash {
            return Err(WorldError::NotFound);
        }
        Ok(PlayerRef {
            id: record.id,
            name: name.to_string(),
        })
    }

    async fn create_character(&self, name: &str, hash: &str) -> Result<PlayerRef, WorldError> {
        match self.players.entry(name.to_string()) {
            Entry::Occupied(_) => Err(WorldError::Conflict(
                "A character already exists by that name.".to_string(),
            )),
            Entry::Vacant(slot) => {
                let id = Uuid::new_v4();
                slot.insert(PlayerRecord {
                    id,
                    hash: hash.to_string(),
                    room: self.entry_room,
                    ignore_tells: false,
                    ignore_ooc: false,
                    connection: None,
                });
                Ok(PlayerRef {
                    id,
                    name: name.to_string(),
                })
            }
        }
    }

    async fn room_of(&self, player: &str) -> Result<RoomView, WorldError> {
        let room = self.players.get(player).ok_or(WorldError::NotFound)?.room;
        self.room_view(room)
    }

    async fn move_towards(&self, player: &str, direction: &str) -> Result<RoomView, WorldError> {
        let mut record = self.players.get_mut(player).ok_or(WorldError::NotFound)?;
        let room = self
            .rooms
            .get(&record.room)
            .ok_or_else(|| WorldError::Unavailable("room graph is inconsistent".to_string()))?;
        let destination = room
            .exits
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(direction))
            .map(|(_, id)| *id)
            .ok_or(WorldError::InvalidDirection)?;
        record.room = destination;
        drop(record);
        self.room_view(destination)
    }

    async fn list_online(&self) -> Result<Vec<String>, WorldError> {
        Ok(self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn set_ignore_flag(
        &self,
        player: &str,
        kind: IgnoreKind,
        value: bool,
    ) -> Result<(), WorldError> {
        let mut record = self.players.get_mut(player).ok_or(WorldError::NotFound)?;
        match kind {
            IgnoreKind::Tells => record.ignore_tells = value,
            IgnoreKind::Ooc => record.ignore_ooc = value,
        }
        Ok(())
    }

    async fn ignoring(&self, player: &str, kind: IgnoreKind) -> Result<bool, WorldError> {
        let record = self.players.get(player).ok_or(WorldError::NotFound)?;
        Ok(match kind {
            IgnoreKind::Tells => record.ignore_tells,
            IgnoreKind::Ooc => record.ignore_ooc,
        })
    }

    async fn bind_session(&self, player: &str, conn: ConnectionId) -> Result<(), WorldError> {
        {
            let mut record = self.players.get_mut(player).ok_or(WorldError::NotFound)?;
            record.connection = Some(conn);
        }
        self.sessions.insert(conn, player.to_string());
        Ok(())
    }

    async fn clear_session(&self, conn: ConnectionId) -> Result<Option<String>, WorldError> {
        let Some((_, name)) = self.sessions.remove(&conn) else {
            return Ok(None);
        };
        if let Some(mut record) = self.players.get_mut(&name) {
            // Only clear if another login has not already rebound the player.
            if record.connection == Some(conn) {
                record.connection = None;
            }
        }
        Ok(Some(name))
    }

    async fn session_player(&self, conn: ConnectionId) -> Result<Option<String>, WorldError> {
        Ok(self.sessions.get(&conn).map(|entry| entry.value().clone()))
    }

    async fn connection_of(&self, player: &str) -> Result<Option<ConnectionId>, WorldError> {
        let record = self.players.get(player).ok_or(WorldError::NotFound)?;
        Ok(record.connection)
    }

    async fn players_in_room_with(&self, player: &str) -> Result<Vec<String>, WorldError> {
        let room = self.players.get(player).ok_or(WorldError::NotFound)?.room;
        Ok(self
            .players
            .iter()
            .filter(|entry| {
                entry.value().connection.is_some()
                    && entry.value().room == room
                    && entry.key() != player
            })
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn clear_all_sessions(&self) -> Result<(), WorldError> {
        for mut record in self.players.iter_mut() {
            record.connection = None;
        }
        self.sessions.clear();
        Ok(())
    }
}
