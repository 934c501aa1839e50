//! Roster of joined players
//!
//! The authoritative table of connected players that completed the join
//! handshake. Owned by the `RelayServer` actor; every mutation goes
//! through the methods below.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::RosterError;
use crate::types::{PlayerId, Position};

/// One connected participant
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Player {
    /// Same as the owning connection's id
    pub id: PlayerId,
    /// Display label chosen by the client, not validated
    pub name: String,
    pub position: Position,
    /// Heading
    pub rotation: f64,
}

impl Player {
    /// Create a player at the origin with zero rotation
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            position: Position::default(),
            rotation: 0.0,
        }
    }
}

/// Point-in-time copy of the roster
///
/// Serializes as a JSON object keyed by player id, in join order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot(Vec<Player>);

impl Snapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.0.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.0.iter()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for player in &self.0 {
            map.serialize_entry(&player.id, player)?;
        }
        map.end()
    }
}

/// Player table keyed by connection id, kept in join order
#[derive(Debug, Default)]
pub struct Roster {
    players: IndexMap<PlayerId, Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new player with default position and rotation
    ///
    /// A duplicate join is rejected and the existing entry is kept.
    pub fn join(&mut self, id: PlayerId, name: String) -> Result<Player, RosterError> {
        if self.players.contains_key(&id) {
            return Err(RosterError::AlreadyJoined(id));
        }

        let player = Player::new(id, name);
        self.players.insert(id, player.clone());
        Ok(player)
    }

    /// Move an existing player
    ///
    /// Returns false (and changes nothing) if `id` is not in the roster,
    /// which happens when an update races a disconnect.
    pub fn update_position(&mut self, id: PlayerId, position: Position, rotation: f64) -> bool {
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };

        player.position = position;
        player.rotation = rotation;
        true
    }

    /// Remove a player, returning the removed entry if there was one
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        // shift_remove keeps the remaining players in join order
        self.players.shift_remove(&id)
    }

    /// Copy the current contents in join order
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.players.values().cloned().collect())
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
