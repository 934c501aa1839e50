//! Event protocol definitions
//!
//! JSON named-event protocol. Every frame is an envelope
//! `{"event": "<name>", "data": <payload>}`, mapped onto Serde's adjacently
//! tagged enums. Events without a payload may omit `data`.

use serde::{Deserialize, Serialize};

use crate::roster::Snapshot;
use crate::types::{PlayerId, Position};

/// Client → Server event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join handshake
    PlayerJoin { name: String },
    /// New position and heading for the sender's player
    UpdatePosition { position: Position, rotation: f64 },
    /// Ask for a fresh roster snapshot
    RequestPosition,
    /// Chat line, relayed verbatim
    ChatMessage { sender: String, message: String },
}

impl ClientEvent {
    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::PlayerJoin { .. } => "playerJoin",
            ClientEvent::UpdatePosition { .. } => "updatePosition",
            ClientEvent::RequestPosition => "requestPosition",
            ClientEvent::ChatMessage { .. } => "chatMessage",
        }
    }
}

/// Server → Client event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Connection accepted, id issued
    Connected { id: PlayerId },
    /// Full roster, sent to a joining connection
    CurrentPlayers(Snapshot),
    /// Another player joined
    PlayerJoined { id: PlayerId, name: String },
    /// Full roster after a join or leave
    UpdatePlayers(Snapshot),
    /// Full roster after a move, or on request
    PlayersMoved(Snapshot),
    /// A player disconnected
    PlayerLeft(PlayerId),
    /// Relayed chat line
    ChatMessage { sender: String, message: String },
}
