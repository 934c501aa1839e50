//! Per-connection session state machine
//!
//! Interprets one connection's inbound events against the shared roster
//! and returns the outbound effects to deliver. No I/O happens here; the
//! caller hands the effects to the router.
//!
//! ```text
//!   Unjoined ──playerJoin──→ Joined ──disconnect──→ (gone)
//!      │
//!      └──────────disconnect──────────────→ (gone, no broadcast)
//! ```
//!
//! | Event | Valid in | Effects |
//! |---|---|---|
//! | `playerJoin` | Unjoined | `currentPlayers` → sender, `playerJoined` → others, `updatePlayers` → all |
//! | `updatePosition` | Joined | `playersMoved` → others |
//! | `requestPosition` | any | `playersMoved` → sender |
//! | `chatMessage` | any | `chatMessage` → all |
//! | disconnect | any | if joined: `playerLeft` → all, `updatePlayers` → all |

use crate::error::SessionError;
use crate::message::{ClientEvent, ServerEvent};
use crate::roster::Roster;
use crate::router::{Outbound, Scope};
use crate::types::{PlayerId, Position};

/// Join state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no join handshake yet
    Unjoined,
    /// Has a roster entry
    Joined,
}

/// Session for a single connection
#[derive(Debug)]
pub struct Session {
    id: PlayerId,
    state: SessionState,
}

impl Session {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            state: SessionState::Unjoined,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_joined(&self) -> bool {
        self.state == SessionState::Joined
    }

    /// Apply one inbound event
    ///
    /// Errors are protocol violations; the roster is unchanged and
    /// nothing should be sent.
    pub fn handle(
        &mut self,
        event: ClientEvent,
        roster: &mut Roster,
    ) -> Result<Vec<Outbound>, SessionError> {
        match event {
            ClientEvent::PlayerJoin { name } => self.join(name, roster),
            ClientEvent::UpdatePosition { position, rotation } => {
                self.update_position(position, rotation, roster)
            }
            ClientEvent::RequestPosition => Ok(self.request_position(roster)),
            ClientEvent::ChatMessage { sender, message } => Ok(self.chat(sender, message)),
        }
    }

    fn join(&mut self, name: String, roster: &mut Roster) -> Result<Vec<Outbound>, SessionError> {
        if self.is_joined() {
            return Err(SessionError::AlreadyJoined);
        }

        let player = roster.join(self.id, name)?;
        self.state = SessionState::Joined;

        let snapshot = roster.snapshot();
        Ok(vec![
            Outbound::new(Scope::ToSender, ServerEvent::CurrentPlayers(snapshot.clone())),
            Outbound::new(
                Scope::ToOthers,
                ServerEvent::PlayerJoined {
                    id: player.id,
                    name: player.name,
                },
            ),
            Outbound::new(Scope::ToAll, ServerEvent::UpdatePlayers(snapshot)),
        ])
    }

    fn update_position(
        &mut self,
        position: Position,
        rotation: f64,
        roster: &mut Roster,
    ) -> Result<Vec<Outbound>, SessionError> {
        if !self.is_joined() {
            return Err(SessionError::NotJoined);
        }

        // Entry can be gone if the disconnect was already processed.
        if !roster.update_position(self.id, position, rotation) {
            return Ok(Vec::new());
        }

        Ok(vec![Outbound::new(
            Scope::ToOthers,
            ServerEvent::PlayersMoved(roster.snapshot()),
        )])
    }

    fn request_position(&self, roster: &Roster) -> Vec<Outbound> {
        vec![Outbound::new(
            Scope::ToSender,
            ServerEvent::PlayersMoved(roster.snapshot()),
        )]
    }

    fn chat(&self, sender: String, message: String) -> Vec<Outbound> {
        vec![Outbound::new(
            Scope::ToAll,
            ServerEvent::ChatMessage { sender, message },
        )]
    }

    /// Tear down the session after the transport reported a disconnect
    ///
    /// The connection must already be out of the registry, so `ToAll`
    /// reaches only the remaining connections.
    pub fn disconnect(self, roster: &mut Roster) -> Vec<Outbound> {
        if !self.is_joined() {
            return Vec::new();
        }

        let Some(player) = roster.remove(self.id) else {
            return Vec::new();
        };

        vec![
            Outbound::new(Scope::ToAll, ServerEvent::PlayerLeft(player.id)),
            Outbound::new(Scope::ToAll, ServerEvent::UpdatePlayers(roster.snapshot())),
        ]
    }
}
