//! Connection handles and the connection registry
//!
//! Tracks every open connection with its outbound channel and session
//! state, so fan-out and disconnect cleanup agree on who is connected.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerEvent;
use crate::session::Session;
use crate::types::PlayerId;

/// Open connection
///
/// Holds the connection's id, its Server → Client channel, and the
/// per-connection session state machine.
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: PlayerId,
    /// Server → Client event channel
    pub sender: mpsc::UnboundedSender<ServerEvent>,
    /// Join state
    pub session: Session,
}

impl Connection {
    /// Create an unjoined connection with the given ID and sender channel
    pub fn new(id: PlayerId, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            id,
            sender,
            session: Session::new(id),
        }
    }

    /// Queue an event for this connection without waiting
    ///
    /// The queue is unbounded, so this only fails once the connection
    /// task is gone.
    pub fn send(&self, event: ServerEvent) -> Result<(), SendError> {
        self.sender
            .send(event)
            .map_err(|_| SendError::ChannelClosed)
    }
}

/// All currently open connections, keyed by id
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<PlayerId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted connection
    ///
    /// Returns false if the id is already registered; the existing
    /// connection is left untouched.
    pub fn register(&mut self, id: PlayerId, sender: mpsc::UnboundedSender<ServerEvent>) -> bool {
        if self.connections.contains_key(&id) {
            return false;
        }
        self.connections.insert(id, Connection::new(id, sender));
        true
    }

    /// Drop a connection, returning it so its session can be torn down
    pub fn unregister(&mut self, id: PlayerId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;

    #[tokio::test]
    async fn test_connection_creation() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = PlayerId::new();
        let conn = Connection::new(id, tx);

        assert_eq!(conn.id, id);
        assert_eq!(conn.session.state(), SessionState::Unjoined);
    }

    #[tokio::test]
    async fn test_send_never_drops_for_live_connection() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = Connection::new(PlayerId::new(), tx);

        for _ in 0..1_000 {
            assert!(conn.send(ServerEvent::PlayerLeft(PlayerId::new())).is_ok());
        }
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 1_000);

        drop(rx);
        assert_eq!(
            conn.send(ServerEvent::PlayerLeft(PlayerId::new())),
            Err(SendError::ChannelClosed)
        );
    }

    #[tokio::test]
    async fn test_registry_register_unregister() {
        let mut registry = ConnectionRegistry::new();
        let id = PlayerId::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        assert!(registry.register(id, tx.clone()));
        assert!(!registry.register(id, tx));
        assert_eq!(registry.len(), 1);

        let conn = registry.unregister(id).unwrap();
        assert_eq!(conn.id, id);
        assert!(registry.is_empty());
        assert!(registry.unregister(id).is_none());
    }
}
