//! RelayServer Actor implementation
//!
//! The central actor that owns the roster and the connection registry.
//! Every connection task talks to it through one mpsc channel, so each
//! command is applied and its broadcasts queued before the next starts.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::ConnectionRegistry;
use crate::message::{ClientEvent, ServerEvent};
use crate::roster::{Roster, Snapshot};
use crate::router;
use crate::types::PlayerId;

/// Commands sent from connection handlers to the RelayServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection accepted
    Connect {
        player_id: PlayerId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    },
    /// Transport reported the connection closed
    Disconnect { player_id: PlayerId },
    /// Decoded inbound event
    Event {
        player_id: PlayerId,
        event: ClientEvent,
    },
    /// Read the current roster (diagnostics and tests)
    Snapshot {
        reply: tokio::sync::oneshot::Sender<Snapshot>,
    },
}

/// The main RelayServer actor
pub struct RelayServer {
    roster: Roster,
    connections: ConnectionRegistry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl RelayServer {
    /// Create a new RelayServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            roster: Roster::new(),
            connections: ConnectionRegistry::new(),
            receiver,
        }
    }

    /// Run the RelayServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("RelayServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("RelayServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { player_id, sender } => {
                self.handle_connect(player_id, sender);
            }
            ServerCommand::Disconnect { player_id } => {
                self.handle_disconnect(player_id);
            }
            ServerCommand::Event { player_id, event } => {
                self.handle_event(player_id, event);
            }
            ServerCommand::Snapshot { reply } => {
                let _ = reply.send(self.roster.snapshot());
            }
        }
    }

    /// Handle new connection
    fn handle_connect(&mut self, player_id: PlayerId, sender: mpsc::UnboundedSender<ServerEvent>) {
        info!("Player connected: {}", player_id);

        if !self.connections.register(player_id, sender) {
            warn!("Connection {} registered twice, ignoring", player_id);
            return;
        }

        if let Some(conn) = self.connections.get(player_id) {
            if let Err(e) = conn.send(ServerEvent::Connected { id: player_id }) {
                warn!("Failed to greet {}: {}", player_id, e);
            }
        }

        debug!(
            "Total connections: {}, Total players: {}",
            self.connections.len(),
            self.roster.len()
        );
    }

    /// Handle connection close
    ///
    /// The connection leaves the registry first so the leave broadcast
    /// only reaches the remaining connections.
    fn handle_disconnect(&mut self, player_id: PlayerId) {
        info!("Player disconnected: {}", player_id);

        let Some(conn) = self.connections.unregister(player_id) else {
            debug!("Disconnect for unknown connection {}", player_id);
            return;
        };

        let effects = conn.session.disconnect(&mut self.roster);
        router::dispatch_all(&self.connections, player_id, &effects);

        debug!(
            "Total connections: {}, Total players: {}",
            self.connections.len(),
            self.roster.len()
        );
    }

    /// Handle an inbound event from a connection
    fn handle_event(&mut self, player_id: PlayerId, event: ClientEvent) {
        let Some(conn) = self.connections.get_mut(player_id) else {
            // Event raced the disconnect.
            debug!("Event from closed connection {}", player_id);
            return;
        };

        match &event {
            ClientEvent::PlayerJoin { name } => {
                info!("{} joined the game with ID: {}", name, player_id);
            }
            ClientEvent::ChatMessage { sender, message } => {
                info!("Chat message from {}: {}", sender, message);
            }
            _ => debug!("{} from {}", event.name(), player_id),
        }

        let name = event.name();
        match conn.session.handle(event, &mut self.roster) {
            Ok(effects) => router::dispatch_all(&self.connections, player_id, &effects),
            Err(e) => warn!("Ignoring {} from {}: {}", name, player_id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    struct TestClient {
        id: PlayerId,
        rx: mpsc::UnboundedReceiver<ServerEvent>,
    }

    impl TestClient {
        fn drain(&mut self) -> Vec<ServerEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                events.push(event);
            }
            events
        }
    }

    fn server() -> RelayServer {
        let (_tx, rx) = mpsc::channel(1);
        RelayServer::new(rx)
    }

    fn connect(server: &mut RelayServer) -> TestClient {
        let id = PlayerId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        server.handle_command(ServerCommand::Connect {
            player_id: id,
            sender: tx,
        });
        let mut client = TestClient { id, rx };
        assert_eq!(client.drain(), vec![ServerEvent::Connected { id }]);
        client
    }

    fn send(server: &mut RelayServer, client: &TestClient, event: ClientEvent) {
        server.handle_command(ServerCommand::Event {
            player_id: client.id,
            event,
        });
    }

    fn join(server: &mut RelayServer, client: &TestClient, name: &str) {
        send(
            server,
            client,
            ClientEvent::PlayerJoin {
                name: name.to_string(),
            },
        );
    }

    #[test]
    fn test_alice_joins_alone() {
        let mut server = server();
        let mut alice = connect(&mut server);

        join(&mut server, &alice, "Alice");

        let events = alice.drain();
        assert_eq!(events.len(), 2);
        let ServerEvent::CurrentPlayers(snapshot) = &events[0] else {
            panic!("Wrong variant");
        };
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(alice.id).unwrap().name, "Alice");
        assert!(matches!(events[1], ServerEvent::UpdatePlayers(_)));
    }

    #[test]
    fn test_bob_joins_after_alice() {
        let mut server = server();
        let mut alice = connect(&mut server);
        let mut bob = connect(&mut server);
        join(&mut server, &alice, "Alice");
        alice.drain();
        bob.drain();

        join(&mut server, &bob, "Bob");

        let bob_events = bob.drain();
        let ServerEvent::CurrentPlayers(snapshot) = &bob_events[0] else {
            panic!("Wrong variant");
        };
        assert!(snapshot.contains(alice.id) && snapshot.contains(bob.id));

        let alice_events = alice.drain();
        assert_eq!(alice_events.len(), 2);
        assert_eq!(
            alice_events[0],
            ServerEvent::PlayerJoined {
                id: bob.id,
                name: "Bob".to_string()
            }
        );
        let ServerEvent::UpdatePlayers(snapshot) = &alice_events[1] else {
            panic!("Wrong variant");
        };
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_unjoined_connection_receives_join_broadcasts() {
        let mut server = server();
        let mut alice = connect(&mut server);
        let mut watcher = connect(&mut server);

        join(&mut server, &alice, "Alice");
        alice.drain();

        let events = watcher.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ServerEvent::PlayerJoined { .. }));
        assert!(matches!(events[1], ServerEvent::UpdatePlayers(_)));
    }

    #[test]
    fn test_move_reaches_others_only() {
        let mut server = server();
        let mut alice = connect(&mut server);
        let mut bob = connect(&mut server);
        join(&mut server, &alice, "Alice");
        join(&mut server, &bob, "Bob");
        alice.drain();
        bob.drain();

        send(
            &mut server,
            &alice,
            ClientEvent::UpdatePosition {
                position: Position::new(1.0, 2.0, 3.0),
                rotation: 0.5,
            },
        );

        assert!(alice.drain().is_empty());
        let events = bob.drain();
        assert_eq!(events.len(), 1);
        let ServerEvent::PlayersMoved(snapshot) = &events[0] else {
            panic!("Wrong variant");
        };
        assert_eq!(snapshot.get(alice.id).unwrap().position, Position::new(1.0, 2.0, 3.0));
        assert_eq!(snapshot.get(alice.id).unwrap().rotation, 0.5);
    }

    #[test]
    fn test_move_before_join_is_silent() {
        let mut server = server();
        let alice = connect(&mut server);
        let mut bob = connect(&mut server);

        send(
            &mut server,
            &alice,
            ClientEvent::UpdatePosition {
                position: Position::new(1.0, 2.0, 3.0),
                rotation: 0.5,
            },
        );

        assert!(bob.drain().is_empty());
        assert!(server.roster.is_empty());
    }

    #[test]
    fn test_disconnect_notifies_remaining() {
        let mut server = server();
        let alice = connect(&mut server);
        let mut bob = connect(&mut server);
        let mut carol = connect(&mut server);
        join(&mut server, &alice, "Alice");
        join(&mut server, &bob, "Bob");
        bob.drain();
        carol.drain();
        let bob_id = bob.id;

        server.handle_command(ServerCommand::Disconnect {
            player_id: alice.id,
        });

        assert!(!server.roster.contains(alice.id));
        for client in [&mut bob, &mut carol] {
            let events = client.drain();
            assert_eq!(events.len(), 2);
            assert_eq!(events[0], ServerEvent::PlayerLeft(alice.id));
            let ServerEvent::UpdatePlayers(snapshot) = &events[1] else {
                panic!("Wrong variant");
            };
            assert!(!snapshot.contains(alice.id));
            assert!(snapshot.contains(bob_id));
        }
    }

    #[test]
    fn test_unjoined_disconnect_is_silent() {
        let mut server = server();
        let lurker = connect(&mut server);
        let mut bob = connect(&mut server);

        server.handle_command(ServerCommand::Disconnect {
            player_id: lurker.id,
        });

        assert!(bob.drain().is_empty());
        assert_eq!(server.connections.len(), 1);
    }

    #[test]
    fn test_event_after_disconnect_ignored() {
        let mut server = server();
        let alice = connect(&mut server);
        let mut bob = connect(&mut server);
        join(&mut server, &alice, "Alice");
        server.handle_command(ServerCommand::Disconnect {
            player_id: alice.id,
        });
        bob.drain();

        send(
            &mut server,
            &alice,
            ClientEvent::UpdatePosition {
                position: Position::new(1.0, 2.0, 3.0),
                rotation: 0.5,
            },
        );
        join(&mut server, &alice, "Alice again");

        assert!(bob.drain().is_empty());
        assert!(server.roster.is_empty());
    }

    #[test]
    fn test_chat_reaches_everyone() {
        let mut server = server();
        let mut alice = connect(&mut server);
        let mut bob = connect(&mut server);

        send(
            &mut server,
            &alice,
            ClientEvent::ChatMessage {
                sender: "Alice".to_string(),
                message: "hello".to_string(),
            },
        );

        let expected = vec![ServerEvent::ChatMessage {
            sender: "Alice".to_string(),
            message: "hello".to_string(),
        }];
        assert_eq!(alice.drain(), expected);
        assert_eq!(bob.drain(), expected);
    }

    #[test]
    fn test_broadcast_survives_dead_connection() {
        let mut server = server();
        let alice = connect(&mut server);
        let dead = connect(&mut server);
        let mut bob = connect(&mut server);
        drop(dead.rx);

        join(&mut server, &alice, "Alice");

        assert_eq!(bob.drain().len(), 2);
    }

    #[test]
    fn test_undrained_connection_still_hears_leave() {
        let mut server = server();
        let alice = connect(&mut server);
        // Bob never reads while Alice floods moves.
        let mut bob = connect(&mut server);
        let mut carol = connect(&mut server);
        join(&mut server, &bob, "Bob");
        join(&mut server, &alice, "Alice");
        carol.drain();

        for i in 0..500 {
            send(
                &mut server,
                &alice,
                ClientEvent::UpdatePosition {
                    position: Position::new(i as f64, 0.0, 0.0),
                    rotation: 0.0,
                },
            );
        }
        server.handle_command(ServerCommand::Disconnect {
            player_id: alice.id,
        });

        let bob_events = bob.drain();
        // Own join, Alice's join, 500 moves, leave + update.
        assert_eq!(bob_events.len(), 2 + 2 + 500 + 2);
        let moves = bob_events
            .iter()
            .filter(|e| matches!(e, ServerEvent::PlayersMoved(_)))
            .count();
        assert_eq!(moves, 500);
        assert_eq!(bob_events[bob_events.len() - 2], ServerEvent::PlayerLeft(alice.id));
        let ServerEvent::UpdatePlayers(snapshot) = &bob_events[bob_events.len() - 1] else {
            panic!("Wrong variant");
        };
        assert!(!snapshot.contains(alice.id));
        assert!(snapshot.contains(bob.id));

        // The slow reader did not cost Carol anything either.
        let carol_events = carol.drain();
        assert_eq!(carol_events.len(), 500 + 2);
        assert_eq!(carol_events[500], ServerEvent::PlayerLeft(alice.id));
    }

    #[tokio::test]
    async fn test_snapshot_command() {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(RelayServer::new(rx).run());

        let id = PlayerId::new();
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        tx.send(ServerCommand::Connect {
            player_id: id,
            sender: out_tx,
        })
        .await
        .unwrap();
        tx.send(ServerCommand::Event {
            player_id: id,
            event: ClientEvent::PlayerJoin {
                name: "Alice".to_string(),
            },
        })
        .await
        .unwrap();

        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        tx.send(ServerCommand::Snapshot { reply: reply_tx })
            .await
            .unwrap();
        let snapshot = reply_rx.await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(id).unwrap().name, "Alice");
    }
}
