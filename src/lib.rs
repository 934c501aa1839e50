//! Multiplayer Presence Relay Library
//!
//! A WebSocket relay built with tokio-tungstenite that keeps a shared
//! roster of connected players and fans position and chat updates out to
//! every client.
//!
//! # Features
//! - Join handshake with roster synchronization
//! - Position/rotation updates broadcast to other players
//! - On-demand roster re-synchronization
//! - Chat relay
//! - Disconnect cleanup with leave notices
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `RelayServer` is the central actor owning the `Roster` and the
//!   `ConnectionRegistry`
//! - Each connection has a `handler` task forwarding decoded events
//! - A `Session` per connection turns events into scoped `Outbound` effects
//! - The `router` delivers those effects without blocking on any one client
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use presence_relay::{serve, RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(&config.listen_addr).await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
//!
//!     tokio::spawn(RelayServer::new(cmd_rx).run());
//!     serve(listener, cmd_tx).await;
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod message;
pub mod roster;
pub mod router;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use connection::{Connection, ConnectionRegistry};
pub use error::{AppError, RosterError, SendError, SessionError};
pub use handler::{handle_connection, serve};
pub use message::{ClientEvent, ServerEvent};
pub use roster::{Player, Roster, Snapshot};
pub use router::{Outbound, Scope};
pub use server::{RelayServer, ServerCommand};
pub use session::{Session, SessionState};
pub use types::{PlayerId, Position};
