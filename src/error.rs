//! Error types for the relay
//!
//! Defines fatal connection errors, roster and session rule violations,
//! and per-connection delivery errors. Uses thiserror for ergonomic
//! error definitions.

use thiserror::Error;

use crate::types::PlayerId;

/// Application-level errors
///
/// Fatal for the connection (or the process, for configuration errors).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Bad configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Roster mutation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    /// A player entry already exists for this id
    #[error("Player {0} already joined")]
    AlreadyJoined(PlayerId),
}

/// Session protocol violations
///
/// Logged by the server and never reported back to the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Join received on a connection that already joined
    #[error("Connection already joined")]
    AlreadyJoined,

    /// Event requires a joined connection
    #[error("Connection has not joined")]
    NotJoined,
}

impl From<RosterError> for SessionError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::AlreadyJoined(_) => SessionError::AlreadyJoined,
        }
    }
}

/// Message send errors
///
/// Occurs when delivering to a single connection fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
