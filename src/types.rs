//! Basic type definitions for the relay
//!
//! Provides:
//! - `PlayerId`: UUID-based connection identity, doubling as the player id
//! - `Position`: 3D coordinates carried by position updates

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique connection / player identifier (newtype pattern)
///
/// Assigned when a connection is accepted and never reused while it is open.
/// Serializes as the bare UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Create a new random player ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position in world space
///
/// Defaults to the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}
