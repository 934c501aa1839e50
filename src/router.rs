//! Broadcast routing
//!
//! Delivers outbound effects to the connection set named by their scope.
//! Delivery is fire-and-forget: a failed send to one connection is logged
//! and the fan-out continues.

use tracing::{debug, warn};

use crate::connection::ConnectionRegistry;
use crate::message::ServerEvent;
use crate::types::PlayerId;

/// Recipient set of an outbound event, relative to the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the originating connection
    ToSender,
    /// Every open connection except the originating one
    ToOthers,
    /// Every open connection
    ToAll,
}

impl Scope {
    /// Whether a connection falls inside this scope
    pub fn includes(self, sender: PlayerId, target: PlayerId) -> bool {
        match self {
            Scope::ToSender => target == sender,
            Scope::ToOthers => target != sender,
            Scope::ToAll => true,
        }
    }
}

/// An event together with its recipient scope
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub scope: Scope,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn new(scope: Scope, event: ServerEvent) -> Self {
        Self { scope, event }
    }
}

/// Deliver one outbound effect
///
/// Returns the number of connections the event was queued for.
pub fn dispatch(registry: &ConnectionRegistry, sender: PlayerId, outbound: &Outbound) -> usize {
    let mut delivered = 0;

    for conn in registry
        .iter()
        .filter(|conn| outbound.scope.includes(sender, conn.id))
    {
        match conn.send(outbound.event.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Dropping event for {}: {}", conn.id, e),
        }
    }

    debug!(
        "Dispatched {:?} from {} to {} connection(s)",
        outbound.scope, sender, delivered
    );
    delivered
}

/// Deliver a batch of effects in order
pub fn dispatch_all(registry: &ConnectionRegistry, sender: PlayerId, outbound: &[Outbound]) {
    for effect in outbound {
        dispatch(registry, sender, effect);
    }
}
