//! A [`Notifier`] that hands every notification to a per-connection
//! `tokio::sync::mpsc` channel.
//!
//! The transport registers a connection when it is accepted, drains the
//! receiver in the connection's write task, and unregisters it on close.
//! Sends never block, so they are safe under the pool and room locks.

use std::collections::HashMap;

use avalon_protocol::{ConnectionId, Reply, RoleReveal, RoomEvent};
use avalon_room::{Connection, Notifier};
use parking_lot::RwLock;
use tokio::sync::mpsc;

/// One notification bound for a single connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Answer to the connection's own request.
    Reply(Reply),
    /// Room-wide event.
    Event(RoomEvent),
    /// Private role reveal at game start.
    BeginGame(RoleReveal),
}

pub type OutboundSender = mpsc::UnboundedSender<Outbound>;
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Routes notifications to registered connections by [`ConnectionId`].
///
/// A send to an unregistered connection, or one whose receiver was
/// dropped, counts as undelivered.
#[derive(Debug, Default)]
pub struct ChannelNotifier {
    senders: RwLock<HashMap<ConnectionId, OutboundSender>>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a channel for `id`, replacing any earlier one.
    pub fn register(&self, id: ConnectionId) -> OutboundReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.senders.write().insert(id, tx).is_some() {
            tracing::debug!(conn = %id, "replaced existing outbound channel");
        }
        rx
    }

    /// Closes the channel for `id`. Returns `false` if none was open.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        self.senders.write().remove(&id).is_some()
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.senders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.read().is_empty()
    }

    fn send(&self, id: ConnectionId, message: Outbound) -> bool {
        let senders = self.senders.read();
        let Some(tx) = senders.get(&id) else {
            tracing::debug!(conn = %id, "no outbound channel registered");
            return false;
        };
        tx.send(message).is_ok()
    }
}

impl Notifier for ChannelNotifier {
    fn reply(&self, conn: &Connection, reply: Reply) -> bool {
        self.send(conn.id(), Outbound::Reply(reply))
    }

    fn broadcast(&self, recipients: &[&Connection], event: &RoomEvent) -> bool {
        // Every recipient gets a copy even after an earlier one fails.
        recipients.iter().fold(true, |delivered, conn| {
            self.send(conn.id(), Outbound::Event(event.clone())) && delivered
        })
    }

    fn begin_game(&self, conn: &Connection, reveal: RoleReveal) -> bool {
        self.send(conn.id(), Outbound::BeginGame(reveal))
    }
}
