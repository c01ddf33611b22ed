//! The `Notifier` trait: how the room layer talks back to clients.
//!
//! The room layer never touches sockets. After it has committed a state
//! change it hands replies and events to a [`Notifier`], which the
//! transport implements. Delivery is best-effort: the boolean results are
//! used only to skip follow-up broadcasts when the requester's own reply
//! could not be delivered. Nothing is rolled back and nothing is retried.

use std::sync::Arc;

use avalon_protocol::{Operation, Reply, RoleReveal, RoomEvent};

use crate::{Connection, RoomError};

/// Outbound delivery for replies, room broadcasts and role reveals.
///
/// Methods are called while room locks are held, so implementations must
/// not call back into the pool.
pub trait Notifier: Send + Sync + 'static {
    /// Sends the single answer to a request. Returns `true` if it was
    /// handed off locally.
    fn reply(&self, conn: &Connection, reply: Reply) -> bool;

    /// Fans an event out to every listed connection. Returns `true` if
    /// every hand-off succeeded.
    fn broadcast(&self, recipients: &[&Connection], event: &RoomEvent) -> bool;

    /// Privately tells one player their role at game start.
    fn begin_game(&self, conn: &Connection, reveal: RoleReveal) -> bool;
}

impl<N: Notifier> Notifier for Arc<N> {
    fn reply(&self, conn: &Connection, reply: Reply) -> bool {
        (**self).reply(conn, reply)
    }

    fn broadcast(&self, recipients: &[&Connection], event: &RoomEvent) -> bool {
        (**self).broadcast(recipients, event)
    }

    fn begin_game(&self, conn: &Connection, reveal: RoleReveal) -> bool {
        (**self).begin_game(conn, reveal)
    }
}

/// Sends the rejection reply for a failed request.
pub(crate) fn reject(notifier: &impl Notifier, conn: &Connection, op: Operation, err: &RoomError) {
    tracing::debug!(conn = %conn.id(), ?op, reason = %err, "request rejected");
    if !notifier.reply(
        conn,
        Reply::Rejected {
            op,
            reason: err.to_string(),
        },
    ) {
        tracing::warn!(conn = %conn.id(), ?op, "rejection reply not delivered");
    }
}

/// A notifier that drops everything. Useful when nobody is listening.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn reply(&self, _conn: &Connection, _reply: Reply) -> bool {
        true
    }

    fn broadcast(&self, _recipients: &[&Connection], _event: &RoomEvent) -> bool {
        true
    }

    fn begin_game(&self, _conn: &Connection, _reveal: RoleReveal) -> bool {
        true
    }
}
