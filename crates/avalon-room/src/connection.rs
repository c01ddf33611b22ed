//! The slice of a client connection the room layer reads and writes.
//!
//! A [`Connection`] remembers which room it is in (by number, never by
//! owning pointer) and where it sits in that room's rosters, so a player
//! can find its own entry without scanning. The pool keeps the seat in
//! step with the rosters; callers only read it.

use std::sync::Arc;

use avalon_protocol::{ConnectionId, RoomId};
use parking_lot::{Mutex, MutexGuard};

/// Where a connection sits. `room == None` means unattached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Seat {
    pub room: Option<RoomId>,
    /// Position in the waiting roster. Meaningless while unattached.
    pub waiting_index: usize,
    /// Position in the playing roster while a round is running.
    pub playing_index: Option<usize>,
}

impl Seat {
    pub(crate) fn attached(room: RoomId, waiting_index: usize) -> Self {
        Self {
            room: Some(room),
            waiting_index,
            playing_index: None,
        }
    }
}

/// A client connection as seen by the room layer.
///
/// Created by the transport, shared as `Arc<Connection>` between the
/// transport and the rosters that list it. The seat lock is the innermost
/// lock: it is only taken while the pool lock and, if needed, the room
/// lock are already held, or on its own for a plain read.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    seat: Mutex<Seat>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> Arc<Self> {
        Arc::new(Self {
            id,
            seat: Mutex::new(Seat::default()),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The room this connection is attached to, if any.
    pub fn room(&self) -> Option<RoomId> {
        self.seat.lock().room
    }

    pub fn is_attached(&self) -> bool {
        self.room().is_some()
    }

    /// Copy of the current seat.
    pub fn seat(&self) -> Seat {
        *self.seat.lock()
    }

    pub(crate) fn lock_seat(&self) -> MutexGuard<'_, Seat> {
        self.seat.lock()
    }

    pub(crate) fn set_waiting_index(&self, index: usize) {
        self.seat.lock().waiting_index = index;
    }

    pub(crate) fn set_playing_index(&self, index: Option<usize>) {
        self.seat.lock().playing_index = index;
    }

    pub(crate) fn detach(&self) {
        *self.seat.lock() = Seat::default();
    }
}

/// Clears a connection's seat when dropped.
///
/// Leave holds one of these so the back-reference is gone on every exit
/// path, early returns included.
pub(crate) struct DetachGuard<'a>(pub(crate) &'a Connection);

impl Drop for DetachGuard<'_> {
    fn drop(&mut self) {
        self.0.detach();
    }
}
