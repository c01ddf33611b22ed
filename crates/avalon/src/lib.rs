//! # Avalon
//!
//! In-memory lobby and round manager for Avalon-style social deduction
//! games.
//!
//! The heavy lifting lives in `avalon-room`; this crate re-exports it,
//! adds a single error type, a channel-backed [`Notifier`] for in-process
//! transports, and logging setup.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use avalon::prelude::*;
//!
//! let notifier = std::sync::Arc::new(ChannelNotifier::new());
//! let pool = RoomPool::new(std::sync::Arc::clone(&notifier));
//!
//! let alice = Connection::new(ConnectionId(1));
//! let mut inbox = notifier.register(alice.id());
//! let room_id = pool.create(&alice, "Alice", None)?;
//! # let _ = (room_id, &mut inbox);
//! # Ok::<(), avalon::AvalonError>(())
//! ```

mod channel;
mod error;
pub mod telemetry;

pub use channel::{ChannelNotifier, Outbound, OutboundReceiver, OutboundSender};
pub use error::AvalonError;

pub use avalon_protocol::{
    Alignment, ConnectionId, GameId, Operation, Phase, PlayerView, Reply, Role, RoleReveal,
    RoomEvent, RoomId, RoomStatus, Winner,
};
pub use avalon_room::{
    Connection, Departure, Entropy, EntropyError, MAX_TABLE_PLAYERS, MIN_TABLE_PLAYERS,
    Notifier, NullNotifier, OsEntropy, RoomConfig, RoomError, RoomPool, RoomSnapshot, Seat,
    SeededEntropy, assign_roles, role_table,
};

/// Everything a transport needs to drive a pool.
pub mod prelude {
    pub use crate::{
        AvalonError, ChannelNotifier, Connection, ConnectionId, Departure, GameId, Notifier,
        Outbound, Reply, RoomConfig, RoomError, RoomEvent, RoomId, RoomPool,
    };
}
