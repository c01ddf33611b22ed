//! Room pool and round state machine for the Avalon lobby.
//!
//! A single [`RoomPool`] owns every live room. Connections attach to at
//! most one room at a time; each request is validated, committed under
//! the room's lock, and only then answered through the [`Notifier`].
//!
//! # Key types
//!
//! - [`RoomPool`] — creates, joins, leaves and routes round operations
//! - [`Connection`] — one client session and its seat in a room
//! - [`Notifier`] — how replies and broadcasts leave the crate
//! - [`Entropy`] — randomness for room numbers, roles and leaders
//! - [`RoomConfig`] — room-number range and player limits
//! - [`RoomSnapshot`] — a read-only copy of a room's state

mod config;
mod connection;
mod entropy;
mod error;
mod notify;
mod pool;
mod roles;
mod room;
mod roster;

pub use config::RoomConfig;
pub use connection::{Connection, Seat};
pub use entropy::{Entropy, OsEntropy, SeededEntropy};
pub use error::{EntropyError, RoomError};
pub use notify::{Notifier, NullNotifier};
pub use pool::{Departure, RoomPool};
pub use roles::{MAX_TABLE_PLAYERS, MIN_TABLE_PLAYERS, assign_roles, role_table};
pub use room::RoomSnapshot;
