//! Shared vocabulary for the Avalon lobby.
//!
//! - **Types** ([`RoomId`], [`GameId`], [`ConnectionId`], [`Role`],
//!   [`Phase`], [`Winner`]) — identities and game terms.
//! - **Messages** ([`Reply`], [`RoomEvent`], [`RoleReveal`],
//!   [`RoomStatus`]) — what the core hands to the notifier.
//!
//! ```text
//! Transport (bytes) → Protocol (this crate) → Room core
//! ```

mod messages;
mod types;

pub use messages::{Operation, PlayerView, Reply, RoleReveal, RoomEvent, RoomStatus};
pub use types::{Alignment, ConnectionId, GameId, Phase, Role, RoomId, Winner};
