//! Identity and game vocabulary shared by the lobby core and its callers.
//!
//! Everything here is plain data: newtype IDs, the role table's element
//! type, and the phase/winner enums. None of it knows about locks or
//! rooms; those live in `avalon-room`.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The public number of a room, as players type it in to join.
///
/// Always inside the configured room-number range (by default
/// `10000..99999`). Unique among live rooms; a number is only handed out
/// again after the room that held it has been destroyed.
///
/// `#[serde(transparent)]` keeps it a plain number on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl RoomId {
    /// The number as players type it, without the log prefix.
    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A player's stable identifier inside one room.
///
/// Handed out from a per-room counter when the player creates or joins
/// the room. It survives roster compaction and the waiting → playing
/// snapshot, and is never reused while the room lives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameId(pub u32);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// Opaque identifier for a client connection, assigned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Which side a role plays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    Good,
    Evil,
}

/// A secret role dealt to one seat at game start.
///
/// The numeric discriminants are the role codes clients already know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Merlin = 1,
    Percival = 2,
    Assassin = 3,
    Mordred = 4,
    Oberon = 5,
    Morgana = 6,
    Loyalist = 7,
    Minion = 8,
}

impl Role {
    /// Returns the side this role belongs to.
    pub fn alignment(self) -> Alignment {
        match self {
            Self::Merlin | Self::Percival | Self::Loyalist => Alignment::Good,
            Self::Morgana
            | Self::Assassin
            | Self::Mordred
            | Self::Oberon
            | Self::Minion => Alignment::Evil,
        }
    }

    /// Returns the numeric role code.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Merlin => "Merlin",
            Self::Percival => "Percival",
            Self::Assassin => "Assassin",
            Self::Mordred => "Mordred",
            Self::Oberon => "Oberon",
            Self::Morgana => "Morgana",
            Self::Loyalist => "Loyalist",
            Self::Minion => "Minion",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Phase / Winner
// ---------------------------------------------------------------------------

/// Whether a room is gathering players or running a round.
///
/// ```text
/// Waiting ──(StartGame)──→ Active ──(Assassinate)──→ Waiting
/// ```
///
/// The room itself survives the round; only its phase flips back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Waiting,
    Active,
}

impl Phase {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Active => write!(f, "Active"),
        }
    }
}

/// The side that won a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Good,
    Evil,
}
