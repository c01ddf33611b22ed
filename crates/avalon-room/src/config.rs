//! Lobby configuration.

use serde::{Deserialize, Serialize};

use crate::RoomError;
use crate::roles::{MAX_TABLE_PLAYERS, MIN_TABLE_PLAYERS};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Limits shared by every room in a pool.
///
/// The defaults are the values the clients are built against; change them
/// only together with the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Lowest room number handed out (inclusive).
    pub min_room_id: u32,

    /// Upper bound of room numbers (exclusive).
    pub max_room_id: u32,

    /// Minimum waiting-roster size needed to start a game.
    pub min_players: usize,

    /// Waiting-roster capacity.
    pub max_players: usize,

    /// Longest accepted nickname, in bytes.
    pub max_nick_len: usize,

    /// Longest accepted avatar string, in bytes.
    pub max_avatar_len: usize,

    /// Longest accepted room password, in bytes.
    pub max_password_len: usize,

    /// Player count at which the fairy joins the game.
    pub fairy_threshold: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_room_id: 10_000,
            max_room_id: 99_999,
            min_players: 5,
            max_players: 10,
            max_nick_len: 32,
            max_avatar_len: 32,
            max_password_len: 32,
            fairy_threshold: 7,
        }
    }
}

impl RoomConfig {
    /// Number of room slots the pool manages.
    pub fn capacity(&self) -> usize {
        self.max_room_id.saturating_sub(self.min_room_id) as usize
    }

    /// Returns `true` if `room_number` falls inside the configured range.
    pub fn contains(&self, room_number: u32) -> bool {
        (self.min_room_id..self.max_room_id).contains(&room_number)
    }

    /// Checks that the limits are usable together.
    ///
    /// Player bounds must stay inside the counts the role tables cover.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.capacity() == 0 {
            return Err(RoomError::Internal(format!(
                "empty room number range {}..{}",
                self.min_room_id, self.max_room_id
            )));
        }
        if self.min_players < MIN_TABLE_PLAYERS || self.max_players > MAX_TABLE_PLAYERS {
            return Err(RoomError::Internal(format!(
                "player bounds {}..={} outside role tables {}..={}",
                self.min_players, self.max_players, MIN_TABLE_PLAYERS, MAX_TABLE_PLAYERS
            )));
        }
        if self.min_players > self.max_players {
            return Err(RoomError::Internal(format!(
                "min_players {} exceeds max_players {}",
                self.min_players, self.max_players
            )));
        }
        Ok(())
    }
}
