//! Ordered, bounded player lists.
//!
//! A room keeps two of these: the waiting roster (everyone currently
//! attached, owner first) and the playing roster (a frozen copy taken at
//! game start). Position 0 of a non-empty waiting roster is always the
//! owner.

use std::sync::Arc;

use avalon_protocol::{GameId, PlayerView};

use crate::{Connection, RoomError};

/// One player entry.
#[derive(Debug, Clone)]
pub struct PlayerInfo {
    pub game_id: GameId,
    pub nickname: String,
    pub avatar: String,
    pub is_owner: bool,
    /// `None` once the player has left a running round.
    pub(crate) conn: Option<Arc<Connection>>,
}

impl PlayerInfo {
    pub(crate) fn new(game_id: GameId, nickname: &str, conn: &Arc<Connection>) -> Self {
        Self {
            game_id,
            nickname: nickname.to_owned(),
            avatar: String::new(),
            is_owner: false,
            conn: Some(Arc::clone(conn)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub(crate) fn is_held_by(&self, conn: &Connection) -> bool {
        self.conn.as_deref().is_some_and(|c| std::ptr::eq(c, conn))
    }

    pub(crate) fn view(&self) -> PlayerView {
        PlayerView {
            game_id: self.game_id,
            nickname: self.nickname.clone(),
            avatar: self.avatar.clone(),
            is_owner: self.is_owner,
        }
    }
}

/// A capacity-checked sequence of [`PlayerInfo`].
#[derive(Debug, Clone)]
pub(crate) struct Roster {
    entries: Vec<PlayerInfo>,
    capacity: usize,
}

impl Roster {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub(crate) fn get(&self, index: usize) -> Option<&PlayerInfo> {
        self.entries.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut PlayerInfo> {
        self.entries.get_mut(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.entries.iter()
    }

    /// Exact, case-sensitive nickname match.
    pub(crate) fn has_nickname(&self, nickname: &str) -> bool {
        self.entries.iter().any(|p| p.nickname == nickname)
    }

    /// Linear search for a `GameId`.
    pub(crate) fn position_of(&self, game_id: GameId) -> Option<usize> {
        self.entries.iter().position(|p| p.game_id == game_id)
    }

    /// Appends an entry, marking it owner if the roster was empty.
    ///
    /// Returns the new entry's position.
    pub(crate) fn push(&mut self, mut entry: PlayerInfo) -> Result<usize, RoomError> {
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }
        entry.is_owner = self.entries.is_empty();
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// Removes the entry at `index`, shifting later entries down by one.
    ///
    /// Each shifted entry's connection gets its cached waiting index
    /// re-pointed. If position 0 was removed, the new position 0 becomes
    /// owner.
    pub(crate) fn remove(&mut self, index: usize) -> Option<PlayerInfo> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        for (position, entry) in self.entries.iter().enumerate().skip(index) {
            if let Some(conn) = &entry.conn {
                conn.set_waiting_index(position);
            }
        }
        if index == 0 {
            if let Some(first) = self.entries.first_mut() {
                first.is_owner = true;
            }
        }
        Some(removed)
    }

    /// Nulls the connection of the entry at `index`; membership and order
    /// are untouched.
    pub(crate) fn disconnect(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.conn = None;
        }
    }

    /// Connections of every entry still attached.
    pub(crate) fn connections(&self) -> Vec<&Connection> {
        self.entries.iter().filter_map(|p| p.conn.as_deref()).collect()
    }

    pub(crate) fn views(&self) -> Vec<PlayerView> {
        self.entries.iter().map(PlayerInfo::view).collect()
    }
}
