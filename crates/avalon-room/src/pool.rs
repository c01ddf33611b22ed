//! Room pool: allocates room numbers, registers rooms, and routes every
//! request to the room its connection is attached to.
//!
//! # Locking
//!
//! ```text
//! pool lock (RwLock<Registry>)
//!   ├─ exclusive: create, leave
//!   └─ shared:    join, round operations, lookups
//!        └─ room lock (per room, exclusive for every mutation)
//!             └─ connection seat lock
//! ```
//!
//! A room's reference count only reaches zero inside `leave`, which holds
//! the pool lock exclusively, so no other request can be inside that room
//! while it is unregistered.

use std::sync::Arc;

use avalon_protocol::{GameId, Operation, Reply, RoomId, RoomStatus, Winner};
use parking_lot::RwLock;

use crate::connection::{DetachGuard, Seat};
use crate::notify::reject;
use crate::room::{Room, RoomSnapshot};
use crate::{Connection, Entropy, Notifier, OsEntropy, RoomConfig, RoomError};

/// What a `leave` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The player left; others are still in the room.
    Left(RoomId),
    /// The player was the last one; the room is gone.
    Closed(RoomId),
}

/// Slot storage plus the free-slot list.
///
/// `free[..capacity - live]` holds every unused slot. Allocation swaps the
/// drawn slot to the end of that prefix and shrinks it; release appends
/// the slot back. Both are O(1).
struct Registry {
    rooms: Vec<Option<Arc<Room>>>,
    free: Vec<u32>,
    live: usize,
}

impl Registry {
    fn new(capacity: usize) -> Self {
        Self {
            rooms: (0..capacity).map(|_| None).collect(),
            free: (0..capacity as u32).collect(),
            live: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.rooms.len()
    }

    fn free_count(&self) -> usize {
        self.capacity() - self.live
    }

    /// Picks a position in the free prefix without committing anything.
    fn draw(&self, entropy: &impl Entropy) -> Result<usize, RoomError> {
        let free = self.free_count();
        if free == 0 {
            return Err(RoomError::PoolExhausted);
        }
        entropy.pick(free).map_err(|e| {
            tracing::error!(error = %e, "room number allocation failed");
            RoomError::AllocationFailure
        })
    }

    fn slot_at(&self, position: usize) -> usize {
        self.free[position] as usize
    }

    /// Takes the slot at `position` out of the free prefix and stores `room`.
    fn commit(&mut self, position: usize, room: Arc<Room>) -> usize {
        let last = self.free_count() - 1;
        self.free.swap(position, last);
        let slot = self.free[last] as usize;
        self.rooms[slot] = Some(room);
        self.live += 1;
        slot
    }

    /// Unregisters the room in `slot` and returns the slot to the free list.
    fn release(&mut self, slot: usize) {
        if self.rooms[slot].take().is_none() {
            return;
        }
        let end = self.free_count();
        self.free[end] = slot as u32;
        self.live -= 1;
    }

    fn get(&self, slot: usize) -> Option<&Arc<Room>> {
        self.rooms.get(slot).and_then(Option::as_ref)
    }
}

/// The global registry of rooms.
///
/// Generic over the [`Notifier`] that carries replies and broadcasts and
/// the [`Entropy`] source used for room numbers, roles and leaders.
pub struct RoomPool<N: Notifier, E: Entropy = OsEntropy> {
    config: RoomConfig,
    registry: RwLock<Registry>,
    notifier: N,
    entropy: E,
}

impl<N: Notifier> RoomPool<N> {
    /// Creates a pool with the default limits and OS randomness.
    pub fn new(notifier: N) -> Self {
        Self::build(RoomConfig::default(), notifier, OsEntropy)
    }
}

impl<N: Notifier, E: Entropy> RoomPool<N, E> {
    /// Creates a pool with explicit limits and randomness source.
    ///
    /// # Errors
    /// [`RoomError::Internal`] if `config` fails [`RoomConfig::validate`].
    pub fn with_config(config: RoomConfig, notifier: N, entropy: E) -> Result<Self, RoomError> {
        config.validate()?;
        Ok(Self::build(config, notifier, entropy))
    }

    fn build(config: RoomConfig, notifier: N, entropy: E) -> Self {
        let registry = Registry::new(config.capacity());
        Self {
            config,
            registry: RwLock::new(registry),
            notifier,
            entropy,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn slot_of(&self, room_id: RoomId) -> Option<usize> {
        self.config
            .contains(room_id.0)
            .then(|| (room_id.0 - self.config.min_room_id) as usize)
    }

    fn room_id_of(&self, slot: usize) -> RoomId {
        RoomId(self.config.min_room_id + slot as u32)
    }

    // -----------------------------------------------------------------------
    // Lifecycle: create / join / leave
    // -----------------------------------------------------------------------

    /// Opens a new room with `conn` as its owner and only player.
    ///
    /// The room number is drawn uniformly from the free numbers.
    ///
    /// # Errors
    /// `AlreadyInRoom`, `NickTooLong`, `PasswordTooLong`, `PasswordEmpty`,
    /// `PoolExhausted`, `AllocationFailure`. The requester is sent a
    /// rejection reply in every case.
    pub fn create(
        &self,
        conn: &Arc<Connection>,
        nickname: &str,
        password: Option<&str>,
    ) -> Result<RoomId, RoomError> {
        let result = self.try_create(conn, nickname, password);
        if let Err(err) = &result {
            reject(&self.notifier, conn, Operation::CreateRoom, err);
        }
        result
    }

    fn try_create(
        &self,
        conn: &Arc<Connection>,
        nickname: &str,
        password: Option<&str>,
    ) -> Result<RoomId, RoomError> {
        if conn.is_attached() {
            return Err(RoomError::AlreadyInRoom);
        }
        if nickname.len() > self.config.max_nick_len {
            return Err(RoomError::NickTooLong);
        }
        if let Some(password) = password {
            if password.len() > self.config.max_password_len {
                return Err(RoomError::PasswordTooLong);
            }
            if password.is_empty() {
                return Err(RoomError::PasswordEmpty);
            }
        }

        let mut registry = self.registry.write();
        let mut seat = conn.lock_seat();
        if seat.room.is_some() {
            return Err(RoomError::AlreadyInRoom);
        }

        let position = registry.draw(&self.entropy)?;
        let room_id = self.room_id_of(registry.slot_at(position));
        let room = Room::open(room_id, conn, nickname, password, &self.config)?;
        let slot = registry.commit(position, Arc::new(room));
        *seat = Seat::attached(room_id, 0);
        drop(seat);

        tracing::info!(%room_id, conn = %conn.id(), live = registry.live, "room opened");

        if self.notifier.reply(conn, Reply::RoomCreated { room_id }) {
            if let Some(room) = registry.get(slot) {
                room.announce_status(&self.notifier);
            }
        }
        Ok(room_id)
    }

    /// Adds `conn` to an existing room's waiting roster.
    ///
    /// Returns the `GameId` assigned to the new player.
    ///
    /// # Errors
    /// `AlreadyInRoom`, `NickTooLong`, `RoomNotFound`, `PasswordRequired`,
    /// `WrongPassword`, `GameAlreadyStarted`, `RoomFull`,
    /// `DuplicateNickname`. Nothing changes on error.
    pub fn join(
        &self,
        room_id: RoomId,
        conn: &Arc<Connection>,
        nickname: &str,
        password: Option<&str>,
    ) -> Result<GameId, RoomError> {
        let result = self.try_join(room_id, conn, nickname, password);
        if let Err(err) = &result {
            reject(&self.notifier, conn, Operation::JoinRoom, err);
        }
        result
    }

    fn try_join(
        &self,
        room_id: RoomId,
        conn: &Arc<Connection>,
        nickname: &str,
        password: Option<&str>,
    ) -> Result<GameId, RoomError> {
        if conn.is_attached() {
            return Err(RoomError::AlreadyInRoom);
        }
        if nickname.len() > self.config.max_nick_len {
            return Err(RoomError::NickTooLong);
        }

        let registry = self.registry.read();
        let room = self
            .slot_of(room_id)
            .and_then(|slot| registry.get(slot))
            .ok_or(RoomError::RoomNotFound(room_id))?;
        room.check_password(password)?;
        room.join(conn, nickname, &self.notifier)
    }

    /// Detaches `conn` from its room, closing the room if it was the last
    /// player.
    ///
    /// Does nothing for an unattached connection. The connection is always
    /// unattached afterwards.
    pub fn leave(&self, conn: &Connection) -> Option<Departure> {
        let mut registry = self.registry.write();
        let _detach = DetachGuard(conn);

        let room_id = conn.room()?;
        let Some(slot) = self.slot_of(room_id) else {
            tracing::warn!(%room_id, conn = %conn.id(), "seat points outside the room range");
            return None;
        };
        let closed = registry.get(slot)?.release(conn, &self.notifier);
        if closed {
            registry.release(slot);
            tracing::info!(%room_id, live = registry.live, "room closed");
            Some(Departure::Closed(room_id))
        } else {
            Some(Departure::Left(room_id))
        }
    }

    // -----------------------------------------------------------------------
    // Requests against the caller's own room
    // -----------------------------------------------------------------------

    /// Runs `f` on the caller's room under the shared pool lock, sending a
    /// rejection reply if it fails.
    fn in_own_room<T>(
        &self,
        conn: &Connection,
        op: Operation,
        f: impl FnOnce(&Room) -> Result<T, RoomError>,
    ) -> Result<T, RoomError> {
        let registry = self.registry.read();
        let result = conn
            .room()
            .and_then(|room_id| self.slot_of(room_id))
            .and_then(|slot| registry.get(slot))
            .ok_or(RoomError::NotInRoom)
            .and_then(|room| f(room.as_ref()));
        if let Err(err) = &result {
            reject(&self.notifier, conn, op, err);
        }
        result
    }

    /// Sets the caller's avatar. No reply is sent; the room sees the new
    /// status. Avatars longer than the limit are silently ignored.
    pub fn change_avatar(&self, conn: &Connection, avatar: &str) -> Result<(), RoomError> {
        let registry = self.registry.read();
        let room = conn
            .room()
            .and_then(|room_id| self.slot_of(room_id))
            .and_then(|slot| registry.get(slot))
            .ok_or(RoomError::NotInRoom)?;
        room.change_avatar(conn, avatar, &self.config, &self.notifier)
    }

    /// Starts a round. Only the owner may, with at least `min_players`.
    pub fn start_game(&self, conn: &Connection) -> Result<(), RoomError> {
        self.in_own_room(conn, Operation::StartGame, |room| {
            room.start_game(conn, &self.config, &self.entropy, &self.notifier)
        })
    }

    /// The leader proposes a team.
    pub fn select_team(&self, conn: &Connection, members: Vec<GameId>) -> Result<(), RoomError> {
        self.in_own_room(conn, Operation::SelectTeam, |room| {
            room.select_team(conn, members, &self.notifier)
        })
    }

    /// The leader confirms the stored proposal.
    pub fn confirm_team(&self, conn: &Connection) -> Result<(), RoomError> {
        self.in_own_room(conn, Operation::ConfirmTeam, |room| {
            room.confirm_team(conn, &self.notifier)
        })
    }

    pub fn vote_team(&self, conn: &Connection, approve: bool) -> Result<(), RoomError> {
        self.in_own_room(conn, Operation::VoteTeam, |room| {
            room.vote_team(conn, approve, &self.notifier)
        })
    }

    pub fn conduct_mission(&self, conn: &Connection, succeed: bool) -> Result<(), RoomError> {
        self.in_own_room(conn, Operation::ConductMission, |room| {
            room.conduct_mission(conn, succeed, &self.notifier)
        })
    }

    pub fn fairy_inspect(&self, conn: &Connection, target: GameId) -> Result<(), RoomError> {
        self.in_own_room(conn, Operation::FairyInspect, |room| {
            room.fairy_inspect(conn, target, &self.notifier)
        })
    }

    /// The assassin names a target; the round ends either way.
    pub fn assassinate(&self, conn: &Connection, target: GameId) -> Result<Winner, RoomError> {
        self.in_own_room(conn, Operation::Assassinate, |room| {
            room.assassinate(conn, target, &self.notifier)
        })
    }

    pub fn text_message(&self, conn: &Connection, text: &str) -> Result<(), RoomError> {
        self.in_own_room(conn, Operation::TextMessage, |room| {
            room.text_message(conn, text, &self.notifier)
        })
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Lobby status of a live room.
    pub fn status(&self, room_id: RoomId) -> Option<RoomStatus> {
        let registry = self.registry.read();
        self.slot_of(room_id)
            .and_then(|slot| registry.get(slot))
            .map(|room| room.status())
    }

    /// Full state copy of a live room.
    pub fn snapshot(&self, room_id: RoomId) -> Option<RoomSnapshot> {
        let registry = self.registry.read();
        self.slot_of(room_id)
            .and_then(|slot| registry.get(slot))
            .map(|room| room.snapshot())
    }

    /// Number of room slots.
    pub fn capacity(&self) -> usize {
        self.registry.read().capacity()
    }

    pub fn live_count(&self) -> usize {
        self.registry.read().live
    }

    pub fn free_count(&self) -> usize {
        self.registry.read().free_count()
    }

    /// Numbers of every live room, ascending.
    pub fn room_ids(&self) -> Vec<RoomId> {
        let registry = self.registry.read();
        registry
            .rooms
            .iter()
            .flatten()
            .map(|room| room.id())
            .collect()
    }
}
