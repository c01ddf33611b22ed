//! A room: rosters, phase and the round state machine behind one lock.
//!
//! Every method here expects the caller to already hold the pool lock
//! (shared or exclusive) and takes the room lock itself, so the lock
//! order is always pool → room → connection seat. Each operation
//! validates, commits, and only then replies and broadcasts.

use std::sync::Arc;

use avalon_protocol::{
    GameId, Operation, Phase, PlayerView, Reply, Role, RoleReveal, RoomEvent, RoomId,
    RoomStatus, Winner,
};
use parking_lot::RwLock;

use crate::connection::Seat;
use crate::roles::assign_roles;
use crate::roster::{PlayerInfo, Roster};
use crate::{Connection, Entropy, Notifier, RoomConfig, RoomError};

/// Read-only copy of a room's full state, for inspection and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub phase: Phase,
    /// Connections currently attached.
    pub ref_count: usize,
    pub waiting: Vec<PlayerView>,
    /// Playing roster `GameId`s in seat order.
    pub playing: Vec<GameId>,
    /// Whether each playing seat still has a connection.
    pub playing_connected: Vec<bool>,
    /// `roles[i]` is the role of `playing[i]`.
    pub roles: Vec<Role>,
    pub leader: Option<usize>,
    pub fairy: Option<usize>,
    pub team: Vec<GameId>,
}

/// Everything the room lock guards.
#[derive(Debug)]
struct RoomState {
    ref_count: usize,
    phase: Phase,
    next_game_id: u32,
    waiting: Roster,
    playing: Roster,
    roles: Vec<Role>,
    leader: usize,
    fairy: Option<usize>,
    team: Vec<GameId>,
}

impl RoomState {
    /// Waiting-roster position of `conn`, checked against the roster.
    fn waiting_index(&self, conn: &Connection) -> Result<usize, RoomError> {
        let index = conn.seat().waiting_index;
        match self.waiting.get(index) {
            Some(entry) if entry.is_held_by(conn) => Ok(index),
            _ => Err(RoomError::NotInRoom),
        }
    }

    /// Playing-roster position of `conn`. Requires an active round.
    fn playing_index(&self, conn: &Connection) -> Result<usize, RoomError> {
        if !self.phase.is_active() {
            return Err(RoomError::NotStarted);
        }
        conn.seat()
            .playing_index
            .filter(|i| self.playing.get(*i).is_some_and(|p| p.is_held_by(conn)))
            .ok_or(RoomError::NotInRoom)
    }

    fn leader_index(&self, conn: &Connection) -> Result<usize, RoomError> {
        let seat = self.playing_index(conn)?;
        if seat != self.leader {
            return Err(RoomError::NotLeader);
        }
        Ok(seat)
    }
}

pub(crate) struct Room {
    id: RoomId,
    password: Option<String>,
    state: RwLock<RoomState>,
}

impl Room {
    /// Builds a room with `owner` as its only waiting player.
    ///
    /// The caller attaches the owner's seat; this only fills the roster.
    pub(crate) fn open(
        id: RoomId,
        owner: &Arc<Connection>,
        nickname: &str,
        password: Option<&str>,
        config: &RoomConfig,
    ) -> Result<Self, RoomError> {
        let mut waiting = Roster::with_capacity(config.max_players);
        waiting.push(PlayerInfo::new(GameId(0), nickname, owner))?;
        Ok(Self {
            id,
            password: password.map(str::to_owned),
            state: RwLock::new(RoomState {
                ref_count: 1,
                phase: Phase::Waiting,
                next_game_id: 1,
                waiting,
                playing: Roster::with_capacity(config.max_players),
                roles: Vec::new(),
                leader: 0,
                fairy: None,
                team: Vec::new(),
            }),
        })
    }

    pub(crate) fn id(&self) -> RoomId {
        self.id
    }

    pub(crate) fn check_password(&self, given: Option<&str>) -> Result<(), RoomError> {
        match (self.password.as_deref(), given) {
            (None, _) => Ok(()),
            (Some(_), None) => Err(RoomError::PasswordRequired),
            (Some(expected), Some(given)) if expected == given => Ok(()),
            (Some(_), Some(_)) => Err(RoomError::WrongPassword),
        }
    }

    pub(crate) fn status(&self) -> RoomStatus {
        self.status_of(&self.state.read())
    }

    pub(crate) fn snapshot(&self) -> RoomSnapshot {
        let state = self.state.read();
        let active = state.phase.is_active();
        RoomSnapshot {
            room_id: self.id,
            phase: state.phase,
            ref_count: state.ref_count,
            waiting: state.waiting.views(),
            playing: state.playing.iter().map(|p| p.game_id).collect(),
            playing_connected: state.playing.iter().map(PlayerInfo::is_connected).collect(),
            roles: state.roles.clone(),
            leader: active.then_some(state.leader),
            fairy: if active { state.fairy } else { None },
            team: state.team.clone(),
        }
    }

    fn status_of(&self, state: &RoomState) -> RoomStatus {
        RoomStatus {
            room_id: self.id,
            phase: state.phase,
            has_password: self.password.is_some(),
            players: state.waiting.views(),
        }
    }

    fn broadcast(&self, state: &RoomState, notifier: &impl Notifier, event: &RoomEvent) -> bool {
        let delivered = notifier.broadcast(&state.waiting.connections(), event);
        if !delivered {
            tracing::warn!(room_id = %self.id, "broadcast not fully delivered");
        }
        delivered
    }

    fn broadcast_status(&self, state: &RoomState, notifier: &impl Notifier) -> bool {
        self.broadcast(state, notifier, &RoomEvent::Status(self.status_of(state)))
    }

    pub(crate) fn announce_status(&self, notifier: &impl Notifier) -> bool {
        self.broadcast_status(&self.state.read(), notifier)
    }

    /// Sends the success reply, then `event` only if the reply got out.
    fn accept_then(
        &self,
        state: &RoomState,
        notifier: &impl Notifier,
        conn: &Connection,
        op: Operation,
        event: Option<RoomEvent>,
    ) {
        if !notifier.reply(conn, Reply::Accepted { op }) {
            tracing::warn!(room_id = %self.id, conn = %conn.id(), ?op, "reply not delivered");
            return;
        }
        if let Some(event) = event {
            self.broadcast(state, notifier, &event);
        }
    }

    // -----------------------------------------------------------------------
    // Roster changes
    // -----------------------------------------------------------------------

    /// Adds `conn` to the waiting roster. Caller holds the pool lock shared.
    pub(crate) fn join(
        &self,
        conn: &Arc<Connection>,
        nickname: &str,
        notifier: &impl Notifier,
    ) -> Result<GameId, RoomError> {
        let mut state = self.state.write();
        if state.phase.is_active() {
            return Err(RoomError::GameAlreadyStarted);
        }
        if state.waiting.is_full() {
            return Err(RoomError::RoomFull);
        }
        if state.waiting.has_nickname(nickname) {
            return Err(RoomError::DuplicateNickname);
        }

        let game_id = GameId(state.next_game_id);
        {
            let mut seat = conn.lock_seat();
            if seat.room.is_some() {
                return Err(RoomError::AlreadyInRoom);
            }
            let index = state.waiting.push(PlayerInfo::new(game_id, nickname, conn))?;
            *seat = Seat::attached(self.id, index);
        }
        state.next_game_id += 1;
        state.ref_count += 1;

        tracing::info!(
            room_id = %self.id,
            conn = %conn.id(),
            %game_id,
            players = state.waiting.len(),
            "player joined"
        );

        if notifier.reply(conn, Reply::RoomJoined { game_id }) {
            self.broadcast_status(&state, notifier);
        }
        Ok(game_id)
    }

    /// Drops one reference held by `conn`. Caller holds the pool lock
    /// exclusively.
    ///
    /// Returns `true` when that was the last reference; the caller then
    /// unregisters the room and nothing else is touched. Otherwise the
    /// player's entry is removed and the rest of the room is told.
    pub(crate) fn release(&self, conn: &Connection, notifier: &impl Notifier) -> bool {
        let mut state = self.state.write();
        state.ref_count = state.ref_count.saturating_sub(1);
        if state.ref_count == 0 {
            return true;
        }

        let found = state.waiting_index(conn);
        match found {
            Ok(index) => {
                state.waiting.remove(index);
                if index == 0 {
                    if let Some(owner) = state.waiting.get(0) {
                        tracing::info!(
                            room_id = %self.id,
                            owner = %owner.game_id,
                            "room owner transferred"
                        );
                    }
                }
            }
            Err(_) => {
                tracing::warn!(room_id = %self.id, conn = %conn.id(), "leaving player not in waiting roster");
            }
        }
        // Playing indices are cleared at round end, so search by holder.
        let index = state.playing.iter().position(|p| p.is_held_by(conn));
        if let Some(index) = index {
            state.playing.disconnect(index);
        }

        tracing::info!(
            room_id = %self.id,
            conn = %conn.id(),
            players = state.waiting.len(),
            "player left"
        );
        self.broadcast_status(&state, notifier);
        false
    }

    /// Replaces the caller's avatar. Over-long avatars are ignored.
    pub(crate) fn change_avatar(
        &self,
        conn: &Connection,
        avatar: &str,
        config: &RoomConfig,
        notifier: &impl Notifier,
    ) -> Result<(), RoomError> {
        if avatar.len() > config.max_avatar_len {
            return Ok(());
        }
        let mut state = self.state.write();
        if state.phase.is_active() {
            return Err(RoomError::AlreadyStarted);
        }
        let index = state.waiting_index(conn)?;
        if let Some(entry) = state.waiting.get_mut(index) {
            entry.avatar = avatar.to_owned();
        }
        self.broadcast_status(&state, notifier);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Round state machine
    // -----------------------------------------------------------------------

    /// Snapshots the waiting roster, deals roles, draws the leader and
    /// (at the fairy threshold) seats the fairy just before the leader.
    pub(crate) fn start_game(
        &self,
        conn: &Connection,
        config: &RoomConfig,
        entropy: &impl Entropy,
        notifier: &impl Notifier,
    ) -> Result<(), RoomError> {
        let mut state = self.state.write();
        let me = state.waiting_index(conn)?;
        if !state.waiting.get(me).is_some_and(|p| p.is_owner) {
            return Err(RoomError::NotRoomOwner);
        }
        if state.waiting.len() < config.min_players {
            return Err(RoomError::TooFewPlayers);
        }
        if state.phase.is_active() {
            return Err(RoomError::AlreadyStarted);
        }

        // Draw everything before touching state.
        let count = state.waiting.len();
        let roles = assign_roles(count, entropy)?;
        let leader = entropy.pick(count).map_err(|e| {
            tracing::error!(room_id = %self.id, error = %e, "leader draw failed");
            RoomError::Internal("failed to choose a leader.".into())
        })?;
        let fairy = (count >= config.fairy_threshold).then(|| (leader + count - 1) % count);

        state.playing = state.waiting.clone();
        for (index, entry) in state.playing.iter().enumerate() {
            if let Some(player) = &entry.conn {
                player.set_playing_index(Some(index));
            }
        }
        state.roles = roles;
        state.leader = leader;
        state.fairy = fairy;
        state.team.clear();
        state.phase = Phase::Active;

        tracing::info!(
            room_id = %self.id,
            players = count,
            leader,
            fairy = ?fairy,
            "game started"
        );

        notifier.reply(conn, Reply::Accepted { op: Operation::StartGame });

        let fairy_id = fairy
            .and_then(|i| state.playing.get(i))
            .map_or(GameId(0), |p| p.game_id);
        for (entry, role) in state.playing.iter().zip(&state.roles) {
            if let Some(player) = &entry.conn {
                let reveal = RoleReveal {
                    role: *role,
                    fairy_enabled: fairy.is_some(),
                    fairy: fairy_id,
                };
                if !notifier.begin_game(player, reveal) {
                    tracing::warn!(room_id = %self.id, conn = %player.id(), "role reveal not delivered");
                }
            }
        }
        Ok(())
    }

    /// Stores the leader's proposed team and shows it to the room.
    pub(crate) fn select_team(
        &self,
        conn: &Connection,
        members: Vec<GameId>,
        notifier: &impl Notifier,
    ) -> Result<(), RoomError> {
        let mut state = self.state.write();
        state.leader_index(conn)?;
        if members.len() > state.playing.len() {
            return Err(RoomError::TooManyMembers);
        }
        state.team = members;

        let event = RoomEvent::TeamSelected { members: state.team.clone() };
        self.accept_then(&state, notifier, conn, Operation::SelectTeam, Some(event));
        Ok(())
    }

    /// Locks in the stored proposal.
    pub(crate) fn confirm_team(
        &self,
        conn: &Connection,
        notifier: &impl Notifier,
    ) -> Result<(), RoomError> {
        let state = self.state.write();
        state.leader_index(conn)?;
        if state.team.len() > state.playing.len() {
            return Err(RoomError::TeamTooLarge);
        }

        let event = RoomEvent::TeamConfirmed { members: state.team.clone() };
        self.accept_then(&state, notifier, conn, Operation::ConfirmTeam, Some(event));
        Ok(())
    }

    /// Acknowledges a team vote. No tally is kept yet.
    pub(crate) fn vote_team(
        &self,
        conn: &Connection,
        approve: bool,
        notifier: &impl Notifier,
    ) -> Result<(), RoomError> {
        let state = self.state.write();
        let seat = state.playing_index(conn)?;
        tracing::debug!(room_id = %self.id, seat, approve, "team vote received");
        self.accept_then(&state, notifier, conn, Operation::VoteTeam, None);
        Ok(())
    }

    /// Acknowledges a mission card. No outcome is kept yet.
    pub(crate) fn conduct_mission(
        &self,
        conn: &Connection,
        succeed: bool,
        notifier: &impl Notifier,
    ) -> Result<(), RoomError> {
        let state = self.state.write();
        let seat = state.playing_index(conn)?;
        tracing::debug!(room_id = %self.id, seat, succeed, "mission card received");
        self.accept_then(&state, notifier, conn, Operation::ConductMission, None);
        Ok(())
    }

    /// Lets the fairy inspect `target`. Only the fact of the inspection is
    /// broadcast.
    pub(crate) fn fairy_inspect(
        &self,
        conn: &Connection,
        target: GameId,
        notifier: &impl Notifier,
    ) -> Result<(), RoomError> {
        let state = self.state.write();
        let Some(fairy) = state.fairy else {
            return Err(RoomError::FairyDisabled);
        };
        if state.playing_index(conn)? != fairy {
            return Err(RoomError::NotFairy);
        }
        if state.playing.position_of(target).is_none() {
            return Err(RoomError::InvalidTarget);
        }

        tracing::debug!(room_id = %self.id, %target, "fairy inspection");
        let event = RoomEvent::FairyInspected { target };
        self.accept_then(&state, notifier, conn, Operation::FairyInspect, Some(event));
        Ok(())
    }

    /// Resolves the assassin's strike and ends the round.
    ///
    /// The room returns to `Waiting` and stays open.
    pub(crate) fn assassinate(
        &self,
        conn: &Connection,
        target: GameId,
        notifier: &impl Notifier,
    ) -> Result<Winner, RoomError> {
        let mut state = self.state.write();
        let me = state.playing_index(conn)?;
        if state.roles.get(me) != Some(&Role::Assassin) {
            return Err(RoomError::NotAssassin);
        }
        let victim = state
            .playing
            .position_of(target)
            .ok_or(RoomError::InvalidTarget)?;

        let (winner, reason) = if state.roles.get(victim) == Some(&Role::Merlin) {
            (Winner::Evil, "merlin was assassinated.")
        } else {
            (Winner::Good, "assassin failed to kill merlin.")
        };

        state.phase = Phase::Waiting;
        for entry in state.playing.iter() {
            if let Some(player) = &entry.conn {
                player.set_playing_index(None);
            }
        }
        tracing::info!(room_id = %self.id, ?winner, "game ended");

        if notifier.reply(conn, Reply::Accepted { op: Operation::Assassinate }) {
            let ended = RoomEvent::GameEnded {
                winner,
                reason: reason.to_owned(),
            };
            if self.broadcast(&state, notifier, &ended) {
                self.broadcast_status(&state, notifier);
            }
        }
        Ok(winner)
    }

    /// Relays chat during a round, tagged with the sender's seat.
    pub(crate) fn text_message(
        &self,
        conn: &Connection,
        text: &str,
        notifier: &impl Notifier,
    ) -> Result<(), RoomError> {
        let state = self.state.write();
        let seat = state.playing_index(conn)?;
        let event = RoomEvent::Text {
            seat,
            text: text.to_owned(),
        };
        self.accept_then(&state, notifier, conn, Operation::TextMessage, Some(event));
        Ok(())
    }
}
