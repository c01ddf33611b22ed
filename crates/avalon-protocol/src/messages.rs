//! Outbound notifications: what the lobby core asks the transport to send.
//!
//! There are three shapes of outbound traffic:
//!
//! - [`Reply`] — the single answer to the connection that made a request.
//! - [`RoomEvent`] — fanned out to every connection attached to a room.
//! - [`RoleReveal`] — the private, per-player message sent at game start.
//!
//! Encoding these to bytes is the transport's business. The serde derives
//! are there so it can.

use serde::{Deserialize, Serialize};

use crate::{GameId, Phase, Role, RoomId, Winner};

/// The request a [`Reply`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    CreateRoom,
    JoinRoom,
    StartGame,
    SelectTeam,
    ConfirmTeam,
    VoteTeam,
    ConductMission,
    FairyInspect,
    Assassinate,
    TextMessage,
}

/// The answer to one request, sent only to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Reply {
    /// A room was created; the requester is its owner.
    RoomCreated { room_id: RoomId },

    /// The requester joined a room and got this in-room identifier.
    RoomJoined { game_id: GameId },

    /// The request succeeded and carries no payload.
    Accepted { op: Operation },

    /// The request was refused; `reason` is human-readable.
    Rejected { op: Operation, reason: String },
}

impl Reply {
    /// Returns `true` for every variant except `Rejected`.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// One waiting-roster entry as the clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub game_id: GameId,
    pub nickname: String,
    pub avatar: String,
    pub is_owner: bool,
}

/// Snapshot of a room's lobby state, in waiting-roster order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStatus {
    pub room_id: RoomId,
    pub phase: Phase,
    pub has_password: bool,
    pub players: Vec<PlayerView>,
}

/// An event fanned out to everyone attached to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    /// The roster, an avatar or the phase changed.
    Status(RoomStatus),

    /// The leader proposed a team.
    TeamSelected { members: Vec<GameId> },

    /// The leader locked in the proposed team.
    TeamConfirmed { members: Vec<GameId> },

    /// The fairy inspected someone. The verdict itself is not broadcast.
    FairyInspected { target: GameId },

    /// The round is over.
    GameEnded { winner: Winner, reason: String },

    /// Chat from the player sitting at `seat` in the playing roster.
    Text { seat: usize, text: String },
}

/// The private game-start message for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleReveal {
    pub role: Role,
    pub fairy_enabled: bool,
    /// The fairy's `GameId`, or `GameId(0)` when there is no fairy.
    pub fairy: GameId,
}
