//! Error types for the room layer.
//!
//! The `Display` text of a [`RoomError`] is what the requester reads in
//! its rejection reply, so it is phrased for players, not operators.

use avalon_protocol::RoomId;

/// Reasons a lobby or round operation was refused.
///
/// Every variant leaves rooms, rosters and reference counts exactly as
/// they were before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The connection already holds a room.
    #[error("You are already in a room.")]
    AlreadyInRoom,

    /// The connection does not hold a room.
    #[error("You are not in a room.")]
    NotInRoom,

    #[error("Nick name too long.")]
    NickTooLong,

    #[error("Password too long.")]
    PasswordTooLong,

    /// A password was supplied but it is the empty string.
    #[error("Empty password field.")]
    PasswordEmpty,

    /// Every room number is taken.
    #[error("All room number is occupied, no room left.")]
    PoolExhausted,

    /// The randomness source failed while picking a room number.
    #[error("Server internal error. failed to allocate a room.")]
    AllocationFailure,

    /// Players see the bare room number they typed.
    #[error("Room {} does not exist.", .0.number())]
    RoomNotFound(RoomId),

    #[error("Password is required.")]
    PasswordRequired,

    #[error("Wrong password.")]
    WrongPassword,

    /// Join was attempted while a round is running.
    #[error("The game has started already.")]
    GameAlreadyStarted,

    /// The waiting roster is at capacity.
    #[error("The room is full.")]
    RoomFull,

    /// Another waiting player already uses this exact nickname.
    #[error("Duplicate nickname, try another.")]
    DuplicateNickname,

    #[error("You are not room owner.")]
    NotRoomOwner,

    #[error("Too few players to start game.")]
    TooFewPlayers,

    /// Start (or an avatar change) was attempted during a round.
    #[error("Game already started.")]
    AlreadyStarted,

    #[error("Game hasn't started yet.")]
    NotStarted,

    #[error("You are not the leader.")]
    NotLeader,

    /// A proposal lists more members than there are players.
    #[error("The number of people selected exceeded the limit.")]
    TooManyMembers,

    /// The stored proposal is larger than the playing roster.
    #[error("The proposed team exceeds the number of players.")]
    TeamTooLarge,

    #[error("The room doesn't have the fairy.")]
    FairyDisabled,

    #[error("You are not fairy.")]
    NotFairy,

    #[error("You are not assassin.")]
    NotAssassin,

    /// The target `GameId` is not in the playing roster.
    #[error("Invalid ID.")]
    InvalidTarget,

    /// Role assignment, leader selection or configuration failed.
    #[error("Server internal error. {0}")]
    Internal(String),
}

/// The randomness source could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntropyError {
    /// A draw from `[0, 0)` was requested.
    #[error("cannot draw from an empty range")]
    EmptyRange,

    /// The underlying generator reported a failure.
    #[error("randomness source failed: {0}")]
    Source(String),
}
