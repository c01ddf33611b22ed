//! Role deal: maps a player count to a shuffled fixed role multiset.

use avalon_protocol::Role;

use crate::{Entropy, RoomError};

use Role::{Assassin, Loyalist, Merlin, Minion, Mordred, Morgana, Oberon, Percival};

/// Smallest player count with a role table.
pub const MIN_TABLE_PLAYERS: usize = 5;

/// Largest player count with a role table.
pub const MAX_TABLE_PLAYERS: usize = 10;

const FIVE: &[Role] = &[Merlin, Percival, Loyalist, Morgana, Assassin];
const SIX: &[Role] = &[Merlin, Percival, Loyalist, Loyalist, Morgana, Assassin];
const SEVEN: &[Role] = &[
    Merlin, Percival, Loyalist, Loyalist, Morgana, Oberon, Assassin,
];
const EIGHT: &[Role] = &[
    Merlin, Percival, Loyalist, Loyalist, Loyalist, Morgana, Assassin, Minion,
];
const NINE: &[Role] = &[
    Merlin, Percival, Loyalist, Loyalist, Loyalist, Loyalist, Mordred, Morgana, Assassin,
];
const TEN: &[Role] = &[
    Merlin, Percival, Loyalist, Loyalist, Loyalist, Loyalist, Mordred, Morgana, Oberon,
    Assassin,
];

/// Returns the role multiset for `player_count`, or `None` outside 5..=10.
pub fn role_table(player_count: usize) -> Option<&'static [Role]> {
    match player_count {
        5 => Some(FIVE),
        6 => Some(SIX),
        7 => Some(SEVEN),
        8 => Some(EIGHT),
        9 => Some(NINE),
        10 => Some(TEN),
        _ => None,
    }
}

/// Deals the role table for `player_count` in uniformly random order.
///
/// Each step draws one of the remaining slots and swaps the last
/// remaining slot into its place, so every permutation is equally likely.
/// `result[i]` is the role of playing seat `i`.
///
/// # Errors
/// [`RoomError::Internal`] if there is no table for `player_count` or the
/// randomness source fails. Nothing is returned partially.
pub fn assign_roles(
    player_count: usize,
    entropy: &impl Entropy,
) -> Result<Vec<Role>, RoomError> {
    let table = role_table(player_count).ok_or_else(|| {
        RoomError::Internal(format!("no role table for {player_count} players."))
    })?;

    let mut remaining = table.to_vec();
    let mut dealt = Vec::with_capacity(player_count);
    for drawn in 0..player_count {
        let left = player_count - drawn;
        let pick = entropy.pick(left).map_err(|e| {
            tracing::error!(error = %e, "role assignment failed");
            RoomError::Internal("failed to assign role.".into())
        })?;
        dealt.push(remaining[pick]);
        remaining.swap(pick, left - 1);
    }
    Ok(dealt)
}
