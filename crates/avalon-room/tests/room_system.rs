//! End-to-end tests for the room pool using a recording notifier.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use avalon_protocol::{
    ConnectionId, GameId, Operation, Phase, Reply, Role, RoleReveal, RoomEvent, RoomId, Winner,
};
use avalon_room::{
    Connection, Departure, Entropy, EntropyError, Notifier, RoomConfig, RoomError, RoomPool,
    SeededEntropy, role_table,
};
use parking_lot::Mutex;

// =========================================================================
// Recording notifier
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Reply(ConnectionId, Reply),
    Event(ConnectionId, RoomEvent),
    Reveal(ConnectionId, RoleReveal),
}

#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<Sent>>,
}

impl Recorder {
    fn replies_to(&self, conn: &Connection) -> Vec<Reply> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Reply(id, reply) if *id == conn.id() => Some(reply.clone()),
                _ => None,
            })
            .collect()
    }

    fn last_reply_to(&self, conn: &Connection) -> Option<Reply> {
        self.replies_to(conn).pop()
    }

    fn events_to(&self, conn: &Connection) -> Vec<RoomEvent> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Event(id, event) if *id == conn.id() => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    fn reveals(&self) -> Vec<(ConnectionId, RoleReveal)> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Reveal(id, reveal) => Some((*id, reveal.clone())),
                _ => None,
            })
            .collect()
    }

    fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Notifier for Recorder {
    fn reply(&self, conn: &Connection, reply: Reply) -> bool {
        self.sent.lock().push(Sent::Reply(conn.id(), reply));
        true
    }

    fn broadcast(&self, recipients: &[&Connection], event: &RoomEvent) -> bool {
        let mut sent = self.sent.lock();
        for conn in recipients {
            sent.push(Sent::Event(conn.id(), event.clone()));
        }
        true
    }

    fn begin_game(&self, conn: &Connection, reveal: RoleReveal) -> bool {
        self.sent.lock().push(Sent::Reveal(conn.id(), reveal));
        true
    }
}

/// Succeeds for the first `budget` picks, then fails forever.
struct Budgeted {
    inner: SeededEntropy,
    budget: AtomicUsize,
}

impl Entropy for Budgeted {
    fn pick(&self, bound: usize) -> Result<usize, EntropyError> {
        let left = self.budget.load(Ordering::SeqCst);
        if left == 0 {
            return Err(EntropyError::Source("drained".into()));
        }
        self.budget.store(left - 1, Ordering::SeqCst);
        self.inner.pick(bound)
    }
}

// =========================================================================
// Helpers
// =========================================================================

type Pool = RoomPool<Recorder, SeededEntropy>;

fn pool(seed: u64) -> Pool {
    RoomPool::with_config(RoomConfig::default(), Recorder::default(), SeededEntropy::new(seed))
        .unwrap()
}

fn connections(n: u64) -> Vec<Arc<Connection>> {
    (0..n).map(|i| Connection::new(ConnectionId(i))).collect()
}

/// Alice creates a room and `conns[1..]` join in order, so `conns[i]`
/// always holds `GameId(i)`.
fn seat_all<E: Entropy>(pool: &RoomPool<Recorder, E>, conns: &[Arc<Connection>]) -> RoomId {
    let room_id = pool.create(&conns[0], "Alice", None).unwrap();
    for (i, conn) in conns.iter().enumerate().skip(1) {
        let game_id = pool.join(room_id, conn, &format!("player{i}"), None).unwrap();
        assert_eq!(game_id, GameId(i as u32));
    }
    room_id
}

fn holder<'a>(conns: &'a [Arc<Connection>], game_id: GameId) -> &'a Arc<Connection> {
    &conns[game_id.0 as usize]
}

fn seat_with_role(pool: &Pool, room_id: RoomId, role: Role) -> usize {
    let snapshot = pool.snapshot(room_id).unwrap();
    snapshot.roles.iter().position(|r| *r == role).unwrap()
}

fn sorted_codes(roles: impl IntoIterator<Item = Role>) -> Vec<u8> {
    let mut codes: Vec<u8> = roles.into_iter().map(Role::code).collect();
    codes.sort_unstable();
    codes
}

// =========================================================================
// Scenario A: a five-player round from create to assassination
// =========================================================================

#[test]
fn test_five_player_round_evil_wins_on_merlin_kill() {
    let pool = pool(42);
    let conns = connections(5);

    let room_id = pool.create(&conns[0], "Alice", None).unwrap();
    assert!(pool.config().contains(room_id.0));
    assert_eq!(
        pool.notifier().last_reply_to(&conns[0]),
        Some(Reply::RoomCreated { room_id })
    );

    let bob = pool.join(room_id, &conns[1], "Bob", None).unwrap();
    assert_eq!(bob, GameId(1));
    for (i, conn) in conns.iter().enumerate().skip(2) {
        pool.join(room_id, conn, &format!("player{i}"), None).unwrap();
    }

    let snapshot = pool.snapshot(room_id).unwrap();
    assert_eq!(snapshot.ref_count, 5);
    assert_eq!(snapshot.waiting[0].game_id, GameId(0));
    assert!(snapshot.waiting[0].is_owner);
    assert!(snapshot.waiting[1..].iter().all(|p| !p.is_owner));

    pool.start_game(&conns[0]).unwrap();

    let reveals = pool.notifier().reveals();
    assert_eq!(reveals.len(), 5);
    assert_eq!(
        sorted_codes(reveals.iter().map(|(_, r)| r.role)),
        sorted_codes(role_table(5).unwrap().iter().copied())
    );
    assert!(reveals.iter().all(|(_, r)| !r.fairy_enabled));

    let snapshot = pool.snapshot(room_id).unwrap();
    assert_eq!(snapshot.phase, Phase::Active);
    assert_eq!(snapshot.fairy, None);
    assert!(snapshot.leader.is_some_and(|l| l < 5));

    let assassin = seat_with_role(&pool, room_id, Role::Assassin);
    let merlin = seat_with_role(&pool, room_id, Role::Merlin);
    let assassin_conn = holder(&conns, snapshot.playing[assassin]);

    let winner = pool.assassinate(assassin_conn, snapshot.playing[merlin]).unwrap();

    assert_eq!(winner, Winner::Evil);
    for conn in &conns {
        assert!(pool.notifier().events_to(conn).contains(&RoomEvent::GameEnded {
            winner: Winner::Evil,
            reason: "merlin was assassinated.".into(),
        }));
        assert_eq!(conn.seat().playing_index, None);
    }
    assert_eq!(pool.status(room_id).unwrap().phase, Phase::Waiting);
}

#[test]
fn test_assassinate_wrong_target_good_wins() {
    let pool = pool(7);
    let conns = connections(5);
    let room_id = seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();

    let snapshot = pool.snapshot(room_id).unwrap();
    let assassin = seat_with_role(&pool, room_id, Role::Assassin);
    let percival = seat_with_role(&pool, room_id, Role::Percival);

    let winner = pool
        .assassinate(holder(&conns, snapshot.playing[assassin]), snapshot.playing[percival])
        .unwrap();

    assert_eq!(winner, Winner::Good);
    assert!(pool.notifier().events_to(&conns[0]).contains(&RoomEvent::GameEnded {
        winner: Winner::Good,
        reason: "assassin failed to kill merlin.".into(),
    }));
}

#[test]
fn test_assassinate_by_non_assassin_rejected() {
    let pool = pool(9);
    let conns = connections(5);
    let room_id = seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();

    let snapshot = pool.snapshot(room_id).unwrap();
    let merlin = seat_with_role(&pool, room_id, Role::Merlin);
    let merlin_conn = holder(&conns, snapshot.playing[merlin]);

    let result = pool.assassinate(merlin_conn, snapshot.playing[0]);

    assert_eq!(result, Err(RoomError::NotAssassin));
    assert_eq!(pool.status(room_id).unwrap().phase, Phase::Active);
    assert_eq!(
        pool.notifier().last_reply_to(merlin_conn),
        Some(Reply::Rejected {
            op: Operation::Assassinate,
            reason: "You are not assassin.".into(),
        })
    );
}

#[test]
fn test_assassinate_unknown_target_invalid() {
    let pool = pool(11);
    let conns = connections(5);
    let room_id = seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();

    let snapshot = pool.snapshot(room_id).unwrap();
    let assassin = seat_with_role(&pool, room_id, Role::Assassin);

    let result = pool.assassinate(holder(&conns, snapshot.playing[assassin]), GameId(99));

    assert_eq!(result, Err(RoomError::InvalidTarget));
}

#[test]
fn test_room_can_start_again_after_round_ends() {
    let pool = pool(3);
    let conns = connections(5);
    let room_id = seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();

    let snapshot = pool.snapshot(room_id).unwrap();
    let assassin = seat_with_role(&pool, room_id, Role::Assassin);
    pool.assassinate(holder(&conns, snapshot.playing[assassin]), snapshot.playing[0])
        .unwrap();

    assert_eq!(pool.start_game(&conns[0]), Ok(()));
    assert_eq!(pool.status(room_id).unwrap().phase, Phase::Active);
}

// =========================================================================
// Scenario B: ten players get a fairy
// =========================================================================

#[test]
fn test_ten_player_round_seats_fairy_before_leader() {
    let pool = pool(2024);
    let conns = connections(10);
    let room_id = seat_all(&pool, &conns);

    pool.start_game(&conns[0]).unwrap();

    let snapshot = pool.snapshot(room_id).unwrap();
    let leader = snapshot.leader.unwrap();
    let fairy = snapshot.fairy.unwrap();
    assert_eq!(fairy, (leader + 10 - 1) % 10);

    let fairy_id = snapshot.playing[fairy];
    let reveals = pool.notifier().reveals();
    assert_eq!(reveals.len(), 10);
    for (_, reveal) in &reveals {
        assert!(reveal.fairy_enabled);
        assert_eq!(reveal.fairy, fairy_id);
    }
    assert_eq!(
        sorted_codes(reveals.iter().map(|(_, r)| r.role)),
        sorted_codes(role_table(10).unwrap().iter().copied())
    );
}

#[test]
fn test_fairy_inspect_only_by_fairy() {
    let pool = pool(77);
    let conns = connections(7);
    let room_id = seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();

    let snapshot = pool.snapshot(room_id).unwrap();
    let fairy = snapshot.fairy.unwrap();
    let fairy_conn = holder(&conns, snapshot.playing[fairy]);
    let other = (fairy + 1) % 7;
    let target = snapshot.playing[other];

    assert_eq!(
        pool.fairy_inspect(holder(&conns, snapshot.playing[other]), target),
        Err(RoomError::NotFairy)
    );
    assert_eq!(
        pool.fairy_inspect(fairy_conn, GameId(50)),
        Err(RoomError::InvalidTarget)
    );
    assert_eq!(pool.fairy_inspect(fairy_conn, target), Ok(()));
    assert!(
        pool.notifier()
            .events_to(&conns[0])
            .contains(&RoomEvent::FairyInspected { target })
    );
}

#[test]
fn test_six_player_round_has_no_fairy() {
    let pool = pool(606);
    let conns = connections(6);
    let room_id = seat_all(&pool, &conns);

    pool.start_game(&conns[0]).unwrap();

    assert_eq!(pool.snapshot(room_id).unwrap().fairy, None);
    let reveals = pool.notifier().reveals();
    assert_eq!(reveals.len(), 6);
    for (_, reveal) in &reveals {
        assert!(!reveal.fairy_enabled);
        assert_eq!(reveal.fairy, GameId(0));
    }
    assert_eq!(
        pool.fairy_inspect(&conns[0], GameId(1)),
        Err(RoomError::FairyDisabled)
    );
}

#[test]
fn test_fairy_inspect_small_room_disabled() {
    let pool = pool(5);
    let conns = connections(5);
    seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();

    assert_eq!(
        pool.fairy_inspect(&conns[0], GameId(1)),
        Err(RoomError::FairyDisabled)
    );
}

// =========================================================================
// Scenario C: passwords
// =========================================================================

#[test]
fn test_join_wrong_password_leaves_roster_unchanged() {
    let pool = pool(1);
    let conns = connections(2);
    let room_id = pool.create(&conns[0], "Alice", Some("secret")).unwrap();

    let result = pool.join(room_id, &conns[1], "Bob", Some("guess"));

    assert_eq!(result, Err(RoomError::WrongPassword));
    assert!(!conns[1].is_attached());
    let snapshot = pool.snapshot(room_id).unwrap();
    assert_eq!(snapshot.waiting.len(), 1);
    assert_eq!(snapshot.ref_count, 1);
    assert_eq!(
        pool.notifier().last_reply_to(&conns[1]),
        Some(Reply::Rejected {
            op: Operation::JoinRoom,
            reason: "Wrong password.".into(),
        })
    );
}

#[test]
fn test_join_missing_password_required() {
    let pool = pool(1);
    let conns = connections(2);
    let room_id = pool.create(&conns[0], "Alice", Some("secret")).unwrap();

    assert_eq!(
        pool.join(room_id, &conns[1], "Bob", None),
        Err(RoomError::PasswordRequired)
    );
    assert_eq!(pool.join(room_id, &conns[1], "Bob", Some("secret")), Ok(GameId(1)));
    assert!(pool.status(room_id).unwrap().has_password);
}

// =========================================================================
// Scenarios D and E: leaving while waiting
// =========================================================================

#[test]
fn test_leave_non_owner_compacts_roster() {
    let pool = pool(4);
    let conns = connections(4);
    let room_id = seat_all(&pool, &conns);

    assert_eq!(pool.leave(&conns[2]), Some(Departure::Left(room_id)));

    let snapshot = pool.snapshot(room_id).unwrap();
    let ids: Vec<GameId> = snapshot.waiting.iter().map(|p| p.game_id).collect();
    assert_eq!(ids, vec![GameId(0), GameId(1), GameId(3)]);
    assert!(snapshot.waiting[0].is_owner);
    assert_eq!(snapshot.ref_count, 3);
    assert_eq!(conns[3].seat().waiting_index, 2);
    assert!(!conns[2].is_attached());
}

#[test]
fn test_leave_owner_promotes_next_player() {
    let pool = pool(4);
    let conns = connections(3);
    let room_id = seat_all(&pool, &conns);

    pool.leave(&conns[0]);

    let snapshot = pool.snapshot(room_id).unwrap();
    assert_eq!(snapshot.waiting[0].game_id, GameId(1));
    assert!(snapshot.waiting[0].is_owner);
    assert!(!snapshot.waiting[1].is_owner);
    assert_eq!(pool.start_game(&conns[0]), Err(RoomError::NotInRoom));
    assert_eq!(pool.start_game(&conns[1]), Err(RoomError::TooFewPlayers));
}

#[test]
fn test_leave_broadcasts_status_to_remaining() {
    let pool = pool(4);
    let conns = connections(2);
    let room_id = seat_all(&pool, &conns);
    pool.notifier().clear();

    pool.leave(&conns[1]);

    let events = pool.notifier().events_to(&conns[0]);
    let Some(RoomEvent::Status(status)) = events.last() else {
        panic!("expected a status broadcast, got {events:?}");
    };
    assert_eq!(status.room_id, room_id);
    assert_eq!(status.players.len(), 1);
    assert!(pool.notifier().events_to(&conns[1]).is_empty());
}

#[test]
fn test_last_leave_recycles_room_number() {
    let pool = pool(4);
    let conns = connections(2);
    let room_id = seat_all(&pool, &conns);

    assert_eq!(pool.leave(&conns[1]), Some(Departure::Left(room_id)));
    assert_eq!(pool.leave(&conns[0]), Some(Departure::Closed(room_id)));

    assert_eq!(pool.live_count(), 0);
    assert_eq!(pool.free_count(), pool.capacity());
    assert_eq!(
        pool.join(room_id, &conns[1], "Bob", None),
        Err(RoomError::RoomNotFound(room_id))
    );
}

// =========================================================================
// Join failures
// =========================================================================

#[test]
fn test_join_full_room_rejected() {
    let pool = pool(6);
    let conns = connections(11);
    let room_id = seat_all(&pool, &conns[..10]);

    assert_eq!(
        pool.join(room_id, &conns[10], "late", None),
        Err(RoomError::RoomFull)
    );
    assert_eq!(pool.snapshot(room_id).unwrap().ref_count, 10);
}

#[test]
fn test_join_duplicate_nickname_rejected() {
    let pool = pool(6);
    let conns = connections(3);
    let room_id = pool.create(&conns[0], "Alice", None).unwrap();

    assert_eq!(
        pool.join(room_id, &conns[1], "Alice", None),
        Err(RoomError::DuplicateNickname)
    );
    assert_eq!(pool.join(room_id, &conns[2], "alice", None), Ok(GameId(1)));
}

#[test]
fn test_join_started_room_rejected() {
    let pool = pool(6);
    let conns = connections(6);
    let room_id = seat_all(&pool, &conns[..5]);
    pool.start_game(&conns[0]).unwrap();

    assert_eq!(
        pool.join(room_id, &conns[5], "late", None),
        Err(RoomError::GameAlreadyStarted)
    );
}

#[test]
fn test_join_twice_already_in_room() {
    let pool = pool(6);
    let conns = connections(2);
    let room_id = seat_all(&pool, &conns);

    assert_eq!(
        pool.join(room_id, &conns[1], "again", None),
        Err(RoomError::AlreadyInRoom)
    );
    assert_eq!(pool.snapshot(room_id).unwrap().ref_count, 2);
}

// =========================================================================
// Start failures
// =========================================================================

#[test]
fn test_start_game_by_non_owner_rejected() {
    let pool = pool(8);
    let conns = connections(5);
    seat_all(&pool, &conns);

    assert_eq!(pool.start_game(&conns[1]), Err(RoomError::NotRoomOwner));
}

#[test]
fn test_start_game_twice_already_started() {
    let pool = pool(8);
    let conns = connections(5);
    seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();

    assert_eq!(pool.start_game(&conns[0]), Err(RoomError::AlreadyStarted));
}

#[test]
fn test_start_game_entropy_failure_commits_nothing() {
    let entropy = Budgeted {
        inner: SeededEntropy::new(1),
        budget: AtomicUsize::new(1),
    };
    let pool = RoomPool::with_config(RoomConfig::default(), Recorder::default(), entropy).unwrap();
    let conns = connections(5);
    let room_id = seat_all(&pool, &conns);

    let result = pool.start_game(&conns[0]);

    assert_eq!(
        result,
        Err(RoomError::Internal("failed to assign role.".into()))
    );
    let snapshot = pool.snapshot(room_id).unwrap();
    assert_eq!(snapshot.phase, Phase::Waiting);
    assert!(snapshot.playing.is_empty());
    assert!(snapshot.roles.is_empty());
    assert!(pool.notifier().reveals().is_empty());
    assert!(conns.iter().all(|c| c.seat().playing_index.is_none()));
}

// =========================================================================
// Round operations
// =========================================================================

#[test]
fn test_team_selection_by_leader() {
    let pool = pool(12);
    let conns = connections(5);
    let room_id = seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();

    let snapshot = pool.snapshot(room_id).unwrap();
    let leader = snapshot.leader.unwrap();
    let leader_conn = holder(&conns, snapshot.playing[leader]);
    let follower = holder(&conns, snapshot.playing[(leader + 1) % 5]);
    let team = vec![snapshot.playing[0], snapshot.playing[1]];

    assert_eq!(
        pool.select_team(follower, team.clone()),
        Err(RoomError::NotLeader)
    );
    assert_eq!(
        pool.select_team(leader_conn, vec![GameId(0); 6]),
        Err(RoomError::TooManyMembers)
    );
    assert_eq!(pool.select_team(leader_conn, team.clone()), Ok(()));
    assert_eq!(pool.confirm_team(leader_conn), Ok(()));
    assert_eq!(pool.confirm_team(follower), Err(RoomError::NotLeader));

    let events = pool.notifier().events_to(follower);
    assert!(events.contains(&RoomEvent::TeamSelected { members: team.clone() }));
    assert!(events.contains(&RoomEvent::TeamConfirmed { members: team.clone() }));
    assert_eq!(pool.snapshot(room_id).unwrap().team, team);
}

#[test]
fn test_vote_and_mission_acknowledged_only_in_round() {
    let pool = pool(13);
    let conns = connections(5);
    seat_all(&pool, &conns);

    assert_eq!(pool.vote_team(&conns[1], true), Err(RoomError::NotStarted));
    assert_eq!(pool.conduct_mission(&conns[1], true), Err(RoomError::NotStarted));

    pool.start_game(&conns[0]).unwrap();

    assert_eq!(pool.vote_team(&conns[1], false), Ok(()));
    assert_eq!(pool.conduct_mission(&conns[1], true), Ok(()));
    assert_eq!(
        pool.notifier().last_reply_to(&conns[1]),
        Some(Reply::Accepted {
            op: Operation::ConductMission
        })
    );
}

#[test]
fn test_text_message_tagged_with_seat() {
    let pool = pool(14);
    let conns = connections(5);
    seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();

    pool.text_message(&conns[3], "hello").unwrap();

    let seat = conns[3].seat().playing_index.unwrap();
    assert!(pool.notifier().events_to(&conns[0]).contains(&RoomEvent::Text {
        seat,
        text: "hello".into(),
    }));
}

#[test]
fn test_round_operation_without_room_not_in_room() {
    let pool = pool(15);
    let loner = Connection::new(ConnectionId(9));

    assert_eq!(pool.start_game(&loner), Err(RoomError::NotInRoom));
    assert_eq!(pool.text_message(&loner, "hi"), Err(RoomError::NotInRoom));
    assert_eq!(
        pool.notifier().last_reply_to(&loner),
        Some(Reply::Rejected {
            op: Operation::TextMessage,
            reason: "You are not in a room.".into(),
        })
    );
}

// =========================================================================
// Leaving mid-round
// =========================================================================

#[test]
fn test_leave_mid_round_keeps_round_running() {
    let pool = pool(16);
    let conns = connections(5);
    let room_id = seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();
    let seat = conns[3].seat().playing_index.unwrap();

    assert_eq!(pool.leave(&conns[3]), Some(Departure::Left(room_id)));

    let snapshot = pool.snapshot(room_id).unwrap();
    assert_eq!(snapshot.phase, Phase::Active);
    assert_eq!(snapshot.playing.len(), 5);
    assert!(!snapshot.playing_connected[seat]);
    assert_eq!(snapshot.waiting.len(), 4);
    assert_eq!(pool.text_message(&conns[3], "ghost"), Err(RoomError::NotInRoom));
    assert_eq!(pool.text_message(&conns[4], "still here"), Ok(()));
}

/// Plays the round out by having the assassin strike seat 0's player.
fn end_round(pool: &Pool, room_id: RoomId, conns: &[Arc<Connection>]) {
    let snapshot = pool.snapshot(room_id).unwrap();
    let assassin = seat_with_role(pool, room_id, Role::Assassin);
    pool.assassinate(holder(conns, snapshot.playing[assassin]), snapshot.playing[0])
        .unwrap();
}

#[test]
fn test_leave_after_round_releases_playing_entry() {
    let pool = pool(18);
    let conns = connections(6);
    let room_id = seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();
    end_round(&pool, room_id, &conns);

    assert_eq!(pool.leave(&conns[5]), Some(Departure::Left(room_id)));

    let snapshot = pool.snapshot(room_id).unwrap();
    let seat = snapshot.playing.iter().position(|id| *id == GameId(5)).unwrap();
    assert!(!snapshot.playing_connected[seat]);
    assert_eq!(snapshot.playing_connected.iter().filter(|c| **c).count(), 5);
    assert_eq!(snapshot.waiting.len(), 5);
    assert_eq!(Arc::strong_count(&conns[5]), 1);
}

#[test]
fn test_owner_leaves_mid_round_next_player_owns_and_restarts() {
    let conns = connections(6);
    // The departing owner sits at seat 0; pick a deal where that seat is
    // not the assassin so the round can still be ended.
    let (pool, room_id) = (0..100)
        .find_map(|seed| {
            let pool = pool(seed);
            let room_id = seat_all(&pool, &conns);
            pool.start_game(&conns[0]).unwrap();
            if pool.snapshot(room_id).unwrap().roles[0] != Role::Assassin {
                return Some((pool, room_id));
            }
            for conn in &conns {
                pool.leave(conn);
            }
            None
        })
        .unwrap();

    assert_eq!(pool.leave(&conns[0]), Some(Departure::Left(room_id)));

    let snapshot = pool.snapshot(room_id).unwrap();
    assert_eq!(snapshot.phase, Phase::Active);
    assert_eq!(snapshot.waiting[0].game_id, GameId(1));
    assert!(snapshot.waiting[0].is_owner);
    assert!(snapshot.waiting[1..].iter().all(|p| !p.is_owner));
    let frozen: Vec<GameId> = (0..6).map(GameId).collect();
    assert_eq!(snapshot.playing, frozen);
    assert!(!snapshot.playing_connected[0]);
    assert_eq!(pool.start_game(&conns[1]), Err(RoomError::AlreadyStarted));

    end_round(&pool, room_id, &conns);

    assert_eq!(pool.start_game(&conns[1]), Ok(()));
    let snapshot = pool.snapshot(room_id).unwrap();
    assert_eq!(snapshot.phase, Phase::Active);
    assert_eq!(snapshot.playing.len(), 5);
    assert_eq!(snapshot.playing[0], GameId(1));
}

// =========================================================================
// Avatars
// =========================================================================

#[test]
fn test_change_avatar_updates_status_without_reply() {
    let pool = pool(17);
    let conns = connections(2);
    let room_id = seat_all(&pool, &conns);
    pool.notifier().clear();

    pool.change_avatar(&conns[1], "knight.png").unwrap();

    let status = pool.status(room_id).unwrap();
    assert_eq!(status.players[1].avatar, "knight.png");
    assert!(pool.notifier().replies_to(&conns[1]).is_empty());
    assert!(!pool.notifier().events_to(&conns[0]).is_empty());
}

#[test]
fn test_change_avatar_too_long_ignored() {
    let pool = pool(17);
    let conns = connections(1);
    let room_id = seat_all(&pool, &conns);

    pool.change_avatar(&conns[0], &"a".repeat(33)).unwrap();

    assert_eq!(pool.status(room_id).unwrap().players[0].avatar, "");
}

#[test]
fn test_change_avatar_during_round_rejected() {
    let pool = pool(17);
    let conns = connections(5);
    seat_all(&pool, &conns);
    pool.start_game(&conns[0]).unwrap();

    assert_eq!(
        pool.change_avatar(&conns[0], "late.png"),
        Err(RoomError::AlreadyStarted)
    );
}
