//! End-to-end games through the public registry API.
//!
//! Seeds are fixed so role layouts are known; each test still looks roles
//! up through `get_role` and acts by role, not by seat.

use std::collections::{BTreeMap, BTreeSet};

use mafia_hack::game::{
    ChatId, Faction, GameConfig, GameError, NightEventData, Phase, PhaseOutcome, PlayerId, Role,
};
use mafia_hack::GameRegistry;

const CHAT: ChatId = ChatId(-2001);
const CREATOR: PlayerId = PlayerId(1);

/// Open a game with `n` players and start it.
async fn started(seed: u64, n: i64) -> GameRegistry {
    let registry = GameRegistry::new(GameConfig::default().with_seed(seed));
    registry.new_game(CHAT, CREATOR).await.unwrap();
    for i in 1..=n {
        registry.join(CHAT, PlayerId(i), &format!("player{i}")).await.unwrap();
    }
    registry.start(CHAT, CREATOR).await.unwrap();
    registry
}

async fn seats(registry: &GameRegistry, n: i64) -> BTreeMap<Role, PlayerId> {
    let mut seats = BTreeMap::new();
    for i in 1..=n {
        let notice = registry.get_role(CHAT, PlayerId(i)).await.unwrap();
        seats.insert(notice.role, PlayerId(i));
    }
    seats
}

async fn alive(registry: &GameRegistry) -> BTreeSet<PlayerId> {
    registry.get_status(CHAT).await.unwrap().alive.iter().map(|p| p.id).collect()
}

// =============================================================================
// SCENARIO A: start deals distinct roles
// =============================================================================

#[tokio::test]
async fn test_four_players_get_distinct_roles() {
    let registry = GameRegistry::new(GameConfig::default().with_seed(11));
    registry.new_game(CHAT, CREATOR).await.unwrap();
    for i in 1..=4 {
        registry.join(CHAT, PlayerId(i), &format!("player{i}")).await.unwrap();
    }

    let notices = registry.start(CHAT, CREATOR).await.unwrap();
    let roles: BTreeSet<Role> = notices.iter().map(|n| n.role).collect();

    assert_eq!(notices.len(), 4);
    assert_eq!(roles.len(), 4);
    assert!(roles.iter().all(|r| Role::ALL.contains(r)));

    let status = registry.get_status(CHAT).await.unwrap();
    assert_eq!(status.phase, Phase::Night);
    assert_eq!(status.day, 1);
    assert_eq!(status.alive.len(), 4);
}

#[tokio::test]
async fn test_start_succeeds_for_any_legal_roster() {
    for seed in 0..20u64 {
        for n in 4..=10i64 {
            let registry = started(seed, n).await;
            let seats = seats(&registry, n).await;
            assert_eq!(seats.len() as i64, n, "seed {seed}, {n} players: roles must be distinct");
        }
    }
}

#[tokio::test]
async fn test_three_players_cannot_start() {
    let registry = GameRegistry::new(GameConfig::default().with_seed(1));
    registry.new_game(CHAT, CREATOR).await.unwrap();
    for i in 1..=3 {
        registry.join(CHAT, PlayerId(i), "x").await.unwrap();
    }
    assert_eq!(registry.start(CHAT, CREATOR).await, Err(GameError::InsufficientPlayers));
    assert_eq!(registry.get_status(CHAT).await.unwrap().phase, Phase::Waiting);
}

// =============================================================================
// SCENARIO B: lone killer, nobody interferes
// =============================================================================

#[tokio::test]
async fn test_lone_killer_kills_target() {
    let registry = started(3, 4).await;
    let seats = seats(&registry, 4).await;
    let hacker = seats[&Role::Hacker];
    let victim = seats[&Role::Civilian];

    registry.submit_action(CHAT, hacker, victim).await.unwrap();
    let report = registry.advance_phase(CHAT, CREATOR).await.unwrap();

    assert_eq!(report.phase, Phase::Day);
    assert_eq!(report.day, 2);
    assert!(!alive(&registry).await.contains(&victim));

    let PhaseOutcome::Dawn { messages } = report.outcome else {
        panic!("night should end in a dawn report");
    };
    assert_eq!(messages.len(), 1);
    assert!(matches!(&messages[0].data, NightEventData::Killed { victim: v } if v.id == victim));
}

// =============================================================================
// SCENARIO C: blocked killer
// =============================================================================

#[tokio::test]
async fn test_blocked_killer_kills_nobody() {
    let registry = started(4, 4).await;
    let seats = seats(&registry, 4).await;
    let hacker = seats[&Role::Hacker];
    let swatter = seats[&Role::Swatter];
    let xinter = seats[&Role::Xinter];
    let civilian = seats[&Role::Civilian];

    registry.submit_action(CHAT, hacker, xinter).await.unwrap();
    registry.submit_action(CHAT, swatter, hacker).await.unwrap();
    registry.submit_action(CHAT, xinter, civilian).await.unwrap();

    let report = registry.advance_phase(CHAT, CREATOR).await.unwrap();
    assert_eq!(alive(&registry).await.len(), 4);

    // The unblocked informant still learns its result
    let PhaseOutcome::Dawn { messages } = report.outcome else {
        panic!("night should end in a dawn report");
    };
    assert_eq!(messages.len(), 1);
    match &messages[0].data {
        NightEventData::RoleRevealed { actor, target, role } => {
            assert_eq!(actor.id, xinter);
            assert_eq!(target.id, civilian);
            assert_eq!(*role, Role::Civilian);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_protected_target_survives() {
    let registry = started(7, 4).await;
    let seats = seats(&registry, 4).await;
    let hacker = seats[&Role::Hacker];
    let doxer = seats[&Role::Doxer];
    let geointer = seats[&Role::Geointer];

    registry.submit_action(CHAT, hacker, geointer).await.unwrap();
    registry.submit_action(CHAT, doxer, geointer).await.unwrap();

    let report = registry.advance_phase(CHAT, CREATOR).await.unwrap();
    assert_eq!(alive(&registry).await.len(), 4);
    assert!(matches!(report.outcome, PhaseOutcome::Dawn { ref messages } if messages.is_empty()));
}

#[tokio::test]
async fn test_second_action_rejected() {
    let registry = started(3, 4).await;
    let seats = seats(&registry, 4).await;
    let hacker = seats[&Role::Hacker];

    registry.submit_action(CHAT, hacker, seats[&Role::Civilian]).await.unwrap();
    assert_eq!(
        registry.submit_action(CHAT, hacker, seats[&Role::Xinter]).await,
        Err(GameError::AlreadyActed)
    );
    assert_eq!(
        registry.submit_action(CHAT, seats[&Role::Civilian], hacker).await,
        Err(GameError::NoCapability)
    );
}

// =============================================================================
// SCENARIO D: day votes
// =============================================================================

#[tokio::test]
async fn test_vote_tie_then_majority() {
    let registry = started(3, 4).await;
    let seats = seats(&registry, 4).await;
    let a = seats[&Role::Civilian];
    let b = seats[&Role::Huminter];

    // Quiet night, then open the vote
    registry.advance_phase(CHAT, CREATOR).await.unwrap();
    assert_eq!(registry.submit_vote(CHAT, a, b).await, Err(GameError::WrongPhase));
    registry.advance_phase(CHAT, CREATOR).await.unwrap();

    // {A: 2, B: 2}
    registry.submit_vote(CHAT, PlayerId(1), a).await.unwrap();
    registry.submit_vote(CHAT, PlayerId(2), a).await.unwrap();
    registry.submit_vote(CHAT, PlayerId(3), b).await.unwrap();
    registry.submit_vote(CHAT, PlayerId(4), b).await.unwrap();

    let tie = registry.advance_phase(CHAT, CREATOR).await.unwrap();
    assert!(matches!(tie.outcome, PhaseOutcome::NoExile));
    assert_eq!(tie.phase, Phase::Night);
    assert_eq!(alive(&registry).await.len(), 4);

    registry.advance_phase(CHAT, CREATOR).await.unwrap();
    registry.advance_phase(CHAT, CREATOR).await.unwrap();

    // Fresh tally: {A: 3, B: 1}
    for voter in 1..=3 {
        registry.submit_vote(CHAT, PlayerId(voter), a).await.unwrap();
    }
    registry.submit_vote(CHAT, PlayerId(4), b).await.unwrap();

    let status = registry.get_status(CHAT).await.unwrap();
    let tally = status.votes.expect("tally is visible while voting");
    assert_eq!(tally.iter().find(|e| e.player.id == a).map(|e| e.votes), Some(3));

    let verdict = registry.advance_phase(CHAT, CREATOR).await.unwrap();
    match verdict.outcome {
        PhaseOutcome::Exiled { player, role } => {
            assert_eq!(player.id, a);
            assert_eq!(role, Role::Civilian);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(verdict.winner.is_none());
    assert!(!alive(&registry).await.contains(&a));
}

#[tokio::test]
async fn test_repeat_votes_add_weight() {
    let registry = started(3, 4).await;
    registry.advance_phase(CHAT, CREATOR).await.unwrap();
    registry.advance_phase(CHAT, CREATOR).await.unwrap();

    assert_eq!(registry.submit_vote(CHAT, PlayerId(2), PlayerId(4)).await, Ok(1));
    assert_eq!(registry.submit_vote(CHAT, PlayerId(2), PlayerId(4)).await, Ok(2));
}

// =============================================================================
// SCENARIO E: parity
// =============================================================================

#[tokio::test]
async fn test_mafia_wins_at_parity() {
    let registry = started(3, 4).await;
    let seats = seats(&registry, 4).await;
    let hacker = seats[&Role::Hacker];

    registry.submit_action(CHAT, hacker, seats[&Role::Civilian]).await.unwrap();
    let dawn = registry.advance_phase(CHAT, CREATOR).await.unwrap();
    assert!(dawn.winner.is_none());

    registry.advance_phase(CHAT, CREATOR).await.unwrap();
    let suspect = seats[&Role::Huminter];
    for voter in alive(&registry).await {
        registry.submit_vote(CHAT, voter, suspect).await.unwrap();
    }

    let report = registry.advance_phase(CHAT, CREATOR).await.unwrap();
    assert_eq!(report.winner, Some(Faction::Mafia));
    assert_eq!(report.phase, Phase::Ended);

    // The finished game is gone and the chat is free again
    assert_eq!(registry.get_status(CHAT).await.unwrap_err(), GameError::NoGame);
    assert_eq!(registry.game_count().await, 0);
    assert!(registry.new_game(CHAT, CREATOR).await.is_ok());
}

#[tokio::test]
async fn test_seeded_games_replay_identically() {
    async fn play(seed: u64) -> Vec<String> {
        let registry = started(seed, 6).await;
        let seats = seats(&registry, 6).await;
        for (role, id) in &seats {
            if role.can_act() {
                let target = if role.is_mafia() { PlayerId(1) } else { PlayerId(2) };
                let _ = registry.submit_action(CHAT, *id, target).await;
            }
        }
        let report = registry.advance_phase(CHAT, CREATOR).await.unwrap();
        match report.outcome {
            PhaseOutcome::Dawn { messages } => messages.iter().map(|m| m.describe()).collect(),
            _ => Vec::new(),
        }
    }

    assert_eq!(play(77).await, play(77).await);
}
