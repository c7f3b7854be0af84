//! Night Resolution
//!
//! Turns one night's hidden actions into a single outcome.
//!
//! ## Order
//!
//! 1. Blocks: every Swatter's target is blocked.
//! 2. Protection: every unblocked Doxer's target is protected.
//! 3. Kill votes: every unblocked Mafia member votes for its target.
//! 4. Kill: most-voted target dies unless protected. Ties break at random.
//! 5. Information: remaining actors learn something, or learn they were
//!    blocked, in submission order.
//!
//! The order is part of the rules: a blocked Doxer protects nobody, and a
//! blocked killer neither votes nor shows up to a Huminter.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::events::{NightEvent, NightEventData};
use crate::game::role::Capability;
use crate::game::state::{PlayerId, Session};

/// A submitted night action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightAction {
    /// Who acted
    pub actor: PlayerId,
    /// On whom
    pub target: PlayerId,
}

/// Everything one night produced.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NightOutcome {
    /// Who died, if anyone
    pub killed: Option<PlayerId>,
    /// Targets of blocks
    pub blocked: BTreeSet<PlayerId>,
    /// Targets of effective protection
    pub protected: BTreeSet<PlayerId>,
    /// Kill votes per target, from unblocked killers
    pub kill_votes: BTreeMap<PlayerId, u32>,
    /// Kill message first, then information in submission order
    pub events: Vec<NightEvent>,
}

/// Resolve the pending night actions.
///
/// Consumes every pending action whatever happens, removes the victim from
/// the living, and stores the outcome as the session's last night.
/// Vote counts revealed to an Osinter come from the session's current tally,
/// which still holds the previous voting phase at this point.
pub fn resolve_night(session: &mut Session) -> NightOutcome {
    let actions = std::mem::take(&mut session.night_actions);
    let mut outcome = NightOutcome::default();

    // 1. Blocks
    for action in &actions {
        if capability_of(session, action.actor) == Capability::Block {
            outcome.blocked.insert(action.target);
        }
    }

    // 2. Protection
    for action in &actions {
        if capability_of(session, action.actor) == Capability::Protect
            && !outcome.blocked.contains(&action.actor)
        {
            outcome.protected.insert(action.target);
        }
    }

    // 3. Kill votes
    for action in &actions {
        let is_mafia = session.role(action.actor).is_some_and(|r| r.is_mafia());
        if is_mafia && !outcome.blocked.contains(&action.actor) {
            *outcome.kill_votes.entry(action.target).or_insert(0) += 1;
        }
    }

    // 4. Kill decision
    if let Some(&max_votes) = outcome.kill_votes.values().max() {
        // BTreeMap order keeps the candidate list stable for a given seed
        let candidates: Vec<PlayerId> = outcome
            .kill_votes
            .iter()
            .filter(|(_, votes)| **votes == max_votes)
            .map(|(id, _)| *id)
            .collect();

        if let Some(&target) = session.rng.choose(&candidates) {
            if outcome.protected.contains(&target) {
                debug!(victim = %target, "kill negated by protection");
            } else if session.kill(target) {
                outcome.killed = Some(target);
                if let Some(victim) = session.player(target) {
                    outcome.events.push(NightEvent::killed(victim.clone()));
                }
            }
        }
    }

    // 5. Information
    for (seq, action) in actions.iter().enumerate() {
        let Some(role) = session.role(action.actor) else {
            continue;
        };
        let capability = role.capability();
        if role.is_mafia()
            || matches!(capability, Capability::Protect | Capability::Block | Capability::None)
        {
            continue;
        }

        let (Some(actor), Some(target)) = (session.player(action.actor), session.player(action.target)) else {
            continue;
        };
        let (actor, target) = (actor.clone(), target.clone());

        let data = if outcome.blocked.contains(&action.actor) {
            NightEventData::Blocked { actor, role }
        } else {
            match capability {
                Capability::RevealRole => match session.role(action.target) {
                    Some(target_role) => NightEventData::RoleRevealed { actor, target, role: target_role },
                    None => continue,
                },
                Capability::RevealVoteCount => NightEventData::VotesRevealed {
                    actor,
                    target,
                    votes: session.votes.get(&action.target).copied().unwrap_or(0),
                },
                Capability::DetectAttack => NightEventData::AttackChecked {
                    actor,
                    target,
                    attacked: outcome.kill_votes.contains_key(&action.target),
                },
                _ => continue,
            }
        };

        outcome.events.push(NightEvent::info(seq as u32, data));
    }

    outcome.events.sort();
    session.last_night = Some(outcome.clone());
    outcome
}

fn capability_of(session: &Session, id: PlayerId) -> Capability {
    session.role(id).map(|r| r.capability()).unwrap_or(Capability::None)
}

// =============================================================================
// TESTS
// =============================================================================
