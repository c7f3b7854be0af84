//! Vote Resolution
//!
//! Day ties are never broken: a shared maximum means nobody leaves.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::game::state::PlayerId;

/// Result of a voting phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// Single strict maximum
    Exile {
        /// Who leaves
        player: PlayerId,
    },
    /// No votes, or a tie at the top
    NoDecision,
}

/// Decide the voting phase from its tally.
pub fn resolve_votes(tally: &BTreeMap<PlayerId, u32>) -> VoteOutcome {
    let Some(&max) = tally.values().max() else {
        return VoteOutcome::NoDecision;
    };

    let mut leaders = tally.iter().filter(|(_, votes)| **votes == max);
    match (leaders.next(), leaders.next()) {
        (Some((&player, _)), None) if max > 0 => VoteOutcome::Exile { player },
        _ => VoteOutcome::NoDecision,
    }
}
