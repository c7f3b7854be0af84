//! Phase Controller
//!
//! Drives the Night → Day → Voting → Night cycle on explicit advance
//! requests from the creator. There are no timers.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::game::error::GameError;
use crate::game::events::NightEvent;
use crate::game::night::resolve_night;
use crate::game::role::{Faction, Role};
use crate::game::state::{Phase, Player, PlayerId, Session};
use crate::game::vote::{resolve_votes, VoteOutcome};
use crate::game::win::check_win;

/// What the phase change produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// Night resolved; messages in reporting order.
    Dawn {
        /// Kill first, then information
        messages: Vec<NightEvent>,
    },
    /// Discussion is over, votes are open.
    VotingOpened,
    /// The vote removed a player.
    Exiled {
        /// Who left
        player: Player,
        /// Their role, revealed
        role: Role,
    },
    /// No votes, or a tie.
    NoExile,
}

/// Result of one advance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Phase entered
    pub phase: Phase,
    /// Day counter after the change
    pub day: u32,
    /// Phase-specific outcome
    pub outcome: PhaseOutcome,
    /// Set when this change ended the game
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Faction>,
}

/// Advance a started session by one phase.
pub fn advance(session: &mut Session, requester: PlayerId) -> Result<PhaseReport, GameError> {
    if requester != session.creator {
        return Err(GameError::NotCreator);
    }

    let (next, outcome) = match session.phase {
        Phase::Waiting | Phase::Ended => return Err(GameError::WrongPhase),
        Phase::Night => {
            let night = resolve_night(session);
            session.day += 1;
            (Phase::Day, PhaseOutcome::Dawn { messages: night.events })
        }
        Phase::Day => {
            session.votes.clear();
            (Phase::Voting, PhaseOutcome::VotingOpened)
        }
        Phase::Voting => {
            let outcome = match resolve_votes(&session.votes) {
                VoteOutcome::Exile { player } => {
                    session.kill(player);
                    match (session.player(player), session.role(player)) {
                        (Some(p), Some(role)) => PhaseOutcome::Exiled { player: p.clone(), role },
                        _ => PhaseOutcome::NoExile,
                    }
                }
                VoteOutcome::NoDecision => PhaseOutcome::NoExile,
            };
            (Phase::Night, outcome)
        }
    };

    // Only resolutions can change who is alive
    let winner = match outcome {
        PhaseOutcome::VotingOpened => None,
        _ => check_win(session),
    };

    session.phase = if winner.is_some() { Phase::Ended } else { next };
    session.winner = winner;

    info!(
        game_id = %session.game_id,
        chat_id = %session.chat_id,
        phase = %session.phase,
        day = session.day,
        alive = session.alive_count(),
        "phase advanced"
    );
    if let Some(faction) = winner {
        info!(game_id = %session.game_id, winner = %faction, "game ended");
    }

    Ok(PhaseReport {
        phase: session.phase,
        day: session.day,
        outcome,
        winner,
    })
}
