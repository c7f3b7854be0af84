//! Night Events
//!
//! Structured results of a night, handed to the host for rendering.
//! Ordering is part of the contract: the kill comes first, then
//! informational results in the order their actions were submitted.

use std::cmp::Ordering;
use serde::{Serialize, Deserialize};
use crate::game::role::Role;
use crate::game::state::Player;

/// Priority for event ordering.
///
/// Lower value = reported first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EventPriority {
    /// The night's death.
    Kill = 0,
    /// What informational roles learned.
    Information = 1,
}

/// What happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NightEventData {
    /// The Mafia killed someone.
    Killed {
        victim: Player,
    },

    /// An informational actor was blocked and learned nothing.
    Blocked {
        actor: Player,
        role: Role,
    },

    /// Scout or infiltrator learned the target's role.
    RoleRevealed {
        actor: Player,
        target: Player,
        role: Role,
    },

    /// Vote count the target drew in the previous voting phase.
    VotesRevealed {
        actor: Player,
        target: Player,
        votes: u32,
    },

    /// Whether any killer targeted the target tonight.
    AttackChecked {
        actor: Player,
        target: Player,
        attacked: bool,
    },
}

/// A night event with its ordering key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NightEvent {
    /// Processing priority
    pub priority: EventPriority,

    /// Submission index of the action that produced this event
    pub seq: u32,

    /// Event data
    pub data: NightEventData,
}

impl NightEvent {
    /// Create kill event.
    pub fn killed(victim: Player) -> Self {
        Self {
            priority: EventPriority::Kill,
            seq: 0,
            data: NightEventData::Killed { victim },
        }
    }

    /// Create an informational event for the action submitted at `seq`.
    pub fn info(seq: u32, data: NightEventData) -> Self {
        Self {
            priority: EventPriority::Information,
            seq,
            data,
        }
    }

    /// Plain-English rendering, used by logs and the demo.
    pub fn describe(&self) -> String {
        match &self.data {
            NightEventData::Killed { victim } => {
                format!("{} was killed by the Mafia", victim.name)
            }
            NightEventData::Blocked { actor, role } => {
                format!("{} ({}) was blocked and learned nothing", actor.name, role)
            }
            NightEventData::RoleRevealed { actor, target, role } => {
                format!("{} learned that {} is the {}", actor.name, target.name, role)
            }
            NightEventData::VotesRevealed { actor, target, votes } => {
                format!("{} found out that {} got {} vote(s)", actor.name, target.name, votes)
            }
            NightEventData::AttackChecked { actor, target, attacked: true } => {
                format!("{} noticed that {} was attacked", actor.name, target.name)
            }
            NightEventData::AttackChecked { actor, target, attacked: false } => {
                format!("{} saw nothing suspicious around {}", actor.name, target.name)
            }
        }
    }
}

impl PartialEq for NightEvent {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for NightEvent {}

impl PartialOrd for NightEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NightEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Sort by: priority, then submission order
        self.priority
            .cmp(&other.priority)
            .then(self.seq.cmp(&other.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::PlayerId;

    fn player(id: i64, name: &str) -> Player {
        Player::new(PlayerId(id), name)
    }

    #[test]
    fn test_kill_sorts_before_information() {
        let kill = NightEvent::killed(player(1, "ann"));
        let early_info = NightEvent::info(0, NightEventData::Blocked {
            actor: player(2, "bob"),
            role: Role::Osinter,
        });

        assert!(kill < early_info);

        let mut events = vec![early_info, kill];
        events.sort();
        assert!(matches!(events[0].data, NightEventData::Killed { .. }));
    }

    #[test]
    fn test_information_keeps_submission_order() {
        let a = NightEvent::info(3, NightEventData::AttackChecked {
            actor: player(1, "a"),
            target: player(2, "b"),
            attacked: false,
        });
        let b = NightEvent::info(1, NightEventData::VotesRevealed {
            actor: player(3, "c"),
            target: player(2, "b"),
            votes: 2,
        });
        assert!(b < a);
    }

    #[test]
    fn test_describe() {
        let event = NightEvent::info(0, NightEventData::RoleRevealed {
            actor: player(1, "ann"),
            target: player(2, "bob"),
            role: Role::Doser,
        });
        assert_eq!(event.describe(), "ann learned that bob is the Doser");

        let kill = NightEvent::killed(player(2, "bob"));
        assert!(kill.describe().contains("bob"));
    }

    #[test]
    fn test_event_json_shape() {
        let event = NightEvent::killed(player(5, "eve"));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"killed\""));
        assert!(json.contains("\"priority\":\"kill\""));
    }
}
