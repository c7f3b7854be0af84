//! Game Logic Module
//!
//! Synchronous rules of one game. Nothing here does I/O or reads the clock;
//! all randomness comes from the session's seeded RNG.
//!
//! ## Module Structure
//!
//! - `role`: Role catalog, factions, capabilities
//! - `state`: Players, phases, the per-chat session
//! - `assign`: Role assignment at start
//! - `night`: Night action resolution
//! - `vote`: Voting resolution
//! - `win`: Win evaluation
//! - `phase`: Phase transitions
//! - `events`: Ordered night results
//! - `error`: Command rejection reasons

pub mod role;
pub mod state;
pub mod assign;
pub mod night;
pub mod vote;
pub mod win;
pub mod phase;
pub mod events;
pub mod error;

// Re-export key types
pub use role::{Capability, Faction, Role};
pub use state::{
    ChatId, GameConfig, Phase, Player, PlayerId, RoleNotice, RosterEntry, Session, StatusReport,
    VoteEntry,
};
pub use night::{NightAction, NightOutcome};
pub use vote::VoteOutcome;
pub use phase::{PhaseOutcome, PhaseReport};
pub use events::{NightEvent, NightEventData};
pub use error::GameError;
