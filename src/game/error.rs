//! Game Errors
//!
//! Every rejected command maps to exactly one of these. None of them is
//! fatal; the session is left untouched when one is returned.

use serde::{Serialize, Deserialize};

/// Reason a game command was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum GameError {
    /// A live game already exists in this chat.
    #[error("a game is already running in this chat")]
    DuplicateGame,

    /// No live game in this chat.
    #[error("no game in this chat")]
    NoGame,

    /// Start requested after the game began.
    #[error("game already started")]
    AlreadyStarted,

    /// Join requested after the game began.
    #[error("game is no longer accepting players")]
    NotWaiting,

    /// Only the creator may start or advance the game.
    #[error("only the game creator can do that")]
    NotCreator,

    /// Fewer players than the configured minimum.
    #[error("not enough players to start")]
    InsufficientPlayers,

    /// Every role in the catalog is taken.
    #[error("roster is full")]
    RosterFull,

    /// Player id already registered.
    #[error("already joined")]
    AlreadyJoined,

    /// Actor or voter is dead or not playing.
    #[error("dead players cannot act")]
    NotAlive,

    /// Target is not a participant.
    #[error("no such player")]
    InvalidTarget,

    /// Target is dead.
    #[error("target is dead")]
    TargetNotAlive,

    /// Actor's role has no night action.
    #[error("your role has no night action")]
    NoCapability,

    /// Actor already acted this night.
    #[error("already acted tonight")]
    AlreadyActed,

    /// Command is not valid in the current phase.
    #[error("not possible in the current phase")]
    WrongPhase,

    /// Requester is not a participant.
    #[error("you are not in this game")]
    NotInGame,
}
