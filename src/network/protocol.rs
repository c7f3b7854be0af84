//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a JSON text message tagged by `type`.

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::game::error::GameError;
use crate::game::phase::PhaseReport;
use crate::game::role::{Faction, Role};
use crate::game::state::{ChatId, Player, PlayerId, RoleNotice, RosterEntry, StatusReport};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identify this connection. Required before anything else.
    Hello {
        /// Player id this connection speaks for
        player_id: PlayerId,
        /// Display name
        name: String,
        /// Host-issued JWT whose subject is `player_id`. Required when the
        /// server has an auth key configured.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },

    /// Open a game in a chat.
    NewGame { chat_id: ChatId },

    /// Join the chat's game.
    Join { chat_id: ChatId },

    /// Start the game (creator only).
    Start { chat_id: ChatId },

    /// Night action against a target.
    Action { chat_id: ChatId, target: PlayerId },

    /// Vote against a target.
    Vote { chat_id: ChatId, target: PlayerId },

    /// Advance the phase (creator only).
    NextPhase { chat_id: ChatId },

    /// Request the game status.
    Status { chat_id: ChatId },

    /// Request own role.
    Role { chat_id: ChatId },

    /// Request the roster.
    Players { chat_id: ChatId },

    /// Ping for latency measurement.
    Ping { timestamp: u64 },
}

impl ClientMessage {
    /// Chat a game command targets, if any.
    pub fn chat_id(&self) -> Option<ChatId> {
        match self {
            ClientMessage::NewGame { chat_id }
            | ClientMessage::Join { chat_id }
            | ClientMessage::Start { chat_id }
            | ClientMessage::Action { chat_id, .. }
            | ClientMessage::Vote { chat_id, .. }
            | ClientMessage::NextPhase { chat_id }
            | ClientMessage::Status { chat_id }
            | ClientMessage::Role { chat_id }
            | ClientMessage::Players { chat_id } => Some(*chat_id),
            ClientMessage::Hello { .. } | ClientMessage::Ping { .. } => None,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Identity accepted.
    Welcome {
        player_id: PlayerId,
        server_version: String,
    },

    /// A game was opened.
    GameCreated {
        chat_id: ChatId,
        game_id: Uuid,
        creator: PlayerId,
    },

    /// Someone joined (broadcast to the chat).
    Joined {
        chat_id: ChatId,
        player: Player,
        count: usize,
    },

    /// Roles are dealt (broadcast to the chat).
    GameStarted {
        chat_id: ChatId,
        players: Vec<Player>,
        day: u32,
    },

    /// Private role notice.
    YourRole {
        chat_id: ChatId,
        role: Role,
        faction: Faction,
    },

    /// Night action recorded.
    ActionAccepted { chat_id: ChatId },

    /// Vote recorded.
    VoteAccepted {
        chat_id: ChatId,
        target: PlayerId,
        votes: u32,
    },

    /// Phase advanced (broadcast to the chat).
    PhaseChanged {
        chat_id: ChatId,
        report: PhaseReport,
    },

    /// Game status.
    Status(StatusReport),

    /// Requester's role.
    Role {
        chat_id: ChatId,
        role: Role,
        faction: Faction,
    },

    /// Roster with alive flags.
    Players {
        chat_id: ChatId,
        players: Vec<RosterEntry>,
    },

    /// Pong response.
    Pong { timestamp: u64, server_time: u64 },

    /// Error message.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown { reason: String },
}

impl ServerMessage {
    /// Private role message for a start notice.
    pub fn your_role(chat_id: ChatId, notice: &RoleNotice) -> Self {
        ServerMessage::YourRole {
            chat_id,
            role: notice.role,
            faction: notice.faction,
        }
    }

    /// Error message with a code and text.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError {
            code,
            message: message.into(),
        })
    }
}

impl From<GameError> for ServerMessage {
    fn from(err: GameError) -> Self {
        ServerMessage::error(err.into(), err.to_string())
    }
}

/// Server error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A live game already exists in this chat.
    DuplicateGame,
    /// No live game in this chat.
    NoGame,
    /// Game already started.
    AlreadyStarted,
    /// Game no longer accepting players.
    NotWaiting,
    /// Creator-only command.
    NotCreator,
    /// Too few players to start.
    InsufficientPlayers,
    /// Roster is full.
    RosterFull,
    /// Already joined.
    AlreadyJoined,
    /// Actor or voter is not alive.
    NotAlive,
    /// Target is not in the game.
    InvalidTarget,
    /// Target is dead.
    TargetNotAlive,
    /// Role has no night action.
    NoCapability,
    /// Already acted tonight.
    AlreadyActed,
    /// Not allowed in this phase.
    WrongPhase,
    /// Requester is not in the game.
    NotInGame,
    /// Connection has not sent `hello`.
    NotIdentified,
    /// Connection already identified.
    AlreadyIdentified,
    /// Player id is bound to another live connection.
    IdentityInUse,
    /// Token missing or rejected.
    Unauthorized,
    /// Unparseable message.
    InvalidInput,
}

impl From<GameError> for ErrorCode {
    fn from(err: GameError) -> Self {
        match err {
            GameError::DuplicateGame => ErrorCode::DuplicateGame,
            GameError::NoGame => ErrorCode::NoGame,
            GameError::AlreadyStarted => ErrorCode::AlreadyStarted,
            GameError::NotWaiting => ErrorCode::NotWaiting,
            GameError::NotCreator => ErrorCode::NotCreator,
            GameError::InsufficientPlayers => ErrorCode::InsufficientPlayers,
            GameError::RosterFull => ErrorCode::RosterFull,
            GameError::AlreadyJoined => ErrorCode::AlreadyJoined,
            GameError::NotAlive => ErrorCode::NotAlive,
            GameError::InvalidTarget => ErrorCode::InvalidTarget,
            GameError::TargetNotAlive => ErrorCode::TargetNotAlive,
            GameError::NoCapability => ErrorCode::NoCapability,
            GameError::AlreadyActed => ErrorCode::AlreadyActed,
            GameError::WrongPhase => ErrorCode::WrongPhase,
            GameError::NotInGame => ErrorCode::NotInGame,
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
