//! Network Layer
//!
//! Async services around the synchronous game rules: the per-chat game
//! registry, the wire protocol, token auth and a WebSocket server.

pub mod auth;
pub mod registry;
pub mod protocol;
pub mod server;

pub use auth::{AuthConfig, AuthError};
pub use registry::{GameRegistry, SessionHandle};
pub use protocol::{ClientMessage, ServerMessage, ServerError, ErrorCode};
pub use server::{GameServer, ServerConfig, GameServerError};
