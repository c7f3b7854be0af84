//! # Mafia Hack Server
//!
//! Game engine for a Mafia-style social-deduction game played in group chats,
//! with a reference WebSocket transport.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MAFIA HACK SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  └── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │                                                              │
//! │  game/           - Game rules (synchronous)                  │
//! │  ├── role.rs     - Role catalog and capabilities             │
//! │  ├── state.rs    - Players, phases, sessions                 │
//! │  ├── assign.rs   - Role assignment                           │
//! │  ├── night.rs    - Night resolution                          │
//! │  ├── vote.rs     - Vote resolution                           │
//! │  ├── win.rs      - Win evaluation                            │
//! │  ├── phase.rs    - Phase controller                          │
//! │  ├── events.rs   - Ordered night events                      │
//! │  └── error.rs    - Game errors                               │
//! │                                                              │
//! │  network/        - Async services                            │
//! │  ├── registry.rs - One session per chat                      │
//! │  ├── protocol.rs - Message types                             │
//! │  ├── auth.rs     - JWT validation                            │
//! │  └── server.rs   - WebSocket server                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Given the same seed and the same sequence of commands, a game produces
//! the same roles, kills and messages:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from the session's seeded Xorshift128+

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::{ChatId, Faction, GameConfig, GameError, Phase, PlayerId, Role, Session};
pub use network::registry::GameRegistry;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fewest players a game can start with
pub const MIN_PLAYERS: usize = 4;

/// Largest roster: one player per catalog role
pub const MAX_PLAYERS: usize = game::role::Role::COUNT;
