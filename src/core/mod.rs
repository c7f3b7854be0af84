//! Core deterministic primitives.
//!
//! Everything random in a game flows through here so a seed fully
//! determines the outcome.

pub mod rng;

// Re-export core types
pub use rng::{DeterministicRng, derive_game_seed};
