//! Playout Core - Game abstractions and common types
//!
//! This crate provides the [`Game`] trait that any two-player zero-sum game
//! implements in order to be searched by `playout_mcts`.
//!
//! # Types
//!
//! - [`Game`] - Trait for game implementations
//! - [`StateKey`] - Canonical position keys for aggregated statistics
//! - [`Outcome`] - Terminal result in {0, 0.5, 1} for the player who just moved

mod error;
mod game;
mod types;

pub use error::{PlayoutError, Result};
pub use game::{Game, StateKey};
pub use types::Outcome;
