//! Monte Carlo Tree Search with UCT selection.
//!
//! This crate provides a generic MCTS implementation that can be used with
//! any game implementing the `playout_core::Game` trait.
//!
//! # Features
//!
//! - **Generic**: Works with any `Game` implementation
//! - **UCT Selection**: `wins/visits + C * sqrt(ln N / n)` with `C = sqrt(2)`
//! - **Pluggable rollouts**: uniform random or one-ply heuristic playouts
//! - **Persistent statistics**: the heuristic engine aggregates a
//!   state-value table across searches and can save/load it
//! - **Deterministic**: all randomness flows from one caller-supplied RNG
//!
//! # Example
//!
//! ```
//! use playout_mcts::{games::TicTacToe, Mcts, MctsConfig, Uct};
//! use playout_core::Game;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let game = TicTacToe;
//! let state = game.initial_state();
//!
//! let rng = ChaCha8Rng::seed_from_u64(42);
//! let mut mcts: Uct<TicTacToe, _> = Mcts::uct(MctsConfig::default(), rng);
//!
//! let action = mcts.search(&game, &state, 200).unwrap();
//! assert!(game.legal_actions(&state).contains(&action));
//! ```

pub mod config;
pub mod games;
mod node;
pub mod rollout;
pub mod search;
pub mod table;
mod tree;

pub use config::{BackupRule, MctsConfig};
pub use rollout::{HeuristicRollout, RandomRollout, RolloutPolicy};
pub use search::{ChildStats, HeuristicMcts, Mcts, SearchObserver, SearchResult, Uct};
pub use table::{StateValue, StateValueTable};
