use crate::{Outcome, Result};
use std::fmt::Debug;
use std::hash::Hash;

/// A two-player, perfect-information, zero-sum game.
///
/// The search engines only ever talk to a game through this trait, so any
/// rule set that can enumerate moves, produce successors and score finished
/// positions can be searched. States are values: `apply` returns a new state
/// and leaves its input untouched.
pub trait Game: Clone + Send + Sync {
    /// The game state (e.g., a tic-tac-toe board plus side to move)
    type State: Clone + Send;

    /// A game action (e.g., a cell index)
    type Action: Clone + Copy + Send + Eq + Hash + Debug;

    /// Returns the initial game state
    fn initial_state(&self) -> Self::State;

    /// Returns all legal actions from the given state.
    ///
    /// The order must be stable for a given state. Empty for terminal states.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Applies an action, returning a new state (immutable operation).
    ///
    /// # Errors
    /// Returns `PlayoutError::InvalidAction` if `action` is not legal in `state`.
    fn apply(&self, state: &Self::State, action: Self::Action) -> Result<Self::State>;

    /// Returns true if the game has ended
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Returns the game outcome from the perspective of the player who just moved:
    /// - `Some(Outcome::WIN)` if that player won
    /// - `Some(Outcome::LOSS)` if that player lost
    /// - `Some(Outcome::DRAW)` for a draw
    /// - `None` if the game is not terminal
    fn outcome(&self, state: &Self::State) -> Option<Outcome>;
}

/// Games whose states can be reduced to a hashable lookup key.
///
/// Two states that share a key are treated as the same position when
/// statistics are aggregated across searches, no matter which path through
/// the search tree reached them. The key must include the side to move.
pub trait StateKey: Game {
    type Key: Clone + Eq + Hash + Debug + Send;

    fn state_key(&self, state: &Self::State) -> Self::Key;
}
