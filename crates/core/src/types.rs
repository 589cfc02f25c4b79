//! Domain types with enforced invariants.
//!
//! - Outcome: terminal result in range [0, 1], seen by the player who just moved

use crate::{PlayoutError, Result};

/// The result of a finished game.
///
/// Invariant: the value is in range [0, 1] where:
/// - 1.0 means the player who made the last move won
/// - 0.0 means that player lost
/// - 0.5 means a draw
///
/// Search statistics accumulate these values directly, so a node's
/// `wins / visits` is always a win rate in [0, 1].
///
/// # Example
/// ```
/// use playout_core::Outcome;
///
/// let outcome = Outcome::new(0.5).unwrap();
/// assert_eq!(outcome, Outcome::DRAW);
/// assert_eq!(Outcome::WIN.for_opponent(), Outcome::LOSS);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Outcome(f64);

impl Outcome {
    /// Outcome for a win.
    pub const WIN: Self = Self(1.0);

    /// Outcome for a loss.
    pub const LOSS: Self = Self(0.0);

    /// Outcome for a draw.
    pub const DRAW: Self = Self(0.5);

    /// Create a new outcome.
    ///
    /// # Errors
    /// Returns `PlayoutError::InvalidOutcome` if the value is outside [0, 1]
    /// or not a number.
    pub fn new(value: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(PlayoutError::InvalidOutcome(value));
        }
        Ok(Self(value))
    }

    /// Get the underlying value.
    pub fn get(self) -> f64 {
        self.0
    }

    /// The same result seen by the other player.
    pub fn for_opponent(self) -> Self {
        Self(1.0 - self.0)
    }

    pub fn is_win(self) -> bool {
        self == Self::WIN
    }

    pub fn is_loss(self) -> bool {
        self == Self::LOSS
    }

    pub fn is_draw(self) -> bool {
        self == Self::DRAW
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl From<Outcome> for f64 {
    fn from(o: Outcome) -> f64 {
        o.0
    }
}

impl TryFrom<f64> for Outcome {
    type Error = PlayoutError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}
