//! MCTS configuration parameters.
//!
//! These parameters control the behavior of the UCT search. The simulation
//! budget is passed to each `search` call rather than stored here.

use playout_core::{PlayoutError, Result};
use std::time::Duration;

/// How a terminal outcome is credited to the nodes on the simulated path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackupRule {
    /// Add the same outcome value at every level, root included.
    ///
    /// The outcome is the one reported for the final rollout state, i.e. from
    /// the perspective of whoever made the last move of the playout.
    #[default]
    Uniform,

    /// Credit each node with the outcome seen by the player who moved into it.
    ///
    /// Assumes strictly alternating turns: the value is the terminal outcome
    /// when an even number of plies separates the node from the terminal
    /// state, and its complement otherwise.
    Alternating,
}

/// MCTS configuration parameters.
#[derive(Clone, Debug)]
pub struct MctsConfig {
    /// UCT exploration constant `C` in `wins/visits + C * sqrt(ln(N) / n)`.
    pub exploration_constant: f64,

    /// How rollout outcomes are backed up the tree.
    pub backup: BackupRule,

    /// Optional wall-clock limit per search.
    ///
    /// When it expires the search stops early and answers from the visit
    /// counts accumulated so far. At least one simulation always runs.
    pub time_limit: Option<Duration>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration_constant: std::f64::consts::SQRT_2,
            backup: BackupRule::Uniform,
            time_limit: None,
        }
    }
}

impl MctsConfig {
    /// Default config with the perspective-corrected backup rule.
    pub fn alternating() -> Self {
        Self {
            backup: BackupRule::Alternating,
            ..Default::default()
        }
    }

    /// Builder-style setter for the backup rule.
    pub fn with_backup(mut self, backup: BackupRule) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_exploration_constant(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Check that the parameters can drive a search.
    ///
    /// # Errors
    /// Returns `PlayoutError::InvalidConfig` if the exploration constant is
    /// negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(PlayoutError::InvalidConfig(format!(
                "exploration constant must be finite and non-negative, got {}",
                self.exploration_constant
            )));
        }
        Ok(())
    }
}
