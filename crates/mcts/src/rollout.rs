//! Rollout policies for the simulation phase.
//!
//! The `RolloutPolicy` trait allows swapping how playouts pick moves:
//! - `RandomRollout` picks uniformly among legal actions
//! - `HeuristicRollout` takes immediate wins and blocks before falling back to random

use playout_core::{Game, Result};
use rand::Rng;

/// Trait for choosing moves during a playout.
///
/// Policies are stateless with respect to the search; the engine lends them
/// its random number generator so a seeded search stays reproducible.
pub trait RolloutPolicy<G: Game> {
    /// Choose one of `actions` (the non-empty legal actions of `state`).
    ///
    /// # Errors
    /// Propagates any error raised by the game while probing successors.
    fn choose<R: Rng + ?Sized>(
        &self,
        game: &G,
        state: &G::State,
        actions: &[G::Action],
        rng: &mut R,
    ) -> Result<G::Action>;
}

/// Uniform random playouts.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomRollout;

impl<G: Game> RolloutPolicy<G> for RandomRollout {
    fn choose<R: Rng + ?Sized>(
        &self,
        _game: &G,
        _state: &G::State,
        actions: &[G::Action],
        rng: &mut R,
    ) -> Result<G::Action> {
        Ok(actions[rng.gen_range(0..actions.len())])
    }
}

/// One-ply greedy playouts.
///
/// In enumeration order:
/// 1. the first action whose successor is a win for the mover;
/// 2. otherwise the first action whose successor scores 0.0 (the blocking rule);
/// 3. otherwise a uniformly random action.
///
/// This is not a lookahead search; it only removes the most obvious blunders
/// from playouts.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicRollout;

impl<G: Game> RolloutPolicy<G> for HeuristicRollout {
    fn choose<R: Rng + ?Sized>(
        &self,
        game: &G,
        state: &G::State,
        actions: &[G::Action],
        rng: &mut R,
    ) -> Result<G::Action> {
        let mut blocking = None;

        for &action in actions {
            let next = game.apply(state, action)?;
            match game.outcome(&next) {
                Some(outcome) if outcome.is_win() => return Ok(action),
                Some(outcome) if outcome.is_loss() && blocking.is_none() => {
                    blocking = Some(action);
                }
                _ => {}
            }
        }

        if let Some(action) = blocking {
            return Ok(action);
        }

        Ok(actions[rng.gen_range(0..actions.len())])
    }
}
