//! Normal-play Nim.
//!
//! Players alternately remove one or more tokens from a single pile; whoever
//! takes the last token wins. The losing positions are exactly those whose
//! pile sizes XOR to zero, which gives tests an exact oracle.

use playout_core::{Game, Outcome, PlayoutError, Result, StateKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nim position: pile sizes plus the player to move (0 or 1).
#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct NimState {
    piles: Vec<u8>,
    to_move: u8,
}

impl NimState {
    pub fn new(piles: Vec<u8>, to_move: u8) -> Self {
        Self {
            piles,
            to_move: to_move & 1,
        }
    }

    pub fn piles(&self) -> &[u8] {
        &self.piles
    }

    pub fn player_to_move(&self) -> u8 {
        self.to_move
    }

    /// XOR of the pile sizes; zero means the side to move loses.
    pub fn nim_sum(&self) -> u8 {
        self.piles.iter().fold(0, |acc, &p| acc ^ p)
    }

    pub fn tokens_left(&self) -> u32 {
        self.piles.iter().map(|&p| p as u32).sum()
    }
}

impl fmt::Display for NimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let piles: Vec<String> = self.piles.iter().map(|p| p.to_string()).collect();
        write!(f, "[{}] player {} to move", piles.join(" "), self.to_move)
    }
}

/// Take `count` tokens from pile `pile`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NimAction {
    pub pile: u8,
    pub count: u8,
}

impl fmt::Display for NimAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "take {} from pile {}", self.count, self.pile)
    }
}

/// Nim with a fixed starting layout.
#[derive(Clone, Debug)]
pub struct Nim {
    piles: Vec<u8>,
}

impl Nim {
    pub fn new(piles: Vec<u8>) -> Self {
        Self { piles }
    }
}

impl Default for Nim {
    fn default() -> Self {
        Self::new(vec![3, 4, 5])
    }
}

impl Game for Nim {
    type State = NimState;
    type Action = NimAction;

    fn initial_state(&self) -> Self::State {
        NimState::new(self.piles.clone(), 0)
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        state
            .piles
            .iter()
            .enumerate()
            .flat_map(|(pile, &size)| {
                (1..=size).map(move |count| NimAction {
                    pile: pile as u8,
                    count,
                })
            })
            .collect()
    }

    fn apply(&self, state: &Self::State, action: Self::Action) -> Result<Self::State> {
        let available = state.piles.get(action.pile as usize).copied().ok_or_else(|| {
            PlayoutError::InvalidAction(format!("pile {} does not exist", action.pile))
        })?;
        if action.count == 0 || action.count > available {
            return Err(PlayoutError::InvalidAction(format!(
                "cannot take {} from pile {} holding {}",
                action.count, action.pile, available
            )));
        }

        let mut piles = state.piles.clone();
        piles[action.pile as usize] -= action.count;
        Ok(NimState::new(piles, 1 - state.to_move))
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.piles.iter().all(|&p| p == 0)
    }

    fn outcome(&self, state: &Self::State) -> Option<Outcome> {
        // Whoever emptied the last pile took the last token
        self.is_terminal(state).then_some(Outcome::WIN)
    }
}

impl StateKey for Nim {
    type Key = NimState;

    fn state_key(&self, state: &Self::State) -> Self::Key {
        state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let game = Nim::default();
        let state = game.initial_state();
        assert_eq!(state.piles(), &[3, 4, 5]);
        assert_eq!(state.player_to_move(), 0);
        assert_eq!(state.tokens_left(), 12);
        assert!(!game.is_terminal(&state));
        assert_eq!(game.outcome(&state), None);
    }

    #[test]
    fn test_legal_actions() {
        let game = Nim::new(vec![2, 0, 1]);
        let actions = game.legal_actions(&game.initial_state());
        assert_eq!(
            actions,
            vec![
                NimAction { pile: 0, count: 1 },
                NimAction { pile: 0, count: 2 },
                NimAction { pile: 2, count: 1 },
            ]
        );
    }

    #[test]
    fn test_apply() {
        let game = Nim::default();
        let state = game.initial_state();
        let next = game.apply(&state, NimAction { pile: 1, count: 3 }).unwrap();

        assert_eq!(next.piles(), &[3, 1, 5]);
        assert_eq!(next.player_to_move(), 1);
        // Input untouched
        assert_eq!(state.piles(), &[3, 4, 5]);
    }

    #[test]
    fn test_invalid_actions() {
        let game = Nim::default();
        let state = game.initial_state();
        for action in [
            NimAction { pile: 0, count: 0 },
            NimAction { pile: 0, count: 4 },
            NimAction { pile: 7, count: 1 },
        ] {
            assert!(matches!(
                game.apply(&state, action),
                Err(PlayoutError::InvalidAction(_))
            ));
        }
    }

    #[test]
    fn test_taking_last_token_wins() {
        let game = Nim::new(vec![0, 2]);
        let state = game
            .apply(&game.initial_state(), NimAction { pile: 1, count: 2 })
            .unwrap();
        assert!(game.is_terminal(&state));
        assert_eq!(game.outcome(&state), Some(Outcome::WIN));
        assert!(game.legal_actions(&state).is_empty());
    }

    #[test]
    fn test_nim_sum() {
        assert_eq!(NimState::new(vec![3, 4, 5], 0).nim_sum(), 2);
        assert_eq!(NimState::new(vec![1, 2, 3], 0).nim_sum(), 0);
    }

    #[test]
    fn test_display() {
        let text = Nim::default().initial_state().to_string();
        assert_eq!(text, "[3 4 5] player 0 to move");
    }
}
