//! Game implementations searchable by the engines.
//!
//! Tic-tac-toe is the reference game; Nim has a closed-form solution and is
//! used to check that searches converge on provably winning moves.

pub mod nim;
pub mod tictactoe;

pub use nim::{Nim, NimAction, NimState};
pub use tictactoe::{Player, TicTacToe, TicTacToeAction, TicTacToeKey, TicTacToeState};
