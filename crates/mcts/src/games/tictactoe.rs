//! Tic-tac-toe implementation.
//!
//! Tic-tac-toe is a solved game where perfect play always results in a draw,
//! which makes it a convenient conformance target for the engines:
//! - outcomes are reported for the player who just moved
//! - the whole game tree is small enough to search exhaustively

use playout_core::{Game, Outcome, PlayoutError, Result, StateKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tic-tac-toe player.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Get the opposing player.
    pub fn opposite(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::X => write!(f, "X"),
            Player::O => write!(f, "O"),
        }
    }
}

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2], // top row
    [3, 4, 5], // middle row
    [6, 7, 8], // bottom row
    [0, 3, 6], // left column
    [1, 4, 7], // center column
    [2, 5, 8], // right column
    [0, 4, 8], // main diagonal
    [2, 4, 6], // anti-diagonal
];

/// Tic-tac-toe board state.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct TicTacToeState {
    /// Board: 9 cells, indexed 0-8 (row-major).
    /// ```text
    /// 0 | 1 | 2
    /// ---------
    /// 3 | 4 | 5
    /// ---------
    /// 6 | 7 | 8
    /// ```
    board: [Option<Player>; 9],

    /// Current player to move.
    current: Player,

    /// Cached winner (if any).
    winner: Option<Player>,
}

impl TicTacToeState {
    /// Create a new empty board with X to move.
    pub fn new() -> Self {
        Self {
            board: [None; 9],
            current: Player::X,
            winner: None,
        }
    }

    /// Build a position from raw cells and the side to move.
    ///
    /// No reachability check is made, so positions that cannot arise in
    /// play (both sides with a line, wrong piece counts) are accepted.
    pub fn from_cells(board: [Option<Player>; 9], to_move: Player) -> Self {
        let mut state = Self {
            board,
            current: to_move,
            winner: None,
        };
        state.winner = state.check_winner();
        state
    }

    /// Get the current player to move.
    pub fn current_player(&self) -> Player {
        self.current
    }

    /// Get the winner, if any.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Get the piece at a cell, if any.
    pub fn get(&self, cell: usize) -> Option<Player> {
        self.board.get(cell).copied().flatten()
    }

    pub fn cells(&self) -> &[Option<Player>; 9] {
        &self.board
    }

    /// Check for a winner on the current board.
    ///
    /// If both sides somehow own a line, the player who just moved is
    /// reported.
    fn check_winner(&self) -> Option<Player> {
        let owns_line = |player: Player| {
            LINES
                .iter()
                .any(|line| line.iter().all(|&cell| self.board[cell] == Some(player)))
        };
        let last_mover = self.current.opposite();
        if owns_line(last_mover) {
            Some(last_mover)
        } else if owns_line(self.current) {
            Some(self.current)
        } else {
            None
        }
    }

    /// Check if the board is full (draw if no winner).
    fn is_full(&self) -> bool {
        self.board.iter().all(|c| c.is_some())
    }
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicTacToeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                writeln!(f, "-----------")?;
            }
            for col in 0..3 {
                if col > 0 {
                    write!(f, "|")?;
                }
                let cell = row * 3 + col;
                match self.board[cell] {
                    Some(player) => write!(f, " {} ", player)?,
                    None => write!(f, " {} ", cell)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parses nine cell characters (`X`, `O`, `.` or `-`) in row-major order,
/// ignoring whitespace and `/`, and infers the side to move from the piece
/// counts (X moves when the counts are equal).
///
/// ```
/// use playout_mcts::games::{Player, TicTacToeState};
///
/// let state: TicTacToeState = "XX./OO./...".parse().unwrap();
/// assert_eq!(state.current_player(), Player::X);
/// assert_eq!(state.get(3), Some(Player::O));
/// ```
impl FromStr for TicTacToeState {
    type Err = PlayoutError;

    fn from_str(s: &str) -> Result<Self> {
        let cells: Vec<char> = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '/')
            .collect();
        if cells.len() != 9 {
            return Err(PlayoutError::InvalidState(format!(
                "expected 9 cells, got {} in '{}'",
                cells.len(),
                s
            )));
        }

        let mut board = [None; 9];
        for (i, c) in cells.into_iter().enumerate() {
            board[i] = match c.to_ascii_uppercase() {
                'X' => Some(Player::X),
                'O' => Some(Player::O),
                '.' | '-' => None,
                other => {
                    return Err(PlayoutError::InvalidState(format!(
                        "invalid cell '{}' at position {} in '{}'",
                        other, i, s
                    )))
                }
            };
        }

        let xs = board.iter().filter(|&&c| c == Some(Player::X)).count();
        let os = board.iter().filter(|&&c| c == Some(Player::O)).count();
        let to_move = if xs == os { Player::X } else { Player::O };
        Ok(Self::from_cells(board, to_move))
    }
}

/// Tic-tac-toe action (cell index 0-8).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TicTacToeAction(pub u8);

impl TicTacToeAction {
    /// Get the row (0-2).
    pub fn row(self) -> u8 {
        self.0 / 3
    }

    /// Get the column (0-2).
    pub fn col(self) -> u8 {
        self.0 % 3
    }
}

impl fmt::Display for TicTacToeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.0, self.row(), self.col())
    }
}

/// Position key: board contents plus side to move.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TicTacToeKey {
    pub board: [Option<Player>; 9],
    pub to_move: Player,
}

/// Tic-tac-toe game implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicTacToe;

impl Game for TicTacToe {
    type State = TicTacToeState;
    type Action = TicTacToeAction;

    fn initial_state(&self) -> Self::State {
        TicTacToeState::new()
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if state.winner.is_some() {
            return Vec::new();
        }
        state
            .board
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(i, _)| TicTacToeAction(i as u8))
            .collect()
    }

    fn apply(&self, state: &Self::State, action: Self::Action) -> Result<Self::State> {
        let cell = action.0 as usize;
        if let Some(winner) = state.winner {
            return Err(PlayoutError::InvalidAction(format!(
                "cell {}: game already won by {}",
                cell, winner
            )));
        }
        match state.board.get(cell) {
            None => {
                return Err(PlayoutError::InvalidAction(format!(
                    "cell {} is off the board",
                    cell
                )))
            }
            Some(Some(occupant)) => {
                return Err(PlayoutError::InvalidAction(format!(
                    "cell {} is already occupied by {}",
                    cell, occupant
                )))
            }
            Some(None) => {}
        }

        let mut new_state = state.clone();
        new_state.board[cell] = Some(state.current);
        new_state.current = state.current.opposite();
        new_state.winner = new_state.check_winner();
        Ok(new_state)
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.winner.is_some() || state.is_full()
    }

    fn outcome(&self, state: &Self::State) -> Option<Outcome> {
        if let Some(winner) = state.winner {
            // The player who just moved is the one not on move now.
            if winner != state.current {
                Some(Outcome::WIN)
            } else {
                Some(Outcome::LOSS)
            }
        } else if state.is_full() {
            Some(Outcome::DRAW)
        } else {
            None
        }
    }
}

impl StateKey for TicTacToe {
    type Key = TicTacToeKey;

    fn state_key(&self, state: &Self::State) -> Self::Key {
        TicTacToeKey {
            board: state.board,
            to_move: state.current,
        }
    }
}
