//! Tests of the engines playing full tic-tac-toe games.
//!
//! Strength checks use the perspective-corrected backup rule, under which
//! UCT values are win rates for the player choosing at each node:
//! - Taking an immediate win
//! - Blocking the opponent's immediate win
//! - Never losing against a random opponent
//! - Drawing against itself

use playout_core::{Game, Outcome};
use playout_mcts::{
    games::{Player, TicTacToe, TicTacToeAction, TicTacToeState},
    HeuristicMcts, Mcts, MctsConfig, Uct,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn strong(seed: u64) -> HeuristicMcts<TicTacToe, ChaCha8Rng> {
    Mcts::heuristic(MctsConfig::alternating(), ChaCha8Rng::seed_from_u64(seed))
}

/// Play a game where `x` and `o` pick moves; returns the final state.
fn play_game(
    mut x: impl FnMut(&TicTacToeState) -> TicTacToeAction,
    mut o: impl FnMut(&TicTacToeState) -> TicTacToeAction,
) -> TicTacToeState {
    let game = TicTacToe;
    let mut state = game.initial_state();
    while !game.is_terminal(&state) {
        let action = match state.current_player() {
            Player::X => x(&state),
            Player::O => o(&state),
        };
        state = game.apply(&state, action).unwrap();
    }
    state
}

fn random_move(rng: &mut ChaCha8Rng, state: &TicTacToeState) -> TicTacToeAction {
    let actions = TicTacToe.legal_actions(state);
    actions[rng.gen_range(0..actions.len())]
}

/// Test that the engine finds winning moves in won positions.
#[test]
fn test_finds_winning_move() {
    let game = TicTacToe;
    // X _ X
    // O O _
    // _ _ _
    // X to move; cell 1 wins
    let state: TicTacToeState = "X.X/OO./...".parse().unwrap();

    let mut plain: Uct<TicTacToe, _> =
        Mcts::uct(MctsConfig::alternating(), ChaCha8Rng::seed_from_u64(42));
    assert_eq!(
        plain.search(&game, &state, 500).unwrap(),
        TicTacToeAction(1),
        "UCT should find winning move at cell 1"
    );

    assert_eq!(
        strong(42).search(&game, &state, 500).unwrap(),
        TicTacToeAction(1),
        "Heuristic engine should find winning move at cell 1"
    );
}

/// Test that the engine blocks the opponent's winning move.
#[test]
fn test_blocks_winning_move() {
    let game = TicTacToe;
    // X X _
    // O _ _
    // _ _ _
    // O to move must block at 2
    let state: TicTacToeState = "XX./O../...".parse().unwrap();
    assert_eq!(state.current_player(), Player::O);

    let action = strong(42).search(&game, &state, 1000).unwrap();
    assert_eq!(action, TicTacToeAction(2), "should block X's winning move at cell 2");
}

/// Test that the engine never loses as X against a random opponent.
#[test]
fn test_never_loses_as_x() {
    for seed in 0..10 {
        let mut mcts = strong(seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed + 1000);

        let state = play_game(
            |s| mcts.search(&TicTacToe, s, 1000).unwrap(),
            |s| random_move(&mut rng, s),
        );

        assert_ne!(
            state.winner(),
            Some(Player::O),
            "engine (X) lost game with seed {}. Final state:\n{}",
            seed,
            state
        );
    }
}

/// Test that the engine never loses as O against a random opponent.
#[test]
fn test_never_loses_as_o() {
    for seed in 0..10 {
        let mut mcts = strong(seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed + 2000);

        let state = play_game(
            |s| random_move(&mut rng, s),
            |s| mcts.search(&TicTacToe, s, 1000).unwrap(),
        );

        assert_ne!(
            state.winner(),
            Some(Player::X),
            "engine (O) lost game with seed {}. Final state:\n{}",
            seed,
            state
        );
    }
}

/// Two strong engines should draw.
#[test]
fn test_engine_vs_engine_draws() {
    let game = TicTacToe;
    for seed in 0..5 {
        let mut mcts_x = strong(seed);
        let mut mcts_o = strong(seed + 500);

        let state = play_game(
            |s| mcts_x.search(&game, s, 3000).unwrap(),
            |s| mcts_o.search(&game, s, 3000).unwrap(),
        );

        assert_eq!(
            game.outcome(&state),
            Some(Outcome::DRAW),
            "engine vs engine should draw (seed {}). Final state:\n{}",
            seed,
            state
        );
    }
}

/// The default engine plays legal games to completion.
#[test]
fn test_default_engine_completes_games() {
    let game = TicTacToe;
    for seed in 0..5 {
        let mut mcts: Uct<TicTacToe, _> =
            Mcts::uct(MctsConfig::default(), ChaCha8Rng::seed_from_u64(seed));
        let mut moves = 0;
        let state = play_game(
            |s| {
                moves += 1;
                mcts.search(&game, s, 100).unwrap()
            },
            |s| TicTacToe.legal_actions(s)[0],
        );
        assert!(game.is_terminal(&state));
        assert!(moves >= 3);
    }
}

/// Same seed produces identical games.
#[test]
fn test_games_are_deterministic() {
    let game = TicTacToe;

    let record = |seed: u64| -> Vec<TicTacToeAction> {
        let mut mcts: Uct<TicTacToe, _> =
            Mcts::uct(MctsConfig::default(), ChaCha8Rng::seed_from_u64(seed));
        let mut state = game.initial_state();
        let mut moves = Vec::new();

        while !game.is_terminal(&state) {
            let action = mcts.search(&game, &state, 100).unwrap();
            moves.push(action);
            state = game.apply(&state, action).unwrap();
        }
        moves
    };

    assert_eq!(record(12345), record(12345));
}

/// The table stores rollout results, not the alternating node credit.
#[test]
fn test_table_keeps_rollout_results_with_alternating_backup() {
    let game = TicTacToe;
    // X X _
    // O O X
    // X O O
    // X to move; the only move (cell 2) wins
    let state: TicTacToeState = "XX./OOX/XOO".parse().unwrap();
    assert_eq!(game.legal_actions(&state), vec![TicTacToeAction(2)]);

    let mut mcts = strong(3);
    mcts.search(&game, &state, 10).unwrap();

    let root = mcts
        .table()
        .get(&playout_core::StateKey::state_key(&game, &state))
        .copied()
        .unwrap();
    assert_eq!(root.visits, 10);
    assert_eq!(root.value, 10.0);
}

/// Searching a finished game is rejected.
#[test]
fn test_search_on_finished_game_fails() {
    let game = TicTacToe;
    let state: TicTacToeState = "XXX/OO./...".parse().unwrap();
    let err = strong(0).search(&game, &state, 10).unwrap_err();
    assert!(matches!(err, playout_core::PlayoutError::InvalidState(_)));
}
