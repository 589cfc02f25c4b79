//! Property-based tests for the MCTS engines and the game contract.
//!
//! - Terminal states report an outcome in {0, 0.5, 1}; others report none
//! - `apply` never mutates its input
//! - Searches return a legal action and account for every simulation
//! - Same seed, same tree statistics

use playout_core::{Game, Outcome};
use playout_mcts::{
    games::{Nim, TicTacToe},
    BackupRule, HeuristicMcts, Mcts, MctsConfig, Uct,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// =============================================================================
// Strategies for generating test inputs
// =============================================================================

/// Generate a random seed for MCTS
fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Generate a random simulation budget (small for fast tests)
fn arb_simulations() -> impl Strategy<Value = usize> {
    1usize..150
}

fn arb_backup() -> impl Strategy<Value = BackupRule> {
    prop_oneof![Just(BackupRule::Uniform), Just(BackupRule::Alternating)]
}

/// Generate a random tic-tac-toe position by making 0-9 random moves
fn arb_tictactoe_position() -> impl Strategy<Value = <TicTacToe as Game>::State> {
    (0usize..=9, arb_seed()).prop_map(|(num_moves, seed)| {
        let game = TicTacToe;
        let mut state = game.initial_state();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        for _ in 0..num_moves {
            if game.is_terminal(&state) {
                break;
            }
            let actions = game.legal_actions(&state);
            let idx = rand::Rng::gen_range(&mut rng, 0..actions.len());
            state = game.apply(&state, actions[idx]).unwrap();
        }
        state
    })
}

fn uct(seed: u64, backup: BackupRule) -> Uct<TicTacToe, ChaCha8Rng> {
    Mcts::uct(
        MctsConfig::default().with_backup(backup),
        ChaCha8Rng::seed_from_u64(seed),
    )
}

fn heuristic(seed: u64, backup: BackupRule) -> HeuristicMcts<TicTacToe, ChaCha8Rng> {
    Mcts::heuristic(
        MctsConfig::default().with_backup(backup),
        ChaCha8Rng::seed_from_u64(seed),
    )
}

// =============================================================================
// Game contract
// =============================================================================

proptest! {
    /// Terminal positions score in {0, 0.5, 1}; non-terminal positions have no outcome
    #[test]
    fn prop_outcome_iff_terminal(state in arb_tictactoe_position()) {
        let game = TicTacToe;
        match game.outcome(&state) {
            Some(outcome) => {
                prop_assert!(game.is_terminal(&state));
                prop_assert!(
                    [Outcome::LOSS, Outcome::DRAW, Outcome::WIN].contains(&outcome),
                    "unexpected outcome {}",
                    outcome
                );
            }
            None => prop_assert!(!game.is_terminal(&state)),
        }
    }

    /// apply returns a new state and leaves its input untouched
    #[test]
    fn prop_apply_does_not_mutate(state in arb_tictactoe_position()) {
        let game = TicTacToe;
        let before = state.clone();
        for action in game.legal_actions(&state) {
            let next = game.apply(&state, action).unwrap();
            prop_assert_ne!(&next, &state);
            prop_assert_eq!(&state, &before);
        }
    }

    /// Every legal action applies cleanly and flips the side to move
    #[test]
    fn prop_legal_actions_apply(state in arb_tictactoe_position()) {
        let game = TicTacToe;
        for action in game.legal_actions(&state) {
            let next = game.apply(&state, action).unwrap();
            prop_assert_eq!(next.current_player(), state.current_player().opposite());
            prop_assert_eq!(next.get(action.0 as usize), Some(state.current_player()));
        }
    }
}

// =============================================================================
// Search properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// search always terminates with one of the root's legal actions
    #[test]
    fn prop_search_returns_legal_action(
        seed in arb_seed(),
        simulations in arb_simulations(),
        backup in arb_backup(),
        state in arb_tictactoe_position()
    ) {
        let game = TicTacToe;
        if game.is_terminal(&state) {
            return Ok(());
        }

        let legal = game.legal_actions(&state);
        let plain = uct(seed, backup).search(&game, &state, simulations).unwrap();
        prop_assert!(legal.contains(&plain));

        let greedy = heuristic(seed, backup).search(&game, &state, simulations).unwrap();
        prop_assert!(legal.contains(&greedy));
    }

    /// Root visits equal the budget and no root child has more visits than that
    #[test]
    fn prop_visits_account_for_budget(
        seed in arb_seed(),
        simulations in arb_simulations(),
        backup in arb_backup(),
        state in arb_tictactoe_position()
    ) {
        let game = TicTacToe;
        if game.is_terminal(&state) {
            return Ok(());
        }

        let result = uct(seed, backup)
            .search_with_stats(&game, &state, simulations)
            .unwrap();

        prop_assert_eq!(result.root_visits as usize, simulations);
        prop_assert_eq!(result.simulations, simulations);

        let child_visits: u64 = result.children.iter().map(|c| c.visits).sum();
        prop_assert!(child_visits as usize <= simulations);

        for child in &result.children {
            prop_assert!(child.wins >= 0.0);
            prop_assert!(child.wins <= child.visits as f64);
        }

        // Tree never holds more than one new node per simulation
        prop_assert!(result.tree_size <= simulations + 1);
    }

    /// The best action is the first child with the highest visit count
    #[test]
    fn prop_best_action_is_max_visits(
        seed in arb_seed(),
        simulations in arb_simulations(),
        state in arb_tictactoe_position()
    ) {
        let game = TicTacToe;
        if game.is_terminal(&state) {
            return Ok(());
        }

        let result = uct(seed, BackupRule::Uniform)
            .search_with_stats(&game, &state, simulations)
            .unwrap();

        let max_visits = result.children.iter().map(|c| c.visits).max().unwrap();
        let first_max = result
            .children
            .iter()
            .find(|c| c.visits == max_visits)
            .map(|c| c.action);
        prop_assert_eq!(Some(result.best_action), first_max);
    }

    /// Same seed should produce identical results
    #[test]
    fn prop_deterministic(
        seed in arb_seed(),
        simulations in arb_simulations(),
        backup in arb_backup(),
        state in arb_tictactoe_position()
    ) {
        let game = TicTacToe;
        if game.is_terminal(&state) {
            return Ok(());
        }

        let result1 = uct(seed, backup).search_with_stats(&game, &state, simulations).unwrap();
        let result2 = uct(seed, backup).search_with_stats(&game, &state, simulations).unwrap();
        prop_assert_eq!(result1, result2);

        let mut h1 = heuristic(seed, backup);
        let mut h2 = heuristic(seed, backup);
        let result1 = h1.search_with_stats(&game, &state, simulations).unwrap();
        let result2 = h2.search_with_stats(&game, &state, simulations).unwrap();
        prop_assert_eq!(result1, result2);
        prop_assert_eq!(h1.table(), h2.table());
    }

    /// The heuristic table credits the root position once per simulation
    #[test]
    fn prop_table_tracks_root_visits(
        seed in arb_seed(),
        simulations in arb_simulations(),
        state in arb_tictactoe_position()
    ) {
        let game = TicTacToe;
        if game.is_terminal(&state) {
            return Ok(());
        }

        let mut mcts = heuristic(seed, BackupRule::Uniform);
        mcts.search(&game, &state, simulations).unwrap();
        mcts.search(&game, &state, simulations).unwrap();

        let key = playout_core::StateKey::state_key(&game, &state);
        let entry = mcts.table().get(&key).unwrap();
        prop_assert_eq!(entry.visits as usize, 2 * simulations);
        prop_assert!(entry.value <= entry.visits as f64);
    }

    /// Searches on Nim also return legal moves
    #[test]
    fn prop_nim_search_returns_legal_action(
        seed in arb_seed(),
        simulations in arb_simulations(),
        piles in proptest::collection::vec(0u8..5, 1..4)
    ) {
        let game = Nim::new(piles);
        let state = game.initial_state();
        if game.is_terminal(&state) {
            return Ok(());
        }

        let mut mcts: Uct<Nim, _> = Mcts::uct(MctsConfig::default(), ChaCha8Rng::seed_from_u64(seed));
        let action = mcts.search(&game, &state, simulations).unwrap();
        prop_assert!(game.legal_actions(&state).contains(&action));
    }
}
