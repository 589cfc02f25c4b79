//! Monte Carlo Tree Search implementation.
//!
//! Implements the classic four-phase UCT loop (selection, expansion,
//! simulation, backpropagation). The loop is shared by every engine; what
//! varies is the rollout policy used in the simulation phase and an observer
//! that sees every node update during backpropagation.

use crate::{
    config::{BackupRule, MctsConfig},
    node::{Node, NodeId},
    rollout::{HeuristicRollout, RandomRollout, RolloutPolicy},
    table::StateValueTable,
    tree::Tree,
};
use playout_core::{Game, Outcome, PlayoutError, Result, StateKey};
use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};
use std::hash::Hash;
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Hook invoked for every node updated during backpropagation.
pub trait SearchObserver<G: Game> {
    /// `outcome` is the rollout result as reported by the terminal state,
    /// independent of the backup rule used for the node's own statistics.
    fn on_backpropagate(&mut self, game: &G, state: &G::State, outcome: Outcome);
}

/// The plain engine observes nothing.
impl<G: Game> SearchObserver<G> for () {
    fn on_backpropagate(&mut self, _game: &G, _state: &G::State, _outcome: Outcome) {}
}

/// Statistics of one root child after a search.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildStats<A> {
    pub action: A,
    pub visits: u64,
    pub wins: f64,
}

/// Result of an MCTS search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult<A: Clone + Copy + Eq + Hash> {
    /// Action of the most visited root child (first in child order on ties).
    pub best_action: A,

    /// Root children in expansion order.
    pub children: Vec<ChildStats<A>>,

    /// Visits recorded at the root (one per completed simulation).
    pub root_visits: u64,

    /// Number of simulations actually run.
    pub simulations: usize,

    /// Number of nodes in the search tree, root included.
    pub tree_size: usize,
}

impl<A: Clone + Copy + Eq + Hash> SearchResult<A> {
    /// Visit count per root action.
    pub fn visit_counts(&self) -> Vec<(A, u64)> {
        self.children.iter().map(|c| (c.action, c.visits)).collect()
    }

    /// Stats of the root child reached by `action`, if it was expanded.
    pub fn child(&self, action: A) -> Option<&ChildStats<A>> {
        self.children.iter().find(|c| c.action == action)
    }

    /// Select an action using temperature-based sampling.
    ///
    /// - temperature <= 0: always return best action (greedy)
    /// - temperature = 1: sample proportional to visit counts
    /// - temperature > 1: more uniform distribution
    /// - temperature < 1: more peaked distribution
    ///
    /// Formula: P(a) ∝ N(a)^(1/τ) where τ is temperature
    pub fn select_action<R: Rng + ?Sized>(&self, temperature: f64, rng: &mut R) -> A {
        if temperature <= 0.0 || self.children.len() <= 1 {
            return self.best_action;
        }

        let inv_temp = 1.0 / temperature;
        let adjusted: Vec<f64> = self
            .children
            .iter()
            .map(|c| (c.visits as f64).powf(inv_temp))
            .collect();

        let sum: f64 = adjusted.iter().sum();
        if sum == 0.0 || !sum.is_finite() {
            return self.best_action;
        }

        let threshold = rng.gen::<f64>() * sum;
        let mut cumulative = 0.0;
        for (child, weight) in self.children.iter().zip(&adjusted) {
            cumulative += weight;
            if cumulative >= threshold {
                return child.action;
            }
        }

        self.best_action
    }
}

/// Monte Carlo Tree Search with UCT selection.
///
/// Generic over:
/// - `G`: The game being played
/// - `P`: The rollout policy used in the simulation phase
/// - `O`: The backpropagation observer
/// - `R`: The random number generator
///
/// Every call to [`search`](Self::search) builds a fresh tree and drops it
/// before returning. Only the observer carries state from one search to the
/// next.
pub struct Mcts<G: Game, P: RolloutPolicy<G>, O: SearchObserver<G>, R: Rng> {
    config: MctsConfig,
    policy: P,
    observer: O,
    rng: R,
    _game: PhantomData<G>,
}

/// Plain UCT: uniform random rollouts, no persistent statistics.
pub type Uct<G, R> = Mcts<G, RandomRollout, (), R>;

/// UCT with heuristic rollouts and a persistent state-value table.
pub type HeuristicMcts<G, R> =
    Mcts<G, HeuristicRollout, StateValueTable<<G as StateKey>::Key>, R>;

impl<G, P, O, R> Mcts<G, P, O, R>
where
    G: Game,
    P: RolloutPolicy<G>,
    O: SearchObserver<G>,
    R: Rng,
{
    /// Create a new MCTS instance.
    pub fn new(config: MctsConfig, policy: P, observer: O, rng: R) -> Self {
        Self {
            config,
            policy,
            observer,
            rng,
            _game: PhantomData,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Run `simulations` playouts from `state` and return the recommended action.
    ///
    /// # Errors
    /// - `PlayoutError::InvalidState` if `state` is terminal or has no legal actions
    /// - `PlayoutError::InvalidConfig` if `simulations` is zero or the config is invalid
    /// - any error raised by the game while applying actions
    pub fn search(&mut self, game: &G, state: &G::State, simulations: usize) -> Result<G::Action> {
        self.search_with_stats(game, state, simulations)
            .map(|result| result.best_action)
    }

    /// Like [`search`](Self::search), but returns the root statistics too.
    pub fn search_with_stats(
        &mut self,
        game: &G,
        state: &G::State,
        simulations: usize,
    ) -> Result<SearchResult<G::Action>> {
        self.config.validate()?;
        if simulations == 0 {
            return Err(PlayoutError::InvalidConfig(
                "simulation budget must be at least 1".to_string(),
            ));
        }
        if game.is_terminal(state) {
            return Err(PlayoutError::InvalidState(
                "cannot search from a terminal state".to_string(),
            ));
        }
        let legal_actions = game.legal_actions(state);
        if legal_actions.is_empty() {
            return Err(PlayoutError::InvalidState(
                "non-terminal root has no legal actions".to_string(),
            ));
        }

        let start = Instant::now();
        let deadline = self.config.time_limit.map(|limit| start + limit);
        let mut tree = Tree::new(Node::new(state.clone(), None, None, legal_actions, false));

        let mut completed = 0;
        while completed < simulations {
            self.simulate(game, &mut tree)?;
            completed += 1;

            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
        }

        let result = self.extract_results(&tree, completed)?;
        debug!(
            simulations = completed,
            budget = simulations,
            tree_size = result.tree_size,
            best_action = ?result.best_action,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );
        Ok(result)
    }

    /// Run a single simulation: select -> expand -> roll out -> backpropagate.
    fn simulate(&mut self, game: &G, tree: &mut Tree<G::State, G::Action>) -> Result<()> {
        // SELECT: descend while the node is non-terminal and fully expanded
        let mut node_id = NodeId::ROOT;
        loop {
            let node = tree.get(node_id);
            if node.terminal || !node.is_fully_expanded() {
                break;
            }
            match self.select_child(tree, node_id) {
                Some(child) => node_id = child,
                None => break,
            }
        }

        // EXPAND: add one untried action as a new child
        if !tree.get(node_id).terminal {
            node_id = self.expand(game, tree, node_id)?;
        }

        // SIMULATE: play out to a terminal state
        let (outcome, plies) = self.rollout(game, &tree.get(node_id).state)?;

        // BACKPROPAGATE
        self.backpropagate(game, tree, node_id, outcome, plies);
        Ok(())
    }

    /// Select the child with the highest UCT score.
    ///
    /// Ties go to the first child in expansion order. Returns None for a node
    /// without children.
    fn select_child(&self, tree: &Tree<G::State, G::Action>, node_id: NodeId) -> Option<NodeId> {
        let ln_parent_visits = (tree.get(node_id).stats.visits as f64).ln();
        let c = self.config.exploration_constant;

        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for (child_id, child) in tree.children(node_id) {
            let score = child.stats.uct_score(ln_parent_visits, c);
            if best.is_none() || score > best_score {
                best = Some(child_id);
                best_score = score;
            }
        }
        best
    }

    /// Expand one untried action of `node_id`, chosen uniformly at random.
    fn expand(
        &mut self,
        game: &G,
        tree: &mut Tree<G::State, G::Action>,
        node_id: NodeId,
    ) -> Result<NodeId> {
        let node = tree.get_mut(node_id);
        if node.untried.is_empty() {
            return Err(PlayoutError::InvalidState(
                "non-terminal state has no legal actions".to_string(),
            ));
        }

        let idx = self.rng.gen_range(0..node.untried.len());
        let action = node.untried.remove(idx);
        let child_state = game.apply(&node.state, action)?;

        let terminal = game.is_terminal(&child_state);
        let legal_actions = if terminal {
            Vec::new()
        } else {
            game.legal_actions(&child_state)
        };
        let child = Node::new(child_state, Some(node_id), Some(action), legal_actions, terminal);
        Ok(tree.add(child))
    }

    /// Play out from `state` with the rollout policy.
    ///
    /// Returns the terminal outcome (for the player who made the last move)
    /// and the number of moves played.
    fn rollout(&mut self, game: &G, state: &G::State) -> Result<(Outcome, usize)> {
        let mut current = state.clone();
        let mut plies = 0;

        while !game.is_terminal(&current) {
            let actions = game.legal_actions(&current);
            if actions.is_empty() {
                return Err(PlayoutError::InvalidState(
                    "non-terminal state has no legal actions".to_string(),
                ));
            }
            let action = self
                .policy
                .choose(game, &current, &actions, &mut self.rng)?;
            current = game.apply(&current, action)?;
            plies += 1;
        }

        let outcome = game.outcome(&current).ok_or_else(|| {
            PlayoutError::InvalidState("terminal state reported no outcome".to_string())
        })?;
        Ok((outcome, plies))
    }

    /// Walk from `leaf` to the root, crediting every node.
    ///
    /// Node statistics follow the configured backup rule; the observer always
    /// sees the unmodified rollout result.
    fn backpropagate(
        &mut self,
        game: &G,
        tree: &mut Tree<G::State, G::Action>,
        leaf: NodeId,
        outcome: Outcome,
        rollout_plies: usize,
    ) {
        // Plies between the current node and the terminal state.
        let mut distance = rollout_plies;
        let mut current = Some(leaf);

        while let Some(id) = current {
            let credited = match self.config.backup {
                BackupRule::Uniform => outcome,
                BackupRule::Alternating if distance % 2 == 0 => outcome,
                BackupRule::Alternating => outcome.for_opponent(),
            };

            let node = tree.get_mut(id);
            node.stats.record(credited.get());
            self.observer.on_backpropagate(game, &node.state, outcome);

            current = node.parent;
            distance += 1;
        }
    }

    /// Extract search results from the root node.
    fn extract_results(
        &self,
        tree: &Tree<G::State, G::Action>,
        simulations: usize,
    ) -> Result<SearchResult<G::Action>> {
        let children: Vec<ChildStats<G::Action>> = tree
            .children(NodeId::ROOT)
            .filter_map(|(_, child)| {
                child.action.map(|action| ChildStats {
                    action,
                    visits: child.stats.visits,
                    wins: child.stats.wins,
                })
            })
            .collect();

        // Most visited child; strict comparison keeps the first on ties
        let mut best: Option<&ChildStats<G::Action>> = None;
        for child in &children {
            if best.map_or(true, |b| child.visits > b.visits) {
                best = Some(child);
            }
        }
        let best_action = best
            .map(|c| c.action)
            .ok_or_else(|| PlayoutError::InvalidState("root was never expanded".to_string()))?;

        Ok(SearchResult {
            best_action,
            children,
            root_visits: tree.root().stats.visits,
            simulations,
            tree_size: tree.len(),
        })
    }
}

impl<G: Game, R: Rng> Mcts<G, RandomRollout, (), R> {
    /// Plain UCT engine with uniform random rollouts.
    pub fn uct(config: MctsConfig, rng: R) -> Self {
        Self::new(config, RandomRollout, (), rng)
    }
}

impl<G: StateKey, R: Rng> Mcts<G, HeuristicRollout, StateValueTable<G::Key>, R> {
    /// Heuristic engine with an empty state-value table.
    pub fn heuristic(config: MctsConfig, rng: R) -> Self {
        Self::new(config, HeuristicRollout, StateValueTable::new(), rng)
    }

    /// The state-value table accumulated so far.
    pub fn table(&self) -> &StateValueTable<G::Key> {
        &self.observer
    }

    /// Replace the table wholesale.
    pub fn set_table(&mut self, table: StateValueTable<G::Key>) {
        self.observer = table;
    }

    /// Serialize the table to `writer`.
    pub fn save<W: Write>(&self, writer: W) -> Result<()>
    where
        G::Key: Serialize,
    {
        self.observer.save(writer)
    }

    /// Replace the table with the one read from `reader`.
    ///
    /// On error the current table is left untouched.
    pub fn load<Rd: Read>(&mut self, reader: Rd) -> Result<()>
    where
        G::Key: DeserializeOwned,
    {
        self.observer = StateValueTable::load(reader)?;
        Ok(())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()>
    where
        G::Key: Serialize,
    {
        self.observer.save_to_path(path)
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<()>
    where
        G::Key: DeserializeOwned,
    {
        self.observer = StateValueTable::load_from_path(path)?;
        Ok(())
    }
}
