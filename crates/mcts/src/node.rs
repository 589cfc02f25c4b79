//! MCTS node types for tree storage.
//!
//! Uses arena allocation with indices for cache locality and simpler memory management.

/// Index into the node arena.
///
/// This is a lightweight handle that references a node in the tree.
/// Using indices instead of pointers avoids Rc/RefCell overhead and
/// makes the parent back-reference a plain value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// Statistics for a single MCTS node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeStats {
    /// Number of simulations that passed through this node.
    pub visits: u64,

    /// Sum of outcome values credited to this node, each in [0, 1].
    pub wins: f64,
}

impl NodeStats {
    /// Record one simulation crediting `value`.
    pub fn record(&mut self, value: f64) {
        self.visits += 1;
        self.wins += value;
    }

    /// Win rate (exploitation term). 0.0 if the node has never been visited.
    pub fn win_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins / self.visits as f64
        }
    }

    /// UCT score of this node as a child of a parent with `ln(parent visits)`
    /// equal to `ln_parent_visits`.
    ///
    /// `win_rate + c * sqrt(ln N / n)`, or +infinity for an unvisited node.
    pub fn uct_score(&self, ln_parent_visits: f64, exploration_constant: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let explore = (ln_parent_visits / self.visits as f64).sqrt();
        self.win_rate() + exploration_constant * explore
    }
}

/// A node in the MCTS tree.
///
/// Each node owns the game state it represents. The parent link is only
/// followed upwards during backpropagation; children are owned by the arena.
#[derive(Clone, Debug)]
pub struct Node<S, A> {
    /// Game state at this node.
    pub state: S,

    /// Parent handle (None for root).
    pub parent: Option<NodeId>,

    /// Action that led to this node (None for root).
    pub action: Option<A>,

    /// Child handles, in expansion order.
    pub children: Vec<NodeId>,

    /// Legal actions not yet expanded, in legal-action order.
    pub untried: Vec<A>,

    /// Whether this node represents a terminal game state.
    pub terminal: bool,

    /// Node statistics (visits, wins).
    pub stats: NodeStats,
}

impl<S, A> Node<S, A> {
    /// Create a new unexpanded node.
    ///
    /// `legal_actions` must be empty when `terminal` is true.
    pub fn new(
        state: S,
        parent: Option<NodeId>,
        action: Option<A>,
        legal_actions: Vec<A>,
        terminal: bool,
    ) -> Self {
        Self {
            state,
            parent,
            action,
            children: Vec::new(),
            untried: legal_actions,
            terminal,
            stats: NodeStats::default(),
        }
    }

    /// True once every legal action has a child.
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }
}
