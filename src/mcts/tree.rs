use crate::environment::{Environment, GameResult, Player};
use crate::mcts::transposition::TranspositionTable;

/// Position of the node in the arena. Children refer to each other through
/// indices, because transpositions make the explored graph a DAG rather than a
/// tree.
pub type NodeIndex = usize;

/// Search statistics of a single game state.
///
/// Wins and losses are counted from the first player's perspective and draws
/// are implicit: `visits - wins - losses`.
#[derive(Clone, Debug)]
pub struct SearchNode<E: Environment> {
    state: E,
    // Insertion order is the tie-breaking order for both selection and the
    // final move choice.
    children: Vec<(E::Action, NodeIndex)>,
    untried_moves: Vec<E::Action>,
    visits: u32,
    wins: u32,
    losses: u32,
    /// `1 + (wins - losses) / visits`, lies in `[0, 2]`.
    value: f64,
}

impl<E: Environment> SearchNode<E> {
    /// Creates an unvisited node with all legal moves of `state` untried.
    #[must_use]
    pub fn new(state: E) -> Self {
        let untried_moves = state.actions();
        Self {
            state,
            children: Vec::new(),
            untried_moves,
            visits: 0,
            wins: 0,
            losses: 0,
            value: 0.0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &E {
        &self.state
    }

    #[must_use]
    pub const fn visits(&self) -> u32 {
        self.visits
    }

    /// Number of rollouts through this node won by the first player.
    #[must_use]
    pub const fn wins(&self) -> u32 {
        self.wins
    }

    /// Number of rollouts through this node won by the second player.
    #[must_use]
    pub const fn losses(&self) -> u32 {
        self.losses
    }

    #[must_use]
    pub const fn draws(&self) -> u32 {
        self.visits - self.wins - self.losses
    }

    #[must_use]
    pub const fn visited(&self) -> bool {
        self.visits > 0
    }

    /// Expected outcome from the first player's perspective: 2 is a certain
    /// win, 1 is a draw and 0 is a certain loss. `None` until the first visit.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.visited().then_some(self.value)
    }

    /// Explored moves and the nodes they lead to, in expansion order.
    #[must_use]
    pub fn children(&self) -> &[(E::Action, NodeIndex)] {
        &self.children
    }

    /// Returns the node reached by `action` if it has been expanded.
    #[must_use]
    pub fn child(&self, action: E::Action) -> Option<NodeIndex> {
        self.children
            .iter()
            .find(|(candidate, _)| *candidate == action)
            .map(|&(_, index)| index)
    }

    #[must_use]
    pub fn untried_moves(&self) -> &[E::Action] {
        &self.untried_moves
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Records the result of a rollout that went through this node.
    pub fn update(&mut self, result: GameResult) {
        match result {
            GameResult::FirstPlayerWin => self.wins += 1,
            GameResult::SecondPlayerWin => self.losses += 1,
            GameResult::Draw => {},
        }
        self.visits += 1;
        self.value = 1.0 + (f64::from(self.wins) - f64::from(self.losses)) / f64::from(self.visits);
    }

    /// UCB weight of this node as seen by the parent choosing between its
    /// children. The value is mirrored around 1 when the second player is to
    /// move at the parent.
    ///
    /// The node must have been visited.
    #[must_use]
    pub fn ucb_weight(&self, exploration: f64, parent_visits: u32, parent_turn: Player) -> f64 {
        debug_assert!(self.visited(), "UCB weight of an unvisited node");
        let exploitation = match parent_turn {
            Player::First => self.value,
            Player::Second => 2.0 - self.value,
        };
        exploration.mul_add(self.exploration_term(parent_visits), exploitation)
    }

    /// `sqrt(ln(N / n))`. A transposed node can collect more visits than the
    /// parent currently choosing it, the logarithm is clamped at zero then.
    fn exploration_term(&self, parent_visits: u32) -> f64 {
        (f64::from(parent_visits) / f64::from(self.visits))
            .ln()
            .max(0.0)
            .sqrt()
    }

    /// Removes the untried move at `index` and returns it.
    pub(super) fn take_untried(&mut self, index: usize) -> E::Action {
        self.untried_moves.remove(index)
    }

    pub(super) fn add_child(&mut self, action: E::Action, child: NodeIndex) {
        debug_assert!(self.child(action).is_none(), "{action:?} expanded twice");
        self.children.push((action, child));
    }
}

/// Arena of all nodes created by the engine. Nodes are never removed.
pub(super) struct Tree<E: Environment> {
    nodes: Vec<SearchNode<E>>,
    table: TranspositionTable<E::Key>,
}

impl<E: Environment> Tree<E> {
    #[must_use]
    pub(super) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            table: TranspositionTable::new(),
        }
    }

    #[must_use]
    pub(super) fn get(&self, index: NodeIndex) -> &SearchNode<E> {
        &self.nodes[index]
    }

    #[must_use]
    pub(super) fn get_mut(&mut self, index: NodeIndex) -> &mut SearchNode<E> {
        &mut self.nodes[index]
    }

    #[must_use]
    pub(super) fn find(&self, state: &E) -> Option<NodeIndex> {
        self.table.probe(&state.key())
    }

    /// Returns the node for `state`, creating and registering it on the first
    /// visit. The flag is `true` if the node is new.
    pub(super) fn find_or_insert(&mut self, state: E) -> (NodeIndex, bool) {
        let key = state.key();
        if let Some(index) = self.table.probe(&key) {
            return (index, false);
        }
        let index = self.nodes.len();
        self.nodes.push(SearchNode::new(state));
        self.table.store(key, index);
        (index, true)
    }

    #[must_use]
    pub(super) fn len(&self) -> usize {
        debug_assert_eq!(self.nodes.len(), self.table.len());
        self.nodes.len()
    }
}
