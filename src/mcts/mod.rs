//! Implements [Monte Carlo Tree Search] (MCTS) with the UCT selection policy
//! and uniformly random playouts.
//!
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search

use anyhow::bail;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::environment::{Environment, GameResult, Player};

mod report;
mod transposition;
mod tree;

pub use report::{NodeReport, NodeStatistics};
pub use tree::{NodeIndex, SearchNode};
use tree::Tree;

/// Parameters for MCTS search algorithm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Number of rollouts to perform for each move decision.
    rollouts: usize,
    /// Exploration constant ($C$ in the UCB formula).
    exploration: f64,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// # Errors
    ///
    /// The exploration constant has to be a non-negative finite number.
    pub fn new(rollouts: usize, exploration: f64) -> anyhow::Result<Self> {
        Self::default()
            .with_rollouts(rollouts)
            .with_exploration(exploration)
    }

    #[must_use]
    pub const fn with_rollouts(self, rollouts: usize) -> Self {
        Self { rollouts, ..self }
    }

    /// Replaces the exploration constant.
    pub fn with_exploration(self, exploration: f64) -> anyhow::Result<Self> {
        if !exploration.is_finite() || exploration < 0.0 {
            bail!("exploration constant should be non-negative and finite, got {exploration}");
        }
        Ok(Self {
            exploration,
            ..self
        })
    }

    #[must_use]
    pub const fn rollouts(&self) -> usize {
        self.rollouts
    }

    #[must_use]
    pub const fn exploration(&self) -> f64 {
        self.exploration
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rollouts: 1000,
            exploration: 1.0,
        }
    }
}

/// Selects moves by running a fixed number of rollouts from the current
/// position. Statistics are accumulated across calls: positions seen during
/// earlier searches keep their nodes.
///
/// Each rollout consists of four phases:
///
/// 1. Selection: Starting from the root, descend to the child with the highest
///    UCB weight until reaching a node with untried moves or a terminal state.
/// 2. Expansion: Play a random untried move and add the resulting node.
/// 3. Simulation: Play uniformly random moves until the game ends.
/// 4. Backpropagation: Record the result in every node on the path.
pub struct Engine<E: Environment, R: Rng> {
    config: Config,
    tree: Tree<E>,
    rng: R,
}

impl<E: Environment> Engine<E, StdRng> {
    /// Creates an engine with the random number generator seeded from the
    /// operating system.
    #[must_use]
    pub fn with_default_rng(config: Config) -> Self {
        Self::new(config, StdRng::from_entropy())
    }
}

impl<E: Environment, R: Rng> Engine<E, R> {
    /// Creates an engine with an empty transposition table.
    #[must_use]
    pub fn new(config: Config, rng: R) -> Self {
        Self {
            config,
            tree: Tree::new(),
            rng,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the search from `state` and returns the move leading to the child
    /// with the best value for the player to move. Ties are broken in favor of
    /// the child expanded first.
    ///
    /// # Errors
    ///
    /// Fails with "no move available" if the state is terminal or the search
    /// did not expand any children (e.g. zero rollouts are configured).
    pub fn get_move(&mut self, state: &E) -> anyhow::Result<E::Action> {
        if let Some(result) = state.result() {
            bail!("no move available: the game is over ({result:?})");
        }
        let root = self.search_from(state);
        let turn = state.turn();
        let best = first_max(
            self.tree
                .get(root)
                .children()
                .iter()
                .filter_map(|&(action, child)| {
                    let value = self.tree.get(child).value()?;
                    Some((action, perspective(value, turn)))
                }),
        );
        match best {
            Some((action, value)) => {
                debug!(?action, value, "selected move");
                Ok(action)
            },
            None => bail!(
                "no move available: no children were expanded after {} rollouts",
                self.config.rollouts
            ),
        }
    }

    /// Performs the configured number of rollouts from `state` and returns its
    /// node.
    pub fn search(&mut self, state: &E) -> &SearchNode<E> {
        let root = self.search_from(state);
        self.tree.get(root)
    }

    /// Returns the statistics of the node for `state` and its children, if the
    /// state has been visited.
    #[must_use]
    pub fn status(&self, state: &E) -> Option<NodeReport<E::Action>> {
        let node = self.node(state)?;
        Some(NodeReport {
            node: NodeStatistics::from(node),
            children: node
                .children()
                .iter()
                .map(|&(action, child)| (action, NodeStatistics::from(self.tree.get(child))))
                .collect(),
        })
    }

    /// Returns the node for `state` if it has been registered.
    #[must_use]
    pub fn node(&self, state: &E) -> Option<&SearchNode<E>> {
        self.tree.find(state).map(|index| self.tree.get(index))
    }

    /// Returns the node at `index`, e.g. a child of another node.
    #[must_use]
    pub fn node_at(&self, index: NodeIndex) -> &SearchNode<E> {
        self.tree.get(index)
    }

    /// Number of positions in the transposition table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn search_from(&mut self, state: &E) -> NodeIndex {
        let (root, _) = self.tree.find_or_insert(state.clone());
        for _ in 0..self.config.rollouts {
            self.rollout(root);
        }
        debug!(
            rollouts = self.config.rollouts,
            root_visits = self.tree.get(root).visits(),
            nodes = self.tree.len(),
            "completed rollouts"
        );
        root
    }

    fn rollout(&mut self, root: NodeIndex) {
        let mut path = self.select(root);
        let leaf = path[path.len() - 1];
        let result = if self.tree.get(leaf).is_terminal() {
            terminal_result(self.tree.get(leaf).state())
        } else {
            let child = self.expand(leaf);
            path.push(child);
            self.simulate(child)
        };
        self.backpropagate(&path, result);
    }

    /// Descends from `root` while the current node is fully expanded and not
    /// terminal. The returned path starts with `root` and is never empty.
    fn select(&self, root: NodeIndex) -> Vec<NodeIndex> {
        let mut path = vec![root];
        let mut current = self.tree.get(root);
        while current.untried_moves().is_empty() && !current.is_terminal() {
            let parent_visits = current.visits();
            let parent_turn = current.state().turn();
            let best = first_max(current.children().iter().map(|&(_, child)| {
                let weight = self.tree.get(child).ucb_weight(
                    self.config.exploration,
                    parent_visits,
                    parent_turn,
                );
                (child, weight)
            }));
            let Some((next, _)) = best else {
                panic!("non-terminal state has no legal moves");
            };
            path.push(next);
            current = self.tree.get(next);
        }
        path
    }

    /// Expands a random untried move of `leaf` and returns the resulting node.
    /// The node is shared with other parents if the position has already been
    /// seen.
    fn expand(&mut self, leaf: NodeIndex) -> NodeIndex {
        let untried = self.tree.get(leaf).untried_moves().len();
        assert!(untried > 0, "non-terminal state has no legal moves");
        let index = self.rng.gen_range(0..untried);
        let action = self.tree.get_mut(leaf).take_untried(index);
        let next = self.tree.get(leaf).state().apply(action);
        let (child, created) = self.tree.find_or_insert(next);
        trace!(?action, child, created, "expanded");
        self.tree.get_mut(leaf).add_child(action, child);
        child
    }

    /// Plays uniformly random moves from the node's state until the game ends.
    /// No nodes are created.
    fn simulate(&mut self, from: NodeIndex) -> GameResult {
        let mut state = self.tree.get(from).state().clone();
        while !state.is_terminal() {
            let actions = state.actions();
            assert!(!actions.is_empty(), "non-terminal state has no legal moves");
            state = state.apply(actions[self.rng.gen_range(0..actions.len())]);
        }
        terminal_result(&state)
    }

    fn backpropagate(&mut self, path: &[NodeIndex], result: GameResult) {
        for &index in path {
            self.tree.get_mut(index).update(result);
        }
    }
}

/// Converts a value stored from the first player's perspective to `turn`'s.
fn perspective(value: f64, turn: Player) -> f64 {
    match turn {
        Player::First => value,
        Player::Second => 2.0 - value,
    }
}

/// Returns the first element with the maximum score.
fn first_max<T>(candidates: impl Iterator<Item = (T, f64)>) -> Option<(T, f64)> {
    candidates.fold(None, |best, (candidate, score)| match best {
        Some((_, best_score)) if best_score >= score => best,
        _ => Some((candidate, score)),
    })
}

fn terminal_result<E: Environment>(state: &E) -> GameResult {
    match state.result() {
        Some(result) => result,
        None => panic!("terminal state has no result"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::games::TicTacToe;

    /// Root with two moves: `0` wins for the first player, `1` loses.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    enum Fork {
        Root(Player),
        Over(GameResult),
    }

    impl Environment for Fork {
        type Action = u8;
        type Key = Self;

        fn actions(&self) -> Vec<u8> {
            match self {
                Self::Root(_) => vec![0, 1],
                Self::Over(_) => vec![],
            }
        }

        fn result(&self) -> Option<GameResult> {
            match self {
                Self::Root(_) => None,
                Self::Over(result) => Some(*result),
            }
        }

        fn turn(&self) -> Player {
            match self {
                Self::Root(turn) => *turn,
                Self::Over(_) => Player::First,
            }
        }

        fn apply(&self, action: u8) -> Self {
            match action {
                0 => Self::Over(GameResult::FirstPlayerWin),
                _ => Self::Over(GameResult::SecondPlayerWin),
            }
        }

        fn key(&self) -> Self {
            self.clone()
        }
    }

    /// Claims not to be over but has no moves.
    #[derive(Clone, Debug)]
    struct Stuck;

    impl Environment for Stuck {
        type Action = u8;
        type Key = ();

        fn actions(&self) -> Vec<u8> {
            vec![]
        }

        fn result(&self) -> Option<GameResult> {
            None
        }

        fn turn(&self) -> Player {
            Player::First
        }

        fn apply(&self, _: u8) -> Self {
            Self
        }

        fn key(&self) -> Self::Key {}
    }

    fn engine<E: Environment>(rollouts: usize) -> Engine<E, ChaCha8Rng> {
        Engine::new(
            Config::default().with_rollouts(rollouts),
            ChaCha8Rng::seed_from_u64(42),
        )
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.rollouts(), 1000);
        assert!((config.exploration() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_exploration() {
        assert!(Config::new(10, -0.5).is_err());
        assert!(Config::new(10, f64::NAN).is_err());
        assert!(Config::new(10, f64::INFINITY).is_err());
        let config = Config::new(0, 0.0).unwrap();
        assert_eq!(config.rollouts(), 0);
    }

    #[test]
    fn first_max_keeps_earliest() {
        let best = first_max([('a', 1.0), ('b', 3.0), ('c', 3.0), ('d', 2.0)].into_iter());
        assert_eq!(best.map(|(name, _)| name), Some('b'));
        assert_eq!(first_max(std::iter::empty::<((), f64)>()), None);
    }

    #[test]
    fn perspectives() {
        assert!((perspective(1.5, Player::First) - 1.5).abs() < f64::EPSILON);
        assert!((perspective(1.5, Player::Second) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn picks_winning_move() {
        let mut engine = engine(2);
        assert_eq!(engine.get_move(&Fork::Root(Player::First)).unwrap(), 0);
    }

    #[test]
    fn second_player_picks_its_win() {
        let mut engine = engine(2);
        assert_eq!(engine.get_move(&Fork::Root(Player::Second)).unwrap(), 1);
    }

    #[test]
    fn two_rollouts_expand_both_moves() {
        let mut engine = engine(2);
        let root = engine.search(&Fork::Root(Player::First));
        assert_eq!(root.visits(), 2);
        assert_eq!(root.children().len(), 2);
        assert!(root.untried_moves().is_empty());
        assert_eq!(root.wins(), 1);
        assert_eq!(root.losses(), 1);
    }

    #[test]
    fn terminal_nodes_are_not_expanded() {
        let mut engine = engine(50);
        let _ = engine.search(&Fork::Root(Player::First));
        let win = engine.node(&Fork::Over(GameResult::FirstPlayerWin)).unwrap();
        assert!(win.children().is_empty());
        assert_eq!(win.losses(), 0);
        assert_eq!(win.wins(), win.visits());
        let loss = engine
            .node(&Fork::Over(GameResult::SecondPlayerWin))
            .unwrap();
        assert_eq!(loss.losses(), loss.visits());
        assert_eq!(win.visits() + loss.visits(), 50);
        assert_eq!(engine.len(), 3);
    }

    #[test]
    #[should_panic(expected = "no move available")]
    fn zero_rollouts() {
        let mut engine = engine::<Fork>(0);
        let _ = engine.get_move(&Fork::Root(Player::First)).unwrap();
    }

    #[test]
    fn zero_rollouts_still_registers_root() {
        let mut engine = engine::<Fork>(0);
        assert!(engine.get_move(&Fork::Root(Player::First)).is_err());
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.node(&Fork::Root(Player::First)).unwrap().visits(), 0);
    }

    #[test]
    fn terminal_root() {
        let mut engine = engine::<Fork>(10);
        let error = engine
            .get_move(&Fork::Over(GameResult::Draw))
            .unwrap_err();
        assert!(error.to_string().starts_with("no move available"));
    }

    #[test]
    #[should_panic(expected = "non-terminal state has no legal moves")]
    fn contract_violation() {
        let mut engine = engine::<Stuck>(1);
        let _ = engine.get_move(&Stuck);
    }

    #[test]
    fn status_report() {
        let mut engine = engine(2);
        let root = Fork::Root(Player::First);
        assert_eq!(engine.status(&root), None);
        let _ = engine.search(&root);
        let report = engine.status(&root).unwrap();
        assert_eq!(report.node.visits, 2);
        assert_eq!(report.children.len(), 2);
        let total: u32 = report.children.iter().map(|(_, child)| child.visits).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn statistics_accumulate_across_searches() {
        let mut engine = engine(100);
        let state = TicTacToe::new();
        let _ = engine.get_move(&state).unwrap();
        let _ = engine.get_move(&state).unwrap();
        assert_eq!(engine.node(&state).unwrap().visits(), 200);
    }

    #[test]
    fn completes_winning_line() {
        // X to move and win at 2.
        let state = TicTacToe::try_from("XX.OO....").unwrap();
        let mut engine = engine(2000);
        assert_eq!(engine.get_move(&state).unwrap(), 2);
    }

    #[test]
    fn blocks_losing_line() {
        // O to move, X threatens the top row.
        let state = TicTacToe::try_from("XX..O....").unwrap();
        let mut engine = engine(3000);
        assert_eq!(engine.get_move(&state).unwrap(), 2);
    }
}
