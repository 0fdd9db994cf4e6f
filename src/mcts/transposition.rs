//! [Transposition Table] maps positions to the nodes storing their statistics,
//! so that move orders leading to the same position share one node.
//!
//! [Transposition Table]: https://www.chessprogramming.org/Transposition_Table

use std::collections::HashMap;
use std::hash::Hash;

use crate::mcts::tree::NodeIndex;

/// Append-only: entries are neither evicted nor overwritten during the
/// lifetime of the engine.
pub(super) struct TranspositionTable<K: Eq + Hash> {
    table: HashMap<K, NodeIndex>,
}

impl<K: Eq + Hash> TranspositionTable<K> {
    #[must_use]
    pub(super) fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    #[must_use]
    pub(super) fn probe(&self, key: &K) -> Option<NodeIndex> {
        self.table.get(key).copied()
    }

    pub(super) fn store(&mut self, key: K, index: NodeIndex) {
        let previous = self.table.insert(key, index);
        debug_assert!(previous.is_none(), "transposition table entry overwritten");
    }

    #[must_use]
    pub(super) fn len(&self) -> usize {
        self.table.len()
    }
}
