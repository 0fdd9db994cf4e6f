//! Diagnostic snapshot of the search statistics around a single node. Useful
//! for manually verifying that the search behaves as expected; it has no effect
//! on the search itself.

use std::fmt;
use std::fmt::Debug;

use itertools::Itertools;

use crate::environment::Environment;
use crate::mcts::tree::SearchNode;

/// Counters of a single node at the time of the report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStatistics {
    #[allow(missing_docs)]
    pub visits: u32,
    /// First player wins.
    pub wins: u32,
    /// First player losses.
    pub losses: u32,
    /// `None` if the node has not been visited yet.
    pub value: Option<f64>,
}

impl<E: Environment> From<&SearchNode<E>> for NodeStatistics {
    fn from(node: &SearchNode<E>) -> Self {
        Self {
            visits: node.visits(),
            wins: node.wins(),
            losses: node.losses(),
            value: node.value(),
        }
    }
}

impl fmt::Display for NodeStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wins {}, losses {}, visits {}, value ",
            self.wins, self.losses, self.visits
        )?;
        match self.value {
            Some(value) => write!(f, "{value:.6}"),
            None => write!(f, "-"),
        }
    }
}

/// Statistics of a node and all of its expanded children.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeReport<A> {
    #[allow(missing_docs)]
    pub node: NodeStatistics,
    /// Children in expansion order.
    pub children: Vec<(A, NodeStatistics)>,
}

impl<A: Debug> fmt::Display for NodeReport<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.node)?;
        if !self.children.is_empty() {
            write!(
                f,
                "\n{}",
                self.children
                    .iter()
                    .map(|(action, child)| format!("  child {action:?}: {child}"))
                    .join("\n")
            )?;
        }
        Ok(())
    }
}
