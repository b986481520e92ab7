//! Structural and activity statistics for field indexes

use crate::index::IndexKind;
use serde::{Deserialize, Serialize};

/// Snapshot of an index's shape together with its mutation counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub kind: IndexKind,
    /// Live entries
    pub entries: usize,
    /// Allocated nodes, including an empty quadtree root
    pub nodes: usize,
    pub leaf_nodes: usize,
    pub internal_nodes: usize,
    pub height: usize,
    pub inserts: u64,
    pub removals: u64,
    /// Moves resolved by rewriting the stored point in place
    pub moves_in_place: u64,
    /// Moves resolved by removing and reinserting the entry
    pub moves_relocated: u64,
    pub rebalances: u64,
}

/// Mutation counters kept by each tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub inserts: u64,
    pub removals: u64,
    pub moves_in_place: u64,
    pub moves_relocated: u64,
    pub rebalances: u64,
}

/// Node tallies gathered by a full traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NodeTally {
    pub nodes: usize,
    pub leaf_nodes: usize,
    pub internal_nodes: usize,
}

impl NodeTally {
    pub fn record(&mut self, is_leaf: bool) {
        self.nodes += 1;
        if is_leaf {
            self.leaf_nodes += 1;
        } else {
            self.internal_nodes += 1;
        }
    }
}

impl IndexStats {
    pub(crate) fn assemble(
        kind: IndexKind,
        entries: usize,
        height: usize,
        tally: NodeTally,
        counters: Counters,
    ) -> Self {
        Self {
            kind,
            entries,
            nodes: tally.nodes,
            leaf_nodes: tally.leaf_nodes,
            internal_nodes: tally.internal_nodes,
            height,
            inserts: counters.inserts,
            removals: counters.removals,
            moves_in_place: counters.moves_in_place,
            moves_relocated: counters.moves_relocated,
            rebalances: counters.rebalances,
        }
    }
}
