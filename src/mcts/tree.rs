//! Arena-based MCTS tree shared by all search workers.
//!
//! Nodes are stored in a flat `Vec<MCTSNode>` behind a `parking_lot::RwLock`
//! and referenced by `NodeId` indices. Workers hold the read lock for
//! selection, per-node stat updates and lookups; the write lock is only taken
//! to append a freshly expanded node's children. No operation acquires the
//! arena lock while already holding it.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::node::{Children, MCTSNode, NodeId, NodeStats};
use crate::core::{GameState, MoveCode, Side};

/// Outcome of an expansion attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expansion {
    /// This worker created the node's children.
    Expanded,
    /// Nothing to expand: the state is decided or has no legal moves.
    Leaf,
    /// Another worker owns the expansion; the simulation must be abandoned.
    Contended,
}

/// Per-child view of a node, used for reporting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildSummary {
    pub mv: MoveCode,
    pub visits: u32,
    pub mean: f64,
}

/// Arena-based MCTS tree.
#[derive(Debug)]
pub struct MCTSTree {
    /// All nodes in the tree.
    nodes: RwLock<Vec<MCTSNode>>,

    /// The root node ID (always 0).
    root: NodeId,
}

impl MCTSTree {
    /// Create a tree with a root that already counts `root_visits` visits.
    pub fn new(root_visits: u32) -> Self {
        Self::with_capacity(root_visits, 1024)
    }

    /// Create a tree with custom initial capacity.
    pub fn with_capacity(root_visits: u32, capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(MCTSNode::root(root_visits));
        Self {
            nodes: RwLock::new(nodes),
            root: NodeId::new(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Check if the tree is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Visit/score snapshot of a node.
    #[must_use]
    pub fn node_stats(&self, id: NodeId) -> NodeStats {
        self.nodes.read()[id.index()].stats()
    }

    /// Root visit count.
    #[must_use]
    pub fn root_visits(&self) -> u32 {
        self.node_stats(self.root).visits
    }

    /// Children of a node (empty when unexpanded or a leaf).
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children {
        self.nodes.read()[id.index()].children().cloned().unwrap_or_default()
    }

    /// Move that produced a node.
    #[must_use]
    pub fn move_of(&self, id: NodeId) -> Option<MoveCode> {
        self.nodes.read()[id.index()].mv()
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> NodeId {
        self.nodes.read()[id.index()].parent()
    }

    /// Pick the child to descend into, together with its move.
    ///
    /// Unvisited children are taken first, left to right. Otherwise the child
    /// maximizing `s * mean + c * sqrt(ln(parent_visits) / child_visits)`
    /// wins, with `s = +1` when player 1 is to move and `-1` otherwise.
    /// Returns `None` for nodes without children.
    pub fn select_child(&self, id: NodeId, to_move: Side, exploration: f64) -> Option<(NodeId, MoveCode)> {
        let nodes = self.nodes.read();
        let node = &nodes[id.index()];
        let children = node.children().filter(|c| !c.is_empty())?;

        let sign = match to_move {
            Side::First => 1.0,
            Side::Second => -1.0,
        };
        let log_parent = f64::from(node.stats().visits.max(1)).ln();

        let mut best: Option<(NodeId, f64)> = None;
        for &child_id in children {
            let stats = nodes[child_id.index()].stats();
            if stats.visits == 0 {
                best = Some((child_id, f64::INFINITY));
                break;
            }
            let score = sign * stats.mean() + exploration * (log_parent / f64::from(stats.visits)).sqrt();
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((child_id, score));
            }
        }

        let (child_id, _) = best?;
        let mv = nodes[child_id.index()].mv()?;
        Some((child_id, mv))
    }

    /// Create one child per legal move of `state`, at most once per node.
    ///
    /// `state` must be the position represented by `id`.
    pub fn expand<G: GameState>(&self, id: NodeId, state: &G) -> Expansion {
        if state.is_terminal() {
            return Expansion::Leaf;
        }

        let depth = {
            let nodes = self.nodes.read();
            let node = &nodes[id.index()];
            if !node.try_claim() {
                return match node.children() {
                    Some(children) if children.is_empty() => Expansion::Leaf,
                    _ => Expansion::Contended,
                };
            }
            node.depth()
        };

        let moves = state.valid_moves();
        let mut nodes = self.nodes.write();
        let first = nodes.len();
        let children: Children = moves
            .iter()
            .enumerate()
            .map(|(i, _)| NodeId::new((first + i) as u32))
            .collect();
        nodes.extend(moves.iter().map(|&mv| MCTSNode::new(id, mv, depth.saturating_add(1))));

        let leaf = children.is_empty();
        nodes[id.index()].set_children(children);

        if leaf {
            Expansion::Leaf
        } else {
            Expansion::Expanded
        }
    }

    /// Add one visit and `score` to every node on `path`.
    pub fn backpropagate(&self, path: &[NodeId], score: f64) {
        let nodes = self.nodes.read();
        for id in path.iter().rev() {
            nodes[id.index()].record(score);
        }
    }

    /// Per-child statistics of a node, in move order.
    #[must_use]
    pub fn child_summaries(&self, id: NodeId) -> Vec<ChildSummary> {
        let nodes = self.nodes.read();
        let Some(children) = nodes[id.index()].children() else {
            return Vec::new();
        };
        children
            .iter()
            .filter_map(|&child| {
                let node = &nodes[child.index()];
                let stats = node.stats();
                node.mv().map(|mv| ChildSummary {
                    mv,
                    visits: stats.visits,
                    mean: stats.mean(),
                })
            })
            .collect()
    }

    /// The root move with the best mean score for `side`.
    ///
    /// Player 1 maximizes, player 2 minimizes. Only visited children are
    /// considered; if none was visited the first child is returned.
    #[must_use]
    pub fn best_move(&self, side: Side) -> Option<MoveCode> {
        let summaries = self.child_summaries(self.root);
        let mut best: Option<&ChildSummary> = None;
        for child in summaries.iter().filter(|c| c.visits > 0) {
            let better = match best {
                None => true,
                Some(b) => match side {
                    Side::First => child.mean > b.mean,
                    Side::Second => child.mean < b.mean,
                },
            };
            if better {
                best = Some(child);
            }
        }
        best.or_else(|| summaries.first()).map(|c| c.mv)
    }

    /// Get statistics about the tree.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let nodes = self.nodes.read();
        let max_depth = nodes.iter().map(MCTSNode::depth).max().unwrap_or(0);
        let expanded = nodes.iter().filter(|n| n.has_children()).count();
        let total_children: usize = nodes.iter().filter_map(|n| n.children()).map(|c| c.len()).sum();

        TreeStats {
            node_count: nodes.len(),
            max_depth,
            expanded_count: expanded,
            total_children,
        }
    }

    /// Check visit accounting over the whole tree.
    ///
    /// Every node with children must carry exactly one visit more than the
    /// sum of its children's visits. Returns the first offending node.
    pub fn verify_visit_accounting(&self) -> Result<(), NodeId> {
        let nodes = self.nodes.read();
        for (i, node) in nodes.iter().enumerate() {
            let Some(children) = node.children().filter(|c| !c.is_empty()) else {
                continue;
            };
            let child_visits: u64 = children.iter().map(|c| u64::from(nodes[c.index()].stats().visits)).sum();
            if u64::from(node.stats().visits) != child_visits + 1 {
                return Err(NodeId::new(i as u32));
            }
        }
        Ok(())
    }
}

/// Statistics about the MCTS tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total number of nodes.
    pub node_count: usize,

    /// Maximum depth reached.
    pub max_depth: u16,

    /// Nodes with at least one child.
    pub expanded_count: usize,

    /// Sum of child list lengths.
    pub total_children: usize,
}

impl TreeStats {
    /// Average children per expanded node.
    #[must_use]
    pub fn branching_factor(&self) -> f64 {
        if self.expanded_count == 0 {
            0.0
        } else {
            self.total_children as f64 / self.expanded_count as f64
        }
    }
}
