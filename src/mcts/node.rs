//! MCTS node structures.
//!
//! Nodes live in the tree's arena and reference each other by index
//! (`NodeId`). Each node has two independent synchronization domains:
//!
//! - an expansion claim (`AtomicBool`) plus a write-once child list
//!   (`OnceLock`), so children are created exactly once and read lock-free
//! - a per-node mutex around visits and total score

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::MoveCode;

/// Index into the MCTSTree node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value representing no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Create a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Check if this is the NONE sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Get the raw index value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// Visit count and accumulated score of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub visits: u32,
    /// Sum of backpropagated scores, player 1's perspective.
    pub total_score: f64,
}

impl NodeStats {
    /// Mean score, 0 when unvisited.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_score / self.visits as f64
        }
    }
}

/// Child ids; typical branching factors fit inline.
pub type Children = SmallVec<[NodeId; 8]>;

/// A node in the MCTS tree.
#[derive(Debug)]
pub struct MCTSNode {
    /// Parent node (NONE for root).
    parent: NodeId,

    /// Move that led here from the parent (None for root).
    mv: Option<MoveCode>,

    /// Depth in tree (root = 0).
    depth: u16,

    stats: Mutex<NodeStats>,

    /// Set by the one worker allowed to expand this node.
    claimed: AtomicBool,

    children: OnceLock<Children>,
}

impl MCTSNode {
    /// Create a new node.
    pub fn new(parent: NodeId, mv: MoveCode, depth: u16) -> Self {
        Self {
            parent,
            mv: Some(mv),
            depth,
            stats: Mutex::new(NodeStats::default()),
            claimed: AtomicBool::new(false),
            children: OnceLock::new(),
        }
    }

    /// Create a root node with the given initial visit count.
    pub fn root(visits: u32) -> Self {
        Self {
            parent: NodeId::NONE,
            mv: None,
            depth: 0,
            stats: Mutex::new(NodeStats {
                visits,
                total_score: 0.0,
            }),
            claimed: AtomicBool::new(false),
            children: OnceLock::new(),
        }
    }

    /// Parent node.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// Move that produced this node.
    #[inline]
    #[must_use]
    pub fn mv(&self) -> Option<MoveCode> {
        self.mv
    }

    /// Depth below the root.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Snapshot of the visit/score counters.
    #[must_use]
    pub fn stats(&self) -> NodeStats {
        *self.stats.lock()
    }

    /// Add one visit with `score`.
    pub fn record(&self, score: f64) {
        let mut stats = self.stats.lock();
        stats.visits += 1;
        stats.total_score += score;
    }

    /// Children, if the node has been expanded.
    #[must_use]
    pub fn children(&self) -> Option<&Children> {
        self.children.get()
    }

    /// Whether the node has at least one child.
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.children.get().is_some_and(|c| !c.is_empty())
    }

    /// Try to become the expanding worker. Succeeds exactly once.
    pub(crate) fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Publish the child list. Only the claiming worker calls this.
    pub(crate) fn set_children(&self, children: Children) -> bool {
        self.children.set(children).is_ok()
    }
}
