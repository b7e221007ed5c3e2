//! MCTS search statistics for diagnostics and tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Statistics collected during MCTS search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Simulations that completed and were backpropagated.
    pub simulations: u32,

    /// Simulations abandoned because another worker was expanding the leaf.
    pub contended: u32,

    /// Simulations abandoned because the game rejected a tree move.
    pub rejected_moves: u32,

    /// Nodes expanded (children created).
    pub nodes_expanded: u32,

    /// Maximum depth reached during search.
    pub max_depth: u16,

    /// Workers that shared the tree.
    pub workers: usize,

    /// Total time spent searching (microseconds).
    pub time_us: u64,
}

impl SearchStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all statistics to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold another worker's counters into these.
    pub fn merge(&mut self, other: &SearchStats) {
        self.simulations += other.simulations;
        self.contended += other.contended;
        self.rejected_moves += other.rejected_moves;
        self.nodes_expanded += other.nodes_expanded;
        self.max_depth = self.max_depth.max(other.max_depth);
    }

    /// Record the elapsed wall-clock time.
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.time_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
    }

    /// Calculate simulations per second.
    #[must_use]
    pub fn simulations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.simulations as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }

    /// Fraction of attempted simulations that were abandoned.
    #[must_use]
    pub fn abort_ratio(&self) -> f64 {
        let aborted = self.contended + self.rejected_moves;
        let attempted = self.simulations + aborted;
        if attempted == 0 {
            0.0
        } else {
            aborted as f64 / attempted as f64
        }
    }
}
