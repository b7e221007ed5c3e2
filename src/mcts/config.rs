//! MCTS configuration parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

/// How many workers share one search tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workers {
    /// One worker per available hardware thread.
    Auto,
    /// Exactly this many workers.
    Fixed(usize),
}

/// When a search stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchBudget {
    /// Stop once the root has been visited this many times.
    ///
    /// The root starts with one visit, so `Visits(n)` runs `n - 1`
    /// simulations (up to `workers - 1` more with several workers).
    Visits(u32),
    /// Stop once this much wall-clock time has elapsed.
    Time(Duration),
}

/// MCTS configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MCTSConfig {
    /// UCB exploration constant (default: 1.41).
    /// Higher values favor exploration over exploitation.
    pub exploration_constant: f64,

    /// Worker count for parallel searches.
    pub workers: Workers,

    /// Visit budgets below this run on a single worker.
    pub serial_visit_threshold: u32,

    /// Worker count used by [`Workers::Auto`] when hardware concurrency
    /// cannot be detected.
    pub fallback_workers: usize,
}

impl Default for MCTSConfig {
    fn default() -> Self {
        Self {
            exploration_constant: 1.41,
            workers: Workers::Auto,
            serial_visit_threshold: 500,
            fallback_workers: 4,
        }
    }
}

impl MCTSConfig {
    /// Create a new config with custom exploration constant.
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    /// Create a new config with a custom worker count.
    pub fn with_workers(mut self, workers: Workers) -> Self {
        self.workers = workers;
        self
    }

    /// Create a new config with a custom serial threshold.
    pub fn with_serial_threshold(mut self, visits: u32) -> Self {
        self.serial_visit_threshold = visits;
        self
    }

    /// Reject unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(ConfigError::Exploration(self.exploration_constant));
        }
        if self.workers == Workers::Fixed(0) || self.fallback_workers == 0 {
            return Err(ConfigError::Workers);
        }
        Ok(())
    }

    /// Number of workers to use for `budget`.
    #[must_use]
    pub fn worker_count(&self, budget: SearchBudget) -> usize {
        if let SearchBudget::Visits(visits) = budget {
            if visits < self.serial_visit_threshold {
                return 1;
            }
        }
        match self.workers {
            Workers::Fixed(n) => n.max(1),
            Workers::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(self.fallback_workers)
                .max(1),
        }
    }
}
