//! Core MCTS search algorithm.
//!
//! Every simulation starts at the shared root with a worker-private copy of
//! the game state:
//!
//! 1. **Selection**: descend through expanded nodes by UCB, applying each move
//!    to the local state and recording it on an explicit path
//! 2. **Expansion**: create the leaf's children (exactly once across workers)
//! 3. **Evaluation**: terminal outcome, or the evaluator's clamped score
//! 4. **Backpropagation**: add the score to every node on the path, then undo
//!    all applied moves
//!
//! A simulation that meets a leaf being expanded by another worker, or a tree
//! move the game rejects, is unwound without touching any statistics.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{GameState, MoveCode};
use crate::nn::Evaluator;

use super::config::{MCTSConfig, SearchBudget};
use super::node::NodeId;
use super::stats::SearchStats;
use super::tree::{ChildSummary, Expansion, MCTSTree};

/// Result of a completed search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chosen root move.
    pub best_move: MoveCode,

    /// Root mean score, player 1's perspective.
    pub evaluation: f64,

    /// Root visit count (1 + completed simulations).
    pub root_visits: u32,

    /// Root children in move order.
    pub children: Vec<ChildSummary>,

    /// Search statistics.
    pub stats: SearchStats,
}

/// Rejected tree moves after which a worker gives up.
const MAX_REJECTED_MOVES: u32 = 64;

/// How one simulation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Simulation {
    Completed,
    Contended,
    Rejected,
}

/// Main MCTS search context.
///
/// Generic over the evaluator used for non-terminal leaves. A search
/// context is reusable; every call builds a fresh tree.
pub struct MCTSSearch<E: Evaluator> {
    /// Leaf evaluator.
    evaluator: E,

    /// Search configuration.
    config: MCTSConfig,

    /// Statistics of the last search.
    stats: SearchStats,
}

impl<E: Evaluator> MCTSSearch<E> {
    /// Create a new MCTS search context.
    pub fn new(evaluator: E, config: MCTSConfig) -> Self {
        Self {
            evaluator,
            config,
            stats: SearchStats::default(),
        }
    }

    /// Build a tree for `state` within `budget`.
    ///
    /// The root starts with one visit and is expanded before any simulation.
    /// The returned tree is never shared with other searches.
    pub fn run<G: GameState>(&mut self, state: &G, budget: SearchBudget) -> MCTSTree {
        let start = Instant::now();
        self.stats.reset();

        let tree = MCTSTree::new(1);
        if tree.expand(tree.root(), state) == Expansion::Expanded {
            self.stats.nodes_expanded += 1;
        } else {
            // Decided or stuck: nothing to search
            self.stats.workers = 0;
            self.stats.set_elapsed(start.elapsed());
            return tree;
        }

        let workers = self.config.worker_count(budget);
        let exploration = self.config.exploration_constant;
        let evaluator = &self.evaluator;

        let worker_stats = if workers <= 1 {
            vec![run_worker(&tree, state.clone(), evaluator, exploration, budget, start)]
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => {
                    let states: Vec<G> = (0..workers).map(|_| state.clone()).collect();
                    pool.install(|| {
                        states
                            .into_par_iter()
                            .map(|local| run_worker(&tree, local, evaluator, exploration, budget, start))
                            .collect()
                    })
                }
                Err(e) => {
                    warn!(error = %e, workers, "failed to build search thread pool; searching serially");
                    vec![run_worker(&tree, state.clone(), evaluator, exploration, budget, start)]
                }
            }
        };

        self.stats.workers = worker_stats.len();
        for stats in &worker_stats {
            self.stats.merge(stats);
        }
        self.stats.set_elapsed(start.elapsed());

        debug!(
            simulations = self.stats.simulations,
            contended = self.stats.contended,
            rejected = self.stats.rejected_moves,
            workers = self.stats.workers,
            nodes = tree.len(),
            "search finished"
        );

        tree
    }

    /// Search `state` and pick a move for the side to move.
    ///
    /// Returns `None` when the root has no children (decided state or no
    /// legal moves).
    pub fn search<G: GameState>(&mut self, state: &G, budget: SearchBudget) -> Option<SearchResult> {
        let tree = self.run(state, budget);
        let best_move = tree.best_move(state.current_player())?;
        let root = tree.node_stats(tree.root());

        Some(SearchResult {
            best_move,
            evaluation: root.mean(),
            root_visits: root.visits,
            children: tree.child_summaries(tree.root()),
            stats: self.stats.clone(),
        })
    }

    /// Get search statistics of the last search.
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Get the configuration.
    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }

    /// Get the evaluator.
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }
}

/// Budget check, evaluated before every simulation.
fn within_budget(tree: &MCTSTree, budget: SearchBudget, start: Instant) -> bool {
    match budget {
        SearchBudget::Visits(target) => tree.root_visits() < target,
        SearchBudget::Time(limit) => start.elapsed() < limit,
    }
}

/// Simulation loop of one worker on its private state.
fn run_worker<G: GameState, E: Evaluator + ?Sized>(
    tree: &MCTSTree,
    mut state: G,
    evaluator: &E,
    exploration: f64,
    budget: SearchBudget,
    start: Instant,
) -> SearchStats {
    let mut stats = SearchStats::new();
    let mut path = Vec::with_capacity(64);

    while within_budget(tree, budget, start) {
        match simulate(tree, &mut state, evaluator, exploration, &mut path, &mut stats) {
            Simulation::Completed => stats.simulations += 1,
            Simulation::Contended => {
                stats.contended += 1;
                std::thread::yield_now();
            }
            Simulation::Rejected => {
                stats.rejected_moves += 1;
                if stats.rejected_moves >= MAX_REJECTED_MOVES {
                    warn!(rejected = stats.rejected_moves, "too many rejected tree moves; stopping worker");
                    break;
                }
            }
        }
    }

    stats
}

/// One select/expand/evaluate/backpropagate pass.
///
/// `state` is the root position on entry and is restored on every exit.
fn simulate<G: GameState, E: Evaluator + ?Sized>(
    tree: &MCTSTree,
    state: &mut G,
    evaluator: &E,
    exploration: f64,
    path: &mut Vec<NodeId>,
    stats: &mut SearchStats,
) -> Simulation {
    path.clear();
    path.push(tree.root());
    let mut applied = 0usize;

    // === SELECTION ===
    let mut current = tree.root();
    while let Some((child, mv)) = tree.select_child(current, state.current_player(), exploration) {
        if !state.make_move(mv) {
            warn!(mv, node = %child, "game rejected a tree move; abandoning simulation");
            unwind(state, applied);
            return Simulation::Rejected;
        }
        applied += 1;
        path.push(child);
        current = child;
    }

    // === EXPANSION ===
    match tree.expand(current, state) {
        Expansion::Contended => {
            unwind(state, applied);
            return Simulation::Contended;
        }
        Expansion::Expanded => stats.nodes_expanded += 1,
        Expansion::Leaf => {}
    }

    // === EVALUATION ===
    let score = match state.winner().score() {
        Some(terminal) => terminal,
        None => evaluator.clamped_evaluation(&state.board_state()),
    };

    // === BACKPROPAGATION ===
    tree.backpropagate(path, f64::from(score));
    stats.max_depth = stats.max_depth.max(u16::try_from(applied).unwrap_or(u16::MAX));

    unwind(state, applied);
    Simulation::Completed
}

/// Undo `applied` moves.
fn unwind<G: GameState>(state: &mut G, applied: usize) {
    for _ in 0..applied {
        if !state.unmake_move() {
            warn!("unmake_move failed while unwinding a simulation");
            break;
        }
    }
}
