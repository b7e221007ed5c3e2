//! Monte Carlo Tree Search.
//!
//! ## Overview
//!
//! - **Shared Tree**: one arena tree per search, shared by all workers
//! - **Exactly-Once Expansion**: an atomic claim plus a write-once child list
//! - **Evaluator Leaves**: non-terminal leaves are scored with
//!   [`Evaluator::clamped_evaluation`](crate::nn::Evaluator::clamped_evaluation)
//! - **Budgets**: fixed visit count or wall-clock time, serial or parallel
//!
//! Scores are always from player 1's perspective: player 1 maximizes,
//! player 2 minimizes.
//!
//! ## Usage
//!
//! ```rust
//! use rust_selfplay::games::TicTacToe;
//! use rust_selfplay::mcts::{MCTSConfig, MCTSSearch, SearchBudget, Workers};
//! use rust_selfplay::nn::ConstantEvaluator;
//!
//! let config = MCTSConfig::default().with_workers(Workers::Fixed(1));
//! let mut search = MCTSSearch::new(ConstantEvaluator::uniform(0.0), config);
//!
//! let result = search.search(&TicTacToe::new(), SearchBudget::Visits(200)).unwrap();
//! assert_eq!(result.root_visits, 200);
//! println!("best move: {}", result.best_move);
//! ```

pub mod config;
pub mod node;
pub mod search;
pub mod stats;
pub mod tree;

// Re-export main types
pub use config::{MCTSConfig, SearchBudget, Workers};
pub use node::{MCTSNode, NodeId, NodeStats};
pub use search::{MCTSSearch, SearchResult};
pub use stats::SearchStats;
pub use tree::{ChildSummary, Expansion, MCTSTree, TreeStats};
