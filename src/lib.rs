//! # rust-selfplay
//!
//! A game-agnostic self-play trainer for two-player, turn-based,
//! perfect-information games.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: The engine sees a game only through
//!    [`GameState`]: opaque move codes, make/unmake, a winner, and a
//!    fixed-length float encoding.
//!
//! 2. **Shared-Tree Search**: Parallel MCTS workers grow one arena tree,
//!    each with a private game copy rewound after every simulation.
//!
//! 3. **Lineage by Identity**: Evaluators carry identities from an injected
//!    [`IdAllocator`]; the champion is tracked by identity across
//!    generations.
//!
//! ## Modules
//!
//! - `core`: Game contract, RNG, errors
//! - `nn`: Dense sigmoid evaluator, bounds, persistence
//! - `mcts`: Concurrent Monte Carlo Tree Search
//! - `training`: Population trainer, matches, reports
//! - `games`: Reference games (Tic-Tac-Toe, Connect Four)

pub mod core;
pub mod games;
pub mod mcts;
pub mod nn;
pub mod training;

// Re-export commonly used types
pub use crate::core::{
    ConfigError, GameRng, GameState, LoadError, MoveCode, Result, Side, TrainerError, Winner,
};

pub use crate::nn::{EvalBounds, Evaluator, EvaluatorId, IdAllocator, NeuralEvaluator};

pub use crate::mcts::{MCTSConfig, MCTSSearch, MCTSTree, NodeId, SearchBudget, SearchResult, SearchStats, Workers};

pub use crate::training::{
    BenchmarkReport, GreedyOrientation, MatchMode, Trainer, TrainerConfig, TrainingReport,
};
