//! Population training for [`NeuralEvaluator`](crate::nn::NeuralEvaluator)s.
//!
//! ## Overview
//!
//! - **TrainerConfig**: Population, mutation and match settings (serde)
//! - **Trainer**: Evolution, training against a random mover, and
//!   gradient-descent self-play over a population
//! - **matches**: Greedy and search-backed move choice, full matches, and
//!   bound fuzzing
//! - **Trajectory**: Per-match decision record turned into value targets
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use rust_selfplay::games::TicTacToe;
//! use rust_selfplay::nn::IdAllocator;
//! use rust_selfplay::training::{Trainer, TrainerConfig};
//!
//! let config = TrainerConfig::default()
//!     .with_population_size(4)
//!     .with_hidden_layers(vec![8])
//!     .with_seed(7);
//!
//! let mut trainer = Trainer::new(TicTacToe::new(), config)
//!     .unwrap()
//!     .with_ids(Arc::new(IdAllocator::new()));
//! trainer.initialize_population();
//!
//! let report = trainer.train_generations(2).unwrap();
//! assert_eq!(report.generations.len(), 2);
//! assert!(trainer.champion().is_some());
//! ```

pub mod config;
pub mod matches;
pub mod report;
pub mod trainer;
pub mod trajectory;

pub use config::{GreedyOrientation, MatchMode, TrainerConfig};
pub use matches::{choose_best_move, play_match, Agent, MatchOutcome, MatchResult, MatchSettings};
pub use report::{BenchmarkReport, GenerationSummary, SeatRecord, TrainingMode, TrainingReport};
pub use trainer::{Player, Trainer};
pub use trajectory::{Step, Trajectory, TrainingSample};
