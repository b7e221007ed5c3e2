//! Position evaluators.
//!
//! ## Overview
//!
//! - **Traits**: [`Evaluator`], the only thing search and match play need
//! - **Network**: [`NeuralEvaluator`], a trainable feed-forward evaluator
//! - **Identity**: [`EvaluatorId`] and the atomic [`IdAllocator`]
//! - **Persistence**: text save/load in [`persist`]
//! - **Baselines**: [`ConstantEvaluator`], [`SumEvaluator`] for testing
//!
//! ## Usage
//!
//! ```rust
//! use rust_selfplay::core::GameRng;
//! use rust_selfplay::nn::{IdAllocator, NeuralEvaluator};
//!
//! let ids = IdAllocator::new();
//! let mut rng = GameRng::new(42);
//! let evaluator = NeuralEvaluator::new(10, &[8, 4], &ids, &mut rng);
//!
//! let raw = evaluator.evaluate(&[0.0; 10]);
//! assert!(raw > 0.0 && raw < 1.0);
//! ```

pub mod identity;
pub mod network;
pub mod persist;
pub mod traits;

pub use identity::{EvaluatorId, IdAllocator};
pub use network::{EvalBounds, Layer, NeuralEvaluator};
pub use traits::{ConstantEvaluator, Evaluator, SumEvaluator};
