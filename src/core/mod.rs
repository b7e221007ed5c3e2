//! Core types: the game contract, randomness, and errors.
//!
//! This module contains the game-agnostic building blocks shared by the
//! evaluator, the search engine, and the trainer.

pub mod error;
pub mod game;
pub mod rng;

pub use error::{ConfigError, LoadError, Result, TrainerError};
pub use game::{GameState, MoveCode, Side, Winner};
pub use rng::GameRng;
