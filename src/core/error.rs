use std::path::PathBuf;

use thiserror::Error;

/// Failure to load a persisted evaluator.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected end of file while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("malformed {field}: {value:?}")]
    Malformed { field: &'static str, value: String },

    #[error("inconsistent network shape: {0}")]
    Shape(String),
}

/// Rejected configuration value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("population size must be an even number >= 2, got {0}")]
    PopulationSize(usize),

    #[error("learning rate must be positive, got {0}")]
    LearningRate(f32),

    #[error("discount must be in (0, 1], got {0}")]
    Discount(f32),

    #[error("hidden layer sizes must be positive")]
    HiddenLayer,

    #[error("max moves per match must be positive")]
    MaxMoves,

    #[error("MCTS visit budget must be positive")]
    SearchBudget,

    #[error("exploration constant must be finite and non-negative, got {0}")]
    Exploration(f64),

    #[error("worker count must be positive")]
    Workers,
}

/// Errors surfaced by the training orchestrator.
#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("no champion has been selected yet")]
    NoChampion,

    #[error("population is empty; initialize it first")]
    EmptyPopulation,

    #[error("evaluator input size {evaluator} does not match game encoding size {game}")]
    InputSize { evaluator: usize, game: usize },

    #[error("failed to write {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience Result type for trainer operations.
pub type Result<T> = std::result::Result<T, TrainerError>;
