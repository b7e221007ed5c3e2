//! Trainer configuration.

use serde::{Deserialize, Serialize};

use crate::core::{ConfigError, Side};
use crate::mcts::MCTSConfig;

/// How evaluator-driven players pick their moves during matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// One-ply look-ahead on raw evaluations.
    Greedy,
    /// Full tree search with a visit budget per move.
    Mcts { visits: u32 },
}

/// Which direction the one-ply greedy chooser optimizes for each side.
///
/// Raw network outputs have no built-in sign convention; evolution only
/// requires that every player uses the same one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GreedyOrientation {
    /// Player 1 picks the lowest successor value, player 2 the highest.
    #[default]
    FirstMinimizes,
    /// Player 1 picks the highest successor value, player 2 the lowest.
    /// Matches the search engine's convention.
    FirstMaximizes,
}

impl GreedyOrientation {
    /// Whether `side` looks for the lowest successor value.
    #[must_use]
    pub fn minimizes(self, side: Side) -> bool {
        match (self, side) {
            (GreedyOrientation::FirstMinimizes, Side::First) | (GreedyOrientation::FirstMaximizes, Side::Second) => {
                true
            }
            (GreedyOrientation::FirstMinimizes, Side::Second) | (GreedyOrientation::FirstMaximizes, Side::First) => {
                false
            }
        }
    }
}

/// Trainer configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Population size (even, at least 2).
    pub population_size: usize,

    /// Matches each member plays per generation.
    pub matches_per_generation: usize,

    /// Weights and biases perturbed per mutation.
    pub mutation_rate: usize,

    /// Step size for gradient-descent training.
    pub learning_rate: f32,

    /// Per-ply reward discount for gradient-descent training, in (0, 1].
    pub discount: f32,

    /// Hidden layer widths for new evaluators.
    pub hidden_layers: Vec<usize>,

    /// Plies after which a match is declared a draw.
    pub max_moves: usize,

    /// Move selection for evaluator-driven players.
    pub match_mode: MatchMode,

    /// Greedy chooser orientation.
    pub greedy_orientation: GreedyOrientation,

    /// RNG seed (entropy when absent).
    pub seed: Option<u64>,

    /// Search settings for `MatchMode::Mcts`.
    pub mcts: MCTSConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            population_size: 40,
            matches_per_generation: 4,
            mutation_rate: 1,
            learning_rate: 0.1,
            discount: 0.9,
            hidden_layers: vec![42, 42, 21, 8],
            max_moves: 1000,
            match_mode: MatchMode::Greedy,
            greedy_orientation: GreedyOrientation::default(),
            seed: None,
            mcts: MCTSConfig::default(),
        }
    }
}

impl TrainerConfig {
    /// Set the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Set matches per member per generation.
    pub fn with_matches_per_generation(mut self, matches: usize) -> Self {
        self.matches_per_generation = matches;
        self
    }

    /// Set the mutation rate.
    pub fn with_mutation_rate(mut self, rate: usize) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Set the learning rate.
    pub fn with_learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = rate;
        self
    }

    /// Set the discount factor.
    pub fn with_discount(mut self, discount: f32) -> Self {
        self.discount = discount;
        self
    }

    /// Set hidden layer widths.
    pub fn with_hidden_layers(mut self, layers: Vec<usize>) -> Self {
        self.hidden_layers = layers;
        self
    }

    /// Set the draw cutoff.
    pub fn with_max_moves(mut self, max: usize) -> Self {
        self.max_moves = max;
        self
    }

    /// Set the match mode.
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Set the greedy orientation.
    pub fn with_greedy_orientation(mut self, orientation: GreedyOrientation) -> Self {
        self.greedy_orientation = orientation;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the search configuration.
    pub fn with_mcts(mut self, mcts: MCTSConfig) -> Self {
        self.mcts = mcts;
        self
    }

    /// Reject unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 || self.population_size % 2 != 0 {
            return Err(ConfigError::PopulationSize(self.population_size));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::LearningRate(self.learning_rate));
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(ConfigError::Discount(self.discount));
        }
        if self.hidden_layers.contains(&0) {
            return Err(ConfigError::HiddenLayer);
        }
        if self.max_moves == 0 {
            return Err(ConfigError::MaxMoves);
        }
        if self.match_mode == (MatchMode::Mcts { visits: 0 }) {
            return Err(ConfigError::SearchBudget);
        }
        self.mcts.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::Workers;

    #[test]
    fn test_defaults() {
        let config = TrainerConfig::default();
        assert_eq!(config.population_size, 40);
        assert_eq!(config.matches_per_generation, 4);
        assert_eq!(config.mutation_rate, 1);
        assert_eq!(config.hidden_layers, vec![42, 42, 21, 8]);
        assert_eq!(config.match_mode, MatchMode::Greedy);
        assert_eq!(config.greedy_orientation, GreedyOrientation::FirstMinimizes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_population_size_rules() {
        for size in [0, 1, 3, 41] {
            let config = TrainerConfig::default().with_population_size(size);
            assert_eq!(config.validate(), Err(ConfigError::PopulationSize(size)));
        }
        assert!(TrainerConfig::default().with_population_size(2).validate().is_ok());
    }

    #[test]
    fn test_rate_rules() {
        assert_eq!(
            TrainerConfig::default().with_learning_rate(0.0).validate(),
            Err(ConfigError::LearningRate(0.0))
        );
        assert!(TrainerConfig::default().with_learning_rate(-0.5).validate().is_err());
        assert!(TrainerConfig::default().with_discount(0.0).validate().is_err());
        assert!(TrainerConfig::default().with_discount(1.5).validate().is_err());
        assert!(TrainerConfig::default().with_discount(1.0).validate().is_ok());
    }

    #[test]
    fn test_structural_rules() {
        assert_eq!(
            TrainerConfig::default().with_hidden_layers(vec![8, 0]).validate(),
            Err(ConfigError::HiddenLayer)
        );
        assert!(TrainerConfig::default().with_hidden_layers(vec![]).validate().is_ok());
        assert_eq!(TrainerConfig::default().with_max_moves(0).validate(), Err(ConfigError::MaxMoves));
        assert_eq!(
            TrainerConfig::default().with_match_mode(MatchMode::Mcts { visits: 0 }).validate(),
            Err(ConfigError::SearchBudget)
        );
        assert_eq!(
            TrainerConfig::default()
                .with_mcts(MCTSConfig::default().with_workers(Workers::Fixed(0)))
                .validate(),
            Err(ConfigError::Workers)
        );
    }

    #[test]
    fn test_orientation() {
        assert!(GreedyOrientation::FirstMinimizes.minimizes(Side::First));
        assert!(!GreedyOrientation::FirstMinimizes.minimizes(Side::Second));
        assert!(!GreedyOrientation::FirstMaximizes.minimizes(Side::First));
        assert!(GreedyOrientation::FirstMaximizes.minimizes(Side::Second));
    }

    #[test]
    fn test_json() {
        let config = TrainerConfig::default()
            .with_match_mode(MatchMode::Mcts { visits: 64 })
            .with_seed(7);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""mcts":{"visits":64}"#));
        let back: TrainerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: TrainerConfig =
            serde_json::from_str(r#"{"population_size": 6, "greedy_orientation": "first_maximizes"}"#).unwrap();
        assert_eq!(partial.population_size, 6);
        assert_eq!(partial.greedy_orientation, GreedyOrientation::FirstMaximizes);
        assert_eq!(partial.max_moves, 1000);
    }
}
