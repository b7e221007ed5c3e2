//! Match trajectories for gradient-descent self-play.
//!
//! A trajectory records, for every decision point of one match:
//! - The encoded position the mover saw before moving
//! - Which side moved
//!
//! Once the outcome is known, each side's decisions turn into discounted
//! value targets.

use serde::{Deserialize, Serialize};

use crate::core::{Side, Winner};

/// A single decision point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Board encoding before the move.
    pub encoding: Vec<f32>,

    /// The side that made this decision.
    pub side: Side,
}

/// A complete match trajectory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// All steps in the game.
    pub steps: Vec<Step>,

    /// Final outcome. `OnGoing` until set; unfinished games count as draws.
    pub outcome: Winner,
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::new()
    }
}

impl Trajectory {
    /// Create an empty trajectory.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            outcome: Winner::OnGoing,
        }
    }

    /// Record the position `side` moved from.
    pub fn record(&mut self, side: Side, encoding: Vec<f32>) {
        self.steps.push(Step { encoding, side });
    }

    /// Set the final outcome.
    pub fn set_outcome(&mut self, outcome: Winner) {
        self.outcome = outcome;
    }

    /// Get the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if trajectory is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps taken by one side, oldest first.
    pub fn side_steps(&self, side: Side) -> impl DoubleEndedIterator<Item = &Step> {
        self.steps.iter().filter(move |s| s.side == side)
    }

    /// Final reward for `side`: +1 win, -1 loss, 0 otherwise.
    #[must_use]
    pub fn reward(&self, side: Side) -> f32 {
        let first = self.outcome.score().unwrap_or(0.0);
        match side {
            Side::First => first,
            Side::Second => -first,
        }
    }

    /// Value targets for `side`, newest decision first.
    ///
    /// The newest decision gets the final reward, each earlier one the
    /// previous target times `discount`.
    pub fn training_samples(&self, side: Side, discount: f32) -> Vec<TrainingSample> {
        let mut target = self.reward(side);
        self.side_steps(side)
            .rev()
            .map(|step| {
                let sample = TrainingSample {
                    encoding: step.encoding.clone(),
                    target,
                };
                target *= discount;
                sample
            })
            .collect()
    }
}

/// One supervised example.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Board encoding.
    pub encoding: Vec<f32>,

    /// Target value.
    pub target: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game() -> Trajectory {
        let mut traj = Trajectory::new();
        for ply in 0..5 {
            let side = if ply % 2 == 0 { Side::First } else { Side::Second };
            traj.record(side, vec![ply as f32]);
        }
        traj
    }

    #[test]
    fn test_record() {
        let traj = sample_game();
        assert_eq!(traj.len(), 5);
        assert!(!traj.is_empty());
        assert_eq!(traj.steps[3].encoding, vec![3.0]);
        assert_eq!(traj.side_steps(Side::First).count(), 3);
        assert_eq!(traj.side_steps(Side::Second).count(), 2);
    }

    #[test]
    fn test_rewards() {
        let mut traj = sample_game();
        assert_eq!(traj.reward(Side::First), 0.0);

        traj.set_outcome(Winner::Player1);
        assert_eq!(traj.reward(Side::First), 1.0);
        assert_eq!(traj.reward(Side::Second), -1.0);

        traj.set_outcome(Winner::Player2);
        assert_eq!(traj.reward(Side::First), -1.0);

        traj.set_outcome(Winner::Draw);
        assert_eq!(traj.reward(Side::Second), 0.0);
    }

    #[test]
    fn test_discounted_targets_newest_first() {
        let mut traj = sample_game();
        traj.set_outcome(Winner::Player1);

        let first = traj.training_samples(Side::First, 0.5);
        let encodings: Vec<f32> = first.iter().map(|s| s.encoding[0]).collect();
        let targets: Vec<f32> = first.iter().map(|s| s.target).collect();
        assert_eq!(encodings, vec![4.0, 2.0, 0.0]);
        assert_eq!(targets, vec![1.0, 0.5, 0.25]);

        let second = traj.training_samples(Side::Second, 0.9);
        let targets: Vec<f32> = second.iter().map(|s| s.target).collect();
        assert_eq!(second[0].encoding, vec![3.0]);
        assert!((targets[0] + 1.0).abs() < 1e-6);
        assert!((targets[1] + 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_draw_targets_are_zero() {
        let mut traj = sample_game();
        traj.set_outcome(Winner::Draw);
        assert!(traj.training_samples(Side::First, 0.9).iter().all(|s| s.target == 0.0));
    }

    #[test]
    fn test_trajectory_serialization() {
        let mut traj = sample_game();
        traj.set_outcome(Winner::Player2);

        let json = serde_json::to_string(&traj).unwrap();
        let deserialized: Trajectory = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, traj);
    }
}
