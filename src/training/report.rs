//! Training and benchmark reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::nn::EvaluatorId;

/// Training mode a report belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    Evolution,
    AgainstRandom,
    GradientDescent,
}

impl fmt::Display for TrainingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainingMode::Evolution => "evolution",
            TrainingMode::AgainstRandom => "against-random",
            TrainingMode::GradientDescent => "gradient-descent",
        };
        f.write_str(name)
    }
}

/// Outcome of one generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Generation index within the run.
    pub generation: usize,

    /// Champion after the generation.
    pub champion: EvaluatorId,

    /// Whether the champion changed.
    pub new_champion: bool,

    /// Win ratio of the top-ranked member.
    pub best_win_ratio: f32,

    /// Decided matches played this generation.
    pub decided_matches: u32,

    /// Drawn matches played this generation.
    pub draws: u32,
}

/// Outcome of a training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub mode: TrainingMode,

    /// Per-generation summaries.
    pub generations: Vec<GenerationSummary>,

    /// Champion changes during this run.
    pub champion_improvements: u32,

    /// Champion at the end of the run.
    pub champion: Option<EvaluatorId>,
}

impl TrainingReport {
    pub(crate) fn new(mode: TrainingMode) -> Self {
        Self {
            mode,
            generations: Vec::new(),
            champion_improvements: 0,
            champion: None,
        }
    }

    pub(crate) fn push(&mut self, summary: GenerationSummary) {
        if summary.new_champion {
            self.champion_improvements += 1;
        }
        self.champion = Some(summary.champion);
        self.generations.push(summary);
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} training: champion improved {} times over {} generations",
            self.mode,
            self.champion_improvements,
            self.generations.len()
        )?;
        if let Some(champion) = self.champion {
            write!(f, " (champion {champion})")?;
        }
        Ok(())
    }
}

/// Win/draw/loss counts for one seat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRecord {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl SeatRecord {
    /// Games counted.
    #[must_use]
    pub fn games(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    fn percent(&self, value: u32) -> f64 {
        match self.games() {
            0 => 0.0,
            total => f64::from(value) * 100.0 / f64::from(total),
        }
    }

    /// Win percentage.
    #[must_use]
    pub fn win_percent(&self) -> f64 {
        self.percent(self.wins)
    }

    /// Draw percentage.
    #[must_use]
    pub fn draw_percent(&self) -> f64 {
        self.percent(self.draws)
    }

    /// Loss percentage.
    #[must_use]
    pub fn loss_percent(&self) -> f64 {
        self.percent(self.losses)
    }
}

impl fmt::Display for SeatRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Wins: {} ({:.1}%)", self.wins, self.win_percent())?;
        writeln!(f, "  Draws: {} ({:.1}%)", self.draws, self.draw_percent())?;
        write!(f, "  Losses: {} ({:.1}%)", self.losses, self.loss_percent())
    }
}

/// Champion results against a uniformly random mover.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub champion: EvaluatorId,
    pub as_first: SeatRecord,
    pub as_second: SeatRecord,
}

impl BenchmarkReport {
    /// Games played.
    #[must_use]
    pub fn games(&self) -> u32 {
        self.as_first.games() + self.as_second.games()
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Champion {} vs random agent ({} games)", self.champion, self.games())?;
        writeln!(f, "As Player 1:")?;
        writeln!(f, "{}", self.as_first)?;
        writeln!(f, "As Player 2:")?;
        write!(f, "{}", self.as_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(generation: usize, champion: u64, new_champion: bool) -> GenerationSummary {
        GenerationSummary {
            generation,
            champion: EvaluatorId(champion),
            new_champion,
            best_win_ratio: 0.5,
            decided_matches: 10,
            draws: 2,
        }
    }

    #[test]
    fn test_training_report_counts_improvements() {
        let mut report = TrainingReport::new(TrainingMode::Evolution);
        report.push(summary(0, 3, true));
        report.push(summary(1, 3, false));
        report.push(summary(2, 9, true));

        assert_eq!(report.champion_improvements, 2);
        assert_eq!(report.champion, Some(EvaluatorId(9)));
        assert_eq!(
            report.to_string(),
            "evolution training: champion improved 2 times over 3 generations (champion 9)"
        );
    }

    #[test]
    fn test_seat_percentages() {
        let seat = SeatRecord {
            wins: 3,
            draws: 1,
            losses: 0,
        };
        assert_eq!(seat.games(), 4);
        assert_eq!(seat.win_percent(), 75.0);
        assert_eq!(seat.draw_percent(), 25.0);
        assert_eq!(seat.loss_percent(), 0.0);
        assert_eq!(SeatRecord::default().win_percent(), 0.0);
    }

    #[test]
    fn test_benchmark_display() {
        let report = BenchmarkReport {
            champion: EvaluatorId(4),
            as_first: SeatRecord {
                wins: 1,
                draws: 0,
                losses: 1,
            },
            as_second: SeatRecord::default(),
        };
        let text = report.to_string();
        assert!(text.starts_with("Champion 4 vs random agent (2 games)"));
        assert!(text.contains("Wins: 1 (50.0%)"));
        assert!(text.contains("As Player 2:"));
    }
}
