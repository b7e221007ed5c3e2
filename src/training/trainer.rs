//! Population-based trainer.
//!
//! A [`Trainer`] owns a population of [`NeuralEvaluator`]s for one game and
//! improves it in generations:
//!
//! - **Evolution**: members play each other, the better half survives and
//!   mutated children refill the population
//! - **Against random**: the same selection, with a random mover as the only
//!   opponent
//! - **Gradient descent**: members play each other and learn from discounted
//!   match outcomes
//!
//! The champion is tracked by identity and always names a current member
//! once a generation has run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::{GameRng, GameState, Result, Side, TrainerError, Winner};
use crate::nn::{persist, EvalBounds, Evaluator, EvaluatorId, IdAllocator, NeuralEvaluator};

use super::config::TrainerConfig;
use super::matches::{fuzz_bounds, play_match, Agent, MatchOutcome, MatchResult, MatchSettings};
use super::report::{BenchmarkReport, GenerationSummary, SeatRecord, TrainingMode, TrainingReport};
use super::trajectory::Trajectory;

/// A population member and its tallies for the current generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    evaluator: NeuralEvaluator,
    wins: u32,
    losses: u32,
}

impl Player {
    /// Wrap an evaluator with empty tallies.
    pub fn new(evaluator: NeuralEvaluator) -> Self {
        Self {
            evaluator,
            wins: 0,
            losses: 0,
        }
    }

    pub fn evaluator(&self) -> &NeuralEvaluator {
        &self.evaluator
    }

    pub fn id(&self) -> EvaluatorId {
        self.evaluator.id()
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }

    /// Wins over decided matches; 0 without decided matches.
    #[must_use]
    pub fn win_ratio(&self) -> f32 {
        match self.wins + self.losses {
            0 => 0.0,
            total => self.wins as f32 / total as f32,
        }
    }

    fn record(&mut self, result: MatchResult) {
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Loss => self.losses += 1,
            MatchResult::Draw => {}
        }
    }

    fn reset(&mut self) {
        self.wins = 0;
        self.losses = 0;
    }

    /// One training step per recorded decision of `side`, newest first.
    fn learn(&mut self, trajectory: &Trajectory, side: Side, discount: f32, learning_rate: f32) -> Result<()> {
        for sample in trajectory.training_samples(side, discount) {
            self.evaluator.train_single(&sample.encoding, sample.target, learning_rate)?;
        }
        Ok(())
    }
}

/// Per-generation match counts.
#[derive(Clone, Copy, Debug, Default)]
struct MatchTally {
    decided: u32,
    draws: u32,
}

impl MatchTally {
    fn count(&mut self, outcome: &MatchOutcome) {
        if outcome.winner == Winner::Draw {
            self.draws += 1;
        } else {
            self.decided += 1;
        }
    }
}

/// Population trainer for one game.
pub struct Trainer<G: GameState> {
    base: G,
    config: TrainerConfig,
    settings: MatchSettings,
    population: Vec<Player>,
    champion: Option<EvaluatorId>,
    champion_improvements: u32,
    ids: Arc<IdAllocator>,
    rng: GameRng,
}

impl<G: GameState> Trainer<G> {
    /// Create a trainer with an empty population.
    ///
    /// `base` is the starting position of every match. Identities come from
    /// [`IdAllocator::shared`] unless replaced with [`with_ids`](Self::with_ids).
    pub fn new(base: G, config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let rng = GameRng::from_optional_seed(config.seed);
        debug!(game = base.name(), seed = rng.seed(), "created trainer");

        Ok(Self {
            base,
            settings: MatchSettings::from_config(&config),
            config,
            population: Vec::new(),
            champion: None,
            champion_improvements: 0,
            ids: IdAllocator::shared(),
            rng,
        })
    }

    /// Use `ids` for every evaluator created from now on.
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<IdAllocator>) -> Self {
        self.ids = ids;
        self
    }

    /// Length of the base game's encoding.
    pub fn input_size(&self) -> usize {
        self.base.board_state().len()
    }

    /// Replace the population with freshly initialised evaluators.
    pub fn initialize_population(&mut self) {
        let input_size = self.input_size();
        let mut population = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            population.push(self.fresh_player(input_size));
        }
        self.population = population;
        self.champion = None;
        info!(
            size = self.population.len(),
            input_size,
            hidden = ?self.config.hidden_layers,
            "initialized population"
        );
    }

    fn fresh_player(&mut self, input_size: usize) -> Player {
        Player::new(NeuralEvaluator::new(
            input_size,
            &self.config.hidden_layers,
            &self.ids,
            &mut self.rng,
        ))
    }

    // === Accessors ===

    pub fn base(&self) -> &G {
        &self.base
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn population(&self) -> &[Player] {
        &self.population
    }

    pub fn champion_id(&self) -> Option<EvaluatorId> {
        self.champion
    }

    /// The current champion, if it is still a member.
    pub fn champion(&self) -> Option<&NeuralEvaluator> {
        self.champion_index().map(|i| &self.population[i].evaluator)
    }

    /// Champion changes since the trainer was created.
    pub fn champion_improvements(&self) -> u32 {
        self.champion_improvements
    }

    fn champion_index(&self) -> Option<usize> {
        let id = self.champion?;
        self.population.iter().position(|p| p.id() == id)
    }

    fn require_champion(&self) -> Result<usize> {
        self.champion_index().ok_or(TrainerError::NoChampion)
    }

    fn require_population(&self) -> Result<()> {
        if self.population.is_empty() {
            Err(TrainerError::EmptyPopulation)
        } else {
            Ok(())
        }
    }

    /// Replace the configuration.
    ///
    /// On error the previous configuration stays in place. A changed
    /// population size truncates the ranked population or fills it with
    /// fresh evaluators; a champion cut by truncation is replaced by the
    /// top-ranked member. The seed is only read at construction.
    pub fn set_config(&mut self, config: TrainerConfig) -> Result<()> {
        config.validate()?;
        self.settings = MatchSettings::from_config(&config);
        self.config = config;

        let target = self.config.population_size;
        if self.population.is_empty() || self.population.len() == target {
            return Ok(());
        }

        if self.population.len() > target {
            self.population.truncate(target);
            if self.champion.is_some() && self.champion_index().is_none() {
                self.champion = Some(self.population[0].id());
                debug!(champion = %self.population[0].id(), "champion truncated; top member promoted");
            }
        } else {
            let input_size = self.input_size();
            while self.population.len() < target {
                let player = self.fresh_player(input_size);
                self.population.push(player);
            }
        }
        info!(size = target, "population resized");
        Ok(())
    }

    // === Training ===

    /// Run `generations` evolutionary generations.
    pub fn train_generations(&mut self, generations: usize) -> Result<TrainingReport> {
        self.require_population()?;
        let mut report = TrainingReport::new(TrainingMode::Evolution);
        for generation in 0..generations {
            let summary = self.run_generation(generation);
            report.push(summary);
        }
        info!(%report, "training complete");
        Ok(report)
    }

    /// One evolutionary generation.
    ///
    /// Every member plays `matches_per_generation` matches against distinct
    /// random opponents, then the population is ranked by win ratio, the top
    /// member becomes champion and the better half reproduces.
    pub fn run_generation(&mut self, generation: usize) -> GenerationSummary {
        self.reset_tallies();

        let size = self.population.len();
        let mut tally = MatchTally::default();
        for i in 0..size {
            for _ in 0..self.config.matches_per_generation {
                let j = pick_opponent(&mut self.rng, size, i);
                let member_first = self.rng.coin_flip();
                let (side, outcome) = play_seated(
                    &self.base,
                    Agent::Evaluator(&self.population[i].evaluator),
                    Agent::Evaluator(&self.population[j].evaluator),
                    member_first,
                    &self.settings,
                    &mut self.rng,
                    None,
                );
                self.population[i].record(outcome.result_for(side));
                self.population[j].record(outcome.result_for(side.opponent()));
                tally.count(&outcome);
            }
        }

        self.rank();
        let best_win_ratio = self.population[0].win_ratio();
        let new_champion = self.promote_top(generation);
        self.reproduce();

        self.summary(generation, new_champion, best_win_ratio, tally)
    }

    /// Run `generations` generations against a random mover.
    ///
    /// The champion only changes when it fails to survive selection.
    pub fn train_against_random(&mut self, generations: usize) -> Result<TrainingReport> {
        self.require_population()?;
        let mut report = TrainingReport::new(TrainingMode::AgainstRandom);

        for generation in 0..generations {
            self.reset_tallies();

            let mut tally = MatchTally::default();
            for i in 0..self.population.len() {
                for _ in 0..self.config.matches_per_generation {
                    let member_first = self.rng.coin_flip();
                    let (side, outcome) = play_seated(
                        &self.base,
                        Agent::Evaluator(&self.population[i].evaluator),
                        Agent::Random,
                        member_first,
                        &self.settings,
                        &mut self.rng,
                        None,
                    );
                    self.population[i].record(outcome.result_for(side));
                    tally.count(&outcome);
                }
            }

            self.rank();
            let best_win_ratio = self.population[0].win_ratio();
            self.reproduce();

            let new_champion = self.champion_index().is_none();
            if new_champion {
                let id = self.population[0].id();
                self.champion = Some(id);
                self.champion_improvements += 1;
                info!(generation, champion = %id, "champion eliminated; new champion");
            }

            report.push(self.summary(generation, new_champion, best_win_ratio, tally));
        }

        info!(%report, "training complete");
        Ok(report)
    }

    /// Run `generations` generations of gradient-descent self-play.
    ///
    /// After every match both participants train on their own decisions,
    /// targets discounted backwards from the final reward. The population is
    /// ranked and the champion promoted, but nobody is replaced.
    pub fn train_gradient_descent(&mut self, generations: usize) -> Result<TrainingReport> {
        self.require_population()?;
        let mut report = TrainingReport::new(TrainingMode::GradientDescent);
        let discount = self.config.discount;
        let learning_rate = self.config.learning_rate;

        for generation in 0..generations {
            self.reset_tallies();

            let size = self.population.len();
            let mut tally = MatchTally::default();
            for i in 0..size {
                for _ in 0..self.config.matches_per_generation {
                    let j = pick_opponent(&mut self.rng, size, i);
                    let member_first = self.rng.coin_flip();
                    let mut trajectory = Trajectory::new();
                    let (side, outcome) = play_seated(
                        &self.base,
                        Agent::Evaluator(&self.population[i].evaluator),
                        Agent::Evaluator(&self.population[j].evaluator),
                        member_first,
                        &self.settings,
                        &mut self.rng,
                        Some(&mut trajectory),
                    );
                    tally.count(&outcome);

                    let (member, opponent) = pair_mut(&mut self.population, i, j);
                    member.record(outcome.result_for(side));
                    opponent.record(outcome.result_for(side.opponent()));
                    member.learn(&trajectory, side, discount, learning_rate)?;
                    opponent.learn(&trajectory, side.opponent(), discount, learning_rate)?;
                }
            }

            self.rank();
            let best_win_ratio = self.population[0].win_ratio();
            let new_champion = self.promote_top(generation);
            report.push(self.summary(generation, new_champion, best_win_ratio, tally));
            debug!(generation, "finished gradient-descent generation");
        }

        info!(%report, "training complete");
        Ok(report)
    }

    fn reset_tallies(&mut self) {
        for player in &mut self.population {
            player.reset();
        }
    }

    /// Stable sort by descending win ratio.
    fn rank(&mut self) {
        self.population
            .sort_by(|a, b| b.win_ratio().total_cmp(&a.win_ratio()));
    }

    /// Make the top-ranked member champion. Returns whether it changed.
    fn promote_top(&mut self, generation: usize) -> bool {
        let top = &self.population[0];
        if self.champion == Some(top.id()) {
            return false;
        }
        self.champion = Some(top.id());
        self.champion_improvements += 1;
        info!(
            generation,
            champion = %top.id(),
            win_ratio = top.win_ratio(),
            "new champion"
        );
        true
    }

    /// Keep the better half and refill with mutated children of survivors.
    fn reproduce(&mut self) {
        let target = self.config.population_size;
        let survivors = (target / 2).max(1).min(self.population.len());
        self.population.truncate(survivors);
        self.reset_tallies();

        let rate = self.config.mutation_rate;
        while self.population.len() < target {
            let parent = self.rng.gen_range_usize(0..survivors);
            let child = self.population[parent]
                .evaluator
                .mutate(rate, rate, &self.ids, &mut self.rng);
            self.population.push(Player::new(child));
        }
    }

    fn summary(
        &self,
        generation: usize,
        new_champion: bool,
        best_win_ratio: f32,
        tally: MatchTally,
    ) -> GenerationSummary {
        let summary = GenerationSummary {
            generation,
            champion: self.champion.unwrap_or_else(|| self.population[0].id()),
            new_champion,
            best_win_ratio,
            decided_matches: tally.decided,
            draws: tally.draws,
        };
        debug!(
            generation,
            best_win_ratio,
            decided = tally.decided,
            draws = tally.draws,
            "generation finished"
        );
        summary
    }

    // === Evaluation ===

    /// Play the champion against a random mover.
    ///
    /// The first `games / 2` games have the champion move first, the rest
    /// second.
    pub fn benchmark_champion(&mut self, games: usize) -> Result<BenchmarkReport> {
        let idx = self.require_champion()?;
        let champion = &self.population[idx].evaluator;

        let mut as_first = SeatRecord::default();
        let mut as_second = SeatRecord::default();
        for game in 0..games {
            let champion_first = game < games / 2;
            let (side, outcome) = play_seated(
                &self.base,
                Agent::Evaluator(champion),
                Agent::Random,
                champion_first,
                &self.settings,
                &mut self.rng,
                None,
            );
            let seat = if champion_first { &mut as_first } else { &mut as_second };
            match outcome.result_for(side) {
                MatchResult::Win => seat.wins += 1,
                MatchResult::Draw => seat.draws += 1,
                MatchResult::Loss => seat.losses += 1,
            }
        }

        let report = BenchmarkReport {
            champion: champion.id(),
            as_first,
            as_second,
        };
        info!(
            champion = %report.champion,
            first_win_pct = report.as_first.win_percent(),
            second_win_pct = report.as_second.win_percent(),
            "benchmark complete"
        );
        Ok(report)
    }

    /// Raw output range of `evaluator` over `games` random games.
    pub fn fuzz_evaluation_bounds<E: Evaluator + ?Sized>(&mut self, evaluator: &E, games: usize) -> Option<EvalBounds> {
        let bounds = fuzz_bounds(&self.base, evaluator, games, self.config.max_moves, &mut self.rng);
        match bounds {
            Some(b) => info!(min = b.min, max = b.max, games, "fuzzing complete"),
            None => info!(games, "fuzzing observed no positions"),
        }
        bounds
    }

    /// Fuzz the champion's raw output range and install it as its bounds.
    ///
    /// Bounds are left untouched when nothing was observed.
    pub fn fuzz_champion_bounds(&mut self, games: usize) -> Result<Option<EvalBounds>> {
        let idx = self.require_champion()?;
        let bounds = fuzz_bounds(
            &self.base,
            &self.population[idx].evaluator,
            games,
            self.config.max_moves,
            &mut self.rng,
        );
        if let Some(b) = bounds {
            self.population[idx].evaluator.set_bounds(b);
            info!(champion = %self.population[idx].id(), min = b.min, max = b.max, "clamping range updated");
        }
        Ok(bounds)
    }

    // === Persistence ===

    /// Save the champion into `dir` as `<GameName><Id>.nn`.
    pub fn save_champion(&self, dir: &Path) -> Result<PathBuf> {
        let idx = self.require_champion()?;
        let evaluator = &self.population[idx].evaluator;
        let path = persist::save_in_dir(evaluator, dir, self.base.name()).map_err(|source| TrainerError::Save {
            path: dir.join(persist::file_name(self.base.name(), evaluator.id())),
            source,
        })?;
        info!(path = %path.display(), champion = %evaluator.id(), "saved champion");
        Ok(path)
    }

    /// Seed the whole population from a saved evaluator.
    ///
    /// Member 0 keeps the file's identity and becomes champion; every other
    /// member is an identical copy under a fresh identity. Returns the
    /// loaded identity.
    pub fn load_population(&mut self, path: &Path) -> Result<EvaluatorId> {
        let loaded = persist::load(path)?;
        loaded.ensure_input_size(self.input_size())?;

        let id = loaded.id();
        self.ids.observe(id);

        let mut population = Vec::with_capacity(self.config.population_size);
        for _ in 1..self.config.population_size {
            population.push(Player::new(loaded.clone_with_new_id(&self.ids)));
        }
        population.insert(0, Player::new(loaded));

        self.population = population;
        self.champion = Some(id);
        info!(path = %path.display(), champion = %id, size = self.population.len(), "loaded population");
        Ok(id)
    }

    /// Saved evaluators for this game in `dir`.
    pub fn list_saves(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        persist::list_saves(dir, self.base.name())
    }
}

/// Index of a uniformly random member other than `member`.
fn pick_opponent(rng: &mut GameRng, size: usize, member: usize) -> usize {
    let pick = rng.gen_range_usize(0..size - 1);
    if pick >= member {
        pick + 1
    } else {
        pick
    }
}

/// Two distinct members, mutably.
fn pair_mut(population: &mut [Player], a: usize, b: usize) -> (&mut Player, &mut Player) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = population.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = population.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Play `member` against `opponent`, seating the member first or second.
///
/// Returns the member's side and the outcome.
fn play_seated<G: GameState>(
    base: &G,
    member: Agent<'_, NeuralEvaluator>,
    opponent: Agent<'_, NeuralEvaluator>,
    member_first: bool,
    settings: &MatchSettings,
    rng: &mut GameRng,
    trajectory: Option<&mut Trajectory>,
) -> (Side, MatchOutcome) {
    if member_first {
        (Side::First, play_match(base, member, opponent, settings, rng, trajectory))
    } else {
        (Side::Second, play_match(base, opponent, member, settings, rng, trajectory))
    }
}
