//! Match play: move choosers, full matches, and random-game fuzzing.

use tracing::{trace, warn};

use crate::core::{GameRng, GameState, MoveCode, Side, Winner};
use crate::mcts::{MCTSConfig, MCTSSearch, SearchBudget};
use crate::nn::{EvalBounds, Evaluator};

use super::config::{GreedyOrientation, MatchMode, TrainerConfig};
use super::trajectory::Trajectory;

/// Everything match play needs from the trainer configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchSettings {
    pub mode: MatchMode,
    pub orientation: GreedyOrientation,
    pub max_moves: usize,
    pub mcts: MCTSConfig,
}

impl MatchSettings {
    /// Extract match settings from a trainer configuration.
    pub fn from_config(config: &TrainerConfig) -> Self {
        Self {
            mode: config.match_mode,
            orientation: config.greedy_orientation,
            max_moves: config.max_moves,
            mcts: config.mcts.clone(),
        }
    }
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self::from_config(&TrainerConfig::default())
    }
}

/// Who occupies a seat in a match.
pub enum Agent<'a, E: Evaluator + ?Sized> {
    /// Moves chosen with this evaluator.
    Evaluator(&'a E),
    /// Uniformly random legal moves.
    Random,
}

impl<E: Evaluator + ?Sized> Clone for Agent<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Evaluator + ?Sized> Copy for Agent<'_, E> {}

/// Result of one match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Final status; matches cut off or stuck count as draws.
    pub winner: Winner,
    /// Plies played.
    pub plies: usize,
}

impl MatchOutcome {
    /// The outcome seen from `side`.
    #[must_use]
    pub fn result_for(&self, side: Side) -> MatchResult {
        match self.winner.side() {
            Some(winner) if winner == side => MatchResult::Win,
            Some(_) => MatchResult::Loss,
            None => MatchResult::Draw,
        }
    }
}

/// Win, loss or draw from one side's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

/// One-ply greedy move choice on raw evaluations.
///
/// Every legal successor is scored with `evaluator.evaluate`; the side to
/// move takes the lowest or highest score according to `orientation`, first
/// in move order on ties. If no candidate qualifies (non-finite scores, or
/// every successor rejected) the first legal move is returned with a
/// warning. `None` only when there are no legal moves.
pub fn choose_best_move<G: GameState, E: Evaluator + ?Sized>(
    game: &G,
    evaluator: &E,
    orientation: GreedyOrientation,
) -> Option<MoveCode> {
    let moves = game.valid_moves();
    let first = *moves.first()?;
    let minimize = orientation.minimizes(game.current_player());

    let mut best_score = if minimize { f32::MAX } else { -f32::MAX };
    let mut best_move = None;
    for &mv in &moves {
        let Some(next) = game.with_move(mv) else {
            continue;
        };
        let score = evaluator.evaluate(&next.board_state());
        let better = if minimize { score < best_score } else { score > best_score };
        if better {
            best_score = score;
            best_move = Some(mv);
        }
    }

    if best_move.is_none() {
        warn!(fallback = first, "no best move found; choosing the first legal move");
    }
    Some(best_move.unwrap_or(first))
}

/// Move chosen by a tree search with `visits` root visits.
///
/// Falls back to the first legal move when the search yields nothing.
pub fn search_move<G: GameState, E: Evaluator + ?Sized>(
    game: &G,
    evaluator: &E,
    visits: u32,
    config: &MCTSConfig,
) -> Option<MoveCode> {
    let mut search = MCTSSearch::new(evaluator, config.clone());
    search
        .search(game, SearchBudget::Visits(visits))
        .map(|result| result.best_move)
        .or_else(|| game.valid_moves().first().copied())
}

/// Uniformly random legal move.
pub fn random_move<G: GameState>(game: &G, rng: &mut GameRng) -> Option<MoveCode> {
    rng.choose(&game.valid_moves()).copied()
}

/// Move for `agent` under `settings`.
pub fn choose_move<G: GameState, E: Evaluator + ?Sized>(
    game: &G,
    agent: Agent<'_, E>,
    settings: &MatchSettings,
    rng: &mut GameRng,
) -> Option<MoveCode> {
    match agent {
        Agent::Random => random_move(game, rng),
        Agent::Evaluator(evaluator) => match settings.mode {
            MatchMode::Greedy => choose_best_move(game, evaluator, settings.orientation),
            MatchMode::Mcts { visits } => search_move(game, evaluator, visits, &settings.mcts),
        },
    }
}

/// Play one match from `base`, `first` moving as player 1.
///
/// Stops at a decided state, when no move is available, or after
/// `settings.max_moves` plies; the latter two count as draws. When a
/// trajectory is given, the pre-move encoding of every accepted move is
/// recorded and the outcome is stored.
pub fn play_match<G: GameState, E: Evaluator + ?Sized>(
    base: &G,
    first: Agent<'_, E>,
    second: Agent<'_, E>,
    settings: &MatchSettings,
    rng: &mut GameRng,
    mut trajectory: Option<&mut Trajectory>,
) -> MatchOutcome {
    let mut game = base.clone();
    let mut plies = 0;

    while plies < settings.max_moves && !game.is_terminal() {
        let side = game.current_player();
        let agent = match side {
            Side::First => first,
            Side::Second => second,
        };
        let Some(mv) = choose_move(&game, agent, settings, rng) else {
            break;
        };
        let encoding = trajectory.is_some().then(|| game.board_state());
        if !game.make_move(mv) {
            warn!(mv, %side, "chosen move rejected; ending match as a draw");
            break;
        }
        if let (Some(traj), Some(encoding)) = (trajectory.as_deref_mut(), encoding) {
            traj.record(side, encoding);
        }
        plies += 1;
    }

    let winner = match game.winner() {
        Winner::OnGoing => Winner::Draw,
        decided => decided,
    };
    trace!(?winner, plies, "match finished");

    if let Some(traj) = trajectory {
        traj.set_outcome(winner);
    }
    MatchOutcome { winner, plies }
}

/// Observe raw evaluations over `games` random games.
///
/// The evaluator scores every position reached after each move. Returns
/// `None` if no position was observed.
pub fn fuzz_bounds<G: GameState, E: Evaluator + ?Sized>(
    base: &G,
    evaluator: &E,
    games: usize,
    max_moves: usize,
    rng: &mut GameRng,
) -> Option<EvalBounds> {
    let mut bounds: Option<EvalBounds> = None;

    for _ in 0..games {
        let mut game = base.clone();
        for _ in 0..max_moves {
            if game.is_terminal() {
                break;
            }
            let Some(mv) = random_move(&game, rng) else {
                break;
            };
            if !game.make_move(mv) {
                break;
            }
            let eval = evaluator.evaluate(&game.board_state());
            bounds = Some(match bounds {
                None => EvalBounds::new(eval, eval),
                Some(b) => EvalBounds::new(b.min.min(eval), b.max.max(eval)),
            });
        }
    }

    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::TicTacToe;
    use crate::mcts::Workers;
    use crate::nn::{ConstantEvaluator, SumEvaluator};

    #[test]
    fn test_constant_evaluator_takes_first_move() {
        let game = TicTacToe::new();
        let eval = ConstantEvaluator::uniform(0.3);
        for orientation in [GreedyOrientation::FirstMinimizes, GreedyOrientation::FirstMaximizes] {
            assert_eq!(choose_best_move(&game, &eval, orientation), Some(0));
        }
    }

    #[test]
    fn test_orientation_picks_extremes() {
        let mut game = TicTacToe::new();
        assert!(game.make_move(4));

        struct CellWeight;
        impl Evaluator for CellWeight {
            fn evaluate(&self, encoding: &[f32]) -> f32 {
                encoding[..9].iter().enumerate().map(|(i, v)| v * i as f32).sum()
            }
            fn clamped_evaluation(&self, encoding: &[f32]) -> f32 {
                self.evaluate(encoding).tanh()
            }
        }

        // O stones count -1 * index: lowest value at cell 8, highest at 0
        assert_eq!(choose_best_move(&game, &CellWeight, GreedyOrientation::FirstMinimizes), Some(0));
        assert_eq!(choose_best_move(&game, &CellWeight, GreedyOrientation::FirstMaximizes), Some(8));
    }

    #[test]
    fn test_non_finite_scores_fall_back() {
        let game = TicTacToe::new();
        let eval = ConstantEvaluator::new(f32::NAN, 0.0);
        assert_eq!(choose_best_move(&game, &eval, GreedyOrientation::FirstMinimizes), Some(0));
    }

    #[test]
    fn test_no_moves() {
        let mut game = TicTacToe::new();
        for mv in [0, 3, 1, 4, 2] {
            assert!(game.make_move(mv));
        }
        let mut rng = GameRng::new(1);
        assert_eq!(choose_best_move(&game, &SumEvaluator, GreedyOrientation::default()), None);
        assert_eq!(random_move(&game, &mut rng), None);
    }

    #[test]
    fn test_greedy_constant_match_is_deterministic() {
        let game = TicTacToe::new();
        let plus = ConstantEvaluator::uniform(1.0);
        let minus = ConstantEvaluator::uniform(-1.0);
        let settings = MatchSettings::default();

        let mut rng = GameRng::new(3);
        let a = play_match(&game, Agent::Evaluator(&plus), Agent::Evaluator(&minus), &settings, &mut rng, None);
        let b = play_match(&game, Agent::Evaluator(&plus), Agent::Evaluator(&minus), &settings, &mut rng, None);

        // X takes 0, 2, 4, 6 and completes the anti-diagonal
        assert_eq!(a.winner, Winner::Player1);
        assert_eq!(a.plies, 7);
        assert_eq!(a, b);
        assert_eq!(a.result_for(Side::First), MatchResult::Win);
        assert_eq!(a.result_for(Side::Second), MatchResult::Loss);
    }

    #[test]
    fn test_max_moves_is_draw() {
        let settings = MatchSettings {
            max_moves: 3,
            ..MatchSettings::default()
        };
        let eval = ConstantEvaluator::uniform(0.0);
        let mut rng = GameRng::new(4);
        let outcome = play_match(
            &TicTacToe::new(),
            Agent::Evaluator(&eval),
            Agent::Evaluator(&eval),
            &settings,
            &mut rng,
            None,
        );
        assert_eq!(outcome.winner, Winner::Draw);
        assert_eq!(outcome.plies, 3);
        assert_eq!(outcome.result_for(Side::First), MatchResult::Draw);
    }

    #[test]
    fn test_trajectory_recording() {
        let eval = ConstantEvaluator::uniform(0.0);
        let mut rng = GameRng::new(5);
        let mut traj = Trajectory::new();
        let outcome = play_match(
            &TicTacToe::new(),
            Agent::Evaluator(&eval),
            Agent::Evaluator(&eval),
            &MatchSettings::default(),
            &mut rng,
            Some(&mut traj),
        );

        assert_eq!(traj.len(), outcome.plies);
        assert_eq!(traj.outcome, outcome.winner);
        assert_eq!(traj.steps[0].encoding, TicTacToe::new().board_state());
        assert_eq!(traj.steps[0].side, Side::First);
        assert_eq!(traj.steps[1].side, Side::Second);
    }

    /// Tic-tac-toe that only offers an unplayable move after two plies.
    #[derive(Clone, Debug)]
    struct StallsAfterTwo {
        inner: TicTacToe,
        plies: usize,
    }

    impl GameState for StallsAfterTwo {
        fn name(&self) -> &str {
            "StallsAfterTwo"
        }

        fn valid_moves(&self) -> Vec<MoveCode> {
            if self.plies >= 2 {
                vec![99]
            } else {
                self.inner.valid_moves()
            }
        }

        fn make_move(&mut self, mv: MoveCode) -> bool {
            let accepted = self.inner.make_move(mv);
            self.plies += usize::from(accepted);
            accepted
        }

        fn unmake_move(&mut self) -> bool {
            let undone = self.inner.unmake_move();
            self.plies -= usize::from(undone);
            undone
        }

        fn winner(&self) -> Winner {
            self.inner.winner()
        }

        fn current_player(&self) -> Side {
            self.inner.current_player()
        }

        fn board_state(&self) -> Vec<f32> {
            self.inner.board_state()
        }
    }

    #[test]
    fn test_rejected_move_is_not_recorded() {
        let eval = ConstantEvaluator::uniform(0.0);
        let mut rng = GameRng::new(9);
        let mut traj = Trajectory::new();
        let base = StallsAfterTwo {
            inner: TicTacToe::new(),
            plies: 0,
        };
        let outcome = play_match(
            &base,
            Agent::Evaluator(&eval),
            Agent::Evaluator(&eval),
            &MatchSettings::default(),
            &mut rng,
            Some(&mut traj),
        );

        assert_eq!(outcome.winner, Winner::Draw);
        assert_eq!(outcome.plies, 2);
        assert_eq!(traj.len(), 2);
        assert_eq!(traj.side_steps(Side::First).count(), 1);
        assert_eq!(traj.training_samples(Side::First, 0.9).len(), 1);
    }

    #[test]
    fn test_random_match_terminates() {
        let mut rng = GameRng::new(6);
        for _ in 0..50 {
            let outcome = play_match::<_, dyn Evaluator>(
                &TicTacToe::new(),
                Agent::Random,
                Agent::Random,
                &MatchSettings::default(),
                &mut rng,
                None,
            );
            assert!(outcome.plies >= 5 && outcome.plies <= 9);
            assert!(outcome.winner.is_terminal());
        }
    }

    #[test]
    fn test_mcts_match() {
        let settings = MatchSettings {
            mode: MatchMode::Mcts { visits: 50 },
            mcts: MCTSConfig::default().with_workers(Workers::Fixed(1)),
            ..MatchSettings::default()
        };
        let eval = ConstantEvaluator::uniform(0.0);
        let mut rng = GameRng::new(7);
        let outcome = play_match(
            &TicTacToe::new(),
            Agent::Evaluator(&eval),
            Agent::Random,
            &settings,
            &mut rng,
            None,
        );
        assert!(outcome.winner.is_terminal());
    }

    #[test]
    fn test_fuzz_bounds() {
        let mut rng = GameRng::new(8);
        let bounds = fuzz_bounds(&TicTacToe::new(), &SumEvaluator, 200, 100, &mut rng).unwrap();
        assert!(bounds.min <= bounds.max);
        // Marker alternates 2 (after X) and 1 (after O); material differs by at most 1
        assert!(bounds.min >= 1.0 && bounds.max <= 4.0);

        assert!(fuzz_bounds(&TicTacToe::new(), &SumEvaluator, 0, 100, &mut rng).is_none());
    }
}
