//! MCTS integration tests using the reference games.

use rust_selfplay::core::{GameState, MoveCode, Side, Winner};
use rust_selfplay::games::{ConnectFour, TicTacToe};
use rust_selfplay::mcts::{MCTSConfig, MCTSSearch, MCTSTree, NodeId, SearchBudget, Workers};
use rust_selfplay::core::GameRng;
use rust_selfplay::nn::{ConstantEvaluator, IdAllocator, NeuralEvaluator, SumEvaluator};

fn config(workers: usize) -> MCTSConfig {
    MCTSConfig::default()
        .with_workers(Workers::Fixed(workers))
        .with_serial_threshold(0)
}

/// Position reached from `root` by following `id`'s parent chain.
fn replay<G: GameState>(tree: &MCTSTree, root: &G, id: NodeId) -> G {
    let mut moves = Vec::new();
    let mut current = id;
    while let Some(mv) = tree.move_of(current) {
        moves.push(mv);
        current = tree.parent(current);
    }

    let mut state = root.clone();
    for mv in moves.into_iter().rev() {
        assert!(state.make_move(mv));
    }
    state
}

/// Every expanded node has exactly one child per legal move, in move order.
fn assert_expanded_once<G: GameState>(tree: &MCTSTree, root: &G) {
    for i in 0..tree.len() {
        let id = NodeId::new(i as u32);
        let children = tree.children(id);
        if children.is_empty() {
            continue;
        }
        let state = replay(tree, root, id);
        let moves: Vec<MoveCode> = children.iter().map(|&c| tree.move_of(c).unwrap()).collect();
        assert_eq!(moves, state.valid_moves(), "node {id} expanded inconsistently");
        for &child in &children {
            assert_eq!(tree.parent(child), id);
        }
    }
}

// =============================================================================
// Accounting Tests
// =============================================================================

#[test]
fn test_multi_worker_expands_each_node_once() {
    let game = TicTacToe::new();
    for workers in [2, 4, 8] {
        let mut search = MCTSSearch::new(SumEvaluator, config(workers));
        let tree = search.run(&game, SearchBudget::Visits(3000));

        assert!(tree.root_visits() >= 3000);
        assert!(tree.root_visits() < 3000 + workers as u32);
        assert_eq!(tree.verify_visit_accounting(), Ok(()));
        assert_expanded_once(&tree, &game);

        let stats = search.stats();
        assert_eq!(stats.workers, workers);
        assert_eq!(stats.simulations, tree.root_visits() - 1);
    }
}

#[test]
fn test_connect_four_parallel_accounting() {
    let game = ConnectFour::new();
    let mut search = MCTSSearch::new(SumEvaluator, config(4));
    let tree = search.run(&game, SearchBudget::Visits(5000));

    assert_eq!(tree.verify_visit_accounting(), Ok(()));
    assert_expanded_once(&tree, &game);
    assert_eq!(tree.children(tree.root()).len(), 7);

    let stats = tree.stats();
    assert!(stats.max_depth > 2);
    assert!(stats.branching_factor() <= 7.0);
}

#[test]
fn test_time_budget_parallel() {
    let game = ConnectFour::new();
    let mut search = MCTSSearch::new(SumEvaluator, config(2));
    let tree = search.run(&game, SearchBudget::Time(std::time::Duration::from_millis(50)));

    assert!(tree.root_visits() > 1);
    assert_eq!(tree.verify_visit_accounting(), Ok(()));
}

// =============================================================================
// Move Choice Tests
// =============================================================================

#[test]
fn test_connect_four_blocks_vertical_threat() {
    // O has three in column 3; X must block
    let mut game = ConnectFour::new();
    for mv in [0, 3, 1, 3, 6, 3] {
        assert!(game.make_move(mv));
    }
    assert_eq!(game.current_player(), Side::First);

    let mut search = MCTSSearch::new(ConstantEvaluator::uniform(0.0), config(4));
    let result = search.search(&game, SearchBudget::Visits(10_000)).unwrap();
    assert_eq!(result.best_move, 3);
}

#[test]
fn test_connect_four_takes_win() {
    // X has three on the bottom row (0, 1, 2)
    let mut game = ConnectFour::new();
    for mv in [0, 0, 1, 1, 2, 2] {
        assert!(game.make_move(mv));
    }

    let mut search = MCTSSearch::new(ConstantEvaluator::uniform(0.0), config(1));
    let result = search.search(&game, SearchBudget::Visits(5_000)).unwrap();
    assert_eq!(result.best_move, 3);
    assert!(result.evaluation > 0.0);
}

#[test]
fn test_decided_position_has_no_result() {
    let mut game = TicTacToe::new();
    for mv in [0, 3, 1, 4, 2] {
        assert!(game.make_move(mv));
    }
    assert_eq!(game.winner(), Winner::Player1);

    let mut search = MCTSSearch::new(SumEvaluator, config(4));
    assert!(search.search(&game, SearchBudget::Visits(1000)).is_none());
    assert_eq!(search.stats().workers, 0);
}

#[test]
fn test_mismatched_evaluator_scores_neutral() {
    // Sized for tic-tac-toe, searched on Connect Four
    let ids = IdAllocator::new();
    let mut rng = GameRng::new(3);
    let evaluator = NeuralEvaluator::new(10, &[4], &ids, &mut rng);
    let game = ConnectFour::new();

    let mut search = MCTSSearch::new(&evaluator, config(1));
    let result = search.search(&game, SearchBudget::Visits(20)).unwrap();

    assert_eq!(result.root_visits, 21);
    assert_eq!(result.evaluation, 0.0);
    assert!(result.children.iter().all(|c| c.mean == 0.0));
}

// =============================================================================
// Rejected Moves
// =============================================================================

/// Tic-tac-toe that advertises an extra move it never accepts.
#[derive(Clone, Debug, PartialEq)]
struct PhantomMove(TicTacToe);

const PHANTOM: MoveCode = 42;

impl GameState for PhantomMove {
    fn name(&self) -> &str {
        "PhantomMove"
    }

    fn valid_moves(&self) -> Vec<MoveCode> {
        let mut moves = self.0.valid_moves();
        if !moves.is_empty() {
            moves.push(PHANTOM);
        }
        moves
    }

    fn make_move(&mut self, mv: MoveCode) -> bool {
        self.0.make_move(mv)
    }

    fn unmake_move(&mut self) -> bool {
        self.0.unmake_move()
    }

    fn winner(&self) -> Winner {
        self.0.winner()
    }

    fn current_player(&self) -> Side {
        self.0.current_player()
    }

    fn board_state(&self) -> Vec<f32> {
        self.0.board_state()
    }
}

#[test]
fn test_rejected_moves_leave_state_and_stats_intact() {
    let game = PhantomMove(TicTacToe::new());
    let before = game.clone();

    let mut search = MCTSSearch::new(SumEvaluator, config(1));
    let tree = search.run(&game, SearchBudget::Visits(500));

    // Nine real moves are tried first, then the phantom child is retried until
    // the worker gives up
    assert_eq!(game, before);
    assert_eq!(tree.root_visits(), 10);
    assert_eq!(search.stats().simulations, 9);
    assert!(search.stats().rejected_moves > 0);
    assert_eq!(tree.verify_visit_accounting(), Ok(()));

    let phantom = tree
        .children(tree.root())
        .into_iter()
        .find(|&c| tree.move_of(c) == Some(PHANTOM))
        .unwrap();
    assert_eq!(tree.node_stats(phantom).visits, 0);
}

#[test]
fn test_rejected_moves_parallel_workers_stop() {
    let game = PhantomMove(TicTacToe::new());
    let mut search = MCTSSearch::new(SumEvaluator, config(4));
    let tree = search.run(&game, SearchBudget::Visits(500));

    assert!(tree.root_visits() < 500);
    assert_eq!(tree.verify_visit_accounting(), Ok(()));
    assert_eq!(search.stats().workers, 4);
}
