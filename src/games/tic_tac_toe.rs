//! Tic-tac-toe.

use crate::core::{GameState, MoveCode, Side, Winner};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Tic-tac-toe position. Move codes are cell indices `0..9`, row-major.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TicTacToe {
    board: [Option<Side>; 9],
    current: Side,
    winner: Winner,
    history: Vec<u8>,
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToe {
    /// Empty board, player 1 (X) to move.
    pub fn new() -> Self {
        Self {
            board: [None; 9],
            current: Side::First,
            winner: Winner::OnGoing,
            history: Vec::with_capacity(9),
        }
    }

    /// Cell contents.
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<Side> {
        self.board[index]
    }

    /// Number of moves played.
    #[must_use]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    fn compute_winner(&self) -> Winner {
        for line in LINES {
            if let Some(side) = self.board[line[0]] {
                if line.iter().all(|&i| self.board[i] == Some(side)) {
                    return side.as_winner();
                }
            }
        }
        if self.board.iter().all(Option::is_some) {
            Winner::Draw
        } else {
            Winner::OnGoing
        }
    }
}

impl GameState for TicTacToe {
    fn name(&self) -> &str {
        "TicTacToe"
    }

    fn valid_moves(&self) -> Vec<MoveCode> {
        if self.winner.is_terminal() {
            return Vec::new();
        }
        (0..9).filter(|&i| self.board[i].is_none()).map(|i| i as MoveCode).collect()
    }

    fn make_move(&mut self, mv: MoveCode) -> bool {
        let cell = mv as usize;
        if cell >= 9 || self.board[cell].is_some() || self.winner.is_terminal() {
            return false;
        }
        self.board[cell] = Some(self.current);
        self.history.push(cell as u8);
        self.current = self.current.opponent();
        self.winner = self.compute_winner();
        true
    }

    fn unmake_move(&mut self) -> bool {
        let Some(cell) = self.history.pop() else {
            return false;
        };
        self.board[cell as usize] = None;
        self.current = self.current.opponent();
        self.winner = Winner::OnGoing;
        true
    }

    fn winner(&self) -> Winner {
        self.winner
    }

    fn current_player(&self) -> Side {
        self.current
    }

    fn board_state(&self) -> Vec<f32> {
        let mut state: Vec<f32> = self
            .board
            .iter()
            .map(|cell| match cell {
                Some(Side::First) => 1.0,
                Some(Side::Second) => -1.0,
                None => 0.0,
            })
            .collect();
        state.push(f32::from(self.current.number()));
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(moves: &[MoveCode]) -> TicTacToe {
        let mut game = TicTacToe::new();
        for &mv in moves {
            assert!(game.make_move(mv), "move {mv} rejected");
        }
        game
    }

    #[test]
    fn test_new_game() {
        let game = TicTacToe::new();
        assert_eq!(game.valid_moves().len(), 9);
        assert_eq!(game.current_player(), Side::First);
        assert_eq!(game.board_state(), [vec![0.0; 9], vec![1.0]].concat());
    }

    #[test]
    fn test_row_win() {
        let game = play(&[0, 3, 1, 4, 2]);
        assert_eq!(game.winner(), Winner::Player1);
        assert!(game.valid_moves().is_empty());
    }

    #[test]
    fn test_diagonal_win_second_player() {
        let game = play(&[0, 2, 1, 4, 8, 6]);
        assert_eq!(game.winner(), Winner::Player2);
    }

    #[test]
    fn test_draw() {
        let game = play(&[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert_eq!(game.winner(), Winner::Draw);
    }

    #[test]
    fn test_rejects_occupied_and_out_of_range() {
        let mut game = play(&[4]);
        let before = game.clone();
        assert!(!game.make_move(4));
        assert!(!game.make_move(9));
        assert_eq!(game, before);
    }

    #[test]
    fn test_unmake() {
        let mut game = play(&[0, 3, 1, 4]);
        let before = game.clone();
        assert!(game.make_move(2));
        assert_eq!(game.winner(), Winner::Player1);
        assert!(game.unmake_move());
        assert_eq!(game, before);

        let mut empty = TicTacToe::new();
        assert!(!empty.unmake_move());
    }
}
