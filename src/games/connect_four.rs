//! Connect Four on a 6x7 board.

use crate::core::{GameState, MoveCode, Side, Winner};

/// Board rows.
pub const ROWS: usize = 6;
/// Board columns.
pub const COLS: usize = 7;

const IN_A_ROW: usize = 4;
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Connect Four position. Move codes are column indices `0..7`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectFour {
    /// Row-major cells; row 0 is the top.
    board: [Option<Side>; ROWS * COLS],
    current: Side,
    winner: Winner,
    /// Columns played, oldest first.
    history: Vec<u8>,
}

impl Default for ConnectFour {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectFour {
    /// Empty board, player 1 to move.
    pub fn new() -> Self {
        Self {
            board: [None; ROWS * COLS],
            current: Side::First,
            winner: Winner::OnGoing,
            history: Vec::with_capacity(ROWS * COLS),
        }
    }

    /// Cell contents.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<Side> {
        self.board[row * COLS + col]
    }

    /// Number of moves played.
    #[must_use]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    fn column_is_open(&self, col: usize) -> bool {
        self.board[col].is_none()
    }

    fn is_full(&self) -> bool {
        (0..COLS).all(|c| !self.column_is_open(c))
    }

    fn wins_through(&self, row: usize, col: usize, side: Side) -> bool {
        DIRECTIONS.iter().any(|&(dr, dc)| {
            1 + self.run_length(row, col, dr, dc, side) + self.run_length(row, col, -dr, -dc, side) >= IN_A_ROW
        })
    }

    fn run_length(&self, row: usize, col: usize, dr: isize, dc: isize, side: Side) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row as isize + dr, col as isize + dc);
        while (0..ROWS as isize).contains(&r)
            && (0..COLS as isize).contains(&c)
            && self.board[r as usize * COLS + c as usize] == Some(side)
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }
}

impl GameState for ConnectFour {
    fn name(&self) -> &str {
        "ConnectFour"
    }

    fn valid_moves(&self) -> Vec<MoveCode> {
        if self.winner.is_terminal() {
            return Vec::new();
        }
        (0..COLS).filter(|&c| self.column_is_open(c)).map(|c| c as MoveCode).collect()
    }

    fn make_move(&mut self, mv: MoveCode) -> bool {
        let col = mv as usize;
        if col >= COLS || self.winner.is_terminal() {
            return false;
        }
        let Some(row) = (0..ROWS).rev().find(|&r| self.board[r * COLS + col].is_none()) else {
            return false;
        };

        self.board[row * COLS + col] = Some(self.current);
        if self.wins_through(row, col, self.current) {
            self.winner = self.current.as_winner();
        } else if self.is_full() {
            self.winner = Winner::Draw;
        }
        self.current = self.current.opponent();
        self.history.push(col as u8);
        true
    }

    fn unmake_move(&mut self) -> bool {
        let Some(&col) = self.history.last() else {
            return false;
        };
        let col = col as usize;
        let Some(row) = (0..ROWS).find(|&r| self.board[r * COLS + col].is_some()) else {
            return false;
        };

        self.history.pop();
        self.board[row * COLS + col] = None;
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

    /// `+1` for player 1, `-1` for player 2, `0` for empty, then the
    /// current player's number.
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

    fn play(moves: &[MoveCode]) -> ConnectFour {
        let mut game = ConnectFour::new();
        for &mv in moves {
            assert!(game.make_move(mv), "move {mv} rejected");
        }
        game
    }

    #[test]
    fn test_new_game() {
        let game = ConnectFour::new();
        assert_eq!(game.valid_moves(), (0..7).collect::<Vec<_>>());
        assert_eq!(game.current_player(), Side::First);
        assert_eq!(game.winner(), Winner::OnGoing);
        assert_eq!(game.board_state().len(), ROWS * COLS + 1);
        assert_eq!(game.name(), "ConnectFour");
    }

    #[test]
    fn test_gravity() {
        let game = play(&[3, 3]);
        assert_eq!(game.cell(5, 3), Some(Side::First));
        assert_eq!(game.cell(4, 3), Some(Side::Second));
        assert_eq!(game.cell(3, 3), None);
    }

    #[test]
    fn test_vertical_win() {
        let game = play(&[0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(game.winner(), Winner::Player1);
        assert!(game.valid_moves().is_empty());
    }

    #[test]
    fn test_horizontal_win_second_player() {
        let game = play(&[0, 1, 0, 2, 0, 3, 6, 4]);
        assert_eq!(game.winner(), Winner::Player2);
    }

    #[test]
    fn test_diagonal_win() {
        // X climbs the diagonal (5,0) (4,1) (3,2) (2,3)
        let game = play(&[0, 1, 1, 2, 2, 3, 2, 3, 3, 6, 3]);
        assert_eq!(game.winner(), Winner::Player1);
    }

    #[test]
    fn test_full_column_rejected() {
        let mut game = play(&[0, 0, 0, 0, 0, 0]);
        let before = game.clone();
        assert!(!game.make_move(0));
        assert_eq!(game, before);
        assert!(!game.valid_moves().contains(&0));
        assert!(!game.make_move(7));
    }

    #[test]
    fn test_move_after_win_rejected() {
        let mut game = play(&[0, 1, 0, 1, 0, 1, 0]);
        assert!(!game.make_move(2));
    }

    #[test]
    fn test_draw_on_full_board() {
        // Fill columns in pairs so no four line up
        let mut game = ConnectFour::new();
        let order = [0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, 4, 5, 4, 5, 4, 5, 5, 4, 5, 4,
            5, 4, 6, 6, 6, 6, 6, 6];
        for mv in order {
            assert!(game.make_move(mv), "move {mv} rejected at ply {}", game.ply());
            if game.is_terminal() {
                break;
            }
        }
        assert_eq!(game.winner(), Winner::Draw);
        assert_eq!(game.ply(), ROWS * COLS);
    }

    #[test]
    fn test_unmake_restores() {
        let mut game = play(&[3, 2, 4]);
        let before = game.clone();
        assert!(game.make_move(5));
        assert!(game.unmake_move());
        assert_eq!(game, before);

        let mut won = play(&[0, 1, 0, 1, 0, 1]);
        let before = won.clone();
        assert!(won.make_move(0));
        assert_eq!(won.winner(), Winner::Player1);
        assert!(won.unmake_move());
        assert_eq!(won, before);

        let mut empty = ConnectFour::new();
        assert!(!empty.unmake_move());
    }

    #[test]
    fn test_board_state_encoding() {
        let game = play(&[0, 6]);
        let state = game.board_state();
        assert_eq!(state[5 * COLS], 1.0);
        assert_eq!(state[5 * COLS + 6], -1.0);
        assert_eq!(state[0], 0.0);
        assert_eq!(state[ROWS * COLS], 1.0);

        let game = play(&[0]);
        assert_eq!(game.board_state()[ROWS * COLS], 2.0);
    }
}
