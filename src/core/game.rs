//! The abstract game contract consumed by search and training.
//!
//! The core never interprets game-specific concepts. A game is seen only
//! through [`GameState`]: a mutable, clonable state machine that applies and
//! reverts moves and encodes itself as a fixed-length vector of floats.

use serde::{Deserialize, Serialize};

/// Opaque move identifier.
///
/// Meaningful only to the game implementation; the core only feeds codes
/// returned by [`GameState::valid_moves`] back into [`GameState::make_move`].
pub type MoveCode = u32;

/// One of the two sides of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Player 1, moves first.
    First,
    /// Player 2.
    Second,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Player number as used by board encodings (1 or 2).
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Side::First => 1,
            Side::Second => 2,
        }
    }

    /// Winner value for a game won by this side.
    #[must_use]
    pub const fn as_winner(self) -> Winner {
        match self {
            Side::First => Winner::Player1,
            Side::Second => Winner::Player2,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Outcome status of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    /// The game continues.
    OnGoing,
    /// Finished without a winner.
    Draw,
    /// Player 1 won.
    Player1,
    /// Player 2 won.
    Player2,
}

impl Winner {
    /// Whether the game has been decided (won or drawn).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Winner::OnGoing)
    }

    /// The winning side, if any.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Winner::Player1 => Some(Side::First),
            Winner::Player2 => Some(Side::Second),
            Winner::OnGoing | Winner::Draw => None,
        }
    }

    /// Terminal score from player 1's perspective: +1 / -1 / 0.
    ///
    /// Returns `None` while the game is still going.
    #[must_use]
    pub const fn score(self) -> Option<f32> {
        match self {
            Winner::Player1 => Some(1.0),
            Winner::Player2 => Some(-1.0),
            Winner::Draw => Some(0.0),
            Winner::OnGoing => None,
        }
    }
}

/// Game state contract.
///
/// ## Implementation Notes
///
/// - `make_move` must not mutate the state when it returns `false`
/// - `unmake_move` reverts exactly one prior successful `make_move`; pairing
///   every move with its undo must restore an identical state, since search
///   relies on it to rewind worker-local states
/// - `valid_moves` is empty once the game is decided
/// - `board_state` always has the same length for a given game, ending with
///   a current-player marker
pub trait GameState: Clone + Send {
    /// Name of the game, used for save file naming.
    fn name(&self) -> &str;

    /// Legal move codes in the current position.
    fn valid_moves(&self) -> Vec<MoveCode>;

    /// Apply a move. Returns `false` (without mutating) if it is rejected.
    fn make_move(&mut self, mv: MoveCode) -> bool;

    /// Revert the last applied move. Returns `false` if there is no history.
    fn unmake_move(&mut self) -> bool;

    /// Current outcome status.
    fn winner(&self) -> Winner;

    /// Side to move.
    fn current_player(&self) -> Side;

    /// Fixed-length encoding used verbatim as evaluator input.
    fn board_state(&self) -> Vec<f32>;

    // === Convenience Methods ===

    /// Whether the game has been decided.
    fn is_terminal(&self) -> bool {
        self.winner().is_terminal()
    }

    /// Clone the state and apply `mv` to the copy.
    ///
    /// Returns `None` if the move is rejected.
    fn with_move(&self, mv: MoveCode) -> Option<Self> {
        let mut next = self.clone();
        next.make_move(mv).then_some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent_and_number() {
        assert_eq!(Side::First.opponent(), Side::Second);
        assert_eq!(Side::Second.opponent(), Side::First);
        assert_eq!(Side::First.number(), 1);
        assert_eq!(Side::Second.number(), 2);
        assert_eq!(format!("{}", Side::Second), "Player 2");
    }

    #[test]
    fn test_winner_score() {
        assert_eq!(Winner::Player1.score(), Some(1.0));
        assert_eq!(Winner::Player2.score(), Some(-1.0));
        assert_eq!(Winner::Draw.score(), Some(0.0));
        assert_eq!(Winner::OnGoing.score(), None);
    }

    #[test]
    fn test_winner_side() {
        assert_eq!(Winner::Player1.side(), Some(Side::First));
        assert_eq!(Side::Second.as_winner(), Winner::Player2);
        assert_eq!(Winner::Draw.side(), None);
        assert!(!Winner::OnGoing.is_terminal());
        assert!(Winner::Draw.is_terminal());
    }
}
