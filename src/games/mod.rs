//! Reference games implementing [`GameState`](crate::core::GameState).
//!
//! Small, fully deterministic games used by tests, docs and the CLI:
//!
//! - [`TicTacToe`]: 3x3, nine cells plus a current-player marker
//! - [`ConnectFour`]: 6x7 with gravity, 42 cells plus a current-player marker
//!
//! Both encode player 1 stones as `+1`, player 2 stones as `-1` and empty
//! cells as `0`.

pub mod connect_four;
pub mod tic_tac_toe;

pub use connect_four::ConnectFour;
pub use tic_tac_toe::TicTacToe;
