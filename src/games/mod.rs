//! Reference [`Environment`](crate::environment::Environment) implementations.
//! They are small enough to be searched exhaustively and are used for testing
//! and benchmarking the engine.

mod tictactoe;

pub use tictactoe::TicTacToe;
