//! Implementation of the chess environment, its rules and specifics.

pub mod attacks;
pub mod bitboard;
pub mod core;
pub mod position;
pub mod zobrist;

mod zobrist_keys;
