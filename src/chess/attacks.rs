//! Mappings of occupied squares to the attacked squares for each piece. The
//! mappings are pre-calculated in `build.rs` to provide an efficient way of
//! generating moves.
//!
//! Sliding piece attacks are served by [magic bitboards]: a per-square
//! multiply-shift maps the relevant blocker occupancy to an index into a
//! packed attack table. The multipliers are found offline by randomized
//! search; generation is a one-shot step and none of it runs on the hot path.
//!
//! [magic bitboards]: https://www.chessprogramming.org/Magic_Bitboards

use crate::chess::bitboard::Bitboard;
use crate::chess::core::{Player, Square, BOARD_SIZE};

// Generated in build.rs.
const BISHOP_ATTACKS_COUNT: usize = 5248;
const BISHOP_ATTACKS: [Bitboard; BISHOP_ATTACKS_COUNT] =
    include!(concat!(env!("OUT_DIR"), "/bishop_attacks"));
const BISHOP_MASKS: [u64; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/bishop_masks"));
const BISHOP_MAGICS: [u64; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/bishop_magics"));
const BISHOP_SHIFTS: [u32; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/bishop_shifts"));
const BISHOP_OFFSETS: [usize; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/bishop_offsets"));

const ROOK_ATTACKS_COUNT: usize = 102_400;
const ROOK_ATTACKS: [Bitboard; ROOK_ATTACKS_COUNT] =
    include!(concat!(env!("OUT_DIR"), "/rook_attacks"));
const ROOK_MASKS: [u64; BOARD_SIZE as usize] = include!(concat!(env!("OUT_DIR"), "/rook_masks"));
const ROOK_MAGICS: [u64; BOARD_SIZE as usize] = include!(concat!(env!("OUT_DIR"), "/rook_magics"));
const ROOK_SHIFTS: [u32; BOARD_SIZE as usize] = include!(concat!(env!("OUT_DIR"), "/rook_shifts"));
const ROOK_OFFSETS: [usize; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/rook_offsets"));

const KING_ATTACKS: [Bitboard; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/king_attacks"));
const KNIGHT_ATTACKS: [Bitboard; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/knight_attacks"));
const WHITE_PAWN_ATTACKS: [Bitboard; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/white_pawn_attacks"));
const BLACK_PAWN_ATTACKS: [Bitboard; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/black_pawn_attacks"));
const WHITE_PAWN_PUSHES: [Bitboard; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/white_pawn_pushes"));
const BLACK_PAWN_PUSHES: [Bitboard; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/black_pawn_pushes"));
const WHITE_PAWN_DOUBLE_PUSHES: [Bitboard; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/white_pawn_double_pushes"));
const BLACK_PAWN_DOUBLE_PUSHES: [Bitboard; BOARD_SIZE as usize] =
    include!(concat!(env!("OUT_DIR"), "/black_pawn_double_pushes"));

// Squares that have to be empty for castling: f1|g1 and b1|c1|d1 for white,
// mirrored for black.
pub(super) const WHITE_SHORT_CASTLE_PATH: Bitboard = Bitboard::from_bits(0x0000_0000_0000_0060);
pub(super) const WHITE_LONG_CASTLE_PATH: Bitboard = Bitboard::from_bits(0x0000_0000_0000_000E);
pub(super) const BLACK_SHORT_CASTLE_PATH: Bitboard = Bitboard::from_bits(0x6000_0000_0000_0000);
pub(super) const BLACK_LONG_CASTLE_PATH: Bitboard = Bitboard::from_bits(0x0E00_0000_0000_0000);

pub(super) fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square as usize]
}

pub(super) fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square as usize]
}

pub(super) fn pawn_attacks(player: Player, square: Square) -> Bitboard {
    match player {
        Player::White => WHITE_PAWN_ATTACKS[square as usize],
        Player::Black => BLACK_PAWN_ATTACKS[square as usize],
    }
}

pub(super) fn pawn_pushes(player: Player, square: Square) -> Bitboard {
    match player {
        Player::White => WHITE_PAWN_PUSHES[square as usize],
        Player::Black => BLACK_PAWN_PUSHES[square as usize],
    }
}

/// The double advance from the pawn's home rank; empty everywhere else. The
/// generator only considers it when the single push is unobstructed.
pub(super) fn pawn_double_pushes(player: Player, square: Square) -> Bitboard {
    match player {
        Player::White => WHITE_PAWN_DOUBLE_PUSHES[square as usize],
        Player::Black => BLACK_PAWN_DOUBLE_PUSHES[square as usize],
    }
}

pub(super) fn bishop_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    let square = square as usize;
    let index = (occupancy.bits() & BISHOP_MASKS[square]).wrapping_mul(BISHOP_MAGICS[square])
        >> BISHOP_SHIFTS[square];
    BISHOP_ATTACKS[BISHOP_OFFSETS[square] + index as usize]
}

pub(super) fn rook_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    let square = square as usize;
    let index = (occupancy.bits() & ROOK_MASKS[square]).wrapping_mul(ROOK_MAGICS[square])
        >> ROOK_SHIFTS[square];
    ROOK_ATTACKS[ROOK_OFFSETS[square] + index as usize]
}

pub(super) fn queen_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    bishop_attacks(square, occupancy) | rook_attacks(square, occupancy)
}
