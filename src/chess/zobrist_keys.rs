//! Random 64-bit constants for [Zobrist hashing]: one per (piece, square)
//! feature plus side-to-move, castling rights and en-passant file terms. The
//! piece and en-passant tables are generated by `build.rs` from a fixed seed;
//! the standalone constants live here.
//!
//! [Zobrist hashing]: https://www.chessprogramming.org/Zobrist_Hashing

use crate::chess::zobrist::Key;

pub(super) const BLACK_TO_MOVE: Key = 0x51e3_7082_c2b9_4f6d;

pub(super) const WHITE_CAN_CASTLE_KINGSIDE: Key = 0xa3d1_96be_07ac_52e9;
pub(super) const WHITE_CAN_CASTLE_QUEENSIDE: Key = 0x1c58_d2f4_6e0b_93a7;
pub(super) const BLACK_CAN_CASTLE_KINGSIDE: Key = 0xe972_4ba8_5d31_c0f5;
pub(super) const BLACK_CAN_CASTLE_QUEENSIDE: Key = 0x7b06_e85f_92d4_1a3c;

pub(super) const EN_PASSANT_FILES: [Key; 8] =
    include!(concat!(env!("OUT_DIR"), "/en_passant_zobrist_keys"));

pub(super) const WHITE_KING: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/white_king_zobrist_keys"));
pub(super) const WHITE_QUEEN: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/white_queen_zobrist_keys"));
pub(super) const WHITE_ROOK: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/white_rook_zobrist_keys"));
pub(super) const WHITE_BISHOP: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/white_bishop_zobrist_keys"));
pub(super) const WHITE_KNIGHT: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/white_knight_zobrist_keys"));
pub(super) const WHITE_PAWN: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/white_pawn_zobrist_keys"));

pub(super) const BLACK_KING: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/black_king_zobrist_keys"));
pub(super) const BLACK_QUEEN: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/black_queen_zobrist_keys"));
pub(super) const BLACK_ROOK: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/black_rook_zobrist_keys"));
pub(super) const BLACK_BISHOP: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/black_bishop_zobrist_keys"));
pub(super) const BLACK_KNIGHT: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/black_knight_zobrist_keys"));
pub(super) const BLACK_PAWN: [Key; 64] =
    include!(concat!(env!("OUT_DIR"), "/black_pawn_zobrist_keys"));
