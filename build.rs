//! Generates the precomputed tables the move generator relies on: leaper and
//! pawn attack tables, magic bitboard tables for the sliding pieces and the
//! Zobrist key tables. Everything is written to `OUT_DIR` and `include!`d by
//! `src/chess/attacks.rs` and `src/chess/zobrist_keys.rs`.
//!
//! This is a one-shot offline step: none of this code runs in the engine
//! itself. The magic multipliers are found by randomized trial with a fixed
//! seed, so builds are reproducible.

use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use std::{env, fs};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BOARD_WIDTH: i32 = 8;
const BOARD_SIZE: i32 = BOARD_WIDTH * BOARD_WIDTH;

const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
    (-2, 1),
    (-1, 2),
    (1, 2),
    (2, 1),
];

// Deterministic seeds: regenerating the tables must not change the produced
// magics or Zobrist keys between builds.
const MAGIC_SEED: u64 = 0x1d87_0ff1_ce0f_f1ce;
const ZOBRIST_SEED: u64 = 0x7ab1_a0b5_c0de_cafe;

fn from_index(index: i32) -> (i32, i32) {
    (index % BOARD_WIDTH, index / BOARD_WIDTH)
}

fn to_square(column: i32, row: i32) -> u64 {
    1u64 << (row * BOARD_WIDTH + column)
}

fn is_within_board(column: i32, row: i32) -> bool {
    (0..BOARD_WIDTH).contains(&column) && (0..BOARD_WIDTH).contains(&row)
}

fn generate_file(filename: &str, contents: &str) {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join(filename);
    fs::write(dest_path, contents).unwrap();
}

fn serialize_bitboard_array(array: &[u64]) -> Result<String, Box<dyn Error>> {
    let mut result = String::new();
    result.push('[');
    for element in array {
        writeln!(result, "Bitboard::from_bits({element}),")?;
    }
    result.push(']');
    Ok(result)
}

fn serialize_array<T: std::fmt::Display>(array: &[T]) -> Result<String, Box<dyn Error>> {
    let mut result = String::new();
    result.push('[');
    for element in array {
        writeln!(result, "{element},")?;
    }
    result.push(']');
    Ok(result)
}

/// Attacks of a leaper (king or knight) against an empty board.
fn leaper_attacks(square: i32, offsets: &[(i32, i32); 8]) -> u64 {
    let (column, row) = from_index(square);
    let mut result = 0u64;
    for (d_column, d_row) in offsets {
        if is_within_board(column + d_column, row + d_row) {
            result |= to_square(column + d_column, row + d_row);
        }
    }
    result
}

fn generate_leaper_tables() -> Result<(), Box<dyn Error>> {
    let king: Vec<u64> = (0..BOARD_SIZE)
        .map(|square| leaper_attacks(square, &KING_OFFSETS))
        .collect();
    let knight: Vec<u64> = (0..BOARD_SIZE)
        .map(|square| leaper_attacks(square, &KNIGHT_OFFSETS))
        .collect();
    generate_file("king_attacks", &serialize_bitboard_array(&king)?);
    generate_file("knight_attacks", &serialize_bitboard_array(&knight)?);
    Ok(())
}

fn generate_pawn_tables() -> Result<(), Box<dyn Error>> {
    // forward = +1 row for white, -1 for black; the double push only exists
    // from the pawn's home rank.
    for (identifier, forward, home_row) in [("white_pawn", 1, 1), ("black_pawn", -1, 6)] {
        let mut attacks = vec![];
        let mut pushes = vec![];
        let mut double_pushes = vec![];
        for square in 0..BOARD_SIZE {
            let (column, row) = from_index(square);
            let mut attack = 0u64;
            for d_column in [-1, 1] {
                if is_within_board(column + d_column, row + forward) {
                    attack |= to_square(column + d_column, row + forward);
                }
            }
            attacks.push(attack);
            pushes.push(if is_within_board(column, row + forward) {
                to_square(column, row + forward)
            } else {
                0
            });
            double_pushes.push(if row == home_row {
                to_square(column, row + 2 * forward)
            } else {
                0
            });
        }
        generate_file(
            &format!("{identifier}_attacks"),
            &serialize_bitboard_array(&attacks)?,
        );
        generate_file(
            &format!("{identifier}_pushes"),
            &serialize_bitboard_array(&pushes)?,
        );
        generate_file(
            &format!("{identifier}_double_pushes"),
            &serialize_bitboard_array(&double_pushes)?,
        );
    }
    Ok(())
}

/// Attacks of a slider from `square` with the given blocker configuration:
/// rays stop at (and include) the first occupied square.
fn sliding_attacks(square: i32, directions: &[(i32, i32); 4], occupancy: u64) -> u64 {
    let (source_column, source_row) = from_index(square);
    let mut result = 0u64;
    for (d_column, d_row) in directions {
        let mut column = source_column + d_column;
        let mut row = source_row + d_row;
        while is_within_board(column, row) {
            let attacked_square = to_square(column, row);
            result |= attacked_square;
            if (occupancy & attacked_square) != 0 {
                break;
            }
            column += d_column;
            row += d_row;
        }
    }
    result
}

/// Relevant occupancy mask for a slider: the rays excluding the board edge
/// (a blocker on the edge can not shorten the attack any further).
fn relevant_occupancy_mask(square: i32, directions: &[(i32, i32); 4]) -> u64 {
    let (source_column, source_row) = from_index(square);
    let mut result = 0u64;
    for (d_column, d_row) in directions {
        let mut column = source_column + d_column;
        let mut row = source_row + d_row;
        while is_within_board(column + d_column, row + d_row) {
            result |= to_square(column, row);
            column += d_column;
            row += d_row;
        }
    }
    result
}

/// Finds a magic multiplier for one square: a constant such that
/// `(occupancy * magic) >> shift` maps every relevant blocker subset to a
/// slot holding its attack set without destructive collisions. Returns the
/// magic and the filled table chunk.
fn find_magic(
    rng: &mut StdRng,
    mask: u64,
    shift: u32,
    occupancies: &[u64],
    attacks: &[u64],
) -> (u64, Vec<u64>) {
    loop {
        // Sparse candidates converge much faster than uniform ones.
        let candidate = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
        if (mask.wrapping_mul(candidate) & 0xFF00_0000_0000_0000).count_ones() < 6 {
            continue;
        }
        let mut table = vec![0u64; occupancies.len()];
        let mut used = vec![false; occupancies.len()];
        let mut collision = false;
        for (occupancy, attack) in occupancies.iter().zip(attacks.iter()) {
            let index = (occupancy.wrapping_mul(candidate) >> shift) as usize;
            if !used[index] {
                used[index] = true;
                table[index] = *attack;
            } else if table[index] != *attack {
                collision = true;
                break;
            }
        }
        if !collision {
            return (candidate, table);
        }
    }
}

/// Generates the full magic bitboard table set for one slider kind and
/// returns the total table size for a correctness check. The sizes should be
/// 5248 for the bishop and 102400 for the rook.
fn generate_magic_tables(
    rng: &mut StdRng,
    identifier: &str,
    directions: &[(i32, i32); 4],
) -> Result<usize, Box<dyn Error>> {
    let mut attack_table = vec![];
    let mut masks = vec![];
    let mut magics = vec![];
    let mut shifts = vec![];
    let mut offsets = vec![];
    for square in 0..BOARD_SIZE {
        let mask = relevant_occupancy_mask(square, directions);
        let relevant_bits = mask.count_ones();
        let shift = 64 - relevant_bits;
        // Enumerate every subset of the mask (Carry-Rippler) together with
        // the attack set it produces.
        let mut occupancies = vec![];
        let mut attacks = vec![];
        let mut subset = 0u64;
        loop {
            occupancies.push(subset);
            attacks.push(sliding_attacks(square, directions, subset));
            subset = subset.wrapping_sub(mask) & mask;
            if subset == 0 {
                break;
            }
        }
        let (magic, table) = find_magic(rng, mask, shift, &occupancies, &attacks);
        offsets.push(attack_table.len());
        attack_table.extend_from_slice(&table);
        masks.push(mask);
        magics.push(magic);
        shifts.push(shift);
    }
    generate_file(
        &format!("{identifier}_attacks"),
        &serialize_bitboard_array(&attack_table)?,
    );
    generate_file(&format!("{identifier}_masks"), &serialize_array(&masks)?);
    generate_file(&format!("{identifier}_magics"), &serialize_array(&magics)?);
    generate_file(&format!("{identifier}_shifts"), &serialize_array(&shifts)?);
    generate_file(&format!("{identifier}_offsets"), &serialize_array(&offsets)?);
    Ok(attack_table.len())
}

fn generate_slider_tables() -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(MAGIC_SEED);
    assert_eq!(
        generate_magic_tables(&mut rng, "bishop", &BISHOP_DIRECTIONS)?,
        5248
    );
    assert_eq!(
        generate_magic_tables(&mut rng, "rook", &ROOK_DIRECTIONS)?,
        102_400
    );
    Ok(())
}

fn generate_zobrist_tables() -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
    for player in ["white", "black"] {
        for kind in ["king", "queen", "rook", "bishop", "knight", "pawn"] {
            let keys: Vec<u64> = (0..BOARD_SIZE).map(|_| rng.gen()).collect();
            generate_file(
                &format!("{player}_{kind}_zobrist_keys"),
                &serialize_array(&keys)?,
            );
        }
    }
    let en_passant_keys: Vec<u64> = (0..BOARD_WIDTH).map(|_| rng.gen()).collect();
    generate_file(
        "en_passant_zobrist_keys",
        &serialize_array(&en_passant_keys)?,
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    generate_leaper_tables()?;
    generate_pawn_tables()?;
    generate_slider_tables()?;
    generate_zobrist_tables()?;
    Ok(())
}
