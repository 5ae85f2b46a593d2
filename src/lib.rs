//! Bitboard-based chess position core: board representation, pseudo-legal
//! move generation, make-move with incremental Zobrist hashing, an
//! attack/check oracle and a perft driver serving as the canonical
//! correctness harness.
//!
//! The core never performs I/O, never logs and holds no global mutable
//! state: all precomputed tables are immutable constants baked in at build
//! time, so any number of threads may share positions freely.

#![warn(missing_docs, variant_size_differences)]
// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications
)]
// Clippy lints.
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::pedantic
)]
// Performance is extremely important.
#![deny(clippy::perf)]

pub mod chess;
