//! Perft command-line harness: enumerates the legal move tree of a position
//! to a fixed depth and reports node counts and throughput.

use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tabia::chess::position::{perft, Position};

/// Counts the leaf nodes of the legal move tree of a position.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Search depth in plies.
    depth: u8,
    /// Position to search, FEN or EPD body. Defaults to the starting
    /// position.
    #[arg(long)]
    fen: Option<String>,
    /// Print per-root-move subtree counts ("divide" format).
    #[arg(long)]
    divide: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let position = match &args.fen {
        Some(fen) => Position::try_from(fen.as_str()).context("can not parse the position")?,
        None => Position::starting(),
    };
    let start = Instant::now();
    let nodes = if args.divide && args.depth > 0 {
        let mut total = 0;
        for m in position.generate_moves() {
            let subtree = perft(&position.make_move(m), args.depth - 1);
            println!("{m}: {subtree}");
            total += subtree;
        }
        total
    } else {
        perft(&position, args.depth)
    };
    let elapsed = start.elapsed();
    println!("Nodes: {nodes}");
    println!(
        "Time: {:.3}s ({:.0} knps)",
        elapsed.as_secs_f64(),
        nodes as f64 / elapsed.as_secs_f64() / 1000.0
    );
    Ok(())
}
