use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::time::Instant;

use rotachess::board::PositionState;
use rotachess::movegen::MoveGenerator;
use rotachess::perft::{divide, perft};

#[derive(Parser, Debug)]
#[command(name = "perft", about = "Perft driver for rotachess")]
struct Args {
    /// Search depth
    #[arg(value_name = "DEPTH")]
    depth: u32,
    /// FEN string or "startpos"
    #[arg(value_name = "FEN", default_value = "startpos")]
    fen: String,
    /// Number of threads for root-split
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// Report elapsed time and NPS
    #[arg(long, default_value_t = false)]
    nps: bool,
    /// Print the node count under every root move
    #[arg(long, default_value_t = false)]
    divide: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let depth = args.depth;

    let base = if args.fen == "startpos" {
        PositionState::startpos()
    } else {
        PositionState::from_fen(&args.fen).with_context(|| format!("invalid FEN {:?}", args.fen))?
    };

    if args.divide {
        let mut pos = base.clone();
        let rows = divide(&mut pos, depth);
        for (mv, n) in &rows {
            println!("{mv}: {n}");
        }
        println!("moves: {} nodes: {}", rows.len(), rows.iter().map(|(_, n)| n).sum::<u64>());
        return Ok(());
    }

    let pool = rayon::ThreadPoolBuilder::new().num_threads(args.threads.max(1)).build().context("building thread pool")?;
    let (nodes, dt) = pool.install(|| {
        let t0 = Instant::now();
        let nodes = if args.threads <= 1 || depth <= 1 {
            perft(&mut base.clone(), depth)
        } else {
            let root_moves = MoveGenerator::new().generate(&base);
            root_moves
                .par_iter()
                .map(|&mv| {
                    let mut b = base.clone();
                    b.clear_history();
                    match b.make_move(mv) {
                        Ok(_) => perft(&mut b, depth - 1),
                        Err(_) => 0,
                    }
                })
                .sum()
        };
        (nodes, t0.elapsed().as_secs_f64())
    });

    if args.nps { println!("nodes: {nodes} elapsed: {:.3}s nps: {:.1}", dt, nodes as f64 / dt.max(f64::EPSILON)); }
    else { println!("nodes: {nodes}"); }
    Ok(())
}
