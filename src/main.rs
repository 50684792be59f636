use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use rotachess::board::{Color, PositionState};
use rotachess::config::EngineConfig;
use rotachess::movegen::MoveGenerator;
use rotachess::search::eval::{evaluate_white, EvalBreakdown};
use rotachess::search::Searcher;
use rotachess::uci::UciEngine;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Text protocol on stdin/stdout
    Uci,
    /// Search one position and print the result
    Analyze,
    /// Play against the engine on the console
    Play,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Rotated-bitboard chess engine", long_about = None)]
struct Args {
    #[arg(long, value_enum, default_value_t = Mode::Uci)]
    mode: Mode,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum search depth
    #[arg(long)]
    depth: Option<u32>,

    /// Time per move in milliseconds
    #[arg(long)]
    movetime: Option<u64>,

    /// Transposition table size in megabytes
    #[arg(long)]
    hash: Option<usize>,

    /// Starting FEN position
    #[arg(long)]
    fen: Option<String>,

    /// Your color in play mode: 'w' or 'b'
    #[arg(long, default_value = "w")]
    color: String,

    /// Print the evaluation breakdown in analyze mode
    #[arg(long)]
    verbose: bool,
}

fn parse_color(color_str: &str) -> Result<Color> {
    match color_str.to_lowercase().as_str() {
        "w" | "white" => Ok(Color::White),
        "b" | "black" => Ok(Color::Black),
        _ => anyhow::bail!("Invalid color: use 'w' or 'b'"),
    }
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut cfg = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(d) = args.depth { cfg.search.depth = d; }
    if let Some(ms) = args.movetime { cfg.search.movetime_ms = Some(ms); }
    if let Some(mb) = args.hash { cfg.hash_mb = Some(mb); }
    Ok(cfg)
}

fn start_position(args: &Args) -> Result<PositionState> {
    match &args.fen {
        Some(fen) => PositionState::from_fen(fen).with_context(|| format!("Invalid FEN string: {:?}", fen)),
        None => Ok(PositionState::startpos()),
    }
}

fn analyze(args: &Args, cfg: &EngineConfig) -> Result<()> {
    let mut pos = start_position(args)?;
    let mut searcher = Searcher::new(cfg.resolved_params());
    let t0 = Instant::now();
    let res = searcher.search_with_params(&mut pos, cfg.resolved_params());
    let elapsed = t0.elapsed().as_secs_f64();
    println!(
        "bestmove {} score {} depth {} nodes {} nps {:.0}",
        res.bestmove.as_deref().unwrap_or("0000"),
        res.score_cp,
        res.depth,
        res.nodes,
        res.nodes as f64 / elapsed.max(f64::EPSILON)
    );
    if args.verbose {
        let mut b = EvalBreakdown::default();
        evaluate_white(&pos, Some(&mut b));
        println!("{:?}", b);
    }
    Ok(())
}

fn play(args: &Args, cfg: &EngineConfig) -> Result<()> {
    let human = parse_color(&args.color)?;
    let mut pos = start_position(args)?;
    let mut searcher = Searcher::new(cfg.resolved_params());
    let gen = MoveGenerator::new();
    loop {
        println!("\n{}", pos);
        if !gen.has_legal_move(&pos) {
            if pos.in_check() { println!("Checkmate!"); } else { println!("Stalemate!"); }
            break;
        }
        if pos.halfmove_clock() >= 100 {
            println!("Draw by the fifty-move rule!");
            break;
        }
        if pos.side_to_move() == human {
            print!("Enter your move (e.g., e2e4): ");
            io::stdout().flush()?;
            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 { break; }
            match pos.apply_uci(input.trim()) {
                Ok(_) => pos.clear_history(),
                Err(e) => println!("{}", e),
            }
        } else {
            let res = searcher.search_with_params(&mut pos, cfg.resolved_params());
            let Some(mv) = res.best else { break };
            println!("Computer plays: {} (score {}, depth {})", mv, res.score_cp, res.depth);
            pos.make_move(mv)?;
            pos.clear_history();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let cfg = load_config(&args)?;
    match args.mode {
        Mode::Uci => UciEngine::new(cfg.resolved_params()).run_loop(),
        Mode::Analyze => analyze(&args, &cfg)?,
        Mode::Play => play(&args, &cfg)?,
    }
    Ok(())
}
