use std::io::{self, BufRead};
use std::time::Duration;

use log::warn;

use crate::board::{format_move, Color, PositionState, MAX_SEARCH_DEPTH};
use crate::config::SearchParams;
use crate::error::MoveError;
use crate::search::control::{EngineThread, SearchJob};
use crate::search::eval::{evaluate_white, EvalBreakdown};
use crate::search::tt::TranspositionTable;

/// What a `go` command asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoLimits {
    pub depth: Option<u32>,
    pub movetime: Option<Duration>,
    pub infinite: bool,
}

/// Parses the arguments of `go` for the side to move.
pub fn parse_go(args: &str, side: Color) -> GoLimits {
    let mut limits = GoLimits::default();
    let (mut time_left, mut inc, mut moves_to_go) = (None, 0u64, 30u64);
    let mut tokens = args.split_whitespace();
    while let Some(tok) = tokens.next() {
        let mut value = || tokens.next().and_then(|s| s.parse::<u64>().ok());
        match (tok, side) {
            ("depth", _) => limits.depth = value().map(|d| d as u32),
            ("movetime", _) => limits.movetime = value().map(Duration::from_millis),
            ("infinite", _) => limits.infinite = true,
            ("wtime", Color::White) | ("btime", Color::Black) => time_left = value(),
            ("winc", Color::White) | ("binc", Color::Black) => inc = value().unwrap_or(0),
            ("movestogo", _) => moves_to_go = value().unwrap_or(30).max(1),
            ("wtime", _) | ("btime", _) | ("winc", _) | ("binc", _) => {
                value();
            }
            _ => {}
        }
    }
    if limits.movetime.is_none() {
        if let Some(left) = time_left {
            let budget = (left / moves_to_go + inc / 2).min(left.saturating_sub(50)).max(10);
            limits.movetime = Some(Duration::from_millis(budget));
        }
    }
    limits
}

/// Applies `position startpos|fen ... [moves ...]`.
pub fn parse_position(args: &str) -> Result<PositionState, anyhow::Error> {
    let mut tokens = args.split_whitespace().peekable();
    let mut pos = match tokens.next() {
        Some("startpos") => PositionState::startpos(),
        Some("fen") => {
            let mut fields = Vec::with_capacity(6);
            while let Some(&t) = tokens.peek() {
                if t == "moves" { break; }
                fields.push(t);
                tokens.next();
            }
            PositionState::from_fen(&fields.join(" "))?
        }
        other => anyhow::bail!("expected startpos or fen, found {:?}", other),
    };
    if let Some("moves") = tokens.next() {
        for text in tokens {
            pos.apply_uci(text)?;
            // Game moves are permanent; the undo arena is for search plies.
            pos.clear_history();
        }
    }
    Ok(pos)
}

pub struct UciEngine {
    pos: PositionState,
    params: SearchParams,
    engine: EngineThread,
}

impl UciEngine {
    pub fn new(params: SearchParams) -> Self {
        let engine = EngineThread::spawn(params.clone(), |res| {
            println!("info depth {} score cp {} nodes {}", res.depth, res.score_cp, res.nodes);
            println!("bestmove {}", format_move(res.best.as_ref()));
        });
        Self { pos: PositionState::startpos(), params, engine }
    }

    pub fn position(&self) -> &PositionState { &self.pos }

    fn cmd_uci(&self) {
        println!("id name Rotachess");
        println!("id author Rotachess Team");
        println!("option name Hash type spin default 64 min 1 max 16384");
        println!("uciok");
    }

    fn cmd_isready(&self) { println!("readyok"); }

    fn cmd_ucinewgame(&mut self) {
        self.pos = PositionState::startpos();
        self.engine.clear_hash();
    }

    fn cmd_setoption(&mut self, args: &str) {
        let mut tokens = args.split_whitespace();
        let (Some("name"), Some(name), Some("value"), Some(value)) = (tokens.next(), tokens.next(), tokens.next(), tokens.next()) else {
            warn!("unsupported setoption {:?}", args);
            return;
        };
        match (name.to_ascii_lowercase().as_str(), value.parse::<usize>()) {
            ("hash", Ok(mb)) => self.params.tt_entries = TranspositionTable::entries_for_mb(mb.max(1)),
            _ => warn!("unknown option {} = {}", name, value),
        }
    }

    fn cmd_position(&mut self, args: &str) {
        match parse_position(args) {
            Ok(pos) => self.pos = pos,
            Err(e) => warn!("position rejected: {:#}", e),
        }
    }

    fn cmd_go(&mut self, args: &str) {
        let limits = parse_go(args, self.pos.side_to_move());
        let mut params = self.params.clone();
        params.depth = match (limits.depth, limits.infinite || limits.movetime.is_some()) {
            (Some(d), _) => d,
            (None, true) => MAX_SEARCH_DEPTH as u32,
            (None, false) => self.params.depth,
        };
        params.movetime_ms = if limits.infinite { None } else { limits.movetime.map(|d| d.as_millis() as u64) };
        self.engine.start(SearchJob { pos: self.pos.clone(), params });
    }

    fn cmd_eval(&self) {
        let mut b = EvalBreakdown::default();
        let score = evaluate_white(&self.pos, Some(&mut b));
        println!(
            "info string material {} pst {} (mg {} eg {} phase {}) mobility {} total {}",
            b.material, b.pst, b.pst_mg, b.pst_eg, b.phase, b.mobility, score
        );
    }

    fn cmd_move(&mut self, text: &str) -> Result<(), MoveError> {
        self.pos.apply_uci(text)?;
        self.pos.clear_history();
        Ok(())
    }

    /// Handles one input line; returns false on `quit`.
    pub fn handle_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        match cmd {
            "" => {}
            "uci" => self.cmd_uci(),
            "isready" => self.cmd_isready(),
            "ucinewgame" => self.cmd_ucinewgame(),
            "setoption" => self.cmd_setoption(rest),
            "position" => self.cmd_position(rest),
            "go" => self.cmd_go(rest),
            "stop" => self.engine.stop(),
            "eval" => self.cmd_eval(),
            "d" => println!("{}", self.pos),
            "move" => {
                if let Err(e) = self.cmd_move(rest.trim()) { warn!("{}", e); }
            }
            "quit" => return false,
            other => warn!("unknown command {:?}", other),
        }
        true
    }

    pub fn run_loop(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if !self.handle_line(&line) { break; }
        }
        self.engine.stop();
    }
}
