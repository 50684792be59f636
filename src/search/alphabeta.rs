use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::board::{MoveInfo, PositionState, MAX_SEARCH_DEPTH, UNDO_CAPACITY};
pub use crate::config::SearchParams;
use crate::movegen::{MoveGenerator, MovePicker, SearchType};
use crate::search::control::Countdown;
use crate::search::eval::{evaluate_cached, terminal_score, MaterialTable, DRAW_SCORE, MATE_SCORE};
use crate::search::tt::{score_from_tt, score_to_tt, Entry, TranspositionTable};

/// Window bound outside every reachable score.
pub const INFINITY: i32 = MATE_SCORE + 1;

#[derive(Default, Debug, Clone)]
pub struct SearchResult {
    pub bestmove: Option<String>,
    pub best: Option<MoveInfo>,
    pub score_cp: i32,
    /// Deepest iteration that finished.
    pub depth: u32,
    pub nodes: u64,
}

/// Root window for one iteration, widened on each failed search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AspirationWindow {
    pub alpha: i32,
    pub beta: i32,
    delta: i32,
    tries: u32,
    max_tries: u32,
}

impl AspirationWindow {
    pub fn full() -> Self { AspirationWindow { alpha: -INFINITY, beta: INFINITY, delta: 0, tries: 0, max_tries: 0 } }

    pub fn around(score: i32, params: &SearchParams) -> Self {
        let w = params.aspiration_window_cp;
        AspirationWindow {
            alpha: score.saturating_sub(w).max(-INFINITY),
            beta: score.saturating_add(w).min(INFINITY),
            delta: params.aspiration_delta_cp,
            tries: 0,
            max_tries: params.aspiration_max_tries,
        }
    }

    pub fn is_full(&self) -> bool { self.alpha == -INFINITY && self.beta == INFINITY }

    // Doubles per try; shifts past the value's width open the bound instead.
    fn step(&self) -> Option<i32> {
        if self.tries >= self.max_tries || self.tries >= 30 { return None; }
        self.delta.checked_mul(1 << self.tries)
    }

    pub fn widen_low(&mut self) {
        self.alpha = self.step().map_or(-INFINITY, |s| self.alpha.saturating_sub(s).max(-INFINITY));
        self.tries = self.tries.saturating_add(1);
    }

    pub fn widen_high(&mut self) {
        self.beta = self.step().map_or(INFINITY, |s| self.beta.saturating_add(s).min(INFINITY));
        self.tries = self.tries.saturating_add(1);
    }
}

pub struct Searcher {
    tt: TranspositionTable,
    materials: MaterialTable,
    movegen: MoveGenerator,
    params: SearchParams,
    abort: Arc<AtomicBool>,
    pub(crate) nodes: u64,
}

impl Default for Searcher {
    fn default() -> Self { Self::new(SearchParams::default()) }
}

fn table_for(params: &SearchParams) -> TranspositionTable {
    TranspositionTable::with_capacity_entries(if params.use_tt { params.tt_entries } else { 0 })
}

impl Searcher {
    pub fn new(params: SearchParams) -> Self {
        let params = params.normalized();
        Self {
            tt: table_for(&params),
            materials: MaterialTable::default(),
            movegen: MoveGenerator::new(),
            params,
            abort: Arc::new(AtomicBool::new(false)),
            nodes: 0,
        }
    }

    pub fn params(&self) -> &SearchParams { &self.params }

    /// Flag polled between root moves and between iterations.
    pub fn abort_flag(&self) -> Arc<AtomicBool> { Arc::clone(&self.abort) }

    pub fn set_abort_flag(&mut self, flag: Arc<AtomicBool>) { self.abort = flag; }

    pub fn tt(&self) -> &TranspositionTable { &self.tt }

    pub fn materials(&self) -> &MaterialTable { &self.materials }

    pub fn clear_tt(&mut self) { self.tt.clear(); }

    pub fn set_tt_capacity_mb(&mut self, mb: usize) {
        self.tt.set_capacity_mb(mb);
        self.params.tt_entries = self.tt.capacity();
    }

    pub fn nodes(&self) -> u64 { self.nodes }

    pub fn tt_probe(&self, pos: &PositionState) -> Option<(u32, i32)> {
        self.tt.lookup(pos.zobrist_key()).map(|e| (e.depth, e.score))
    }

    /// Fresh search: clears the abort flag and arms the countdown when a move time is set.
    pub fn search_with_params(&mut self, pos: &mut PositionState, params: SearchParams) -> SearchResult {
        self.abort.store(false, Ordering::Relaxed);
        self.run(pos, params)
    }

    /// Same as [`Searcher::search_with_params`] but keeps the abort flag as it is, so a
    /// stop raised before the call still ends the search after the first root move.
    pub fn run(&mut self, pos: &mut PositionState, params: SearchParams) -> SearchResult {
        let params = params.normalized();
        if params.use_tt != self.params.use_tt || params.tt_entries != self.params.tt_entries {
            self.tt = table_for(&params);
        }
        self.params = params;
        let countdown = self.params.movetime().map(|d| Countdown::start(d, Arc::clone(&self.abort)));
        let result = self.think(pos, self.params.depth);
        if let Some(c) = countdown { c.cancel(); }
        result
    }

    pub fn search_depth(&mut self, pos: &mut PositionState, depth: u32) -> SearchResult { self.think(pos, depth) }

    pub fn qsearch_eval_cp(&mut self, pos: &mut PositionState) -> i32 {
        let qs_cap = self.params.quiescence_depth.min(UNDO_CAPACITY.saturating_sub(pos.ply()) as u32);
        let mut ctx = SearchContext {
            pos,
            movegen: &self.movegen,
            tt: &mut self.tt,
            materials: &mut self.materials,
            abort: &self.abort,
            qs_cap,
            nodes: 0,
        };
        let score = ctx.qsearch(0, -INFINITY, INFINITY, 0);
        self.nodes = ctx.nodes;
        score
    }

    /// Iterative deepening from depth 1 to `max_depth`.
    ///
    /// The position is searched in place and handed back unchanged. If the
    /// abort flag stops an iteration early, its partial result is only used
    /// when no iteration has completed yet.
    pub fn think(&mut self, pos: &mut PositionState, max_depth: u32) -> SearchResult {
        let start = Instant::now();
        let room = UNDO_CAPACITY.saturating_sub(pos.ply()) as u32;
        let qs_cap = self.params.quiescence_depth.min(room.saturating_sub(1));
        let max_depth = max_depth.min(MAX_SEARCH_DEPTH as u32).min(room.saturating_sub(qs_cap)).max(1);
        let params = self.params.clone();
        let mut ctx = SearchContext {
            pos,
            movegen: &self.movegen,
            tt: &mut self.tt,
            materials: &mut self.materials,
            abort: &self.abort,
            qs_cap,
            nodes: 0,
        };

        let mut root_moves = ctx.movegen.generate(ctx.pos);
        if root_moves.is_empty() {
            let score = terminal_score(ctx.pos.in_check(), 0);
            debug!("no legal moves at root, score {}", score);
            return SearchResult { score_cp: score, ..Default::default() };
        }
        if room == 0 {
            warn!("undo arena full at ply {}, returning the first move unsearched", ctx.pos.ply());
            let best = root_moves[0];
            return SearchResult {
                bestmove: Some(best.to_uci()),
                best: Some(best),
                score_cp: evaluate_cached(ctx.pos, ctx.materials),
                ..Default::default()
            };
        }
        let root_key = ctx.pos.zobrist_key();
        if let Some(hash) = ctx.tt.lookup(root_key).and_then(|e| e.best) { promote(&mut root_moves, &hash); }

        let mut best = root_moves[0];
        let mut best_score = -INFINITY;
        let mut completed = 0;
        for depth in 1..=max_depth {
            if depth > 1 && ctx.aborted() { break; }
            let mut window = if depth > params.aspiration_depth && completed > 0 {
                AspirationWindow::around(best_score, &params)
            } else {
                AspirationWindow::full()
            };
            let outcome = loop {
                let r = ctx.search_root(&root_moves, depth, window.alpha, window.beta);
                // No root move could be made: nothing a wider window would change.
                if r.aborted || r.best.is_none() { break r; }
                if r.score <= window.alpha {
                    trace!("depth {} fail low {} <= {}, widening", depth, r.score, window.alpha);
                    window.widen_low();
                } else if r.score >= window.beta {
                    trace!("depth {} fail high {} >= {}, widening", depth, r.score, window.beta);
                    window.widen_high();
                } else {
                    break r;
                }
            };
            if outcome.aborted {
                if completed == 0 {
                    if let Some(m) = outcome.best {
                        best = m;
                        best_score = outcome.score;
                    }
                }
                debug!("depth {} aborted after {} nodes", depth, ctx.nodes);
                break;
            }
            if let Some(m) = outcome.best {
                best = m;
                best_score = outcome.score;
            }
            completed = depth;
            ctx.tt.insert(Entry { key: root_key, depth, score: best_score, best: Some(best) });
            promote(&mut root_moves, &best);
            info!(
                "depth {} score {} nodes {} time {}ms best {}",
                depth,
                best_score,
                ctx.nodes,
                start.elapsed().as_millis(),
                best
            );
        }
        if best_score == -INFINITY { best_score = evaluate_cached(ctx.pos, ctx.materials); }
        self.nodes = ctx.nodes;
        SearchResult {
            bestmove: Some(best.to_uci()),
            best: Some(best),
            score_cp: best_score,
            depth: completed,
            nodes: self.nodes,
        }
    }
}

// Moves `mv` to the front, keeping the order of the rest.
fn promote(moves: &mut [MoveInfo], mv: &MoveInfo) {
    if let Some(i) = moves.iter().position(|m| m.same_move(mv)) {
        moves[..=i].rotate_right(1);
    }
}

struct RootOutcome {
    best: Option<MoveInfo>,
    score: i32,
    aborted: bool,
}

/// Borrowed state for one search: the single thread running it owns all of it.
struct SearchContext<'a> {
    pos: &'a mut PositionState,
    movegen: &'a MoveGenerator,
    tt: &'a mut TranspositionTable,
    materials: &'a mut MaterialTable,
    abort: &'a AtomicBool,
    qs_cap: u32,
    nodes: u64,
}

impl SearchContext<'_> {
    fn aborted(&self) -> bool { self.abort.load(Ordering::Relaxed) }

    fn unmake(&mut self) {
        let undone = self.pos.undo_move();
        debug_assert!(undone.is_ok(), "undo without a matching make");
    }

    fn search_root(&mut self, moves: &[MoveInfo], depth: u32, mut alpha: i32, beta: i32) -> RootOutcome {
        let mut out = RootOutcome { best: None, score: -INFINITY, aborted: false };
        for (i, &mv) in moves.iter().enumerate() {
            if i > 0 && self.aborted() {
                out.aborted = true;
                break;
            }
            if self.pos.make_move(mv).is_err() { continue; }
            let score = -self.alphabeta(depth - 1, -beta, -alpha, 1);
            self.unmake();
            // Strictly better only: ties keep the earlier move.
            if score > out.score {
                out.score = score;
                out.best = Some(mv);
            }
            if score > alpha { alpha = score; }
            if alpha >= beta { break; }
        }
        out
    }

    fn alphabeta(&mut self, depth: u32, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        if depth == 0 { return self.qsearch(0, alpha, beta, ply); }
        self.nodes += 1;
        if self.pos.halfmove_clock() >= 100 { return DRAW_SCORE; }

        let key = self.pos.zobrist_key();
        let entry = self.tt.lookup(key);
        if let Some(e) = entry {
            if e.depth >= depth { return score_from_tt(e.score, ply); }
        }

        let orig_alpha = alpha;
        let mut picker = MovePicker::new(SearchType::for_position(self.pos), entry.and_then(|e| e.best));
        let mut best_score = -INFINITY;
        let mut best_move = None;
        let mut any = false;
        while let Some(mv) = picker.next(self.movegen, self.pos) {
            if self.pos.make_move(mv).is_err() { continue; }
            any = true;
            let score = -self.alphabeta(depth - 1, -beta, -alpha, ply + 1);
            self.unmake();
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha { alpha = score; }
            if alpha >= beta { break; }
        }
        if !any { return terminal_score(self.pos.in_check(), ply); }

        // Only scores inside the window are exact.
        if orig_alpha < best_score && best_score < beta {
            self.tt.insert(Entry { key, depth, score: score_to_tt(best_score, ply), best: best_move });
        }
        best_score
    }

    // Fail-soft capture search below the nominal horizon.
    fn qsearch(&mut self, qs_depth: u32, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        self.nodes += 1;
        let key = self.pos.zobrist_key();
        let stand = match self.tt.lookup(key) {
            Some(e) => score_from_tt(e.score, ply),
            None => {
                let s = evaluate_cached(self.pos, self.materials);
                self.tt.force_insert(Entry { key, depth: 0, score: s, best: None });
                s
            }
        };
        if stand >= beta || qs_depth >= self.qs_cap { return stand; }
        if stand > alpha { alpha = stand; }

        let mut best = stand;
        let mut picker = MovePicker::new(SearchType::Quiescence, None);
        while let Some(mv) = picker.next(self.movegen, self.pos) {
            if self.pos.make_move(mv).is_err() { continue; }
            let score = -self.qsearch(qs_depth + 1, -beta, -alpha, ply + 1);
            self.unmake();
            if score > best { best = score; }
            if score > alpha { alpha = score; }
            if alpha >= beta { break; }
        }
        best
    }
}
