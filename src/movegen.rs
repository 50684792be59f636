//! Legal move generation and staged move picking.
//!
//! Candidates come from the attack tables (leapers) and the per-direction ray
//! lists (sliders); every candidate is kept only if the position accepts it as
//! legal, so everything handed out here can be played directly.

use crate::board::position::CASTLES;
use crate::board::{squares, tables, AttackTables, Bitboard, Color, Direction, MoveInfo, MoveKind, PieceKind, PositionState, Square};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchType {
    Usual,
    /// The side to move is in check.
    Evasion,
    /// Captures and promotions only.
    Quiescence,
}

impl SearchType {
    pub fn for_position(pos: &PositionState) -> Self {
        if pos.in_check() { SearchType::Evasion } else { SearchType::Usual }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    HashMove,
    Captures,
    Quiets,
    Exhausted,
}

// Most valuable victim first, cheaper attacker breaking ties.
fn capture_value(victim: PieceKind, attacker: PieceKind) -> i32 { victim.value() * 10 - attacker.index() as i32 }

pub struct MoveGenerator {
    tables: &'static AttackTables,
}

impl Default for MoveGenerator {
    fn default() -> Self { Self::new() }
}

impl MoveGenerator {
    pub fn new() -> Self { MoveGenerator { tables: tables() } }

    /// All legal moves, captures and promotions first.
    pub fn generate(&self, pos: &PositionState) -> Vec<MoveInfo> {
        let targets = pos.check_info().evasion_targets();
        let mut moves = Vec::with_capacity(64);
        self.generate_captures(pos, targets, &mut moves);
        self.generate_quiets(pos, targets, &mut moves);
        moves
    }

    pub fn has_legal_move(&self, pos: &PositionState) -> bool { !self.generate(pos).is_empty() }

    fn push(&self, pos: &PositionState, mv: MoveInfo, out: &mut Vec<MoveInfo>) {
        let Some(kind) = pos.is_legal_move(&mv) else { return };
        let attacker = pos.piece_at(mv.from).map_or(PieceKind::Pawn, |p| p.kind);
        let victim = match kind {
            MoveKind::EnPassantCapture => Some(PieceKind::Pawn),
            MoveKind::Capture | MoveKind::Promotion => pos.piece_at(mv.to).map(|p| p.kind),
            _ => None,
        };
        let value = victim.map_or(0, |v| capture_value(v, attacker)) + mv.promotion.map_or(0, |p| p.value() * 10);
        out.push(MoveInfo { kind, value, ..mv });
    }

    fn push_pawn(&self, pos: &PositionState, from: Square, to: Square, out: &mut Vec<MoveInfo>) {
        if to.rank() == 0 || to.rank() == 7 {
            for promo in PieceKind::PROMOTIONS {
                self.push(pos, MoveInfo::with_promotion(from, to, promo), out);
            }
        } else {
            self.push(pos, MoveInfo::new(from, to), out);
        }
    }

    fn slide(&self, pos: &PositionState, from: Square, dirs: &[Direction], captures: bool, targets: Bitboard, out: &mut Vec<MoveInfo>) {
        let us = pos.side_to_move();
        for &dir in dirs {
            for &to in self.tables.ray(from, dir) {
                match pos.piece_at(to) {
                    None => {
                        if !captures && targets & to.bit() != 0 { self.push(pos, MoveInfo::new(from, to), out); }
                    }
                    Some(p) => {
                        if captures && p.color != us && targets & to.bit() != 0 {
                            self.push(pos, MoveInfo::new(from, to), out);
                        }
                        break;
                    }
                }
            }
        }
    }

    fn forward(color: Color) -> i8 {
        if color == Color::White { 8 } else { -8 }
    }

    /// Captures, en passant and every promotion, restricted to `targets` for non-king pieces.
    pub fn generate_captures(&self, pos: &PositionState, targets: Bitboard, out: &mut Vec<MoveInfo>) {
        let us = pos.side_to_move();
        let t = self.tables;
        let enemy = pos.occupancy(!us).normal();
        let empty = !pos.all_occupancy().normal();
        let last_rank = if us == Color::White { 7 } else { 0 };
        let start = out.len();

        for from in squares(pos.occupancy(us).normal()) {
            let Some(piece) = pos.piece_at(from) else { continue };
            match piece.kind {
                PieceKind::Pawn => {
                    for to in squares(t.pawn_attacks(us, from) & enemy & targets) {
                        self.push_pawn(pos, from, to, out);
                    }
                    if let Some(ep) = pos.en_passant_square() {
                        if t.pawn_attacks(us, from) & ep.bit() != 0 { self.push(pos, MoveInfo::new(from, ep), out); }
                    }
                    if let Some(to) = from.offset(Self::forward(us)) {
                        if to.rank() == last_rank && empty & targets & to.bit() != 0 { self.push_pawn(pos, from, to, out); }
                    }
                }
                PieceKind::Knight => {
                    for to in squares(t.knight(from) & enemy & targets) {
                        self.push(pos, MoveInfo::new(from, to), out);
                    }
                }
                PieceKind::Bishop => self.slide(pos, from, &Direction::DIAGONAL, true, targets, out),
                PieceKind::Rook => self.slide(pos, from, &Direction::STRAIGHT, true, targets, out),
                PieceKind::Queen => self.slide(pos, from, &Direction::ALL, true, targets, out),
                PieceKind::King => {
                    for to in squares(t.king(from) & enemy) {
                        self.push(pos, MoveInfo::new(from, to), out);
                    }
                }
            }
        }
        out[start..].sort_by(|a, b| b.value.cmp(&a.value));
    }

    /// Non-capturing moves other than promotions, castling included.
    pub fn generate_quiets(&self, pos: &PositionState, targets: Bitboard, out: &mut Vec<MoveInfo>) {
        let us = pos.side_to_move();
        let t = self.tables;
        let empty = !pos.all_occupancy().normal();
        let (start_rank, last_rank) = if us == Color::White { (1, 7) } else { (6, 0) };

        for from in squares(pos.occupancy(us).normal()) {
            let Some(piece) = pos.piece_at(from) else { continue };
            match piece.kind {
                PieceKind::Pawn => {
                    let Some(one) = from.offset(Self::forward(us)) else { continue };
                    if empty & one.bit() == 0 || one.rank() == last_rank { continue; }
                    if targets & one.bit() != 0 { self.push(pos, MoveInfo::new(from, one), out); }
                    if from.rank() == start_rank {
                        if let Some(two) = one.offset(Self::forward(us)) {
                            if empty & targets & two.bit() != 0 { self.push(pos, MoveInfo::new(from, two), out); }
                        }
                    }
                }
                PieceKind::Knight => {
                    for to in squares(t.knight(from) & empty & targets) {
                        self.push(pos, MoveInfo::new(from, to), out);
                    }
                }
                PieceKind::Bishop => self.slide(pos, from, &Direction::DIAGONAL, false, targets, out),
                PieceKind::Rook => self.slide(pos, from, &Direction::STRAIGHT, false, targets, out),
                PieceKind::Queen => self.slide(pos, from, &Direction::ALL, false, targets, out),
                PieceKind::King => {
                    for to in squares(t.king(from) & empty) {
                        self.push(pos, MoveInfo::new(from, to), out);
                    }
                    if !pos.in_check() {
                        for g in CASTLES.iter().filter(|g| g.color == us && g.king_from == from) {
                            if pos.castling_rights().has(us, g.side) {
                                self.push(pos, MoveInfo::new(g.king_from, g.rook_from), out);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Hands out moves one at a time: hash move, then captures, then quiet moves.
pub struct MovePicker {
    search: SearchType,
    stage: Stage,
    hash_move: Option<MoveInfo>,
    moves: Vec<MoveInfo>,
    index: usize,
}

impl MovePicker {
    pub fn new(search: SearchType, hash_move: Option<MoveInfo>) -> Self {
        let hash_move = if search == SearchType::Quiescence { None } else { hash_move };
        MovePicker { search, stage: Stage::NotStarted, hash_move, moves: Vec::with_capacity(48), index: 0 }
    }

    pub fn stage(&self) -> Stage { self.stage }

    fn targets(&self, pos: &PositionState) -> Bitboard {
        match self.search {
            SearchType::Evasion => pos.check_info().evasion_targets(),
            _ => !0,
        }
    }

    fn enter(&mut self, stage: Stage, gen: &MoveGenerator, pos: &PositionState) {
        self.stage = stage;
        self.moves.clear();
        self.index = 0;
        let targets = self.targets(pos);
        match stage {
            Stage::Captures => gen.generate_captures(pos, targets, &mut self.moves),
            Stage::Quiets => gen.generate_quiets(pos, targets, &mut self.moves),
            _ => {}
        }
    }

    fn is_hash_move(&self, mv: &MoveInfo) -> bool { self.hash_move.map_or(false, |h| h.same_move(mv)) }

    /// Next legal move for `pos`, or `None` once every stage is exhausted.
    pub fn next(&mut self, gen: &MoveGenerator, pos: &PositionState) -> Option<MoveInfo> {
        loop {
            match self.stage {
                Stage::NotStarted => {
                    if self.search == SearchType::Quiescence {
                        self.enter(Stage::Captures, gen, pos);
                    } else {
                        self.stage = Stage::HashMove;
                    }
                }
                Stage::HashMove => {
                    let hash = self.hash_move.take();
                    self.enter(Stage::Captures, gen, pos);
                    if let Some(mv) = hash {
                        if let Some(kind) = pos.is_legal_move(&mv) {
                            self.hash_move = Some(MoveInfo { kind, ..mv });
                            return self.hash_move;
                        }
                    }
                }
                Stage::Captures | Stage::Quiets => {
                    while self.index < self.moves.len() {
                        let mv = self.moves[self.index];
                        self.index += 1;
                        if !self.is_hash_move(&mv) { return Some(mv); }
                    }
                    if self.stage == Stage::Captures && self.search != SearchType::Quiescence {
                        self.enter(Stage::Quiets, gen, pos);
                    } else {
                        self.enter(Stage::Exhausted, gen, pos);
                    }
                }
                Stage::Exhausted => return None,
            }
        }
    }
}
