use std::fmt;

use super::attacks::{tables, RaySide};
use super::moves::{MoveInfo, MoveKind};
use super::pst::pst_value;
use super::rotation::{Occupancy, Orientation};
use super::types::{squares, Bitboard, CastleSide, CastlingRights, Color, Piece, PieceKind, Square};
use super::zobrist::{keys, MAX_PIECE_COUNT};
use crate::error::{FenError, MoveError};

pub const MAX_SEARCH_DEPTH: usize = 64;
pub const MAX_QUIESCENCE_DEPTH: usize = 10;
/// Deepest line of moves the undo arena can hold: main search plus quiescence.
pub const UNDO_CAPACITY: usize = MAX_SEARCH_DEPTH + MAX_QUIESCENCE_DEPTH;

/// Everything make_move overwrites that undo_move cannot recompute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UndoRecord {
    pub mv: MoveInfo,
    pub captured: Option<Piece>,
    pub en_passant: Option<u8>,
    pub castling: CastlingRights,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
    pub zobrist: u64,
    pub material_key: u64,
}

// Fixed slab indexed by ply; never grows during search.
#[derive(Clone)]
struct UndoArena {
    records: Box<[UndoRecord]>,
    ply: usize,
}

impl UndoArena {
    fn new() -> Self { UndoArena { records: vec![UndoRecord::default(); UNDO_CAPACITY].into_boxed_slice(), ply: 0 } }

    fn is_full(&self) -> bool { self.ply >= self.records.len() }

    fn push(&mut self, record: UndoRecord) {
        self.records[self.ply] = record;
        self.ply += 1;
    }

    fn pop(&mut self) -> Option<UndoRecord> {
        if self.ply == 0 { return None; }
        self.ply -= 1;
        Some(self.records[self.ply])
    }

    fn last(&self) -> Option<&UndoRecord> { self.ply.checked_sub(1).map(|i| &self.records[i]) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pin {
    pub square: Square,
    /// Squares the pinned piece may still move to: the line between king and pinner, pinner included.
    pub allowed: Bitboard,
}

/// Checkers and pins of the side to move, refreshed after every position change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckInfo {
    pub checkers: Bitboard,
    /// With a single checker: the checker plus any square between it and the king.
    pub check_mask: Bitboard,
    pub pinned: Bitboard,
    pins: [Pin; 8],
    pin_count: u8,
}

impl CheckInfo {
    pub fn in_check(&self) -> bool { self.checkers != 0 }
    pub fn double_check(&self) -> bool { self.checkers.count_ones() > 1 }
    pub fn pins(&self) -> &[Pin] { &self.pins[..self.pin_count as usize] }

    /// Destinations allowed to non-king pieces: everything, the check mask, or nothing in double check.
    pub fn evasion_targets(&self) -> Bitboard {
        match self.checkers.count_ones() {
            0 => !0,
            1 => self.check_mask,
            _ => 0,
        }
    }

    pub fn pin_mask(&self, sq: Square) -> Bitboard {
        if self.pinned & sq.bit() == 0 { return !0; }
        self.pins().iter().find(|p| p.square == sq).map_or(!0, |p| p.allowed)
    }

    fn add_pin(&mut self, square: Square, allowed: Bitboard) {
        self.pins[self.pin_count as usize] = Pin { square, allowed };
        self.pin_count += 1;
        self.pinned |= square.bit();
    }
}

/// King and rook squares of one castling move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastleGeometry {
    pub color: Color,
    pub side: CastleSide,
    pub king_from: Square,
    pub rook_from: Square,
    pub king_to: Square,
    pub rook_to: Square,
}

pub const CASTLES: [CastleGeometry; 4] = [
    CastleGeometry {
        color: Color::White,
        side: CastleSide::King,
        king_from: Square::E1,
        rook_from: Square::H1,
        king_to: Square::G1,
        rook_to: Square::F1,
    },
    CastleGeometry {
        color: Color::White,
        side: CastleSide::Queen,
        king_from: Square::E1,
        rook_from: Square::A1,
        king_to: Square::C1,
        rook_to: Square::D1,
    },
    CastleGeometry {
        color: Color::Black,
        side: CastleSide::King,
        king_from: Square::E8,
        rook_from: Square::H8,
        king_to: Square::G8,
        rook_to: Square::F8,
    },
    CastleGeometry {
        color: Color::Black,
        side: CastleSide::Queen,
        king_from: Square::E8,
        rook_from: Square::A8,
        king_to: Square::C8,
        rook_to: Square::D8,
    },
];

pub fn castle_geometry(color: Color, rook_from: Square) -> Option<&'static CastleGeometry> {
    CASTLES.iter().find(|g| g.color == color && g.rook_from == rook_from)
}

// Rights that survive a move touching `sq`.
fn castling_keep_mask(sq: Square) -> u8 {
    let mut keep = CastlingRights::ALL.bits();
    for g in &CASTLES {
        if sq == g.king_from || sq == g.rook_from {
            keep &= !CastlingRights::flag(g.color, g.side);
        }
    }
    keep
}

/// Side to move, rights and counters of a position under construction.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Setup {
    pub side: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<u8>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

#[derive(Clone)]
pub struct PositionState {
    grid: [[Option<Piece>; 8]; 8],
    occupancy: [Occupancy; 2],
    pieces: [Bitboard; 12],
    counts: [u8; 12],
    kings: [Square; 2],
    side: Color,
    castling: CastlingRights,
    en_passant: Option<u8>,
    halfmove_clock: u16,
    fullmove_number: u16,
    zobrist: u64,
    material_key: u64,
    /// Piece-square sums from White's side: middlegame, endgame.
    pst: (i32, i32),
    check: CheckInfo,
    history: UndoArena,
}

impl PositionState {
    fn empty(setup: &Setup) -> Self {
        PositionState {
            grid: [[None; 8]; 8],
            occupancy: [Occupancy::EMPTY; 2],
            pieces: [0; 12],
            counts: [0; 12],
            kings: [Square::E1, Square::E8],
            side: setup.side,
            castling: setup.castling,
            en_passant: setup.en_passant,
            halfmove_clock: setup.halfmove_clock,
            fullmove_number: setup.fullmove_number,
            zobrist: 0,
            material_key: 0,
            pst: (0, 0),
            check: CheckInfo::default(),
            history: UndoArena::new(),
        }
    }

    /// Builds the state without validating it; keys are computed from scratch.
    pub(crate) fn assemble(placement: &[(Square, Piece)], setup: Setup) -> Self {
        let mut pos = PositionState::empty(&setup);
        for &(sq, piece) in placement {
            pos.put_piece(sq, piece);
        }
        let k = keys();
        if pos.side == Color::Black { pos.zobrist ^= k.black_to_move(); }
        pos.zobrist ^= k.castling(pos.castling);
        if let Some(f) = pos.en_passant { pos.zobrist ^= k.en_passant(f); }
        pos.refresh_check_info();
        pos
    }

    /// Position from a piece list. Castling rights are granted wherever king and rook stand on their home squares.
    pub fn from_pieces(placement: &[(Square, Piece)], side: Color) -> Result<Self, FenError> {
        validate_placement(placement)?;
        let mut castling = CastlingRights::NONE;
        for g in &CASTLES {
            let home = |sq: Square, kind: PieceKind| placement.contains(&(sq, Piece::new(g.color, kind)));
            if home(g.king_from, PieceKind::King) && home(g.rook_from, PieceKind::Rook) {
                castling.insert(g.color, g.side);
            }
        }
        let setup = Setup { side, castling, en_passant: None, halfmove_clock: 0, fullmove_number: 1 };
        let pos = PositionState::assemble(placement, setup);
        pos.validate_setup()?;
        Ok(pos)
    }

    pub fn startpos() -> Self {
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut placement = Vec::with_capacity(32);
        for (file, &kind) in back.iter().enumerate() {
            let f = file as u8;
            placement.push((Square::new(0, f), Piece::new(Color::White, kind)));
            placement.push((Square::new(1, f), Piece::new(Color::White, PieceKind::Pawn)));
            placement.push((Square::new(6, f), Piece::new(Color::Black, PieceKind::Pawn)));
            placement.push((Square::new(7, f), Piece::new(Color::Black, kind)));
        }
        let setup = Setup {
            side: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        };
        PositionState::assemble(&placement, setup)
    }

    /// Checks the parts of a position a piece list cannot express on its own.
    pub(crate) fn validate_setup(&self) -> Result<(), FenError> {
        for g in &CASTLES {
            if !self.castling.has(g.color, g.side) { continue; }
            let king = self.piece_at(g.king_from) == Some(Piece::new(g.color, PieceKind::King));
            let rook = self.piece_at(g.rook_from) == Some(Piece::new(g.color, PieceKind::Rook));
            if !king || !rook {
                return Err(FenError::Impossible(format!("castling right without king and rook on {} and {}", g.king_from, g.rook_from)));
            }
        }
        if let Some(ep) = self.en_passant_square() {
            let them = !self.side;
            let (pawn_sq, origin) = match self.side {
                Color::White => (Square::new(4, ep.file()), Square::new(6, ep.file())),
                Color::Black => (Square::new(3, ep.file()), Square::new(1, ep.file())),
            };
            if self.piece_at(ep).is_some()
                || self.piece_at(origin).is_some()
                || self.piece_at(pawn_sq) != Some(Piece::new(them, PieceKind::Pawn))
            {
                return Err(FenError::Impossible(format!("en passant square {} without a double-pushed pawn", ep)));
            }
        }
        let them = !self.side;
        if self.attackers_to(self.kings[them.index()], self.side, &self.all_occupancy()) != 0 {
            return Err(FenError::Impossible("side not to move is in check".to_string()));
        }
        Ok(())
    }

    #[inline]
    pub fn side_to_move(&self) -> Color { self.side }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> { self.grid[sq.rank() as usize][sq.file() as usize] }

    pub fn occupancy(&self, color: Color) -> &Occupancy { &self.occupancy[color.index()] }

    pub fn all_occupancy(&self) -> Occupancy { self.occupancy[0] | self.occupancy[1] }

    #[inline]
    pub fn pieces(&self, piece: Piece) -> Bitboard { self.pieces[piece.index()] }

    #[inline]
    pub fn pieces_of(&self, color: Color, kind: PieceKind) -> Bitboard { self.pieces[Piece::new(color, kind).index()] }

    pub fn piece_count(&self, piece: Piece) -> u8 { self.counts[piece.index()] }

    pub fn king_square(&self, color: Color) -> Square { self.kings[color.index()] }

    pub fn castling_rights(&self) -> CastlingRights { self.castling }

    pub fn en_passant_file(&self) -> Option<u8> { self.en_passant }

    /// Square a pawn of the side to move would capture onto en passant.
    pub fn en_passant_square(&self) -> Option<Square> {
        let rank = if self.side == Color::White { 5 } else { 2 };
        self.en_passant.map(|f| Square::new(rank, f))
    }

    pub fn zobrist_key(&self) -> u64 { self.zobrist }
    pub fn material_key(&self) -> u64 { self.material_key }
    pub fn pst_mg(&self) -> i32 { self.pst.0 }
    pub fn pst_eg(&self) -> i32 { self.pst.1 }
    pub fn halfmove_clock(&self) -> u16 { self.halfmove_clock }
    pub fn fullmove_number(&self) -> u16 { self.fullmove_number }
    pub fn check_info(&self) -> &CheckInfo { &self.check }
    pub fn in_check(&self) -> bool { self.check.in_check() }

    /// Moves currently held in the undo arena.
    pub fn ply(&self) -> usize { self.history.ply }

    pub fn last_move(&self) -> Option<MoveInfo> { self.history.last().map(|r| r.mv) }

    /// Makes the applied moves permanent; the arena afterwards holds search plies only.
    pub fn clear_history(&mut self) { self.history.ply = 0; }

    /// Pieces of `by` attacking `sq` under occupancy `occ`.
    pub fn attackers_to(&self, sq: Square, by: Color, occ: &Occupancy) -> Bitboard {
        let t = tables();
        let p = |kind| self.pieces_of(by, kind);
        let straight = p(PieceKind::Rook) | p(PieceKind::Queen);
        let diagonal = p(PieceKind::Bishop) | p(PieceKind::Queen);
        (t.knight(sq) & p(PieceKind::Knight))
            | (t.king(sq) & p(PieceKind::King))
            | (t.pawn_attacks(!by, sq) & p(PieceKind::Pawn))
            | (t.rook_attacks(sq, occ) & straight)
            | (t.bishop_attacks(sq, occ) & diagonal)
    }

    pub fn is_attacked(&self, sq: Square, by: Color) -> bool { self.attackers_to(sq, by, &self.all_occupancy()) != 0 }

    fn refresh_check_info(&mut self) { self.check = self.compute_check_info(); }

    // Walks the four lines through the king with the pin tables: a first blocker that is an
    // enemy slider checks, an own piece followed by an enemy slider is pinned.
    fn compute_check_info(&self) -> CheckInfo {
        let t = tables();
        let us = self.side;
        let them = !us;
        let king = self.kings[us.index()];
        let occ = self.all_occupancy();
        let own = self.occupancy[us.index()].normal();
        let queens = self.pieces_of(them, PieceKind::Queen);
        let straight = self.pieces_of(them, PieceKind::Rook) | queens;
        let diagonal = self.pieces_of(them, PieceKind::Bishop) | queens;
        let mut info = CheckInfo::default();
        for o in Orientation::ALL {
            let sliders = if o.is_straight() { straight } else { diagonal };
            let near = t.pin_info(o, king, &occ);
            for side in RaySide::BOTH {
                let Some(blocker) = near.blocker(side) else { continue };
                if sliders & blocker.bit() != 0 {
                    info.checkers |= blocker.bit();
                    info.check_mask |= near.ray(side);
                } else if own & blocker.bit() != 0 {
                    let beyond = t.pin_info(o, blocker, &occ);
                    if let Some(pinner) = beyond.blocker(side) {
                        if sliders & pinner.bit() != 0 {
                            info.add_pin(blocker, near.ray(side) | beyond.ray(side));
                        }
                    }
                }
            }
        }
        let leapers = (t.knight(king) & self.pieces_of(them, PieceKind::Knight))
            | (t.pawn_attacks(us, king) & self.pieces_of(them, PieceKind::Pawn));
        info.checkers |= leapers;
        info.check_mask |= leapers;
        info
    }

    /// Classifies `mv` for the side to move, or `None` if it is not legal here.
    pub fn is_legal_move(&self, mv: &MoveInfo) -> Option<MoveKind> {
        let piece = self.piece_at(mv.from)?;
        if piece.color != self.side || mv.from == mv.to { return None; }
        let kind = match piece.kind {
            PieceKind::King => return self.king_move_kind(mv),
            PieceKind::Pawn => self.pawn_move_kind(mv)?,
            other => self.piece_move_kind(other, mv)?,
        };
        if kind == MoveKind::EnPassantCapture {
            return self.en_passant_keeps_king_safe(mv).then_some(kind);
        }
        self.keeps_king_safe(mv.from, mv.to).then_some(kind)
    }

    fn keeps_king_safe(&self, from: Square, to: Square) -> bool {
        self.check.evasion_targets() & to.bit() != 0 && self.check.pin_mask(from) & to.bit() != 0
    }

    fn pawn_move_kind(&self, mv: &MoveInfo) -> Option<MoveKind> {
        let us = self.side;
        let (forward, start_rank, last_rank) = match us {
            Color::White => (8i8, 1, 7),
            Color::Black => (-8i8, 6, 0),
        };
        let promotes = mv.to.rank() == last_rank;
        match mv.promotion {
            Some(k) if !promotes || !k.is_promotion_target() => return None,
            None if promotes => return None,
            _ => {}
        }
        let target = self.piece_at(mv.to);
        if tables().pawn_attacks(us, mv.from) & mv.to.bit() != 0 {
            return match target {
                Some(p) if p.color != us => Some(if promotes { MoveKind::Promotion } else { MoveKind::Capture }),
                Some(_) => None,
                None => (self.en_passant_square() == Some(mv.to)).then_some(MoveKind::EnPassantCapture),
            };
        }
        if target.is_some() { return None; }
        let one = mv.from.offset(forward)?;
        if one == mv.to {
            return Some(if promotes { MoveKind::Promotion } else { MoveKind::Normal });
        }
        let two = one.offset(forward)?;
        (mv.from.rank() == start_rank && two == mv.to && self.piece_at(one).is_none()).then_some(MoveKind::EnPassantPush)
    }

    fn piece_move_kind(&self, kind: PieceKind, mv: &MoveInfo) -> Option<MoveKind> {
        if mv.promotion.is_some() { return None; }
        let t = tables();
        let occ = self.all_occupancy();
        let reach = match kind {
            PieceKind::Knight => t.knight(mv.from),
            PieceKind::Bishop => t.bishop_attacks(mv.from, &occ),
            PieceKind::Rook => t.rook_attacks(mv.from, &occ),
            PieceKind::Queen => t.queen_attacks(mv.from, &occ),
            PieceKind::Pawn | PieceKind::King => return None,
        };
        if reach & mv.to.bit() == 0 { return None; }
        match self.piece_at(mv.to) {
            None => Some(MoveKind::Normal),
            Some(p) if p.color != self.side => Some(MoveKind::Capture),
            Some(_) => None,
        }
    }

    fn king_move_kind(&self, mv: &MoveInfo) -> Option<MoveKind> {
        if mv.promotion.is_some() { return None; }
        let us = self.side;
        let target = self.piece_at(mv.to);
        if target == Some(Piece::new(us, PieceKind::Rook)) {
            return self.castle_is_legal(mv).then_some(MoveKind::Castle);
        }
        if target.map_or(false, |p| p.color == us) || tables().king(mv.from) & mv.to.bit() == 0 {
            return None;
        }
        let mut occ = self.all_occupancy();
        occ.toggle(mv.from);
        if self.attackers_to(mv.to, !us, &occ) != 0 { return None; }
        Some(if target.is_some() { MoveKind::Capture } else { MoveKind::Normal })
    }

    fn castle_is_legal(&self, mv: &MoveInfo) -> bool {
        let us = self.side;
        let Some(g) = castle_geometry(us, mv.to) else { return false };
        if g.king_from != mv.from || !self.castling.has(us, g.side) || self.check.in_check() {
            return false;
        }
        let t = tables();
        let occ = self.all_occupancy();
        if t.between(g.king_from, g.rook_from) & occ.normal() != 0 { return false; }
        let path = t.between(g.king_from, g.king_to) | g.king_to.bit();
        squares(path).all(|sq| self.attackers_to(sq, !us, &occ) == 0)
    }

    // Replays the capture on a scratch occupancy: both pawns leave the capture rank at once.
    fn en_passant_keeps_king_safe(&self, mv: &MoveInfo) -> bool {
        let captured = Square::new(mv.from.rank(), mv.to.file());
        let mut occ = self.all_occupancy();
        occ.toggle(mv.from);
        occ.toggle(captured);
        occ.toggle(mv.to);
        let king = self.kings[self.side.index()];
        self.attackers_to(king, !self.side, &occ) & !captured.bit() == 0
    }

    fn put_piece(&mut self, sq: Square, piece: Piece) {
        let k = keys();
        let i = piece.index();
        self.grid[sq.rank() as usize][sq.file() as usize] = Some(piece);
        self.occupancy[piece.color.index()].toggle(sq);
        self.pieces[i] |= sq.bit();
        self.material_key ^= k.material(piece, self.counts[i] as usize);
        self.counts[i] = self.counts[i].saturating_add(1);
        self.zobrist ^= k.piece_square(piece, sq);
        let (mg, eg) = pst_value(piece, sq);
        self.pst = (self.pst.0 + mg, self.pst.1 + eg);
        if piece.kind == PieceKind::King { self.kings[piece.color.index()] = sq; }
    }

    fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.grid[sq.rank() as usize][sq.file() as usize].take()?;
        let k = keys();
        let i = piece.index();
        self.occupancy[piece.color.index()].toggle(sq);
        self.pieces[i] &= !sq.bit();
        self.counts[i] = self.counts[i].saturating_sub(1);
        self.material_key ^= k.material(piece, self.counts[i] as usize);
        self.zobrist ^= k.piece_square(piece, sq);
        let (mg, eg) = pst_value(piece, sq);
        self.pst = (self.pst.0 - mg, self.pst.1 - eg);
        Some(piece)
    }

    fn move_piece(&mut self, from: Square, to: Square) {
        if let Some(piece) = self.remove_piece(from) {
            self.put_piece(to, piece);
        }
    }

    /// Applies a legal move and records how to take it back. Illegal moves leave the state untouched.
    pub fn make_move(&mut self, mv: MoveInfo) -> Result<MoveInfo, MoveError> {
        let kind = self.is_legal_move(&mv).ok_or_else(|| MoveError::Illegal(mv.to_uci()))?;
        if self.history.is_full() { return Err(MoveError::HistoryFull(UNDO_CAPACITY)); }
        let mv = MoveInfo { kind, ..mv };
        let us = self.side;
        let k = keys();
        let mut record = UndoRecord {
            mv,
            captured: None,
            en_passant: self.en_passant,
            castling: self.castling,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            zobrist: self.zobrist,
            material_key: self.material_key,
        };
        let moving_pawn = self.piece_at(mv.from).map_or(false, |p| p.kind == PieceKind::Pawn);

        if let Some(f) = self.en_passant.take() { self.zobrist ^= k.en_passant(f); }
        match kind {
            MoveKind::Normal => self.move_piece(mv.from, mv.to),
            MoveKind::EnPassantPush => {
                self.move_piece(mv.from, mv.to);
                self.en_passant = Some(mv.from.file());
                self.zobrist ^= k.en_passant(mv.from.file());
            }
            MoveKind::Capture => {
                record.captured = self.remove_piece(mv.to);
                self.move_piece(mv.from, mv.to);
            }
            MoveKind::Promotion => {
                record.captured = self.remove_piece(mv.to);
                self.remove_piece(mv.from);
                let promoted = mv.promotion.unwrap_or(PieceKind::Queen);
                self.put_piece(mv.to, Piece::new(us, promoted));
            }
            MoveKind::EnPassantCapture => {
                record.captured = self.remove_piece(Square::new(mv.from.rank(), mv.to.file()));
                self.move_piece(mv.from, mv.to);
            }
            MoveKind::Castle => {
                if let Some(g) = castle_geometry(us, mv.to) {
                    self.remove_piece(g.king_from);
                    self.remove_piece(g.rook_from);
                    self.put_piece(g.king_to, Piece::new(us, PieceKind::King));
                    self.put_piece(g.rook_to, Piece::new(us, PieceKind::Rook));
                }
            }
        }

        let castling = self.castling.intersect(castling_keep_mask(mv.from) & castling_keep_mask(mv.to));
        if castling != self.castling {
            self.zobrist ^= k.castling(self.castling) ^ k.castling(castling);
            self.castling = castling;
        }
        self.halfmove_clock =
            if moving_pawn || record.captured.is_some() { 0 } else { self.halfmove_clock.saturating_add(1) };
        if us == Color::Black { self.fullmove_number = self.fullmove_number.saturating_add(1); }
        self.side = !us;
        self.zobrist ^= k.black_to_move();
        self.history.push(record);
        self.refresh_check_info();
        Ok(mv)
    }

    /// Takes back the most recent move, restoring the state exactly.
    pub fn undo_move(&mut self) -> Result<MoveInfo, MoveError> {
        let record = self.history.pop().ok_or(MoveError::NoHistory)?;
        let mv = record.mv;
        let us = !self.side;
        match mv.kind {
            MoveKind::Normal | MoveKind::EnPassantPush => self.move_piece(mv.to, mv.from),
            MoveKind::Capture => {
                self.move_piece(mv.to, mv.from);
                if let Some(c) = record.captured { self.put_piece(mv.to, c); }
            }
            MoveKind::Promotion => {
                self.remove_piece(mv.to);
                self.put_piece(mv.from, Piece::new(us, PieceKind::Pawn));
                if let Some(c) = record.captured { self.put_piece(mv.to, c); }
            }
            MoveKind::EnPassantCapture => {
                self.move_piece(mv.to, mv.from);
                if let Some(c) = record.captured { self.put_piece(Square::new(mv.from.rank(), mv.to.file()), c); }
            }
            MoveKind::Castle => {
                if let Some(g) = castle_geometry(us, mv.to) {
                    self.remove_piece(g.king_to);
                    self.remove_piece(g.rook_to);
                    self.put_piece(g.king_from, Piece::new(us, PieceKind::King));
                    self.put_piece(g.rook_from, Piece::new(us, PieceKind::Rook));
                }
            }
        }
        self.side = us;
        self.en_passant = record.en_passant;
        self.castling = record.castling;
        self.halfmove_clock = record.halfmove_clock;
        self.fullmove_number = record.fullmove_number;
        self.zobrist = record.zobrist;
        self.material_key = record.material_key;
        self.refresh_check_info();
        Ok(mv)
    }

    /// Reads a move in coordinate notation. Castling may be given as king-two-squares or king-takes-rook.
    pub fn parse_move(&self, text: &str) -> Result<MoveInfo, MoveError> {
        let err = || MoveError::Parse(text.to_string());
        if !text.is_ascii() || !(4..=5).contains(&text.len()) { return Err(err()); }
        let from: Square = text[0..2].parse().map_err(|_| err())?;
        let mut to: Square = text[2..4].parse().map_err(|_| err())?;
        let promotion = match text[4..].chars().next() {
            Some(c) => Some(PieceKind::from_char(c).filter(|k| k.is_promotion_target()).ok_or_else(err)?),
            None => None,
        };
        let king = Piece::new(self.side, PieceKind::King);
        if self.piece_at(from) == Some(king) && from.rank() == to.rank() && from.file().abs_diff(to.file()) == 2 {
            if let Some(g) = CASTLES.iter().find(|g| g.color == self.side && g.king_from == from && g.king_to == to) {
                to = g.rook_from;
            }
        }
        Ok(MoveInfo { from, to, promotion, ..Default::default() })
    }

    /// Parses and plays a coordinate-notation move.
    pub fn apply_uci(&mut self, text: &str) -> Result<MoveInfo, MoveError> {
        let mv = self.parse_move(text)?;
        self.make_move(mv)
    }

    pub fn compute_zobrist(&self) -> u64 {
        let k = keys();
        let mut key = 0;
        for sq in Square::all() {
            if let Some(p) = self.piece_at(sq) { key ^= k.piece_square(p, sq); }
        }
        if self.side == Color::Black { key ^= k.black_to_move(); }
        if let Some(f) = self.en_passant { key ^= k.en_passant(f); }
        key ^ k.castling(self.castling)
    }

    pub fn compute_material_key(&self) -> u64 {
        let k = keys();
        let mut key = 0;
        for piece in Piece::all() {
            for n in 0..self.counts[piece.index()] as usize {
                key ^= k.material(piece, n);
            }
        }
        key
    }

    pub fn compute_pst(&self) -> (i32, i32) {
        self.placement().into_iter().fold((0, 0), |(mg, eg), (sq, p)| {
            let (m, e) = pst_value(p, sq);
            (mg + m, eg + e)
        })
    }

    /// Cross-checks every redundant representation against the board grid.
    pub fn is_consistent(&self) -> bool {
        let mut pieces = [0u64; 12];
        let mut by_color = [0u64; 2];
        for sq in Square::all() {
            if let Some(p) = self.piece_at(sq) {
                pieces[p.index()] |= sq.bit();
                by_color[p.color.index()] |= sq.bit();
            }
        }
        pieces == self.pieces
            && Color::BOTH.iter().all(|c| {
                let occ = &self.occupancy[c.index()];
                occ.normal() == by_color[c.index()] && occ.is_consistent()
            })
            && Piece::all().all(|p| self.counts[p.index()] as u32 == pieces[p.index()].count_ones())
            && Color::BOTH.iter().all(|&c| self.pieces_of(c, PieceKind::King) == self.kings[c.index()].bit())
            && self.zobrist == self.compute_zobrist()
            && self.material_key == self.compute_material_key()
            && self.pst == self.compute_pst()
            && self.check == self.compute_check_info()
    }

    /// Every occupied square with its piece, a1 first.
    pub fn placement(&self) -> Vec<(Square, Piece)> {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|p| (sq, p))).collect()
    }
}

/// Rejects piece lists no legal game can reach.
pub(crate) fn validate_placement(placement: &[(Square, Piece)]) -> Result<(), FenError> {
    let mut seen = 0u64;
    let mut counts = [0usize; 12];
    for &(sq, piece) in placement {
        if seen & sq.bit() != 0 {
            return Err(FenError::Placement(format!("two pieces on {}", sq)));
        }
        seen |= sq.bit();
        if piece.kind == PieceKind::Pawn && (sq.rank() == 0 || sq.rank() == 7) {
            return Err(FenError::Impossible(format!("pawn on back rank at {}", sq)));
        }
        counts[piece.index()] += 1;
    }
    for color in Color::BOTH {
        let n = |kind: PieceKind| counts[Piece::new(color, kind).index()];
        if n(PieceKind::King) != 1 {
            return Err(FenError::Impossible(format!("{:?} has {} kings", color, n(PieceKind::King))));
        }
        let total: usize = PieceKind::ALL.iter().map(|&k| n(k)).sum();
        if total > 16 {
            return Err(FenError::Impossible(format!("{:?} has {} pieces", color, total)));
        }
        let pawns = n(PieceKind::Pawn);
        if pawns > 8 {
            return Err(FenError::Impossible(format!("{:?} has {} pawns", color, pawns)));
        }
        let surplus = n(PieceKind::Knight).saturating_sub(2)
            + n(PieceKind::Bishop).saturating_sub(2)
            + n(PieceKind::Rook).saturating_sub(2)
            + n(PieceKind::Queen).saturating_sub(1);
        if surplus > 8 - pawns {
            return Err(FenError::Impossible(format!("{:?} has {} promoted pieces but only {} pawns missing", color, surplus, 8 - pawns)));
        }
        debug_assert!(PieceKind::ALL.iter().all(|&k| n(k) <= MAX_PIECE_COUNT));
    }
    Ok(())
}

impl PartialEq for PositionState {
    fn eq(&self, other: &Self) -> bool {
        self.grid == other.grid
            && self.side == other.side
            && self.en_passant == other.en_passant
            && self.castling == other.castling
    }
}

impl Eq for PositionState {}

impl fmt::Debug for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionState")
            .field("fen", &self.to_fen())
            .field("zobrist", &format_args!("{:#018x}", self.zobrist))
            .field("ply", &self.history.ply)
            .finish()
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let c = self.piece_at(Square::new(rank, file)).map_or('.', |p| p.fen_char());
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   a b c d e f g h")?;
        write!(f, "{}", self.to_fen())
    }
}
