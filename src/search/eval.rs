use crate::board::{squares, tables, Color, Piece, PieceKind, PositionState};

// Mate scoring helpers
pub const MATE_SCORE: i32 = 30_000;
pub const DRAW_SCORE: i32 = 0;
/// Static evaluations stay well clear of mate scores.
pub const MAX_EVAL: i32 = 20_000;

const MAX_PHASE: i32 = 24;
const PHASE_WEIGHT: [i32; 6] = [0, 1, 1, 2, 4, 0];
const MOBILITY_WEIGHT: [i32; 6] = [0, 4, 3, 2, 1, 0];

/// Terms of one evaluation, all from White's side. Filled only when diagnostics ask for it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvalBreakdown {
    pub material: i32,
    pub pst_mg: i32,
    pub pst_eg: i32,
    pub phase: i32,
    pub pst: i32,
    pub mobility: i32,
    pub total: i32,
}

// Side-agnostic material in centipawns: positive means White has more material.
pub fn material_eval_cp_side_agnostic(pos: &PositionState) -> i32 {
    let mut score = 0;
    for piece in Piece::all() {
        let v = piece.kind.value() * pos.piece_count(piece) as i32;
        score += if piece.color == Color::White { v } else { -v };
    }
    score
}

/// Game phase from remaining non-pawn material: `MAX_PHASE` at the start, 0 with bare kings and pawns.
pub fn phase(pos: &PositionState) -> i32 {
    let mut phase = 0;
    for piece in Piece::all() {
        phase += PHASE_WEIGHT[piece.kind.index()] * pos.piece_count(piece) as i32;
    }
    phase.min(MAX_PHASE)
}

fn mobility(pos: &PositionState, color: Color) -> i32 {
    let t = tables();
    let occ = pos.all_occupancy();
    let own = pos.occupancy(color).normal();
    let mut score = 0;
    for kind in [PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen] {
        for sq in squares(pos.pieces_of(color, kind)) {
            let reach = match kind {
                PieceKind::Knight => t.knight(sq),
                PieceKind::Bishop => t.bishop_attacks(sq, &occ),
                PieceKind::Rook => t.rook_attacks(sq, &occ),
                _ => t.queen_attacks(sq, &occ),
            };
            score += MOBILITY_WEIGHT[kind.index()] * (reach & !own).count_ones() as i32;
        }
    }
    score
}

/// Material balance and game phase: both depend on the piece counts only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialEntry {
    pub key: u64,
    pub material: i32,
    pub phase: i32,
}

impl MaterialEntry {
    pub fn compute(pos: &PositionState) -> Self {
        MaterialEntry { key: pos.material_key(), material: material_eval_cp_side_agnostic(pos), phase: phase(pos) }
    }
}

pub const MATERIAL_ENTRIES: usize = 1 << 12;

/// Direct-mapped cache of [`MaterialEntry`] indexed by the material key.
#[derive(Clone, Debug)]
pub struct MaterialTable {
    slots: Vec<Option<MaterialEntry>>,
}

impl Default for MaterialTable {
    fn default() -> Self { Self::with_capacity_entries(MATERIAL_ENTRIES) }
}

impl MaterialTable {
    pub fn with_capacity_entries(cap: usize) -> Self { MaterialTable { slots: vec![None; cap.max(1)] } }

    fn index(&self, key: u64) -> usize { (key % self.slots.len() as u64) as usize }

    pub fn lookup(&self, key: u64) -> Option<MaterialEntry> { self.slots[self.index(key)].filter(|e| e.key == key) }

    /// Cached entry for the position's material, computed and stored on a miss.
    pub fn fetch(&mut self, pos: &PositionState) -> MaterialEntry {
        let key = pos.material_key();
        if let Some(e) = self.lookup(key) { return e; }
        let e = MaterialEntry::compute(pos);
        let idx = self.index(key);
        self.slots[idx] = Some(e);
        e
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}

fn combine(pos: &PositionState, m: MaterialEntry, breakdown: Option<&mut EvalBreakdown>) -> i32 {
    let (mg, eg) = (pos.pst_mg(), pos.pst_eg());
    let pst = (mg * m.phase + eg * (MAX_PHASE - m.phase)) / MAX_PHASE;
    let mobility = mobility(pos, Color::White) - mobility(pos, Color::Black);
    let total = (m.material + pst + mobility).clamp(-MAX_EVAL, MAX_EVAL);
    if let Some(b) = breakdown {
        *b = EvalBreakdown { material: m.material, pst_mg: mg, pst_eg: eg, phase: m.phase, pst, mobility, total };
    }
    total
}

/// Evaluation from White's side.
pub fn evaluate_white(pos: &PositionState, breakdown: Option<&mut EvalBreakdown>) -> i32 {
    combine(pos, MaterialEntry::compute(pos), breakdown)
}

/// Side-to-move evaluation reading material and phase through `materials`.
pub fn evaluate_cached(pos: &PositionState, materials: &mut MaterialTable) -> i32 {
    let white = combine(pos, materials.fetch(pos), None);
    if pos.side_to_move() == Color::White { white } else { -white }
}

/// Evaluation from the side to move's perspective (negamax-friendly).
pub fn evaluate(pos: &PositionState, breakdown: Option<&mut EvalBreakdown>) -> i32 {
    let white = evaluate_white(pos, breakdown);
    if pos.side_to_move() == Color::White { white } else { -white }
}

pub fn eval_cp(pos: &PositionState) -> i32 { evaluate(pos, None) }

/// Score for a side with no legal moves at distance `ply` from the root.
pub fn terminal_score(in_check: bool, ply: usize) -> i32 {
    if in_check { -(MATE_SCORE - ply as i32) } else { DRAW_SCORE }
}
