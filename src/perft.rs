use crate::board::{MoveInfo, PositionState};
use crate::movegen::MoveGenerator;

// Make/undo perft (no cloning); the last ply is counted in bulk.
pub fn perft(pos: &mut PositionState, depth: u32) -> u64 {
    perft_with(&MoveGenerator::new(), pos, depth)
}

fn perft_with(gen: &MoveGenerator, pos: &mut PositionState, depth: u32) -> u64 {
    if depth == 0 { return 1; }
    let moves = gen.generate(pos);
    if depth == 1 { return moves.len() as u64; }
    let mut nodes = 0u64;
    for mv in moves {
        if pos.make_move(mv).is_err() { continue; }
        nodes += perft_with(gen, pos, depth - 1);
        let _ = pos.undo_move();
    }
    nodes
}

/// Node count below each root move, in generation order.
pub fn divide(pos: &mut PositionState, depth: u32) -> Vec<(MoveInfo, u64)> {
    let gen = MoveGenerator::new();
    let mut out = Vec::new();
    if depth == 0 { return out; }
    for mv in gen.generate(pos) {
        if pos.make_move(mv).is_err() { continue; }
        out.push((mv, perft_with(&gen, pos, depth - 1)));
        let _ = pos.undo_move();
    }
    out
}
