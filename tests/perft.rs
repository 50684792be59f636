use rotachess::board::PositionState;
use rotachess::perft::{divide, perft};

fn perft_fen(fen: &str, depth: u32) -> u64 {
    let mut pos = PositionState::from_fen(fen).expect("valid fen");
    let nodes = perft(&mut pos, depth);
    assert_eq!(pos.to_fen(), PositionState::from_fen(fen).unwrap().to_fen(), "perft left the position changed");
    nodes
}

#[test]
fn perft_startpos_small_depths() {
    let mut b = PositionState::startpos();
    assert_eq!(perft(&mut b, 0), 1);
    assert_eq!(perft(&mut b, 1), 20);
    assert_eq!(perft(&mut b, 2), 400);
    assert_eq!(perft(&mut b, 3), 8902);
    assert_eq!(perft(&mut b, 4), 197281);
}

#[test]
fn perft_kiwipete() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    assert_eq!(perft_fen(fen, 1), 48);
    assert_eq!(perft_fen(fen, 2), 2039);
    assert_eq!(perft_fen(fen, 3), 97862);
}

#[test]
fn perft_rook_endgame_with_en_passant_pins() {
    let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    assert_eq!(perft_fen(fen, 1), 14);
    assert_eq!(perft_fen(fen, 2), 191);
    assert_eq!(perft_fen(fen, 3), 2812);
    assert_eq!(perft_fen(fen, 4), 43238);
}

#[test]
fn perft_promotions_and_checks() {
    let fen = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    assert_eq!(perft_fen(fen, 1), 6);
    assert_eq!(perft_fen(fen, 2), 264);
    assert_eq!(perft_fen(fen, 3), 9467);
}

#[test]
fn perft_underpromotion_position() {
    let fen = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
    assert_eq!(perft_fen(fen, 1), 44);
    assert_eq!(perft_fen(fen, 2), 1486);
    assert_eq!(perft_fen(fen, 3), 62379);
}

#[test]
fn divide_sums_to_perft() {
    let mut pos = PositionState::startpos();
    let rows = divide(&mut pos, 3);
    assert_eq!(rows.len(), 20);
    assert_eq!(rows.iter().map(|(_, n)| n).sum::<u64>(), 8902);
    let e2e4 = rows.iter().find(|(m, _)| m.to_uci() == "e2e4").expect("e2e4 at root");
    assert_eq!(e2e4.1, 600);
}
