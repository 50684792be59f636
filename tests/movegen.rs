use std::collections::HashSet;

use pretty_assertions::assert_eq;
use rotachess::board::{MoveKind, PositionState};
use rotachess::movegen::{MoveGenerator, MovePicker, SearchType, Stage};

fn uci_set(moves: impl IntoIterator<Item = rotachess::board::MoveInfo>) -> HashSet<String> {
    moves.into_iter().map(|m| m.to_uci()).collect()
}

fn picked(pos: &PositionState, search: SearchType, hash: Option<rotachess::board::MoveInfo>) -> Vec<rotachess::board::MoveInfo> {
    let gen = MoveGenerator::new();
    let mut picker = MovePicker::new(search, hash);
    let mut out = Vec::new();
    while let Some(mv) = picker.next(&gen, pos) {
        out.push(mv);
    }
    assert_eq!(picker.stage(), Stage::Exhausted);
    out
}

#[test]
fn picker_matches_full_generation() {
    let gen = MoveGenerator::new();
    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    ] {
        let pos = PositionState::from_fen(fen).unwrap();
        let all = gen.generate(&pos);
        let staged = picked(&pos, SearchType::for_position(&pos), None);
        assert_eq!(all.len(), staged.len(), "{}", fen);
        assert_eq!(uci_set(all), uci_set(staged));
    }
}

#[test]
fn hash_move_comes_first_and_once() {
    let pos = PositionState::startpos();
    let hash = pos.parse_move("g1f3").unwrap();
    let moves = picked(&pos, SearchType::Usual, Some(hash));
    assert_eq!(moves[0].to_uci(), "g1f3");
    assert_eq!(moves.iter().filter(|m| m.to_uci() == "g1f3").count(), 1);
    assert_eq!(moves.len(), 20);

    // An illegal hash move is skipped.
    let bogus = pos.parse_move("e2e5").unwrap();
    assert_eq!(picked(&pos, SearchType::Usual, Some(bogus)).len(), 20);
}

#[test]
fn captures_are_ordered_by_victim_then_attacker() {
    let pos = PositionState::from_fen("4k3/8/8/3q4/2P1r3/8/5N2/7K w - - 0 1").unwrap();
    let moves = picked(&pos, SearchType::Quiescence, None);
    let order: Vec<String> = moves.iter().map(|m| m.to_uci()).collect();
    assert_eq!(order, vec!["c4d5".to_string(), "f2e4".to_string()], "pawn takes queen first, no quiet moves");
    assert!(moves.iter().all(|m| m.is_capture()));
    assert!(moves[0].value > moves[1].value);
}

#[test]
fn evasions_only_answer_the_check() {
    let pos = PositionState::from_fen("4k3/8/8/8/8/8/3P4/r3K2R w K - 0 1").unwrap();
    assert!(pos.in_check());
    let got = uci_set(picked(&pos, SearchType::Evasion, None));
    let expected: HashSet<String> = ["e1e2", "e1f2"].iter().map(|s| s.to_string()).collect();
    assert_eq!(got, expected);
    assert_eq!(uci_set(MoveGenerator::new().generate(&pos)), expected);
}

#[test]
fn double_check_allows_only_king_moves() {
    let pos = PositionState::from_fen("4k3/8/8/8/8/5n2/8/r3K3 w - - 0 1").unwrap();
    assert!(pos.check_info().double_check());
    let moves = MoveGenerator::new().generate(&pos);
    assert!(!moves.is_empty());
    assert!(moves.iter().all(|m| m.from == pos.king_square(pos.side_to_move())));
}

#[test]
fn castling_and_promotions_are_generated() {
    let gen = MoveGenerator::new();
    let pos = PositionState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let moves = gen.generate(&pos);
    let castles: HashSet<String> = moves.iter().filter(|m| m.kind == MoveKind::Castle).map(|m| m.to_uci()).collect();
    let expected: HashSet<String> = ["e1g1", "e1c1"].iter().map(|s| s.to_string()).collect();
    assert_eq!(castles, expected);

    let pos = PositionState::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let promos: Vec<_> = gen.generate(&pos).into_iter().filter(|m| m.promotion.is_some()).collect();
    assert_eq!(promos.len(), 4);
    assert_eq!(promos[0].to_uci(), "a7a8q", "queen promotion ordered first");
    let q = picked(&pos, SearchType::Quiescence, None);
    assert_eq!(q.len(), 4, "promotions belong to the capture stage");
}

#[test]
fn pinned_pieces_stay_on_the_line() {
    let pos = PositionState::from_fen("4k3/4r3/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
    let rook_moves: HashSet<String> =
        MoveGenerator::new().generate(&pos).into_iter().filter(|m| m.from.to_string() == "e2").map(|m| m.to_uci()).collect();
    let expected: HashSet<String> = ["e2e3", "e2e4", "e2e5", "e2e6", "e2e7"].iter().map(|s| s.to_string()).collect();
    assert_eq!(rook_moves, expected);
    assert_eq!(pos.check_info().pins().len(), 1);
}

#[test]
fn checkmate_and_stalemate_have_no_moves() {
    let gen = MoveGenerator::new();
    let mate = PositionState::from_fen("R5k1/5ppp/8/8/8/8/8/7K b - - 0 1").unwrap();
    assert!(mate.in_check());
    assert!(!gen.has_legal_move(&mate));
    let stale = PositionState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(!stale.in_check());
    assert!(!gen.has_legal_move(&stale));
}
