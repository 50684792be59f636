use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rotachess::board::PositionState;
use rotachess::movegen::MoveGenerator;
use rotachess::search::eval::{
    evaluate, evaluate_cached, evaluate_white, material_eval_cp_side_agnostic, phase, terminal_score, EvalBreakdown,
    MaterialEntry, MaterialTable, MATE_SCORE,
};
use rotachess::search::Searcher;

fn eval_fen(fen: &str) -> i32 {
    let pos = PositionState::from_fen(fen).expect("valid fen");
    evaluate_white(&pos, None)
}

#[test]
fn knight_center_vs_rim() {
    let center = eval_fen("k7/8/8/8/3N4/8/8/7K w - - 0 1");
    let rim = eval_fen("k7/8/8/8/8/8/8/N6K w - - 0 1");
    assert!(center > rim, "center {} should beat rim {}", center, rim);
}

#[test]
fn pawn_advancement_bonus() {
    let e4 = eval_fen("k7/8/8/8/4P3/8/8/7K w - - 0 1");
    let e2 = eval_fen("k7/8/8/8/8/8/4P3/7K w - - 0 1");
    assert!(e4 > e2, "advanced pawn {} should beat home pawn {}", e4, e2);
}

#[test]
fn symmetric_start_is_balanced() {
    let pos = PositionState::startpos();
    let mut b = EvalBreakdown::default();
    assert_eq!(evaluate_white(&pos, Some(&mut b)), 0);
    assert_eq!(b.material, 0);
    assert_eq!(b.phase, 24);
    assert_eq!(b.total, 0);
    assert_eq!(phase(&pos), 24);
}

#[test]
fn perspective_flips_with_side_to_move() {
    let w = PositionState::from_fen("k7/8/8/8/3N4/8/8/7K w - - 0 1").unwrap();
    let b = PositionState::from_fen("k7/8/8/8/3N4/8/8/7K b - - 0 1").unwrap();
    assert_eq!(evaluate(&w, None), evaluate_white(&w, None));
    assert_eq!(evaluate(&b, None), -evaluate_white(&b, None));
    assert_eq!(material_eval_cp_side_agnostic(&b), 320);
}

#[test]
fn breakdown_terms_add_up() {
    let pos = PositionState::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
    let mut b = EvalBreakdown::default();
    let total = evaluate_white(&pos, Some(&mut b));
    assert_eq!(total, b.total);
    assert_eq!(b.total, b.material + b.pst + b.mobility);
    assert!((0..=24).contains(&b.phase));
}

#[test]
fn mate_scores_prefer_shorter_mates() {
    assert_eq!(terminal_score(false, 7), 0);
    assert_eq!(terminal_score(true, 0), -MATE_SCORE);
    assert!(terminal_score(true, 3) < terminal_score(true, 5));
}

#[test]
fn incremental_pst_tracks_moves_and_undo() {
    let gen = MoveGenerator::new();
    let mut rng = SmallRng::seed_from_u64(7);
    let mut pos = PositionState::from_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1").unwrap();
    let start = (pos.pst_mg(), pos.pst_eg());
    assert_eq!(start, pos.compute_pst());
    let mut played = 0;
    for _ in 0..50 {
        let moves = gen.generate(&pos);
        let Some(&mv) = moves.choose(&mut rng) else { break };
        pos.make_move(mv).unwrap();
        played += 1;
        assert_eq!((pos.pst_mg(), pos.pst_eg()), pos.compute_pst(), "after {}", mv);
    }
    for _ in 0..played {
        pos.undo_move().unwrap();
    }
    assert_eq!((pos.pst_mg(), pos.pst_eg()), start);
}

#[test]
fn material_cache_matches_direct_evaluation() {
    let mut table = MaterialTable::default();
    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R b KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "k7/8/8/8/3N4/8/8/7K b - - 0 1",
    ] {
        let pos = PositionState::from_fen(fen).unwrap();
        assert_eq!(table.lookup(pos.material_key()), None);
        assert_eq!(evaluate_cached(&pos, &mut table), evaluate(&pos, None), "{}", fen);
        assert_eq!(table.lookup(pos.material_key()), Some(MaterialEntry::compute(&pos)));
        // The second call is served from the table.
        assert_eq!(evaluate_cached(&pos, &mut table), evaluate(&pos, None));
    }
}

#[test]
fn positions_with_equal_material_share_an_entry() {
    let a = PositionState::from_fen("k7/8/8/8/3N4/8/8/7K w - - 0 1").unwrap();
    let b = PositionState::from_fen("k7/8/8/8/8/8/8/N6K b - - 0 1").unwrap();
    assert_eq!(a.material_key(), b.material_key());
    let mut table = MaterialTable::with_capacity_entries(16);
    let entry = table.fetch(&a);
    assert_eq!(table.fetch(&b), entry);
    assert_eq!(entry.material, 320);
    table.clear();
    assert_eq!(table.lookup(a.material_key()), None);
}

#[test]
fn search_fills_material_cache() {
    let mut pos = PositionState::startpos();
    let mut s = Searcher::default();
    s.search_depth(&mut pos, 2);
    assert!(s.materials().lookup(pos.material_key()).is_some());
}
