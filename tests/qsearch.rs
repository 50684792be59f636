use rotachess::board::PositionState;
use rotachess::config::SearchParams;
use rotachess::search::eval::eval_cp;
use rotachess::search::Searcher;

fn searcher() -> Searcher { Searcher::new(SearchParams { tt_entries: 1 << 14, ..Default::default() }) }

#[test]
fn quiet_position_keeps_static_eval() {
    let mut pos = PositionState::startpos();
    let mut s = searcher();
    assert_eq!(s.qsearch_eval_cp(&mut pos), eval_cp(&pos));
}

#[test]
fn hanging_queen_is_taken() {
    for fen in ["k7/8/8/8/8/8/3qQ3/7K w - - 0 1", "k7/8/8/8/8/8/3qQ3/7K b - - 0 1"] {
        let mut pos = PositionState::from_fen(fen).unwrap();
        let stand = eval_cp(&pos);
        let q = searcher().qsearch_eval_cp(&mut pos);
        assert!(q >= stand + 500, "{}: qsearch {} vs static {}", fen, q, stand);
        assert_eq!(pos.to_fen(), fen);
    }
}

#[test]
fn defended_piece_is_not_won() {
    // Rxd5 exd5 loses the exchange, so standing pat is best.
    let fen = "4k3/8/4p3/3n4/8/8/8/3RK3 w - - 0 1";
    let mut pos = PositionState::from_fen(fen).unwrap();
    let stand = eval_cp(&pos);
    assert_eq!(searcher().qsearch_eval_cp(&mut pos), stand);
}

#[test]
fn qsearch_counts_nodes() {
    let mut pos = PositionState::from_fen("4k3/8/8/3q4/2P1r3/8/5N2/7K w - - 0 1").unwrap();
    let mut s = searcher();
    s.qsearch_eval_cp(&mut pos);
    assert!(s.nodes() >= 3, "root plus at least two captures, got {}", s.nodes());
}
