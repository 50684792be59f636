use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rotachess::board::PositionState;
use rotachess::search::alphabeta::{SearchParams, Searcher};
use rotachess::search::eval::evaluate;

fn bench_search(c: &mut Criterion) {
    let pos = PositionState::startpos();
    c.bench_function("search_depth_4_startpos", |ben| {
        ben.iter(|| {
            let mut p = SearchParams::default();
            p.depth = 4; p.tt_entries = 1 << 16;
            let mut s = Searcher::new(p.clone());
            let mut b = pos.clone();
            let r = s.search_with_params(black_box(&mut b), p);
            black_box(r.nodes)
        })
    });
}

fn bench_qsearch(c: &mut Criterion) {
    let pos = PositionState::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
    let mut s = Searcher::new(SearchParams { tt_entries: 0, use_tt: false, ..Default::default() });
    c.bench_function("qsearch_kiwipete", |ben| {
        ben.iter(|| {
            let mut b = pos.clone();
            black_box(s.qsearch_eval_cp(black_box(&mut b)))
        })
    });
}

fn bench_eval(c: &mut Criterion) {
    let pos = PositionState::startpos();
    c.bench_function("evaluate_startpos", |ben| ben.iter(|| black_box(evaluate(black_box(&pos), None))));
}

criterion_group!(benches, bench_search, bench_qsearch, bench_eval);
criterion_main!(benches);
