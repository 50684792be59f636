use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use rotachess::board::PositionState;
use rotachess::config::SearchParams;
use rotachess::search::control::{Countdown, EngineThread, SearchJob};
use rotachess::search::Searcher;

fn params() -> SearchParams { SearchParams { tt_entries: 1 << 16, ..Default::default() } }

#[test]
fn respects_movetime() {
    let mut pos = PositionState::startpos();
    let p = SearchParams { depth: 64, movetime_ms: Some(20), ..params() };
    let mut s = Searcher::new(p.clone());
    let t0 = Instant::now();
    let res = s.search_with_params(&mut pos, p);
    let elapsed = t0.elapsed();
    assert!(res.bestmove.is_some());
    assert!(res.depth < 64, "movetime should stop the search early");
    // The running root move is allowed to finish after the deadline.
    assert!(elapsed < Duration::from_secs(5), "search overran movetime: {:?}", elapsed);
    assert_eq!(pos.ply(), 0);
}

#[test]
fn preset_abort_still_reports_a_move() {
    let mut pos = PositionState::startpos();
    let mut s = Searcher::new(params());
    let flag = Arc::new(AtomicBool::new(true));
    s.set_abort_flag(Arc::clone(&flag));
    let res = s.search_depth(&mut pos, 6);
    assert!(res.best.is_some(), "first root move is searched before the flag is polled");
    assert_eq!(res.depth, 0, "no iteration completed");
    assert_eq!(pos.to_fen(), PositionState::startpos().to_fen());
}

#[test]
fn countdown_raises_flag() {
    let flag = Arc::new(AtomicBool::new(false));
    let _countdown = Countdown::start(Duration::from_millis(10), Arc::clone(&flag));
    let deadline = Instant::now() + Duration::from_secs(5);
    while !flag.load(Ordering::Relaxed) {
        assert!(Instant::now() < deadline, "countdown never fired");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn cancelled_countdown_leaves_flag_alone() {
    let flag = Arc::new(AtomicBool::new(false));
    let t0 = Instant::now();
    let countdown = Countdown::start(Duration::from_secs(30), Arc::clone(&flag));
    countdown.cancel();
    assert!(t0.elapsed() < Duration::from_secs(5), "cancel should wake the timer thread");
    assert!(!flag.load(Ordering::Relaxed));
}

#[test]
fn engine_thread_runs_timed_job() {
    let (tx, rx) = mpsc::channel();
    let engine = EngineThread::spawn(params(), move |res| {
        let _ = tx.send(res);
    });
    let job = SearchJob { pos: PositionState::startpos(), params: SearchParams { depth: 64, movetime_ms: Some(20), ..params() } };
    engine.start(job);
    let res = rx.recv_timeout(Duration::from_secs(10)).expect("search result");
    assert!(res.bestmove.is_some());
    engine.quit();
}

#[test]
fn engine_thread_stops_on_request() {
    let (tx, rx) = mpsc::channel();
    let engine = EngineThread::spawn(params(), move |res| {
        let _ = tx.send(res);
    });
    engine.start(SearchJob { pos: PositionState::startpos(), params: SearchParams { depth: 64, ..params() } });
    thread::sleep(Duration::from_millis(50));
    engine.stop();
    let res = rx.recv_timeout(Duration::from_secs(10)).expect("engine ignored stop");
    assert!(res.best.is_some());
}

#[test]
fn stop_right_after_start_is_not_lost() {
    let (tx, rx) = mpsc::channel();
    let engine = EngineThread::spawn(params(), move |res| {
        let _ = tx.send(res);
    });
    for _ in 0..5 {
        engine.start(SearchJob { pos: PositionState::startpos(), params: SearchParams { depth: 64, ..params() } });
        engine.stop();
        let res = rx.recv_timeout(Duration::from_secs(10)).expect("stop before pickup was dropped");
        assert!(res.best.is_some());
        assert!(res.depth < 64);
    }
    engine.quit();
}

#[test]
fn stale_stop_does_not_cancel_next_job() {
    let (tx, rx) = mpsc::channel();
    let engine = EngineThread::spawn(params(), move |res| {
        let _ = tx.send(res);
    });
    engine.stop();
    engine.start(SearchJob { pos: PositionState::startpos(), params: SearchParams { depth: 3, ..params() } });
    let res = rx.recv_timeout(Duration::from_secs(30)).expect("search result");
    assert_eq!(res.depth, 3);
    engine.quit();
}
