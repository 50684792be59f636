use rotachess::board::{MoveInfo, Square};
use rotachess::search::eval::{MATE_SCORE, MAX_EVAL};
use rotachess::search::tt::{score_from_tt, score_to_tt, Entry, TranspositionTable};

fn entry(key: u64, depth: u32, score: i32) -> Entry { Entry { key, depth, score, best: None } }

#[test]
fn tt_respects_capacity() {
    let mut tt = TranspositionTable::with_capacity_entries(8);
    for key in 0..200u64 {
        tt.insert(entry(key.wrapping_mul(0x9E37_79B9_7F4A_7C15), 1, key as i32));
    }
    assert!(tt.len() <= 8, "tt size {} exceeds capacity", tt.len());
    assert_eq!(tt.capacity(), 8);
    tt.clear();
    assert!(tt.is_empty());
}

#[test]
fn deeper_entry_survives_shallow_insert() {
    let mut tt = TranspositionTable::with_capacity_entries(64);
    let best = Some(MoveInfo::new(Square::E1, Square::E8));
    tt.insert(Entry { key: 5, depth: 4, score: 30, best });
    tt.insert(entry(5, 2, -10));
    assert_eq!(tt.lookup(5), Some(Entry { key: 5, depth: 4, score: 30, best }));
    tt.insert(entry(5, 6, 12));
    assert_eq!(tt.lookup(5).map(|e| (e.depth, e.score)), Some((6, 12)));
    tt.force_insert(entry(5, 0, 99));
    assert_eq!(tt.lookup(5).map(|e| (e.depth, e.score)), Some((0, 99)));
}

#[test]
fn colliding_key_replaces_occupant() {
    let mut tt = TranspositionTable::with_capacity_entries(16);
    tt.insert(entry(3, 9, 1));
    tt.insert(entry(3 + 16, 1, 2));
    assert_eq!(tt.lookup(3), None, "a different key in the slot is a miss");
    assert_eq!(tt.lookup(19).map(|e| e.score), Some(2));
}

#[test]
fn zero_capacity_disables_table() {
    let mut tt = TranspositionTable::with_capacity_entries(0);
    tt.insert(entry(1, 1, 1));
    tt.force_insert(entry(1, 1, 1));
    assert_eq!(tt.lookup(1), None);
    assert!(tt.is_empty());
}

#[test]
fn megabyte_sizing() {
    let mut tt = TranspositionTable::with_capacity_entries(1);
    tt.set_capacity_mb(1);
    assert_eq!(tt.capacity(), TranspositionTable::entries_for_mb(1));
    assert!(tt.capacity() > 1000);
}

#[test]
fn mate_scores_are_stored_relative_to_the_node() {
    // Mate found 5 plies below a node sitting at ply 3.
    let at_root = MATE_SCORE - 8;
    let stored = score_to_tt(at_root, 3);
    assert_eq!(stored, MATE_SCORE - 5);
    assert_eq!(score_from_tt(stored, 3), at_root);
    // Reached at ply 1 instead, the mate is two plies closer to the root.
    assert_eq!(score_from_tt(stored, 1), MATE_SCORE - 6);
    assert_eq!(score_from_tt(score_to_tt(-at_root, 3), 1), -(MATE_SCORE - 6));
    for plain in [0, 250, -MAX_EVAL, MAX_EVAL] {
        assert_eq!(score_to_tt(plain, 7), plain);
        assert_eq!(score_from_tt(plain, 7), plain);
    }
}
