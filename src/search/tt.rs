use crate::board::MoveInfo;
use crate::search::eval::MAX_EVAL;

pub const DEFAULT_ENTRIES: usize = 1 << 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: u64,
    pub depth: u32,
    pub score: i32,
    pub best: Option<MoveInfo>,
}

/// Direct-mapped table: one slot per index, `key % len`, no probing.
///
/// A hit only means the stored key equals the probe key; colliding positions are not told apart.
#[derive(Clone, Debug)]
pub struct TranspositionTable {
    slots: Vec<Option<Entry>>,
}

impl Default for TranspositionTable {
    fn default() -> Self { Self::with_capacity_entries(DEFAULT_ENTRIES) }
}

impl TranspositionTable {
    pub fn new() -> Self { Self::default() }

    /// A zero capacity gives a disabled table: lookups miss and inserts are dropped.
    pub fn with_capacity_entries(cap: usize) -> Self {
        let mut tt = TranspositionTable { slots: Vec::new() };
        tt.set_capacity_entries(cap);
        tt
    }

    pub fn set_capacity_entries(&mut self, cap: usize) {
        self.slots.clear();
        self.slots.resize(cap, None);
        self.slots.shrink_to_fit();
    }

    pub fn entries_for_mb(mb: usize) -> usize { mb.saturating_mul(1024 * 1024) / std::mem::size_of::<Option<Entry>>() }

    pub fn set_capacity_mb(&mut self, mb: usize) { self.set_capacity_entries(Self::entries_for_mb(mb)); }

    pub fn capacity(&self) -> usize { self.slots.len() }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    #[inline]
    fn index(&self, key: u64) -> Option<usize> {
        if self.slots.is_empty() { return None; }
        Some((key % self.slots.len() as u64) as usize)
    }

    pub fn lookup(&self, key: u64) -> Option<Entry> {
        let idx = self.index(key)?;
        self.slots[idx].filter(|e| e.key == key)
    }

    /// Keeps a same-position occupant that was searched at least as deep; otherwise replaces.
    pub fn insert(&mut self, e: Entry) {
        let Some(idx) = self.index(e.key) else { return };
        let slot = &mut self.slots[idx];
        match slot {
            Some(cur) if cur.key == e.key && cur.depth >= e.depth => {}
            _ => *slot = Some(e),
        }
    }

    pub fn force_insert(&mut self, e: Entry) {
        if let Some(idx) = self.index(e.key) { self.slots[idx] = Some(e); }
    }

    /// Occupied slots.
    pub fn len(&self) -> usize { self.slots.iter().filter(|s| s.is_some()).count() }

    pub fn is_empty(&self) -> bool { self.slots.iter().all(|s| s.is_none()) }
}

/// Mate scores count plies from the root; the table keeps them counted from the
/// stored node so an entry stays right when reached at another ply.
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score > MAX_EVAL {
        score + ply
    } else if score < -MAX_EVAL {
        score - ply
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`] for an entry read back at `ply`.
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score > MAX_EVAL {
        score - ply
    } else if score < -MAX_EVAL {
        score + ply
    } else {
        score
    }
}
