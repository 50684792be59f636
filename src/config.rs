use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::board::{MAX_QUIESCENCE_DEPTH, MAX_SEARCH_DEPTH};
use crate::search::eval::MATE_SCORE;
use crate::search::tt::{TranspositionTable, DEFAULT_ENTRIES};

/// Re-searches after which an aspiration bound opens fully.
pub const MAX_ASPIRATION_TRIES: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub depth: u32,
    pub movetime_ms: Option<u64>,
    pub use_tt: bool,
    pub tt_entries: usize,
    pub aspiration_window_cp: i32,
    pub aspiration_delta_cp: i32,
    /// Aspiration windows are used once the iteration depth exceeds this.
    pub aspiration_depth: u32,
    pub aspiration_max_tries: u32,
    pub quiescence_depth: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            depth: 6,
            movetime_ms: None,
            use_tt: true,
            tt_entries: DEFAULT_ENTRIES,
            aspiration_window_cp: 40,
            aspiration_delta_cp: 20,
            aspiration_depth: 5,
            aspiration_max_tries: 5,
            quiescence_depth: MAX_QUIESCENCE_DEPTH as u32,
        }
    }
}

impl SearchParams {
    pub fn movetime(&self) -> Option<Duration> { self.movetime_ms.map(Duration::from_millis) }

    /// Clamps depths to what the undo arena can hold and the aspiration
    /// settings to the score range.
    pub fn normalized(mut self) -> Self {
        self.depth = self.depth.clamp(1, MAX_SEARCH_DEPTH as u32);
        self.quiescence_depth = self.quiescence_depth.min(MAX_QUIESCENCE_DEPTH as u32);
        self.aspiration_window_cp = self.aspiration_window_cp.clamp(1, MATE_SCORE);
        self.aspiration_delta_cp = self.aspiration_delta_cp.clamp(1, MATE_SCORE);
        self.aspiration_max_tries = self.aspiration_max_tries.min(MAX_ASPIRATION_TRIES);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchParams,
    /// Transposition table size in megabytes; overrides `search.tt_entries` when set.
    pub hash_mb: Option<usize>,
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing engine config JSON")
    }

    /// Search parameters with the megabyte table size folded in.
    pub fn resolved_params(&self) -> SearchParams {
        let mut params = self.search.clone();
        if let Some(mb) = self.hash_mb { params.tt_entries = TranspositionTable::entries_for_mb(mb); }
        params.normalized()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in config {}", path.display()))
    }
}
