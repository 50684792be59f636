use std::fmt;

use super::types::{PieceKind, Square};

/// Text sent when there is no move to report.
pub const NULL_MOVE: &str = "0000";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MoveKind {
    #[default]
    Normal,
    Capture,
    /// Any pawn move reaching the last rank, capturing or not.
    Promotion,
    Castle,
    /// Double pawn push that opens an en passant target.
    EnPassantPush,
    EnPassantCapture,
}

/// A move plus the classification and ordering value the generator gave it.
///
/// Castling is stored as the king moving onto its own rook's square; it is
/// printed in the usual king-two-squares notation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MoveInfo {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub kind: MoveKind,
    pub value: i32,
}

impl MoveInfo {
    pub fn new(from: Square, to: Square) -> Self { MoveInfo { from, to, ..Default::default() } }

    pub fn with_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        MoveInfo { from, to, promotion: Some(promotion), ..Default::default() }
    }

    /// Same squares and promotion, ignoring classification and ordering value.
    pub fn same_move(&self, other: &MoveInfo) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    pub fn is_capture(&self) -> bool {
        matches!(self.kind, MoveKind::Capture | MoveKind::EnPassantCapture)
    }

    /// Destination in coordinate notation: castling moves land two files from the king.
    pub fn display_to(&self) -> Square {
        if self.kind != MoveKind::Castle { return self.to; }
        let file = if self.to.file() > self.from.file() { 6 } else { 2 };
        Square::new(self.from.rank(), file)
    }

    pub fn to_uci(&self) -> String {
        let mut s = format!("{}{}", self.from, self.display_to());
        if let Some(p) = self.promotion { s.push(p.to_char()); }
        s
    }
}

impl fmt::Display for MoveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_uci()) }
}

pub fn format_move(mv: Option<&MoveInfo>) -> String { mv.map_or_else(|| NULL_MOVE.to_string(), |m| m.to_uci()) }
