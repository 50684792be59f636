use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SquareError {
    #[error("invalid square notation: {0:?}")]
    Notation(String),
    #[error("square index {0} out of range")]
    Index(usize),
}

/// Reasons a FEN string or piece list is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected 4 to 6 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid piece placement: {0}")]
    Placement(String),
    #[error("invalid side to move: {0:?}")]
    SideToMove(String),
    #[error("invalid castling field: {0:?}")]
    Castling(String),
    #[error("invalid en passant field: {0:?}")]
    EnPassant(String),
    #[error("invalid move counter: {0:?}")]
    Counter(String),
    #[error("impossible position: {0}")]
    Impossible(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("cannot parse move {0:?}")]
    Parse(String),
    #[error("illegal move {0}")]
    Illegal(String),
    #[error("no move to undo")]
    NoHistory,
    #[error("undo history is full ({0} plies)")]
    HistoryFull(usize),
}
