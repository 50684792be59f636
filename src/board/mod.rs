//! Board representation: rotated occupancy, attack tables, keys and the mutable position.

pub mod attacks;
pub mod fen;
pub mod moves;
pub mod position;
pub mod pst;
pub mod rotation;
pub mod types;
pub mod zobrist;

pub use attacks::{tables, AttackTables, Direction, PinInfo, RaySide};
pub use fen::START_FEN;
pub use moves::{format_move, MoveInfo, MoveKind, NULL_MOVE};
pub use position::{CheckInfo, PositionState, UndoRecord, MAX_QUIESCENCE_DEPTH, MAX_SEARCH_DEPTH, UNDO_CAPACITY};
pub use pst::pst_value;
pub use rotation::{Occupancy, Orientation};
pub use types::{squares, Bitboard, CastleSide, CastlingRights, Color, Piece, PieceKind, Square};
pub use zobrist::{keys, ZobristKeyer};
