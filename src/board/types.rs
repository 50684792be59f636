use std::fmt;
use std::ops::Not;
use std::str::FromStr;

use crate::error::SquareError;

/// One bit per square, a1 = bit 0, h8 = bit 63.
pub type Bitboard = u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square(0);
    pub const B1: Square = Square(1);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A8: Square = Square(56);
    pub const B8: Square = Square(57);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);

    pub const fn new(rank: u8, file: u8) -> Self { Square(((rank & 7) << 3) | (file & 7)) }

    pub fn from_index(index: usize) -> Result<Self, SquareError> {
        if index < 64 { Ok(Square(index as u8)) } else { Err(SquareError::Index(index)) }
    }

    pub const fn index(self) -> usize { self.0 as usize }
    pub const fn rank(self) -> u8 { self.0 >> 3 }
    pub const fn file(self) -> u8 { self.0 & 7 }
    pub const fn bit(self) -> Bitboard { 1u64 << self.0 }

    /// Square `delta` indices away, if still on the board. Only meaningful for vertical steps.
    pub fn offset(self, delta: i8) -> Option<Square> {
        let idx = self.0 as i16 + delta as i16;
        (0..64).contains(&idx).then(|| Square(idx as u8))
    }

    pub fn all() -> impl Iterator<Item = Square> { (0u8..64).map(Square) }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, (b'1' + self.rank()) as char)
    }
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = s.as_bytes();
        if b.len() != 2 || !(b'a'..=b'h').contains(&b[0]) || !(b'1'..=b'8').contains(&b[1]) {
            return Err(SquareError::Notation(s.to_string()));
        }
        Ok(Square::new(b[1] - b'1', b[0] - b'a'))
    }
}

/// Iterates the squares of a bitboard from a1 upwards.
#[derive(Clone, Copy, Debug)]
pub struct SquareIter(Bitboard);

impl Iterator for SquareIter {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 { return None; }
        let sq = Square(self.0.trailing_zeros() as u8);
        self.0 &= self.0 - 1;
        Some(sq)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

pub fn squares(bb: Bitboard) -> SquareIter { SquareIter(bb) }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const BOTH: [Color; 2] = [Color::White, Color::Black];

    pub const fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] =
        [PieceKind::Pawn, PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen, PieceKind::King];
    /// Promotion choices, strongest first.
    pub const PROMOTIONS: [PieceKind; 4] = [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];

    pub const fn index(self) -> usize { self as usize }

    /// Material value in centipawns; the king is not counted.
    pub const fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 100,
            PieceKind::Knight => 320,
            PieceKind::Bishop => 330,
            PieceKind::Rook => 500,
            PieceKind::Queen => 900,
            PieceKind::King => 0,
        }
    }

    pub const fn is_promotion_target(self) -> bool {
        matches!(self, PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)
    }

    pub const fn is_slider(self) -> bool { matches!(self, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen) }

    pub fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self { Piece { color, kind } }

    /// Dense index in `0..12`, white pieces first.
    pub const fn index(self) -> usize { self.color.index() * 6 + self.kind.index() }

    pub fn all() -> impl Iterator<Item = Piece> {
        Color::BOTH.into_iter().flat_map(|c| PieceKind::ALL.into_iter().map(move |k| Piece::new(c, k)))
    }

    pub fn fen_char(self) -> char {
        let c = self.kind.to_char();
        if self.color == Color::White { c.to_ascii_uppercase() } else { c }
    }

    pub fn from_fen_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_char(c)?;
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        Some(Piece::new(color, kind))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastleSide {
    King,
    Queen,
}

/// Four castling right flags packed in the low nibble.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    pub const fn flag(color: Color, side: CastleSide) -> u8 {
        let base = match side {
            CastleSide::King => 1,
            CastleSide::Queen => 2,
        };
        match color {
            Color::White => base,
            Color::Black => base << 2,
        }
    }

    pub const fn from_bits(bits: u8) -> Self { CastlingRights(bits & 0b1111) }
    pub const fn bits(self) -> u8 { self.0 }
    pub const fn is_empty(self) -> bool { self.0 == 0 }
    pub const fn has(self, color: Color, side: CastleSide) -> bool { self.0 & Self::flag(color, side) != 0 }
    pub fn insert(&mut self, color: Color, side: CastleSide) { self.0 |= Self::flag(color, side); }
    pub fn remove(&mut self, color: Color, side: CastleSide) { self.0 &= !Self::flag(color, side); }
    pub const fn intersect(self, mask: u8) -> Self { CastlingRights(self.0 & mask) }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() { return f.write_str("-"); }
        for (color, side, c) in [
            (Color::White, CastleSide::King, 'K'),
            (Color::White, CastleSide::Queen, 'Q'),
            (Color::Black, CastleSide::King, 'k'),
            (Color::Black, CastleSide::Queen, 'q'),
        ] {
            if self.has(color, side) { write!(f, "{}", c)?; }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_notation() {
        let sq: Square = "e4".parse().unwrap();
        assert_eq!(sq.rank(), 3);
        assert_eq!(sq.file(), 4);
        assert_eq!(sq.to_string(), "e4");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
    }

    #[test]
    fn square_iter_visits_each_bit() {
        let got: Vec<Square> = squares(Square::A1.bit() | Square::H8.bit() | Square::E1.bit()).collect();
        assert_eq!(got, vec![Square::A1, Square::E1, Square::H8]);
    }

    #[test]
    fn castling_rights_display() {
        let mut r = CastlingRights::ALL;
        assert_eq!(r.to_string(), "KQkq");
        r.remove(Color::White, CastleSide::Queen);
        r.remove(Color::Black, CastleSide::King);
        assert_eq!(r.to_string(), "Kq");
        assert_eq!(CastlingRights::NONE.to_string(), "-");
    }
}
