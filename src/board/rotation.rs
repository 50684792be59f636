//! Rotated occupancy boards.
//!
//! Each orientation renumbers the squares so that every line of one kind
//! (rank, file or diagonal) occupies a single byte of the 64-bit word:
//!
//! * `Normal`: index `rank * 8 + file`, one rank per byte.
//! * `Transposed`: index `file * 8 + rank`, one file per byte.
//! * `DiagA1H8`: index `((rank - file) & 7) * 8 + file`. Byte `l` holds the
//!   a1-h8 diagonal with `rank - file == l` followed by the wrapped diagonal
//!   with `rank - file == l - 8`.
//! * `DiagA8H1`: index `((rank + file) & 7) * 8 + file`. Byte `l` holds the
//!   diagonal with `rank + file == l` followed by the one with `rank + file == l + 8`.
//!
//! Position inside a byte is always the file, except for `Transposed` where it is the rank.

use std::ops::BitOr;

use super::types::{Bitboard, Square};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Normal,
    Transposed,
    DiagA1H8,
    DiagA8H1,
}

impl Orientation {
    pub const ALL: [Orientation; 4] =
        [Orientation::Normal, Orientation::Transposed, Orientation::DiagA1H8, Orientation::DiagA8H1];

    pub const fn index(self) -> usize { self as usize }

    /// Ranks and files move rooks, diagonals move bishops.
    pub const fn is_straight(self) -> bool { matches!(self, Orientation::Normal | Orientation::Transposed) }

    pub const fn rotate_square(self, sq: Square) -> u8 {
        let (r, f) = (sq.rank(), sq.file());
        match self {
            Orientation::Normal => r * 8 + f,
            Orientation::Transposed => f * 8 + r,
            Orientation::DiagA1H8 => (r.wrapping_sub(f) & 7) * 8 + f,
            Orientation::DiagA8H1 => ((r + f) & 7) * 8 + f,
        }
    }

    pub const fn unrotate_square(self, idx: u8) -> Square {
        let (line, pos) = ((idx >> 3) & 7, idx & 7);
        match self {
            Orientation::Normal => Square::new(line, pos),
            Orientation::Transposed => Square::new(pos, line),
            Orientation::DiagA1H8 => Square::new((line + pos) & 7, pos),
            Orientation::DiagA8H1 => Square::new(line.wrapping_sub(pos) & 7, pos),
        }
    }

    pub const fn square_bit(self, sq: Square) -> Bitboard { 1u64 << self.rotate_square(sq) }

    /// Bits of byte `line` that lie on the same geometric line as position `pos`.
    pub const fn segment(self, line: u8, pos: u8) -> u8 {
        match self {
            Orientation::Normal | Orientation::Transposed => 0xFF,
            Orientation::DiagA1H8 => {
                let low = low_bits(8 - line);
                if pos < 8 - line { low } else { !low }
            }
            Orientation::DiagA8H1 => {
                let low = low_bits(line + 1);
                if pos <= line { low } else { !low }
            }
        }
    }

    /// Re-indexes a normal bitboard into this orientation.
    pub fn rotate(self, bb: Bitboard) -> Bitboard {
        match self {
            Orientation::Normal => bb,
            Orientation::Transposed => transpose(bb),
            Orientation::DiagA1H8 => shear(bb, u64::rotate_right),
            Orientation::DiagA8H1 => shear(bb, u64::rotate_left),
        }
    }

    /// Inverse of [`Orientation::rotate`].
    pub fn unrotate(self, bb: Bitboard) -> Bitboard {
        match self {
            Orientation::Normal => bb,
            Orientation::Transposed => transpose(bb),
            Orientation::DiagA1H8 => shear(bb, u64::rotate_left),
            Orientation::DiagA8H1 => shear(bb, u64::rotate_right),
        }
    }
}

/// `(1 << n) - 1` for `n` in `0..=8`.
pub const fn low_bits(n: u8) -> u8 { if n >= 8 { 0xFF } else { (1u8 << n) - 1 } }

// Mirror about the a1-h8 diagonal, self-inverse.
fn transpose(mut x: u64) -> u64 {
    const K1: u64 = 0x5500_5500_5500_5500;
    const K2: u64 = 0x3333_0000_3333_0000;
    const K4: u64 = 0x0f0f_0f0f_0000_0000;
    let mut t = K4 & (x ^ (x << 28));
    x ^= t ^ (t >> 28);
    t = K2 & (x ^ (x << 14));
    x ^= t ^ (t >> 14);
    t = K1 & (x ^ (x << 7));
    x ^= t ^ (t >> 7);
    x
}

// Rotates file `f` vertically by `f` ranks, one binary digit of the file at a time.
fn shear(mut x: u64, rot: fn(u64, u32) -> u64) -> u64 {
    const STEPS: [(u64, u32); 3] =
        [(0xAAAA_AAAA_AAAA_AAAA, 8), (0xCCCC_CCCC_CCCC_CCCC, 16), (0xF0F0_F0F0_F0F0_F0F0, 32)];
    for (mask, n) in STEPS {
        x ^= mask & (x ^ rot(x, n));
    }
    x
}

/// The same set of squares kept in all four orientations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Occupancy {
    boards: [Bitboard; 4],
}

impl Occupancy {
    pub const EMPTY: Occupancy = Occupancy { boards: [0; 4] };

    pub fn from_bitboard(bb: Bitboard) -> Self {
        let mut boards = [0; 4];
        for o in Orientation::ALL {
            boards[o.index()] = o.rotate(bb);
        }
        Occupancy { boards }
    }

    #[inline]
    pub fn get(&self, o: Orientation) -> Bitboard { self.boards[o.index()] }

    #[inline]
    pub fn normal(&self) -> Bitboard { self.boards[0] }

    pub fn contains(&self, sq: Square) -> bool { self.normal() & sq.bit() != 0 }

    /// Flips `sq` in every orientation.
    #[inline]
    pub fn toggle(&mut self, sq: Square) {
        for o in Orientation::ALL {
            self.boards[o.index()] ^= o.square_bit(sq);
        }
    }

    /// True when every rotated board describes the normal one.
    pub fn is_consistent(&self) -> bool {
        Orientation::ALL.iter().all(|&o| o.unrotate(self.get(o)) == self.normal())
    }
}

impl BitOr for Occupancy {
    type Output = Occupancy;

    fn bitor(self, rhs: Occupancy) -> Occupancy {
        let mut boards = self.boards;
        for (b, r) in boards.iter_mut().zip(rhs.boards) {
            *b |= r;
        }
        Occupancy { boards }
    }
}
