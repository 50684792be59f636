//! Precomputed attack tables.
//!
//! Sliding attacks are looked up by `(square, line pattern)` where the pattern
//! is the byte of the rotated occupancy holding the square's line. Every table
//! stores normal-coordinate bitboards, so callers never see rotated indices.

use std::sync::OnceLock;

use log::debug;

use super::rotation::{low_bits, Occupancy, Orientation};
use super::types::{Bitboard, Color, Square};

const PATTERNS: usize = 256;

// Leaper seeds: the pattern for one reference square, shifted to the target
// square. Edge files get their own seeds so shifting never wraps.
const KNIGHT_C3: (Bitboard, u8) = (0x0000_000A_1100_110A, 18);
const KNIGHT_A3: (Bitboard, u8) = (0x0000_0002_0400_0402, 16);
const KNIGHT_B3: (Bitboard, u8) = (0x0000_0005_0800_0805, 17);
const KNIGHT_G3: (Bitboard, u8) = (0x0000_00A0_1000_10A0, 22);
const KNIGHT_H3: (Bitboard, u8) = (0x0000_0040_2000_2040, 23);
const KING_B2: (Bitboard, u8) = (0x0000_0000_0007_0507, 9);
const KING_A2: (Bitboard, u8) = (0x0000_0000_0003_0203, 8);
const KING_H2: (Bitboard, u8) = (0x0000_0000_00C0_40C0, 15);
const WHITE_PAWN_B2: (Bitboard, u8) = (0x0000_0000_0005_0000, 9);
const WHITE_PAWN_A2: (Bitboard, u8) = (0x0000_0000_0002_0000, 8);
const WHITE_PAWN_H2: (Bitboard, u8) = (0x0000_0000_0040_0000, 15);
const BLACK_PAWN_G7: (Bitboard, u8) = (0x0000_A000_0000_0000, 54);
const BLACK_PAWN_A7: (Bitboard, u8) = (0x0000_0200_0000_0000, 48);
const BLACK_PAWN_H7: (Bitboard, u8) = (0x0000_4000_0000_0000, 55);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];
    pub const STRAIGHT: [Direction; 4] = [Direction::North, Direction::South, Direction::East, Direction::West];
    pub const DIAGONAL: [Direction; 4] =
        [Direction::NorthEast, Direction::NorthWest, Direction::SouthEast, Direction::SouthWest];

    pub const fn index(self) -> usize { self as usize }

    const fn step(self) -> (i8, i8) {
        match self {
            Direction::North => (1, 0),
            Direction::South => (-1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
            Direction::NorthEast => (1, 1),
            Direction::NorthWest => (1, -1),
            Direction::SouthEast => (-1, 1),
            Direction::SouthWest => (-1, -1),
        }
    }
}

/// Squares reached from a square walking one direction, nearest first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ray {
    squares: [Square; 7],
    len: u8,
}

impl Ray {
    pub fn as_slice(&self) -> &[Square] { &self.squares[..self.len as usize] }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaySide {
    /// West on ranks, south on files, south-west on a1-h8 and north-west on a8-h1 diagonals.
    Lower,
    Upper,
}

impl RaySide {
    pub const BOTH: [RaySide; 2] = [RaySide::Lower, RaySide::Upper];
}

/// Nearest blockers on both sides of a square along one line.
///
/// A ray runs from the square (exclusive) up to and including its blocker, or
/// to the board edge when there is none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinInfo {
    pub lower: Option<Square>,
    pub upper: Option<Square>,
    pub lower_ray: Bitboard,
    pub upper_ray: Bitboard,
}

impl PinInfo {
    pub const EMPTY: PinInfo = PinInfo { lower: None, upper: None, lower_ray: 0, upper_ray: 0 };

    pub fn blocker(&self, side: RaySide) -> Option<Square> {
        match side {
            RaySide::Lower => self.lower,
            RaySide::Upper => self.upper,
        }
    }

    pub fn ray(&self, side: RaySide) -> Bitboard {
        match side {
            RaySide::Lower => self.lower_ray,
            RaySide::Upper => self.upper_ray,
        }
    }

    pub fn attacks(&self) -> Bitboard { self.lower_ray | self.upper_ray }
}

pub struct AttackTables {
    lines: [Box<[Bitboard]>; 4],
    pins: [Box<[PinInfo]>; 4],
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
    between: Box<[Bitboard]>,
    rays: [[Ray; 8]; 64],
}

static TABLES: OnceLock<AttackTables> = OnceLock::new();

/// Process-wide tables, built on first use.
pub fn tables() -> &'static AttackTables { TABLES.get_or_init(AttackTables::build) }

fn shift(pattern: Bitboard, delta: i32) -> Bitboard {
    if delta >= 0 { pattern << delta } else { pattern >> -delta }
}

fn seeded(sq: Square, seed: (Bitboard, u8)) -> Bitboard { shift(seed.0, sq.index() as i32 - seed.1 as i32) }

fn byte_to_squares(o: Orientation, line: u8, bits: u8) -> Bitboard {
    let mut bb = 0;
    for pos in 0..8u8 {
        if bits & (1 << pos) != 0 {
            bb |= o.unrotate_square(line * 8 + pos).bit();
        }
    }
    bb
}

fn compute_pin_entry(o: Orientation, sq: Square, pattern: u8) -> PinInfo {
    let rot = o.rotate_square(sq);
    let (line, pos) = (rot >> 3, rot & 7);
    if pattern & (1 << pos) == 0 {
        return PinInfo::EMPTY;
    }
    let seg = o.segment(line, pos);
    let occ = pattern & seg;
    let below = occ & low_bits(pos);
    let above = occ & !low_bits(pos + 1);
    let lower = (below != 0).then(|| 7 - below.leading_zeros() as u8);
    let upper = (above != 0).then(|| above.trailing_zeros() as u8);
    let lower_bits = low_bits(pos) & !low_bits(lower.unwrap_or(0)) & seg;
    let upper_bits = !low_bits(pos + 1) & low_bits(upper.map_or(8, |u| u + 1)) & seg;
    PinInfo {
        lower: lower.map(|p| o.unrotate_square(line * 8 + p)),
        upper: upper.map(|p| o.unrotate_square(line * 8 + p)),
        lower_ray: byte_to_squares(o, line, lower_bits),
        upper_ray: byte_to_squares(o, line, upper_bits),
    }
}

impl AttackTables {
    fn build() -> Self {
        let mut lines: [Box<[Bitboard]>; 4] = std::array::from_fn(|_| vec![0; 64 * PATTERNS].into_boxed_slice());
        let mut pins: [Box<[PinInfo]>; 4] =
            std::array::from_fn(|_| vec![PinInfo::EMPTY; 64 * PATTERNS].into_boxed_slice());
        for o in Orientation::ALL {
            for sq in Square::all() {
                for pattern in 0..PATTERNS {
                    let info = compute_pin_entry(o, sq, pattern as u8);
                    lines[o.index()][sq.index() * PATTERNS + pattern] = info.attacks();
                    pins[o.index()][sq.index() * PATTERNS + pattern] = info;
                }
            }
        }

        let mut knight = [0; 64];
        let mut king = [0; 64];
        let mut pawn = [[0; 64]; 2];
        for sq in Square::all() {
            let i = sq.index();
            knight[i] = match sq.file() {
                0 => seeded(sq, KNIGHT_A3),
                1 => seeded(sq, KNIGHT_B3),
                6 => seeded(sq, KNIGHT_G3),
                7 => seeded(sq, KNIGHT_H3),
                _ => seeded(sq, KNIGHT_C3),
            };
            king[i] = match sq.file() {
                0 => seeded(sq, KING_A2),
                7 => seeded(sq, KING_H2),
                _ => seeded(sq, KING_B2),
            };
            pawn[Color::White.index()][i] = match sq.file() {
                0 => seeded(sq, WHITE_PAWN_A2),
                7 => seeded(sq, WHITE_PAWN_H2),
                _ => seeded(sq, WHITE_PAWN_B2),
            };
            pawn[Color::Black.index()][i] = match sq.file() {
                0 => seeded(sq, BLACK_PAWN_A7),
                7 => seeded(sq, BLACK_PAWN_H7),
                _ => seeded(sq, BLACK_PAWN_G7),
            };
        }

        let mut rays = [[Ray::default(); 8]; 64];
        let mut between = vec![0; 64 * 64].into_boxed_slice();
        for sq in Square::all() {
            for dir in Direction::ALL {
                let (dr, df) = dir.step();
                let ray = &mut rays[sq.index()][dir.index()];
                let (mut r, mut f) = (sq.rank() as i8 + dr, sq.file() as i8 + df);
                let mut passed = 0;
                while (0..8).contains(&r) && (0..8).contains(&f) {
                    let to = Square::new(r as u8, f as u8);
                    ray.squares[ray.len as usize] = to;
                    ray.len += 1;
                    between[sq.index() * 64 + to.index()] = passed;
                    passed |= to.bit();
                    r += dr;
                    f += df;
                }
            }
        }

        debug!("attack tables built: {} line entries per orientation", 64 * PATTERNS);
        AttackTables { lines, pins, knight, king, pawn, between, rays }
    }

    #[inline]
    fn line_index(o: Orientation, sq: Square, occ: Bitboard) -> usize {
        let rot = o.rotate_square(sq);
        let pattern = ((occ >> (rot & !7)) & 0xFF) | (1 << (rot & 7));
        sq.index() * PATTERNS + pattern as usize
    }

    /// Raw table entry for `pattern`; zero when the pattern does not contain `sq` itself.
    pub fn line_entry(&self, o: Orientation, sq: Square, pattern: u8) -> Bitboard {
        self.lines[o.index()][sq.index() * PATTERNS + pattern as usize]
    }

    pub fn pin_entry(&self, o: Orientation, sq: Square, pattern: u8) -> &PinInfo {
        &self.pins[o.index()][sq.index() * PATTERNS + pattern as usize]
    }

    #[inline]
    pub fn line_attacks(&self, o: Orientation, sq: Square, occ: &Occupancy) -> Bitboard {
        self.lines[o.index()][Self::line_index(o, sq, occ.get(o))]
    }

    #[inline]
    pub fn pin_info(&self, o: Orientation, sq: Square, occ: &Occupancy) -> &PinInfo {
        &self.pins[o.index()][Self::line_index(o, sq, occ.get(o))]
    }

    pub fn rook_attacks(&self, sq: Square, occ: &Occupancy) -> Bitboard {
        self.line_attacks(Orientation::Normal, sq, occ) | self.line_attacks(Orientation::Transposed, sq, occ)
    }

    pub fn bishop_attacks(&self, sq: Square, occ: &Occupancy) -> Bitboard {
        self.line_attacks(Orientation::DiagA1H8, sq, occ) | self.line_attacks(Orientation::DiagA8H1, sq, occ)
    }

    pub fn queen_attacks(&self, sq: Square, occ: &Occupancy) -> Bitboard {
        self.rook_attacks(sq, occ) | self.bishop_attacks(sq, occ)
    }

    #[inline]
    pub fn knight(&self, sq: Square) -> Bitboard { self.knight[sq.index()] }

    #[inline]
    pub fn king(&self, sq: Square) -> Bitboard { self.king[sq.index()] }

    /// Squares a `color` pawn on `sq` attacks. Read backwards, the squares an
    /// enemy pawn must stand on to attack `sq`.
    #[inline]
    pub fn pawn_attacks(&self, color: Color, sq: Square) -> Bitboard { self.pawn[color.index()][sq.index()] }

    /// Squares strictly between two squares sharing a line, zero otherwise.
    pub fn between(&self, a: Square, b: Square) -> Bitboard { self.between[a.index() * 64 + b.index()] }

    pub fn ray(&self, sq: Square, dir: Direction) -> &[Square] { self.rays[sq.index()][dir.index()].as_slice() }
}

/// Squares attacked from `sq` by a slider walking `dirs`, stopping at the first occupied square.
pub fn walk_attacks(sq: Square, dirs: &[Direction], occ: Bitboard) -> Bitboard {
    let t = tables();
    let mut bb = 0;
    for &dir in dirs {
        for &to in t.ray(sq, dir) {
            bb |= to.bit();
            if occ & to.bit() != 0 {
                break;
            }
        }
    }
    bb
}
