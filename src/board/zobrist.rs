use std::sync::OnceLock;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::types::{CastlingRights, Piece, Square};

const ZOBRIST_SEED: u64 = 0xF00D_F00D_DEAD_BEEF;

/// Most pieces of one kind and color a legal position can hold (two knights plus eight promotions).
pub const MAX_PIECE_COUNT: usize = 10;

pub struct ZobristKeyer {
    piece_square: [[u64; 64]; 12],
    black_to_move: u64,
    en_passant: [u64; 8],
    castling: [u64; 4],
    material: [[u64; MAX_PIECE_COUNT + 1]; 12],
}

static KEYS: OnceLock<ZobristKeyer> = OnceLock::new();

pub fn keys() -> &'static ZobristKeyer { KEYS.get_or_init(ZobristKeyer::generate) }

impl ZobristKeyer {
    fn generate() -> Self {
        let mut rng = SmallRng::seed_from_u64(ZOBRIST_SEED);
        let mut piece_square = [[0u64; 64]; 12];
        for row in piece_square.iter_mut() {
            rng.fill(&mut row[..]);
        }
        let black_to_move = rng.gen();
        let mut en_passant = [0u64; 8];
        rng.fill(&mut en_passant[..]);
        let mut castling = [0u64; 4];
        rng.fill(&mut castling[..]);
        let mut material = [[0u64; MAX_PIECE_COUNT + 1]; 12];
        for row in material.iter_mut() {
            rng.fill(&mut row[..]);
        }
        ZobristKeyer { piece_square, black_to_move, en_passant, castling, material }
    }

    #[inline]
    pub fn piece_square(&self, piece: Piece, sq: Square) -> u64 { self.piece_square[piece.index()][sq.index()] }

    #[inline]
    pub fn black_to_move(&self) -> u64 { self.black_to_move }

    #[inline]
    pub fn en_passant(&self, file: u8) -> u64 { self.en_passant[(file & 7) as usize] }

    /// XOR of the keys of every right held in `rights`.
    pub fn castling(&self, rights: CastlingRights) -> u64 {
        let mut key = 0;
        for (i, k) in self.castling.iter().enumerate() {
            if rights.bits() & (1 << i) != 0 { key ^= k; }
        }
        key
    }

    /// Key toggled when the `n`-th piece of this kind (zero based) appears or disappears.
    #[inline]
    pub fn material(&self, piece: Piece, n: usize) -> u64 { self.material[piece.index()][n.min(MAX_PIECE_COUNT)] }
}
