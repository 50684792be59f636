use super::position::{validate_placement, PositionState, Setup};
use super::types::{CastleSide, CastlingRights, Color, Piece, Square};
use crate::error::FenError;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn parse_placement(field: &str) -> Result<Vec<(Square, Piece)>, FenError> {
    let rows: Vec<&str> = field.split('/').collect();
    if rows.len() != 8 {
        return Err(FenError::Placement(format!("expected 8 ranks, found {}", rows.len())));
    }
    let mut placement = Vec::with_capacity(32);
    for (i, row) in rows.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in row.chars() {
            if let Some(d) = c.to_digit(10) {
                if !(1..=8).contains(&d) {
                    return Err(FenError::Placement(format!("bad empty run {:?} on rank {}", c, rank + 1)));
                }
                file += d as u8;
            } else {
                let piece = Piece::from_fen_char(c)
                    .ok_or_else(|| FenError::Placement(format!("bad piece letter {:?}", c)))?;
                if file >= 8 {
                    return Err(FenError::Placement(format!("rank {} is wider than 8 squares", rank + 1)));
                }
                placement.push((Square::new(rank, file), piece));
                file += 1;
            }
            if file > 8 {
                return Err(FenError::Placement(format!("rank {} is wider than 8 squares", rank + 1)));
            }
        }
        if file != 8 {
            return Err(FenError::Placement(format!("rank {} has {} squares", rank + 1, file)));
        }
    }
    Ok(placement)
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::NONE;
    if field == "-" { return Ok(rights); }
    let err = || FenError::Castling(field.to_string());
    if field.is_empty() { return Err(err()); }
    for c in field.chars() {
        let (color, side) = match c {
            'K' => (Color::White, CastleSide::King),
            'Q' => (Color::White, CastleSide::Queen),
            'k' => (Color::Black, CastleSide::King),
            'q' => (Color::Black, CastleSide::Queen),
            _ => return Err(err()),
        };
        if rights.has(color, side) { return Err(err()); }
        rights.insert(color, side);
    }
    Ok(rights)
}

fn parse_counter(field: Option<&&str>, default: u16) -> Result<u16, FenError> {
    match field {
        None => Ok(default),
        Some(s) => s.parse::<u16>().map_err(|_| FenError::Counter(s.to_string())),
    }
}

impl PositionState {
    /// Parses a six-field position string; the two move counters may be omitted.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::FieldCount(fields.len()));
        }
        let placement = parse_placement(fields[0])?;
        let side = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };
        let castling = parse_castling(fields[2])?;
        let en_passant = match fields[3] {
            "-" => None,
            text => {
                let sq: Square = text.parse().map_err(|_| FenError::EnPassant(text.to_string()))?;
                let expected_rank = if side == Color::White { 5 } else { 2 };
                if sq.rank() != expected_rank {
                    return Err(FenError::EnPassant(text.to_string()));
                }
                Some(sq.file())
            }
        };
        let halfmove_clock = parse_counter(fields.get(4), 0)?;
        let fullmove_number = parse_counter(fields.get(5), 1)?;
        if fullmove_number == 0 {
            return Err(FenError::Counter("0".to_string()));
        }
        validate_placement(&placement)?;
        let pos = PositionState::assemble(
            &placement,
            Setup { side, castling, en_passant, halfmove_clock, fullmove_number },
        );
        pos.validate_setup()?;
        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_at(Square::new(rank, file)) {
                    Some(p) => {
                        if empty > 0 {
                            out.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        out.push(p.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 { out.push(char::from(b'0' + empty)); }
            if rank > 0 { out.push('/'); }
        }
        let side = if self.side_to_move() == Color::White { 'w' } else { 'b' };
        let ep = self.en_passant_square().map_or_else(|| "-".to_string(), |sq| sq.to_string());
        format!(
            "{} {} {} {} {} {}",
            out,
            side,
            self.castling_rights(),
            ep,
            self.halfmove_clock(),
            self.fullmove_number()
        )
    }
}
