use rotachess::board::{CastlingRights, Color, Piece, PieceKind, PositionState, Square, START_FEN};
use rotachess::error::FenError;

#[test]
fn round_trips() {
    for fen in [
        START_FEN,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/pp1ppppp/8/2pP4/8/8/PPP1PPPP/RNBQKBNR w KQkq c6 0 3",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 b - - 17 42",
    ] {
        let pos = PositionState::from_fen(fen).unwrap_or_else(|e| panic!("{}: {}", fen, e));
        assert_eq!(pos.to_fen(), fen);
        assert!(pos.is_consistent());
    }
}

#[test]
fn fields_are_read() {
    let pos = PositionState::from_fen("rnbqkbnr/pp1ppppp/8/2pP4/8/8/PPP1PPPP/RNBQKBNR w Kq c6 4 3").unwrap();
    assert_eq!(pos.side_to_move(), Color::White);
    assert_eq!(pos.en_passant_square(), Some(Square::new(5, 2)));
    assert_eq!(pos.castling_rights().to_string(), "Kq");
    assert_eq!(pos.halfmove_clock(), 4);
    assert_eq!(pos.fullmove_number(), 3);
    assert_eq!(pos.piece_at(Square::new(4, 3)), Some(Piece::new(Color::White, PieceKind::Pawn)));
    assert_eq!(pos.king_square(Color::Black), Square::E8);
}

#[test]
fn malformed_fields_are_rejected() {
    let cases: [(&str, fn(&FenError) -> bool); 8] = [
        ("8/8/8/8/8/8/8/8 w", |e| matches!(e, FenError::FieldCount(2))),
        ("4k3/8/8/8/8/8/4K3 w - - 0 1", |e| matches!(e, FenError::Placement(_))),
        ("4k3/8/8/8/8/8/8/4K4 w - - 0 1", |e| matches!(e, FenError::Placement(_))),
        ("4k3/8/8/8/8/8/8/4X3 w - - 0 1", |e| matches!(e, FenError::Placement(_))),
        ("4k3/8/8/8/8/8/8/4K3 x - - 0 1", |e| matches!(e, FenError::SideToMove(_))),
        ("4k3/8/8/8/8/8/8/4K3 w KK - 0 1", |e| matches!(e, FenError::Castling(_))),
        ("4k3/8/8/8/8/8/8/4K3 w - e4 0 1", |e| matches!(e, FenError::EnPassant(_))),
        ("4k3/8/8/8/8/8/8/4K3 w - - x 1", |e| matches!(e, FenError::Counter(_))),
    ];
    for (fen, expected) in cases {
        let err = PositionState::from_fen(fen).expect_err(fen);
        assert!(expected(&err), "{} gave {:?}", fen, err);
    }
    assert!(matches!(PositionState::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 0"), Err(FenError::Counter(_))));
}

#[test]
fn impossible_positions_are_rejected() {
    for fen in [
        "8/8/8/8/8/8/8/4K3 w - - 0 1",
        "4k3/8/8/8/8/8/8/3KK3 w - - 0 1",
        "P3k3/8/8/8/8/8/8/4K3 w - - 0 1",
        "4k3/8/8/8/8/8/PPPPPPPP/P3K3 w - - 0 1",
        "4k3/8/8/8/8/8/PPPPPPPP/QQ2K3 w - - 0 1",
        "4k3/8/8/8/8/8/8/4K3 w K - 0 1",
        "4k3/8/8/8/8/8/8/4K3 b - e3 0 1",
        "4k3/8/8/8/8/8/8/4K2r b - - 0 1",
    ] {
        let err = PositionState::from_fen(fen).expect_err(fen);
        assert!(matches!(err, FenError::Impossible(_) | FenError::Placement(_)), "{} gave {:?}", fen, err);
    }
}

#[test]
fn piece_lists_grant_home_castling() {
    let placement = [
        (Square::E1, Piece::new(Color::White, PieceKind::King)),
        (Square::H1, Piece::new(Color::White, PieceKind::Rook)),
        (Square::E8, Piece::new(Color::Black, PieceKind::King)),
        (Square::new(7, 1), Piece::new(Color::Black, PieceKind::Rook)),
    ];
    let pos = PositionState::from_pieces(&placement, Color::Black).unwrap();
    let mut expected = CastlingRights::NONE;
    expected.insert(Color::White, rotachess::board::CastleSide::King);
    assert_eq!(pos.castling_rights(), expected);
    assert_eq!(pos.side_to_move(), Color::Black);
    assert_eq!(pos.placement().len(), 4);
}
