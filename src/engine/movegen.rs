//! Move generation.
//!
//! Pipeline:
//!   1. Generate pseudo-legal moves for the piece on one square (movement and
//!      occupancy only).
//!   2. Filter: replay each candidate on a scratch board and drop it if the
//!      mover's king is attacked afterwards. Castling additionally requires
//!      the king's start and transit squares to be safe.
//!
//! Output order is fixed (squares a1..h8, then each piece's direction table),
//! so repeated calls on one position return identical vectors.

use tracing::trace;

use crate::engine::attacks::{self, ALL_DIRECTIONS, DIAGONAL, ORTHOGONAL};
use crate::engine::board::{Position, castling_rook_squares};
use crate::engine::types::{
    CastleSide, ChessError, Color, Move, MoveFlags, Piece, PieceType, Square,
};

// =========================================================================
// Public API
// =========================================================================

/// Legal moves for the piece on `from`. Empty unless that piece belongs to
/// the side to move.
pub fn legal_moves(pos: &Position, from: Square) -> Vec<Move> {
    match pos.piece_at(from) {
        Some(piece) if piece.color == pos.side_to_move => {}
        _ => return Vec::new(),
    }

    pseudo_legal_moves(pos, from)
        .into_iter()
        .filter(|&mv| {
            let keep = is_safe(pos, mv);
            if !keep {
                trace!(%mv, "discarding candidate that exposes the king");
            }
            keep
        })
        .collect()
}

/// Every legal move for `color`. Empty when `color` is not to move.
pub fn legal_moves_for_side(pos: &Position, color: Color) -> Vec<Move> {
    let origins: Vec<Square> = pos.board.pieces_of(color).map(|(sq, _)| sq).collect();
    origins
        .into_iter()
        .flat_map(|from| legal_moves(pos, from))
        .collect()
}

/// Every legal move for the side to move.
pub fn all_legal_moves(pos: &Position) -> Vec<Move> {
    legal_moves_for_side(pos, pos.side_to_move)
}

/// Resolve a from/to request against the legal set.
pub fn find_move(pos: &Position, from: Square, to: Square) -> Result<Move, ChessError> {
    if let Some(mv) = legal_moves(pos, from).into_iter().find(|m| m.to == to) {
        return Ok(mv);
    }
    let reason = match pos.piece_at(from) {
        None => "no piece on origin square".to_string(),
        Some(piece) if piece.color != pos.side_to_move => {
            format!("it is {}'s turn", pos.side_to_move)
        }
        Some(piece) => format!("{} cannot move there", piece.kind),
    };
    Err(ChessError::IllegalMoveRequested {
        from: from.to_algebraic(),
        to: to.to_algebraic(),
        reason,
    })
}

/// Is `mv` one of the legal moves in `pos`?
pub fn is_legal(pos: &Position, mv: Move) -> bool {
    legal_moves(pos, mv.from).contains(&mv)
}

// =========================================================================
// Pseudo-legal generation
// =========================================================================

/// Candidate moves for the piece on `from`, ignoring self-check.
pub fn pseudo_legal_moves(pos: &Position, from: Square) -> Vec<Move> {
    let Some(&piece) = pos.piece_at(from) else {
        return Vec::new();
    };

    let mut moves = Vec::with_capacity(28);
    match piece.kind {
        PieceType::Pawn => generate_pawn_moves(pos, from, piece, &mut moves),
        PieceType::Knight => generate_leaper_moves(
            pos,
            from,
            piece,
            attacks::tables().knight_targets(from),
            &mut moves,
        ),
        PieceType::Bishop => generate_slider_moves(pos, from, piece, &DIAGONAL, &mut moves),
        PieceType::Rook => generate_slider_moves(pos, from, piece, &ORTHOGONAL, &mut moves),
        PieceType::Queen => generate_slider_moves(pos, from, piece, &ALL_DIRECTIONS, &mut moves),
        PieceType::King => {
            generate_leaper_moves(
                pos,
                from,
                piece,
                attacks::tables().king_targets(from),
                &mut moves,
            );
            generate_castling_moves(pos, from, piece, &mut moves);
        }
    }
    moves
}

fn generate_pawn_moves(pos: &Position, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    let us = piece.color;
    let promotes = |to: Square| {
        if to.rank() == us.promotion_rank() {
            MoveFlags::PROMOTION
        } else {
            MoveFlags::NONE
        }
    };

    // Pushes.
    if let Some(one) = from.offset(0, us.forward())
        && pos.board.is_empty(one)
    {
        moves.push(Move::with_flags(from, one, piece, promotes(one)));

        if from.rank() == us.pawn_rank()
            && let Some(two) = one.offset(0, us.forward())
            && pos.board.is_empty(two)
        {
            let mut mv = Move::with_flags(from, two, piece, MoveFlags::DOUBLE_PUSH);
            mv.en_passant_target = Some(one);
            moves.push(mv);
        }
    }

    // Captures, including en passant.
    for &to in attacks::tables().pawn_captures(us, from) {
        match pos.piece_at(to) {
            Some(target) if target.color != us => {
                let flags = MoveFlags::CAPTURE | promotes(to);
                moves.push(Move::with_flags(from, to, piece, flags));
            }
            Some(_) => {}
            None if pos.en_passant == Some(to) && en_passant_victim_ready(pos, us, from, to) => {
                moves.push(Move::with_flags(
                    from,
                    to,
                    piece,
                    MoveFlags::CAPTURE | MoveFlags::EN_PASSANT,
                ));
            }
            None => {}
        }
    }
}

/// The pawn beside the capturer (same rank, target file) must be an enemy
/// pawn. The position's en passant target alone times the capture: the
/// executor clears it on every move that is not a double step.
fn en_passant_victim_ready(pos: &Position, us: Color, from: Square, to: Square) -> bool {
    let victim_sq = Square::from_file_rank(to.file(), from.rank());
    pos.piece_at(victim_sq)
        .is_some_and(|victim| victim.is(!us, PieceType::Pawn))
}

fn generate_leaper_moves(
    pos: &Position,
    from: Square,
    piece: Piece,
    targets: &[Square],
    moves: &mut Vec<Move>,
) {
    for &to in targets {
        match pos.piece_at(to) {
            None => moves.push(Move::new(from, to, piece)),
            Some(target) if target.color != piece.color => {
                moves.push(Move::with_flags(from, to, piece, MoveFlags::CAPTURE));
            }
            Some(_) => {}
        }
    }
}

fn generate_slider_moves(
    pos: &Position,
    from: Square,
    piece: Piece,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &dir in directions {
        for to in attacks::ray(&pos.board, from, dir) {
            match pos.piece_at(to) {
                None => moves.push(Move::new(from, to, piece)),
                Some(target) if target.color != piece.color => {
                    moves.push(Move::with_flags(from, to, piece, MoveFlags::CAPTURE));
                }
                Some(_) => {}
            }
        }
    }
}

// =========================================================================
// Castling
// =========================================================================

/// Castling candidates: the right is held, king and rook stand unmoved on
/// their home squares and everything between them is empty. Attack
/// conditions are left to the legality filter.
fn generate_castling_moves(pos: &Position, from: Square, king: Piece, moves: &mut Vec<Move>) {
    let us = king.color;
    let home = us.back_rank();
    if king.has_moved || from != Square::from_file_rank(4, home) {
        return;
    }

    for wing in CastleSide::BOTH {
        if !pos.castling_rights.can_castle(us, wing) {
            continue;
        }
        let rook_sq = Square::from_file_rank(wing.rook_file(), home);
        let rook_ready = pos
            .piece_at(rook_sq)
            .is_some_and(|rook| rook.is(us, PieceType::Rook) && !rook.has_moved);
        if !rook_ready {
            continue;
        }

        let (lo, hi) = match wing {
            CastleSide::King => (from.file() + 1, wing.rook_file()),
            CastleSide::Queen => (wing.rook_file() + 1, from.file()),
        };
        let path_clear =
            (lo..hi).all(|file| pos.board.is_empty(Square::from_file_rank(file, home)));
        if !path_clear {
            continue;
        }

        let to = Square::from_file_rank(wing.king_to_file(), home);
        moves.push(Move::with_flags(from, to, king, MoveFlags::CASTLING));
    }
}

// =========================================================================
// Legality
// =========================================================================

/// Replay `mv` on a copy of the board and check the mover's king.
fn is_safe(pos: &Position, mv: Move) -> bool {
    let us = mv.piece.color;
    let them = !us;

    if mv.flags.is_castling() {
        // Not out of check, not through an attacked square.
        let transit = castling_rook_squares(mv.to).1;
        if attacks::is_attacked(&pos.board, mv.from, them)
            || attacks::is_attacked(&pos.board, transit, them)
        {
            return false;
        }
    }

    let mut board = pos.board.clone();
    let Some(piece) = board.take(mv.from) else {
        return false;
    };
    board.put(mv.to, piece);
    if mv.flags.is_en_passant() {
        board.clear(Square::from_file_rank(mv.to.file(), mv.from.rank()));
    }
    if mv.flags.is_castling() {
        let (rook_from, rook_to) = castling_rook_squares(mv.to);
        if let Some(rook) = board.take(rook_from) {
            board.put(rook_to, rook);
        }
    }

    match attacks::king_square(&board, us) {
        Some(king) => !attacks::is_attacked(&board, king, them),
        None => true,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fen::STARTING_FEN;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn count_legal(fen: &str) -> usize {
        all_legal_moves(&pos(fen)).len()
    }

    fn play(p: &Position, from: &str, to: &str) -> Position {
        p.apply(find_move(p, sq(from), sq(to)).unwrap())
    }

    fn targets(moves: &[Move]) -> Vec<String> {
        let mut names: Vec<String> = moves.iter().map(|m| m.to.to_algebraic()).collect();
        names.sort();
        names
    }

    // -------------------------------------------------------------------
    // Starting position
    // -------------------------------------------------------------------

    #[test]
    fn starting_position_has_20_moves() {
        assert_eq!(count_legal(STARTING_FEN), 20);
    }

    #[test]
    fn starting_position_after_e4() {
        assert_eq!(
            count_legal("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"),
            20
        );
    }

    #[test]
    fn opponent_pieces_have_no_moves() {
        let p = Position::starting();
        assert!(legal_moves(&p, sq("e7")).is_empty());
        assert!(legal_moves_for_side(&p, Color::Black).is_empty());
        assert_eq!(legal_moves_for_side(&p, Color::White).len(), 20);
    }

    #[test]
    fn empty_square_has_no_moves() {
        let p = Position::starting();
        assert!(legal_moves(&p, sq("e4")).is_empty());
        assert!(pseudo_legal_moves(&p, sq("e4")).is_empty());
    }

    #[test]
    fn generation_is_repeatable() {
        let p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        for from in Square::all() {
            assert_eq!(legal_moves(&p, from), legal_moves(&p, from));
        }
        assert_eq!(all_legal_moves(&p), all_legal_moves(&p));
    }

    // -------------------------------------------------------------------
    // Pawn moves
    // -------------------------------------------------------------------

    #[test]
    fn pawn_single_and_double_push() {
        let p = pos("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        let moves = legal_moves(&p, sq("e2"));
        assert_eq!(targets(&moves), vec!["e3", "e4"]);
        let double = moves.iter().find(|m| m.to == sq("e4")).unwrap();
        assert!(double.flags.is_double_push());
        assert_eq!(double.en_passant_target, Some(sq("e3")));
    }

    #[test]
    fn pawn_blocked() {
        let p = pos("4k3/8/8/8/8/4p3/4P3/4K3 w - - 0 1");
        assert!(legal_moves(&p, sq("e2")).is_empty());
    }

    #[test]
    fn double_push_needs_both_squares() {
        let p = pos("4k3/8/8/8/4p3/8/4P3/4K3 w - - 0 1");
        assert_eq!(targets(&legal_moves(&p, sq("e2"))), vec!["e3"]);
    }

    #[test]
    fn pawn_captures_diagonally() {
        let p = pos("4k3/8/8/8/8/3p1N2/4P3/4K3 w - - 0 1");
        let moves = legal_moves(&p, sq("e2"));
        assert_eq!(targets(&moves), vec!["d3", "e3", "e4"]);
        let capture = moves.iter().find(|m| m.to == sq("d3")).unwrap();
        assert!(capture.is_capture());
    }

    #[test]
    fn pawn_promotion_is_queen_only() {
        let p = pos("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let moves = legal_moves(&p, sq("e7"));
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].promotion(), Some(PieceType::Queen));
    }

    #[test]
    fn capture_promotion_carries_both_flags() {
        let p = pos("3r3k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let moves = legal_moves(&p, sq("e7"));
        assert_eq!(moves.len(), 2);
        let capture = moves.iter().find(|m| m.to == sq("d8")).unwrap();
        assert!(capture.is_capture());
        assert!(capture.promotes());
    }

    #[test]
    fn en_passant_after_double_step() {
        // 1. e4 a6 2. e5 d5
        let p = Position::starting();
        let p = play(&p, "e2", "e4");
        let p = play(&p, "a7", "a6");
        let p = play(&p, "e4", "e5");
        let p = play(&p, "d7", "d5");
        assert_eq!(p.en_passant, Some(sq("d6")));

        let moves = legal_moves(&p, sq("e5"));
        let captures: Vec<_> = moves.iter().filter(|m| m.is_capture()).collect();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].to, sq("d6"));
        assert!(captures[0].is_en_passant());
    }

    #[test]
    fn en_passant_from_fen() {
        let p = pos("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        let ep: Vec<_> = all_legal_moves(&p)
            .into_iter()
            .filter(|m| m.is_en_passant())
            .collect();
        assert_eq!(ep.len(), 1);
        assert_eq!(ep[0].to, sq("f6"));
    }

    #[test]
    fn en_passant_on_first_move_number() {
        let p = pos("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert_eq!(targets(&legal_moves(&p, sq("e5"))), vec!["d6", "e6"]);
        let ep = legal_moves(&p, sq("e5"))
            .into_iter()
            .find(|m| m.to == sq("d6"))
            .unwrap();
        assert!(ep.is_en_passant());
    }

    #[test]
    fn en_passant_at_move_number_ceiling() {
        let p = pos("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 65535");
        let p = play(&p, "d7", "d5");
        assert_eq!(p.fullmove_number, u16::MAX);
        assert_eq!(p.en_passant, Some(sq("d6")));
        let ep: Vec<Move> = legal_moves(&p, sq("e5"))
            .into_iter()
            .filter(|m| m.is_en_passant())
            .collect();
        assert_eq!(ep.len(), 1);
        assert_eq!(ep[0].to, sq("d6"));
    }

    #[test]
    fn en_passant_needs_target() {
        let p = pos("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1");
        assert!(legal_moves(&p, sq("e5")).iter().all(|m| !m.is_en_passant()));
    }

    #[test]
    fn en_passant_that_exposes_king_is_illegal() {
        // Capturing on d6 would open the fifth rank to the h5 rook.
        let p = pos("4k3/8/8/K2pP2r/8/8/8/8 w - d6 0 2");
        assert!(legal_moves(&p, sq("e5")).iter().all(|m| !m.is_en_passant()));
    }

    // -------------------------------------------------------------------
    // Pieces
    // -------------------------------------------------------------------

    #[test]
    fn knight_from_corner() {
        let p = pos("4k3/8/8/8/8/8/8/N3K3 w - - 0 1");
        assert_eq!(targets(&legal_moves(&p, sq("a1"))), vec!["b3", "c2"]);
    }

    #[test]
    fn rook_stops_at_blockers() {
        let p = pos("4k3/8/8/8/3p4/8/8/3RK3 w - - 0 1");
        let moves = legal_moves(&p, sq("d1"));
        // d2, d3, d4 (capture), a1, b1, c1
        assert_eq!(moves.len(), 6);
        assert!(moves.iter().any(|m| m.to == sq("d4") && m.is_capture()));
        assert!(moves.iter().all(|m| m.to != sq("d5")));
    }

    #[test]
    fn queen_in_open_board() {
        let p = pos("k7/8/8/8/3Q4/8/8/7K w - - 0 1");
        assert_eq!(legal_moves(&p, sq("d4")).len(), 27);
    }

    #[test]
    fn pinned_rook_stays_on_file() {
        let p = pos("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1");
        let moves = legal_moves(&p, sq("e2"));
        assert_eq!(moves.len(), 6);
        assert!(moves.iter().all(|m| m.to.file() == 4));
    }

    // -------------------------------------------------------------------
    // Castling
    // -------------------------------------------------------------------

    fn castles(p: &Position) -> Vec<String> {
        let moves: Vec<Move> = all_legal_moves(p)
            .into_iter()
            .filter(|m| m.is_castle())
            .collect();
        targets(&moves)
    }

    #[test]
    fn castling_both_sides() {
        let p = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        assert_eq!(castles(&p), vec!["c1", "g1"]);
    }

    #[test]
    fn castling_blocked() {
        let p = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/RN2K1NR w KQkq - 0 1");
        assert!(castles(&p).is_empty());
    }

    #[test]
    fn queenside_b_file_must_be_empty() {
        let p = pos("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1");
        assert!(castles(&p).is_empty());
    }

    #[test]
    fn queenside_b_file_may_be_attacked() {
        let p = pos("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert_eq!(castles(&p), vec!["c1"]);
    }

    #[test]
    fn castling_through_check_forbidden() {
        let p = pos("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert_eq!(castles(&p), vec!["c1"]);
    }

    #[test]
    fn castling_into_check_forbidden() {
        let p = pos("4k1r1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert_eq!(castles(&p), vec!["c1"]);
    }

    #[test]
    fn no_castling_while_in_check() {
        let p = pos("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(castles(&p).is_empty());
    }

    #[test]
    fn no_castling_without_right() {
        let p = pos("4k3/8/8/8/8/8/8/R3K2R w K - 0 1");
        assert_eq!(castles(&p), vec!["g1"]);
    }

    #[test]
    fn king_move_forfeits_castling() {
        let p = pos("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let p = play(&p, "e1", "f1");
        assert_eq!(p.castling_rights.to_fen(), "kq");
        let p = play(&p, "a8", "b8");
        let p = play(&p, "f1", "e1");
        assert_eq!(p.castling_rights.to_fen(), "k");
        let p = play(&p, "b8", "a8");
        assert!(castles(&p).is_empty());
    }

    // -------------------------------------------------------------------
    // Check evasion
    // -------------------------------------------------------------------

    #[test]
    fn must_escape_check() {
        let p = pos("4k3/8/8/8/8/8/8/R3K2q w Q - 0 1");
        let moves = all_legal_moves(&p);
        assert!(!moves.is_empty());
        for mv in moves {
            let next = p.apply(mv);
            assert!(
                !attacks::is_king_in_check(&next, Color::White),
                "move {mv} leaves king in check"
            );
        }
    }

    // -------------------------------------------------------------------
    // Known positions
    // -------------------------------------------------------------------

    #[test]
    fn kiwipete_48_moves() {
        assert_eq!(
            count_legal("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"),
            48
        );
    }

    #[test]
    fn position_3_14_moves() {
        assert_eq!(count_legal("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"), 14);
    }

    #[test]
    fn position_4_6_moves() {
        assert_eq!(
            count_legal("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1"),
            6
        );
    }

    #[test]
    fn position_5_queen_only_promotions() {
        // 44 with underpromotions; dxc8 collapses to a single queen move.
        assert_eq!(
            count_legal("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8"),
            41
        );
    }

    // -------------------------------------------------------------------
    // find_move / is_legal
    // -------------------------------------------------------------------

    #[test]
    fn find_move_resolves_request() {
        let p = Position::starting();
        let mv = find_move(&p, sq("g1"), sq("f3")).unwrap();
        assert_eq!(mv.piece.kind, PieceType::Knight);
        assert!(is_legal(&p, mv));
    }

    #[test]
    fn find_move_rejects_illegal_requests() {
        let p = Position::starting();
        for (from, to) in [("e2", "e5"), ("e4", "e5"), ("e7", "e5")] {
            let err = find_move(&p, sq(from), sq(to)).unwrap_err();
            assert!(
                matches!(err, ChessError::IllegalMoveRequested { .. }),
                "{from}{to} gave {err:?}"
            );
        }
    }

    #[test]
    fn pseudo_legal_includes_self_check() {
        let p = pos("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1");
        let pseudo = pseudo_legal_moves(&p, sq("e2"));
        let legal = legal_moves(&p, sq("e2"));
        assert_eq!(pseudo.len(), 13);
        assert!(legal.len() < pseudo.len());
        assert!(!is_legal(&p, Move::new(sq("e2"), sq("a2"), *p.piece_at(sq("e2")).unwrap())));
    }
}
