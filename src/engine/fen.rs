//! FEN codec: the sole text format for positions.
//!
//! Decoding also derives per-piece bookkeeping FEN does not carry: whether a
//! piece has moved (from pawn ranks and castling rights) and the ply on
//! which the en-passant-capturable pawn double-stepped.

use tracing::debug;

use crate::engine::board::{Board, Position};
use crate::engine::types::{
    CastleSide, CastlingRights, ChessError, Color, Piece, PieceType, Square,
};

/// Standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The standard starting position, decoded from [`STARTING_FEN`].
pub fn initial_position() -> Position {
    decode_fen(STARTING_FEN).expect("starting FEN is always valid")
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Parse a FEN string into a position.
pub fn decode_fen(fen: &str) -> Result<Position, ChessError> {
    parse(fen).inspect_err(|err| debug!(fen, %err, "rejected FEN"))
}

fn parse(fen: &str) -> Result<Position, ChessError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(ChessError::MalformedFen(format!(
            "expected 6 fields, got {}",
            fields.len()
        )));
    }

    let mut pos = Position::empty();

    // ----- Field 1: Piece placement -----
    pos.board = parse_placement(fields[0])?;

    // Validate exactly one king per side.
    for color in [Color::White, Color::Black] {
        let king_count = pos.board.count(color, PieceType::King);
        if king_count != 1 {
            return Err(ChessError::MalformedFen(format!(
                "{color} has {king_count} kings (expected 1)"
            )));
        }
    }

    // ----- Field 2: Side to move -----
    pos.side_to_move = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => {
            return Err(ChessError::MalformedFen(format!(
                "invalid side to move: '{other}'"
            )));
        }
    };

    // ----- Field 3: Castling availability -----
    pos.castling_rights = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
        ChessError::MalformedFen(format!("invalid castling string: '{}'", fields[2]))
    })?;

    // ----- Field 4: En passant target square -----
    if fields[3] != "-" {
        let ep_sq = Square::from_algebraic(fields[3]).ok_or_else(|| {
            ChessError::MalformedFen(format!("invalid en passant square: '{}'", fields[3]))
        })?;
        // The target lies behind a pawn of the side that just moved.
        let expected_rank = match pos.side_to_move {
            Color::White => 5,
            Color::Black => 2,
        };
        if ep_sq.rank() != expected_rank {
            return Err(ChessError::MalformedFen(format!(
                "en passant square {} does not fit {} to move",
                fields[3], pos.side_to_move
            )));
        }
        pos.en_passant = Some(ep_sq);
    }

    // ----- Field 5: Halfmove clock -----
    pos.halfmove_clock = fields[4].parse::<u16>().map_err(|_| {
        ChessError::MalformedFen(format!("invalid halfmove clock: '{}'", fields[4]))
    })?;

    // ----- Field 6: Fullmove number -----
    pos.fullmove_number = fields[5].parse::<u16>().map_err(|_| {
        ChessError::MalformedFen(format!("invalid fullmove number: '{}'", fields[5]))
    })?;
    if pos.fullmove_number == 0 {
        return Err(ChessError::MalformedFen(
            "fullmove number must be >= 1".to_string(),
        ));
    }

    derive_bookkeeping(&mut pos);
    Ok(pos)
}

fn parse_placement(field: &str) -> Result<Board, ChessError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(ChessError::MalformedFen(format!(
            "expected 8 ranks, got {}",
            ranks.len()
        )));
    }

    let mut board = Board::empty();
    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_idx as u8; // FEN starts from rank 8
        let mut file: u8 = 0;
        for ch in rank_str.chars() {
            if file > 7 {
                return Err(ChessError::MalformedFen(format!(
                    "too many squares in rank {}",
                    rank + 1
                )));
            }
            if let Some(digit) = ch.to_digit(10) {
                if !(1..=8).contains(&digit) {
                    return Err(ChessError::MalformedFen(format!(
                        "invalid empty count '{ch}' in rank {}",
                        rank + 1
                    )));
                }
                file += digit as u8;
            } else if let Some((color, kind)) = PieceType::from_char(ch) {
                board.put(Square::from_file_rank(file, rank), Piece::new(color, kind));
                file += 1;
            } else {
                return Err(ChessError::MalformedFen(format!(
                    "invalid character '{ch}' in piece placement"
                )));
            }
        }
        if file != 8 {
            return Err(ChessError::MalformedFen(format!(
                "rank {} has {} squares instead of 8",
                rank + 1,
                file
            )));
        }
    }
    Ok(board)
}

/// Fill in `has_moved` and `last_double_step` from what the FEN implies.
fn derive_bookkeeping(pos: &mut Position) {
    let rights = pos.castling_rights;
    let occupied: Vec<Square> = pos.board.pieces().map(|(sq, _)| sq).collect();

    for sq in occupied {
        let Some(piece) = pos.board.piece_at_mut(sq) else {
            continue;
        };
        let color = piece.color;
        let home = color.back_rank();
        piece.has_moved = match piece.kind {
            PieceType::Pawn => sq.rank() != color.pawn_rank(),
            PieceType::King => {
                let unmoved = sq.rank() == home
                    && sq.file() == 4
                    && CastleSide::BOTH
                        .iter()
                        .any(|&wing| rights.can_castle(color, wing));
                !unmoved
            }
            PieceType::Rook => {
                let unmoved = sq.rank() == home
                    && CastleSide::BOTH.iter().any(|&wing| {
                        sq.file() == wing.rook_file() && rights.can_castle(color, wing)
                    });
                !unmoved
            }
            _ => false,
        };
    }

    // The pawn standing beyond the en passant target stepped on the last ply.
    if let Some(target) = pos.en_passant {
        let mover = pos.side_to_move;
        let Some(previous_ply) = pos.ply().checked_sub(1) else {
            return;
        };
        if let Some(pawn_sq) = target.offset(0, -mover.forward())
            && let Some(pawn) = pos.board.piece_at_mut(pawn_sq)
            && pawn.is(!mover, PieceType::Pawn)
        {
            pawn.last_double_step = Some(previous_ply);
        }
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Export a position as a FEN string.
pub fn encode_fen(pos: &Position) -> String {
    let mut fen = encode_placement(&pos.board);

    // Field 2
    fen.push(' ');
    fen.push(match pos.side_to_move {
        Color::White => 'w',
        Color::Black => 'b',
    });

    // Field 3
    fen.push(' ');
    fen.push_str(&pos.castling_rights.to_fen());

    // Field 4
    fen.push(' ');
    match pos.en_passant {
        Some(sq) => fen.push_str(&sq.to_algebraic()),
        None => fen.push('-'),
    }

    // Fields 5 & 6
    fen.push_str(&format!(" {} {}", pos.halfmove_clock, pos.fullmove_number));

    fen
}

/// Field 1 only: ranks 8 to 1, files a to h, empty runs collapsed to digits.
pub fn encode_placement(board: &Board) -> String {
    let mut out = String::with_capacity(72);
    for rank in (0..8u8).rev() {
        let mut empty = 0u8;
        for file in 0..8u8 {
            match board.piece_at(Square::from_file_rank(file, rank)) {
                Some(piece) => {
                    if empty > 0 {
                        out.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    out.push(piece.to_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push((b'0' + empty) as char);
        }
        if rank > 0 {
            out.push('/');
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
