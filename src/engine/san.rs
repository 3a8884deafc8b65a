//! SAN: the move text players read and type.
//!
//! Output never carries `+`/`#`; the game controller appends those once it
//! knows the resulting status. Input tolerates them.

use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Color, Move, PieceType, Square};

// =========================================================================
// Output
// =========================================================================

/// Render `mv` in SAN. `legal_moves` is the full legal set of `pos`, used
/// to decide how much of the origin square must be spelled out.
pub fn move_to_san(pos: &Position, mv: Move, legal_moves: &[Move]) -> String {
    if mv.flags.is_castling() {
        let text = if mv.to.file() > mv.from.file() { "O-O" } else { "O-O-O" };
        return text.to_string();
    }

    let capture = if mv.flags.is_capture() { "x" } else { "" };
    let dest = mv.to.to_algebraic();

    match mv.piece.kind {
        PieceType::Pawn => {
            let origin = if capture.is_empty() {
                String::new()
            } else {
                char::from(b'a' + mv.from.file()).to_string()
            };
            let promo = mv
                .promotion()
                .map(|pt| format!("={}", piece_letter(pt)))
                .unwrap_or_default();
            format!("{origin}{capture}{dest}{promo}")
        }
        kind => format!(
            "{}{}{capture}{dest}",
            piece_letter(kind),
            disambiguation(pos, mv, legal_moves)
        ),
    }
}

/// Origin file, rank, or both, when another piece of the same kind and
/// colour can also reach the destination.
fn disambiguation(pos: &Position, mv: Move, legal_moves: &[Move]) -> String {
    let rivals: Vec<Square> = legal_moves
        .iter()
        .filter(|m| {
            m.to == mv.to
                && m.from != mv.from
                && !m.is_castle()
                && m.piece.is(pos.side_to_move, mv.piece.kind)
        })
        .map(|m| m.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let name = mv.from.to_algebraic();
    let (file, rank) = name.split_at(1);
    let shares_file = rivals.iter().any(|r| r.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|r| r.rank() == mv.from.rank());

    if !shares_file {
        file.to_string()
    } else if !shares_rank {
        rank.to_string()
    } else {
        name
    }
}

fn piece_letter(pt: PieceType) -> char {
    pt.to_char(Color::White)
}

/// Uppercase piece letter; pawns have none in SAN.
fn letter_piece(c: char) -> Option<PieceType> {
    match PieceType::from_char(c)? {
        (Color::White, kind) if kind != PieceType::Pawn => Some(kind),
        _ => None,
    }
}

// =========================================================================
// Input
// =========================================================================

fn rejected(san: &str, reason: impl Into<String>) -> ChessError {
    ChessError::IllegalMoveRequested {
        from: String::new(),
        to: san.to_string(),
        reason: reason.into(),
    }
}

/// Resolve SAN text to the one legal move it names.
///
/// Accepts `e4`, `Nf3`, `Bxe5`, `O-O`, `O-O-O`, `e8=Q`, and `0-0` for
/// castling. Annotation suffixes (`+`, `#`, `!`, `?`) are ignored. A
/// promotion may omit `=Q`; any other promotion piece is rejected.
pub fn parse_san(pos: &Position, san: &str) -> Result<Move, ChessError> {
    let legal = movegen::all_legal_moves(pos);
    let san = san.trim().trim_end_matches(['+', '#', '!', '?']);

    // Castling.
    match san {
        "O-O" | "0-0" => return find_castling(pos, &legal, true),
        "O-O-O" | "0-0-0" => return find_castling(pos, &legal, false),
        _ => {}
    }

    let chars: Vec<char> = san.chars().collect();
    if chars.is_empty() {
        return Err(rejected(san, "empty SAN string"));
    }

    // Promotion suffix.
    let chars = match chars.as_slice() {
        [rest @ .., '=', promo] => {
            if !matches!(*promo, 'Q' | 'q') {
                return Err(rejected(san, format!("cannot promote to '{promo}'")));
            }
            rest
        }
        all => all,
    };

    // Piece letter.
    let (piece, rest) = chars
        .split_first()
        .and_then(|(&c, rest)| letter_piece(c).map(|pt| (pt, rest)))
        .unwrap_or((PieceType::Pawn, chars));

    // Capture marker carries no information the legal move lacks.
    let rest: Vec<char> = rest.iter().copied().filter(|&c| c != 'x').collect();
    if rest.len() < 2 {
        return Err(rejected(san, "SAN too short"));
    }

    let dest_str: String = rest[rest.len() - 2..].iter().collect();
    let dest = Square::from_algebraic(&dest_str)
        .ok_or_else(|| ChessError::InvalidSquare(dest_str.clone()))?;

    // Disambiguation characters (0, 1, or 2 chars before destination).
    let disambig = &rest[..rest.len() - 2];
    let disambig_file: Option<u8> = disambig
        .iter()
        .find(|c| c.is_ascii_lowercase())
        .map(|&c| (c as u8).wrapping_sub(b'a'));
    let disambig_rank: Option<u8> = disambig
        .iter()
        .find(|c| c.is_ascii_digit())
        .map(|&c| (c as u8).wrapping_sub(b'1'));

    let candidates: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            m.to == dest
                && !m.flags.is_castling()
                && m.piece.kind == piece
                && disambig_file.is_none_or(|f| m.from.file() == f)
                && disambig_rank.is_none_or(|r| m.from.rank() == r)
        })
        .collect();

    match candidates.as_slice() {
        [] => Err(rejected(san, format!("no legal move matches SAN '{san}'"))),
        [only] => Ok(**only),
        many => Err(rejected(
            san,
            format!("ambiguous SAN '{san}': {} candidates", many.len()),
        )),
    }
}

fn find_castling(pos: &Position, legal: &[Move], kingside: bool) -> Result<Move, ChessError> {
    let target_file = if kingside { 6 } else { 2 };

    legal
        .iter()
        .find(|m| m.flags.is_castling() && m.to.file() == target_file)
        .copied()
        .ok_or_else(|| ChessError::IllegalMoveRequested {
            from: pos
                .king_sq(pos.side_to_move)
                .map(|sq| sq.to_algebraic())
                .unwrap_or_default(),
            to: String::new(),
            reason: format!(
                "castling {} not legal",
                if kingside { "kingside" } else { "queenside" }
            ),
        })
}

// =========================================================================
// Tests
// =========================================================================
