//! Mailbox board and position state.
//!
//! `Board` holds one `Occupant` per square in LERF order (a1 = 0, h8 = 63).
//! `Position` adds side to move, castling rights, en-passant target and the
//! two move counters, and is advanced only through [`Position::apply`].

use serde::{Deserialize, Serialize};

use crate::engine::attacks;
use crate::engine::fen;
use crate::engine::types::{
    CastleSide, CastlingRights, ChessError, Color, Move, Occupant, Piece, PieceType, Square,
};

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// An 8×8 grid of squares, each empty or holding one piece.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [Occupant; Square::NUM],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    /// A board with no pieces.
    pub fn empty() -> Self {
        Board {
            squares: [Occupant::Empty; Square::NUM],
        }
    }

    #[inline]
    pub fn get(&self, sq: Square) -> Occupant {
        self.squares[sq.index()]
    }

    /// The piece on `sq`, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<&Piece> {
        self.squares[sq.index()].piece()
    }

    #[inline]
    pub fn piece_at_mut(&mut self, sq: Square) -> Option<&mut Piece> {
        match &mut self.squares[sq.index()] {
            Occupant::Occupied(piece) => Some(piece),
            Occupant::Empty => None,
        }
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.squares[sq.index()].is_empty()
    }

    /// Place a piece, replacing whatever stood there.
    #[inline]
    pub fn put(&mut self, sq: Square, piece: Piece) {
        self.squares[sq.index()] = Occupant::Occupied(piece);
    }

    /// Remove and return the piece on `sq`.
    #[inline]
    pub fn take(&mut self, sq: Square) -> Option<Piece> {
        match std::mem::take(&mut self.squares[sq.index()]) {
            Occupant::Occupied(piece) => Some(piece),
            Occupant::Empty => None,
        }
    }

    #[inline]
    pub fn clear(&mut self, sq: Square) {
        self.squares[sq.index()] = Occupant::Empty;
    }

    /// Every occupied square with its piece, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, &Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// Occupied squares of one colour.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, &Piece)> + '_ {
        self.pieces().filter(move |(_, p)| p.color == color)
    }

    /// Number of pieces of one colour and kind.
    pub fn count(&self, color: Color, kind: PieceType) -> usize {
        self.pieces_of(color).filter(|(_, p)| p.kind == kind).count()
    }

    /// Same kind and colour on every square, ignoring per-piece bookkeeping.
    pub fn same_placement(&self, other: &Board) -> bool {
        self.squares
            .iter()
            .zip(other.squares.iter())
            .all(|(a, b)| match (a.piece(), b.piece()) {
                (None, None) => true,
                (Some(a), Some(b)) => a.kind == b.kind && a.color == b.color,
                _ => false,
            })
    }

    /// Render the board as an 8-line string (rank 8 at top), useful for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                let ch = match self.piece_at(sq) {
                    Some(piece) => piece.to_char(),
                    None => '.',
                };
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl std::ops::Index<Square> for Board {
    type Output = Occupant;

    fn index(&self, sq: Square) -> &Occupant {
        &self.squares[sq.index()]
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete chess position.
///
/// Serialized as its FEN string.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position {
    pub board: Board,

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* the double-pushed pawn).
    pub en_passant: Option<Square>,

    /// Half-move clock for the 50-move rule (reset on pawn move or capture).
    pub halfmove_clock: u16,

    /// Full-move number (starts at 1, incremented after Black moves).
    pub fullmove_number: u16,
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.side_to_move == other.side_to_move
            && self.castling_rights == other.castling_rights
            && self.en_passant == other.en_passant
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
            && self.board.same_placement(&other.board)
    }
}

impl Eq for Position {}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl Position {
    /// Create an empty board with no pieces, White to move.
    pub fn empty() -> Self {
        Position {
            board: Board::empty(),
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        fen::initial_position()
    }

    /// Parse a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        fen::decode_fen(fen)
    }

    /// Export as a FEN string.
    pub fn to_fen(&self) -> String {
        fen::encode_fen(self)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<&Piece> {
        self.board.piece_at(sq)
    }

    /// Zero-based ply index: 0 before White's first move, 1 before Black's.
    #[inline]
    pub fn ply(&self) -> u32 {
        let black = u32::from(self.side_to_move == Color::Black);
        (u32::from(self.fullmove_number).saturating_sub(1)) * 2 + black
    }

    /// Find the king square for the given colour.
    #[inline]
    pub fn king_sq(&self, color: Color) -> Option<Square> {
        attacks::king_square(&self.board, color)
    }

    /// Is `sq` attacked by any piece of colour `by`?
    #[inline]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        attacks::is_attacked(&self.board, sq, by)
    }

    /// Is the side-to-move's king currently in check?
    #[inline]
    pub fn is_in_check(&self) -> bool {
        attacks::is_king_in_check(self, self.side_to_move)
    }

    // -----------------------------------------------------------------------
    // Move execution
    // -----------------------------------------------------------------------

    /// Apply a move and return the resulting position. `self` is untouched.
    ///
    /// The move must come from the legality filter for this position; no
    /// validation happens here.
    pub fn apply(&self, mv: Move) -> Position {
        let us = self.side_to_move;
        let ply = self.ply();
        let mut next = self.clone();

        // ---- Relocate the mover ----
        let mut piece = next.board.take(mv.from).unwrap_or(mv.piece);
        let was_pawn = piece.kind == PieceType::Pawn;
        piece.has_moved = true;
        if mv.flags.is_double_push() {
            piece.last_double_step = Some(ply);
        }
        next.board.put(mv.to, piece);

        // ---- Castling: bring the rook across ----
        if mv.flags.is_castling() {
            let (rook_from, rook_to) = castling_rook_squares(mv.to);
            if let Some(mut rook) = next.board.take(rook_from) {
                rook.has_moved = true;
                next.board.put(rook_to, rook);
            }
        }

        // ---- En passant: the captured pawn sits beside the mover's origin ----
        if mv.flags.is_en_passant() {
            next.board
                .clear(Square::from_file_rank(mv.to.file(), mv.from.rank()));
        }

        // ---- Promotion ----
        if mv.flags.is_promotion()
            && let Some(promoted) = next.board.piece_at_mut(mv.to)
        {
            promoted.kind = PieceType::Queen;
            promoted.last_double_step = None;
        }

        // ---- Castling rights ----
        // Moving king or rook, or capturing on a rook's home square.
        next.castling_rights.0 &= CASTLING_MASK[mv.from.index()];
        next.castling_rights.0 &= CASTLING_MASK[mv.to.index()];

        // ---- En passant target ----
        next.en_passant = if mv.flags.is_double_push() {
            mv.en_passant_target
        } else {
            None
        };

        // ---- Halfmove clock ----
        if was_pawn || mv.flags.is_capture() {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock = next.halfmove_clock.saturating_add(1);
        }

        // ---- Fullmove number ----
        if us == Color::Black {
            next.fullmove_number = next.fullmove_number.saturating_add(1);
        }

        // ---- Switch side ----
        next.side_to_move = !us;

        next
    }
}

/// Apply a legal move to a position, producing the next position.
pub fn apply_move(pos: &Position, mv: Move) -> Position {
    pos.apply(mv)
}

// ---------------------------------------------------------------------------
// Castling helpers (free functions)
// ---------------------------------------------------------------------------

/// For a king-destination square (after castling), return (rook_from, rook_to).
pub(crate) fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    let wing = if king_to.file() == CastleSide::King.king_to_file() {
        CastleSide::King
    } else {
        CastleSide::Queen
    };
    let rank = king_to.rank();
    (
        Square::from_file_rank(wing.rook_file(), rank),
        Square::from_file_rank(wing.rook_to_file(), rank),
    )
}

/// Mask table indexed by square index. When a move touches a square, AND the
/// castling rights with this mask. E.g. if a rook on a1 moves (or is captured),
/// remove White-queenside. The king's home square removes both that side's rights.
#[rustfmt::skip]
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    // a1 (0): remove white-queenside (bit 1)
    mask[0]  = 0b1111 & !CastlingRights::WHITE_QUEENSIDE;
    // e1 (4): remove both white rights
    mask[4]  = 0b1111 & !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE);
    // h1 (7): remove white-kingside (bit 0)
    mask[7]  = 0b1111 & !CastlingRights::WHITE_KINGSIDE;
    // a8 (56): remove black-queenside (bit 3)
    mask[56] = 0b1111 & !CastlingRights::BLACK_QUEENSIDE;
    // e8 (60): remove both black rights
    mask[60] = 0b1111 & !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE);
    // h8 (63): remove black-kingside (bit 2)
    mask[63] = 0b1111 & !CastlingRights::BLACK_KINGSIDE;
    mask
};

// ---------------------------------------------------------------------------
// Conversions / Display
// ---------------------------------------------------------------------------

impl TryFrom<String> for Position {
    type Error = ChessError;

    fn try_from(fen: String) -> Result<Self, Self::Error> {
        fen::decode_fen(&fen)
    }
}

impl From<Position> for String {
    fn from(pos: Position) -> Self {
        fen::encode_fen(&pos)
    }
}

impl std::str::FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fen::decode_fen(s)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
