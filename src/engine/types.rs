use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rank step a pawn of this colour advances by.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Rank the pieces of this colour start on (0 for White, 7 for Black).
    #[inline]
    pub const fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank this colour's pawns start on.
    #[inline]
    pub const fn pawn_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Rank on which this colour's pawns promote.
    #[inline]
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::White => "white",
            Color::Black => "black",
        })
    }
}

// ---------------------------------------------------------------------------
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// All piece types in order.
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Number of piece types.
    pub const COUNT: usize = 6;

    /// FEN letters (black case), in `ALL` order.
    const LETTERS: [char; 6] = ['p', 'n', 'b', 'r', 'q', 'k'];

    const NAMES: [&'static str; 6] = ["pawn", "knight", "bishop", "rook", "queen", "king"];

    /// Position in `ALL`.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Conventional material value in pawns. The king has no trade value.
    pub fn value(self) -> u32 {
        match self {
            PieceType::Pawn => 1,
            PieceType::Knight | PieceType::Bishop => 3,
            PieceType::Rook => 5,
            PieceType::Queen => 9,
            PieceType::King => 0,
        }
    }

    /// FEN letter: uppercase for White.
    pub fn to_char(self, color: Color) -> char {
        let letter = Self::LETTERS[self.index()];
        if color == Color::White {
            letter.to_ascii_uppercase()
        } else {
            letter
        }
    }

    /// Read a FEN letter back into colour and kind.
    pub fn from_char(c: char) -> Option<(Color, PieceType)> {
        let slot = Self::LETTERS
            .iter()
            .position(|&letter| letter == c.to_ascii_lowercase())?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some((color, Self::ALL[slot]))
    }

    /// Bishops, rooks and queens.
    #[inline]
    pub fn is_slider(self) -> bool {
        matches!(self, PieceType::Bishop | PieceType::Rook | PieceType::Queen)
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::NAMES[self.index()])
    }
}

// ---------------------------------------------------------------------------
// Piece / Occupant
// ---------------------------------------------------------------------------

/// A piece standing on the board, with the bookkeeping the rules need.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceType,
    pub color: Color,
    /// Set once the piece has left its square. Gates castling.
    pub has_moved: bool,
    /// Ply on which a pawn advanced two squares. Bookkeeping only; the
    /// position's en passant target decides whether it can be taken.
    pub last_double_step: Option<u32>,
}

impl Piece {
    /// An unmoved piece.
    pub const fn new(color: Color, kind: PieceType) -> Self {
        Piece {
            kind,
            color,
            has_moved: false,
            last_double_step: None,
        }
    }

    #[inline]
    pub fn is(&self, color: Color, kind: PieceType) -> bool {
        self.color == color && self.kind == kind
    }

    /// FEN letter for this piece.
    #[inline]
    pub fn to_char(&self) -> char {
        self.kind.to_char(self.color)
    }
}

/// Contents of one square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Occupant {
    #[default]
    Empty,
    Occupied(Piece),
}

impl Occupant {
    #[inline]
    pub fn piece(&self) -> Option<&Piece> {
        match self {
            Occupant::Empty => None,
            Occupant::Occupied(piece) => Some(piece),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Occupant::Empty)
    }

    /// Colour of the occupant, if any.
    #[inline]
    pub fn color(&self) -> Option<Color> {
        self.piece().map(|p| p.color)
    }
}

impl From<Piece> for Occupant {
    fn from(piece: Piece) -> Self {
        Occupant::Occupied(piece)
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A square on the chess board (0..63, LERF: a1=0, h8=63).
///
/// Only in-bounds squares can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square(u8);

impl Square {
    pub const NUM: usize = 64;

    /// Build a square from coordinates supplied by a caller.
    pub fn try_new(file: i32, rank: i32) -> Result<Self, ChessError> {
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Ok(Square::from_file_rank(file as u8, rank as u8))
        } else {
            Err(ChessError::OutOfBoundsQuery { file, rank })
        }
    }

    /// Build a square from a LERF index.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < Self::NUM).then_some(Square(index as u8))
    }

    #[inline]
    pub(crate) const fn from_file_rank(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Square(rank * 8 + file)
    }

    /// Iterate a1, b1, … h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..Self::NUM as u8).map(Square)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// Step by `(df, dr)` files and ranks, or `None` when that leaves the board.
    #[inline]
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square::from_file_rank(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// True for dark squares (a1 is dark).
    #[inline]
    pub fn is_dark(self) -> bool {
        (self.file() + self.rank()) % 2 == 0
    }

    /// Square named like `e4`.
    pub fn from_algebraic(name: &str) -> Option<Self> {
        let &[file, rank] = name.as_bytes() else {
            return None;
        };
        let (file, rank) = (file.wrapping_sub(b'a'), rank.wrapping_sub(b'1'));
        (file < 8 && rank < 8).then(|| Square::from_file_rank(file, rank))
    }

    /// Name like `e4`.
    pub fn to_algebraic(self) -> String {
        format!("{}{}", char::from(b'a' + self.file()), self.rank() + 1)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_algebraic())
    }
}

impl std::str::FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::from_algebraic(s).ok_or_else(|| ChessError::InvalidSquare(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = ChessError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> Self {
        sq.to_algebraic()
    }
}

// ---------------------------------------------------------------------------
// MoveFlags
// ---------------------------------------------------------------------------

/// Special-move markers, combinable with `|`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MoveFlags(pub u8);

impl MoveFlags {
    pub const NONE: MoveFlags = MoveFlags(0);
    pub const CAPTURE: MoveFlags = MoveFlags(1);
    pub const EN_PASSANT: MoveFlags = MoveFlags(2);
    pub const CASTLING: MoveFlags = MoveFlags(4);
    pub const DOUBLE_PUSH: MoveFlags = MoveFlags(8);
    pub const PROMOTION: MoveFlags = MoveFlags(16);
    const KNOWN: MoveFlags = MoveFlags(0b1_1111);

    /// True when every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: MoveFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_capture(self) -> bool {
        self.contains(Self::CAPTURE)
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        self.contains(Self::EN_PASSANT)
    }

    #[inline]
    pub const fn is_castling(self) -> bool {
        self.contains(Self::CASTLING)
    }

    #[inline]
    pub const fn is_double_push(self) -> bool {
        self.contains(Self::DOUBLE_PUSH)
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.contains(Self::PROMOTION)
    }
}

impl std::ops::BitOr for MoveFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        MoveFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for MoveFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl TryFrom<u8> for MoveFlags {
    type Error = ChessError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        if bits & !Self::KNOWN.0 != 0 {
            return Err(ChessError::InvalidBits { kind: "move flags", bits });
        }
        Ok(MoveFlags(bits))
    }
}

impl From<MoveFlags> for u8 {
    fn from(flags: MoveFlags) -> Self {
        flags.0
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// Whether a move lands on an empty square or takes something.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKind {
    Quiet,
    Capture,
}

/// A candidate or applied move. Produced by the generator, consumed once by
/// the executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    /// The mover as it stood on `from` when the move was generated.
    pub piece: Piece,
    pub flags: MoveFlags,
    /// Square passed over by a pawn double step; becomes the next
    /// position's en passant target.
    pub en_passant_target: Option<Square>,
}

impl Move {
    pub fn new(from: Square, to: Square, piece: Piece) -> Self {
        Move {
            from,
            to,
            piece,
            flags: MoveFlags::NONE,
            en_passant_target: None,
        }
    }

    pub fn with_flags(from: Square, to: Square, piece: Piece, flags: MoveFlags) -> Self {
        Move {
            from,
            to,
            piece,
            flags,
            en_passant_target: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> MoveKind {
        if self.flags.is_capture() {
            MoveKind::Capture
        } else {
            MoveKind::Quiet
        }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.flags.is_capture()
    }

    #[inline]
    pub fn is_en_passant(&self) -> bool {
        self.flags.is_en_passant()
    }

    #[inline]
    pub fn is_castle(&self) -> bool {
        self.flags.is_castling()
    }

    #[inline]
    pub fn promotes(&self) -> bool {
        self.flags.is_promotion()
    }

    /// Piece a promoting pawn turns into. Always a queen.
    #[inline]
    pub fn promotion(&self) -> Option<PieceType> {
        self.promotes().then_some(PieceType::Queen)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion() {
            write!(f, "={}", promo.to_char(Color::Black))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CastlingRights
// ---------------------------------------------------------------------------

/// Which of the four castles are still allowed, one bit each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CastlingRights(pub u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 1;
    pub const WHITE_QUEENSIDE: u8 = 2;
    pub const BLACK_KINGSIDE: u8 = 4;
    pub const BLACK_QUEENSIDE: u8 = 8;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    #[inline]
    pub fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn remove(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Flag for one colour's castle on one wing.
    #[inline]
    pub fn flag(color: Color, wing: CastleSide) -> u8 {
        match (color, wing) {
            (Color::White, CastleSide::King) => Self::WHITE_KINGSIDE,
            (Color::White, CastleSide::Queen) => Self::WHITE_QUEENSIDE,
            (Color::Black, CastleSide::King) => Self::BLACK_KINGSIDE,
            (Color::Black, CastleSide::Queen) => Self::BLACK_QUEENSIDE,
        }
    }

    #[inline]
    pub fn can_castle(self, color: Color, wing: CastleSide) -> bool {
        self.has(Self::flag(color, wing))
    }

    #[inline]
    pub fn can_castle_kingside(self, color: Color) -> bool {
        self.can_castle(color, CastleSide::King)
    }

    #[inline]
    pub fn can_castle_queenside(self, color: Color) -> bool {
        self.can_castle(color, CastleSide::Queen)
    }

    /// FEN letter of each flag, in canonical `KQkq` order.
    const FEN_LETTERS: [(u8, char); 4] = [
        (Self::WHITE_KINGSIDE, 'K'),
        (Self::WHITE_QUEENSIDE, 'Q'),
        (Self::BLACK_KINGSIDE, 'k'),
        (Self::BLACK_QUEENSIDE, 'q'),
    ];

    /// Read the FEN castling field: `-` or each of `KQkq` at most once.
    pub fn from_fen(field: &str) -> Option<Self> {
        if field == "-" {
            return Some(CastlingRights::NONE);
        }
        if field.is_empty() {
            return None;
        }
        field.chars().try_fold(CastlingRights::NONE, |rights, c| {
            let (flag, _) = Self::FEN_LETTERS.iter().find(|&&(_, letter)| letter == c)?;
            (!rights.has(*flag)).then_some(CastlingRights(rights.0 | flag))
        })
    }

    /// The FEN castling field.
    pub fn to_fen(self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        Self::FEN_LETTERS
            .iter()
            .filter(|&&(flag, _)| self.has(flag))
            .map(|&(_, letter)| letter)
            .collect()
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

impl TryFrom<u8> for CastlingRights {
    type Error = ChessError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        if bits & !Self::ALL.0 != 0 {
            return Err(ChessError::InvalidBits { kind: "castling rights", bits });
        }
        Ok(CastlingRights(bits))
    }
}

impl From<CastlingRights> for u8 {
    fn from(rights: CastlingRights) -> Self {
        rights.0
    }
}

/// The wing a king castles toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [CastleSide::King, CastleSide::Queen];

    /// File the rook starts on.
    #[inline]
    pub const fn rook_file(self) -> u8 {
        match self {
            CastleSide::King => 7,
            CastleSide::Queen => 0,
        }
    }

    /// File the king lands on.
    #[inline]
    pub const fn king_to_file(self) -> u8 {
        match self {
            CastleSide::King => 6,
            CastleSide::Queen => 2,
        }
    }

    /// File the rook lands on (the square the king crosses).
    #[inline]
    pub const fn rook_to_file(self) -> u8 {
        match self {
            CastleSide::King => 5,
            CastleSide::Queen => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Reason for a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl DrawReason {
    pub fn as_str(&self) -> &str {
        match self {
            DrawReason::FiftyMoveRule => "fifty_move_rule",
            DrawReason::ThreefoldRepetition => "threefold_repetition",
            DrawReason::InsufficientMaterial => "insufficient_material",
        }
    }
}

/// A terminal condition. Several can hold at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Outcome {
    /// The given side is checkmated.
    Checkmate(Color),
    Stalemate,
    Draw(DrawReason),
}

impl Outcome {
    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Checkmate(_) => "checkmate",
            Outcome::Stalemate => "stalemate",
            Outcome::Draw(reason) => reason.as_str(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate(color) => write!(f, "checkmate ({color} is mated)"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Status of a position: whether the side to move is in check and every
/// terminal condition that currently holds. No outcomes means in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatus {
    pub in_check: bool,
    pub outcomes: Vec<Outcome>,
}

impl GameStatus {
    #[inline]
    pub fn is_in_progress(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        !self.outcomes.is_empty()
    }

    #[inline]
    pub fn contains(&self, outcome: Outcome) -> bool {
        self.outcomes.contains(&outcome)
    }

    /// The side that has been checkmated, if any.
    pub fn checkmated(&self) -> Option<Color> {
        self.outcomes.iter().find_map(|o| match o {
            Outcome::Checkmate(color) => Some(*color),
            _ => None,
        })
    }

    #[inline]
    pub fn is_stalemate(&self) -> bool {
        self.contains(Outcome::Stalemate)
    }

    #[inline]
    pub fn has_draw(&self, reason: DrawReason) -> bool {
        self.contains(Outcome::Draw(reason))
    }

    /// Short label: the first outcome, else "check" or "active".
    pub fn as_str(&self) -> &str {
        match self.outcomes.first() {
            Some(outcome) => outcome.as_str(),
            None if self.in_check => "check",
            None => "active",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Domain errors for the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error("malformed FEN: {0}")]
    MalformedFen(String),

    #[error("illegal move requested: {from} -> {to}: {reason}")]
    IllegalMoveRequested {
        from: String,
        to: String,
        reason: String,
    },

    #[error("square out of bounds: file {file}, rank {rank}")]
    OutOfBoundsQuery { file: i32, rank: i32 },

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("game is already over: {0}")]
    GameOver(String),

    #[error("unknown bits in {kind}: {bits:#010b}")]
    InvalidBits { kind: &'static str, bits: u8 },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
