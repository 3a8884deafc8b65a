//! Attack detection over the mailbox board.
//!
//! Leaper targets (knight, king, pawn captures) are computed once per square
//! and kept in a process-wide table (via `OnceLock`). Sliders are ray-cast on
//! demand: the first occupied square along a ray stops it.

use std::sync::OnceLock;

use crate::engine::board::{Board, Position};
use crate::engine::types::{Color, PieceType, Square};

/// Rook directions.
pub const ORTHOGONAL: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Bishop directions.
pub const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Queen and king directions.
pub const ALL_DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

// =========================================================================
// Tables
// =========================================================================

/// Get a reference to the global leaper tables.
pub fn tables() -> &'static AttackTables {
    static TABLES: OnceLock<AttackTables> = OnceLock::new();
    TABLES.get_or_init(AttackTables::init)
}

/// On-board target squares for every leaper, per origin square.
pub struct AttackTables {
    knight: [Vec<Square>; 64],
    king: [Vec<Square>; 64],
    /// `pawn[color][square]`: squares a pawn of `color` on `square` captures on.
    pawn: [[Vec<Square>; 64]; 2],
}

impl AttackTables {
    #[inline]
    pub fn knight_targets(&self, sq: Square) -> &[Square] {
        &self.knight[sq.index()]
    }

    #[inline]
    pub fn king_targets(&self, sq: Square) -> &[Square] {
        &self.king[sq.index()]
    }

    #[inline]
    pub fn pawn_captures(&self, color: Color, sq: Square) -> &[Square] {
        &self.pawn[color.index()][sq.index()]
    }

    fn init() -> Self {
        AttackTables {
            knight: std::array::from_fn(|i| leaper_targets(i, &KNIGHT_OFFSETS)),
            king: std::array::from_fn(|i| leaper_targets(i, &ALL_DIRECTIONS)),
            pawn: [
                std::array::from_fn(|i| leaper_targets(i, &[(-1, 1), (1, 1)])),
                std::array::from_fn(|i| leaper_targets(i, &[(-1, -1), (1, -1)])),
            ],
        }
    }
}

fn leaper_targets(index: usize, offsets: &[(i8, i8)]) -> Vec<Square> {
    let Some(from) = Square::from_index(index) else {
        return Vec::new();
    };
    offsets
        .iter()
        .filter_map(|&(df, dr)| from.offset(df, dr))
        .collect()
}

// =========================================================================
// Rays
// =========================================================================

/// Walk from `from` (exclusive) in one direction until the edge or the first
/// occupied square, which is included.
pub fn ray(board: &Board, from: Square, (df, dr): (i8, i8)) -> impl Iterator<Item = Square> + '_ {
    let mut current = Some(from);
    let mut blocked = false;
    std::iter::from_fn(move || {
        if blocked {
            return None;
        }
        let next = current?.offset(df, dr)?;
        current = Some(next);
        blocked = !board.is_empty(next);
        Some(next)
    })
}

/// The first occupied square along a ray, if any.
#[inline]
fn first_occupied(board: &Board, from: Square, dir: (i8, i8)) -> Option<Square> {
    ray(board, from, dir).last().filter(|&sq| !board.is_empty(sq))
}

// =========================================================================
// Oracle
// =========================================================================

/// Is `sq` attacked by any piece of colour `by`?
pub fn is_attacked(board: &Board, sq: Square, by: Color) -> bool {
    attackers_iter(board, sq, by).next().is_some()
}

/// Every square holding a piece of colour `by` that attacks `sq`.
pub fn attackers(board: &Board, sq: Square, by: Color) -> Vec<Square> {
    attackers_iter(board, sq, by).collect()
}

fn attackers_iter(board: &Board, sq: Square, by: Color) -> impl Iterator<Item = Square> + '_ {
    let t = tables();
    let holds = move |at: Square, kinds: &[PieceType]| {
        board
            .piece_at(at)
            .is_some_and(|p| p.color == by && kinds.contains(&p.kind))
    };

    // Rook / Queen (straight lines).
    let orthogonal = ORTHOGONAL
        .into_iter()
        .filter_map(move |dir| first_occupied(board, sq, dir))
        .filter(move |&at| holds(at, &[PieceType::Rook, PieceType::Queen]));

    // Bishop / Queen (diagonals).
    let diagonal = DIAGONAL
        .into_iter()
        .filter_map(move |dir| first_occupied(board, sq, dir))
        .filter(move |&at| holds(at, &[PieceType::Bishop, PieceType::Queen]));

    let knights = t
        .knight_targets(sq)
        .iter()
        .copied()
        .filter(move |&at| holds(at, &[PieceType::Knight]));

    let kings = t
        .king_targets(sq)
        .iter()
        .copied()
        .filter(move |&at| holds(at, &[PieceType::King]));

    // A pawn of `by` attacks `sq` from the squares an opposing pawn on `sq`
    // would capture on.
    let pawns = t
        .pawn_captures(!by, sq)
        .iter()
        .copied()
        .filter(move |&at| holds(at, &[PieceType::Pawn]));

    orthogonal.chain(diagonal).chain(knights).chain(kings).chain(pawns)
}

/// Where the king of `color` stands.
pub fn king_square(board: &Board, color: Color) -> Option<Square> {
    board
        .pieces_of(color)
        .find(|(_, p)| p.kind == PieceType::King)
        .map(|(sq, _)| sq)
}

/// Is the king of `color` attacked? False when that king is absent.
pub fn is_king_in_check(pos: &Position, color: Color) -> bool {
    king_square(&pos.board, color).is_some_and(|king| is_attacked(&pos.board, king, !color))
}

// =========================================================================
// Tests
// =========================================================================
