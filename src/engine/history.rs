//! Append-only repetition history.
//!
//! A signature is the first four FEN fields (placement, side to move,
//! castling rights, en passant target). Clocks are excluded so that
//! positions reached at different move numbers still compare equal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::board::Position;
use crate::engine::fen;
use crate::engine::types::Color;

/// Repetition key of one position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn of(pos: &Position) -> Self {
        let ep = pos
            .en_passant
            .map_or_else(|| "-".to_string(), |sq| sq.to_algebraic());
        let side = match pos.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        Signature(format!(
            "{} {} {} {}",
            fen::encode_placement(&pos.board),
            side,
            pos.castling_rights.to_fen(),
            ep
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Position {
    /// Repetition signature of this position.
    pub fn signature(&self) -> Signature {
        Signature::of(self)
    }
}

/// Signatures of every position reached in a game, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    signatures: Vec<Signature>,
}

impl History {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// A history seeded with the game's first position.
    pub fn starting_at(pos: &Position) -> Self {
        History {
            signatures: vec![pos.signature()],
        }
    }

    /// Append the signature of a newly reached position.
    pub fn record(&mut self, pos: &Position) {
        self.signatures.push(pos.signature());
    }

    /// How many times `signature` has been reached.
    pub fn occurrences(&self, signature: &Signature) -> usize {
        self.signatures.iter().filter(|s| *s == signature).count()
    }

    /// How many times `pos` (by signature) has been reached.
    pub fn count(&self, pos: &Position) -> usize {
        self.occurrences(&pos.signature())
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn last(&self) -> Option<&Signature> {
        self.signatures.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::movegen::find_move;
    use crate::engine::types::Square;

    fn play(p: &Position, from: &str, to: &str) -> Position {
        let from = Square::from_algebraic(from).unwrap();
        let to = Square::from_algebraic(to).unwrap();
        p.apply(find_move(p, from, to).unwrap())
    }

    #[test]
    fn signature_is_first_four_fen_fields() {
        let pos = Position::starting();
        assert_eq!(
            pos.signature().as_str(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"
        );
    }

    #[test]
    fn signature_ignores_clocks() {
        let a = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let b = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 37 80").unwrap();
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn signature_includes_en_passant_and_side() {
        let a = Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1").unwrap();
        let b = Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - - 0 1").unwrap();
        let c = Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1").unwrap();
        assert_ne!(a.signature(), b.signature());
        assert_ne!(b.signature(), c.signature());
    }

    #[test]
    fn history_counts_repeats() {
        let start = Position::starting();
        let mut history = History::starting_at(&start);
        assert_eq!(history.len(), 1);
        assert_eq!(history.count(&start), 1);

        let mut pos = start.clone();
        for (from, to) in [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")] {
            pos = play(&pos, from, to);
            history.record(&pos);
        }
        assert_eq!(history.len(), 5);
        assert_eq!(history.count(&pos), 2);
        assert_eq!(history.last(), Some(&start.signature()));
    }

    #[test]
    fn empty_history() {
        let history = History::new();
        assert!(history.is_empty());
        assert_eq!(history.count(&Position::starting()), 0);
        assert_eq!(history.iter().count(), 0);
    }
}
