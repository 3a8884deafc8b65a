//! Chess rules core: FEN transcoding, legal move generation, move execution
//! and game-end detection.
//!
//! ```
//! use chess_rules::{Square, decode_fen, game_status, History, legal_moves, apply_move};
//!
//! let pos = decode_fen(chess_rules::STARTING_FEN).unwrap();
//! let e2 = Square::from_algebraic("e2").unwrap();
//! let moves = legal_moves(&pos, e2);
//! assert_eq!(moves.len(), 2);
//!
//! let next = apply_move(&pos, moves[1]);
//! let mut history = History::starting_at(&pos);
//! history.record(&next);
//! assert!(game_status(&next, &history).is_in_progress());
//! ```

pub mod config;
pub mod engine;

pub use config::GameConfig;
pub use engine::*;
