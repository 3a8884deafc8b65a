pub mod attacks;
pub mod board;
pub mod fen;
pub mod game;
pub mod history;
pub mod movegen;
pub mod san;
pub mod types;

pub use attacks::{attackers, is_attacked, is_king_in_check, king_square};
pub use board::{Board, Position, apply_move};
pub use fen::{STARTING_FEN, decode_fen, encode_fen, initial_position};
pub use game::{Game, MoveRecord, evaluate, game_status};
pub use history::{History, Signature};
pub use movegen::{all_legal_moves, find_move, legal_moves, legal_moves_for_side};
pub use san::{move_to_san, parse_san};
pub use types::*;
