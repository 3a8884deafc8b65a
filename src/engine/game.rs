//! Game-end evaluation and the stateful game controller.
//!
//! `evaluate` is a pure function of a position and its repetition history.
//! `Game` owns one game's position, history and move records, and is the
//! only place moves requested by a host are validated before execution.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::engine::board::{Board, Position};
use crate::engine::history::History;
use crate::engine::movegen;
use crate::engine::san;
use crate::engine::types::{
    ChessError, Color, DrawReason, GameStatus, Move, Outcome, PieceType, Square,
};

// =========================================================================
// Evaluator
// =========================================================================

/// Status of `pos` under the standard thresholds (100 plies, threefold).
pub fn game_status(pos: &Position, history: &History) -> GameStatus {
    evaluate(pos, history, &GameConfig::default())
}

/// Status of `pos` under configured thresholds. Every outcome that holds is
/// reported; callers decide precedence.
pub fn evaluate(pos: &Position, history: &History, config: &GameConfig) -> GameStatus {
    let side = pos.side_to_move;
    let in_check = pos.is_in_check();
    let mut outcomes = Vec::new();

    if movegen::legal_moves_for_side(pos, side).is_empty() {
        outcomes.push(if in_check {
            Outcome::Checkmate(side)
        } else {
            Outcome::Stalemate
        });
    }

    if pos.halfmove_clock >= config.fifty_move_plies {
        outcomes.push(Outcome::Draw(DrawReason::FiftyMoveRule));
    }

    if history.count(pos) >= config.repetition_count {
        outcomes.push(Outcome::Draw(DrawReason::ThreefoldRepetition));
    }

    if is_insufficient_material(&pos.board) {
        outcomes.push(Outcome::Draw(DrawReason::InsufficientMaterial));
    }

    trace!(fen = %pos.to_fen(), in_check, ?outcomes, "evaluated status");
    GameStatus { in_check, outcomes }
}

/// Insufficient material detection.
///
/// Draws: K vs K, K+B vs K, K+N vs K, K+B vs K+B (same color bishops).
pub fn is_insufficient_material(board: &Board) -> bool {
    // Any pawns, rooks, or queens → sufficient.
    let heavy = board.pieces().any(|(_, p)| {
        matches!(p.kind, PieceType::Pawn | PieceType::Rook | PieceType::Queen)
    });
    if heavy {
        return false;
    }

    let minors = |color: Color| -> Vec<(Square, PieceType)> {
        board
            .pieces_of(color)
            .filter(|(_, p)| matches!(p.kind, PieceType::Knight | PieceType::Bishop))
            .map(|(sq, p)| (sq, p.kind))
            .collect()
    };
    let white = minors(Color::White);
    let black = minors(Color::Black);

    match (white.as_slice(), black.as_slice()) {
        // K vs K, K+minor vs K
        ([], []) | ([_], []) | ([], [_]) => true,
        // bishops on one shade can never mate
        ([(w_sq, PieceType::Bishop)], [(b_sq, PieceType::Bishop)]) => {
            w_sq.is_dark() == b_sq.is_dark()
        }
        _ => false,
    }
}

// =========================================================================
// MoveRecord
// =========================================================================

/// One played move as the controller saw it.
#[derive(Clone, Debug)]
pub struct MoveRecord {
    /// The move as generated, mover snapshot included.
    pub mv: Move,
    /// The SAN notation for the move, with `+` or `#` when it checks.
    pub san: String,
    /// Status of the position the move produced.
    pub status_after: GameStatus,
}

// =========================================================================
// Game
// =========================================================================

/// One game: position, repetition history and status tracking.
#[derive(Clone, Debug)]
pub struct Game {
    // Core state
    position: Position,
    move_history: Vec<MoveRecord>,
    /// Signatures of all positions reached, current one included.
    history: History,
    config: GameConfig,

    // Status
    status: GameStatus,

    // Metadata
    pub id: String,
    pub created_at: DateTime<Utc>,

    // FEN tracking
    starting_fen: String,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// A game from the standard opening setup.
    pub fn new() -> Self {
        Self::start(Position::starting(), GameConfig::default())
    }

    /// Create a game from a configuration: its starting FEN and thresholds.
    pub fn with_config(config: GameConfig) -> Result<Self, ChessError> {
        let pos = Position::from_fen(&config.start_fen)?;
        Ok(Self::start(pos, config))
    }

    /// Create a game from a FEN string with the standard thresholds.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let pos = Position::from_fen(fen)?;
        Ok(Self::start(pos, GameConfig::default()))
    }

    fn start(position: Position, config: GameConfig) -> Self {
        let history = History::starting_at(&position);
        let status = evaluate(&position, &history, &config);
        let game = Self {
            starting_fen: position.to_fen(),
            position,
            move_history: Vec::new(),
            history,
            config,
            status,
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };
        debug!(game_id = %game.id, fen = %game.starting_fen, "game created");
        game
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Repetition history, starting position included.
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Status as of the last applied move.
    pub fn status(&self) -> &GameStatus {
        &self.status
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    /// Moves played so far, oldest first.
    pub fn move_history(&self) -> &[MoveRecord] {
        &self.move_history
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        movegen::all_legal_moves(&self.position)
    }

    /// Legal moves of the piece on `sq`; empty for an empty square or the
    /// opponent's piece.
    pub fn legal_moves_from(&self, sq: Square) -> Vec<Move> {
        movegen::legal_moves(&self.position, sq)
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_game_over()
    }

    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    /// The FEN the game started from.
    pub fn starting_fen(&self) -> &str {
        &self.starting_fen
    }

    pub fn fullmove_number(&self) -> u16 {
        self.position.fullmove_number
    }

    /// Plies since the last pawn move or capture.
    pub fn halfmove_clock(&self) -> u16 {
        self.position.halfmove_clock
    }

    // -----------------------------------------------------------------
    // Make move
    // -----------------------------------------------------------------

    fn ensure_in_progress(&self) -> Result<(), ChessError> {
        if self.status.is_game_over() {
            return Err(ChessError::GameOver(self.status.to_string()));
        }
        Ok(())
    }

    /// Play a move. Returns the SAN notation of the move played.
    ///
    /// Returns `ChessError::GameOver` if the game is already finished, or
    /// `ChessError::IllegalMoveRequested` if the move is not legal here.
    pub fn make_move(&mut self, mv: Move) -> Result<String, ChessError> {
        self.ensure_in_progress()?;

        let legal = self.legal_moves();
        if !legal.contains(&mv) {
            return Err(ChessError::IllegalMoveRequested {
                from: mv.from.to_algebraic(),
                to: mv.to.to_algebraic(),
                reason: "not a legal move".into(),
            });
        }

        // SAN needs the position before the move.
        let san = san::move_to_san(&self.position, mv, &legal);

        self.position = self.position.apply(mv);
        self.history.record(&self.position);

        let status = evaluate(&self.position, &self.history, &self.config);
        self.status = status.clone();

        let san = if status.checkmated().is_some() {
            format!("{san}#")
        } else if status.in_check {
            format!("{san}+")
        } else {
            san
        };

        debug!(
            game_id = %self.id,
            %mv,
            san = %san,
            status = %status,
            "move applied"
        );

        self.move_history.push(MoveRecord {
            mv,
            san: san.clone(),
            status_after: status,
        });

        Ok(san)
    }

    /// Play the legal move from `from` to `to`.
    pub fn play(&mut self, from: Square, to: Square) -> Result<String, ChessError> {
        self.ensure_in_progress()?;
        let mv = movegen::find_move(&self.position, from, to)?;
        self.make_move(mv)
    }

    /// Play a move given in SAN.
    pub fn play_san(&mut self, text: &str) -> Result<String, ChessError> {
        self.ensure_in_progress()?;
        let mv = san::parse_san(&self.position, text)?;
        self.make_move(mv)
    }

    // -----------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------

    /// Replace the game with a new starting position. Move records and
    /// repetition history start over; id and config are kept.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), ChessError> {
        let pos = Position::from_fen(fen)?;
        self.history = History::starting_at(&pos);
        self.status = evaluate(&pos, &self.history, &self.config);
        self.starting_fen = pos.to_fen();
        self.position = pos;
        self.move_history.clear();
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
