use crate::grid::Move;
use crate::line::PlayerId;
use thiserror::Error;

/// Errors reported by the game model, the players and the result log.
///
/// None of these are fatal: a rejected move leaves the game untouched, and the
/// search engines never surface an error for running out of time.
#[derive(Debug, Error)]
pub enum GameError {
    /// The move addresses a real line, but that line is already claimed.
    #[error("illegal move {0}")]
    IllegalMove(Move),

    /// The input does not address any line of the board.
    #[error("malformed move: {0}")]
    MalformedMove(String),

    #[error("invalid board dimensions {width}x{height}, both must be at least 2")]
    InvalidDimensions { width: usize, height: usize },

    /// A player was asked to move but produced nothing (e.g. a human player).
    #[error("player {player} has no move to make")]
    NoMoveAvailable { player: PlayerId },

    #[error("malformed result record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("result log i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
