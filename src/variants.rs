//! Board variants that fill in some lines before play starts.
//!
//! Pre-filled lines belong to [`Owner::Blocked`](crate::line::Owner::Blocked):
//! they are not part of any player's history and never score a box on their
//! own.

use crate::error::GameError;
use crate::game::GameState;
use crate::grid::Move;
use crate::random::RandomGenerator;
use std::fmt;
use std::str::FromStr;

/// Share of lines the random variant blocks.
pub const RANDOM_BLOCKED_FRACTION: f64 = 0.25;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum GameVariant {
    #[default]
    Standard,
    /// Every line on the outer border is blocked.
    Swedish,
    /// A random quarter of the lines is blocked.
    Random,
}

impl GameVariant {
    pub fn build<K: RandomGenerator>(
        self,
        width: usize,
        height: usize,
        random: &mut K,
    ) -> Result<GameState, GameError> {
        match self {
            GameVariant::Standard => GameState::new(width, height),
            GameVariant::Swedish => new_swedish_game(width, height),
            GameVariant::Random => new_random_game(width, height, random),
        }
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameVariant::Standard => "standard",
            GameVariant::Swedish => "swedish",
            GameVariant::Random => "random",
        };
        f.write_str(name)
    }
}

impl FromStr for GameVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(GameVariant::Standard),
            "swedish" => Ok(GameVariant::Swedish),
            "random" => Ok(GameVariant::Random),
            other => Err(format!("unknown game variant {other:?}")),
        }
    }
}

/// A board whose outer border is already drawn.
pub fn new_swedish_game(width: usize, height: usize) -> Result<GameState, GameError> {
    let mut state = GameState::new(width, height)?;

    let top_and_bottom = (0..width - 1)
        .flat_map(|col| [Move::horizontal(0, col), Move::horizontal(height - 1, col)]);
    let left_and_right = (0..height - 1)
        .flat_map(|row| [Move::vertical(0, row), Move::vertical(width - 1, row)]);

    for mv in top_and_bottom.chain(left_and_right) {
        state.block_line(mv)?;
    }
    Ok(state)
}

/// A board with `floor(25%)` of its lines blocked at random.
pub fn new_random_game<K: RandomGenerator>(
    width: usize,
    height: usize,
    random: &mut K,
) -> Result<GameState, GameError> {
    let mut state = GameState::new(width, height)?;

    let mut moves = state.legal_moves().to_vec();
    random.shuffle(&mut moves);
    let blocked = (moves.len() as f64 * RANDOM_BLOCKED_FRACTION) as usize;

    for &mv in &moves[..blocked] {
        state.block_line(mv)?;
    }
    Ok(state)
}
