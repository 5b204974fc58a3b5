use crate::line::PlayerId;
use std::fmt::Debug;

/// The interface a turn-based game exposes to the tree search.
///
/// [`MonteCarloTreeSearch`](crate::mcts::MonteCarloTreeSearch) only talks to
/// the game through this trait, so its tree bookkeeping can be exercised with
/// any game state that can be cloned cheaply. Equality is what re-rooting
/// checks a reused node against.
pub trait Board: Clone + PartialEq {
    /// The type representing a move in the game.
    type Move: Copy + PartialEq + Debug;

    /// Returns the player whose turn it is to make a move.
    fn current_player(&self) -> PlayerId;

    /// Returns the current outcome of the game.
    fn outcome(&self) -> GameOutcome;

    /// Returns every legal move available from the current state.
    fn available_moves(&self) -> &[Self::Move];

    /// Applies a move. Returns `false`, leaving the state untouched, when the
    /// move is not legal.
    fn perform_move(&mut self, b_move: Self::Move) -> bool;

    /// Every move applied since the start of the game, oldest first.
    fn moves_made(&self) -> &[Self::Move];

    fn is_terminal(&self) -> bool {
        self.outcome() != GameOutcome::InProgress
    }
}

/// Represents the possible outcomes of a game.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum GameOutcome {
    /// The game is still ongoing.
    InProgress,
    /// The game is over and this player scored the most.
    Winner(PlayerId),
    /// The game is over and the top score is shared.
    Draw,
}
