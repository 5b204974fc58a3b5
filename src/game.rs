use crate::board::{Board, GameOutcome};
use crate::error::GameError;
use crate::grid::{Grid, Move, Orientation};
use crate::line::{Owner, PlayerId};
use crate::square::Square;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Number of players the search engines are written for.
pub const DEFAULT_PLAYERS: PlayerId = 2;

/// What a successful [`GameState::apply_move`] did.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct MoveOutcome {
    /// Boxes completed by the move: 0, 1 or 2.
    pub boxes_claimed: usize,
    /// `true` when the turn went to the next player.
    pub turn_passes: bool,
}

/// A game of Dots-and-Boxes in progress.
///
/// The state has value semantics: `clone` produces a fully independent copy,
/// which is what both search engines rely on when they explore branches.
#[derive(Debug, Clone)]
pub struct GameState {
    grid: Grid,
    current_player: PlayerId,
    max_players: PlayerId,
    moves_made: Vec<Move>,
    legal_moves: Vec<Move>,
}

impl GameState {
    /// Creates an empty two-player board with player 1 to move.
    pub fn new(width: usize, height: usize) -> Result<Self, GameError> {
        Self::with_players(width, height, DEFAULT_PLAYERS)
    }

    pub fn with_players(
        width: usize,
        height: usize,
        max_players: PlayerId,
    ) -> Result<Self, GameError> {
        let grid = Grid::new(width, height)?;
        let legal_moves = grid.all_moves().collect();
        Ok(Self {
            grid,
            current_player: 1,
            max_players: max_players.max(1),
            moves_made: Vec::new(),
            legal_moves,
        })
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn squares(&self) -> &[Square] {
        self.grid.squares()
    }

    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    pub fn max_players(&self) -> PlayerId {
        self.max_players
    }

    pub fn moves_made(&self) -> &[Move] {
        &self.moves_made
    }

    /// The unclaimed lines, in board generation order.
    pub fn legal_moves(&self) -> &[Move] {
        &self.legal_moves
    }

    /// Rebuilds the legal-move cache from the lines themselves.
    pub fn regenerate_legal_moves(&mut self) -> &[Move] {
        let grid = &self.grid;
        self.legal_moves = grid
            .all_moves()
            .filter(|&mv| grid.line(mv).is_some_and(|line| !line.is_claimed()))
            .collect();
        &self.legal_moves
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.legal_moves.contains(&mv)
    }

    pub fn is_finished(&self) -> bool {
        self.legal_moves.is_empty()
    }

    /// Owner of the addressed line, or `None` if the move is off the board.
    pub fn line_owner(&self, mv: Move) -> Option<Owner> {
        self.grid.line(mv).map(|line| line.owner())
    }

    /// Claims a line for the player to move.
    ///
    /// A rejected move is logged and reported as an error; the state is left
    /// exactly as it was.
    pub fn apply_move(&mut self, mv: Move) -> Result<MoveOutcome, GameError> {
        let Some(position) = self.legal_moves.iter().position(|&m| m == mv) else {
            let error = if self.grid.line_index(mv).is_none() {
                GameError::MalformedMove(format!("{mv} is outside the board"))
            } else {
                GameError::IllegalMove(mv)
            };
            warn!(%mv, player = self.current_player, "rejected move: {error}");
            return Err(error);
        };

        self.grid.claim(mv, Owner::Player(self.current_player))?;
        self.legal_moves.remove(position);
        self.moves_made.push(mv);

        let boxes_claimed = self.grid.complete_squares_around(mv, self.current_player);
        let turn_passes = boxes_claimed == 0;
        if turn_passes {
            self.advance_player();
        }

        Ok(MoveOutcome {
            boxes_claimed,
            turn_passes,
        })
    }

    /// Fills a line with the [`Owner::Blocked`] pseudo-owner. Used by game
    /// variants before play starts; the line is not recorded as a move and no
    /// box is awarded for it.
    pub(crate) fn block_line(&mut self, mv: Move) -> Result<(), GameError> {
        let position = self
            .legal_moves
            .iter()
            .position(|&m| m == mv)
            .ok_or(GameError::IllegalMove(mv))?;
        self.grid.claim(mv, Owner::Blocked)?;
        self.legal_moves.remove(position);
        Ok(())
    }

    /// Box counts per player, plus the number of unowned boxes under key 0.
    pub fn scores(&self) -> BTreeMap<PlayerId, usize> {
        let mut scores: BTreeMap<PlayerId, usize> =
            (0..=self.max_players).map(|player| (player, 0)).collect();
        for square in self.grid.squares() {
            *scores.entry(square.owner().unwrap_or(0)).or_insert(0) += 1;
        }
        scores
    }

    pub fn score(&self, player: PlayerId) -> usize {
        self.grid
            .squares()
            .iter()
            .filter(|square| square.owner() == Some(player))
            .count()
    }

    /// The player with the most boxes once the game is over.
    ///
    /// Returns `None` while the game is running and when the top score is
    /// shared by more than one player.
    pub fn winner(&self) -> Option<PlayerId> {
        match self.outcome() {
            GameOutcome::Winner(player) => Some(player),
            _ => None,
        }
    }

    pub fn outcome(&self) -> GameOutcome {
        if !self.is_finished() {
            return GameOutcome::InProgress;
        }

        let scores = self.scores();
        let best = (1..=self.max_players)
            .map(|player| scores[&player])
            .max()
            .unwrap_or(0);
        let mut leaders = (1..=self.max_players).filter(|player| scores[player] == best);
        match (leaders.next(), leaders.next()) {
            (Some(player), None) => GameOutcome::Winner(player),
            _ => GameOutcome::Draw,
        }
    }

    fn advance_player(&mut self) {
        self.current_player = self.current_player % self.max_players + 1;
    }
}

impl PartialEq for GameState {
    /// Two states are equal when the same lines are claimed, every box has the
    /// same owner and the same player is to move. Who claimed a line, and in
    /// which order, does not matter.
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.current_player == other.current_player
            && self
                .grid
                .lines()
                .iter()
                .zip(other.grid.lines())
                .all(|(a, b)| a.is_claimed() == b.is_claimed())
            && self
                .grid
                .squares()
                .iter()
                .zip(other.grid.squares())
                .all(|(a, b)| a.owner() == b.owner())
    }
}

impl Eq for GameState {}

impl Board for GameState {
    type Move = Move;

    fn current_player(&self) -> PlayerId {
        self.current_player
    }

    fn outcome(&self) -> GameOutcome {
        GameState::outcome(self)
    }

    fn available_moves(&self) -> &[Move] {
        &self.legal_moves
    }

    fn perform_move(&mut self, b_move: Move) -> bool {
        self.apply_move(b_move).is_ok()
    }

    fn moves_made(&self) -> &[Move] {
        &self.moves_made
    }
}

impl fmt::Display for GameState {
    /// ASCII board. Claimed horizontal lines are `---`, unclaimed `- -`;
    /// claimed vertical lines are `|`, unclaimed `¦`. Owned boxes show their
    /// owner's number.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let claimed = |mv: Move| self.grid.line(mv).is_some_and(|line| line.is_claimed());

        for row in 0..self.height() {
            for col in 0..self.width() - 1 {
                let edge = if claimed(Move::horizontal(row, col)) { "---" } else { "- -" };
                write!(f, "*{edge}")?;
            }
            writeln!(f, "*")?;

            if row + 1 == self.height() {
                break;
            }
            for col in 0..self.width() {
                let side = if claimed(Move::new(Orientation::Vertical, col, row)) {
                    '|'
                } else {
                    '¦'
                };
                write!(f, "{side}")?;
                if let Some(square) = self.grid.square(row, col) {
                    match square.owner() {
                        Some(player) => write!(f, " {player} ")?,
                        None => write!(f, "   ")?,
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
