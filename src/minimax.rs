use crate::config::MinimaxConfig;
use crate::game::GameState;
use crate::grid::Move;
use crate::line::PlayerId;
use crate::random::{RandomGenerator, StandardRandomGenerator};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Bound used for the initial alpha/beta window and the starting best scores.
pub const SCORE_BOUND: i32 = 10_000;

/// Depth-limited minimax with alpha-beta pruning and iterative deepening.
///
/// Every depth limit from 1 up to `max_depth` is searched in turn until the
/// time budget runs out. The clock is only looked at between root moves, so
/// one root move's subtree can overrun the budget.
pub struct Minimax<K: RandomGenerator> {
    player: PlayerId,
    time_limit: Duration,
    max_depth: u32,
    random: K,
}

impl<K: RandomGenerator> Minimax<K> {
    pub fn new(player: PlayerId, config: &MinimaxConfig, random: K) -> Self {
        Self {
            player,
            time_limit: config.time_limit,
            max_depth: config.max_depth,
            random,
        }
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// The opponent in a two-player game.
    fn opponent(&self) -> PlayerId {
        if self.player == 1 { 2 } else { 1 }
    }

    /// Picks a move for the engine's player, or `None` if the game is over.
    ///
    /// The best score is reset for every depth limit, and the move reported
    /// is the best one of the deepest limit that scored at least one root
    /// move. Equal scores go to the move enumerated last.
    pub fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        let moves = state.legal_moves();
        if moves.is_empty() {
            return None;
        }

        let start = Instant::now();
        let mut best_move = None;
        let mut depth = 1;
        while start.elapsed() <= self.time_limit && depth <= self.max_depth {
            let mut depth_best: Option<(Move, i32)> = None;
            for &mv in moves {
                let mut child = state.clone();
                if child.apply_move(mv).is_err() {
                    continue;
                }
                let score = self.score(&child, depth, -SCORE_BOUND, SCORE_BOUND);
                if depth_best.is_none_or(|(_, best)| score >= best) {
                    depth_best = Some((mv, score));
                }
                if start.elapsed() >= self.time_limit {
                    break;
                }
            }

            if let Some((mv, score)) = depth_best {
                trace!(player = self.player, depth, %mv, score, "depth searched");
                best_move = Some(mv);
            }
            depth += 1;
        }

        debug!(
            player = self.player,
            depth_reached = depth - 1,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "minimax search finished"
        );

        match best_move {
            Some(mv) if state.is_legal(mv) => Some(mv),
            _ => {
                warn!(player = self.player, "minimax found no move, playing randomly");
                self.random.choose(moves).copied()
            }
        }
    }

    /// Alpha-beta score of `state`, searching `depth` more plies.
    pub fn score(&self, state: &GameState, depth: u32, mut alpha: i32, mut beta: i32) -> i32 {
        if depth == 0 || state.is_finished() {
            return self.evaluate(state);
        }

        let maximise = state.current_player() == self.player;
        let mut best = if maximise { -SCORE_BOUND } else { SCORE_BOUND };
        for &mv in state.legal_moves() {
            let mut child = state.clone();
            if child.apply_move(mv).is_err() {
                continue;
            }
            let score = self.score(&child, depth - 1, alpha, beta);
            if maximise {
                best = best.max(score);
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }
            if beta <= alpha {
                break;
            }
        }
        best
    }

    /// Static evaluation from the engine's point of view.
    ///
    /// Each box is worth 10. Boxes with three sides are worth +5 to whoever
    /// moves next, boxes with two sides are worth -1 to them.
    pub fn evaluate(&self, state: &GameState) -> i32 {
        let opponent = self.opponent();
        let mut score = 10 * state.score(self.player) as i32 - 10 * state.score(opponent) as i32;

        let sign = if state.current_player() == self.player {
            1
        } else if state.current_player() == opponent {
            -1
        } else {
            return score;
        };

        let lines = state.grid().lines();
        for square in state.squares() {
            score += sign
                * match square.sides_completed(lines) {
                    2 => -1,
                    3 => 5,
                    _ => 0,
                };
        }
        score
    }
}

impl Minimax<StandardRandomGenerator> {
    /// An engine with default settings and an unseeded fallback generator.
    pub fn for_player(player: PlayerId) -> Self {
        Self::new(player, &MinimaxConfig::default(), StandardRandomGenerator)
    }
}
