//! Drives games between strategies and collects the results.

use crate::config::PlayerConfig;
use crate::error::GameError;
use crate::game::GameState;
use crate::line::PlayerId;
use crate::players::{PlayerKind, Strategy, make_player};
use crate::random::{SeededRandomGenerator, StandardRandomGenerator};
use crate::results::{GameRecord, ResultTally, append_record};
use crate::variants::GameVariant;
use std::path::PathBuf;
use tracing::{debug, info, trace};

/// Plays `state` to the end, asking the player in seat `current_player - 1`
/// for each move.
///
/// Fails with [`GameError::NoMoveAvailable`] when a seat is empty or its
/// player produces no move, and with the game's error if the move is
/// rejected.
pub fn play_match(
    mut state: GameState,
    players: &mut [Box<dyn Strategy>],
) -> Result<GameState, GameError> {
    while !state.is_finished() {
        let current = state.current_player();
        let player = usize::from(current)
            .checked_sub(1)
            .and_then(|seat| players.get_mut(seat))
            .ok_or(GameError::NoMoveAvailable { player: current })?;
        let mv = player
            .choose_move(&state)
            .ok_or(GameError::NoMoveAvailable { player: current })?;
        let outcome = state.apply_move(mv)?;
        trace!(player = current, %mv, boxes = outcome.boxes_claimed, "move played");
    }

    debug!(scores = ?state.scores(), winner = ?state.winner(), "match finished");
    Ok(state)
}

/// A run of games between two kinds of players on one board size.
#[derive(Debug, Clone)]
pub struct Series {
    pub width: usize,
    pub height: usize,
    pub variant: GameVariant,
    pub players: [PlayerKind; 2],
    pub games: usize,
    pub player_config: PlayerConfig,
    /// Result log every finished game is appended to.
    pub log_path: Option<PathBuf>,
}

impl Series {
    pub fn new(width: usize, height: usize, players: [PlayerKind; 2]) -> Self {
        Self {
            width,
            height,
            variant: GameVariant::Standard,
            players,
            games: 1,
            player_config: PlayerConfig::default(),
            log_path: None,
        }
    }

    pub fn with_variant(mut self, variant: GameVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_games(mut self, games: usize) -> Self {
        self.games = games;
        self
    }

    pub fn with_player_config(mut self, player_config: PlayerConfig) -> Self {
        self.player_config = player_config;
        self
    }

    pub fn with_log_path(mut self, log_path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(log_path.into());
        self
    }

    /// Config for one seat in one game. A seeded series hands every seat of
    /// every game its own seed, so games differ but stay reproducible.
    fn seat_config(&self, game: usize, seat: usize) -> PlayerConfig {
        let mut config = self.player_config.clone();
        config.seed = config
            .seed
            .map(|seed| seed.wrapping_add((game * 3 + seat) as u64));
        config
    }

    fn new_game(&self, game: usize) -> Result<GameState, GameError> {
        match self.seat_config(game, 0).seed {
            Some(seed) => self.variant.build(
                self.width,
                self.height,
                &mut SeededRandomGenerator::new(seed),
            ),
            None => self
                .variant
                .build(self.width, self.height, &mut StandardRandomGenerator),
        }
    }
}

/// Plays every game of `series` with freshly built players, appending each
/// finished game to the series log when one is set.
pub fn play_series(series: &Series) -> Result<ResultTally, GameError> {
    let mut tally = ResultTally::default();

    for game in 0..series.games {
        let mut players: Vec<Box<dyn Strategy>> = series
            .players
            .iter()
            .enumerate()
            .map(|(seat, &kind)| {
                make_player(kind, (seat + 1) as PlayerId, &series.seat_config(game, seat + 1))
            })
            .collect();

        let state = play_match(series.new_game(game)?, &mut players)?;
        let record = GameRecord::from_state(&state);
        if let Some(path) = &series.log_path {
            append_record(path, &record)?;
        }
        tally.add(&record);
    }

    info!(
        p1 = %series.players[0],
        p2 = %series.players[1],
        width = series.width,
        height = series.height,
        "{tally}"
    );
    Ok(tally)
}

/// Exploration constants 1.0 to 5.0 in steps of 0.2, followed by √2.
pub fn default_exploration_values() -> Vec<f64> {
    (10..=50)
        .step_by(2)
        .map(|tenths| f64::from(tenths) / 10.0)
        .chain([std::f64::consts::SQRT_2])
        .collect()
}

/// Plays `series` once per exploration constant, with every MCTS seat using
/// that constant.
///
/// When the series has a log, each constant gets its own file next to it,
/// named after the log with a `_c-<value>` suffix.
pub fn exploration_sweep(
    series: &Series,
    values: &[f64],
) -> Result<Vec<(f64, ResultTally)>, GameError> {
    values
        .iter()
        .map(|&exploration| {
            let mut run = series.clone();
            run.player_config.mcts.exploration = exploration;
            run.log_path = series.log_path.as_ref().map(|path| {
                let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                path.with_file_name(format!("{stem}_c-{exploration}.txt"))
            });
            debug!(exploration, "starting exploration run");
            Ok((exploration, play_series(&run)?))
        })
        .collect()
}
