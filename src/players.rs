//! The different kinds of players and the factory that builds them.

use crate::config::PlayerConfig;
use crate::game::GameState;
use crate::grid::Move;
use crate::line::PlayerId;
use crate::mcts::MonteCarloTreeSearch;
use crate::minimax::Minimax;
use crate::random::{RandomGenerator, SeededRandomGenerator, StandardRandomGenerator};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum PlayerKind {
    Human,
    Random,
    Ordered,
    Minimax,
    Mcts,
}

impl PlayerKind {
    pub const ALL: [PlayerKind; 5] = [
        PlayerKind::Human,
        PlayerKind::Random,
        PlayerKind::Ordered,
        PlayerKind::Minimax,
        PlayerKind::Mcts,
    ];
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerKind::Human => "human",
            PlayerKind::Random => "random",
            PlayerKind::Ordered => "ordered",
            PlayerKind::Minimax => "minimax",
            PlayerKind::Mcts => "mcts",
        };
        f.write_str(name)
    }
}

impl FromStr for PlayerKind {
    type Err = String;

    /// Accepts the short names (`"minimax"`) as well as the long labels
    /// (`"Minimax Player"`, `"Monte Carlo Player"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_suffix(" player").unwrap_or(&lower).trim();
        match name {
            "human" => Ok(PlayerKind::Human),
            "random" => Ok(PlayerKind::Random),
            "ordered" => Ok(PlayerKind::Ordered),
            "minimax" => Ok(PlayerKind::Minimax),
            "mcts" | "monte carlo" => Ok(PlayerKind::Mcts),
            _ => Err(format!("unknown player kind {s:?}")),
        }
    }
}

/// Something that can pick moves for one seat at the table.
pub trait Strategy {
    /// Picks a legal move for the player to move in `state`.
    ///
    /// Returns `None` when the game is over, or for players that are driven
    /// from outside (humans).
    fn choose_move(&mut self, state: &GameState) -> Option<Move>;

    /// The seat this player occupies, starting at 1.
    fn index(&self) -> PlayerId;

    fn kind(&self) -> PlayerKind;

    fn is_human(&self) -> bool {
        self.kind() == PlayerKind::Human
    }

    /// `"<index>_<kind>"`, also used to name result files.
    fn name(&self) -> String {
        format!("{}_{}", self.index(), self.kind())
    }
}

/// A player whose moves come from outside, e.g. a user interface.
#[derive(Debug, Clone)]
pub struct HumanPlayer {
    index: PlayerId,
}

impl HumanPlayer {
    pub fn new(index: PlayerId) -> Self {
        Self { index }
    }
}

impl Strategy for HumanPlayer {
    fn choose_move(&mut self, _state: &GameState) -> Option<Move> {
        None
    }

    fn index(&self) -> PlayerId {
        self.index
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Human
    }
}

/// Plays a uniformly random legal move.
#[derive(Debug, Clone)]
pub struct RandomPlayer<K: RandomGenerator> {
    index: PlayerId,
    random: K,
}

impl<K: RandomGenerator> RandomPlayer<K> {
    pub fn new(index: PlayerId, random: K) -> Self {
        Self { index, random }
    }
}

impl<K: RandomGenerator> Strategy for RandomPlayer<K> {
    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        self.random.choose(state.legal_moves()).copied()
    }

    fn index(&self) -> PlayerId {
        self.index
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Random
    }
}

/// Always plays the middle entry of the legal-move list.
#[derive(Debug, Clone)]
pub struct OrderedPlayer {
    index: PlayerId,
}

impl OrderedPlayer {
    pub fn new(index: PlayerId) -> Self {
        Self { index }
    }
}

impl Strategy for OrderedPlayer {
    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        let moves = state.legal_moves();
        moves.get(moves.len() / 2).copied()
    }

    fn index(&self) -> PlayerId {
        self.index
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Ordered
    }
}

impl<K: RandomGenerator> Strategy for Minimax<K> {
    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        Minimax::choose_move(self, state)
    }

    fn index(&self) -> PlayerId {
        self.player()
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Minimax
    }
}

/// Monte Carlo Tree Search player. The search tree is kept between turns.
pub struct MctsPlayer<K: RandomGenerator> {
    engine: MonteCarloTreeSearch<GameState, K>,
}

impl<K: RandomGenerator> MctsPlayer<K> {
    pub fn new(engine: MonteCarloTreeSearch<GameState, K>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &MonteCarloTreeSearch<GameState, K> {
        &self.engine
    }

    /// `chosen` if it can be played in `state`, otherwise a random legal move.
    fn playable_or_random(&mut self, state: &GameState, chosen: Option<Move>) -> Option<Move> {
        match chosen {
            Some(mv) if state.is_legal(mv) => Some(mv),
            other => {
                warn!(
                    player = self.engine.player(),
                    chosen = ?other,
                    "search result is not playable, playing randomly"
                );
                self.engine.random_move(state)
            }
        }
    }
}

impl<K: RandomGenerator> Strategy for MctsPlayer<K> {
    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        if state.is_finished() {
            return None;
        }

        self.engine.update(state);
        self.engine.search();
        let chosen = self.engine.next_move();
        self.playable_or_random(state, chosen)
    }

    fn index(&self) -> PlayerId {
        self.engine.player()
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Mcts
    }
}

/// Builds a player of the given kind for seat `index`.
///
/// When `config.seed` is set every random choice the player makes is drawn
/// from a generator seeded with it.
pub fn make_player(kind: PlayerKind, index: PlayerId, config: &PlayerConfig) -> Box<dyn Strategy> {
    match config.seed {
        Some(seed) => build_player(kind, index, config, SeededRandomGenerator::new(seed)),
        None => build_player(kind, index, config, StandardRandomGenerator),
    }
}

fn build_player<K: RandomGenerator + 'static>(
    kind: PlayerKind,
    index: PlayerId,
    config: &PlayerConfig,
    random: K,
) -> Box<dyn Strategy> {
    match kind {
        PlayerKind::Human => Box::new(HumanPlayer::new(index)),
        PlayerKind::Random => Box::new(RandomPlayer::new(index, random)),
        PlayerKind::Ordered => Box::new(OrderedPlayer::new(index)),
        PlayerKind::Minimax => Box::new(Minimax::new(index, &config.minimax, random)),
        PlayerKind::Mcts => Box::new(MctsPlayer::new(
            MonteCarloTreeSearch::builder(index)
                .with_random_generator(random)
                .with_config(config.mcts.clone())
                .build(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MctsConfig;
    use std::time::Duration;

    fn play_out(state: &mut GameState, players: &mut [Box<dyn Strategy>; 2]) {
        while !state.is_finished() {
            let seat = usize::from(state.current_player()) - 1;
            let mv = players[seat].choose_move(state).unwrap();
            state.apply_move(mv).unwrap();
        }
    }

    #[test]
    fn factory_names_players() {
        let config = PlayerConfig::for_testing(1);

        let names: Vec<String> = PlayerKind::ALL
            .iter()
            .map(|&kind| make_player(kind, 1, &config).name())
            .collect();

        assert_eq!(
            names,
            ["1_human", "1_random", "1_ordered", "1_minimax", "1_mcts"]
        );
        assert!(make_player(PlayerKind::Human, 2, &config).is_human());
        assert!(!make_player(PlayerKind::Mcts, 2, &config).is_human());
        assert_eq!(make_player(PlayerKind::Minimax, 2, &config).index(), 2);
    }

    #[test]
    fn kinds_parse_from_text() {
        for kind in PlayerKind::ALL {
            assert_eq!(kind.to_string().parse::<PlayerKind>(), Ok(kind));
        }
        assert_eq!("Monte Carlo Player".parse::<PlayerKind>(), Ok(PlayerKind::Mcts));
        assert_eq!(" Ordered Player ".parse::<PlayerKind>(), Ok(PlayerKind::Ordered));
        assert!("grandmaster".parse::<PlayerKind>().is_err());
    }

    #[test]
    fn human_never_moves() {
        let state = GameState::new(3, 3).unwrap();
        assert_eq!(HumanPlayer::new(1).choose_move(&state), None);
    }

    #[test]
    fn ordered_players_on_4x4() {
        // arrange
        let config = PlayerConfig::default();
        let mut players = [
            make_player(PlayerKind::Ordered, 1, &config),
            make_player(PlayerKind::Ordered, 2, &config),
        ];
        let mut state = GameState::new(4, 4).unwrap();

        // act
        play_out(&mut state, &mut players);

        // assert
        let scores = state.scores();
        assert_eq!((scores[&0], scores[&1], scores[&2]), (0, 3, 6));
        assert_eq!(state.winner(), Some(2));
    }

    #[test]
    fn random_player_moves_are_legal_and_reproducible() {
        let state = GameState::new(4, 3).unwrap();
        let mut a = RandomPlayer::new(1, SeededRandomGenerator::new(8));
        let mut b = RandomPlayer::new(1, SeededRandomGenerator::new(8));

        for _ in 0..10 {
            let mv = a.choose_move(&state).unwrap();
            assert!(state.is_legal(mv));
            assert_eq!(Some(mv), b.choose_move(&state));
        }
    }

    #[test]
    fn mcts_player_finishes_a_game_against_random() {
        // arrange
        let config = PlayerConfig::for_testing(21);
        let mut players = [
            make_player(PlayerKind::Random, 1, &config),
            make_player(PlayerKind::Mcts, 2, &config),
        ];
        let mut state = GameState::new(3, 3).unwrap();

        // act
        play_out(&mut state, &mut players);

        // assert
        assert!(state.is_finished());
        let scores = state.scores();
        assert_eq!(scores[&1] + scores[&2], 4);
    }

    #[test]
    fn minimax_player_finishes_a_game_against_ordered() {
        let config = PlayerConfig::for_testing(3);
        let mut players = [
            make_player(PlayerKind::Minimax, 1, &config),
            make_player(PlayerKind::Ordered, 2, &config),
        ];
        let mut state = GameState::new(3, 3).unwrap();

        play_out(&mut state, &mut players);

        assert!(state.is_finished());
        assert_eq!(state.moves_made().len(), 12);
    }

    fn mcts_player(seed: u64, config: MctsConfig) -> MctsPlayer<SeededRandomGenerator> {
        MctsPlayer::new(
            MonteCarloTreeSearch::builder(1)
                .with_random_generator(SeededRandomGenerator::new(seed))
                .with_config(config)
                .build(),
        )
    }

    #[test]
    fn mcts_player_replaces_an_unplayable_move() {
        // arrange
        let mut player = mcts_player(6, MctsConfig::for_testing());
        let mut state = GameState::new(3, 3).unwrap();
        let first = player.choose_move(&state).unwrap();
        state.apply_move(first).unwrap();

        // act
        let replacement = player.playable_or_random(&state, Some(first));
        let off_board = player.playable_or_random(&state, Some(Move::horizontal(9, 9)));
        let missing = player.playable_or_random(&state, None);

        // assert
        for mv in [replacement, off_board, missing] {
            let mv = mv.unwrap();
            assert_ne!(mv, first);
            assert!(state.is_legal(mv));
        }
    }

    #[test]
    fn mcts_player_keeps_a_playable_move() {
        let mut player = mcts_player(6, MctsConfig::for_testing());
        let state = GameState::new(3, 3).unwrap();
        let mv = state.legal_moves()[5];

        assert_eq!(player.playable_or_random(&state, Some(mv)), Some(mv));
    }

    #[test]
    fn zero_budget_still_yields_legal_moves() {
        // arrange
        let mut config = PlayerConfig::for_testing(12).with_time_limit(Duration::ZERO);
        config.mcts.max_iterations = None;
        let mut state = GameState::new(3, 3).unwrap();
        state.apply_move(Move::horizontal(0, 0)).unwrap();

        for kind in [PlayerKind::Mcts, PlayerKind::Minimax] {
            let mut player = make_player(kind, state.current_player(), &config);

            // act
            let mv = player.choose_move(&state);

            // assert
            assert!(mv.is_some_and(|mv| state.is_legal(mv)), "{kind} gave {mv:?}");
        }
    }

    #[test]
    fn mcts_player_returns_none_once_finished() {
        let mut state = GameState::new(2, 2).unwrap();
        for mv in state.legal_moves().to_vec() {
            state.apply_move(mv).unwrap();
        }
        let mut player = make_player(PlayerKind::Mcts, 1, &PlayerConfig::for_testing(4));

        assert_eq!(player.choose_move(&state), None);
    }
}
