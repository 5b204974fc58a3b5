//! Search and player configuration.

use std::time::Duration;

/// Arena size past which the MCTS engine compacts its tree after re-rooting.
pub const DEFAULT_NODE_CAPACITY: usize = 200_000;

/// Configuration for the minimax player.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimaxConfig {
    /// Wall-clock budget per move. Checked between root moves, so a single
    /// subtree search can overrun it.
    pub time_limit: Duration,

    /// Deepest iterative-deepening limit to try.
    pub max_depth: u32,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(5),
            max_depth: 20,
        }
    }
}

impl MinimaxConfig {
    /// Shallow and quick, for tests.
    pub fn for_testing() -> Self {
        Self {
            time_limit: Duration::from_secs(10),
            max_depth: 2,
        }
    }
}

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Wall-clock budget per move, checked between iterations.
    pub time_limit: Duration,

    /// Exploration constant `c` of the UCB1 formula.
    /// Higher values encourage exploration, lower values favor exploitation.
    pub exploration: f64,

    /// Arena size past which discarded subtrees are collected.
    pub node_capacity: usize,

    /// Optional cap on iterations per move, on top of the time limit.
    /// Set it together with a seeded generator for reproducible searches.
    pub max_iterations: Option<u32>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(5),
            exploration: std::f64::consts::SQRT_2,
            node_capacity: DEFAULT_NODE_CAPACITY,
            max_iterations: None,
        }
    }
}

impl MctsConfig {
    /// Iteration-bounded search, for tests.
    pub fn for_testing() -> Self {
        Self {
            time_limit: Duration::from_secs(10),
            max_iterations: Some(500),
            ..Self::default()
        }
    }
}

/// Everything [`make_player`](crate::players::make_player) needs to build any
/// kind of player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerConfig {
    pub minimax: MinimaxConfig,
    pub mcts: MctsConfig,
    /// Seed for the player's random generator. `None` draws from the thread
    /// generator.
    pub seed: Option<u64>,
}

impl PlayerConfig {
    pub fn for_testing(seed: u64) -> Self {
        Self {
            minimax: MinimaxConfig::for_testing(),
            mcts: MctsConfig::for_testing(),
            seed: Some(seed),
        }
    }

    /// Same budget for both search engines.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.minimax.time_limit = time_limit;
        self.mcts.time_limit = time_limit;
        self
    }
}
