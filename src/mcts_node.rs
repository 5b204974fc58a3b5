use crate::board::Board;

/// Represents a single node in the Monte Carlo search tree.
///
/// Each node owns a snapshot of the game after `prev_move`, together with the
/// statistics of the rollouts that passed through it.
#[derive(Debug, Clone)]
pub struct MctsNode<T: Board> {
    /// The game state that this node represents.
    pub board: T,
    /// The move that led to this node's state from its parent. `None` for a
    /// root built straight from a game state.
    pub prev_move: Option<T::Move>,
    /// The number of rollouts that went through this node.
    pub visits: u32,
    /// Sum of the rewards of those rollouts.
    pub reward: f64,
    /// Whether the children have been materialised.
    pub is_expanded: bool,
}

impl<T: Board> MctsNode<T> {
    pub fn new(board: T, prev_move: Option<T::Move>) -> Self {
        MctsNode {
            board,
            prev_move,
            visits: 0,
            reward: 0.0,
            is_expanded: false,
        }
    }

    /// Average reward of this node.
    pub fn wins_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward / f64::from(self.visits)
        }
    }

    /// UCB1 score of this node given its parent's visit count.
    ///
    /// A node that was never visited scores `+∞`, so every sibling is tried
    /// once before any of them is revisited.
    pub fn ucb_value(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let visits = f64::from(self.visits);
        let parent = f64::from(parent_visits.max(1));
        self.wins_rate() + exploration * f64::sqrt(f64::ln(parent) / visits)
    }
}
