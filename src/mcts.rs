use crate::board::{Board, GameOutcome};
use crate::config::{DEFAULT_NODE_CAPACITY, MctsConfig};
use crate::line::PlayerId;
use crate::mcts_node::MctsNode;
use crate::random::{RandomGenerator, StandardRandomGenerator};
use ego_tree::{NodeId, NodeRef, Tree};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// The search tree together with the node the search currently starts from.
///
/// Nodes live in an [`ego_tree::Tree`] arena and are addressed by [`NodeId`].
/// Re-rooting detaches the new root from its parent and leaves the rest of the
/// old tree in the arena; [`SearchTree::compact`] later copies the live
/// subtree into a fresh arena and drops everything else in one go.
struct SearchTree<T: Board> {
    tree: Tree<MctsNode<T>>,
    root_id: NodeId,
    allocated: usize,
}

impl<T: Board> SearchTree<T> {
    /// A one-level tree: the root and one child per legal move.
    fn new(board: T) -> Self {
        let tree = Tree::new(MctsNode::new(board, None));
        let root_id = tree.root().id();
        let mut search_tree = Self {
            tree,
            root_id,
            allocated: 1,
        };
        search_tree.expand(root_id);
        search_tree
    }

    fn root(&self) -> Option<NodeRef<'_, MctsNode<T>>> {
        self.tree.get(self.root_id)
    }

    /// Creates one child per legal move of the node's state. Does nothing for
    /// a node that was already expanded.
    fn expand(&mut self, node_id: NodeId) {
        let Some(node) = self.tree.get(node_id) else {
            return;
        };
        if node.value().is_expanded {
            return;
        }

        let parent_board = &node.value().board;
        let children: Vec<MctsNode<T>> = parent_board
            .available_moves()
            .iter()
            .map(|&possible_move| {
                let mut board = parent_board.clone();
                board.perform_move(possible_move);
                MctsNode::new(board, Some(possible_move))
            })
            .collect();

        let Some(mut node) = self.tree.get_mut(node_id) else {
            return;
        };
        node.value().is_expanded = true;
        self.allocated += children.len();
        for child in children {
            node.append(child);
        }
    }

    /// The child with the highest UCB1 score; the first one wins ties.
    fn best_child(&self, node_id: NodeId, exploration: f64) -> Option<NodeId> {
        let node = self.tree.get(node_id)?;
        let parent_visits = node.value().visits;

        let mut best: Option<(NodeId, f64)> = None;
        for child in node.children() {
            let ucb = child.value().ucb_value(parent_visits, exploration);
            if best.is_none_or(|(_, max_ucb)| ucb > max_ucb) {
                best = Some((child.id(), ucb));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Materialises the children if needed, then picks the best one.
    fn select_child(&mut self, node_id: NodeId, exploration: f64) -> Option<NodeId> {
        self.expand(node_id);
        self.best_child(node_id, exploration)
    }

    /// Adds one visit and `reward` to the node and every ancestor up to the
    /// current root.
    fn backpropagate(&mut self, node_id: NodeId, reward: f64) {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let Some(mut node) = self.tree.get_mut(id) else {
                break;
            };
            let stats = node.value();
            stats.visits += 1;
            stats.reward += reward;
            current = self.tree.get(id).and_then(|n| n.parent()).map(|p| p.id());
        }
    }

    /// Walks the tree along the moves played since the root's snapshot.
    ///
    /// Returns `false` when the history diverged, the tree does not reach
    /// deep enough, or the node reached holds a different position (e.g. a
    /// board whose lines were filled in without being played). The caller
    /// then has to start over.
    fn advance_to(&mut self, board: &T) -> bool {
        let Some(root) = self.root() else {
            return false;
        };
        let known = root.value().board.moves_made();
        let played = board.moves_made();
        if !played.starts_with(known) {
            return false;
        }

        let mut current = root;
        for played_move in &played[known.len()..] {
            let next = current
                .children()
                .find(|child| child.value().prev_move.as_ref() == Some(played_move));
            match next {
                Some(child) => current = child,
                None => return false,
            }
        }

        if current.value().board != *board {
            return false;
        }

        let new_root = current.id();
        self.reroot(new_root);
        true
    }

    /// Makes `node_id` the root and severs it from its former ancestry.
    fn reroot(&mut self, node_id: NodeId) {
        if let Some(mut node) = self.tree.get_mut(node_id) {
            node.detach();
            self.root_id = node_id;
        }
    }

    /// Copies the subtree under the root into a new arena, releasing every
    /// node that is no longer reachable.
    fn compact(&mut self) {
        let Some(root) = self.root() else {
            return;
        };

        let mut tree = Tree::new(root.value().clone());
        let mut allocated = 1;
        let mut pending = vec![(root.id(), tree.root().id())];
        while let Some((old_id, new_id)) = pending.pop() {
            let Some(old) = self.tree.get(old_id) else {
                continue;
            };
            let Some(mut parent) = tree.get_mut(new_id) else {
                continue;
            };
            for child in old.children() {
                let copied = parent.append(child.value().clone()).id();
                pending.push((child.id(), copied));
                allocated += 1;
            }
        }

        debug!(
            before = self.allocated,
            after = allocated,
            "compacted mcts arena"
        );
        self.root_id = tree.root().id();
        self.tree = tree;
        self.allocated = allocated;
    }
}

/// Plays random moves on a copy of `board` until the game is over.
///
/// Returns 1.0 when `player` wins and 0.0 for a loss or a draw.
fn rollout<T: Board, K: RandomGenerator>(board: &T, player: PlayerId, random: &mut K) -> f64 {
    let mut board = board.clone();
    while !board.is_terminal() {
        let Some(&random_move) = random.choose(board.available_moves()) else {
            break;
        };
        if !board.perform_move(random_move) {
            break;
        }
    }

    match board.outcome() {
        GameOutcome::Winner(winner) if winner == player => 1.0,
        _ => 0.0,
    }
}

/// Monte Carlo Tree Search with a tree that survives between turns.
///
/// Call [`update`](Self::update) with the state the engine has to move in,
/// [`search`](Self::search) to spend the time budget, then
/// [`next_move`](Self::next_move). The tree is re-rooted along the moves that
/// were actually played, so work from earlier turns is reused.
///
/// One engine serves one game; it is not meant to be shared across threads.
pub struct MonteCarloTreeSearch<T: Board, K: RandomGenerator> {
    player: PlayerId,
    search_tree: Option<SearchTree<T>>,
    random: K,
    exploration: f64,
    time_limit: Duration,
    node_capacity: usize,
    max_iterations: Option<u32>,
}

/// A builder for creating instances of `MonteCarloTreeSearch`.
pub struct MonteCarloTreeSearchBuilder<T: Board, K: RandomGenerator> {
    player: PlayerId,
    random_generator: K,
    config: MctsConfig,
    _board: std::marker::PhantomData<T>,
}

impl<T: Board, K: RandomGenerator> MonteCarloTreeSearchBuilder<T, K> {
    /// Creates a new builder for an engine playing as `player`.
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            random_generator: K::default(),
            config: MctsConfig::default(),
            _board: std::marker::PhantomData,
        }
    }

    /// Sets the random number generator used for rollouts.
    pub fn with_random_generator(mut self, rg: K) -> Self {
        self.random_generator = rg;
        self
    }

    pub fn with_config(mut self, config: MctsConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the exploration constant `c` of UCB1.
    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.config.exploration = exploration;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.config.time_limit = time_limit;
        self
    }

    /// Arena size past which discarded subtrees are collected.
    pub fn with_node_capacity(mut self, node_capacity: usize) -> Self {
        self.config.node_capacity = node_capacity;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.config.max_iterations = Some(max_iterations);
        self
    }

    pub fn build(self) -> MonteCarloTreeSearch<T, K> {
        MonteCarloTreeSearch {
            player: self.player,
            search_tree: None,
            random: self.random_generator,
            exploration: self.config.exploration,
            time_limit: self.config.time_limit,
            node_capacity: self.config.node_capacity,
            max_iterations: self.config.max_iterations,
        }
    }
}

impl<T: Board, K: RandomGenerator> MonteCarloTreeSearch<T, K> {
    /// Returns a new builder for `MonteCarloTreeSearch`.
    pub fn builder(player: PlayerId) -> MonteCarloTreeSearchBuilder<T, K> {
        MonteCarloTreeSearchBuilder::new(player)
    }

    /// The player whose wins the rollouts reward.
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Returns the underlying arena, once a tree exists.
    pub fn get_tree(&self) -> Option<&Tree<MctsNode<T>>> {
        self.search_tree.as_ref().map(|st| &st.tree)
    }

    /// Returns the current root of the search, once a tree exists.
    pub fn get_root(&self) -> Option<NodeRef<'_, MctsNode<T>>> {
        self.search_tree.as_ref().and_then(|st| st.root())
    }

    /// Moves the tree to the state the engine now faces.
    ///
    /// The first call builds the tree. Later calls walk it along the moves
    /// played since the root's snapshot; when the needed child does not exist
    /// the old tree is dropped and a new one is built from `board`.
    pub fn update(&mut self, board: &T) {
        let reused = self
            .search_tree
            .as_mut()
            .is_some_and(|st| st.advance_to(board));

        if !reused {
            if self.search_tree.is_some() {
                debug!(player = self.player, "no matching subtree, rebuilding search tree");
            }
            self.search_tree = Some(SearchTree::new(board.clone()));
        }

        if let Some(st) = self.search_tree.as_mut()
            && st.allocated > self.node_capacity
        {
            st.compact();
        }
    }

    /// Performs one iteration: selection, expansion, rollout and
    /// backpropagation. Returns `false` if there is no tree to search.
    pub fn do_iteration(&mut self) -> bool {
        let exploration = self.exploration;
        let Some(st) = self.search_tree.as_mut() else {
            return false;
        };

        let root_id = st.root_id;
        let mut current = root_id;
        loop {
            let Some(node) = st.tree.get(current) else {
                break;
            };
            let data = node.value();
            if data.board.is_terminal() || (current != root_id && data.visits == 0) {
                break;
            }
            match st.select_child(current, exploration) {
                Some(child) => current = child,
                None => break,
            }
        }

        let Some(leaf) = st.tree.get(current) else {
            return false;
        };
        let reward = rollout(&leaf.value().board, self.player, &mut self.random);
        st.backpropagate(current, reward);
        true
    }

    /// Runs the search for a fixed number of iterations, ignoring the clock.
    pub fn iterate_n_times(&mut self, n: u32) {
        let mut iteration = 0;
        while iteration < n && self.do_iteration() {
            iteration += 1;
        }
    }

    /// Iterates until the time budget (or the iteration cap) is used up.
    /// Returns the number of completed iterations.
    pub fn search(&mut self) -> u32 {
        let start = Instant::now();
        if self.get_root().is_none_or(|root| root.value().board.is_terminal()) {
            return 0;
        }

        let mut iterations = 0;
        while start.elapsed() <= self.time_limit
            && self.max_iterations.is_none_or(|max| iterations < max)
            && self.do_iteration()
        {
            iterations += 1;
        }

        debug!(
            player = self.player,
            iterations,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "mcts search finished"
        );
        iterations
    }

    /// Returns the child of the root that [`next_move`](Self::next_move)
    /// would pick.
    pub fn most_promising_child(&self) -> Option<NodeRef<'_, MctsNode<T>>> {
        let st = self.search_tree.as_ref()?;
        let best = st.best_child(st.root_id, self.exploration)?;
        st.tree.get(best)
    }

    /// Picks the best child of the root and advances the root to it.
    pub fn next_move(&mut self) -> Option<T::Move> {
        let exploration = self.exploration;
        let st = self.search_tree.as_mut()?;
        let best = st.select_child(st.root_id, exploration)?;
        let node = st.tree.get(best)?;
        trace!(
            visits = node.value().visits,
            win_rate = node.value().wins_rate(),
            "selected root child"
        );
        let best_move = node.value().prev_move;
        st.reroot(best);
        best_move
    }

    /// A uniformly random legal move, for when the search result cannot be
    /// used.
    pub fn random_move(&mut self, board: &T) -> Option<T::Move> {
        self.random.choose(board.available_moves()).copied()
    }
}

impl<T: Board> MonteCarloTreeSearch<T, StandardRandomGenerator> {
    /// An engine with default settings and an unseeded generator.
    pub fn for_player(player: PlayerId) -> Self {
        MonteCarloTreeSearchBuilder::new(player)
            .with_node_capacity(DEFAULT_NODE_CAPACITY)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use crate::grid::Move;
    use crate::random::SeededRandomGenerator;
    use crate::variants::new_swedish_game;

    fn engine(player: PlayerId) -> MonteCarloTreeSearch<GameState, SeededRandomGenerator> {
        MonteCarloTreeSearch::builder(player)
            .with_random_generator(SeededRandomGenerator::new(1234))
            .build()
    }

    #[test]
    fn update_builds_expanded_root() {
        // arrange
        let state = GameState::new(4, 4).unwrap();
        let mut mcts = engine(1);
        assert!(mcts.get_root().is_none());

        // act
        mcts.update(&state);

        // assert
        let root = mcts.get_root().unwrap();
        assert_eq!(root.value().board, state);
        assert!(root.value().prev_move.is_none());
        assert_eq!(root.children().count(), 24);
        assert!(root.children().all(|c| c.value().visits == 0));
    }

    #[test]
    fn backpropagation_reaches_the_root() {
        // arrange
        let mut mcts = engine(1);
        mcts.update(&GameState::new(4, 4).unwrap());
        let st = mcts.search_tree.as_mut().unwrap();
        let root_id = st.root_id;
        let child = st.select_child(root_id, 1.4).unwrap();
        let grandchild = st.select_child(child, 1.4).unwrap();
        assert_eq!(st.tree.get(grandchild).unwrap().value().visits, 0);

        // act
        st.backpropagate(grandchild, 1.0);

        // assert
        for id in [grandchild, child, root_id] {
            let node = st.tree.get(id).unwrap();
            assert_eq!(node.value().visits, 1);
            assert_eq!(node.value().reward, 1.0);
        }
    }

    #[test]
    fn every_child_is_tried_before_any_is_revisited() {
        // arrange
        let mut mcts = engine(2);
        mcts.update(&GameState::new(3, 3).unwrap());

        // act
        mcts.iterate_n_times(12);

        // assert
        let root = mcts.get_root().unwrap();
        assert_eq!(root.value().visits, 12);
        assert!(root.children().all(|c| c.value().visits == 1));
    }

    #[test]
    fn visits_add_up() {
        let mut mcts = engine(1);
        mcts.update(&GameState::new(3, 3).unwrap());

        mcts.iterate_n_times(300);

        let root = mcts.get_root().unwrap();
        assert_eq!(root.value().visits, 300);
        let child_visits: u32 = root.children().map(|c| c.value().visits).sum();
        assert_eq!(child_visits, 300);
        let child_reward: f64 = root.children().map(|c| c.value().reward).sum();
        assert_eq!(child_reward, root.value().reward);
        assert!(root.value().reward <= 300.0);
    }

    #[test]
    fn reroots_after_two_plies() {
        // arrange
        let mut state = GameState::new(3, 3).unwrap();
        let mut mcts = engine(1);
        mcts.update(&state);
        mcts.iterate_n_times(2000);
        let first = mcts.next_move().unwrap();
        state.apply_move(first).unwrap();
        let second = state.legal_moves()[0];
        state.apply_move(second).unwrap();

        // act
        mcts.update(&state);

        // assert
        let root = mcts.get_root().unwrap();
        assert_eq!(root.value().board, state);
        assert_eq!(root.value().prev_move, Some(second));
        assert!(root.parent().is_none());
    }

    #[test]
    fn next_move_advances_and_detaches_root() {
        let state = GameState::new(3, 3).unwrap();
        let mut mcts = engine(1);
        mcts.update(&state);
        mcts.iterate_n_times(100);
        let expected = mcts.most_promising_child().unwrap().value().prev_move;

        let chosen = mcts.next_move();

        assert_eq!(chosen, expected);
        let root = mcts.get_root().unwrap();
        assert_eq!(root.value().prev_move, chosen);
        assert!(root.parent().is_none());
    }

    #[test]
    fn diverged_history_rebuilds_tree() {
        let mut mcts = engine(1);
        let mut first = GameState::new(3, 3).unwrap();
        first.apply_move(Move::horizontal(0, 0)).unwrap();
        mcts.update(&first);
        mcts.iterate_n_times(50);

        let mut other = GameState::new(3, 3).unwrap();
        other.apply_move(Move::vertical(1, 1)).unwrap();
        mcts.update(&other);

        let root = mcts.get_root().unwrap();
        assert_eq!(root.value().board, other);
        assert!(root.value().prev_move.is_none());
        assert_eq!(root.value().visits, 0);
    }

    #[test]
    fn missing_child_rebuilds_tree() {
        let mut state = GameState::new(3, 3).unwrap();
        let mut mcts = engine(1);
        mcts.update(&state);
        for &mv in &state.legal_moves()[..3].to_vec() {
            state.apply_move(mv).unwrap();
        }

        mcts.update(&state);

        let root = mcts.get_root().unwrap();
        assert_eq!(root.value().board, state);
        assert!(root.value().prev_move.is_none());
    }

    #[test]
    fn prefilled_board_with_same_history_rebuilds_tree() {
        // arrange
        let mut mcts = engine(1);
        mcts.update(&GameState::new(3, 3).unwrap());
        mcts.iterate_n_times(50);
        let swedish = new_swedish_game(3, 3).unwrap();
        assert!(swedish.moves_made().is_empty());

        // act
        mcts.update(&swedish);

        // assert
        let root = mcts.get_root().unwrap();
        assert_eq!(root.value().board, swedish);
        assert_eq!(root.value().visits, 0);
        assert_eq!(root.children().count(), 4);
    }

    #[test]
    fn compaction_drops_unreachable_nodes() {
        // arrange
        let mut state = GameState::new(3, 3).unwrap();
        let mut mcts = MonteCarloTreeSearch::builder(1)
            .with_random_generator(SeededRandomGenerator::new(99))
            .with_node_capacity(50)
            .build();
        mcts.update(&state);
        mcts.iterate_n_times(500);
        let chosen = mcts.next_move().unwrap();
        state.apply_move(chosen).unwrap();

        // act
        mcts.update(&state);

        // assert
        let tree = mcts.get_tree().unwrap();
        let root = mcts.get_root().unwrap();
        assert_eq!(tree.nodes().count(), root.descendants().count());
        assert_eq!(
            mcts.search_tree.as_ref().unwrap().allocated,
            root.descendants().count()
        );
        assert_eq!(root.value().board, state);
    }

    #[test]
    fn only_move_is_returned() {
        let mut state = GameState::new(2, 2).unwrap();
        for mv in [Move::horizontal(0, 0), Move::horizontal(1, 0), Move::vertical(0, 0)] {
            state.apply_move(mv).unwrap();
        }
        let mut mcts = engine(2);
        mcts.update(&state);
        mcts.iterate_n_times(10);

        assert_eq!(mcts.next_move(), Some(Move::vertical(1, 0)));
    }

    #[test]
    fn finished_game_has_no_move() {
        let mut state = GameState::new(2, 2).unwrap();
        for mv in state.legal_moves().to_vec() {
            state.apply_move(mv).unwrap();
        }
        let mut mcts = engine(1);
        mcts.update(&state);

        assert_eq!(mcts.search(), 0);
        assert_eq!(mcts.next_move(), None);
    }

    #[test]
    fn rollout_rewards_only_wins() {
        let mut state = GameState::new(2, 2).unwrap();
        for mv in state.legal_moves().to_vec() {
            state.apply_move(mv).unwrap();
        }
        let mut random = SeededRandomGenerator::default();

        assert_eq!(rollout(&state, 2, &mut random), 1.0);
        assert_eq!(rollout(&state, 1, &mut random), 0.0);
    }

    #[test]
    fn search_respects_iteration_cap() {
        let mut mcts = MonteCarloTreeSearch::builder(1)
            .with_random_generator(SeededRandomGenerator::new(5))
            .with_time_limit(Duration::from_secs(30))
            .with_max_iterations(64)
            .build();
        mcts.update(&GameState::new(3, 3).unwrap());

        assert_eq!(mcts.search(), 64);
        assert_eq!(mcts.get_root().unwrap().value().visits, 64);
    }

    #[test]
    fn default_engine_starts_without_a_tree() {
        let mut mcts: MonteCarloTreeSearch<GameState, _> = MonteCarloTreeSearch::for_player(2);

        assert_eq!(mcts.player(), 2);
        assert!(mcts.get_tree().is_none());
        assert_eq!(mcts.next_move(), None);
        assert!(!mcts.do_iteration());
    }
}
