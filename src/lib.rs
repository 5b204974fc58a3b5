//! Dots-and-Boxes with search-based players.
//!
//! The crate has a value-semantics game model ([`game::GameState`]) and two
//! search engines built on it: depth-limited minimax with alpha-beta pruning
//! and iterative deepening, and Monte Carlo Tree Search with a tree that is
//! re-rooted along the moves actually played. Simple baseline players, board
//! variants, a match driver and a plain-text result log complete the set.
//!
//! # Example
//!
//! ```rust
//! use dots_boxes::game::GameState;
//! use dots_boxes::mcts::MonteCarloTreeSearch;
//! use dots_boxes::random::SeededRandomGenerator;
//!
//! // Create a new 3x3 board, player 1 to move
//! let mut state = GameState::new(3, 3).unwrap();
//!
//! // Create and configure a new MCTS engine for player 1
//! let mut mcts = MonteCarloTreeSearch::builder(1)
//!     .with_random_generator(SeededRandomGenerator::default())
//!     .with_exploration(1.4)
//!     .build();
//!
//! // Point the engine at the current state and run some iterations
//! mcts.update(&state);
//! mcts.iterate_n_times(1000);
//!
//! // Take the most promising move
//! let best_move = mcts.next_move().unwrap();
//! state.apply_move(best_move).unwrap();
//!
//! println!("The best move is: {best_move}");
//! ```

/// Match driver and tournament series.
pub mod arena;
/// Contains the `Board` trait the tree search is written against.
pub mod board;
pub mod config;
pub mod error;
/// The game state: turn order, scoring and move validation.
pub mod game;
/// Board geometry and move addressing.
pub mod grid;
pub mod line;
/// The core search module, containing the `MonteCarloTreeSearch` implementation.
pub mod mcts;
/// Contains the `MctsNode` struct, which represents a node in the search tree.
pub mod mcts_node;
/// Alpha-beta minimax with iterative deepening.
pub mod minimax;
pub mod players;
/// Contains traits and implementations for random number generation.
pub mod random;
pub mod results;
pub mod square;
pub mod variants;

pub use error::GameError;
pub use game::GameState;
pub use grid::{Move, Orientation};
pub use line::PlayerId;
pub use players::{PlayerKind, Strategy, make_player};
