use dots_boxes::arena::{Series, play_series};
use dots_boxes::config::PlayerConfig;
use dots_boxes::game::GameState;
use dots_boxes::mcts::MonteCarloTreeSearch;
use dots_boxes::players::PlayerKind;
use dots_boxes::random::SeededRandomGenerator;
use dots_boxes::results::{ResultTally, read_records, results_filename};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Look at what the tree search thinks of the opening on a 3x3 board
    let state = GameState::new(3, 3)?;
    let mut mcts = MonteCarloTreeSearch::builder(1)
        .with_random_generator(SeededRandomGenerator::default())
        .build();
    mcts.update(&state);
    mcts.iterate_n_times(5000);

    if let Some(root) = mcts.get_root() {
        for child in root.children() {
            let node = child.value();
            if let Some(mv) = node.prev_move {
                println!("Move: {mv} = {:.2}%", node.wins_rate() * 100.0);
            }
        }
    }
    if let Some(best_move) = mcts.next_move() {
        println!("The best move is: {best_move}");
    }

    // A short seeded tournament, logged to the temp directory
    let config = PlayerConfig::for_testing(2024).with_time_limit(Duration::from_millis(200));
    let pairings = [
        [PlayerKind::Random, PlayerKind::Ordered],
        [PlayerKind::Minimax, PlayerKind::Random],
        [PlayerKind::Mcts, PlayerKind::Random],
    ];
    for [p1, p2] in pairings {
        let filename = results_filename(&format!("1_{p1}"), &format!("2_{p2}"), 3, 3);
        let path = std::env::temp_dir().join(filename);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let series = Series::new(3, 3, [p1, p2])
            .with_games(4)
            .with_player_config(config.clone())
            .with_log_path(&path);
        play_series(&series)?;

        let tally = ResultTally::from_records(&read_records(&path)?);
        println!(
            "1_{p1} vs 2_{p2}: {tally}, win rates {:.0}% / {:.0}%",
            tally.p1_win_rate(),
            tally.p2_win_rate()
        );
        println!("results saved to {}", path.display());
    }

    Ok(())
}
