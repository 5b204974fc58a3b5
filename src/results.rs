//! Plain-text result log.
//!
//! Every finished game is appended as one record:
//!
//! ```text
//! 4x4
//! (0, 0, 0)
//! ...
//! (1, 3, 2)
//! 0, 9
//! ```
//!
//! a `<width>x<height>` header, one `(o, i, j)` line per move in play order
//! and a trailer with the box counts of players 1 and 2.

use crate::error::GameError;
use crate::game::GameState;
use crate::grid::Move;
use crate::line::PlayerId;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// One finished game as stored in the result log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub width: usize,
    pub height: usize,
    pub moves: Vec<Move>,
    /// Boxes won by players 1 and 2.
    pub scores: (usize, usize),
}

impl GameRecord {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            width: state.width(),
            height: state.height(),
            moves: state.moves_made().to_vec(),
            scores: (state.score(1), state.score(2)),
        }
    }

    /// Player 1 or 2, or `None` for a draw.
    pub fn winner(&self) -> Option<PlayerId> {
        let (p1, p2) = self.scores;
        match p1.cmp(&p2) {
            std::cmp::Ordering::Greater => Some(1),
            std::cmp::Ordering::Less => Some(2),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for GameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}x{}", self.width, self.height)?;
        for mv in &self.moves {
            writeln!(f, "{mv}")?;
        }
        writeln!(f, "{}, {}", self.scores.0, self.scores.1)
    }
}

/// Appends `record` to the log at `path`, creating the file if needed.
pub fn append_record(path: impl AsRef<Path>, record: &GameRecord) -> Result<(), GameError> {
    let path = path.as_ref();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(record.to_string().as_bytes())?;
    debug!(path = %path.display(), moves = record.moves.len(), "appended game record");
    Ok(())
}

/// Reads every record from the log at `path`.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<GameRecord>, GameError> {
    let text = fs::read_to_string(path)?;
    parse_records(&text)
}

/// Parses the text of a result log. Blank lines are ignored.
pub fn parse_records(text: &str) -> Result<Vec<GameRecord>, GameError> {
    let mut records = Vec::new();
    let mut current: Option<GameRecord> = None;

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = |reason: String| GameError::MalformedRecord {
            line: number + 1,
            reason,
        };

        match current.as_mut() {
            None => {
                let (width, height) = parse_header(line).ok_or_else(|| {
                    malformed(format!("expected a <width>x<height> header, got {line:?}"))
                })?;
                current = Some(GameRecord {
                    width,
                    height,
                    moves: Vec::new(),
                    scores: (0, 0),
                });
            }
            Some(record) if line.starts_with('(') => {
                let mv = line
                    .parse::<Move>()
                    .map_err(|e| malformed(e.to_string()))?;
                record.moves.push(mv);
            }
            Some(record) => {
                record.scores = parse_scores(line)
                    .ok_or_else(|| malformed(format!("expected a score line, got {line:?}")))?;
                records.extend(current.take());
            }
        }
    }

    if current.is_some() {
        return Err(GameError::MalformedRecord {
            line: text.lines().count(),
            reason: "last record has no score line".to_string(),
        });
    }
    Ok(records)
}

fn parse_header(line: &str) -> Option<(usize, usize)> {
    let (width, height) = line.split_once('x')?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}

fn parse_scores(line: &str) -> Option<(usize, usize)> {
    let (p1, p2) = line.split_once(',')?;
    Some((p1.trim().parse().ok()?, p2.trim().parse().ok()?))
}

/// Wins and draws over a set of records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResultTally {
    pub p1_wins: usize,
    pub p2_wins: usize,
    pub draws: usize,
}

impl ResultTally {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a GameRecord>) -> Self {
        let mut tally = Self::default();
        for record in records {
            tally.add(record);
        }
        tally
    }

    pub fn add(&mut self, record: &GameRecord) {
        match record.winner() {
            Some(1) => self.p1_wins += 1,
            Some(_) => self.p2_wins += 1,
            None => self.draws += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.p1_wins + self.p2_wins + self.draws
    }

    /// Percentage of games won by player 1; 0 when nothing was played.
    pub fn p1_win_rate(&self) -> f64 {
        self.rate(self.p1_wins)
    }

    pub fn p2_win_rate(&self) -> f64 {
        self.rate(self.p2_wins)
    }

    fn rate(&self, wins: usize) -> f64 {
        match self.games() {
            0 => 0.0,
            games => 100.0 * wins as f64 / games as f64,
        }
    }
}

impl fmt::Display for ResultTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "player 1 won {} and player 2 won {} of {} games ({} drawn)",
            self.p1_wins,
            self.p2_wins,
            self.games(),
            self.draws
        )
    }
}

/// Where each player did best across several tallies.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Comparison {
    /// Index of the tally with player 1's best win rate, and that rate.
    pub best_p1: Option<(usize, f64)>,
    pub best_p2: Option<(usize, f64)>,
}

/// Finds the best win rate of each player. Later tallies win ties.
pub fn compare(tallies: &[ResultTally]) -> Comparison {
    let best = |rate: fn(&ResultTally) -> f64| {
        tallies
            .iter()
            .enumerate()
            .map(|(index, tally)| (index, rate(tally)))
            .fold(None, |leader: Option<(usize, f64)>, (index, rate)| match leader {
                Some((_, best_rate)) if rate < best_rate => leader,
                _ => Some((index, rate)),
            })
    };
    Comparison {
        best_p1: best(ResultTally::p1_win_rate),
        best_p2: best(ResultTally::p2_win_rate),
    }
}

/// `"<p1name>_<p2name>_<width>x<height>.txt"`.
pub fn results_filename(p1_name: &str, p2_name: &str, width: usize, height: usize) -> String {
    format!("{p1_name}_{p2_name}_{width}x{height}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation_order_game(swap: Option<(usize, usize)>) -> GameState {
        let mut state = GameState::new(4, 4).unwrap();
        let mut moves = state.legal_moves().to_vec();
        if let Some((a, b)) = swap {
            moves.swap(a, b);
        }
        for mv in moves {
            state.apply_move(mv).unwrap();
        }
        state
    }

    #[test]
    fn record_text_layout() {
        // arrange
        let record = GameRecord::from_state(&generation_order_game(None));

        // act
        let text = record.to_string();

        // assert
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 26);
        assert_eq!(lines[0], "4x4");
        assert_eq!(lines[1], "(0, 0, 0)");
        assert_eq!(lines[16], "(1, 1, 0)");
        assert_eq!(lines[19], "(1, 2, 0)");
        assert_eq!(lines[25], "0, 9");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn appended_records_read_back() {
        // arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(results_filename("1_ordered", "2_ordered", 4, 4));
        let first = GameRecord::from_state(&generation_order_game(None));
        let second = GameRecord::from_state(&generation_order_game(Some((15, 18))));

        // act
        append_record(&path, &first).unwrap();
        append_record(&path, &second).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let records = read_records(&path).unwrap();

        // assert
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[42], "(1, 2, 0)");
        assert_eq!(lines[45], "(1, 1, 0)");
        assert_eq!(lines[51], "9, 0");
        assert_eq!(records, vec![first, second]);
    }

    #[test]
    fn tally_counts_wins_and_draws() {
        let text = "3x3\n(0, 0, 0)\n3, 1\n\n3x3\n(0, 0, 0)\n1, 3\n3x3\n2, 2\n3x3\n4, 0\n";

        let tally = ResultTally::from_records(&parse_records(text).unwrap());

        assert_eq!(
            tally,
            ResultTally {
                p1_wins: 2,
                p2_wins: 1,
                draws: 1
            }
        );
        assert_eq!(tally.games(), 4);
        assert_eq!(tally.p1_win_rate(), 50.0);
        assert_eq!(tally.p2_win_rate(), 25.0);
        assert_eq!(ResultTally::default().p1_win_rate(), 0.0);
    }

    #[test]
    fn malformed_logs_are_rejected() {
        let bad_header = parse_records("three by three\n");
        assert!(matches!(bad_header, Err(GameError::MalformedRecord { line: 1, .. })));

        let bad_move = parse_records("3x3\n(0, 0, 0)\n(2, 0, 0)\n1, 0\n");
        assert!(matches!(bad_move, Err(GameError::MalformedRecord { line: 3, .. })));

        let truncated = parse_records("3x3\n(0, 0, 0)\n");
        assert!(matches!(truncated, Err(GameError::MalformedRecord { line: 2, .. })));
    }

    #[test]
    fn compare_picks_the_best_rates() {
        let tallies = [
            ResultTally { p1_wins: 1, p2_wins: 3, draws: 0 },
            ResultTally { p1_wins: 3, p2_wins: 1, draws: 0 },
            ResultTally { p1_wins: 6, p2_wins: 2, draws: 0 },
            ResultTally { p1_wins: 0, p2_wins: 3, draws: 1 },
        ];

        let comparison = compare(&tallies);

        assert_eq!(comparison.best_p1, Some((2, 75.0)));
        assert_eq!(comparison.best_p2, Some((3, 75.0)));
        assert_eq!(compare(&[]), Comparison::default());
    }

    #[test]
    fn filename_joins_player_names() {
        assert_eq!(
            results_filename("1_random", "2_mcts", 3, 4),
            "1_random_2_mcts_3x4.txt"
        );
    }
}
