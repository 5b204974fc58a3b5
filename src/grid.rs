use crate::error::GameError;
use crate::line::{Line, Owner, PlayerId};
use crate::square::Square;
use std::fmt;
use std::str::FromStr;

/// Direction of a line on the dot grid.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
pub enum Orientation {
    Horizontal = 0,
    Vertical = 1,
}

impl TryFrom<usize> for Orientation {
    type Error = GameError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Orientation::Horizontal),
            1 => Ok(Orientation::Vertical),
            other => Err(GameError::MalformedMove(format!(
                "orientation must be 0 or 1, got {other}"
            ))),
        }
    }
}

/// Addresses one line of the board.
///
/// Horizontal lines are addressed as `(row, col)` and vertical lines as
/// `(col, row)`, which is also the textual form `"(o, i, j)"` used by the
/// result log.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
pub struct Move {
    pub orientation: Orientation,
    pub i: usize,
    pub j: usize,
}

impl Move {
    pub const fn new(orientation: Orientation, i: usize, j: usize) -> Self {
        Self { orientation, i, j }
    }

    pub const fn horizontal(row: usize, col: usize) -> Self {
        Self::new(Orientation::Horizontal, row, col)
    }

    pub const fn vertical(col: usize, row: usize) -> Self {
        Self::new(Orientation::Vertical, col, row)
    }

    /// Builds a move from untyped coordinates, rejecting unknown orientations.
    pub fn from_raw(orientation: usize, i: usize, j: usize) -> Result<Self, GameError> {
        Ok(Self::new(Orientation::try_from(orientation)?, i, j))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.orientation as u8, self.i, self.j)
    }
}

impl FromStr for Move {
    type Err = GameError;

    /// Accepts `"(0, 1, 2)"` as well as the looser `"0 1 2"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
        let parts = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<usize>()
                    .map_err(|_| GameError::MalformedMove(format!("not a coordinate: {p:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [o, i, j] => Move::from_raw(*o, *i, *j),
            _ => Err(GameError::MalformedMove(format!(
                "expected three coordinates, got {s:?}"
            ))),
        }
    }
}

/// The lines and boxes of a `width × height` dot grid.
///
/// Lines live in one flat vector: the `height × (width - 1)` horizontal lines
/// first in row-major order, then the `width × (height - 1)` vertical lines
/// in column-major order. Boxes are stored row-major and refer to their lines
/// by index, so the whole grid is cloned with two memory copies.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    lines: Vec<Line>,
    squares: Vec<Square>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Result<Self, GameError> {
        if width < 2 || height < 2 {
            return Err(GameError::InvalidDimensions { width, height });
        }

        let line_count = height * (width - 1) + width * (height - 1);
        let mut grid = Self {
            width,
            height,
            lines: vec![Line::default(); line_count],
            squares: Vec::with_capacity((width - 1) * (height - 1)),
        };

        for row in 0..height - 1 {
            for col in 0..width - 1 {
                let square = Square::new(
                    grid.horizontal_index(row, col),
                    grid.horizontal_index(row + 1, col),
                    grid.vertical_index(col, row),
                    grid.vertical_index(col + 1, row),
                );
                grid.squares.push(square);
            }
        }

        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    /// The box in the given row and column, if it exists.
    pub fn square(&self, row: usize, col: usize) -> Option<&Square> {
        if row >= self.height - 1 || col >= self.width - 1 {
            return None;
        }
        self.squares.get(self.square_index(row, col))
    }

    /// Position of the addressed line in [`Grid::lines`], or `None` when the
    /// move lies outside the board.
    pub fn line_index(&self, mv: Move) -> Option<usize> {
        match mv.orientation {
            Orientation::Horizontal if mv.i < self.height && mv.j < self.width - 1 => {
                Some(self.horizontal_index(mv.i, mv.j))
            }
            Orientation::Vertical if mv.i < self.width && mv.j < self.height - 1 => {
                Some(self.vertical_index(mv.i, mv.j))
            }
            _ => None,
        }
    }

    pub fn line(&self, mv: Move) -> Option<&Line> {
        self.line_index(mv).map(|index| &self.lines[index])
    }

    /// Every line of the board, horizontal lines first.
    pub fn all_moves(&self) -> impl Iterator<Item = Move> + '_ {
        let horizontal = (0..self.height)
            .flat_map(move |row| (0..self.width - 1).map(move |col| Move::horizontal(row, col)));
        let vertical = (0..self.width)
            .flat_map(move |col| (0..self.height - 1).map(move |row| Move::vertical(col, row)));
        horizontal.chain(vertical)
    }

    /// Claims a line without looking at the boxes around it.
    pub(crate) fn claim(&mut self, mv: Move, owner: Owner) -> Result<(), GameError> {
        let index = self
            .line_index(mv)
            .ok_or_else(|| GameError::MalformedMove(format!("{mv} is outside the board")))?;
        if self.lines[index].claim(owner) {
            Ok(())
        } else {
            Err(GameError::IllegalMove(mv))
        }
    }

    /// Boxes touching the line: one for an edge line, two for an interior one,
    /// none for a move outside the board.
    pub fn adjacent_squares(&self, mv: Move) -> [Option<usize>; 2] {
        if self.line_index(mv).is_none() {
            return [None, None];
        }
        match mv.orientation {
            Orientation::Horizontal => [
                (mv.i > 0).then(|| self.square_index(mv.i - 1, mv.j)),
                (mv.i + 1 < self.height).then(|| self.square_index(mv.i, mv.j)),
            ],
            Orientation::Vertical => [
                (mv.i > 0).then(|| self.square_index(mv.j, mv.i - 1)),
                (mv.i + 1 < self.width).then(|| self.square_index(mv.j, mv.i)),
            ],
        }
    }

    /// Awards every box around `mv` that the line just completed to `player`
    /// and returns how many there were.
    pub(crate) fn complete_squares_around(&mut self, mv: Move, player: PlayerId) -> usize {
        let adjacent = self.adjacent_squares(mv);
        let Grid { lines, squares, .. } = self;
        adjacent
            .into_iter()
            .flatten()
            .filter(|&index| squares[index].check_completed(lines, player))
            .count()
    }

    fn horizontal_index(&self, row: usize, col: usize) -> usize {
        row * (self.width - 1) + col
    }

    fn vertical_index(&self, col: usize, row: usize) -> usize {
        self.height * (self.width - 1) + col * (self.height - 1) + row
    }

    fn square_index(&self, row: usize, col: usize) -> usize {
        row * (self.width - 1) + col
    }
}
