use crate::line::{Line, PlayerId};

/// A box of the board: the unit cell bounded by four lines.
///
/// The square does not own its lines. It stores their positions in the grid's
/// flat line array, in the order top, bottom, left, right.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Square {
    lines: [usize; 4],
    owner: Option<PlayerId>,
}

impl Square {
    pub(crate) fn new(top: usize, bottom: usize, left: usize, right: usize) -> Self {
        Self {
            lines: [top, bottom, left, right],
            owner: None,
        }
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn line_indices(&self) -> [usize; 4] {
        self.lines
    }

    /// How many of the four surrounding lines are claimed.
    pub fn sides_completed(&self, lines: &[Line]) -> u8 {
        self.lines.iter().filter(|&&i| lines[i].is_claimed()).count() as u8
    }

    /// Awards the square to `player` if all four sides are now claimed.
    ///
    /// Returns `true` only for the claim that completes the square; a square
    /// that already has an owner is never reassigned.
    pub(crate) fn check_completed(&mut self, lines: &[Line], player: PlayerId) -> bool {
        if self.owner.is_some() || self.sides_completed(lines) < 4 {
            return false;
        }
        self.owner = Some(player);
        true
    }
}
