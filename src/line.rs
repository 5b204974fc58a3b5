/// Identifier of a real player. Players are numbered from 1; the value 0 is
/// used as the "unowned" bucket in score tables.
pub type PlayerId = u8;

/// Who holds a line.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum Owner {
    #[default]
    Unclaimed,
    Player(PlayerId),
    /// Pseudo-owner for lines filled in by a game variant before play starts.
    Blocked,
}

/// One edge of the dot grid.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct Line {
    owner: Owner,
}

impl Line {
    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Returns `true` once anyone, including a variant, holds the line.
    pub fn is_claimed(&self) -> bool {
        self.owner != Owner::Unclaimed
    }

    /// Claims the line for `owner`. Claiming is one-way: a line that is already
    /// held is left as it is and `false` is returned.
    pub fn claim(&mut self, owner: Owner) -> bool {
        if self.is_claimed() || owner == Owner::Unclaimed {
            return false;
        }
        self.owner = owner;
        true
    }
}
