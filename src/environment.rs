//! Interface for the game environment to abstract the rules implementation
//! away from the search.

use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Not;

use anyhow::bail;

/// Two-player alternating games are played between the player who moves first
/// and their opponent.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    First,
    Second,
}

impl Player {
    /// Returns `+1` for the first player and `-1` for the second one.
    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Self::First => 1,
            Self::Second => -1,
        }
    }
}

impl Not for Player {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

impl TryFrom<i8> for Player {
    type Error = anyhow::Error;

    fn try_from(sign: i8) -> anyhow::Result<Self> {
        match sign {
            1 => Ok(Self::First),
            -1 => Ok(Self::Second),
            _ => bail!("player should be +1 or -1, got {sign}"),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match &self {
                Self::First => "+1",
                Self::Second => "-1",
            }
        )
    }
}

/// Final result of the game. Unlike most of the search statistics, it is
/// absolute and does not depend on the player to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    /// The first player won.
    FirstPlayerWin,
    /// Nobody won.
    Draw,
    /// The second player won.
    SecondPlayerWin,
}

impl GameResult {
    /// Creates a decisive result for the `winner`.
    #[must_use]
    pub const fn win(winner: Player) -> Self {
        match winner {
            Player::First => Self::FirstPlayerWin,
            Player::Second => Self::SecondPlayerWin,
        }
    }

    /// Returns `+1`, `0` or `-1` for the first player win, draw and the second
    /// player win respectively.
    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Self::FirstPlayerWin => 1,
            Self::Draw => 0,
            Self::SecondPlayerWin => -1,
        }
    }

    /// Returns the winner or `None` for a draw.
    #[must_use]
    pub const fn winner(self) -> Option<Player> {
        match self {
            Self::FirstPlayerWin => Some(Player::First),
            Self::Draw => None,
            Self::SecondPlayerWin => Some(Player::Second),
        }
    }
}

impl TryFrom<i8> for GameResult {
    type Error = anyhow::Error;

    fn try_from(sign: i8) -> anyhow::Result<Self> {
        match sign {
            1 => Ok(Self::FirstPlayerWin),
            0 => Ok(Self::Draw),
            -1 => Ok(Self::SecondPlayerWin),
            _ => bail!("game result should be +1, 0 or -1, got {sign}"),
        }
    }
}

/// Immutable game position that the search can explore.
///
/// NOTE: The implementation is trusted. A non-terminal state without any
/// actions violates the contract and the search will panic on it.
pub trait Environment: Clone {
    /// A move in the game.
    type Action: Copy + Eq + Debug;
    /// Identity of the position: two states reached by different move orders
    /// that are otherwise identical must produce the same key.
    type Key: Eq + Hash;

    /// Returns the legal actions in a stable order. The list is empty if and
    /// only if the state is terminal.
    fn actions(&self) -> Vec<Self::Action>;

    /// Returns the final result of the game or `None` if it is still going
    /// on.
    fn result(&self) -> Option<GameResult>;

    /// Returns the player to move. Irrelevant for terminal states.
    fn turn(&self) -> Player;

    /// Returns the state after `action` has been played. The receiver is not
    /// modified.
    #[must_use]
    fn apply(&self, action: Self::Action) -> Self;

    /// Returns the transposition key of the position.
    fn key(&self) -> Self::Key;

    /// Returns `true` if no more moves can be made.
    fn is_terminal(&self) -> bool {
        self.result().is_some()
    }
}
