use std::fmt;

use anyhow::{bail, ensure};

use crate::environment::{Environment, GameResult, Player};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Tic-tac-toe position. The first player places `X`, actions are cell
/// indices `0..9` in row-major order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TicTacToe {
    cells: [Option<Player>; 9],
    turn: Player,
}

impl TicTacToe {
    /// Creates an empty board with `X` to move.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [None; 9],
            turn: Player::First,
        }
    }

    #[must_use]
    pub const fn cell(&self, index: usize) -> Option<Player> {
        self.cells[index]
    }

    fn winner(&self) -> Option<Player> {
        LINES.iter().find_map(|&[a, b, c]| {
            let owner = self.cells[a]?;
            (self.cells[b] == Some(owner) && self.cells[c] == Some(owner)).then_some(owner)
        })
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for TicTacToe {
    type Action = usize;
    /// Base-3 encoding of the cells: the side to move follows from the number
    /// of marks.
    type Key = u32;

    fn actions(&self) -> Vec<usize> {
        if self.is_terminal() {
            return vec![];
        }
        (0..9).filter(|&index| self.cells[index].is_none()).collect()
    }

    fn result(&self) -> Option<GameResult> {
        if let Some(winner) = self.winner() {
            return Some(GameResult::win(winner));
        }
        self.cells
            .iter()
            .all(Option::is_some)
            .then_some(GameResult::Draw)
    }

    fn turn(&self) -> Player {
        self.turn
    }

    fn apply(&self, action: usize) -> Self {
        assert!(
            self.cells[action].is_none(),
            "cell {action} is already occupied"
        );
        let mut next = *self;
        next.cells[action] = Some(self.turn);
        next.turn = !self.turn;
        next
    }

    fn key(&self) -> u32 {
        self.cells.iter().rev().fold(0, |key, cell| {
            key * 3
                + match cell {
                    None => 0,
                    Some(Player::First) => 1,
                    Some(Player::Second) => 2,
                }
        })
    }
}

impl TryFrom<&str> for TicTacToe {
    type Error = anyhow::Error;

    /// Parses 9 cells (`X`, `O` or `.`) in row-major order, whitespace is
    /// ignored. The side to move is inferred from the number of marks.
    fn try_from(input: &str) -> anyhow::Result<Self> {
        let mut cells = [None; 9];
        let mut count = 0;
        for symbol in input.chars().filter(|symbol| !symbol.is_whitespace()) {
            ensure!(count < 9, "expected 9 cells, got more in '{input}'");
            cells[count] = match symbol {
                'X' | 'x' => Some(Player::First),
                'O' | 'o' => Some(Player::Second),
                '.' => None,
                _ => bail!("unexpected cell symbol '{symbol}'"),
            };
            count += 1;
        }
        ensure!(count == 9, "expected 9 cells, got {count}");
        let crosses = cells.iter().filter(|&&cell| cell == Some(Player::First)).count();
        let noughts = cells.iter().filter(|&&cell| cell == Some(Player::Second)).count();
        let turn = match crosses.checked_sub(noughts) {
            Some(0) => Player::First,
            Some(1) => Player::Second,
            _ => bail!("impossible mark counts: {crosses} X and {noughts} O"),
        };
        Ok(Self { cells, turn })
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(3) {
            for cell in row {
                write!(
                    f,
                    "{}",
                    match cell {
                        None => '.',
                        Some(Player::First) => 'X',
                        Some(Player::Second) => 'O',
                    }
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
