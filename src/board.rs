//! Board engine
//!
//! Pure board operations: every mutation works on a fresh copy and returns
//! it, so a board that has already been handed out for broadcast is never
//! touched again.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest accepted row or column count for custom games
pub const MAX_DIMENSION: usize = 100;

/// Difficulty preset requested by the room creator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    #[default]
    Easy,
    Medium,
    Hard,
    Custom,
}

impl GameMode {
    /// Parse a wire mode name. Unknown names fall back to `Easy`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "medium" => Self::Medium,
            "hard" => Self::Hard,
            "custom" => Self::Custom,
            _ => Self::Easy,
        }
    }
}

/// Client-supplied dimensions for a custom game
///
/// Fields are kept as raw JSON so that missing or unusable values can fall
/// back to defaults instead of failing the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomConfig {
    #[serde(default)]
    pub rows: Option<Value>,
    #[serde(default)]
    pub cols: Option<Value>,
    #[serde(default)]
    pub bombs: Option<Value>,
}

/// Integer of at least `min` from a JSON value, if there is one
fn count_at_least(value: Option<&Value>, min: usize) -> Option<usize> {
    let value = value?;
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok().filter(|n| *n >= min);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= min as f64)
        .map(|f| f.min(usize::MAX as f64) as usize)
}

/// Board dimensions and mine count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub bombs: usize,
}

impl GameConfig {
    pub const EASY: Self = Self::new(8, 8, 10);
    pub const MEDIUM: Self = Self::new(16, 16, 40);
    pub const HARD: Self = Self::new(16, 30, 99);
    /// Fallback values for custom fields that are missing or unusable
    pub const CUSTOM_DEFAULT: Self = Self::new(10, 10, 20);

    pub const fn new(rows: usize, cols: usize, bombs: usize) -> Self {
        Self { rows, cols, bombs }
    }

    /// Resolve the config for a mode, reading custom values when asked to
    pub fn for_mode(mode: GameMode, custom: Option<&CustomConfig>) -> Self {
        match mode {
            GameMode::Easy => Self::EASY,
            GameMode::Medium => Self::MEDIUM,
            GameMode::Hard => Self::HARD,
            GameMode::Custom => {
                let custom = custom.cloned().unwrap_or_default();
                let fallback = Self::CUSTOM_DEFAULT;
                Self::new(
                    count_at_least(custom.rows.as_ref(), 1).unwrap_or(fallback.rows),
                    count_at_least(custom.cols.as_ref(), 1).unwrap_or(fallback.cols),
                    // Zero mines is allowed
                    count_at_least(custom.bombs.as_ref(), 0).unwrap_or(fallback.bombs),
                )
                .clamped()
            }
        }
    }

    /// Bring dimensions into `1..=MAX_DIMENSION` and keep at least one safe cell
    pub fn clamped(self) -> Self {
        let rows = self.rows.clamp(1, MAX_DIMENSION);
        let cols = self.cols.clamp(1, MAX_DIMENSION);
        let bombs = self.bombs.min(rows * cols - 1);
        Self { rows, cols, bombs }
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// A single board square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub is_bomb: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    /// Mines among the up-to-8 neighbours; fixed at creation, 0 for mines
    pub neighbor_bombs: u8,
}

impl Cell {
    fn hidden(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            is_bomb: false,
            is_revealed: false,
            is_flagged: false,
            neighbor_bombs: 0,
        }
    }
}

/// Result of toggling a flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagOutcome {
    pub board: Board,
    pub bombs_left: usize,
}

/// Coordinates of the in-bounds neighbours of `(row, col)`
fn neighbors(
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let row_end = (row + 1).min(rows.saturating_sub(1));
    let col_start = col.saturating_sub(1);
    let col_end = (col + 1).min(cols.saturating_sub(1));
    (row.saturating_sub(1)..=row_end)
        .flat_map(move |r| (col_start..=col_end).map(move |c| (r, c)))
        .filter(move |&pos| pos != (row, col))
}

/// Fixed-size grid of cells, serialized as a row-major nested array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: Vec<Vec<Cell>>,
}

impl Board {
    /// Build a board with `config.bombs` mines at random positions
    ///
    /// Mines are drawn without replacement from the pool of cell indices,
    /// so the count is exact even on nearly full boards.
    pub fn generate<R: Rng>(config: GameConfig, rng: &mut R) -> Self {
        let mut pool: Vec<usize> = (0..config.cell_count()).collect();
        let mut mines = Vec::with_capacity(config.bombs.min(pool.len()));

        while mines.len() < config.bombs && !pool.is_empty() {
            let index = pool.swap_remove(rng.gen_range(0..pool.len()));
            mines.push((index / config.cols, index % config.cols));
        }

        Self::with_mines(config.rows, config.cols, &mines)
    }

    /// Build a board with mines at exactly the given positions
    ///
    /// Out-of-bounds positions are ignored.
    pub fn with_mines(rows: usize, cols: usize, mines: &[(usize, usize)]) -> Self {
        let mut cells: Vec<Vec<Cell>> = (0..rows)
            .map(|row| (0..cols).map(|col| Cell::hidden(row, col)).collect())
            .collect();

        for &(row, col) in mines {
            if row < rows && col < cols {
                cells[row][col].is_bomb = true;
            }
        }

        for row in 0..rows {
            for col in 0..cols {
                if cells[row][col].is_bomb {
                    continue;
                }
                let count = neighbors(rows, cols, row, col)
                    .filter(|&(r, c)| cells[r][c].is_bomb)
                    .count();
                cells[row][col].neighbor_bombs = count as u8;
            }
        }

        Self { cells }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows() && col < self.cols()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row)?.get(col)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten()
    }

    pub fn bomb_count(&self) -> usize {
        self.cells().filter(|c| c.is_bomb).count()
    }

    pub fn flagged_count(&self) -> usize {
        self.cells().filter(|c| c.is_flagged).count()
    }

    /// Reveal a cell, flood-filling through cells with no neighbouring mines
    ///
    /// Returns an identical copy when the target is out of bounds, already
    /// revealed or flagged. Revealing a mine reveals only that cell; the
    /// caller decides what a hit means.
    pub fn reveal(&self, row: usize, col: usize) -> Board {
        let Some(&target) = self.cell(row, col) else {
            return self.clone();
        };
        if target.is_revealed || target.is_flagged {
            return self.clone();
        }

        let mut next = self.clone();
        next.cells[row][col].is_revealed = true;
        if target.is_bomb || target.neighbor_bombs > 0 {
            return next;
        }

        let (rows, cols) = (self.rows(), self.cols());
        let mut visited = vec![false; rows * cols];
        let mut stack = vec![(row, col)];

        while let Some((r, c)) = stack.pop() {
            if std::mem::replace(&mut visited[r * cols + c], true) {
                continue;
            }

            let cell = &mut next.cells[r][c];
            if cell.is_flagged {
                continue;
            }
            cell.is_revealed = true;
            if cell.neighbor_bombs > 0 {
                continue;
            }

            for (nr, nc) in neighbors(rows, cols, r, c) {
                let neighbor = &next.cells[nr][nc];
                if !neighbor.is_revealed && !neighbor.is_flagged && !visited[nr * cols + nc] {
                    stack.push((nr, nc));
                }
            }
        }

        next
    }

    /// Toggle a flag and adjust the remaining-mine counter
    ///
    /// Placing a new flag is refused once `bombs_left` reaches zero, so the
    /// counter never goes negative. Revealed or out-of-bounds cells are left
    /// alone.
    pub fn toggle_flag(&self, row: usize, col: usize, bombs_left: usize) -> FlagOutcome {
        let unchanged = || FlagOutcome {
            board: self.clone(),
            bombs_left,
        };

        let Some(cell) = self.cell(row, col) else {
            return unchanged();
        };
        if cell.is_revealed || (!cell.is_flagged && bombs_left == 0) {
            return unchanged();
        }

        let mut board = self.clone();
        let cell = &mut board.cells[row][col];
        cell.is_flagged = !cell.is_flagged;
        let bombs_left = if cell.is_flagged {
            bombs_left - 1
        } else {
            bombs_left + 1
        };

        FlagOutcome { board, bombs_left }
    }

    /// True once every non-mine cell is revealed
    pub fn is_won(&self) -> bool {
        self.cells().all(|c| c.is_bomb || c.is_revealed)
    }

    /// Copy of the board with every mine revealed, for end-of-game display
    pub fn reveal_all_mines(&self) -> Board {
        let mut next = self.clone();
        for cell in next.cells.iter_mut().flatten() {
            if cell.is_bomb {
                cell.is_revealed = true;
            }
        }
        next
    }

    /// Number of flagged cells around `(row, col)`
    pub fn flags_around(&self, row: usize, col: usize) -> usize {
        if !self.contains(row, col) {
            return 0;
        }
        neighbors(self.rows(), self.cols(), row, col)
            .filter(|&(r, c)| self.cells[r][c].is_flagged)
            .count()
    }
}
