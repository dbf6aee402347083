//! Playfield grid, row queries and row collapse

use crate::tetromino::ShapeKind;

/// Playfield dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// What a cell shows, independent of whether it blocks movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellContent {
    #[default]
    Empty,
    Shape(ShapeKind),
    Digit(u8),
    Preview,
    ClearFlash,
}

/// A single cell on the board
///
/// `occupied` is only ever set by a placed piece block. Preview and flash
/// markers change `content` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub occupied: bool,
    pub content: CellContent,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        occupied: false,
        content: CellContent::Empty,
    };

    pub fn is_empty(&self) -> bool {
        !self.occupied && self.content == CellContent::Empty
    }
}

/// The game board
#[derive(Debug, Clone)]
pub struct Board {
    /// Grid stored as [row][col], row 0 is the top, the floor is row `BOARD_HEIGHT - 1`
    cells: [[Cell; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [[Cell::EMPTY; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    /// Whether a signed position lies on the board
    pub fn in_bounds(row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < BOARD_HEIGHT && (col as usize) < BOARD_WIDTH
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row][col]
    }

    pub fn row(&self, row: usize) -> &[Cell; BOARD_WIDTH] {
        &self.cells[row]
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.cells[row][col].occupied
    }

    /// Occupancy for a signed position; panics when off the board
    pub fn is_occupied_at(&self, row: i32, col: i32) -> bool {
        assert!(
            Self::in_bounds(row, col),
            "board position ({row}, {col}) out of range"
        );
        self.is_occupied(row as usize, col as usize)
    }

    /// Write a placed block
    pub fn place(&mut self, row: usize, col: usize, kind: ShapeKind) {
        self.cells[row][col] = Cell {
            occupied: true,
            content: CellContent::Shape(kind),
        };
    }

    /// Change what a cell shows without touching occupancy
    pub fn set_content(&mut self, row: usize, col: usize, content: CellContent) {
        self.cells[row][col].content = content;
    }

    /// True iff every cell in `row` is occupied
    pub fn is_row_full(&self, row: usize) -> bool {
        self.cells[row].iter().all(|cell| cell.occupied)
    }

    pub fn occupied_in_row(&self, row: usize) -> usize {
        self.cells[row].iter().filter(|cell| cell.occupied).count()
    }

    pub fn clear_row(&mut self, row: usize) {
        self.cells[row] = [Cell::EMPTY; BOARD_WIDTH];
    }

    /// Move `from_row` onto `to_row` and empty `from_row`
    pub fn collapse_above(&mut self, from_row: usize, to_row: usize) {
        if from_row == to_row {
            return;
        }
        self.cells[to_row] = self.cells[from_row];
        self.clear_row(from_row);
    }

    /// Topmost row holding at least one placed block
    pub fn highest_occupied_row(&self) -> Option<usize> {
        (0..BOARD_HEIGHT).find(|&row| self.cells[row].iter().any(|cell| cell.occupied))
    }

    /// Remove `cleared` rows and let everything above settle into the gaps
    ///
    /// Rows are walked from the floor upward; each surviving row drops by the
    /// number of cleared rows beneath it, so relative order is preserved.
    pub fn collapse_rows(&mut self, cleared: &[usize]) {
        let Some(&lowest) = cleared.iter().max() else {
            return;
        };
        let highest = match self.highest_occupied_row() {
            Some(row) => row.min(lowest),
            None => lowest,
        };

        for &row in cleared {
            self.clear_row(row);
        }

        for row in (highest..lowest).rev() {
            if cleared.contains(&row) {
                continue;
            }
            let shift = cleared.iter().filter(|&&c| c > row).count();
            if shift > 0 {
                self.collapse_above(row, row + shift);
            }
        }
    }

    /// Empty every cell
    pub fn reset(&mut self) {
        self.cells = [[Cell::EMPTY; BOARD_WIDTH]; BOARD_HEIGHT];
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|cell| !cell.occupied)
    }
}

/// Split a number into digit cells, most significant first, left-padded to `width`
pub fn digits(value: u64, width: usize) -> Vec<Cell> {
    format!("{value:0width$}")
        .bytes()
        .map(|b| Cell {
            occupied: false,
            content: CellContent::Digit(b - b'0'),
        })
        .collect()
}
