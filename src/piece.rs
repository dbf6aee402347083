//! Active piece geometry: movement, rotation and drop distance

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Board};
use crate::tetromino::{RotationDirection, SPAWN_COL, SPAWN_ROW, ShapeKind};

/// Sideways movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    fn delta(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

/// A tetromino on the board, four `(row, col)` blocks
#[derive(Debug, Clone)]
pub struct Piece {
    pub kind: ShapeKind,
    blocks: [(i32, i32); 4],
    /// Rows gained under soft drop since the last placement
    pub rows_soft_dropped: u32,
    /// Rows covered by the last hard drop
    pub rows_hard_dropped: u32,
    /// Set when the last sideways move was rejected
    pub out_of_bounds: bool,
    placed: bool,
}

impl Piece {
    /// Create a piece at the spawn origin
    pub fn new(kind: ShapeKind) -> Self {
        Self::spawn_at(kind, SPAWN_ROW, SPAWN_COL)
    }

    /// Create a piece with its canonical layout at an arbitrary origin
    pub fn spawn_at(kind: ShapeKind, row: i32, col: i32) -> Self {
        let mut piece = Self {
            kind,
            blocks: [(0, 0); 4],
            rows_soft_dropped: 0,
            rows_hard_dropped: 0,
            out_of_bounds: false,
            placed: false,
        };
        piece.spawn(kind, row, col);
        piece
    }

    /// Reset to `kind`'s canonical layout at the given origin
    fn spawn(&mut self, kind: ShapeKind, row: i32, col: i32) {
        self.kind = kind;
        for (block, (dr, dc)) in self.blocks.iter_mut().zip(kind.layout()) {
            *block = (row + dr, col + dc);
        }
        self.placed = false;
        self.out_of_bounds = false;
    }

    pub fn blocks(&self) -> &[(i32, i32); 4] {
        &self.blocks
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn set_placed(&mut self, placed: bool) {
        self.placed = placed;
    }

    /// Shift every block by the same offset, unchecked
    pub fn translate(&mut self, d_row: i32, d_col: i32) {
        for (row, col) in self.blocks.iter_mut() {
            *row += d_row;
            *col += d_col;
        }
    }

    pub fn bottom_row(&self) -> i32 {
        self.blocks.iter().map(|&(row, _)| row).max().unwrap_or(0)
    }

    /// Whether every block is on the board and on a free cell
    pub fn fits(&self, board: &Board) -> bool {
        self.blocks
            .iter()
            .all(|&(row, col)| Board::in_bounds(row, col) && !board.is_occupied_at(row, col))
    }

    /// Rows the piece can fall before touching a placed block or the floor
    ///
    /// Each block scans its own column downward; the smallest gap wins.
    pub fn drop_distance(&self, board: &Board) -> i32 {
        let floor = BOARD_HEIGHT as i32 - 1;
        self.blocks
            .iter()
            .map(|&(row, col)| {
                let mut scan = row;
                while scan < floor {
                    if board.is_occupied_at(scan + 1, col) {
                        return scan - row;
                    }
                    scan += 1;
                }
                floor - row
            })
            .min()
            .unwrap_or(0)
    }

    /// Columns between the piece and the wall it is heading for
    pub fn border_distance(&self, direction: Direction) -> i32 {
        let last_col = BOARD_WIDTH as i32 - 1;
        self.blocks
            .iter()
            .map(|&(_, col)| match direction {
                Direction::Left => col,
                Direction::Right => last_col - col,
            })
            .min()
            .unwrap_or(0)
    }

    /// Move one column sideways
    ///
    /// Returns `true` when the move was rejected because a wall or a placed
    /// block is in the way; the piece is left untouched in that case.
    pub fn shift(&mut self, direction: Direction, board: &Board) -> bool {
        let delta = direction.delta();
        let blocked = self.border_distance(direction) < 1
            || self
                .blocks
                .iter()
                .any(|&(row, col)| board.is_occupied_at(row, col + delta));

        self.out_of_bounds = blocked;
        if !blocked {
            self.translate(0, delta);
        }
        blocked
    }

    /// Turn 90 degrees about the pivot block with a two pass nudge
    ///
    /// The rotated shape is first pushed back inside the walls, then pushed
    /// one tile away from the pivot for every block that lands on a placed
    /// cell. If the result still does not fit, the original blocks are
    /// restored and `false` is returned. The square never turns and always
    /// succeeds.
    pub fn rotate(&mut self, direction: RotationDirection, board: &Board) -> bool {
        let Some(pivot_index) = self.kind.pivot() else {
            return true;
        };
        let original = self.blocks;
        let (pivot_row, pivot_col) = self.blocks[pivot_index];

        for block in self.blocks.iter_mut() {
            let x = block.1 - pivot_col;
            let y = block.0 - pivot_row;
            let (x, y) = match direction {
                RotationDirection::CounterClockwise => (y, -x),
                RotationDirection::Clockwise => (-y, x),
            };
            *block = (pivot_row + y, pivot_col + x);
        }

        let (d_row, d_col) = self.wall_offset();
        self.translate(d_row, d_col);

        let (d_row, d_col) = self.collision_offset(pivot_index, board);
        self.translate(d_row, d_col);

        if self.fits(board) {
            true
        } else {
            self.blocks = original;
            false
        }
    }

    /// Smallest per-axis offset that brings every block inside the walls
    fn wall_offset(&self) -> (i32, i32) {
        let axis = |values: [i32; 4], limit: i32| {
            let min = values.iter().copied().min().unwrap_or(0);
            let max = values.iter().copied().max().unwrap_or(0);
            if min < 0 {
                -min
            } else if max > limit {
                limit - max
            } else {
                0
            }
        };
        let rows = self.blocks.map(|(row, _)| row);
        let cols = self.blocks.map(|(_, col)| col);
        (
            axis(rows, BOARD_HEIGHT as i32 - 1),
            axis(cols, BOARD_WIDTH as i32 - 1),
        )
    }

    /// Accumulated one-tile pushes away from each placed cell the blocks overlap
    fn collision_offset(&self, pivot_index: usize, board: &Board) -> (i32, i32) {
        let (pivot_row, pivot_col) = self.blocks[pivot_index];
        let mut offset = (0, 0);

        for &(row, col) in &self.blocks {
            if !Board::in_bounds(row, col) || !board.is_occupied_at(row, col) {
                continue;
            }
            let x_diff = pivot_col - col;
            let y_diff = pivot_row - row;
            if x_diff == -y_diff {
                continue;
            }
            if x_diff < 0 {
                offset.1 -= 1;
            } else if x_diff > 0 {
                offset.1 += 1;
            } else if y_diff < 0 {
                offset.0 -= 1;
            } else {
                offset.0 += 1;
            }
        }
        offset
    }

    /// Advance one row under gravity
    ///
    /// Moves down when there is room and flags the piece placed once it has
    /// at most one row left. Returns whether the piece moved.
    pub fn fall(&mut self, board: &Board) -> bool {
        let distance = self.drop_distance(board);
        let moved = distance >= 1;
        if moved {
            self.translate(1, 0);
        }
        if distance <= 1 {
            self.placed = true;
        }
        moved
    }

    /// Drop straight to the resting position and flag placed
    pub fn hard_drop(&mut self, board: &Board) -> u32 {
        let before = self.bottom_row();
        self.force_drop(board);
        self.rows_hard_dropped = (self.bottom_row() - before) as u32;
        self.placed = true;
        self.rows_hard_dropped
    }

    /// Drop straight to the resting position without touching any counters
    pub fn force_drop(&mut self, board: &Board) {
        let distance = self.drop_distance(board);
        if distance >= 1 {
            self.translate(distance, 0);
        }
    }

    /// Where the piece would rest if dropped now
    pub fn ghost_blocks(&self, board: &Board) -> [(i32, i32); 4] {
        let distance = self.drop_distance(board);
        self.blocks.map(|(row, col)| (row + distance, col))
    }
}
