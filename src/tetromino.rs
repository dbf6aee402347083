//! Tetromino kinds, spawn layouts and rotation pivots

use rand::Rng;
use ratatui::style::Color;

/// Row of the spawn origin on the board
pub const SPAWN_ROW: i32 = 0;
/// Column of the spawn origin on the board
pub const SPAWN_COL: i32 = 3;

/// The seven tetromino kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    T,
    J,
    Z,
    O,
    S,
    L,
    I,
}

/// Direction of a 90 degree turn as seen on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// Block offsets `(row, col)` from the spawn origin, and the index of the pivot block
struct Layout {
    blocks: [(i32, i32); 4],
    pivot: Option<usize>,
}

const LAYOUTS: [Layout; 7] = [
    // T
    Layout {
        blocks: [(0, 1), (1, 0), (1, 1), (1, 2)],
        pivot: Some(2),
    },
    // J
    Layout {
        blocks: [(0, 0), (1, 0), (1, 1), (1, 2)],
        pivot: Some(2),
    },
    // Z
    Layout {
        blocks: [(0, 1), (0, 2), (1, 2), (1, 3)],
        pivot: Some(2),
    },
    // O
    Layout {
        blocks: [(0, 1), (0, 2), (1, 1), (1, 2)],
        pivot: None,
    },
    // S
    Layout {
        blocks: [(0, 1), (0, 2), (1, 0), (1, 1)],
        pivot: Some(3),
    },
    // L
    Layout {
        blocks: [(0, 3), (1, 1), (1, 2), (1, 3)],
        pivot: Some(2),
    },
    // I
    Layout {
        blocks: [(0, 0), (0, 1), (0, 2), (0, 3)],
        pivot: Some(1),
    },
];

/// Display colour per kind, indexed by `ShapeKind::index`
const COLORS: [Color; 7] = [
    Color::Magenta,
    Color::Blue,
    Color::Red,
    Color::Yellow,
    Color::Green,
    Color::Rgb(255, 165, 0),
    Color::Cyan,
];

impl ShapeKind {
    /// All kinds, in generation order
    pub fn all() -> &'static [ShapeKind; 7] {
        &[
            ShapeKind::T,
            ShapeKind::J,
            ShapeKind::Z,
            ShapeKind::O,
            ShapeKind::S,
            ShapeKind::L,
            ShapeKind::I,
        ]
    }

    /// Kinds in the order the statistics panel lists them
    pub fn stats_order() -> &'static [ShapeKind; 7] {
        &[
            ShapeKind::T,
            ShapeKind::L,
            ShapeKind::Z,
            ShapeKind::O,
            ShapeKind::S,
            ShapeKind::J,
            ShapeKind::I,
        ]
    }

    /// Position in `all()`; also indexes sprite tables
    pub fn index(self) -> usize {
        self as usize
    }

    /// Slot in the per-kind statistics counters
    pub fn stats_index(self) -> usize {
        match self {
            ShapeKind::T => 0,
            ShapeKind::L => 1,
            ShapeKind::Z => 2,
            ShapeKind::O => 3,
            ShapeKind::S => 4,
            ShapeKind::J => 5,
            ShapeKind::I => 6,
        }
    }

    /// Uniformly random kind
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::all()[rng.gen_range(0..7)]
    }

    /// Canonical spawn layout relative to the spawn origin
    pub fn layout(self) -> [(i32, i32); 4] {
        LAYOUTS[self.index()].blocks
    }

    /// Index of the block rotations turn about; `None` for the square
    pub fn pivot(self) -> Option<usize> {
        LAYOUTS[self.index()].pivot
    }

    pub fn color(self) -> Color {
        COLORS[self.index()]
    }

    pub fn letter(self) -> char {
        match self {
            ShapeKind::T => 'T',
            ShapeKind::J => 'J',
            ShapeKind::Z => 'Z',
            ShapeKind::O => 'O',
            ShapeKind::S => 'S',
            ShapeKind::L => 'L',
            ShapeKind::I => 'I',
        }
    }
}
