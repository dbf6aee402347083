//! Score, line and level bookkeeping

use std::time::Duration;

/// Gravity interval at level 0
pub const START_GRAVITY: Duration = Duration::from_secs(1);
/// Lines needed to leave level 0
pub const START_LINES_TO_LEVEL: i32 = 10;
/// Level from which each level-up speeds gravity up
pub const GRAVITY_SPEEDUP_LEVEL: u32 = 9;
const GRAVITY_SPEEDUP: f64 = 0.8;
/// Lifetime tetrises that earn a letter
pub const MAX_AWARDS: u8 = 6;
pub const MASTER_BONUS: u64 = 50_000;

/// Base points for 1 to 4 lines at level 0
const LINE_POINTS: [u64; 4] = [40, 100, 300, 1200];

/// Points for clearing `lines` rows at `level`
pub fn line_points(lines: u32, level: u32) -> u64 {
    if lines == 0 {
        return 0;
    }
    let base = LINE_POINTS[(lines.min(4) - 1) as usize];
    let multiplier = match level {
        0 => 1,
        1..=9 => level as u64,
        _ => 10,
    };
    base * multiplier
}

/// Lines between `level` and the next one
pub fn lines_per_level(level: u32) -> i32 {
    match level {
        1..=5 => 10,
        6..=9 => 15,
        10..=13 => 20,
        14..=17 => 25,
        _ => 30,
    }
}

/// What happened when a placement was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settlement {
    pub points: u64,
    pub master_bonus: bool,
    pub new_top: bool,
    pub level_up: bool,
}

/// Running totals for one game
#[derive(Debug, Clone)]
pub struct ScoreKeeper {
    pub score: u64,
    /// Best score on display: record 1, or the live score once it passes it
    pub top_score: u64,
    pub lines: u32,
    pub level: u32,
    pub lines_to_level: i32,
    pub gravity_interval: Duration,
    /// Lifetime tetrises, capped at `MAX_AWARDS`
    pub tetrises: u8,
    pub master_awarded: bool,
    /// Spawn counts indexed by `ShapeKind::stats_index`
    pub kind_counts: [u32; 7],
}

impl ScoreKeeper {
    pub fn new(top_score: u64) -> Self {
        Self {
            score: 0,
            top_score,
            lines: 0,
            level: 0,
            lines_to_level: START_LINES_TO_LEVEL,
            gravity_interval: START_GRAVITY,
            tetrises: 0,
            master_awarded: false,
            kind_counts: [0; 7],
        }
    }

    /// Record a tetris; returns the letter slot earned, if any are left
    pub fn award_tetris(&mut self) -> Option<usize> {
        if self.tetrises >= MAX_AWARDS {
            return None;
        }
        self.tetrises += 1;
        Some(self.tetrises as usize - 1)
    }

    /// Apply one placement's lines and drop bonus
    pub fn settle(&mut self, lines_cleared: u32, soft_rows: u32, hard_rows: u32) -> Settlement {
        let mut outcome = Settlement::default();

        if lines_cleared > 0 {
            self.lines += lines_cleared;
            self.lines_to_level -= lines_cleared as i32;
        }

        let mut points = line_points(lines_cleared, self.level);
        if self.tetrises == MAX_AWARDS && !self.master_awarded {
            self.master_awarded = true;
            outcome.master_bonus = true;
            points += MASTER_BONUS;
        }
        points += soft_rows as u64 + hard_rows as u64 * 2;
        self.score += points;
        outcome.points = points;

        if self.score > self.top_score {
            self.top_score = self.score;
            outcome.new_top = true;
        }

        if self.lines_to_level <= 0 {
            self.level_up();
            outcome.level_up = true;
        }

        outcome
    }

    fn level_up(&mut self) {
        self.level += 1;
        let per_level = lines_per_level(self.level);
        self.lines_to_level = per_level - (self.lines as i32 % per_level);
        if self.level >= GRAVITY_SPEEDUP_LEVEL {
            self.gravity_interval = self.gravity_interval.mul_f64(GRAVITY_SPEEDUP);
        }
        tracing::info!(level = self.level, lines = self.lines, "level up");
    }

    pub fn count_kind(&mut self, stats_index: usize) {
        self.kind_counts[stats_index] += 1;
    }
}

/// Letters of the award word, one per lifetime tetris
pub const AWARD_WORD: [char; 6] = ['T', 'E', 'T', 'R', 'I', 'S'];

/// Spinning award letters
///
/// Each earned letter carries its orientation in quarter turns. T, E and R
/// step through all four; I and S flip between upright and upside down.
#[derive(Debug, Clone, Default)]
pub struct AwardLetters {
    turns: [Option<u8>; 6],
}

impl AwardLetters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn award(&mut self, slot: usize) {
        self.turns[slot] = Some(0);
    }

    /// Advance every earned letter by one animation frame
    pub fn rotate(&mut self) {
        for (slot, turns) in self.turns.iter_mut().enumerate() {
            if let Some(t) = turns {
                let step = match AWARD_WORD[slot] {
                    'I' | 'S' => 2,
                    _ => 1,
                };
                *t = (*t + step) % 4;
            }
        }
    }

    /// Each slot's letter and orientation, `None` when not earned yet
    pub fn slots(&self) -> impl Iterator<Item = (char, Option<u8>)> + '_ {
        AWARD_WORD.iter().copied().zip(self.turns.iter().copied())
    }
}
