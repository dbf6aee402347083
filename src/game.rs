//! Core game state and the per-frame update

use crate::audio::{AudioSink, Cue};
use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Board, CellContent};
use crate::clock::{FRAME_INTERVAL, IntervalTimer, LETTER_ROTATE_INTERVAL, SOFT_DROP_INTERVAL};
use crate::piece::{Direction, Piece};
use crate::records::{RecordStore, TopThree};
use crate::score::{AwardLetters, ScoreKeeper};
use crate::tetromino::{RotationDirection, ShapeKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Frames a softly landed piece can still be moved before it locks
pub const LOCK_DELAY_FRAMES: u32 = 30;
/// Frames between steps of the line clear wipe
const CLEAR_STEP_FRAMES: u32 = 3;
/// Length of the line clear animation
const CLEAR_ANIMATION_FRAMES: u32 = 15;
/// Columns the wipe starts from
const WIPE_LEFT: i32 = BOARD_WIDTH as i32 / 2 - 1;
const WIPE_RIGHT: i32 = BOARD_WIDTH as i32 / 2;

/// Player commands applied on the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateCW,
    RotateCCW,
    HardDrop,
}

/// Parts of the screen that changed since the renderer last looked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    All,
    Board,
    Next,
    Stats,
    Score,
    Lines,
    Level,
    TopScore,
    Letters,
}

/// Line clear wipe in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearAnimation {
    /// Rows being cleared, lowest on screen first
    rows: Vec<usize>,
    frame: u32,
    left: i32,
    right: i32,
    effects_played: bool,
}

impl ClearAnimation {
    fn new(rows: Vec<usize>) -> Self {
        Self {
            rows,
            frame: 0,
            left: WIPE_LEFT,
            right: WIPE_RIGHT,
            effects_played: false,
        }
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// One frame of the wipe: flash the two leading columns white and blank
    /// the ones behind them once the flash has moved off the centre
    fn advance(&mut self, board: &mut Board) {
        if self.frame % CLEAR_STEP_FRAMES == 0 {
            for &row in &self.rows {
                board.set_content(row, self.left as usize, CellContent::ClearFlash);
                board.set_content(row, self.right as usize, CellContent::ClearFlash);
                if self.left < WIPE_LEFT && self.right > WIPE_RIGHT {
                    board.set_content(row, self.left as usize + 1, CellContent::Empty);
                    board.set_content(row, self.right as usize - 1, CellContent::Empty);
                }
            }
            self.left -= 1;
            self.right += 1;
        }
        self.frame += 1;
    }

    fn is_done(&self) -> bool {
        self.frame >= CLEAR_ANIMATION_FRAMES
    }
}

/// Where the engine is in the life of a piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No game running
    Idle,
    /// Game started, first tick not yet run
    Beginning,
    Active,
    /// Landed softly, counting down to lock
    Delay { frames: u32 },
    AnimatingClear(ClearAnimation),
    GameOver,
}

/// How a game ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverReport {
    /// 1-based place among the top three, if the score made it
    pub place: Option<usize>,
    /// Whether the piece that could not enter was drawn on the board
    pub final_piece_drawn: bool,
    /// Top three with the player entered as `???` when placed
    pub standing: TopThree,
}

/// The game engine
///
/// Input arrives through `queue_action`, `set_soft_drop`, `pause` and
/// `resume`; the board and pieces are only mutated from `update`/`tick`.
pub struct GameEngine {
    /// Playfield, including ghost and wipe contents
    board: Board,
    /// Piece under player control
    current: Piece,
    /// Piece shown in the next box
    next: Piece,
    phase: Phase,
    /// Paused from the pause menu
    paused: bool,
    /// A menu owns the input; ticks are skipped
    menu_active: bool,
    score: ScoreKeeper,
    /// TETRIS letters earned and their spin frames
    letters: AwardLetters,
    /// Top three as loaded or last saved
    records: TopThree,
    /// Set when the game ends, consumed by name entry
    game_over: Option<GameOverReport>,

    /// Gates `tick` to the frame rate
    frame_timer: IntervalTimer,
    /// Moves the current piece down one row
    gravity_timer: IntervalTimer,
    /// Spins the earned letters
    letter_timer: IntervalTimer,

    /// Soft drop key held
    soft_drop_held: bool,
    /// Hard drop applied this tick, lock without delay
    hard_drop_requested: bool,
    /// Action waiting for the next tick
    pending: Option<Action>,
    /// Cells currently painted as the landing preview
    ghost: Option<[(i32, i32); 4]>,
    /// Rows cleared by the piece being settled
    lines_cleared_at_once: u32,
    /// Regions changed since the last `take_redraws`
    dirty: Vec<Region>,

    /// Piece generator
    rng: ChaCha8Rng,
    audio: Box<dyn AudioSink>,
    /// Top-three persistence
    store: Box<dyn RecordStore>,
}

impl GameEngine {
    /// Create an idle engine with an entropy-seeded piece generator
    pub fn new(audio: Box<dyn AudioSink>, store: Box<dyn RecordStore>) -> Self {
        Self::with_rng(audio, store, ChaCha8Rng::from_entropy())
    }

    /// Create an idle engine with a given piece generator
    pub fn with_rng(
        audio: Box<dyn AudioSink>,
        mut store: Box<dyn RecordStore>,
        mut rng: ChaCha8Rng,
    ) -> Self {
        let records = store.load_top_three();
        let current = Piece::new(ShapeKind::random(&mut rng));
        let next = Piece::new(ShapeKind::random(&mut rng));

        Self {
            board: Board::new(),
            current,
            next,
            phase: Phase::Idle,
            paused: false,
            menu_active: true,
            score: ScoreKeeper::new(records.best()),
            letters: AwardLetters::new(),
            records,
            game_over: None,
            frame_timer: IntervalTimer::new(FRAME_INTERVAL),
            gravity_timer: IntervalTimer::new(Duration::from_secs(1)),
            letter_timer: IntervalTimer::new(LETTER_ROTATE_INTERVAL),
            soft_drop_held: false,
            hard_drop_requested: false,
            pending: None,
            ghost: None,
            lines_cleared_at_once: 0,
            dirty: vec![Region::All],
            rng,
            audio,
            store,
        }
    }

    // --- collaborator-facing state ---

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn score(&self) -> &ScoreKeeper {
        &self.score
    }

    pub fn letters(&self) -> &AwardLetters {
        &self.letters
    }

    pub fn records(&self) -> &TopThree {
        &self.records
    }

    pub fn game_over(&self) -> Option<&GameOverReport> {
        self.game_over.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_menu_active(&self) -> bool {
        self.menu_active
    }

    /// A game is in progress (possibly paused)
    pub fn in_game(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::GameOver)
    }

    /// The piece the player controls, while it is not part of the board
    pub fn active_piece(&self) -> Option<&Piece> {
        match self.phase {
            Phase::Beginning | Phase::Active | Phase::Delay { .. } => Some(&self.current),
            _ => None,
        }
    }

    /// Kind shown in the next box
    ///
    /// When the game ended because the new piece could not enter at all, the
    /// blocked piece is shown here instead.
    pub fn preview_kind(&self) -> Option<ShapeKind> {
        match (&self.phase, &self.game_over) {
            (Phase::Idle, _) => None,
            (Phase::GameOver, Some(report)) if !report.final_piece_drawn => Some(self.current.kind),
            _ => Some(self.next.kind),
        }
    }

    /// Regions changed since the last call
    pub fn take_redraws(&mut self) -> Vec<Region> {
        std::mem::take(&mut self.dirty)
    }

    /// Play a cue on behalf of the menus
    pub fn play_cue(&mut self, cue: Cue) {
        self.audio.play(cue);
    }

    // --- input ---

    /// Queue a command for the next tick, replacing any still pending
    pub fn queue_action(&mut self, action: Action) {
        self.pending = Some(action);
    }

    pub fn set_soft_drop(&mut self, held: bool) {
        self.soft_drop_held = held;
    }

    // --- session control ---

    /// Start a fresh game
    pub fn start_game(&mut self) {
        self.reset_session();
        self.phase = Phase::Beginning;
        self.menu_active = false;
        self.gravity_timer.restart();
        self.frame_timer.restart();
        self.audio.start_music();
        tracing::info!(
            current = ?self.current.kind,
            next = ?self.next.kind,
            "new game"
        );
    }

    pub fn pause(&mut self) {
        if !self.in_game() || self.paused {
            return;
        }
        self.paused = true;
        self.menu_active = true;
        self.audio.stop_music();
        tracing::debug!("paused");
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.menu_active = false;
        self.audio.resume_music();
        tracing::debug!("resumed");
    }

    /// Abandon the running game without ranking it
    pub fn quit(&mut self) {
        if !self.in_game() {
            return;
        }
        tracing::info!(score = self.score.score, "game quit");
        self.audio.stop_music();
        self.reset_session();
        self.menu_active = true;
    }

    /// Acknowledge the game-over screen
    ///
    /// Returns the place awaiting a name, if any. Otherwise the engine
    /// returns to idle.
    pub fn confirm_game_over(&mut self) -> Option<usize> {
        if self.phase != Phase::GameOver {
            return None;
        }
        self.menu_active = true;
        let place = self.game_over.as_ref().and_then(|report| report.place);
        if place.is_none() {
            self.reset_session();
        }
        place
    }

    /// Store the player's name for the pending place and return to idle
    pub fn save_name(&mut self, name: &str) {
        let Some(report) = self.game_over.take() else {
            return;
        };
        if let Some(place) = report.place {
            self.records = self.store.update_from(place, name, &report.standing);
        }
        self.reset_session();
        self.menu_active = true;
    }

    fn reset_session(&mut self) {
        self.board.reset();
        self.current = Piece::new(ShapeKind::random(&mut self.rng));
        self.next = Piece::new(ShapeKind::random(&mut self.rng));
        self.phase = Phase::Idle;
        self.paused = false;
        self.score = ScoreKeeper::new(self.records.best());
        self.letters = AwardLetters::new();
        self.game_over = None;
        self.gravity_timer.stop();
        self.frame_timer.stop();
        self.letter_timer.stop();
        self.soft_drop_held = false;
        self.hard_drop_requested = false;
        self.pending = None;
        self.ghost = None;
        self.lines_cleared_at_once = 0;
        self.mark(Region::All);
    }

    // --- frame pump ---

    /// Feed elapsed real time; runs gravity and at most one tick
    pub fn update(&mut self, dt: Duration) {
        if !self.in_game() {
            return;
        }
        if !self.paused {
            let interval = if self.soft_drop_held {
                SOFT_DROP_INTERVAL
            } else {
                self.score.gravity_interval
            };
            self.gravity_timer.set_interval(interval);
            if self.gravity_timer.advance(dt) {
                self.apply_gravity();
            }
            if self.letter_timer.advance(dt) {
                self.letters.rotate();
                self.mark(Region::Letters);
            }
        }
        if self.frame_timer.advance(dt) {
            self.tick();
        }
    }

    /// One authoritative game step
    ///
    /// Does nothing while a menu is open, so pausing freezes the lock delay
    /// and clear animation counters along with gravity.
    pub fn tick(&mut self) {
        if self.menu_active || !self.in_game() {
            self.pending = None;
            return;
        }

        if let Some(action) = self.pending.take() {
            self.apply_action(action);
        }

        if self.phase == Phase::Beginning {
            self.count_current();
            self.phase = Phase::Active;
            self.mark(Region::Next);
        }

        if !matches!(self.phase, Phase::AnimatingClear(_)) {
            self.update_preview();
        }

        let mut lock = false;
        if self.phase == Phase::Active && self.current.is_placed() {
            self.soft_drop_held = false;
            if self.hard_drop_requested {
                lock = true;
            } else {
                self.audio.play(Cue::OutOfBounds);
                self.gravity_timer.stop();
                self.phase = Phase::Delay { frames: 0 };
            }
        }

        let mut delay_over = false;
        if let Phase::Delay { frames } = &mut self.phase {
            *frames += 1;
            delay_over = *frames >= LOCK_DELAY_FRAMES;
        }
        if delay_over {
            self.phase = Phase::Active;
            self.gravity_timer.start();
            lock = true;
        }

        if lock {
            self.lock_piece();
        }

        if matches!(self.phase, Phase::AnimatingClear(_)) {
            self.step_clear_animation();
        }

        self.hard_drop_requested = false;
    }

    fn apply_gravity(&mut self) {
        if !matches!(self.phase, Phase::Beginning | Phase::Active) {
            return;
        }
        if self.current.fall(&self.board) {
            if self.soft_drop_held {
                self.current.rows_soft_dropped += 1;
            }
            self.mark(Region::Board);
        }
    }

    fn apply_action(&mut self, action: Action) {
        if !matches!(
            self.phase,
            Phase::Beginning | Phase::Active | Phase::Delay { .. }
        ) {
            return;
        }
        match action {
            Action::MoveLeft | Action::MoveRight => {
                let direction = if action == Action::MoveLeft {
                    Direction::Left
                } else {
                    Direction::Right
                };
                if self.current.shift(direction, &self.board) {
                    self.audio.play(Cue::OutOfBounds);
                }
            }
            Action::RotateCW | Action::RotateCCW => {
                let direction = if action == Action::RotateCW {
                    RotationDirection::Clockwise
                } else {
                    RotationDirection::CounterClockwise
                };
                if self.current.rotate(direction, &self.board) {
                    self.audio.play(Cue::Rotate);
                } else {
                    self.audio.play(Cue::OutOfBounds);
                }
            }
            Action::HardDrop => {
                let rows = self.current.hard_drop(&self.board);
                self.hard_drop_requested = true;
                tracing::debug!(rows, "hard drop");
            }
        }
        self.mark(Region::Board);
    }

    /// Repaint the landing projection of the current piece
    fn update_preview(&mut self) {
        let ghost = self.current.ghost_blocks(&self.board);
        if self.ghost == Some(ghost) {
            return;
        }
        if let Some(old) = self.ghost.take() {
            for (row, col) in old {
                let (row, col) = (row as usize, col as usize);
                if !self.board.is_occupied(row, col)
                    && self.board.cell(row, col).content == CellContent::Preview
                {
                    self.board.set_content(row, col, CellContent::Empty);
                }
            }
        }
        for (row, col) in ghost {
            let (row, col) = (row as usize, col as usize);
            if !self.board.is_occupied(row, col) {
                self.board.set_content(row, col, CellContent::Preview);
            }
        }
        self.ghost = Some(ghost);
        self.mark(Region::Board);
    }

    /// Settle the current piece into the board and queue any full rows
    fn lock_piece(&mut self) {
        self.current.force_drop(&self.board);
        let kind = self.current.kind;
        for &(row, col) in self.current.blocks() {
            self.board.place(row as usize, col as usize, kind);
        }
        self.ghost = None;
        self.mark(Region::Board);

        let mut rows: Vec<usize> = self
            .current
            .blocks()
            .iter()
            .map(|&(row, _)| row as usize)
            .filter(|&row| self.board.is_row_full(row))
            .collect();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        rows.dedup();
        self.lines_cleared_at_once = rows.len() as u32;

        tracing::debug!(kind = ?kind, cleared = rows.len(), "piece locked");

        if rows.is_empty() {
            self.advance_piece();
        } else {
            self.gravity_timer.stop();
            self.phase = Phase::AnimatingClear(ClearAnimation::new(rows));
        }
    }

    fn step_clear_animation(&mut self) {
        let Phase::AnimatingClear(mut animation) =
            std::mem::replace(&mut self.phase, Phase::Active)
        else {
            return;
        };

        if !animation.effects_played {
            animation.effects_played = true;
            self.play_clear_effects(animation.rows.len());
        }

        animation.advance(&mut self.board);
        self.mark(Region::Board);

        if animation.is_done() {
            self.board.collapse_rows(&animation.rows);
            self.gravity_timer.start();
            self.advance_piece();
        } else {
            self.phase = Phase::AnimatingClear(animation);
        }
    }

    fn play_clear_effects(&mut self, lines: usize) {
        self.audio.play(Cue::LineClear);
        if lines == 4 {
            self.audio.play(Cue::Tetris);
            if let Some(slot) = self.score.award_tetris() {
                self.letters.award(slot);
                self.mark(Region::Letters);
                tracing::info!(tetrises = self.score.tetrises, "award letter");
            }
            if !self.letter_timer.is_running() {
                self.letter_timer.restart();
            }
        }
    }

    /// Bring in the next piece, end the game if it has no room, otherwise
    /// settle the score for the piece just placed
    fn advance_piece(&mut self) {
        let soft_rows = self.current.rows_soft_dropped;
        let hard_rows = self.current.rows_hard_dropped;
        let lines = std::mem::take(&mut self.lines_cleared_at_once);

        self.current = Piece::new(self.next.kind);
        self.next = Piece::new(ShapeKind::random(&mut self.rng));
        self.gravity_timer.restart();
        self.mark(Region::Next);
        self.mark(Region::Board);

        let blocked = self
            .current
            .blocks()
            .iter()
            .any(|&(row, col)| row <= 1 && self.board.is_occupied_at(row, col));
        if blocked {
            self.end_game(false);
            return;
        }

        let no_room = self.current.blocks().iter().any(|&(row, col)| {
            row <= 1 && ((row + 1) as usize) < BOARD_HEIGHT && self.board.is_occupied_at(row + 1, col)
        });
        if no_room {
            let kind = self.current.kind;
            for &(row, col) in self.current.blocks() {
                self.board
                    .set_content(row as usize, col as usize, CellContent::Shape(kind));
            }
            self.count_current();
            self.end_game(true);
            return;
        }

        self.phase = Phase::Active;
        let outcome = self.score.settle(lines, soft_rows, hard_rows);
        self.audio.play(Cue::Drop);
        if outcome.master_bonus {
            self.audio.play(Cue::TetrisMaster);
            self.mark(Region::All);
            tracing::info!("all award letters earned");
        }
        if outcome.level_up {
            self.audio.play(Cue::LevelUp);
            self.mark(Region::Level);
        }
        if outcome.new_top {
            self.mark(Region::TopScore);
        }
        if lines > 0 {
            self.mark(Region::Lines);
        }
        self.mark(Region::Score);
        self.count_current();
        tracing::debug!(kind = ?self.current.kind, "spawned");
    }

    fn end_game(&mut self, final_piece_drawn: bool) {
        self.gravity_timer.stop();
        self.letter_timer.stop();
        self.current.set_placed(false);
        self.audio.stop_music();

        let score = self.score.score;
        let place = self.records.place_for(score);
        let standing = match place {
            Some(place) => self.records.provisional(place, score),
            None => self.records.clone(),
        };
        if place.is_some() {
            self.audio.play(Cue::HighScore);
        } else {
            self.audio.play(Cue::GameOver);
        }

        tracing::info!(
            score,
            lines = self.score.lines,
            level = self.score.level,
            place = ?place,
            "game over"
        );

        self.game_over = Some(GameOverReport {
            place,
            final_piece_drawn,
            standing,
        });
        self.phase = Phase::GameOver;
        self.mark(Region::All);
    }

    fn count_current(&mut self) {
        self.score.count_kind(self.current.kind.stats_index());
        self.mark(Region::Stats);
    }

    fn mark(&mut self, region: Region) {
        if !self.dirty.contains(&region) {
            self.dirty.push(region);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioEvent, RecordingAudio};
    use crate::board::Cell;
    use crate::records::{MemoryRecordStore, PENDING_NAME, PlayerRecord};

    fn engine() -> (GameEngine, RecordingAudio) {
        let audio = RecordingAudio::default();
        let engine = GameEngine::with_rng(
            Box::new(audio.clone()),
            Box::new(MemoryRecordStore::default()),
            ChaCha8Rng::seed_from_u64(42),
        );
        (engine, audio)
    }

    /// Engine past its first tick with chosen pieces
    fn playing(current: ShapeKind, next: ShapeKind) -> (GameEngine, RecordingAudio) {
        let (mut engine, audio) = engine();
        engine.start_game();
        engine.tick();
        engine.current = Piece::new(current);
        engine.next = Piece::new(next);
        audio.clear();
        (engine, audio)
    }

    fn fill_row_except(engine: &mut GameEngine, row: usize, gaps: &[usize]) {
        for col in 0..BOARD_WIDTH {
            if !gaps.contains(&col) {
                engine.board.place(row, col, ShapeKind::Z);
            }
        }
    }

    fn run_ticks(engine: &mut GameEngine, n: usize) {
        for _ in 0..n {
            engine.tick();
        }
    }

    #[test]
    fn test_new_engine_is_idle() {
        let (mut engine, _) = engine();
        assert_eq!(engine.phase(), &Phase::Idle);
        assert!(engine.is_menu_active());
        assert!(engine.active_piece().is_none());
        assert_eq!(engine.score().top_score, 10_000);
        engine.tick();
        engine.update(Duration::from_secs(5));
        assert_eq!(engine.phase(), &Phase::Idle);
    }

    #[test]
    fn test_start_game() {
        let (mut engine, audio) = engine();
        engine.start_game();
        assert_eq!(engine.phase(), &Phase::Beginning);
        assert!(!engine.is_menu_active());
        assert!(audio.events.borrow().contains(&AudioEvent::StartMusic));

        engine.tick();
        assert_eq!(engine.phase(), &Phase::Active);
        assert_eq!(engine.score().kind_counts.iter().sum::<u32>(), 1);
        assert!(engine.active_piece().is_some());
    }

    #[test]
    fn test_hard_drop_i_on_empty_board() {
        let (mut engine, audio) = playing(ShapeKind::I, ShapeKind::O);
        engine.queue_action(Action::HardDrop);
        engine.tick();

        for col in 3..7 {
            assert!(engine.board().is_occupied(19, col));
        }
        assert_eq!(engine.board().occupied_in_row(19), 4);
        assert_eq!(engine.score().score, 38);
        assert_eq!(engine.score().lines, 0);
        assert_eq!(engine.phase(), &Phase::Active);
        assert_eq!(engine.active_piece().map(|p| p.kind), Some(ShapeKind::O));
        assert_eq!(audio.count(Cue::Drop), 1);
        assert_eq!(audio.count(Cue::LineClear), 0);
    }

    #[test]
    fn test_ghost_painted_and_erased() {
        let (mut engine, _) = playing(ShapeKind::O, ShapeKind::T);
        engine.tick();
        assert_eq!(engine.board().cell(19, 4).content, CellContent::Preview);
        assert_eq!(engine.board().cell(18, 5).content, CellContent::Preview);
        assert!(!engine.board().is_occupied(19, 4));

        engine.queue_action(Action::MoveLeft);
        engine.tick();
        assert_eq!(engine.board().cell(19, 3).content, CellContent::Preview);
        assert_eq!(engine.board().cell(19, 5).content, CellContent::Empty);
    }

    #[test]
    fn test_soft_landing_waits_lock_delay() {
        let (mut engine, audio) = playing(ShapeKind::O, ShapeKind::T);
        engine.current = Piece::spawn_at(ShapeKind::O, 17, 3);
        engine.current.fall(&engine.board);
        assert!(engine.current.is_placed());

        engine.tick();
        assert_eq!(engine.phase(), &Phase::Delay { frames: 1 });
        assert_eq!(audio.count(Cue::OutOfBounds), 1);
        assert!(!engine.board().is_occupied(19, 4));

        run_ticks(&mut engine, (LOCK_DELAY_FRAMES - 2) as usize);
        assert!(matches!(engine.phase(), Phase::Delay { .. }));

        engine.tick();
        assert_eq!(engine.phase(), &Phase::Active);
        assert!(engine.board().is_occupied(19, 4));
        assert!(engine.board().is_occupied(18, 5));
        assert_eq!(engine.active_piece().map(|p| p.kind), Some(ShapeKind::T));
    }

    #[test]
    fn test_piece_movable_during_lock_delay() {
        let (mut engine, _) = playing(ShapeKind::O, ShapeKind::T);
        engine.current = Piece::spawn_at(ShapeKind::O, 17, 3);
        engine.current.fall(&engine.board);
        engine.tick();

        engine.queue_action(Action::MoveLeft);
        engine.tick();
        assert!(matches!(engine.phase(), Phase::Delay { .. }));

        run_ticks(&mut engine, LOCK_DELAY_FRAMES as usize);
        assert!(engine.board().is_occupied(19, 3));
        assert!(!engine.board().is_occupied(19, 5));
    }

    #[test]
    fn test_gravity_follows_interval() {
        let (mut engine, _) = playing(ShapeKind::T, ShapeKind::T);
        engine.update(Duration::from_millis(500));
        assert_eq!(engine.current.bottom_row(), 1);
        engine.update(Duration::from_millis(500));
        assert_eq!(engine.current.bottom_row(), 2);
    }

    #[test]
    fn test_soft_drop_counts_rows() {
        let (mut engine, _) = playing(ShapeKind::T, ShapeKind::T);
        engine.set_soft_drop(true);
        engine.update(SOFT_DROP_INTERVAL);
        engine.update(SOFT_DROP_INTERVAL);
        assert_eq!(engine.current.bottom_row(), 3);
        assert_eq!(engine.current.rows_soft_dropped, 2);
    }

    #[test]
    fn test_pause_freezes_gravity() {
        let (mut engine, audio) = playing(ShapeKind::T, ShapeKind::T);
        engine.update(Duration::from_millis(600));
        engine.pause();
        assert!(engine.is_paused());
        assert!(engine.is_menu_active());
        assert!(audio.events.borrow().contains(&AudioEvent::StopMusic));

        engine.update(Duration::from_secs(10));
        assert_eq!(engine.current.bottom_row(), 1);

        engine.resume();
        assert!(audio.events.borrow().contains(&AudioEvent::ResumeMusic));
        engine.update(Duration::from_millis(300));
        assert_eq!(engine.current.bottom_row(), 1);
        engine.update(Duration::from_millis(100));
        assert_eq!(engine.current.bottom_row(), 2);
    }

    #[test]
    fn test_actions_ignored_while_paused() {
        let (mut engine, _) = playing(ShapeKind::T, ShapeKind::T);
        engine.pause();
        let before = *engine.current.blocks();
        engine.queue_action(Action::MoveLeft);
        engine.tick();
        engine.resume();
        engine.tick();
        assert_eq!(engine.current.blocks(), &before);
    }

    #[test]
    fn test_rejected_move_plays_cue() {
        let (mut engine, audio) = playing(ShapeKind::I, ShapeKind::T);
        for _ in 0..4 {
            engine.queue_action(Action::MoveLeft);
            engine.tick();
        }
        assert_eq!(audio.count(Cue::OutOfBounds), 1);
        assert_eq!(engine.current.blocks()[0], (0, 0));
    }

    #[test]
    fn test_rotation_cue() {
        let (mut engine, audio) = playing(ShapeKind::T, ShapeKind::T);
        engine.current = Piece::spawn_at(ShapeKind::T, 8, 3);
        engine.queue_action(Action::RotateCW);
        engine.tick();
        assert_eq!(audio.count(Cue::Rotate), 1);
    }

    #[test]
    fn test_single_line_clear() {
        let (mut engine, audio) = playing(ShapeKind::O, ShapeKind::T);
        fill_row_except(&mut engine, 19, &[4, 5]);
        engine.queue_action(Action::HardDrop);
        engine.tick();

        let Phase::AnimatingClear(animation) = engine.phase() else {
            panic!("expected clear animation, got {:?}", engine.phase());
        };
        assert_eq!(animation.rows(), &[19]);
        assert_eq!(audio.count(Cue::LineClear), 1);
        assert_eq!(engine.board().cell(19, 4).content, CellContent::ClearFlash);
        assert_eq!(engine.board().cell(19, 5).content, CellContent::ClearFlash);
        assert!(engine.active_piece().is_none());

        run_ticks(&mut engine, (CLEAR_ANIMATION_FRAMES - 1) as usize);
        assert_eq!(engine.phase(), &Phase::Active);
        assert_eq!(engine.board().occupied_in_row(19), 2);
        assert!(engine.board().is_occupied(19, 4));
        assert!(engine.board().is_occupied(19, 5));
        assert_eq!(engine.board().occupied_in_row(18), 0);
        assert_eq!(engine.score().lines, 1);
        assert_eq!(engine.score().lines_to_level, 9);
        assert_eq!(engine.score().score, 40 + 18 * 2);
        assert_eq!(audio.count(Cue::LineClear), 1);
    }

    #[test]
    fn test_actions_ignored_while_animating() {
        let (mut engine, _) = playing(ShapeKind::O, ShapeKind::T);
        fill_row_except(&mut engine, 19, &[4, 5]);
        engine.queue_action(Action::HardDrop);
        engine.tick();
        let before = *engine.current.blocks();
        engine.queue_action(Action::MoveLeft);
        engine.tick();
        assert_eq!(engine.current.blocks(), &before);
    }

    #[test]
    fn test_wipe_spreads_outward() {
        let mut board = Board::new();
        for col in 0..BOARD_WIDTH {
            board.place(19, col, ShapeKind::L);
        }
        let mut animation = ClearAnimation::new(vec![19]);
        for _ in 0..4 {
            animation.advance(&mut board);
        }
        // steps at frames 0 and 3
        assert_eq!(board.cell(19, 3).content, CellContent::ClearFlash);
        assert_eq!(board.cell(19, 6).content, CellContent::ClearFlash);
        assert_eq!(board.cell(19, 4).content, CellContent::Empty);
        assert_eq!(board.cell(19, 5).content, CellContent::Empty);
        assert_eq!(board.cell(19, 2).content, CellContent::Shape(ShapeKind::L));
        assert!(board.is_row_full(19));
        for _ in 4..CLEAR_ANIMATION_FRAMES {
            animation.advance(&mut board);
        }
        assert!(animation.is_done());
        assert_eq!(board.cell(19, 0).content, CellContent::ClearFlash);
        assert_eq!(board.cell(19, 9).content, CellContent::ClearFlash);
    }

    #[test]
    fn test_tetris_awards_letter() {
        let (mut engine, audio) = playing(ShapeKind::I, ShapeKind::T);
        for row in 16..20 {
            fill_row_except(&mut engine, row, &[0]);
        }
        assert!(engine.current.rotate(RotationDirection::Clockwise, &engine.board));
        for _ in 0..4 {
            engine.current.shift(Direction::Left, &engine.board);
        }
        assert!(engine.current.blocks().iter().all(|&(_, col)| col == 0));

        engine.queue_action(Action::HardDrop);
        engine.tick();
        assert_eq!(audio.count(Cue::Tetris), 1);
        assert_eq!(engine.score().tetrises, 1);
        assert_eq!(engine.letters().slots().next(), Some(('T', Some(0))));

        run_ticks(&mut engine, (CLEAR_ANIMATION_FRAMES - 1) as usize);
        assert!(engine.board().is_empty());
        assert_eq!(engine.score().lines, 4);
        assert_eq!(engine.score().score, 1200 + 16 * 2);

        engine.update(LETTER_ROTATE_INTERVAL);
        assert_eq!(engine.letters().slots().next(), Some(('T', Some(1))));
    }

    #[test]
    fn test_master_bonus_on_sixth_letter() {
        let (mut engine, audio) = playing(ShapeKind::I, ShapeKind::T);
        engine.score.tetrises = 6;
        engine.queue_action(Action::HardDrop);
        engine.tick();
        assert_eq!(audio.count(Cue::TetrisMaster), 1);
        assert_eq!(engine.score().score, 50_000 + 38);
        assert!(engine.score().master_awarded);
    }

    #[test]
    fn test_game_over_when_spawn_blocked() {
        let (mut engine, audio) = playing(ShapeKind::I, ShapeKind::T);
        engine.score.score = 7_000;
        engine.board.place(1, 3, ShapeKind::S);

        engine.advance_piece();

        assert_eq!(engine.phase(), &Phase::GameOver);
        let report = engine.game_over().cloned().unwrap();
        assert_eq!(report.place, Some(2));
        assert!(!report.final_piece_drawn);
        let names: Vec<_> = report.standing.records().iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, ["AAA", PENDING_NAME, "BBB"]);
        assert_eq!(engine.score().score, 7_000);
        assert_eq!(engine.preview_kind(), Some(ShapeKind::T));
        assert!(engine.active_piece().is_none());
        assert_eq!(audio.count(Cue::HighScore), 1);
        assert_eq!(audio.count(Cue::GameOver), 0);
        assert!(audio.events.borrow().contains(&AudioEvent::StopMusic));
    }

    #[test]
    fn test_game_over_when_no_room_below_spawn() {
        let (mut engine, audio) = playing(ShapeKind::I, ShapeKind::T);
        engine.board.place(2, 4, ShapeKind::S);
        let t_count = engine.score().kind_counts[ShapeKind::T.stats_index()];

        engine.advance_piece();

        let report = engine.game_over().cloned().unwrap();
        assert!(report.final_piece_drawn);
        assert_eq!(report.place, None);
        assert_eq!(engine.board().cell(1, 4).content, CellContent::Shape(ShapeKind::T));
        assert!(!engine.board().is_occupied(1, 4));
        assert_eq!(
            engine.score().kind_counts[ShapeKind::T.stats_index()],
            t_count + 1
        );
        assert_eq!(audio.count(Cue::GameOver), 1);
    }

    #[test]
    fn test_game_over_stops_updates() {
        let (mut engine, _) = playing(ShapeKind::I, ShapeKind::T);
        engine.board.place(1, 3, ShapeKind::S);
        engine.advance_piece();
        engine.update(Duration::from_secs(3));
        engine.queue_action(Action::HardDrop);
        engine.tick();
        assert_eq!(engine.phase(), &Phase::GameOver);
    }

    #[test]
    fn test_name_entry_saves_record() {
        let (mut engine, _) = playing(ShapeKind::I, ShapeKind::T);
        engine.score.score = 7_000;
        engine.board.place(1, 3, ShapeKind::S);
        engine.advance_piece();

        assert_eq!(engine.confirm_game_over(), Some(2));
        engine.save_name("ZED");

        assert_eq!(engine.phase(), &Phase::Idle);
        assert_eq!(engine.records().records()[1], PlayerRecord::new("ZED", 7_000));
        assert_eq!(engine.records().records()[2].name, "BBB");
        assert!(engine.board().is_empty());
    }

    #[test]
    fn test_confirm_without_place_returns_to_idle() {
        let (mut engine, _) = playing(ShapeKind::I, ShapeKind::T);
        engine.board.place(1, 3, ShapeKind::S);
        engine.advance_piece();
        assert_eq!(engine.confirm_game_over(), None);
        assert_eq!(engine.phase(), &Phase::Idle);
        assert!(engine.is_menu_active());
    }

    #[test]
    fn test_quit_resets_without_ranking() {
        let (mut engine, audio) = playing(ShapeKind::I, ShapeKind::T);
        engine.score.score = 99_999;
        engine.score.top_score = 99_999;
        engine.quit();
        assert_eq!(engine.phase(), &Phase::Idle);
        assert!(engine.game_over().is_none());
        assert_eq!(engine.score().top_score, 10_000);
        assert_eq!(engine.records(), &TopThree::default());
        assert_eq!(audio.count(Cue::HighScore), 0);
        assert!(audio.events.borrow().contains(&AudioEvent::StopMusic));
    }

    fn assert_clean_idle(engine: &GameEngine) {
        assert_eq!(engine.phase(), &Phase::Idle);
        assert!(engine.game_over().is_none());
        assert!(!engine.gravity_timer.is_running());
        assert!(!engine.frame_timer.is_running());
        assert!(!engine.is_paused());
        for row in 0..BOARD_HEIGHT {
            assert!(engine.board().row(row).iter().all(|cell| cell.is_empty()));
        }
    }

    #[test]
    fn test_quit_during_clear_animation() {
        let (mut engine, _) = playing(ShapeKind::O, ShapeKind::T);
        fill_row_except(&mut engine, 19, &[4, 5]);
        engine.queue_action(Action::HardDrop);
        run_ticks(&mut engine, 4);
        assert!(matches!(engine.phase(), Phase::AnimatingClear(_)));

        engine.pause();
        engine.quit();
        assert_clean_idle(&engine);

        engine.update(Duration::from_secs(2));
        run_ticks(&mut engine, CLEAR_ANIMATION_FRAMES as usize);
        assert_clean_idle(&engine);
    }

    #[test]
    fn test_quit_during_lock_delay() {
        let (mut engine, _) = playing(ShapeKind::O, ShapeKind::T);
        engine.current = Piece::spawn_at(ShapeKind::O, 17, 3);
        engine.current.fall(&engine.board);
        engine.tick();
        assert!(matches!(engine.phase(), Phase::Delay { .. }));

        engine.pause();
        engine.quit();
        assert_clean_idle(&engine);

        run_ticks(&mut engine, LOCK_DELAY_FRAMES as usize);
        assert_clean_idle(&engine);
    }

    #[test]
    fn test_pause_freezes_lock_delay() {
        let (mut engine, _) = playing(ShapeKind::O, ShapeKind::T);
        engine.current = Piece::spawn_at(ShapeKind::O, 17, 3);
        engine.current.fall(&engine.board);
        run_ticks(&mut engine, 6);
        assert_eq!(engine.phase(), &Phase::Delay { frames: 6 });

        engine.pause();
        run_ticks(&mut engine, 50);
        engine.update(Duration::from_secs(2));
        assert_eq!(engine.phase(), &Phase::Delay { frames: 6 });
        assert!(!engine.board().is_occupied(19, 4));

        engine.resume();
        run_ticks(&mut engine, (LOCK_DELAY_FRAMES - 7) as usize);
        assert_eq!(
            engine.phase(),
            &Phase::Delay {
                frames: LOCK_DELAY_FRAMES - 1
            }
        );
        engine.tick();
        assert_eq!(engine.phase(), &Phase::Active);
        assert!(engine.board().is_occupied(19, 4));
    }

    #[test]
    fn test_pause_freezes_clear_animation() {
        let (mut engine, _) = playing(ShapeKind::O, ShapeKind::T);
        fill_row_except(&mut engine, 19, &[4, 5]);
        engine.queue_action(Action::HardDrop);
        run_ticks(&mut engine, 4);
        let frozen = engine.phase().clone();
        let row: Vec<Cell> = engine.board().row(19).to_vec();

        engine.pause();
        run_ticks(&mut engine, CLEAR_ANIMATION_FRAMES as usize * 2);
        assert_eq!(engine.phase(), &frozen);
        assert_eq!(engine.board().row(19).to_vec(), row);

        engine.resume();
        run_ticks(&mut engine, (CLEAR_ANIMATION_FRAMES - 5) as usize);
        assert!(matches!(engine.phase(), Phase::AnimatingClear(_)));
        engine.tick();
        assert_eq!(engine.phase(), &Phase::Active);
        assert_eq!(engine.score().lines, 1);
    }

    #[test]
    fn test_level_up_cue() {
        let (mut engine, audio) = playing(ShapeKind::O, ShapeKind::T);
        engine.score.lines_to_level = 1;
        fill_row_except(&mut engine, 19, &[4, 5]);
        engine.queue_action(Action::HardDrop);
        run_ticks(&mut engine, CLEAR_ANIMATION_FRAMES as usize);
        assert_eq!(engine.score().level, 1);
        assert_eq!(audio.count(Cue::LevelUp), 1);
    }

    #[test]
    fn test_game_over_requests_full_repaint() {
        let (mut engine, _) = playing(ShapeKind::I, ShapeKind::T);
        engine.take_redraws();
        engine.board.place(1, 3, ShapeKind::S);
        engine.advance_piece();
        assert!(engine.take_redraws().contains(&Region::All));
    }

    #[test]
    fn test_redraw_regions_drain() {
        let (mut engine, _) = playing(ShapeKind::I, ShapeKind::T);
        engine.take_redraws();
        engine.queue_action(Action::HardDrop);
        engine.tick();
        let regions = engine.take_redraws();
        assert!(regions.contains(&Region::Board));
        assert!(regions.contains(&Region::Score));
        assert!(regions.contains(&Region::Next));
        assert!(engine.take_redraws().is_empty());
    }
}
