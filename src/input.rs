//! Keyboard to game command mapping
//!
//! Terminals rarely report key releases, so a held key is considered
//! released once no press or repeat for it has arrived within `KEY_TIMEOUT`.

use crate::game::Action;
use crate::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// What a key means during play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play(Action),
    SoftDrop(bool),
    Pause,
    /// Ctrl+C
    Exit,
}

/// Parsed key bindings
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub hard_drop: Vec<KeyCode>,
    pub rotate_cw: Vec<KeyCode>,
    pub rotate_ccw: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
}

impl KeyMap {
    fn parse_key(name: &str) -> Option<KeyCode> {
        let lower = name.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        tracing::warn!("Unknown key name {:?}", name);
                        return None;
                    }
                }
            }
        };
        Some(code)
    }

    fn parse_keys(names: &[String]) -> Vec<KeyCode> {
        names.iter().filter_map(|name| Self::parse_key(name)).collect()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let keys = &settings.keys;
        Self {
            move_left: Self::parse_keys(&keys.move_left),
            move_right: Self::parse_keys(&keys.move_right),
            soft_drop: Self::parse_keys(&keys.soft_drop),
            hard_drop: Self::parse_keys(&keys.hard_drop),
            rotate_cw: Self::parse_keys(&keys.rotate_cw),
            rotate_ccw: Self::parse_keys(&keys.rotate_ccw),
            pause: Self::parse_keys(&keys.pause),
        }
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Keys that act once per press rather than once per repeat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Held {
    SoftDrop,
    HardDrop,
    RotateCW,
    RotateCCW,
}

const HELD_KEYS: usize = 4;

impl Held {
    fn slot(self) -> usize {
        self as usize
    }
}

/// Turns key events into commands for the engine
pub struct InputHandler {
    keys: KeyMap,
    /// Last time each held key was seen
    last_seen: [Option<Instant>; HELD_KEYS],
}

impl InputHandler {
    pub fn new(keys: KeyMap) -> Self {
        Self {
            keys,
            last_seen: [None; HELD_KEYS],
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(KeyMap::from_settings(settings))
    }

    pub fn key_down(&mut self, key: KeyEvent) -> Option<Command> {
        self.key_down_at(key, Instant::now())
    }

    /// Map a press or repeat seen at `now`
    ///
    /// Sideways moves repeat with the terminal's key repeat; drops and
    /// rotations fire only on a fresh press.
    pub fn key_down_at(&mut self, key: KeyEvent, now: Instant) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Exit);
        }

        let code = normalize_key(key.code);
        let keys = &self.keys;

        if keys.move_left.contains(&code) {
            Some(Command::Play(Action::MoveLeft))
        } else if keys.move_right.contains(&code) {
            Some(Command::Play(Action::MoveRight))
        } else if keys.soft_drop.contains(&code) {
            self.press(Held::SoftDrop, now).then_some(Command::SoftDrop(true))
        } else if keys.hard_drop.contains(&code) {
            self.press(Held::HardDrop, now)
                .then_some(Command::Play(Action::HardDrop))
        } else if keys.rotate_cw.contains(&code) {
            self.press(Held::RotateCW, now)
                .then_some(Command::Play(Action::RotateCW))
        } else if keys.rotate_ccw.contains(&code) {
            self.press(Held::RotateCCW, now)
                .then_some(Command::Play(Action::RotateCCW))
        } else if keys.pause.contains(&code) {
            Some(Command::Pause)
        } else {
            None
        }
    }

    /// Explicit release, on terminals that report them
    pub fn key_up(&mut self, key: KeyEvent) -> Option<Command> {
        let code = normalize_key(key.code);
        let held = if self.keys.soft_drop.contains(&code) {
            Held::SoftDrop
        } else if self.keys.hard_drop.contains(&code) {
            Held::HardDrop
        } else if self.keys.rotate_cw.contains(&code) {
            Held::RotateCW
        } else if self.keys.rotate_ccw.contains(&code) {
            Held::RotateCCW
        } else {
            return None;
        };
        self.release(held)
    }

    pub fn update(&mut self) -> Option<Command> {
        self.update_at(Instant::now())
    }

    /// Expire held keys; reports the end of a soft drop
    pub fn update_at(&mut self, now: Instant) -> Option<Command> {
        let mut command = None;
        for held in [Held::SoftDrop, Held::HardDrop, Held::RotateCW, Held::RotateCCW] {
            let expired = self.last_seen[held.slot()]
                .is_some_and(|seen| now.duration_since(seen) > KEY_TIMEOUT);
            if expired {
                command = command.or(self.release(held));
            }
        }
        command
    }

    /// Whether `key` is bound to pause, without touching held state
    pub fn is_pause(&self, key: &KeyEvent) -> bool {
        self.keys.pause.contains(&normalize_key(key.code))
    }

    /// Forget every held key
    pub fn clear(&mut self) {
        self.last_seen = [None; HELD_KEYS];
    }

    /// Returns `true` for a fresh press
    fn press(&mut self, held: Held, now: Instant) -> bool {
        self.last_seen[held.slot()].replace(now).is_none()
    }

    fn release(&mut self, held: Held) -> Option<Command> {
        let was_held = self.last_seen[held.slot()].take().is_some();
        (was_held && held == Held::SoftDrop).then_some(Command::SoftDrop(false))
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new(KeyMap::default())
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_default_bindings() {
        let mut input = InputHandler::default();
        assert_eq!(
            input.key_down(press(KeyCode::Left)),
            Some(Command::Play(Action::MoveLeft))
        );
        assert_eq!(
            input.key_down(press(KeyCode::Char('d'))),
            Some(Command::Play(Action::MoveRight))
        );
        assert_eq!(
            input.key_down(press(KeyCode::Char(' '))),
            Some(Command::Play(Action::HardDrop))
        );
        assert_eq!(input.key_down(press(KeyCode::Esc)), Some(Command::Pause));
        assert_eq!(input.key_down(press(KeyCode::F(5))), None);
    }

    #[test]
    fn test_uppercase_matches() {
        let mut input = InputHandler::default();
        assert_eq!(
            input.key_down(press(KeyCode::Char('X'))),
            Some(Command::Play(Action::RotateCW))
        );
    }

    #[test]
    fn test_ctrl_c_exits() {
        let mut input = InputHandler::default();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(input.key_down(key), Some(Command::Exit));
    }

    #[test]
    fn test_moves_repeat() {
        let mut input = InputHandler::default();
        let now = Instant::now();
        for _ in 0..3 {
            assert_eq!(
                input.key_down_at(press(KeyCode::Right), now),
                Some(Command::Play(Action::MoveRight))
            );
        }
    }

    #[test]
    fn test_rotation_needs_fresh_press() {
        let mut input = InputHandler::default();
        let start = Instant::now();
        let rotate = press(KeyCode::Char('z'));
        assert_eq!(
            input.key_down_at(rotate, start),
            Some(Command::Play(Action::RotateCCW))
        );
        assert_eq!(input.key_down_at(rotate, start + Duration::from_millis(50)), None);

        let later = start + Duration::from_millis(50) + KEY_TIMEOUT * 2;
        assert_eq!(input.update_at(later), None);
        assert_eq!(
            input.key_down_at(rotate, later),
            Some(Command::Play(Action::RotateCCW))
        );
    }

    #[test]
    fn test_soft_drop_hold_and_timeout() {
        let mut input = InputHandler::default();
        let start = Instant::now();
        let down = press(KeyCode::Down);
        assert_eq!(input.key_down_at(down, start), Some(Command::SoftDrop(true)));
        assert_eq!(input.key_down_at(down, start + Duration::from_millis(40)), None);
        assert_eq!(input.update_at(start + Duration::from_millis(80)), None);
        assert_eq!(
            input.update_at(start + Duration::from_millis(40) + KEY_TIMEOUT * 2),
            Some(Command::SoftDrop(false))
        );
        assert_eq!(input.update_at(start + KEY_TIMEOUT * 10), None);
    }

    #[test]
    fn test_key_up_releases() {
        let mut input = InputHandler::default();
        let down = press(KeyCode::Char('s'));
        assert_eq!(input.key_down(down), Some(Command::SoftDrop(true)));
        assert_eq!(input.key_up(down), Some(Command::SoftDrop(false)));
        assert_eq!(input.key_up(down), None);
    }

    #[test]
    fn test_custom_bindings_skip_unknown_names() {
        let mut settings = Settings::default();
        settings.keys.hard_drop = vec!["Enter".to_string(), "Hyper".to_string()];
        let keys = KeyMap::from_settings(&settings);
        assert_eq!(keys.hard_drop, vec![KeyCode::Enter]);
    }
}
