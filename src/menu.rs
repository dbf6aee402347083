//! Start, pause and name entry menus

use crate::records::NAME_LEN;
use crossterm::event::KeyCode;

/// Menu screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuScreen {
    Start,
    Pause,
    Controls,
    TopScores,
    NameEntry,
}

/// What the rest of the program should do after a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// The menu changed on its own; only a click is due
    Navigate,
    NewGame,
    Resume,
    /// Leave the running game for the start menu
    EndGame,
    /// Close the program
    Exit,
    SaveName(String),
    /// SAVE pressed before the name is complete
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    NewGame,
    Resume,
    Controls,
    TopScores,
    StartMenu,
    Quit,
    Back,
    Save,
}

impl Item {
    fn label(self) -> &'static str {
        match self {
            Item::NewGame => "NEW GAME",
            Item::Resume => "RESUME",
            Item::Controls => "CONTROLS",
            Item::TopScores => "TOP SCORES",
            Item::StartMenu => "MENU",
            Item::Quit => "QUIT",
            Item::Back => "BACK",
            Item::Save => "SAVE",
        }
    }
}

/// Menu state
#[derive(Debug, Clone)]
pub struct Menu {
    pub screen: MenuScreen,
    pub selected: usize,
    items: Vec<Item>,
    /// Screen that Controls and TopScores return to
    parent: MenuScreen,
    /// Name typed so far on the name entry screen
    pub name: String,
    /// Place being named
    pub place: Option<usize>,
}

impl Menu {
    pub fn start() -> Self {
        Self::with_items(
            MenuScreen::Start,
            vec![Item::NewGame, Item::Controls, Item::TopScores, Item::Quit],
        )
    }

    pub fn pause() -> Self {
        Self::with_items(
            MenuScreen::Pause,
            vec![Item::Resume, Item::Controls, Item::TopScores, Item::StartMenu],
        )
    }

    pub fn name_entry(place: usize) -> Self {
        let mut menu = Self::with_items(MenuScreen::NameEntry, vec![Item::Save]);
        menu.place = Some(place);
        menu
    }

    fn with_items(screen: MenuScreen, items: Vec<Item>) -> Self {
        Self {
            screen,
            selected: 0,
            items,
            parent: screen,
            name: String::new(),
            place: None,
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.items.iter().map(|item| item.label())
    }

    /// SAVE is offered only for a complete name
    pub fn can_save(&self) -> bool {
        self.name.chars().count() == NAME_LEN
    }

    pub fn move_up(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = self.selected.checked_sub(1).unwrap_or(self.items.len() - 1);
    }

    pub fn move_down(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.items.len();
    }

    /// Handle a key press; `None` when the key means nothing here
    pub fn handle_key(&mut self, code: KeyCode) -> Option<MenuAction> {
        if self.screen == MenuScreen::NameEntry {
            return self.handle_name_key(code);
        }
        match code {
            KeyCode::Up => {
                self.move_up();
                Some(MenuAction::Navigate)
            }
            KeyCode::Down => {
                self.move_down();
                Some(MenuAction::Navigate)
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.select(),
            KeyCode::Esc => match self.screen {
                MenuScreen::Controls | MenuScreen::TopScores => {
                    self.back();
                    Some(MenuAction::Navigate)
                }
                MenuScreen::Pause => Some(MenuAction::Resume),
                _ => None,
            },
            _ => None,
        }
    }

    fn select(&mut self) -> Option<MenuAction> {
        let item = *self.items.get(self.selected)?;
        let action = match item {
            Item::NewGame => MenuAction::NewGame,
            Item::Resume => MenuAction::Resume,
            Item::StartMenu => MenuAction::EndGame,
            Item::Quit => MenuAction::Exit,
            Item::Controls => {
                self.open(MenuScreen::Controls);
                MenuAction::Navigate
            }
            Item::TopScores => {
                self.open(MenuScreen::TopScores);
                MenuAction::Navigate
            }
            Item::Back => {
                self.back();
                MenuAction::Navigate
            }
            Item::Save => return self.save(),
        };
        Some(action)
    }

    fn open(&mut self, screen: MenuScreen) {
        let parent = self.screen;
        *self = Self::with_items(screen, vec![Item::Back]);
        self.parent = parent;
    }

    fn back(&mut self) {
        *self = match self.parent {
            MenuScreen::Pause => Self::pause(),
            _ => Self::start(),
        };
    }

    fn handle_name_key(&mut self, code: KeyCode) -> Option<MenuAction> {
        match code {
            KeyCode::Char(c) if c.is_ascii_alphanumeric() => {
                if self.name.chars().count() < NAME_LEN {
                    self.name.push(c.to_ascii_uppercase());
                }
                Some(MenuAction::Navigate)
            }
            KeyCode::Backspace => {
                self.name.pop();
                Some(MenuAction::Navigate)
            }
            KeyCode::Enter => self.save(),
            _ => None,
        }
    }

    fn save(&self) -> Option<MenuAction> {
        if self.can_save() {
            Some(MenuAction::SaveName(self.name.clone()))
        } else {
            Some(MenuAction::Rejected)
        }
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::start()
    }
}
