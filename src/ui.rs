//! Terminal UI rendering with ratatui

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Cell, CellContent, digits};
use crate::game::{GameEngine, Phase};
use crate::menu::{Menu, MenuScreen};
use crate::records::TopThree;
use crate::settings::Settings;
use crate::tetromino::ShapeKind;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const EMPTY: &str = "  ";

/// stats(16) + board(22) + info(16)
const GAME_WIDTH: u16 = 54;
/// board(20) + borders(2)
const GAME_HEIGHT: u16 = 22;

const SCORE_DIGITS: usize = 6;
const STAT_DIGITS: usize = 3;

/// Award letter glyphs by quarter turn
fn letter_glyph(letter: char, turns: u8) -> &'static str {
    let frames: [&str; 4] = match letter {
        'T' => ["T", "⊣", "⊥", "⊢"],
        'E' => ["E", "Ш", "Ǝ", "Ⅲ"],
        'R' => ["R", "ᴚ", "ꓤ", "Я"],
        'I' => ["I", "—", "I", "—"],
        'S' => ["S", "ᔕ", "S", "ᔕ"],
        _ => ["?"; 4],
    };
    frames[(turns % 4) as usize]
}

/// Glyph for each digit value
const DIGIT_GLYPHS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// A counter drawn as a row of digit cells
fn digit_spans(value: u64, width: usize, style: Style) -> Vec<Span<'static>> {
    digits(value, width)
        .iter()
        .map(|cell| Span::styled(digit_glyph(cell), style))
        .collect()
}

fn digit_glyph(cell: &Cell) -> &'static str {
    match cell.content {
        CellContent::Digit(d) => DIGIT_GLYPHS[(d % 10) as usize],
        _ => " ",
    }
}

/// Text and style for one board cell
fn cell_glyph(cell: &Cell, ghost: Option<Color>, settings: &Settings) -> (&'static str, Style) {
    let (block_char, ghost_char) = settings.visual.block_chars();
    match cell.content {
        CellContent::Shape(kind) => (block_char, Style::default().fg(kind.color())),
        CellContent::ClearFlash => (block_char, Style::default().fg(Color::White).bold()),
        CellContent::Preview if settings.visual.show_ghost => match ghost {
            Some(color) => (ghost_char, Style::default().fg(color).dim()),
            None => (EMPTY, Style::default()),
        },
        _ => (EMPTY, Style::default()),
    }
}

/// Draw the whole screen
pub fn render(frame: &mut Frame, engine: &GameEngine, menu: Option<&Menu>, settings: &Settings) {
    let area = frame.area();
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(16),
            Constraint::Length(22),
            Constraint::Length(16),
        ])
        .split(game_area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(11), Constraint::Min(4)])
        .split(columns[0]);
    render_statistics(frame, left[0], engine, settings);
    render_letters(frame, left[1], engine);

    render_board(frame, columns[1], engine, settings);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(12), Constraint::Length(6)])
        .split(columns[2]);
    render_scores(frame, right[0], engine);
    render_next(frame, right[1], engine.preview_kind(), settings);

    match menu {
        Some(menu) => render_menu(frame, area, menu, engine.records()),
        None => {
            if let (Phase::GameOver, Some(report)) = (engine.phase(), engine.game_over()) {
                let subtitle = if report.place.is_some() {
                    "New record! Press Enter"
                } else {
                    "Press Enter"
                };
                render_standing(frame, area, "GAME OVER", &report.standing, subtitle);
            }
        }
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {} ", title))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray))
}

fn render_board(frame: &mut Frame, area: Rect, engine: &GameEngine, settings: &Settings) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (block_char, _) = settings.visual.block_chars();
    let piece = engine.active_piece();
    let ghost_color = piece.map(|p| p.kind.color());

    let lines: Vec<Line> = (0..BOARD_HEIGHT)
        .map(|row| {
            let spans: Vec<Span> = (0..BOARD_WIDTH)
                .map(|col| {
                    let position = (row as i32, col as i32);
                    if let Some(p) = piece.filter(|p| p.blocks().contains(&position)) {
                        return Span::styled(block_char, Style::default().fg(p.kind.color()));
                    }
                    let (text, style) =
                        cell_glyph(engine.board().cell(row, col), ghost_color, settings);
                    Span::styled(text, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_statistics(frame: &mut Frame, area: Rect, engine: &GameEngine, settings: &Settings) {
    let block = panel("STATISTICS");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (block_char, _) = settings.visual.block_chars();
    let counts = &engine.score().kind_counts;
    let lines: Vec<Line> = ShapeKind::stats_order()
        .iter()
        .map(|&kind| {
            let mut spans = vec![
                Span::styled(block_char, Style::default().fg(kind.color())),
                Span::raw(format!(" {}  ", kind.letter())),
            ];
            spans.extend(digit_spans(
                counts[kind.stats_index()] as u64,
                STAT_DIGITS,
                Style::default().fg(Color::White),
            ));
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_letters(frame: &mut Frame, area: Rect, engine: &GameEngine) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let spans: Vec<Span> = engine
        .letters()
        .slots()
        .map(|(letter, turns)| match turns {
            Some(t) => Span::styled(
                format!("{} ", letter_glyph(letter, t)),
                Style::default().fg(Color::Yellow).bold(),
            ),
            None => Span::styled("· ", Style::default().fg(Color::DarkGray)),
        })
        .collect();

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        inner,
    );
}

fn render_scores(frame: &mut Frame, area: Rect, engine: &GameEngine) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let score = engine.score();
    let entry = |label: &'static str, value: u64, width: usize, color: Color| {
        [
            Line::from(Span::styled(label, Style::default().fg(Color::Gray))),
            Line::from(digit_spans(value, width, Style::default().fg(color).bold())),
            Line::raw(""),
        ]
    };

    let mut lines = Vec::new();
    lines.extend(entry("TOP", score.top_score, SCORE_DIGITS, Color::White));
    lines.extend(entry("SCORE", score.score, SCORE_DIGITS, Color::Yellow));
    lines.extend(entry("LINES", score.lines as u64, 3, Color::Green));
    lines.extend(entry("LEVEL", score.level as u64, 2, Color::Cyan));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_next(frame: &mut Frame, area: Rect, next: Option<ShapeKind>, settings: &Settings) {
    let block = panel("NEXT");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(kind) = next else {
        return;
    };
    let (block_char, _) = settings.visual.block_chars();
    let layout = kind.layout();

    let lines: Vec<Line> = (0..2)
        .map(|row| {
            let spans: Vec<Span> = (0..4)
                .map(|col| {
                    if layout.contains(&(row, col)) {
                        Span::styled(block_char, Style::default().fg(kind.color()))
                    } else {
                        Span::raw(EMPTY)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_menu(frame: &mut Frame, area: Rect, menu: &Menu, records: &TopThree) {
    match menu.screen {
        MenuScreen::TopScores => {
            render_standing(frame, area, "TOP SCORES", records, "Enter Back");
            return;
        }
        MenuScreen::Controls => {
            render_controls(frame, area);
            return;
        }
        MenuScreen::NameEntry => {
            render_name_entry(frame, area, menu);
            return;
        }
        MenuScreen::Start | MenuScreen::Pause => {}
    }

    let title = if menu.screen == MenuScreen::Pause {
        "PAUSED"
    } else {
        "TETRIS"
    };
    let popup = center_rect(area, 24, 12);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(format!(" {} ", title))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines = vec![Line::raw("")];
    for (i, label) in menu.labels().enumerate() {
        let selected = i == menu.selected;
        let prefix = if selected { "▶ " } else { "  " };
        let style = if selected {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::styled(format!("{}{}", prefix, label), style));
        lines.push(Line::raw(""));
    }
    lines.push(Line::styled(
        "↑↓ Select  Enter Confirm",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let popup = center_rect(area, 34, 13);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(" CONTROLS ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = [
        ("Move", "← → / A D"),
        ("Soft drop", "↓ / S"),
        ("Hard drop", "↑ / Space"),
        ("Rotate right", "X / E"),
        ("Rotate left", "Z / Q"),
        ("Pause", "P / Esc"),
    ];
    let mut lines = vec![Line::raw("")];
    for (name, keys) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<13}", name), Style::default().fg(Color::Gray)),
            Span::styled(keys, Style::default().fg(Color::Cyan)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled("Enter Back", Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Top three table in a popup
fn render_standing(frame: &mut Frame, area: Rect, title: &str, standing: &TopThree, hint: &str) {
    let popup = center_rect(area, 28, 10);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(format!(" {} ", title))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines = vec![Line::raw("")];
    for (i, record) in standing.records().iter().enumerate() {
        let mut spans = vec![
            Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::Gray)),
            Span::styled(format!("{:<4}", record.name), Style::default().fg(Color::White).bold()),
        ];
        spans.extend(digit_spans(
            record.score,
            SCORE_DIGITS,
            Style::default().fg(Color::Yellow),
        ));
        lines.push(Line::from(spans));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(hint, Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_name_entry(frame: &mut Frame, area: Rect, menu: &Menu) {
    let popup = center_rect(area, 28, 9);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(" NEW RECORD ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let place = menu.place.map(|p| format!("PLACE {}", p)).unwrap_or_default();
    let typed: String = format!("{:_<3}", menu.name);
    let save_style = if menu.can_save() {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let lines = vec![
        Line::styled(place, Style::default().fg(Color::Gray)),
        Line::raw(""),
        Line::styled(typed, Style::default().fg(Color::Green).bold()),
        Line::raw(""),
        Line::styled("▶ SAVE", save_style),
        Line::raw(""),
        Line::styled("A-Z 0-9  Backspace  Enter", Style::default().fg(Color::DarkGray)),
    ];

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}
