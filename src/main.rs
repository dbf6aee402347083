//! Classic falling-block puzzle for the terminal

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};
use tetris_classic::{
    audio::{AudioManager, AudioSink, Cue, SilentAudio},
    clock::FRAME_INTERVAL,
    game::{GameEngine, Phase, Region},
    input::{Command, InputHandler},
    menu::{Menu, MenuAction, MenuScreen},
    records::FileRecordStore,
    settings::Settings,
    ui,
};
use tracing_subscriber::EnvFilter;

/// Input delay after game over to prevent accidental menu return
const GAME_OVER_INPUT_DELAY: Duration = Duration::from_secs(2);

/// Application state
enum AppState {
    Menu(Menu),
    Playing,
    /// Game-over screen, shown since the given instant
    GameOver(Instant),
}

/// Get the temp directory for session logs, creating it if needed
fn session_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("tetris-classic");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> io::Result<()> {
    let session_id: u32 = rand::random();
    let log_dir = session_dir();
    let log_file = format!("{:08x}.log", session_id);

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "tetris_classic=debug".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    tracing::info!(
        "tetris-classic starting, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let settings = Settings::load();

    let audio: Box<dyn AudioSink> = match AudioManager::new() {
        Some(mut manager) => {
            manager.set_music_volume(settings.audio.music_level());
            manager.set_sfx_volume(settings.audio.sfx_level());
            Box::new(manager)
        }
        None => {
            tracing::warn!("No audio output or assets, running silent");
            Box::new(SilentAudio)
        }
    };
    let mut engine = GameEngine::new(audio, Box::new(FileRecordStore::new()));

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut engine, &settings);

    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    if let Err(e) = settings.save() {
        eprintln!("Warning: Could not save settings: {}", e);
    }

    if result.is_ok() {
        let best = &engine.records().records()[0];
        println!("\nThanks for playing! Best: {} {}", best.name, best.score);
    }
    tracing::info!("shutting down");

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    engine: &mut GameEngine,
    settings: &Settings,
) -> io::Result<()> {
    let mut input = InputHandler::from_settings(settings);
    let mut state = AppState::Menu(Menu::start());
    let mut last_update = Instant::now();
    let mut redraw = true;

    loop {
        let regions = engine.take_redraws();
        if regions.contains(&Region::All) {
            terminal.clear()?;
        }
        if redraw || !regions.is_empty() {
            terminal.draw(|frame| {
                let menu = match &state {
                    AppState::Menu(menu) => Some(menu),
                    _ => None,
                };
                ui::render(frame, engine, menu, settings);
            })?;
            redraw = false;
        }

        if event::poll(FRAME_INTERVAL)? {
            match event::read()? {
                Event::Key(key) => {
                    redraw = true;

                    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
                    {
                        return Ok(());
                    }

                    if key.kind == KeyEventKind::Release {
                        if let Some(Command::SoftDrop(held)) = input.key_up(key) {
                            engine.set_soft_drop(held);
                        }
                        continue;
                    }

                    match &mut state {
                        AppState::Menu(menu) => {
                            let action = if menu.screen == MenuScreen::Pause && input.is_pause(&key) {
                                Some(MenuAction::Resume)
                            } else {
                                menu.handle_key(key.code)
                            };
                            let Some(action) = action else {
                                continue;
                            };
                            if action == MenuAction::Rejected {
                                engine.play_cue(Cue::OutOfBounds);
                            } else {
                                engine.play_cue(Cue::Button);
                            }

                            match action {
                                MenuAction::Navigate | MenuAction::Rejected => {}
                                MenuAction::NewGame => {
                                    input.clear();
                                    engine.start_game();
                                    state = AppState::Playing;
                                }
                                MenuAction::Resume => {
                                    input.clear();
                                    engine.resume();
                                    state = AppState::Playing;
                                }
                                MenuAction::EndGame => {
                                    engine.quit();
                                    state = AppState::Menu(Menu::start());
                                }
                                MenuAction::Exit => return Ok(()),
                                MenuAction::SaveName(name) => {
                                    engine.save_name(&name);
                                    state = AppState::Menu(Menu::start());
                                }
                            }
                        }
                        AppState::Playing => match input.key_down(key) {
                            Some(Command::Play(action)) => engine.queue_action(action),
                            Some(Command::SoftDrop(held)) => engine.set_soft_drop(held),
                            Some(Command::Pause) => {
                                engine.set_soft_drop(false);
                                engine.pause();
                                state = AppState::Menu(Menu::pause());
                            }
                            Some(Command::Exit) => return Ok(()),
                            None => {}
                        },
                        AppState::GameOver(since) => {
                            if key.code == KeyCode::Enter && since.elapsed() >= GAME_OVER_INPUT_DELAY {
                                engine.play_cue(Cue::Button);
                                state = match engine.confirm_game_over() {
                                    Some(place) => AppState::Menu(Menu::name_entry(place)),
                                    None => AppState::Menu(Menu::start()),
                                };
                            }
                        }
                    }
                }
                Event::Resize(_, _) => redraw = true,
                _ => {}
            }
        }

        if matches!(state, AppState::Playing) {
            if let Some(Command::SoftDrop(held)) = input.update() {
                engine.set_soft_drop(held);
            }
        }

        let now = Instant::now();
        engine.update(now.duration_since(last_update));
        last_update = now;

        if matches!(state, AppState::Playing) && *engine.phase() == Phase::GameOver {
            input.clear();
            engine.set_soft_drop(false);
            state = AppState::GameOver(Instant::now());
            redraw = true;
        }
    }
}
