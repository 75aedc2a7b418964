mod action;
mod api;
mod app;
mod cards;
mod command;
mod config;
mod geo;
mod logging;
mod markdown;
mod ui;

use std::io;

use arboard::Clipboard;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use app::App;
use config::Config;
use ui::draw;

fn main() -> io::Result<()> {
    let _log_guard = logging::init();

    let config = Config::default();
    let tick_rate = std::time::Duration::from_millis(config.tick_rate_ms);
    let mut app = App::new(config).map_err(io::Error::other)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, tick_rate);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick_rate: std::time::Duration,
) -> io::Result<()> {
    loop {
        app.tick();

        terminal.draw(|frame| draw(frame, app))?;

        // Queued requests run after the draw so the spinner placeholder is
        // on screen while the blocking call is in flight.
        if app.has_pending() {
            app.process_pending();
            continue;
        }

        if app.should_quit {
            return Ok(());
        }

        // Poll for events with timeout (60 FPS for smooth spinner animation)
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => match key.code {
                    KeyCode::Esc => {
                        if app.showing_command_popup() {
                            app.reset_command_selection();
                        } else if app.input.is_empty() {
                            return Ok(());
                        } else {
                            app.input.clear();
                        }
                    }
                    KeyCode::Enter => {
                        if app.showing_command_popup() && app.command_selection.is_some() {
                            app.apply_command_selection();
                        } else {
                            app.submit();
                        }
                    }
                    KeyCode::Tab => {
                        if app.showing_command_popup() && app.command_selection.is_some() {
                            app.apply_command_selection();
                        } else {
                            app.cycle_mode();
                        }
                    }
                    KeyCode::Backspace => {
                        app.input.pop();
                        app.reset_command_selection();
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(());
                    }
                    KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        if let Ok(mut clipboard) = Clipboard::new() {
                            if let Ok(text) = clipboard.get_text() {
                                app.input.push_str(&flatten_paste(&text));
                                app.reset_command_selection();
                            }
                        }
                    }
                    KeyCode::Char('y') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        copy_last_reply(app);
                    }
                    KeyCode::Char(c) => {
                        app.input.push(c);
                        app.reset_command_selection();
                    }
                    KeyCode::Up => {
                        if app.showing_command_popup() {
                            app.command_select_up();
                        } else {
                            app.scroll_up();
                        }
                    }
                    KeyCode::Down => {
                        if app.showing_command_popup() {
                            app.command_select_down();
                        } else {
                            app.scroll_down();
                        }
                    }
                    _ => {}
                },
                Event::Paste(text) => {
                    app.input.push_str(&flatten_paste(&text));
                    app.reset_command_selection();
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => app.scroll_up(),
                    MouseEventKind::ScrollDown => app.scroll_down(),
                    _ => {}
                },
                _ => {}
            }
        }
    }
}

/// Single-line input: strip carriage returns and fold newlines to spaces.
fn flatten_paste(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

fn copy_last_reply(app: &mut App) {
    let Some(reply) = app.last_bot_reply().map(str::to_string) else {
        app.set_status("Nothing to copy");
        return;
    };
    match Clipboard::new().and_then(|mut c| c.set_text(reply)) {
        Ok(()) => app.set_status("Copied to clipboard"),
        Err(e) => app.set_status(format!("Copy failed: {}", e)),
    }
}
