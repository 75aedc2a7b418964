use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, MessageBody, Mode, Role};
use crate::cards;
use crate::markdown;

const BG_DARK: Color = Color::Rgb(12, 12, 16);
const SAPPHIRE: Color = Color::Rgb(101, 150, 243);
const TAN: Color = Color::Rgb(216, 180, 169);
const OLIVE: Color = Color::Rgb(131, 179, 102);
const BURGUNDY: Color = Color::Rgb(204, 92, 68);
const TEXT_PRIMARY: Color = Color::Rgb(240, 240, 245);
const TEXT_SECONDARY: Color = Color::Rgb(180, 180, 190);
const TEXT_MUTED: Color = Color::Rgb(105, 116, 133);
const BORDER_DIM: Color = Color::Rgb(45, 50, 60);
const BORDER_ACCENT: Color = Color::Rgb(70, 85, 110);

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn draw(frame: &mut Frame, app: &App) {
    let bg = Block::default().style(Style::default().bg(BG_DARK));
    frame.render_widget(bg, frame.area());

    let area = frame.area();
    let padded = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(app.config.sidebar_width),
            Constraint::Length(1), // Gap
            Constraint::Min(40),   // Chat area
        ])
        .split(padded);

    draw_sidebar(frame, app, main_chunks[0]);
    draw_chat_area(frame, app, main_chunks[2]);

    if app.showing_command_popup() {
        draw_command_popup(frame, app, main_chunks[2]);
    }
}

fn draw_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Modes
            Constraint::Length(1),
            Constraint::Length(6), // Location
            Constraint::Length(1),
            Constraint::Length(5), // Distance range
            Constraint::Min(3),    // API key / filler
            Constraint::Length(5), // Keyboard hints
        ])
        .split(area);

    draw_mode_panel(frame, app, chunks[0]);
    draw_location_panel(frame, app, chunks[2]);
    draw_range_panel(frame, app, chunks[4]);
    draw_key_panel(frame, app, chunks[5]);
    draw_keyboard_hints(frame, chunks[6]);
}

fn draw_mode_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = titled_block(" Mode ", SAPPHIRE);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = [Mode::General, Mode::Price, Mode::Nearby]
        .iter()
        .map(|mode| {
            if *mode == app.mode {
                Line::from(vec![
                    Span::styled(" ▸ ", Style::default().fg(SAPPHIRE)),
                    Span::styled(
                        mode.title(),
                        Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Line::from(Span::styled(format!("   {}", mode.title()), Style::default().fg(TEXT_MUTED)))
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_location_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = titled_block(" Location ", SAPPHIRE);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from(vec![
        Span::styled(" Country: ", Style::default().fg(TEXT_MUTED)),
        Span::styled(app.country, Style::default().fg(TEXT_PRIMARY)),
    ])];

    match &app.location {
        Some(location) => {
            lines.push(Line::from(Span::styled(
                format!(" {}", location.short_label()),
                Style::default().fg(OLIVE),
            )));
            if location.accuracy > 0.0 {
                lines.push(Line::from(Span::styled(
                    format!(" ±{:.0} m", location.accuracy),
                    Style::default().fg(TEXT_MUTED),
                )));
            }
        }
        None => {
            lines.push(Line::from(Span::styled(" No location set", Style::default().fg(TEXT_MUTED))));
            lines.push(Line::from(Span::styled(" /locate to detect", Style::default().fg(TEXT_MUTED))));
        }
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_range_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = titled_block(" Search Range ", SAPPHIRE);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(vec![
            Span::styled(" Min: ", Style::default().fg(TEXT_MUTED)),
            Span::styled(format!("{} km", app.range.min()), Style::default().fg(TEXT_PRIMARY)),
        ]),
        Line::from(vec![
            Span::styled(" Max: ", Style::default().fg(TEXT_MUTED)),
            Span::styled(format!("{} km", app.range.max()), Style::default().fg(TEXT_PRIMARY)),
        ]),
        Line::from(Span::styled(" /range <min> <max>", Style::default().fg(TEXT_MUTED))),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_key_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = titled_block(" API Key ", SAPPHIRE);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = match &app.api_key {
        Some(_) => Line::from(Span::styled(" ● key stored", Style::default().fg(OLIVE))),
        None => Line::from(Span::styled(" none (backend default)", Style::default().fg(TEXT_MUTED))),
    };
    frame.render_widget(Paragraph::new(line), inner);
}

fn draw_keyboard_hints(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(" Tab    cycle mode", Style::default().fg(TEXT_MUTED))),
        Line::from(Span::styled(" Ctrl+Y copy reply", Style::default().fg(TEXT_MUTED))),
        Line::from(Span::styled(" ↑/↓    scroll", Style::default().fg(TEXT_MUTED))),
        Line::from(Span::styled(" Esc    clear/quit", Style::default().fg(TEXT_MUTED))),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_chat_area(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Transcript
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status line
        ])
        .split(area);

    draw_transcript(frame, app, chunks[0]);
    draw_input(frame, app, chunks[1]);
    draw_status_line(frame, app, chunks[2]);
}

fn draw_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let block = titled_block(&format!(" {} ", app.mode.title()), SAPPHIRE);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width.saturating_sub(1) as usize;
    let lines = transcript_lines(app, width);

    // Anchor to the bottom; scroll_offset moves the viewport up in lines
    let total = lines.len();
    let viewport = inner.height as usize;
    let max_scroll = total.saturating_sub(viewport);
    let from_top = max_scroll.saturating_sub(app.scroll_offset.min(max_scroll));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((from_top as u16, 0));
    frame.render_widget(paragraph, inner);
}

fn transcript_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in &app.messages {
        let (label, color) = match message.role {
            Role::User => ("You", TAN),
            Role::Bot => ("Bot", SAPPHIRE),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", label),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                message.timestamp.format("%H:%M").to_string(),
                Style::default().fg(TEXT_MUTED),
            ),
        ]));

        match &message.body {
            MessageBody::Text(text) => match message.role {
                Role::Bot => lines.extend(markdown::render_text(text, width)),
                Role::User => {
                    for line in text.lines() {
                        lines.push(Line::from(Span::styled(
                            line.to_string(),
                            Style::default().fg(TEXT_SECONDARY),
                        )));
                    }
                }
            },
            MessageBody::Loading(label) => {
                let frame_idx = (app.animation_tick / 6) as usize % SPINNER_FRAMES.len();
                let text = if label.is_empty() { "Thinking..." } else { label.as_str() };
                lines.push(Line::from(vec![
                    Span::styled(SPINNER_FRAMES[frame_idx], Style::default().fg(SAPPHIRE)),
                    Span::styled(format!(" {}", text), Style::default().fg(TEXT_MUTED)),
                ]));
            }
            MessageBody::LocationPrompt => {
                lines.push(Line::from(Span::styled(
                    "⚲ Enable Location Access",
                    Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(
                    "To find nearby stores, I need your location.",
                    Style::default().fg(TEXT_SECONDARY),
                )));
                lines.push(Line::from(vec![
                    Span::styled("  /locate", Style::default().fg(OLIVE)),
                    Span::styled("            auto-detect", Style::default().fg(TEXT_MUTED)),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("  /locate <address>", Style::default().fg(OLIVE)),
                    Span::styled("  enter manually", Style::default().fg(TEXT_MUTED)),
                ]));
            }
            MessageBody::Products(products) => {
                lines.extend(cards::render_products(products, width));
            }
            MessageBody::Stores(stores) => {
                lines.extend(cards::render_stores(stores, width));
            }
        }

        lines.push(Line::from(""));
    }

    lines
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.is_loading { TEXT_MUTED } else { BORDER_ACCENT };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let input = Paragraph::new(app.input.as_str()).style(Style::default().fg(TEXT_PRIMARY));
    frame.render_widget(input, inner);

    let cursor_x = inner.x + app.input.width() as u16;
    frame.set_cursor_position(Position::new(cursor_x.min(inner.right().saturating_sub(1)), inner.y));
}

fn draw_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status_message {
        Some(status) => Line::from(Span::styled(status.clone(), Style::default().fg(BURGUNDY))),
        None => Line::from(vec![
            Span::styled("Enter", Style::default().fg(TAN)),
            Span::styled(" send   ", Style::default().fg(TEXT_MUTED)),
            Span::styled("/", Style::default().fg(TAN)),
            Span::styled(" commands", Style::default().fg(TEXT_MUTED)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_command_popup(frame: &mut Frame, app: &App, chat_area: Rect) {
    let filtered = app.get_filtered_commands();
    if filtered.is_empty() {
        return;
    }

    let height = (filtered.len() as u16 + 2).min(chat_area.height);
    let popup = Rect {
        x: chat_area.x + 1,
        y: chat_area.bottom().saturating_sub(4 + height),
        width: chat_area.width.saturating_sub(2).min(52),
        height,
    };

    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(Span::styled(" Commands ", Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_DIM))
        .style(Style::default().bg(BG_DARK));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let lines: Vec<Line> = filtered
        .iter()
        .enumerate()
        .map(|(i, (cmd, desc))| {
            let selected = app.command_selection == Some(i);
            let style = if selected {
                Style::default().fg(TEXT_PRIMARY).bg(BORDER_ACCENT)
            } else {
                Style::default().fg(TEXT_SECONDARY)
            };
            Line::from(vec![
                Span::styled(format!(" {:<10}", cmd), style.add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {}", desc), style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn titled_block(title: &str, color: Color) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_DIM))
}
