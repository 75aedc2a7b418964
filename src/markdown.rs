//! Markdown rendering for bot replies.
//!
//! Converts the backend's markdown text into styled ratatui lines.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const CODE_BG: Color = Color::Rgb(40, 44, 52);
const CODE_FG: Color = Color::Rgb(171, 178, 191);
const HEADING_COLOR: Color = Color::Rgb(97, 175, 239);
const BOLD_COLOR: Color = Color::Rgb(224, 208, 183);
const ITALIC_COLOR: Color = Color::Rgb(152, 195, 121);
const LINK_COLOR: Color = Color::Rgb(86, 182, 194);
const BULLET_COLOR: Color = Color::Rgb(198, 120, 221);
const QUOTE_COLOR: Color = Color::Rgb(128, 128, 128);
const RULE_COLOR: Color = Color::Rgb(80, 80, 80);

/// Inline span within a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Italic(String),
    Code(String),
    Link { text: String, url: String },
}

/// Block-level markdown element
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading { level: u8, text: String },
    CodeBlock { language: Option<String>, code: String },
    ListItem { indent: usize, spans: Vec<Inline> },
    Quote(Vec<Inline>),
    Rule,
    Blank,
}

pub fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut code: Option<(Option<String>, String)> = None;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            match code.take() {
                Some((language, body)) => {
                    blocks.push(Block::CodeBlock { language, code: body.trim_end().to_string() });
                }
                None => {
                    let lang = line.trim_start().trim_start_matches('`').trim();
                    code = Some((
                        if lang.is_empty() { None } else { Some(lang.to_string()) },
                        String::new(),
                    ));
                }
            }
            continue;
        }

        if let Some((_, body)) = code.as_mut() {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(line);
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            blocks.push(Block::Blank);
        } else if trimmed == "---" || trimmed == "***" || trimmed == "___" {
            blocks.push(Block::Rule);
        } else if let Some(heading) = parse_heading(line) {
            blocks.push(heading);
        } else if let Some(rest) = line.trim_start().strip_prefix('>') {
            blocks.push(Block::Quote(parse_inline(rest.trim())));
        } else if let Some(item) = parse_list_item(line) {
            blocks.push(item);
        } else {
            blocks.push(Block::Paragraph(parse_inline(line)));
        }
    }

    // Unterminated fence still renders as code
    if let Some((language, body)) = code {
        if !body.is_empty() {
            blocks.push(Block::CodeBlock { language, code: body });
        }
    }

    blocks
}

fn parse_heading(line: &str) -> Option<Block> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&level) && trimmed.chars().nth(level).is_some_and(|c| c == ' ') {
        Some(Block::Heading {
            level: level as u8,
            text: trimmed[level..].trim().to_string(),
        })
    } else {
        None
    }
}

fn parse_list_item(line: &str) -> Option<Block> {
    let indent = line.len() - line.trim_start().len();
    let trimmed = line.trim_start();

    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return Some(Block::ListItem { indent, spans: parse_inline(rest) });
        }
    }

    // Ordered list: "1. text"
    if let Some(pos) = trimmed.find(". ") {
        if pos > 0 && trimmed[..pos].chars().all(|c| c.is_ascii_digit()) {
            return Some(Block::ListItem { indent, spans: parse_inline(&trimmed[pos + 2..]) });
        }
    }

    None
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric()
}

/// Parse inline markdown: `code`, **bold**, *italic*, _italic_, [text](url).
/// Underscores inside words (snake_case) are kept literal.
fn parse_inline(line: &str) -> Vec<Inline> {
    let chars: Vec<char> = line.chars().collect();
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    let mut flush = |text: &mut String, spans: &mut Vec<Inline>| {
        if !text.is_empty() {
            spans.push(Inline::Text(std::mem::take(text)));
        }
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            '`' => {
                if let Some(end) = find_char(&chars, i + 1, '`') {
                    flush(&mut text, &mut spans);
                    spans.push(Inline::Code(chars[i + 1..end].iter().collect()));
                    i = end + 1;
                } else {
                    text.push(c);
                    i += 1;
                }
            }
            '*' | '_' => {
                // Literal underscore inside a word
                if c == '_' && text.chars().last().is_some_and(is_word) {
                    text.push(c);
                    i += 1;
                    continue;
                }

                let double = chars.get(i + 1) == Some(&c);
                let marker_len = if double { 2 } else { 1 };
                match find_marker(&chars, i + marker_len, c, marker_len) {
                    Some(end) => {
                        flush(&mut text, &mut spans);
                        let content: String = chars[i + marker_len..end].iter().collect();
                        if double {
                            spans.push(Inline::Bold(content));
                        } else {
                            spans.push(Inline::Italic(content));
                        }
                        i = end + marker_len;
                    }
                    None => {
                        text.push(c);
                        i += 1;
                    }
                }
            }
            '[' => match parse_link(&chars, i) {
                Some((link, next)) => {
                    flush(&mut text, &mut spans);
                    spans.push(link);
                    i = next;
                }
                None => {
                    text.push(c);
                    i += 1;
                }
            },
            _ => {
                text.push(c);
                i += 1;
            }
        }
    }

    flush(&mut text, &mut spans);
    spans
}

fn find_char(chars: &[char], from: usize, target: char) -> Option<usize> {
    chars[from..].iter().position(|&c| c == target).map(|p| from + p)
}

/// Find the closing emphasis marker. For underscores the close must sit at a
/// word boundary, otherwise it is part of an identifier.
fn find_marker(chars: &[char], from: usize, marker: char, len: usize) -> Option<usize> {
    let mut i = from;
    while i + len <= chars.len() {
        if chars[i..i + len].iter().all(|&c| c == marker) {
            let inside_word = marker == '_'
                && i > 0
                && is_word(chars[i - 1])
                && chars.get(i + len).copied().is_some_and(is_word);
            if !inside_word && i > from {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

fn parse_link(chars: &[char], from: usize) -> Option<(Inline, usize)> {
    let close = find_char(chars, from + 1, ']')?;
    if chars.get(close + 1) != Some(&'(') {
        return None;
    }
    let end = find_char(chars, close + 2, ')')?;
    Some((
        Inline::Link {
            text: chars[from + 1..close].iter().collect(),
            url: chars[close + 2..end].iter().collect(),
        },
        end + 1,
    ))
}

fn inline_span(inline: &Inline) -> Span<'static> {
    match inline {
        Inline::Text(t) => Span::raw(t.clone()),
        Inline::Bold(t) => Span::styled(
            t.clone(),
            Style::default().fg(BOLD_COLOR).add_modifier(Modifier::BOLD),
        ),
        Inline::Italic(t) => Span::styled(
            t.clone(),
            Style::default().fg(ITALIC_COLOR).add_modifier(Modifier::ITALIC),
        ),
        Inline::Code(t) => Span::styled(
            format!(" {} ", t),
            Style::default().fg(CODE_FG).bg(CODE_BG),
        ),
        Inline::Link { text, url } => Span::styled(
            format!("{} ({})", text, url),
            Style::default().fg(LINK_COLOR).add_modifier(Modifier::UNDERLINED),
        ),
    }
}

/// Render parsed blocks to styled lines for the transcript.
pub fn render(blocks: &[Block], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for block in blocks {
        match block {
            Block::Paragraph(spans) => {
                lines.push(Line::from(spans.iter().map(inline_span).collect::<Vec<_>>()));
            }
            Block::Heading { level, text } => {
                let style = match level {
                    1 => Style::default()
                        .fg(HEADING_COLOR)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    2 => Style::default().fg(HEADING_COLOR).add_modifier(Modifier::BOLD),
                    _ => Style::default()
                        .fg(HEADING_COLOR)
                        .add_modifier(Modifier::BOLD | Modifier::DIM),
                };
                lines.push(Line::from(Span::styled(text.clone(), style)));
            }
            Block::CodeBlock { language, code } => {
                lines.push(Line::from(Span::styled(
                    format!("── {} ──", language.as_deref().unwrap_or("code")),
                    Style::default().fg(CODE_FG),
                )));
                for code_line in code.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", code_line),
                        Style::default().fg(CODE_FG).bg(CODE_BG),
                    )));
                }
            }
            Block::ListItem { indent, spans } => {
                let mut parts = vec![
                    Span::raw(" ".repeat(*indent)),
                    Span::styled("• ", Style::default().fg(BULLET_COLOR)),
                ];
                parts.extend(spans.iter().map(inline_span));
                lines.push(Line::from(parts));
            }
            Block::Quote(spans) => {
                let mut parts = vec![Span::styled("│ ", Style::default().fg(QUOTE_COLOR))];
                parts.extend(spans.iter().map(|s| {
                    let mut span = inline_span(s);
                    span.style = span.style.fg(QUOTE_COLOR).add_modifier(Modifier::ITALIC);
                    span
                }));
                lines.push(Line::from(parts));
            }
            Block::Rule => {
                lines.push(Line::from(Span::styled(
                    "─".repeat(width),
                    Style::default().fg(RULE_COLOR),
                )));
            }
            Block::Blank => lines.push(Line::from("")),
        }
    }

    lines
}

/// Parse and render in one step.
pub fn render_text(text: &str, width: usize) -> Vec<Line<'static>> {
    render(&parse(text), width)
}
