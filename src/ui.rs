use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;

use crate::app::App;
use crate::chat::Role;

pub const TITLE: &str = "Redd Chat";
const PLACEHOLDER: &str = "Type a message...";

fn role_label(role: Role) -> (&'static str, Color) {
    match role {
        Role::User => ("You:", Color::Cyan),
        Role::Server => ("Server:", Color::Green),
        Role::Assistant => ("AI:", Color::Yellow),
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(format!(" {} ", TITLE), Style::default().fg(Color::Cyan).bold()),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

/// The conversation as the chat box draws it, without border or scroll.
///
/// Also used by [`App::content_lines`] so the scroll range is measured with
/// the same word wrap that renders it.
pub fn chat_paragraph(app: &App) -> Paragraph<'_> {
    let session = &app.session;
    let chat_text = if session.messages().is_empty() && !session.is_sending() {
        Text::from(Span::styled(
            "No messages yet. Say hello!",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in session.messages() {
            let (label, color) = role_label(msg.role);
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            for line in msg.text.lines() {
                lines.push(Line::from(line));
            }
            lines.push(Line::default());
        }

        if session.is_sending() {
            let (label, color) = role_label(Role::Server);
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    Paragraph::new(chat_text).wrap(Wrap { trim: true })
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    if app.take_scroll_request() {
        app.scroll_to_bottom();
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", app.endpoint));

    let chat = chat_paragraph(app).block(block).scroll((app.scroll, 0));
    frame.render_widget(chat, area);
}

/// Slice of `draft` that fits `width` cells with the cursor in view, and the
/// cursor's cell offset within that slice.
///
/// Measured in display cells, so wide characters take two columns.
fn visible_input(draft: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<(char, usize)> = draft.chars().map(|c| (c, c.width().unwrap_or(0))).collect();
    let cursor = cursor.min(chars.len());

    // The cell under the cursor must fit too: the next char, or one blank cell at the end
    let cursor_cell = chars.get(cursor).map(|&(_, w)| w.max(1)).unwrap_or(1);

    // Walk back from the cursor for as long as the characters still fit
    let mut start = cursor;
    let mut used = cursor_cell;
    while start > 0 && used + chars[start - 1].1 <= width {
        start -= 1;
        used += chars[start].1;
    }

    let cursor_x: usize = chars[start..cursor].iter().map(|&(_, w)| w).sum();

    let mut taken = 0;
    let visible: String = chars[start..]
        .iter()
        .take_while(|&&(_, w)| {
            taken += w;
            taken <= width
        })
        .map(|&(c, _)| c)
        .collect();

    (visible, cursor_x as u16)
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.session.is_sending() { Color::DarkGray } else { Color::Yellow };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) =
        visible_input(app.session.draft(), app.session.cursor(), inner_width);

    let input = if app.session.draft().is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), area);
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.session.is_sending() {
        (" SENDING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let footer_content = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc/Ctrl-C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
