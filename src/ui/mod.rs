use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, FocusPane, InputDraft, OverlayState, PrimaryAction};
use crate::config::themes::BackgroundToken;
use crate::notify::{NotificationEntry, NotificationKind};

const INPUT_HEIGHT: u16 = 7;
const TOAST_HEIGHT: u16 = 3;
const EMPTY_LIST_PLACEHOLDER: &str = "No horrible notes yet! Type something and hit Ctrl-s.";

pub fn draw_app(
    frame: &mut Frame,
    state: &AppState,
    toasts: &[NotificationEntry],
    list_state: &mut ListState,
) {
    let area = frame.size();
    frame.render_widget(
        Block::default().style(Style::default().bg(background_color(state.background()))),
        area,
    );

    let gauge_height = if state.progress().is_visible() { 3 } else { 0 };
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(gauge_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_input(frame, state, vertical[0]);
    if gauge_height > 0 {
        render_progress(frame, state, vertical[1]);
    }
    render_notes(frame, state, vertical[2], list_state);

    let help = Paragraph::new(help_line(state)).style(Style::default().fg(Color::White));
    frame.render_widget(help, vertical[3]);

    render_toasts(frame, toasts, area);
    render_overlay(frame, state);
}

fn focus_style(state: &AppState, pane: FocusPane) -> Style {
    if state.focus == pane {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn render_input(frame: &mut Frame, state: &AppState, area: Rect) {
    let title = match state.primary_action() {
        PrimaryAction::Add => "Write something terrible [Ctrl-s: ADD THIS MESS]".to_string(),
        PrimaryAction::SaveEdit(id) => format!("Editing note {id} [Ctrl-s: SAVE EDIT, Esc: cancel]"),
    };
    let mut block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(focus_style(state, FocusPane::Input));
    if let Some(image) = state.pending_image() {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" image: {} ", image.file_name()),
            Style::default().fg(Color::Magenta),
        )));
    }
    let input = Paragraph::new(state.input().buffer().to_string())
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(Clear, area);
    frame.render_widget(input, area);

    if state.focus == FocusPane::Input && state.overlay().is_none() {
        if let Some((x, y)) = input_cursor_position(state.input(), area) {
            frame.set_cursor(x, y);
        }
    }
}

fn input_cursor_position(draft: &InputDraft, area: Rect) -> Option<(u16, u16)> {
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2);
    if inner_width == 0 || inner_height == 0 {
        return None;
    }
    let buffer = draft.buffer();
    let cursor = draft.cursor().min(buffer.len());
    let mut row: u16 = 0;
    let mut col = 0usize;
    for grapheme in buffer[..cursor].graphemes(true) {
        if grapheme == "\n" {
            row += 1;
            col = 0;
            continue;
        }
        let width = UnicodeWidthStr::width(grapheme);
        if width > 0 && col + width > inner_width {
            row += 1;
            col = 0;
        }
        col += width;
    }
    let row = row.min(inner_height - 1);
    let col = col.min(inner_width - 1) as u16;
    Some((area.x + 1 + col, area.y + 1 + row))
}

fn render_progress(frame: &mut Frame, state: &AppState, area: Rect) {
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title("Saving (not really)")
                .borders(Borders::ALL),
        )
        .gauge_style(
            Style::default()
                .fg(Color::LightGreen)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .ratio(state.progress().ratio());
    frame.render_widget(Clear, area);
    frame.render_widget(gauge, area);
}

fn render_notes(frame: &mut Frame, state: &AppState, area: Rect, list_state: &mut ListState) {
    let mut items = Vec::with_capacity(state.len());
    for note in state.notes() {
        let editing_this = state.editing() == Some(note.id);
        let mut lines = Vec::new();
        for (idx, line) in note.content.lines().enumerate() {
            let mut spans = Vec::new();
            if idx == 0 && editing_this {
                spans.push(Span::styled(
                    "[EDIT] ",
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            spans.push(Span::raw(line.to_string()));
            lines.push(Line::from(spans));
        }
        if let Some(url) = &note.image {
            lines.push(Line::from(Span::styled(
                format!("[img] {url}"),
                Style::default()
                    .fg(Color::LightMagenta)
                    .add_modifier(Modifier::UNDERLINED),
            )));
        }
        lines.push(Line::from(Span::styled(
            note.timestamp_label(),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )));
        items.push(ListItem::new(Text::from(lines)));
    }
    if items.is_empty() {
        items.push(ListItem::new(EMPTY_LIST_PLACEHOLDER));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("Notes ({})", state.len()))
                .borders(Borders::ALL)
                .border_style(focus_style(state, FocusPane::List)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Yellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, list_state);
}

fn help_line(state: &AppState) -> Line<'static> {
    let hint = match state.focus {
        FocusPane::Input => {
            "Tab: notes | Ctrl-s: save | Ctrl-o: image | Ctrl-d: delete random | Ctrl-b: background | Ctrl-c: quit"
        }
        FocusPane::List => {
            "Tab: input | j/k: move | Enter: edit | Ctrl-d: delete random | Ctrl-b: background | q: quit"
        }
    };
    Line::from(hint)
}

/// Stacks toasts upward from the bottom-left corner, newest lowest.
fn render_toasts(frame: &mut Frame, toasts: &[NotificationEntry], area: Rect) {
    if toasts.is_empty() || area.height <= TOAST_HEIGHT {
        return;
    }
    let width = (area.width * 2 / 5).max(24).min(area.width);
    let max_visible = ((area.height - 1) / TOAST_HEIGHT) as usize;
    let skip = toasts.len().saturating_sub(max_visible);
    let mut bottom = area.y + area.height - 1;
    for entry in toasts.iter().skip(skip).rev() {
        let rect = Rect::new(area.x, bottom - TOAST_HEIGHT, width, TOAST_HEIGHT);
        let style = toast_style(entry.kind);
        let toast = Paragraph::new(entry.message.clone())
            .style(style)
            .block(
                Block::default()
                    .title(toast_title(entry.kind))
                    .borders(Borders::ALL)
                    .border_style(style),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(Clear, rect);
        frame.render_widget(toast, rect);
        bottom -= TOAST_HEIGHT;
    }
}

fn toast_title(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "YAY",
        NotificationKind::Error => "OOPS",
        NotificationKind::Warning => "UH OH",
        NotificationKind::Info => "FYI",
    }
}

fn toast_style(kind: NotificationKind) -> Style {
    match kind {
        NotificationKind::Success => Style::default()
            .fg(Color::Black)
            .bg(Color::LightGreen)
            .add_modifier(Modifier::BOLD),
        NotificationKind::Error => Style::default()
            .fg(Color::Yellow)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        NotificationKind::Warning => Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::ITALIC),
        NotificationKind::Info => Style::default()
            .fg(Color::White)
            .bg(Color::Magenta),
    }
}

fn background_color(token: BackgroundToken) -> Color {
    match token {
        BackgroundToken::Plain => Color::Reset,
        BackgroundToken::HotPink => Color::Rgb(255, 20, 147),
        BackgroundToken::Lime => Color::Rgb(50, 205, 50),
        BackgroundToken::Tangerine => Color::Rgb(255, 140, 0),
        BackgroundToken::Cyan => Color::Rgb(0, 255, 255),
        BackgroundToken::Grape => Color::Rgb(111, 45, 168),
        BackgroundToken::Mustard => Color::Rgb(225, 173, 1),
        BackgroundToken::Blood => Color::Rgb(138, 3, 3),
    }
}

fn render_overlay(frame: &mut Frame, state: &AppState) {
    match state.overlay() {
        Some(OverlayState::ConfirmPrimary(action)) => {
            let area = centered_rect(50, 25, frame.size());
            frame.render_widget(Clear, area);
            let question = match action {
                PrimaryAction::Add => "Are you sure you want to add this note?",
                PrimaryAction::SaveEdit(_) => "Are you sure you want to save this edit?",
            };
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    question,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter/y to confirm, Esc/n to cancel",
                    Style::default().fg(Color::Gray),
                )),
            ])
            .block(
                Block::default()
                    .title(action.label())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        Some(OverlayState::ImagePath(prompt)) => {
            let area = centered_rect(60, 25, frame.size());
            frame.render_widget(Clear, area);
            let mut path_display = prompt.path.clone();
            path_display.push('▌');
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Path to an image file",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(path_display),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter to attach, Esc to cancel",
                    Style::default().fg(Color::Gray),
                )),
            ])
            .block(
                Block::default()
                    .title("Pick Image")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Magenta)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        None => {}
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}
