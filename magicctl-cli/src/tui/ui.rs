//! UI rendering using ratatui

use magicctl_core::{NoticeLevel, RemoteGateway, RowState, User};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::app::{App, Mode};

const ACCENT: Color = Color::Cyan;
const SECONDARY: Color = Color::DarkGray;
const HIGHLIGHT: Color = Color::Yellow;
const SUCCESS: Color = Color::Green;
const FAILURE: Color = Color::Red;
const DIM: Color = Color::Rgb(100, 100, 100);

pub fn render<G>(frame: &mut Frame, app: &App<G>)
where
    G: RemoteGateway<Row = User, Detail = Vec<String>>,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Filter input
            Constraint::Min(5),    // Users
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_filter(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    if let Mode::ConfirmDelete(id) = &app.mode {
        render_confirm(frame, id);
    }
}

fn render_filter<G>(frame: &mut Frame, app: &App<G>, area: Rect)
where
    G: RemoteGateway<Row = User, Detail = Vec<String>>,
{
    let text = app.view.filter_text();
    let content = if text.is_empty() {
        Span::styled("type to filter users", Style::default().fg(DIM))
    } else {
        Span::raw(text.to_string())
    };

    let block = Block::default()
        .title(" Filter ")
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    frame.render_widget(Paragraph::new(Line::from(content)).block(block), area);
}

fn render_list<G>(frame: &mut Frame, app: &App<G>, area: Rect)
where
    G: RemoteGateway<Row = User, Detail = Vec<String>>,
{
    let filter = app.view.filter();
    let count = app
        .view
        .count()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "?".to_string());
    let title = format!(
        " Users {}/{} :: {} ",
        filter.page_index() + 1,
        app.view.page_count().max(1),
        count
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SECONDARY));

    let entries = app.view.entries();
    if entries.is_empty() {
        let empty = Paragraph::new(Span::styled("(no users)", Style::default().fg(DIM)))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            let state = app.view.row_state(entry.id());
            let marker = match state {
                RowState::Collapsed => "▸ ",
                RowState::Expanding | RowState::Expanded => "▾ ",
            };
            let mut lines = vec![Line::from(vec![
                Span::styled(marker, Style::default().fg(ACCENT)),
                Span::raw(entry.row.username.clone()),
            ])];

            match (state, &entry.detail) {
                (RowState::Expanding, _) => lines.push(Line::from(Span::styled(
                    "    loading roles...",
                    Style::default().fg(DIM),
                ))),
                (RowState::Expanded, Some(roles)) if roles.is_empty() => lines.push(Line::from(
                    Span::styled("    (no roles)", Style::default().fg(DIM)),
                )),
                (RowState::Expanded, Some(roles)) => {
                    for role in roles {
                        lines.push(Line::from(format!("    {}", role)));
                    }
                }
                (RowState::Expanded, None) => lines.push(Line::from(Span::styled(
                    "    roles unavailable (Enter twice to retry)",
                    Style::default().fg(FAILURE),
                ))),
                (RowState::Collapsed, _) => {}
            }
            ListItem::new(Text::from(lines))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD));

    let mut state = ListState::default().with_selected(Some(app.cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status_bar<G>(frame: &mut Frame, app: &App<G>, area: Rect)
where
    G: RemoteGateway<Row = User, Detail = Vec<String>>,
{
    let busy = if app.view.is_busy() {
        Span::styled(" ⟳ ", Style::default().bg(HIGHLIGHT).fg(Color::Black))
    } else {
        Span::styled("   ", Style::default().bg(ACCENT))
    };

    let help_text = "↑/↓:nav  Enter:roles  ←/→:page  ^D:delete  ^R:refresh  Esc:clear/quit";

    let status = match &app.status {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Info => SUCCESS,
                NoticeLevel::Error => FAILURE,
            };
            Span::styled(notice.to_string(), Style::default().fg(color))
        }
        None => Span::raw(""),
    };

    let line = Line::from(vec![
        busy,
        Span::raw(" "),
        Span::styled(help_text, Style::default().fg(DIM)),
        Span::raw("  "),
        status,
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_confirm(frame: &mut Frame, id: &str) {
    let area = frame.area();
    let width = 44.min(area.width.saturating_sub(4));
    let height = 5.min(area.height);
    let popup = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );

    let block = Block::default()
        .title(" Delete user ")
        .title_style(Style::default().fg(FAILURE).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(FAILURE));

    let text = Text::from(vec![
        Line::from(format!("Delete '{}'?", id)),
        Line::from(""),
        Line::from(Span::styled("y: delete   any other key: cancel", Style::default().fg(DIM))),
    ]);

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(text).block(block), popup);
}
