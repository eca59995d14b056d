use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::chat_loop::{ChatApp, Focus, PromptKind};
use crate::ui::markup::{doc_to_lines, parse_assistant_text};
use crate::core::message::Role;

const PROJECTS_PANE_WIDTH: u16 = 26;
const SESSIONS_PANE_WIDTH: u16 = 30;

pub fn ui(f: &mut Frame, app: &ChatApp) {
    let theme = &app.theme;
    f.render_widget(
        Block::default().style(ratatui::style::Style::default().bg(theme.background)),
        f.area(),
    );

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_status_line(f, app, rows[0]);

    // Collapsed panels drop out of the row entirely.
    let mut constraints = Vec::new();
    if !app.panels.projects_collapsed {
        constraints.push(Constraint::Length(PROJECTS_PANE_WIDTH));
    }
    if !app.panels.sessions_collapsed {
        constraints.push(Constraint::Length(SESSIONS_PANE_WIDTH));
    }
    constraints.push(Constraint::Min(0));
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(rows[1]);

    let mut next = 0;
    if !app.panels.projects_collapsed {
        draw_projects(f, app, panes[next]);
        next += 1;
    }
    if !app.panels.sessions_collapsed {
        draw_sessions(f, app, panes[next]);
        next += 1;
    }
    draw_transcript(f, app, panes[next]);

    draw_input(f, app, rows[2]);
}

fn draw_status_line(f: &mut Frame, app: &ChatApp, area: Rect) {
    let theme = &app.theme;
    let line = if let Some(error) = app.cascade.error() {
        Line::from(Span::styled(error.to_string(), theme.error_text))
    } else {
        let mut spans = vec![Span::styled(
            format!("dossier v{}", env!("CARGO_PKG_VERSION")),
            theme.title,
        )];
        if let Some(project) = app.cascade.selected_project() {
            spans.push(Span::styled(
                format!("  {} ({})", project.name, project.model),
                theme.title,
            ));
        }
        if app.cascade.is_busy() || app.send.is_sending() {
            spans.push(Span::styled("  working...", theme.busy_indicator));
        }
        Line::from(spans)
    };
    f.render_widget(Paragraph::new(line), area);
}

fn pane_block<'a>(app: &ChatApp, title: &'a str, focused: bool) -> Block<'a> {
    let theme = &app.theme;
    let border = if focused {
        theme.focused_border
    } else {
        theme.panel_border
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(title, theme.panel_title))
}

/// Clip a label to the pane's inner width by display columns.
fn clip(label: &str, width: u16) -> String {
    let budget = width.saturating_sub(2) as usize;
    if label.width() <= budget {
        return label.to_string();
    }
    let mut out = String::new();
    for ch in label.chars() {
        if out.width() + 1 >= budget {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

fn draw_projects(f: &mut Frame, app: &ChatApp, area: Rect) {
    let theme = &app.theme;
    let items: Vec<ListItem> = app
        .cascade
        .projects()
        .iter()
        .map(|p| ListItem::new(clip(&p.name, area.width)))
        .collect();
    let list = List::new(items)
        .block(pane_block(app, "Projects", matches!(app.focus, Focus::Projects)))
        .style(theme.assistant_text)
        .highlight_style(theme.selection_highlight);
    let mut state = ListState::default();
    if !app.cascade.projects().is_empty() {
        state.select(Some(app.project_cursor.min(app.cascade.projects().len() - 1)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_sessions(f: &mut Frame, app: &ChatApp, area: Rect) {
    let theme = &app.theme;
    let files = app.cascade.files();
    let files_height = (files.len() as u16 + 2).min(area.height / 2);
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(files_height)])
        .split(area);

    let items: Vec<ListItem> = app
        .cascade
        .sessions()
        .iter()
        .map(|s| ListItem::new(clip(&s.display_name(), parts[0].width)))
        .collect();
    let list = List::new(items)
        .block(pane_block(app, "Sessions", matches!(app.focus, Focus::Sessions)))
        .style(theme.assistant_text)
        .highlight_style(theme.selection_highlight);
    let mut state = ListState::default();
    if !app.cascade.sessions().is_empty() {
        state.select(Some(app.session_cursor.min(app.cascade.sessions().len() - 1)));
    }
    f.render_stateful_widget(list, parts[0], &mut state);

    let file_lines: Vec<Line> = files
        .iter()
        .map(|file| Line::from(Span::styled(clip(&file.filename, parts[1].width), theme.timestamp)))
        .collect();
    let files_panel = Paragraph::new(file_lines).block(pane_block(app, "Files", false));
    f.render_widget(files_panel, parts[1]);
}

fn draw_transcript(f: &mut Frame, app: &ChatApp, area: Rect) {
    let theme = &app.theme;
    let mut lines: Vec<Line> = Vec::new();
    for message in app.cascade.messages() {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        match message.role {
            Role::User => {
                let mut header = vec![
                    Span::styled("You ", theme.user_prefix),
                    Span::styled(
                        message.timestamp.format("%H:%M").to_string(),
                        theme.timestamp,
                    ),
                ];
                if !message.is_confirmed() {
                    header.push(Span::styled(" (sending)", theme.busy_indicator));
                }
                lines.push(Line::from(header));
                for text in message.content.lines() {
                    lines.push(Line::from(Span::styled(
                        text.to_string(),
                        theme.user_text,
                    )));
                }
            }
            Role::Assistant => {
                lines.push(Line::from(vec![
                    Span::styled("Assistant ", theme.heading),
                    Span::styled(
                        message.timestamp.format("%H:%M").to_string(),
                        theme.timestamp,
                    ),
                ]));
                lines.extend(doc_to_lines(&parse_assistant_text(&message.content), theme));
            }
        }
    }

    // Follow the tail of the conversation.
    let available = area.height.saturating_sub(2);
    let offset = (lines.len() as u16).saturating_sub(available);

    let title = match app.cascade.selected_session() {
        Some(session) => format!("Chat: {}", session.display_name()),
        None => "Chat".to_string(),
    };
    let transcript = Paragraph::new(lines)
        .block(pane_block_owned(app, title, matches!(app.focus, Focus::Compose)))
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    f.render_widget(transcript, area);
}

fn pane_block_owned(app: &ChatApp, title: String, focused: bool) -> Block<'static> {
    let theme = &app.theme;
    let border = if focused {
        theme.focused_border
    } else {
        theme.panel_border
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(title, theme.panel_title))
}

fn draw_input(f: &mut Frame, app: &ChatApp, area: Rect) {
    let title = match app.prompt {
        Some(PromptKind::Project) => "New project name (Enter to create, Esc to cancel)",
        Some(PromptKind::Session) => "New session name (Enter to create, Esc to cancel)",
        None => "Type your message (Enter to send, Alt+Enter for a new line, Ctrl+C to quit)",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.input_border)
        .title(Span::styled(title, app.theme.panel_title));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(&app.textarea, inner);
}
