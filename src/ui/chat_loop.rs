//! Main event loop: owns the client state machines, translates key input
//! into state transitions, and drives the backend over spawned fetch tasks.
//!
//! Every fetch resolves as an [`AppEvent`] on an unbounded channel. Events
//! that carry a [`LoadTag`] are replayed into the cascade, which discards
//! the stale ones; the loop itself never cancels an in-flight request.

use std::error::Error;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::warn;
use tui_textarea::{Input as TAInput, TextArea};

use crate::api::{ApiError, Backend, Project, Session, UploadedFile};
use crate::core::cascade::{CascadeController, HistoryLoad, LoadTag, ProjectScopeLoad};
use crate::core::config::Config;
use crate::core::conversation::{ConversationController, SendState, SendTicket};
use crate::core::message::{Message, Role};
use crate::logging::LoggingState;
use crate::ui::layout::{PanelState, SelectionDepth};
use crate::ui::renderer::ui;
use crate::ui::theme::Theme;

/// Terminal width at or below which the panel collapse rules kick in.
const NARROW_TERMINAL_COLS: u16 = 100;

/// Model assigned to projects created from the TUI.
const DEFAULT_PROJECT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Projects,
    Sessions,
    Compose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Project,
    Session,
}

/// Completion of a spawned backend task.
pub enum AppEvent {
    Projects(Result<Vec<Project>, ApiError>),
    ProjectCreated(Result<Project, ApiError>),
    Sessions(LoadTag, Result<Vec<Session>, ApiError>),
    Files(LoadTag, Result<Vec<UploadedFile>, ApiError>),
    History(LoadTag, Result<Vec<Message>, ApiError>),
    SessionCreated(LoadTag, Result<Session, ApiError>),
    SendFinished(SendTicket, Result<Vec<Message>, ApiError>),
}

pub struct ChatApp {
    pub cascade: CascadeController,
    pub send: SendState,
    pub panels: PanelState,
    pub theme: Theme,
    pub focus: Focus,
    pub prompt: Option<PromptKind>,
    pub textarea: TextArea<'static>,
    pub project_cursor: usize,
    pub session_cursor: usize,
    pub logging: LoggingState,
    pub config: Config,
    last_width: u16,
    exit_requested: bool,
    /// Compose text parked while a creation prompt borrows the input box.
    draft: Vec<String>,
}

impl ChatApp {
    fn new(config: Config, logging: LoggingState, width: u16) -> Self {
        let theme = match config.theme.as_deref() {
            Some(name) => Theme::from_name(name),
            None => Theme::dark_default(),
        };
        let mut textarea = TextArea::default();
        textarea.set_cursor_line_style(ratatui::style::Style::default());
        ChatApp {
            cascade: CascadeController::new(),
            send: SendState::default(),
            panels: PanelState::default(),
            theme,
            focus: Focus::Projects,
            prompt: None,
            textarea,
            project_cursor: 0,
            session_cursor: 0,
            logging,
            config,
            last_width: width,
            exit_requested: false,
            draft: Vec::new(),
        }
    }

    fn selection_depth(&self) -> SelectionDepth {
        SelectionDepth {
            project: self.cascade.selected_project().is_some(),
            session: self.cascade.selected_session().is_some(),
        }
    }

    fn reflow(&mut self, width: u16) {
        self.last_width = width;
        let depth = self.selection_depth();
        self.panels.reflow(width, NARROW_TERMINAL_COLS, depth);
        self.ensure_visible_focus();
    }

    fn reflow_current(&mut self) {
        self.reflow(self.last_width);
    }

    /// Keep keyboard focus off panels the layout just collapsed.
    fn ensure_visible_focus(&mut self) {
        let hidden = match self.focus {
            Focus::Projects => self.panels.projects_collapsed,
            Focus::Sessions => self.panels.sessions_collapsed,
            Focus::Compose => false,
        };
        if hidden {
            self.focus = Focus::Compose;
        }
    }

    fn cycle_focus(&mut self) {
        let order = [Focus::Projects, Focus::Sessions, Focus::Compose];
        let start = order.iter().position(|f| *f == self.focus).unwrap_or(2);
        for step in 1..=order.len() {
            let candidate = order[(start + step) % order.len()];
            let hidden = match candidate {
                Focus::Projects => self.panels.projects_collapsed,
                Focus::Sessions => self.panels.sessions_collapsed,
                Focus::Compose => false,
            };
            if !hidden {
                self.focus = candidate;
                return;
            }
        }
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        if self.prompt.is_none() {
            self.draft = self.textarea.lines().to_vec();
        }
        self.prompt = Some(kind);
        self.textarea = TextArea::default();
        self.textarea
            .set_cursor_line_style(ratatui::style::Style::default());
        self.focus = Focus::Compose;
    }

    fn close_prompt(&mut self) {
        self.prompt = None;
        self.textarea = TextArea::new(std::mem::take(&mut self.draft));
        self.textarea
            .set_cursor_line_style(ratatui::style::Style::default());
    }

    fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    fn clear_input(&mut self) {
        self.textarea = TextArea::default();
        self.textarea
            .set_cursor_line_style(ratatui::style::Style::default());
    }
}

fn spawn_projects(backend: &Arc<dyn Backend>, tx: &UnboundedSender<AppEvent>) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = backend.list_projects().await;
        let _ = tx.send(AppEvent::Projects(result));
    });
}

fn spawn_create_project(
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<AppEvent>,
    name: String,
) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = backend
            .create_project(&name, DEFAULT_PROJECT_MODEL)
            .await;
        let _ = tx.send(AppEvent::ProjectCreated(result));
    });
}

/// Sessions and files for a newly selected project resolve independently.
fn spawn_scope_load(
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<AppEvent>,
    load: ProjectScopeLoad,
) {
    let sessions_backend = Arc::clone(backend);
    let sessions_tx = tx.clone();
    tokio::spawn(async move {
        let result = sessions_backend.list_sessions(load.project_id).await;
        let _ = sessions_tx.send(AppEvent::Sessions(load.tag, result));
    });

    let files_backend = Arc::clone(backend);
    let files_tx = tx.clone();
    tokio::spawn(async move {
        let result = files_backend.list_files(load.project_id).await;
        let _ = files_tx.send(AppEvent::Files(load.tag, result));
    });
}

fn spawn_create_session(
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<AppEvent>,
    project_id: u64,
    name: String,
    tag: LoadTag,
) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = backend.create_session(project_id, &name).await;
        let _ = tx.send(AppEvent::SessionCreated(tag, result));
    });
}

fn spawn_history_load(
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<AppEvent>,
    load: HistoryLoad,
) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = backend
            .list_messages(load.project_id, load.session_id)
            .await
            .map(|payloads| payloads.into_iter().map(Message::from).collect());
        let _ = tx.send(AppEvent::History(load.tag, result));
    });
}

/// Send, then re-fetch the authoritative history in the same task.
fn spawn_send(
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<AppEvent>,
    ticket: SendTicket,
    content: String,
) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = async {
            backend
                .send_message(ticket.project_id, ticket.session_id, &content)
                .await?;
            backend
                .list_messages(ticket.project_id, ticket.session_id)
                .await
        }
        .await
        .map(|payloads| payloads.into_iter().map(Message::from).collect());
        let _ = tx.send(AppEvent::SendFinished(ticket, result));
    });
}

fn handle_event(
    app: &mut ChatApp,
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<AppEvent>,
    event: AppEvent,
) {
    match event {
        AppEvent::Projects(result) => {
            app.cascade.apply_projects(result);
            app.project_cursor = app
                .project_cursor
                .min(app.cascade.projects().len().saturating_sub(1));
        }
        AppEvent::ProjectCreated(result) => {
            if let Some(load) = app.cascade.apply_created_project(result) {
                app.project_cursor = app.cascade.projects().len().saturating_sub(1);
                spawn_scope_load(backend, tx, load);
                app.reflow_current();
            }
        }
        AppEvent::Sessions(tag, result) => {
            app.cascade.apply_sessions(tag, result);
            app.session_cursor = app
                .session_cursor
                .min(app.cascade.sessions().len().saturating_sub(1));
        }
        AppEvent::Files(tag, result) => {
            app.cascade.apply_files(tag, result);
        }
        AppEvent::History(tag, result) => {
            app.cascade.apply_history(tag, result);
        }
        AppEvent::SessionCreated(tag, result) => {
            if let Some(load) = app.cascade.apply_created_session(tag, result) {
                app.session_cursor = app.cascade.sessions().len().saturating_sub(1);
                spawn_history_load(backend, tx, load);
                app.reflow_current();
            }
        }
        AppEvent::SendFinished(ticket, result) => {
            let succeeded = result.is_ok();
            ConversationController::new(&mut app.cascade, &mut app.send)
                .complete_send(ticket, result);
            if succeeded {
                if let Some(reply) = app
                    .cascade
                    .messages()
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::Assistant)
                {
                    if let Err(e) = app.logging.log_message(&format!("Assistant: {}", reply.content))
                    {
                        warn!("transcript logging failed: {e}");
                    }
                }
            }
        }
    }
}

fn submit_prompt(app: &mut ChatApp, backend: &Arc<dyn Backend>, tx: &UnboundedSender<AppEvent>) {
    let Some(kind) = app.prompt else { return };
    let name = app.input_text();
    match kind {
        PromptKind::Project => match app.cascade.begin_create_project(&name) {
            Ok(()) => {
                spawn_create_project(backend, tx, name);
                app.close_prompt();
            }
            Err(e) => app.cascade.surface_error(&e),
        },
        PromptKind::Session => match app.cascade.begin_create_session(&name) {
            Ok(request) => {
                spawn_create_session(backend, tx, request.project_id, request.name, request.tag);
                app.close_prompt();
            }
            Err(e) => app.cascade.surface_error(&e),
        },
    }
}

fn submit_message(app: &mut ChatApp, backend: &Arc<dyn Backend>, tx: &UnboundedSender<AppEvent>) {
    let content = app.input_text();
    let outcome =
        ConversationController::new(&mut app.cascade, &mut app.send).begin_send(&content, Utc::now());
    match outcome {
        Ok(ticket) => {
            if let Err(e) = app.logging.log_message(&format!("You: {content}")) {
                warn!("transcript logging failed: {e}");
            }
            spawn_send(backend, tx, ticket, content);
            app.clear_input();
        }
        Err(e) => app.cascade.surface_error(&e),
    }
}

fn select_project_at_cursor(
    app: &mut ChatApp,
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<AppEvent>,
) {
    let Some(project) = app.cascade.projects().get(app.project_cursor).cloned() else {
        return;
    };
    if let Some(load) = app.cascade.select_project(project) {
        app.session_cursor = 0;
        spawn_scope_load(backend, tx, load);
    }
    app.reflow_current();
}

fn select_session_at_cursor(
    app: &mut ChatApp,
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<AppEvent>,
) {
    let Some(session) = app.cascade.sessions().get(app.session_cursor).cloned() else {
        return;
    };
    if let Some(load) = app.cascade.select_session(session) {
        spawn_history_load(backend, tx, load);
    }
    app.focus = Focus::Compose;
    app.reflow_current();
}

fn on_key(
    app: &mut ChatApp,
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<AppEvent>,
    key: event::KeyEvent,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => app.exit_requested = true,
        KeyCode::Char('t') if ctrl => {
            app.theme = app.theme.toggled();
            app.config.theme = Some(app.theme.id.to_string());
            if let Err(e) = app.config.save() {
                warn!("failed to persist theme preference: {e}");
            }
        }
        KeyCode::Char('p') if ctrl => app.open_prompt(PromptKind::Project),
        KeyCode::Char('n') if ctrl => app.open_prompt(PromptKind::Session),
        KeyCode::F(2) => {
            app.panels.toggle_projects();
            app.ensure_visible_focus();
        }
        KeyCode::F(3) => {
            app.panels.toggle_sessions();
            app.ensure_visible_focus();
        }
        KeyCode::Esc => {
            if app.prompt.is_some() {
                app.close_prompt();
            } else {
                app.cascade.dismiss_error();
            }
        }
        KeyCode::Tab if app.prompt.is_none() => app.cycle_focus(),
        KeyCode::Enter => {
            if app.prompt.is_some() {
                submit_prompt(app, backend, tx);
            } else if key.modifiers.contains(KeyModifiers::ALT) {
                if app.focus == Focus::Compose {
                    app.textarea.insert_newline();
                }
            } else {
                match app.focus {
                    Focus::Projects => select_project_at_cursor(app, backend, tx),
                    Focus::Sessions => select_session_at_cursor(app, backend, tx),
                    Focus::Compose => submit_message(app, backend, tx),
                }
            }
        }
        KeyCode::Up if app.prompt.is_none() && app.focus == Focus::Projects => {
            app.project_cursor = app.project_cursor.saturating_sub(1);
        }
        KeyCode::Down if app.prompt.is_none() && app.focus == Focus::Projects => {
            let max = app.cascade.projects().len().saturating_sub(1);
            app.project_cursor = (app.project_cursor + 1).min(max);
        }
        KeyCode::Up if app.prompt.is_none() && app.focus == Focus::Sessions => {
            app.session_cursor = app.session_cursor.saturating_sub(1);
        }
        KeyCode::Down if app.prompt.is_none() && app.focus == Focus::Sessions => {
            let max = app.cascade.sessions().len().saturating_sub(1);
            app.session_cursor = (app.session_cursor + 1).min(max);
        }
        _ => {
            if app.focus == Focus::Compose || app.prompt.is_some() {
                app.textarea.input(TAInput::from(key));
            }
        }
    }
}

pub async fn run_chat(
    backend: Arc<dyn Backend>,
    config: Config,
    log_file: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let logging = LoggingState::new(log_file)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend_io = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_io)?;

    let size = terminal.size()?;
    let mut app = ChatApp::new(config, logging, size.width);
    app.reflow_current();

    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    app.cascade.begin_project_refresh();
    spawn_projects(&backend, &tx);

    let result = run_loop(&mut terminal, &mut app, &backend, &tx, &mut rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ChatApp,
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<AppEvent>,
    rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<(), Box<dyn Error>> {
    loop {
        if app.exit_requested {
            return Ok(());
        }
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    on_key(app, backend, tx, key);
                }
                Event::Resize(width, _) => {
                    app.reflow(width);
                }
                _ => {}
            }
        }

        while let Ok(event) = rx.try_recv() {
            handle_event(app, backend, tx, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct ScriptedBackend {
        projects: Vec<Project>,
        sessions: Vec<Session>,
        files: Vec<UploadedFile>,
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
            Ok(self.projects.clone())
        }
        async fn create_project(&self, name: &str, model: &str) -> Result<Project, ApiError> {
            Ok(Project {
                id: 99,
                name: name.to_string(),
                model: model.to_string(),
                created_at: Utc::now(),
            })
        }
        async fn list_sessions(&self, _project_id: u64) -> Result<Vec<Session>, ApiError> {
            Ok(self.sessions.clone())
        }
        async fn create_session(&self, project_id: u64, name: &str) -> Result<Session, ApiError> {
            Ok(Session {
                id: 500,
                project_id,
                name: Some(name.to_string()),
                created_at: Utc::now(),
                message_count: 0,
            })
        }
        async fn list_files(&self, _project_id: u64) -> Result<Vec<UploadedFile>, ApiError> {
            Ok(self.files.clone())
        }
        async fn list_messages(
            &self,
            _project_id: u64,
            _session_id: u64,
        ) -> Result<Vec<crate::api::MessagePayload>, ApiError> {
            Ok(Vec::new())
        }
        async fn send_message(
            &self,
            _project_id: u64,
            _session_id: u64,
            _content: &str,
        ) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn project(id: u64, name: &str) -> Project {
        Project {
            id,
            name: name.to_string(),
            model: "gpt-4o".to_string(),
            created_at: Utc::now(),
        }
    }

    fn app() -> ChatApp {
        let logging = LoggingState::new(None).unwrap();
        ChatApp::new(Config::default(), logging, 120)
    }

    #[tokio::test]
    async fn selecting_a_project_with_enter_issues_its_scope_loads() {
        let backend: Arc<dyn Backend> = Arc::new(ScriptedBackend {
            projects: vec![project(1, "alpha")],
            sessions: vec![Session {
                id: 10,
                project_id: 1,
                name: Some("kickoff".to_string()),
                created_at: Utc::now(),
                message_count: 3,
            }],
            files: vec![UploadedFile {
                id: 7,
                project_id: 1,
                filename: "notes.pdf".to_string(),
                uploaded_at: Utc::now(),
            }],
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app();
        app.cascade.apply_projects(Ok(vec![project(1, "alpha")]));
        app.focus = Focus::Projects;

        on_key(
            &mut app,
            &backend,
            &tx,
            event::KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE),
        );
        assert_eq!(app.cascade.selected_project().map(|p| p.id), Some(1));
        assert!(app.cascade.is_busy());

        // Sessions and files resolve as two independent events.
        for _ in 0..2 {
            let event = rx.recv().await.unwrap();
            handle_event(&mut app, &backend, &tx, event);
        }
        assert_eq!(app.cascade.sessions().len(), 1);
        assert_eq!(app.cascade.files().len(), 1);
        assert!(!app.cascade.is_busy());
    }

    #[test]
    fn session_prompt_without_files_surfaces_the_gate_error() {
        let backend: Arc<dyn Backend> = Arc::new(ScriptedBackend {
            projects: Vec::new(),
            sessions: Vec::new(),
            files: Vec::new(),
        });
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app();
        app.cascade.apply_projects(Ok(vec![project(1, "alpha")]));
        let load = app.cascade.select_project(project(1, "alpha")).unwrap();
        app.cascade.apply_sessions(load.tag, Ok(Vec::new()));
        app.cascade.apply_files(load.tag, Ok(Vec::new()));

        app.open_prompt(PromptKind::Session);
        app.textarea.insert_str("notes");
        submit_prompt(&mut app, &backend, &tx);

        assert_eq!(
            app.cascade.error(),
            Some("Please upload at least one file before creating a session.")
        );
        assert!(app.prompt.is_some());
    }

    #[test]
    fn prompt_cancel_restores_the_parked_draft() {
        let mut app = app();
        app.textarea.insert_str("half-typed message");
        app.open_prompt(PromptKind::Project);
        assert_eq!(app.input_text(), "");
        app.close_prompt();
        assert_eq!(app.input_text(), "half-typed message");
    }
}
