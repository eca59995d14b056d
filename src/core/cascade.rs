//! Dependent-resource loading driven by selection.
//!
//! The cascade keeps three collections consistent as the user's selection
//! narrows: projects, sessions of the selected project (plus its uploaded
//! files), and messages of the selected session. Selection changes take
//! effect synchronously; the network fetches they trigger are issued by the
//! chat loop and resolved through the `apply_*` methods here.
//!
//! Every load request carries the selection generation in effect when it was
//! issued. A completion whose tag no longer matches the current generation
//! belongs to a superseded selection and is discarded without touching state
//! or the error slot. This holds under either completion order of two
//! concurrent requests, because the tag is checked at completion time.

use tracing::debug;

use crate::api::{ApiError, Project, Session, UploadedFile};
use crate::core::error::{CoreError, ErrorSlot};
use crate::core::message::Message;

/// Selection generation captured when a load was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTag(u64);

/// Request to fetch the session and file lists for a newly selected project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectScopeLoad {
    pub project_id: u64,
    pub tag: LoadTag,
}

/// Request to fetch the message history for a newly selected session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLoad {
    pub project_id: u64,
    pub session_id: u64,
    pub tag: LoadTag,
}

/// Validated request to create a session in the selected project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSessionRequest {
    pub project_id: u64,
    pub name: String,
    pub tag: LoadTag,
}

pub struct CascadeController {
    projects: Vec<Project>,
    sessions: Vec<Session>,
    files: Vec<UploadedFile>,
    messages: Vec<Message>,
    selected_project: Option<Project>,
    selected_session: Option<Session>,
    generation: u64,
    pending_loads: u32,
    error: ErrorSlot,
}

impl Default for CascadeController {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadeController {
    pub fn new() -> Self {
        Self {
            projects: Vec::new(),
            sessions: Vec::new(),
            files: Vec::new(),
            messages: Vec::new(),
            selected_project: None,
            selected_session: None,
            generation: 0,
            pending_loads: 0,
            error: ErrorSlot::default(),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.selected_project.as_ref()
    }

    pub fn selected_session(&self) -> Option<&Session> {
        self.selected_session.as_ref()
    }

    /// Coarse busy flag covering all in-flight cascade loads.
    pub fn is_busy(&self) -> bool {
        self.pending_loads > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.current()
    }

    pub fn dismiss_error(&mut self) {
        self.error.dismiss();
    }

    /// Surface an error produced outside the cascade (validation failures,
    /// send failures). There is exactly one visible error at a time.
    pub fn surface_error(&mut self, error: &CoreError) {
        self.error.set(error.to_string());
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn current_tag(&self) -> LoadTag {
        LoadTag(self.generation)
    }

    pub(crate) fn messages_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }

    pub(crate) fn error_mut(&mut self) -> &mut ErrorSlot {
        &mut self.error
    }

    fn tag_is_current(&self, tag: LoadTag) -> bool {
        tag.0 == self.generation
    }

    fn load_issued(&mut self) {
        self.pending_loads += 1;
    }

    fn load_resolved(&mut self) {
        self.pending_loads = self.pending_loads.saturating_sub(1);
    }

    /// Announce that the project list is being (re)fetched.
    pub fn begin_project_refresh(&mut self) {
        self.error.dismiss();
        self.load_issued();
    }

    pub fn apply_projects(&mut self, result: Result<Vec<Project>, ApiError>) {
        self.load_resolved();
        match result {
            Ok(projects) => self.projects = projects,
            Err(e) => {
                debug!("project list load failed: {e}");
                self.projects.clear();
                self.error.set("Failed to load projects.");
            }
        }
    }

    /// Replace the project selection. Clears the dependent session, file,
    /// and message collections synchronously, before any fetch resolves.
    /// Returns `None` when the project is already selected.
    pub fn select_project(&mut self, project: Project) -> Option<ProjectScopeLoad> {
        if self.selected_project.as_ref().map(|p| p.id) == Some(project.id) {
            return None;
        }
        self.error.dismiss();
        self.generation += 1;
        self.sessions.clear();
        self.files.clear();
        self.messages.clear();
        self.selected_session = None;
        let project_id = project.id;
        self.selected_project = Some(project);
        // The scope load resolves as two fetches: sessions and files.
        self.load_issued();
        self.load_issued();
        Some(ProjectScopeLoad {
            project_id,
            tag: LoadTag(self.generation),
        })
    }

    pub fn apply_sessions(&mut self, tag: LoadTag, result: Result<Vec<Session>, ApiError>) {
        self.load_resolved();
        if !self.tag_is_current(tag) {
            debug!("discarding stale session list for generation {}", tag.0);
            return;
        }
        match result {
            Ok(sessions) => self.sessions = sessions,
            Err(e) => {
                debug!("session list load failed: {e}");
                self.sessions.clear();
                self.error.set("Failed to load sessions.");
            }
        }
    }

    pub fn apply_files(&mut self, tag: LoadTag, result: Result<Vec<UploadedFile>, ApiError>) {
        self.load_resolved();
        if !self.tag_is_current(tag) {
            debug!("discarding stale file list for generation {}", tag.0);
            return;
        }
        match result {
            Ok(files) => self.files = files,
            Err(e) => {
                debug!("file list load failed: {e}");
                self.files.clear();
                self.error.set("Failed to load uploaded files.");
            }
        }
    }

    /// Replace the session selection and request its history. Reselecting
    /// the current session reloads the history, which is idempotent.
    /// Returns `None` when the session does not belong to the selected
    /// project.
    pub fn select_session(&mut self, session: Session) -> Option<HistoryLoad> {
        let project_id = self.selected_project.as_ref().map(|p| p.id)?;
        if session.project_id != project_id {
            debug!(
                "ignoring session {} from project {} while project {} is selected",
                session.id, session.project_id, project_id
            );
            return None;
        }
        self.error.dismiss();
        self.generation += 1;
        self.messages.clear();
        let session_id = session.id;
        self.selected_session = Some(session);
        self.load_issued();
        Some(HistoryLoad {
            project_id,
            session_id,
            tag: LoadTag(self.generation),
        })
    }

    pub fn apply_history(&mut self, tag: LoadTag, result: Result<Vec<Message>, ApiError>) {
        self.load_resolved();
        if !self.tag_is_current(tag) {
            debug!("discarding stale message history for generation {}", tag.0);
            return;
        }
        match result {
            Ok(messages) => self.messages = messages,
            Err(e) => {
                debug!("message history load failed: {e}");
                self.messages.clear();
                self.error.set("Failed to load message history.");
            }
        }
    }

    /// Validate a project-creation request before it reaches the network.
    pub fn begin_create_project(&mut self, name: &str) -> Result<(), CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation("Project name is empty.".into()));
        }
        self.error.dismiss();
        self.load_issued();
        Ok(())
    }

    /// A created project is appended and becomes the selection, triggering
    /// its scope load like any other selection change.
    pub fn apply_created_project(
        &mut self,
        result: Result<Project, ApiError>,
    ) -> Option<ProjectScopeLoad> {
        self.load_resolved();
        match result {
            Ok(project) => {
                self.projects.push(project.clone());
                self.select_project(project)
            }
            Err(e) => {
                debug!("project creation failed: {e}");
                self.error.set("Failed to create project.");
                None
            }
        }
    }

    /// Validate a session-creation request. Sessions are creatable only when
    /// the selected project has at least one uploaded file; the check never
    /// reaches the network.
    pub fn begin_create_session(&mut self, name: &str) -> Result<CreateSessionRequest, CoreError> {
        let project_id = match self.selected_project.as_ref() {
            Some(project) => project.id,
            None => {
                return Err(CoreError::Validation(
                    "Select a project before creating a session.".into(),
                ))
            }
        };
        if name.trim().is_empty() {
            return Err(CoreError::Validation("Session name is empty.".into()));
        }
        if self.files.is_empty() {
            return Err(CoreError::Validation(
                "Please upload at least one file before creating a session.".into(),
            ));
        }
        self.error.dismiss();
        self.load_issued();
        Ok(CreateSessionRequest {
            project_id,
            name: name.to_string(),
            tag: self.current_tag(),
        })
    }

    /// A created session is appended and becomes the selection. Creation
    /// results for a superseded project selection are discarded.
    pub fn apply_created_session(
        &mut self,
        tag: LoadTag,
        result: Result<Session, ApiError>,
    ) -> Option<HistoryLoad> {
        self.load_resolved();
        if !self.tag_is_current(tag) {
            debug!("discarding created session for generation {}", tag.0);
            return None;
        }
        match result {
            Ok(session) => {
                self.sessions.push(session.clone());
                self.select_session(session)
            }
            Err(e) => {
                debug!("session creation failed: {e}");
                self.error.set("Failed to create session.");
                None
            }
        }
    }
}
