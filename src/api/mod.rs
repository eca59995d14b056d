use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::message::Role;

pub mod client;

pub use client::{ApiClient, ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    /// Identifier of the assistant model answering in this project.
    pub model: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub id: u64,
    #[serde(rename = "project")]
    pub project_id: u64,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u64,
}

impl Session {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Session {}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub id: u64,
    #[serde(rename = "project")]
    pub project_id: u64,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A transcript turn as the server reports it. Converted into
/// [`crate::core::message::Message`] before entering client state.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CreateProjectBody<'a> {
    pub name: &'a str,
    pub model: &'a str,
}

#[derive(Serialize)]
pub struct CreateSessionBody<'a> {
    pub name: &'a str,
}

#[derive(Serialize)]
pub struct SendMessageBody<'a> {
    pub message: &'a str,
}

#[derive(Serialize)]
pub struct LoginBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Seam between the client core and the transport. The chat loop drives this
/// trait; tests substitute scripted implementations.
///
/// The send acknowledgement body is ignored; the authoritative transcript
/// is always re-fetched with `list_messages` afterwards.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;
    async fn create_project(&self, name: &str, model: &str) -> Result<Project, ApiError>;
    async fn list_sessions(&self, project_id: u64) -> Result<Vec<Session>, ApiError>;
    async fn create_session(&self, project_id: u64, name: &str) -> Result<Session, ApiError>;
    async fn list_files(&self, project_id: u64) -> Result<Vec<UploadedFile>, ApiError>;
    async fn list_messages(
        &self,
        project_id: u64,
        session_id: u64,
    ) -> Result<Vec<MessagePayload>, ApiError>;
    async fn send_message(
        &self,
        project_id: u64,
        session_id: u64,
        content: &str,
    ) -> Result<(), ApiError>;
}

impl From<MessagePayload> for crate::core::message::Message {
    fn from(payload: MessagePayload) -> Self {
        crate::core::message::Message {
            id: crate::core::message::MessageId::Server(payload.id),
            role: payload.role,
            content: payload.content,
            timestamp: payload.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_payload_maps_the_project_field_and_defaults_the_count() {
        let session: Session = serde_json::from_value(serde_json::json!({
            "id": 7,
            "project": 3,
            "name": null,
            "created_at": "2024-05-02T09:30:00Z"
        }))
        .unwrap();
        assert_eq!(session.project_id, 3);
        assert_eq!(session.message_count, 0);
        assert_eq!(session.display_name(), "Session 7");
    }

    #[test]
    fn message_payload_rejects_unknown_roles() {
        let result: Result<MessagePayload, _> = serde_json::from_value(serde_json::json!({
            "id": 1,
            "role": "system",
            "content": "configured elsewhere",
            "timestamp": "2024-05-02T10:00:00Z"
        }));
        assert!(result.is_err());
    }
}
