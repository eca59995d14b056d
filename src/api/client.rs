use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};

use super::{
    Backend, CreateProjectBody, CreateSessionBody, LoginBody, LoginResponse, MessagePayload,
    Project, SendMessageBody, Session, UploadedFile,
};

/// Errors reported by the HTTP transport.
#[derive(Debug)]
pub enum ApiError {
    /// The server answered with a non-success status.
    Http { status: StatusCode, body: String },

    /// The request never completed, or the response body failed to decode.
    Transport(reqwest::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http { status, body } => {
                write!(f, "API request failed with status {status}: {body}")
            }
            ApiError::Transport(source) => write!(f, "{source}"),
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Http { .. } => None,
            ApiError::Transport(source) => Some(source),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(source: reqwest::Error) -> Self {
        ApiError::Transport(source)
    }
}

/// HTTP implementation of [`Backend`] against the dossier REST API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Token {token}")),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ApiError::Http { status, body })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.authorize(self.http.get(self.endpoint(path)));
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.authorize(self.http.post(self.endpoint(path)).json(body));
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// Exchange credentials for a session token. Used by the `auth` flow;
    /// the interactive client itself only ever carries the stored token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = LoginBody { username, password };
        let response: LoginResponse = self.post_json("login/", &body).await?;
        Ok(response.token)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let request = self.authorize(self.http.post(self.endpoint("logout/")));
        Self::check(request.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get_json("projects/").await
    }

    async fn create_project(&self, name: &str, model: &str) -> Result<Project, ApiError> {
        self.post_json("projects/", &CreateProjectBody { name, model })
            .await
    }

    async fn list_sessions(&self, project_id: u64) -> Result<Vec<Session>, ApiError> {
        self.get_json(&format!("projects/{project_id}/sessions/"))
            .await
    }

    async fn create_session(&self, project_id: u64, name: &str) -> Result<Session, ApiError> {
        self.post_json(
            &format!("projects/{project_id}/sessions/"),
            &CreateSessionBody { name },
        )
        .await
    }

    async fn list_files(&self, project_id: u64) -> Result<Vec<UploadedFile>, ApiError> {
        self.get_json(&format!("projects/{project_id}/files/"))
            .await
    }

    async fn list_messages(
        &self,
        project_id: u64,
        session_id: u64,
    ) -> Result<Vec<MessagePayload>, ApiError> {
        self.get_json(&format!(
            "projects/{project_id}/sessions/{session_id}/messages/"
        ))
        .await
    }

    async fn send_message(
        &self,
        project_id: u64,
        session_id: u64,
        content: &str,
    ) -> Result<(), ApiError> {
        // The reply body is ignored; the transcript is re-fetched afterwards.
        let request = self.authorize(
            self.http
                .post(self.endpoint(&format!(
                    "projects/{project_id}/sessions/{session_id}/chat/"
                )))
                .json(&SendMessageBody { message: content }),
        );
        Self::check(request.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_without_double_slashes() {
        let client = ApiClient::new("http://localhost:8000/api/", None);
        assert_eq!(
            client.endpoint("/projects/"),
            "http://localhost:8000/api/projects/"
        );
        assert_eq!(
            client.endpoint("projects/3/sessions/"),
            "http://localhost:8000/api/projects/3/sessions/"
        );
    }

    #[test]
    fn http_errors_carry_status_and_body() {
        let err = ApiError::Http {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream down".into(),
        };
        let text = err.to_string();
        assert!(text.contains("502"));
        assert!(text.contains("upstream down"));
    }
}
