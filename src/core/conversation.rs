//! Send-message protocol for the active session.
//!
//! A send appends one optimistic user entry, issues the request, and on
//! success replaces the whole transcript with the authoritative history
//! (which also carries the assistant's reply). On failure the optimistic
//! entry is removed by its local token, never by content equality. At most
//! one send is in flight per session; completions for a superseded selection
//! are discarded like any other stale response.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::ApiError;
use crate::core::cascade::CascadeController;
use crate::core::error::CoreError;
use crate::core::message::{LocalToken, Message, MessageId, Role};

/// Identity of an in-flight send: the scope it was issued for, the token of
/// its optimistic entry, and the selection generation at issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendTicket {
    pub project_id: u64,
    pub session_id: u64,
    token: LocalToken,
    generation: u64,
}

/// Per-session send serialization. `in_flight` doubles as the busy flag the
/// surrounding UI uses to disable the input.
#[derive(Debug, Default)]
pub struct SendState {
    in_flight: Option<SendTicket>,
}

impl SendState {
    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }
}

pub struct ConversationController<'a> {
    cascade: &'a mut CascadeController,
    send: &'a mut SendState,
}

impl<'a> ConversationController<'a> {
    pub fn new(cascade: &'a mut CascadeController, send: &'a mut SendState) -> Self {
        Self { cascade, send }
    }

    /// Validate and record a send. Appends the optimistic entry and returns
    /// the ticket the driver needs to issue the request. No network call has
    /// happened yet when this returns.
    pub fn begin_send(
        &mut self,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<SendTicket, CoreError> {
        if content.trim().is_empty() {
            return Err(CoreError::Validation("Message is empty.".into()));
        }
        let (project_id, session_id) = match (
            self.cascade.selected_project(),
            self.cascade.selected_session(),
        ) {
            (Some(project), Some(session)) => (project.id, session.id),
            _ => {
                return Err(CoreError::Validation(
                    "Select a session before sending a message.".into(),
                ))
            }
        };
        if self.send.in_flight.is_some() {
            return Err(CoreError::Validation(
                "A message is already being sent.".into(),
            ));
        }

        self.cascade.error_mut().dismiss();
        let token = LocalToken::next();
        self.cascade.messages_mut().push(Message {
            id: MessageId::Local(token),
            role: Role::User,
            content: content.to_string(),
            timestamp: now,
        });

        let ticket = SendTicket {
            project_id,
            session_id,
            token,
            generation: self.cascade.generation(),
        };
        self.send.in_flight = Some(ticket);
        Ok(ticket)
    }

    /// Resolve a send. On success the transcript is replaced wholesale with
    /// the re-fetched history; on failure exactly the optimistic entry is
    /// rolled back. Stale completions only clear the busy flag.
    pub fn complete_send(&mut self, ticket: SendTicket, result: Result<Vec<Message>, ApiError>) {
        if self.send.in_flight == Some(ticket) {
            self.send.in_flight = None;
        }
        if ticket.generation != self.cascade.generation() {
            // The selection moved on; the optimistic entry was cleared with
            // the rest of the transcript.
            debug!(
                "discarding send completion for generation {}",
                ticket.generation
            );
            return;
        }
        match result {
            Ok(history) => *self.cascade.messages_mut() = history,
            Err(e) => {
                debug!("send failed: {e}");
                let messages = self.cascade.messages_mut();
                if let Some(index) = messages
                    .iter()
                    .position(|m| m.id == MessageId::Local(ticket.token))
                {
                    messages.remove(index);
                }
                self.cascade
                    .error_mut()
                    .set("Failed to send message or get reply.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Project, Session};
    use crate::core::message::Role;
    use chrono::TimeZone;
    use reqwest::StatusCode;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 10, 15, 0).unwrap()
    }

    fn server_message(id: u64, role: Role, content: &str) -> Message {
        Message {
            id: MessageId::Server(id),
            role,
            content: content.to_string(),
            timestamp: now(),
        }
    }

    fn backend_error() -> ApiError {
        ApiError::Http {
            status: StatusCode::BAD_GATEWAY,
            body: "assistant unavailable".to_string(),
        }
    }

    /// Cascade with project 1 / session 10 selected and history applied.
    fn selected_cascade(history: Vec<Message>) -> CascadeController {
        let mut cascade = CascadeController::new();
        let project = Project {
            id: 1,
            name: "alpha".to_string(),
            model: "gpt-4o".to_string(),
            created_at: now(),
        };
        let session = Session {
            id: 10,
            project_id: 1,
            name: Some("chat".to_string()),
            created_at: now(),
            message_count: history.len() as u64,
        };
        let scope = cascade.select_project(project).unwrap();
        cascade.apply_sessions(scope.tag, Ok(vec![session.clone()]));
        cascade.apply_files(scope.tag, Ok(vec![]));
        let load = cascade.select_session(session).unwrap();
        cascade.apply_history(load.tag, Ok(history));
        cascade
    }

    #[test]
    fn empty_input_is_rejected_before_any_network_call() {
        let mut cascade = selected_cascade(vec![]);
        let mut send = SendState::default();
        let mut conversation = ConversationController::new(&mut cascade, &mut send);
        let err = conversation.begin_send("   \n", now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(cascade.messages().is_empty());
    }

    #[test]
    fn sending_without_a_session_is_rejected() {
        let mut cascade = CascadeController::new();
        let mut send = SendState::default();
        let mut conversation = ConversationController::new(&mut cascade, &mut send);
        let err = conversation.begin_send("hello", now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn only_one_send_may_be_outstanding() {
        let mut cascade = selected_cascade(vec![]);
        let mut send = SendState::default();
        let mut conversation = ConversationController::new(&mut cascade, &mut send);
        conversation.begin_send("first", now()).unwrap();
        let err = conversation.begin_send("second", now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        // Still exactly one optimistic entry.
        assert_eq!(cascade.messages().len(), 1);
    }

    #[test]
    fn failed_send_restores_the_exact_pre_send_transcript() {
        let history = vec![
            server_message(1, Role::User, "hello"),
            server_message(2, Role::Assistant, "hi there"),
        ];
        let mut cascade = selected_cascade(history.clone());
        let mut send = SendState::default();
        let mut conversation = ConversationController::new(&mut cascade, &mut send);

        let ticket = conversation.begin_send("hello", now()).unwrap();
        assert_eq!(cascade.messages().len(), 3);

        let mut conversation = ConversationController::new(&mut cascade, &mut send);
        conversation.complete_send(ticket, Err(backend_error()));

        assert_eq!(cascade.messages(), &history[..]);
        assert_eq!(cascade.error(), Some("Failed to send message or get reply."));
        assert!(!send.is_sending());
    }

    #[test]
    fn rollback_removes_by_token_not_by_content() {
        // Two identical user turns: the rollback must take the optimistic
        // one, not the confirmed twin.
        let history = vec![server_message(1, Role::User, "again")];
        let mut cascade = selected_cascade(history);
        let mut send = SendState::default();
        let mut conversation = ConversationController::new(&mut cascade, &mut send);

        let ticket = conversation.begin_send("again", now()).unwrap();
        let mut conversation = ConversationController::new(&mut cascade, &mut send);
        conversation.complete_send(ticket, Err(backend_error()));

        assert_eq!(cascade.messages().len(), 1);
        assert_eq!(cascade.messages()[0].id, MessageId::Server(1));
    }

    #[test]
    fn successful_send_replaces_the_transcript_wholesale() {
        let mut cascade = selected_cascade(vec![]);
        let mut send = SendState::default();
        let mut conversation = ConversationController::new(&mut cascade, &mut send);

        let ticket = conversation.begin_send("what is rust?", now()).unwrap();
        let authoritative = vec![
            server_message(1, Role::User, "what is rust?"),
            server_message(2, Role::Assistant, "A systems language."),
        ];
        let mut conversation = ConversationController::new(&mut cascade, &mut send);
        conversation.complete_send(ticket, Ok(authoritative.clone()));

        assert_eq!(cascade.messages(), &authoritative[..]);
        // No duplicate of the optimistic entry survives.
        assert!(cascade.messages().iter().all(|m| m.is_confirmed()));
        assert!(!send.is_sending());
    }

    #[test]
    fn send_resolving_after_a_selection_change_is_discarded() {
        let mut cascade = selected_cascade(vec![]);
        let mut send = SendState::default();
        let mut conversation = ConversationController::new(&mut cascade, &mut send);
        let ticket = conversation.begin_send("hello", now()).unwrap();

        let project = Project {
            id: 2,
            name: "beta".to_string(),
            model: "gpt-4o".to_string(),
            created_at: now(),
        };
        cascade.select_project(project).unwrap();

        let mut conversation = ConversationController::new(&mut cascade, &mut send);
        conversation.complete_send(
            ticket,
            Ok(vec![server_message(9, Role::Assistant, "late reply")]),
        );
        assert!(cascade.messages().is_empty());
        assert!(cascade.error().is_none());
        assert!(!send.is_sending());
    }
}
