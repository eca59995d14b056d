use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// Token identifying an optimistic message that has not been confirmed by the
/// server yet. Tokens are unique per process, so rollback removes exactly the
/// entry it appended even when two consecutive user turns carry identical
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalToken(u64);

static NEXT_LOCAL_TOKEN: AtomicU64 = AtomicU64::new(1);

impl LocalToken {
    pub fn next() -> Self {
        LocalToken(NEXT_LOCAL_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of a transcript message: either assigned by the server or a
/// process-local token for an optimistic entry awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    Server(u64),
    Local(LocalToken),
}

impl MessageId {
    pub fn is_local(self) -> bool {
        matches!(self, MessageId::Local(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn is_confirmed(&self) -> bool {
        matches!(self.id, MessageId::Server(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_tokens_are_unique() {
        let a = LocalToken::next();
        let b = LocalToken::next();
        assert_ne!(a, b);
    }

    #[test]
    fn local_ids_mark_unconfirmed_messages() {
        let msg = Message {
            id: MessageId::Local(LocalToken::next()),
            role: Role::User,
            content: "hello".to_string(),
            timestamp: Utc::now(),
        };
        assert!(msg.id.is_local());
        assert!(!msg.is_confirmed());
    }

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("system").is_err());
        assert_eq!(Role::try_from("assistant"), Ok(Role::Assistant));
    }
}
