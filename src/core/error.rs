use std::error::Error as StdError;
use std::fmt;

/// Errors surfaced to the user by the client core.
///
/// Stale responses (results arriving for a superseded selection) are not
/// represented here: they are discarded silently and never reach the error
/// slot.
#[derive(Debug)]
pub enum CoreError {
    /// A locally detected precondition failure. Blocks the action before any
    /// network call is made.
    Validation(String),

    /// A network or server failure reported by the backend.
    Backend(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Validation(msg) => write!(f, "{msg}"),
            CoreError::Backend(msg) => write!(f, "{msg}"),
        }
    }
}

impl StdError for CoreError {}

/// The single user-visible error message. Each new error overwrites the
/// previous one; the user dismisses it explicitly.
#[derive(Debug, Default)]
pub struct ErrorSlot {
    current: Option<String>,
}

impl ErrorSlot {
    pub fn set(&mut self, message: impl Into<String>) {
        self.current = Some(message.into());
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_errors_overwrite_the_previous_one() {
        let mut slot = ErrorSlot::default();
        slot.set("first");
        slot.set("second");
        assert_eq!(slot.current(), Some("second"));
        slot.dismiss();
        assert!(!slot.is_set());
    }
}
