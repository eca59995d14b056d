//! Optional transcript logging to a plain-text file.

use std::fs::OpenOptions;
use std::io::Write;

pub struct LoggingState {
    file_path: Option<String>,
}

impl LoggingState {
    /// When a log file is given, verify up front that it is writable so a
    /// bad path fails at startup rather than mid-conversation.
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = &log_file {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.flush()?;
        }
        Ok(LoggingState {
            file_path: log_file,
        })
    }

    pub fn is_active(&self) -> bool {
        self.file_path.is_some()
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = &self.file_path else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        for line in content.lines() {
            writeln!(file, "{}", line)?;
        }

        // An empty line after each message, matching the screen display.
        writeln!(file)?;

        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_append_with_a_blank_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.log");
        let logging = LoggingState::new(Some(path.to_string_lossy().into_owned())).unwrap();

        logging.log_message("You: hello").unwrap();
        logging.log_message("Assistant: hi\nthere").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "You: hello\n\nAssistant: hi\nthere\n\n");
    }

    #[test]
    fn logging_without_a_file_is_a_no_op() {
        let logging = LoggingState::new(None).unwrap();
        assert!(!logging.is_active());
        logging.log_message("dropped").unwrap();
    }

    #[test]
    fn unwritable_path_fails_at_startup() {
        let result = LoggingState::new(Some("/definitely/missing/dir/t.log".to_string()));
        assert!(result.is_err());
    }
}
