//! Diagnostics and transcript logging.
//!
//! Diagnostics go through `tracing` to stderr. The transcript log is a
//! separate, user-requested plain-text record of the conversation.

use std::error::Error;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use tracing_subscriber::EnvFilter;

use crate::core::message::{Message, Role};

pub const LOG_ENV_VAR: &str = "RELAYCHAT_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Pick the filter: `RELAYCHAT_LOG`, then the configured level, then `warn`.
pub fn tracing_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_DIRECTIVE)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the stderr subscriber. Safe to call more than once.
pub fn init_tracing(configured: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_filter(configured))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub struct TranscriptLog {
    file_path: Option<String>,
    is_active: bool,
}

impl TranscriptLog {
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn Error>> {
        let mut log = TranscriptLog {
            file_path: None,
            is_active: false,
        };
        if let Some(path) = log_file {
            log.set_log_file(path)?;
        }
        Ok(log)
    }

    pub fn disabled() -> Self {
        TranscriptLog {
            file_path: None,
            is_active: false,
        }
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn Error>> {
        test_file_access(&path)?;

        self.file_path = Some(path.clone());
        self.is_active = true;

        Ok(format!("Logging enabled to: {path}"))
    }

    pub fn toggle(&mut self) -> Result<String, Box<dyn Error>> {
        match &self.file_path {
            Some(path) => {
                self.is_active = !self.is_active;
                if self.is_active {
                    Ok(format!("Logging resumed to: {path}"))
                } else {
                    Ok(format!("Logging paused (file: {path})"))
                }
            }
            None => Err("No log file specified. Use /log <filename> to enable logging first.".into()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active && self.file_path.is_some()
    }

    pub fn log_message(&self, message: &Message) -> Result<(), Box<dyn Error>> {
        let Some(path) = self.file_path.as_deref().filter(|_| self.is_active) else {
            return Ok(());
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);

        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        writeln!(
            writer,
            "[{}] {speaker}:",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        for line in message.content.lines() {
            writeln!(writer, "{line}")?;
        }
        for attachment in &message.attachments {
            writeln!(writer, "  {}", attachment.label())?;
        }
        writeln!(writer)?;

        writer.flush()?;
        Ok(())
    }

    pub fn status(&self) -> String {
        let file_name = |path: &str| {
            Path::new(path)
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned()
        };
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!("active ({})", file_name(path)),
            (Some(path), false) => format!("paused ({})", file_name(path)),
        }
    }
}

fn test_file_access(path: &str) -> Result<(), Box<dyn Error>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|err| format!("Cannot write to log file {path}: {err}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn messages_are_appended_with_speaker_headers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chat.log").to_string_lossy().into_owned();
        let log = TranscriptLog::new(Some(path.clone())).expect("log");

        log.log_message(&Message::user("line one\nline two", Vec::new()))
            .expect("write user");
        log.log_message(&Message::assistant("reply")).expect("write assistant");

        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.contains("] You:\nline one\nline two\n"));
        assert!(contents.contains("] Assistant:\nreply\n"));
        assert_eq!(log.status(), "active (chat.log)");
    }

    #[test]
    fn paused_log_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chat.log").to_string_lossy().into_owned();
        let mut log = TranscriptLog::new(Some(path.clone())).expect("log");
        assert!(log.toggle().expect("toggle").starts_with("Logging paused"));

        log.log_message(&Message::assistant("hidden")).expect("noop");
        assert_eq!(fs::read_to_string(&path).expect("read"), "");
        assert!(!log.is_active());
    }

    #[test]
    fn toggle_without_file_is_an_error() {
        let mut log = TranscriptLog::disabled();
        assert!(log.toggle().is_err());
        assert_eq!(log.status(), "disabled");
    }

    #[test]
    fn unwritable_path_is_rejected() {
        let err = TranscriptLog::new(Some("/nonexistent-dir/x/chat.log".into()))
            .err()
            .expect("should fail");
        assert!(err.to_string().contains("Cannot write to log file"));
    }
}
