//! User-visible status line and console log

use std::collections::VecDeque;

/// Console lines kept before the oldest is dropped
pub const MAX_LOG_LINES: usize = 256;

/// Tag used for state-machine debug traces
pub const TRANSITION_TAG: &str = "ModDbg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub tag: String,
    pub message: String,
}

/// Status sink shared by the tools
#[derive(Debug, Default)]
pub struct StatusLog {
    status: Option<String>,
    lines: VecDeque<LogLine>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the status bar message
    pub fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.status = Some(message);
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Append a tagged console line
    pub fn log(&mut self, tag: &str, message: impl Into<String>) {
        if self.lines.len() == MAX_LOG_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(LogLine {
            tag: tag.to_string(),
            message: message.into(),
        });
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    /// Lines carrying `tag`
    pub fn lines_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> {
        self.lines
            .iter()
            .filter(move |l| l.tag == tag)
            .map(|l| l.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded() {
        let mut log = StatusLog::new();
        for i in 0..MAX_LOG_LINES + 5 {
            log.log("test", format!("line {}", i));
        }
        assert_eq!(log.lines().count(), MAX_LOG_LINES);
        assert_eq!(log.lines().next().unwrap().message, "line 5");
    }

    #[test]
    fn test_status_replaces_previous() {
        let mut log = StatusLog::new();
        log.set_status("first");
        log.set_status("second");
        assert_eq!(log.status(), Some("second"));
    }
}
