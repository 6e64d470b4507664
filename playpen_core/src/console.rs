//! # Console Output
//!
//! Scripts print through an [`OutputSink`] handed to the evaluation call.
//! Nothing global is swapped out: the caller's sink is wrapped in a
//! [`Capture`] for the duration of one evaluation and released when the
//! capture is dropped.
//!
//! - [`ConsoleLog`] - the ordered line buffer shown under the editor
//! - [`HostSink`] - forwards lines to `tracing` (target `playpen::console`)
//! - [`Capture`] - scoped tee of a caller sink and the host sink

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which console method produced a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

impl ConsoleLevel {
    /// Look up the level for a `console.<method>` name
    pub fn from_method(name: &str) -> Option<Self> {
        match name {
            "log" => Some(ConsoleLevel::Log),
            "info" => Some(ConsoleLevel::Info),
            "warn" => Some(ConsoleLevel::Warn),
            "error" => Some(ConsoleLevel::Error),
            "debug" => Some(ConsoleLevel::Debug),
            _ => None,
        }
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Destination for console lines.
pub trait OutputSink {
    fn write_line(&mut self, level: ConsoleLevel, text: &str);
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write_line(&mut self, level: ConsoleLevel, text: &str) {
        (**self).write_line(level, text);
    }
}

/// One line of console output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub text: String,
}

/// Ordered console buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleLog {
    lines: Vec<ConsoleLine>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: ConsoleLevel, text: impl Into<String>) {
        self.lines.push(ConsoleLine {
            level,
            text: text.into(),
        });
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[ConsoleLine] {
        &self.lines
    }

    /// Line texts without levels
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|line| line.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl OutputSink for ConsoleLog {
    fn write_line(&mut self, level: ConsoleLevel, text: &str) {
        self.push(level, text);
    }
}

/// Host-side sink: every line becomes a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSink;

impl OutputSink for HostSink {
    fn write_line(&mut self, level: ConsoleLevel, text: &str) {
        match level {
            ConsoleLevel::Error => tracing::error!(target: "playpen::console", "{text}"),
            ConsoleLevel::Warn => tracing::warn!(target: "playpen::console", "{text}"),
            ConsoleLevel::Debug => tracing::debug!(target: "playpen::console", "{text}"),
            ConsoleLevel::Log | ConsoleLevel::Info => tracing::info!(target: "playpen::console", "{text}"),
        }
    }
}

/// Scoped redirection of console output into a caller's sink.
///
/// While the capture is alive every line goes to the borrowed sink and is
/// mirrored to the host sink. Dropping it ends the redirection; the borrow of
/// the caller's sink ends with it.
pub struct Capture<'a> {
    sink: &'a mut dyn OutputSink,
    host: HostSink,
    lines: usize,
}

impl<'a> Capture<'a> {
    pub fn acquire(sink: &'a mut dyn OutputSink) -> Self {
        tracing::trace!("console capture acquired");
        Capture {
            sink,
            host: HostSink,
            lines: 0,
        }
    }

    /// Lines written through this capture so far
    pub fn lines_written(&self) -> usize {
        self.lines
    }
}

impl OutputSink for Capture<'_> {
    fn write_line(&mut self, level: ConsoleLevel, text: &str) {
        self.lines += 1;
        self.sink.write_line(level, text);
        self.host.write_line(level, text);
    }
}

impl Drop for Capture<'_> {
    fn drop(&mut self) {
        tracing::trace!(lines = self.lines, "console capture released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_log_buffer() {
        let mut log = ConsoleLog::new();
        assert!(log.is_empty());

        log.push(ConsoleLevel::Log, "one");
        log.write_line(ConsoleLevel::Error, "two");
        assert_eq!(log.texts(), vec!["one", "two"]);
        assert_eq!(log.lines()[1].level, ConsoleLevel::Error);

        log.clear();
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn test_capture_forwards_and_releases() {
        let mut log = ConsoleLog::new();
        {
            let mut capture = Capture::acquire(&mut log);
            capture.write_line(ConsoleLevel::Log, "captured");
            capture.write_line(ConsoleLevel::Warn, "careful");
            assert_eq!(capture.lines_written(), 2);
        }
        // The borrow has ended, so the log is usable again
        log.push(ConsoleLevel::Log, "after");
        assert_eq!(log.texts(), vec!["captured", "careful", "after"]);
    }

    #[test]
    fn test_level_names() {
        assert_eq!(ConsoleLevel::from_method("warn"), Some(ConsoleLevel::Warn));
        assert_eq!(ConsoleLevel::from_method("table"), None);
        assert_eq!(ConsoleLevel::Info.to_string(), "info");
    }
}
