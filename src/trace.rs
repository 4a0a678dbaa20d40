//! Observable trace output of stream functions.
//!
//! Stream functions report what they saw through a [`TraceSink`] rather than
//! printing directly, so the binary can route lines into `tracing` while tests
//! capture them verbatim.

use std::sync::Mutex;

/// Destination for human-readable trace lines.
pub trait TraceSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Forwards every line to `tracing` at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn emit(&self, line: &str) {
        tracing::info!(target: "istad_stream::trace", "{}", line);
    }
}

/// Keeps lines in memory, in emission order.
#[derive(Debug, Default)]
pub struct CapturedTraceSink {
    lines: Mutex<Vec<String>>,
}

impl CapturedTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line emitted so far.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drain captured lines.
    pub fn take(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(mut lines) => std::mem::take(&mut *lines),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl TraceSink for CapturedTraceSink {
    fn emit(&self, line: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line.to_string()),
            Err(poisoned) => poisoned.into_inner().push(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_lines_keep_order() {
        let sink = CapturedTraceSink::new();
        sink.emit("first");
        sink.emit("second");

        assert_eq!(sink.lines(), vec!["first", "second"]);
    }

    #[test]
    fn test_take_drains() {
        let sink = CapturedTraceSink::new();
        sink.emit("only");

        assert_eq!(sink.take(), vec!["only"]);
        assert!(sink.lines().is_empty());
    }
}
