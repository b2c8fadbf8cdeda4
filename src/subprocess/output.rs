//! Output channel for process activity
//!
//! The runner and orchestrator report what they run to an [`OutputSink`] handed
//! to them at construction time. Hosts decide where the lines end up.

use std::sync::{Arc, Mutex};

/// Append-only line sink. Implementations must not fail or block for long.
pub trait OutputSink: Send + Sync {
    fn append_line(&self, line: &str);
}

/// Forwards every line to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOutput;

impl OutputSink for TracingOutput {
    fn append_line(&self, line: &str) {
        tracing::info!(target: "cli_transform::output", "{}", line);
    }
}

/// Collects lines in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryOutput {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl OutputSink for MemoryOutput {
    fn append_line(&self, line: &str) {
        // A poisoned lock still holds usable data; logging must never panic.
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push(line.to_string());
    }
}
