//! Task result types.
//!
//! Contains types for representing the outcome of task runs.

use std::path::PathBuf;
use std::time::Duration;

/// Result of running a single task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskReport {
    /// Name of the task that ran
    pub task: String,
    /// Output files written
    pub outputs: Vec<PathBuf>,
    /// Source files matched but not compiled (partials)
    pub skipped: Vec<PathBuf>,
    /// Task duration
    pub duration: Duration,
}

impl TaskReport {
    /// Create an empty report for a task.
    pub fn new(task: impl Into<String>) -> Self {
        Self { task: task.into(), ..Self::default() }
    }

    /// Record a written output.
    pub fn add_output(&mut self, path: PathBuf) {
        self.outputs.push(path);
    }

    /// Record a skipped source.
    pub fn add_skipped(&mut self, path: PathBuf) {
        self.skipped.push(path);
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "'{}': {} file{} written",
            self.task,
            self.outputs.len(),
            if self.outputs.len() == 1 { "" } else { "s" }
        );
        if !self.skipped.is_empty() {
            line.push_str(&format!(", {} partial{} skipped", self.skipped.len(), if self.skipped.len() == 1 { "" } else { "s" }));
        }
        line
    }
}

/// Result of running a series of tasks.
#[derive(Debug, Default)]
pub struct SeriesReport {
    /// Reports of every task that completed, in run order
    pub tasks: Vec<TaskReport>,
    /// Total duration of the series
    pub total_duration: Duration,
}

impl SeriesReport {
    /// Create a new empty series report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task report.
    pub fn add_report(&mut self, report: TaskReport) {
        self.tasks.push(report);
    }

    /// All outputs produced, in run order.
    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.tasks.iter().flat_map(|r| r.outputs.iter()).collect()
    }

    /// Format a summary of the series.
    pub fn summary(&self) -> String {
        let mut lines: Vec<String> = self.tasks.iter().map(|t| format!("  - {}", t.summary())).collect();
        lines.insert(
            0,
            format!(
                "Ran {} task{} ({} files written)",
                self.tasks.len(),
                if self.tasks.len() == 1 { "" } else { "s" },
                self.all_outputs().len()
            ),
        );
        lines.join("\n")
    }
}
