//! Append-only log rendering.

use std::collections::VecDeque;

use crate::config::DEFAULT_MAX_LOG_LINES;

/// One-time line shown while the view has no real output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Shown right after a job starts.
    Waiting,
    /// Shown after the user clears the log.
    Cleared,
}

impl Placeholder {
    pub fn text(self) -> &'static str {
        match self {
            Placeholder::Waiting => "Running… log updates in real time.",
            Placeholder::Cleared => "Log cleared.",
        }
    }
}

/// Surface that receives tailed log lines.
///
/// Lines are never reordered or deduplicated: correctness relies on the
/// server not re-sending lines the cursor already covers.
pub trait LogRenderer {
    /// Append lines in order. Empty input is a no-op.
    fn append_lines(&mut self, lines: &[String]);

    /// Drop every rendered line and show `placeholder`.
    fn reset(&mut self, placeholder: Placeholder);

    /// Render a synthetic error line for a failed tick.
    fn append_error(&mut self, message: &str) {
        self.append_lines(&[format!("[ERROR] {}", message)]);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Line(String),
    Placeholder(Placeholder),
}

impl LogEntry {
    pub fn text(&self) -> &str {
        match self {
            LogEntry::Line(line) => line,
            LogEntry::Placeholder(placeholder) => placeholder.text(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, LogEntry::Placeholder(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LogEntry::Line(line) if line.starts_with("[ERROR]"))
    }
}

/// Bounded in-memory log view.
///
/// Scrolling is left to the front end; [`LogView::revision`] tells it when
/// the content changed and the newest line should be brought into view.
#[derive(Debug, Clone, PartialEq)]
pub struct LogView {
    entries: VecDeque<LogEntry>,
    max_lines: usize,
    revision: u64,
    evicted: u64,
}

impl Default for LogView {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOG_LINES)
    }
}

impl LogView {
    pub fn new(max_lines: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_lines: max_lines.max(1),
            revision: 0,
            evicted: 0,
        }
    }

    /// View showing `placeholder`, as on first page load.
    pub fn with_placeholder(max_lines: usize, placeholder: Placeholder) -> Self {
        let mut view = Self::new(max_lines);
        view.reset(placeholder);
        view
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Rendered log lines, placeholders excluded.
    pub fn lines(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Line(line) => Some(line.as_str()),
                LogEntry::Placeholder(_) => None,
            })
            .collect()
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        self.entries.iter().find_map(|entry| match entry {
            LogEntry::Placeholder(placeholder) => Some(*placeholder),
            LogEntry::Line(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped by every change to the entries; empty appends leave it alone.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Lines dropped from the front because of the size bound.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

impl LogRenderer for LogView {
    fn append_lines(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }

        if let Some(index) = self.entries.iter().position(LogEntry::is_placeholder) {
            self.entries.remove(index);
        }

        self.entries
            .extend(lines.iter().cloned().map(LogEntry::Line));

        while self.entries.len() > self.max_lines {
            self.entries.pop_front();
            self.evicted += 1;
        }

        self.revision += 1;
    }

    fn reset(&mut self, placeholder: Placeholder) {
        self.entries.clear();
        self.entries.push_back(LogEntry::Placeholder(placeholder));
        self.revision += 1;
    }
}
