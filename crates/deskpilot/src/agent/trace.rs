//! Thought / action / observation history of one objective

use std::fmt;

/// Kind of a trace entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Thought,
    Action,
    Observation,
}

impl EntryKind {
    /// Upper-case label used when the trace is replayed to the model
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Thought => "THOUGHT",
            EntryKind::Action => "ACTION",
            EntryKind::Observation => "OBSERVATION",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One immutable entry in the trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    kind: EntryKind,
    content: String,
}

#[cfg(test)]
impl TraceEntry {
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Append-only log; insertion order is the history replayed to the model
#[derive(Debug, Clone, Default)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: EntryKind, content: impl Into<String>) {
        self.entries.push(TraceEntry {
            kind,
            content: content.into(),
        });
    }

    /// Drop every entry; called at the start of each objective
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `KIND: content` per entry, one per line, in append order
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}\n", e.kind, e.content))
            .collect()
    }
}

/// Inspection helpers for tests
#[cfg(test)]
impl Trace {
    pub fn record_thought(&mut self, content: impl Into<String>) {
        self.push(EntryKind::Thought, content);
    }

    pub fn record_action(&mut self, content: impl Into<String>) {
        self.push(EntryKind::Action, content);
    }

    pub fn record_observation(&mut self, content: impl Into<String>) {
        self.push(EntryKind::Observation, content);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TraceEntry> {
        self.entries.last()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of the given kind
    pub fn count(&self, kind: EntryKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }
}
