//! Task info micro-format.
//!
//! A task carries a single free-text `info` column. Lines starting with
//! `"- "` are checkbox subtasks (`- [x] done`, `- [ ] open`, or a bare
//! `- item`); every other non-empty line is a note.
//!
//! ```text
//! Call the venue first
//! - [x] book room
//! - [ ] send invites
//! ```
//!
//! Decoding buckets notes and subtasks separately, so the original
//! interleaving of the two is not recoverable. Encoding always writes notes
//! first.

use serde::{Deserialize, Serialize};

const SUBTASK_MARKER: &str = "- ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub text: String,
    pub completed: bool,
}

impl Subtask {
    pub fn new(text: impl Into<String>, completed: bool) -> Self {
        Self {
            text: text.into(),
            completed,
        }
    }

    fn to_line(&self) -> String {
        format!(
            "{}[{}] {}",
            SUBTASK_MARKER,
            if self.completed { 'x' } else { ' ' },
            self.text
        )
    }
}

/// Structured view of a task's `info` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfoDocument {
    pub notes: Vec<String>,
    pub subtasks: Vec<Subtask>,
}

impl TaskInfoDocument {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.subtasks.is_empty()
    }

    /// Re-encode into the canonical `info` text.
    pub fn to_info(&self) -> String {
        encode(&self.notes, &self.subtasks)
    }

    /// Mark one subtask done or open. Returns `false` if `index` is out of range.
    pub fn set_subtask_completed(&mut self, index: usize, completed: bool) -> bool {
        match self.subtasks.get_mut(index) {
            Some(subtask) => {
                subtask.completed = completed;
                true
            }
            None => false,
        }
    }

    pub fn add_subtask(&mut self, text: impl Into<String>) {
        self.subtasks.push(Subtask::new(text, false));
    }

    pub fn completed_count(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }

    /// `(completed, total)` subtask counts.
    pub fn progress(&self) -> (usize, usize) {
        (self.completed_count(), self.subtasks.len())
    }
}

/// Parse an `info` blob. Total over every input; `None` is the empty document.
pub fn decode(text: Option<&str>) -> TaskInfoDocument {
    let mut doc = TaskInfoDocument::default();
    let Some(text) = text else {
        return doc;
    };

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix(SUBTASK_MARKER) {
            doc.subtasks.push(parse_subtask(rest.trim()));
        } else if !trimmed.is_empty() {
            doc.notes.push(trimmed.to_string());
        }
    }
    doc
}

/// Render notes followed by subtasks, one per line.
pub fn encode(notes: &[String], subtasks: &[Subtask]) -> String {
    notes
        .iter()
        .cloned()
        .chain(subtasks.iter().map(Subtask::to_line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_subtask(body: &str) -> Subtask {
    if !body.starts_with('[') {
        return Subtask::new(body, false);
    }

    // "[x] text": the mark is the 2nd char, text starts after the 4th.
    let mut chars = body.chars();
    chars.next();
    let completed = matches!(chars.next(), Some('x' | 'X'));
    let text: String = body.chars().skip(4).collect();
    Subtask::new(text.trim(), completed)
}
