//! Chat transcript.

use serde::Serialize;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Typed by the user.
    User,
    /// Produced by the system: answers, ingest status, errors.
    Assistant,
}

/// One displayed chat entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub text: String,
    pub is_user: bool,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
        }
    }

    pub fn role(&self) -> Role {
        if self.is_user {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

/// Entry as handed to the UI for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEntry {
    /// Position in the transcript, stable until the next reset.
    pub key: usize,
    pub text: String,
    pub role: Role,
}

/// Ordered, append-only list of chat entries.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its key.
    pub fn push(&mut self, entry: TranscriptEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Render every entry in insertion order.
    pub fn render(&self) -> Vec<RenderedEntry> {
        self.render_from(0)
    }

    /// Render entries from `start` onward, keeping their transcript keys.
    pub fn render_from(&self, start: usize) -> Vec<RenderedEntry> {
        self.entries
            .iter()
            .enumerate()
            .skip(start)
            .map(|(key, entry)| RenderedEntry {
                key,
                text: entry.text.clone(),
                role: entry.role(),
            })
            .collect()
    }
}
