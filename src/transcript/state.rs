//! Transcript state types

use serde::{Deserialize, Serialize};

/// The document a conversation is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
}

impl Subject {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A persisted question/answer pair as returned by the history service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
}

#[allow(dead_code)] // Service responses are deserialized; tests build entries directly
impl HistoryEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// One entry in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Turn {
    /// Question typed by the user
    User { content: String },
    /// Answer (or in-band error) from the QA service
    Bot { content: String },
    /// Out-of-band notice, e.g. an upload confirmation
    System { content: String },
    /// Exchange hydrated from history, never produced by a live exchange
    HistoryPair { question: String, answer: String },
}

/// Discriminant of [`Turn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    User,
    Bot,
    System,
    HistoryPair,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Turn::User {
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Turn::Bot {
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Turn::System {
            content: content.into(),
        }
    }

    pub fn kind(&self) -> TurnKind {
        match self {
            Turn::User { .. } => TurnKind::User,
            Turn::Bot { .. } => TurnKind::Bot,
            Turn::System { .. } => TurnKind::System,
            Turn::HistoryPair { .. } => TurnKind::HistoryPair,
        }
    }
}

impl From<HistoryEntry> for Turn {
    fn from(entry: HistoryEntry) -> Self {
        Turn::HistoryPair {
            question: entry.question,
            answer: entry.answer,
        }
    }
}

/// Lifecycle phase of the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No subject selected (welcome state)
    #[default]
    NoSubject,
    /// History for the new subject is being fetched
    Hydrating,
    /// Ready for a question
    Live,
    /// A question is in flight
    Sending,
}

/// Full transcript state for one session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub subject: Option<Subject>,
    pub turns: Vec<Turn>,
    pub phase: Phase,
    /// Bumped on every subject change; outstanding requests carry the epoch
    /// they were issued in so stale completions can be recognised.
    #[serde(skip)]
    pub epoch: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A question is in flight
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Sending
    }

    /// No request of any kind is outstanding
    pub fn is_settled(&self) -> bool {
        !matches!(self.phase, Phase::Hydrating | Phase::Sending)
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject.as_ref().map(|s| s.id.as_str())
    }

    /// Shown when nothing is selected and nothing has been said
    pub fn is_welcome(&self) -> bool {
        self.subject.is_none() && self.turns.is_empty()
    }
}
