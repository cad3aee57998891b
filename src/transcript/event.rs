//! Events that can occur in a transcript

use super::state::{HistoryEntry, Subject};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    /// `notice` becomes the first system turn of the fresh transcript
    SelectSubject {
        subject: Subject,
        notice: Option<String>,
    },
    ClearSubject,
    SubjectDeleted {
        subject_id: String,
    },
    SubmitQuestion {
        text: String,
    },
    SystemNotice {
        text: String,
    },

    // Collaborator completions, tagged with the epoch they were issued in
    HistoryLoaded {
        epoch: u64,
        entries: Vec<HistoryEntry>,
    },
    HistoryFailed {
        epoch: u64,
        message: String,
    },
    AnswerReceived {
        epoch: u64,
        answer: String,
    },
    AskFailed {
        epoch: u64,
        message: String,
    },
}

impl Event {
    /// Epoch of a collaborator completion, `None` for user events
    pub fn completion_epoch(&self) -> Option<u64> {
        match self {
            Event::HistoryLoaded { epoch, .. }
            | Event::HistoryFailed { epoch, .. }
            | Event::AnswerReceived { epoch, .. }
            | Event::AskFailed { epoch, .. } => Some(*epoch),
            _ => None,
        }
    }
}
