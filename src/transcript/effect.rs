//! Effects produced by state transitions

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Load persisted Q/A pairs for the subject
    FetchHistory { subject_id: String, epoch: u64 },

    /// Submit a question to the QA service
    Ask {
        question: String,
        subject_id: String,
        epoch: u64,
    },

    /// Abandon every request issued in an earlier epoch
    CancelPending,

    /// History could not be loaded; the transcript starts empty
    ReportHydrationFailure { subject_id: String, message: String },
}
