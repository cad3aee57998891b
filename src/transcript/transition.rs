//! Pure state transition function

use super::state::{Phase, Subject, Transcript, Turn};
use super::{Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: Transcript,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: Transcript) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Reasons an event is dropped without changing state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Question is empty")]
    EmptyQuestion,
    #[error("A question is already in flight")]
    Busy,
    #[error("No subject selected")]
    NoSubject,
    #[error("History is still loading")]
    Hydrating,
    #[error("Discarded completion from epoch {0}")]
    Stale(u64),
}

/// Pure transition function
///
/// Given the same state and event it always produces the same result and
/// performs no I/O. An `Err` means the event was rejected and the state is
/// unchanged.
pub fn transition(state: &Transcript, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state.phase, event) {
        // ============================================================
        // Subject changes: reset from any phase
        // ============================================================
        (_, Event::SelectSubject { subject, notice }) => {
            let mut result = reset(state, Some(subject));
            result.new_state.turns.extend(notice.map(Turn::system));
            Ok(result)
        }

        (_, Event::ClearSubject) => Ok(reset(state, None)),

        (_, Event::SubjectDeleted { subject_id }) => {
            if state.subject_id() == Some(subject_id.as_str()) {
                Ok(reset(state, None))
            } else {
                Ok(TransitionResult::new(state.clone()))
            }
        }

        // ============================================================
        // Questions
        // ============================================================
        (_, Event::SubmitQuestion { text }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyQuestion)
        }

        (Phase::NoSubject, Event::SubmitQuestion { .. }) => Err(TransitionError::NoSubject),
        (Phase::Hydrating, Event::SubmitQuestion { .. }) => Err(TransitionError::Hydrating),
        (Phase::Sending, Event::SubmitQuestion { .. }) => Err(TransitionError::Busy),

        (Phase::Live, Event::SubmitQuestion { text }) => {
            let Some(subject) = &state.subject else {
                return Err(TransitionError::NoSubject);
            };
            let effect = Effect::Ask {
                question: text.clone(),
                subject_id: subject.id.clone(),
                epoch: state.epoch,
            };
            let mut next = state.clone();
            next.turns.push(Turn::user(text));
            next.phase = Phase::Sending;
            Ok(TransitionResult::new(next).with_effect(effect))
        }

        (Phase::Sending, Event::AnswerReceived { epoch, answer }) if epoch == state.epoch => {
            Ok(TransitionResult::new(settle(state, Turn::bot(answer))))
        }

        (Phase::Sending, Event::AskFailed { epoch, message }) if epoch == state.epoch => Ok(
            TransitionResult::new(settle(state, Turn::bot(format!("Error: {message}")))),
        ),

        // ============================================================
        // Notices are accepted in every phase
        // ============================================================
        (_, Event::SystemNotice { text }) => {
            let mut next = state.clone();
            next.turns.push(Turn::system(text));
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Hydration
        // ============================================================
        (Phase::Hydrating, Event::HistoryLoaded { epoch, entries }) if epoch == state.epoch => {
            let mut next = state.clone();
            // Notices posted while loading stay after the history.
            let notices = std::mem::take(&mut next.turns);
            next.turns = entries.into_iter().map(Turn::from).collect();
            next.turns.extend(notices);
            next.phase = Phase::Live;
            Ok(TransitionResult::new(next))
        }

        (Phase::Hydrating, Event::HistoryFailed { epoch, message }) if epoch == state.epoch => {
            let subject_id = state.subject_id().unwrap_or_default().to_string();
            let mut next = state.clone();
            next.phase = Phase::Live;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::ReportHydrationFailure { subject_id, message }))
        }

        // ============================================================
        // Anything else is a completion that no longer applies
        // ============================================================
        (
            _,
            Event::HistoryLoaded { epoch, .. }
            | Event::HistoryFailed { epoch, .. }
            | Event::AnswerReceived { epoch, .. }
            | Event::AskFailed { epoch, .. },
        ) => Err(TransitionError::Stale(epoch)),
    }
}

/// Drop the current transcript and start over for `subject`
fn reset(state: &Transcript, subject: Option<Subject>) -> TransitionResult {
    let epoch = state.epoch + 1;
    let cancel = (!state.is_settled()).then_some(Effect::CancelPending);

    let (phase, fetch) = match &subject {
        Some(subject) => (
            Phase::Hydrating,
            Some(Effect::FetchHistory {
                subject_id: subject.id.clone(),
                epoch,
            }),
        ),
        None => (Phase::NoSubject, None),
    };

    TransitionResult::new(Transcript {
        subject,
        turns: Vec::new(),
        phase,
        epoch,
    })
    .with_effects(cancel)
    .with_effects(fetch)
}

/// Append the outcome of the in-flight question and return to `Live`
fn settle(state: &Transcript, turn: Turn) -> Transcript {
    let mut next = state.clone();
    next.turns.push(turn);
    next.phase = Phase::Live;
    next
}
