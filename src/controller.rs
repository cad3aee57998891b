//! Transcript controller
//!
//! A `TranscriptRuntime` task owns the transcript and executes the effects the
//! pure transition function produces. Callers hold a cloneable
//! `TranscriptController` handle: operations go in over an mpsc channel and
//! are acknowledged once applied, state comes out through a `watch` channel.

use crate::backend::QaBackend;
use crate::transcript::{transition, Effect, Event, Subject, Transcript, TransitionError, Turn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Errors returned by controller operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The operation was dropped; state is unchanged
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Transcript runtime has stopped")]
    Stopped,
}

/// Tuning for a controller instance
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerOptions {
    /// Ask calls running longer than this fail like any other ask failure
    pub ask_timeout: Option<Duration>,
}

struct Command {
    event: Event,
    reply: oneshot::Sender<Result<(), TransitionError>>,
}

/// Handle to a running transcript
#[derive(Clone)]
pub struct TranscriptController {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<Transcript>,
}

impl TranscriptController {
    /// Start a runtime on the current tokio runtime and return its handle
    pub fn spawn<B: QaBackend + 'static>(backend: B, options: ControllerOptions) -> Self {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (snapshot_tx, snapshot_rx) = watch::channel(Transcript::new());
        let runtime = TranscriptRuntime::new(backend, options, command_rx, snapshot_tx);
        tokio::spawn(runtime.run());
        Self {
            commands: command_tx,
            snapshot: snapshot_rx,
        }
    }

    async fn send(&self, event: Event) -> Result<(), ControllerError> {
        let (reply, ack) = oneshot::channel();
        self.commands
            .send(Command { event, reply })
            .await
            .map_err(|_| ControllerError::Stopped)?;
        ack.await.map_err(|_| ControllerError::Stopped)??;
        Ok(())
    }

    /// Reset the transcript and load the subject's history
    pub async fn select_subject(&self, subject: Subject) -> Result<(), ControllerError> {
        self.send(Event::SelectSubject {
            subject,
            notice: None,
        })
        .await
    }

    /// Like [`select_subject`](Self::select_subject), with `notice` as the first
    /// turn of the new transcript. Both land in one transition, so no other
    /// command can slip in between.
    pub async fn select_subject_with_notice(
        &self,
        subject: Subject,
        notice: impl Into<String>,
    ) -> Result<(), ControllerError> {
        self.send(Event::SelectSubject {
            subject,
            notice: Some(notice.into()),
        })
        .await
    }

    /// Return to the empty welcome state
    pub async fn clear_subject(&self) -> Result<(), ControllerError> {
        self.send(Event::ClearSubject).await
    }

    /// Ask a question about the active subject.
    ///
    /// Returns once the user turn is visible; the answer arrives later as a
    /// bot turn. Blank questions, a busy transcript, a missing subject or a
    /// subject whose history is still loading all reject the question
    /// without touching the transcript.
    pub async fn submit_question(&self, text: impl Into<String>) -> Result<(), ControllerError> {
        self.send(Event::SubmitQuestion { text: text.into() }).await
    }

    /// Append an out-of-band notice
    pub async fn append_system_turn(&self, text: impl Into<String>) -> Result<(), ControllerError> {
        self.send(Event::SystemNotice { text: text.into() }).await
    }

    /// Clear the transcript if `subject_id` is the active subject
    pub async fn remove_subject_turns_if_active(
        &self,
        subject_id: impl Into<String>,
    ) -> Result<(), ControllerError> {
        self.send(Event::SubjectDeleted {
            subject_id: subject_id.into(),
        })
        .await
    }

    #[allow(dead_code)] // Views render full snapshots
    pub fn visible_turns(&self) -> Vec<Turn> {
        self.snapshot.borrow().turns.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.snapshot.borrow().is_busy()
    }

    pub fn snapshot(&self) -> Transcript {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Transcript> {
        self.snapshot.clone()
    }

    /// Wait until no history fetch or ask is outstanding
    #[allow(dead_code)] // Used by tests
    pub async fn settled(&self) -> Result<Transcript, ControllerError> {
        let mut rx = self.snapshot.clone();
        let state = rx
            .wait_for(Transcript::is_settled)
            .await
            .map_err(|_| ControllerError::Stopped)?;
        Ok(state.clone())
    }
}

/// Executes effects for one transcript
pub struct TranscriptRuntime<B: QaBackend + 'static> {
    state: Transcript,
    backend: Arc<B>,
    options: ControllerOptions,
    commands: mpsc::Receiver<Command>,
    /// Completions posted back by spawned requests
    completion_tx: mpsc::Sender<Event>,
    completion_rx: mpsc::Receiver<Event>,
    snapshot_tx: watch::Sender<Transcript>,
    /// Cancels every request issued in the current epoch
    pending: CancellationToken,
}

impl<B: QaBackend + 'static> TranscriptRuntime<B> {
    fn new(
        backend: B,
        options: ControllerOptions,
        commands: mpsc::Receiver<Command>,
        snapshot_tx: watch::Sender<Transcript>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(32);
        Self {
            state: Transcript::new(),
            backend: Arc::new(backend),
            options,
            commands,
            completion_tx,
            completion_rx,
            snapshot_tx,
            pending: CancellationToken::new(),
        }
    }

    pub async fn run(mut self) {
        tracing::debug!("Starting transcript runtime");

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(Command { event, reply }) = command else {
                        break;
                    };
                    let result = self.process_event(event);
                    let _ = reply.send(result);
                }
                Some(event) = self.completion_rx.recv() => {
                    let _ = self.process_event(event);
                }
            }
        }

        self.pending.cancel();
        tracing::debug!("Transcript runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let epoch = event.completion_epoch();
        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(e) => {
                match epoch {
                    Some(epoch) => tracing::debug!(
                        epoch,
                        current = self.state.epoch,
                        "Discarding stale completion"
                    ),
                    None => tracing::debug!(reason = %e, "Event rejected"),
                }
                return Err(e);
            }
        };

        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }
        self.snapshot_tx.send_replace(self.state.clone());
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::CancelPending => {
                self.pending.cancel();
                self.pending = CancellationToken::new();
            }

            Effect::FetchHistory { subject_id, epoch } => {
                let backend = Arc::clone(&self.backend);
                let tx = self.completion_tx.clone();
                let cancel = self.pending.clone();
                tokio::spawn(async move {
                    let event = tokio::select! {
                        () = cancel.cancelled() => return,
                        result = backend.fetch_history(&subject_id) => match result {
                            Ok(entries) => Event::HistoryLoaded { epoch, entries },
                            Err(e) => Event::HistoryFailed { epoch, message: e.to_string() },
                        },
                    };
                    let _ = tx.send(event).await;
                });
            }

            Effect::Ask {
                question,
                subject_id,
                epoch,
            } => {
                let backend = Arc::clone(&self.backend);
                let tx = self.completion_tx.clone();
                let cancel = self.pending.clone();
                let timeout = self.options.ask_timeout;
                tokio::spawn(async move {
                    let event = tokio::select! {
                        () = cancel.cancelled() => {
                            tracing::debug!(epoch, "Ask abandoned after subject change");
                            return;
                        }
                        result = ask_with_timeout(backend.as_ref(), &question, &subject_id, timeout) => match result {
                            Ok(answer) => Event::AnswerReceived { epoch, answer },
                            Err(message) => Event::AskFailed { epoch, message },
                        },
                    };
                    let _ = tx.send(event).await;
                });
            }

            Effect::ReportHydrationFailure {
                subject_id,
                message,
            } => {
                tracing::warn!(subject_id = %subject_id, error = %message, "Failed to load chat history");
            }
        }
    }
}

async fn ask_with_timeout<B: QaBackend + ?Sized>(
    backend: &B,
    question: &str,
    subject_id: &str,
    timeout: Option<Duration>,
) -> Result<String, String> {
    let call = backend.ask(question, subject_id);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => return Err(format!("Request timed out after {}s", limit.as_secs_f64())),
        },
        None => call.await,
    };
    result.map(|a| a.answer).map_err(|e| e.to_string())
}
