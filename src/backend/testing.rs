//! Mock implementations for testing
//!
//! These mocks enable controller and workspace testing without real I/O.

use super::{Answer, BackendError, QaBackend, SubjectMeta, SubjectStore};
use crate::transcript::HistoryEntry;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

// ============================================================================
// Mock Backend
// ============================================================================

/// Mock service that returns queued answers and canned history
#[allow(dead_code)]
#[derive(Default)]
pub struct MockBackend {
    answers: Mutex<VecDeque<Result<Answer, BackendError>>>,
    history: Mutex<HashMap<String, Result<Vec<HistoryEntry>, BackendError>>>,
    subjects: Mutex<Vec<SubjectMeta>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    /// Record of all questions asked, as (question, subject id)
    pub questions: Mutex<Vec<(String, String)>>,
    /// Record of every subject id whose history was requested
    pub history_requests: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next `ask`
    pub fn queue_answer(&self, answer: Result<Answer, BackendError>) {
        self.answers.lock().unwrap().push_back(answer);
    }

    pub fn set_history(&self, subject_id: &str, entries: Vec<HistoryEntry>) {
        self.history
            .lock()
            .unwrap()
            .insert(subject_id.to_string(), Ok(entries));
    }

    pub fn fail_history(&self, subject_id: &str, error: BackendError) {
        self.history
            .lock()
            .unwrap()
            .insert(subject_id.to_string(), Err(error));
    }

    pub fn add_subject(&self, id: &str, filename: &str) {
        self.subjects.lock().unwrap().push(SubjectMeta {
            id: id.to_string(),
            filename: filename.to_string(),
            uploaded_at: None,
            chunk_count: None,
        });
    }

    pub fn recorded_questions(&self) -> Vec<(String, String)> {
        self.questions.lock().unwrap().clone()
    }

    pub fn recorded_history_requests(&self) -> Vec<String> {
        self.history_requests.lock().unwrap().clone()
    }

    pub fn recorded_deletes(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl QaBackend for MockBackend {
    async fn fetch_history(&self, subject_id: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        self.history_requests
            .lock()
            .unwrap()
            .push(subject_id.to_string());
        self.history
            .lock()
            .unwrap()
            .get(subject_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn ask(&self, question: &str, subject_id: &str) -> Result<Answer, BackendError> {
        self.questions
            .lock()
            .unwrap()
            .push((question.to_string(), subject_id.to_string()));
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::network("No mock answer queued")))
    }
}

#[async_trait]
impl SubjectStore for MockBackend {
    async fn list_subjects(&self) -> Result<Vec<SubjectMeta>, BackendError> {
        Ok(self.subjects.lock().unwrap().clone())
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<SubjectMeta, BackendError> {
        let meta = SubjectMeta {
            id: format!("up-{filename}"),
            filename: filename.to_string(),
            uploaded_at: Some("2024-01-01T00:00:00".to_string()),
            chunk_count: None,
        };
        self.files.lock().unwrap().insert(meta.id.clone(), bytes);
        self.subjects.lock().unwrap().insert(0, meta.clone());
        Ok(meta)
    }

    async fn delete_subject(&self, subject_id: &str) -> Result<(), BackendError> {
        self.deleted.lock().unwrap().push(subject_id.to_string());
        let mut subjects = self.subjects.lock().unwrap();
        let before = subjects.len();
        subjects.retain(|s| s.id != subject_id);
        if subjects.len() == before {
            return Err(BackendError::not_found(format!("Not found: {subject_id}")));
        }
        Ok(())
    }

    async fn download(&self, subject_id: &str) -> Result<Vec<u8>, BackendError> {
        self.files
            .lock()
            .unwrap()
            .get(subject_id)
            .cloned()
            .ok_or_else(|| BackendError::not_found(format!("Not found: {subject_id}")))
    }
}

// ============================================================================
// Gated Backend (for in-flight testing)
// ============================================================================

/// Mock whose `ask` blocks until the test releases it
pub struct GatedBackend {
    pub inner: MockBackend,
    gate: Semaphore,
    /// Notified when an ask starts waiting at the gate
    pub ask_started: Arc<Notify>,
}

#[allow(dead_code)]
impl GatedBackend {
    pub fn new() -> Self {
        Self {
            inner: MockBackend::new(),
            gate: Semaphore::new(0),
            ask_started: Arc::new(Notify::new()),
        }
    }

    /// Let one pending (or future) ask proceed
    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl QaBackend for GatedBackend {
    async fn fetch_history(&self, subject_id: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        self.inner.fetch_history(subject_id).await
    }

    async fn ask(&self, question: &str, subject_id: &str) -> Result<Answer, BackendError> {
        self.ask_started.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| BackendError::network("gate closed"))?;
        permit.forget();
        self.inner.ask(question, subject_id).await
    }
}

#[async_trait]
impl SubjectStore for GatedBackend {
    async fn list_subjects(&self) -> Result<Vec<SubjectMeta>, BackendError> {
        self.inner.list_subjects().await
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<SubjectMeta, BackendError> {
        self.inner.upload(filename, bytes).await
    }

    async fn delete_subject(&self, subject_id: &str) -> Result<(), BackendError> {
        self.inner.delete_subject(subject_id).await
    }

    async fn download(&self, subject_id: &str) -> Result<Vec<u8>, BackendError> {
        self.inner.download(subject_id).await
    }
}
